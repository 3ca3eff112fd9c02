//! Typed ArgoCD operations on top of an [`ArgocdApi`] transport

use std::sync::Arc;

use serde_json::{Value, json};

use super::models::{Application, array_of};
use crate::error::Result;
use crate::ports::{ApiRequest, ArgocdApi};

/// Filters and paging for `get_logs`
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct LogsQuery {
    pub pod_name: Option<String>,
    pub container: Option<String>,
    pub tail_lines: u32,
    pub since_seconds: Option<u64>,
}

/// Options for `sync_application`
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SyncOptions {
    pub dry_run: bool,
    pub prune: bool,
    pub force: bool,
    pub revision: Option<String>,
}

impl Default for SyncOptions {
    fn default() -> Self {
        Self {
            dry_run: true,
            prune: false,
            force: false,
            revision: None,
        }
    }
}

/// ArgoCD client for one instance
#[derive(Clone)]
pub struct ArgocdClient {
    api: Arc<dyn ArgocdApi>,
}

impl ArgocdClient {
    #[must_use]
    pub fn new(api: Arc<dyn ArgocdApi>) -> Self {
        Self { api }
    }

    #[must_use]
    pub fn instance_name(&self) -> &str {
        self.api.instance_name()
    }

    /// # Errors
    ///
    /// Returns the transport error for every operation below.
    pub async fn list_applications(
        &self,
        project: Option<&str>,
        selector: Option<&str>,
    ) -> Result<Vec<Application>> {
        let data = self
            .api
            .request(
                ApiRequest::get("/applications")
                    .query_opt("project", project)
                    .query_opt("selector", selector),
            )
            .await?;
        Ok(array_of(&data["items"])
            .iter()
            .map(Application::from_api_response)
            .collect())
    }

    pub async fn get_application(&self, name: &str) -> Result<Application> {
        let data = self
            .api
            .request(ApiRequest::get(format!("/applications/{name}")))
            .await?;
        Ok(Application::from_api_response(&data))
    }

    /// Managed resources with their live and target states
    pub async fn get_application_diff(&self, name: &str, revision: Option<&str>) -> Result<Value> {
        self.api
            .request(
                ApiRequest::get(format!("/applications/{name}/managed-resources"))
                    .query_opt("revision", revision),
            )
            .await
    }

    /// The last `limit` deployment history entries, oldest first
    pub async fn get_application_history(&self, name: &str, limit: usize) -> Result<Vec<Value>> {
        let app = self.get_application(name).await?;
        let skip = app.history.len().saturating_sub(limit);
        Ok(app.history.into_iter().skip(skip).collect())
    }

    pub async fn get_application_events(
        &self,
        name: &str,
        resource_name: Option<&str>,
        resource_kind: Option<&str>,
    ) -> Result<Vec<Value>> {
        let data = self
            .api
            .request(
                ApiRequest::get(format!("/applications/{name}/events"))
                    .query_opt("resourceName", resource_name)
                    .query_opt("resourceKind", resource_kind),
            )
            .await?;
        Ok(array_of(&data["items"]))
    }

    pub async fn get_resource_tree(&self, name: &str) -> Result<Value> {
        self.api
            .request(ApiRequest::get(format!("/applications/{name}/resource-tree")))
            .await
    }

    pub async fn get_logs(&self, name: &str, query: &LogsQuery) -> Result<String> {
        let mut request = ApiRequest::get(format!("/applications/{name}/logs"))
            .query("tailLines", query.tail_lines.to_string())
            .query_opt("podName", query.pod_name.as_deref())
            .query_opt("container", query.container.as_deref());
        if let Some(since) = query.since_seconds.filter(|s| *s > 0) {
            request = request.query("sinceSeconds", since.to_string());
        }

        let data = self.api.request(request).await?;
        Ok(match &data["content"] {
            Value::String(s) => s.clone(),
            Value::Null => String::new(),
            other => other.to_string(),
        })
    }

    pub async fn sync_application(&self, name: &str, options: &SyncOptions) -> Result<Value> {
        let mut body = json!({
            "dryRun": options.dry_run,
            "prune": options.prune,
        });
        if let Some(revision) = options.revision.as_deref().filter(|r| !r.is_empty()) {
            body["revision"] = json!(revision);
        }
        if options.force {
            body["strategy"] = json!({"hook": {"force": true}});
        }

        self.api
            .request(ApiRequest::post(format!("/applications/{name}/sync"), body))
            .await
    }

    pub async fn rollback_application(
        &self,
        name: &str,
        revision_id: i64,
        dry_run: bool,
    ) -> Result<Value> {
        self.api
            .request(ApiRequest::post(
                format!("/applications/{name}/rollback"),
                json!({"id": revision_id, "dryRun": dry_run}),
            ))
            .await
    }

    /// Ask ArgoCD to re-read the application from Git
    pub async fn refresh_application(&self, name: &str, hard: bool) -> Result<Application> {
        let data = self
            .api
            .request(
                ApiRequest::get(format!("/applications/{name}"))
                    .query("refresh", if hard { "hard" } else { "normal" }),
            )
            .await?;
        Ok(Application::from_api_response(&data))
    }

    pub async fn terminate_sync(&self, name: &str) -> Result<Value> {
        self.api
            .request(ApiRequest::delete(format!("/applications/{name}/operation")))
            .await
    }

    pub async fn delete_application(&self, name: &str, cascade: bool) -> Result<Value> {
        self.api
            .request(
                ApiRequest::delete(format!("/applications/{name}"))
                    .query("cascade", cascade.to_string()),
            )
            .await
    }

    pub async fn list_clusters(&self) -> Result<Vec<Value>> {
        let data = self.api.request(ApiRequest::get("/clusters")).await?;
        Ok(array_of(&data["items"]))
    }

    pub async fn list_projects(&self) -> Result<Vec<Value>> {
        let data = self.api.request(ApiRequest::get("/projects")).await?;
        Ok(array_of(&data["items"]))
    }

    pub async fn get_settings(&self) -> Result<Value> {
        self.api.request(ApiRequest::get("/settings")).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ports::HttpMethod;
    use crate::ports::MockArgocdApi;

    fn client_with(mock: &Arc<MockArgocdApi>) -> ArgocdClient {
        ArgocdClient::new(Arc::clone(mock) as Arc<dyn ArgocdApi>)
    }

    #[tokio::test]
    async fn test_list_applications_with_filters() {
        let mock = Arc::new(MockArgocdApi::new());
        mock.respond(
            HttpMethod::Get,
            "/applications",
            json!({"items": [{"metadata": {"name": "a"}}, {"metadata": {"name": "b"}}]}),
        );
        let client = client_with(&mock);

        let apps = client
            .list_applications(Some("team-a"), None)
            .await
            .unwrap();
        assert_eq!(apps.len(), 2);
        assert_eq!(apps[1].name, "b");

        let calls = mock.calls();
        assert_eq!(calls[0].query, vec![("project", "team-a".to_string())]);
    }

    #[tokio::test]
    async fn test_list_applications_null_items() {
        let mock = Arc::new(MockArgocdApi::new());
        mock.respond(HttpMethod::Get, "/applications", json!({"items": null}));

        let apps = client_with(&mock)
            .list_applications(None, None)
            .await
            .unwrap();
        assert!(apps.is_empty());
    }

    #[tokio::test]
    async fn test_history_keeps_last_entries() {
        let mock = Arc::new(MockArgocdApi::new());
        mock.respond(
            HttpMethod::Get,
            "/applications/web",
            json!({"status": {"history": [{"id": 1}, {"id": 2}, {"id": 3}]}}),
        );
        let client = client_with(&mock);

        let history = client.get_application_history("web", 2).await.unwrap();
        assert_eq!(history, vec![json!({"id": 2}), json!({"id": 3})]);

        let history = client.get_application_history("web", 10).await.unwrap();
        assert_eq!(history.len(), 3);
    }

    #[tokio::test]
    async fn test_sync_body() {
        let mock = Arc::new(MockArgocdApi::new());
        let client = client_with(&mock);

        client
            .sync_application(
                "web",
                &SyncOptions {
                    dry_run: false,
                    prune: true,
                    force: true,
                    revision: Some("v1.2.3".to_string()),
                },
            )
            .await
            .unwrap();

        let call = &mock.calls_to(HttpMethod::Post, "/applications/web/sync")[0];
        assert_eq!(
            call.body,
            Some(json!({
                "dryRun": false,
                "prune": true,
                "revision": "v1.2.3",
                "strategy": {"hook": {"force": true}}
            }))
        );
    }

    #[tokio::test]
    async fn test_sync_defaults_body() {
        let mock = Arc::new(MockArgocdApi::new());
        client_with(&mock)
            .sync_application("web", &SyncOptions::default())
            .await
            .unwrap();

        let call = &mock.calls()[0];
        assert_eq!(call.body, Some(json!({"dryRun": true, "prune": false})));
    }

    #[tokio::test]
    async fn test_logs_query_and_content() {
        let mock = Arc::new(MockArgocdApi::new());
        mock.respond(
            HttpMethod::Get,
            "/applications/web/logs",
            json!({"content": "line1\nline2"}),
        );
        let client = client_with(&mock);

        let logs = client
            .get_logs(
                "web",
                &LogsQuery {
                    pod_name: Some("web-0".to_string()),
                    container: None,
                    tail_lines: 50,
                    since_seconds: Some(300),
                },
            )
            .await
            .unwrap();
        assert_eq!(logs, "line1\nline2");

        let call = &mock.calls()[0];
        assert_eq!(
            call.query,
            vec![
                ("tailLines", "50".to_string()),
                ("podName", "web-0".to_string()),
                ("sinceSeconds", "300".to_string()),
            ]
        );
    }

    #[tokio::test]
    async fn test_refresh_and_delete_queries() {
        let mock = Arc::new(MockArgocdApi::new());
        let client = client_with(&mock);

        client.refresh_application("web", true).await.unwrap();
        client.delete_application("web", false).await.unwrap();
        client.terminate_sync("web").await.unwrap();
        client.rollback_application("web", 4, true).await.unwrap();

        let calls = mock.calls();
        assert_eq!(calls[0].query, vec![("refresh", "hard".to_string())]);
        assert_eq!(calls[1].method, HttpMethod::Delete);
        assert_eq!(calls[1].query, vec![("cascade", "false".to_string())]);
        assert_eq!(calls[2].path, "/applications/web/operation");
        assert_eq!(calls[3].body, Some(json!({"id": 4, "dryRun": true})));
    }

    #[tokio::test]
    async fn test_api_error_propagates() {
        let mock = Arc::new(MockArgocdApi::new());
        mock.fail(HttpMethod::Get, "/applications/missing", 404, "not found");

        let err = client_with(&mock)
            .get_application("missing")
            .await
            .unwrap_err();
        assert!(err.is_backend());
    }
}
