//! Tool Handlers
//!
//! One module per MCP tool. Read tools and the simple write tools are
//! [`StandardTool`](crate::mcp::standard_tool::StandardTool)s; sync and
//! delete implement [`ToolHandler`](crate::ports::ToolHandler) directly
//! because their gate depends on the arguments.

mod delete_application;
mod diagnose_sync_failure;
mod get_application;
mod get_application_diff;
mod get_application_history;
mod get_application_logs;
mod get_application_status;
mod list_applications;
mod list_clusters;
mod list_projects;
mod refresh_application;
mod rollback_application;
mod sync_application;
mod terminate_sync;
pub mod utils;

pub use delete_application::DeleteApplicationHandler;
pub use diagnose_sync_failure::DiagnoseSyncFailureHandler;
pub use get_application::GetApplicationHandler;
pub use get_application_diff::GetApplicationDiffHandler;
pub use get_application_history::GetApplicationHistoryHandler;
pub use get_application_logs::GetApplicationLogsHandler;
pub use get_application_status::GetApplicationStatusHandler;
pub use list_applications::ListApplicationsHandler;
pub use list_clusters::ListClustersHandler;
pub use list_projects::ListProjectsHandler;
pub use refresh_application::RefreshApplicationHandler;
pub use rollback_application::RollbackApplicationHandler;
pub use sync_application::SyncApplicationHandler;
pub use terminate_sync::TerminateSyncHandler;
