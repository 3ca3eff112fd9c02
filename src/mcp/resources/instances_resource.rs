//! Instances resource: the configured ArgoCD endpoints, tokens left out

use std::fmt::Write;

use crate::config::Config;

pub const INSTANCES_URI: &str = "argocd://instances";

#[must_use]
pub fn render(config: &Config) -> String {
    let instances = config.all_instances();
    if instances.is_empty() {
        return "No ArgoCD instances configured".to_string();
    }

    let mut out = String::from("Configured ArgoCD Instances:\n");
    for instance in &instances {
        let _ = write!(out, "\n- {}: {}", instance.name, instance.url);
    }
    out
}
