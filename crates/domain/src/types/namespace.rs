//! Namespaces

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use super::DockerAuth;

/// Separates applications and secrets within a project. Applications from
/// several namespaces can share the same devices.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct Namespace {
    pub id: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub created_at: Option<DateTime<Utc>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub updated_at: Option<DateTime<Utc>>,
    pub project_id: String,
    pub name: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub config: Option<NamespaceConfig>,
    /// Read only
    #[serde(skip_serializing_if = "is_zero")]
    pub application_count: u32,
}

impl Namespace {
    pub fn named(name: impl Into<String>) -> Self {
        Self { name: name.into(), ..Self::default() }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct NamespaceConfig {
    #[serde(rename = "registryAuthentication")]
    pub registry_auth: DockerAuth,
}

#[allow(clippy::trivially_copy_pass_by_ref)]
const fn is_zero(value: &u32) -> bool {
    *value == 0
}
