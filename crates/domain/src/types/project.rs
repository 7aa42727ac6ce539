//! Projects, memberships and roles

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use super::User;
use crate::impl_domain_status_conversions;

/// Top-level tenant grouping devices, namespaces and secrets
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct Project {
    pub id: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub created_at: Option<DateTime<Utc>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub updated_at: Option<DateTime<Utc>>,
    pub name: String,

    pub quota: ProjectQuota,

    // Read-only counters filled in by the server
    pub device_count: u32,
    pub application_count: u32,
    pub namespace_count: u32,
    pub secret_count: u32,
}

impl Project {
    /// New project request with only a name
    pub fn named(name: impl Into<String>) -> Self {
        Self { name: name.into(), ..Self::default() }
    }
}

/// Resource limits of a project. Retention periods are nanoseconds.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct ProjectQuota {
    pub devices: u32,
    pub namespaces: u32,
    pub applications: u32,
    pub secrets: u32,
    #[serde(rename = "logsRetention")]
    pub logs_retention_ns: i64,
    #[serde(rename = "metricsRetention")]
    pub metrics_retention_ns: i64,
}

/// Link between a user and a project
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct Membership {
    pub user_id: String,
    pub project_id: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub created_at: Option<DateTime<Utc>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub updated_at: Option<DateTime<Utc>>,

    // Only present when requested with `?full`
    pub user: User,
    pub project: Project,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub roles: Vec<Role>,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct Role {
    pub id: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub created_at: Option<DateTime<Utc>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub updated_at: Option<DateTime<Utc>>,
    pub project_id: String,
    pub name: String,
    pub description: String,
    pub config: RoleConfig,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct RoleConfig {
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub rules: Vec<Rule>,
}

/// Grants or denies actions on resource kinds
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct Rule {
    #[serde(rename = "resource", skip_serializing_if = "Vec::is_empty")]
    pub resources: Vec<Resource>,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub actions: Vec<Action>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub effect: Option<Effect>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Action {
    Get,
    List,
    Delete,
    Update,
    Create,
    #[serde(rename = "SSH")]
    Ssh,
    ViewLogs,
    Wipe,
    Reboot,
    Connect,
}

impl_domain_status_conversions!(Action {
    Get => "Get",
    List => "List",
    Delete => "Delete",
    Update => "Update",
    Create => "Create",
    Ssh => "SSH",
    ViewLogs => "ViewLogs",
    Wipe => "Wipe",
    Reboot => "Reboot",
    Connect => "Connect",
});

/// Resource kinds addressable by role rules
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Resource {
    Project,
    Secret,
    Namespace,
    Role,
    Membership,
    MembershipRoleBinding,
    ServiceAccount,
    ServiceAccountAccessKey,
    ServiceAccountRoleBinding,
    Application,
    ApplicationAllocation,
    Device,
    DeviceRegistrationToken,
    #[serde(rename = "*")]
    Any,
}

impl_domain_status_conversions!(Resource {
    Project => "Project",
    Secret => "Secret",
    Namespace => "Namespace",
    Role => "Role",
    Membership => "Membership",
    MembershipRoleBinding => "MembershipRoleBinding",
    ServiceAccount => "ServiceAccount",
    ServiceAccountAccessKey => "ServiceAccountAccessKey",
    ServiceAccountRoleBinding => "ServiceAccountRoleBinding",
    Application => "Application",
    ApplicationAllocation => "ApplicationAllocation",
    Device => "Device",
    DeviceRegistrationToken => "DeviceRegistrationToken",
    Any => "*",
});

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Effect {
    Allow,
    Deny,
}

impl_domain_status_conversions!(Effect {
    Allow => "allow",
    Deny => "deny",
});
