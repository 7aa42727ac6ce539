//! Applications, their container specs and where they run

use std::collections::BTreeMap;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::impl_domain_status_conversions;

/// A long-running workload scheduled onto devices
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct Application {
    pub id: String,
    /// Bumped by the server on every update
    pub version: i64,
    /// Bumped when referenced config changes and devices must redeploy
    pub config_version: i64,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub created_at: Option<DateTime<Utc>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub updated_at: Option<DateTime<Utc>>,
    pub project_id: String,
    pub namespace_id: String,
    pub name: String,
    #[serde(skip_serializing_if = "String::is_empty")]
    pub description: String,
    #[serde(rename = "type", skip_serializing_if = "Option::is_none")]
    pub runtime: Option<RuntimeType>,
    pub scheduling: Scheduling,

    pub spec: ApplicationSpec,
    /// Computed by the server
    pub deployment_status: ApplicationDeploymentStatus,
}

/// Which devices a workload is placed on
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct Scheduling {
    /// Unset means `NoDevices` without selectors and `Conditional` with them
    #[serde(rename = "type", skip_serializing_if = "Option::is_none")]
    pub schedule_type: Option<ScheduleType>,
    pub selectors: BTreeMap<String, String>,
}

impl Scheduling {
    /// Schedule on devices carrying all of `selectors`
    #[must_use]
    pub fn conditional(selectors: BTreeMap<String, String>) -> Self {
        Self { schedule_type: Some(ScheduleType::Conditional), selectors }
    }

    /// Schedule on every device of the project
    #[must_use]
    pub fn all_devices() -> Self {
        Self { schedule_type: Some(ScheduleType::AllDevices), selectors: BTreeMap::new() }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum ScheduleType {
    NoDevices,
    AllDevices,
    Conditional,
}

impl_domain_status_conversions!(ScheduleType {
    NoDevices => "NoDevices",
    AllDevices => "AllDevices",
    Conditional => "Conditional",
});

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum RuntimeType {
    Container,
    Systemd,
}

impl_domain_status_conversions!(RuntimeType {
    Container => "container",
    Systemd => "systemd",
});

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ApplicationSpec {
    #[serde(rename = "containers", skip_serializing_if = "Vec::is_empty")]
    pub containers: Vec<ContainerSpec>,
}

/// One container of a workload
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct ContainerSpec {
    #[serde(skip_serializing_if = "String::is_empty")]
    pub name: String,
    #[serde(skip_serializing_if = "String::is_empty")]
    pub image: String,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub args: Vec<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub auth: Option<DockerAuth>,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub cap_add: Vec<String>,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub cap_drop: Vec<String>,
    #[serde(skip_serializing_if = "String::is_empty")]
    pub command: String,
    /// `all` exposes every GPU
    #[serde(skip_serializing_if = "String::is_empty")]
    pub gpus: String,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub entrypoint: Vec<String>,
    #[serde(skip_serializing_if = "std::ops::Not::not")]
    pub force_pull: bool,
    #[serde(skip_serializing_if = "String::is_empty")]
    pub hostname: String,
    #[serde(skip_serializing_if = "is_zero")]
    pub memory_hard_limit: i64,
    #[serde(skip_serializing_if = "String::is_empty")]
    pub user: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub network_mode: Option<NetworkMode>,
    /// Port mappings such as `8080:80`
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub ports: Vec<String>,
    #[serde(skip_serializing_if = "std::ops::Not::not")]
    pub privileged: bool,
    #[serde(skip_serializing_if = "String::is_empty")]
    pub image_pull_timeout: String,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub security_opt: Vec<String>,
    #[serde(skip_serializing_if = "is_zero")]
    pub shm_size: i64,
    #[serde(skip_serializing_if = "BTreeMap::is_empty")]
    pub storage_opt: BTreeMap<String, String>,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub volumes: Vec<String>,
    #[serde(skip_serializing_if = "String::is_empty")]
    pub volume_driver: String,
    #[serde(skip_serializing_if = "String::is_empty")]
    pub work_dir: String,

    #[serde(rename = "env", skip_serializing_if = "Vec::is_empty")]
    pub environment: Vec<Environment>,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub secrets: Vec<SecretRef>,
    #[serde(skip_serializing_if = "RestartPolicy::is_unset")]
    pub restart_policy: RestartPolicy,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum NetworkMode {
    Host,
    Isolated,
    Bridge,
}

impl_domain_status_conversions!(NetworkMode {
    Host => "host",
    Isolated => "isolated",
    Bridge => "bridge",
});

/// Environment variable, either literal or read from a secret
#[derive(Debug, Clone, Default, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct Environment {
    pub name: String,
    #[serde(skip_serializing_if = "String::is_empty")]
    pub value: String,
    #[serde(skip_serializing_if = "String::is_empty")]
    pub from_secret: String,
}

impl Environment {
    pub fn value(name: impl Into<String>, value: impl Into<String>) -> Self {
        Self { name: name.into(), value: value.into(), from_secret: String::new() }
    }

    pub fn from_secret(name: impl Into<String>, secret: impl Into<String>) -> Self {
        Self { name: name.into(), value: String::new(), from_secret: secret.into() }
    }
}

/// Secret mounted into a container
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct SecretRef {
    pub name: String,
    /// Mount path inside the container
    #[serde(skip_serializing_if = "String::is_empty")]
    pub filepath: String,
}

/// Docker restart policy
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct RestartPolicy {
    #[serde(skip_serializing_if = "String::is_empty")]
    pub name: String,
    #[serde(skip_serializing_if = "is_zero_u32")]
    pub maximum_retry_count: u32,
}

impl RestartPolicy {
    /// Always restart the container
    #[must_use]
    pub fn always() -> Self {
        Self { name: "always".to_string(), maximum_retry_count: 0 }
    }

    /// Restart on failure, at most `max_retry` times
    #[must_use]
    pub fn on_failure(max_retry: u32) -> Self {
        Self { name: "on-failure".to_string(), maximum_retry_count: max_retry }
    }

    /// Restart unless the container was stopped by hand
    #[must_use]
    pub fn unless_stopped() -> Self {
        Self { name: "unless-stopped".to_string(), maximum_retry_count: 0 }
    }

    /// Never restart
    #[must_use]
    pub fn never() -> Self {
        Self { name: "no".to_string(), maximum_retry_count: 0 }
    }

    fn is_unset(&self) -> bool {
        self.name.is_empty() && self.maximum_retry_count == 0
    }
}

/// Registry credentials
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct DockerAuth {
    #[serde(skip_serializing_if = "String::is_empty")]
    pub username: String,
    /// Leave empty to read the password from `from_secret`
    #[serde(skip_serializing_if = "String::is_empty")]
    pub password: String,
    #[serde(skip_serializing_if = "String::is_empty")]
    pub email: String,
    #[serde(rename = "serverAddress", skip_serializing_if = "String::is_empty")]
    pub server_addr: String,
    #[serde(skip_serializing_if = "String::is_empty")]
    pub from_secret: String,
}

/// Rollout progress computed by the server
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ApplicationDeploymentStatus {
    pub pending: u32,
    pub available: u32,
    pub total: u32,
}

/// Status of one application on one device
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct DeviceApplicationStatus {
    pub device_id: String,
    pub device_name: String,
    pub application_id: String,
    pub project_id: String,
    pub namespace_id: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub last_seen: Option<DateTime<Utc>>,
    pub application_statuses: Vec<WorkloadStatus>,
}

/// Per-container status reported by an agent.
///
/// Only the commonly used fields are typed; the rest of the agent report is
/// kept in `extra`.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct WorkloadStatus {
    pub name: String,
    pub state: String,
    #[serde(skip_serializing_if = "String::is_empty")]
    pub message: String,
    #[serde(flatten)]
    pub extra: BTreeMap<String, serde_json::Value>,
}

#[allow(clippy::trivially_copy_pass_by_ref)]
const fn is_zero(value: &i64) -> bool {
    *value == 0
}

#[allow(clippy::trivially_copy_pass_by_ref)]
const fn is_zero_u32(value: &u32) -> bool {
    *value == 0
}
