//! One-off jobs
//!
//! A job runs its containers once per scheduled device, like `docker run`
//! without a restart policy.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use super::{ContainerSpec, Scheduling, WorkloadStatus};
use crate::impl_domain_status_conversions;

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct Job {
    pub id: String,

    pub name: String,
    #[serde(skip_serializing_if = "String::is_empty")]
    pub description: String,
    pub scheduling: Scheduling,
    pub spec: JobSpec,
    pub desired_state: DeviceJobState,

    // Set by the server
    pub version: i64,
    pub config_version: i64,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub created_at: Option<DateTime<Utc>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub updated_at: Option<DateTime<Utc>>,
    /// When the last device instance finished
    #[serde(skip_serializing_if = "Option::is_none")]
    pub completed_at: Option<DateTime<Utc>>,
    pub project_id: String,
    pub namespace_id: String,
    #[serde(rename = "status")]
    pub state: DeviceJobState,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub device_jobs: Vec<DeviceJob>,
}

impl Job {
    /// Path identifier used by update calls: the id when known, else the
    /// name.
    pub fn identifier(&self) -> Option<&str> {
        [self.id.as_str(), self.name.as_str()].into_iter().find(|s| !s.is_empty())
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct JobSpec {
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub containers: Vec<ContainerSpec>,
}

/// One job instance on one device
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct DeviceJob {
    pub id: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub created_at: Option<DateTime<Utc>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub updated_at: Option<DateTime<Utc>>,
    pub device_id: String,
    pub job_id: String,
    pub project_id: String,
    pub namespace_id: String,
    pub desired_state: DeviceJobState,
    pub state: DeviceJobState,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub started_at: Option<DateTime<Utc>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub completed_at: Option<DateTime<Utc>>,
    /// Reported by the device
    pub statuses: Vec<WorkloadStatus>,
}

/// Overall job state. A single failed container fails the job.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum DeviceJobState {
    #[default]
    Pending,
    Running,
    Failed,
    Succeeded,
    Stopped,
    #[serde(other)]
    Unknown,
}

impl_domain_status_conversions!(DeviceJobState {
    Pending => "pending",
    Running => "running",
    Failed => "failed",
    Succeeded => "succeeded",
    Stopped => "stopped",
    Unknown => "unknown",
});

impl DeviceJobState {
    /// Whether the job will not change state on its own anymore
    pub const fn is_finished(self) -> bool {
        matches!(self, Self::Failed | Self::Succeeded | Self::Stopped)
    }
}
