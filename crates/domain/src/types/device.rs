//! Devices and the facts their agents report

use std::collections::BTreeMap;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use super::Application;
use crate::impl_domain_status_conversions;

/// A machine running the Synpse agent
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct Device {
    pub id: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub created_at: Option<DateTime<Utc>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub updated_at: Option<DateTime<Utc>>,
    pub project_id: String,

    pub name: String,
    pub registration_token_id: String,
    pub agent_settings: AgentSettings,
    pub info: DeviceInfo,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub last_seen_at: Option<DateTime<Utc>>,
    pub status: DeviceStatus,
    #[serde(skip_serializing_if = "BTreeMap::is_empty")]
    pub labels: BTreeMap<String, String>,
    #[serde(skip_serializing_if = "BTreeMap::is_empty")]
    pub environment_variables: BTreeMap<String, String>,

    /// Only populated by the full device view
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub applications: Vec<Application>,
}

impl Device {
    pub fn is_online(&self) -> bool {
        self.status == DeviceStatus::Online
    }
}

/// Connectivity of a device as last seen by the controller
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum DeviceStatus {
    Online,
    Offline,
    #[default]
    #[serde(other)]
    Unknown,
}

impl_domain_status_conversions!(DeviceStatus {
    Online => "online",
    Offline => "offline",
    Unknown => "unknown",
});

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct AgentSettings {
    pub agent_log_level: String,
    pub desired_agent_version: String,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct DeviceInfo {
    pub device_id: String,
    pub agent_version: String,
    pub agent_log_level: String,
    pub ip_address: String,
    pub architecture: String,
    pub hostname: String,
    pub os_release: OsRelease,
    pub docker: DockerInfo,
    pub cpu_info: CpuInfo,
}

/// CPU facts. Core counts are zero when the agent could not detect them.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct CpuInfo {
    pub brand_name: String,
    pub vendor_string: String,
    pub physical_cores: u32,
    pub threads_per_core: u32,
    pub logical_cores: u32,
    pub family: i32,
    pub model: i32,
    pub hz: i64,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct DockerInfo {
    pub version: String,
    pub privileged_enabled: bool,
    #[serde(rename = "bridgeIP")]
    pub bridge_ip: String,
    pub runtimes: String,
    pub os_type: String,
    pub health: String,
    pub health_description: String,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct OsRelease {
    pub pretty_name: String,
    pub name: String,
    pub version_id: String,
    pub version: String,
    pub id: String,
    pub id_like: String,
}
