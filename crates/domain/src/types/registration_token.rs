//! Device registration tokens

use std::collections::BTreeMap;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::impl_domain_status_conversions;

/// Token devices present when enrolling into a project
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct DeviceRegistrationToken {
    pub id: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub created_at: Option<DateTime<Utc>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub updated_at: Option<DateTime<Utc>>,
    pub project_id: String,
    /// Unlimited when `None`
    pub max_registrations: Option<u32>,
    pub name: String,
    pub description: String,
    /// Applied to every device registered with this token
    pub labels: BTreeMap<String, String>,
    pub environment_variables: BTreeMap<String, String>,
    pub naming_strategy: DeviceNamingStrategy,

    /// Read only
    pub device_count: u32,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct DeviceNamingStrategy {
    #[serde(rename = "type")]
    pub strategy_type: DeviceNamingStrategyType,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum DeviceNamingStrategyType {
    #[default]
    #[serde(rename = "default")]
    Default,
    #[serde(rename = "fromHostname")]
    FromHostname,
}

impl_domain_status_conversions!(DeviceNamingStrategyType {
    Default => "default",
    FromHostname => "fromHostname",
});
