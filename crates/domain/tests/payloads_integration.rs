//! Integration tests for API payload decoding
//!
//! Feeds representative server responses through the public payload types.

use synpse_domain::{
    Device, DeviceRegistrationToken, DeviceStatus, Membership, Namespace, Project, ScheduleType,
};

/// Decodes a full device view including embedded applications.
#[test]
fn test_device_full_view() {
    let raw = r#"{
        "id": "dev-1",
        "createdAt": "2023-04-01T10:00:00Z",
        "projectId": "proj-1",
        "name": "edge-berlin-1",
        "agentSettings": {"agentLogLevel": "info", "desiredAgentVersion": "1.4.0"},
        "info": {
            "hostname": "edge-berlin-1",
            "architecture": "arm64",
            "osRelease": {"prettyName": "Debian GNU/Linux 12"},
            "docker": {"version": "24.0.5", "bridgeIP": "172.17.0.1"},
            "cpuInfo": {"brandName": "Cortex-A72", "logicalCores": 4}
        },
        "lastSeenAt": "2023-04-02T08:30:00Z",
        "status": "online",
        "labels": {"site": "berlin"},
        "applications": [{"id": "app-1", "name": "nginx", "scheduling": {"type": "AllDevices"}}]
    }"#;

    let device: Device = serde_json::from_str(raw).expect("device decodes");

    assert!(device.is_online());
    assert_eq!(device.info.docker.bridge_ip, "172.17.0.1");
    assert_eq!(device.info.cpu_info.logical_cores, 4);
    assert_eq!(device.labels.get("site").map(String::as_str), Some("berlin"));
    assert_eq!(device.applications[0].scheduling.schedule_type, Some(ScheduleType::AllDevices));
    assert!(device.last_seen_at.is_some());
}

/// Unknown status strings must not break decoding of the whole device.
#[test]
fn test_device_unknown_status() {
    let device: Device =
        serde_json::from_str(r#"{"id": "dev-2", "status": "provisioning"}"#).expect("decodes");
    assert_eq!(device.status, DeviceStatus::Unknown);
    assert!(!device.is_online());
}

/// Membership lists with `?full` embed the project.
#[test]
fn test_memberships_embed_projects() {
    let raw = r#"[
        {"userId": "u1", "projectId": "p1", "project": {"id": "p1", "name": "fleet", "deviceCount": 12}},
        {"userId": "u1", "projectId": "p2", "project": {"id": "p2", "name": "lab"}}
    ]"#;

    let memberships: Vec<Membership> = serde_json::from_str(raw).expect("decodes");
    let projects: Vec<Project> = memberships.into_iter().map(|m| m.project).collect();

    assert_eq!(projects.len(), 2);
    assert_eq!(projects[0].device_count, 12);
    assert_eq!(projects[1].name, "lab");
}

/// Create requests only carry what the caller set.
#[test]
fn test_create_requests_are_minimal() {
    let json = serde_json::to_value(Namespace::named("production")).expect("encodes");
    assert_eq!(json["name"], "production");
    assert!(json.get("createdAt").is_none());
    assert!(json.get("config").is_none());

    let raw = r#"{
        "id": "t1",
        "maxRegistrations": null,
        "namingStrategy": {"type": "fromHostname"}
    }"#;
    let token: DeviceRegistrationToken = serde_json::from_str(raw).expect("decodes");
    assert_eq!(token.max_registrations, None);
    assert_eq!(token.naming_strategy.strategy_type.as_str(), "fromHostname");
}
