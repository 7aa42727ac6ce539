//! Integration tests for the typed resource operations
//!
//! Each test mounts the route a call is expected to hit and checks the
//! method, path, query and body the wrapper produces, plus how the reply is
//! decoded.

#[path = "support.rs"]
mod support;

use std::collections::BTreeMap;

use serde_json::json;
use synpse_domain::{
    Application, Device, DeviceRegistrationToken, Job, LogsOptions, Namespace, PaginationOptions,
    Project, Secret,
};
use synpse_infra::api::{ApiCommands, ApiError, ListDevicesRequest, RequestContext};
use synpse_infra::ApiClient;
use support::{commands_for, project_path, BASIC_AUTH};
use wiremock::matchers::{
    body_partial_json, body_string, header, method, path, query_param, query_param_is_missing,
};
use wiremock::{Mock, MockServer, ResponseTemplate};

fn ctx() -> RequestContext {
    RequestContext::new()
}

fn ok_json(body: serde_json::Value) -> ResponseTemplate {
    ResponseTemplate::new(200).set_body_json(body)
}

#[tokio::test]
async fn list_projects_unwraps_memberships() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/api/memberships"))
        .and(query_param("full", ""))
        .and(header("authorization", BASIC_AUTH))
        .respond_with(ok_json(json!([
            {"userId": "u1", "projectId": "p1", "project": {"id": "p1", "name": "alpha"}},
            {"userId": "u1", "projectId": "p2", "project": {"id": "p2", "name": "beta"}}
        ])))
        .expect(1)
        .mount(&server)
        .await;

    let projects = commands_for(&server).list_projects(&ctx()).await.unwrap();

    let names: Vec<_> = projects.iter().map(|p| p.name.as_str()).collect();
    assert_eq!(names, ["alpha", "beta"]);
    assert_eq!(projects[1].id, "p2");
}

#[tokio::test]
async fn create_project_posts_outside_the_project_scope() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/api/projects"))
        .and(body_partial_json(json!({"name": "fleet"})))
        .respond_with(ok_json(json!({"id": "p9", "name": "fleet"})))
        .expect(1)
        .mount(&server)
        .await;

    let project = Project { name: "fleet".into(), ..Project::default() };
    let created = commands_for(&server).create_project(&ctx(), &project).await.unwrap();
    assert_eq!(created.id, "p9");
}

#[tokio::test]
async fn list_devices_sends_filters_and_reads_page_headers() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path(project_path("devices")))
        .and(query_param("q", "power-plant"))
        .and(query_param("labels", r#"{"env":"prod","type":"rpi"}"#))
        .and(query_param("pageSize", "2"))
        .and(query_param("pageToken", "t1"))
        .respond_with(
            ResponseTemplate::new(200)
                .set_body_json(json!([{"id": "d1", "name": "one"}, {"id": "d2", "name": "two"}]))
                .insert_header("Next-Page-Token", "t2")
                .insert_header("Total-Items", "5")
                .insert_header("Page-Size", "2"),
        )
        .expect(1)
        .mount(&server)
        .await;

    let request = ListDevicesRequest {
        search_query: "power-plant".into(),
        labels: BTreeMap::from([
            ("type".to_string(), "rpi".to_string()),
            ("env".to_string(), "prod".to_string()),
        ]),
        pagination: PaginationOptions {
            page_token: Some("t1".into()),
            page_size: Some(2),
        },
    };
    let page = commands_for(&server).list_devices(&ctx(), &request).await.unwrap();

    assert_eq!(page.devices.len(), 2);
    assert_eq!(page.pagination.next_page_token, "t2");
    assert_eq!(page.pagination.previous_page_token, "");
    assert_eq!(page.pagination.total_items, 5);
    assert_eq!(page.pagination.page_size, 2);
}

#[tokio::test]
async fn list_devices_without_filters_sends_no_query() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path(project_path("devices")))
        .and(query_param_is_missing("q"))
        .and(query_param_is_missing("labels"))
        .and(query_param_is_missing("pageSize"))
        .respond_with(ok_json(json!([])))
        .expect(1)
        .mount(&server)
        .await;

    let page =
        commands_for(&server).list_devices(&ctx(), &ListDevicesRequest::default()).await.unwrap();

    assert!(page.devices.is_empty());
    assert_eq!(page.pagination.total_items, 0);
    assert!(!page.pagination.has_next());
}

#[tokio::test]
async fn device_get_update_reboot_delete() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path(project_path("devices/d1")))
        .and(query_param("full", ""))
        .respond_with(ok_json(json!({
            "id": "d1",
            "name": "gateway",
            "labels": {"env": "prod"}
        })))
        .expect(1)
        .mount(&server)
        .await;
    Mock::given(method("PATCH"))
        .and(path(project_path("devices/d1")))
        .and(body_partial_json(json!({"name": "renamed", "labels": {"env": "dev"}})))
        .respond_with(ok_json(json!({"id": "d1", "name": "renamed"})))
        .expect(1)
        .mount(&server)
        .await;
    Mock::given(method("POST"))
        .and(path(project_path("devices/d1/reboot")))
        .and(body_string(""))
        .respond_with(ResponseTemplate::new(200))
        .expect(1)
        .mount(&server)
        .await;
    Mock::given(method("DELETE"))
        .and(path(project_path("devices/d1")))
        .respond_with(ResponseTemplate::new(200))
        .expect(1)
        .mount(&server)
        .await;
    let commands = commands_for(&server);

    let mut device: Device = commands.get_device(&ctx(), "d1").await.unwrap();
    assert_eq!(device.name, "gateway");
    assert_eq!(device.labels.get("env").map(String::as_str), Some("prod"));

    device.name = "renamed".into();
    device.labels.insert("env".into(), "dev".into());
    let updated = commands.update_device(&ctx(), &device).await.unwrap();
    assert_eq!(updated.name, "renamed");

    commands.reboot_device(&ctx(), "d1").await.unwrap();
    commands.delete_device(&ctx(), "d1").await.unwrap();
}

#[tokio::test]
async fn namespace_lifecycle() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path(project_path("namespaces")))
        .and(body_partial_json(json!({"name": "team-a"})))
        .respond_with(ok_json(json!({"id": "n1", "name": "team-a"})))
        .mount(&server)
        .await;
    Mock::given(method("GET"))
        .and(path(project_path("namespaces")))
        .respond_with(ok_json(json!([{"id": "n1", "name": "team-a"}])))
        .mount(&server)
        .await;
    Mock::given(method("GET"))
        .and(path(project_path("namespaces/team-a")))
        .respond_with(ok_json(json!({"id": "n1", "name": "team-a"})))
        .mount(&server)
        .await;
    Mock::given(method("PUT"))
        .and(path(project_path("namespaces/team-a")))
        .respond_with(ok_json(json!({"id": "n1", "name": "team-a"})))
        .expect(1)
        .mount(&server)
        .await;
    Mock::given(method("DELETE"))
        .and(path(project_path("namespaces/team-a")))
        .respond_with(ResponseTemplate::new(200))
        .expect(1)
        .mount(&server)
        .await;
    let commands = commands_for(&server);

    let namespace = Namespace { name: "team-a".into(), ..Namespace::default() };
    let created = commands.create_namespace(&ctx(), &namespace).await.unwrap();
    assert_eq!(created.id, "n1");
    assert_eq!(commands.list_namespaces(&ctx()).await.unwrap().len(), 1);
    assert_eq!(commands.get_namespace(&ctx(), "team-a").await.unwrap().id, "n1");
    commands.update_namespace(&ctx(), &created).await.unwrap();
    commands.delete_namespace(&ctx(), "team-a").await.unwrap();
}

#[tokio::test]
async fn applications_and_allocations() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path(project_path("namespaces/default/applications")))
        .and(body_partial_json(json!({"name": "nginx"})))
        .respond_with(ok_json(json!({"id": "a1", "name": "nginx"})))
        .expect(1)
        .mount(&server)
        .await;
    Mock::given(method("PATCH"))
        .and(path(project_path("namespaces/default/applications/nginx")))
        .respond_with(ok_json(json!({"id": "a1", "name": "nginx"})))
        .expect(1)
        .mount(&server)
        .await;
    Mock::given(method("GET"))
        .and(path(project_path("namespaces/default/applications/nginx/allocations")))
        .respond_with(ok_json(json!([{
            "deviceId": "d1",
            "deviceName": "gateway",
            "applicationId": "a1",
            "applicationStatuses": [{"name": "nginx", "state": "running"}]
        }])))
        .expect(1)
        .mount(&server)
        .await;
    Mock::given(method("DELETE"))
        .and(path(project_path("namespaces/default/applications/nginx")))
        .respond_with(ResponseTemplate::new(200))
        .expect(1)
        .mount(&server)
        .await;
    let commands = commands_for(&server);

    let application = Application { name: "nginx".into(), ..Application::default() };
    let created = commands.create_application(&ctx(), "default", &application).await.unwrap();
    commands.update_application(&ctx(), "default", &created).await.unwrap();

    let allocations =
        commands.list_application_allocations(&ctx(), "default", "nginx").await.unwrap();
    assert_eq!(allocations.len(), 1);
    assert_eq!(allocations[0].device_name, "gateway");
    assert_eq!(allocations[0].application_statuses[0].state, "running");

    commands.delete_application(&ctx(), "default", "nginx").await.unwrap();
}

#[tokio::test]
async fn secrets_are_encoded_on_write_and_decoded_on_read() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path(project_path("namespaces/default/secrets")))
        .and(body_partial_json(json!({
            "name": "db",
            "type": "Environment",
            "data": "aHVudGVyMg=="
        })))
        .respond_with(ok_json(json!({"id": "s1", "name": "db"})))
        .expect(1)
        .mount(&server)
        .await;
    Mock::given(method("PATCH"))
        .and(path(project_path("namespaces/default/secrets/db")))
        .and(body_partial_json(json!({"data": "aHVudGVyMw=="})))
        .respond_with(ok_json(json!({"id": "s1", "name": "db"})))
        .expect(1)
        .mount(&server)
        .await;
    Mock::given(method("GET"))
        .and(path(project_path("namespaces/default/secrets/db")))
        .respond_with(ok_json(json!({
            "id": "s1",
            "name": "db",
            "data": "aHVudGVyMg=="
        })))
        .expect(1)
        .mount(&server)
        .await;
    let commands = commands_for(&server);

    let created =
        commands.create_secret(&ctx(), "default", &Secret::environment("db", "hunter2")).await;
    assert_eq!(created.unwrap().id, "s1");
    commands.update_secret(&ctx(), "default", &Secret::environment("db", "hunter3")).await.unwrap();

    let secret = commands.get_secret(&ctx(), "default", "db").await.unwrap();
    assert_eq!(secret.data, "hunter2");
}

#[tokio::test]
async fn jobs_are_addressed_by_name_or_id() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path(project_path("namespaces/default/jobs")))
        .and(body_partial_json(json!({"name": "backup"})))
        .respond_with(ok_json(json!({"id": "j1", "name": "backup"})))
        .expect(1)
        .mount(&server)
        .await;
    Mock::given(method("PATCH"))
        .and(path(project_path("namespaces/default/jobs/j1")))
        .respond_with(ok_json(json!({"id": "j1", "name": "backup"})))
        .expect(1)
        .mount(&server)
        .await;
    Mock::given(method("GET"))
        .and(path(project_path("namespaces/default/jobs")))
        .respond_with(ok_json(json!([{"id": "j1", "name": "backup"}])))
        .expect(1)
        .mount(&server)
        .await;
    Mock::given(method("DELETE"))
        .and(path(project_path("namespaces/default/jobs/backup")))
        .respond_with(ResponseTemplate::new(200))
        .expect(1)
        .mount(&server)
        .await;
    let commands = commands_for(&server);

    let job = Job { name: "backup".into(), ..Job::default() };
    let created = commands.create_job(&ctx(), "default", &job).await.unwrap();
    commands.update_job(&ctx(), "default", &created).await.unwrap();
    assert_eq!(commands.list_jobs(&ctx(), "default").await.unwrap().len(), 1);
    commands.delete_job(&ctx(), "default", "backup").await.unwrap();
}

#[tokio::test]
async fn registration_tokens() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path(project_path("device-registration-tokens")))
        .respond_with(ok_json(json!({
            "id": "rt1",
            "name": "default",
            "labels": {"site": "lab"}
        })))
        .expect(1)
        .mount(&server)
        .await;
    Mock::given(method("PUT"))
        .and(path(project_path("device-registration-tokens/rt1")))
        .and(body_partial_json(json!({"id": "rt1", "maxRegistrations": 5})))
        .respond_with(ok_json(json!({"id": "rt1"})))
        .expect(1)
        .mount(&server)
        .await;
    Mock::given(method("DELETE"))
        .and(path(project_path("device-registration-tokens/rt1")))
        .respond_with(ResponseTemplate::new(200))
        .expect(1)
        .mount(&server)
        .await;
    let commands = commands_for(&server);

    let mut token = commands.default_registration_token(&ctx()).await.unwrap();
    assert_eq!(token.labels.get("site").map(String::as_str), Some("lab"));

    token.max_registrations = Some(5);
    commands.update_registration_token(&ctx(), &token).await.unwrap();
    commands.delete_registration_token(&ctx(), "rt1").await.unwrap();
}

#[tokio::test]
async fn argument_errors_never_reach_the_server() {
    let server = MockServer::start().await;
    Mock::given(wiremock::matchers::any())
        .respond_with(ResponseTemplate::new(200))
        .expect(0)
        .mount(&server)
        .await;
    let commands = commands_for(&server);
    let ctx = ctx();

    let namespace_errors = [
        commands.list_applications(&ctx, "").await.unwrap_err(),
        commands.list_secrets(&ctx, "").await.unwrap_err(),
        commands.get_secret(&ctx, "", "").await.unwrap_err(),
        commands.update_job(&ctx, "", &Job::default()).await.unwrap_err(),
        commands.delete_namespace(&ctx, "").await.unwrap_err(),
    ];
    for err in namespace_errors {
        assert_eq!(err.to_string(), "namespace not specified");
    }

    let cases: Vec<(ApiError, &str)> = vec![
        (commands.get_secret(&ctx, "default", "").await.unwrap_err(), "secret name not specified"),
        (
            commands.update_secret(&ctx, "default", &Secret::default()).await.unwrap_err(),
            "secret name not specified",
        ),
        (
            commands.delete_secret(&ctx, "default", "").await.unwrap_err(),
            "secret name or ID not specified",
        ),
        (
            commands.get_application(&ctx, "default", "").await.unwrap_err(),
            "application name or ID not selected",
        ),
        (
            commands.list_application_allocations(&ctx, "default", "").await.unwrap_err(),
            "application name or ID not selected",
        ),
        (
            commands
                .application_logs(&ctx, "default", "", &LogsOptions::for_device("d1"))
                .await
                .unwrap_err(),
            "application name or ID not selected",
        ),
        (commands.get_job(&ctx, "default", "").await.unwrap_err(), "name or ID not selected"),
        (commands.delete_job(&ctx, "default", "").await.unwrap_err(), "name or ID not selected"),
        (
            commands.update_job(&ctx, "default", &Job::default()).await.unwrap_err(),
            "job ID or name must be specified",
        ),
        (
            commands.update_namespace(&ctx, &Namespace::default()).await.unwrap_err(),
            "namespace name is required",
        ),
        (
            commands
                .update_registration_token(&ctx, &DeviceRegistrationToken::default())
                .await
                .unwrap_err(),
            "registration token ID not specified",
        ),
    ];
    for (err, message) in cases {
        assert!(matches!(err, ApiError::InvalidArgument(_)), "{err:?}");
        assert_eq!(err.to_string(), message);
    }
}

#[tokio::test]
async fn project_scoped_calls_need_a_project() {
    let server = MockServer::start().await;
    let client = ApiClient::builder()
        .access_key("k")
        .base_url(format!("{}/api", server.uri()))
        .build()
        .unwrap();
    let commands = ApiCommands::new(std::sync::Arc::new(client));

    let err = commands.list_devices(&ctx(), &ListDevicesRequest::default()).await.unwrap_err();
    assert_eq!(err.to_string(), "project not specified");
    let err = commands.list_namespaces(&ctx()).await.unwrap_err();
    assert_eq!(err.to_string(), "project not specified");
    assert!(server.received_requests().await.unwrap().is_empty());
}

#[tokio::test]
async fn decode_failures_name_the_resource() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path(project_path("namespaces/default/applications/web")))
        .respond_with(ResponseTemplate::new(200).set_body_string("<html>"))
        .mount(&server)
        .await;

    let err =
        commands_for(&server).get_application(&ctx(), "default", "web").await.unwrap_err();
    assert!(matches!(err, ApiError::Unmarshal { context: "application", .. }));
    assert!(err.to_string().starts_with("error unmarshalling application:"));
}

#[tokio::test]
async fn server_validation_message_is_returned_verbatim() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .respond_with(ResponseTemplate::new(400).set_body_string("job name is required"))
        .mount(&server)
        .await;

    let err = commands_for(&server).create_job(&ctx(), "default", &Job::default()).await;
    assert_eq!(err.unwrap_err().to_string(), "job name is required");
}
