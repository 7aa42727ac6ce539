//! Resource payloads
//!
//! Field names follow the API's camelCase JSON. Every struct defaults
//! missing fields so that partial server responses and hand-built create
//! requests both work; timestamps are optional and only sent when set.

pub mod application;
pub mod device;
pub mod job;
pub mod logs;
pub mod namespace;
pub mod project;
pub mod registration_token;
pub mod secret;
pub mod user;

pub use application::{
    Application, ApplicationDeploymentStatus, ApplicationSpec, ContainerSpec,
    DeviceApplicationStatus, DockerAuth, Environment, NetworkMode, RestartPolicy, RuntimeType,
    ScheduleType, Scheduling, SecretRef, WorkloadStatus,
};
pub use device::{AgentSettings, CpuInfo, Device, DeviceInfo, DeviceStatus, DockerInfo, OsRelease};
pub use job::{DeviceJob, DeviceJobState, Job, JobSpec};
pub use logs::LogsOptions;
pub use namespace::{Namespace, NamespaceConfig};
pub use project::{
    Action, Effect, Membership, Project, ProjectQuota, Resource, Role, RoleConfig, Rule,
};
pub use registration_token::{
    DeviceNamingStrategy, DeviceNamingStrategyType, DeviceRegistrationToken,
};
pub use secret::{Secret, SecretType};
pub use user::{User, UserQuota};
