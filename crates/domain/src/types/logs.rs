//! Log streaming options

/// Selects which workload logs a log tunnel streams.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct LogsOptions {
    /// Container name; all containers when empty
    pub container: String,
    /// Device to read from
    pub device: String,
    /// Keep streaming new lines
    pub follow: bool,
    /// Number of trailing lines to start with
    pub tail: i64,
}

impl LogsOptions {
    pub fn for_device(device: impl Into<String>) -> Self {
        Self { device: device.into(), ..Self::default() }
    }

    /// Query pairs for the log tunnel request
    pub fn query_pairs(&self) -> [(&'static str, String); 3] {
        [
            ("device", self.device.clone()),
            ("follow", self.follow.to_string()),
            ("tail", self.tail.to_string()),
        ]
    }
}
