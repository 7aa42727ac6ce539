//! Secrets
//!
//! Secret payloads travel base64 encoded. [`Secret::encode_data`] prepares a
//! payload for sending and [`Secret::decode_data`] reverses it on read.

use base64::engine::general_purpose::STANDARD;
use base64::Engine as _;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::impl_domain_status_conversions;

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct Secret {
    #[serde(skip_serializing_if = "String::is_empty")]
    pub id: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub created_at: Option<DateTime<Utc>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub updated_at: Option<DateTime<Utc>>,
    pub name: String,
    #[serde(skip_serializing_if = "String::is_empty")]
    pub project_id: String,
    #[serde(skip_serializing_if = "String::is_empty")]
    pub namespace_id: String,
    #[serde(skip_serializing_if = "is_zero")]
    pub version: i64,
    #[serde(rename = "type", skip_serializing_if = "Option::is_none")]
    pub secret_type: Option<SecretType>,
    #[serde(skip_serializing_if = "String::is_empty")]
    pub data: String,
}

impl Secret {
    /// Environment secret holding `data`
    pub fn environment(name: impl Into<String>, data: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            secret_type: Some(SecretType::Environment),
            data: data.into(),
            ..Self::default()
        }
    }

    /// File secret holding `data`
    pub fn file(name: impl Into<String>, data: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            secret_type: Some(SecretType::File),
            data: data.into(),
            ..Self::default()
        }
    }

    /// Base64 encode `data` unless it already is valid base64.
    ///
    /// Plain text that happens to be valid base64 is sent unchanged.
    pub fn encode_data(&mut self) {
        if STANDARD.decode(&self.data).is_err() {
            self.data = STANDARD.encode(self.data.as_bytes());
        }
    }

    /// Replace base64 `data` with its decoded text. Data that is not base64
    /// or does not decode to UTF-8 is left untouched.
    pub fn decode_data(&mut self) {
        let decoded = STANDARD.decode(&self.data).ok().and_then(|raw| String::from_utf8(raw).ok());
        if let Some(text) = decoded {
            self.data = text;
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum SecretType {
    /// Usable as environment variables and registry credentials
    Environment,
    /// Mounted as a file into containers
    File,
}

impl_domain_status_conversions!(SecretType {
    Environment => "Environment",
    File => "File",
});

#[allow(clippy::trivially_copy_pass_by_ref)]
const fn is_zero(value: &i64) -> bool {
    *value == 0
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_encode_plain_text() {
        let mut secret = Secret::environment("db", "hunter2!");
        secret.encode_data();
        assert_eq!(secret.data, "aHVudGVyMiE=");
    }

    #[test]
    fn test_encode_keeps_existing_base64() {
        let mut secret = Secret::file("cert", "aGVsbG8=");
        secret.encode_data();
        assert_eq!(secret.data, "aGVsbG8=");
    }

    #[test]
    fn test_decode_data() {
        let mut secret = Secret::environment("db", "aHVudGVyMiE=");
        secret.decode_data();
        assert_eq!(secret.data, "hunter2!");

        let mut plain = Secret::environment("db", "not base64!");
        plain.decode_data();
        assert_eq!(plain.data, "not base64!");
    }

    #[test]
    fn test_serializes_type_field() {
        let json = serde_json::to_value(Secret::environment("db", "x")).unwrap();
        assert_eq!(json, serde_json::json!({"name": "db", "type": "Environment", "data": "x"}));
    }
}
