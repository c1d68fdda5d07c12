// Copyright (c) 2026 Amunchain
// Licensed under the Apache License, Version 2.0 (the "License");
// you may not use this file except in compliance with the License.
// You may obtain a copy of the License at
//     http://www.apache.org/licenses/LICENSE-2.0
// Unless required by applicable law or agreed to in writing, software
// distributed under the License is distributed on an "AS IS" BASIS,
// WITHOUT WARRANTIES OR CONDITIONS OF ANY KIND, either express or implied.
// See the License for the specific language governing permissions and
// limitations under the License.

#![forbid(unsafe_code)]
#![warn(missing_docs)]

//! Deterministic registry types and canonical encoding helpers.

use bincode::Options;
use serde::{de::DeserializeOwned, Deserialize, Serialize};
use std::fmt;
use std::fs;
use std::path::Path;
use thiserror::Error;

/// Hard cap for a single decoded alert record.
pub const MAX_RECORD_BYTES: usize = 16 * 1024 * 1024;

/// Canonical serialization error.
#[derive(Debug, Error)]
pub enum CodecError {
    #[error("serialization")]
    Serialize,
    #[error("deserialization")]
    Deserialize,
    #[error("size limit exceeded")]
    TooLarge,
}

/// Canonical bincode options (deterministic).
fn bincode_opts() -> impl Options {
    // Fixint keeps integer widths stable so storage keys sort predictably.
    bincode::DefaultOptions::new()
        .with_fixint_encoding()
        .reject_trailing_bytes()
}

/// Encode with deterministic rules.
pub fn encode_canonical<T: Serialize>(v: &T) -> Result<Vec<u8>, CodecError> {
    bincode_opts()
        .serialize(v)
        .map_err(|_| CodecError::Serialize)
}

/// Decode with a hard size cap.
pub fn decode_canonical_limited<T: DeserializeOwned>(
    bytes: &[u8],
    max: usize,
) -> Result<T, CodecError> {
    if bytes.len() > max {
        return Err(CodecError::TooLarge);
    }
    // The inner limit bounds container lengths claimed by the payload itself.
    bincode_opts()
        .with_limit(max as u64)
        .deserialize(bytes)
        .map_err(|_| CodecError::Deserialize)
}

/// Sequential alert identifier. `0` is never allocated and means "no alert yet".
#[derive(
    Clone, Copy, Debug, Default, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize,
)]
pub struct AlertId(pub u64);

impl AlertId {
    /// Identifier following this one, or `None` once the counter is exhausted.
    pub fn next(self) -> Option<AlertId> {
        self.0.checked_add(1).map(AlertId)
    }

    /// Big-endian bytes; lexicographic order equals numeric order.
    pub fn to_key_bytes(self) -> [u8; 8] {
        self.0.to_be_bytes()
    }
}

impl fmt::Display for AlertId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Opaque, caller-controlled device identifier. Its format is never validated.
#[derive(Clone, Debug, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub enum DeviceId {
    /// Numeric identifier.
    Num(u64),
    /// Free-form identifier (serial number, UDI, ...).
    Name(String),
}

impl From<u64> for DeviceId {
    fn from(v: u64) -> Self {
        DeviceId::Num(v)
    }
}

impl From<&str> for DeviceId {
    fn from(v: &str) -> Self {
        DeviceId::Name(v.to_string())
    }
}

impl From<String> for DeviceId {
    fn from(v: String) -> Self {
        DeviceId::Name(v)
    }
}

impl fmt::Display for DeviceId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            DeviceId::Num(n) => write!(f, "{n}"),
            DeviceId::Name(s) => f.write_str(s),
        }
    }
}

/// Ledger height supplied by the host execution context.
#[derive(
    Clone, Copy, Debug, Default, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize,
)]
pub struct BlockHeight(pub u64);

/// Authenticated caller identity supplied by the host execution context.
#[derive(Clone, Debug, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct Principal(pub String);

impl Principal {
    /// Principal derived from raw public key bytes (hex form).
    pub fn from_public_key(bytes: &[u8]) -> Self {
        Principal(hex::encode(bytes))
    }
}

impl fmt::Display for Principal {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// Severity label. Treated as opaque: the closed set of labels is a caller concern.
#[derive(Clone, Debug, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct Severity(pub String);

impl From<&str> for Severity {
    fn from(v: &str) -> Self {
        Severity(v.to_string())
    }
}

/// Environment of one invocation. Built by the host, never from call arguments.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct ExecContext {
    /// Current ledger height.
    pub height: BlockHeight,
    /// Authenticated sender of the call.
    pub caller: Principal,
}

impl ExecContext {
    /// Create a context.
    pub fn new(height: BlockHeight, caller: Principal) -> Self {
        Self { height, caller }
    }
}

/// Caller-supplied fields of a new alert.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct AlertDraft {
    /// Short title, e.g. "Urgent Recall".
    pub title: String,
    /// Free-form description.
    pub description: String,
    /// Severity label.
    pub severity: Severity,
    /// Affected production batches, in caller order.
    pub affected_batches: Vec<String>,
    /// Affected device types, in caller order.
    pub affected_types: Vec<String>,
}

impl AlertDraft {
    /// Draft with no affected batches or types.
    pub fn new(title: &str, description: &str, severity: &str) -> Self {
        Self {
            title: title.to_string(),
            description: description.to_string(),
            severity: Severity::from(severity),
            affected_batches: Vec::new(),
            affected_types: Vec::new(),
        }
    }

    /// Set affected batches.
    pub fn batches<I, T>(mut self, batches: I) -> Self
    where
        I: IntoIterator<Item = T>,
        T: Into<String>,
    {
        self.affected_batches = batches.into_iter().map(Into::into).collect();
        self
    }

    /// Set affected device types.
    pub fn types<I, T>(mut self, types: I) -> Self
    where
        I: IntoIterator<Item = T>,
        T: Into<String>,
    {
        self.affected_types = types.into_iter().map(Into::into).collect();
        self
    }
}

/// Stored alert. Immutable once written.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct AlertRecord {
    /// Title.
    pub title: String,
    /// Description.
    pub description: String,
    /// Severity label.
    pub severity: Severity,
    /// Affected batches.
    pub affected_batches: Vec<String>,
    /// Affected device types.
    pub affected_types: Vec<String>,
    /// Ledger height at creation.
    pub created_at: BlockHeight,
    /// Caller at creation.
    pub created_by: Principal,
}

impl AlertRecord {
    /// Seal a draft with the invocation context.
    pub fn from_draft(draft: AlertDraft, ctx: &ExecContext) -> Self {
        Self {
            title: draft.title,
            description: draft.description,
            severity: draft.severity,
            affected_batches: draft.affected_batches,
            affected_types: draft.affected_types,
            created_at: ctx.height,
            created_by: ctx.caller.clone(),
        }
    }
}

/// Device registry entry.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct DeviceEntry {
    /// Existence flag.
    pub exists: bool,
}

/// Alerts linked to one device, in link order (duplicates kept).
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct DeviceAlerts {
    /// Linked alert identifiers.
    pub alert_ids: Vec<AlertId>,
}

impl DeviceAlerts {
    /// True if `id` is linked at least once.
    pub fn contains(&self, id: AlertId) -> bool {
        self.alert_ids.contains(&id)
    }
}

/// Configuration errors.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("read config")]
    Read,
    #[error("parse config: {0}")]
    Parse(String),
}

/// Registry host configuration root.
#[derive(Clone, Debug, Default, Serialize, Deserialize)]
pub struct RegistryConfig {
    /// Node settings.
    #[serde(default)]
    pub node: NodeSettings,
    /// HTTP (metrics) endpoint.
    #[serde(default)]
    pub http: HttpConfig,
    /// Logging output.
    #[serde(default)]
    pub logging: LoggingConfig,
    /// Optional input size limits.
    #[serde(default)]
    pub limits: LimitsConfig,
}

impl RegistryConfig {
    /// Parse from TOML text.
    pub fn from_toml_str(s: &str) -> Result<Self, ConfigError> {
        toml::from_str(s).map_err(|e| ConfigError::Parse(e.to_string()))
    }

    /// Load from a TOML file.
    pub fn load(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        let raw = fs::read_to_string(path).map_err(|_| ConfigError::Read)?;
        Self::from_toml_str(&raw)
    }
}

/// Node settings.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct NodeSettings {
    /// Human-readable name.
    pub name: String,
    /// Data directory (sled db).
    pub data_dir: String,
}

impl Default for NodeSettings {
    fn default() -> Self {
        Self {
            name: "alerts".to_string(),
            data_dir: "./data".to_string(),
        }
    }
}

/// HTTP config.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct HttpConfig {
    /// Listen address, e.g. 0.0.0.0:9090.
    pub listen_addr: String,
}

impl Default for HttpConfig {
    fn default() -> Self {
        Self {
            listen_addr: "127.0.0.1:9090".to_string(),
        }
    }
}

/// Log line format.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum LogFormat {
    /// Human-readable single-line output.
    #[default]
    Compact,
    /// Structured JSON lines.
    Json,
}

/// Logging config.
#[derive(Clone, Debug, Default, Serialize, Deserialize)]
pub struct LoggingConfig {
    /// Output format.
    #[serde(default)]
    pub format: LogFormat,
}

/// Input limits for `create_alert`. `0` disables a limit.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct LimitsConfig {
    /// Max bytes of any single text field.
    #[serde(default)]
    pub max_text_bytes: usize,
    /// Max entries of `affected_batches` / `affected_types`.
    #[serde(default)]
    pub max_list_len: usize,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn alert_id_key_bytes_sort_numerically() {
        assert!(AlertId(2).to_key_bytes() < AlertId(10).to_key_bytes());
        assert!(AlertId(255).to_key_bytes() < AlertId(256).to_key_bytes());
    }

    #[test]
    fn alert_id_next_stops_at_max() {
        assert_eq!(AlertId(0).next(), Some(AlertId(1)));
        assert_eq!(AlertId(u64::MAX).next(), None);
    }

    #[test]
    fn decode_rejects_oversize_and_trailing_bytes() {
        let bytes = encode_canonical(&DeviceEntry { exists: true }).unwrap();
        assert!(matches!(
            decode_canonical_limited::<DeviceEntry>(&bytes, 0),
            Err(CodecError::TooLarge)
        ));

        let mut trailing = bytes.clone();
        trailing.push(0);
        assert!(decode_canonical_limited::<DeviceEntry>(&trailing, 64).is_err());

        let back: DeviceEntry = decode_canonical_limited(&bytes, 64).unwrap();
        assert!(back.exists);
    }

    #[test]
    fn numeric_and_named_devices_do_not_collide() {
        let a = encode_canonical(&DeviceId::from(1)).unwrap();
        let b = encode_canonical(&DeviceId::from("1")).unwrap();
        assert_ne!(a, b);
    }

    #[test]
    fn principal_from_key_is_hex() {
        assert_eq!(Principal::from_public_key(&[0xab, 0x01]).to_string(), "ab01");
    }

    #[test]
    fn config_defaults_apply_to_missing_sections() {
        let cfg = RegistryConfig::from_toml_str(
            r#"
            [node]
            name = "recall-1"
            data_dir = "/srv/alerts"

            [logging]
            format = "json"
            "#,
        )
        .unwrap();
        assert_eq!(cfg.node.name, "recall-1");
        assert_eq!(cfg.logging.format, LogFormat::Json);
        assert_eq!(cfg.http.listen_addr, "127.0.0.1:9090");
        assert_eq!(cfg.limits, LimitsConfig::default());
    }

    #[test]
    fn config_rejects_unknown_log_format() {
        let err = RegistryConfig::from_toml_str("[logging]\nformat = \"xml\"\n").unwrap_err();
        assert!(matches!(err, ConfigError::Parse(_)));
    }
}
