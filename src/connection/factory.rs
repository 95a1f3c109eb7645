use super::config::{ConfigError, ConnectionConfig, ConnectionKind, Result};
use crate::file_handle::FileHandle;
use serde_json::{Map, Value};
use std::ops::RangeInclusive;
use std::path::{Path, PathBuf};
use url::Url;

const ARANGO_PORTS: RangeInclusive<u16> = 8529..=8559;
const NEO4J_PORTS: RangeInclusive<u16> = 7400..=7699;

/// Where a connection configuration comes from
#[derive(Debug, Clone, PartialEq)]
pub enum ConfigSource {
    Url(String),
    Path(PathBuf),
    Map(Map<String, Value>),
}

impl From<&str> for ConfigSource {
    /// Strings that look like file paths load from disk; anything else is
    /// treated as a connection url
    fn from(s: &str) -> Self {
        if is_filepath(s) {
            Self::Path(PathBuf::from(s))
        } else {
            Self::Url(s.to_string())
        }
    }
}

impl From<String> for ConfigSource {
    fn from(s: String) -> Self {
        Self::from(s.as_str())
    }
}

impl From<&Path> for ConfigSource {
    fn from(p: &Path) -> Self {
        Self::Path(p.to_path_buf())
    }
}

impl From<PathBuf> for ConfigSource {
    fn from(p: PathBuf) -> Self {
        Self::Path(p)
    }
}

impl From<Map<String, Value>> for ConfigSource {
    fn from(m: Map<String, Value>) -> Self {
        Self::Map(m)
    }
}

/// Whether `input` names a file rather than a url
///
/// Strings carrying a `scheme://` prefix are urls. Otherwise the last path
/// component needs an extension of at least two characters.
pub fn is_filepath(input: &str) -> bool {
    if input.contains("://") && Url::parse(input).is_ok() {
        return false;
    }
    Path::new(input)
        .extension()
        .and_then(|ext| ext.to_str())
        .is_some_and(|ext| ext.len() > 1)
}

/// Builds [`ConnectionConfig`]s from paths, mappings or bare urls
pub struct ConfigFactory;

impl ConfigFactory {
    /// Resolve `source` into a typed configuration
    ///
    /// When neither `db_type` nor `connection_type` is given the kind is
    /// guessed from the port.
    pub fn create_config(source: impl Into<ConfigSource>) -> Result<ConnectionConfig> {
        let mut data = match source.into() {
            ConfigSource::Url(url) => {
                if url.trim().is_empty() {
                    return Err(ConfigError::MissingSource);
                }
                let mut map = Map::new();
                map.insert("url".to_string(), Value::String(url));
                map
            }
            ConfigSource::Path(path) => match FileHandle::load(&path)? {
                Value::Object(map) => map,
                other => return Err(ConfigError::NotAMapping(other.to_string())),
            },
            ConfigSource::Map(map) => map,
        };

        let has_kind = ["db_type", "connection_type"]
            .iter()
            .any(|k| data.get(*k).is_some_and(|v| !v.is_null()));
        if !has_kind {
            if let Some(kind) = extract_port(&data).and_then(guess_kind_from_port) {
                tracing::debug!(%kind, "connection kind guessed from port");
                data.insert(
                    "connection_type".to_string(),
                    Value::String(kind.as_str().to_string()),
                );
            }
        }

        ConnectionConfig::from_map(data)
    }

    pub fn from_value(value: &Value) -> Result<ConnectionConfig> {
        match value {
            Value::Object(map) => Self::create_config(map.clone()),
            Value::String(s) => Self::create_config(s.as_str()),
            other => Err(ConfigError::NotAMapping(other.to_string())),
        }
    }
}

/// Well-known port ranges of the supported databases
pub fn guess_kind_from_port(port: u16) -> Option<ConnectionKind> {
    if ARANGO_PORTS.contains(&port) {
        Some(ConnectionKind::Arango)
    } else if NEO4J_PORTS.contains(&port) {
        Some(ConnectionKind::Neo4j)
    } else {
        None
    }
}

/// The `port` field, else the url's port, else the scheme default
pub fn extract_port(data: &Map<String, Value>) -> Option<u16> {
    let explicit = match data.get("port") {
        Some(Value::Number(n)) => n.as_u64().and_then(|n| u16::try_from(n).ok()),
        Some(Value::String(s)) => s.trim().parse().ok(),
        _ => None,
    };
    explicit.or_else(|| {
        ["url", "hosts"]
            .iter()
            .find_map(|k| data.get(*k).and_then(Value::as_str))
            .and_then(|u| Url::parse(u).ok())
            .and_then(|u| u.port_or_known_default())
    })
}
