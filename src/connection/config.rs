use crate::file_handle::FileError;
use serde::{Deserialize, Deserializer, Serialize};
use serde_json::{Map, Value};
use std::collections::BTreeMap;
use std::fmt;
use std::str::FromStr;
use thiserror::Error;
use url::Url;

/// Errors building connection configurations
#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("Missing 'db_type' or 'connection_type' in configuration")]
    MissingKind,

    #[error("Connection type '{kind}' not supported. Should be one of: {expected}")]
    UnsupportedKind { kind: String, expected: String },

    #[error("Unknown field(s) for {kind} connection: {}", .fields.join(", "))]
    UnknownFields {
        kind: ConnectionKind,
        fields: Vec<String>,
    },

    #[error("Expected a mapping, got {0}")]
    NotAMapping(String),

    #[error("Invalid connection field: {0}")]
    InvalidField(#[from] serde_json::Error),

    #[error("Invalid URL '{url}': {source}")]
    InvalidUrl {
        url: String,
        #[source]
        source: url::ParseError,
    },

    #[error("No configuration source given: expected a path, a mapping or a url")]
    MissingSource,

    #[error(transparent)]
    File(#[from] FileError),
}

pub type Result<T> = std::result::Result<T, ConfigError>;

/// Backend a connection configuration targets
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ConnectionKind {
    Arango,
    Neo4j,
    Wsgi,
    TigerGraph,
}

impl ConnectionKind {
    pub const ALL: [ConnectionKind; 4] = [Self::Arango, Self::Neo4j, Self::Wsgi, Self::TigerGraph];

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Arango => "arango",
            Self::Neo4j => "neo4j",
            Self::Wsgi => "wsgi",
            Self::TigerGraph => "tigergraph",
        }
    }

    /// Whether a configuration type exists for this kind
    pub fn has_config(&self) -> bool {
        !matches!(self, Self::TigerGraph)
    }

    /// Keys the configuration type of this kind accepts
    fn accepts(&self, field: &str) -> bool {
        PROTO_FIELDS.contains(&field)
            || match self {
                Self::Arango | Self::Neo4j => DB_FIELDS.contains(&field),
                Self::Wsgi => WSGI_FIELDS.contains(&field),
                Self::TigerGraph => false,
            }
    }

    fn unsupported(kind: impl Into<String>) -> ConfigError {
        ConfigError::UnsupportedKind {
            kind: kind.into(),
            expected: Self::ALL
                .iter()
                .filter(|k| k.has_config())
                .map(|k| k.as_str())
                .collect::<Vec<_>>()
                .join(", "),
        }
    }
}

impl fmt::Display for ConnectionKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for ConnectionKind {
    type Err = ConfigError;

    fn from_str(s: &str) -> Result<Self> {
        let wanted = s.trim().to_ascii_lowercase();
        Self::ALL
            .into_iter()
            .find(|kind| kind.as_str() == wanted)
            .ok_or_else(|| Self::unsupported(s))
    }
}

const PROTO_FIELDS: &[&str] = &[
    "url",
    "hosts",
    "hostname",
    "ip_addr",
    "port",
    "protocol",
    "request_timeout",
    "comment",
];
const DB_FIELDS: &[&str] = &["username", "password", "database", "cred_name", "cred_pass"];
const WSGI_FIELDS: &[&str] = &["path", "paths", "listen_addr"];

/// Accept ports written either as numbers or as strings
fn de_port<'de, D>(deserializer: D) -> std::result::Result<Option<String>, D::Error>
where
    D: Deserializer<'de>,
{
    #[derive(Deserialize)]
    #[serde(untagged)]
    enum Port {
        Number(u64),
        Text(String),
    }

    Ok(Option::<Port>::deserialize(deserializer)?.map(|port| match port {
        Port::Number(n) => n.to_string(),
        Port::Text(s) => s,
    }))
}

/// Host/port/url settings shared by every protocol-based connection
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ProtoConnectionConfig {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub url: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub hosts: Option<String>,
    #[serde(alias = "ip_addr", skip_serializing_if = "Option::is_none")]
    pub hostname: Option<String>,
    #[serde(deserialize_with = "de_port", skip_serializing_if = "Option::is_none")]
    pub port: Option<String>,
    pub protocol: String,
    /// Seconds
    pub request_timeout: f64,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub comment: Option<String>,
}

impl Default for ProtoConnectionConfig {
    fn default() -> Self {
        Self {
            url: None,
            hosts: None,
            hostname: None,
            port: None,
            protocol: "http".to_string(),
            request_timeout: 60.0,
            comment: None,
        }
    }
}

impl ProtoConnectionConfig {
    /// Reconcile `url` with the individual host/port/protocol fields
    ///
    /// A given `url` (or `hosts`) wins and fills in protocol, port and
    /// hostname. Otherwise the url is built as `protocol://hostname[:port]`.
    pub fn normalize(&mut self) -> Result<()> {
        if self.url.is_none() {
            self.url = self.hosts.clone();
        }

        match &self.url {
            Some(raw) => {
                let parsed = parse_url(raw)?;
                self.protocol = parsed.scheme().to_string();
                if let Some(port) = parsed.port() {
                    self.port = Some(port.to_string());
                }
                if self.hostname.is_none() {
                    self.hostname = parsed.host_str().map(str::to_string);
                }
            }
            None => {
                if let Some(host) = &self.hostname {
                    let mut url = format!("{}://{}", self.protocol, host);
                    if let Some(port) = &self.port {
                        url.push(':');
                        url.push_str(port);
                    }
                    self.url = Some(url);
                }
            }
        }
        Ok(())
    }

    pub fn host(&self) -> Option<&str> {
        self.hostname.as_deref()
    }

    /// Explicit port, else the url's port or the scheme's default port
    pub fn port_number(&self) -> Option<u16> {
        self.port
            .as_deref()
            .and_then(|p| p.trim().parse().ok())
            .or_else(|| {
                self.url
                    .as_deref()
                    .and_then(|u| Url::parse(u).ok())
                    .and_then(|u| u.port_or_known_default())
            })
    }
}

fn parse_url(raw: &str) -> Result<Url> {
    Url::parse(raw).map_err(|source| ConfigError::InvalidUrl {
        url: raw.to_string(),
        source,
    })
}

/// Database connection settings
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct DbConnectionConfig {
    #[serde(flatten)]
    pub proto: ProtoConnectionConfig,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub username: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub password: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub database: Option<String>,
    /// Older spelling of `username`
    #[serde(skip_serializing_if = "Option::is_none")]
    pub cred_name: Option<String>,
    /// Older spelling of `password`
    #[serde(skip_serializing_if = "Option::is_none")]
    pub cred_pass: Option<String>,
}

impl DbConnectionConfig {
    pub fn normalize(&mut self) -> Result<()> {
        self.proto.normalize()?;
        if self.username.as_deref().map_or(true, str::is_empty) && self.cred_name.is_some() {
            self.username = self.cred_name.clone();
        }
        if self.password.as_deref().map_or(true, str::is_empty) && self.cred_pass.is_some() {
            self.password = self.cred_pass.clone();
        }
        Ok(())
    }
}

/// Web service (WSGI) endpoint settings
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct WsgiConfig {
    #[serde(flatten)]
    pub proto: ProtoConnectionConfig,
    pub path: String,
    pub paths: BTreeMap<String, String>,
    pub listen_addr: String,
}

impl Default for WsgiConfig {
    fn default() -> Self {
        Self {
            proto: ProtoConnectionConfig::default(),
            path: "/".to_string(),
            paths: BTreeMap::new(),
            listen_addr: "0.0.0.0".to_string(),
        }
    }
}

impl WsgiConfig {
    /// A non-root path in the url becomes `path`; otherwise `path` is
    /// appended to the url
    pub fn normalize(&mut self) -> Result<()> {
        self.proto.normalize()?;
        if !self.path.starts_with('/') {
            self.path.insert(0, '/');
        }

        let Some(raw) = self.proto.url.clone() else {
            return Ok(());
        };
        let url_path = parse_url(&raw)?.path().to_string();
        if !url_path.is_empty() && url_path != "/" {
            self.path = url_path;
        } else {
            self.proto.url = Some(format!("{}{}", raw.trim_end_matches('/'), self.path));
        }
        Ok(())
    }
}

/// A connection configuration for one of the supported backends
#[derive(Debug, Clone, PartialEq)]
pub enum ConnectionConfig {
    Arango(DbConnectionConfig),
    Neo4j(DbConnectionConfig),
    Wsgi(WsgiConfig),
}

impl ConnectionConfig {
    /// Build from a mapping carrying `db_type` or `connection_type`
    ///
    /// # Example
    /// ```
    /// use serde_json::json;
    /// use suthing::connection::{ConnectionConfig, ConnectionKind};
    ///
    /// let config = ConnectionConfig::from_value(&json!({
    ///     "db_type": "arango",
    ///     "hostname": "127.0.0.1",
    ///     "port": 8529,
    /// }))?;
    /// assert_eq!(config.kind(), ConnectionKind::Arango);
    /// assert_eq!(config.url(), Some("http://127.0.0.1:8529"));
    /// # Ok::<(), suthing::connection::ConfigError>(())
    /// ```
    pub fn from_map(mut data: Map<String, Value>) -> Result<Self> {
        let db_type = data.remove("db_type");
        let connection_type = data.remove("connection_type");
        let kind = match db_type.filter(is_set).or(connection_type.filter(is_set)) {
            Some(Value::String(s)) => s.parse::<ConnectionKind>()?,
            Some(other) => return Err(ConnectionKind::unsupported(other.to_string())),
            None => return Err(ConfigError::MissingKind),
        };

        let unknown: Vec<String> = data.keys().filter(|k| !kind.accepts(k)).cloned().collect();
        if !unknown.is_empty() && kind.has_config() {
            return Err(ConfigError::UnknownFields {
                kind,
                fields: unknown,
            });
        }

        let fields = Value::Object(data);
        let mut config = match kind {
            ConnectionKind::Arango => Self::Arango(serde_json::from_value(fields)?),
            ConnectionKind::Neo4j => Self::Neo4j(serde_json::from_value(fields)?),
            ConnectionKind::Wsgi => Self::Wsgi(serde_json::from_value(fields)?),
            ConnectionKind::TigerGraph => return Err(ConnectionKind::unsupported(kind.as_str())),
        };
        config.normalize()?;

        tracing::debug!(kind = %config.kind(), url = ?config.url(), "connection config resolved");
        Ok(config)
    }

    pub fn from_value(value: &Value) -> Result<Self> {
        match value {
            Value::Object(map) => Self::from_map(map.clone()),
            other => Err(ConfigError::NotAMapping(other.to_string())),
        }
    }

    fn normalize(&mut self) -> Result<()> {
        match self {
            Self::Arango(db) | Self::Neo4j(db) => db.normalize(),
            Self::Wsgi(wsgi) => wsgi.normalize(),
        }
    }

    pub fn kind(&self) -> ConnectionKind {
        match self {
            Self::Arango(_) => ConnectionKind::Arango,
            Self::Neo4j(_) => ConnectionKind::Neo4j,
            Self::Wsgi(_) => ConnectionKind::Wsgi,
        }
    }

    pub fn proto(&self) -> &ProtoConnectionConfig {
        match self {
            Self::Arango(db) | Self::Neo4j(db) => &db.proto,
            Self::Wsgi(wsgi) => &wsgi.proto,
        }
    }

    pub fn as_db(&self) -> Option<&DbConnectionConfig> {
        match self {
            Self::Arango(db) | Self::Neo4j(db) => Some(db),
            Self::Wsgi(_) => None,
        }
    }

    pub fn as_wsgi(&self) -> Option<&WsgiConfig> {
        match self {
            Self::Wsgi(wsgi) => Some(wsgi),
            _ => None,
        }
    }

    pub fn url(&self) -> Option<&str> {
        self.proto().url.as_deref()
    }

    pub fn host(&self) -> Option<&str> {
        self.proto().host()
    }

    pub fn port(&self) -> Option<u16> {
        self.proto().port_number()
    }

    pub fn protocol(&self) -> &str {
        &self.proto().protocol
    }

    /// Plain mapping with `connection_type` set, suitable for dumping
    pub fn to_value(&self) -> Result<Value> {
        let mut value = match self {
            Self::Arango(db) | Self::Neo4j(db) => serde_json::to_value(db)?,
            Self::Wsgi(wsgi) => serde_json::to_value(wsgi)?,
        };
        if let Value::Object(map) = &mut value {
            map.insert(
                "connection_type".to_string(),
                Value::String(self.kind().as_str().to_string()),
            );
        }
        Ok(value)
    }
}

fn is_set(value: &Value) -> bool {
    match value {
        Value::Null => false,
        Value::String(s) => !s.is_empty(),
        _ => true,
    }
}
