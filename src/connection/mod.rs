// Connection configuration module
//
// Typed configurations for database and web-service endpoints, resolved from
// files, mappings or bare urls.

mod config;
mod factory;

pub use config::{
    ConfigError, ConnectionConfig, ConnectionKind, DbConnectionConfig, ProtoConnectionConfig,
    Result, WsgiConfig,
};
pub use factory::{extract_port, guess_kind_from_port, is_filepath, ConfigFactory, ConfigSource};
