//! Multi-format file loading and dumping
//!
//! Values travel as plain [`serde_json::Value`] trees. The format is inferred
//! from the file extension; a trailing `.gz` adds gzip compression and the
//! format comes from the suffix before it.
//!
//! | Extension        | Format                     |
//! |------------------|----------------------------|
//! | `.yml`, `.yaml`  | YAML                       |
//! | `.json`          | JSON                       |
//! | `.jsonld`        | JSON lines (one per line)  |
//! | `.csv`           | CSV with a header row      |
//! | `.toml`          | TOML                       |
//! | `.env`           | `KEY=VALUE` lines          |
//! | anything else    | plain text                 |

use flate2::read::GzDecoder;
use flate2::write::GzEncoder;
use serde::de::DeserializeOwned;
use serde::Serialize;
use serde_json::{Map, Value};
use std::fmt;
use std::fs;
use std::io::{self, Read, Write};
use std::path::{Path, PathBuf};
use thiserror::Error;

/// Errors from loading or dumping files
#[derive(Error, Debug)]
pub enum FileError {
    #[error("Failed to read {}: {source}", .path.display())]
    Read {
        path: PathBuf,
        #[source]
        source: io::Error,
    },

    #[error("Failed to write {}: {source}", .path.display())]
    Write {
        path: PathBuf,
        #[source]
        source: io::Error,
    },

    #[error("gzip stream error: {0}")]
    Gzip(#[source] io::Error),

    #[error("Content is not valid UTF-8: {0}")]
    Utf8(#[from] std::string::FromUtf8Error),

    #[error("Invalid JSON: {0}")]
    Json(#[from] serde_json::Error),

    #[error("Invalid YAML: {0}")]
    Yaml(#[from] serde_yaml_ng::Error),

    #[error("Invalid TOML: {0}")]
    TomlParse(#[from] toml::de::Error),

    #[error("Cannot write TOML: {0}")]
    TomlWrite(#[from] toml::ser::Error),

    #[error("Invalid CSV at record {record}: {reason}")]
    Csv { record: usize, reason: String },

    #[error("Cannot write CSV: {0}")]
    CsvWrite(#[source] csv::Error),

    #[error("Invalid env file at line {line}: {reason}")]
    Env { line: usize, reason: String },

    #[error("Will not read gzipped env files")]
    CompressedEnv,

    #[error("Cannot dump {format}: {reason}")]
    Unsupported { format: FileType, reason: String },
}

pub type Result<T> = std::result::Result<T, FileError>;

/// Supported file formats
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum FileType {
    Yaml,
    Json,
    JsonLd,
    Csv,
    Toml,
    Env,
    Txt,
}

impl FileType {
    /// Format for a suffix such as `.yaml` (leading dot optional)
    pub fn from_suffix(suffix: &str) -> Self {
        match suffix.trim_start_matches('.').to_ascii_lowercase().as_str() {
            "yml" | "yaml" => Self::Yaml,
            "json" => Self::Json,
            "jsonld" => Self::JsonLd,
            "csv" => Self::Csv,
            "toml" => Self::Toml,
            "env" => Self::Env,
            _ => Self::Txt,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Yaml => "yaml",
            Self::Json => "json",
            Self::JsonLd => "jsonld",
            Self::Csv => "csv",
            Self::Toml => "toml",
            Self::Env => "env",
            Self::Txt => "txt",
        }
    }
}

impl fmt::Display for FileType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Compression applied on top of the file format
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Compression {
    #[default]
    None,
    Gzip,
}

/// All suffixes of a file name, e.g. `[".jsonld", ".gz"]`
///
/// A dot-file without further suffixes (`.env`) is its own suffix.
pub fn suffixes(path: &Path) -> Vec<String> {
    let name = path
        .file_name()
        .and_then(|n| n.to_str())
        .unwrap_or_default();
    let trimmed = name.trim_start_matches('.');

    let found: Vec<String> = trimmed
        .split('.')
        .skip(1)
        .filter(|part| !part.is_empty())
        .map(|part| format!(".{}", part))
        .collect();

    if found.is_empty() && trimmed.len() < name.len() && !trimmed.is_empty() {
        return vec![format!(".{}", trimmed)];
    }
    found
}

/// Format and compression for a path, inferred from its suffixes
pub fn detect(path: &Path) -> (FileType, Compression) {
    let lemmas = suffixes(path);
    match lemmas.as_slice() {
        [.., format, last] if last == ".gz" => (FileType::from_suffix(format), Compression::Gzip),
        [last] if last == ".gz" => (FileType::Txt, Compression::Gzip),
        [.., last] => (FileType::from_suffix(last), Compression::None),
        [] => (FileType::Txt, Compression::None),
    }
}

/// Expand a leading `~` to the user's home directory
pub fn expand_user(path: &Path) -> PathBuf {
    let Ok(rest) = path.strip_prefix("~") else {
        return path.to_path_buf();
    };
    match std::env::var_os("HOME") {
        Some(home) => PathBuf::from(home).join(rest),
        None => path.to_path_buf(),
    }
}

/// Format-dispatching file reader/writer
pub struct FileHandle;

impl FileHandle {
    /// Load a file, inferring format and compression from its name
    ///
    /// # Example
    /// ```no_run
    /// use suthing::file_handle::FileHandle;
    ///
    /// let records = FileHandle::load("data/example.jsonld.gz")?;
    /// assert!(records.is_array());
    /// # Ok::<(), suthing::file_handle::FileError>(())
    /// ```
    pub fn load(path: impl AsRef<Path>) -> Result<Value> {
        let path = expand_user(path.as_ref());
        let (format, compression) = detect(&path);
        tracing::debug!(path = %path.display(), %format, ?compression, "loading file");

        let bytes = fs::read(&path).map_err(|source| FileError::Read {
            path: path.clone(),
            source,
        })?;
        Self::decode(&bytes, format, compression)
    }

    /// Load a file and deserialize it into `T`
    pub fn load_as<T: DeserializeOwned>(path: impl AsRef<Path>) -> Result<T> {
        Ok(serde_json::from_value(Self::load(path)?)?)
    }

    /// Load embedded bytes (e.g. from `include_bytes!`), inferring the format
    /// from `name`
    pub fn load_bytes(name: &str, bytes: &[u8]) -> Result<Value> {
        let (format, compression) = detect(Path::new(name));
        Self::decode(bytes, format, compression)
    }

    /// Serialize `item` to `path`, inferring format and compression from its name
    pub fn dump<T: Serialize + ?Sized>(item: &T, path: impl AsRef<Path>) -> Result<()> {
        let path = expand_user(path.as_ref());
        let (format, compression) = detect(&path);
        tracing::debug!(path = %path.display(), %format, ?compression, "dumping file");

        let value = serde_json::to_value(item)?;
        let mut bytes = Self::encode(&value, format)?;
        if compression == Compression::Gzip {
            bytes = gzip(&bytes)?;
        }

        fs::write(&path, bytes).map_err(|source| FileError::Write { path, source })
    }

    /// Decode raw file content
    pub fn decode(bytes: &[u8], format: FileType, compression: Compression) -> Result<Value> {
        let raw = match compression {
            Compression::None => bytes.to_vec(),
            Compression::Gzip if format == FileType::Env => return Err(FileError::CompressedEnv),
            Compression::Gzip => gunzip(bytes)?,
        };
        let text = String::from_utf8(raw)?;

        match format {
            FileType::Json => Ok(serde_json::from_str(&text)?),
            FileType::JsonLd => text
                .lines()
                .filter(|line| !line.trim().is_empty())
                .map(|line| serde_json::from_str(line).map_err(FileError::from))
                .collect::<Result<Vec<_>>>()
                .map(Value::Array),
            FileType::Yaml => Ok(serde_yaml_ng::from_str(&text)?),
            FileType::Toml => Ok(toml::from_str(&text)?),
            FileType::Csv => parse_csv(&text),
            FileType::Env => parse_env(&text),
            FileType::Txt => Ok(Value::String(text)),
        }
    }

    /// Encode a value in the given format (uncompressed)
    pub fn encode(value: &Value, format: FileType) -> Result<Vec<u8>> {
        let text = match format {
            FileType::Json => serde_json::to_string_pretty(value)? + "\n",
            FileType::JsonLd => {
                let items = value.as_array().ok_or_else(|| FileError::Unsupported {
                    format,
                    reason: "expected a list of records".to_string(),
                })?;
                let mut out = String::new();
                for item in items {
                    out.push_str(&serde_json::to_string(item)?);
                    out.push('\n');
                }
                out
            }
            FileType::Yaml => serde_yaml_ng::to_string(value)?,
            FileType::Toml => toml::to_string_pretty(value)?,
            FileType::Csv => write_csv(value)?,
            FileType::Env => write_env(value)?,
            FileType::Txt => match value {
                Value::String(s) => s.clone(),
                other => other.to_string(),
            },
        };
        Ok(text.into_bytes())
    }
}

fn gunzip(bytes: &[u8]) -> Result<Vec<u8>> {
    let mut out = Vec::new();
    GzDecoder::new(bytes)
        .read_to_end(&mut out)
        .map_err(FileError::Gzip)?;
    Ok(out)
}

fn gzip(bytes: &[u8]) -> Result<Vec<u8>> {
    let mut encoder = GzEncoder::new(Vec::new(), flate2::Compression::default());
    encoder.write_all(bytes).map_err(FileError::Gzip)?;
    encoder.finish().map_err(FileError::Gzip)
}

/// Render a scalar for a text cell: strings verbatim, null empty, the rest as JSON
fn cell_text(value: &Value) -> String {
    match value {
        Value::String(s) => s.clone(),
        Value::Null => String::new(),
        other => other.to_string(),
    }
}

/// Line number (1-based, header included) of a CSV error
fn csv_record(err: &csv::Error) -> usize {
    err.position().map_or(0, |pos| pos.record() as usize + 1)
}

/// CSV with a header row → list of records keyed by column name
fn parse_csv(text: &str) -> Result<Value> {
    let mut reader = csv::ReaderBuilder::new()
        .has_headers(true)
        .from_reader(text.as_bytes());
    let invalid = |err: csv::Error| FileError::Csv {
        record: csv_record(&err),
        reason: err.to_string(),
    };

    let header = reader.headers().map_err(invalid)?.clone();
    reader
        .records()
        .map(|row| {
            let row = row.map_err(invalid)?;
            let record: Map<String, Value> = header
                .iter()
                .map(str::to_string)
                .zip(row.iter().map(|cell| Value::String(cell.to_string())))
                .collect();
            Ok(Value::Object(record))
        })
        .collect::<Result<Vec<_>>>()
        .map(Value::Array)
}

/// List of objects → CSV; columns are the union of keys in first-seen order
fn write_csv(value: &Value) -> Result<String> {
    let unsupported = |reason: &str| FileError::Unsupported {
        format: FileType::Csv,
        reason: reason.to_string(),
    };

    let records = value
        .as_array()
        .ok_or_else(|| unsupported("expected a list of records"))?;

    let mut columns: Vec<String> = Vec::new();
    for record in records {
        let fields = record
            .as_object()
            .ok_or_else(|| unsupported("every record must be an object"))?;
        for key in fields.keys() {
            if !columns.contains(key) {
                columns.push(key.clone());
            }
        }
    }
    if columns.is_empty() {
        return Ok(String::new());
    }

    let mut writer = csv::Writer::from_writer(Vec::new());
    writer.write_record(&columns).map_err(FileError::CsvWrite)?;
    for record in records {
        let row = columns
            .iter()
            .map(|c| record.get(c).map(cell_text).unwrap_or_default());
        writer.write_record(row).map_err(FileError::CsvWrite)?;
    }

    let bytes = writer
        .into_inner()
        .map_err(|err| FileError::CsvWrite(err.into_error().into()))?;
    Ok(String::from_utf8(bytes)?)
}

/// `KEY=VALUE` lines → object of strings
fn parse_env(text: &str) -> Result<Value> {
    let mut vars = Map::new();

    for (i, raw) in text.lines().enumerate() {
        let line = raw.trim();
        if line.is_empty() || line.starts_with('#') {
            continue;
        }
        let line = line.strip_prefix("export ").unwrap_or(line);
        let (key, value) = line.split_once('=').ok_or_else(|| FileError::Env {
            line: i + 1,
            reason: "expected KEY=VALUE".to_string(),
        })?;

        let key = key.trim();
        if key.is_empty() {
            return Err(FileError::Env {
                line: i + 1,
                reason: "empty variable name".to_string(),
            });
        }
        vars.insert(key.to_string(), Value::String(unquote(value.trim()).to_string()));
    }

    Ok(Value::Object(vars))
}

fn unquote(value: &str) -> &str {
    for quote in ['"', '\''] {
        if value.len() >= 2 && value.starts_with(quote) && value.ends_with(quote) {
            return &value[1..value.len() - 1];
        }
    }
    // Unquoted values may carry a trailing comment
    match value.find(" #") {
        Some(pos) => value[..pos].trim_end(),
        None => value,
    }
}

/// Object → `KEY=VALUE` lines
fn write_env(value: &Value) -> Result<String> {
    let vars = value.as_object().ok_or_else(|| FileError::Unsupported {
        format: FileType::Env,
        reason: "expected a mapping of variables".to_string(),
    })?;

    let mut out = String::new();
    for (key, value) in vars {
        let text = cell_text(value);
        if text.chars().any(|c| c.is_whitespace() || c == '#' || c == '"') {
            out.push_str(&format!("{}=\"{}\"\n", key, text.replace('"', "\\\"")));
        } else {
            out.push_str(&format!("{}={}\n", key, text));
        }
    }
    Ok(out)
}
