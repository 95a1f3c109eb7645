use serde_json::Value;
use sha2::{Digest, Sha256};
use std::collections::BTreeMap;
use std::fmt::{Debug, Display};
use thiserror::Error;

/// Length of the hex digest prefix used for content-derived keys
pub const HASH_PREFIX_LEN: usize = 8;

/// Placeholder rendered for a designated argument that was not supplied
const MISSING_ARG: &str = "None";

/// Errors raised while configuring instrumentation wrappers
///
/// These indicate a mistake in how wrappers were composed. They are returned
/// to whoever builds the wrapper and are never captured into an outcome.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum InstrumentError {
    #[error("Invalid argument specifier: expected null, a name or a list of names, got {0}")]
    InvalidArgumentSpecifier(String),

    #[error("Invalid argument type for {wrapper}: {reason}")]
    InvalidArgumentType {
        wrapper: &'static str,
        reason: String,
    },
}

pub type Result<T> = std::result::Result<T, InstrumentError>;

/// Which arguments are embedded in a call key
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub enum ArgSpec {
    /// No designated argument; the key falls back to a content hash
    #[default]
    None,
    /// A single designated argument
    Name(String),
    /// Several designated arguments, looked up by keyword
    Names(Vec<String>),
}

impl ArgSpec {
    pub fn name(name: impl Into<String>) -> Self {
        Self::Name(name.into())
    }

    pub fn names<I, S>(names: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self::Names(names.into_iter().map(Into::into).collect())
    }

    pub fn is_none(&self) -> bool {
        matches!(self, Self::None)
    }
}

impl From<&str> for ArgSpec {
    fn from(name: &str) -> Self {
        Self::Name(name.to_string())
    }
}

impl From<String> for ArgSpec {
    fn from(name: String) -> Self {
        Self::Name(name)
    }
}

impl From<Vec<String>> for ArgSpec {
    fn from(names: Vec<String>) -> Self {
        Self::Names(names)
    }
}

impl From<Vec<&str>> for ArgSpec {
    fn from(names: Vec<&str>) -> Self {
        Self::names(names)
    }
}

/// Build a specifier from loosely typed configuration
///
/// Accepts `null`, a non-empty string, or a non-empty list of non-empty strings.
impl TryFrom<&Value> for ArgSpec {
    type Error = InstrumentError;

    fn try_from(value: &Value) -> Result<Self> {
        let invalid = || InstrumentError::InvalidArgumentSpecifier(value.to_string());

        match value {
            Value::Null => Ok(Self::None),
            Value::String(name) if !name.is_empty() => Ok(Self::Name(name.clone())),
            Value::Array(items) if !items.is_empty() => items
                .iter()
                .map(|item| match item {
                    Value::String(name) if !name.is_empty() => Ok(name.clone()),
                    _ => Err(invalid()),
                })
                .collect::<Result<Vec<_>>>()
                .map(Self::Names),
            _ => Err(invalid()),
        }
    }
}

/// String renderings of one call's positional and keyword arguments
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ArgList {
    positional: Vec<String>,
    keyword: BTreeMap<String, String>,
}

impl ArgList {
    pub fn new() -> Self {
        Self::default()
    }

    /// Append a positional argument
    pub fn arg(mut self, value: impl Display) -> Self {
        self.positional.push(value.to_string());
        self
    }

    /// Set a keyword argument, replacing any previous value for `name`
    pub fn kwarg(mut self, name: impl Into<String>, value: impl Display) -> Self {
        self.keyword.insert(name.into(), value.to_string());
        self
    }

    pub fn positional(&self) -> &[String] {
        &self.positional
    }

    /// Keyword arguments, sorted by name
    pub fn keyword(&self) -> &BTreeMap<String, String> {
        &self.keyword
    }

    pub fn get(&self, name: &str) -> Option<&str> {
        self.keyword.get(name).map(String::as_str)
    }

    pub fn is_empty(&self) -> bool {
        self.positional.is_empty() && self.keyword.is_empty()
    }
}

/// Types that can describe themselves as call arguments for key derivation
///
/// Implemented for scalars, tuples of up to four `Display` values, vectors
/// and [`ArgList`]. Argument structs with named fields should implement it by
/// emitting keyword arguments:
///
/// ```
/// use suthing::instrument::{ArgList, CallArgs};
///
/// struct Query {
///     table: String,
///     limit: usize,
/// }
///
/// impl CallArgs for Query {
///     fn call_args(&self) -> ArgList {
///         ArgList::new()
///             .kwarg("table", &self.table)
///             .kwarg("limit", self.limit)
///     }
/// }
/// ```
pub trait CallArgs {
    fn call_args(&self) -> ArgList;
}

impl CallArgs for ArgList {
    fn call_args(&self) -> ArgList {
        self.clone()
    }
}

impl CallArgs for () {
    fn call_args(&self) -> ArgList {
        ArgList::new()
    }
}

impl<T: Debug> CallArgs for Vec<T> {
    fn call_args(&self) -> ArgList {
        ArgList::new().arg(format!("{:?}", self))
    }
}

macro_rules! impl_call_args_scalar {
    ($($ty:ty),+ $(,)?) => {
        $(
            impl CallArgs for $ty {
                fn call_args(&self) -> ArgList {
                    ArgList::new().arg(self)
                }
            }
        )+
    };
}

impl_call_args_scalar!(
    i8, i16, i32, i64, i128, isize, u8, u16, u32, u64, u128, usize, f32, f64, bool, char, String,
    &str,
);

macro_rules! impl_call_args_tuple {
    ($($name:ident),+) => {
        impl<$($name: Display),+> CallArgs for ($($name,)+) {
            #[allow(non_snake_case)]
            fn call_args(&self) -> ArgList {
                let ($($name,)+) = self;
                let list = ArgList::new();
                $(let list = list.arg($name);)+
                list
            }
        }
    };
}

impl_call_args_tuple!(A);
impl_call_args_tuple!(A, B);
impl_call_args_tuple!(A, B, C);
impl_call_args_tuple!(A, B, C, D);

/// A wrapped function's name together with its key specifier
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CallSite {
    name: String,
    spec: ArgSpec,
}

impl CallSite {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            spec: ArgSpec::None,
        }
    }

    pub fn with_spec(mut self, spec: ArgSpec) -> Self {
        self.spec = spec;
        self
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn spec(&self) -> &ArgSpec {
        &self.spec
    }

    /// Call key for one invocation: `<name>(<derived id>)`
    pub fn key(&self, args: &ArgList) -> String {
        format!("{}({})", self.name, derive_id(&self.spec, args))
    }
}

/// Derive the identifying part of a call key
///
/// - several names: `a=1,b=None`, looked up in keyword arguments
/// - one name: keyword value, else the first positional, rendered `x=4`
/// - no name, keyword and positional arguments present: first positional
/// - otherwise: [`content_hash`]
pub fn derive_id(spec: &ArgSpec, args: &ArgList) -> String {
    match spec {
        ArgSpec::Names(names) => names
            .iter()
            .map(|name| format!("{}={}", name, args.get(name).unwrap_or(MISSING_ARG)))
            .collect::<Vec<_>>()
            .join(","),
        ArgSpec::Name(name) => {
            let value = args
                .get(name)
                .or_else(|| args.positional().first().map(String::as_str))
                .unwrap_or(MISSING_ARG);
            format!("{}={}", name, value)
        }
        ArgSpec::None => match args.positional().first() {
            Some(first) if !args.keyword().is_empty() => first.clone(),
            _ => content_hash(args),
        },
    }
}

/// First [`HASH_PREFIX_LEN`] hex characters of a SHA-256 digest over every
/// positional argument (in order) and every keyword argument (by name)
pub fn content_hash(args: &ArgList) -> String {
    let mut hasher = Sha256::new();
    for value in args.positional() {
        hasher.update(value.as_bytes());
        hasher.update([0u8]);
    }
    for (name, value) in args.keyword() {
        hasher.update(name.as_bytes());
        hasher.update(b"=");
        hasher.update(value.as_bytes());
        hasher.update([0u8]);
    }

    let mut digest = hex::encode(hasher.finalize());
    digest.truncate(HASH_PREFIX_LEN);
    digest
}
