use std::fmt;
use std::path::PathBuf;

/// Everything that can go wrong in one run. External failures are folded
/// into these variants at the call site that produced them, so the rest of
/// the code only ever sees this taxonomy.
#[derive(Debug, PartialEq)]
pub enum RoostError {
    MalformedFilter(String),
    NoInstanceFound(String),
    InvalidSelection { given: String, max: usize },
    CredentialsInvalid(String),
    InventoryQueryFailed(String),
    KeySourceConflict,
    KeySourceMissing,
    KeyNotFound(String),
    KeyPairMissing(String),
    KeyFetchFailed(String),
    KeyInvalid(String),
    TagNotFound { tag: String, instance: String },
    PortInvalid { tag: String, value: String },
    AddressMissing { instance: String, kind: &'static str },
    ConnectionFailed(String),
    ConfigFileNotFound(PathBuf),
    ConfigSectionNotFound { section: String, path: PathBuf },
    ConfigKeyMissing { key: String, path: PathBuf },
    ConfigInvalid(String),
    Io(String),
}

impl fmt::Display for RoostError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            RoostError::MalformedFilter(raw) => {
                write!(f, "invalid tag filter '{raw}': must be name=value or a bare tag name")
            }
            RoostError::NoInstanceFound(filters) => {
                write!(f, "no running instance matched {filters}")
            }
            RoostError::InvalidSelection { given, max } => {
                write!(f, "invalid selection '{given}': choose a number between 0 and {max}")
            }
            RoostError::CredentialsInvalid(msg) => write!(f, "credentials rejected: {msg}"),
            RoostError::InventoryQueryFailed(msg) => write!(f, "instance query failed: {msg}"),
            RoostError::KeySourceConflict => write!(
                f,
                "config sets both key_path and s3_key_bucket/s3_key_name; configure exactly one key source"
            ),
            RoostError::KeySourceMissing => write!(
                f,
                "config sets neither key_path nor s3_key_bucket/s3_key_name; configure exactly one key source"
            ),
            RoostError::KeyNotFound(name) => write!(f, "key {name} not found"),
            RoostError::KeyPairMissing(instance) => {
                write!(f, "instance {instance} has no key pair name")
            }
            RoostError::KeyFetchFailed(msg) => write!(f, "key fetch failed: {msg}"),
            RoostError::KeyInvalid(msg) => write!(f, "unusable private key: {msg}"),
            RoostError::TagNotFound { tag, instance } => {
                write!(f, "tag {tag} not found for instance {instance}")
            }
            RoostError::PortInvalid { tag, value } => {
                write!(f, "tag {tag} holds '{value}', which is not a port number")
            }
            RoostError::AddressMissing { instance, kind } => {
                write!(f, "instance {instance} has no {kind} address")
            }
            RoostError::ConnectionFailed(msg) => write!(f, "connection failed: {msg}"),
            RoostError::ConfigFileNotFound(path) => {
                write!(f, "{} config file not found", path.display())
            }
            RoostError::ConfigSectionNotFound { section, path } => {
                write!(f, "section {section} not found in config file {}", path.display())
            }
            RoostError::ConfigKeyMissing { key, path } => {
                write!(f, "{key} not found in {}", path.display())
            }
            RoostError::ConfigInvalid(msg) => write!(f, "could not parse config file: {msg}"),
            RoostError::Io(msg) => write!(f, "i/o error: {msg}"),
        }
    }
}

impl std::error::Error for RoostError {}

impl From<std::io::Error> for RoostError {
    fn from(err: std::io::Error) -> Self {
        RoostError::Io(err.to_string())
    }
}

impl From<figment::Error> for RoostError {
    fn from(err: figment::Error) -> Self {
        RoostError::ConfigInvalid(err.to_string())
    }
}

impl From<russh::Error> for RoostError {
    fn from(err: russh::Error) -> Self {
        RoostError::ConnectionFailed(error_chain(&err))
    }
}

impl From<russh::keys::Error> for RoostError {
    fn from(err: russh::keys::Error) -> Self {
        RoostError::KeyInvalid(err.to_string())
    }
}

/// Render an error with its source chain, `outer: cause: cause`. The SDK
/// buries connection details two levels deep.
pub(crate) fn error_chain(err: &dyn std::error::Error) -> String {
    let mut text = err.to_string();
    let mut source = err.source();
    while let Some(cause) = source {
        text.push_str(": ");
        text.push_str(&cause.to_string());
        source = cause.source();
    }
    text
}
