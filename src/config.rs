use std::fmt;
use std::path::{Path, PathBuf};

use figment::{
    Figment, Profile, Provider,
    providers::{Env, Format, Toml},
};
use serde::{self, Deserialize};

use crate::errors::RoostError;

pub const DEFAULT_SECTION: &str = "roost";

const ENV_PREFIX: &str = "ROOST_";

/// Where the private key lives. Exactly one of these survives validation.
#[derive(Debug, Clone, PartialEq)]
pub enum KeySource {
    Dir(PathBuf),
    Bucket { bucket: String, object: String },
}

/// What the file actually holds, before validation. Everything is optional
/// here so a missing key can be reported by name instead of as a bulk
/// deserialization failure.
#[derive(Debug, Clone, Deserialize)]
struct RawConfig {
    aws_access_key_id: Option<String>,
    aws_secret_access_key: Option<String>,
    tag_ssh_user: Option<String>,
    tag_ssh_port: Option<String>,
    key_path: Option<String>,
    s3_key_bucket: Option<String>,
    s3_key_name: Option<String>,
    using_vpn: Option<bool>,
    region: Option<String>,
}

#[derive(Debug, Clone)]
pub struct ConnectConfig {
    pub aws_access_key_id: String,
    pub aws_secret_access_key: String,
    pub tag_ssh_user: String,
    pub tag_ssh_port: String,
    pub using_vpn: bool,
    pub region: Option<String>,
    pub key_source: KeySource,
}

impl fmt::Display for ConnectConfig {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        let key_source = match &self.key_source {
            KeySource::Dir(dir) => format!("dir {}", dir.display()),
            KeySource::Bucket { bucket, object } => format!("s3://{bucket}/{object}"),
        };
        write!(
            f,
            "CONFIG ]---------------------------\n\
             Access Key:   {}..\n\
             User Tag:     {}\n\
             Port Tag:     {}\n\
             Key Source:   {}\n\
             Using VPN:    {}\n\
             Region:       {}",
            redact(&self.aws_access_key_id),
            self.tag_ssh_user,
            self.tag_ssh_port,
            key_source,
            self.using_vpn,
            self.region.as_deref().unwrap_or("default chain"),
        )
    }
}

fn redact(value: &str) -> &str {
    let cut = value
        .char_indices()
        .nth(4)
        .map(|(at, _)| at)
        .unwrap_or(value.len());
    &value[..cut]
}

impl ConnectConfig {
    /// Load and validate one section of a TOML config file. Values from
    /// `ROOST_`-prefixed environment variables override the file.
    pub fn read(path: &Path, section: &str) -> Result<Self, RoostError> {
        if !path.is_file() {
            return Err(RoostError::ConfigFileNotFound(path.to_path_buf()));
        }
        check_section(path, section)?;

        let raw: RawConfig = Figment::new()
            .merge(Toml::file(path).nested())
            .merge(Env::prefixed(ENV_PREFIX).global())
            .select(section)
            .extract()?;

        let key_source = key_source(
            non_empty(raw.key_path),
            non_empty(raw.s3_key_bucket),
            non_empty(raw.s3_key_name),
            path,
        )?;

        Ok(ConnectConfig {
            aws_access_key_id: require(raw.aws_access_key_id, "aws_access_key_id", path)?,
            aws_secret_access_key: require(
                raw.aws_secret_access_key,
                "aws_secret_access_key",
                path,
            )?,
            tag_ssh_user: require(raw.tag_ssh_user, "tag_ssh_user", path)?,
            tag_ssh_port: require(raw.tag_ssh_port, "tag_ssh_port", path)?,
            using_vpn: raw.using_vpn.ok_or_else(|| missing("using_vpn", path))?,
            region: non_empty(raw.region),
            key_source,
        })
    }
}

/// A section that does not exist and a section that exists with keys missing
/// are different complaints. Look at the raw TOML tables to tell them apart.
fn check_section(path: &Path, section: &str) -> Result<(), RoostError> {
    let tables = Toml::file(path).data()?;
    let found = tables
        .get(&Profile::Default)
        .map(|dict| dict.contains_key(section))
        .unwrap_or(false);
    if found {
        Ok(())
    } else {
        Err(RoostError::ConfigSectionNotFound {
            section: section.to_string(),
            path: path.to_path_buf(),
        })
    }
}

fn key_source(
    key_path: Option<String>,
    bucket: Option<String>,
    object: Option<String>,
    path: &Path,
) -> Result<KeySource, RoostError> {
    match (key_path, bucket, object) {
        (Some(_), Some(_), _) | (Some(_), _, Some(_)) => Err(RoostError::KeySourceConflict),
        (None, None, None) => Err(RoostError::KeySourceMissing),
        (None, Some(_), None) => Err(missing("s3_key_name", path)),
        (None, None, Some(_)) => Err(missing("s3_key_bucket", path)),
        (Some(dir), None, None) => Ok(KeySource::Dir(expand_home(&dir))),
        (None, Some(bucket), Some(object)) => Ok(KeySource::Bucket { bucket, object }),
    }
}

fn require(value: Option<String>, key: &str, path: &Path) -> Result<String, RoostError> {
    non_empty(value).ok_or_else(|| missing(key, path))
}

fn missing(key: &str, path: &Path) -> RoostError {
    RoostError::ConfigKeyMissing {
        key: key.to_string(),
        path: path.to_path_buf(),
    }
}

/// Empty strings count as absent, so a blanked-out key reads as missing
/// rather than as a value.
fn non_empty(value: Option<String>) -> Option<String> {
    value.filter(|v| !v.trim().is_empty())
}

fn expand_home(raw: &str) -> PathBuf {
    if raw == "~" {
        if let Some(home) = dirs::home_dir() {
            return home;
        }
    }
    if let Some(rest) = raw.strip_prefix("~/") {
        if let Some(home) = dirs::home_dir() {
            return home.join(rest);
        }
    }
    PathBuf::from(raw)
}
