use std::fmt;
use std::fs;
use std::path::Path;

use tracing::debug;

use crate::aws::s3;
use crate::config::KeySource;
use crate::errors::RoostError;
use crate::ssh::target::ConnectionTarget;

/// Private key text, held in memory for one connection attempt.
#[derive(Clone)]
pub struct KeyMaterial {
    pub data: String,
}

impl fmt::Debug for KeyMaterial {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("KeyMaterial(..)")
    }
}

pub async fn load(
    source: &KeySource,
    target: &ConnectionTarget,
    sdk_config: &aws_config::SdkConfig,
) -> Result<KeyMaterial, RoostError> {
    let data = match source {
        KeySource::Dir(dir) => {
            let key_name = target
                .key_name
                .as_deref()
                .ok_or_else(|| RoostError::KeyPairMissing(target.instance_id.clone()))?;
            read_key_file(dir, key_name)?
        }
        KeySource::Bucket { bucket, object } => s3::fetch_key(sdk_config, bucket, object).await?,
    };

    Ok(KeyMaterial { data })
}

/// Amazon hands keys out with a .pem extension, so a bare key-pair name
/// gets a second look with the suffix appended.
fn read_key_file(dir: &Path, key_name: &str) -> Result<String, RoostError> {
    let exact = dir.join(key_name);
    let suffixed = dir.join(format!("{key_name}.pem"));

    let path = [exact, suffixed.clone()]
        .into_iter()
        .find(|p| p.is_file())
        .ok_or_else(|| RoostError::KeyNotFound(suffixed.display().to_string()))?;

    debug!(path = %path.display(), "reading key file");
    fs::read_to_string(&path).map_err(RoostError::from)
}
