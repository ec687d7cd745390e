use aws_config::meta::region::RegionProviderChain;
use aws_config::{BehaviorVersion, Region, SdkConfig};

use crate::config::ConnectConfig;

pub mod ec2;
pub mod filters;
pub mod s3;

const FALLBACK_REGION: &str = "us-east-1";

/// SDK configuration shared by the EC2 and S3 clients. Credentials come
/// from the config file, not the ambient provider chain; the region falls
/// back through config key, environment, then us-east-1.
pub async fn load_sdk_config(config: &ConnectConfig) -> SdkConfig {
    let region = RegionProviderChain::first_try(config.region.clone().map(Region::new))
        .or_default_provider()
        .or_else(Region::new(FALLBACK_REGION));

    let credentials = aws_sdk_ec2::config::Credentials::new(
        config.aws_access_key_id.clone(),
        config.aws_secret_access_key.clone(),
        None,
        None,
        "roost-config-file",
    );

    aws_config::defaults(BehaviorVersion::v2024_03_28())
        .region(region)
        .credentials_provider(credentials)
        .load()
        .await
}
