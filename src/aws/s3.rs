use aws_sdk_s3::Client;
use aws_sdk_s3::error::{ProvideErrorMetadata, SdkError};
use aws_sdk_s3::operation::get_object::GetObjectError;
use tracing::debug;

use crate::errors::{RoostError, error_chain};

const MISSING_CODES: [&str; 3] = ["NoSuchKey", "NoSuchBucket", "NotFound"];
const AUTH_FAILURE_CODES: [&str; 4] = [
    "InvalidAccessKeyId",
    "SignatureDoesNotMatch",
    "AccessDenied",
    "ExpiredToken",
];

/// One GetObject call for the private key. The body never touches disk.
pub async fn fetch_key(
    sdk_config: &aws_config::SdkConfig,
    bucket: &str,
    object: &str,
) -> Result<String, RoostError> {
    let client = Client::new(sdk_config);
    debug!(bucket, object, "fetching key object");

    let response = client
        .get_object()
        .bucket(bucket)
        .key(object)
        .send()
        .await
        .map_err(|err| fetch_error(err, bucket, object))?;

    let body = response
        .body
        .collect()
        .await
        .map_err(|err| RoostError::KeyFetchFailed(err.to_string()))?;

    String::from_utf8(body.into_bytes().to_vec())
        .map_err(|_| RoostError::KeyInvalid(format!("s3://{bucket}/{object} is not a text key")))
}

fn fetch_error(err: SdkError<GetObjectError>, bucket: &str, object: &str) -> RoostError {
    let code = err.code().map(str::to_string);
    match code.as_deref() {
        Some(code) if MISSING_CODES.contains(&code) => {
            RoostError::KeyNotFound(format!("s3://{bucket}/{object}"))
        }
        Some(code) if AUTH_FAILURE_CODES.contains(&code) => {
            let text = match err.message() {
                Some(message) => format!("{code}: {message}"),
                None => code.to_string(),
            };
            RoostError::CredentialsInvalid(text)
        }
        _ => RoostError::KeyFetchFailed(error_chain(&err)),
    }
}
