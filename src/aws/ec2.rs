use std::collections::{HashMap, HashSet};

use aws_sdk_ec2::error::{ProvideErrorMetadata, SdkError};
use aws_sdk_ec2::operation::describe_instances::DescribeInstancesError;
use aws_sdk_ec2::{Client, types};
use tracing::debug;

use crate::aws::filters::TagFilter;
use crate::errors::{RoostError, error_chain};

const AUTH_FAILURE_CODES: [&str; 4] = [
    "AuthFailure",
    "UnauthorizedOperation",
    "InvalidClientTokenId",
    "SignatureDoesNotMatch",
];

pub fn mk_client(sdk_config: &aws_config::SdkConfig) -> Client {
    Client::new(sdk_config)
}

/// Owned snapshot of one instance, detached from the SDK response types.
/// Fetched fresh every run, never cached.
#[derive(Debug, Clone, PartialEq)]
pub struct InstanceRecord {
    pub id: String,
    pub public_ip: Option<String>,
    pub private_ip: Option<String>,
    pub state: String,
    pub key_name: Option<String>,
    pub tags: HashMap<String, String>,
}

impl InstanceRecord {
    /// `None` when the instance has no id, which nothing downstream could
    /// use anyway.
    pub fn from_instance(instance: &types::Instance) -> Option<Self> {
        let id = instance.instance_id()?.to_string();
        let state = instance
            .state()
            .and_then(|s| s.name())
            .map(|name| name.as_str().to_string())
            .unwrap_or_default();
        let tags = instance
            .tags()
            .iter()
            .filter_map(|t| Some((t.key()?.to_string(), t.value()?.to_string())))
            .collect();

        Some(Self {
            id,
            public_ip: instance.public_ip_address().map(str::to_string),
            private_ip: instance.private_ip_address().map(str::to_string),
            state,
            key_name: instance.key_name().map(str::to_string),
            tags,
        })
    }

    pub fn is_running(&self) -> bool {
        self.state.eq_ignore_ascii_case("running")
    }

    pub fn tag(&self, name: &str) -> Option<&str> {
        self.tags.get(name).map(String::as_str)
    }

    /// Address the connection should use. Private when the VPN flag is set,
    /// public otherwise.
    pub fn address(&self, using_vpn: bool) -> Option<&str> {
        match using_vpn {
            true => self.private_ip.as_deref(),
            false => self.public_ip.as_deref(),
        }
    }
}

/// Every instance matching any filter, deduplicated by id in first-seen
/// order. The EC2 API joins distinct filters with AND, so OR across filters
/// means one DescribeInstances call per filter, unioned here. No filters
/// means one unfiltered call.
pub async fn query(
    client: &Client,
    filters: &[TagFilter],
) -> Result<Vec<InstanceRecord>, RoostError> {
    let mut seen = HashSet::new();
    let mut records = Vec::new();

    if filters.is_empty() {
        let response = client.describe_instances().send().await.map_err(query_error)?;
        collect_records(response.reservations(), &mut seen, &mut records);
        return Ok(records);
    }

    for filter in filters {
        debug!(filter = %filter, "querying inventory");
        let response = client
            .describe_instances()
            .filters(filter.to_ec2_filter())
            .send()
            .await
            .map_err(query_error)?;
        collect_records(response.reservations(), &mut seen, &mut records);
    }

    Ok(records)
}

fn collect_records(
    reservations: &[types::Reservation],
    seen: &mut HashSet<String>,
    records: &mut Vec<InstanceRecord>,
) {
    for reservation in reservations {
        for instance in reservation.instances() {
            if let Some(record) = InstanceRecord::from_instance(instance) {
                if seen.insert(record.id.clone()) {
                    records.push(record);
                }
            }
        }
    }
}

/// Drop everything that is not running. Stopped and pending instances match
/// tag filters too, but there is nothing to connect to.
pub fn running_only(records: Vec<InstanceRecord>) -> Vec<InstanceRecord> {
    records.into_iter().filter(InstanceRecord::is_running).collect()
}

pub async fn find_running(
    client: &Client,
    filters: &[TagFilter],
) -> Result<Vec<InstanceRecord>, RoostError> {
    let records = query(client, filters).await?;
    let running = running_only(records);
    debug!(candidates = running.len(), "inventory resolved");
    Ok(running)
}

fn query_error(err: SdkError<DescribeInstancesError>) -> RoostError {
    let code = err.code().map(str::to_string);
    let text = match (code.as_deref(), err.message()) {
        (Some(code), Some(message)) => format!("{code}: {message}"),
        _ => error_chain(&err),
    };

    match code {
        Some(code) if AUTH_FAILURE_CODES.contains(&code.as_str()) => {
            RoostError::CredentialsInvalid(text)
        }
        _ => RoostError::InventoryQueryFailed(text),
    }
}
