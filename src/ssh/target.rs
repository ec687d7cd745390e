use crate::aws::ec2::InstanceRecord;
use crate::config::ConnectConfig;
use crate::errors::RoostError;

/// Everything needed to open the session, read off one chosen instance.
#[derive(Debug, Clone, PartialEq)]
pub struct ConnectionTarget {
    pub instance_id: String,
    pub host: String,
    pub port: u16,
    pub user: String,
    pub key_name: Option<String>,
}

impl ConnectionTarget {
    /// The login user and port ride on the instance as tags. The config
    /// names which tags to read, the instance supplies the values.
    pub fn resolve(
        instance: &InstanceRecord,
        config: &ConnectConfig,
    ) -> Result<Self, RoostError> {
        let user = required_tag(instance, &config.tag_ssh_user)?;
        let port_text = required_tag(instance, &config.tag_ssh_port)?;
        let port = match port_text.parse::<u16>() {
            Ok(p) if p != 0 => p,
            _ => {
                return Err(RoostError::PortInvalid {
                    tag: config.tag_ssh_port.clone(),
                    value: port_text,
                });
            }
        };
        let host = instance
            .address(config.using_vpn)
            .ok_or_else(|| RoostError::AddressMissing {
                instance: instance.id.clone(),
                kind: if config.using_vpn { "private" } else { "public" },
            })?
            .to_string();

        Ok(ConnectionTarget {
            instance_id: instance.id.clone(),
            host,
            port,
            user,
            key_name: instance.key_name.clone(),
        })
    }
}

fn required_tag(instance: &InstanceRecord, tag: &str) -> Result<String, RoostError> {
    instance
        .tag(tag)
        .map(str::to_string)
        .ok_or_else(|| RoostError::TagNotFound {
            tag: tag.to_string(),
            instance: instance.id.clone(),
        })
}

#[cfg(test)]
mod tests {
    use std::collections::HashMap;
    use std::path::PathBuf;

    use super::*;
    use crate::config::KeySource;

    fn config(using_vpn: bool) -> ConnectConfig {
        ConnectConfig {
            aws_access_key_id: "AKIAEXAMPLE".to_string(),
            aws_secret_access_key: "wJalrXUtnFEMI".to_string(),
            tag_ssh_user: "team".to_string(),
            tag_ssh_port: "sshport".to_string(),
            using_vpn,
            region: None,
            key_source: KeySource::Dir(PathBuf::from("/keys")),
        }
    }

    fn instance(tags: &[(&str, &str)], public_ip: Option<&str>) -> InstanceRecord {
        InstanceRecord {
            id: "i-0abc".to_string(),
            public_ip: public_ip.map(str::to_string),
            private_ip: Some("10.0.0.7".to_string()),
            state: "running".to_string(),
            key_name: Some("bastion".to_string()),
            tags: tags
                .iter()
                .map(|(k, v)| (k.to_string(), v.to_string()))
                .collect::<HashMap<_, _>>(),
        }
    }

    #[test]
    fn test_resolves_from_tags() {
        let instance = instance(&[("team", "ops"), ("sshport", "2222")], Some("203.0.113.7"));
        let target = ConnectionTarget::resolve(&instance, &config(false)).unwrap();
        assert_eq!(target.instance_id, "i-0abc");
        assert_eq!(target.host, "203.0.113.7");
        assert_eq!(target.port, 2222);
        assert_eq!(target.user, "ops");
        assert_eq!(target.key_name, Some("bastion".to_string()));
    }

    #[test]
    fn test_missing_user_tag() {
        let instance = instance(&[("sshport", "22")], Some("203.0.113.7"));
        let err = ConnectionTarget::resolve(&instance, &config(false)).unwrap_err();
        assert_eq!(
            err,
            RoostError::TagNotFound {
                tag: "team".to_string(),
                instance: "i-0abc".to_string(),
            }
        );
    }

    #[test]
    fn test_missing_port_tag() {
        let instance = instance(&[("team", "ops")], Some("203.0.113.7"));
        let err = ConnectionTarget::resolve(&instance, &config(false)).unwrap_err();
        assert_eq!(
            err,
            RoostError::TagNotFound {
                tag: "sshport".to_string(),
                instance: "i-0abc".to_string(),
            }
        );
    }

    #[test]
    fn test_non_numeric_port() {
        let instance = instance(&[("team", "ops"), ("sshport", "twenty")], Some("203.0.113.7"));
        let err = ConnectionTarget::resolve(&instance, &config(false)).unwrap_err();
        assert_eq!(
            err,
            RoostError::PortInvalid {
                tag: "sshport".to_string(),
                value: "twenty".to_string(),
            }
        );
    }

    #[test]
    fn test_port_zero_rejected() {
        let instance = instance(&[("team", "ops"), ("sshport", "0")], Some("203.0.113.7"));
        let err = ConnectionTarget::resolve(&instance, &config(false)).unwrap_err();
        assert_eq!(
            err,
            RoostError::PortInvalid {
                tag: "sshport".to_string(),
                value: "0".to_string(),
            }
        );
    }

    #[test]
    fn test_vpn_prefers_private_address() {
        let instance = instance(&[("team", "ops"), ("sshport", "22")], Some("203.0.113.7"));
        let target = ConnectionTarget::resolve(&instance, &config(true)).unwrap();
        assert_eq!(target.host, "10.0.0.7");
    }

    #[test]
    fn test_no_public_address_off_vpn() {
        let instance = instance(&[("team", "ops"), ("sshport", "22")], None);
        let err = ConnectionTarget::resolve(&instance, &config(false)).unwrap_err();
        assert_eq!(
            err,
            RoostError::AddressMissing {
                instance: "i-0abc".to_string(),
                kind: "public",
            }
        );
    }
}
