//! The network configuration document.
//!
//! A flat JSON mapping loaded once per run and immutable afterwards. The
//! document names every tag the tool uses as an identity key, so two runs
//! against the same document always resolve the same remote resources.

use std::fs;
use std::path::Path;

use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::resource::{ResourceTags, SubnetSpec};

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("failed to read {path}: {source}")]
    Io {
        path: String,
        #[source]
        source: std::io::Error,
    },

    #[error("failed to parse {path}: {source}")]
    Parse {
        path: String,
        #[source]
        source: serde_json::Error,
    },

    #[error("invalid configuration: {0}")]
    Invalid(String),
}

/// Everything the lifecycle tool needs to know about the desired network.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct NetworkConfig {
    /// AWS region the EC2 client talks to.
    pub region: String,
    /// IPv4 CIDR block of the VPC.
    pub cidr_block: String,
    /// CIDR blocks of the public subnets, parallel to `availability_zones`
    /// and `subnet_names`.
    pub public_subnet_cidrs: Vec<String>,
    /// Availability zone of each subnet.
    pub availability_zones: Vec<String>,
    /// Name tag of each subnet.
    pub subnet_names: Vec<String>,
    /// Prefix used to look the subnets back up by their Name tag.
    pub subnet_name_prefix: String,
    /// Name tag of the VPC.
    pub vpc_name: String,
    /// Name tag of the route table.
    pub route_table_name: String,
    /// Name tag of the internet gateway.
    pub gateway_name: String,
    /// Environment tag applied to every resource.
    pub environment: String,
    /// Destination CIDR of the default route (typically 0.0.0.0/0).
    pub destination_cidr: String,
}

impl NetworkConfig {
    /// Load and validate a configuration document.
    pub fn load(path: &Path) -> Result<Self, ConfigError> {
        let content = fs::read_to_string(path).map_err(|e| ConfigError::Io {
            path: path.display().to_string(),
            source: e,
        })?;

        let config: NetworkConfig =
            serde_json::from_str(&content).map_err(|e| ConfigError::Parse {
                path: path.display().to_string(),
                source: e,
            })?;

        config.validate()?;
        Ok(config)
    }

    /// Check the document for the mistakes a run could otherwise only
    /// discover halfway through: malformed CIDRs, unequal subnet lists,
    /// empty tag values.
    pub fn validate(&self) -> Result<(), ConfigError> {
        for (label, value) in [
            ("vpc_name", &self.vpc_name),
            ("route_table_name", &self.route_table_name),
            ("gateway_name", &self.gateway_name),
            ("environment", &self.environment),
            ("subnet_name_prefix", &self.subnet_name_prefix),
            ("region", &self.region),
        ] {
            if value.trim().is_empty() {
                return Err(ConfigError::Invalid(format!("{} must not be empty", label)));
            }
        }

        validate_cidr(&self.cidr_block)
            .map_err(|e| ConfigError::Invalid(format!("cidr_block: {}", e)))?;
        validate_cidr(&self.destination_cidr)
            .map_err(|e| ConfigError::Invalid(format!("destination_cidr: {}", e)))?;
        for cidr in &self.public_subnet_cidrs {
            validate_cidr(cidr)
                .map_err(|e| ConfigError::Invalid(format!("public_subnet_cidrs: {}", e)))?;
        }

        if self.public_subnet_cidrs.is_empty() {
            return Err(ConfigError::Invalid(
                "at least one subnet must be configured".to_string(),
            ));
        }
        if self.public_subnet_cidrs.len() != self.availability_zones.len()
            || self.public_subnet_cidrs.len() != self.subnet_names.len()
        {
            return Err(ConfigError::Invalid(format!(
                "public_subnet_cidrs ({}), availability_zones ({}) and subnet_names ({}) must have the same length",
                self.public_subnet_cidrs.len(),
                self.availability_zones.len(),
                self.subnet_names.len()
            )));
        }

        Ok(())
    }

    /// The per-subnet (name, cidr, zone) triples, in configuration order.
    pub fn subnet_specs(&self) -> Vec<SubnetSpec> {
        self.subnet_names
            .iter()
            .zip(&self.public_subnet_cidrs)
            .zip(&self.availability_zones)
            .map(|((name, cidr), az)| SubnetSpec {
                name: name.clone(),
                cidr_block: cidr.clone(),
                availability_zone: az.clone(),
            })
            .collect()
    }

    pub fn vpc_tags(&self) -> ResourceTags {
        ResourceTags::new(&self.vpc_name, &self.environment)
    }

    pub fn route_table_tags(&self) -> ResourceTags {
        ResourceTags::new(&self.route_table_name, &self.environment)
    }

    pub fn gateway_tags(&self) -> ResourceTags {
        ResourceTags::new(&self.gateway_name, &self.environment)
    }
}

/// Basic CIDR format validation: x.x.x.x/n with octets 0-255 and prefix <= 32.
pub fn validate_cidr(value: &str) -> Result<(), String> {
    let parts: Vec<&str> = value.split('/').collect();
    if parts.len() != 2 {
        return Err(format!("{} must be in format x.x.x.x/n", value));
    }
    let octets: Vec<&str> = parts[0].split('.').collect();
    if octets.len() != 4 {
        return Err(format!("invalid IP address in {}", value));
    }
    for octet in &octets {
        if octet.parse::<u8>().is_err() {
            return Err(format!("invalid IP address in {}", value));
        }
    }
    let prefix: u8 = parts[1]
        .parse()
        .map_err(|_| format!("invalid prefix length in {}", value))?;
    if prefix > 32 {
        return Err(format!("prefix length must be between 0 and 32 in {}", value));
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    fn sample() -> NetworkConfig {
        NetworkConfig {
            region: "eu-west-1".to_string(),
            cidr_block: "10.0.0.0/16".to_string(),
            public_subnet_cidrs: vec!["10.0.1.0/24".to_string(), "10.0.2.0/24".to_string()],
            availability_zones: vec!["eu-west-1a".to_string(), "eu-west-1b".to_string()],
            subnet_names: vec!["acme-dev-sub-1".to_string(), "acme-dev-sub-2".to_string()],
            subnet_name_prefix: "acme-dev-sub".to_string(),
            vpc_name: "acme-dev".to_string(),
            route_table_name: "acme-dev-rtb".to_string(),
            gateway_name: "acme-dev-igw".to_string(),
            environment: "Dev".to_string(),
            destination_cidr: "0.0.0.0/0".to_string(),
        }
    }

    #[test]
    fn valid_cidr_blocks() {
        assert!(validate_cidr("10.0.0.0/16").is_ok());
        assert!(validate_cidr("192.168.1.0/24").is_ok());
        assert!(validate_cidr("0.0.0.0/0").is_ok());
    }

    #[test]
    fn invalid_cidr_blocks() {
        assert!(validate_cidr("10.0.0.0").is_err()); // missing prefix
        assert!(validate_cidr("10.0.0/16").is_err()); // invalid IP
        assert!(validate_cidr("10.0.0.0/33").is_err()); // prefix too large
        assert!(validate_cidr("10.0.0.256/16").is_err()); // octet out of range
    }

    #[test]
    fn sample_config_validates() {
        assert!(sample().validate().is_ok());
    }

    #[test]
    fn mismatched_subnet_lists_rejected() {
        let mut config = sample();
        config.availability_zones.pop();
        let err = config.validate().unwrap_err();
        assert!(err.to_string().contains("same length"));
    }

    #[test]
    fn empty_tag_rejected() {
        let mut config = sample();
        config.vpc_name = String::new();
        assert!(config.validate().is_err());
    }

    #[test]
    fn bad_vpc_cidr_rejected() {
        let mut config = sample();
        config.cidr_block = "10.0.0.0".to_string();
        let err = config.validate().unwrap_err();
        assert!(err.to_string().contains("cidr_block"));
    }

    #[test]
    fn subnet_specs_zip_in_order() {
        let specs = sample().subnet_specs();
        assert_eq!(specs.len(), 2);
        assert_eq!(specs[0].name, "acme-dev-sub-1");
        assert_eq!(specs[0].cidr_block, "10.0.1.0/24");
        assert_eq!(specs[1].availability_zone, "eu-west-1b");
    }

    #[test]
    fn load_round_trip() {
        let config = sample();
        let mut file = tempfile::NamedTempFile::new().unwrap();
        write!(file, "{}", serde_json::to_string_pretty(&config).unwrap()).unwrap();

        let loaded = NetworkConfig::load(file.path()).unwrap();
        assert_eq!(loaded.vpc_name, config.vpc_name);
        assert_eq!(loaded.public_subnet_cidrs, config.public_subnet_cidrs);
    }

    #[test]
    fn load_missing_file_is_io_error() {
        let err = NetworkConfig::load(Path::new("no-such-network.json")).unwrap_err();
        assert!(matches!(err, ConfigError::Io { .. }));
    }
}
