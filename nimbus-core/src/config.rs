//! Stack configuration - the flat settings map the topology is built from
//!
//! Loaded from a YAML document (`nimbus.yaml` by default). Everything the
//! stack varies on lives here; the topology itself is fixed.

use std::collections::BTreeMap;
use std::path::Path;

use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::schema::validate_cidr;

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Failed to read {path}: {source}")]
    Io {
        path: String,
        #[source]
        source: std::io::Error,
    },

    #[error("Failed to parse configuration: {0}")]
    Parse(#[from] serde_yaml::Error),

    #[error("Invalid value for '{key}': {message}")]
    Invalid { key: String, message: String },
}

impl ConfigError {
    fn invalid(key: &str, message: impl Into<String>) -> Self {
        Self::Invalid {
            key: key.to_string(),
            message: message.into(),
        }
    }
}

#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct StackConfig {
    /// Prefix for resource names and Name tags
    pub stack_name: String,
    /// AWS region the stack is provisioned in
    pub region: String,
    pub network: NetworkConfig,
    pub compute: ComputeConfig,
    pub scaling: ScalingConfig,
    /// Optional RDS tier; the stack runs without a database when absent
    #[serde(default)]
    pub database: Option<DatabaseConfig>,
    /// Optional Route53 alias record for the load balancer
    #[serde(default)]
    pub dns: Option<DnsConfig>,
    #[serde(default)]
    pub backend: BackendSettings,
    /// Extra tags applied to every taggable resource
    #[serde(default)]
    pub tags: BTreeMap<String, String>,
}

#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct NetworkConfig {
    pub vpc_cidr: String,
    /// Number of public (and private) subnets, capped by available zones
    pub subnets_per_tier: usize,
    /// Destination of the public route table's default route
    #[serde(default = "default_destination_cidr")]
    pub destination_cidr: String,
}

#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct ComputeConfig {
    pub ami_id: String,
    pub instance_type: String,
    pub key_name: String,
    pub app_port: u16,
    #[serde(default = "default_ssh_ingress_cidr")]
    pub ssh_ingress_cidr: String,
    #[serde(default = "default_root_volume_size_gb")]
    pub root_volume_size_gb: i64,
    #[serde(default = "default_root_volume_type")]
    pub root_volume_type: String,
}

#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct ScalingConfig {
    pub min_size: u32,
    pub max_size: u32,
    pub desired_capacity: u32,
    /// Average CPU percentage that triggers a scale-up
    pub cpu_high_threshold: f64,
    /// Average CPU percentage that triggers a scale-down
    pub cpu_low_threshold: f64,
    #[serde(default = "default_health_check_path")]
    pub health_check_path: String,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum DbEngine {
    Mysql,
    Mariadb,
    Postgres,
}

impl DbEngine {
    pub fn as_str(&self) -> &'static str {
        match self {
            DbEngine::Mysql => "mysql",
            DbEngine::Mariadb => "mariadb",
            DbEngine::Postgres => "postgres",
        }
    }

    /// Port the engine listens on
    pub fn port(&self) -> u16 {
        match self {
            DbEngine::Mysql | DbEngine::Mariadb => 3306,
            DbEngine::Postgres => 5432,
        }
    }

    /// Parameter group family for an engine version, e.g. mysql "8.0.35"
    /// -> "mysql8.0", postgres "16.3" -> "postgres16"
    pub fn parameter_group_family(&self, engine_version: &str) -> String {
        let components = match self {
            DbEngine::Postgres => 1,
            DbEngine::Mysql | DbEngine::Mariadb => 2,
        };
        let major: Vec<&str> = engine_version.split('.').take(components).collect();
        format!("{}{}", self.as_str(), major.join("."))
    }
}

#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct DatabaseConfig {
    pub engine: DbEngine,
    pub engine_version: String,
    pub instance_class: String,
    pub db_name: String,
    pub username: String,
    pub password: String,
    #[serde(default = "default_allocated_storage_gb")]
    pub allocated_storage_gb: i64,
}

#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct DnsConfig {
    pub hosted_zone_id: String,
    /// Fully qualified record name, e.g. "demo.example.com"
    pub record_name: String,
}

/// Where the deployment record lives
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(tag = "type", rename_all = "lowercase")]
pub enum BackendSettings {
    Local {
        #[serde(default = "default_state_path")]
        path: String,
    },
    S3 {
        bucket: String,
        key: String,
        #[serde(default = "default_encrypt")]
        encrypt: bool,
    },
}

impl Default for BackendSettings {
    fn default() -> Self {
        BackendSettings::Local {
            path: default_state_path(),
        }
    }
}

fn default_destination_cidr() -> String {
    "0.0.0.0/0".to_string()
}

fn default_ssh_ingress_cidr() -> String {
    "0.0.0.0/0".to_string()
}

fn default_root_volume_size_gb() -> i64 {
    20
}

fn default_root_volume_type() -> String {
    "gp2".to_string()
}

fn default_health_check_path() -> String {
    "/healthz".to_string()
}

fn default_allocated_storage_gb() -> i64 {
    20
}

fn default_state_path() -> String {
    "nimbus.state.json".to_string()
}

fn default_encrypt() -> bool {
    true
}

impl StackConfig {
    /// Load and validate a configuration file
    pub fn from_file(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        let path = path.as_ref();
        let content = std::fs::read_to_string(path).map_err(|source| ConfigError::Io {
            path: path.display().to_string(),
            source,
        })?;
        Self::from_yaml(&content)
    }

    /// Parse and validate a YAML configuration document
    pub fn from_yaml(content: &str) -> Result<Self, ConfigError> {
        let config: StackConfig = serde_yaml::from_str(content)?;
        config.validate()?;
        Ok(config)
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.stack_name.is_empty() {
            return Err(ConfigError::invalid("stack_name", "must not be empty"));
        }
        if self.region.is_empty() {
            return Err(ConfigError::invalid("region", "must not be empty"));
        }

        validate_cidr(&self.network.vpc_cidr)
            .map_err(|e| ConfigError::invalid("network.vpc_cidr", e))?;
        validate_cidr(&self.network.destination_cidr)
            .map_err(|e| ConfigError::invalid("network.destination_cidr", e))?;
        if self.network.subnets_per_tier == 0 {
            return Err(ConfigError::invalid(
                "network.subnets_per_tier",
                "must be at least 1",
            ));
        }

        validate_cidr(&self.compute.ssh_ingress_cidr)
            .map_err(|e| ConfigError::invalid("compute.ssh_ingress_cidr", e))?;
        if self.compute.app_port == 0 {
            return Err(ConfigError::invalid("compute.app_port", "must be 1-65535"));
        }

        let scaling = &self.scaling;
        if scaling.min_size > scaling.max_size {
            return Err(ConfigError::invalid(
                "scaling.min_size",
                format!(
                    "must not exceed max_size ({} > {})",
                    scaling.min_size, scaling.max_size
                ),
            ));
        }
        if scaling.desired_capacity < scaling.min_size || scaling.desired_capacity > scaling.max_size
        {
            return Err(ConfigError::invalid(
                "scaling.desired_capacity",
                format!(
                    "must be between min_size and max_size ({}..{})",
                    scaling.min_size, scaling.max_size
                ),
            ));
        }
        if scaling.cpu_low_threshold >= scaling.cpu_high_threshold {
            return Err(ConfigError::invalid(
                "scaling.cpu_low_threshold",
                "must be below cpu_high_threshold",
            ));
        }

        if let Some(db) = &self.database {
            if db.db_name.is_empty() || db.username.is_empty() || db.password.is_empty() {
                return Err(ConfigError::invalid(
                    "database",
                    "db_name, username and password are required",
                ));
            }
            if db.allocated_storage_gb < 5 {
                return Err(ConfigError::invalid(
                    "database.allocated_storage_gb",
                    "must be at least 5",
                ));
            }
        }

        if let Some(dns) = &self.dns {
            if dns.hosted_zone_id.is_empty() {
                return Err(ConfigError::invalid("dns.hosted_zone_id", "must not be empty"));
            }
            if dns.record_name.is_empty() {
                return Err(ConfigError::invalid("dns.record_name", "must not be empty"));
            }
        }

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const SAMPLE: &str = r#"
stack_name: demo
region: us-east-1
network:
  vpc_cidr: 10.0.0.0/16
  subnets_per_tier: 3
compute:
  ami_id: ami-0123456789abcdef0
  instance_type: t3.micro
  key_name: demo-key
  app_port: 8080
scaling:
  min_size: 1
  max_size: 3
  desired_capacity: 1
  cpu_high_threshold: 80
  cpu_low_threshold: 20
database:
  engine: mysql
  engine_version: "8.0.35"
  instance_class: db.t3.micro
  db_name: webapp
  username: admin
  password: changeme
dns:
  hosted_zone_id: Z0123456789ABCDEF
  record_name: demo.example.com
"#;

    #[test]
    fn parses_sample_config() {
        let config = StackConfig::from_yaml(SAMPLE).unwrap();
        assert_eq!(config.stack_name, "demo");
        assert_eq!(config.network.subnets_per_tier, 3);
        assert_eq!(config.network.destination_cidr, "0.0.0.0/0");
        assert_eq!(config.compute.root_volume_size_gb, 20);
        assert_eq!(config.database.as_ref().unwrap().engine, DbEngine::Mysql);
        assert!(matches!(config.backend, BackendSettings::Local { .. }));
    }

    #[test]
    fn optional_sections_default_to_none() {
        let without_db = SAMPLE
            .lines()
            .take_while(|l| !l.starts_with("database:"))
            .collect::<Vec<_>>()
            .join("\n");
        let config = StackConfig::from_yaml(&without_db).unwrap();
        assert!(config.database.is_none());
        assert!(config.dns.is_none());
    }

    #[test]
    fn rejects_bad_vpc_cidr() {
        let bad = SAMPLE.replace("10.0.0.0/16", "10.0.0.0");
        let err = StackConfig::from_yaml(&bad).unwrap_err();
        assert!(matches!(err, ConfigError::Invalid { key, .. } if key == "network.vpc_cidr"));
    }

    #[test]
    fn rejects_inverted_thresholds() {
        let bad = SAMPLE.replace("cpu_low_threshold: 20", "cpu_low_threshold: 90");
        let err = StackConfig::from_yaml(&bad).unwrap_err();
        assert!(matches!(err, ConfigError::Invalid { key, .. } if key == "scaling.cpu_low_threshold"));
    }

    #[test]
    fn rejects_desired_capacity_out_of_range() {
        let bad = SAMPLE.replace("desired_capacity: 1", "desired_capacity: 5");
        let err = StackConfig::from_yaml(&bad).unwrap_err();
        assert!(matches!(err, ConfigError::Invalid { key, .. } if key == "scaling.desired_capacity"));
    }

    #[test]
    fn s3_backend_settings() {
        let yaml = SAMPLE.to_string()
            + "backend:\n  type: s3\n  bucket: demo-state\n  key: stacks/demo.json\n";
        let config = StackConfig::from_yaml(&yaml).unwrap();
        match config.backend {
            BackendSettings::S3 { bucket, key, encrypt } => {
                assert_eq!(bucket, "demo-state");
                assert_eq!(key, "stacks/demo.json");
                assert!(encrypt);
            }
            other => panic!("Expected S3 backend, got {:?}", other),
        }
    }

    #[test]
    fn parameter_group_family() {
        assert_eq!(
            DbEngine::Mysql.parameter_group_family("8.0.35"),
            "mysql8.0"
        );
        assert_eq!(DbEngine::Postgres.parameter_group_family("16.3"), "postgres16");
        assert_eq!(
            DbEngine::Mariadb.parameter_group_family("10.11.6"),
            "mariadb10.11"
        );
    }

    #[test]
    fn engine_ports() {
        assert_eq!(DbEngine::Mysql.port(), 3306);
        assert_eq!(DbEngine::Postgres.port(), 5432);
    }
}
