use serde::Deserialize;

use crate::Config;
use crate::shared::{SourceConnectionConfig, SyncConfig, TargetConnectionConfig, ValidationError};

/// Complete configuration of the replicator binary.
///
/// Does not implement `Serialize` so the source password can never leak into a
/// serialized form.
#[derive(Debug, Clone, Deserialize)]
pub struct ReplicatorConfig {
    /// Operational database the data is extracted from.
    pub source: SourceConnectionConfig,
    /// Analytical store the star schema lives in.
    pub target: TargetConnectionConfig,
    /// Synchronization settings.
    #[serde(default)]
    pub sync: SyncConfig,
}

impl ReplicatorConfig {
    /// Validates every section of the configuration.
    pub fn validate(&self) -> Result<(), ValidationError> {
        self.source.validate()?;
        self.sync.validate()
    }
}

impl Config for ReplicatorConfig {}

#[cfg(test)]
mod tests {
    use secrecy::ExposeSecret;

    use super::*;

    const YAML: &str = r#"
source:
  host: localhost
  port: 3306
  name: sakila
  username: root
  password: password
target:
  path: analytics.db
sync:
  watermark_overlap_secs: 120
"#;

    fn parse(yaml: &str) -> ReplicatorConfig {
        config::Config::builder()
            .add_source(config::File::from_str(yaml, config::FileFormat::Yaml))
            .build()
            .unwrap()
            .try_deserialize()
            .unwrap()
    }

    #[test]
    fn deserializes_with_defaults_for_omitted_sync_settings() {
        let config = parse(YAML);

        assert_eq!(config.source.name, "sakila");
        assert_eq!(
            config.source.password.as_ref().unwrap().expose_secret(),
            "password"
        );
        assert!(!config.source.tls.enabled);
        assert_eq!(config.sync.watermark_overlap_secs, 120);
        assert_eq!(config.sync.calendar.start_year, 2000);
        assert!(config.validate().is_ok());
    }

    #[test]
    fn password_is_redacted_in_debug_output() {
        let config = parse(YAML);

        let rendered = format!("{config:?}");

        assert!(!rendered.contains("password: Some(\"password\")"));
    }
}
