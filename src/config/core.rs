use super::WorkgateConfig;
use anyhow::{Context, Result};
use figment::{
    Figment,
    providers::{Env, Format, Json, Toml, Yaml},
};
use std::path::Path;

// Embed the default config at compile time
const DEFAULT_CONFIG: &str = include_str!("../../default-config.toml");

impl WorkgateConfig {
    pub fn load() -> Result<Self> {
        Self::load_with_custom_config(None)
    }

    /// Merge defaults, config files and `WORKGATE_` env vars, then validate
    ///
    /// With `custom_config` only that file is read (format chosen by extension);
    /// otherwise the user config and then the repository config are layered.
    pub fn load_with_custom_config(custom_config: Option<&str>) -> Result<Self> {
        let config: WorkgateConfig = Self::figment(custom_config)?
            .extract()
            .context("Failed to parse workgate configuration")?;

        config.validate()?;
        tracing::trace!("Loaded configuration: {:?}", config);
        Ok(config)
    }

    fn figment(custom_config: Option<&str>) -> Result<Figment> {
        let mut figment = Figment::new().merge(Toml::string(DEFAULT_CONFIG));

        if let Some(custom_path) = custom_config {
            let path = Path::new(custom_path);
            anyhow::ensure!(path.is_file(), "Config file not found: {}", custom_path);

            figment = match path.extension().and_then(|ext| ext.to_str()) {
                Some("json") => figment.merge(Json::file(path)),
                Some("yaml") | Some("yml") => figment.merge(Yaml::file(path)),
                _ => figment.merge(Toml::file(path)),
            };
        } else {
            let user_config = Self::user_config_path();
            figment = figment
                .merge(Toml::file(&user_config))
                .merge(Json::file(user_config.replace(".toml", ".json")))
                .merge(Yaml::file(user_config.replace(".toml", ".yaml")))
                .merge(Toml::file("workgate.toml"))
                .merge(Json::file("workgate.json"))
                .merge(Yaml::file("workgate.yaml"))
                .merge(Yaml::file("workgate.yml"));
        }

        // Environment variables always have highest priority, e.g. WORKGATE_POOL__WORKERS=4
        Ok(figment.merge(Env::prefixed("WORKGATE_").split("__")))
    }

    fn user_config_path() -> String {
        match std::env::var("HOME") {
            Ok(home) => format!("{}/.config/workgate/config.toml", home),
            Err(_) => "~/.config/workgate/config.toml".to_string(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;
    use tempfile::TempDir;

    #[test]
    fn test_embedded_defaults_parse() {
        let config: WorkgateConfig = Figment::new()
            .merge(Toml::string(DEFAULT_CONFIG))
            .extract()
            .unwrap();
        assert_eq!(config, WorkgateConfig::default());
    }

    #[test]
    fn test_custom_toml_overrides_defaults() {
        let temp_dir = TempDir::new().unwrap();
        let path = temp_dir.path().join("custom.toml");
        fs::write(&path, "[pool]\nworkers = 3\n\n[limiter]\nrate = 25\n").unwrap();

        let config = WorkgateConfig::load_with_custom_config(path.to_str()).unwrap();
        assert_eq!(config.pool.workers, 3);
        assert_eq!(config.limiter.rate, 25);
        // Untouched sections keep their defaults
        assert_eq!(config.batch.chunk_size, 100);
    }

    #[test]
    fn test_custom_json_config() {
        let temp_dir = TempDir::new().unwrap();
        let path = temp_dir.path().join("custom.json");
        fs::write(&path, r#"{"parallel": {"max_concurrency": 6, "timeout_ms": 250}}"#).unwrap();

        let config = WorkgateConfig::load_with_custom_config(path.to_str()).unwrap();
        assert_eq!(config.max_concurrency(), 6);
        assert_eq!(config.parallel.timeout_ms, 250);
    }

    #[test]
    fn test_missing_custom_config_is_an_error() {
        let result = WorkgateConfig::load_with_custom_config(Some("non_existent.toml"));
        assert!(result.is_err());
    }

    #[test]
    fn test_invalid_values_fail_validation() {
        let temp_dir = TempDir::new().unwrap();
        let path = temp_dir.path().join("bad.yaml");
        fs::write(&path, "limiter:\n  rate: -1\n").unwrap();

        let err = WorkgateConfig::load_with_custom_config(path.to_str()).unwrap_err();
        assert!(err.to_string().contains("limiter.rate"));
    }
}
