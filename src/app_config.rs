use config::Config;
use serde::Deserialize;
use std::{path::PathBuf, str};
use tracing::*;
use zenoh::config::Config as ZenohConfig;

use crate::error::DispatcherError;

/// Use default config if no path is provided
pub fn get_configuration(config: &Option<PathBuf>) -> Result<AppConfig, anyhow::Error> {
    let settings = if let Some(config) = config {
        info!("Using configuration from {:?}", config);
        Config::builder()
            .add_source(config::File::with_name(
                config
                    .to_str()
                    .ok_or_else(|| anyhow::anyhow!("Failed to convert path"))?,
            ))
            .add_source(config::Environment::with_prefix("APP").separator("__"))
            .build()?
    } else {
        info!("Using dev configuration");
        Config::builder()
            .add_source(config::File::with_name("config/settings"))
            .add_source(config::File::with_name("config/dev_settings").required(false))
            .add_source(config::Environment::with_prefix("APP").separator("__"))
            .build()?
    };

    Ok(settings.try_deserialize()?)
}

#[derive(Deserialize, Debug, Clone)]
pub struct AppConfig {
    pub remote_service: RemoteServiceConfig,
    pub assistant: AssistantConfig,
    pub speech: SpeechConfig,
    pub status: StatusConfig,
    pub zenoh: DispatcherZenohConfig,
}

/// Home automation controller exposing the device catalog and the toggle endpoint
#[derive(Deserialize, Debug, Clone)]
pub struct RemoteServiceConfig {
    pub base_url: String,
    #[serde(default = "default_catalog_endpoint")]
    pub catalog_endpoint: String,
    #[serde(default = "default_toggle_endpoint")]
    pub toggle_endpoint: String,
}

fn default_catalog_endpoint() -> String {
    String::from("Services.php")
}

fn default_toggle_endpoint() -> String {
    String::from("toggle.php")
}

impl RemoteServiceConfig {
    pub fn catalog_url(&self) -> String {
        join_url(&self.base_url, &self.catalog_endpoint)
    }

    pub fn toggle_url(&self) -> String {
        join_url(&self.base_url, &self.toggle_endpoint)
    }
}

fn join_url(base: &str, endpoint: &str) -> String {
    format!(
        "{}/{}",
        base.trim_end_matches('/'),
        endpoint.trim_start_matches('/')
    )
}

#[derive(Deserialize, Debug, Clone)]
pub struct AssistantConfig {
    pub topic_prefix: String,
    #[serde(default = "default_unsupported_machines")]
    pub unsupported_machines: Vec<String>,
}

fn default_unsupported_machines() -> Vec<String> {
    vec![String::from("armv6l")]
}

#[derive(Deserialize, Debug, Clone)]
pub struct SpeechConfig {
    pub topic_prefix: String,
    pub negative_acknowledgment_sound: String,
}

#[derive(Deserialize, Debug, Clone)]
pub struct StatusConfig {
    pub topic: String,
}

#[derive(Deserialize, Debug, Clone)]
pub struct DispatcherZenohConfig {
    pub connect: Vec<zenoh_config::EndPoint>,
    pub listen: Vec<zenoh_config::EndPoint>,
    pub config_path: Option<String>,
}

impl DispatcherZenohConfig {
    pub fn get_zenoh_config(&self) -> anyhow::Result<ZenohConfig> {
        let mut config = if let Some(conf_file) = &self.config_path {
            ZenohConfig::from_file(conf_file).map_err(DispatcherError::ZenohError)?
        } else {
            ZenohConfig::default()
        };
        if !self.connect.is_empty() {
            config.connect.endpoints = self.connect.clone();
        }
        if !self.listen.is_empty() {
            config.listen.endpoints = self.listen.clone();
        }
        Ok(config)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    static DEFAULT_CONFIG: &str = include_str!("../config/settings.yaml");

    fn default_config() -> AppConfig {
        Config::builder()
            .add_source(config::File::from_str(
                DEFAULT_CONFIG,
                config::FileFormat::Yaml,
            ))
            .build()
            .unwrap()
            .try_deserialize::<AppConfig>()
            .unwrap()
    }

    #[test]
    fn test_config() {
        let config = default_config();
        assert_eq!(config.assistant.unsupported_machines, vec!["armv6l"]);
        assert!(config.zenoh.connect.is_empty());
    }

    #[test]
    fn remote_urls_join_without_double_slash() {
        let config = default_config();
        assert!(config.remote_service.catalog_url().ends_with("/Services.php"));
        assert!(!config.remote_service.catalog_url().contains("//Services"));
        assert!(config.remote_service.toggle_url().ends_with("/toggle.php"));
    }

    #[test]
    fn endpoints_fall_back_to_defaults() {
        let config = Config::builder()
            .add_source(config::File::from_str(
                "base_url: http://controller.local/home/executables/",
                config::FileFormat::Yaml,
            ))
            .build()
            .unwrap()
            .try_deserialize::<RemoteServiceConfig>()
            .unwrap();
        assert_eq!(
            config.catalog_url(),
            "http://controller.local/home/executables/Services.php"
        );
        assert_eq!(
            config.toggle_url(),
            "http://controller.local/home/executables/toggle.php"
        );
    }
}
