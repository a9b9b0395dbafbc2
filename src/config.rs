use anyhow::{Context, Result, anyhow};
use dotenvy::dotenv;
use serde::{Deserialize, Serialize};
use std::{fs, path::PathBuf};
use url::Url;

use crate::model::SessionIdentity;

#[derive(Debug, Deserialize, Serialize, Default)]
pub struct ConfigFile {
    pub api: Option<Url>,
    pub api_transfer: Option<Url>,
    pub public_origin: Option<Url>,
    pub creator_id: Option<String>,
    pub creator_name: Option<String>,
}

// Read from `API`, `API_TRANSFER`, `PUBLIC_ORIGIN`, `CREATOR_ID` and `CREATOR_NAME`.
#[derive(Debug, Deserialize, Default)]
struct ConfigEnv {
    api: Option<Url>,
    api_transfer: Option<Url>,
    public_origin: Option<Url>,
    creator_id: Option<String>,
    creator_name: Option<String>,
}

#[derive(Debug)]
pub struct Config {
    /// Base URL of the file list endpoint, `GET {api}/{id}`.
    pub api: Url,
    /// Upload endpoint.
    pub api_transfer: Url,
    /// Origin share links are built on.
    pub public_origin: Url,
    pub identity: Option<SessionIdentity>,
}

fn merge_config(base: ConfigFile, override_config: ConfigEnv) -> Result<Config> {
    let api = override_config
        .api
        .or(base.api)
        .ok_or(anyhow!("No API URL provided, set API or run `threef config`"))?;

    let api_transfer = override_config
        .api_transfer
        .or(base.api_transfer)
        .ok_or(anyhow!(
            "No upload URL provided, set API_TRANSFER or run `threef config`"
        ))?;

    let public_origin = match override_config.public_origin.or(base.public_origin) {
        Some(origin) => origin,
        None => Url::parse(&api.origin().ascii_serialization())
            .context("Unable to derive a public origin from the API URL")?,
    };

    let identity = override_config
        .creator_id
        .or(base.creator_id)
        .map(|creator_id| SessionIdentity {
            creator_name: override_config
                .creator_name
                .or(base.creator_name)
                .unwrap_or_else(|| creator_id.clone()),
            creator_id,
        });

    Ok(Config {
        api,
        api_transfer,
        public_origin,
        identity,
    })
}

pub fn config_file_path() -> Result<PathBuf> {
    let project_dirs = directories::ProjectDirs::from("fr", "threef", "threef")
        .ok_or(anyhow!("Unable to determine home directory"))?;
    Ok(project_dirs.config_dir().join("config.toml"))
}

pub fn read_config_file() -> Result<ConfigFile> {
    let config_file = config_file_path()?;
    match fs::read_to_string(&config_file) {
        Ok(config) => toml::from_str(&config)
            .with_context(|| format!("Failed to parse {}", config_file.display())),
        Err(_) => Ok(ConfigFile::default()),
    }
}

pub fn read_config() -> Result<Config> {
    let _ = dotenv();
    let env_config =
        envy::from_env::<ConfigEnv>().context("Invalid configuration in environment")?;

    merge_config(read_config_file()?, env_config)
}

pub fn write_config(config: &ConfigFile) -> Result<PathBuf> {
    let config_file = config_file_path()?;
    if let Some(parent) = config_file.parent() {
        fs::create_dir_all(parent)?;
    }
    fs::write(&config_file, toml::to_string_pretty(config)?)
        .with_context(|| format!("Failed to write {}", config_file.display()))?;
    Ok(config_file)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn url(s: &str) -> Option<Url> {
        Some(Url::parse(s).unwrap())
    }

    #[test]
    fn test_env_overrides_file() {
        let file = ConfigFile {
            api: url("https://file.example/api"),
            api_transfer: url("https://file.example/upload"),
            ..Default::default()
        };
        let env = ConfigEnv {
            api: url("https://env.example/api"),
            ..Default::default()
        };

        let config = merge_config(file, env).unwrap();
        assert_eq!(config.api.as_str(), "https://env.example/api");
        assert_eq!(config.api_transfer.as_str(), "https://file.example/upload");
    }

    #[test]
    fn test_public_origin_defaults_to_api_origin() {
        let env = ConfigEnv {
            api: url("https://api.example:8443/v1/files"),
            api_transfer: url("https://api.example:8443/v1/upload"),
            ..Default::default()
        };

        let config = merge_config(ConfigFile::default(), env).unwrap();
        assert_eq!(config.public_origin.as_str(), "https://api.example:8443/");
    }

    #[test]
    fn test_missing_endpoints_are_errors() {
        let only_api = ConfigEnv {
            api: url("https://api.example/files"),
            ..Default::default()
        };
        assert!(merge_config(ConfigFile::default(), only_api).is_err());
        assert!(merge_config(ConfigFile::default(), ConfigEnv::default()).is_err());
    }

    #[test]
    fn test_identity() {
        let base = || ConfigFile {
            api: url("https://api.example/files"),
            api_transfer: url("https://api.example/upload"),
            creator_name: Some("Ada".to_string()),
            ..Default::default()
        };

        let anonymous = merge_config(base(), ConfigEnv::default()).unwrap();
        assert_eq!(anonymous.identity, None);

        let env = ConfigEnv {
            creator_id: Some("u-1".to_string()),
            ..Default::default()
        };
        let signed_in = merge_config(base(), env).unwrap();
        assert_eq!(
            signed_in.identity,
            Some(SessionIdentity {
                creator_id: "u-1".to_string(),
                creator_name: "Ada".to_string(),
            })
        );
    }

    #[test]
    fn test_config_file_toml() {
        let parsed: ConfigFile = toml::from_str(
            r#"
            api = "https://api.example/files"
            api_transfer = "https://api.example/upload"
            creator_id = "u-1"
            "#,
        )
        .unwrap();
        assert_eq!(parsed.api, url("https://api.example/files"));
        assert_eq!(parsed.creator_name, None);
    }
}
