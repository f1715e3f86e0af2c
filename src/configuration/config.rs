#[cfg(test)]
#[path = "config_test.rs"]
mod tests;

use std::path;

use anyhow::bail;
use anyhow::Result;
use clap::ArgMatches;
use clap::Command;
use dashmap::DashMap;
use once_cell::sync::Lazy;
use strum::EnumIter;
use strum::EnumVariantNames;
use strum::IntoEnumIterator;
use tokio::fs;

use crate::domain::models::Language;

static CONFIG: Lazy<DashMap<String, String>> = Lazy::new(DashMap::new);

#[derive(Clone, Copy, Debug, Eq, PartialEq, EnumIter, EnumVariantNames, strum::Display)]
#[strum(serialize_all = "kebab-case")]
pub enum ConfigKey {
    BackendHealthCheckTimeout,
    ConfigFile,
    CredentialFile,
    Language,
    Model,
    #[strum(serialize = "openai-token")]
    OpenAiToken,
    #[strum(serialize = "openai-url")]
    OpenAiURL,
    RequestTimeout,
    Theme,
    ThemeFile,
}

fn config_dir() -> path::PathBuf {
    #[cfg(not(target_os = "macos"))]
    let base = dirs::config_dir();
    #[cfg(target_os = "macos")]
    let base = std::env::var("HOME")
        .ok()
        .map(|home| return path::PathBuf::from(home).join(".config"));

    return base
        .unwrap_or_else(|| return path::PathBuf::from("."))
        .join("codeai");
}

pub struct Config {}

impl Config {
    pub fn get(key: ConfigKey) -> String {
        if let Some(val) = CONFIG.get(&key.to_string()) {
            return val.to_string();
        }

        return "".to_string();
    }

    pub fn set(key: ConfigKey, value: &str) {
        CONFIG.insert(key.to_string(), value.to_string());
    }

    pub fn default(key: ConfigKey) -> String {
        let default_language = Language::default().to_string();
        let config_path = config_dir().join("config.toml");
        let credential_path = config_dir().join("credential");

        let res: &str = match key {
            ConfigKey::BackendHealthCheckTimeout => "1000",
            ConfigKey::Language => &default_language,
            ConfigKey::Model => "gpt-3.5-turbo",
            ConfigKey::OpenAiToken => "",
            ConfigKey::OpenAiURL => "https://api.openai.com",
            ConfigKey::RequestTimeout => "30000",
            ConfigKey::Theme => "base16-ocean.dark",
            ConfigKey::ThemeFile => "",

            // Special
            ConfigKey::ConfigFile => return config_path.to_string_lossy().to_string(),
            ConfigKey::CredentialFile => return credential_path.to_string_lossy().to_string(),
        };

        return res.to_string();
    }

    /// Reads values from a TOML document, validating them against the
    /// possible values declared on the matching clap arguments.
    pub fn parse_file(cmd: &Command, toml_str: &str) -> Result<Vec<(ConfigKey, String)>> {
        let doc = toml_str.parse::<toml_edit::Document>()?;
        let mut res = vec![];

        for key in ConfigKey::iter() {
            if key == ConfigKey::ConfigFile {
                continue;
            }

            if let Some(val) = doc.get(&key.to_string()) {
                let mut possible_values = vec![];
                if let Some(arg) = cmd
                    .get_arguments()
                    .find(|e| return e.get_long() == Some(key.to_string().as_str()))
                {
                    possible_values = arg
                        .get_possible_values()
                        .iter()
                        .map(|e| return e.get_name().to_string())
                        .collect::<Vec<String>>();
                }

                if let Some(val_int) = val.as_integer() {
                    res.push((key, val_int.to_string()));
                } else if let Some(val_str) = val.as_str() {
                    if val_str.is_empty() {
                        continue;
                    }
                    if !possible_values.is_empty()
                        && !possible_values.contains(&val_str.to_string())
                    {
                        bail!(format!("config.toml has an invalid value for key '{key}': {val_str}\nPossible values are: {}", possible_values.join(", ")));
                    }
                    res.push((key, val_str.to_string()));
                } else {
                    bail!(format!(
                        "config.toml has an invalid value type for key '{key}'"
                    ));
                }
            }
        }

        return Ok(res);
    }

    pub async fn load(cmd: Command, clap_arg_matches: Vec<&ArgMatches>) -> Result<()> {
        for key in ConfigKey::iter() {
            Config::set(key, &Config::default(key))
        }

        let mut config_file = Config::default(ConfigKey::ConfigFile);
        for matches in clap_arg_matches.as_slice() {
            if let Ok(Some(arg_config_file)) =
                matches.try_get_one::<String>(&ConfigKey::ConfigFile.to_string())
            {
                config_file = arg_config_file.to_string();
            }
        }
        Config::set(ConfigKey::ConfigFile, &config_file);

        let config_path = path::PathBuf::from(config_file);
        if config_path.exists() {
            let toml_str = fs::read_to_string(config_path).await?;
            for (key, val) in Config::parse_file(&cmd, &toml_str)? {
                Config::set(key, &val);
            }
        }

        for key in ConfigKey::iter() {
            for matches in clap_arg_matches.as_slice() {
                if let Ok(Some(val)) = matches.try_get_one::<String>(&key.to_string()) {
                    if val.is_empty() {
                        continue;
                    }
                    Config::set(key, val)
                }
            }
        }

        tracing::debug!(
            language = Config::get(ConfigKey::Language),
            model = Config::get(ConfigKey::Model),
            openai_url = Config::get(ConfigKey::OpenAiURL),
            theme = Config::get(ConfigKey::Theme),
            theme_file = Config::get(ConfigKey::ThemeFile),
            credential_file = Config::get(ConfigKey::CredentialFile),
            "config"
        );

        return Ok(());
    }

    pub fn serialize_default(cmd: Command) -> String {
        let toml_str = ConfigKey::iter()
            .filter_map(|key| {
                if key == ConfigKey::ConfigFile {
                    return None;
                }

                let arg = cmd
                    .get_arguments()
                    .find(|e| return e.get_long() == Some(key.to_string().as_str()))?;

                let mut description = arg
                    .get_help()
                    .map(|help| return help.to_string())
                    .unwrap_or_default();

                description = description
                    .split("[default:")
                    .next()
                    .unwrap_or_default()
                    .trim()
                    .to_string();

                if !arg.get_possible_values().is_empty() {
                    let possible_values = arg
                        .get_possible_values()
                        .iter()
                        .map(|e| return e.get_name().to_string())
                        .collect::<Vec<_>>()
                        .join(", ");
                    description = format!("{description} [possible values: {possible_values}]");
                }

                let mut val = Config::default(key);
                if val.is_empty() {
                    val = format!("# {key} = \"\"");
                } else if val.parse::<i32>().is_ok() {
                    val = format!("{key} = {val}");
                } else {
                    val = format!("{key} = {}", toml_edit::Value::from(val.as_str()));
                }

                return Some(format!("# {description}\n{val}"));
            })
            .collect::<Vec<String>>()
            .join("\n\n");

        return toml_str;
    }
}
