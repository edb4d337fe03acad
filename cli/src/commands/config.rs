//! Config commands

use anyhow::bail;
use clap::ValueEnum;
use std::path::PathBuf;

use crate::config::Config;
use crate::output::OutputFormat;
use crate::ConfigCommands;

const KEYS: [&str; 3] = ["storage_dir", "auto_save_interval_secs", "default_format"];

pub fn handle(action: ConfigCommands, profile: Option<&str>) -> anyhow::Result<()> {
    match action {
        ConfigCommands::Init => {
            let config = Config {
                storage_dir: Some(Config::default().storage_dir()),
                auto_save_interval_secs: Some(formwright_core::DEFAULT_AUTO_SAVE_INTERVAL.as_secs()),
                default_format: Some("table".to_string()),
            };
            let path = config.save(profile)?;
            println!("Configuration initialized at {}", path.display());
        }
        ConfigCommands::Set { key, value } => {
            let mut config = Config::load(profile)?;
            set(&mut config, &key, value)?;
            config.save(profile)?;
            println!("Set {} successfully", key);
        }
        ConfigCommands::Get { key } => {
            let config = Config::load(profile)?;
            println!("{}: {}", key, get(&config, &key)?.unwrap_or_else(|| "(not set)".into()));
        }
        ConfigCommands::List => {
            let config = Config::load(profile)?;
            for key in KEYS {
                println!("{}: {}", key, get(&config, key)?.unwrap_or_else(|| "(not set)".into()));
            }
        }
    }
    Ok(())
}

fn set(config: &mut Config, key: &str, value: String) -> anyhow::Result<()> {
    match key {
        "storage_dir" => config.storage_dir = Some(PathBuf::from(value)),
        "auto_save_interval_secs" => match value.parse::<u64>() {
            Ok(secs) if secs > 0 => config.auto_save_interval_secs = Some(secs),
            _ => bail!("auto_save_interval_secs must be a positive number of seconds"),
        },
        "default_format" => {
            if OutputFormat::from_str(&value, true).is_err() {
                bail!("default_format must be table, json or yaml");
            }
            config.default_format = Some(value.to_lowercase());
        }
        _ => bail!("Unknown config key: {}", key),
    }
    Ok(())
}

fn get(config: &Config, key: &str) -> anyhow::Result<Option<String>> {
    Ok(match key {
        "storage_dir" => config.storage_dir.as_ref().map(|p| p.display().to_string()),
        "auto_save_interval_secs" => config.auto_save_interval_secs.map(|s| s.to_string()),
        "default_format" => config.default_format.clone(),
        _ => bail!("Unknown config key: {}", key),
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_set_and_get() {
        let mut config = Config::default();
        set(&mut config, "default_format", "JSON".into()).unwrap();
        set(&mut config, "auto_save_interval_secs", "10".into()).unwrap();

        assert_eq!(get(&config, "default_format").unwrap().as_deref(), Some("json"));
        assert_eq!(get(&config, "auto_save_interval_secs").unwrap().as_deref(), Some("10"));
        assert_eq!(get(&config, "storage_dir").unwrap(), None);
    }

    #[test]
    fn test_rejects_bad_values() {
        let mut config = Config::default();
        assert!(set(&mut config, "default_format", "xml".into()).is_err());
        assert!(set(&mut config, "auto_save_interval_secs", "0".into()).is_err());
        assert!(set(&mut config, "api_key", "x".into()).is_err());
        assert!(get(&config, "api_key").is_err());
    }
}
