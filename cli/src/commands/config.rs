//! Config commands

use crate::config::Config;
use crate::output::OutputFormat;
use crate::ConfigCommands;
use anyhow::bail;

fn field<'a>(config: &'a mut Config, key: &str) -> anyhow::Result<&'a mut Option<String>> {
    Ok(match key {
        "api_url" => &mut config.api_url,
        "pin_lookup_url" => &mut config.pin_lookup_url,
        "default_format" => &mut config.default_format,
        _ => bail!("unknown config key: {}", key),
    })
}

pub async fn handle(action: ConfigCommands, profile: Option<&str>) -> anyhow::Result<()> {
    match action {
        ConfigCommands::Init => {
            let path = Config::starter().save(profile)?;
            println!("Configuration initialized at {}", path.display());
        }
        ConfigCommands::Set { key, value } => {
            if key == "default_format" && OutputFormat::from_name(&value).is_none() {
                bail!("default_format must be one of table, json, yaml");
            }
            let mut config = Config::load(profile)?;
            *field(&mut config, &key)? = Some(value);
            config.save(profile)?;
            println!("Set {} successfully", key);
        }
        ConfigCommands::Get { key } => {
            let mut config = Config::load(profile)?;
            let value = field(&mut config, &key)?.clone();
            println!("{}: {}", key, value.unwrap_or_else(|| "(not set)".into()));
        }
        ConfigCommands::List => {
            let config = Config::load(profile)?;
            let show = |v: Option<String>| v.unwrap_or_else(|| "(not set)".into());
            println!("api_url: {}", show(config.api_url));
            println!("pin_lookup_url: {}", show(config.pin_lookup_url));
            println!("default_format: {}", show(config.default_format));
        }
    }
    Ok(())
}
