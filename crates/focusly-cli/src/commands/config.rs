use clap::Subcommand;
use focusly_core::{Config, ConfigError};
use serde_json::Value;

#[derive(Subcommand)]
pub enum ConfigAction {
    /// Get a value, or a whole section (e.g. "timer.work_duration", "sound")
    Get {
        key: String,
    },
    /// Set a config value
    Set {
        /// Dot-path key, as printed by `config list`
        key: String,
        /// New value (empty clears optional values)
        value: String,
    },
    /// List every value, grouped by section
    List {
        /// Print the raw JSON document instead
        #[arg(long)]
        json: bool,
    },
    /// Reset config to defaults
    Reset,
    /// Print the config file location
    Path,
}

fn leaf(value: &Value) -> String {
    match value {
        Value::Null => "(unset)".to_string(),
        other => other.to_string(),
    }
}

/// One `section.key = value` line per field, ready to paste into `config set`.
fn render_section(name: &str, section: &Value) -> String {
    let Some(fields) = section.as_object() else {
        return format!("{name} = {}\n", leaf(section));
    };
    fields
        .iter()
        .map(|(key, value)| format!("{name}.{key} = {}\n", leaf(value)))
        .collect()
}

fn render(config: &Config) -> Result<String, serde_json::Error> {
    let root = serde_json::to_value(config)?;
    let sections: Vec<String> = root
        .as_object()
        .into_iter()
        .flatten()
        .map(|(name, section)| render_section(name, section))
        .collect();
    Ok(sections.join("\n"))
}

pub fn run(action: ConfigAction) -> Result<(), Box<dyn std::error::Error>> {
    match action {
        ConfigAction::Get { key } => {
            let config = Config::load()?;
            let root = serde_json::to_value(&config)?;
            match root.get(&key) {
                Some(section @ Value::Object(_)) => print!("{}", render_section(&key, section)),
                _ => {
                    let value = config.get(&key).ok_or(ConfigError::UnknownKey(key))?;
                    println!("{value}");
                }
            }
        }
        ConfigAction::Set { key, value } => {
            let mut config = Config::load()?;
            config.set(&key, &value)?;
            config.save()?;
            println!("{key} = {}", config.get(&key).unwrap_or_default());
        }
        ConfigAction::List { json } => {
            let config = Config::load()?;
            if json {
                println!("{}", serde_json::to_string_pretty(&config)?);
            } else {
                print!("{}", render(&config)?);
            }
        }
        ConfigAction::Reset => {
            Config::default().save()?;
            println!("config reset to defaults");
        }
        ConfigAction::Path => {
            println!("{}", Config::path()?.display());
        }
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn sections_render_as_dot_paths() {
        let text = render(&Config::default()).unwrap();
        assert!(text.contains("timer.work_duration = 25\n"));
        assert!(text.contains("timer.auto_continue = false\n"));
        assert!(text.contains("sound.effect = \"BELL\"\n"));
        assert!(text.contains("sound.command = (unset)\n"));
    }

    #[test]
    fn sections_are_separated() {
        let text = render(&Config::default()).unwrap();
        let groups: Vec<&str> = text.split("\n\n").collect();
        assert_eq!(groups.len(), 2);
        assert!(groups.iter().all(|g| {
            let prefix = g.split('.').next().unwrap_or_default();
            g.lines().all(|line| line.starts_with(prefix))
        }));
    }
}
