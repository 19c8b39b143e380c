use clap::Subcommand;
use focusly_core::{ConfigError, Database, PomodoroConfig};

#[derive(Subcommand)]
pub enum SettingsAction {
    /// Print a user's settings as JSON (created with defaults if missing)
    Show {
        #[arg(long)]
        user: String,
    },
    /// Change one setting
    Set {
        #[arg(long)]
        user: String,
        /// Setting name (e.g. "work_duration", "sound_effect")
        key: String,
        value: String,
    },
    /// Restore a user's defaults
    Reset {
        #[arg(long)]
        user: String,
    },
}

fn apply(cfg: &mut PomodoroConfig, key: &str, value: &str) -> Result<(), ConfigError> {
    let number = || {
        value
            .parse::<u32>()
            .map_err(|_| ConfigError::InvalidValue {
                key: key.to_string(),
                message: format!("cannot parse '{value}' as a whole number"),
            })
    };
    match key {
        "work_duration" => cfg.work_duration = number()?,
        "short_break_duration" => cfg.short_break_duration = number()?,
        "long_break_duration" => cfg.long_break_duration = number()?,
        "long_break_interval" => cfg.long_break_interval = number()?,
        "rounds" => cfg.rounds = number()?,
        "sound_effect" => cfg.sound_effect = value.parse()?,
        "sound_effect_volume" => {
            cfg.sound_effect_volume = value.parse().map_err(|_| ConfigError::InvalidValue {
                key: key.to_string(),
                message: format!("cannot parse '{value}' as a number"),
            })?
        }
        _ => return Err(ConfigError::UnknownKey(key.to_string())),
    }
    Ok(())
}

pub fn run(action: SettingsAction) -> Result<(), Box<dyn std::error::Error>> {
    let db = Database::open()?;

    match action {
        SettingsAction::Show { user } => {
            let cfg = db.get_or_create_settings(&user)?;
            println!("{}", serde_json::to_string_pretty(&cfg)?);
        }
        SettingsAction::Set { user, key, value } => {
            let mut cfg = db.get_or_create_settings(&user)?;
            apply(&mut cfg, &key, &value)?;
            db.save_settings(&user, &cfg)?;
            println!("ok");
        }
        SettingsAction::Reset { user } => {
            db.delete_settings(&user)?;
            let cfg = db.get_or_create_settings(&user)?;
            println!("{}", serde_json::to_string_pretty(&cfg)?);
        }
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use focusly_core::SoundEffect;

    #[test]
    fn apply_known_keys() {
        let mut cfg = PomodoroConfig::default();
        apply(&mut cfg, "rounds", "8").unwrap();
        apply(&mut cfg, "sound_effect", "bird").unwrap();
        apply(&mut cfg, "sound_effect_volume", "0.1").unwrap();
        assert_eq!(cfg.rounds, 8);
        assert_eq!(cfg.sound_effect, SoundEffect::Bird);
        assert_eq!(cfg.sound_effect_volume, 0.1);
    }

    #[test]
    fn apply_rejects_bad_input() {
        let mut cfg = PomodoroConfig::default();
        assert!(matches!(apply(&mut cfg, "theme", "dark"), Err(ConfigError::UnknownKey(_))));
        assert!(apply(&mut cfg, "rounds", "-1").is_err());
        assert!(apply(&mut cfg, "sound_effect", "gong").is_err());
    }
}
