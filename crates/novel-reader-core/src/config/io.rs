use super::models::AppConfig;
use super::tables::ConfigTables;
use std::fs;
use std::path::Path;
use tracing::{debug, info, warn};

/// Load configuration from the given path, falling back to defaults on error.
pub fn load_config(path: &Path) -> AppConfig {
    let contents = match fs::read_to_string(path) {
        Ok(data) => {
            info!(path = %path.display(), "Loaded base config");
            data
        }
        Err(err) => {
            warn!(
                path = %path.display(),
                "Falling back to default config: {err}"
            );
            return AppConfig::default();
        }
    };

    match parse_config(&contents) {
        Ok(cfg) => {
            debug!("Parsed configuration from disk");
            cfg
        }
        Err(err) => {
            warn!(path = %path.display(), "Invalid config TOML: {err}");
            AppConfig::default()
        }
    }
}

pub fn parse_config(contents: &str) -> Result<AppConfig, toml::de::Error> {
    let tables: ConfigTables = toml::from_str(contents)?;
    Ok(AppConfig::from(tables).normalized())
}

pub fn serialize_config(config: &AppConfig) -> Result<String, toml::ser::Error> {
    toml::to_string(&ConfigTables::from(config))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::{LogLevel, PlatformHint};
    use crate::speech::ProviderKind;

    #[test]
    fn empty_file_yields_defaults() {
        let config = parse_config("").expect("empty TOML parses");
        assert_eq!(config, AppConfig::default());
        assert_eq!(config.words_per_page, 400);
        assert_eq!(config.skip_words, 50);
    }

    #[test]
    fn grouped_tables_map_onto_flat_config() {
        let config = parse_config(
            r#"
            [reading]
            words_per_page = 250
            resume_after_navigation = true

            [tts]
            provider = "secondary"
            voice = "af_bella"
            speed = 9.0
            platform = "touch"

            [logging]
            log_level = "debug"
            "#,
        )
        .expect("valid config");

        assert_eq!(config.words_per_page, 250);
        assert!(config.resume_after_navigation);
        assert_eq!(config.tts_provider, ProviderKind::Secondary);
        assert_eq!(config.tts_voice, "af_bella");
        assert!((config.tts_speed - 2.0).abs() < f32::EPSILON);
        assert_eq!(config.platform, PlatformHint::Touch);
        assert_eq!(config.log_level, LogLevel::Debug);
        assert_eq!(config.skip_words, 50);
    }

    #[test]
    fn zero_words_per_page_is_clamped() {
        let config = parse_config("[reading]\nwords_per_page = 0\n").expect("valid config");
        assert_eq!(config.words_per_page, 1);
    }

    #[test]
    fn serialized_config_parses_back() {
        let mut config = AppConfig::default();
        config.tts_voice = "am_alloy".to_string();
        config.pacing_ms = 250;
        let text = serialize_config(&config).expect("serializes");
        assert_eq!(parse_config(&text).expect("parses"), config);
    }

    #[test]
    fn missing_file_falls_back_to_defaults() {
        let config = load_config(Path::new("/definitely/not/here/config.toml"));
        assert_eq!(config, AppConfig::default());
    }
}
