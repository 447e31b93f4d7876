use std::env;
use std::fs;
use tempfile::tempdir;

#[cfg(test)]
mod config_tests {
    use super::*;
    use event_analytics::config::Config;

    #[test]
    fn test_default_config_values() {
        let config = Config::default();

        // Test logging defaults
        assert_eq!(config.logging.level, "WARN");
        assert_eq!(config.logging.format, "pretty");
        assert_eq!(config.logging.output, "console");

        // Test ingestion defaults
        assert_eq!(config.ingestion.threshold, 1000);
        assert_eq!(config.ingestion.buffer_size_kb, 8);
        assert_eq!(config.ingestion.tick_interval_ms, 0);

        // Test output defaults
        assert!(!config.output.json);
        assert!(config.output.json_pretty);
    }

    #[test]
    fn test_env_variable_override() {
        env::set_var("EVENT_ANALYTICS_THRESHOLD", "25");
        env::set_var("EVENT_ANALYTICS_BUFFER_SIZE_KB", "64");
        env::set_var("EVENT_ANALYTICS_TICK_MS", "16");
        env::set_var("EVENT_ANALYTICS_LOG_DIR", "/tmp/event-analytics-logs");

        let mut config = Config::default();
        let applied = config.apply_env_overrides();

        env::remove_var("EVENT_ANALYTICS_THRESHOLD");
        env::remove_var("EVENT_ANALYTICS_BUFFER_SIZE_KB");
        env::remove_var("EVENT_ANALYTICS_TICK_MS");
        env::remove_var("EVENT_ANALYTICS_LOG_DIR");

        applied.expect("Failed to apply env overrides");
        assert_eq!(config.ingestion.threshold, 25);
        assert_eq!(config.ingestion.buffer_size_kb, 64);
        assert_eq!(config.ingestion.tick_interval_ms, 16);
        assert_eq!(
            config.paths.log_directory,
            std::path::PathBuf::from("/tmp/event-analytics-logs")
        );
    }

    #[test]
    fn test_config_validation() {
        let mut config = Config::default();
        assert!(config.validate().is_ok());

        config.ingestion.threshold = 0;
        assert!(config.validate().is_err());

        config = Config::default();
        config.ingestion.buffer_size_kb = 2000; // Too large
        assert!(config.validate().is_err());

        config = Config::default();
        config.logging.output = "syslog".to_string();
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_config_file_loading() {
        let temp_dir = tempdir().expect("Failed to create temp dir");
        let config_path = temp_dir.path().join("test-config.toml");

        let test_config = r#"
[logging]
level = "DEBUG"
format = "json"
output = "file"

[ingestion]
threshold = 50
buffer_size_kb = 4
tick_interval_ms = 10

[output]
json = true
json_pretty = false

[paths]
log_directory = "/custom/logs"
        "#;

        fs::write(&config_path, test_config).expect("Failed to write test config");

        let config = Config::load_from_file(&config_path).expect("Failed to load config");

        assert_eq!(config.logging.level, "DEBUG");
        assert_eq!(config.logging.format, "json");
        assert_eq!(config.ingestion.threshold, 50);
        assert_eq!(config.buffer_size_bytes(), 4096);
        assert!(config.output.json);
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_config_save_and_reload() {
        let temp_dir = tempdir().expect("Failed to create temp dir");
        let config_path = temp_dir.path().join("saved.toml");

        let mut config = Config::default();
        config.ingestion.threshold = 7;
        config.save_to_file(&config_path).expect("Failed to save config");

        let toml_string = fs::read_to_string(&config_path).unwrap();
        assert!(toml_string.contains("[logging]"));
        assert!(toml_string.contains("[ingestion]"));
        assert!(toml_string.contains("[paths]"));

        let reloaded = Config::load_from_file(&config_path).expect("Failed to reload config");
        assert_eq!(reloaded.ingestion.threshold, 7);
        assert_eq!(reloaded.logging.level, config.logging.level);
    }
}
