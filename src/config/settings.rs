use std::path::{Path, PathBuf};

use config::{Config, ConfigError, Environment, File};
use serde::{Deserialize, Serialize};

use crate::{
    logging::{LoggingConfig, LoggingError},
    TopicOptions,
};

/// Настройки процесса: опции тем по умолчанию и логирование.
///
/// Источники по возрастанию приоритета: значения по умолчанию,
/// необязательный файл, переменные окружения `TOPICAL_*`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Settings {
    /// Лимит подписчиков новых тем; отсутствие означает без лимита.
    pub default_max_subscribers: Option<usize>,
    pub default_duplicates: bool,
    pub log_level: String,
    pub log_format: String,
    pub log_dir: Option<String>,
    pub file_logging: bool,
}

impl Settings {
    pub fn load() -> Result<Self, ConfigError> {
        Self::build(None)
    }

    /// Как [`Settings::load`], но сначала читает файл `path`, если он есть.
    pub fn load_from(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        Self::build(Some(path.as_ref()))
    }

    fn build(path: Option<&Path>) -> Result<Self, ConfigError> {
        let mut builder = Config::builder()
            .set_default("default_duplicates", false)?
            .set_default("log_level", "info")?
            .set_default("log_format", "compact")?
            .set_default("file_logging", false)?;

        if let Some(path) = path {
            builder = builder.add_source(File::from(path).required(false));
        }

        // TOPICAL_DEFAULT_MAX_SUBSCRIBERS, TOPICAL_LOG_LEVEL, ...
        let cfg = builder
            .add_source(Environment::with_prefix("TOPICAL").try_parsing(true))
            .build()?;

        cfg.try_deserialize()
    }

    /// Опции, которые реестр применяет к `add_topic` без явных опций.
    pub fn topic_defaults(&self) -> TopicOptions {
        TopicOptions::default()
            .with_max(self.default_max_subscribers.unwrap_or(usize::MAX))
            .with_duplicates(self.default_duplicates)
    }

    pub fn logging_config(&self) -> Result<LoggingConfig, LoggingError> {
        let mut cfg = LoggingConfig {
            level: self.log_level.clone(),
            format: self.log_format.parse()?,
            file_enabled: self.file_logging,
            ..Default::default()
        };
        if let Some(dir) = &self.log_dir {
            cfg.log_dir = PathBuf::from(dir);
        }
        Ok(cfg)
    }
}

#[cfg(test)]
mod tests {
    use std::{env, io::Write};

    use serial_test::serial;

    use super::*;
    use crate::logging::LogFormat;

    const VARS: [&str; 6] = [
        "TOPICAL_DEFAULT_MAX_SUBSCRIBERS",
        "TOPICAL_DEFAULT_DUPLICATES",
        "TOPICAL_LOG_LEVEL",
        "TOPICAL_LOG_FORMAT",
        "TOPICAL_LOG_DIR",
        "TOPICAL_FILE_LOGGING",
    ];

    fn clear_env() {
        for var in VARS {
            env::remove_var(var);
        }
    }

    #[test]
    #[serial]
    fn test_defaults() {
        clear_env();
        let s = Settings::load().unwrap();
        assert_eq!(s.default_max_subscribers, None);
        assert!(!s.default_duplicates);
        assert_eq!(s.topic_defaults(), TopicOptions::default());

        let log = s.logging_config().unwrap();
        assert_eq!(log.level, "info");
        assert_eq!(log.format, LogFormat::Compact);
        assert!(!log.file_enabled);
    }

    /// Тест проверяет, что переменные окружения с префиксом TOPICAL_
    /// перекрывают значения по умолчанию.
    #[test]
    #[serial]
    fn test_env_overrides() {
        clear_env();
        env::set_var("TOPICAL_DEFAULT_MAX_SUBSCRIBERS", "5");
        env::set_var("TOPICAL_DEFAULT_DUPLICATES", "true");
        env::set_var("TOPICAL_LOG_FORMAT", "json");
        env::set_var("TOPICAL_LOG_DIR", "/tmp/topical");
        let s = Settings::load();
        clear_env();
        let s = s.unwrap();

        assert_eq!(
            s.topic_defaults(),
            TopicOptions::default().with_max(5).with_duplicates(true)
        );
        let log = s.logging_config().unwrap();
        assert_eq!(log.format, LogFormat::Json);
        assert_eq!(log.log_dir, PathBuf::from("/tmp/topical"));
    }

    #[test]
    #[serial]
    fn test_load_from_file() {
        clear_env();
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("topical.toml");
        let mut f = std::fs::File::create(&path).unwrap();
        writeln!(f, "default_max_subscribers = 2\nlog_level = \"debug\"").unwrap();

        let s = Settings::load_from(&path).unwrap();
        assert_eq!(s.default_max_subscribers, Some(2));
        assert_eq!(s.log_level, "debug");

        // отсутствующий файл не ошибка
        let s = Settings::load_from(dir.path().join("missing.toml")).unwrap();
        assert_eq!(s.default_max_subscribers, None);
    }

    #[test]
    #[serial]
    fn test_bad_log_format() {
        clear_env();
        env::set_var("TOPICAL_LOG_FORMAT", "xml");
        let s = Settings::load();
        clear_env();
        assert!(matches!(
            s.unwrap().logging_config(),
            Err(LoggingError::InvalidFormat(_))
        ));
    }
}
