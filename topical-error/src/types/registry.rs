use thiserror::Error;

use crate::{ErrorExt, ListenerError, StatusCode};

/// Жёсткие ошибки операций реестра тем.
///
/// Любая из них прерывает вызов целиком, до каких-либо изменений
/// состояния (кроме `ListenerFailed`, которая возникает уже во время
/// доставки). Ожидаемые состояния вроде неизвестной темы или
/// переполнения не являются ошибками и приходят наблюдателям как
/// уведомления.
#[derive(Debug, Clone, Error)]
pub enum RegistryError {
    /// Аргумент неверного вида: пустое имя темы, некорректные опции,
    /// неизвестная команда.
    #[error("{operation}(): invalid input argument. {reason}")]
    InvalidArgument {
        operation: &'static str,
        reason: String,
    },

    /// Не передан обязательный аргумент (например, событие для `publish`).
    #[error("{operation}(): insufficient input arguments. Must provide {argument}.")]
    MissingArgument {
        operation: &'static str,
        argument: &'static str,
    },

    /// Шаблон темы не компилируется.
    #[error("invalid topic pattern '{pattern}': {reason}")]
    InvalidPattern { pattern: String, reason: String },

    /// Слушатель вернул ошибку во время доставки.
    #[error("listener failed on {}: {source}", .topic.as_deref().unwrap_or("broadcast"))]
    ListenerFailed {
        topic: Option<String>,
        #[source]
        source: ListenerError,
    },
}

impl RegistryError {
    pub fn invalid_argument(
        operation: &'static str,
        reason: impl Into<String>,
    ) -> Self {
        Self::InvalidArgument {
            operation,
            reason: reason.into(),
        }
    }

    pub fn missing_argument(
        operation: &'static str,
        argument: &'static str,
    ) -> Self {
        Self::MissingArgument {
            operation,
            argument,
        }
    }

    pub fn invalid_pattern(
        pattern: impl Into<String>,
        reason: impl ToString,
    ) -> Self {
        Self::InvalidPattern {
            pattern: pattern.into(),
            reason: reason.to_string(),
        }
    }

    pub fn listener_failed(
        topic: Option<&str>,
        source: ListenerError,
    ) -> Self {
        Self::ListenerFailed {
            topic: topic.map(str::to_owned),
            source,
        }
    }

    /// `true` для ошибок вызывающей стороны (неверные или недостающие
    /// аргументы).
    pub fn is_argument_error(&self) -> bool {
        matches!(
            self,
            Self::InvalidArgument { .. } | Self::MissingArgument { .. } | Self::InvalidPattern { .. }
        )
    }
}

impl ErrorExt for RegistryError {
    fn status_code(&self) -> StatusCode {
        match self {
            Self::InvalidArgument { .. } => StatusCode::InvalidArgs,
            Self::MissingArgument { .. } => StatusCode::MissingArgs,
            Self::InvalidPattern { .. } => StatusCode::InvalidPattern,
            Self::ListenerFailed { .. } => StatusCode::ListenerFailed,
        }
    }

    fn client_message(&self) -> String {
        match self {
            Self::ListenerFailed { .. } => "Listener failed during dispatch".to_string(),
            other => other.to_string(),
        }
    }

    fn metrics_tags(&self) -> Vec<(&'static str, String)> {
        let mut tags = vec![
            ("error_type", "registry".to_string()),
            ("status_code", self.status_code().to_string()),
        ];

        match self {
            Self::InvalidArgument { operation, .. } | Self::MissingArgument { operation, .. } => {
                tags.push(("operation", operation.to_string()));
            }
            Self::InvalidPattern { pattern, .. } => {
                tags.push(("pattern", pattern.clone()));
            }
            Self::ListenerFailed {
                topic: Some(topic), ..
            } => {
                tags.push(("topic", topic.clone()));
            }
            Self::ListenerFailed { topic: None, .. } => {}
        }

        tags
    }
}

/// Конвертация из globset::Error
#[cfg(feature = "globset")]
impl From<globset::Error> for RegistryError {
    fn from(err: globset::Error) -> Self {
        RegistryError::InvalidPattern {
            pattern: err.glob().unwrap_or_default().to_string(),
            reason: err.kind().to_string(),
        }
    }
}

/// Конвертация из regex::Error
#[cfg(feature = "regex")]
impl From<regex::Error> for RegistryError {
    fn from(err: regex::Error) -> Self {
        RegistryError::InvalidPattern {
            pattern: String::new(),
            reason: err.to_string(),
        }
    }
}
