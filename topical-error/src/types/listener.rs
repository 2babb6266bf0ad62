use std::{error::Error as StdError, sync::Arc};

use thiserror::Error;

use crate::{ErrorExt, StatusCode};

/// Ошибка, которую возвращает слушатель при обработке события.
///
/// Реестр её не перехватывает: доставка прерывается, а ошибка
/// поднимается к тому, кто вызвал `publish`/`broadcast`.
#[derive(Debug, Clone, Error)]
#[error("{message}")]
pub struct ListenerError {
    message: String,
    #[source]
    source: Option<Arc<dyn StdError + Send + Sync>>,
}

impl ListenerError {
    pub fn new(message: impl Into<String>) -> Self {
        Self {
            message: message.into(),
            source: None,
        }
    }

    /// Оборачивает произвольную ошибку, сохраняя её как `source`.
    pub fn from_error<E>(err: E) -> Self
    where
        E: StdError + Send + Sync + 'static,
    {
        Self {
            message: err.to_string(),
            source: Some(Arc::new(err)),
        }
    }

    pub fn message(&self) -> &str {
        &self.message
    }
}

impl ErrorExt for ListenerError {
    fn status_code(&self) -> StatusCode {
        StatusCode::ListenerFailed
    }
}

impl From<String> for ListenerError {
    fn from(message: String) -> Self {
        Self::new(message)
    }
}

impl From<&str> for ListenerError {
    fn from(message: &str) -> Self {
        Self::new(message)
    }
}
