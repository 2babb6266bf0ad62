use std::error::Error;

use crate::{StackError, StatusCode};

/// Общий интерфейс ошибок крейта: код статуса, сообщение для
/// вызывающей стороны и поля для структурированного лога.
pub trait ErrorExt: Error + Send + Sync + 'static {
    /// По умолчанию [`StatusCode::Internal`].
    fn status_code(&self) -> StatusCode {
        StatusCode::Internal
    }

    /// Сообщение для вызывающей стороны. Внутренние ошибки деталей не
    /// раскрывают.
    fn client_message(&self) -> String {
        match self.status_code() {
            StatusCode::Internal => "Internal registry error".to_string(),
            _ => self.to_string(),
        }
    }

    /// Пары ключ-значение для полей `tracing`.
    fn metrics_tags(&self) -> Vec<(&'static str, String)> {
        let type_name = std::any::type_name::<Self>();
        vec![
            (
                "error_type",
                type_name.rsplit("::").next().unwrap_or(type_name).to_string(),
            ),
            ("status_code", self.status_code().to_string()),
        ]
    }
}

/// `.context(...)` и `.with_context(...)` для любого `Result`, ошибка
/// которого сводится к [`StackError`].
pub trait ResultExt<T> {
    fn context<C>(
        self,
        ctx: C,
    ) -> Result<T, StackError>
    where
        C: Into<String>;

    /// Замыкание вызывается только при ошибке.
    fn with_context<C, F>(
        self,
        f: F,
    ) -> Result<T, StackError>
    where
        C: Into<String>,
        F: FnOnce() -> C;
}

impl<T, E> ResultExt<T> for Result<T, E>
where
    E: Into<StackError>,
{
    #[track_caller]
    fn context<C>(
        self,
        ctx: C,
    ) -> Result<T, StackError>
    where
        C: Into<String>,
    {
        match self {
            Ok(v) => Ok(v),
            Err(e) => Err(e.into().context(ctx)),
        }
    }

    #[track_caller]
    fn with_context<C, F>(
        self,
        f: F,
    ) -> Result<T, StackError>
    where
        C: Into<String>,
        F: FnOnce() -> C,
    {
        match self {
            Ok(v) => Ok(v),
            Err(e) => Err(e.into().context(f())),
        }
    }
}
