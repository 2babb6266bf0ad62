//! Ошибки реестра.
//!
//! Типы определены в `topical-error`; здесь только переэкспорт и
//! псевдоним результата для операций реестра.

pub use topical_error::{
    ErrorExt, ErrorResponse, ListenerError, LogLevel, RegistryError, ResultExt, StackError,
    StatusCode,
};

/// Результат операций реестра.
pub type RegistryResult<T> = Result<T, RegistryError>;
