use std::fmt;

use num_enum::TryFromPrimitive;
#[cfg(feature = "serde_repr")]
use serde_repr::{Deserialize_repr, Serialize_repr};
#[cfg(feature = "strum")]
use strum_macros::{AsRefStr, EnumIter};

/// Коды статуса жёстких ошибок реестра.
///
/// Неизвестная тема и переполнение темы сюда не входят: это не ошибки,
/// а уведомления наблюдателям.
///
/// - `1000`: внутренняя ошибка (код по умолчанию для [`crate::ErrorExt`]);
/// - `10xx`: ошибки аргументов вызова;
/// - `11xx`: сбои во время доставки.
#[cfg_attr(feature = "strum", derive(AsRefStr, EnumIter))]
#[cfg_attr(feature = "serde_repr", derive(Serialize_repr, Deserialize_repr))]
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, TryFromPrimitive)]
#[repr(u32)]
#[non_exhaustive]
pub enum StatusCode {
    Internal = 1000,
    InvalidArgs = 1001,
    MissingArgs = 1002,
    InvalidPattern = 1003,
    ListenerFailed = 1100,
}

/// Уровень, с которым ошибку стоит записать в лог.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LogLevel {
    Debug,
    Warn,
    Error,
}

impl StatusCode {
    pub const fn code(self) -> u32 {
        self as u32
    }

    /// `None`, если значение не соответствует ни одному коду.
    pub fn from_u32(v: u32) -> Option<Self> {
        Self::try_from(v).ok()
    }

    /// Ошибка вызывающей стороны: вызов отклонён до изменения состояния.
    pub fn is_client_error(&self) -> bool {
        matches!(
            self,
            Self::InvalidArgs | Self::MissingArgs | Self::InvalidPattern
        )
    }

    pub fn log_level(&self) -> LogLevel {
        match self {
            Self::InvalidArgs | Self::MissingArgs | Self::InvalidPattern => LogLevel::Debug,
            Self::ListenerFailed => LogLevel::Warn,
            Self::Internal => LogLevel::Error,
        }
    }
}

impl From<StatusCode> for u32 {
    fn from(c: StatusCode) -> Self {
        c.code()
    }
}

impl fmt::Display for StatusCode {
    fn fmt(
        &self,
        f: &mut fmt::Formatter<'_>,
    ) -> fmt::Result {
        #[cfg(feature = "strum")]
        {
            write!(f, "{} ({})", self.as_ref(), self.code())
        }
        #[cfg(not(feature = "strum"))]
        {
            write!(f, "{:?} ({})", self, self.code())
        }
    }
}
