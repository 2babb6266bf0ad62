//! Внутрипроцессный реестр тем publish/subscribe.
//!
//! ```
//! use topical::{Listener, Registry, TopicSelector};
//!
//! let registry = Registry::<String>::new();
//! registry.add_topic("beep").unwrap();
//! registry.add_topic("boop").unwrap();
//!
//! let printer = Listener::new(|event: &String| println!("{event}"));
//! registry.subscribe(TopicSelector::regex("^b.+p$").unwrap(), &printer);
//! registry.publish("beep", "woot".to_string()).unwrap();
//! ```

/// Загрузка настроек процесса.
pub mod config;
/// Ошибки реестра и результаты операций.
pub mod error;
/// Логирование (фильтры, форматы, консольный и файловый вывод).
pub mod logging;
/// Реестр тем, слушатели, селекторы, уведомления.
pub mod pubsub;

// -----------------------------------------------------------------------------
//  Frequently used public types
// -----------------------------------------------------------------------------

pub use config::Settings;
pub use error::{
    ErrorExt, ErrorResponse, ListenerError, LogLevel, RegistryError, RegistryResult, ResultExt,
    StackError, StatusCode,
};
pub use logging::{init_logging, LogFormat, LoggingConfig, LoggingError, LoggingHandle};
pub use pubsub::{
    CommandReply, Condition, Listener, ListenerDirectory, ListenerId, Notification,
    NotificationData, NotificationKind, ObserverId, Registry, RegistryCommand, RegistryStats,
    StatsSnapshot, TopicOptions, TopicPattern, TopicSelector, TopicStats,
};
