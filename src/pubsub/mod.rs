//! Реестр тем Publish–Subscribe.
//!
//! Внутрипроцессный синхронный pub/sub: именованные темы с лимитом
//! подписчиков, подписки по имени и по шаблону, одноразовые подписки,
//! публичный список для `broadcast` и уведомления о каждой мутации.
//!
//! - `registry`: [`Registry`], все операции над темами и доставка.
//! - `listener`: дескрипторы слушателей и их идентичность.
//! - `selector`: точные имена, regex- и glob-шаблоны тем.
//! - `topic`: опции темы и одноразовые обёртки.
//! - `notification`: виды уведомлений, мягкие ошибки, наблюдатели.
//! - `stats`: агрегатор статистики поверх уведомлений.
//! - `command`: текстовые команды над `Registry<String>`.

pub mod command;
pub mod listener;
pub mod notification;
pub mod registry;
pub mod selector;
pub mod stats;
pub mod topic;

pub use command::{CommandReply, ListenerDirectory, RegistryCommand};
pub use listener::{Listener, ListenerId};
pub(crate) use notification::Notifier;
pub use notification::{Condition, Notification, NotificationData, NotificationKind, ObserverId};
pub use registry::Registry;
pub use selector::{TopicPattern, TopicSelector};
pub use stats::{RegistryStats, StatsSnapshot, TopicStats};
pub use topic::{OnceSubscriber, TopicOptions};
