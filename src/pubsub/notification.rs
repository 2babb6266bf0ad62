use std::{
    cell::RefCell,
    fmt,
    sync::{
        atomic::{AtomicU64, Ordering},
        Arc,
    },
};

use serde::{Deserialize, Serialize};

use super::ListenerId;

/// Вид уведомления о мутации реестра.
///
/// Строковые имена (`add`, `remove`, ...) — стабильный контракт для
/// внешних наблюдателей.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum NotificationKind {
    Add,
    Remove,
    Subscribe,
    Unsubscribe,
    List,
    Unlist,
    Publish,
    Broadcast,
    /// Мягкие ошибки: неизвестная тема, переполнение.
    Error,
}

impl NotificationKind {
    pub const ALL: [NotificationKind; 9] = [
        Self::Add,
        Self::Remove,
        Self::Subscribe,
        Self::Unsubscribe,
        Self::List,
        Self::Unlist,
        Self::Publish,
        Self::Broadcast,
        Self::Error,
    ];

    pub fn as_str(self) -> &'static str {
        match self {
            Self::Add => "add",
            Self::Remove => "remove",
            Self::Subscribe => "subscribe",
            Self::Unsubscribe => "unsubscribe",
            Self::List => "list",
            Self::Unlist => "unlist",
            Self::Publish => "publish",
            Self::Broadcast => "broadcast",
            Self::Error => "error",
        }
    }
}

impl fmt::Display for NotificationKind {
    fn fmt(
        &self,
        f: &mut fmt::Formatter<'_>,
    ) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Ожидаемое, восстановимое состояние, о котором сообщается наблюдателям
/// вместо ошибки.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Condition {
    /// `subscribe`/`once` на несуществующую тему.
    UnknownTopic,
    /// Тема уже содержит `max` подписчиков.
    CapacityExceeded,
}

impl fmt::Display for Condition {
    fn fmt(
        &self,
        f: &mut fmt::Formatter<'_>,
    ) -> fmt::Result {
        match self {
            Self::UnknownTopic => f.write_str("Unknown topic."),
            Self::CapacityExceeded => f.write_str("Maximum number of subscribers exceeded."),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum NotificationData {
    None,
    Listener(ListenerId),
    Condition(Condition),
}

/// Уведомление о мутации. Доставляется синхронно и не хранится.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Notification {
    pub kind: NotificationKind,
    pub topic: Option<String>,
    pub data: NotificationData,
}

impl Notification {
    pub(crate) fn new(
        kind: NotificationKind,
        topic: Option<&str>,
        data: NotificationData,
    ) -> Self {
        Self {
            kind,
            topic: topic.map(str::to_owned),
            data,
        }
    }

    pub(crate) fn condition(
        topic: &str,
        condition: Condition,
    ) -> Self {
        Self::new(
            NotificationKind::Error,
            Some(topic),
            NotificationData::Condition(condition),
        )
    }

    pub fn listener(&self) -> Option<ListenerId> {
        match self.data {
            NotificationData::Listener(id) => Some(id),
            _ => None,
        }
    }

    pub fn condition_kind(&self) -> Option<Condition> {
        match self.data {
            NotificationData::Condition(c) => Some(c),
            _ => None,
        }
    }
}

static NEXT_OBSERVER_ID: AtomicU64 = AtomicU64::new(1);

/// Дескриптор зарегистрированного наблюдателя; нужен для
/// `off_notification`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct ObserverId(u64);

type Observer = Arc<dyn Fn(&Notification) + Send + Sync>;

struct ObserverEntry {
    id: ObserverId,
    /// `None` — подписка на все виды.
    kind: Option<NotificationKind>,
    observer: Observer,
}

/// Диспетчер уведомлений, которым владеет реестр.
///
/// Наблюдатели вызываются по снимку списка: наблюдатель может
/// регистрировать и снимать других наблюдателей (и вызывать операции
/// реестра) прямо во время доставки.
#[derive(Default)]
pub(crate) struct Notifier {
    observers: RefCell<Vec<ObserverEntry>>,
}

impl Notifier {
    pub(crate) fn register(
        &self,
        kind: Option<NotificationKind>,
        observer: Observer,
    ) -> ObserverId {
        let id = ObserverId(NEXT_OBSERVER_ID.fetch_add(1, Ordering::Relaxed));
        self.observers.borrow_mut().push(ObserverEntry { id, kind, observer });
        id
    }

    pub(crate) fn remove(
        &self,
        id: ObserverId,
    ) -> bool {
        let mut observers = self.observers.borrow_mut();
        let before = observers.len();
        observers.retain(|e| e.id != id);
        before != observers.len()
    }

    pub(crate) fn len(&self) -> usize {
        self.observers.borrow().len()
    }

    pub(crate) fn emit(
        &self,
        notification: &Notification,
    ) {
        let targets: Vec<Observer> = self
            .observers
            .borrow()
            .iter()
            .filter(|e| e.kind.map_or(true, |k| k == notification.kind))
            .map(|e| Arc::clone(&e.observer))
            .collect();

        tracing::trace!(
            kind = %notification.kind,
            topic = notification.topic.as_deref().unwrap_or("-"),
            observers = targets.len(),
            "Emitting registry notification"
        );

        for observer in targets {
            observer(notification);
        }
    }
}

#[cfg(test)]
mod tests {
    use std::sync::Mutex;

    use super::*;

    fn recorder() -> (Arc<Mutex<Vec<Notification>>>, Observer) {
        let seen = Arc::new(Mutex::new(Vec::new()));
        let s = seen.clone();
        let observer: Observer = Arc::new(move |n: &Notification| s.lock().unwrap().push(n.clone()));
        (seen, observer)
    }

    /// Тест проверяет, что наблюдатель получает только свой вид уведомлений,
    /// а наблюдатель без вида — все.
    #[test]
    fn test_emit_filters_by_kind() {
        let notifier = Notifier::default();
        let (adds, on_add) = recorder();
        let (all, on_all) = recorder();
        notifier.register(Some(NotificationKind::Add), on_add);
        notifier.register(None, on_all);

        notifier.emit(&Notification::new(
            NotificationKind::Add,
            Some("beep"),
            NotificationData::None,
        ));
        notifier.emit(&Notification::new(
            NotificationKind::Broadcast,
            None,
            NotificationData::None,
        ));

        assert_eq!(adds.lock().unwrap().len(), 1);
        assert_eq!(all.lock().unwrap().len(), 2);
    }

    #[test]
    fn test_remove_observer() {
        let notifier = Notifier::default();
        let (seen, obs) = recorder();
        let id = notifier.register(None, obs);
        assert_eq!(notifier.len(), 1);
        assert!(notifier.remove(id));
        assert!(!notifier.remove(id));

        notifier.emit(&Notification::condition("beep", Condition::UnknownTopic));
        assert!(seen.lock().unwrap().is_empty());
    }

    #[test]
    fn test_condition_display_and_json() {
        assert_eq!(Condition::UnknownTopic.to_string(), "Unknown topic.");
        assert_eq!(
            Condition::CapacityExceeded.to_string(),
            "Maximum number of subscribers exceeded."
        );

        let n = Notification::condition("beep", Condition::CapacityExceeded);
        assert_eq!(n.condition_kind(), Some(Condition::CapacityExceeded));
        assert_eq!(n.listener(), None);
        let json = serde_json::to_string(&n).unwrap();
        assert_eq!(
            json,
            r#"{"kind":"error","topic":"beep","data":{"condition":"capacity_exceeded"}}"#
        );
    }

    #[test]
    fn test_kind_names() {
        let names: Vec<&str> = NotificationKind::ALL.iter().map(|k| k.as_str()).collect();
        assert_eq!(
            names,
            [
                "add",
                "remove",
                "subscribe",
                "unsubscribe",
                "list",
                "unlist",
                "publish",
                "broadcast",
                "error"
            ]
        );
    }
}
