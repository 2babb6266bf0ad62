use std::{cell::RefCell, collections::BTreeMap, fmt, sync::Arc};

use parking_lot::ReentrantMutex;
use tracing::{debug, trace, warn};

use super::{
    topic::{OnceSubscriber, Subscriber, Topic},
    Condition, Listener, Notification, NotificationData, NotificationKind, Notifier, ObserverId,
    TopicOptions, TopicSelector,
};
use crate::{ListenerError, RegistryError, RegistryResult};

/// Реестр тем: создание и удаление тем, подписки (по имени и по
/// шаблону), одноразовые подписки, синхронные `publish`/`broadcast` и
/// уведомления о собственных мутациях.
///
/// Все операции принимают `&self`. Состояние защищено одним
/// `ReentrantMutex` на реестр: слушатель, вызванный во время доставки,
/// может повторно войти в реестр из того же потока, а другие потоки
/// ждут. Уведомление о мутации доставляется до того, как другой поток
/// сможет выполнить следующую мутацию.
pub struct Registry<E> {
    inner: ReentrantMutex<Inner<E>>,
}

struct Inner<E> {
    state: RefCell<State<E>>,
    notifier: Notifier,
}

struct State<E> {
    topics: BTreeMap<Arc<str>, Topic<E>>,
    listing: Vec<Listener<E>>,
    defaults: TopicOptions,
}

/// Результат попытки подписки на одну тему.
enum Admission {
    Added,
    Duplicate,
    Full,
    Gone,
}

impl<E> Registry<E> {
    /// Реестр с опциями тем по умолчанию (без лимита, без дубликатов).
    pub fn new() -> Self {
        Self::with_defaults(TopicOptions::default())
    }

    /// Реестр, в котором `add_topic` без явных опций использует `defaults`.
    pub fn with_defaults(defaults: TopicOptions) -> Self {
        Self {
            inner: ReentrantMutex::new(Inner {
                state: RefCell::new(State {
                    topics: BTreeMap::new(),
                    listing: Vec::new(),
                    defaults,
                }),
                notifier: Notifier::default(),
            }),
        }
    }

    pub fn default_options(&self) -> TopicOptions {
        self.inner.lock().state.borrow().defaults
    }

    ////////////////////////////////////////////////////////////////////////////
    // Темы
    ////////////////////////////////////////////////////////////////////////////

    /// Добавляет тему с опциями реестра по умолчанию.
    pub fn add_topic(
        &self,
        name: &str,
    ) -> RegistryResult<()> {
        let defaults = self.default_options();
        self.add_topic_with(name, defaults)
    }

    /// Добавляет тему с явными опциями.
    ///
    /// Повторное добавление существующей темы ничего не делает и не
    /// порождает уведомления.
    pub fn add_topic_with(
        &self,
        name: &str,
        options: TopicOptions,
    ) -> RegistryResult<()> {
        if name.is_empty() {
            return Err(RegistryError::invalid_argument(
                "add",
                "Topic must be a non-empty string.",
            ));
        }

        let inner = self.inner.lock();
        let created = {
            let mut state = inner.state.borrow_mut();
            if state.topics.contains_key(name) {
                false
            } else {
                let key: Arc<str> = Arc::from(name);
                state
                    .topics
                    .insert(key.clone(), Topic::new(key, options));
                true
            }
        };

        if created {
            debug!(topic = name, max = options.max, duplicates = options.duplicates, "Topic added");
            inner.notifier.emit(&Notification::new(
                NotificationKind::Add,
                Some(name),
                NotificationData::None,
            ));
        }
        Ok(())
    }

    /// Удаляет тему (или все темы, совпавшие с шаблоном) вместе с её
    /// подписчиками. Возвращает число удалённых тем.
    pub fn remove_topic(
        &self,
        selector: impl Into<TopicSelector>,
    ) -> usize {
        let selector = selector.into();
        let inner = self.inner.lock();
        let matches = {
            let state = inner.state.borrow();
            selector.resolve(state.topics.keys().map(|k| &**k))
        };

        let mut removed = 0;
        for name in matches {
            let topic = inner.state.borrow_mut().topics.remove(name.as_str());
            // Тема могла исчезнуть из-за наблюдателя предыдущего удаления.
            if let Some(topic) = topic {
                removed += 1;
                debug!(topic = %topic.name(), subscribers = topic.len(), "Topic removed");
                inner.notifier.emit(&Notification::new(
                    NotificationKind::Remove,
                    Some(&name),
                    NotificationData::None,
                ));
            }
        }
        removed
    }

    /// Имена всех существующих тем, каждое ровно один раз.
    pub fn topics(&self) -> Vec<String> {
        let inner = self.inner.lock();
        let state = inner.state.borrow();
        state.topics.keys().map(|k| k.to_string()).collect()
    }

    pub fn contains_topic(
        &self,
        name: &str,
    ) -> bool {
        self.inner.lock().state.borrow().topics.contains_key(name)
    }

    /// Число подписчиков темы или `None`, если темы нет.
    pub fn subscriber_count(
        &self,
        name: &str,
    ) -> Option<usize> {
        self.inner.lock().state.borrow().topics.get(name).map(Topic::len)
    }

    pub fn topic_options(
        &self,
        name: &str,
    ) -> Option<TopicOptions> {
        self.inner
            .lock()
            .state
            .borrow()
            .topics
            .get(name)
            .map(Topic::options)
    }

    ////////////////////////////////////////////////////////////////////////////
    // Публичный список (broadcast)
    ////////////////////////////////////////////////////////////////////////////

    /// Добавляет слушателя в публичный список. Уже присутствующий
    /// слушатель не добавляется повторно. Возвращает `true`, если список
    /// изменился.
    pub fn list(
        &self,
        listener: &Listener<E>,
    ) -> bool {
        let inner = self.inner.lock();
        let inserted = {
            let mut state = inner.state.borrow_mut();
            if state.listing.contains(listener) {
                false
            } else {
                state.listing.push(listener.clone());
                true
            }
        };

        if inserted {
            debug!(listener = %listener.id(), "Listener listed");
            inner.notifier.emit(&Notification::new(
                NotificationKind::List,
                None,
                NotificationData::Listener(listener.id()),
            ));
        }
        inserted
    }

    /// Убирает слушателя из публичного списка.
    pub fn unlist(
        &self,
        listener: &Listener<E>,
    ) -> bool {
        let inner = self.inner.lock();
        let removed = {
            let mut state = inner.state.borrow_mut();
            match state.listing.iter().position(|l| l == listener) {
                Some(idx) => {
                    state.listing.remove(idx);
                    true
                }
                None => false,
            }
        };

        if removed {
            debug!(listener = %listener.id(), "Listener unlisted");
            inner.notifier.emit(&Notification::new(
                NotificationKind::Unlist,
                None,
                NotificationData::Listener(listener.id()),
            ));
        }
        removed
    }

    pub fn listing_len(&self) -> usize {
        self.inner.lock().state.borrow().listing.len()
    }

    ////////////////////////////////////////////////////////////////////////////
    // Подписки
    ////////////////////////////////////////////////////////////////////////////

    /// Подписывает слушателя на тему или на все темы, совпавшие с
    /// шаблоном. Каждая тема обрабатывается независимо.
    ///
    /// Несуществующая точная тема и переполненная тема сообщаются
    /// наблюдателям уведомлением `error`, вызов при этом завершается
    /// нормально. Возвращает число тем, в которые слушатель был добавлен.
    pub fn subscribe(
        &self,
        selector: impl Into<TopicSelector>,
        listener: &Listener<E>,
    ) -> usize {
        let selector = selector.into();
        let inner = self.inner.lock();

        let targets = match &selector {
            TopicSelector::Exact(name) => {
                if !inner.state.borrow().topics.contains_key(name.as_str()) {
                    debug!(topic = %name, listener = %listener.id(), "Subscribe to unknown topic");
                    inner
                        .notifier
                        .emit(&Notification::condition(name, Condition::UnknownTopic));
                    return 0;
                }
                vec![name.clone()]
            }
            TopicSelector::Pattern(_) => {
                let state = inner.state.borrow();
                selector.resolve(state.topics.keys().map(|k| &**k))
            }
        };

        let mut added = 0;
        for name in targets {
            let admission = {
                let mut state = inner.state.borrow_mut();
                match state.topics.get_mut(name.as_str()) {
                    None => Admission::Gone,
                    Some(topic) => {
                        if !topic.options().duplicates && topic.contains(listener.id()) {
                            Admission::Duplicate
                        } else if topic.is_full() {
                            Admission::Full
                        } else {
                            topic.push(Subscriber::Plain(listener.clone()));
                            Admission::Added
                        }
                    }
                }
            };

            match admission {
                Admission::Added => {
                    added += 1;
                    debug!(topic = %name, listener = %listener.id(), "Listener subscribed");
                    inner.notifier.emit(&Notification::new(
                        NotificationKind::Subscribe,
                        Some(&name),
                        NotificationData::Listener(listener.id()),
                    ));
                }
                Admission::Full => {
                    warn!(topic = %name, listener = %listener.id(), "Topic subscriber limit reached");
                    inner
                        .notifier
                        .emit(&Notification::condition(&name, Condition::CapacityExceeded));
                }
                Admission::Duplicate | Admission::Gone => {}
            }
        }
        added
    }

    /// Удаляет все вхождения слушателя из темы (или тем по шаблону).
    ///
    /// Несуществующая точная тема молча игнорируется. Возвращает число тем,
    /// из которых слушатель был удалён.
    pub fn unsubscribe(
        &self,
        selector: impl Into<TopicSelector>,
        listener: &Listener<E>,
    ) -> usize {
        let selector = selector.into();
        let inner = self.inner.lock();
        let targets = {
            let state = inner.state.borrow();
            selector.resolve(state.topics.keys().map(|k| &**k))
        };

        let mut affected = 0;
        for name in targets {
            if self.remove_subscriber(&inner, &name, listener.id()) {
                affected += 1;
            }
        }
        affected
    }

    /// Одноразовая подписка на тему (только точное имя).
    ///
    /// Уже подписанный `listener` сначала удаляется из темы, после чего
    /// проверяется лимит. Устанавливается обёртка с собственной
    /// идентичностью: она вызывает `listener` при первой публикации и
    /// снимается сразу после уведомления `publish` этой публикации.
    /// Возвращает `true`, если обёртка установлена.
    pub fn once(
        &self,
        topic: &str,
        listener: &Listener<E>,
    ) -> bool {
        let inner = self.inner.lock();
        let outcome = {
            let mut state = inner.state.borrow_mut();
            match state.topics.get_mut(topic) {
                None => None,
                Some(t) => {
                    t.remove_all(listener.id());
                    if t.is_full() {
                        Some(false)
                    } else {
                        let wrapper = OnceSubscriber::new(t.name().clone(), listener.clone());
                        t.push(Subscriber::Once(Arc::new(wrapper)));
                        Some(true)
                    }
                }
            }
        };

        match outcome {
            None => {
                debug!(topic, listener = %listener.id(), "Once on unknown topic");
                inner
                    .notifier
                    .emit(&Notification::condition(topic, Condition::UnknownTopic));
                false
            }
            Some(false) => {
                warn!(topic, listener = %listener.id(), "Topic subscriber limit reached");
                inner
                    .notifier
                    .emit(&Notification::condition(topic, Condition::CapacityExceeded));
                false
            }
            Some(true) => {
                debug!(topic, listener = %listener.id(), "One-shot listener installed");
                inner.notifier.emit(&Notification::new(
                    NotificationKind::Subscribe,
                    Some(topic),
                    NotificationData::None,
                ));
                true
            }
        }
    }

    ////////////////////////////////////////////////////////////////////////////
    // Доставка
    ////////////////////////////////////////////////////////////////////////////

    /// Публикует событие в тему.
    ///
    /// Подписчики вызываются синхронно по снимку списка, сделанному в
    /// начале доставки, в порядке подписки. Публикация в несуществующую
    /// тему ничего не делает. Если список был непуст, после всех вызовов
    /// порождается ровно одно уведомление `publish`.
    ///
    /// Ошибка слушателя прерывает доставку: оставшиеся слушатели не
    /// вызываются, уведомление `publish` не порождается, а ошибка
    /// возвращается как [`RegistryError::ListenerFailed`].
    pub fn publish(
        &self,
        topic: &str,
        event: E,
    ) -> RegistryResult<()> {
        let inner = self.inner.lock();
        let snapshot = match inner.state.borrow().topics.get(topic) {
            Some(t) => t.snapshot(),
            None => return Ok(()),
        };
        if snapshot.is_empty() {
            return Ok(());
        }

        trace!(topic, subscribers = snapshot.len(), "Publishing event");

        let mut fired = Vec::new();
        let mut failure = None;
        for subscriber in &snapshot {
            let outcome = match subscriber {
                Subscriber::Plain(listener) => listener.call(&event),
                Subscriber::Once(once) => {
                    if !once.try_fire() {
                        continue;
                    }
                    fired.push(Arc::clone(once));
                    once.original().call(&event)
                }
            };
            if let Err(e) = outcome {
                failure = Some(e);
                break;
            }
        }

        if failure.is_none() {
            inner.notifier.emit(&Notification::new(
                NotificationKind::Publish,
                Some(topic),
                NotificationData::None,
            ));
        }

        for once in fired {
            self.remove_subscriber(&inner, once.topic(), once.id());
        }

        match failure {
            None => Ok(()),
            Some(e) => Err(self.dispatch_failed(Some(topic), e)),
        }
    }

    /// Рассылает событие всем слушателям публичного списка.
    pub fn broadcast(
        &self,
        event: E,
    ) -> RegistryResult<()> {
        let inner = self.inner.lock();
        let snapshot = inner.state.borrow().listing.clone();
        if snapshot.is_empty() {
            return Ok(());
        }

        trace!(listeners = snapshot.len(), "Broadcasting event");

        for listener in &snapshot {
            listener
                .call(&event)
                .map_err(|e| self.dispatch_failed(None, e))?;
        }

        inner.notifier.emit(&Notification::new(
            NotificationKind::Broadcast,
            None,
            NotificationData::None,
        ));
        Ok(())
    }

    ////////////////////////////////////////////////////////////////////////////
    // Наблюдатели
    ////////////////////////////////////////////////////////////////////////////

    /// Регистрирует наблюдателя для одного вида уведомлений.
    pub fn on_notification<F>(
        &self,
        kind: NotificationKind,
        observer: F,
    ) -> ObserverId
    where
        F: Fn(&Notification) + Send + Sync + 'static,
    {
        self.inner
            .lock()
            .notifier
            .register(Some(kind), Arc::new(observer))
    }

    /// Регистрирует наблюдателя для всех видов уведомлений.
    pub fn on_any_notification<F>(
        &self,
        observer: F,
    ) -> ObserverId
    where
        F: Fn(&Notification) + Send + Sync + 'static,
    {
        self.inner.lock().notifier.register(None, Arc::new(observer))
    }

    /// Снимает наблюдателя. `false`, если он уже был снят.
    pub fn off_notification(
        &self,
        id: ObserverId,
    ) -> bool {
        self.inner.lock().notifier.remove(id)
    }

    pub fn observer_count(&self) -> usize {
        self.inner.lock().notifier.len()
    }

    ////////////////////////////////////////////////////////////////////////////
    // Внутреннее
    ////////////////////////////////////////////////////////////////////////////

    /// Удаляет все записи `id` из темы и порождает `unsubscribe`, если
    /// что-то было удалено.
    fn remove_subscriber(
        &self,
        inner: &Inner<E>,
        topic: &str,
        id: super::ListenerId,
    ) -> bool {
        let removed = inner
            .state
            .borrow_mut()
            .topics
            .get_mut(topic)
            .map_or(0, |t| t.remove_all(id));
        if removed == 0 {
            return false;
        }

        debug!(topic, listener = %id, removed, "Listener unsubscribed");
        inner.notifier.emit(&Notification::new(
            NotificationKind::Unsubscribe,
            Some(topic),
            NotificationData::Listener(id),
        ));
        true
    }

    fn dispatch_failed(
        &self,
        topic: Option<&str>,
        err: ListenerError,
    ) -> RegistryError {
        warn!(
            topic = topic.unwrap_or("-"),
            error = %err,
            "Listener failed, dispatch aborted"
        );
        RegistryError::listener_failed(topic, err)
    }
}

impl<E> Default for Registry<E> {
    fn default() -> Self {
        Self::new()
    }
}

impl<E> fmt::Debug for Registry<E> {
    fn fmt(
        &self,
        f: &mut fmt::Formatter<'_>,
    ) -> fmt::Result {
        let inner = self.inner.lock();
        let state = inner.state.borrow();
        f.debug_struct("Registry")
            .field("topics", &state.topics.keys().collect::<Vec<_>>())
            .field("listing", &state.listing.len())
            .field("defaults", &state.defaults)
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use std::sync::{
        atomic::{AtomicUsize, Ordering},
        Mutex,
    };

    use super::*;

    /// Helper: реестр и журнал всех уведомлений.
    fn observed<E>() -> (Registry<E>, Arc<Mutex<Vec<Notification>>>) {
        let registry = Registry::new();
        let log = Arc::new(Mutex::new(Vec::new()));
        let l = log.clone();
        registry.on_any_notification(move |n| l.lock().unwrap().push(n.clone()));
        (registry, log)
    }

    fn kinds(log: &Mutex<Vec<Notification>>) -> Vec<NotificationKind> {
        log.lock().unwrap().iter().map(|n| n.kind).collect()
    }

    fn counter() -> (Arc<AtomicUsize>, Listener<u32>) {
        let hits = Arc::new(AtomicUsize::new(0));
        let h = hits.clone();
        (
            hits,
            Listener::new(move |_| {
                h.fetch_add(1, Ordering::SeqCst);
            }),
        )
    }

    /// Тест проверяет, что повторное добавление темы — no-op без второго
    /// уведомления.
    #[test]
    fn test_add_topic_idempotent() {
        let (r, log) = observed::<u32>();
        r.add_topic("beep").unwrap();
        r.add_topic("beep").unwrap();
        assert_eq!(r.topics(), vec!["beep"]);
        assert_eq!(kinds(&log), vec![NotificationKind::Add]);
    }

    #[test]
    fn test_add_topic_rejects_empty_name() {
        let r = Registry::<u32>::new();
        let err = r.add_topic("").unwrap_err();
        assert!(matches!(err, RegistryError::InvalidArgument { operation: "add", .. }));
        assert!(r.topics().is_empty());
    }

    /// Тест проверяет, что опции по умолчанию реестра применяются к новым
    /// темам, а явные опции их перекрывают.
    #[test]
    fn test_registry_defaults() {
        let r = Registry::<u32>::with_defaults(TopicOptions::default().with_max(2));
        r.add_topic("a").unwrap();
        r.add_topic_with("b", TopicOptions::default()).unwrap();
        assert_eq!(r.topic_options("a").unwrap().max, 2);
        assert_eq!(r.topic_options("b").unwrap().max, usize::MAX);
        assert_eq!(r.topic_options("c"), None);
    }

    #[test]
    fn test_subscribe_and_publish_order() {
        let (r, log) = observed::<u32>();
        let seen = Arc::new(Mutex::new(Vec::new()));
        r.add_topic("beep").unwrap();
        for tag in ["first", "second", "third"] {
            let s = seen.clone();
            r.subscribe("beep", &Listener::new(move |e: &u32| s.lock().unwrap().push((tag, *e))));
        }
        r.publish("beep", 7).unwrap();

        assert_eq!(
            *seen.lock().unwrap(),
            vec![("first", 7), ("second", 7), ("third", 7)]
        );
        assert_eq!(
            kinds(&log),
            vec![
                NotificationKind::Add,
                NotificationKind::Subscribe,
                NotificationKind::Subscribe,
                NotificationKind::Subscribe,
                NotificationKind::Publish,
            ]
        );
    }

    #[test]
    fn test_subscribe_unknown_topic_emits_condition() {
        let (r, log) = observed::<u32>();
        let (_, f) = counter();
        assert_eq!(r.subscribe("nope", &f), 0);
        let log = log.lock().unwrap();
        assert_eq!(log.len(), 1);
        assert_eq!(log[0].kind, NotificationKind::Error);
        assert_eq!(log[0].topic.as_deref(), Some("nope"));
        assert_eq!(log[0].condition_kind(), Some(Condition::UnknownTopic));
    }

    /// Тест проверяет, что unsubscribe с неизвестной точной темой молчит.
    #[test]
    fn test_unsubscribe_unknown_topic_is_silent() {
        let (r, log) = observed::<u32>();
        let (_, f) = counter();
        assert_eq!(r.unsubscribe("nope", &f), 0);
        assert!(log.lock().unwrap().is_empty());
    }

    #[test]
    fn test_duplicates_policy() {
        let r = Registry::<u32>::new();
        r.add_topic("single").unwrap();
        r.add_topic_with("multi", TopicOptions::default().with_duplicates(true))
            .unwrap();
        let (hits, f) = counter();

        r.subscribe("single", &f);
        r.subscribe("single", &f);
        r.subscribe("multi", &f);
        r.subscribe("multi", &f);
        assert_eq!(r.subscriber_count("single"), Some(1));
        assert_eq!(r.subscriber_count("multi"), Some(2));

        r.publish("single", 0).unwrap();
        assert_eq!(hits.load(Ordering::SeqCst), 1);
        r.publish("multi", 0).unwrap();
        assert_eq!(hits.load(Ordering::SeqCst), 3);

        // unsubscribe убирает все вхождения
        assert_eq!(r.unsubscribe("multi", &f), 1);
        assert_eq!(r.subscriber_count("multi"), Some(0));
    }

    #[test]
    fn test_capacity_exceeded() {
        let (r, log) = observed::<u32>();
        r.add_topic_with("beep", TopicOptions::default().with_max(1))
            .unwrap();
        let (_, f) = counter();
        let (_, g) = counter();
        assert_eq!(r.subscribe("beep", &f), 1);
        assert_eq!(r.subscribe("beep", &g), 0);
        assert_eq!(r.subscriber_count("beep"), Some(1));

        let last = log.lock().unwrap().last().cloned().unwrap();
        assert_eq!(last.condition_kind(), Some(Condition::CapacityExceeded));
        assert_eq!(last.topic.as_deref(), Some("beep"));
    }

    /// Тест проверяет, что once срабатывает один раз, а `unsubscribe`
    /// обёртки приходит после `publish`.
    #[test]
    fn test_once_fires_once_and_unsubscribes_after_publish() {
        let (r, log) = observed::<u32>();
        r.add_topic("beep").unwrap();
        let (hits, f) = counter();

        assert!(r.once("beep", &f));
        r.publish("beep", 1).unwrap();
        r.publish("beep", 2).unwrap();

        assert_eq!(hits.load(Ordering::SeqCst), 1);
        assert_eq!(r.subscriber_count("beep"), Some(0));

        let log = log.lock().unwrap();
        let tail: Vec<_> = log.iter().skip(1).map(|n| n.kind).collect();
        assert_eq!(
            tail,
            vec![
                NotificationKind::Subscribe,
                NotificationKind::Publish,
                NotificationKind::Unsubscribe
            ]
        );
        // subscribe обёртки без данных, unsubscribe — с id обёртки
        assert_eq!(log[1].data, NotificationData::None);
        let wrapper_id = log[3].listener().unwrap();
        assert_ne!(wrapper_id, f.id());
    }

    /// Тест проверяет, что once заменяет обычную подписку того же слушателя.
    #[test]
    fn test_once_replaces_existing_subscription() {
        let r = Registry::<u32>::new();
        r.add_topic_with("beep", TopicOptions::default().with_max(1))
            .unwrap();
        let (hits, f) = counter();
        r.subscribe("beep", &f);
        // Лимит 1 уже занят этим же слушателем, но он удаляется до проверки.
        assert!(r.once("beep", &f));
        assert_eq!(r.subscriber_count("beep"), Some(1));

        r.publish("beep", 0).unwrap();
        r.publish("beep", 0).unwrap();
        assert_eq!(hits.load(Ordering::SeqCst), 1);
    }

    #[test]
    fn test_once_unknown_topic_and_capacity() {
        let (r, log) = observed::<u32>();
        let (_, f) = counter();
        assert!(!r.once("nope", &f));
        r.add_topic_with("zero", TopicOptions::default().with_max(0))
            .unwrap();
        assert!(!r.once("zero", &f));

        let conditions: Vec<_> = log
            .lock()
            .unwrap()
            .iter()
            .filter_map(|n| n.condition_kind())
            .collect();
        assert_eq!(
            conditions,
            vec![Condition::UnknownTopic, Condition::CapacityExceeded]
        );
    }

    /// Тест проверяет, что повторная публикация изнутри once-слушателя не
    /// вызывает его второй раз.
    #[test]
    fn test_once_reentrant_publish_does_not_refire() {
        let r = Arc::new(Registry::<u32>::new());
        r.add_topic("beep").unwrap();
        let hits = Arc::new(AtomicUsize::new(0));
        let (h, r2) = (hits.clone(), r.clone());
        let f = Listener::new(move |e: &u32| {
            h.fetch_add(1, Ordering::SeqCst);
            if *e == 0 {
                r2.publish("beep", 1).unwrap();
            }
        });
        r.once("beep", &f);
        r.publish("beep", 0).unwrap();
        assert_eq!(hits.load(Ordering::SeqCst), 1);
        assert_eq!(r.subscriber_count("beep"), Some(0));
    }

    /// Тест проверяет, что повторная публикация изнутри once-слушателя
    /// порождает своё уведомление `publish`, хотя в её снимке только уже
    /// сработавшая обёртка.
    #[test]
    fn test_reentrant_publish_from_once_still_notifies() {
        let (r, log) = observed::<u32>();
        let r = Arc::new(r);
        r.add_topic("beep").unwrap();
        let (hits, f) = counter();
        let r2 = r.clone();
        let republish = Listener::new(move |e: &u32| {
            f.call(e).unwrap();
            if *e == 0 {
                r2.publish("beep", 1).unwrap();
            }
        });
        r.once("beep", &republish);
        log.lock().unwrap().clear();

        r.publish("beep", 0).unwrap();
        assert_eq!(hits.load(Ordering::SeqCst), 1);
        assert_eq!(
            kinds(&log),
            vec![
                NotificationKind::Publish,
                NotificationKind::Publish,
                NotificationKind::Unsubscribe,
            ]
        );
    }

    #[test]
    fn test_publish_missing_or_empty_topic_is_silent() {
        let (r, log) = observed::<u32>();
        r.publish("nope", 1).unwrap();
        r.add_topic("empty").unwrap();
        r.publish("empty", 1).unwrap();
        assert_eq!(kinds(&log), vec![NotificationKind::Add]);
    }

    /// Тест проверяет fail-fast: после ошибки слушателя остальные не
    /// вызываются и уведомления `publish` нет.
    #[test]
    fn test_publish_listener_failure_propagates() {
        let (r, log) = observed::<u32>();
        r.add_topic("beep").unwrap();
        let (hits, after) = counter();
        r.subscribe(
            "beep",
            &Listener::fallible(|_: &u32| Err(ListenerError::new("boom"))),
        );
        r.subscribe("beep", &after);

        let err = r.publish("beep", 1).unwrap_err();
        assert!(matches!(
            err,
            RegistryError::ListenerFailed { topic: Some(ref t), .. } if t == "beep"
        ));
        assert_eq!(hits.load(Ordering::SeqCst), 0);
        assert!(!kinds(&log).contains(&NotificationKind::Publish));
    }

    #[test]
    fn test_list_unlist_broadcast() {
        let (r, log) = observed::<u32>();
        let (hits, f) = counter();

        r.broadcast(1).unwrap();
        assert!(kinds(&log).is_empty());

        assert!(r.list(&f));
        assert!(!r.list(&f));
        assert_eq!(r.listing_len(), 1);
        r.broadcast(1).unwrap();
        assert_eq!(hits.load(Ordering::SeqCst), 1);

        assert!(r.unlist(&f));
        assert!(!r.unlist(&f));
        assert_eq!(
            kinds(&log),
            vec![
                NotificationKind::List,
                NotificationKind::Broadcast,
                NotificationKind::Unlist
            ]
        );
    }

    #[test]
    fn test_broadcast_failure_propagates() {
        let r = Registry::<u32>::new();
        r.list(&Listener::fallible(|_: &u32| Err("nope".into())));
        let err = r.broadcast(0).unwrap_err();
        assert!(matches!(err, RegistryError::ListenerFailed { topic: None, .. }));
    }

    #[test]
    fn test_remove_topic_by_pattern() {
        let (r, log) = observed::<u32>();
        for t in ["beep", "boop", "bap", "foo"] {
            r.add_topic(t).unwrap();
        }
        log.lock().unwrap().clear();

        assert_eq!(r.remove_topic(TopicSelector::regex("^b.+p$").unwrap()), 3);
        assert_eq!(r.topics(), vec!["foo"]);
        let removed: Vec<_> = log
            .lock()
            .unwrap()
            .iter()
            .map(|n| (n.kind, n.topic.clone().unwrap()))
            .collect();
        assert_eq!(
            removed,
            vec![
                (NotificationKind::Remove, "bap".to_string()),
                (NotificationKind::Remove, "beep".to_string()),
                (NotificationKind::Remove, "boop".to_string()),
            ]
        );

        assert_eq!(r.remove_topic("missing"), 0);
        assert_eq!(r.remove_topic(TopicSelector::glob("x*").unwrap()), 0);
    }

    /// Тест проверяет, что удаление темы удаляет подписчиков: повторно
    /// созданная тема пуста.
    #[test]
    fn test_remove_topic_clears_subscribers() {
        let r = Registry::<u32>::new();
        let (hits, f) = counter();
        r.add_topic("beep").unwrap();
        r.subscribe("beep", &f);
        r.remove_topic("beep");
        r.add_topic("beep").unwrap();
        r.publish("beep", 0).unwrap();
        assert_eq!(hits.load(Ordering::SeqCst), 0);
        assert_eq!(r.subscriber_count("beep"), Some(0));
    }

    #[test]
    fn test_off_notification() {
        let r = Registry::<u32>::new();
        let seen = Arc::new(AtomicUsize::new(0));
        let s = seen.clone();
        let id = r.on_notification(NotificationKind::Add, move |_| {
            s.fetch_add(1, Ordering::SeqCst);
        });
        r.add_topic("a").unwrap();
        assert!(r.off_notification(id));
        r.add_topic("b").unwrap();
        assert_eq!(seen.load(Ordering::SeqCst), 1);
        assert_eq!(r.observer_count(), 0);
    }

    #[test]
    fn test_debug_lists_topics() {
        let r = Registry::<u32>::new();
        r.add_topic("beep").unwrap();
        let dbg = format!("{r:?}");
        assert!(dbg.contains("beep"), "got: {dbg}");
    }
}
