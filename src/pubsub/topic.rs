use std::sync::{
    atomic::{AtomicBool, Ordering},
    Arc,
};

use serde::{Deserialize, Serialize};

use super::{Listener, ListenerId};
use crate::{RegistryError, RegistryResult};

/// Опции темы, фиксируемые при создании.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct TopicOptions {
    /// Максимальное число подписчиков.
    #[serde(default = "TopicOptions::unbounded")]
    pub max: usize,
    /// Разрешены ли повторные подписки одного и того же слушателя.
    #[serde(default)]
    pub duplicates: bool,
}

impl TopicOptions {
    fn unbounded() -> usize {
        usize::MAX
    }

    pub fn with_max(
        mut self,
        max: usize,
    ) -> Self {
        self.max = max;
        self
    }

    pub fn with_duplicates(
        mut self,
        duplicates: bool,
    ) -> Self {
        self.duplicates = duplicates;
        self
    }

    /// Разбирает текстовые значения опций (например, из аргументов
    /// команды). `None` оставляет значение по умолчанию.
    pub fn parse(
        max: Option<&str>,
        duplicates: Option<&str>,
    ) -> RegistryResult<Self> {
        let mut options = Self::default();
        if let Some(raw) = max {
            options.max = raw.parse::<usize>().map_err(|_| {
                RegistryError::invalid_argument(
                    "add",
                    format!(
                        "Max subscribers must be an integer greater than or equal to 0, got '{raw}'."
                    ),
                )
            })?;
        }
        if let Some(raw) = duplicates {
            options.duplicates = raw.parse::<bool>().map_err(|_| {
                RegistryError::invalid_argument(
                    "add",
                    format!("Duplicates flag must be a boolean, got '{raw}'."),
                )
            })?;
        }
        Ok(options)
    }
}

impl Default for TopicOptions {
    fn default() -> Self {
        Self {
            max: usize::MAX,
            duplicates: false,
        }
    }
}

/// Одноразовая подписка.
///
/// Хранит исходного слушателя, имя темы и флаг срабатывания. Флаг
/// выставляется при первой доставке; после этого запись больше не
/// вызывается, а реестр удаляет её в конце той же публикации.
pub struct OnceSubscriber<E> {
    id: ListenerId,
    topic: Arc<str>,
    original: Listener<E>,
    fired: AtomicBool,
}

impl<E> OnceSubscriber<E> {
    pub(crate) fn new(
        topic: Arc<str>,
        original: Listener<E>,
    ) -> Self {
        Self {
            id: ListenerId::next(),
            topic,
            original,
            fired: AtomicBool::new(false),
        }
    }

    /// Идентичность обёртки (отличается от исходного слушателя).
    pub fn id(&self) -> ListenerId {
        self.id
    }

    pub fn topic(&self) -> &str {
        &self.topic
    }

    pub fn original(&self) -> &Listener<E> {
        &self.original
    }

    pub fn has_fired(&self) -> bool {
        self.fired.load(Ordering::Acquire)
    }

    /// Помечает обёртку сработавшей. `true` только для первого вызова.
    pub(crate) fn try_fire(&self) -> bool {
        !self.fired.swap(true, Ordering::AcqRel)
    }
}

/// Запись в списке подписчиков темы.
pub(crate) enum Subscriber<E> {
    Plain(Listener<E>),
    Once(Arc<OnceSubscriber<E>>),
}

impl<E> Subscriber<E> {
    pub(crate) fn id(&self) -> ListenerId {
        match self {
            Self::Plain(l) => l.id(),
            Self::Once(o) => o.id(),
        }
    }
}

impl<E> Clone for Subscriber<E> {
    fn clone(&self) -> Self {
        match self {
            Self::Plain(l) => Self::Plain(l.clone()),
            Self::Once(o) => Self::Once(Arc::clone(o)),
        }
    }
}

/// Состояние темы: упорядоченный список подписчиков и опции.
pub(crate) struct Topic<E> {
    name: Arc<str>,
    subscribers: Vec<Subscriber<E>>,
    options: TopicOptions,
}

impl<E> Topic<E> {
    pub(crate) fn new(
        name: Arc<str>,
        options: TopicOptions,
    ) -> Self {
        Self {
            name,
            subscribers: Vec::new(),
            options,
        }
    }

    pub(crate) fn name(&self) -> &Arc<str> {
        &self.name
    }

    pub(crate) fn options(&self) -> TopicOptions {
        self.options
    }

    pub(crate) fn len(&self) -> usize {
        self.subscribers.len()
    }

    pub(crate) fn is_full(&self) -> bool {
        self.subscribers.len() >= self.options.max
    }

    pub(crate) fn contains(
        &self,
        id: ListenerId,
    ) -> bool {
        self.subscribers.iter().any(|s| s.id() == id)
    }

    pub(crate) fn push(
        &mut self,
        subscriber: Subscriber<E>,
    ) {
        debug_assert!(!self.is_full());
        self.subscribers.push(subscriber);
    }

    /// Удаляет все вхождения `id`, сохраняя порядок остальных.
    /// Возвращает число удалённых записей.
    pub(crate) fn remove_all(
        &mut self,
        id: ListenerId,
    ) -> usize {
        let before = self.subscribers.len();
        self.subscribers.retain(|s| s.id() != id);
        before - self.subscribers.len()
    }

    /// Снимок подписчиков на момент начала доставки.
    pub(crate) fn snapshot(&self) -> Vec<Subscriber<E>> {
        self.subscribers.clone()
    }
}
