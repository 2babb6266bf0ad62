use std::{
    fmt,
    sync::{
        atomic::{AtomicU64, Ordering},
        Arc,
    },
};

use serde::{Deserialize, Serialize};

use crate::ListenerError;

/// Счётчик идентификаторов слушателей. Нулевой id не выдаётся.
static NEXT_LISTENER_ID: AtomicU64 = AtomicU64::new(1);

type Callback<E> = dyn Fn(&E) -> Result<(), ListenerError> + Send + Sync;

/// Идентичность слушателя.
///
/// Выдаётся один раз при создании [`Listener`] и разделяется всеми его
/// клонами. Два независимо созданных слушателя никогда не равны, даже
/// если оборачивают одну и ту же функцию.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ListenerId(u64);

impl ListenerId {
    pub(crate) fn next() -> Self {
        Self(NEXT_LISTENER_ID.fetch_add(1, Ordering::Relaxed))
    }

    pub fn as_u64(self) -> u64 {
        self.0
    }
}

impl fmt::Display for ListenerId {
    fn fmt(
        &self,
        f: &mut fmt::Formatter<'_>,
    ) -> fmt::Result {
        write!(f, "listener#{}", self.0)
    }
}

/// Непрозрачный дескриптор вызываемого объекта, который реестр вызывает с
/// событием.
///
/// Клонирование дешёвое (`Arc`) и сохраняет идентичность, поэтому клон
/// можно передать в `unsubscribe`/`unlist`.
pub struct Listener<E> {
    id: ListenerId,
    callback: Arc<Callback<E>>,
}

impl<E> Listener<E> {
    /// Слушатель, который не может завершиться ошибкой.
    pub fn new<F>(f: F) -> Self
    where
        F: Fn(&E) + Send + Sync + 'static,
    {
        Self::fallible(move |event| {
            f(event);
            Ok(())
        })
    }

    /// Слушатель, ошибка которого прерывает доставку и поднимается к
    /// издателю.
    pub fn fallible<F>(f: F) -> Self
    where
        F: Fn(&E) -> Result<(), ListenerError> + Send + Sync + 'static,
    {
        Self {
            id: ListenerId::next(),
            callback: Arc::new(f),
        }
    }

    pub fn id(&self) -> ListenerId {
        self.id
    }

    /// Вызывает слушателя с событием.
    pub fn call(
        &self,
        event: &E,
    ) -> Result<(), ListenerError> {
        (self.callback)(event)
    }
}

impl<E> Clone for Listener<E> {
    fn clone(&self) -> Self {
        Self {
            id: self.id,
            callback: Arc::clone(&self.callback),
        }
    }
}

impl<E> PartialEq for Listener<E> {
    fn eq(
        &self,
        other: &Self,
    ) -> bool {
        self.id == other.id
    }
}

impl<E> Eq for Listener<E> {}

impl<E> fmt::Debug for Listener<E> {
    fn fmt(
        &self,
        f: &mut fmt::Formatter<'_>,
    ) -> fmt::Result {
        f.debug_struct("Listener").field("id", &self.id).finish()
    }
}
