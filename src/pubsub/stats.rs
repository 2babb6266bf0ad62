use std::{collections::BTreeMap, sync::Arc};

use parking_lot::Mutex;
use serde::{Deserialize, Serialize};

use super::{Notification, NotificationKind, ObserverId, Registry};

/// Счётчики одной темы.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct TopicStats {
    pub num_subscribers: usize,
    pub num_publications: u64,
}

/// Срез статистики, собранной по уведомлениям реестра.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct StatsSnapshot {
    pub topics: BTreeMap<String, TopicStats>,
    pub broadcasts: u64,
    pub public: usize,
}

/// Агрегатор статистики, построенный только на наблюдателях.
///
/// Реестр о нём ничего не знает: `attach` подписывает агрегатор на
/// восемь видов мутаций, `detach` снимает эти подписки.
pub struct RegistryStats {
    state: Mutex<StatsSnapshot>,
    observers: Mutex<Vec<ObserverId>>,
}

impl RegistryStats {
    /// Подключает агрегатор к реестру и возвращает общий дескриптор.
    ///
    /// Темы, созданные до подключения, появятся в статистике только после
    /// повторного `add`.
    pub fn attach<E>(registry: &Registry<E>) -> Arc<Self> {
        let stats = Arc::new(Self {
            state: Mutex::new(StatsSnapshot::default()),
            observers: Mutex::new(Vec::new()),
        });

        let ids: Vec<ObserverId> = NotificationKind::ALL
            .into_iter()
            .filter(|kind| *kind != NotificationKind::Error)
            .map(|kind| {
                let s = Arc::clone(&stats);
                registry.on_notification(kind, move |n| s.record(n))
            })
            .collect();
        stats.observers.lock().extend(ids);
        stats
    }

    /// Снимает наблюдателей агрегатора. Собранные данные остаются.
    pub fn detach<E>(
        &self,
        registry: &Registry<E>,
    ) {
        for id in self.observers.lock().drain(..) {
            registry.off_notification(id);
        }
    }

    pub fn snapshot(&self) -> StatsSnapshot {
        self.state.lock().clone()
    }

    pub fn topic(
        &self,
        name: &str,
    ) -> Option<TopicStats> {
        self.state.lock().topics.get(name).copied()
    }

    fn record(
        &self,
        n: &Notification,
    ) {
        let mut state = self.state.lock();
        let topic = n.topic.as_deref();
        match n.kind {
            NotificationKind::Add => {
                if let Some(t) = topic {
                    state.topics.insert(t.to_string(), TopicStats::default());
                }
            }
            NotificationKind::Remove => {
                if let Some(t) = topic {
                    state.topics.remove(t);
                }
            }
            NotificationKind::Subscribe => {
                if let Some(s) = topic.and_then(|t| state.topics.get_mut(t)) {
                    s.num_subscribers += 1;
                }
            }
            NotificationKind::Unsubscribe => {
                if let Some(s) = topic.and_then(|t| state.topics.get_mut(t)) {
                    s.num_subscribers = s.num_subscribers.saturating_sub(1);
                }
            }
            NotificationKind::Publish => {
                if let Some(s) = topic.and_then(|t| state.topics.get_mut(t)) {
                    s.num_publications += 1;
                }
            }
            NotificationKind::List => state.public += 1,
            NotificationKind::Unlist => state.public = state.public.saturating_sub(1),
            NotificationKind::Broadcast => state.broadcasts += 1,
            NotificationKind::Error => {}
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{Listener, TopicSelector};

    /// Тест проверяет, что счётчики агрегатора совпадают с фактическими
    /// операциями над реестром.
    #[test]
    fn test_stats_follow_registry() {
        let r = Registry::<String>::new();
        let stats = RegistryStats::attach(&r);
        for t in ["beep", "boop", "bap", "baz", "foo"] {
            r.add_topic(t).unwrap();
        }
        let comp1 = Listener::new(|_: &String| {});
        let comp2 = Listener::new(|_: &String| {});
        r.subscribe(TopicSelector::regex("^b.+p$").unwrap(), &comp1);
        r.list(&comp2);
        r.subscribe(TopicSelector::regex("^ba.+").unwrap(), &comp2);

        r.publish("bap", "woot".into()).unwrap();
        r.publish("bap", "bebop".into()).unwrap();
        r.publish("foo", "woot".into()).unwrap();
        r.broadcast("hello".into()).unwrap();

        let snap = stats.snapshot();
        assert_eq!(snap.broadcasts, 1);
        assert_eq!(snap.public, 1);
        assert_eq!(
            snap.topics["bap"],
            TopicStats {
                num_subscribers: 2,
                num_publications: 2
            }
        );
        assert_eq!(snap.topics["baz"].num_subscribers, 1);
        // publish без подписчиков не считается
        assert_eq!(snap.topics["foo"].num_publications, 0);

        r.unsubscribe("bap", &comp1);
        r.remove_topic("beep");
        assert_eq!(stats.topic("bap").unwrap().num_subscribers, 1);
        assert_eq!(stats.topic("beep"), None);
    }

    #[test]
    fn test_detach_stops_counting() {
        let r = Registry::<u8>::new();
        let stats = RegistryStats::attach(&r);
        assert_eq!(r.observer_count(), 8);
        r.add_topic("a").unwrap();
        stats.detach(&r);
        assert_eq!(r.observer_count(), 0);
        r.add_topic("b").unwrap();
        assert_eq!(stats.snapshot().topics.len(), 1);
    }

    #[test]
    fn test_snapshot_json_shape() {
        let mut snap = StatsSnapshot::default();
        snap.topics.insert("beep".into(), TopicStats::default());
        let json = serde_json::to_value(&snap).unwrap();
        assert_eq!(
            json,
            serde_json::json!({
                "topics": {"beep": {"num_subscribers": 0, "num_publications": 0}},
                "broadcasts": 0,
                "public": 0
            })
        );
    }
}
