use std::collections::HashMap;

use tracing::debug;

use super::{Listener, Registry, TopicOptions, TopicSelector};
use crate::{RegistryError, RegistryResult};

/// Именованные слушатели, на которые могут ссылаться текстовые команды.
pub type ListenerDirectory = HashMap<String, Listener<String>>;

/// Текстовая команда над `Registry<String>`.
///
/// Формат: `VERB arg...`, глагол без учёта регистра.
///
/// ```text
/// ADD name [max] [duplicates]
/// REMOVE name|/regex/|glob:pattern
/// SUBSCRIBE selector listener
/// UNSUBSCRIBE selector listener
/// ONCE topic listener
/// LIST listener
/// UNLIST listener
/// PUBLISH topic event
/// BROADCAST event
/// TOPICS
/// ```
#[derive(Debug, Clone)]
pub enum RegistryCommand {
    Add {
        topic: String,
        /// `None` — опции реестра по умолчанию.
        options: Option<TopicOptions>,
    },
    Remove(TopicSelector),
    Subscribe {
        selector: TopicSelector,
        listener: String,
    },
    Unsubscribe {
        selector: TopicSelector,
        listener: String,
    },
    Once {
        topic: String,
        listener: String,
    },
    List(String),
    Unlist(String),
    Publish {
        topic: String,
        event: String,
    },
    Broadcast(String),
    Topics,
}

/// Результат выполнения команды.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CommandReply {
    Ok,
    /// Число затронутых тем.
    Count(usize),
    /// Изменилось ли состояние.
    Flag(bool),
    Topics(Vec<String>),
}

impl RegistryCommand {
    /// Разбирает команду из вектора аргументов.
    pub fn parse<S: AsRef<str>>(args: &[S]) -> RegistryResult<Self> {
        let Some((verb, rest)) = args.split_first() else {
            return Err(RegistryError::missing_argument("command", "a command name"));
        };
        let rest: Vec<&str> = rest.iter().map(AsRef::as_ref).collect();
        let verb = verb.as_ref().to_ascii_uppercase();

        let cmd = match verb.as_str() {
            "ADD" => {
                let topic = arg(&rest, 0, "add", "a topic")?;
                ensure_at_most(&rest, 3, "add")?;
                if topic.is_empty() {
                    return Err(RegistryError::invalid_argument(
                        "add",
                        "Topic must be a non-empty string.",
                    ));
                }
                let options = if rest.len() > 1 {
                    Some(TopicOptions::parse(
                        rest.get(1).copied(),
                        rest.get(2).copied(),
                    )?)
                } else {
                    None
                };
                Self::Add {
                    topic: topic.to_string(),
                    options,
                }
            }
            "REMOVE" => {
                let selector = arg(&rest, 0, "remove", "a topic or pattern")?;
                ensure_at_most(&rest, 1, "remove")?;
                Self::Remove(selector.parse::<TopicSelector>()?)
            }
            "SUBSCRIBE" | "UNSUBSCRIBE" => {
                let op = if verb == "SUBSCRIBE" {
                    "subscribe"
                } else {
                    "unsubscribe"
                };
                let selector = arg(&rest, 0, op, "a topic or pattern")?.parse::<TopicSelector>()?;
                let listener = arg(&rest, 1, op, "a listener")?.to_string();
                ensure_at_most(&rest, 2, op)?;
                if op == "subscribe" {
                    Self::Subscribe { selector, listener }
                } else {
                    Self::Unsubscribe { selector, listener }
                }
            }
            "ONCE" => {
                let topic = arg(&rest, 0, "once", "a topic")?;
                let listener = arg(&rest, 1, "once", "a listener")?.to_string();
                ensure_at_most(&rest, 2, "once")?;
                let TopicSelector::Exact(topic) = topic.parse::<TopicSelector>()? else {
                    return Err(RegistryError::invalid_argument(
                        "once",
                        "Topic must be an exact name, patterns are not supported.",
                    ));
                };
                Self::Once { topic, listener }
            }
            "LIST" => {
                let listener = arg(&rest, 0, "list", "a listener")?;
                ensure_at_most(&rest, 1, "list")?;
                Self::List(listener.to_string())
            }
            "UNLIST" => {
                let listener = arg(&rest, 0, "unlist", "a listener")?;
                ensure_at_most(&rest, 1, "unlist")?;
                Self::Unlist(listener.to_string())
            }
            "PUBLISH" => {
                let topic = arg(&rest, 0, "publish", "a topic")?.to_string();
                let event = arg(&rest, 1, "publish", "an event")?.to_string();
                ensure_at_most(&rest, 2, "publish")?;
                Self::Publish { topic, event }
            }
            "BROADCAST" => {
                let event = arg(&rest, 0, "broadcast", "an event")?.to_string();
                ensure_at_most(&rest, 1, "broadcast")?;
                Self::Broadcast(event)
            }
            "TOPICS" => {
                ensure_at_most(&rest, 0, "topics")?;
                Self::Topics
            }
            other => {
                return Err(RegistryError::invalid_argument(
                    "command",
                    format!("Unknown command '{other}'."),
                ))
            }
        };
        Ok(cmd)
    }

    /// Выполняет команду над реестром. Имена слушателей ищутся в
    /// `listeners`.
    pub fn execute(
        &self,
        registry: &Registry<String>,
        listeners: &ListenerDirectory,
    ) -> RegistryResult<CommandReply> {
        debug!(command = ?self, "Executing registry command");
        let reply = match self {
            Self::Add { topic, options } => {
                match options {
                    Some(options) => registry.add_topic_with(topic, *options)?,
                    None => registry.add_topic(topic)?,
                }
                CommandReply::Ok
            }
            Self::Remove(selector) => CommandReply::Count(registry.remove_topic(selector.clone())),
            Self::Subscribe { selector, listener } => CommandReply::Count(
                registry.subscribe(selector.clone(), lookup(listeners, listener, "subscribe")?),
            ),
            Self::Unsubscribe { selector, listener } => CommandReply::Count(
                registry.unsubscribe(selector.clone(), lookup(listeners, listener, "unsubscribe")?),
            ),
            Self::Once { topic, listener } => {
                CommandReply::Flag(registry.once(topic, lookup(listeners, listener, "once")?))
            }
            Self::List(listener) => {
                CommandReply::Flag(registry.list(lookup(listeners, listener, "list")?))
            }
            Self::Unlist(listener) => {
                CommandReply::Flag(registry.unlist(lookup(listeners, listener, "unlist")?))
            }
            Self::Publish { topic, event } => {
                registry.publish(topic, event.clone())?;
                CommandReply::Ok
            }
            Self::Broadcast(event) => {
                registry.broadcast(event.clone())?;
                CommandReply::Ok
            }
            Self::Topics => CommandReply::Topics(registry.topics()),
        };
        Ok(reply)
    }
}

fn arg<'a>(
    rest: &[&'a str],
    idx: usize,
    operation: &'static str,
    argument: &'static str,
) -> RegistryResult<&'a str> {
    rest.get(idx)
        .copied()
        .ok_or_else(|| RegistryError::missing_argument(operation, argument))
}

fn ensure_at_most(
    rest: &[&str],
    max: usize,
    operation: &'static str,
) -> RegistryResult<()> {
    if rest.len() > max {
        return Err(RegistryError::invalid_argument(
            operation,
            format!("Expected at most {max} arguments, got {}.", rest.len()),
        ));
    }
    Ok(())
}

fn lookup<'a>(
    listeners: &'a ListenerDirectory,
    name: &str,
    operation: &'static str,
) -> RegistryResult<&'a Listener<String>> {
    listeners.get(name).ok_or_else(|| {
        RegistryError::invalid_argument(operation, format!("Unknown listener '{name}'."))
    })
}
