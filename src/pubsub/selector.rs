use std::{fmt, str::FromStr};

use globset::{Glob, GlobMatcher};
use regex::Regex;

use crate::{RegistryError, RegistryResult};

/// Шаблон, по которому операция применяется сразу к нескольким
/// существующим темам.
///
/// Поддерживаются регулярные выражения (`/^b.+p$/`) и glob-шаблоны
/// (`b*p`, `ba?`).
#[derive(Clone)]
pub enum TopicPattern {
    Regex(Regex),
    Glob { source: String, matcher: GlobMatcher },
}

impl TopicPattern {
    pub fn regex(pattern: &str) -> RegistryResult<Self> {
        Regex::new(pattern)
            .map(Self::Regex)
            .map_err(|e| RegistryError::invalid_pattern(pattern, e))
    }

    pub fn glob(pattern: &str) -> RegistryResult<Self> {
        let glob = Glob::new(pattern).map_err(|e| RegistryError::invalid_pattern(pattern, e))?;
        Ok(Self::Glob {
            source: pattern.to_string(),
            matcher: glob.compile_matcher(),
        })
    }

    pub fn is_match(
        &self,
        topic: &str,
    ) -> bool {
        match self {
            Self::Regex(re) => re.is_match(topic),
            Self::Glob { matcher, .. } => matcher.is_match(topic),
        }
    }

    /// Исходный текст шаблона.
    pub fn as_str(&self) -> &str {
        match self {
            Self::Regex(re) => re.as_str(),
            Self::Glob { source, .. } => source,
        }
    }
}

impl fmt::Debug for TopicPattern {
    fn fmt(
        &self,
        f: &mut fmt::Formatter<'_>,
    ) -> fmt::Result {
        match self {
            Self::Regex(re) => write!(f, "Regex(/{}/)", re.as_str()),
            Self::Glob { source, .. } => write!(f, "Glob({source})"),
        }
    }
}

impl From<Regex> for TopicPattern {
    fn from(re: Regex) -> Self {
        Self::Regex(re)
    }
}

/// Цель операции над темами: точное имя или шаблон.
///
/// Проверяется один раз при построении, дальше код реестра просто
/// сопоставляет два варианта.
#[derive(Debug, Clone)]
pub enum TopicSelector {
    Exact(String),
    Pattern(TopicPattern),
}

impl TopicSelector {
    /// Точное имя. Пустое имя отклоняется.
    pub fn exact(name: impl Into<String>) -> RegistryResult<Self> {
        let name = name.into();
        if name.is_empty() {
            return Err(RegistryError::invalid_argument(
                "selector",
                "Topic must be a non-empty string.",
            ));
        }
        Ok(Self::Exact(name))
    }

    pub fn regex(pattern: &str) -> RegistryResult<Self> {
        TopicPattern::regex(pattern).map(Self::Pattern)
    }

    pub fn glob(pattern: &str) -> RegistryResult<Self> {
        TopicPattern::glob(pattern).map(Self::Pattern)
    }

    /// Имена из `names`, на которые указывает селектор.
    ///
    /// Для точного имени возвращает его только если оно присутствует.
    pub fn resolve<'a, I>(
        &self,
        names: I,
    ) -> Vec<String>
    where
        I: IntoIterator<Item = &'a str>,
    {
        match self {
            Self::Exact(name) => names
                .into_iter()
                .find(|n| *n == name.as_str())
                .map(|n| vec![n.to_string()])
                .unwrap_or_default(),
            Self::Pattern(pattern) => names
                .into_iter()
                .filter(|n| pattern.is_match(n))
                .map(str::to_string)
                .collect(),
        }
    }
}

impl From<&str> for TopicSelector {
    fn from(name: &str) -> Self {
        Self::Exact(name.to_string())
    }
}

impl From<String> for TopicSelector {
    fn from(name: String) -> Self {
        Self::Exact(name)
    }
}

impl From<TopicPattern> for TopicSelector {
    fn from(pattern: TopicPattern) -> Self {
        Self::Pattern(pattern)
    }
}

impl From<Regex> for TopicSelector {
    fn from(re: Regex) -> Self {
        Self::Pattern(TopicPattern::Regex(re))
    }
}

/// Текстовая форма: `/regex/`, `glob:pattern` или точное имя.
impl FromStr for TopicSelector {
    type Err = RegistryError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        if let Some(glob) = s.strip_prefix("glob:") {
            return Self::glob(glob);
        }
        if s.len() >= 2 && s.starts_with('/') && s.ends_with('/') {
            return Self::regex(&s[1..s.len() - 1]);
        }
        Self::exact(s)
    }
}
