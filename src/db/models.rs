//! Repository entry documents.
//!
//! Field values follow one convention throughout: "unknown" means we have
//! not tried to get the value yet, a negative marker means we tried and it
//! does not exist, and anything else is the value itself. An empty string is
//! a legitimate value.

use serde::de::{self, Deserializer};
use serde::{Deserialize, Serialize, Serializer};
use std::collections::BTreeMap;

pub const DEFAULT_ONTOLOGY: &str = "lcsh";
pub const DEFAULT_CONTENT_BASIS: &str = "file names";

/// A list-valued field that may not have been probed yet.
///
/// Stored as `[]` when unknown, `-1` when known to be absent, otherwise the
/// list itself.
#[derive(Debug, Clone, PartialEq, Default)]
pub enum Probe<T> {
    #[default]
    Unknown,
    Absent,
    Found(Vec<T>),
}

impl<T> Probe<T> {
    /// An empty list carries no information, so it maps to `Unknown`.
    pub fn found(items: Vec<T>) -> Self {
        if items.is_empty() {
            Probe::Unknown
        } else {
            Probe::Found(items)
        }
    }

    pub fn items(&self) -> &[T] {
        match self {
            Probe::Found(v) => v,
            _ => &[],
        }
    }

    pub fn map<U>(&self, f: impl FnMut(&T) -> U) -> Probe<U> {
        match self {
            Probe::Unknown => Probe::Unknown,
            Probe::Absent => Probe::Absent,
            Probe::Found(v) => Probe::Found(v.iter().map(f).collect()),
        }
    }
}

impl<T: Serialize> Serialize for Probe<T> {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        match self {
            Probe::Unknown => serializer.collect_seq(std::iter::empty::<&T>()),
            Probe::Absent => serializer.serialize_i64(-1),
            Probe::Found(items) => items.serialize(serializer),
        }
    }
}

#[derive(Deserialize)]
#[serde(untagged)]
enum RawProbe<T> {
    Marker(i64),
    List(Vec<T>),
}

impl<'de, T: Deserialize<'de>> Deserialize<'de> for Probe<T> {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        match Option::<RawProbe<T>>::deserialize(deserializer)? {
            None => Ok(Probe::Unknown),
            Some(RawProbe::Marker(-1)) => Ok(Probe::Absent),
            Some(RawProbe::Marker(n)) => Err(de::Error::custom(format!(
                "unexpected list marker {n}"
            ))),
            Some(RawProbe::List(items)) => Ok(Probe::found(items)),
        }
    }
}

/// README content: `null`, `""`, `-1` (no README), `-2` (unreadable) or text.
#[derive(Debug, Clone, PartialEq, Default)]
pub enum Readme {
    #[default]
    Unknown,
    Empty,
    Missing,
    Garbage,
    Text(String),
}

impl Serialize for Readme {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        match self {
            Readme::Unknown => serializer.serialize_none(),
            Readme::Empty => serializer.serialize_str(""),
            Readme::Missing => serializer.serialize_i64(-1),
            Readme::Garbage => serializer.serialize_i64(-2),
            Readme::Text(text) => serializer.serialize_str(text),
        }
    }
}

#[derive(Deserialize)]
#[serde(untagged)]
enum RawReadme {
    Marker(i64),
    Text(String),
}

impl<'de> Deserialize<'de> for Readme {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        match Option::<RawReadme>::deserialize(deserializer)? {
            None => Ok(Readme::Unknown),
            Some(RawReadme::Marker(-1)) => Ok(Readme::Missing),
            Some(RawReadme::Marker(-2)) => Ok(Readme::Garbage),
            Some(RawReadme::Marker(n)) => {
                Err(de::Error::custom(format!("unexpected readme marker {n}")))
            }
            Some(RawReadme::Text(text)) if text.is_empty() => Ok(Readme::Empty),
            Some(RawReadme::Text(text)) => Ok(Readme::Text(text)),
        }
    }
}

/// Fork status: `[]` unknown, `false` not a fork, or parent/root details.
///
/// For a single-level fork `parent` and `root` are the same repository.
#[derive(Debug, Clone, PartialEq, Default)]
pub enum Fork {
    #[default]
    Unknown,
    NotFork,
    Fork {
        parent: Option<String>,
        root: Option<String>,
    },
}

impl Fork {
    pub fn from_flags(is_fork: Option<bool>, parent: Option<String>, root: Option<String>) -> Self {
        match is_fork {
            None => Fork::Unknown,
            Some(false) => Fork::NotFork,
            Some(true) => Fork::Fork { parent, root },
        }
    }
}

#[derive(Serialize, Deserialize)]
struct ForkDetail {
    parent: Option<String>,
    root: Option<String>,
}

impl Serialize for Fork {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        match self {
            Fork::Unknown => serializer.collect_seq(std::iter::empty::<()>()),
            Fork::NotFork => serializer.serialize_bool(false),
            Fork::Fork { parent, root } => ForkDetail {
                parent: parent.clone(),
                root: root.clone(),
            }
            .serialize(serializer),
        }
    }
}

#[derive(Deserialize)]
#[serde(untagged)]
enum RawFork {
    Flag(bool),
    Detail(ForkDetail),
    List(Vec<serde_json::Value>),
}

impl<'de> Deserialize<'de> for Fork {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        match Option::<RawFork>::deserialize(deserializer)? {
            None => Ok(Fork::Unknown),
            Some(RawFork::Flag(false)) => Ok(Fork::NotFork),
            Some(RawFork::Flag(true)) => Ok(Fork::Fork {
                parent: None,
                root: None,
            }),
            Some(RawFork::Detail(d)) => Ok(Fork::Fork {
                parent: d.parent,
                root: d.root,
            }),
            Some(RawFork::List(v)) if v.is_empty() => Ok(Fork::Unknown),
            Some(RawFork::List(_)) => Err(de::Error::custom("fork list must be empty")),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Language {
    pub name: String,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Content {
    Code,
    Noncode,
}

/// One guess at what a repository holds, and how the guess was made.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ContentType {
    pub content: Content,
    pub basis: String,
}

/// POSIX UTC timestamps stored as floats.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct RepoTimes {
    pub repo_created: Option<f64>,
    pub repo_updated: Option<f64>,
    pub repo_pushed: Option<f64>,
    pub data_refreshed: Option<f64>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct RepoEntry {
    #[serde(rename = "_id")]
    pub id: i64,
    pub owner: Option<String>,
    pub name: Option<String>,
    pub description: Option<String>,
    pub readme: Readme,
    pub text_languages: Probe<String>,
    pub languages: Probe<Language>,
    pub licenses: Probe<String>,
    pub files: Probe<String>,
    pub content_type: Vec<ContentType>,
    pub kind: Vec<String>,
    pub interfaces: Vec<String>,
    pub topics: BTreeMap<String, Vec<String>>,
    pub notes: Option<String>,
    pub functions: Vec<String>,
    pub num_commits: Option<i64>,
    pub num_releases: Option<i64>,
    pub num_branches: Option<i64>,
    pub num_contributors: Option<i64>,
    pub is_visible: Option<bool>,
    pub is_deleted: Option<bool>,
    pub fork: Fork,
    pub time: RepoTimes,
    pub default_branch: Option<String>,
    pub homepage: Option<String>,
}

impl Default for RepoEntry {
    fn default() -> Self {
        Self::new(0)
    }
}

impl RepoEntry {
    /// A record for `id` with every field unknown.
    pub fn new(id: i64) -> Self {
        Self {
            id,
            owner: None,
            name: None,
            description: None,
            readme: Readme::Unknown,
            text_languages: Probe::Unknown,
            languages: Probe::Unknown,
            licenses: Probe::Unknown,
            files: Probe::Unknown,
            content_type: Vec::new(),
            kind: Vec::new(),
            interfaces: Vec::new(),
            topics: make_topics(DEFAULT_ONTOLOGY, Vec::new()),
            notes: None,
            functions: Vec::new(),
            num_commits: None,
            num_releases: None,
            num_branches: None,
            num_contributors: None,
            is_visible: None,
            is_deleted: None,
            fork: Fork::Unknown,
            time: RepoTimes::default(),
            default_branch: None,
            homepage: None,
        }
    }

    pub fn with_path(mut self, owner: impl Into<String>, name: impl Into<String>) -> Self {
        self.owner = Some(owner.into());
        self.name = Some(name.into());
        self
    }

    /// `owner/name`, when both are known.
    pub fn path(&self) -> Option<String> {
        Some(format!("{}/{}", self.owner.as_deref()?, self.name.as_deref()?))
    }

    /// `owner/name (#id)` in plain ASCII; other characters become `?`.
    pub fn summary(&self) -> String {
        let path = self.path().unwrap_or_else(|| "<unnamed>".to_string());
        format!("{} (#{})", path, self.id)
            .chars()
            .map(|c| if c.is_ascii() { c } else { '?' })
            .collect()
    }

    pub fn language_names(&self) -> Probe<String> {
        self.languages.map(|l| l.name.clone())
    }

    /// A deleted repository can never be visible.
    pub fn mark_deleted(&mut self) {
        self.is_deleted = Some(true);
        self.is_visible = Some(false);
    }
}

pub fn make_languages<I, S>(langs: I) -> Probe<Language>
where
    I: IntoIterator<Item = S>,
    S: Into<String>,
{
    Probe::found(
        langs
            .into_iter()
            .map(|name| Language { name: name.into() })
            .collect(),
    )
}

pub fn make_content_type(content: Content, basis: Option<&str>) -> ContentType {
    ContentType {
        content,
        basis: basis.unwrap_or(DEFAULT_CONTENT_BASIS).to_string(),
    }
}

pub fn make_topics(ontology: &str, terms: Vec<String>) -> BTreeMap<String, Vec<String>> {
    BTreeMap::from([(ontology.to_string(), terms)])
}
