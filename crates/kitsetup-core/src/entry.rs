use std::fmt;

use serde::{Deserialize, Serialize};

/// Which tab of the catalog an entry belongs to.
///
/// Persisted as a lowercase string. Values this build does not know are kept
/// verbatim in `Other` so they are written back unchanged.
#[derive(Debug, Clone, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(from = "String", into = "String")]
pub enum Category {
    App,
    Game,
    #[default]
    Unclassified,
    Other(String),
}

impl Category {
    pub fn as_str(&self) -> &str {
        match self {
            Category::App => "app",
            Category::Game => "game",
            Category::Unclassified => "unclassified",
            Category::Other(value) => value,
        }
    }
}

impl From<String> for Category {
    fn from(value: String) -> Self {
        match value.as_str() {
            "app" => Category::App,
            "game" => Category::Game,
            "unclassified" => Category::Unclassified,
            _ => Category::Other(value),
        }
    }
}

impl From<Category> for String {
    fn from(category: Category) -> Self {
        match category {
            Category::Other(value) => value,
            known => known.as_str().to_string(),
        }
    }
}

impl fmt::Display for Category {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Where an installer artifact comes from.
///
/// Persisted as `{"type": "Link", "value": "https://..."}`; `Unknown` is
/// written with a `null` value.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(from = "RawSource", into = "RawSource")]
pub enum SourceDescriptor {
    /// No source chosen yet. Never installable.
    #[default]
    Unknown,
    /// Download the installer over HTTP(S).
    Link { url: String },
    /// Run an installer that already exists on the local file system.
    Package { path: String },
}

impl SourceDescriptor {
    /// Short type label, matching the persisted `type` field.
    pub fn kind(&self) -> &'static str {
        match self {
            SourceDescriptor::Unknown => "Unknown",
            SourceDescriptor::Link { .. } => "Link",
            SourceDescriptor::Package { .. } => "Package",
        }
    }

    /// The URL or path, if any.
    pub fn value(&self) -> Option<&str> {
        match self {
            SourceDescriptor::Unknown => None,
            SourceDescriptor::Link { url } => Some(url),
            SourceDescriptor::Package { path } => Some(path),
        }
    }

    /// Whether an entry with this source may be selected into a batch.
    pub fn is_installable(&self) -> bool {
        self.value().is_some_and(|v| !v.trim().is_empty())
    }
}

impl fmt::Display for SourceDescriptor {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.value() {
            Some(value) => write!(f, "{} {}", self.kind(), value),
            None => f.write_str(self.kind()),
        }
    }
}

/// On-disk shape of a source descriptor.
///
/// A `Link`/`Package` whose value is missing loads as an empty value, which
/// leaves the entry ineligible instead of rejecting the whole file.
#[derive(Debug, Serialize, Deserialize)]
struct RawSource {
    #[serde(rename = "type")]
    kind: RawSourceKind,
    #[serde(default)]
    value: Option<String>,
}

#[derive(Debug, Serialize, Deserialize)]
enum RawSourceKind {
    Unknown,
    Link,
    Package,
}

impl From<RawSource> for SourceDescriptor {
    fn from(raw: RawSource) -> Self {
        let value = raw.value.unwrap_or_default();
        match raw.kind {
            RawSourceKind::Unknown => SourceDescriptor::Unknown,
            RawSourceKind::Link => SourceDescriptor::Link { url: value },
            RawSourceKind::Package => SourceDescriptor::Package { path: value },
        }
    }
}

impl From<SourceDescriptor> for RawSource {
    fn from(source: SourceDescriptor) -> Self {
        match source {
            SourceDescriptor::Unknown => RawSource {
                kind: RawSourceKind::Unknown,
                value: None,
            },
            SourceDescriptor::Link { url } => RawSource {
                kind: RawSourceKind::Link,
                value: Some(url),
            },
            SourceDescriptor::Package { path } => RawSource {
                kind: RawSourceKind::Package,
                value: Some(path),
            },
        }
    }
}

/// One row of the software database.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SoftwareEntry {
    /// Unique key within the catalog and within a batch
    pub name: String,

    /// Tab the entry is listed under (`type` in older files)
    #[serde(default, alias = "type")]
    pub category: Category,

    #[serde(default)]
    pub source: SourceDescriptor,

    /// Extra arguments for an unattended install, split on whitespace
    #[serde(default)]
    pub silent_args: Option<String>,
}

impl SoftwareEntry {
    /// A new entry with no source and no silent args.
    pub fn new(name: impl Into<String>, category: Category) -> Self {
        Self {
            name: name.into(),
            category,
            source: SourceDescriptor::Unknown,
            silent_args: None,
        }
    }

    pub fn with_source(mut self, source: SourceDescriptor) -> Self {
        self.source = source;
        self
    }

    pub fn with_silent_args(mut self, args: impl Into<String>) -> Self {
        let args = args.into();
        self.silent_args = if args.trim().is_empty() {
            None
        } else {
            Some(args)
        };
        self
    }

    pub fn is_installable(&self) -> bool {
        !self.name.is_empty() && self.source.is_installable()
    }
}
