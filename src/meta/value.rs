//! Values stored in metadata records.

use serde::{Deserialize, Serialize};

use crate::object::ObjectId;

/// A descriptive, unenforced rank of API volatility.
///
/// Levels are totally ordered by [`index`](StabilityLevel::index).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum StabilityLevel {
    Deprecated = 0,
    Experimental = 1,
    Stable = 2,
    Locked = 3,
}

impl StabilityLevel {
    /// All levels, lowest rank first.
    pub const ALL: [StabilityLevel; 4] = [
        StabilityLevel::Deprecated,
        StabilityLevel::Experimental,
        StabilityLevel::Stable,
        StabilityLevel::Locked,
    ];

    pub fn index(self) -> u8 {
        self as u8
    }

    pub fn from_index(index: u8) -> Option<Self> {
        Self::ALL.get(usize::from(index)).copied()
    }

    pub fn name(self) -> &'static str {
        match self {
            StabilityLevel::Deprecated => "deprecated",
            StabilityLevel::Experimental => "experimental",
            StabilityLevel::Stable => "stable",
            StabilityLevel::Locked => "locked",
        }
    }

    pub fn description(self) -> &'static str {
        match self {
            StabilityLevel::Deprecated => {
                "Use is discouraged. The feature may be removed in a future release, \
                 and a replacement is usually documented."
            }
            StabilityLevel::Experimental => {
                "The feature is still being designed. Its interface and behaviour \
                 may change or disappear without a deprecation period."
            }
            StabilityLevel::Stable => {
                "The feature is settled. Breaking changes are rare and go through \
                 deprecation first."
            }
            StabilityLevel::Locked => {
                "The feature is frozen. Its interface and behaviour will not change."
            }
        }
    }
}

impl std::fmt::Display for StabilityLevel {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.name())
    }
}

impl std::str::FromStr for StabilityLevel {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::ALL
            .into_iter()
            .find(|level| level.name().eq_ignore_ascii_case(s))
            .ok_or_else(|| format!("unknown stability level: {s}"))
    }
}

/// Where a definition came from in its source text.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct SourceLocation {
    /// The full source text the offsets index into.
    pub source: String,
    /// Byte offset of the start of the definition.
    pub start: usize,
    /// Byte offset one past the end of the definition.
    pub end: usize,
    /// 1-based line of `start`.
    pub line: usize,
    /// 1-based column of `start`.
    pub column: usize,
    pub filename: Option<String>,
}

impl SourceLocation {
    pub fn new(source: impl Into<String>, start: usize, end: usize, line: usize, column: usize) -> Self {
        Self {
            source: source.into(),
            start,
            end,
            line,
            column,
            filename: None,
        }
    }

    pub fn with_filename(mut self, filename: impl Into<String>) -> Self {
        self.filename = Some(filename.into());
        self
    }

    /// The text between `start` and `end`, if the offsets are valid.
    pub fn snippet(&self) -> Option<&str> {
        self.source.get(self.start..self.end)
    }
}

impl std::fmt::Display for SourceLocation {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let file = self.filename.as_deref().unwrap_or("<unknown>");
        write!(f, "{file}:{}:{}", self.line, self.column)
    }
}

/// A cross-reference to a related object.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct SeeAlso {
    pub reference: ObjectId,
    /// Why the reader should look at `reference`.
    pub reason: String,
}

impl SeeAlso {
    pub fn new(reference: ObjectId, reason: impl Into<String>) -> Self {
        Self {
            reference,
            reason: reason.into(),
        }
    }
}

/// A value in a metadata record.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", content = "value", rename_all = "snake_case")]
pub enum MetaValue {
    Text(String),
    Integer(i64),
    Boolean(bool),
    List(Vec<MetaValue>),
    Object(ObjectId),
    Stability(StabilityLevel),
    Source(SourceLocation),
    SeeAlso(SeeAlso),
}

impl MetaValue {
    /// Short name of the value's shape, used in diagnostics.
    pub fn shape_name(&self) -> &'static str {
        match self {
            MetaValue::Text(_) => "text",
            MetaValue::Integer(_) => "integer",
            MetaValue::Boolean(_) => "boolean",
            MetaValue::List(_) => "list",
            MetaValue::Object(_) => "object",
            MetaValue::Stability(_) => "stability level",
            MetaValue::Source(_) => "source location",
            MetaValue::SeeAlso(_) => "see-also reference",
        }
    }

    pub fn as_text(&self) -> Option<&str> {
        match self {
            MetaValue::Text(s) => Some(s),
            _ => None,
        }
    }

    pub fn as_list(&self) -> Option<&[MetaValue]> {
        match self {
            MetaValue::List(items) => Some(items),
            _ => None,
        }
    }

    pub fn as_stability(&self) -> Option<StabilityLevel> {
        match self {
            MetaValue::Stability(level) => Some(*level),
            _ => None,
        }
    }

    pub fn as_source(&self) -> Option<&SourceLocation> {
        match self {
            MetaValue::Source(loc) => Some(loc),
            _ => None,
        }
    }

    pub fn as_see_also(&self) -> Option<&SeeAlso> {
        match self {
            MetaValue::SeeAlso(see) => Some(see),
            _ => None,
        }
    }

    /// Build a list of text values.
    pub fn text_list<I, S>(items: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        MetaValue::List(items.into_iter().map(|s| MetaValue::Text(s.into())).collect())
    }
}

impl From<&str> for MetaValue {
    fn from(s: &str) -> Self {
        MetaValue::Text(s.to_owned())
    }
}

impl From<String> for MetaValue {
    fn from(s: String) -> Self {
        MetaValue::Text(s)
    }
}

impl From<i64> for MetaValue {
    fn from(n: i64) -> Self {
        MetaValue::Integer(n)
    }
}

impl From<bool> for MetaValue {
    fn from(b: bool) -> Self {
        MetaValue::Boolean(b)
    }
}

impl From<ObjectId> for MetaValue {
    fn from(id: ObjectId) -> Self {
        MetaValue::Object(id)
    }
}

impl From<StabilityLevel> for MetaValue {
    fn from(level: StabilityLevel) -> Self {
        MetaValue::Stability(level)
    }
}

impl From<SourceLocation> for MetaValue {
    fn from(loc: SourceLocation) -> Self {
        MetaValue::Source(loc)
    }
}

impl From<SeeAlso> for MetaValue {
    fn from(see: SeeAlso) -> Self {
        MetaValue::SeeAlso(see)
    }
}

impl<T: Into<MetaValue>> From<Vec<T>> for MetaValue {
    fn from(items: Vec<T>) -> Self {
        MetaValue::List(items.into_iter().map(Into::into).collect())
    }
}
