//! Structured warning and info events emitted by the pipeline.
//!
//! Every stage reports through an [`EventSink`] instead of logging directly,
//! so hosts can route events into their own warning machinery and tests can
//! record them.

use std::fmt;

/// Category attached to warnings raised by this crate.
pub const WARNING_CATEGORY: &str = "needs_config_writer";

/// Category attached to informational records and configuration errors.
pub const INFO_CATEGORY: &str = "ubproject";

/// Severity of an [`Event`].
#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub enum Level {
    /// Progress and decision records.
    Info,
    /// Something was dropped, converted lossily or could not be read.
    Warning,
}

/// Fine-grained event classification.
#[derive(Clone, Copy, Debug, Eq, PartialEq, Hash)]
#[non_exhaustive]
pub enum Subtype {
    /// An option value is malformed.
    ConfigError,
    /// The existing output differs from the freshly rendered document.
    ContentDiff,
    /// A merge source could not be found, read or decoded.
    MergeFailed,
    /// A path object was converted to text without relativization.
    PathConversion,
    /// A value cannot be represented and was dropped.
    UnsupportedType,
    /// A configuration path matched a relativization rule.
    PathMatching,
    /// An absolute path was rewritten relative to the output directory.
    PathRelativization,
}

impl Subtype {
    /// Wire name of the subtype.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::ConfigError => "config_error",
            Self::ContentDiff => "content_diff",
            Self::MergeFailed => "merge_failed",
            Self::PathConversion => "path_conversion",
            Self::UnsupportedType => "unsupported_type",
            Self::PathMatching => "path_matching",
            Self::PathRelativization => "path_relativization",
        }
    }
}

impl fmt::Display for Subtype {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A single warning or info record.
#[derive(Clone, Debug, Eq, PartialEq)]
pub struct Event {
    /// Severity.
    pub level: Level,
    /// Human-readable message.
    pub message: String,
    /// Coarse category, [`WARNING_CATEGORY`] or [`INFO_CATEGORY`].
    pub category: &'static str,
    /// Fine-grained classification, when one applies.
    pub subtype: Option<Subtype>,
    /// Configuration path or file the event refers to.
    pub location: Option<String>,
}

impl Event {
    /// Construct a warning in the crate's warning category.
    #[must_use]
    pub fn warning(subtype: Subtype, message: impl Into<String>) -> Self {
        Self {
            level: Level::Warning,
            message: message.into(),
            category: WARNING_CATEGORY,
            subtype: Some(subtype),
            location: None,
        }
    }

    /// Construct an informational record without a subtype.
    #[must_use]
    pub fn info(message: impl Into<String>) -> Self {
        Self {
            level: Level::Info,
            message: message.into(),
            category: INFO_CATEGORY,
            subtype: None,
            location: None,
        }
    }

    /// Attach a subtype.
    #[must_use]
    pub fn with_subtype(mut self, subtype: Subtype) -> Self {
        self.subtype = Some(subtype);
        self
    }

    /// Override the category.
    #[must_use]
    pub fn in_category(mut self, category: &'static str) -> Self {
        self.category = category;
        self
    }

    /// Attach a location.
    #[must_use]
    pub fn at(mut self, location: impl Into<String>) -> Self {
        self.location = Some(location.into());
        self
    }

    /// Whether this is a warning.
    #[must_use]
    pub fn is_warning(&self) -> bool {
        self.level == Level::Warning
    }
}

impl fmt::Display for Event {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.message)?;
        match self.subtype {
            Some(subtype) => write!(f, " [{}.{subtype}]", self.category),
            None => write!(f, " [{}]", self.category),
        }
    }
}

/// Receiver for pipeline events.
pub trait EventSink {
    /// Accept one event.
    fn emit(&mut self, event: Event);
}

/// Recording sink, mostly useful in tests.
impl EventSink for Vec<Event> {
    fn emit(&mut self, event: Event) {
        self.push(event);
    }
}

/// Sink that forwards every event to `tracing`.
#[derive(Clone, Copy, Debug, Default)]
pub struct TracingSink;

impl EventSink for TracingSink {
    fn emit(&mut self, event: Event) {
        let subtype = event.subtype.map_or("", Subtype::as_str);
        let location = event.location.as_deref().unwrap_or("");
        match event.level {
            Level::Warning => tracing::warn!(
                category = event.category,
                subtype,
                location,
                "{}",
                event.message
            ),
            Level::Info => tracing::info!(
                category = event.category,
                subtype,
                location,
                "{}",
                event.message
            ),
        }
    }
}
