//! Parser configuration.

use serde::{Deserialize, Serialize};

/// Options for one parse run.
///
/// Deserializable from any serde format; missing fields take their default,
/// so an empty TOML table is a valid configuration.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Default)]
#[serde(default, deny_unknown_fields)]
pub struct ParseOptions {
    /// Emit comment lines as `Record::Comment` where they occur.
    pub keep_comments: bool,
    /// Reject two node lines that are not separated by a blank line.
    pub strict: bool,
}

impl ParseOptions {
    /// Lenient parsing that also reports comments.
    #[must_use]
    pub fn with_comments() -> Self {
        Self {
            keep_comments: true,
            ..Self::default()
        }
    }

    #[must_use]
    pub fn strict() -> Self {
        Self {
            strict: true,
            ..Self::default()
        }
    }

    /// Layer `other` on top of `self`: any option enabled in either is enabled.
    #[must_use]
    pub const fn merged(self, other: Self) -> Self {
        Self {
            keep_comments: self.keep_comments || other.keep_comments,
            strict: self.strict || other.strict,
        }
    }
}
