/// Pattern compiler adapter
///
/// The router does not care how a path template becomes a matcher. It only
/// needs, per route kind:
/// - the ordered parameter keys of the pattern
/// - a matcher returning one captured value per key
/// - a generator filling the keys back into a concrete path
///
/// [`PatternCompiler`] is that seam. [`RegexCompiler`] is the default
/// implementation; tests and alternative syntaxes plug in their own.
use std::fmt;

use crate::error::Result;
use crate::kind::RouteParams;

pub mod compiler;
pub mod encode;
pub mod parser;

pub use compiler::{RegexCompiler, RegexPattern};
pub use encode::{ParamEncoder, PercentEncoder};

/// Describes one capturing slot of a compiled pattern
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ParamKey {
    /// Parameter name; unnamed groups are numbered `"0"`, `"1"`, ...
    pub name: String,
    /// Separator owned by the key (`"/"`, `"."` or empty)
    pub prefix: String,
    /// Sub-pattern the captured value must satisfy
    pub pattern: String,
    /// Whether the key may be absent
    pub optional: bool,
    /// Whether this is the match-everything (splat) key
    pub wildcard: bool,
    /// Whether the prefix is followed by more literal text in the same segment
    pub partial: bool,
}

impl ParamKey {
    /// A required `/:name` key with the default single-segment sub-pattern
    pub fn named(name: impl Into<String>) -> Self {
        ParamKey {
            name: name.into(),
            prefix: "/".to_string(),
            pattern: parser::DEFAULT_KEY_PATTERN.to_string(),
            optional: false,
            wildcard: false,
            partial: false,
        }
    }

    /// A required `/(.*)` splat key
    pub fn wildcard(name: impl Into<String>) -> Self {
        ParamKey {
            pattern: parser::WILDCARD_PATTERN.to_string(),
            wildcard: true,
            ..ParamKey::named(name)
        }
    }

    /// Marks the key optional (builder style)
    pub fn with_optional(mut self, optional: bool) -> Self {
        self.optional = optional;
        self
    }
}

/// Matching flags applied when compiling a pattern
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct CompileOptions {
    /// Match path text case-sensitively (default: insensitive)
    pub case_sensitive: bool,
    /// Reject a trailing `/` the pattern does not spell out
    pub strict: bool,
}

/// Turns a path template into a [`CompiledPattern`]
pub trait PatternCompiler: Send + Sync {
    fn compile(&self, pattern: &str, options: &CompileOptions) -> Result<Box<dyn CompiledPattern>>;
}

/// A compiled path template: matcher plus inverse generator
pub trait CompiledPattern: Send + Sync + fmt::Debug {
    /// The template this was compiled from
    fn source(&self) -> &str;

    /// Parameter keys in left-to-right order of appearance
    fn keys(&self) -> &[ParamKey];

    /// Tests `path`; on success returns one slot per key, positionally
    /// aligned with [`keys`](CompiledPattern::keys). Optional keys that did
    /// not participate in the match yield `None`.
    fn match_path(&self, path: &str) -> Option<Vec<Option<String>>>;

    /// Fills the template from `params` (looked up by key name)
    ///
    /// Fails with `MissingRequiredParam` when a non-optional key is absent.
    fn generate(&self, params: &RouteParams, encoder: &dyn ParamEncoder) -> Result<String>;
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_param_key_constructors() {
        let key = ParamKey::named("id");
        assert_eq!(key.prefix, "/");
        assert!(!key.wildcard);
        assert!(!key.optional);

        let splat = ParamKey::wildcard("0");
        assert!(splat.wildcard);
        assert_eq!(splat.pattern, ".*");

        assert!(ParamKey::named("page").with_optional(true).optional);
    }
}
