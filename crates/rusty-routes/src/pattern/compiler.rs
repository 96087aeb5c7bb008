/// Regex-backed pattern compiler
///
/// Compiles tokenized templates into one anchored [`Regex`] per pattern plus
/// one anchored regex per key (used to check generated segments).
use regex::{Regex, RegexBuilder};

use super::parser::{tokenize, Token};
use super::{CompileOptions, CompiledPattern, ParamEncoder, ParamKey, PatternCompiler};
use crate::error::{Result, RouteError};
use crate::kind::RouteParams;

/// Maximum allowed size for a compiled route regex (in bytes)
const MAX_REGEX_SIZE: usize = 1 << 20;

/// Default [`PatternCompiler`]
///
/// # Examples
///
/// ```
/// use rusty_routes::pattern::{
///     CompileOptions, CompiledPattern, PatternCompiler, PercentEncoder, RegexCompiler,
/// };
/// use std::collections::HashMap;
///
/// let compiled = RegexCompiler
///     .compile("/users/:id", &CompileOptions::default())
///     .unwrap();
/// assert_eq!(compiled.match_path("/users/42"), Some(vec![Some("42".to_string())]));
///
/// let mut params = HashMap::new();
/// params.insert("id".to_string(), "7".to_string());
/// assert_eq!(compiled.generate(&params, &PercentEncoder).unwrap(), "/users/7");
/// ```
#[derive(Debug, Clone, Copy, Default)]
pub struct RegexCompiler;

impl PatternCompiler for RegexCompiler {
    fn compile(&self, pattern: &str, options: &CompileOptions) -> Result<Box<dyn CompiledPattern>> {
        Ok(Box::new(RegexPattern::new(pattern, options)?))
    }
}

/// A pattern compiled by [`RegexCompiler`]
#[derive(Debug, Clone)]
pub struct RegexPattern {
    source: String,
    regex: Regex,
    tokens: Vec<Token>,
    keys: Vec<ParamKey>,
    group_names: Vec<String>,
    segment_matchers: Vec<Regex>,
}

impl RegexPattern {
    pub fn new(pattern: &str, options: &CompileOptions) -> Result<Self> {
        let (tokens, keys) = tokenize(pattern)?;
        let group_names: Vec<String> = (0..keys.len()).map(|i| format!("k{}", i)).collect();

        let source = build_route_regex(&tokens, &keys, &group_names, options);
        let regex = build_regex(pattern, &source, options)?;

        let segment_matchers = keys
            .iter()
            .map(|key| build_regex(pattern, &format!("^(?:{})$", key.pattern), options))
            .collect::<Result<Vec<_>>>()?;

        Ok(RegexPattern {
            source: pattern.to_string(),
            regex,
            tokens,
            keys,
            group_names,
            segment_matchers,
        })
    }

    /// The regex the matcher runs against paths
    pub fn as_regex(&self) -> &Regex {
        &self.regex
    }
}

impl CompiledPattern for RegexPattern {
    fn source(&self) -> &str {
        &self.source
    }

    fn keys(&self) -> &[ParamKey] {
        &self.keys
    }

    fn match_path(&self, path: &str) -> Option<Vec<Option<String>>> {
        let captures = self.regex.captures(path)?;
        Some(
            self.group_names
                .iter()
                .zip(&self.keys)
                .map(|(group, key)| {
                    // Splats are written back verbatim, so they stay encoded
                    captures.name(group).map(|m| {
                        if key.wildcard {
                            m.as_str().to_string()
                        } else {
                            decode_capture(m.as_str())
                        }
                    })
                })
                .collect(),
        )
    }

    fn generate(&self, params: &RouteParams, encoder: &dyn ParamEncoder) -> Result<String> {
        self.tokens.iter().try_fold(String::new(), |mut path, token| {
            match token {
                Token::Literal(text) => path.push_str(text),
                Token::Key(index) => {
                    let key = &self.keys[*index];
                    match params.get(&key.name) {
                        None if key.optional => {
                            if key.partial {
                                path.push_str(&key.prefix);
                            }
                        }
                        None => {
                            return Err(RouteError::MissingRequiredParam {
                                name: key.name.clone(),
                            })
                        }
                        Some(value) => {
                            let segment = encoder.encode(value, key);
                            if !self.segment_matchers[*index].is_match(&segment) {
                                return Err(RouteError::PatternMismatch {
                                    name: key.name.clone(),
                                    pattern: key.pattern.clone(),
                                    segment,
                                });
                            }
                            path.push_str(&key.prefix);
                            path.push_str(&segment);
                        }
                    }
                }
            }
            Ok(path)
        })
    }
}

/// Assembles the anchored route regex source
fn build_route_regex(
    tokens: &[Token],
    keys: &[ParamKey],
    group_names: &[String],
    options: &CompileOptions,
) -> String {
    let last = tokens.len().saturating_sub(1);

    let body: String = tokens
        .iter()
        .enumerate()
        .map(|(position, token)| match token {
            Token::Literal(text) => {
                // Non-strict: a trailing delimiter becomes optional below
                let text = if !options.strict && position == last {
                    text.strip_suffix('/').unwrap_or(text)
                } else {
                    text.as_str()
                };
                regex::escape(text)
            }
            Token::Key(index) => {
                let key = &keys[*index];
                let prefix = regex::escape(&key.prefix);
                let capture = format!("(?P<{}>(?:{}))", group_names[*index], key.pattern);
                match (key.optional, key.partial) {
                    (true, false) => format!("(?:{}{})?", prefix, capture),
                    (true, true) => format!("{}{}?", prefix, capture),
                    (false, _) => format!("{}{}", prefix, capture),
                }
            }
        })
        .collect();

    let tail = if options.strict { "$" } else { "/?$" };
    format!("^{}{}", body, tail)
}

fn build_regex(pattern: &str, source: &str, options: &CompileOptions) -> Result<Regex> {
    RegexBuilder::new(source)
        .case_insensitive(!options.case_sensitive)
        .size_limit(MAX_REGEX_SIZE)
        .build()
        .map_err(|e| RouteError::invalid_pattern(pattern, e.to_string()))
}

/// Percent-decodes a named capture, keeping the raw text if it is not valid UTF-8
fn decode_capture(raw: &str) -> String {
    urlencoding::decode(raw)
        .map(|decoded| decoded.into_owned())
        .unwrap_or_else(|_| raw.to_string())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::pattern::PercentEncoder;
    use pretty_assertions::assert_eq;
    use std::collections::HashMap;

    fn compile(pattern: &str) -> RegexPattern {
        RegexPattern::new(pattern, &CompileOptions::default()).unwrap()
    }

    fn params(pairs: &[(&str, &str)]) -> RouteParams {
        pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect::<HashMap<_, _>>()
    }

    fn some(values: &[&str]) -> Option<Vec<Option<String>>> {
        Some(values.iter().map(|v| Some(v.to_string())).collect())
    }

    #[test]
    fn test_match_static() {
        let pattern = compile("/foo");
        assert_eq!(pattern.match_path("/foo"), Some(vec![]));
        assert_eq!(pattern.match_path("/foo/"), Some(vec![]));
        assert_eq!(pattern.match_path("/foo/bar"), None);
        assert_eq!(pattern.match_path("/fo"), None);
    }

    #[test]
    fn test_match_root() {
        let pattern = compile("/");
        assert_eq!(pattern.match_path("/"), Some(vec![]));
        assert_eq!(pattern.match_path("/x"), None);
    }

    #[test]
    fn test_match_case_insensitive_by_default() {
        assert!(compile("/foo").match_path("/FOO").is_some());

        let options = CompileOptions {
            case_sensitive: true,
            ..CompileOptions::default()
        };
        let sensitive = RegexPattern::new("/foo", &options).unwrap();
        assert!(sensitive.match_path("/FOO").is_none());
    }

    #[test]
    fn test_match_strict_trailing_slash() {
        let options = CompileOptions {
            strict: true,
            ..CompileOptions::default()
        };
        let strict = RegexPattern::new("/foo", &options).unwrap();
        assert!(strict.match_path("/foo").is_some());
        assert!(strict.match_path("/foo/").is_none());
    }

    #[test]
    fn test_match_named() {
        let pattern = compile("/foo/:name/:value");
        assert_eq!(pattern.match_path("/foo/bar/baz"), some(&["bar", "baz"]));
        assert_eq!(pattern.match_path("/foo/bar"), None);
        assert_eq!(pattern.match_path("/foo/bar/baz/qux"), None);
    }

    #[test]
    fn test_match_decodes_captures() {
        let pattern = compile("/users/:name");
        assert_eq!(pattern.match_path("/users/a%20b"), some(&["a b"]));
    }

    #[test]
    fn test_match_optional() {
        let pattern = compile("/posts/:id?");
        assert_eq!(pattern.match_path("/posts/7"), some(&["7"]));
        assert_eq!(pattern.match_path("/posts"), Some(vec![None]));
    }

    #[test]
    fn test_match_wildcard_spans_slashes() {
        let pattern = compile("/foo/(.*)");
        assert_eq!(pattern.match_path("/foo/bar/baz"), some(&["bar/baz"]));
    }

    #[test]
    fn test_match_wildcard_stays_encoded() {
        let pattern = compile("/files/(.*)");
        assert_eq!(pattern.match_path("/files/100%25.txt"), some(&["100%25.txt"]));
        assert_eq!(pattern.match_path("/files/a%3Fb/c"), some(&["a%3Fb/c"]));

        let named = compile("/files/:path(.*)");
        assert_eq!(named.match_path("/files/a%20b"), some(&["a%20b"]));
    }

    #[test]
    fn test_as_regex_is_anchored() {
        let pattern = compile("/users/:id");
        assert_eq!(pattern.as_regex().as_str(), "^/users/(?P<k0>(?:[^/]+?))/?$");
        assert!(pattern.as_regex().is_match("/USERS/7"));
    }

    #[test]
    fn test_match_custom_group() {
        let pattern = compile("/users/:id(\\d+)");
        assert!(pattern.match_path("/users/12").is_some());
        assert!(pattern.match_path("/users/abc").is_none());
    }

    #[test]
    fn test_generate_static() {
        assert_eq!(compile("/foo").generate(&params(&[]), &PercentEncoder).unwrap(), "/foo");
        assert_eq!(compile("/").generate(&params(&[]), &PercentEncoder).unwrap(), "/");
    }

    #[test]
    fn test_generate_named() {
        let url = compile("/foo/:name/:value")
            .generate(&params(&[("name", "bar"), ("value", "b z")]), &PercentEncoder)
            .unwrap();
        assert_eq!(url, "/foo/bar/b%20z");
    }

    #[test]
    fn test_generate_missing_required() {
        let err = compile("/foo/:name/:value")
            .generate(&params(&[("name", "poop")]), &PercentEncoder)
            .unwrap_err();
        assert_eq!(
            err,
            RouteError::MissingRequiredParam {
                name: "value".to_string()
            }
        );
    }

    #[test]
    fn test_generate_optional_absent() {
        let pattern = compile("/posts/:id?");
        assert_eq!(pattern.generate(&params(&[]), &PercentEncoder).unwrap(), "/posts");
        assert_eq!(
            pattern.generate(&params(&[("id", "3")]), &PercentEncoder).unwrap(),
            "/posts/3"
        );
    }

    #[test]
    fn test_generate_wildcard_keeps_slashes() {
        let url = compile("/foo/(.*)")
            .generate(&params(&[("0", "bar/baz")]), &PercentEncoder)
            .unwrap();
        assert_eq!(url, "/foo/bar/baz");
    }

    #[test]
    fn test_generate_pattern_mismatch() {
        let err = compile("/users/:id(\\d+)")
            .generate(&params(&[("id", "abc")]), &PercentEncoder)
            .unwrap_err();
        assert!(matches!(err, RouteError::PatternMismatch { ref name, .. } if name == "id"));
    }

    #[test]
    fn test_generate_with_closure_encoder() {
        let by_name = |_value: &str, key: &ParamKey| key.name.clone();
        let url = compile("/:foo/:bar/:baz")
            .generate(&params(&[("foo", "a"), ("bar", "b"), ("baz", "c")]), &by_name)
            .unwrap();
        assert_eq!(url, "/foo/bar/baz");
    }

    #[test]
    fn test_invalid_custom_regex() {
        let err = RegexPattern::new("/x/:id([)", &CompileOptions::default());
        assert!(err.is_err());
    }
}
