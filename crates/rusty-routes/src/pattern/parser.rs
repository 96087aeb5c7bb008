/// Path pattern tokenizer
///
/// Pure functional parser that turns a path template into literal runs and
/// parameter keys. Pattern syntax:
///
/// - literal text, with `\` escaping the next character
/// - `:name` - required named parameter (matches one path segment)
/// - `:name?` - optional named parameter
/// - `:name(regex)` - named parameter with a custom sub-pattern
/// - `(regex)` - unnamed parameter, keyed `0`, `1`, ... in order of appearance
///
/// A parameter directly preceded by `/` or `.` takes that character as its
/// prefix, so an absent optional parameter drops its separator as well.
use std::iter::Peekable;
use std::str::Chars;

use super::ParamKey;
use crate::error::{Result, RouteError};

/// Sub-pattern used when a parameter carries no custom group
pub const DEFAULT_KEY_PATTERN: &str = "[^/]+?";

/// Sub-pattern that marks a key as the wildcard (splat) key
pub const WILDCARD_PATTERN: &str = ".*";

const PREFIX_DELIMITERS: [char; 2] = ['/', '.'];

/// A tokenized pattern piece
#[derive(Debug, Clone, PartialEq)]
pub enum Token {
    /// Literal text copied as-is
    Literal(String),
    /// Index into the key list returned alongside the tokens
    Key(usize),
}

/// Accumulator for the fold over pattern characters
#[derive(Default)]
struct ParseState {
    tokens: Vec<Token>,
    keys: Vec<ParamKey>,
    literal: String,
    unnamed: usize,
}

impl ParseState {
    /// Moves the pending literal into the token list
    fn flush_literal(&mut self) {
        if !self.literal.is_empty() {
            self.tokens
                .push(Token::Literal(std::mem::take(&mut self.literal)));
        }
    }

    /// Takes a trailing `/` or `.` off the pending literal as a key prefix
    fn take_prefix(&mut self) -> String {
        match self.literal.chars().last() {
            Some(c) if PREFIX_DELIMITERS.contains(&c) => {
                self.literal.pop();
                c.to_string()
            }
            _ => String::new(),
        }
    }

    fn push_key(&mut self, key: ParamKey) {
        self.flush_literal();
        self.tokens.push(Token::Key(self.keys.len()));
        self.keys.push(key);
    }

    fn finish(mut self) -> (Vec<Token>, Vec<ParamKey>) {
        self.flush_literal();
        (self.tokens, self.keys)
    }
}

/// Tokenizes a path pattern into literal/key tokens plus the ordered key list
///
/// # Examples
///
/// ```
/// use rusty_routes::pattern::parser::{tokenize, Token};
///
/// let (tokens, keys) = tokenize("/users/:id").unwrap();
/// assert_eq!(tokens, vec![Token::Literal("/users".to_string()), Token::Key(0)]);
/// assert_eq!(keys[0].name, "id");
/// assert_eq!(keys[0].prefix, "/");
/// ```
pub fn tokenize(pattern: &str) -> Result<(Vec<Token>, Vec<ParamKey>)> {
    let mut state = ParseState::default();
    let mut chars = pattern.chars().peekable();

    while let Some(c) = chars.next() {
        match c {
            '\\' => match chars.next() {
                Some(escaped) => state.literal.push(escaped),
                None => return Err(RouteError::invalid_pattern(pattern, "trailing escape")),
            },
            ':' if chars.peek().is_some_and(|&next| is_name_char(next)) => {
                let name = read_name(&mut chars);
                let custom = if chars.peek() == Some(&'(') {
                    chars.next();
                    Some(read_group(pattern, &mut chars)?)
                } else {
                    None
                };
                let key = read_key(pattern, &mut state, &mut chars, name, custom)?;
                state.push_key(key);
            }
            '(' => {
                let group = read_group(pattern, &mut chars)?;
                let name = state.unnamed.to_string();
                state.unnamed += 1;
                let key = read_key(pattern, &mut state, &mut chars, name, Some(group))?;
                state.push_key(key);
            }
            ')' => return Err(RouteError::invalid_pattern(pattern, "unbalanced ')'")),
            _ => state.literal.push(c),
        }
    }

    Ok(state.finish())
}

fn is_name_char(c: char) -> bool {
    c.is_ascii_alphanumeric() || c == '_'
}

fn read_name(chars: &mut Peekable<Chars<'_>>) -> String {
    let mut name = String::new();
    while let Some(&c) = chars.peek() {
        if !is_name_char(c) {
            break;
        }
        name.push(c);
        chars.next();
    }
    name
}

/// Reads a parenthesised group body; the opening `(` is already consumed
fn read_group(pattern: &str, chars: &mut Peekable<Chars<'_>>) -> Result<String> {
    let mut body = String::new();
    let mut depth = 1usize;

    while let Some(c) = chars.next() {
        match c {
            '\\' => {
                body.push(c);
                match chars.next() {
                    Some(escaped) => body.push(escaped),
                    None => return Err(RouteError::invalid_pattern(pattern, "trailing escape")),
                }
            }
            '(' => {
                depth += 1;
                body.push(c);
            }
            ')' => {
                depth -= 1;
                if depth == 0 {
                    if body.is_empty() {
                        return Err(RouteError::invalid_pattern(pattern, "empty group"));
                    }
                    return Ok(body);
                }
                body.push(c);
            }
            _ => body.push(c),
        }
    }

    Err(RouteError::invalid_pattern(pattern, "unclosed group"))
}

/// Builds the key descriptor once name and group are known, consuming a modifier
fn read_key(
    pattern: &str,
    state: &mut ParseState,
    chars: &mut Peekable<Chars<'_>>,
    name: String,
    custom: Option<String>,
) -> Result<ParamKey> {
    let optional = match chars.peek() {
        Some('?') => {
            chars.next();
            true
        }
        Some('*') | Some('+') => {
            return Err(RouteError::invalid_pattern(
                pattern,
                format!("repeating parameter \"{}\" is not supported", name),
            ))
        }
        _ => false,
    };

    if state.keys.iter().any(|key| key.name == name) {
        return Err(RouteError::invalid_pattern(
            pattern,
            format!("duplicate parameter \"{}\"", name),
        ));
    }

    let prefix = state.take_prefix();
    // Partial: the prefix is followed by more literal text inside the same segment
    let partial = match (prefix.chars().next(), chars.peek()) {
        (Some(p), Some(&next)) => next != p,
        _ => false,
    };
    let key_pattern = custom.unwrap_or_else(|| DEFAULT_KEY_PATTERN.to_string());

    Ok(ParamKey {
        wildcard: key_pattern == WILDCARD_PATTERN,
        name,
        prefix,
        pattern: key_pattern,
        optional,
        partial,
    })
}
