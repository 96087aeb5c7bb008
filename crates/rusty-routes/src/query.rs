/// Query string encoding and decoding
///
/// Flat `key=value&key2=value2` strings only. Both directions are pure
/// functions; decoding is total (malformed escapes are kept verbatim).
use indexmap::IndexMap;

/// Decoded query parameters, iterated in insertion order
pub type QueryParams = IndexMap<String, String>;

/// Parses a raw query string (without the leading `?`) into a flat map
///
/// - `+` decodes to a space, `%XX` escapes are percent-decoded
/// - a pair without `=` maps its key to an empty string
/// - empty pairs (`a=1&&b=2`) are skipped
/// - duplicate keys: the last occurrence wins
///
/// # Examples
///
/// ```
/// use rusty_routes::query;
///
/// let params = query::parse("name=bar&value=baz%20qux");
/// assert_eq!(params.get("name").map(String::as_str), Some("bar"));
/// assert_eq!(params.get("value").map(String::as_str), Some("baz qux"));
/// ```
pub fn parse(query: &str) -> QueryParams {
    query
        .split('&')
        .filter(|pair| !pair.is_empty())
        .map(|pair| {
            let (key, value) = pair.split_once('=').unwrap_or((pair, ""));
            (decode_component(key), decode_component(value))
        })
        .fold(QueryParams::new(), |mut params, (key, value)| {
            // shift_remove keeps the position of the winning occurrence
            params.shift_remove(&key);
            params.insert(key, value);
            params
        })
}

/// Serializes query parameters into `key=value` pairs joined by `&`
///
/// Returns an empty string for an empty map, so callers can decide whether
/// to append a `?` at all.
///
/// # Examples
///
/// ```
/// use rusty_routes::query::{self, QueryParams};
///
/// let mut params = QueryParams::new();
/// params.insert("name".to_string(), "bar".to_string());
/// params.insert("q".to_string(), "a b".to_string());
/// assert_eq!(query::stringify(&params), "name=bar&q=a%20b");
/// ```
pub fn stringify(params: &QueryParams) -> String {
    params
        .iter()
        .map(|(key, value)| {
            format!(
                "{}={}",
                urlencoding::encode(key),
                urlencoding::encode(value)
            )
        })
        .collect::<Vec<_>>()
        .join("&")
}

fn decode_component(raw: &str) -> String {
    let spaced = raw.replace('+', " ");
    match urlencoding::decode(&spaced) {
        Ok(decoded) => decoded.into_owned(),
        Err(_) => spaced,
    }
}
