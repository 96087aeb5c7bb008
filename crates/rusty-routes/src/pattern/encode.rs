/// Parameter encoders used when generating paths
use super::ParamKey;

/// Turns a raw parameter value into its path-safe representation
///
/// Any `Fn(&str, &ParamKey) -> String` closure is an encoder, so a router
/// can be configured with a plain closure:
///
/// ```
/// use rusty_routes::pattern::{ParamEncoder, ParamKey};
///
/// let by_name = |_value: &str, key: &ParamKey| key.name.clone();
/// let key = ParamKey::named("foo");
/// assert_eq!(by_name.encode("a", &key), "foo");
/// ```
pub trait ParamEncoder: Send + Sync {
    fn encode(&self, value: &str, key: &ParamKey) -> String;
}

impl<F> ParamEncoder for F
where
    F: Fn(&str, &ParamKey) -> String + Send + Sync,
{
    fn encode(&self, value: &str, key: &ParamKey) -> String {
        self(value, key)
    }
}

/// Default encoder: percent-encodes named values, leaves wildcard values intact
#[derive(Debug, Clone, Copy, Default)]
pub struct PercentEncoder;

impl ParamEncoder for PercentEncoder {
    fn encode(&self, value: &str, key: &ParamKey) -> String {
        if key.wildcard {
            value.to_string()
        } else {
            urlencoding::encode(value).into_owned()
        }
    }
}

/// Passes wildcard values through verbatim and delegates every other key
pub(crate) struct SplatPassthrough<'a> {
    pub(crate) inner: &'a dyn ParamEncoder,
}

impl ParamEncoder for SplatPassthrough<'_> {
    fn encode(&self, value: &str, key: &ParamKey) -> String {
        if key.wildcard {
            value.to_string()
        } else {
            self.inner.encode(value, key)
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_percent_encoder_named() {
        let key = ParamKey::named("name");
        assert_eq!(PercentEncoder.encode("a b/c", &key), "a%20b%2Fc");
    }

    #[test]
    fn test_percent_encoder_wildcard_untouched() {
        let key = ParamKey::wildcard("0");
        assert_eq!(PercentEncoder.encode("bar/baz", &key), "bar/baz");
    }

    #[test]
    fn test_splat_passthrough_delegates() {
        let shout = |value: &str, _key: &ParamKey| value.to_uppercase();
        let encoder = SplatPassthrough { inner: &shout };
        assert_eq!(encoder.encode("abc", &ParamKey::named("x")), "ABC");
        assert_eq!(encoder.encode("a/b", &ParamKey::wildcard("0")), "a/b");
    }
}
