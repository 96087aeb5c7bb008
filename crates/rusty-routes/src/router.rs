/// URL ⇄ route conversion over a compiled route table
///
/// [`Routes`] is built once (see [`create_routes`](crate::create_routes)) and
/// is read-only afterwards: it can be cloned cheaply and shared across
/// threads, and each conversion only allocates its own result.
use std::borrow::Cow;
use std::fmt;
use std::sync::Arc;

use tracing::{debug, trace};

use crate::config::RouterOptions;
use crate::error::{Result, RouteError};
use crate::kind::{Handlers, Kind, Registry, Route, RouteParams, RoutePayload};
use crate::pattern::encode::SplatPassthrough;
use crate::pattern::{CompiledPattern, ParamEncoder, ParamKey, PatternCompiler, PercentEncoder};
use crate::query::{self, QueryParams};

/// A compiled route table plus its kind registry
#[derive(Clone)]
pub struct Routes {
    inner: Arc<Inner>,
}

/// Compiled descriptor of one table kind
#[derive(Debug)]
struct CompiledRoute {
    pattern: Box<dyn CompiledPattern>,
    /// Index of the key that receives `route_splat`
    wildcard: Option<usize>,
}

struct Inner {
    registry: Registry,
    compiled: Vec<CompiledRoute>,
    validate: bool,
    encoder: Arc<dyn ParamEncoder>,
}

impl Routes {
    pub(crate) fn compile(
        compiler: &dyn PatternCompiler,
        table: Vec<(String, String)>,
        catch_all: String,
        options: RouterOptions,
    ) -> Result<Self> {
        let validate = options.validates();
        let registry = Registry::new(table.iter().map(|(kind, _)| kind.clone()), catch_all)?
            .with_validation(validate);

        let compile_options = options.compile_options();
        let compiled = table
            .iter()
            .map(|(kind, pattern)| -> Result<CompiledRoute> {
                let pattern = compiler.compile(pattern, &compile_options)?;
                let wildcard = pattern.keys().iter().position(|key| key.wildcard);
                debug!(
                    kind = %kind,
                    pattern = pattern.source(),
                    keys = pattern.keys().len(),
                    wildcard = wildcard.is_some(),
                    "compiled route"
                );
                Ok(CompiledRoute { pattern, wildcard })
            })
            .collect::<Result<Vec<_>>>()?;

        debug!(
            routes = compiled.len(),
            catch_all = %registry.catch_all(),
            validate,
            "route table compiled"
        );

        Ok(Routes {
            inner: Arc::new(Inner {
                registry,
                compiled,
                validate,
                encoder: options
                    .encoder
                    .unwrap_or_else(|| Arc::new(PercentEncoder)),
            }),
        })
    }

    /// The kind registry (constructors and dispatcher)
    pub fn registry(&self) -> &Registry {
        &self.inner.registry
    }

    /// Looks a kind up by name
    pub fn kind(&self, name: &str) -> Option<&Kind> {
        self.inner.registry.kind(name)
    }

    /// Every kind, table kinds in declaration order, catch-all last
    pub fn kinds(&self) -> impl Iterator<Item = &Kind> {
        self.inner.registry.kinds()
    }

    /// Builds a route of the named kind with the given payload
    pub fn construct(&self, name: &str, payload: RoutePayload) -> Result<Route> {
        self.inner.registry.construct(name, payload)
    }

    /// Builds a route of the named kind with an empty payload
    pub fn route(&self, name: &str) -> Result<Route> {
        self.construct(name, RoutePayload::new())
    }

    /// Parameter keys of a table kind's pattern
    pub fn keys(&self, name: &str) -> Option<&[ParamKey]> {
        self.kind(name)
            .and_then(Kind::table_index)
            .map(|index| self.inner.compiled[index].pattern.keys())
    }

    /// The pattern a table kind was compiled from
    pub fn pattern(&self, name: &str) -> Option<&str> {
        self.kind(name)
            .and_then(Kind::table_index)
            .map(|index| self.inner.compiled[index].pattern.source())
    }

    /// Runs the handler registered for the route's kind (see [`Registry::dispatch`])
    pub fn dispatch<R>(&self, route: &Route, handlers: Handlers<'_, R>) -> Result<R> {
        self.inner.registry.dispatch(route, handlers)
    }

    /// Converts a URL into a route value
    ///
    /// Patterns are tried in table declaration order and the first match
    /// wins. Unmatched paths produce the catch-all kind carrying the raw
    /// path. Never fails.
    ///
    /// # Examples
    ///
    /// ```
    /// use rusty_routes::{create_routes, RouterOptions};
    ///
    /// let routes = create_routes(
    ///     [("AppList", "/"), ("Foo", "/foo/:name")],
    ///     "NotFound",
    ///     RouterOptions::default(),
    /// )
    /// .unwrap();
    ///
    /// let route = routes.route_for_url("/foo/bar?page=2");
    /// assert!(route.is("Foo"));
    /// assert_eq!(route.param("name"), Some("bar"));
    /// assert_eq!(route.query("page"), Some("2"));
    ///
    /// let missing = routes.route_for_url("/nowhere");
    /// assert!(missing.is("NotFound"));
    /// assert_eq!(missing.payload().route_path.as_deref(), Some("/nowhere"));
    /// ```
    pub fn route_for_url(&self, url: &str) -> Route {
        let (path, raw_query) = url.split_once('?').unwrap_or((url, ""));
        let query_params = query::parse(raw_query);

        let matched = self
            .inner
            .registry
            .table_kinds()
            .iter()
            .zip(&self.inner.compiled)
            .find_map(|(kind, compiled)| {
                compiled
                    .pattern
                    .match_path(path)
                    .map(|values| (kind, compiled.pattern.keys(), values))
            });

        match matched {
            Some((kind, keys, values)) => {
                trace!(kind = %kind, path, "route matched");
                let mut payload = RoutePayload::new().with_query_params(query_params);
                for (key, value) in keys.iter().zip(values) {
                    let Some(value) = value else { continue };
                    if key.wildcard {
                        payload.route_splat = Some(value.clone());
                    }
                    payload.route_params.insert(key.name.clone(), value);
                }
                kind.route(payload)
            }
            None => {
                trace!(path, "no route matched, falling back to catch-all");
                self.inner.registry.catch_all().route(
                    RoutePayload::new()
                        .with_path(path)
                        .with_query_params(query_params),
                )
            }
        }
    }

    /// Converts a route value back into a URL
    ///
    /// # Errors
    ///
    /// - `MissingRequiredParam` when a table route lacks a required key
    /// - `MissingRoutePath` when a catch-all route has no `route_path`
    ///   (both checks are skipped when validation is off)
    /// - `UnknownKind` when the route was built by a different registry
    /// - `PatternMismatch` when an encoded value violates its key's pattern
    ///
    /// # Examples
    ///
    /// ```
    /// use rusty_routes::{create_routes, RoutePayload, RouterOptions};
    ///
    /// let routes = create_routes([("Foo", "/foo/(.*)")], "NotFound", RouterOptions::default()).unwrap();
    /// let route = routes
    ///     .construct("Foo", RoutePayload::new().with_splat("bar/baz").with_query("q", "1"))
    ///     .unwrap();
    /// assert_eq!(routes.url_for_route(&route).unwrap(), "/foo/bar/baz?q=1");
    /// ```
    pub fn url_for_route(&self, route: &Route) -> Result<String> {
        let kind = route.kind();
        if !self.inner.registry.contains(kind) {
            return Err(RouteError::UnknownKind {
                kind: kind.name().to_string(),
            });
        }

        let payload = route.payload();
        let path = match kind.table_index() {
            Some(index) => self.table_path(&self.inner.compiled[index], payload)?,
            None => self.catch_all_path(payload)?,
        };

        Ok(append_query(path, &payload.query_params))
    }

    fn table_path(&self, compiled: &CompiledRoute, payload: &RoutePayload) -> Result<String> {
        let keys = compiled.pattern.keys();
        let params: Cow<'_, RouteParams> = match (&payload.route_splat, compiled.wildcard) {
            (Some(splat), Some(slot)) => {
                let mut merged = payload.route_params.clone();
                merged.insert(keys[slot].name.clone(), splat.clone());
                Cow::Owned(merged)
            }
            _ => Cow::Borrowed(&payload.route_params),
        };

        if self.inner.validate {
            if let Some(missing) = keys
                .iter()
                .find(|key| !key.optional && !params.contains_key(&key.name))
            {
                return Err(RouteError::MissingRequiredParam {
                    name: missing.name.clone(),
                });
            }
        }

        let encoder = self.inner.encoder.as_ref();
        match payload.route_splat {
            Some(_) => compiled
                .pattern
                .generate(&params, &SplatPassthrough { inner: encoder }),
            None => compiled.pattern.generate(&params, encoder),
        }
    }

    fn catch_all_path(&self, payload: &RoutePayload) -> Result<String> {
        match payload.route_path.as_deref() {
            Some(path) if !path.is_empty() => Ok(path.to_string()),
            _ if self.inner.validate => Err(RouteError::MissingRoutePath),
            other => Ok(other.unwrap_or_default().to_string()),
        }
    }
}

fn append_query(path: String, query_params: &QueryParams) -> String {
    let query = query::stringify(query_params);
    if query.is_empty() {
        path
    } else {
        format!("{}?{}", path, query)
    }
}

impl fmt::Debug for Routes {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Routes")
            .field("registry", &self.inner.registry)
            .field("compiled", &self.inner.compiled)
            .field("validate", &self.inner.validate)
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::create_routes;
    use pretty_assertions::assert_eq;

    fn routes() -> Routes {
        create_routes(
            [("AppList", "/"), ("Foo", "/foo/:name"), ("Files", "/files/:path(.*)")],
            "NotFound",
            RouterOptions::default(),
        )
        .unwrap()
    }

    #[test]
    fn test_routes_are_send_and_sync() {
        fn assert_send_sync<T: Send + Sync>() {}
        assert_send_sync::<Routes>();
    }

    #[test]
    fn test_keys_and_pattern_lookup() {
        let routes = routes();
        assert_eq!(routes.pattern("Foo"), Some("/foo/:name"));
        assert_eq!(routes.keys("Foo").unwrap()[0].name, "name");
        assert!(routes.keys("NotFound").is_none());
        assert!(routes.keys("Nope").is_none());
    }

    #[test]
    fn test_registry_matches_table_order() {
        let routes = routes();
        let names: Vec<&str> = routes.registry().kinds().map(Kind::name).collect();
        assert_eq!(names, vec!["AppList", "Foo", "Files", "NotFound"]);
        assert_eq!(routes.registry().catch_all().name(), "NotFound");
        assert!(routes.registry().contains(routes.kind("Files").unwrap()));
    }

    #[test]
    fn test_named_wildcard_fills_splat_and_param() {
        let route = routes().route_for_url("/files/a/b.txt");
        assert!(route.is("Files"));
        assert_eq!(route.payload().route_splat.as_deref(), Some("a/b.txt"));
        assert_eq!(route.param("path"), Some("a/b.txt"));
    }

    #[test]
    fn test_splat_goes_into_named_wildcard_slot() {
        let routes = routes();
        let route = routes
            .construct("Files", RoutePayload::new().with_splat("x/y"))
            .unwrap();
        assert_eq!(routes.url_for_route(&route).unwrap(), "/files/x/y");
    }

    #[test]
    fn test_query_only_url() {
        let route = routes().route_for_url("/?a=1");
        assert!(route.is("AppList"));
        assert_eq!(route.query("a"), Some("1"));
    }

    #[test]
    fn test_split_on_first_question_mark() {
        let route = routes().route_for_url("/foo/bar?q=a?b");
        assert_eq!(route.query("q"), Some("a?b"));
    }

    #[test]
    fn test_foreign_route_rejected() {
        let other = create_routes([("Foo", "/foo")], "Missing", RouterOptions::default()).unwrap();
        let route = other.route("Foo").unwrap();
        // same name, different table layout
        assert!(matches!(
            routes().url_for_route(&route),
            Err(RouteError::UnknownKind { .. })
        ));
    }

    #[test]
    fn test_production_skips_catch_all_check() {
        let routes = create_routes(
            [("Foo", "/foo")],
            "NotFound",
            RouterOptions::new().with_validation(false),
        )
        .unwrap();
        let route = routes.route("NotFound").unwrap();
        assert_eq!(routes.url_for_route(&route).unwrap(), "");
    }

    #[test]
    fn test_production_generator_still_reports_missing_param() {
        let routes = create_routes(
            [("Foo", "/foo/:name/:value")],
            "NotFound",
            RouterOptions::new().with_validation(false),
        )
        .unwrap();
        let route = routes
            .construct("Foo", RoutePayload::new().with_param("name", "poop"))
            .unwrap();
        assert_eq!(
            routes.url_for_route(&route).unwrap_err(),
            RouteError::MissingRequiredParam {
                name: "value".to_string()
            }
        );
    }
}
