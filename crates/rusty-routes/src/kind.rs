/// Route kinds and route values
///
/// The set of kinds is closed once the [`Registry`] is built: one kind per
/// route-table entry plus the catch-all kind. A [`Route`] is an immutable
/// value tagged with its [`Kind`]; routes are only produced by a registry's
/// kinds, so a route always carries a tag the registry knows about.
use std::collections::HashMap;
use std::fmt;
use std::sync::Arc;

use tracing::debug;

use crate::error::{Result, RouteError};
use crate::query::QueryParams;

/// Named route parameters (name → value)
pub type RouteParams = HashMap<String, String>;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
enum Slot {
    Table(usize),
    CatchAll,
}

/// A route kind tag
///
/// Cheap to clone. A kind doubles as the constructor for its route values:
///
/// ```
/// use rusty_routes::{Registry, RoutePayload};
///
/// let registry = Registry::new(["Foo"], "NotFound").unwrap();
/// let foo = registry.kind("Foo").unwrap();
/// let route = foo.route(RoutePayload::new().with_param("id", "1"));
/// assert_eq!(route.kind().name(), "Foo");
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct Kind {
    name: Arc<str>,
    slot: Slot,
}

impl Kind {
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Whether this is the kind used for unmatched URLs
    pub fn is_catch_all(&self) -> bool {
        self.slot == Slot::CatchAll
    }

    /// Position in the route table, `None` for the catch-all kind
    pub fn table_index(&self) -> Option<usize> {
        match self.slot {
            Slot::Table(index) => Some(index),
            Slot::CatchAll => None,
        }
    }

    /// Builds a route value of this kind (no validation at construction time)
    pub fn route(&self, payload: RoutePayload) -> Route {
        Route {
            kind: self.clone(),
            payload,
        }
    }
}

impl fmt::Display for Kind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.name)
    }
}

/// Data carried by a route value
///
/// Table kinds use `route_params`, `route_splat` and `query_params`; the
/// catch-all kind uses `route_path` and `query_params`. Callers building a
/// route for URL generation only fill in what the pattern needs.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RoutePayload {
    /// Named parameter values
    pub route_params: RouteParams,
    /// Value of the wildcard (splat) capture
    pub route_splat: Option<String>,
    /// Raw path of an unmatched URL (catch-all kind only)
    pub route_path: Option<String>,
    /// Decoded query string
    pub query_params: QueryParams,
}

impl RoutePayload {
    pub fn new() -> Self {
        Self::default()
    }

    /// Sets one route parameter
    pub fn with_param(mut self, name: impl Into<String>, value: impl Into<String>) -> Self {
        self.route_params.insert(name.into(), value.into());
        self
    }

    /// Sets several route parameters at once
    pub fn with_params<I, K, V>(mut self, params: I) -> Self
    where
        I: IntoIterator<Item = (K, V)>,
        K: Into<String>,
        V: Into<String>,
    {
        self.route_params
            .extend(params.into_iter().map(|(k, v)| (k.into(), v.into())));
        self
    }

    /// Sets the wildcard capture
    pub fn with_splat(mut self, splat: impl Into<String>) -> Self {
        self.route_splat = Some(splat.into());
        self
    }

    /// Sets the raw path (catch-all routes)
    pub fn with_path(mut self, path: impl Into<String>) -> Self {
        self.route_path = Some(path.into());
        self
    }

    /// Appends one query parameter
    pub fn with_query(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.query_params.insert(key.into(), value.into());
        self
    }

    /// Replaces the query parameters
    pub fn with_query_params(mut self, query_params: QueryParams) -> Self {
        self.query_params = query_params;
        self
    }
}

/// A route value: a kind tag plus its payload
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Route {
    kind: Kind,
    payload: RoutePayload,
}

impl Route {
    pub fn kind(&self) -> &Kind {
        &self.kind
    }

    pub fn payload(&self) -> &RoutePayload {
        &self.payload
    }

    pub fn into_payload(self) -> RoutePayload {
        self.payload
    }

    /// Checks the kind by name
    pub fn is(&self, kind: &str) -> bool {
        self.kind.name() == kind
    }

    /// Shorthand for `payload().route_params.get(name)`
    pub fn param(&self, name: &str) -> Option<&str> {
        self.payload.route_params.get(name).map(String::as_str)
    }

    /// Shorthand for `payload().query_params.get(key)`
    pub fn query(&self, key: &str) -> Option<&str> {
        self.payload.query_params.get(key).map(String::as_str)
    }
}

type Arm<'a, R> = Box<dyn FnOnce(&RoutePayload) -> R + 'a>;
type Fallback<'a, R> = Box<dyn FnOnce(&Route) -> R + 'a>;

/// Handler set for [`Registry::dispatch`], keyed by kind name
///
/// ```
/// use rusty_routes::{Handlers, Registry, RoutePayload};
///
/// let registry = Registry::new(["Foo"], "NotFound").unwrap();
/// let route = registry.construct("Foo", RoutePayload::new()).unwrap();
///
/// let label = registry
///     .dispatch(
///         &route,
///         Handlers::new()
///             .on("Foo", |_| "foo")
///             .on("NotFound", |_| "missing"),
///     )
///     .unwrap();
/// assert_eq!(label, "foo");
/// ```
pub struct Handlers<'a, R> {
    arms: HashMap<String, Arm<'a, R>>,
    fallback: Option<Fallback<'a, R>>,
}

impl<'a, R> Handlers<'a, R> {
    pub fn new() -> Self {
        Handlers {
            arms: HashMap::new(),
            fallback: None,
        }
    }

    /// Registers the handler for one kind
    pub fn on(mut self, kind: impl Into<String>, handler: impl FnOnce(&RoutePayload) -> R + 'a) -> Self {
        self.arms.insert(kind.into(), Box::new(handler));
        self
    }

    /// Registers a handler for every kind without its own arm
    pub fn otherwise(mut self, handler: impl FnOnce(&Route) -> R + 'a) -> Self {
        self.fallback = Some(Box::new(handler));
        self
    }

    /// Kind names with an explicit handler
    pub fn kinds(&self) -> impl Iterator<Item = &str> {
        self.arms.keys().map(String::as_str)
    }
}

impl<R> Default for Handlers<'_, R> {
    fn default() -> Self {
        Self::new()
    }
}

impl<R> fmt::Debug for Handlers<'_, R> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Handlers")
            .field("arms", &self.arms.keys().collect::<Vec<_>>())
            .field("fallback", &self.fallback.is_some())
            .finish()
    }
}

/// The closed set of route kinds: table kinds in declaration order plus the catch-all
#[derive(Debug, Clone)]
pub struct Registry {
    table: Vec<Kind>,
    catch_all: Kind,
    validate: bool,
}

impl Registry {
    /// Builds a registry, rejecting duplicate kinds and a colliding catch-all
    pub fn new<I, S>(table_kinds: I, catch_all: impl Into<String>) -> Result<Self>
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        let catch_all: String = catch_all.into();
        let mut table: Vec<Kind> = Vec::new();

        for name in table_kinds.into_iter().map(Into::into) {
            if name == catch_all {
                return Err(RouteError::CatchAllCollision { kind: name });
            }
            if table.iter().any(|kind| kind.name() == name) {
                return Err(RouteError::DuplicateKind { kind: name });
            }
            table.push(Kind {
                name: name.into(),
                slot: Slot::Table(table.len()),
            });
        }

        debug!(
            kinds = table.len(),
            catch_all = %catch_all,
            "route kind registry built"
        );

        Ok(Registry {
            table,
            catch_all: Kind {
                name: catch_all.into(),
                slot: Slot::CatchAll,
            },
            validate: true,
        })
    }

    /// Toggles handler-name validation in [`dispatch`](Registry::dispatch)
    pub fn with_validation(mut self, validate: bool) -> Self {
        self.validate = validate;
        self
    }

    /// Table kinds in declaration order
    pub fn table_kinds(&self) -> &[Kind] {
        &self.table
    }

    pub fn catch_all(&self) -> &Kind {
        &self.catch_all
    }

    /// Every kind, table kinds first, catch-all last
    pub fn kinds(&self) -> impl Iterator<Item = &Kind> {
        self.table.iter().chain(std::iter::once(&self.catch_all))
    }

    /// Looks a kind up by name
    pub fn kind(&self, name: &str) -> Option<&Kind> {
        self.kinds().find(|kind| kind.name() == name)
    }

    /// Whether `kind` was issued by a registry with this exact layout
    pub fn contains(&self, kind: &Kind) -> bool {
        match kind.slot {
            Slot::Table(index) => self.table.get(index) == Some(kind),
            Slot::CatchAll => &self.catch_all == kind,
        }
    }

    /// Builds a route of the named kind
    pub fn construct(&self, name: &str, payload: RoutePayload) -> Result<Route> {
        self.kind(name)
            .map(|kind| kind.route(payload))
            .ok_or_else(|| RouteError::UnknownKind {
                kind: name.to_string(),
            })
    }

    /// Runs the handler registered for the route's kind
    ///
    /// Falls back to the `otherwise` handler when the kind has no arm, and
    /// fails with `UnhandledRouteKind` when there is neither. With validation
    /// on, handlers naming kinds outside the registry are rejected up front.
    pub fn dispatch<R>(&self, route: &Route, mut handlers: Handlers<'_, R>) -> Result<R> {
        if !self.contains(route.kind()) {
            return Err(RouteError::UnknownKind {
                kind: route.kind().name().to_string(),
            });
        }

        if self.validate {
            if let Some(unknown) = handlers.kinds().find(|name| self.kind(name).is_none()) {
                return Err(RouteError::UnknownKind {
                    kind: unknown.to_string(),
                });
            }
        }

        match (handlers.arms.remove(route.kind().name()), handlers.fallback) {
            (Some(handler), _) => Ok(handler(route.payload())),
            (None, Some(fallback)) => Ok(fallback(route)),
            (None, None) => Err(RouteError::UnhandledRouteKind {
                kind: route.kind().name().to_string(),
            }),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    fn registry() -> Registry {
        Registry::new(["AppList", "Foo"], "NotFound").unwrap()
    }

    #[test]
    fn test_registry_has_all_kinds() {
        let registry = registry();
        let names: Vec<&str> = registry.kinds().map(Kind::name).collect();
        assert_eq!(names, vec!["AppList", "Foo", "NotFound"]);
        assert!(registry.catch_all().is_catch_all());
        assert_eq!(registry.kind("Foo").unwrap().table_index(), Some(1));
        assert_eq!(registry.catch_all().table_index(), None);
    }

    #[test]
    fn test_registry_rejects_duplicates() {
        let err = Registry::new(["Foo", "Foo"], "NotFound").unwrap_err();
        assert_eq!(
            err,
            RouteError::DuplicateKind {
                kind: "Foo".to_string()
            }
        );
    }

    #[test]
    fn test_registry_rejects_catch_all_collision() {
        let err = Registry::new(["Foo", "NotFound"], "NotFound").unwrap_err();
        assert!(matches!(err, RouteError::CatchAllCollision { .. }));
    }

    #[test]
    fn test_construct_unknown_kind() {
        let err = registry().construct("Bar", RoutePayload::new()).unwrap_err();
        assert_eq!(
            err,
            RouteError::UnknownKind {
                kind: "Bar".to_string()
            }
        );
    }

    #[test]
    fn test_kind_constructor_keeps_payload() {
        let registry = registry();
        let route = registry
            .kind("Foo")
            .unwrap()
            .route(RoutePayload::new().with_param("name", "bar").with_query("q", "1"));
        assert!(route.is("Foo"));
        assert_eq!(route.param("name"), Some("bar"));
        assert_eq!(route.query("q"), Some("1"));

        let payload = route.into_payload();
        assert_eq!(payload.route_params.get("name").map(String::as_str), Some("bar"));
        assert_eq!(payload.query_params.get("q").map(String::as_str), Some("1"));
    }

    #[test]
    fn test_dispatch_runs_matching_arm() {
        let registry = registry();
        let route = registry
            .construct("Foo", RoutePayload::new().with_param("name", "bar"))
            .unwrap();
        let result = registry
            .dispatch(
                &route,
                Handlers::new()
                    .on("Foo", |payload| payload.route_params["name"].clone())
                    .on("NotFound", |_| "nope".to_string()),
            )
            .unwrap();
        assert_eq!(result, "bar");
    }

    #[test]
    fn test_dispatch_fallback() {
        let registry = registry();
        let route = registry.construct("AppList", RoutePayload::new()).unwrap();
        let result = registry
            .dispatch(
                &route,
                Handlers::new()
                    .on("Foo", |_| "foo".to_string())
                    .otherwise(|route| format!("other:{}", route.kind())),
            )
            .unwrap();
        assert_eq!(result, "other:AppList");
    }

    #[test]
    fn test_dispatch_unhandled() {
        let registry = registry();
        let route = registry.construct("AppList", RoutePayload::new()).unwrap();
        let err = registry
            .dispatch(&route, Handlers::new().on("Foo", |_| ()))
            .unwrap_err();
        assert_eq!(
            err,
            RouteError::UnhandledRouteKind {
                kind: "AppList".to_string()
            }
        );
    }

    #[test]
    fn test_dispatch_rejects_unknown_handler_names() {
        let registry = registry();
        let route = registry.construct("Foo", RoutePayload::new()).unwrap();
        let handlers = Handlers::new().on("Foo", |_| ()).on("Typo", |_| ());
        assert!(matches!(
            registry.dispatch(&route, handlers),
            Err(RouteError::UnknownKind { .. })
        ));

        let lenient = registry.clone().with_validation(false);
        let handlers = Handlers::new().on("Foo", |_| ()).on("Typo", |_| ());
        assert!(lenient.dispatch(&route, handlers).is_ok());
    }

    #[test]
    fn test_dispatch_rejects_foreign_route() {
        let other = Registry::new(["Elsewhere"], "Missing").unwrap();
        let route = other.construct("Elsewhere", RoutePayload::new()).unwrap();
        let result = registry().dispatch(&route, Handlers::new().otherwise(|_| ()));
        assert!(matches!(result, Err(RouteError::UnknownKind { .. })));
    }

    #[test]
    fn test_dispatch_handler_borrows_environment() {
        let registry = registry();
        let route = registry.construct("Foo", RoutePayload::new()).unwrap();
        let mut hits = Vec::new();
        registry
            .dispatch(&route, Handlers::new().on("Foo", |_| hits.push("foo")))
            .unwrap();
        assert_eq!(hits, vec!["foo"]);
    }
}
