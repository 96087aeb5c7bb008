//! # Rusty Routes
//!
//! Bidirectional URL routing for applications with a fixed table of named
//! route patterns:
//! - URL → route: `route_for_url("/foo/bar?x=1")` yields a route value tagged
//!   with its kind (`Foo`) and carrying the extracted parameters
//! - route → URL: `url_for_route(&route)` fills the kind's pattern back in
//!   and appends the query string
//!
//! ## Route Table
//!
//! Each kind maps to a path pattern:
//! - Static segments (`/about`)
//! - Required parameters (`/users/:id`)
//! - Optional parameters (`/posts/:id?`)
//! - Custom sub-patterns (`/users/:id(\d+)`)
//! - One wildcard capture (`/docs/(.*)`), surfaced as `route_splat`
//!
//! Patterns are tried in declaration order; the first match wins. URLs that
//! match nothing become the designated catch-all kind carrying the raw path.
//! Pass the table as an ordered collection (array, `Vec`, `IndexMap`) since
//! the order decides ambiguous matches.
//!
//! ## Example
//!
//! ```
//! use rusty_routes::{create_routes, RoutePayload, RouterOptions};
//!
//! let routes = create_routes(
//!     [("AppList", "/"), ("Foo", "/foo/:name/:value")],
//!     "NotFound",
//!     RouterOptions::default(),
//! )
//! .unwrap();
//!
//! let route = routes.route_for_url("/foo/bar/baz?page=2");
//! assert!(route.is("Foo"));
//! assert_eq!(route.param("value"), Some("baz"));
//!
//! let route = routes
//!     .construct("Foo", RoutePayload::new().with_param("name", "a").with_param("value", "b"))
//!     .unwrap();
//! assert_eq!(routes.url_for_route(&route).unwrap(), "/foo/a/b");
//! ```
//!
//! ## Validation
//!
//! Outside [`Profile::Production`], URL generation checks up front that every
//! required parameter is present and that catch-all routes carry a path.
//! The profile is chosen once through [`RouterOptions`].

// ============================================================================
// Module Declarations
// ============================================================================

pub mod config;
mod error;
pub mod kind;
pub mod pattern;
pub mod query;
mod router;

pub use config::{Profile, RouteEntry, RouterOptions, RoutesConfig};
pub use error::{Result, RouteError};
pub use kind::{Handlers, Kind, Registry, Route, RouteParams, RoutePayload};
pub use pattern::{ParamEncoder, ParamKey, PatternCompiler, RegexCompiler};
pub use query::QueryParams;
pub use router::Routes;

/// Compiles a route table with the default pattern syntax
///
/// `table` yields `(kind, pattern)` pairs in declaration order; `catch_all`
/// names the kind used for unmatched URLs and must not appear in the table.
///
/// # Errors
///
/// `DuplicateKind`, `CatchAllCollision` or `InvalidPattern`.
pub fn create_routes<I, K, P>(
    table: I,
    catch_all: impl Into<String>,
    options: RouterOptions,
) -> Result<Routes>
where
    I: IntoIterator<Item = (K, P)>,
    K: Into<String>,
    P: Into<String>,
{
    create_routes_with(&RegexCompiler, table, catch_all, options)
}

/// Same as [`create_routes`], with an injected [`PatternCompiler`]
pub fn create_routes_with<I, K, P>(
    compiler: &dyn PatternCompiler,
    table: I,
    catch_all: impl Into<String>,
    options: RouterOptions,
) -> Result<Routes>
where
    I: IntoIterator<Item = (K, P)>,
    K: Into<String>,
    P: Into<String>,
{
    let table = table
        .into_iter()
        .map(|(kind, pattern)| (kind.into(), pattern.into()))
        .collect();
    Routes::compile(compiler, table, catch_all.into(), options)
}
