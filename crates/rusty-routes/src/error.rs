/// Error types for route compilation, URL generation and dispatch
///
/// The decoder never fails (unmatched URLs fall back to the catch-all kind),
/// so every variant here is raised either while building the route table or
/// while turning a route value back into a URL.
use thiserror::Error;

/// Errors raised by the router
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum RouteError {
    /// A required (non-optional) parameter was not supplied for URL generation
    #[error("Route params must include \"{name}\"")]
    MissingRequiredParam { name: String },

    /// The catch-all kind was encoded without a non-empty `route_path`
    #[error("Catch-all route requires a \"routePath\" string")]
    MissingRoutePath,

    /// `Registry::dispatch` found no handler for the route's kind
    #[error("No handler registered for route kind \"{kind}\"")]
    UnhandledRouteKind { kind: String },

    /// A kind name that is not part of the registry
    #[error("Unknown route kind \"{kind}\"")]
    UnknownKind { kind: String },

    /// The route table declares the same kind more than once
    #[error("Route kind \"{kind}\" is declared more than once")]
    DuplicateKind { kind: String },

    /// The catch-all kind collides with a table kind
    #[error("Catch-all kind \"{kind}\" must not appear in the route table")]
    CatchAllCollision { kind: String },

    /// The pattern compiler rejected a pattern
    #[error("Invalid route pattern \"{pattern}\": {reason}")]
    InvalidPattern { pattern: String, reason: String },

    /// A generated segment does not satisfy its key's sub-pattern
    #[error("Expected \"{name}\" to match \"{pattern}\", but got \"{segment}\"")]
    PatternMismatch {
        name: String,
        pattern: String,
        segment: String,
    },
}

impl RouteError {
    pub(crate) fn invalid_pattern(pattern: &str, reason: impl Into<String>) -> Self {
        RouteError::InvalidPattern {
            pattern: pattern.to_string(),
            reason: reason.into(),
        }
    }
}

/// Result alias used throughout the crate
pub type Result<T, E = RouteError> = std::result::Result<T, E>;
