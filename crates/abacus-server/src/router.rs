//! Request routing.
//!
//! The router maps an incoming method and path to an operation ID. Paths are
//! compared segment by segment, so a trailing slash never changes the match
//! (`/calculate/` resolves like `/calculate`).
//!
//! # Example
//!
//! ```rust
//! use abacus_server::{RouteResolution, Router};
//! use http::Method;
//!
//! let mut router = Router::new();
//! router.add_route(Method::POST, "/calculate", "calculate");
//!
//! let resolution = router.resolve(&Method::POST, "/calculate/");
//! assert!(matches!(resolution, RouteResolution::Matched(ref m) if m.operation_id() == "calculate"));
//!
//! let resolution = router.resolve(&Method::GET, "/calculate");
//! assert!(matches!(resolution, RouteResolution::MethodNotAllowed(_)));
//! ```

use http::Method;

/// A matched route.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RouteMatch {
    operation_id: String,
    pattern: String,
}

impl RouteMatch {
    /// Returns the operation ID for this route.
    #[must_use]
    pub fn operation_id(&self) -> &str {
        &self.operation_id
    }

    /// Returns the registered path pattern.
    #[must_use]
    pub fn pattern(&self) -> &str {
        &self.pattern
    }
}

/// Outcome of resolving a request against the router.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RouteResolution {
    /// A route matched both path and method.
    Matched(RouteMatch),
    /// The path is known but not for this method. Holds the allowed methods.
    MethodNotAllowed(Vec<Method>),
    /// No route has this path.
    NotFound,
}

#[derive(Debug, Clone)]
struct Route {
    method: Method,
    segments: Vec<String>,
    operation_id: String,
    pattern: String,
}

impl Route {
    fn new(method: Method, pattern: &str, operation_id: impl Into<String>) -> Self {
        Self {
            method,
            segments: split_segments(pattern).map(str::to_string).collect(),
            operation_id: operation_id.into(),
            pattern: normalize_path(pattern).to_string(),
        }
    }

    fn matches_path(&self, path: &str) -> bool {
        let mut actual = split_segments(path);
        for expected in &self.segments {
            if actual.next() != Some(expected.as_str()) {
                return false;
            }
        }
        actual.next().is_none()
    }
}

fn split_segments(path: &str) -> impl Iterator<Item = &str> {
    path.split('/').filter(|s| !s.is_empty())
}

/// Strips trailing slashes from `path`, leaving `/` itself intact.
#[must_use]
pub fn normalize_path(path: &str) -> &str {
    let trimmed = path.trim_end_matches('/');
    if trimmed.is_empty() {
        "/"
    } else {
        trimmed
    }
}

/// HTTP request router.
///
/// Routes are checked in registration order; the first match wins.
#[derive(Debug, Clone, Default)]
pub struct Router {
    routes: Vec<Route>,
}

impl Router {
    /// Creates a new empty router.
    #[must_use]
    pub fn new() -> Self {
        Self { routes: Vec::new() }
    }

    /// Adds a route to the router.
    ///
    /// ```rust
    /// use abacus_server::Router;
    /// use http::Method;
    ///
    /// let mut router = Router::new();
    /// router.add_route(Method::GET, "/", "serviceInfo");
    /// assert_eq!(router.route_count(), 1);
    /// ```
    pub fn add_route(
        &mut self,
        method: Method,
        pattern: impl AsRef<str>,
        operation_id: impl Into<String>,
    ) {
        self.routes
            .push(Route::new(method, pattern.as_ref(), operation_id));
    }

    /// Returns the number of registered routes.
    #[must_use]
    pub fn route_count(&self) -> usize {
        self.routes.len()
    }

    /// Matches an incoming request to a route.
    #[must_use]
    pub fn match_route(&self, method: &Method, path: &str) -> Option<RouteMatch> {
        self.routes
            .iter()
            .find(|route| route.method == *method && route.matches_path(path))
            .map(|route| RouteMatch {
                operation_id: route.operation_id.clone(),
                pattern: route.pattern.clone(),
            })
    }

    /// Returns the methods registered for `path`, in registration order.
    #[must_use]
    pub fn allowed_methods(&self, path: &str) -> Vec<Method> {
        let mut methods: Vec<Method> = Vec::new();
        for route in self.routes.iter().filter(|r| r.matches_path(path)) {
            if !methods.contains(&route.method) {
                methods.push(route.method.clone());
            }
        }
        methods
    }

    /// Resolves a request into a match, a method mismatch, or a miss.
    #[must_use]
    pub fn resolve(&self, method: &Method, path: &str) -> RouteResolution {
        if let Some(route_match) = self.match_route(method, path) {
            return RouteResolution::Matched(route_match);
        }

        let allowed = self.allowed_methods(path);
        if allowed.is_empty() {
            RouteResolution::NotFound
        } else {
            RouteResolution::MethodNotAllowed(allowed)
        }
    }

    /// Checks if a specific operation ID is registered.
    #[must_use]
    pub fn has_operation(&self, operation_id: &str) -> bool {
        self.routes.iter().any(|r| r.operation_id == operation_id)
    }

    /// Returns the distinct registered paths in registration order.
    ///
    /// ```rust
    /// use abacus_server::Router;
    /// use http::Method;
    ///
    /// let mut router = Router::new();
    /// router.add_route(Method::GET, "/", "serviceInfo");
    /// router.add_route(Method::POST, "/calculate", "calculate");
    /// router.add_route(Method::GET, "/health", "health");
    ///
    /// assert_eq!(router.paths(), vec!["/", "/calculate", "/health"]);
    /// ```
    #[must_use]
    pub fn paths(&self) -> Vec<&str> {
        let mut paths: Vec<&str> = Vec::new();
        for route in &self.routes {
            if !paths.contains(&route.pattern.as_str()) {
                paths.push(&route.pattern);
            }
        }
        paths
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn calculator_router() -> Router {
        let mut router = Router::new();
        router.add_route(Method::GET, "/", "serviceInfo");
        router.add_route(Method::POST, "/calculate", "calculate");
        router.add_route(Method::GET, "/health", "health");
        router
    }

    #[test]
    fn test_router_new() {
        let router = Router::new();
        assert_eq!(router.route_count(), 0);
        assert!(router.paths().is_empty());
    }

    #[test]
    fn test_router_match_simple_path() {
        let router = calculator_router();

        let m = router.match_route(&Method::POST, "/calculate").unwrap();
        assert_eq!(m.operation_id(), "calculate");
        assert_eq!(m.pattern(), "/calculate");
    }

    #[test]
    fn test_router_match_root() {
        let router = calculator_router();

        let m = router.match_route(&Method::GET, "/").unwrap();
        assert_eq!(m.operation_id(), "serviceInfo");
        assert!(router.match_route(&Method::GET, "/calculate").is_none());
    }

    #[test]
    fn test_router_trailing_slash_ignored() {
        let router = calculator_router();

        let m = router.match_route(&Method::POST, "/calculate/").unwrap();
        assert_eq!(m.operation_id(), "calculate");
    }

    #[test]
    fn test_router_match_path_mismatch() {
        let router = calculator_router();
        assert!(router.match_route(&Method::GET, "/calculator").is_none());
        assert!(router.match_route(&Method::POST, "/calculate/extra").is_none());
    }

    #[test]
    fn test_router_resolve_not_found() {
        let router = calculator_router();
        assert_eq!(
            router.resolve(&Method::GET, "/nonexistent"),
            RouteResolution::NotFound
        );
    }

    #[test]
    fn test_router_resolve_method_not_allowed() {
        let mut router = calculator_router();
        router.add_route(Method::PUT, "/calculate", "replace");

        assert_eq!(
            router.resolve(&Method::GET, "/calculate"),
            RouteResolution::MethodNotAllowed(vec![Method::POST, Method::PUT])
        );
    }

    #[test]
    fn test_router_first_match_wins() {
        let mut router = Router::new();
        router.add_route(Method::GET, "/health", "first");
        router.add_route(Method::GET, "/health", "second");

        let m = router.match_route(&Method::GET, "/health").unwrap();
        assert_eq!(m.operation_id(), "first");
        assert_eq!(router.paths(), vec!["/health"]);
    }

    #[test]
    fn test_router_has_operation() {
        let router = calculator_router();
        assert!(router.has_operation("calculate"));
        assert!(!router.has_operation("divide"));
    }

    #[test]
    fn test_normalize_path() {
        assert_eq!(normalize_path("/"), "/");
        assert_eq!(normalize_path("//"), "/");
        assert_eq!(normalize_path("/health/"), "/health");
        assert_eq!(normalize_path("/health"), "/health");
    }
}
