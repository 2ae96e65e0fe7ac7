//! Route metadata lookup
//!
//! Controllers only read route metadata to find their list view. The host
//! framework owns the real router; [`RouteRegistry`] is a plain table that can
//! be filled from it (or by hand in tests).

use http::Method;
use std::collections::HashMap;

/// A route bound to a handler for one HTTP method
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RouteBinding {
	/// URI pattern, e.g. `countries/` or `countries/{id}/edit`
	pub pattern: String,
	/// Handler in `Type::method` form
	pub handler: String,
	/// Route name, if the route was registered with one
	pub name: Option<String>,
}

/// Read-only route metadata
pub trait RouteTable: Send + Sync {
	/// Resolve a named route to its URI path
	///
	/// Returns `None` when the name is unknown or the pattern needs parameters.
	fn reverse(&self, name: &str) -> Option<String>;

	/// Resolve a handler (`Type::method`) to the URI path of its route
	fn reverse_handler(&self, method: &Method, handler: &str) -> Option<String> {
		self.bindings(method)
			.into_iter()
			.find(|binding| binding.handler == handler)
			.and_then(|binding| static_path(&binding.pattern))
	}

	/// Check if a route name is registered
	fn has_route(&self, name: &str) -> bool {
		self.reverse(name).is_some()
	}

	/// Every route bound for `method`
	fn bindings(&self, method: &Method) -> Vec<RouteBinding>;
}

/// Normalize a parameterless pattern into an absolute path
///
/// Patterns with `{param}` or regex `(...)` segments cannot be reversed
/// without arguments.
///
/// # Examples
///
/// ```
/// use reinhardt_crud::routes::static_path;
///
/// assert_eq!(static_path("countries"), Some("/countries".to_string()));
/// assert_eq!(static_path("/countries/"), Some("/countries/".to_string()));
/// assert_eq!(static_path("countries/{id}"), None);
/// ```
pub fn static_path(pattern: &str) -> Option<String> {
	if pattern.contains(['{', '(']) {
		return None;
	}
	if pattern.starts_with('/') {
		Some(pattern.to_string())
	} else {
		Some(format!("/{}", pattern))
	}
}

/// In-memory route table
#[derive(Debug, Clone, Default)]
pub struct RouteRegistry {
	named: HashMap<String, String>,
	bindings: HashMap<Method, Vec<RouteBinding>>,
}

impl RouteRegistry {
	/// Create an empty registry
	pub fn new() -> Self {
		Self::default()
	}

	/// Bind `pattern` to `handler` for `method`
	///
	/// # Examples
	///
	/// ```
	/// use http::Method;
	/// use reinhardt_crud::routes::{RouteRegistry, RouteTable};
	///
	/// let routes = RouteRegistry::new()
	///     .route(Method::GET, "countries", "Countries::index", Some("country-list"));
	///
	/// assert_eq!(routes.reverse("country-list"), Some("/countries".to_string()));
	/// assert_eq!(
	///     routes.reverse_handler(&Method::GET, "Countries::index"),
	///     Some("/countries".to_string())
	/// );
	/// ```
	pub fn route(
		mut self,
		method: Method,
		pattern: &str,
		handler: &str,
		name: Option<&str>,
	) -> Self {
		if let Some(name) = name {
			self.named.insert(name.to_string(), pattern.to_string());
		}
		self.bindings.entry(method).or_default().push(RouteBinding {
			pattern: pattern.to_string(),
			handler: handler.to_string(),
			name: name.map(str::to_string),
		});
		self
	}

	/// Register a name-to-path mapping without a handler binding
	pub fn register_path(mut self, name: &str, pattern: &str) -> Self {
		self.named.insert(name.to_string(), pattern.to_string());
		self
	}

	/// Get all registered route names
	pub fn route_names(&self) -> Vec<String> {
		self.named.keys().cloned().collect()
	}
}

impl RouteTable for RouteRegistry {
	fn reverse(&self, name: &str) -> Option<String> {
		self.named.get(name).and_then(|pattern| static_path(pattern))
	}

	fn bindings(&self, method: &Method) -> Vec<RouteBinding> {
		self.bindings.get(method).cloned().unwrap_or_default()
	}
}
