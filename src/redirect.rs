//! List view redirect resolution
//!
//! After a delete (or any action that ends on the list view) the controller
//! needs the canonical URI of its list. Controllers may or may not register
//! named routes, so the lookup walks an ordered set of candidates and always
//! ends with a direct path built from the module slug.

use crate::error::{CrudError, CrudResult};
use crate::flash::{Flash, FlashKey};
use crate::identity::ControllerIdentity;
use crate::routes::RouteTable;
use bytes::Bytes;
use http::header::{HeaderValue, LOCATION};
use http::{Method, Response, StatusCode};

/// Join a base URL and a path with exactly one slash
///
/// # Examples
///
/// ```
/// use reinhardt_crud::redirect::base_url;
///
/// assert_eq!(base_url("/", "countries"), "/countries");
/// assert_eq!(base_url("https://example.com/admin/", "/countries"), "https://example.com/admin/countries");
/// assert_eq!(base_url("", "countries/add/"), "/countries/add/");
/// ```
pub fn base_url(base: &str, path: &str) -> String {
	format!(
		"{}/{}",
		base.trim_end_matches('/'),
		path.trim_start_matches('/')
	)
}

/// Resolve the list view URI of a controller
///
/// First match wins:
///
/// 1. the explicit index route, resolved by name
/// 2. a named route whose name equals the module slug
/// 3. the GET route bound to `<TypeName>::index`
/// 4. `base_url(module_slug)`
///
/// The route table is only read.
pub fn resolve_list_view_uri(
	identity: &ControllerIdentity,
	explicit_index_route: Option<&str>,
	routes: &dyn RouteTable,
	base: &str,
) -> String {
	if let Some(route) = explicit_index_route.filter(|route| !route.is_empty()) {
		match routes.reverse(route) {
			Some(path) => return base_url(base, &path),
			None => tracing::warn!(
				route,
				module = %identity.module_slug,
				"index route is not registered, falling back"
			),
		}
	}

	if let Some(path) = routes.reverse(&identity.module_slug) {
		return base_url(base, &path);
	}

	if let Some(path) = routes.reverse_handler(&Method::GET, &identity.index_handler()) {
		return base_url(base, &path);
	}

	base_url(base, &identity.module_slug)
}

/// A redirect carrying an optional flash message
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Redirect {
	location: String,
	flash: Option<Flash>,
}

impl Redirect {
	/// Redirect to `location`
	pub fn to(location: impl Into<String>) -> Self {
		Self {
			location: location.into(),
			flash: None,
		}
	}

	/// Attach a flash message
	pub fn with(mut self, key: FlashKey, message: impl Into<String>) -> Self {
		self.flash = Some((key, message.into()));
		self
	}

	/// Target URI
	pub fn location(&self) -> &str {
		&self.location
	}

	/// Attached flash message
	pub fn flash(&self) -> Option<&Flash> {
		self.flash.as_ref()
	}

	/// Attached flash message for a specific key
	pub fn flash_message(&self, key: FlashKey) -> Option<&str> {
		self.flash
			.as_ref()
			.filter(|(flash_key, _)| *flash_key == key)
			.map(|(_, message)| message.as_str())
	}

	/// Build a `302 Found` response
	///
	/// # Errors
	///
	/// Returns [`CrudError::Configuration`] if the location is not a valid
	/// header value, which only happens with a malformed base URL.
	pub fn into_response(self) -> CrudResult<Response<Bytes>> {
		let location = HeaderValue::from_str(&self.location).map_err(|e| {
			CrudError::Configuration(format!("invalid redirect location '{}': {}", self.location, e))
		})?;

		let mut response = Response::new(Bytes::new());
		*response.status_mut() = StatusCode::FOUND;
		response.headers_mut().insert(LOCATION, location);
		Ok(response)
	}
}

#[cfg(test)]
mod tests {
	use super::*;
	use crate::identity::ControllerConfig;
	use crate::routes::RouteRegistry;
	use rstest::{fixture, rstest};

	#[fixture]
	fn identity() -> ControllerIdentity {
		ControllerIdentity::resolve(&ControllerConfig::new("Countries", "Country", "countries"))
			.unwrap()
	}

	fn all_candidates() -> RouteRegistry {
		RouteRegistry::new()
			.register_path("country-index", "geo/country-list")
			.register_path("countries", "geo/countries-by-name")
			.route(Method::GET, "geo/countries-by-handler", "Countries::index", None)
	}

	#[rstest]
	fn test_explicit_route_wins(identity: ControllerIdentity) {
		let uri = resolve_list_view_uri(&identity, Some("country-index"), &all_candidates(), "/");
		assert_eq!(uri, "/geo/country-list");
	}

	#[rstest]
	fn test_slug_named_route_before_handler(identity: ControllerIdentity) {
		let uri = resolve_list_view_uri(&identity, None, &all_candidates(), "/admin");
		assert_eq!(uri, "/admin/geo/countries-by-name");
	}

	#[rstest]
	fn test_missing_explicit_route_falls_through(identity: ControllerIdentity) {
		let routes =
			RouteRegistry::new().route(Method::GET, "geo/all", "Countries::index", None);
		let uri = resolve_list_view_uri(&identity, Some("nope"), &routes, "/");
		assert_eq!(uri, "/geo/all");
	}

	#[rstest]
	fn test_post_bound_index_is_ignored(identity: ControllerIdentity) {
		let routes =
			RouteRegistry::new().route(Method::POST, "geo/all", "Countries::index", None);
		let uri = resolve_list_view_uri(&identity, None, &routes, "https://example.com/");
		assert_eq!(uri, "https://example.com/countries");
	}

	#[test]
	fn test_redirect_response() {
		let redirect = Redirect::to("/countries").with(FlashKey::SuccessMessage, "done");
		assert_eq!(redirect.flash_message(FlashKey::SuccessMessage), Some("done"));
		assert_eq!(redirect.flash_message(FlashKey::ErrorMessage), None);

		let response = redirect.into_response().unwrap();
		assert_eq!(response.status(), StatusCode::FOUND);
		assert_eq!(response.headers()[LOCATION], "/countries");
	}

	#[test]
	fn test_invalid_location_is_configuration_error() {
		let err = Redirect::to("/bad\nlocation").into_response().unwrap_err();
		assert!(matches!(err, CrudError::Configuration(_)));
	}
}
