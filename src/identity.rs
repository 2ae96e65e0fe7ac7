//! Controller identity resolution
//!
//! Every concrete controller declares a static [`ControllerConfig`]. At the
//! start of a request it is resolved into a [`ControllerIdentity`], which
//! carries the module slug used for URIs and the names used for view data keys
//! and view files.

use crate::error::{CrudError, CrudResult};
use crate::naming::{CONTROLLER_SUFFIX, lower_camel_case, short_type_name, slugify, to_snake_case};
use serde::Serialize;

/// Static declaration of a controller's primary object
///
/// # Examples
///
/// ```
/// use reinhardt_crud::identity::{ControllerConfig, ControllerIdentity};
///
/// const COUNTRIES: ControllerConfig =
///     ControllerConfig::new("CountriesController", "Country", "countries")
///         .with_view_path("geo/countries/");
///
/// let identity = ControllerIdentity::resolve(&COUNTRIES).unwrap();
/// assert_eq!(identity.module_slug, "countries");
/// assert_eq!(identity.list_key(), "countryList");
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ControllerConfig {
	/// Controller type name, also the handler prefix in route bindings
	pub type_name: &'static str,
	/// Explicit module slug, overriding the one derived from `type_name`
	pub slug: Option<&'static str>,
	/// Singular noun of the primary object
	pub singular_name: &'static str,
	/// Plural noun of the primary object
	pub plural_name: &'static str,
	/// lowerCamelCase singular noun, derived from `singular_name` when unset
	pub singular_name_cc: Option<&'static str>,
	/// Directory prefix of the controller's views
	pub view_path: &'static str,
	/// Route name of the list view
	pub index_route: Option<&'static str>,
}

impl ControllerConfig {
	/// Declare a controller by type name and object nouns
	pub const fn new(
		type_name: &'static str,
		singular_name: &'static str,
		plural_name: &'static str,
	) -> Self {
		Self {
			type_name,
			slug: None,
			singular_name,
			plural_name,
			singular_name_cc: None,
			view_path: "",
			index_route: None,
		}
	}

	/// Override the module slug
	pub const fn with_slug(mut self, slug: &'static str) -> Self {
		self.slug = Some(slug);
		self
	}

	/// Set the views directory
	pub const fn with_view_path(mut self, view_path: &'static str) -> Self {
		self.view_path = view_path;
		self
	}

	/// Name the list view route
	pub const fn with_index_route(mut self, route: &'static str) -> Self {
		self.index_route = Some(route);
		self
	}

	/// Override the lowerCamelCase singular noun
	pub const fn with_singular_name_cc(mut self, name: &'static str) -> Self {
		self.singular_name_cc = Some(name);
		self
	}
}

/// Resolved identity of the controller handling the current request
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ControllerIdentity {
	/// Controller type name as declared
	pub type_name: String,
	/// Lowercase, URL-safe, non-empty module identifier
	pub module_slug: String,
	/// Singular noun of the primary object
	pub singular_name: String,
	/// Plural noun of the primary object
	pub plural_name: String,
	/// lowerCamelCase singular noun
	pub singular_name_cc: String,
	/// Directory prefix of the controller's views
	pub view_path: String,
	/// Route name of the list view
	pub index_route_name: Option<String>,
}

impl ControllerIdentity {
	/// Resolve a declaration into an identity
	pub fn resolve(config: &ControllerConfig) -> CrudResult<Self> {
		let module_slug = resolve_module_slug(config.type_name, config.slug)?;
		let singular_name_cc = config
			.singular_name_cc
			.filter(|name| !name.is_empty())
			.map(str::to_string)
			.unwrap_or_else(|| lower_camel_case(config.singular_name));

		tracing::debug!(
			module = %module_slug,
			controller = config.type_name,
			"resolved controller identity"
		);

		Ok(Self {
			type_name: config.type_name.to_string(),
			module_slug,
			singular_name: config.singular_name.to_string(),
			plural_name: config.plural_name.to_string(),
			singular_name_cc,
			view_path: config.view_path.to_string(),
			index_route_name: config
				.index_route
				.filter(|route| !route.is_empty())
				.map(str::to_string),
		})
	}

	/// View data key holding the fetched records, e.g. `countryList`
	pub fn list_key(&self) -> String {
		format!("{}List", self.singular_name_cc)
	}

	/// Handler of the list view in route bindings, e.g. `Countries::index`
	pub fn index_handler(&self) -> String {
		format!("{}::index", self.type_name)
	}
}

/// Derive the module slug for a controller
///
/// An explicit slug wins and is only lowercased. Otherwise the short type
/// name loses its `Controller` suffix and is converted to snake_case, then to
/// a hyphenated slug.
///
/// # Examples
///
/// ```
/// use reinhardt_crud::identity::resolve_module_slug;
///
/// assert_eq!(resolve_module_slug("CountryRegionsController", None).unwrap(), "country-regions");
/// assert_eq!(resolve_module_slug("app::Countries", None).unwrap(), "countries");
/// assert_eq!(resolve_module_slug("Countries", Some("Geo_Countries")).unwrap(), "geo_countries");
/// assert!(resolve_module_slug("", None).is_err());
/// ```
pub fn resolve_module_slug(type_name: &str, explicit_slug: Option<&str>) -> CrudResult<String> {
	if let Some(explicit) = explicit_slug.map(str::trim).filter(|s| !s.is_empty()) {
		let slug = explicit.to_lowercase();
		if !slug
			.chars()
			.all(|ch| ch.is_ascii_alphanumeric() || ch == '-' || ch == '_')
		{
			return Err(CrudError::Configuration(format!(
				"controller slug '{}' is not URL-safe",
				explicit
			)));
		}
		return Ok(slug);
	}

	let short_name = short_type_name(type_name.trim());
	if short_name.is_empty() {
		return Err(CrudError::Configuration(
			"controller has neither a type name nor an explicit slug".to_string(),
		));
	}

	let base_name = short_name
		.strip_suffix(CONTROLLER_SUFFIX)
		.unwrap_or(short_name);
	let slug = slugify(&to_snake_case(base_name));
	if slug.is_empty() {
		return Err(CrudError::Configuration(format!(
			"cannot derive a module slug from type name '{}'",
			type_name
		)));
	}
	Ok(slug)
}
