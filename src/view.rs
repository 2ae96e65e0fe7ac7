//! View data and rendering
//!
//! [`ViewData`] is the ordered key-value mapping handed to templates. It is
//! built up during controller initialization and action logic. Defaults are
//! merged with set-if-absent semantics so values placed by the caller or the
//! concrete controller always win.

use crate::error::{CrudError, CrudResult};
use bytes::Bytes;
use http::header::{CONTENT_TYPE, HeaderValue};
use http::{Response, StatusCode};
use indexmap::IndexMap;
use serde::Serialize;
use serde_json::Value;

/// Keys every view can rely on
pub const REQUIRED_KEYS: [&str; 5] = [
	"pageTitle",
	"errorMessage",
	"successMessage",
	"currentModule",
	"viewPath",
];

/// Ordered mapping from key to arbitrary value
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
#[serde(transparent)]
pub struct ViewData {
	values: IndexMap<String, Value>,
}

impl ViewData {
	/// Create empty view data
	pub fn new() -> Self {
		Self::default()
	}

	/// Set a value, replacing any previous one
	///
	/// # Examples
	///
	/// ```
	/// use reinhardt_crud::view::ViewData;
	///
	/// let mut data = ViewData::new();
	/// data.insert("pageTitle", "Countries");
	/// assert_eq!(data.get_str("pageTitle"), Some("Countries"));
	/// ```
	pub fn insert(&mut self, key: impl Into<String>, value: impl Into<Value>) {
		self.values.insert(key.into(), value.into());
	}

	/// Set a value only if the key is not present yet
	///
	/// Returns whether the value was stored.
	///
	/// # Examples
	///
	/// ```
	/// use reinhardt_crud::view::ViewData;
	///
	/// let mut data = ViewData::new();
	/// data.insert("boxTitle", "Custom");
	/// assert!(!data.set_if_absent("boxTitle", "Default"));
	/// assert_eq!(data.get_str("boxTitle"), Some("Custom"));
	/// ```
	pub fn set_if_absent(&mut self, key: impl Into<String>, value: impl Into<Value>) -> bool {
		let key = key.into();
		if self.values.contains_key(&key) {
			return false;
		}
		self.values.insert(key, value.into());
		true
	}

	/// Set a value if the key is missing, `null`, or an empty string
	///
	/// Titles use this so that a blank placeholder does not suppress the default.
	pub fn set_if_blank(&mut self, key: impl Into<String>, value: impl Into<Value>) -> bool {
		let key = key.into();
		if !self.is_blank(&key) {
			return false;
		}
		self.values.insert(key, value.into());
		true
	}

	/// Merge `defaults` without overwriting existing keys
	pub fn merge_defaults(&mut self, defaults: ViewData) {
		for (key, value) in defaults.values {
			self.values.entry(key).or_insert(value);
		}
	}

	/// Get a value
	pub fn get(&self, key: &str) -> Option<&Value> {
		self.values.get(key)
	}

	/// Get a string value
	pub fn get_str(&self, key: &str) -> Option<&str> {
		self.values.get(key).and_then(Value::as_str)
	}

	/// Remove a value
	pub fn remove(&mut self, key: &str) -> Option<Value> {
		self.values.shift_remove(key)
	}

	/// Check if a key is present
	pub fn contains_key(&self, key: &str) -> bool {
		self.values.contains_key(key)
	}

	/// Whether a key is missing, `null`, or an empty string
	pub fn is_blank(&self, key: &str) -> bool {
		match self.values.get(key) {
			None | Some(Value::Null) => true,
			Some(Value::String(s)) => s.is_empty(),
			Some(_) => false,
		}
	}

	/// Keys in insertion order
	pub fn keys(&self) -> impl Iterator<Item = &str> {
		self.values.keys().map(String::as_str)
	}

	/// Number of entries
	pub fn len(&self) -> usize {
		self.values.len()
	}

	/// Whether there are no entries
	pub fn is_empty(&self) -> bool {
		self.values.is_empty()
	}

	/// Required keys that are not present
	pub fn missing_required_keys(&self) -> Vec<&'static str> {
		REQUIRED_KEYS
			.into_iter()
			.filter(|key| !self.values.contains_key(*key))
			.collect()
	}

	/// Serialize into a JSON object
	pub fn to_value(&self) -> Value {
		Value::Object(
			self.values
				.iter()
				.map(|(k, v)| (k.clone(), v.clone()))
				.collect(),
		)
	}
}

/// Template rendering seam
pub trait ViewRenderer: Send + Sync {
	/// Render `view_path` with `data` into a response body
	fn render(&self, view_path: &str, data: &ViewData) -> CrudResult<String>;
}

/// Wrap an HTML body in a 200 response
///
/// # Examples
///
/// ```
/// use reinhardt_crud::view::html_response;
///
/// let response = html_response("<h1>Countries</h1>".to_string());
/// assert_eq!(response.status(), http::StatusCode::OK);
/// assert_eq!(response.headers()["content-type"], "text/html; charset=utf-8");
/// ```
pub fn html_response(body: String) -> Response<Bytes> {
	let mut response = Response::new(Bytes::from(body));
	*response.status_mut() = StatusCode::OK;
	response.headers_mut().insert(
		CONTENT_TYPE,
		HeaderValue::from_static("text/html; charset=utf-8"),
	);
	response
}

/// Ensure the keys every view relies on are present
pub(crate) fn check_required_keys(view_path: &str, data: &ViewData) -> CrudResult<()> {
	let missing = data.missing_required_keys();
	if missing.is_empty() {
		return Ok(());
	}
	Err(CrudError::Configuration(format!(
		"view '{}' rendered without required keys: {}",
		view_path,
		missing.join(", ")
	)))
}

#[cfg(feature = "templates")]
pub use self::tera_renderer::TeraRenderer;

#[cfg(feature = "templates")]
mod tera_renderer {
	use super::{ViewData, ViewRenderer};
	use crate::error::{CrudError, CrudResult};
	use tera::{Context, Tera};

	/// [`ViewRenderer`] backed by Tera templates
	///
	/// A view path such as `geo/countries/viewCountryList` is looked up as the
	/// template `geo/countries/viewCountryList.html`.
	pub struct TeraRenderer {
		tera: Tera,
		extension: String,
	}

	impl TeraRenderer {
		/// Wrap a configured Tera instance
		pub fn new(tera: Tera) -> Self {
			Self {
				tera,
				extension: ".html".to_string(),
			}
		}

		/// Load every template matching a glob, e.g. `templates/**/*.html`
		pub fn from_glob(pattern: &str) -> CrudResult<Self> {
			let tera = Tera::new(pattern).map_err(|e| CrudError::Template(e.to_string()))?;
			Ok(Self::new(tera))
		}

		/// Change the template file extension (`""` to use view paths verbatim)
		pub fn with_extension(mut self, extension: impl Into<String>) -> Self {
			self.extension = extension.into();
			self
		}

		/// Template name for a view path
		pub fn template_name(&self, view_path: &str) -> String {
			format!("{}{}", view_path, self.extension)
		}
	}

	impl ViewRenderer for TeraRenderer {
		fn render(&self, view_path: &str, data: &ViewData) -> CrudResult<String> {
			let context =
				Context::from_serialize(data).map_err(|e| CrudError::Template(e.to_string()))?;
			self.tera
				.render(&self.template_name(view_path), &context)
				.map_err(|e| CrudError::Template(format!("{}: {:?}", view_path, e)))
		}
	}

	#[cfg(test)]
	mod tests {
		use super::*;

		#[test]
		fn test_renders_view_data() {
			let mut tera = Tera::default();
			tera.add_raw_template(
				"geo/viewCountryList.html",
				"{{ pageTitle }}{% for c in countryList %}|{{ c.name }}{% endfor %}",
			)
			.unwrap();
			let renderer = TeraRenderer::new(tera);

			let mut data = ViewData::new();
			data.insert("pageTitle", "Countries");
			data.insert(
				"countryList",
				serde_json::json!([{"name": "Germany"}, {"name": "Japan"}]),
			);

			let body = renderer.render("geo/viewCountryList", &data).unwrap();
			assert_eq!(body, "Countries|Germany|Japan");
		}

		#[test]
		fn test_missing_template_is_template_error() {
			let renderer = TeraRenderer::new(Tera::default());
			let err = renderer.render("nope", &ViewData::new()).unwrap_err();
			assert!(matches!(err, CrudError::Template(_)));
		}
	}
}

#[cfg(test)]
mod tests {
	use super::*;
	use serde_json::json;

	#[test]
	fn test_insertion_order_is_preserved() {
		let mut data = ViewData::new();
		data.insert("b", 1);
		data.insert("a", 2);
		data.set_if_absent("c", 3);

		assert_eq!(data.keys().collect::<Vec<_>>(), vec!["b", "a", "c"]);
		assert_eq!(data.to_value(), json!({"b": 1, "a": 2, "c": 3}));
	}

	#[test]
	fn test_set_if_blank_replaces_placeholders() {
		let mut data = ViewData::new();
		data.insert("pageTitle", "");
		data.insert("boxTitle", Value::Null);
		data.insert("errorMessage", Value::Null);

		assert!(data.set_if_blank("pageTitle", "Countries"));
		assert!(data.set_if_blank("boxTitle", "Countries"));
		assert!(!data.set_if_absent("errorMessage", "x"));
		assert_eq!(data.get_str("pageTitle"), Some("Countries"));
		assert_eq!(data.get("errorMessage"), Some(&Value::Null));
	}

	#[test]
	fn test_merge_defaults_keeps_caller_values() {
		let mut data = ViewData::new();
		data.insert("action", "archive");

		let mut defaults = ViewData::new();
		defaults.insert("action", "edit");
		defaults.insert("usingSelect2", true);
		data.merge_defaults(defaults);

		assert_eq!(data.get_str("action"), Some("archive"));
		assert_eq!(data.get("usingSelect2"), Some(&Value::Bool(true)));
	}

	#[test]
	fn test_required_keys_check() {
		let mut data = ViewData::new();
		for key in REQUIRED_KEYS {
			data.insert(key, Value::Null);
		}
		assert!(check_required_keys("v", &data).is_ok());

		data.remove("viewPath");
		let err = check_required_keys("v", &data).unwrap_err();
		assert!(err.to_string().contains("viewPath"));
	}
}
