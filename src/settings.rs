//! CRUD controller settings
//!
//! ```toml
//! app_name = "Geo Admin"
//! base_url = "https://example.com/admin"
//! use_page_sub_title = true
//! soft_delete_field = "deleted"
//! ```

use crate::error::{CrudError, CrudResult};
use serde::{Deserialize, Serialize};
use std::path::Path;

/// Application-wide settings shared by every CRUD controller
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct CrudSettings {
	/// Application name shown after page titles
	pub app_name: String,

	/// Prefix for every generated URI
	pub base_url: String,

	/// Whether `pageSubTitle` is added to view data
	pub use_page_sub_title: bool,

	/// Column flagged by soft deletes
	pub soft_delete_field: String,
}

impl Default for CrudSettings {
	fn default() -> Self {
		Self {
			app_name: "Admin".to_string(),
			base_url: "/".to_string(),
			use_page_sub_title: true,
			soft_delete_field: "deleted".to_string(),
		}
	}
}

impl CrudSettings {
	/// Set the base URL
	pub fn with_base_url(mut self, base_url: impl Into<String>) -> Self {
		self.base_url = base_url.into();
		self
	}

	/// Set the application name
	pub fn with_app_name(mut self, app_name: impl Into<String>) -> Self {
		self.app_name = app_name.into();
		self
	}

	/// Load settings from a TOML file.
	///
	/// # Errors
	///
	/// Returns error if file cannot be read or parsed.
	pub fn from_file(path: impl AsRef<Path>) -> CrudResult<Self> {
		let content = std::fs::read_to_string(path.as_ref()).map_err(|e| {
			CrudError::Settings(format!("cannot read {}: {}", path.as_ref().display(), e))
		})?;

		Self::from_toml(&content)
	}

	/// Parse settings from a TOML string.
	pub fn from_toml(content: &str) -> CrudResult<Self> {
		let settings: Self =
			toml::from_str(content).map_err(|e| CrudError::Settings(e.to_string()))?;
		settings.validate()?;
		Ok(settings)
	}

	fn validate(&self) -> CrudResult<()> {
		if self.soft_delete_field.trim().is_empty() {
			return Err(CrudError::Settings(
				"soft_delete_field must not be empty".to_string(),
			));
		}
		Ok(())
	}
}
