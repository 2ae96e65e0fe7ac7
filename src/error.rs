//! Error types for CRUD controllers

use crate::data::DbError;
use thiserror::Error;

/// CRUD controller error type
#[derive(Debug, Error)]
pub enum CrudError {
	/// Delete input could not be sanitized into a usable identifier
	#[error("Invalid identifier: {0}")]
	InvalidIdentifier(String),

	/// Record conversion or other non-backend data failure
	#[error("Data access error: {0}")]
	DataAccess(String),

	/// Statement rejected by the persistence backend
	#[error("Database error: {error}")]
	Database {
		/// Error reported by the backend
		error: DbError,
		/// Statement that failed, if it was built
		query: Option<String>,
	},

	/// Controller declaration cannot produce a valid identity or rule set
	#[error("Configuration error: {0}")]
	Configuration(String),

	/// Field present on the cast source but not assignable on the destination
	#[error("Field mismatch on '{field}': {reason}")]
	FieldMismatch {
		/// Offending field name
		field: String,
		/// Why the field could not be copied
		reason: String,
	},

	/// Template rendering error
	#[error("Template rendering error: {0}")]
	Template(String),

	/// Settings could not be read or parsed
	#[error("Settings error: {0}")]
	Settings(String),
}

impl CrudError {
	/// Stable code reported in [`DeleteResult::error_code`](crate::delete::DeleteResult)
	pub fn code(&self) -> &'static str {
		match self {
			CrudError::InvalidIdentifier(_) => "InvalidIdentifier",
			CrudError::DataAccess(_) | CrudError::Database { .. } => "DataAccessError",
			CrudError::Configuration(_) => "ConfigurationError",
			CrudError::FieldMismatch { .. } => "FieldMismatchError",
			CrudError::Template(_) => "TemplateError",
			CrudError::Settings(_) => "SettingsError",
		}
	}

	/// Statement that failed, for errors raised by the backend
	pub fn query(&self) -> Option<&str> {
		match self {
			CrudError::Database { query, .. } => query.as_deref(),
			_ => None,
		}
	}
}

impl From<serde_json::Error> for CrudError {
	fn from(err: serde_json::Error) -> Self {
		CrudError::DataAccess(format!("record conversion failed: {}", err))
	}
}

/// Result type for CRUD controller operations
pub type CrudResult<T> = Result<T, CrudError>;

#[cfg(test)]
mod tests {
	use super::*;

	#[test]
	fn test_error_codes_are_stable() {
		assert_eq!(
			CrudError::InvalidIdentifier("x".into()).code(),
			"InvalidIdentifier"
		);
		assert_eq!(CrudError::DataAccess("x".into()).code(), "DataAccessError");
		let database = CrudError::Database {
			error: DbError::new("2006", "server has gone away"),
			query: Some("SELECT * FROM countries".to_string()),
		};
		assert_eq!(database.code(), "DataAccessError");
		assert_eq!(database.query(), Some("SELECT * FROM countries"));
		assert_eq!(database.to_string(), "Database error: [2006] server has gone away");
		assert_eq!(
			CrudError::Configuration("x".into()).code(),
			"ConfigurationError"
		);
	}

	#[test]
	fn test_field_mismatch_display() {
		let err = CrudError::FieldMismatch {
			field: "iso_code".into(),
			reason: "no such field on destination".into(),
		};
		assert_eq!(
			err.to_string(),
			"Field mismatch on 'iso_code': no such field on destination"
		);
	}
}
