//! Safe, idempotent record deletion
//!
//! Deleting never raises to the HTTP layer. Bad identifiers and persistence
//! failures are folded into a [`DeleteResult`], which then picks the flash
//! message of the redirect back to the list view.

use crate::context::QueryLog;
use crate::data::{DataAccess, DbError, Identifier, MutationReport, Record};
use crate::error::{CrudError, CrudResult};
use crate::flash::{Flash, FlashKey};
use serde::Serialize;
use serde_json::Value;

/// Message recorded when an identifier cannot be sanitized
pub const INVALID_IDENTIFIER_MESSAGE: &str = "Invalid identifier provided to delete the object.";

/// Unsanitized delete input, as received from the request
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RawIdentifier {
	/// Path segment or form value
	Text(String),
	/// Already typed integer key
	Integer(i128),
}

impl From<&str> for RawIdentifier {
	fn from(value: &str) -> Self {
		RawIdentifier::Text(value.to_string())
	}
}

impl From<String> for RawIdentifier {
	fn from(value: String) -> Self {
		RawIdentifier::Text(value)
	}
}

impl From<i64> for RawIdentifier {
	fn from(value: i64) -> Self {
		RawIdentifier::Integer(i128::from(value))
	}
}

impl From<u64> for RawIdentifier {
	fn from(value: u64) -> Self {
		RawIdentifier::Integer(i128::from(value))
	}
}

impl From<i32> for RawIdentifier {
	fn from(value: i32) -> Self {
		RawIdentifier::Integer(i128::from(value))
	}
}

impl From<u32> for RawIdentifier {
	fn from(value: u32) -> Self {
		RawIdentifier::Integer(i128::from(value))
	}
}

/// Whether a string reads as a decimal number (`7`, ` -7 `, `7.5`, `1e3`)
fn is_numeric(value: &str) -> bool {
	let trimmed = value.trim();
	!trimmed.is_empty()
		&& trimmed
			.chars()
			.all(|c| c.is_ascii_digit() || matches!(c, '+' | '-' | '.' | 'e' | 'E'))
		&& trimmed.parse::<f64>().is_ok_and(f64::is_finite)
}

/// Sanitize a delete identifier
///
/// Numeric strings keep only their digits and sign characters, other strings
/// must be a single alphanumeric token, and integers are used directly. Empty
/// or zero results are rejected. Numeric keys span the signed and unsigned
/// 64-bit ranges; digit strings wider than 128 bits are rejected.
///
/// # Examples
///
/// ```
/// use reinhardt_crud::data::Identifier;
/// use reinhardt_crud::delete::{RawIdentifier, sanitize_identifier};
///
/// assert_eq!(sanitize_identifier(&"42".into()).unwrap(), Identifier::Integer(42));
/// assert_eq!(sanitize_identifier(&" DE ".into()).unwrap(), Identifier::Token("DE".into()));
/// assert!(sanitize_identifier(&"../etc".into()).is_err());
/// assert!(sanitize_identifier(&RawIdentifier::Integer(0)).is_err());
/// assert_eq!(
///     sanitize_identifier(&"18446744073709551615".into()).unwrap(),
///     Identifier::Integer(u64::MAX.into())
/// );
/// ```
pub fn sanitize_identifier(raw: &RawIdentifier) -> CrudResult<Identifier> {
	let invalid = |detail: String| CrudError::InvalidIdentifier(detail);

	match raw {
		RawIdentifier::Integer(0) => Err(invalid("identifier is zero".to_string())),
		RawIdentifier::Integer(id) => Ok(Identifier::Integer(*id)),
		RawIdentifier::Text(text) if is_numeric(text) => {
			let digits: String = text
				.chars()
				.filter(|c| c.is_ascii_digit() || matches!(c, '+' | '-'))
				.collect();
			match digits.parse::<i128>() {
				Ok(0) => Err(invalid(format!("identifier '{}' is zero", text))),
				Ok(id) => Ok(Identifier::Integer(id)),
				Err(_) => Err(invalid(format!("identifier '{}' is not an integer", text))),
			}
		}
		RawIdentifier::Text(text) => {
			let token = text.trim();
			if token.is_empty() {
				return Err(invalid("identifier is empty".to_string()));
			}
			if !token.chars().all(|c| c.is_ascii_alphanumeric()) {
				return Err(invalid(format!(
					"identifier '{}' is not alphanumeric",
					text.escape_debug()
				)));
			}
			Ok(Identifier::Token(token.to_string()))
		}
	}
}

/// Outcome of one delete attempt
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct DeleteResult {
	/// Whether at least one row was affected
	pub persisted: bool,
	/// Rows reported by the data-access layer
	pub affected_rows: u64,
	/// Error code, if the attempt failed
	pub error_code: Option<String>,
	/// Error message, if the attempt failed
	pub error_message: Option<String>,
}

impl DeleteResult {
	/// Result of a delete short-circuited by a bad identifier
	pub fn invalid_identifier() -> Self {
		Self {
			persisted: false,
			affected_rows: 0,
			error_code: Some(CrudError::InvalidIdentifier(String::new()).code().to_string()),
			error_message: Some(INVALID_IDENTIFIER_MESSAGE.to_string()),
		}
	}

	/// Build a result from an affected-row count and the backend error, if any
	pub fn new(affected_rows: u64, error: Option<DbError>) -> Self {
		let (error_code, error_message) = match error {
			Some(error) => (Some(error.code), Some(error.message)),
			None => (None, None),
		};
		Self {
			persisted: affected_rows > 0,
			affected_rows,
			error_code,
			error_message,
		}
	}

	/// Whether the identifier was rejected before any data access
	pub fn is_invalid_identifier(&self) -> bool {
		self.error_code.as_deref() == Some("InvalidIdentifier")
	}
}

/// Delete one record of the primary object
///
/// `permanent` removes the row; otherwise `soft_delete_field` is set to
/// `true`. The result is built from what this call reported, never from
/// state shared with other requests. Failures are logged and reported as zero
/// affected rows, and the executed statement is collected into `queries`
/// whether or not it succeeded.
pub async fn delete_record(
	data: &dyn DataAccess,
	id: &Identifier,
	permanent: bool,
	soft_delete_field: &str,
	object_name: &str,
	queries: &mut QueryLog,
) -> DeleteResult {
	let attempt: CrudResult<MutationReport> = if !permanent {
		let mut fields = Record::new();
		fields.insert(soft_delete_field.to_string(), Value::Bool(true));
		data.update(id, fields).await
	} else if id.is_numeric() {
		data.delete(id).await
	} else {
		let primary_key = data.primary_key_name().to_string();
		data.delete_where(&primary_key, &id.to_value()).await
	};

	match attempt {
		Ok(report) => {
			let affected_rows = report.affected_rows();
			queries.collect(report.query);
			DeleteResult::new(affected_rows, None)
		}
		Err(e) => {
			if let Some(query) = e.query() {
				queries.collect(query);
			}
			tracing::error!(
				object = object_name,
				id = %id,
				error = %e,
				"error deleting object"
			);

			let error = match e {
				CrudError::Database { error, .. } => error,
				other => DbError::new(other.code(), other.to_string()),
			};
			DeleteResult::new(0, Some(error))
		}
	}
}

/// Pick the flash message for a delete result
///
/// # Examples
///
/// ```
/// use reinhardt_crud::delete::{DeleteResult, deletion_flash};
/// use reinhardt_crud::flash::FlashKey;
///
/// let (key, message) = deletion_flash("Country", &DeleteResult::new(1, None));
/// assert_eq!(key, FlashKey::SuccessMessage);
/// assert_eq!(message, "The Country was successfully deleted.");
/// ```
pub fn deletion_flash(object_name: &str, result: &DeleteResult) -> Flash {
	if result.is_invalid_identifier() {
		return (
			FlashKey::ErrorMessage,
			INVALID_IDENTIFIER_MESSAGE.to_string(),
		);
	}
	if result.affected_rows < 1 {
		(
			FlashKey::ErrorMessage,
			format!(
				"No {} was deleted now, because it probably had already been deleted.",
				object_name
			),
		)
	} else {
		(
			FlashKey::SuccessMessage,
			format!("The {} was successfully deleted.", object_name),
		)
	}
}

#[cfg(test)]
mod tests {
	use super::*;
	use crate::data::MemoryStore;
	use rstest::rstest;
	use serde_json::json;

	#[rstest]
	#[case("7", Identifier::Integer(7))]
	#[case(" 7 ", Identifier::Integer(7))]
	#[case("-3", Identifier::Integer(-3))]
	#[case("7.5", Identifier::Integer(75))]
	#[case("1e3", Identifier::Integer(13))]
	#[case("0042", Identifier::Integer(42))]
	#[case("18446744073709551615", Identifier::Integer(18_446_744_073_709_551_615))]
	#[case("-9223372036854775809", Identifier::Integer(-9_223_372_036_854_775_809))]
	#[case("DE", Identifier::Token("DE".into()))]
	#[case("abc123", Identifier::Token("abc123".into()))]
	fn test_sanitize_accepts(#[case] raw: &str, #[case] expected: Identifier) {
		assert_eq!(sanitize_identifier(&raw.into()).unwrap(), expected);
	}

	#[rstest]
	#[case("")]
	#[case("   ")]
	#[case("0")]
	#[case("000")]
	#[case("../7")]
	#[case("a/b")]
	#[case("de\u{0}")]
	#[case("de;drop")]
	#[case("hello world")]
	#[case("999999999999999999999999999999999999999999")]
	fn test_sanitize_rejects(#[case] raw: &str) {
		let err = sanitize_identifier(&raw.into()).unwrap_err();
		assert!(matches!(err, CrudError::InvalidIdentifier(_)));
	}

	#[test]
	fn test_sanitize_integers() {
		assert_eq!(
			sanitize_identifier(&RawIdentifier::from(9_i32)).unwrap(),
			Identifier::Integer(9)
		);
		assert!(sanitize_identifier(&RawIdentifier::from(0_u32)).is_err());
		assert_eq!(
			sanitize_identifier(&RawIdentifier::from(u64::MAX)).unwrap(),
			Identifier::Integer(i128::from(u64::MAX))
		);
	}

	#[test]
	fn test_invalid_identifier_result() {
		let result = DeleteResult::invalid_identifier();
		assert!(result.is_invalid_identifier());
		assert!(!result.persisted);
		assert_eq!(
			deletion_flash("Country", &result),
			(
				FlashKey::ErrorMessage,
				INVALID_IDENTIFIER_MESSAGE.to_string()
			)
		);
	}

	#[test]
	fn test_result_serializes_camel_case() {
		let result = DeleteResult::new(0, Some(DbError::new("1451", "fk")));
		assert_eq!(
			serde_json::to_value(&result).unwrap(),
			json!({
				"persisted": false,
				"affectedRows": 0,
				"errorCode": "1451",
				"errorMessage": "fk"
			})
		);
	}

	#[tokio::test]
	async fn test_delete_record_by_token_uses_primary_key_filter() {
		let store = MemoryStore::new("countries", "iso").with_rows([
			json!({"iso": "DE"}).as_object().cloned().unwrap(),
			json!({"iso": "FR"}).as_object().cloned().unwrap(),
		]);
		let mut queries = QueryLog::new();

		let result = delete_record(
			&store,
			&Identifier::Token("FR".into()),
			true,
			"deleted",
			"Country",
			&mut queries,
		)
		.await;

		assert_eq!(result, DeleteResult::new(1, None));
		assert_eq!(queries.entries(), ["DELETE FROM countries WHERE iso = 'FR'"]);
	}

	#[tokio::test]
	async fn test_delete_record_swallows_failures() {
		let store = MemoryStore::new("countries", "id")
			.with_rows([json!({"id": 7}).as_object().cloned().unwrap()]);
		store.fail_next(DbError::new("1451", "Cannot delete a parent row"));
		let mut queries = QueryLog::new();

		let result = delete_record(
			&store,
			&Identifier::Integer(7),
			true,
			"deleted",
			"Country",
			&mut queries,
		)
		.await;

		assert!(!result.persisted);
		assert_eq!(result.affected_rows, 0);
		assert_eq!(result.error_code.as_deref(), Some("1451"));
		assert_eq!(
			result.error_message.as_deref(),
			Some("Cannot delete a parent row")
		);
		assert_eq!(queries.entries(), ["DELETE FROM countries WHERE id = 7"]);
		assert_eq!(store.rows().len(), 1);
		assert_eq!(deletion_flash("Country", &result).0, FlashKey::ErrorMessage);
	}

	#[tokio::test]
	async fn test_delete_record_reports_its_own_call() {
		let store = MemoryStore::new("countries", "id").with_rows([
			json!({"id": 1}).as_object().cloned().unwrap(),
			json!({"id": 2}).as_object().cloned().unwrap(),
		]);
		let mut queries = QueryLog::new();

		store.fail_next(DbError::new("2006", "server has gone away"));
		let failed = delete_record(
			&store,
			&Identifier::Integer(1),
			true,
			"deleted",
			"Country",
			&mut queries,
		)
		.await;
		let succeeded = delete_record(
			&store,
			&Identifier::Integer(2),
			true,
			"deleted",
			"Country",
			&mut queries,
		)
		.await;

		// The earlier failure must not leak into the next result
		assert_eq!(failed.error_code.as_deref(), Some("2006"));
		assert_eq!(succeeded, DeleteResult::new(1, None));
		assert_eq!(
			queries.entries(),
			[
				"DELETE FROM countries WHERE id = 1",
				"DELETE FROM countries WHERE id = 2"
			]
		);
	}
}
