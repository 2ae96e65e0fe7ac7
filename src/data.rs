//! Data-access seam for the primary object
//!
//! Controllers never talk to a database directly. They hold an
//! `Arc<dyn DataAccess>` bound to their primary object's table. The handle is
//! shared by every request, so each call returns its own outcome together
//! with the executed statement. Failures come back as
//! [`CrudError::Database`](crate::error::CrudError::Database).

pub mod memory;

use crate::error::CrudResult;
use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::fmt;

pub use memory::MemoryStore;

/// A persisted row of the primary object
pub type Record = serde_json::Map<String, Value>;

/// Sanitized record key
///
/// Numeric keys are compared as integers; anything else is treated as an
/// alphanumeric natural key. Integers cover both signed and unsigned 64-bit
/// key columns.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize)]
#[serde(untagged)]
pub enum Identifier {
	/// Surrogate integer key
	Integer(i128),
	/// Alphanumeric natural key
	Token(String),
}

impl Identifier {
	/// Whether this key is numeric
	pub fn is_numeric(&self) -> bool {
		matches!(self, Identifier::Integer(_))
	}

	/// JSON value used when filtering by this key
	pub fn to_value(&self) -> Value {
		match self {
			Identifier::Integer(id) => i64::try_from(*id)
				.map(Value::from)
				.or_else(|_| u64::try_from(*id).map(Value::from))
				.unwrap_or_else(|_| Value::from(id.to_string())),
			Identifier::Token(token) => Value::from(token.as_str()),
		}
	}
}

impl fmt::Display for Identifier {
	fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
		match self {
			Identifier::Integer(id) => write!(f, "{}", id),
			Identifier::Token(token) => f.write_str(token),
		}
	}
}

/// Error reported by the data-access layer for one statement
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DbError {
	/// Driver or engine specific error code
	pub code: String,
	/// Human readable message
	pub message: String,
}

impl DbError {
	/// Create a new error
	pub fn new(code: impl Into<String>, message: impl Into<String>) -> Self {
		Self {
			code: code.into(),
			message: message.into(),
		}
	}
}

impl fmt::Display for DbError {
	fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
		write!(f, "[{}] {}", self.code, self.message)
	}
}

/// Outcome of one executed statement
#[derive(Debug, Clone, PartialEq)]
pub struct Executed<T> {
	/// What the statement produced
	pub value: T,
	/// Statement text, for the request's query log
	pub query: String,
}

impl<T> Executed<T> {
	/// Pair a value with the statement that produced it
	pub fn new(value: T, query: impl Into<String>) -> Self {
		Self {
			value,
			query: query.into(),
		}
	}
}

/// Outcome of a delete or update: the number of affected rows
pub type MutationReport = Executed<u64>;

impl MutationReport {
	/// Rows affected by the statement
	pub fn affected_rows(&self) -> u64 {
		self.value
	}
}

/// Persistence operations a CRUD controller needs from its primary model
///
/// Implementations are shared across requests. Nothing about one call may be
/// read back through another: failures are returned as
/// [`CrudError::Database`](crate::error::CrudError::Database), carrying the backend error and the statement.
#[async_trait]
pub trait DataAccess: Send + Sync {
	/// Fetch every record of the primary object
	async fn find_all(&self) -> CrudResult<Executed<Vec<Record>>>;

	/// Fetch one record by primary key
	async fn find(&self, id: &Identifier) -> CrudResult<Executed<Option<Record>>>;

	/// Delete by primary key
	async fn delete(&self, id: &Identifier) -> CrudResult<MutationReport>;

	/// Delete every record whose `field` equals `value`
	async fn delete_where(&self, field: &str, value: &Value) -> CrudResult<MutationReport>;

	/// Update fields of the record with the given primary key
	async fn update(&self, id: &Identifier, fields: Record) -> CrudResult<MutationReport>;

	/// Name of the primary key column
	fn primary_key_name(&self) -> &str;
}
