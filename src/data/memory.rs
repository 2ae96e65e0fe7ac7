//! In-memory data-access backend

use super::{DataAccess, DbError, Executed, Identifier, MutationReport, Record};
use crate::error::{CrudError, CrudResult};
use async_trait::async_trait;
use parking_lot::Mutex;
use serde_json::Value;

#[derive(Debug, Default)]
struct StoreState {
	rows: Vec<Record>,
	pending_failure: Option<DbError>,
	operations: usize,
}

impl StoreState {
	/// Start a new operation, failing it if a failure was injected
	fn begin(&mut self, query: &str) -> CrudResult<()> {
		self.operations += 1;

		match self.pending_failure.take() {
			Some(error) => Err(CrudError::Database {
				error,
				query: Some(query.to_string()),
			}),
			None => Ok(()),
		}
	}
}

/// In-memory table for a single primary object
///
/// Follows MySQL affected-row semantics: an update only counts rows whose
/// values actually changed, so flagging an already flagged row reports zero.
/// Each operation runs under one lock and reports its own outcome, so the
/// store can be shared by concurrent requests.
#[derive(Debug)]
pub struct MemoryStore {
	table: String,
	primary_key: String,
	state: Mutex<StoreState>,
}

impl MemoryStore {
	/// Create an empty table
	///
	/// # Examples
	///
	/// ```
	/// use reinhardt_crud::data::MemoryStore;
	///
	/// let store = MemoryStore::new("countries", "id");
	/// assert!(store.rows().is_empty());
	/// ```
	pub fn new(table: impl Into<String>, primary_key: impl Into<String>) -> Self {
		Self {
			table: table.into(),
			primary_key: primary_key.into(),
			state: Mutex::new(StoreState::default()),
		}
	}

	/// Seed the table with rows
	pub fn with_rows(self, rows: impl IntoIterator<Item = Record>) -> Self {
		self.state.lock().rows.extend(rows);
		self
	}

	/// Append a row
	pub fn insert(&self, row: Record) {
		self.state.lock().rows.push(row);
	}

	/// Snapshot of every stored row
	pub fn rows(&self) -> Vec<Record> {
		self.state.lock().rows.clone()
	}

	/// Make the next operation fail with `error`
	pub fn fail_next(&self, error: DbError) {
		self.state.lock().pending_failure = Some(error);
	}

	/// Number of operations issued against this store
	pub fn operation_count(&self) -> usize {
		self.state.lock().operations
	}

	fn pk_clause(&self, id: &Identifier) -> String {
		match id {
			Identifier::Integer(value) => format!("{} = {}", self.primary_key, value),
			Identifier::Token(_) => {
				format!("{} = {}", self.primary_key, sql_literal(&id.to_value()))
			}
		}
	}

	fn matches_key(&self, row: &Record, wanted: &Value) -> bool {
		row.get(&self.primary_key)
			.is_some_and(|stored| value_matches(stored, wanted))
	}

	fn delete_matching(
		&self,
		query: String,
		field: &str,
		value: &Value,
	) -> CrudResult<MutationReport> {
		let mut state = self.state.lock();
		state.begin(&query)?;

		let before = state.rows.len();
		state.rows.retain(|row| {
			!row.get(field)
				.is_some_and(|stored| value_matches(stored, value))
		});
		let removed = (before - state.rows.len()) as u64;

		Ok(MutationReport::new(removed, query))
	}
}

/// Render a value the way it appears in statement text
///
/// Strings are single-quoted; everything else uses its JSON form.
fn sql_literal(value: &Value) -> String {
	match value {
		Value::String(s) => format!("'{}'", s.replace('\'', "''")),
		other => other.to_string(),
	}
}

/// Loose comparison between a stored value and a lookup value
///
/// Keys arriving from URLs are strings while stored keys may be numbers, so
/// `7` and `"7"` compare equal.
fn value_matches(stored: &Value, wanted: &Value) -> bool {
	match (stored, wanted) {
		(Value::Number(n), Value::String(s)) | (Value::String(s), Value::Number(n)) => {
			n.to_string() == *s
		}
		_ => stored == wanted,
	}
}

#[async_trait]
impl DataAccess for MemoryStore {
	async fn find_all(&self) -> CrudResult<Executed<Vec<Record>>> {
		let query = format!("SELECT * FROM {}", self.table);
		let mut state = self.state.lock();
		state.begin(&query)?;
		Ok(Executed::new(state.rows.clone(), query))
	}

	async fn find(&self, id: &Identifier) -> CrudResult<Executed<Option<Record>>> {
		let query = format!(
			"SELECT * FROM {} WHERE {} LIMIT 1",
			self.table,
			self.pk_clause(id)
		);
		let mut state = self.state.lock();
		state.begin(&query)?;

		let wanted = id.to_value();
		let found = state
			.rows
			.iter()
			.find(|row| self.matches_key(row, &wanted))
			.cloned();
		Ok(Executed::new(found, query))
	}

	async fn delete(&self, id: &Identifier) -> CrudResult<MutationReport> {
		self.delete_matching(
			format!("DELETE FROM {} WHERE {}", self.table, self.pk_clause(id)),
			&self.primary_key,
			&id.to_value(),
		)
	}

	async fn delete_where(&self, field: &str, value: &Value) -> CrudResult<MutationReport> {
		self.delete_matching(
			format!("DELETE FROM {} WHERE {} = {}", self.table, field, sql_literal(value)),
			field,
			value,
		)
	}

	async fn update(&self, id: &Identifier, fields: Record) -> CrudResult<MutationReport> {
		let assignments = fields
			.iter()
			.map(|(key, value)| format!("{} = {}", key, sql_literal(value)))
			.collect::<Vec<_>>()
			.join(", ");
		let query = format!(
			"UPDATE {} SET {} WHERE {}",
			self.table,
			assignments,
			self.pk_clause(id)
		);

		let mut state = self.state.lock();
		state.begin(&query)?;

		let wanted = id.to_value();
		let mut changed = 0;
		for row in state
			.rows
			.iter_mut()
			.filter(|row| self.matches_key(row, &wanted))
		{
			let mut row_changed = false;
			for (key, value) in &fields {
				if row.get(key) != Some(value) {
					row.insert(key.clone(), value.clone());
					row_changed = true;
				}
			}
			if row_changed {
				changed += 1;
			}
		}

		Ok(MutationReport::new(changed, query))
	}

	fn primary_key_name(&self) -> &str {
		&self.primary_key
	}
}

#[cfg(test)]
mod tests {
	use super::*;
	use rstest::{fixture, rstest};
	use serde_json::json;

	fn row(value: Value) -> Record {
		match value {
			Value::Object(map) => map,
			_ => unreachable!("test rows are objects"),
		}
	}

	#[fixture]
	fn store() -> MemoryStore {
		MemoryStore::new("countries", "id").with_rows([
			row(json!({"id": 1, "iso": "DE", "name": "Germany", "region": "EU"})),
			row(json!({"id": 2, "iso": "FR", "name": "France", "region": "EU"})),
			row(json!({"id": 3, "iso": "JP", "name": "Japan", "region": "AS"})),
		])
	}

	#[rstest]
	#[tokio::test]
	async fn test_delete_by_integer_key(store: MemoryStore) {
		let report = store.delete(&Identifier::Integer(2)).await.unwrap();

		assert_eq!(report.affected_rows(), 1);
		assert_eq!(report.query, "DELETE FROM countries WHERE id = 2");
		assert_eq!(store.rows().len(), 2);
	}

	#[rstest]
	#[tokio::test]
	async fn test_delete_string_key_matches_numeric_column(store: MemoryStore) {
		let report = store
			.delete_where("id", &Value::from("3"))
			.await
			.unwrap();
		assert_eq!(report.affected_rows(), 1);
	}

	#[rstest]
	#[tokio::test]
	async fn test_delete_where_can_match_many_rows(store: MemoryStore) {
		let report = store
			.delete_where("region", &Value::from("EU"))
			.await
			.unwrap();

		assert_eq!(report.affected_rows(), 2);
		assert_eq!(store.rows().len(), 1);
	}

	#[tokio::test]
	async fn test_token_keys_are_quoted_the_same_everywhere() {
		let store = MemoryStore::new("countries", "iso")
			.with_rows([row(json!({"iso": "DE"})), row(json!({"iso": "FR"}))]);

		let by_key = store
			.find(&Identifier::Token("DE".into()))
			.await
			.unwrap();
		let by_filter = store
			.delete_where("iso", &Value::from("FR"))
			.await
			.unwrap();

		assert_eq!(by_key.query, "SELECT * FROM countries WHERE iso = 'DE' LIMIT 1");
		assert_eq!(by_filter.query, "DELETE FROM countries WHERE iso = 'FR'");
		assert_eq!(sql_literal(&Value::from("O'Higgins")), "'O''Higgins'");
	}

	#[rstest]
	#[tokio::test]
	async fn test_update_counts_only_changed_rows(store: MemoryStore) {
		let mut fields = Record::new();
		fields.insert("deleted".into(), Value::Bool(true));

		let first = store
			.update(&Identifier::Integer(1), fields.clone())
			.await
			.unwrap();
		let second = store.update(&Identifier::Integer(1), fields).await.unwrap();

		assert_eq!(first.affected_rows(), 1);
		assert_eq!(second.affected_rows(), 0);
		assert_eq!(first.query, "UPDATE countries SET deleted = true WHERE id = 1");
		let found = store.find(&Identifier::Integer(1)).await.unwrap().value.unwrap();
		assert_eq!(found.get("deleted"), Some(&Value::Bool(true)));
	}

	#[rstest]
	#[tokio::test]
	async fn test_injected_failure_is_reported_once(store: MemoryStore) {
		store.fail_next(DbError::new("1451", "constraint violation"));

		let err = store.delete(&Identifier::Integer(1)).await.unwrap_err();
		match &err {
			CrudError::Database { error, .. } => assert_eq!(error.code, "1451"),
			other => panic!("unexpected error: {:?}", other),
		}
		assert_eq!(err.query(), Some("DELETE FROM countries WHERE id = 1"));
		assert_eq!(store.rows().len(), 3);

		let report = store.delete(&Identifier::Integer(1)).await.unwrap();
		assert_eq!(report.affected_rows(), 1);
		assert_eq!(store.operation_count(), 2);
	}
}
