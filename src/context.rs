//! Request-scoped state
//!
//! Everything that must not leak between requests lives here: the submitted
//! payload, the session's flash store and the log of executed queries.

use crate::flash::FlashStore;
use std::collections::HashMap;
use std::sync::Arc;

/// Append-only log of queries executed while handling one request
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct QueryLog {
	entries: Vec<String>,
}

impl QueryLog {
	/// Create an empty log
	pub fn new() -> Self {
		Self::default()
	}

	/// Record an executed query
	pub fn collect(&mut self, query: impl Into<String>) {
		self.entries.push(query.into());
	}

	/// Queries in execution order
	pub fn entries(&self) -> &[String] {
		&self.entries
	}

	/// Number of recorded queries
	pub fn len(&self) -> usize {
		self.entries.len()
	}

	/// Whether nothing has been recorded
	pub fn is_empty(&self) -> bool {
		self.entries.is_empty()
	}
}

/// State owned by a single request
pub struct RequestContext {
	flash: Arc<dyn FlashStore>,
	payload: HashMap<String, String>,
	queries: QueryLog,
}

impl RequestContext {
	/// Create a context bound to the session's flash store
	///
	/// # Examples
	///
	/// ```
	/// use reinhardt_crud::context::RequestContext;
	/// use reinhardt_crud::flash::MemoryFlashStore;
	/// use std::sync::Arc;
	///
	/// let context = RequestContext::new(Arc::new(MemoryFlashStore::new()))
	///     .with_field("name", "Germany");
	/// assert_eq!(context.field("name"), Some("Germany"));
	/// assert!(context.queries().is_empty());
	/// ```
	pub fn new(flash: Arc<dyn FlashStore>) -> Self {
		Self {
			flash,
			payload: HashMap::new(),
			queries: QueryLog::new(),
		}
	}

	/// Replace the submitted payload
	pub fn with_payload(mut self, payload: HashMap<String, String>) -> Self {
		self.payload = payload;
		self
	}

	/// Add one submitted field
	pub fn with_field(mut self, name: impl Into<String>, value: impl Into<String>) -> Self {
		self.payload.insert(name.into(), value.into());
		self
	}

	/// Submitted payload
	pub fn payload(&self) -> &HashMap<String, String> {
		&self.payload
	}

	/// One submitted field
	pub fn field(&self, name: &str) -> Option<&str> {
		self.payload.get(name).map(String::as_str)
	}

	/// Session flash store
	pub fn flash(&self) -> &dyn FlashStore {
		self.flash.as_ref()
	}

	/// Queries executed so far
	pub fn queries(&self) -> &QueryLog {
		&self.queries
	}

	/// Mutable access to the query log
	pub fn queries_mut(&mut self) -> &mut QueryLog {
		&mut self.queries
	}
}
