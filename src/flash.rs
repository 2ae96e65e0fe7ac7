//! One-shot flash messages
//!
//! A flash value is written while handling one request and read exactly once
//! while handling the next. Only two keys exist: `errorMessage` and
//! `successMessage`.

use parking_lot::Mutex;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::fmt;
use std::sync::Arc;

/// Well-known flash keys
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum FlashKey {
	/// Shown as an error banner
	ErrorMessage,
	/// Shown as a success banner
	SuccessMessage,
}

impl FlashKey {
	/// Returns the session / view data key
	///
	/// # Examples
	///
	/// ```
	/// use reinhardt_crud::flash::FlashKey;
	///
	/// assert_eq!(FlashKey::ErrorMessage.as_str(), "errorMessage");
	/// assert_eq!(FlashKey::SuccessMessage.as_str(), "successMessage");
	/// ```
	pub fn as_str(&self) -> &'static str {
		match self {
			FlashKey::ErrorMessage => "errorMessage",
			FlashKey::SuccessMessage => "successMessage",
		}
	}
}

impl fmt::Display for FlashKey {
	fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
		f.write_str(self.as_str())
	}
}

/// A flash key paired with its message
pub type Flash = (FlashKey, String);

/// Session-backed flash storage
pub trait FlashStore: Send + Sync {
	/// Store a message for the next request, replacing any previous one
	fn set_flash(&self, key: FlashKey, message: String);

	/// Read and clear a message
	fn take_flash(&self, key: FlashKey) -> Option<String>;

	/// Read a message without clearing it
	fn peek_flash(&self, key: FlashKey) -> Option<String>;
}

/// In-memory flash storage
///
/// Clones share the same underlying session, so one instance can be handed
/// to consecutive requests.
#[derive(Debug, Clone, Default)]
pub struct MemoryFlashStore {
	messages: Arc<Mutex<HashMap<FlashKey, String>>>,
}

impl MemoryFlashStore {
	/// Create an empty store
	pub fn new() -> Self {
		Self::default()
	}
}

impl FlashStore for MemoryFlashStore {
	fn set_flash(&self, key: FlashKey, message: String) {
		self.messages.lock().insert(key, message);
	}

	fn take_flash(&self, key: FlashKey) -> Option<String> {
		self.messages.lock().remove(&key)
	}

	fn peek_flash(&self, key: FlashKey) -> Option<String> {
		self.messages.lock().get(&key).cloned()
	}
}

#[cfg(test)]
mod tests {
	use super::*;

	#[test]
	fn test_flash_is_read_once() {
		let store = MemoryFlashStore::new();
		store.set_flash(FlashKey::SuccessMessage, "Saved".to_string());

		assert_eq!(
			store.peek_flash(FlashKey::SuccessMessage).as_deref(),
			Some("Saved")
		);
		assert_eq!(
			store.take_flash(FlashKey::SuccessMessage).as_deref(),
			Some("Saved")
		);
		assert_eq!(store.take_flash(FlashKey::SuccessMessage), None);
	}

	#[test]
	fn test_clones_share_session() {
		let store = MemoryFlashStore::new();
		let next_request = store.clone();

		store.set_flash(FlashKey::ErrorMessage, "first".to_string());
		store.set_flash(FlashKey::ErrorMessage, "second".to_string());

		assert_eq!(
			next_request.take_flash(FlashKey::ErrorMessage).as_deref(),
			Some("second")
		);
		assert_eq!(store.peek_flash(FlashKey::SuccessMessage), None);
	}
}
