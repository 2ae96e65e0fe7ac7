//! Field copying between row representations
//!
//! Two flavors are provided:
//!
//! - [`impl_cast!`](crate::impl_cast) generates a [`CastFrom`] implementation
//!   for one type pair. The listed fields are checked by the compiler, so a
//!   field missing on either side or with a non-convertible type is a build
//!   error rather than a silently created ad-hoc field.
//! - [`cast_dynamic`] works on any pair of serde types at runtime and reports
//!   [`CrudError::FieldMismatch`] for fields the destination cannot hold.
//!
//! The source is never mutated, and destination fields the source does not
//! carry are left untouched.
//!
//! # Examples
//!
//! ```
//! use reinhardt_crud::cast::{cast, cast_into};
//! use reinhardt_crud::impl_cast;
//!
//! #[derive(Default)]
//! struct CountryRow {
//!     id: i32,
//!     name: String,
//! }
//!
//! #[derive(Default)]
//! struct CountryEntity {
//!     id: i64,
//!     name: String,
//!     region: String,
//! }
//!
//! impl_cast!(CountryRow => CountryEntity { id, name });
//!
//! let row = CountryRow { id: 7, name: "Germany".into() };
//! let entity: CountryEntity = cast(&row);
//! assert_eq!(entity.id, 7);
//!
//! let mut existing = CountryEntity { region: "EU".into(), ..Default::default() };
//! cast_into(&mut existing, &row);
//! assert_eq!(existing.name, "Germany");
//! assert_eq!(existing.region, "EU");
//! ```

use crate::error::{CrudError, CrudResult};
use serde::Serialize;
use serde::de::DeserializeOwned;
use serde_json::Value;

/// Copy the fields shared with `S` onto `self`
pub trait CastFrom<S: ?Sized> {
	/// Copy every common field of `source` onto `self`
	fn cast_from(&mut self, source: &S);
}

/// Instantiate a zero-value `D` and copy the common fields of `source` onto it
pub fn cast<D, S>(source: &S) -> D
where
	D: Default + CastFrom<S>,
{
	let mut destination = D::default();
	destination.cast_from(source);
	destination
}

/// Copy the common fields of `source` onto an existing `destination`
pub fn cast_into<'a, D, S>(destination: &'a mut D, source: &S) -> &'a mut D
where
	D: CastFrom<S>,
{
	destination.cast_from(source);
	destination
}

/// Generate a [`CastFrom`] implementation copying the listed fields
///
/// Each field is cloned from the source and converted with [`Into`], so
/// widening conversions such as `i32` to `i64` are accepted.
#[macro_export]
macro_rules! impl_cast {
	($source:ty => $destination:ty { $($field:ident),+ $(,)? }) => {
		impl $crate::cast::CastFrom<$source> for $destination {
			fn cast_from(&mut self, source: &$source) {
				$(
					self.$field = ::core::convert::Into::into(
						::core::clone::Clone::clone(&source.$field),
					);
				)+
			}
		}
	};
}

fn json_kind(value: &Value) -> &'static str {
	match value {
		Value::Null => "null",
		Value::Bool(_) => "bool",
		Value::Number(_) => "number",
		Value::String(_) => "string",
		Value::Array(_) => "array",
		Value::Object(_) => "object",
	}
}

/// Copy every serialized field of `source` onto `destination` at runtime
///
/// A nullable (`Option`) destination field accepts a value of any kind;
/// otherwise both sides must serialize to the same JSON kind.
///
/// # Errors
///
/// Returns [`CrudError::FieldMismatch`] when the source carries a field the
/// destination lacks, when the field kinds differ, or when either side is not
/// a struct.
///
/// # Examples
///
/// ```
/// use reinhardt_crud::cast::cast_dynamic;
/// use serde::{Deserialize, Serialize};
///
/// #[derive(Serialize)]
/// struct Submitted { name: String }
///
/// #[derive(Debug, Default, Serialize, Deserialize)]
/// struct Country { id: i64, name: String }
///
/// let country = cast_dynamic(Country { id: 7, ..Default::default() }, &Submitted { name: "Germany".into() }).unwrap();
/// assert_eq!(country.id, 7);
/// assert_eq!(country.name, "Germany");
/// ```
pub fn cast_dynamic<D, S>(destination: D, source: &S) -> CrudResult<D>
where
	D: Serialize + DeserializeOwned,
	S: Serialize + ?Sized,
{
	let source = match serde_json::to_value(source)? {
		Value::Object(map) => map,
		other => {
			return Err(CrudError::FieldMismatch {
				field: String::new(),
				reason: format!("source serializes to {}, not a struct", json_kind(&other)),
			});
		}
	};
	let mut target = match serde_json::to_value(&destination)? {
		Value::Object(map) => map,
		other => {
			return Err(CrudError::FieldMismatch {
				field: String::new(),
				reason: format!(
					"destination serializes to {}, not a struct",
					json_kind(&other)
				),
			});
		}
	};

	for (name, value) in source {
		let Some(current) = target.get(&name) else {
			return Err(CrudError::FieldMismatch {
				field: name,
				reason: "no such field on destination".to_string(),
			});
		};

		if !current.is_null() && !value.is_null() && json_kind(current) != json_kind(&value) {
			return Err(CrudError::FieldMismatch {
				reason: format!(
					"cannot assign {} to {}",
					json_kind(&value),
					json_kind(current)
				),
				field: name,
			});
		}
		target.insert(name, value);
	}

	serde_json::from_value(Value::Object(target)).map_err(|e| CrudError::FieldMismatch {
		field: String::new(),
		reason: e.to_string(),
	})
}

#[cfg(test)]
mod tests {
	use super::*;
	use serde::Deserialize;

	#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
	struct CountryForm {
		name: String,
		iso: String,
	}

	#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
	struct Country {
		id: i64,
		name: String,
		iso: String,
		population: Option<u64>,
	}

	#[derive(Debug, Serialize)]
	struct Legacy {
		name: String,
		capital: String,
	}

	#[derive(Debug, Serialize)]
	struct WrongKind {
		id: String,
	}

	#[derive(Debug, Serialize)]
	struct WithPopulation {
		population: u64,
	}

	impl_cast!(CountryForm => Country { name, iso });

	#[test]
	fn test_cast_keeps_untouched_fields() {
		let form = CountryForm {
			name: "Japan".into(),
			iso: "JP".into(),
		};
		let mut country = Country {
			id: 3,
			population: Some(125),
			..Default::default()
		};

		cast_into(&mut country, &form);

		assert_eq!(country.id, 3);
		assert_eq!(country.population, Some(125));
		assert_eq!(country.iso, "JP");
		// source is only borrowed
		assert_eq!(form.name, "Japan");
	}

	#[test]
	fn test_cast_dynamic_rejects_unknown_field() {
		let legacy = Legacy {
			name: "France".into(),
			capital: "Paris".into(),
		};

		let err = cast_dynamic(Country::default(), &legacy).unwrap_err();
		match err {
			CrudError::FieldMismatch { field, .. } => assert_eq!(field, "capital"),
			other => panic!("unexpected error: {other}"),
		}
	}

	#[test]
	fn test_cast_dynamic_rejects_kind_change() {
		let err = cast_dynamic(Country::default(), &WrongKind { id: "7".into() }).unwrap_err();
		assert!(matches!(err, CrudError::FieldMismatch { ref field, .. } if field == "id"));
	}

	#[test]
	fn test_cast_dynamic_fills_option_field() {
		let country = cast_dynamic(Country::default(), &WithPopulation { population: 84 }).unwrap();
		assert_eq!(country.population, Some(84));
	}

	#[test]
	fn test_cast_dynamic_rejects_non_struct_source() {
		let err = cast_dynamic(Country::default(), &vec![1, 2]).unwrap_err();
		assert!(matches!(err, CrudError::FieldMismatch { .. }));
	}
}
