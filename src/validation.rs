//! Validation gate
//!
//! Validation is opt-in per controller action. When an action declares a
//! [`RuleSet`], the submitted payload is checked against it and the failures
//! are kept for the view layer; nothing is rendered here.
//!
//! Rules use the pipe-separated syntax common to admin scaffolds:
//!
//! ```text
//! required|alpha_numeric|exact_length[2]
//! ```

use crate::error::{CrudError, CrudResult};
use indexmap::IndexMap;
use serde::Serialize;
use std::collections::HashMap;

/// Rules and optional custom messages for one action
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RuleSet {
	rules: IndexMap<String, String>,
	messages: HashMap<String, HashMap<String, String>>,
}

impl RuleSet {
	/// Create an empty rule set
	pub fn new() -> Self {
		Self::default()
	}

	/// Declare the rules of a field
	///
	/// # Examples
	///
	/// ```
	/// use reinhardt_crud::validation::RuleSet;
	///
	/// let rules = RuleSet::new()
	///     .field("name", "required|max_length[64]")
	///     .message("name", "required", "Every country needs a name.");
	/// assert_eq!(rules.rules_for("name"), Some("required|max_length[64]"));
	/// ```
	pub fn field(mut self, name: impl Into<String>, rules: impl Into<String>) -> Self {
		self.rules.insert(name.into(), rules.into());
		self
	}

	/// Override the message reported when `rule` fails on `field`
	pub fn message(
		mut self,
		field: impl Into<String>,
		rule: impl Into<String>,
		message: impl Into<String>,
	) -> Self {
		self.messages
			.entry(field.into())
			.or_default()
			.insert(rule.into(), message.into());
		self
	}

	/// Rule string declared for a field
	pub fn rules_for(&self, field: &str) -> Option<&str> {
		self.rules.get(field).map(String::as_str)
	}

	/// Declared fields in declaration order
	pub fn fields(&self) -> impl Iterator<Item = (&str, &str)> {
		self.rules.iter().map(|(k, v)| (k.as_str(), v.as_str()))
	}

	/// Custom message for a field and rule
	pub fn custom_message(&self, field: &str, rule: &str) -> Option<&str> {
		self.messages
			.get(field)
			.and_then(|messages| messages.get(rule))
			.map(String::as_str)
	}

	/// Whether no field has rules
	pub fn is_empty(&self) -> bool {
		self.rules.is_empty()
	}
}

/// First failure per field, in declaration order
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
#[serde(transparent)]
pub struct ValidationErrors {
	errors: IndexMap<String, String>,
}

impl ValidationErrors {
	/// Create an empty error set
	pub fn new() -> Self {
		Self::default()
	}

	/// Record a failure; only the first failure of a field is kept
	pub fn add(&mut self, field: impl Into<String>, message: impl Into<String>) {
		self.errors.entry(field.into()).or_insert_with(|| message.into());
	}

	/// Failure message of a field
	pub fn get(&self, field: &str) -> Option<&str> {
		self.errors.get(field).map(String::as_str)
	}

	/// Whether any field failed
	pub fn is_empty(&self) -> bool {
		self.errors.is_empty()
	}

	/// Number of failed fields
	pub fn len(&self) -> usize {
		self.errors.len()
	}

	/// Iterate over `(field, message)` pairs
	pub fn iter(&self) -> impl Iterator<Item = (&str, &str)> {
		self.errors.iter().map(|(k, v)| (k.as_str(), v.as_str()))
	}
}

/// Rule engine seam
pub trait Validator: Send + Sync {
	/// Check `payload` against `rules`, returning every failure
	fn validate(
		&self,
		rules: &RuleSet,
		payload: &HashMap<String, String>,
	) -> CrudResult<ValidationErrors>;
}

/// Run the declared rules, if any
///
/// Without a rule set the gate passes. Failures are written to `errors`,
/// replacing whatever a previous run left there.
///
/// # Errors
///
/// Returns [`CrudError::Configuration`] if the rule set names an unknown rule.
pub fn can_validate(
	rules: Option<&RuleSet>,
	validator: &dyn Validator,
	payload: &HashMap<String, String>,
	errors: &mut ValidationErrors,
) -> CrudResult<bool> {
	let Some(rules) = rules else {
		return Ok(true);
	};

	*errors = validator.validate(rules, payload)?;
	Ok(errors.is_empty())
}

/// A parsed rule such as `max_length[64]`
#[derive(Debug, Clone, PartialEq, Eq)]
struct Rule<'a> {
	name: &'a str,
	param: Option<&'a str>,
}

fn parse_rules(spec: &str) -> CrudResult<Vec<Rule<'_>>> {
	spec.split('|')
		.map(str::trim)
		.filter(|rule| !rule.is_empty())
		.map(|rule| match rule.split_once('[') {
			Some((name, rest)) => rest
				.strip_suffix(']')
				.map(|param| Rule {
					name,
					param: Some(param),
				})
				.ok_or_else(|| CrudError::Configuration(format!("malformed rule '{}'", rule))),
			None => Ok(Rule {
				name: rule,
				param: None,
			}),
		})
		.collect()
}

/// Built-in rule engine
#[derive(Debug, Clone, Copy, Default)]
pub struct RuleValidator;

impl RuleValidator {
	/// Create the rule engine
	pub fn new() -> Self {
		Self
	}

	fn length_param(rule: &Rule<'_>) -> CrudResult<usize> {
		rule.param
			.and_then(|p| p.trim().parse::<usize>().ok())
			.ok_or_else(|| {
				CrudError::Configuration(format!("rule '{}' needs a numeric parameter", rule.name))
			})
	}

	/// Check one rule, returning the default failure message
	fn check(field: &str, value: &str, rule: &Rule<'_>) -> CrudResult<Option<String>> {
		let length = value.chars().count();
		let failure = match rule.name {
			"required" => value.trim().is_empty().then(|| format!("The {} field is required.", field)),
			"permit_empty" => None,
			"min_length" => {
				let min = Self::length_param(rule)?;
				(length < min).then(|| {
					format!("The {} field must be at least {} characters in length.", field, min)
				})
			}
			"max_length" => {
				let max = Self::length_param(rule)?;
				(length > max).then(|| {
					format!("The {} field cannot exceed {} characters in length.", field, max)
				})
			}
			"exact_length" => {
				let exact = Self::length_param(rule)?;
				(length != exact).then(|| {
					format!("The {} field must be exactly {} characters in length.", field, exact)
				})
			}
			"numeric" => value
				.trim()
				.parse::<f64>()
				.map_or(true, |n| !n.is_finite())
				.then(|| format!("The {} field must contain only numbers.", field)),
			"integer" => value
				.trim()
				.parse::<i64>()
				.is_err()
				.then(|| format!("The {} field must contain an integer.", field)),
			"is_natural" => (value.is_empty() || !value.chars().all(|c| c.is_ascii_digit()))
				.then(|| format!("The {} field must only contain digits.", field)),
			"is_natural_no_zero" => (value.is_empty()
				|| !value.chars().all(|c| c.is_ascii_digit())
				|| value.chars().all(|c| c == '0'))
			.then(|| {
				format!(
					"The {} field must only contain digits and must be greater than zero.",
					field
				)
			}),
			"alpha" => (!value.chars().all(|c| c.is_alphabetic()))
				.then(|| format!("The {} field may only contain alphabetical characters.", field)),
			"alpha_numeric" => (!value.chars().all(|c| c.is_alphanumeric()))
				.then(|| format!("The {} field may only contain alphanumeric characters.", field)),
			"alpha_numeric_space" => (!value.chars().all(|c| c.is_alphanumeric() || c == ' '))
				.then(|| {
					format!(
						"The {} field may only contain alphanumeric and space characters.",
						field
					)
				}),
			"valid_email" => (!is_valid_email(value))
				.then(|| format!("The {} field must contain a valid email address.", field)),
			"in_list" => {
				let list = rule.param.ok_or_else(|| {
					CrudError::Configuration("rule 'in_list' needs a parameter".to_string())
				})?;
				(!list.split(',').map(str::trim).any(|item| item == value)).then(|| {
					format!("The {} field must be one of: {}.", field, list)
				})
			}
			unknown => {
				return Err(CrudError::Configuration(format!(
					"unknown validation rule '{}'",
					unknown
				)));
			}
		};
		Ok(failure)
	}
}

fn is_valid_email(value: &str) -> bool {
	let Some((local, domain)) = value.split_once('@') else {
		return false;
	};
	!local.is_empty()
		&& !domain.contains('@')
		&& domain.contains('.')
		&& !domain.starts_with('.')
		&& !domain.ends_with('.')
		&& !value.chars().any(char::is_whitespace)
}

impl Validator for RuleValidator {
	fn validate(
		&self,
		rules: &RuleSet,
		payload: &HashMap<String, String>,
	) -> CrudResult<ValidationErrors> {
		let mut errors = ValidationErrors::new();

		for (field, spec) in rules.fields() {
			let parsed = parse_rules(spec)?;
			let value = payload.get(field).map(String::as_str).unwrap_or("");

			let permit_empty = parsed.iter().any(|rule| rule.name == "permit_empty");
			let required = parsed.iter().any(|rule| rule.name == "required");
			if value.is_empty() && (permit_empty || !required) {
				// Validate the rule names anyway so typos surface early
				for rule in &parsed {
					Self::check(field, "x", rule)?;
				}
				continue;
			}

			for rule in &parsed {
				if let Some(default_message) = Self::check(field, value, rule)? {
					let message = rules
						.custom_message(field, rule.name)
						.map(str::to_string)
						.unwrap_or(default_message);
					errors.add(field, message);
					break;
				}
			}
		}

		Ok(errors)
	}
}

#[cfg(test)]
mod tests {
	use super::*;
	use rstest::rstest;

	fn payload(pairs: &[(&str, &str)]) -> HashMap<String, String> {
		pairs
			.iter()
			.map(|(k, v)| (k.to_string(), v.to_string()))
			.collect()
	}

	#[test]
	fn test_no_rules_passes() {
		let mut errors = ValidationErrors::new();
		let valid = can_validate(None, &RuleValidator, &HashMap::new(), &mut errors).unwrap();
		assert!(valid);
		assert!(errors.is_empty());
	}

	#[rstest]
	#[case("required", "", false)]
	#[case("required", "  ", false)]
	#[case("required", "DE", true)]
	#[case("min_length[3]", "ab", false)]
	#[case("max_length[3]", "abcd", false)]
	#[case("exact_length[2]", "DE", true)]
	#[case("numeric", "12.5", true)]
	#[case("numeric", "12a", false)]
	#[case("integer", "-4", true)]
	#[case("is_natural", "-4", false)]
	#[case("is_natural_no_zero", "000", false)]
	#[case("is_natural_no_zero", "10", true)]
	#[case("alpha", "Germany", true)]
	#[case("alpha_numeric", "DE-1", false)]
	#[case("alpha_numeric_space", "New Zealand 2", true)]
	#[case("valid_email", "ops@example.com", true)]
	#[case("valid_email", "ops@localhost", false)]
	#[case("in_list[EU,AS]", "AS", true)]
	#[case("in_list[EU,AS]", "AF", false)]
	fn test_rules(#[case] rule: &str, #[case] value: &str, #[case] expected: bool) {
		let rules = RuleSet::new().field("f", format!("required|{}", rule));
		let errors = RuleValidator
			.validate(&rules, &payload(&[("f", value)]))
			.unwrap();
		assert_eq!(errors.is_empty(), expected, "rule {} on {:?}", rule, value);
	}

	#[test]
	fn test_first_failure_and_custom_message() {
		let rules = RuleSet::new()
			.field("name", "required|max_length[5]")
			.field("iso", "required|exact_length[2]")
			.message("iso", "exact_length", "ISO codes have two letters.");
		let mut errors = ValidationErrors::new();

		let valid = can_validate(
			Some(&rules),
			&RuleValidator,
			&payload(&[("name", ""), ("iso", "DEU")]),
			&mut errors,
		)
		.unwrap();

		assert!(!valid);
		assert_eq!(errors.len(), 2);
		assert_eq!(errors.get("name"), Some("The name field is required."));
		assert_eq!(errors.get("iso"), Some("ISO codes have two letters."));
		assert_eq!(
			errors.iter().map(|(f, _)| f).collect::<Vec<_>>(),
			vec!["name", "iso"]
		);
	}

	#[test]
	fn test_optional_empty_field_skips_rules() {
		let rules = RuleSet::new().field("population", "permit_empty|integer");
		let errors = RuleValidator.validate(&rules, &HashMap::new()).unwrap();
		assert!(errors.is_empty());
	}

	#[rstest]
	#[case("required|sometimes")]
	#[case("max_length[abc]")]
	#[case("max_length[3")]
	fn test_bad_rule_is_configuration_error(#[case] spec: &str) {
		let rules = RuleSet::new().field("f", spec);
		let err = RuleValidator
			.validate(&rules, &payload(&[("f", "value")]))
			.unwrap_err();
		assert!(matches!(err, CrudError::Configuration(_)));
	}

	#[test]
	fn test_rerun_replaces_previous_errors() {
		let rules = RuleSet::new().field("name", "required");
		let mut errors = ValidationErrors::new();

		can_validate(Some(&rules), &RuleValidator, &HashMap::new(), &mut errors).unwrap();
		assert_eq!(errors.len(), 1);

		let valid = can_validate(
			Some(&rules),
			&RuleValidator,
			&payload(&[("name", "Chile")]),
			&mut errors,
		)
		.unwrap();
		assert!(valid);
		assert!(errors.is_empty());
	}
}
