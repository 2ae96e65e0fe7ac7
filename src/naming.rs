//! Naming helpers for controller identities
//!
//! String conversions used to turn a controller's declared type name into a
//! module slug, and an object name into view data keys and view file names.

/// Suffix stripped from controller type names before deriving a slug
pub const CONTROLLER_SUFFIX: &str = "Controller";

/// Convert a name to snake_case
///
/// Acronyms are kept together (`HTTPResponse` becomes `http_response`) and
/// consecutive separators (`_`, `-`, ` `, `.`) collapse to a single `_`.
///
/// # Examples
///
/// ```
/// use reinhardt_crud::naming::to_snake_case;
///
/// assert_eq!(to_snake_case("Country"), "country");
/// assert_eq!(to_snake_case("CountryRegions"), "country_regions");
/// assert_eq!(to_snake_case("APIKeys"), "api_keys");
/// assert_eq!(to_snake_case("Tax  Rates"), "tax_rates");
/// ```
pub fn to_snake_case(name: &str) -> String {
	if name.is_empty() {
		return String::new();
	}

	let mut result = String::with_capacity(name.len() + 4);
	let chars: Vec<char> = name.chars().collect();
	// Start counts as a separator so no leading underscore is emitted
	let mut prev_was_separator = true;

	for (i, &ch) in chars.iter().enumerate() {
		if matches!(ch, '_' | '-' | ' ' | '.') {
			if !prev_was_separator && !result.is_empty() {
				result.push('_');
			}
			prev_was_separator = true;
		} else if ch.is_ascii_uppercase() {
			if !prev_was_separator && i > 0 {
				let prev = chars[i - 1];
				let next = chars.get(i + 1);

				// camelCase boundary, or the last capital of an acronym (HTTPRequest)
				if prev.is_ascii_lowercase()
					|| prev.is_ascii_digit()
					|| (prev.is_ascii_uppercase() && next.is_some_and(|n| n.is_ascii_lowercase()))
				{
					result.push('_');
				}
			}
			result.push(ch.to_ascii_lowercase());
			prev_was_separator = false;
		} else {
			result.push(ch.to_ascii_lowercase());
			prev_was_separator = false;
		}
	}

	if result.ends_with('_') {
		result.pop();
	}
	result
}

/// Convert a string to a URL slug
///
/// # Examples
///
/// ```
/// use reinhardt_crud::naming::slugify;
///
/// assert_eq!(slugify("country_regions"), "country-regions");
/// assert_eq!(slugify("Hello  World"), "hello-world");
/// assert_eq!(slugify("Special!@#Characters"), "special-characters");
/// ```
pub fn slugify(text: &str) -> String {
	text.to_lowercase()
		.chars()
		.map(|ch| match ch {
			'a'..='z' | '0'..='9' => ch,
			_ => '-',
		})
		.collect::<String>()
		.split('-')
		.filter(|s| !s.is_empty())
		.collect::<Vec<_>>()
		.join("-")
}

/// Uppercase the first character, leaving the rest untouched
///
/// # Examples
///
/// ```
/// use reinhardt_crud::naming::capfirst;
///
/// assert_eq!(capfirst("countries"), "Countries");
/// assert_eq!(capfirst("taxRate"), "TaxRate");
/// assert_eq!(capfirst(""), "");
/// ```
pub fn capfirst(text: &str) -> String {
	let mut chars = text.chars();
	match chars.next() {
		Some(first) => first.to_uppercase().chain(chars).collect(),
		None => String::new(),
	}
}

/// Convert an object name to lowerCamelCase
///
/// # Examples
///
/// ```
/// use reinhardt_crud::naming::lower_camel_case;
///
/// assert_eq!(lower_camel_case("Country"), "country");
/// assert_eq!(lower_camel_case("Tax Rate"), "taxRate");
/// assert_eq!(lower_camel_case("country_region"), "countryRegion");
/// assert_eq!(lower_camel_case("TaxRate"), "taxRate");
/// ```
pub fn lower_camel_case(name: &str) -> String {
	let mut result = String::with_capacity(name.len());
	for (i, word) in name
		.split(['_', '-', ' ', '.'])
		.filter(|w| !w.is_empty())
		.enumerate()
	{
		if i == 0 {
			let mut chars = word.chars();
			if let Some(first) = chars.next() {
				result.extend(first.to_lowercase());
				result.push_str(chars.as_str());
			}
		} else {
			result.push_str(&capfirst(word));
		}
	}
	result
}

/// Strip any module path from a type name
///
/// Both Rust (`app::controllers::Countries`) and namespaced
/// (`App\Controllers\Countries`) forms are accepted.
///
/// # Examples
///
/// ```
/// use reinhardt_crud::naming::short_type_name;
///
/// assert_eq!(short_type_name("app::controllers::Countries"), "Countries");
/// assert_eq!(short_type_name("App\\Controllers\\Countries"), "Countries");
/// assert_eq!(short_type_name("Countries"), "Countries");
/// ```
pub fn short_type_name(type_name: &str) -> &str {
	let after_path = type_name.rsplit("::").next().unwrap_or(type_name);
	after_path.rsplit('\\').next().unwrap_or(after_path)
}

#[cfg(test)]
mod tests {
	use super::*;
	use rstest::rstest;

	#[rstest]
	#[case("Countries", "countries")]
	#[case("CountryRegions", "country_regions")]
	#[case("HTTPLogs", "http_logs")]
	#[case("Iso3166Codes", "iso3166_codes")]
	#[case("user__profile", "user_profile")]
	#[case("Trailing_", "trailing")]
	fn test_to_snake_case(#[case] input: &str, #[case] expected: &str) {
		assert_eq!(to_snake_case(input), expected);
	}

	#[rstest]
	#[case("country_regions", "country-regions")]
	#[case("__a__b__", "a-b")]
	#[case("Über", "ber")]
	#[case("", "")]
	fn test_slugify(#[case] input: &str, #[case] expected: &str) {
		assert_eq!(slugify(input), expected);
	}

	#[test]
	fn test_lower_camel_case_keeps_inner_capitals() {
		assert_eq!(lower_camel_case("ShippingZone"), "shippingZone");
		assert_eq!(lower_camel_case("shipping zone"), "shippingZone");
		assert_eq!(lower_camel_case(""), "");
	}

	#[test]
	fn test_short_type_name_mixed_separators() {
		assert_eq!(short_type_name("crate::App\\Countries"), "Countries");
	}
}
