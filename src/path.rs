//! Path pattern compilation and parameter extraction.
//!
//! A [`Pattern`] is compiled once from a route's path string and then reused
//! for every match: `:name` segments become capturing groups, `**` becomes a
//! single-segment wildcard, and matching is case-insensitive. Exact patterns
//! are anchored at both ends (tolerating a trailing slash and a trailing
//! query/hash suffix); non-exact patterns are prefix matchers, which is what
//! lets a parent route match before its children are consulted.

use std::borrow::Cow;

use regex::Regex;

use crate::error::RouterError;

/// Matches one path segment, stopping at the query or hash boundary.
const WILDCARD_SEGMENT: &str = "[^/?#]*";

/// Capturing group for a `:name` parameter.
const PARAMETER_SEGMENT: &str = "([^/?#]+)";

/// Optional query string and hash fragment, then the end anchor.
const EXACT_TAIL: &str = r"(?:\?[^#]*)?(?:#.*)?$";

/// A compiled route path pattern.
#[derive(Debug, Clone)]
pub struct Pattern {
	path: String,
	exact: bool,
	regex: Regex,
	keys: Vec<String>,
}

impl Pattern {
	/// Compiles a path string into a matching pattern.
	///
	/// # Errors
	///
	/// Returns [`RouterError::Pattern`] when the path contains syntax the
	/// underlying expression engine rejects, so malformed route
	/// configuration fails at construction time rather than mid-navigation.
	pub fn compile(path: &str, exact: bool) -> Result<Self, RouterError> {
		let mut source = String::with_capacity(path.len() + 16);
		let mut keys = Vec::new();

		let mut rest = path;
		while !rest.is_empty() {
			if let Some(after) = rest.strip_prefix("**") {
				source.push_str(WILDCARD_SEGMENT);
				rest = after;
			} else if let Some(after) = rest.strip_prefix(':') {
				let end = after.find(['/', '?', '#']).unwrap_or(after.len());
				if end == 0 {
					// A bare colon is not a parameter.
					source.push(':');
					rest = after;
					continue;
				}
				keys.push(after[..end].to_string());
				source.push_str(PARAMETER_SEGMENT);
				rest = &after[end..];
			} else {
				let mut chars = rest.chars();
				// `rest` is non-empty here.
				if let Some(ch) = chars.next() {
					source.push(ch);
				}
				rest = chars.as_str();
			}
		}

		// Tolerate one trailing slash when the pattern itself has none. The
		// quantifier is lazy so the reported match extent stops at the
		// consumed segment rather than swallowing the separator.
		if !source.ends_with('/') {
			source.push_str("/??");
		}

		let anchored = if exact {
			format!("(?i)^{source}{EXACT_TAIL}")
		} else {
			format!("(?i)^{source}")
		};

		let regex = Regex::new(&anchored).map_err(|source| RouterError::Pattern {
			pattern: path.to_string(),
			source,
		})?;

		Ok(Self {
			path: path.to_string(),
			exact,
			regex,
			keys,
		})
	}

	/// The original path string this pattern was compiled from.
	pub fn path(&self) -> &str {
		&self.path
	}

	/// Whether the pattern is anchored at the end.
	pub fn is_exact(&self) -> bool {
		self.exact
	}

	/// Parameter names in declaration order.
	pub fn keys(&self) -> &[String] {
		&self.keys
	}

	/// Tests the given path against the compiled pattern.
	pub fn matches(&self, path: &str) -> bool {
		self.regex.is_match(path)
	}

	/// The substring of `path` the pattern actually consumed, or the empty
	/// string when the path does not match.
	pub fn matched_prefix(&self, path: &str) -> String {
		self.regex
			.find(path)
			.map(|found| found.as_str().to_string())
			.unwrap_or_default()
	}

	/// Captured parameter values in declaration order.
	///
	/// A non-matching path yields an empty list, equivalent to "no match".
	pub fn values(&self, path: &str) -> Vec<String> {
		match self.regex.captures(path) {
			Some(captures) => captures
				.iter()
				.skip(1)
				.map(|group| group.map(|m| m.as_str().to_string()).unwrap_or_default())
				.collect(),
			None => Vec::new(),
		}
	}

	/// Parses a path into an ordered name/value parameter view.
	pub fn parse(&self, path: &str) -> Parameters {
		Parameters {
			keys: self.keys.clone(),
			values: self.values(path),
		}
	}

	/// Substitutes parameters captured from `from` into `:name` occurrences
	/// in `to`.
	///
	/// Substitution runs from the last parameter to the first so that a
	/// shorter name never corrupts a not-yet-substituted longer name that
	/// contains it as a prefix.
	pub fn transfer(&self, from: &str, to: &str) -> String {
		let values = self.values(from);
		let mut transferred = to.to_string();
		for (key, value) in self.keys.iter().zip(values.iter()).rev() {
			transferred = transferred.replacen(&format!(":{key}"), value, 1);
		}
		transferred
	}
}

/// Ordered named-parameter view over a matched path.
#[derive(Debug, Clone, Default)]
pub struct Parameters {
	keys: Vec<String>,
	values: Vec<String>,
}

impl Parameters {
	/// The value captured for `key`, if the pattern declares it and the
	/// path matched.
	pub fn get(&self, key: &str) -> Option<&str> {
		self.keys
			.iter()
			.position(|candidate| candidate == key)
			.and_then(|index| self.values.get(index))
			.map(String::as_str)
	}

	/// Whether a value was captured for `key`.
	pub fn has(&self, key: &str) -> bool {
		self.get(key).is_some()
	}

	/// Name/value pairs in declaration order.
	pub fn entries(&self) -> impl Iterator<Item = (&str, &str)> {
		self.keys
			.iter()
			.map(String::as_str)
			.zip(self.values.iter().map(String::as_str))
	}

	/// Number of captured parameters.
	pub fn len(&self) -> usize {
		self.values.len()
	}

	/// Whether no parameters were captured.
	pub fn is_empty(&self) -> bool {
		self.values.is_empty()
	}
}

/// Ensures a leading slash and collapses repeated separators.
pub(crate) fn normalize(path: &str) -> String {
	let mut normalized = String::with_capacity(path.len() + 1);
	for ch in format!("/{path}").chars() {
		if ch == '/' && normalized.ends_with('/') {
			continue;
		}
		normalized.push(ch);
	}
	normalized
}

/// Percent-decodes a location component, falling back to the raw input when
/// the encoding is malformed.
pub(crate) fn decode(input: &str) -> String {
	urlencoding::decode(input)
		.map(Cow::into_owned)
		.unwrap_or_else(|_| input.to_string())
}

#[cfg(test)]
mod tests {
	use rstest::rstest;

	use super::*;

	#[rstest]
	#[case("/a/1/b", true)]
	#[case("/a/1/b/", true)]
	#[case("/a/one-two/b", true)]
	#[case("/a/b", false)]
	#[case("/a/1/2/b", false)]
	#[case("/a/1/b/c", false)]
	fn exact_parameter_pattern(#[case] path: &str, #[case] expected: bool) {
		let pattern = Pattern::compile("/a/:x/b", true).unwrap();
		assert_eq!(pattern.matches(path), expected, "path: {path}");
	}

	#[rstest]
	#[case("/a/1/b?q=1", true)]
	#[case("/a/1/b#frag", true)]
	#[case("/a/1/b?q=1#frag", true)]
	#[case("/a/1/b/extra", false)]
	fn exact_pattern_tolerates_query_and_hash(#[case] path: &str, #[case] expected: bool) {
		let pattern = Pattern::compile("/a/:x/b", true).unwrap();
		assert_eq!(pattern.matches(path), expected, "path: {path}");
	}

	#[test]
	fn non_exact_pattern_matches_prefixes() {
		let pattern = Pattern::compile("/users", false).unwrap();
		assert!(pattern.matches("/users"));
		assert!(pattern.matches("/users/42"));
		assert!(!pattern.matches("/accounts"));
	}

	#[test]
	fn matching_is_case_insensitive() {
		let pattern = Pattern::compile("/Users/:id", true).unwrap();
		assert!(pattern.matches("/users/42"));
		assert!(pattern.matches("/USERS/42"));
	}

	#[test]
	fn wildcard_spans_a_single_segment() {
		let pattern = Pattern::compile("/files/**", true).unwrap();
		assert!(pattern.matches("/files/report.txt"));
		assert!(pattern.matches("/files/"));
		assert!(!pattern.matches("/files/a/b"));
	}

	#[test]
	fn keys_follow_declaration_order() {
		let pattern = Pattern::compile("/:a/:b/:c", true).unwrap();
		assert_eq!(pattern.keys(), ["a", "b", "c"]);
		assert_eq!(pattern.values("/1/2/3"), ["1", "2", "3"]);
	}

	#[test]
	fn values_of_non_matching_path_are_empty() {
		let pattern = Pattern::compile("/a/:x", true).unwrap();
		assert!(pattern.values("/b/1").is_empty());
		assert_eq!(pattern.matched_prefix("/b/1"), "");
	}

	#[test]
	fn matched_prefix_stops_at_the_consumed_part() {
		let pattern = Pattern::compile("/users", false).unwrap();
		assert_eq!(pattern.matched_prefix("/users/42/posts"), "/users");
	}

	#[test]
	fn parse_zips_names_and_values() {
		let pattern = Pattern::compile("/users/:id/posts/:post", true).unwrap();
		let parameters = pattern.parse("/users/7/posts/42");
		assert_eq!(parameters.get("id"), Some("7"));
		assert_eq!(parameters.get("post"), Some("42"));
		assert!(!parameters.has("missing"));
		let entries: Vec<_> = parameters.entries().collect();
		assert_eq!(entries, [("id", "7"), ("post", "42")]);
	}

	#[test]
	fn transfer_fills_target_parameters() {
		let pattern = Pattern::compile("/:a/:b/:c", true).unwrap();
		assert_eq!(pattern.transfer("/1/2/3", "/:c/:b/:a/abc"), "/3/2/1/abc");
	}

	#[test]
	fn transfer_substitutes_longer_names_first() {
		// `:ab` contains `:a` as a prefix; substituting from the last key
		// backwards keeps it intact.
		let pattern = Pattern::compile("/:a/:ab", true).unwrap();
		assert_eq!(pattern.transfer("/1/2", "/:ab/:a"), "/2/1");
	}

	#[test]
	fn zero_parameter_pattern_has_empty_map() {
		let pattern = Pattern::compile("/about", true).unwrap();
		let parameters = pattern.parse("/about");
		assert!(parameters.is_empty());
		assert_eq!(parameters.len(), 0);
	}

	#[test]
	fn malformed_pattern_fails_to_compile() {
		let error = Pattern::compile("/bad(", true).unwrap_err();
		assert!(matches!(error, RouterError::Pattern { .. }));
	}

	#[rstest]
	#[case("a/b", "/a/b")]
	#[case("/a//b", "/a/b")]
	#[case("//a///b/", "/a/b/")]
	#[case("", "/")]
	fn normalize_collapses_separators(#[case] input: &str, #[case] expected: &str) {
		assert_eq!(normalize(input), expected);
	}

	#[test]
	fn decode_unescapes_percent_sequences() {
		assert_eq!(decode("/caf%C3%A9"), "/café");
		assert_eq!(decode("/plain"), "/plain");
	}
}
