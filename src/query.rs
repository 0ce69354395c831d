//! Flat key-value query string codec.
//!
//! Parsing and serialization preserve insertion order and perform no
//! percent-encoding; encoding of individual values is the caller's concern.

use std::fmt;

/// An ordered key-value view of a query string.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Query {
	entries: Vec<(String, String)>,
}

impl Query {
	/// Creates an empty query.
	pub fn new() -> Self {
		Self::default()
	}

	/// Parses a raw query string, or a full path ending in one.
	///
	/// Anything up to and including a leading `?` is stripped, as is any
	/// trailing `#fragment`. Empty input yields an empty query. Input
	/// without a `?` is treated as bare `key=value` content.
	pub fn parse(raw: &str) -> Self {
		let raw = match raw.find('?') {
			Some(index) => &raw[index + 1..],
			None => raw,
		};
		let raw = match raw.find('#') {
			Some(index) => &raw[..index],
			None => raw,
		};

		if raw.is_empty() {
			return Self::new();
		}

		let entries = raw
			.split('&')
			.map(|pair| match pair.split_once('=') {
				Some((key, value)) => (key.to_string(), value.to_string()),
				None => (pair.to_string(), String::new()),
			})
			.collect();

		Self { entries }
	}

	/// The value for `key`, if present.
	pub fn get(&self, key: &str) -> Option<&str> {
		self.entries
			.iter()
			.find(|(candidate, _)| candidate == key)
			.map(|(_, value)| value.as_str())
	}

	/// Whether `key` is present.
	pub fn contains_key(&self, key: &str) -> bool {
		self.get(key).is_some()
	}

	/// Sets `key` to `value`, replacing an existing entry in place or
	/// appending a new one.
	pub fn insert(&mut self, key: impl Into<String>, value: impl Into<String>) {
		let key = key.into();
		let value = value.into();
		match self.entries.iter_mut().find(|(candidate, _)| *candidate == key) {
			Some(entry) => entry.1 = value,
			None => self.entries.push((key, value)),
		}
	}

	/// Key-value pairs in insertion order.
	pub fn iter(&self) -> impl Iterator<Item = (&str, &str)> {
		self.entries
			.iter()
			.map(|(key, value)| (key.as_str(), value.as_str()))
	}

	/// Number of entries.
	pub fn len(&self) -> usize {
		self.entries.len()
	}

	/// Whether the query has no entries.
	pub fn is_empty(&self) -> bool {
		self.entries.is_empty()
	}
}

impl fmt::Display for Query {
	fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
		for (index, (key, value)) in self.entries.iter().enumerate() {
			if index > 0 {
				f.write_str("&")?;
			}
			write!(f, "{key}={value}")?;
		}
		Ok(())
	}
}

impl FromIterator<(String, String)> for Query {
	fn from_iter<I: IntoIterator<Item = (String, String)>>(iter: I) -> Self {
		Self {
			entries: iter.into_iter().collect(),
		}
	}
}

#[cfg(test)]
mod tests {
	use super::*;

	#[test]
	fn parse_strips_leading_question_mark() {
		let query = Query::parse("?a=1&b=2");
		assert_eq!(query.get("a"), Some("1"));
		assert_eq!(query.get("b"), Some("2"));
		assert_eq!(query.len(), 2);
	}

	#[test]
	fn parse_accepts_a_full_path() {
		let query = Query::parse("/users/42?tab=posts&page=2#top");
		assert_eq!(query.get("tab"), Some("posts"));
		assert_eq!(query.get("page"), Some("2"));
		assert!(!query.contains_key("top"));
	}

	#[test]
	fn empty_input_yields_empty_query() {
		assert!(Query::parse("").is_empty());
		assert!(Query::parse("?").is_empty());
		assert!(Query::parse("#frag").is_empty());
	}

	#[test]
	fn serialization_round_trips_in_order() {
		let raw = "k1=v1&k2=v2&k3=v3";
		assert_eq!(Query::parse(raw).to_string(), raw);
	}

	#[test]
	fn value_less_key_parses_to_empty_value() {
		let query = Query::parse("flag&x=1");
		assert_eq!(query.get("flag"), Some(""));
		assert_eq!(query.get("x"), Some("1"));
	}

	#[test]
	fn insert_replaces_in_place() {
		let mut query = Query::parse("a=1&b=2");
		query.insert("a", "9");
		query.insert("c", "3");
		assert_eq!(query.to_string(), "a=9&b=2&c=3");
	}
}
