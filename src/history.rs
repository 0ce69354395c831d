//! The browser-history boundary.
//!
//! The engine consumes session history as an opaque navigation primitive
//! behind the [`History`] trait. A browser host wraps the History API and
//! feeds `popstate` paths back through [`crate::Router::handle_pop`];
//! [`MemoryHistory`] is the in-process driver used by native hosts and by
//! the crate's tests.

use std::cell::{Cell, RefCell};

use serde::{Deserialize, Serialize};
use serde_json::Value;

/// A decoded location, split into its three components.
///
/// `search` keeps its leading `?` and `hash` its leading `#`, matching what
/// a browser location reports.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Location {
	/// The path component.
	pub pathname: String,
	/// The query string, including the leading `?` when present.
	pub search: String,
	/// The fragment, including the leading `#` when present.
	pub hash: String,
}

impl Location {
	/// Splits a full path string into its components.
	pub fn parse(path: &str) -> Self {
		let (rest, hash) = match path.find('#') {
			Some(index) => (&path[..index], &path[index..]),
			None => (path, ""),
		};
		let (pathname, search) = match rest.find('?') {
			Some(index) => (&rest[..index], &rest[index..]),
			None => (rest, ""),
		};

		Self {
			pathname: pathname.to_string(),
			search: search.to_string(),
			hash: hash.to_string(),
		}
	}

	/// Reassembles the full path string.
	pub fn full_path(&self) -> String {
		format!("{}{}{}", self.pathname, self.search, self.hash)
	}
}

/// History-entry metadata forwarded verbatim to the underlying driver.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct NavigationOptions {
	/// The history-entry title.
	pub title: Option<String>,
	/// An opaque data payload stored with the entry.
	pub state: Option<Value>,
}

impl NavigationOptions {
	/// Sets the history-entry title.
	pub fn with_title(mut self, title: impl Into<String>) -> Self {
		self.title = Some(title.into());
		self
	}

	/// Sets the opaque state payload.
	pub fn with_state(mut self, state: Value) -> Self {
		self.state = Some(state);
		self
	}
}

/// How a navigation records its history entry.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum NavigationType {
	Push,
	Replace,
}

/// An opaque session-history driver.
pub trait History {
	/// Records a new entry for `path`.
	fn push(&self, path: &str, options: &NavigationOptions);

	/// Replaces the current entry with `path`.
	fn replace(&self, path: &str, options: &NavigationOptions);

	/// Moves `delta` entries through the stack (negative values go back).
	///
	/// Returns the landing path when the move resolves synchronously, as
	/// the in-memory driver does. A browser driver returns `None` here and
	/// later reports the move through its `popstate` listener.
	fn go(&self, delta: isize) -> Option<String>;

	/// The current location.
	fn location(&self) -> Location;
}

#[derive(Debug, Clone)]
struct Entry {
	path: String,
	title: Option<String>,
	state: Option<Value>,
}

/// An in-process history stack.
#[derive(Debug)]
pub struct MemoryHistory {
	entries: RefCell<Vec<Entry>>,
	index: Cell<usize>,
}

impl MemoryHistory {
	/// Creates a history positioned at `/`.
	pub fn new() -> Self {
		Self::with_initial("/")
	}

	/// Creates a history positioned at the given path.
	pub fn with_initial(path: &str) -> Self {
		Self {
			entries: RefCell::new(vec![Entry {
				path: path.to_string(),
				title: None,
				state: None,
			}]),
			index: Cell::new(0),
		}
	}

	/// Number of entries in the stack.
	pub fn entry_count(&self) -> usize {
		self.entries.borrow().len()
	}

	/// The path of the current entry.
	pub fn current_path(&self) -> String {
		self.entries.borrow()[self.index.get()].path.clone()
	}

	/// The title recorded with the current entry.
	pub fn current_title(&self) -> Option<String> {
		self.entries.borrow()[self.index.get()].title.clone()
	}

	/// The state payload recorded with the current entry.
	pub fn current_state(&self) -> Option<Value> {
		self.entries.borrow()[self.index.get()].state.clone()
	}
}

impl Default for MemoryHistory {
	fn default() -> Self {
		Self::new()
	}
}

impl History for MemoryHistory {
	fn push(&self, path: &str, options: &NavigationOptions) {
		let mut entries = self.entries.borrow_mut();
		entries.truncate(self.index.get() + 1);
		entries.push(Entry {
			path: path.to_string(),
			title: options.title.clone(),
			state: options.state.clone(),
		});
		self.index.set(entries.len() - 1);
	}

	fn replace(&self, path: &str, options: &NavigationOptions) {
		let mut entries = self.entries.borrow_mut();
		let index = self.index.get();
		entries[index] = Entry {
			path: path.to_string(),
			title: options.title.clone(),
			state: options.state.clone(),
		};
	}

	fn go(&self, delta: isize) -> Option<String> {
		let entries = self.entries.borrow();
		let last = entries.len() as isize - 1;
		let target = (self.index.get() as isize + delta).clamp(0, last) as usize;
		self.index.set(target);
		Some(entries[target].path.clone())
	}

	fn location(&self) -> Location {
		Location::parse(&self.current_path())
	}
}

#[cfg(test)]
mod tests {
	use serde_json::json;

	use super::*;

	#[test]
	fn location_parse_splits_components() {
		let location = Location::parse("/a/b?q=1#frag");
		assert_eq!(location.pathname, "/a/b");
		assert_eq!(location.search, "?q=1");
		assert_eq!(location.hash, "#frag");
		assert_eq!(location.full_path(), "/a/b?q=1#frag");

		let bare = Location::parse("/a");
		assert_eq!(bare.search, "");
		assert_eq!(bare.hash, "");
	}

	#[test]
	fn push_truncates_forward_entries() {
		let history = MemoryHistory::new();
		history.push("/a", &NavigationOptions::default());
		history.push("/b", &NavigationOptions::default());
		assert_eq!(history.go(-2), Some("/".to_string()));

		history.push("/c", &NavigationOptions::default());
		assert_eq!(history.entry_count(), 2);
		assert_eq!(history.current_path(), "/c");
	}

	#[test]
	fn replace_swaps_in_place() {
		let history = MemoryHistory::new();
		history.push("/a", &NavigationOptions::default());
		history.replace("/b", &NavigationOptions::default());
		assert_eq!(history.entry_count(), 2);
		assert_eq!(history.current_path(), "/b");
	}

	#[test]
	fn go_clamps_to_stack_bounds() {
		let history = MemoryHistory::new();
		history.push("/a", &NavigationOptions::default());
		assert_eq!(history.go(-10), Some("/".to_string()));
		assert_eq!(history.go(10), Some("/a".to_string()));
	}

	#[test]
	fn options_are_recorded_verbatim() {
		let history = MemoryHistory::new();
		let options = NavigationOptions::default()
			.with_title("Users")
			.with_state(json!({"scroll": 0}));
		history.push("/users", &options);
		assert_eq!(history.current_title(), Some("Users".to_string()));
		assert_eq!(history.current_state(), Some(json!({"scroll": 0})));
	}
}
