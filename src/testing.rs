//! In-memory element tree and component helpers for tests.
//!
//! [`MockElement`] stands in for a host document: appends, removals, slot
//! attributes, and property assignments are all recorded so assertions can
//! inspect the mounted tree after a render.

use std::any::Any;
use std::cell::{Cell, RefCell};
use std::collections::HashMap;
use std::ptr;
use std::rc::{Rc, Weak};

use serde_json::Value;

use crate::element::{Component, ComponentSource, Element, ElementHandle, LoaderResult};

/// An in-memory element with a recorded parent/child tree.
pub struct MockElement {
	this: Weak<MockElement>,
	tag: String,
	recognized: &'static [&'static str],
	parent: RefCell<Weak<MockElement>>,
	children: RefCell<Vec<Rc<MockElement>>>,
	attributes: RefCell<HashMap<String, String>>,
	values: RefCell<HashMap<String, Value>>,
}

impl MockElement {
	/// Creates a detached element recognizing the given property names.
	pub fn new(tag: impl Into<String>, recognized: &'static [&'static str]) -> Rc<Self> {
		let tag = tag.into();
		Rc::new_cyclic(|this| Self {
			this: this.clone(),
			tag,
			recognized,
			parent: RefCell::new(Weak::new()),
			children: RefCell::new(Vec::new()),
			attributes: RefCell::new(HashMap::new()),
			values: RefCell::new(HashMap::new()),
		})
	}

	/// A bare container suitable as a router root.
	pub fn root() -> Rc<Self> {
		Self::new("root", &[])
	}

	/// The element's current children, in insertion order.
	pub fn children(&self) -> Vec<Rc<MockElement>> {
		self.children.borrow().clone()
	}

	/// The tags of the element's current children.
	pub fn child_tags(&self) -> Vec<String> {
		self.children
			.borrow()
			.iter()
			.map(|child| child.tag.clone())
			.collect()
	}

	/// The element's current parent, if attached.
	pub fn parent(&self) -> Option<Rc<MockElement>> {
		self.parent.borrow().upgrade()
	}

	/// The last value written for an attribute.
	pub fn attribute(&self, name: &str) -> Option<String> {
		self.attributes.borrow().get(name).cloned()
	}

	/// The last value assigned to a property.
	pub fn property(&self, name: &str) -> Option<Value> {
		self.values.borrow().get(name).cloned()
	}

	fn detach(&self) {
		if let Some(parent) = self.parent.borrow().upgrade() {
			parent
				.children
				.borrow_mut()
				.retain(|child| !ptr::eq(Rc::as_ptr(child), self));
		}
		*self.parent.borrow_mut() = Weak::new();
	}
}

impl Element for MockElement {
	fn tag(&self) -> &str {
		&self.tag
	}

	fn append_child(&self, child: ElementHandle) {
		let Some(child) = child.as_any().downcast_ref::<MockElement>() else {
			panic!("MockElement can only adopt MockElement children");
		};
		let Some(child) = child.this.upgrade() else {
			return;
		};
		child.detach();
		*child.parent.borrow_mut() = self.this.clone();
		self.children.borrow_mut().push(child);
	}

	fn remove(&self) {
		self.detach();
	}

	fn set_attribute(&self, name: &str, value: &str) {
		self.attributes
			.borrow_mut()
			.insert(name.to_string(), value.to_string());
	}

	fn set_property(&self, name: &str, value: Value) {
		self.values.borrow_mut().insert(name.to_string(), value);
	}

	fn property_names(&self) -> &[&str] {
		self.recognized
	}

	fn as_any(&self) -> &dyn Any {
		self
	}
}

impl std::fmt::Debug for MockElement {
	fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
		f.debug_struct("MockElement")
			.field("tag", &self.tag)
			.field("children", &self.children.borrow().len())
			.finish()
	}
}

/// Downcasts a mounted element handle back to a [`MockElement`].
pub fn as_mock(element: &ElementHandle) -> Rc<MockElement> {
	element
		.as_any()
		.downcast_ref::<MockElement>()
		.and_then(|mock| mock.this.upgrade())
		.unwrap_or_else(|| panic!("element is not a MockElement"))
}

/// A constructor producing fresh [`MockElement`] instances.
pub fn component(tag: &'static str, recognized: &'static [&'static str]) -> Component {
	Rc::new(move || {
		let element: ElementHandle = MockElement::new(tag, recognized);
		element
	})
}

/// A direct component source over [`component`].
pub fn source(tag: &'static str, recognized: &'static [&'static str]) -> ComponentSource {
	ComponentSource::Direct(component(tag, recognized))
}

/// A loader source that counts invocations, for cache assertions.
pub fn counting_loader(constructor: Component) -> (ComponentSource, Rc<Cell<usize>>) {
	let calls = Rc::new(Cell::new(0));
	let counter = Rc::clone(&calls);
	let source = ComponentSource::loader(move || {
		counter.set(counter.get() + 1);
		let constructor = Rc::clone(&constructor);
		async move {
			let loaded: LoaderResult = Ok(constructor);
			loaded
		}
	});
	(source, calls)
}

/// A loader source that always fails with the given message.
pub fn failing_loader(message: &'static str) -> ComponentSource {
	ComponentSource::loader(move || async move {
		let failed: LoaderResult = Err(message.into());
		failed
	})
}
