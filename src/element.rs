//! Host-side element and component abstractions.
//!
//! The router never touches a real document: the host supplies element
//! instances behind the [`Element`] trait and component constructors behind
//! [`Component`]. A browser host implements these over its custom elements;
//! the crate's own tests use the in-memory tree from [`crate::testing`].

use std::any::Any;
use std::error::Error;
use std::fmt;
use std::future::Future;
use std::rc::Rc;

use futures_util::FutureExt;
use futures_util::future::LocalBoxFuture;
use serde_json::Value;

/// A mounted UI element, owned by the host.
///
/// All mutation goes through `&self`; implementations are expected to use
/// interior mutability, mirroring how document nodes behave.
pub trait Element {
	/// The element's tag name.
	fn tag(&self) -> &str;

	/// Appends `child` to this element, reparenting it if necessary.
	fn append_child(&self, child: ElementHandle);

	/// Detaches this element from its parent. No-op when unparented.
	fn remove(&self);

	/// Writes an attribute, e.g. the `slot` projection target.
	fn set_attribute(&self, name: &str, value: &str);

	/// Assigns a named property value on the element instance.
	fn set_property(&self, name: &str, value: Value);

	/// The property names this element recognizes.
	///
	/// The router only assigns parameters and route-resolved properties
	/// whose names appear here; everything else is silently ignored.
	fn property_names(&self) -> &[&str] {
		&[]
	}

	/// Concrete access for host implementations.
	fn as_any(&self) -> &dyn Any;
}

/// A shared handle to a mounted element.
pub type ElementHandle = Rc<dyn Element>;

/// A component constructor: each call produces a fresh element instance.
///
/// Identity is `Rc` pointer identity, which is what the resolved-component
/// cache relies on.
pub type Component = Rc<dyn Fn() -> ElementHandle>;

/// Outcome of a lazy component load.
pub type LoaderResult = Result<Component, Box<dyn Error>>;

/// A lazy component loader.
pub type Loader = Rc<dyn Fn() -> LocalBoxFuture<'static, LoaderResult>>;

/// How a route obtains its component constructor.
///
/// The variant is decided once, at configuration time, from the shape of the
/// declaration; resolution never inspects the value's runtime shape.
#[derive(Clone)]
pub enum ComponentSource {
	/// A concrete constructor, resolved synchronously.
	Direct(Component),
	/// A loader invoked on first resolution, its result cached thereafter.
	Loader(Loader),
}

impl ComponentSource {
	/// Wraps a concrete constructor.
	pub fn direct<F>(constructor: F) -> Self
	where
		F: Fn() -> ElementHandle + 'static,
	{
		Self::Direct(Rc::new(constructor))
	}

	/// Wraps an asynchronous loader.
	pub fn loader<F, Fut>(load: F) -> Self
	where
		F: Fn() -> Fut + 'static,
		Fut: Future<Output = LoaderResult> + 'static,
	{
		Self::Loader(Rc::new(move || load().boxed_local()))
	}
}

impl fmt::Debug for ComponentSource {
	fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
		match self {
			Self::Direct(_) => f.write_str("ComponentSource::Direct"),
			Self::Loader(_) => f.write_str("ComponentSource::Loader"),
		}
	}
}
