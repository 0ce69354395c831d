//! A small reusable publish/subscribe utility.
//!
//! One emitter implementation serves every component that needs change
//! notifications; listeners are identified by reference, so the same
//! callback can be removed with the handle it was added with.

use std::cell::RefCell;
use std::collections::HashMap;
use std::hash::Hash;
use std::rc::Rc;

/// Events emitted by the navigation engine.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum RouterEvent {
	/// The router attached to a root container and completed its first render.
	Connect,
	/// The router detached from its root container.
	Disconnect,
	/// A new history entry was recorded.
	Push,
	/// The current history entry was replaced.
	Replace,
	/// A history move re-entered the router.
	Pop,
	/// The mounted element chain was reconciled.
	Render,
}

/// A subscriber callback, removable by reference identity.
pub type Listener<E> = Rc<dyn Fn(E)>;

/// Maps event kinds to their listener sets.
pub struct EventEmitter<E> {
	listeners: RefCell<HashMap<E, Vec<Listener<E>>>>,
}

impl<E: Copy + Eq + Hash> EventEmitter<E> {
	/// Creates an emitter with no listeners.
	pub fn new() -> Self {
		Self {
			listeners: RefCell::new(HashMap::new()),
		}
	}

	/// Subscribes `listener` to `event`. Adding the same listener twice is
	/// a no-op.
	pub fn on(&self, event: E, listener: &Listener<E>) {
		let mut map = self.listeners.borrow_mut();
		let entry = map.entry(event).or_default();
		if !entry.iter().any(|existing| Rc::ptr_eq(existing, listener)) {
			entry.push(Rc::clone(listener));
		}
	}

	/// Removes `listener` from `event`, matching by reference identity.
	pub fn off(&self, event: E, listener: &Listener<E>) {
		if let Some(entry) = self.listeners.borrow_mut().get_mut(&event) {
			entry.retain(|existing| !Rc::ptr_eq(existing, listener));
		}
	}

	/// Invokes every listener subscribed to `event`, in subscription order.
	///
	/// The listener set is snapshotted first, so a listener may subscribe
	/// or unsubscribe during dispatch without invalidating the iteration.
	pub fn emit(&self, event: E) {
		let snapshot = self
			.listeners
			.borrow()
			.get(&event)
			.cloned()
			.unwrap_or_default();
		for listener in snapshot {
			listener(event);
		}
	}

	/// Number of listeners currently subscribed to `event`.
	pub fn listener_count(&self, event: E) -> usize {
		self.listeners
			.borrow()
			.get(&event)
			.map_or(0, |entry| entry.len())
	}
}

impl<E: Copy + Eq + Hash> Default for EventEmitter<E> {
	fn default() -> Self {
		Self::new()
	}
}

#[cfg(test)]
mod tests {
	use std::cell::Cell;

	use super::*;

	#[test]
	fn emit_reaches_subscribed_listeners() {
		let emitter = EventEmitter::new();
		let count = Rc::new(Cell::new(0));
		let listener: Listener<RouterEvent> = {
			let count = Rc::clone(&count);
			Rc::new(move |_| count.set(count.get() + 1))
		};

		emitter.on(RouterEvent::Render, &listener);
		emitter.emit(RouterEvent::Render);
		emitter.emit(RouterEvent::Render);
		assert_eq!(count.get(), 2);

		// Other events do not reach the listener.
		emitter.emit(RouterEvent::Push);
		assert_eq!(count.get(), 2);
	}

	#[test]
	fn off_removes_by_reference() {
		let emitter = EventEmitter::new();
		let count = Rc::new(Cell::new(0));
		let listener: Listener<RouterEvent> = {
			let count = Rc::clone(&count);
			Rc::new(move |_| count.set(count.get() + 1))
		};

		emitter.on(RouterEvent::Render, &listener);
		emitter.off(RouterEvent::Render, &listener);
		emitter.emit(RouterEvent::Render);
		assert_eq!(count.get(), 0);
		assert_eq!(emitter.listener_count(RouterEvent::Render), 0);
	}

	#[test]
	fn duplicate_subscription_is_ignored() {
		let emitter = EventEmitter::new();
		let count = Rc::new(Cell::new(0));
		let listener: Listener<RouterEvent> = {
			let count = Rc::clone(&count);
			Rc::new(move |_| count.set(count.get() + 1))
		};

		emitter.on(RouterEvent::Render, &listener);
		emitter.on(RouterEvent::Render, &listener);
		emitter.emit(RouterEvent::Render);
		assert_eq!(count.get(), 1);
	}
}
