//! Navigation link behavior.
//!
//! [`RouterLink`] is the behavior behind an anchor-like host element: it
//! decides which clicks belong to the router, performs the push, and tracks
//! whether its target matches the current location so the host can style an
//! active link.

use std::cell::{Cell, RefCell};
use std::rc::Rc;

use crate::error::RouterError;
use crate::events::{Listener, RouterEvent};
use crate::path::decode;
use crate::router::Router;

/// The subset of a pointer event the link behavior inspects.
///
/// Hosts translate their native click events into this shape. The default
/// value is a plain unmodified primary-button click.
#[derive(Debug, Clone)]
pub struct ClickEvent {
	pub meta_key: bool,
	pub alt_key: bool,
	pub ctrl_key: bool,
	pub shift_key: bool,
	/// Pressed button, `0` for the primary button.
	pub button: i16,
	/// Whether another handler already claimed the event.
	pub default_prevented: bool,
}

impl Default for ClickEvent {
	fn default() -> Self {
		Self {
			meta_key: false,
			alt_key: false,
			ctrl_key: false,
			shift_key: false,
			button: 0,
			default_prevented: false,
		}
	}
}

impl ClickEvent {
	/// Whether the click is a plain primary-button activation the router
	/// should claim. Modified clicks are left to the host, so open-in-new-tab
	/// gestures keep working.
	pub fn is_plain(&self) -> bool {
		!self.default_prevented
			&& self.button == 0
			&& !self.meta_key
			&& !self.alt_key
			&& !self.ctrl_key
			&& !self.shift_key
	}
}

struct LinkState {
	to: RefCell<String>,
	exact: Cell<bool>,
	active: Cell<bool>,
	disabled: Cell<bool>,
}

impl LinkState {
	fn refresh(&self, pathname: &str) {
		let to = self.to.borrow();
		self.active.set(is_match(pathname, &to, self.exact.get()));
	}
}

/// A router-aware link bound to one target path.
pub struct RouterLink {
	router: Rc<Router>,
	state: Rc<LinkState>,
	listener: Listener<RouterEvent>,
}

impl RouterLink {
	/// Creates a link targeting `to` and starts tracking the active state
	/// against the router's renders.
	pub fn new(router: Rc<Router>, to: impl Into<String>) -> Self {
		let state = Rc::new(LinkState {
			to: RefCell::new(to.into()),
			exact: Cell::new(false),
			active: Cell::new(false),
			disabled: Cell::new(false),
		});

		let tracked = Rc::clone(&state);
		let history = router.history();
		let listener: Listener<RouterEvent> = Rc::new(move |_| {
			tracked.refresh(&decode(&history.location().pathname));
		});
		router.on(RouterEvent::Render, &listener);

		let link = Self {
			router,
			state,
			listener,
		};
		link.refresh();
		link
	}

	/// The link's target path.
	pub fn to(&self) -> String {
		self.state.to.borrow().clone()
	}

	/// Points the link at a new target and recomputes the active state.
	pub fn set_to(&self, to: impl Into<String>) {
		*self.state.to.borrow_mut() = to.into();
		self.refresh();
	}

	/// Whether active-state matching requires the full path rather than a
	/// prefix.
	pub fn is_exact(&self) -> bool {
		self.state.exact.get()
	}

	pub fn set_exact(&self, exact: bool) {
		self.state.exact.set(exact);
		self.refresh();
	}

	/// Whether the link's target matches the current location.
	pub fn is_active(&self) -> bool {
		self.state.active.get()
	}

	/// Whether clicks are ignored.
	pub fn is_disabled(&self) -> bool {
		self.state.disabled.get()
	}

	/// Disabling also stops active-state tracking and clears the flag;
	/// re-enabling resubscribes and recomputes it.
	pub fn set_disabled(&self, disabled: bool) {
		if disabled == self.state.disabled.get() {
			return;
		}
		self.state.disabled.set(disabled);
		if disabled {
			self.router.off(RouterEvent::Render, &self.listener);
			self.state.active.set(false);
		} else {
			self.router.on(RouterEvent::Render, &self.listener);
			self.refresh();
		}
	}

	/// Handles a host click. Returns `true` when the router claimed the
	/// event and navigated; the host should then suppress its default
	/// action. Modified, secondary, already-claimed, or disabled clicks are
	/// left alone.
	///
	/// # Errors
	///
	/// Propagates navigation failures from the underlying push.
	pub async fn click(&self, event: &ClickEvent) -> Result<bool, RouterError> {
		if self.state.disabled.get() || !event.is_plain() {
			return Ok(false);
		}
		let to = self.state.to.borrow().clone();
		self.router.push(&to).await?;
		Ok(true)
	}

	/// Stops tracking router renders. Call before dropping the link when
	/// the router outlives it.
	pub fn detach(&self) {
		self.router.off(RouterEvent::Render, &self.listener);
	}

	fn refresh(&self) {
		let pathname = decode(&self.router.history().location().pathname);
		self.state.refresh(&pathname);
	}
}

impl std::fmt::Debug for RouterLink {
	fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
		f.debug_struct("RouterLink")
			.field("to", &*self.state.to.borrow())
			.field("active", &self.state.active.get())
			.field("disabled", &self.state.disabled.get())
			.finish()
	}
}

/// Whether `to` matches the current `pathname`.
///
/// Absolute targets compare against the front of the path, the whole path
/// when `exact`. Relative targets compare against the tail, so a link to
/// `settings` stays active on `/account/settings`.
fn is_match(pathname: &str, to: &str, exact: bool) -> bool {
	if to.starts_with('/') {
		if exact {
			pathname == to
		} else {
			pathname.starts_with(to)
		}
	} else {
		pathname.ends_with(to)
	}
}

#[cfg(test)]
mod tests {
	use super::*;

	#[test]
	fn plain_primary_clicks_are_claimed() {
		assert!(ClickEvent::default().is_plain());
	}

	#[test]
	fn modified_clicks_are_left_to_the_host() {
		let meta = ClickEvent {
			meta_key: true,
			..ClickEvent::default()
		};
		let middle = ClickEvent {
			button: 1,
			..ClickEvent::default()
		};
		let claimed = ClickEvent {
			default_prevented: true,
			..ClickEvent::default()
		};
		assert!(!meta.is_plain());
		assert!(!middle.is_plain());
		assert!(!claimed.is_plain());
	}

	#[test]
	fn absolute_targets_match_by_prefix_or_exactly() {
		assert!(is_match("/account/settings", "/account", false));
		assert!(!is_match("/account/settings", "/account", true));
		assert!(is_match("/account", "/account", true));
	}

	#[test]
	fn relative_targets_match_the_path_tail() {
		assert!(is_match("/account/settings", "settings", false));
		assert!(!is_match("/account/profile", "settings", false));
	}
}
