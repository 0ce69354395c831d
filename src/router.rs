//! The navigation engine.
//!
//! [`Router`] owns the compiled route tree, the currently-active route
//! chain, and the chain of mounted elements. Every navigation source —
//! `connect`, `push`/`replace`, or a history move re-entering through
//! [`Router::handle_pop`] — funnels into the same resolve/render pathway.
//!
//! Navigation calls are expected to be issued sequentially; two overlapping
//! un-awaited renders race, and the last one to finish wins. The engine does
//! not serialize them.

use std::cell::{Cell, RefCell};
use std::rc::Rc;

use futures_util::future::try_join_all;
use serde_json::Value;

use crate::element::{Component, ElementHandle};
use crate::error::RouterError;
use crate::events::{EventEmitter, Listener, RouterEvent};
use crate::history::{History, Location, NavigationOptions, NavigationType};
use crate::path::decode;
use crate::route::{Route, RouteConfig};

/// Redirect chains deeper than this are treated as loops.
const MAX_REDIRECTS: usize = 32;

/// Outcome of resolving a path against the route tree.
#[derive(Debug, Clone)]
pub struct Resolution {
	/// The matched route chain, root-most first. Empty when nothing matched.
	pub matched: Vec<Rc<Route>>,
	/// The effective path, rewritten when redirects were followed.
	pub path: String,
}

/// A client-side navigation router.
pub struct Router {
	routes: Vec<Rc<Route>>,
	history: Rc<dyn History>,
	events: EventEmitter<RouterEvent>,
	root: RefCell<Option<ElementHandle>>,
	active: RefCell<Vec<Rc<Route>>>,
	elements: RefCell<Vec<ElementHandle>>,
	connected: Cell<bool>,
}

impl Router {
	/// Compiles the route forest and binds the router to a history driver.
	///
	/// # Errors
	///
	/// Surfaces pattern and configuration errors immediately; a router that
	/// constructs successfully cannot fail to match at navigation time.
	pub fn new(
		configs: impl IntoIterator<Item = RouteConfig>,
		history: Rc<dyn History>,
	) -> Result<Self, RouterError> {
		let routes = configs
			.into_iter()
			.map(|config| Route::build(&config, ""))
			.collect::<Result<Vec<_>, _>>()?;

		Ok(Self {
			routes,
			history,
			events: EventEmitter::new(),
			root: RefCell::new(None),
			active: RefCell::new(Vec::new()),
			elements: RefCell::new(Vec::new()),
			connected: Cell::new(false),
		})
	}

	/// Whether the router is attached to a root container.
	pub fn is_connected(&self) -> bool {
		self.connected.get()
	}

	/// The compiled top-level routes.
	pub fn routes(&self) -> &[Rc<Route>] {
		&self.routes
	}

	/// The currently-active route chain.
	pub fn active_routes(&self) -> Vec<Rc<Route>> {
		self.active.borrow().clone()
	}

	/// The currently-mounted element chain, positionally parallel to
	/// [`Router::active_routes`].
	pub fn elements(&self) -> Vec<ElementHandle> {
		self.elements.borrow().clone()
	}

	/// The history driver the router was constructed with.
	pub fn history(&self) -> Rc<dyn History> {
		Rc::clone(&self.history)
	}

	/// Subscribes a listener to router events.
	pub fn on(&self, event: RouterEvent, listener: &Listener<RouterEvent>) {
		self.events.on(event, listener);
	}

	/// Removes a previously subscribed listener.
	pub fn off(&self, event: RouterEvent, listener: &Listener<RouterEvent>) {
		self.events.off(event, listener);
	}

	/// Attaches the router to a root container and renders the current
	/// location.
	///
	/// # Errors
	///
	/// Fails when redirect resolution loops or a component load fails; the
	/// router stays connected so the host can navigate elsewhere.
	pub async fn connect(&self, root: ElementHandle) -> Result<(), RouterError> {
		self.connected.set(true);
		*self.root.borrow_mut() = Some(root);

		let to = decode(&self.history.location().pathname);
		tracing::debug!(path = %to, "connecting router");
		let resolution = self.resolve(&to)?;
		self.history
			.replace(&resolution.path, &NavigationOptions::default());
		self.render(resolution.matched).await?;
		self.events.emit(RouterEvent::Connect);
		Ok(())
	}

	/// Detaches the router, tearing down every mounted element.
	///
	/// The compiled route tree is kept, so the router can be connected
	/// again later.
	pub fn disconnect(&self) {
		self.connected.set(false);
		self.active.borrow_mut().clear();
		*self.root.borrow_mut() = None;
		self.teardown();
		self.events.emit(RouterEvent::Disconnect);
	}

	/// Navigates to `to`, recording a new history entry.
	///
	/// # Errors
	///
	/// See [`Router::connect`]. On failure the previously rendered chain is
	/// left untouched.
	pub async fn push(&self, to: &str) -> Result<(), RouterError> {
		self.navigate(to, &NavigationOptions::default(), NavigationType::Push)
			.await
	}

	/// [`Router::push`] with explicit history-entry options.
	pub async fn push_with(
		&self,
		to: &str,
		options: &NavigationOptions,
	) -> Result<(), RouterError> {
		self.navigate(to, options, NavigationType::Push).await
	}

	/// Navigates to `to`, replacing the current history entry.
	///
	/// # Errors
	///
	/// See [`Router::push`].
	pub async fn replace(&self, to: &str) -> Result<(), RouterError> {
		self.navigate(to, &NavigationOptions::default(), NavigationType::Replace)
			.await
	}

	/// [`Router::replace`] with explicit history-entry options.
	pub async fn replace_with(
		&self,
		to: &str,
		options: &NavigationOptions,
	) -> Result<(), RouterError> {
		self.navigate(to, options, NavigationType::Replace).await
	}

	/// Moves `delta` entries through the history stack (negative values go
	/// back), rendering the landing entry when the driver resolves the move
	/// synchronously.
	///
	/// # Errors
	///
	/// See [`Router::push`].
	pub async fn go(&self, delta: isize) -> Result<(), RouterError> {
		if let Some(to) = self.history.go(delta) {
			self.handle_pop(&to).await?;
		}
		Ok(())
	}

	/// Moves `entries` history entries backward.
	///
	/// # Errors
	///
	/// See [`Router::push`].
	pub async fn pop(&self, entries: isize) -> Result<(), RouterError> {
		self.go(-entries).await
	}

	/// Re-enters the engine for a history move reported by the driver.
	///
	/// Browser hosts call this from their `popstate` listener; it is the
	/// same resolve/render pathway every other navigation source uses.
	///
	/// # Errors
	///
	/// See [`Router::push`].
	pub async fn handle_pop(&self, to: &str) -> Result<(), RouterError> {
		let to = decode(to);
		let resolution = self.resolve(&to)?;
		if resolution.path != to {
			// The landing entry itself redirected; keep history consistent.
			self.history
				.replace(&resolution.path, &NavigationOptions::default());
		}
		self.events.emit(RouterEvent::Pop);
		self.render(resolution.matched).await
	}

	async fn navigate(
		&self,
		to: &str,
		options: &NavigationOptions,
		kind: NavigationType,
	) -> Result<(), RouterError> {
		let to = decode(to);
		tracing::debug!(path = %to, ?kind, "navigating");
		let resolution = self.resolve(&to)?;
		match kind {
			NavigationType::Push => {
				self.history.push(&resolution.path, options);
				self.events.emit(RouterEvent::Push);
			}
			NavigationType::Replace => {
				self.history.replace(&resolution.path, options);
				self.events.emit(RouterEvent::Replace);
			}
		}
		self.render(resolution.matched).await
	}

	/// Resolves a path to its route chain, following redirects and
	/// evaluating guards.
	///
	/// # Errors
	///
	/// Returns [`RouterError::RedirectLoop`] when redirects chain past the
	/// depth limit. A path that matches nothing is not an error; it
	/// resolves to an empty chain.
	pub fn resolve(&self, path: &str) -> Result<Resolution, RouterError> {
		self.search(path.to_string(), &self.routes, Vec::new(), 0)
	}

	fn search(
		&self,
		path: String,
		routes: &[Rc<Route>],
		mut matched: Vec<Rc<Route>>,
		redirects: usize,
	) -> Result<Resolution, RouterError> {
		// First match wins; a guarded-off route lets later siblings match.
		let Some(route) = routes
			.iter()
			.find(|route| route.matches(&path) && route.allowed())
		else {
			return Ok(Resolution { matched, path });
		};

		if let Some(target) = route.redirect() {
			if redirects >= MAX_REDIRECTS {
				return Err(RouterError::RedirectLoop(path));
			}
			let from = route.matched_prefix(&Location::parse(&path).pathname);
			let redirected = route.transfer(&from, target);
			tracing::debug!(from = %path, to = %redirected, "following redirect");
			// Restart from the root of the whole tree, discarding the
			// chain accumulated so far.
			return self.search(redirected, &self.routes, Vec::new(), redirects + 1);
		}

		let route = Rc::clone(route);
		matched.push(Rc::clone(&route));
		if route.children().is_empty() {
			Ok(Resolution { matched, path })
		} else {
			// Children re-match against the full path; the parent is a
			// non-exact prefix.
			self.search(path, route.children(), matched, redirects)
		}
	}

	/// Reconciles the mounted element chain to the given route chain.
	///
	/// No-op while disconnected. Component loads complete before any
	/// teardown, so a failed load leaves the previous chain fully mounted.
	///
	/// # Errors
	///
	/// Propagates component-load failures.
	pub async fn render(&self, matched: Vec<Rc<Route>>) -> Result<(), RouterError> {
		if !self.connected.get() || self.root.borrow().is_none() {
			return Ok(());
		}

		let components: Vec<Component> =
			try_join_all(matched.iter().map(|route| route.resolve_component())).await?;

		let divergence = self.divergence_index(&matched);
		tracing::trace!(
			chain = matched.len(),
			divergence,
			"reconciling element chain"
		);

		// Tear down everything past the divergence point, deepest first.
		let removed = self.elements.borrow_mut().split_off(divergence);
		for element in removed.into_iter().rev() {
			element.remove();
		}

		let additions: Vec<ElementHandle> = components[divergence..]
			.iter()
			.map(|constructor| constructor())
			.collect();

		for (element, route) in additions.iter().zip(&matched[divergence..]) {
			if let Some(slot) = route.slot() {
				element.set_attribute("slot", slot);
			}
		}

		// Link the new sub-chain parent to child before it touches the
		// live tree, so intermediate elements are not connected early.
		for pair in additions.windows(2) {
			pair[0].append_child(Rc::clone(&pair[1]));
		}

		self.elements
			.borrow_mut()
			.extend(additions.iter().map(Rc::clone));
		*self.active.borrow_mut() = matched;

		self.update_properties();

		if let Some(first) = additions.first() {
			if divergence > 0 {
				let parent = Rc::clone(&self.elements.borrow()[divergence - 1]);
				parent.append_child(Rc::clone(first));
			} else if let Some(root) = self.root.borrow().as_ref() {
				root.append_child(Rc::clone(first));
			}
		}

		self.events.emit(RouterEvent::Render);
		Ok(())
	}

	/// The length of the common leading run of reference-identical routes
	/// between the new chain and the active one.
	fn divergence_index(&self, matched: &[Rc<Route>]) -> usize {
		let active = self.active.borrow();
		let shared = matched.len().min(active.len());
		for index in 0..shared {
			if !Rc::ptr_eq(&matched[index], &active[index]) {
				return index;
			}
		}
		shared
	}

	/// Re-assigns recognized parameters and route-resolved properties on
	/// every active element.
	///
	/// Runs over the whole chain, not just new elements: when only a
	/// parameter value changed, the matched routes are identical and the
	/// retained element still needs the fresh value.
	fn update_properties(&self) {
		let location = self.history.location();
		let elements = self.elements.borrow();
		let active = self.active.borrow();

		for (element, route) in elements.iter().zip(active.iter()) {
			let recognized = element.property_names();
			if recognized.is_empty() {
				continue;
			}

			let snapshot = route.snapshot(&location);
			for (key, value) in snapshot.parameters.entries() {
				if recognized.contains(&key) {
					element.set_property(key, Value::String(value.to_string()));
				}
			}
			if let Some(resolve) = route.property_resolver() {
				for (key, value) in resolve(&snapshot) {
					if recognized.iter().any(|name| *name == key) {
						element.set_property(&key, value);
					}
				}
			}
		}
	}

	fn teardown(&self) {
		let mut elements = self.elements.borrow_mut();
		while let Some(element) = elements.pop() {
			element.remove();
		}
	}
}

impl std::fmt::Debug for Router {
	fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
		f.debug_struct("Router")
			.field("routes", &self.routes.len())
			.field("active", &self.active.borrow().len())
			.field("connected", &self.connected.get())
			.finish()
	}
}

#[cfg(test)]
mod tests {
	use std::cell::Cell;

	use super::*;
	use crate::history::MemoryHistory;
	use crate::testing;

	fn router(configs: Vec<RouteConfig>) -> Router {
		Router::new(configs, Rc::new(MemoryHistory::new())).unwrap()
	}

	fn leaf(path: &str, tag: &'static str) -> RouteConfig {
		RouteConfig::new(path).component(testing::source(tag, &[]))
	}

	#[test]
	fn first_match_wins_in_declaration_order() {
		let router = router(vec![leaf("/a", "first"), leaf("/a", "second")]);
		let resolution = router.resolve("/a").unwrap();
		assert_eq!(resolution.matched.len(), 1);
		assert_eq!(resolution.matched[0].path(), "/a");
	}

	#[test]
	fn no_match_resolves_to_an_empty_chain() {
		let router = router(vec![leaf("/a", "a")]);
		let resolution = router.resolve("/missing").unwrap();
		assert!(resolution.matched.is_empty());
		assert_eq!(resolution.path, "/missing");
	}

	#[test]
	fn redirect_is_followed_from_the_root() {
		let router = router(vec![
			RouteConfig::new("/a").redirect("/b"),
			leaf("/b", "b"),
		]);
		let resolution = router.resolve("/a").unwrap();
		assert_eq!(resolution.matched.len(), 1);
		assert_eq!(resolution.matched[0].path(), "/b");
		assert_eq!(resolution.path, "/b");
	}

	#[test]
	fn redirect_transfers_matched_parameters() {
		let router = router(vec![
			RouteConfig::new("/old/:id").redirect("/new/:id"),
			leaf("/new/:id", "n"),
		]);
		let resolution = router.resolve("/old/7").unwrap();
		assert_eq!(resolution.path, "/new/7");
		assert_eq!(resolution.matched[0].path(), "/new/:id");
	}

	#[test]
	fn redirect_loop_is_detected() {
		let router = router(vec![
			RouteConfig::new("/a").redirect("/b"),
			RouteConfig::new("/b").redirect("/a"),
		]);
		let error = router.resolve("/a").unwrap_err();
		assert!(matches!(error, RouterError::RedirectLoop(_)));
	}

	#[test]
	fn guarded_route_yields_to_later_siblings() {
		let router = router(vec![
			leaf("/page", "locked").guard(|| false),
			leaf("/page", "fallback"),
		]);
		let resolution = router.resolve("/page").unwrap();
		assert_eq!(resolution.matched.len(), 1);
		// The second declaration matched.
		assert!(resolution.matched[0].allowed());
		assert!(Rc::ptr_eq(&resolution.matched[0], &router.routes()[1]));
	}

	#[test]
	fn guards_are_reevaluated_per_resolution() {
		let open = Rc::new(Cell::new(false));
		let flag = Rc::clone(&open);
		let router = router(vec![
			leaf("/door", "door").guard(move || flag.get()),
			leaf("/door", "wall"),
		]);

		let closed = router.resolve("/door").unwrap();
		assert!(Rc::ptr_eq(&closed.matched[0], &router.routes()[1]));

		open.set(true);
		let opened = router.resolve("/door").unwrap();
		assert!(Rc::ptr_eq(&opened.matched[0], &router.routes()[0]));
	}

	#[test]
	fn nested_routes_accumulate_the_chain() {
		let router = router(vec![
			leaf("/", "app").child(leaf(":section", "section")),
		]);
		let resolution = router.resolve("/settings").unwrap();
		assert_eq!(resolution.matched.len(), 2);
		assert_eq!(resolution.matched[0].path(), "/");
		assert_eq!(resolution.matched[1].path(), "/:section");
	}

	#[tokio::test]
	async fn navigation_before_connect_renders_nothing() {
		let history = Rc::new(MemoryHistory::new());
		let router = Router::new(vec![leaf("/a", "a")], history.clone()).unwrap();

		router.push("/a").await.unwrap();
		assert!(router.elements().is_empty());
		assert!(router.active_routes().is_empty());
		// The history entry is still recorded.
		assert_eq!(history.current_path(), "/a");
	}
}
