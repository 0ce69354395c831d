//! Route tree construction and per-route state.
//!
//! A [`RouteConfig`] tree is plain declarative data; [`Route::build`] turns
//! it into an immutable tree of compiled routes, prefixing every child path
//! (and redirect target) with its ancestor paths. The configuration is never
//! mutated, so callers may keep and reuse it freely.

use std::cell::RefCell;
use std::fmt;
use std::rc::Rc;

use serde_json::Value;

use crate::element::{Component, ComponentSource};
use crate::error::RouterError;
use crate::history::Location;
use crate::path::{Parameters, Pattern, decode, normalize};
use crate::query::Query;

/// A zero-argument predicate gating whether a route may match.
///
/// Guards are re-evaluated on every resolution pass; their results are
/// never cached, so they may reflect changing external state.
pub type Guard = Rc<dyn Fn() -> bool>;

/// Resolves extra component properties from a navigation snapshot.
pub type PropertyResolver = Rc<dyn Fn(&Snapshot) -> Vec<(String, Value)>>;

/// The read-only bundle computed for a route against a specific location.
///
/// Built fresh on every render pass; never cached.
#[derive(Debug, Clone)]
pub struct Snapshot {
	/// Named parameters captured from the decoded pathname.
	pub parameters: Parameters,
	/// The parsed query string.
	pub query: Query,
	/// The part of the pathname the route's pattern consumed.
	pub matched: String,
	/// The fragment, with its leading `#` stripped.
	pub hash: String,
}

/// Declarative configuration for one route and its subtree.
#[derive(Clone, Default)]
pub struct RouteConfig {
	path: String,
	component: Option<ComponentSource>,
	exact: Option<bool>,
	redirect: Option<String>,
	slot: Option<String>,
	guard: Option<Guard>,
	properties: Option<PropertyResolver>,
	children: Vec<RouteConfig>,
}

impl RouteConfig {
	/// Starts a route at `path`, relative to its parent.
	pub fn new(path: impl Into<String>) -> Self {
		Self {
			path: path.into(),
			..Self::default()
		}
	}

	/// Declares the component mounted when this route matches.
	pub fn component(mut self, source: ComponentSource) -> Self {
		self.component = Some(source);
		self
	}

	/// Overrides exact matching. Defaults to `true` for leaf routes and
	/// `false` for routes with children.
	pub fn exact(mut self, exact: bool) -> Self {
		self.exact = Some(exact);
		self
	}

	/// Declares a redirect target, relative to the parent like `path`.
	pub fn redirect(mut self, target: impl Into<String>) -> Self {
		self.redirect = Some(target.into());
		self
	}

	/// Names the slot the mounted element is projected into.
	pub fn slot(mut self, slot: impl Into<String>) -> Self {
		self.slot = Some(slot.into());
		self
	}

	/// Gates the route behind a predicate.
	pub fn guard<G>(mut self, guard: G) -> Self
	where
		G: Fn() -> bool + 'static,
	{
		self.guard = Some(Rc::new(guard));
		self
	}

	/// Resolves extra properties to assign on the mounted element.
	pub fn properties<P>(mut self, resolve: P) -> Self
	where
		P: Fn(&Snapshot) -> Vec<(String, Value)> + 'static,
	{
		self.properties = Some(Rc::new(resolve));
		self
	}

	/// Appends a child route.
	pub fn child(mut self, child: RouteConfig) -> Self {
		self.children.push(child);
		self
	}

	/// Appends several child routes.
	pub fn children(mut self, children: impl IntoIterator<Item = RouteConfig>) -> Self {
		self.children.extend(children);
		self
	}
}

impl fmt::Debug for RouteConfig {
	fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
		f.debug_struct("RouteConfig")
			.field("path", &self.path)
			.field("exact", &self.exact)
			.field("redirect", &self.redirect)
			.field("slot", &self.slot)
			.field("has_component", &self.component.is_some())
			.field("has_guard", &self.guard.is_some())
			.field("children", &self.children)
			.finish()
	}
}

/// A node in the compiled route tree.
pub struct Route {
	path: String,
	exact: bool,
	pattern: Pattern,
	component: Option<ComponentSource>,
	resolved: RefCell<Option<Component>>,
	redirect: Option<String>,
	slot: Option<String>,
	guard: Guard,
	properties: Option<PropertyResolver>,
	children: Vec<Rc<Route>>,
}

impl Route {
	/// Compiles a configuration node and its subtree against the given
	/// ancestor prefix.
	///
	/// # Errors
	///
	/// Fails fast on malformed patterns and contradictory configuration,
	/// so a misconfigured tree never reaches navigation.
	pub(crate) fn build(config: &RouteConfig, parent: &str) -> Result<Rc<Self>, RouterError> {
		let path = if config.path.is_empty() {
			parent.to_string()
		} else {
			normalize(&format!("{parent}/{}", config.path))
		};

		let redirect = config.redirect.as_ref().map(|target| {
			if target.is_empty() {
				parent.to_string()
			} else {
				normalize(&format!("{parent}/{target}"))
			}
		});

		if redirect.is_some() && (config.component.is_some() || !config.children.is_empty()) {
			return Err(RouterError::ConflictingRoute(path));
		}
		if redirect.is_none() && config.component.is_none() {
			return Err(RouterError::MissingComponent(path));
		}

		let exact = config.exact.unwrap_or(config.children.is_empty());
		let pattern = Pattern::compile(&path, exact)?;

		let children = config
			.children
			.iter()
			.map(|child| Self::build(child, &path))
			.collect::<Result<Vec<_>, _>>()?;

		Ok(Rc::new(Self {
			path,
			exact,
			pattern,
			component: config.component.clone(),
			resolved: RefCell::new(None),
			redirect,
			slot: config.slot.clone(),
			guard: config.guard.clone().unwrap_or_else(|| Rc::new(|| true)),
			properties: config.properties.clone(),
			children,
		}))
	}

	/// The route's absolute path pattern.
	pub fn path(&self) -> &str {
		&self.path
	}

	/// Whether the route matches exactly.
	pub fn is_exact(&self) -> bool {
		self.exact
	}

	/// The redirect target, if this route redirects.
	pub fn redirect(&self) -> Option<&str> {
		self.redirect.as_deref()
	}

	/// The named slot the mounted element is projected into.
	pub fn slot(&self) -> Option<&str> {
		self.slot.as_deref()
	}

	/// Child routes in declaration order.
	pub fn children(&self) -> &[Rc<Route>] {
		&self.children
	}

	/// The extra-property resolver, if declared.
	pub(crate) fn property_resolver(&self) -> Option<&PropertyResolver> {
		self.properties.as_ref()
	}

	/// Tests the route's pattern against a path.
	pub fn matches(&self, path: &str) -> bool {
		self.pattern.matches(path)
	}

	/// Evaluates the route's guard.
	pub fn allowed(&self) -> bool {
		(self.guard)()
	}

	/// The part of `path` the route's pattern consumed.
	pub fn matched_prefix(&self, path: &str) -> String {
		self.pattern.matched_prefix(path)
	}

	/// Substitutes parameters captured from `from` into `to`.
	pub fn transfer(&self, from: &str, to: &str) -> String {
		self.pattern.transfer(from, to)
	}

	/// Resolves the route's component constructor.
	///
	/// Resolution is idempotent: a lazy loader runs at most once and every
	/// call returns the identical constructor. Only successful loads are
	/// cached, so a transient failure can be retried by a later navigation.
	///
	/// # Errors
	///
	/// Returns [`RouterError::Loader`] when the loader fails and
	/// [`RouterError::MissingComponent`] for a route with nothing to mount.
	pub async fn resolve_component(&self) -> Result<Component, RouterError> {
		let cached = self.resolved.borrow().clone();
		if let Some(constructor) = cached {
			return Ok(constructor);
		}

		let source = self
			.component
			.as_ref()
			.ok_or_else(|| RouterError::MissingComponent(self.path.clone()))?;

		let constructor = match source {
			ComponentSource::Direct(constructor) => Rc::clone(constructor),
			ComponentSource::Loader(load) => {
				tracing::debug!(route = %self.path, "resolving lazy component");
				load().await.map_err(|error| RouterError::Loader {
					route: self.path.clone(),
					reason: error.to_string(),
				})?
			}
		};

		let mut cache = self.resolved.borrow_mut();
		Ok(Rc::clone(cache.get_or_insert(constructor)))
	}

	/// Computes the route's snapshot against a location.
	pub fn snapshot(&self, location: &Location) -> Snapshot {
		let pathname = decode(&location.pathname);
		Snapshot {
			parameters: self.pattern.parse(&pathname),
			query: Query::parse(&decode(&location.search)),
			matched: self.pattern.matched_prefix(&pathname),
			hash: location.hash.trim_start_matches('#').to_string(),
		}
	}
}

impl fmt::Debug for Route {
	fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
		f.debug_struct("Route")
			.field("path", &self.path)
			.field("exact", &self.exact)
			.field("redirect", &self.redirect)
			.field("slot", &self.slot)
			.field("children", &self.children)
			.finish()
	}
}
