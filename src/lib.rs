//! Client-side navigation for component-based single-page apps.
//!
//! Routes declare path patterns, components, guards, redirects, and nested
//! children; [`Router`] resolves a location to a chain of matched routes and
//! incrementally reconciles a chain of mounted elements against it, touching
//! only the part of the tree that actually changed.
//!
//! The crate is host-agnostic: element creation and mutation go through the
//! [`Element`] trait and history movement through the [`History`] trait. A
//! browser host implements both over custom elements and the session
//! history; tests run against [`testing::MockElement`] and
//! [`MemoryHistory`].
//!
//! ```ignore
//! let router = Rc::new(Router::new(
//! 	vec![
//! 		RouteConfig::new("/")
//! 			.component(app_shell)
//! 			.child(RouteConfig::new("users/:id").component(user_page)),
//! 		RouteConfig::new("/legacy/:id").redirect("/users/:id"),
//! 	],
//! 	history,
//! )?);
//! router.connect(outlet).await?;
//! router.push("/users/42").await?;
//! ```

pub mod element;
pub mod error;
pub mod events;
pub mod history;
pub mod link;
pub mod path;
pub mod query;
pub mod route;
pub mod router;
pub mod testing;

pub use element::{Component, ComponentSource, Element, ElementHandle, Loader, LoaderResult};
pub use error::RouterError;
pub use events::{EventEmitter, Listener, RouterEvent};
pub use history::{History, Location, MemoryHistory, NavigationOptions};
pub use link::{ClickEvent, RouterLink};
pub use path::{Parameters, Pattern};
pub use query::Query;
pub use route::{Guard, PropertyResolver, Route, RouteConfig, Snapshot};
pub use router::{Resolution, Router};
