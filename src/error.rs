//! Error types for route compilation and navigation.

/// Errors surfaced by route-tree construction and navigation.
///
/// Pattern and configuration errors are raised eagerly while the route tree
/// is built, since route configuration is static and caller-controlled.
/// Loader failures surface from the navigation call that triggered the load.
#[non_exhaustive]
#[derive(Debug, thiserror::Error)]
pub enum RouterError {
	/// A path pattern failed to compile.
	#[error("invalid path pattern `{pattern}`: {source}")]
	Pattern {
		/// The offending pattern, after ancestor prefixing.
		pattern: String,
		#[source]
		source: regex::Error,
	},
	/// A redirecting route also declared a component or children.
	#[error("route `{0}` declares a redirect alongside a component or children")]
	ConflictingRoute(String),
	/// A route declared neither a component nor a redirect.
	#[error("route `{0}` has no component to mount")]
	MissingComponent(String),
	/// Redirects chained past the depth limit, which almost always means
	/// two routes redirect into each other.
	#[error("redirect limit exceeded while resolving `{0}`")]
	RedirectLoop(String),
	/// A lazy component loader rejected or returned a malformed value.
	#[error("component loader failed for route `{route}`: {reason}")]
	Loader {
		/// Path of the route whose loader failed.
		route: String,
		/// Host-provided failure description.
		reason: String,
	},
}

#[cfg(test)]
mod tests {
	use super::*;

	#[test]
	fn display_includes_route_context() {
		let error = RouterError::Loader {
			route: "/users/:id".to_string(),
			reason: "import failed".to_string(),
		};
		assert_eq!(
			error.to_string(),
			"component loader failed for route `/users/:id`: import failed"
		);

		let error = RouterError::RedirectLoop("/a".to_string());
		assert_eq!(error.to_string(), "redirect limit exceeded while resolving `/a`");
	}

	#[test]
	fn pattern_error_carries_source() {
		let source = regex::Regex::new("(").unwrap_err();
		let error = RouterError::Pattern {
			pattern: "/bad(".to_string(),
			source,
		};
		assert!(error.to_string().starts_with("invalid path pattern `/bad(`"));
	}
}
