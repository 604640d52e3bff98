//! Error types for the resolution container.

use thiserror::Error;

use crate::LifeCycle;

/// Fatal resolution errors.
///
/// Lookups that fall back to a safe default (the calling node, a freshly
/// attached component) never produce one of these; they are reported through
/// [`Diagnostic`](crate::Diagnostic) instead. Only structurally unusable
/// requests fail.
///
/// # Examples
///
/// ```rust
/// use ferrous_resolver::{ContextBuilder, LifeCycle, ResolveError};
///
/// struct Unbound;
///
/// let context = ContextBuilder::new().build();
/// match context.resolve::<Unbound>(LifeCycle::TRANSIENT) {
///     Err(ResolveError::Unresolvable { type_name, .. }) => {
///         assert!(type_name.ends_with("Unbound"));
///     }
///     _ => unreachable!(),
/// }
/// ```
#[derive(Debug, Clone, Error)]
pub enum ResolveError {
    /// A variant needing a name or tag discriminator was given an empty one.
    #[error("{strategy} requires a non-empty {discriminator}")]
    Configuration {
        strategy: &'static str,
        discriminator: &'static str,
    },
    /// No binding exists and the type can be neither constructed nor attached.
    #[error("Cannot resolve {type_name} as {lifecycle:?}: {reason}")]
    Unresolvable {
        type_name: &'static str,
        lifecycle: LifeCycle,
        reason: &'static str,
    },
    /// A stored instance did not downcast to the requested type.
    #[error("Type mismatch for: {0}")]
    TypeMismatch(&'static str),
    /// Factories depend on each other in a cycle (includes path).
    #[error("Circular dependency: {}", .0.join(" -> "))]
    Circular(Vec<&'static str>),
    /// Nested resolution went deeper than the configured limit.
    #[error("Max depth {0} exceeded")]
    DepthExceeded(usize),
    /// Container configuration failed validation.
    #[error("Invalid configuration: {0}")]
    InvalidConfig(String),
}

impl ResolveError {
    pub(crate) fn unresolvable(
        type_name: &'static str,
        lifecycle: LifeCycle,
        reason: &'static str,
    ) -> Self {
        ResolveError::Unresolvable {
            type_name,
            lifecycle,
            reason,
        }
    }
}

/// Result type for resolution operations.
pub type ResolveResult<T> = Result<T, ResolveError>;
