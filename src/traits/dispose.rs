//! Disposal trait for resource cleanup.

/// Structured teardown for resolved instances.
///
/// Register an instance with
/// [`Context::register_disposer`](crate::Context::register_disposer); hooks
/// run in LIFO order when the context is disposed.
///
/// # Examples
///
/// ```
/// use ferrous_resolver::{ContextBuilder, Dispose, LifeCycle};
/// use std::cell::Cell;
/// use std::rc::Rc;
///
/// struct Cache {
///     flushed: Cell<bool>,
/// }
///
/// impl Dispose for Cache {
///     fn dispose(&self) {
///         self.flushed.set(true);
///     }
/// }
///
/// let mut builder = ContextBuilder::new();
/// builder.bind_factory(LifeCycle::SINGLETON, |context| {
///     let cache = Rc::new(Cache { flushed: Cell::new(false) });
///     context.register_disposer(cache.clone());
///     Ok(cache)
/// });
///
/// let context = builder.build();
/// let cache = context.resolve::<Rc<Cache>>(LifeCycle::SINGLETON).unwrap();
/// context.dispose();
/// assert!(cache.flushed.get());
/// ```
pub trait Dispose: 'static {
    fn dispose(&self);
}
