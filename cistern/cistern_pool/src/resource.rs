//! The contracts a pooled resource and its factory must satisfy.

/// Boxed error produced by resources and factories
pub type BoxError = Box<dyn std::error::Error + Send + Sync + 'static>;

/// A trait for resources that can be pooled
///
/// The pool only ever moves resources around and calls [`Resource::close`]
/// on the ones it removes from circulation. Closing must be safe from any
/// thread, must not block indefinitely and must not panic on a live
/// resource.
pub trait Resource: Send + 'static {
    /// Close the resource when it's no longer needed
    fn close(&mut self) -> Result<(), BoxError>;
}

impl<R: Resource + ?Sized> Resource for Box<R> {
    fn close(&mut self) -> Result<(), BoxError> {
        (**self).close()
    }
}

/// Type-erased factory stored by the pools
pub(crate) type Factory<R> = Box<dyn Fn() -> Result<R, BoxError> + Send + Sync + 'static>;

/// Erase a caller-supplied factory into the stored form
pub(crate) fn boxed_factory<R, F, E>(factory: F) -> Factory<R>
where
    F: Fn() -> Result<R, E> + Send + Sync + 'static,
    E: Into<BoxError>,
{
    Box::new(move || factory().map_err(Into::into))
}

/// Close a resource that is leaving circulation, logging a failure instead of
/// propagating it. Returns whether the close succeeded.
pub(crate) fn close_quietly<R: Resource>(mut resource: R) -> bool {
    match resource.close() {
        Ok(()) => true,
        Err(e) => {
            log::warn!("Failed to close pooled resource: {}", e);
            false
        }
    }
}
