use std::fmt;
use std::sync::Arc;

/// A real function `f(x)` supplied by the embedding application.
///
/// Closures cannot be compared, so cache signatures use `key` (typically the
/// source expression) together with the closure's allocation address.
/// Replacing the closure always forces a rebuild; reusing one closure under
/// a new key does too.
#[derive(Clone)]
pub struct PlotFunction {
    key: String,
    f: Arc<dyn Fn(f64) -> f64 + Send + Sync>,
}

impl PlotFunction {
    pub fn new<F>(key: impl Into<String>, f: F) -> Self
    where
        F: Fn(f64) -> f64 + Send + Sync + 'static,
    {
        Self {
            key: key.into(),
            f: Arc::new(f),
        }
    }

    #[inline]
    pub fn eval(&self, x: f64) -> f64 {
        (self.f)(x)
    }

    #[inline]
    pub fn key(&self) -> &str {
        &self.key
    }

    /// Address of the shared closure.
    #[inline]
    pub(crate) fn identity(&self) -> usize {
        Arc::as_ptr(&self.f) as *const () as usize
    }
}

impl fmt::Debug for PlotFunction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("PlotFunction").field("key", &self.key).finish_non_exhaustive()
    }
}

impl PartialEq for PlotFunction {
    fn eq(&self, other: &Self) -> bool {
        self.key == other.key && Arc::ptr_eq(&self.f, &other.f)
    }
}
