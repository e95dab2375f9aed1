#[cfg(feature = "std")]
use std::sync as impl_;

#[cfg(not(feature = "std"))]
use spin as impl_;

/// Process-wide slot for lazily initialized state.
///
/// The slot starts out empty. Readers see `None` until the first write, and
/// writers start from `T::default()`.
pub(crate) struct StateLock<T: 'static + Send + Sync>(impl_::RwLock<Option<T>>);

impl<T: 'static + Send + Sync> StateLock<T> {
    #[must_use]
    pub(crate) const fn new() -> Self {
        Self(impl_::RwLock::new(None))
    }

    /// Runs `f` with shared access to the current state.
    #[inline]
    pub(crate) fn read<R>(&'static self, f: impl FnOnce(Option<&T>) -> R) -> R {
        #[cfg(not(feature = "std"))]
        let guard = self.0.read();

        #[cfg(feature = "std")]
        let guard = self.0.read().expect("Unable to acquire policy lock");

        f((*guard).as_ref())
    }

    /// Swaps the stored state for `value`, returning what was there.
    pub(crate) fn replace(&'static self, value: Option<T>) -> Option<T> {
        core::mem::replace(&mut *self.write(), value)
    }

    #[inline]
    fn write(&'static self) -> impl core::ops::DerefMut<Target = Option<T>> {
        #[cfg(not(feature = "std"))]
        let guard = self.0.write();

        #[cfg(feature = "std")]
        let guard = self.0.write().expect("Unable to acquire policy lock");

        guard
    }
}

impl<T: 'static + Send + Sync + Default> StateLock<T> {
    /// Runs `f` with exclusive access to the state, initializing it first if
    /// it was never written.
    #[inline]
    pub(crate) fn update<R>(&'static self, f: impl FnOnce(&mut T) -> R) -> R {
        f(self.write().get_or_insert_default())
    }
}
