//! Intentionally unmanaged driver resources

use std::{mem::ManuallyDrop, ops::Deref};

/// Driver resource that is never released
///
/// Probes try to maximize the number of outstanding driver objects, so every
/// handle they obtain must stay alive until the process exits. Wrapping a
/// handle into `Leaked` makes that explicit: dropping the wrapper does not run
/// the inner destructor, so e.g. the `vkDestroyDevice` that vulkano would
/// otherwise issue never happens.
pub struct Leaked<T>(ManuallyDrop<T>);
//
impl<T> Leaked<T> {
    /// Take ownership of a resource, preventing its release
    pub fn new(resource: T) -> Self {
        Self(ManuallyDrop::new(resource))
    }

    /// Give up on a resource without keeping any handle to it
    pub fn abandon(resource: T) {
        drop(Self::new(resource))
    }
}
//
impl<T> Deref for Leaked<T> {
    type Target = T;

    fn deref(&self) -> &T {
        &self.0
    }
}
