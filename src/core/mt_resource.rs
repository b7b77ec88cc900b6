use std::sync::{Arc, PoisonError, RwLock, RwLockReadGuard, RwLockWriteGuard};

/// A thread-safe, reference-counted resource container with read-write locking.
///
/// `MtResource` is how worker tasks hand data back to the main thread: a task
/// holds a clone, pushes its result under the write lock, and the owner drains
/// the same list once per frame.
///
/// # Examples
///
/// ```
/// use voxel_world::core::MtResource;
///
/// let results = MtResource::new(Vec::new());
/// let producer = results.clone();
///
/// std::thread::spawn(move || producer.get_mut().push(7))
///     .join()
///     .unwrap();
///
/// assert_eq!(results.get_mut().drain(..).collect::<Vec<_>>(), vec![7]);
/// ```
///
/// A poisoned lock is recovered rather than propagated: results are plain data
/// and a panicking producer cannot leave them half-written.
pub struct MtResource<T: Send + Sync> {
    resource: Arc<RwLock<T>>,
}

impl<T: Send + Sync> MtResource<T> {
    /// Creates a new `MtResource` containing the given value.
    pub fn new(resource: T) -> Self {
        Self {
            resource: Arc::new(RwLock::new(resource)),
        }
    }

    /// Returns a read-only guard for the contained value.
    pub fn get(&self) -> RwLockReadGuard<'_, T> {
        self.resource.read().unwrap_or_else(PoisonError::into_inner)
    }

    /// Returns an exclusive guard for the contained value.
    pub fn get_mut(&self) -> RwLockWriteGuard<'_, T> {
        self.resource.write().unwrap_or_else(PoisonError::into_inner)
    }
}

impl<T: Send + Sync> Clone for MtResource<T> {
    fn clone(&self) -> Self {
        Self {
            resource: self.resource.clone(),
        }
    }
}

impl<T: Send + Sync + Default> Default for MtResource<T> {
    fn default() -> Self {
        Self::new(T::default())
    }
}
