//! # Task System Core Trait
//!
//! A `Task` is a self-contained unit of work handed to the [`TaskManager`](super::TaskManager).
//! Tasks own everything they read and deposit their output into a shared result
//! list themselves, so nothing flows back through the pool.
//!
//! ## Task Lifecycle
//! 1. A task is created and scheduled via `TaskManager::publish_task()`
//! 2. `process()` runs on a worker thread, receiving that worker's index
//! 3. The task pushes its result into a list owned by the system that spawned it
//! 4. The main thread drains that list during its next frame

/// A unit of work that can be executed on a background worker.
///
/// # Implementation Guidelines
/// - Must be `Send` to be transferred between threads
/// - Should own its inputs; the main thread may mutate or evict the originals
///   while the task runs
pub trait Task: Send {
    /// Runs the task.
    ///
    /// # Arguments
    /// * `worker_index` - Index of the worker running the task, in
    ///   `0..TaskManager::worker_slots()`. Use it to pick per-worker scratch state.
    fn process(self: Box<Self>, worker_index: usize);
}
