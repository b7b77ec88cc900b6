//! # Task Management System
//!
//! A fixed-size pool of worker threads used by the generator and the mesher.
//!
//! ## Architecture Overview
//! - `TaskManager`: owns the workers and distributes tasks round-robin
//! - `Task`: a unit of work executed with the index of the worker running it
//! - `TaskChannel`: the sending half of one worker's queue plus its join handle
//!
//! The worker count is fixed at startup. A manager created with zero workers runs
//! every task inline on the publishing thread with worker index 0, which keeps
//! tests fully deterministic.
//!
//! ## Task Lifecycle
//! 1. Tasks are published via `TaskManager::publish_task()`
//! 2. The manager sends the task to the next worker channel in round-robin order
//! 3. The worker runs the task, which stores its own result
//! 4. `tasks_in_flight()` drops back once the worker is done
//!
//! ## Example Usage
//! ```rust
//! use voxel_world::task_management::{task::Task, TaskManager};
//!
//! struct Hello;
//!
//! impl Task for Hello {
//!     fn process(self: Box<Self>, worker_index: usize) {
//!         log::info!("hello from worker {worker_index}");
//!     }
//! }
//!
//! let task_manager = TaskManager::new(2).unwrap();
//! task_manager.publish_task(Box::new(Hello));
//! ```

pub mod task;

use log::{error, info};
use std::io;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::mpsc::{channel, Sender};
use std::sync::Arc;
use std::thread::{self, JoinHandle};
use task::Task;

/// The main thread's handle on one worker.
#[derive(Debug)]
struct TaskChannel {
    task_sender: Option<Sender<Box<dyn Task>>>,
    worker: Option<JoinHandle<()>>,
}

/// Manages a pool of worker threads and distributes tasks to them.
///
/// `publish_task` takes `&self`, so one manager can be shared (through an `Arc`)
/// by every system that spawns background work.
pub struct TaskManager {
    channels: Vec<TaskChannel>,
    current_channel: AtomicUsize,
    tasks_in_flight: Arc<AtomicUsize>,
}

impl TaskManager {
    /// Creates a new `TaskManager` with `num_workers` worker threads.
    ///
    /// # Arguments
    /// * `num_workers` - Number of threads to spawn. Zero runs tasks inline.
    ///
    /// # Errors
    /// Returns the OS error if a worker thread cannot be spawned.
    pub fn new(num_workers: usize) -> io::Result<Self> {
        let tasks_in_flight = Arc::new(AtomicUsize::new(0));
        let mut channels = Vec::with_capacity(num_workers);

        for worker_index in 0..num_workers {
            let (task_tx, task_rx) = channel::<Box<dyn Task>>();
            let in_flight = tasks_in_flight.clone();

            let worker = thread::Builder::new()
                .name(format!("voxel-worker-{worker_index}"))
                .spawn(move || {
                    while let Ok(task) = task_rx.recv() {
                        task.process(worker_index);
                        in_flight.fetch_sub(1, Ordering::AcqRel);
                    }
                })?;

            channels.push(TaskChannel {
                task_sender: Some(task_tx),
                worker: Some(worker),
            });
        }

        info!(
            "Task manager started with {} workers (available parallelism: {:?})",
            num_workers,
            thread::available_parallelism()
        );

        Ok(TaskManager {
            channels,
            current_channel: AtomicUsize::new(0),
            tasks_in_flight,
        })
    }

    /// Number of worker threads. Zero means tasks run inline.
    pub fn worker_count(&self) -> usize {
        self.channels.len()
    }

    /// Number of distinct worker indices a task can observe.
    ///
    /// Systems size their per-worker scratch state with this.
    pub fn worker_slots(&self) -> usize {
        self.channels.len().max(1)
    }

    /// Number of published tasks that have not finished yet.
    pub fn tasks_in_flight(&self) -> usize {
        self.tasks_in_flight.load(Ordering::Acquire)
    }

    /// Publishes a task for execution and returns immediately.
    ///
    /// Tasks are spread over the workers round-robin. Without workers the task
    /// runs to completion before this returns.
    pub fn publish_task(&self, task: Box<dyn Task>) {
        if self.channels.is_empty() {
            task.process(0);
            return;
        }

        let channel_idx = self.current_channel.fetch_add(1, Ordering::Relaxed) % self.channels.len();
        let Some(sender) = &self.channels[channel_idx].task_sender else {
            return;
        };

        self.tasks_in_flight.fetch_add(1, Ordering::AcqRel);
        if let Err(returned) = sender.send(task) {
            // The worker is gone; finish the work here so the result still arrives.
            error!("Worker {} disconnected, running task inline", channel_idx);
            self.tasks_in_flight.fetch_sub(1, Ordering::AcqRel);
            returned.0.process(channel_idx);
        }
    }
}

impl Drop for TaskManager {
    fn drop(&mut self) {
        for channel in &mut self.channels {
            channel.task_sender.take();
        }
        for (worker_index, channel) in self.channels.iter_mut().enumerate() {
            if let Some(worker) = channel.worker.take() {
                if worker.join().is_err() {
                    error!("Worker {} panicked", worker_index);
                }
            }
        }
    }
}
