//! # Core Module
//!
//! Concurrency primitives shared by the world systems.
//!
//! ## Key Components
//! - `MtResource`: thread-safe reference-counted resource with read-write locking,
//!   used for the result lists that worker tasks fill and the main thread drains.

pub mod mt_resource;

pub use mt_resource::MtResource;
