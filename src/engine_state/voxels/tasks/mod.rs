//! # Voxel Task System
//!
//! Tasks related to voxel world generation. They run on the worker pool and
//! report back through the generator's result list.

pub mod chunk_generation_task;
