//! # Voxel World Headless Demo
//!
//! Streams a world around a moving viewer without a renderer and logs what
//! happened. An optional argument names a JSON world config.
//!
//! ## Usage
//!
//! ```bash
//! RUST_LOG=info cargo run --release -- world.json
//! ```

use std::path::PathBuf;
use std::process::ExitCode;

fn main() -> ExitCode {
    let config_path = std::env::args_os().nth(1).map(PathBuf::from);

    match voxel_world::run(config_path.as_deref()) {
        Ok(()) => ExitCode::SUCCESS,
        Err(err) => {
            log::error!("{err}");
            eprintln!("voxel-world: {err}");
            ExitCode::FAILURE
        }
    }
}
