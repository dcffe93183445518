//! Asset staging subsystem.
//!
//! # Data Flow
//! ```text
//! CopyDeclaration[] (relative source, relative destination, variant)
//!     → plan.rs (filter by BuildVariant, resolve against roots,
//!                reject collisions and escapes from the public root)
//!     → CopyPlan (ordered AssetCopyTask list)
//!     → copy.rs (verify every source exists, then copy byte-for-byte,
//!                skipping destinations whose content hash already matches)
//!     → CopyReport
//! ```
//!
//! # Design Decisions
//! - Planning is pure; only execution touches the filesystem
//! - A missing source aborts the whole run before anything is written
//! - Re-running a plan is always safe; the hash skip is an optimization only

pub mod copy;
pub mod plan;
pub mod task;

pub use copy::{execute, hash_file, CopyReport};
pub use plan::{plan_copies, CopyPlan};
pub use task::{AppliesTo, AssetCopyTask, BuildVariant};

use std::path::PathBuf;

use thiserror::Error;

/// Errors raised while planning or executing asset copies.
#[derive(Debug, Error)]
pub enum AssetError {
    #[error("copy #{}: required asset {} does not exist", .index + 1, .path.display())]
    MissingSource { index: usize, path: PathBuf },

    #[error(
        "{variant} build: copies #{} and #{} both write {}",
        .first + 1,
        .second + 1,
        .destination.display()
    )]
    DestinationCollision {
        variant: BuildVariant,
        destination: PathBuf,
        first: usize,
        second: usize,
    },

    #[error("copy #{}: destination {} escapes the public root", .index + 1, .destination.display())]
    OutsideRoot { index: usize, destination: PathBuf },

    #[error("I/O error on {}: {source}", .path.display())]
    Io {
        path: PathBuf,
        source: std::io::Error,
    },
}
