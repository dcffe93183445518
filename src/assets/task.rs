//! Copy task declarations and build variants.

use std::path::PathBuf;

use serde::{Deserialize, Serialize};

/// The target a build is produced for.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, clap::ValueEnum)]
#[serde(rename_all = "lowercase")]
pub enum BuildVariant {
    Server,
    Client,
}

impl std::fmt::Display for BuildVariant {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            BuildVariant::Server => write!(f, "server"),
            BuildVariant::Client => write!(f, "client"),
        }
    }
}

/// Which build variants a declared copy applies to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum AppliesTo {
    Server,
    #[default]
    Client,
    Both,
}

impl AppliesTo {
    pub fn includes(self, variant: BuildVariant) -> bool {
        matches!(
            (self, variant),
            (AppliesTo::Both, _)
                | (AppliesTo::Server, BuildVariant::Server)
                | (AppliesTo::Client, BuildVariant::Client)
        )
    }
}

impl std::fmt::Display for AppliesTo {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            AppliesTo::Server => write!(f, "server"),
            AppliesTo::Client => write!(f, "client"),
            AppliesTo::Both => write!(f, "both"),
        }
    }
}

/// A resolved copy: absolute source, absolute destination.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AssetCopyTask {
    /// Position in the declaration list, for error messages.
    pub index: usize,
    pub source: PathBuf,
    pub destination: PathBuf,
    pub applies_to: AppliesTo,
}
