//! Liveness detection engine.
//!
//! Turns free-form targets into canonical probe URLs, fans each one out into
//! mirror/client variants, and classifies the provider's semi-structured HTML
//! into `LIVE`, `DIE` or inconclusive.

pub mod classifier;
pub mod config;
pub mod error;
pub mod normalizer;
pub mod probe;
pub mod resolver;
pub mod variants;

pub use classifier::{Classifier, FetchedPage};
pub use config::{ClientProfile, EngineConfig, LocaleCues, ProviderConfig};
pub use error::{NormalizeError, ProbeError};
pub use normalizer::{NormalizedTarget, Normalizer};
pub use probe::{HttpProbe, Probe};
pub use resolver::{LivenessCheck, LivenessResolver};
pub use variants::{Variant, VariantGenerator};

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// Shape of the monitored identity. Only affects how the canonical URL is built.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TargetKind {
    #[default]
    Profile,
    Group,
}

impl TargetKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            TargetKind::Profile => "profile",
            TargetKind::Group => "group",
        }
    }
}

impl fmt::Display for TargetKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for TargetKind {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "profile" | "page" => Ok(TargetKind::Profile),
            "group" => Ok(TargetKind::Group),
            other => Err(format!("unknown target kind '{}'", other)),
        }
    }
}

/// A definitive verdict.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum Liveness {
    Live,
    Die,
}

impl Liveness {
    pub fn as_str(&self) -> &'static str {
        match self {
            Liveness::Live => "LIVE",
            Liveness::Die => "DIE",
        }
    }
}

impl fmt::Display for Liveness {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Outcome of classifying one response.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ProbeStatus {
    Live,
    Die,
    Inconclusive,
}

impl ProbeStatus {
    pub fn verdict(self) -> Option<Liveness> {
        match self {
            ProbeStatus::Live => Some(Liveness::Live),
            ProbeStatus::Die => Some(Liveness::Die),
            ProbeStatus::Inconclusive => None,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ProbeResult {
    pub status: ProbeStatus,
    pub display_name: Option<String>,
    pub final_url: String,
}

impl ProbeResult {
    pub fn inconclusive(final_url: impl Into<String>) -> Self {
        Self {
            status: ProbeStatus::Inconclusive,
            display_name: None,
            final_url: final_url.into(),
        }
    }
}

/// A resolved target: the first conclusive probe result across all variants.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Resolution {
    pub status: Liveness,
    pub display_name: Option<String>,
}
