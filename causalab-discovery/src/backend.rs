//! Discovery backends: the processes that actually learn a graph.
//!
//! A backend takes a [`BackendRequest`] and returns the library's raw
//! output as JSON. Adapters validate and normalize that output.

use crate::error::DiscoveryError;
use crate::runtime::{PythonInfo, PythonRuntime};
use causalab_core::FeatureMatrix;
use causalab_core::config::PythonConfig;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::fmt;
use std::path::PathBuf;
use std::str::FromStr;

/// Driver script run by [`PythonBackend`] for every request.
const DISCOVER_SCRIPT: &str = include_str!("scripts/discover.py");

/// Python modules the driver script imports.
pub const REQUIRED_PACKAGES: &[&str] = &["numpy", "causallearn", "lingam"];

/// Supported discovery algorithms.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Algorithm {
    /// Constraint-based PC with Fisher-z tests.
    Pc,
    /// ICA-based LiNGAM.
    IcaLingam,
    /// Regression-based DirectLiNGAM.
    DirectLingam,
}

impl Algorithm {
    pub const ALL: [Algorithm; 3] = [Self::Pc, Self::IcaLingam, Self::DirectLingam];

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Pc => "pc",
            Self::IcaLingam => "ica_lingam",
            Self::DirectLingam => "direct_lingam",
        }
    }
}

impl fmt::Display for Algorithm {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Algorithm {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().replace('-', "_").as_str() {
            "pc" => Ok(Self::Pc),
            "ica_lingam" | "lingam" => Ok(Self::IcaLingam),
            "direct_lingam" | "directlingam" => Ok(Self::DirectLingam),
            other => Err(format!("unknown algorithm '{other}'")),
        }
    }
}

/// One backend invocation.
#[derive(Debug, Clone, Serialize)]
pub struct BackendRequest<'a> {
    pub algorithm: Algorithm,
    pub data: &'a FeatureMatrix,
    /// Fully resolved parameters (defaults filled in).
    pub params: serde_json::Value,
    /// Forbidden `(from, to)` column pairs.
    pub forbidden: Vec<(usize, usize)>,
}

/// A synchronous discovery backend. May fail on any call.
pub trait DiscoveryBackend {
    fn invoke(&self, request: &BackendRequest<'_>) -> Result<serde_json::Value, DiscoveryError>;
}

impl<B: DiscoveryBackend + ?Sized> DiscoveryBackend for &B {
    fn invoke(&self, request: &BackendRequest<'_>) -> Result<serde_json::Value, DiscoveryError> {
        (**self).invoke(request)
    }
}

/// Runs the Python causal-discovery libraries in a subprocess.
///
/// Owns a current-thread tokio runtime so the subprocess and its timeout can
/// be driven from synchronous search code.
pub struct PythonBackend {
    runtime: PythonRuntime,
    executor: tokio::runtime::Runtime,
}

impl PythonBackend {
    pub fn new(runtime: PythonRuntime) -> Result<Self, DiscoveryError> {
        let executor = tokio::runtime::Builder::new_current_thread()
            .enable_all()
            .build()?;
        Ok(Self { runtime, executor })
    }

    pub fn from_config(config: &PythonConfig, workspace: PathBuf) -> Result<Self, DiscoveryError> {
        Self::new(PythonRuntime::from_config(config, workspace))
    }

    /// Interpreter diagnostics.
    pub fn python_info(&self) -> Result<PythonInfo, DiscoveryError> {
        self.executor.block_on(self.runtime.detect())
    }

    /// Which of [`REQUIRED_PACKAGES`] can be imported.
    pub fn check_packages(&self) -> HashMap<String, bool> {
        self.executor
            .block_on(self.runtime.check_packages(REQUIRED_PACKAGES))
    }
}

impl DiscoveryBackend for PythonBackend {
    fn invoke(&self, request: &BackendRequest<'_>) -> Result<serde_json::Value, DiscoveryError> {
        let input = serde_json::to_value(request)?;
        self.executor
            .block_on(self.runtime.run_script(DISCOVER_SCRIPT, &input, None))
    }
}
