//! Python runtime manager for discovery backends.
//!
//! Provides managed subprocess execution for the Python causal-discovery
//! libraries. A script receives its request as JSON on stdin and writes a
//! single JSON document to stdout.

use crate::error::DiscoveryError;
use causalab_core::config::PythonConfig;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::path::PathBuf;
use std::process::Stdio;
use std::time::Duration;
use tokio::io::AsyncWriteExt;
use tokio::process::Command;
use tracing::debug;

/// Information about the detected Python installation.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PythonInfo {
    pub path: PathBuf,
    pub version: String,
    pub venv_path: Option<PathBuf>,
}

/// Managed Python subprocess runner.
#[derive(Debug, Clone)]
pub struct PythonRuntime {
    python_path: PathBuf,
    venv_path: Option<PathBuf>,
    workspace: PathBuf,
    timeout: Duration,
}

impl PythonRuntime {
    /// Create a new Python runtime with default settings.
    pub fn new(workspace: PathBuf) -> Self {
        Self {
            python_path: PathBuf::from("python3"),
            venv_path: None,
            workspace,
            timeout: Duration::from_secs(300),
        }
    }

    /// Create from the `[python]` configuration section.
    pub fn from_config(config: &PythonConfig, workspace: PathBuf) -> Self {
        Self {
            python_path: config
                .python_path
                .clone()
                .unwrap_or_else(|| PathBuf::from("python3")),
            venv_path: config.venv_path.clone(),
            workspace,
            timeout: Duration::from_secs(config.timeout_secs),
        }
    }

    pub fn timeout(&self) -> Duration {
        self.timeout
    }

    /// Detect the configured interpreter and its version.
    pub async fn detect(&self) -> Result<PythonInfo, DiscoveryError> {
        let output = Command::new(self.python_cmd())
            .arg("--version")
            .output()
            .await
            .map_err(|e| DiscoveryError::python(format!("Python not found: {e}")))?;

        if !output.status.success() {
            return Err(DiscoveryError::python(format!(
                "'{} --version' exited with {}",
                self.python_cmd().display(),
                output.status
            )));
        }

        let version = String::from_utf8_lossy(&output.stdout).trim().to_string();
        // Python 2 printed its version on stderr.
        let version = if version.is_empty() {
            String::from_utf8_lossy(&output.stderr).trim().to_string()
        } else {
            version
        };

        Ok(PythonInfo {
            path: self.python_cmd(),
            version,
            venv_path: self.venv_path.clone().or_else(detect_venv),
        })
    }

    /// Get the effective Python command (accounting for venv).
    fn python_cmd(&self) -> PathBuf {
        if let Some(venv) = &self.venv_path {
            let bin_dir = if cfg!(windows) { "Scripts" } else { "bin" };
            venv.join(bin_dir).join("python")
        } else {
            self.python_path.clone()
        }
    }

    /// Run a Python script with JSON input/output.
    ///
    /// The script receives `input` as a JSON string on stdin and should
    /// write its output as JSON to stdout. The call is killed once `timeout`
    /// (or the runtime default) elapses.
    pub async fn run_script(
        &self,
        script: &str,
        input: &serde_json::Value,
        timeout: Option<Duration>,
    ) -> Result<serde_json::Value, DiscoveryError> {
        let timeout = timeout.unwrap_or(self.timeout);
        let input_json = serde_json::to_vec(input)?;

        debug!(
            script_len = script.len(),
            input_len = input_json.len(),
            "Running Python script"
        );

        let result = tokio::time::timeout(timeout, async {
            let mut child = Command::new(self.python_cmd())
                .args(["-c", script])
                .current_dir(&self.workspace)
                .stdin(Stdio::piped())
                .stdout(Stdio::piped())
                .stderr(Stdio::piped())
                .kill_on_drop(true)
                .spawn()
                .map_err(|e| DiscoveryError::python(format!("Failed to spawn Python: {e}")))?;

            if let Some(mut stdin) = child.stdin.take() {
                stdin.write_all(&input_json).await?;
                // Dropping stdin closes the pipe so the script sees EOF.
            }

            let output = child.wait_with_output().await?;
            if !output.status.success() {
                let stderr = String::from_utf8_lossy(&output.stderr);
                return Err(DiscoveryError::python(format!(
                    "Python script failed (exit {}): {}",
                    output.status,
                    stderr.trim()
                )));
            }

            let stdout = String::from_utf8_lossy(&output.stdout);
            if stdout.trim().is_empty() {
                Ok(serde_json::Value::Null)
            } else {
                serde_json::from_str(stdout.trim()).map_err(|e| {
                    DiscoveryError::InvalidOutput(format!("Invalid JSON output: {e}"))
                })
            }
        })
        .await;

        match result {
            Ok(inner) => inner,
            Err(_) => Err(DiscoveryError::Timeout {
                timeout_secs: timeout.as_secs(),
            }),
        }
    }

    /// Check which Python modules can be imported.
    pub async fn check_packages(&self, packages: &[&str]) -> HashMap<String, bool> {
        let mut results = HashMap::new();

        for pkg in packages {
            let script = format!("import importlib; importlib.import_module('{pkg}'); print('ok')");
            let available = Command::new(self.python_cmd())
                .args(["-c", &script])
                .output()
                .await
                .is_ok_and(|o| o.status.success());

            results.insert(pkg.to_string(), available);
        }

        results
    }
}

/// Detect a virtual environment in common locations.
fn detect_venv() -> Option<PathBuf> {
    if let Ok(venv) = std::env::var("VIRTUAL_ENV") {
        let path = PathBuf::from(venv);
        if path.exists() {
            return Some(path);
        }
    }

    [".venv", "venv"]
        .iter()
        .map(PathBuf::from)
        .find(|path| path.exists())
}
