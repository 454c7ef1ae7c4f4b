// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Conda kernel spec discovery, cached for 60 seconds.

use crate::error::ManagerError;
use crate::subprocess::{run_with_timeout, CONDA_DISCOVERY_TIMEOUT};
use parking_lot::Mutex;
use serde::Deserialize;
use std::time::{Duration, Instant};
use tokio::process::Command;

const CACHE_TTL: Duration = Duration::from_secs(60);

/// A kernel spec synthesised from a discovered Conda environment.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct KernelSpec {
    pub name: String,
    pub display_name: String,
    pub argv: Vec<String>,
}

#[derive(Deserialize)]
struct CondaEnvList {
    envs: Vec<String>,
}

/// Discovers Conda environments and synthesises kernel specs on the fly,
/// caching the result for 60 seconds so repeated lookups within one
/// workflow run don't re-shell out to `conda`.
pub struct CondaKernelSpecs {
    conda_path: String,
    cache: Mutex<Option<(Instant, Vec<KernelSpec>)>>,
}

impl CondaKernelSpecs {
    pub fn new(conda_path: impl Into<String>) -> Self {
        Self { conda_path: conda_path.into(), cache: Mutex::new(None) }
    }

    pub async fn list(&self) -> Result<Vec<KernelSpec>, ManagerError> {
        if let Some((fetched_at, specs)) = self.cache.lock().clone() {
            if fetched_at.elapsed() < CACHE_TTL {
                return Ok(specs);
            }
        }

        let specs = self.discover().await?;
        *self.cache.lock() = Some((Instant::now(), specs.clone()));
        Ok(specs)
    }

    async fn discover(&self) -> Result<Vec<KernelSpec>, ManagerError> {
        let mut cmd = Command::new(&self.conda_path);
        cmd.args(["env", "list", "--json"]);
        let output = run_with_timeout(cmd, CONDA_DISCOVERY_TIMEOUT, "conda env list")
            .await
            .map_err(ManagerError::CommandFailed)?;
        if !output.status.success() {
            return Err(ManagerError::CommandFailed(
                String::from_utf8_lossy(&output.stderr).into_owned(),
            ));
        }
        let parsed: CondaEnvList = serde_json::from_slice(&output.stdout)
            .map_err(|e| ManagerError::CommandFailed(e.to_string()))?;

        Ok(parsed
            .envs
            .into_iter()
            .map(|env_path| {
                let name = env_path.rsplit('/').next().unwrap_or(&env_path).to_string();
                KernelSpec {
                    display_name: format!("Python ({name})"),
                    argv: vec![
                        format!("{env_path}/bin/python"),
                        "-m".to_string(),
                        "ipykernel_launcher".to_string(),
                        "-f".to_string(),
                        "{connection_file}".to_string(),
                    ],
                    name,
                }
            })
            .collect())
    }
}

#[cfg(test)]
#[path = "conda_tests.rs"]
mod tests;
