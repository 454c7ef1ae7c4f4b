// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Environment interaction: interpreter discovery settings.

use std::collections::HashMap;
use std::env;

/// Known, non-exhaustive setting keys for interpreter discovery.
pub const PYTHON_INTERPRETER_PATH: &str = "python_interpreter_path";
pub const JULIA_EXECUTABLE_PATH: &str = "julia_executable_path";
pub const JULIA_PROJECT_PATH: &str = "julia_project_path";
pub const GAMS_PATH: &str = "gams_path";
pub const CONDA_PATH: &str = "conda_path";

/// Frozen-bundle fallback used when no interpreter path is configured and
/// `PATH` resolution fails.
const EMBEDDED_PYTHON_ENV: &str = "EMBEDDED_PYTHON";

/// Key/value settings mapping the engine reads for interpreter discovery.
///
/// All keys may be empty or absent; resolution falls back to `PATH`, then to
/// the `EMBEDDED_PYTHON` environment variable for the Python interpreter.
#[derive(Debug, Clone, Default)]
pub struct Settings {
    values: HashMap<String, String>,
}

impl Settings {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.values.insert(key.into(), value.into());
        self
    }

    pub fn get(&self, key: &str) -> Option<&str> {
        self.values.get(key).map(String::as_str).filter(|v| !v.is_empty())
    }

    /// Resolve the Python interpreter path: explicit setting, else `PATH`
    /// lookup for `python3`, else the `EMBEDDED_PYTHON` fallback.
    pub fn python_interpreter_path(&self) -> Option<String> {
        self.get(PYTHON_INTERPRETER_PATH)
            .map(str::to_string)
            .or_else(|| which("python3"))
            .or_else(|| env::var(EMBEDDED_PYTHON_ENV).ok())
    }

    pub fn julia_executable_path(&self) -> Option<String> {
        self.get(JULIA_EXECUTABLE_PATH)
            .map(str::to_string)
            .or_else(|| which("julia"))
    }

    pub fn julia_project_path(&self) -> Option<&str> {
        self.get(JULIA_PROJECT_PATH)
    }

    pub fn gams_path(&self) -> Option<String> {
        self.get(GAMS_PATH).map(str::to_string).or_else(|| which("gams"))
    }

    pub fn conda_path(&self) -> Option<String> {
        self.get(CONDA_PATH).map(str::to_string).or_else(|| which("conda"))
    }
}

/// Minimal `PATH` search; returns the first matching executable's path.
fn which(bin: &str) -> Option<String> {
    let path = env::var_os("PATH")?;
    env::split_paths(&path).find_map(|dir| {
        let candidate = dir.join(bin);
        candidate.is_file().then(|| candidate.to_string_lossy().into_owned())
    })
}

#[cfg(test)]
#[path = "settings_tests.rs"]
mod tests;
