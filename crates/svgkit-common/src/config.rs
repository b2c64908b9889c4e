//! Export configuration.
//!
//! Every export call accepts an explicit [`ExportParams`]. For callers that do not want
//! to thread one through, a process-wide default can be installed once with
//! [`set_default_export_params`].
//!
//! The default is a single-writer value: it is guarded by a lock, so reads never
//! observe a torn value, but rewriting it while exports are running on other threads
//! makes it unspecified which of the two values those exports use.

use crate::{Result, SvgKitError};
use serde::{Deserialize, Serialize};
use std::path::Path;
use std::sync::RwLock;

lazy_static::lazy_static! {
    static ref DEFAULT_EXPORT_PARAMS: RwLock<Option<ExportParams>> = RwLock::new(None);
}

/// Region of the scene to export, in scene units.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct ExportRegion {
    pub x: f32,
    pub y: f32,
    pub width: f32,
    pub height: f32,
}

/// Parameters handed to the rendering host when exporting a scene.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ExportParams {
    /// Background as straight RGBA in `0.0..=1.0`; `None` keeps the background transparent.
    pub background: Option<[f32; 4]>,

    /// Sub-region to export; `None` exports the whole scene.
    pub region: Option<ExportRegion>,

    /// Upper bound for either pixel dimension of the output.
    pub max_dimension: u32,

    /// Whether the host should anti-alias geometry.
    pub anti_alias: bool,
}

impl Default for ExportParams {
    fn default() -> Self {
        Self {
            background: None,
            region: None,
            max_dimension: 16_384,
            anti_alias: true,
        }
    }
}

impl ExportParams {
    /// Parse export parameters from JSON. Missing fields take their default.
    pub fn from_json(json: &str) -> Result<Self> {
        serde_json::from_str(json)
            .map_err(|e| SvgKitError::config_with_source("invalid export parameters", e))
    }

    /// Read export parameters from a JSON file.
    pub fn from_file(path: impl AsRef<Path>) -> Result<Self> {
        let json = std::fs::read_to_string(path)?;
        Self::from_json(&json)
    }

    /// Serialize export parameters to JSON.
    pub fn to_json(&self) -> Result<String> {
        serde_json::to_string(self)
            .map_err(|e| SvgKitError::config_with_source("cannot serialize export parameters", e))
    }

    /// Set an opaque or translucent background.
    pub fn with_background(mut self, rgba: [f32; 4]) -> Self {
        self.background = Some(rgba);
        self
    }
}

/// Install the process-wide default export parameters. `None` resets to the built-in
/// default.
pub fn set_default_export_params(params: Option<ExportParams>) {
    match DEFAULT_EXPORT_PARAMS.write() {
        Ok(mut guard) => *guard = params,
        Err(poisoned) => *poisoned.into_inner() = params,
    }
}

/// Return the process-wide default export parameters.
pub fn default_export_params() -> ExportParams {
    let guard = match DEFAULT_EXPORT_PARAMS.read() {
        Ok(guard) => guard,
        Err(poisoned) => poisoned.into_inner(),
    };
    guard.clone().unwrap_or_default()
}
