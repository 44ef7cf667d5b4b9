//! Shared utilities for demos.
//!
//! Provides common functionality used across all demos:
//! - Command-line argument parsing
//! - API key lookup
//! - Logging initialization

#![allow(dead_code)]

// ============================================================================
// Imports
// ============================================================================

use std::path::PathBuf;

use tracing_subscriber::EnvFilter;
use vizion::{Error, ProvisioningProgress, Result};

// ============================================================================
// Constants
// ============================================================================

/// Environment variable holding the account API key.
pub const API_KEY_VAR: &str = "VIZION_API_KEY";

/// Frame read when `--frame` is not given.
pub const DEFAULT_FRAME: &str = "frame.jpg";

// ============================================================================
// Types
// ============================================================================

/// Command-line arguments for demos.
#[derive(Debug, Clone)]
pub struct Args {
    pub debug: bool,
    pub frame: PathBuf,
    pub prompts: Vec<String>,
}

impl Args {
    /// Parse command-line arguments.
    pub fn parse() -> Self {
        let args: Vec<String> = std::env::args().collect();
        let value_of = |flag: &str| {
            args.iter()
                .position(|a| a == flag)
                .and_then(|i| args.get(i + 1))
                .cloned()
        };

        Self {
            debug: args.iter().any(|a| a == "--debug"),
            frame: value_of("--frame")
                .map(PathBuf::from)
                .unwrap_or_else(|| PathBuf::from(DEFAULT_FRAME)),
            prompts: value_of("--prompts")
                .map(|p| p.split(',').map(|s| s.trim().to_string()).collect())
                .unwrap_or_else(|| vec!["person".to_string(), "car".to_string()]),
        }
    }

    /// Reads the JPEG frame.
    pub fn read_frame(&self) -> Result<Vec<u8>> {
        std::fs::read(&self.frame).map_err(|e| {
            Error::config(format!("cannot read frame {}: {e}", self.frame.display()))
        })
    }
}

// ============================================================================
// Functions
// ============================================================================

/// Reads the API key from the environment.
pub fn api_key() -> Result<String> {
    std::env::var(API_KEY_VAR)
        .map_err(|_| Error::config(format!("set {API_KEY_VAR} to your Vizion API key")))
}

/// Initialize tracing/logging.
pub fn init_logging(debug: bool) {
    let filter = if debug { "vizion=debug" } else { "vizion=info" };

    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::new(filter))
        .with_target(false)
        .init();
}

/// Prints a one-line provisioning progress indicator.
pub fn print_progress(progress: ProvisioningProgress) {
    eprint!(
        "\r    Waiting for GPU worker... {}s",
        progress.elapsed.as_secs()
    );
}
