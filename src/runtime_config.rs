//! # Runtime Configuration Module
//!
//! Environment-variable configuration for the dispatcher and the bundled
//! HTTP server.
//!
//! ## Environment Variables
//!
//! ### `BRRTD_MAX_BODY_BYTES`
//!
//! Maximum request body size in bytes. Accepts decimal (`1048576`) or
//! hexadecimal (`0x100000`). Zero or a negative value disables the limit.
//!
//! Default: `2097152` (2 MiB)
//!
//! ### `BRRTD_WORKERS`
//!
//! Number of worker threads pulling requests off the listener.
//!
//! Default: `4`
//!
//! ## Usage
//!
//! ```rust
//! use brrtdispatch::runtime_config::RuntimeConfig;
//!
//! let config = RuntimeConfig::from_env();
//! println!("Body limit: {} bytes", config.max_body_bytes);
//! ```

use std::env;
use tracing::warn;

/// Default body limit: 2 MiB.
pub const DEFAULT_MAX_BODY_BYTES: i64 = 2 * 1024 * 1024;

pub const DEFAULT_WORKERS: usize = 4;

/// Runtime configuration loaded from environment variables.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RuntimeConfig {
    /// Request body limit in bytes; `<= 0` disables the check.
    pub max_body_bytes: i64,
    /// Listener worker threads (at least 1).
    pub workers: usize,
}

impl Default for RuntimeConfig {
    fn default() -> Self {
        Self {
            max_body_bytes: DEFAULT_MAX_BODY_BYTES,
            workers: DEFAULT_WORKERS,
        }
    }
}

impl RuntimeConfig {
    /// Load configuration from environment variables.
    #[must_use]
    pub fn from_env() -> Self {
        Self::from_lookup(|key| env::var(key).ok())
    }

    /// Load configuration through an arbitrary key lookup.
    pub fn from_lookup<F>(lookup: F) -> Self
    where
        F: Fn(&str) -> Option<String>,
    {
        let max_body_bytes = match lookup("BRRTD_MAX_BODY_BYTES") {
            Some(val) => parse_i64(&val).unwrap_or_else(|| {
                warn!(value = %val, "Invalid BRRTD_MAX_BODY_BYTES; using default");
                DEFAULT_MAX_BODY_BYTES
            }),
            None => DEFAULT_MAX_BODY_BYTES,
        };
        let workers = match lookup("BRRTD_WORKERS") {
            Some(val) => match val.trim().parse::<usize>() {
                Ok(n) if n > 0 => n,
                _ => {
                    warn!(value = %val, "Invalid BRRTD_WORKERS; using default");
                    DEFAULT_WORKERS
                }
            },
            None => DEFAULT_WORKERS,
        };
        RuntimeConfig {
            max_body_bytes,
            workers,
        }
    }
}

fn parse_i64(val: &str) -> Option<i64> {
    let val = val.trim();
    match val.strip_prefix("0x") {
        Some(hex) => i64::from_str_radix(hex, 16).ok(),
        None => val.parse().ok(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn config(pairs: &[(&str, &str)]) -> RuntimeConfig {
        let map: HashMap<String, String> = pairs
            .iter()
            .map(|(k, v)| ((*k).to_string(), (*v).to_string()))
            .collect();
        RuntimeConfig::from_lookup(|k| map.get(k).cloned())
    }

    #[test]
    fn test_defaults() {
        assert_eq!(config(&[]), RuntimeConfig::default());
        assert_eq!(RuntimeConfig::default().max_body_bytes, 2_097_152);
    }

    #[test]
    fn test_body_limit_decimal_hex_and_disabled() {
        assert_eq!(config(&[("BRRTD_MAX_BODY_BYTES", "1024")]).max_body_bytes, 1024);
        assert_eq!(config(&[("BRRTD_MAX_BODY_BYTES", "0x400")]).max_body_bytes, 1024);
        assert_eq!(config(&[("BRRTD_MAX_BODY_BYTES", "0")]).max_body_bytes, 0);
        assert_eq!(config(&[("BRRTD_MAX_BODY_BYTES", "-1")]).max_body_bytes, -1);
    }

    #[test]
    fn test_invalid_values_fall_back() {
        let c = config(&[("BRRTD_MAX_BODY_BYTES", "lots"), ("BRRTD_WORKERS", "0")]);
        assert_eq!(c, RuntimeConfig::default());
    }
}
