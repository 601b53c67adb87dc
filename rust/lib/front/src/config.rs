//! Front-end runtime settings, read from the public build environment.

use std::time::Duration;

use pmp_query::parse_int_safe;
use serde::{Deserialize, Serialize};

pub const API_BASE_URL_VAR: &str = "NEXT_PUBLIC_API_BASE_URL";
pub const API_DELAY_VAR: &str = "NEXT_PUBLIC_API_DELAY";
pub const S3_BASE_URL_VAR: &str = "NEXT_PUBLIC_S3_BASE_URL";

/// Largest accepted upload, in bytes.
pub const FILE_UPLOAD_MAX_SIZE: u64 = 1000 * 1024 * 1024;

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FrontConfig {
    /// Prefix for every API call. Empty means same origin.
    #[serde(default)]
    pub api_base_url: String,

    /// Artificial delay before each API call (development aid).
    #[serde(default)]
    pub api_delay: Duration,

    #[serde(default)]
    pub s3_base_url: String,

    pub file_upload_max_size: u64,
}

impl Default for FrontConfig {
    fn default() -> Self {
        Self {
            api_base_url: String::new(),
            api_delay: Duration::ZERO,
            s3_base_url: String::new(),
            file_upload_max_size: FILE_UPLOAD_MAX_SIZE,
        }
    }
}

impl FrontConfig {
    pub fn from_env() -> Self {
        Self::from_vars(|name| std::env::var(name).ok())
    }

    /// Build from an arbitrary variable lookup. Missing or unparsable values
    /// fall back to the defaults.
    pub fn from_vars<F>(lookup: F) -> Self
    where
        F: Fn(&str) -> Option<String>,
    {
        let api_delay = lookup(API_DELAY_VAR)
            .and_then(|v| parse_int_safe(&v))
            .and_then(|ms| u64::try_from(ms).ok())
            .map(Duration::from_millis)
            .unwrap_or_default();
        Self {
            api_base_url: lookup(API_BASE_URL_VAR).unwrap_or_default(),
            api_delay,
            s3_base_url: lookup(S3_BASE_URL_VAR).unwrap_or_default(),
            ..Self::default()
        }
    }

    pub fn api_url(&self, path: &str) -> String {
        format!("{}{}", self.api_base_url, path)
    }

    pub fn accepts_upload(&self, size: u64) -> bool {
        size <= self.file_upload_max_size
    }
}
