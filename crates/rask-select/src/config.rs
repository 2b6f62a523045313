// SPDX-License-Identifier: (MIT OR Apache-2.0)
//! Rival thread configuration.

use std::thread;

/// How a blocking select spawns its rival threads.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SelectConfig {
    /// Rival threads are named `{prefix}-{clause index}`.
    pub thread_name_prefix: String,
    /// Stack size for rival threads; `None` keeps the platform default.
    pub stack_size: Option<usize>,
}

impl SelectConfig {
    /// Default configuration, respecting the `RASK_SELECT_STACK_SIZE`
    /// env override (bytes, with an optional `k`/`m` suffix).
    pub fn from_env() -> Self {
        let stack_size = std::env::var("RASK_SELECT_STACK_SIZE")
            .ok()
            .and_then(|s| parse_size(&s));
        Self {
            stack_size,
            ..Self::default()
        }
    }

    pub fn with_stack_size(mut self, bytes: usize) -> Self {
        self.stack_size = Some(bytes);
        self
    }

    pub fn with_thread_name_prefix(mut self, prefix: impl Into<String>) -> Self {
        self.thread_name_prefix = prefix.into();
        self
    }

    /// Thread builder for the rival racing clause `index` (1-based).
    pub(crate) fn rival_builder(&self, index: usize) -> thread::Builder {
        let builder = thread::Builder::new().name(format!("{}-{}", self.thread_name_prefix, index));
        match self.stack_size {
            Some(bytes) => builder.stack_size(bytes),
            None => builder,
        }
    }
}

impl Default for SelectConfig {
    fn default() -> Self {
        Self {
            thread_name_prefix: "rask-select".to_string(),
            stack_size: None,
        }
    }
}

/// Parse "65536", "64k", "2m" (case-insensitive).
fn parse_size(s: &str) -> Option<usize> {
    let s = s.trim().to_ascii_lowercase();
    let (digits, mult) = if let Some(n) = s.strip_suffix('k') {
        (n, 1024)
    } else if let Some(n) = s.strip_suffix('m') {
        (n, 1024 * 1024)
    } else {
        (s.as_str(), 1)
    };
    digits.trim().parse::<usize>().ok()?.checked_mul(mult)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parse_sizes() {
        assert_eq!(parse_size("65536"), Some(65536));
        assert_eq!(parse_size("64k"), Some(64 * 1024));
        assert_eq!(parse_size("2M"), Some(2 * 1024 * 1024));
        assert_eq!(parse_size("lots"), None);
        assert_eq!(parse_size(""), None);
    }

    #[test]
    fn builder_overrides() {
        let cfg = SelectConfig::default()
            .with_stack_size(128 * 1024)
            .with_thread_name_prefix("worker");
        assert_eq!(cfg.stack_size, Some(128 * 1024));
        assert_eq!(cfg.thread_name_prefix, "worker");
    }

    #[test]
    fn rival_thread_is_named() {
        let cfg = SelectConfig::default();
        let name = cfg
            .rival_builder(3)
            .spawn(|| std::thread::current().name().map(str::to_string))
            .unwrap()
            .join()
            .unwrap();
        assert_eq!(name.as_deref(), Some("rask-select-3"));
    }
}
