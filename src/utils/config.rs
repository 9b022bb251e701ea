//! Process-wide Compiler Configuration
//!
//! Defaults that apply to every signing request unless the request
//! overrides them. Per-coin constants live in [`crate::coins`].

use std::sync::OnceLock;

/// Environment variable that turns on debug logging
pub const ENV_DEBUG: &str = "UTXO_COMPILER_DEBUG";
/// Environment variable that overrides the byte-fee sanity cap
pub const ENV_MAX_BYTE_FEE: &str = "UTXO_COMPILER_MAX_BYTE_FEE";
/// Environment variable that replaces every coin's default dust threshold
pub const ENV_DUST_THRESHOLD: &str = "UTXO_COMPILER_DUST_THRESHOLD";

/// Default input sequence (final, no RBF, no relative locktime)
pub const DEFAULT_SEQUENCE: u32 = 0xffff_ffff;

/// Upper bound for `byte_fee` (sat/vB); anything above is treated as a caller bug
pub const DEFAULT_MAX_BYTE_FEE: u64 = 10_000;

/// Compiler configuration
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CompilerConfig {
    /// Sequence used when an unspent output does not declare one
    pub default_sequence: u32,
    /// Maximum accepted fee rate
    pub max_byte_fee: u64,
    /// Dust threshold used when a request omits one; `None` keeps the coin default
    pub dust_threshold: Option<u64>,
    /// Whether debug lines are emitted
    pub debug: bool,
}

impl CompilerConfig {
    /// Create a configuration with built-in defaults
    pub fn new() -> Self {
        Self {
            default_sequence: DEFAULT_SEQUENCE,
            max_byte_fee: DEFAULT_MAX_BYTE_FEE,
            dust_threshold: None,
            debug: false,
        }
    }

    /// Dust policy for one request: the request's own value, then this config, then the coin
    pub fn dust_threshold_for(&self, requested: Option<u64>, coin_default: u64) -> u64 {
        requested.or(self.dust_threshold).unwrap_or(coin_default)
    }

    /// Built-in defaults overridden by environment variables
    pub fn from_env() -> Self {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Self {
        let mut config = Self::new();

        if let Some(value) = lookup(ENV_DEBUG) {
            config.debug = matches!(value.trim(), "1" | "true" | "yes");
        }

        if let Some(value) = lookup(ENV_MAX_BYTE_FEE) {
            match value.trim().parse::<u64>() {
                Ok(cap) if cap > 0 => config.max_byte_fee = cap,
                _ => crate::log_warn!(
                    "config",
                    "ignoring invalid byte fee cap",
                    value = value
                ),
            }
        }

        if let Some(value) = lookup(ENV_DUST_THRESHOLD) {
            match value.trim().parse::<u64>() {
                Ok(dust) => config.dust_threshold = Some(dust),
                Err(_) => crate::log_warn!(
                    "config",
                    "ignoring invalid dust threshold",
                    value = value
                ),
            }
        }

        config
    }
}

impl Default for CompilerConfig {
    fn default() -> Self {
        Self::new()
    }
}

/// Global compiler configuration instance
static COMPILER_CONFIG: OnceLock<CompilerConfig> = OnceLock::new();

/// Get the global compiler configuration
pub fn get_compiler_config() -> &'static CompilerConfig {
    COMPILER_CONFIG.get_or_init(|| {
        let config = CompilerConfig::from_env();
        if config.debug {
            super::logging::enable_debug();
        }
        config
    })
}
