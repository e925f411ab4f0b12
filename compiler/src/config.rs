//! Compiler configuration, loaded from an optional TOML file.
//!
//! Patterned on the teacher's extensibility-oriented `CompilerConfig`: a
//! plain struct with a `Default` impl and a small builder, deserialized
//! with `serde`/`toml` when the CLI is pointed at a config file via
//! `--config`. There's no builtin-registration machinery here — Pebble's
//! built-in table is fixed (see [`crate::builtins`]) — just the handful of
//! knobs the `compile`/`end` commands need for invoking the system
//! assembler/linker.

use serde::Deserialize;
use std::fs;
use std::path::Path;

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct CompilerConfig {
    /// The assembler/linker binary invoked by `compile`/`end`.
    pub cc: String,
    /// Keep the intermediate `.s` file next to the output binary.
    pub keep_asm: bool,
}

impl Default for CompilerConfig {
    fn default() -> Self {
        CompilerConfig {
            cc: "cc".to_string(),
            keep_asm: false,
        }
    }
}

impl CompilerConfig {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_cc(mut self, cc: impl Into<String>) -> Self {
        self.cc = cc.into();
        self
    }

    pub fn with_keep_asm(mut self, keep_asm: bool) -> Self {
        self.keep_asm = keep_asm;
        self
    }

    pub fn load(path: &Path) -> Result<Self, String> {
        let content = fs::read_to_string(path)
            .map_err(|e| format!("failed to read config '{}': {e}", path.display()))?;
        toml::from_str(&content)
            .map_err(|e| format!("failed to parse config '{}': {e}", path.display()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_cc_is_plain_cc() {
        assert_eq!(CompilerConfig::default().cc, "cc");
        assert!(!CompilerConfig::default().keep_asm);
    }

    #[test]
    fn builder_overrides_fields() {
        let cfg = CompilerConfig::new().with_cc("clang").with_keep_asm(true);
        assert_eq!(cfg.cc, "clang");
        assert!(cfg.keep_asm);
    }

    #[test]
    fn partial_toml_falls_back_to_defaults() {
        let cfg: CompilerConfig = toml::from_str("keep_asm = true").unwrap();
        assert_eq!(cfg.cc, "cc");
        assert!(cfg.keep_asm);
    }
}
