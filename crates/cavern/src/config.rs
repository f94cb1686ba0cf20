//! Analyzer configuration.

use serde::{Deserialize, Serialize};

use cavern_parser::ValidateOptions;

fn default_max_tile_mutations() -> usize {
    630
}

fn default_true() -> bool {
    true
}

/// Tunable analysis policy, loadable from TOML by the CLI.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AnalyzerConfig {
    /// Ceiling on tile mutations reachable from one trigger body.
    #[serde(default = "default_max_tile_mutations")]
    pub max_tile_mutations: usize,
    /// Warn when fluid and solid tile writes mix in one trigger body.
    #[serde(default = "default_true")]
    pub warn_fluid_mixing: bool,
    /// Lint `~` guards that are not the final statement of their chain.
    #[serde(default = "default_true")]
    pub lint_failure_guard: bool,
}

impl Default for AnalyzerConfig {
    fn default() -> Self {
        Self {
            max_tile_mutations: default_max_tile_mutations(),
            warn_fluid_mixing: true,
            lint_failure_guard: true,
        }
    }
}

impl AnalyzerConfig {
    /// The validator options this configuration selects.
    pub fn validate_options(&self) -> ValidateOptions {
        ValidateOptions {
            max_tile_mutations: self.max_tile_mutations,
            warn_fluid_mixing: self.warn_fluid_mixing,
            lint_failure_guard: self.lint_failure_guard,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_match_the_engine_ceiling() {
        let config = AnalyzerConfig::default();
        assert_eq!(config.max_tile_mutations, 630);
        assert!(config.warn_fluid_mixing);
    }

    #[test]
    fn partial_toml_fills_defaults() {
        let config: AnalyzerConfig = toml::from_str("max_tile_mutations = 100").unwrap();
        assert_eq!(config.max_tile_mutations, 100);
        assert!(config.lint_failure_guard);
    }
}
