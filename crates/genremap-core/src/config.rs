//! Runtime configuration: TOML file plus `GENREMAP_*` environment overrides

use std::path::Path;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::error::ConfigError;

/// Default config file name looked up in the working directory.
pub const CONFIG_FILE: &str = "genremap.toml";

pub const ENV_DECIMAL_PRECISION: &str = "GENREMAP_DECIMAL_PRECISION";
pub const ENV_MAX_PAIRWISE_SOURCES: &str = "GENREMAP_MAX_PAIRWISE_SOURCES";
pub const ENV_PRUNE: &str = "GENREMAP_PRUNE";

/// Largest precision that still round-trips through an f64.
pub const MAX_DECIMAL_PRECISION: u32 = 15;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct GenreMapConfig {
    /// Decimal places kept for normalized values and layout coordinates.
    pub decimal_precision: u32,
    pub view: ViewLimits,
    pub layout: LayoutConfig,
}

impl Default for GenreMapConfig {
    fn default() -> Self {
        Self {
            decimal_precision: 6,
            view: ViewLimits::default(),
            layout: LayoutConfig::default(),
        }
    }
}

/// What to do with nodes that only entered a view through pairwise stitching.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum PrunePolicy {
    /// Keep every stitched node.
    #[default]
    Disabled,
    /// Drop stitched-only nodes lying below a selected genre that is not expanded.
    StitchedDescendants,
}

impl FromStr for PrunePolicy {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "disabled" | "off" | "none" => Ok(PrunePolicy::Disabled),
            "stitched-descendants" | "on" => Ok(PrunePolicy::StitchedDescendants),
            other => Err(format!("unknown prune policy: {other}")),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ViewLimits {
    /// Upper bound on BFS sources used to stitch selected/expanded genres together.
    pub max_pairwise_sources: usize,
    pub prune: PrunePolicy,
}

impl Default for ViewLimits {
    fn default() -> Self {
        Self {
            max_pairwise_sources: 256,
            prune: PrunePolicy::Disabled,
        }
    }
}

/// Force simulation constants.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct LayoutConfig {
    pub iterations: usize,
    /// Upper bound on node-pair repulsions summed over all iterations.
    /// Repulsion is quadratic in the view size, so large views run fewer
    /// iterations.
    pub max_pair_evaluations: u64,
    /// Radius of the circle nodes start on.
    pub initial_radius: f64,
    /// Multiplier applied to the step temperature after every iteration.
    pub cooling: f64,
}

impl Default for LayoutConfig {
    fn default() -> Self {
        Self {
            iterations: 300,
            max_pair_evaluations: 200_000_000,
            initial_radius: 1.0,
            cooling: 0.97,
        }
    }
}

impl GenreMapConfig {
    /// Load configuration from an optional TOML file, then apply overrides from
    /// the process environment (after reading `.env`, if present).
    pub fn load(path: Option<&Path>) -> Result<Self, ConfigError> {
        let mut config = match path {
            Some(path) => Self::from_file(path)?,
            None => {
                let default_path = Path::new(CONFIG_FILE);
                if default_path.exists() {
                    Self::from_file(default_path)?
                } else {
                    Self::default()
                }
            }
        };

        if let Ok(env_path) = dotenvy::dotenv() {
            tracing::debug!("Loaded environment from {}", env_path.display());
        }
        config.apply_env(|key| std::env::var(key).ok())?;
        config.validate()?;
        Ok(config)
    }

    pub fn from_file(path: &Path) -> Result<Self, ConfigError> {
        let text = std::fs::read_to_string(path).map_err(|source| ConfigError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        let config: Self = toml::from_str(&text).map_err(|source| ConfigError::Parse {
            path: path.to_path_buf(),
            source,
        })?;
        config.validate()?;
        Ok(config)
    }

    /// Apply `GENREMAP_*` overrides read through `lookup`.
    pub fn apply_env<F>(&mut self, lookup: F) -> Result<(), ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        if let Some(value) = lookup(ENV_DECIMAL_PRECISION) {
            self.decimal_precision = parse_env(ENV_DECIMAL_PRECISION, value)?;
        }
        if let Some(value) = lookup(ENV_MAX_PAIRWISE_SOURCES) {
            self.view.max_pairwise_sources = parse_env(ENV_MAX_PAIRWISE_SOURCES, value)?;
        }
        if let Some(value) = lookup(ENV_PRUNE) {
            self.view.prune = parse_env(ENV_PRUNE, value)?;
        }
        Ok(())
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.decimal_precision > MAX_DECIMAL_PRECISION {
            return Err(ConfigError::InvalidPrecision(self.decimal_precision));
        }
        Ok(())
    }
}

fn parse_env<T: FromStr>(key: &'static str, value: String) -> Result<T, ConfigError> {
    value
        .trim()
        .parse()
        .map_err(|_| ConfigError::InvalidEnv { key, value })
}

/// Round `value` to `precision` decimal places.
pub fn round_to(value: f64, precision: u32) -> f64 {
    let factor = 10f64.powi(precision as i32);
    (value * factor).round() / factor
}
