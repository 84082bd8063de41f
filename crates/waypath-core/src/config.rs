//! Configuration loading and typed config structures for the planner.
//!
//! The canonical configuration lives in `waypath-config.yaml` at the
//! project root. Every field has a default, so an empty file (or no file)
//! yields a working planner.

use std::path::Path;

use serde::Deserialize;
use waypath_catalog::TransitConfig;

use crate::error::EngineError;

/// Errors that can occur when loading configuration.
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    /// Failed to read the configuration file from disk.
    #[error("failed to read config file: {source}")]
    Io {
        /// The underlying I/O error.
        #[from]
        source: std::io::Error,
    },

    /// Failed to parse YAML content.
    #[error("failed to parse config YAML: {source}")]
    Yaml {
        /// The underlying YAML parse error.
        source: serde_yml::Error,
    },

    /// The YAML parsed but a value is out of range.
    #[error("invalid config value: {message}")]
    Invalid {
        /// What is wrong.
        message: String,
    },
}

impl From<serde_yml::Error> for ConfigError {
    fn from(source: serde_yml::Error) -> Self {
        Self::Yaml { source }
    }
}

/// Top-level planner configuration.
///
/// Mirrors the structure of `waypath-config.yaml`.
#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
pub struct PlannerConfig {
    /// Feasibility gate thresholds.
    #[serde(default)]
    pub feasibility: FeasibilityConfig,

    /// Per-mode transit profiles.
    #[serde(default)]
    pub transit: TransitConfig,

    /// Default base-layer weights.
    #[serde(default)]
    pub weights: LayerWeights,

    /// Coherence correction layer.
    #[serde(default)]
    pub coherence: CoherenceConfig,

    /// Traveler condition model.
    #[serde(default)]
    pub condition: ConditionConfig,

    /// Session lifecycle and query defaults.
    #[serde(default)]
    pub session: SessionConfig,

    /// Contextual data tolerance.
    #[serde(default)]
    pub context: ContextConfig,

    /// Logging configuration.
    #[serde(default)]
    pub logging: LoggingConfig,
}

impl PlannerConfig {
    /// Load configuration from a YAML file at the given path.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::Io`] if the file cannot be read,
    /// [`ConfigError::Yaml`] if the content is not valid YAML, or
    /// [`ConfigError::Invalid`] if the default weights are malformed.
    pub fn from_file(path: &Path) -> Result<Self, ConfigError> {
        let contents = std::fs::read_to_string(path)?;
        Self::parse(&contents)
    }

    /// Parse configuration from a YAML string.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::Yaml`] if the string is not valid YAML, or
    /// [`ConfigError::Invalid`] if the default weights are malformed.
    pub fn parse(yaml: &str) -> Result<Self, ConfigError> {
        let config: Self = serde_yml::from_str(yaml)?;
        config
            .weights
            .validate()
            .map_err(|e| ConfigError::Invalid {
                message: e.to_string(),
            })?;
        Ok(config)
    }
}

/// Thresholds for the feasibility gates.
#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct FeasibilityConfig {
    /// Upper bound on the straight-line hop, in km. A trip may tighten it.
    #[serde(default = "default_max_distance_km")]
    pub max_distance_km: f64,

    /// Route distance may be at most this multiple of the straight-line
    /// distance.
    #[serde(default = "default_max_detour_ratio")]
    pub max_detour_ratio: f64,

    /// Crowd level above which a location is rejected at arrival.
    #[serde(default = "default_crowd_threshold")]
    pub crowd_threshold: f64,
}

impl Default for FeasibilityConfig {
    fn default() -> Self {
        Self {
            max_distance_km: default_max_distance_km(),
            max_detour_ratio: default_max_detour_ratio(),
            crowd_threshold: default_crowd_threshold(),
        }
    }
}

/// Weights of the three base layers. Must be non-negative and sum to 1.
#[derive(Debug, Clone, Copy, PartialEq, Deserialize, serde::Serialize)]
pub struct LayerWeights {
    /// Preference layer weight.
    #[serde(default = "default_preference_weight")]
    pub preference: f64,

    /// Efficiency layer weight.
    #[serde(default = "default_efficiency_weight")]
    pub efficiency: f64,

    /// Contextual layer weight.
    #[serde(default = "default_contextual_weight")]
    pub contextual: f64,
}

impl LayerWeights {
    /// Tolerance on the weight sum.
    pub const SUM_TOLERANCE: f64 = 1e-6;

    /// Check that every weight is finite and non-negative and that they
    /// sum to 1.
    ///
    /// # Errors
    ///
    /// Returns [`EngineError::InvalidConstraint`] otherwise.
    pub fn validate(&self) -> Result<(), EngineError> {
        let all = [self.preference, self.efficiency, self.contextual];
        if all.iter().any(|w| !w.is_finite() || *w < 0.0) {
            return Err(EngineError::invalid(
                "layer weights must be finite and non-negative",
            ));
        }
        let sum: f64 = all.iter().sum();
        if (sum - 1.0).abs() > Self::SUM_TOLERANCE {
            return Err(EngineError::invalid(format!(
                "layer weights must sum to 1, got {sum}"
            )));
        }
        Ok(())
    }
}

impl Default for LayerWeights {
    fn default() -> Self {
        Self {
            preference: default_preference_weight(),
            efficiency: default_efficiency_weight(),
            contextual: default_contextual_weight(),
        }
    }
}

/// Coherence correction configuration.
#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct CoherenceConfig {
    /// Whether the correction is applied at all.
    #[serde(default = "default_true")]
    pub enabled: bool,

    /// Coefficient on semantic flow, `delta`.
    #[serde(default = "default_coherence_coefficient")]
    pub delta: f64,

    /// Coefficient on causal strength, `epsilon`.
    #[serde(default = "default_coherence_coefficient")]
    pub epsilon: f64,

    /// How many past visits count as "recent" for repetition penalties.
    #[serde(default = "default_history_window")]
    pub history_window: usize,

    /// Deadline for one reasoning collaborator call.
    #[serde(default = "default_reasoning_timeout_ms")]
    pub reasoning_timeout_ms: u64,

    /// Share of the collaborator's estimate in the blended value; the rest
    /// comes from the rule-based estimate.
    #[serde(default = "default_reasoning_blend")]
    pub reasoning_blend: f64,
}

impl Default for CoherenceConfig {
    fn default() -> Self {
        Self {
            enabled: true,
            delta: default_coherence_coefficient(),
            epsilon: default_coherence_coefficient(),
            history_window: default_history_window(),
            reasoning_timeout_ms: default_reasoning_timeout_ms(),
            reasoning_blend: default_reasoning_blend(),
        }
    }
}

/// Rates of the heuristic traveler condition model.
#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct ConditionConfig {
    /// Physical energy lost per hour in transit.
    #[serde(default = "default_travel_fatigue_per_hour")]
    pub travel_fatigue_per_hour: f64,

    /// Multiplier on travel fatigue when walking.
    #[serde(default = "default_walking_fatigue_factor")]
    pub walking_fatigue_factor: f64,

    /// Physical energy lost per visit hour at an average-intensity venue.
    #[serde(default = "default_visit_fatigue_per_hour")]
    pub visit_fatigue_per_hour: f64,

    /// Mental energy lost per visit hour at an attentive venue.
    #[serde(default = "default_mental_fatigue_per_hour")]
    pub mental_fatigue_per_hour: f64,

    /// Satiety lost per hour of any activity.
    #[serde(default = "default_hunger_per_hour")]
    pub hunger_per_hour: f64,

    /// Satiety restored by a meal.
    #[serde(default = "default_meal_satiety")]
    pub meal_satiety: f64,

    /// Physical energy restored by a meal.
    #[serde(default = "default_meal_energy")]
    pub meal_energy: f64,

    /// Mental energy restored by a relaxing stop.
    #[serde(default = "default_rest_recovery")]
    pub rest_recovery: f64,

    /// Mood gained (or lost) per rating point above (or below) 2.5.
    #[serde(default = "default_mood_per_rating_point")]
    pub mood_per_rating_point: f64,
}

impl Default for ConditionConfig {
    fn default() -> Self {
        Self {
            travel_fatigue_per_hour: default_travel_fatigue_per_hour(),
            walking_fatigue_factor: default_walking_fatigue_factor(),
            visit_fatigue_per_hour: default_visit_fatigue_per_hour(),
            mental_fatigue_per_hour: default_mental_fatigue_per_hour(),
            hunger_per_hour: default_hunger_per_hour(),
            meal_satiety: default_meal_satiety(),
            meal_energy: default_meal_energy(),
            rest_recovery: default_rest_recovery(),
            mood_per_rating_point: default_mood_per_rating_point(),
        }
    }
}

/// Session lifecycle and query defaults.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct SessionConfig {
    /// A session untouched for this long is expired.
    #[serde(default = "default_idle_timeout_minutes")]
    pub idle_timeout_minutes: u32,

    /// Candidates returned when the caller does not ask for a count.
    #[serde(default = "default_top_k")]
    pub default_top_k: usize,

    /// Lattice rows when the caller does not ask for a count.
    #[serde(default = "default_lattice_steps")]
    pub lattice_steps: usize,

    /// Lattice columns when the caller does not ask for a count.
    #[serde(default = "default_lattice_alternatives")]
    pub lattice_alternatives: usize,
}

impl Default for SessionConfig {
    fn default() -> Self {
        Self {
            idle_timeout_minutes: default_idle_timeout_minutes(),
            default_top_k: default_top_k(),
            lattice_steps: default_lattice_steps(),
            lattice_alternatives: default_lattice_alternatives(),
        }
    }
}

/// Tolerance for contextual data.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct ContextConfig {
    /// Observations older than this are treated as unavailable.
    #[serde(default = "default_max_staleness_minutes")]
    pub max_staleness_minutes: u32,
}

impl Default for ContextConfig {
    fn default() -> Self {
        Self {
            max_staleness_minutes: default_max_staleness_minutes(),
        }
    }
}

/// Logging configuration.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct LoggingConfig {
    /// Default `tracing` filter when `RUST_LOG` is not set.
    #[serde(default = "default_log_level")]
    pub level: String,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: default_log_level(),
        }
    }
}

// ---------------------------------------------------------------------------
// Defaults
// ---------------------------------------------------------------------------

const fn default_true() -> bool {
    true
}

const fn default_max_distance_km() -> f64 {
    50.0
}

const fn default_max_detour_ratio() -> f64 {
    1.5
}

const fn default_crowd_threshold() -> f64 {
    0.7
}

const fn default_preference_weight() -> f64 {
    0.4
}

const fn default_efficiency_weight() -> f64 {
    0.3
}

const fn default_contextual_weight() -> f64 {
    0.3
}

const fn default_coherence_coefficient() -> f64 {
    0.1
}

const fn default_history_window() -> usize {
    3
}

const fn default_reasoning_timeout_ms() -> u64 {
    1500
}

const fn default_reasoning_blend() -> f64 {
    0.5
}

const fn default_travel_fatigue_per_hour() -> f64 {
    0.1
}

const fn default_walking_fatigue_factor() -> f64 {
    2.0
}

const fn default_visit_fatigue_per_hour() -> f64 {
    0.08
}

const fn default_mental_fatigue_per_hour() -> f64 {
    0.1
}

const fn default_hunger_per_hour() -> f64 {
    0.12
}

const fn default_meal_satiety() -> f64 {
    0.6
}

const fn default_meal_energy() -> f64 {
    0.15
}

const fn default_rest_recovery() -> f64 {
    0.15
}

const fn default_mood_per_rating_point() -> f64 {
    0.08
}

const fn default_idle_timeout_minutes() -> u32 {
    1440
}

const fn default_top_k() -> usize {
    10
}

const fn default_lattice_steps() -> usize {
    4
}

const fn default_lattice_alternatives() -> usize {
    3
}

const fn default_max_staleness_minutes() -> u32 {
    30
}

fn default_log_level() -> String {
    String::from("info")
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    #[test]
    fn empty_yaml_yields_defaults() {
        let config = PlannerConfig::parse("{}").unwrap();
        assert_eq!(config, PlannerConfig::default());
        assert!((config.coherence.delta - 0.1).abs() < f64::EPSILON);
        assert_eq!(config.session.idle_timeout_minutes, 1440);
        assert_eq!(config.session.default_top_k, 10);
    }

    #[test]
    fn partial_section_keeps_other_fields() {
        let yaml = "coherence:\n  enabled: false\nfeasibility:\n  crowd_threshold: 0.9\n";
        let config = PlannerConfig::parse(yaml).unwrap();
        assert!(!config.coherence.enabled);
        assert_eq!(config.coherence.history_window, 3);
        assert!((config.feasibility.crowd_threshold - 0.9).abs() < f64::EPSILON);
        assert!((config.feasibility.max_detour_ratio - 1.5).abs() < f64::EPSILON);
    }

    #[test]
    fn weights_must_sum_to_one() {
        let yaml = "weights:\n  preference: 0.5\n  efficiency: 0.5\n  contextual: 0.5\n";
        assert!(matches!(
            PlannerConfig::parse(yaml),
            Err(ConfigError::Invalid { .. })
        ));
    }

    #[test]
    fn negative_weight_is_rejected() {
        let weights = LayerWeights {
            preference: 1.2,
            efficiency: -0.2,
            contextual: 0.0,
        };
        assert!(matches!(
            weights.validate(),
            Err(EngineError::InvalidConstraint { .. })
        ));
    }

    #[test]
    fn default_weights_are_valid() {
        assert!(LayerWeights::default().validate().is_ok());
    }

    #[test]
    fn shipped_config_matches_defaults() {
        let config = PlannerConfig::parse(include_str!("../../../waypath-config.yaml")).unwrap();
        let defaults = PlannerConfig::default();
        assert_eq!(config.feasibility, defaults.feasibility);
        assert_eq!(config.weights, defaults.weights);
        assert_eq!(config.coherence, defaults.coherence);
        assert_eq!(config.condition, defaults.condition);
        assert_eq!(config.session, defaults.session);
        assert_eq!(config.logging, defaults.logging);
        assert_eq!(config.transit.walk, defaults.transit.walk);
        assert!((config.transit.taxi.speed_kmh - 30.0).abs() < f64::EPSILON);
    }

    #[test]
    fn malformed_yaml_is_a_yaml_error() {
        assert!(matches!(
            PlannerConfig::parse("weights: [1, 2"),
            Err(ConfigError::Yaml { .. })
        ));
    }
}
