//! Run configuration and constraint files.
//!
//! Both are JSON. A configuration looks like
//!
//! ```json
//! {
//!   "max_loops": 200,
//!   "threshold": 1e-6,
//!   "strategy": {
//!     "closure": "strict",
//!     "inner": { "mode": "iterate_to_tolerance", "tolerance": 0.005, "max_iterations": 100 },
//!     "local_update": "direct"
//!   }
//! }
//! ```
//!
//! and every field may be omitted. A constraint file is a list of tagged
//! objects:
//!
//! ```json
//! [
//!   { "kind": "local_marginal", "concept": "Rain",
//!     "variables": [{ "name": "Rain", "states": ["True", "False"] }],
//!     "values": [0.7, 0.3] }
//! ]
//! ```

use ipfp_core::{ConditionalDistribution, JointDistribution, RandomVariable};
use serde::{Deserialize, Serialize};

use crate::constraint::Constraint;
use crate::decomposed::{DecomposedConfig, DecomposedIpfp};
use crate::error::FitError;

pub const DEFAULT_MAX_LOOPS: usize = 1000;
pub const DEFAULT_THRESHOLD: f64 = 1e-6;

/// Iteration budget plus decomposed strategy.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct RevisionConfig {
    pub max_loops: usize,
    pub threshold: f64,
    pub strategy: DecomposedConfig,
}

impl Default for RevisionConfig {
    fn default() -> Self {
        Self {
            max_loops: DEFAULT_MAX_LOOPS,
            threshold: DEFAULT_THRESHOLD,
            strategy: DecomposedConfig::default(),
        }
    }
}

impl RevisionConfig {
    pub fn from_json(json: &str) -> Result<Self, FitError> {
        Ok(serde_json::from_str(json)?)
    }

    pub fn with_max_loops(mut self, max_loops: usize) -> Self {
        self.max_loops = max_loops;
        self
    }

    pub fn with_threshold(mut self, threshold: f64) -> Self {
        self.threshold = threshold;
        self
    }

    pub fn with_strategy(mut self, strategy: DecomposedConfig) -> Self {
        self.strategy = strategy;
        self
    }

    /// A decomposed solver for this configuration.
    pub fn decomposed(&self) -> Result<DecomposedIpfp, FitError> {
        DecomposedIpfp::new(self.max_loops, self.threshold, self.strategy)
    }
}

/// One constraint as stored on disk.
///
/// Values are row-major over `variables`, or over `conds` then `priors`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum ConstraintSpec {
    LocalMarginal {
        concept: String,
        variables: Vec<RandomVariable>,
        values: Vec<f64>,
    },
    NonlocalMarginal {
        variables: Vec<RandomVariable>,
        values: Vec<f64>,
    },
    LocalConditional {
        priors: Vec<RandomVariable>,
        conds: Vec<RandomVariable>,
        values: Vec<f64>,
    },
    NonlocalConditional {
        priors: Vec<RandomVariable>,
        conds: Vec<RandomVariable>,
        values: Vec<f64>,
    },
}

impl TryFrom<ConstraintSpec> for Constraint {
    type Error = FitError;

    fn try_from(spec: ConstraintSpec) -> Result<Self, Self::Error> {
        match spec {
            ConstraintSpec::LocalMarginal {
                concept,
                variables,
                values,
            } => Constraint::local_marginal(
                concept,
                JointDistribution::from_values(variables, values)?,
            ),
            ConstraintSpec::NonlocalMarginal { variables, values } => {
                Constraint::nonlocal_marginal(JointDistribution::from_values(variables, values)?)
            }
            ConstraintSpec::LocalConditional {
                priors,
                conds,
                values,
            } => Constraint::local_conditional(ConditionalDistribution::from_values(
                priors, conds, values,
            )?),
            ConstraintSpec::NonlocalConditional {
                priors,
                conds,
                values,
            } => Ok(Constraint::nonlocal_conditional(
                ConditionalDistribution::from_values(priors, conds, values)?,
            )),
        }
    }
}

/// Parse and validate a JSON list of constraints.
pub fn load_constraints(json: &str) -> Result<Vec<Constraint>, FitError> {
    let specs: Vec<ConstraintSpec> = serde_json::from_str(json)?;
    specs.into_iter().map(Constraint::try_from).collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::constraint::Scope;
    use crate::decomposed::{InnerConvergence, LocalUpdate};
    use ipfp_network::ClosureKind;

    #[test]
    fn test_partial_config() {
        let config = RevisionConfig::from_json(r#"{ "threshold": 0.001 }"#).unwrap();
        assert_eq!(config.max_loops, DEFAULT_MAX_LOOPS);
        assert_eq!(config.threshold, 0.001);
        assert_eq!(config.strategy, DecomposedConfig::default());
    }

    #[test]
    fn test_full_config() {
        let json = r#"{
            "max_loops": 20,
            "threshold": 1e-4,
            "strategy": {
                "closure": "strict",
                "inner": { "mode": "single_pass" },
                "local_update": "via_closure"
            }
        }"#;
        let config = RevisionConfig::from_json(json).unwrap();
        assert_eq!(config.strategy, DecomposedConfig::variant(7).unwrap());
        assert_eq!(config.strategy.closure, ClosureKind::Strict);
        assert_eq!(config.strategy.inner, InnerConvergence::SinglePass);
        assert_eq!(config.strategy.local_update, LocalUpdate::ViaClosure);
        assert!(config.decomposed().is_ok());
    }

    #[test]
    fn test_config_roundtrip() {
        let config = RevisionConfig::default().with_max_loops(7);
        let json = serde_json::to_string(&config).unwrap();
        assert_eq!(RevisionConfig::from_json(&json).unwrap(), config);
    }

    #[test]
    fn test_bad_config() {
        assert!(matches!(
            RevisionConfig::from_json(r#"{ "max_loops": "many" }"#),
            Err(FitError::Json(_))
        ));
        let config = RevisionConfig::default().with_max_loops(0);
        assert!(matches!(
            config.decomposed(),
            Err(FitError::InvalidConfig { .. })
        ));
    }

    #[test]
    fn test_load_constraints() {
        let json = r#"[
            { "kind": "local_marginal", "concept": "Rain",
              "variables": [{ "name": "Rain", "states": ["True", "False"] }],
              "values": [0.7, 0.3] },
            { "kind": "local_conditional",
              "priors": [{ "name": "WetGrass", "states": ["True", "False"] }],
              "conds": [{ "name": "Rain", "states": ["True", "False"] }],
              "values": [0.9, 0.1, 0.2, 0.8] }
        ]"#;
        let constraints = load_constraints(json).unwrap();
        assert_eq!(constraints.len(), 2);
        assert_eq!(constraints[0].concept(), Some("Rain"));
        assert_eq!(
            constraints[1].scope(),
            &Scope::Local {
                concept: "WetGrass".to_string()
            }
        );
    }

    #[test]
    fn test_load_rejects_invalid_constraints() {
        let too_small = r#"[{ "kind": "nonlocal_marginal",
            "variables": [{ "name": "Rain", "states": ["True", "False"] }],
            "values": [0.5, 0.5] }]"#;
        assert_eq!(
            load_constraints(too_small),
            Err(FitError::NonlocalTooSmall { count: 1 })
        );

        let wrong_length = r#"[{ "kind": "local_marginal", "concept": "Rain",
            "variables": [{ "name": "Rain", "states": ["True", "False"] }],
            "values": [1.0] }]"#;
        assert!(matches!(
            load_constraints(wrong_length),
            Err(FitError::Core(_))
        ));

        let unknown_kind = r#"[{ "kind": "global", "values": [] }]"#;
        assert!(matches!(load_constraints(unknown_kind), Err(FitError::Json(_))));
    }
}
