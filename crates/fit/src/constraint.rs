//! Probability constraints.
//!
//! A constraint is a target distribution plus a scope:
//!
//! | Target | Local | Nonlocal |
//! |--------|-------|----------|
//! | `R(Y)` | `Y = {C} ∪ L`, `L ⊆ parents(C)` | any `Y`, `|Y| ≥ 2` |
//! | `R(A\|B)` | `A = {C}`, `B ⊆ parents(C)` | any disjoint `A`, `B` |
//!
//! Shape rules are checked at construction. Rules that depend on a network
//! (is `L` really a parent set?) are checked by [`Constraint::validate`].

use ipfp_core::{ConditionalDistribution, JointDistribution, RandomVariable};
use ipfp_network::BeliefNetwork;

use crate::error::FitError;

/// The distribution a constraint asks for.
#[derive(Debug, Clone, PartialEq)]
pub enum Target {
    /// `R(Y)`.
    Marginal(JointDistribution),
    /// `R(A | B)`.
    Conditional(ConditionalDistribution),
}

impl Target {
    /// `Y`, or `A` followed by `B`.
    pub fn variables(&self) -> Vec<RandomVariable> {
        match self {
            Target::Marginal(r) => r.variables().to_vec(),
            Target::Conditional(r) => r.priors().iter().chain(r.conds()).cloned().collect(),
        }
    }

    pub fn names(&self) -> Vec<String> {
        self.variables()
            .iter()
            .map(|v| v.name().to_string())
            .collect()
    }

    /// Short label for logs.
    pub fn describe(&self) -> String {
        let join = |vs: &[RandomVariable]| {
            vs.iter()
                .map(RandomVariable::name)
                .collect::<Vec<_>>()
                .join(",")
        };
        match self {
            Target::Marginal(r) => format!("R({})", join(r.variables())),
            Target::Conditional(r) => format!("R({}|{})", join(r.priors()), join(r.conds())),
        }
    }
}

impl From<JointDistribution> for Target {
    fn from(r: JointDistribution) -> Self {
        Target::Marginal(r)
    }
}

impl From<ConditionalDistribution> for Target {
    fn from(r: ConditionalDistribution) -> Self {
        Target::Conditional(r)
    }
}

/// Where in the network a constraint lives.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Scope {
    /// About one concept and (some of) its parents.
    Local { concept: String },
    /// About arbitrary variables.
    Nonlocal,
}

/// A target distribution with its scope.
#[derive(Debug, Clone, PartialEq)]
pub struct Constraint {
    target: Target,
    scope: Scope,
}

impl Constraint {
    /// `R(C, L)` with `L` a subset of `C`'s parents (possibly empty).
    pub fn local_marginal(concept: impl Into<String>, r: JointDistribution) -> Result<Self, FitError> {
        let concept = concept.into();
        if !r.contains(&concept) {
            return Err(FitError::MissingConcept { concept });
        }
        Ok(Self {
            target: Target::Marginal(r),
            scope: Scope::Local { concept },
        })
    }

    /// `R(Y)` with `|Y| ≥ 2`.
    pub fn nonlocal_marginal(r: JointDistribution) -> Result<Self, FitError> {
        let count = r.variables().len();
        if count < 2 {
            return Err(FitError::NonlocalTooSmall { count });
        }
        Ok(Self {
            target: Target::Marginal(r),
            scope: Scope::Nonlocal,
        })
    }

    /// `R(C | L)` with `L` a non-empty subset of `C`'s parents.
    pub fn local_conditional(r: ConditionalDistribution) -> Result<Self, FitError> {
        if r.priors().len() != 1 {
            return Err(FitError::PriorCount {
                count: r.priors().len(),
            });
        }
        let concept = r.priors()[0].name().to_string();
        Ok(Self {
            target: Target::Conditional(r),
            scope: Scope::Local { concept },
        })
    }

    /// `R(A | B)` with arbitrary disjoint non-empty `A`, `B`.
    pub fn nonlocal_conditional(r: ConditionalDistribution) -> Self {
        Self {
            target: Target::Conditional(r),
            scope: Scope::Nonlocal,
        }
    }

    pub fn target(&self) -> &Target {
        &self.target
    }

    pub fn scope(&self) -> &Scope {
        &self.scope
    }

    /// The local concept, if any.
    pub fn concept(&self) -> Option<&str> {
        match &self.scope {
            Scope::Local { concept } => Some(concept),
            Scope::Nonlocal => None,
        }
    }

    /// Check the constraint against a network's nodes and structure.
    ///
    /// # Errors
    ///
    /// Fails if a variable is unknown to the network or has different
    /// states, or if a local constraint mentions non-parents of its concept.
    pub fn validate<N: BeliefNetwork + ?Sized>(&self, net: &N) -> Result<(), FitError> {
        for v in self.target.variables() {
            if net.random_variable(v.name())? != v {
                return Err(ipfp_core::CoreError::VariableMismatch {
                    name: v.name().to_string(),
                }
                .into());
            }
        }
        if let Scope::Local { concept } = &self.scope {
            let parents = net.parents(concept)?;
            let strangers: Vec<String> = self
                .target
                .names()
                .into_iter()
                .filter(|n| n != concept && !parents.contains(n))
                .collect();
            if !strangers.is_empty() {
                return Err(FitError::NotParents {
                    concept: concept.clone(),
                    variables: strangers.join(", "),
                });
            }
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use ipfp_network::sprinkler_network;

    fn var(name: &str) -> RandomVariable {
        RandomVariable::binary(name).unwrap()
    }

    #[test]
    fn test_local_marginal_needs_concept() {
        let r = JointDistribution::uniform(vec![var("Rain")]).unwrap();
        assert!(Constraint::local_marginal("Rain", r.clone()).is_ok());
        assert!(matches!(
            Constraint::local_marginal("Cloudy", r),
            Err(FitError::MissingConcept { .. })
        ));
    }

    #[test]
    fn test_nonlocal_marginal_size() {
        let r = JointDistribution::uniform(vec![var("Rain")]).unwrap();
        assert_eq!(
            Constraint::nonlocal_marginal(r),
            Err(FitError::NonlocalTooSmall { count: 1 })
        );
    }

    #[test]
    fn test_local_conditional_prior_count() {
        let r = ConditionalDistribution::new(vec![var("A"), var("B")], vec![var("C")]).unwrap();
        assert_eq!(
            Constraint::local_conditional(r),
            Err(FitError::PriorCount { count: 2 })
        );
        let r = ConditionalDistribution::new(vec![var("Rain")], vec![var("Cloudy")]).unwrap();
        let c = Constraint::local_conditional(r).unwrap();
        assert_eq!(c.concept(), Some("Rain"));
        assert_eq!(c.target().describe(), "R(Rain|Cloudy)");
    }

    #[test]
    fn test_validate_against_network() {
        let net = sprinkler_network();
        let ok = Constraint::local_marginal(
            "WetGrass",
            JointDistribution::uniform(vec![var("WetGrass"), var("Rain")]).unwrap(),
        )
        .unwrap();
        assert!(ok.validate(&net).is_ok());

        let not_parent = Constraint::local_marginal(
            "WetGrass",
            JointDistribution::uniform(vec![var("WetGrass"), var("Cloudy")]).unwrap(),
        )
        .unwrap();
        assert!(matches!(
            not_parent.validate(&net),
            Err(FitError::NotParents { .. })
        ));

        let unknown = Constraint::nonlocal_marginal(
            JointDistribution::uniform(vec![var("Fog"), var("Rain")]).unwrap(),
        )
        .unwrap();
        assert!(matches!(unknown.validate(&net), Err(FitError::Network(_))));

        let wrong_states = Constraint::nonlocal_marginal(
            JointDistribution::uniform(vec![
                RandomVariable::new("Rain", ["yes", "no"]).unwrap(),
                var("Cloudy"),
            ])
            .unwrap(),
        )
        .unwrap();
        assert!(matches!(wrong_states.validate(&net), Err(FitError::Core(_))));
    }
}
