//! Named discrete random variables.

use std::collections::HashSet;
use std::fmt;

use serde::{Deserialize, Serialize};

use crate::error::CoreError;

/// A named discrete variable with an ordered list of unique state labels.
///
/// Two variables are the same iff their names and state orderings match.
///
/// # Example
///
/// ```rust
/// use ipfp_core::RandomVariable;
///
/// let rain = RandomVariable::binary("Rain").unwrap();
/// assert_eq!(rain.num_states(), 2);
/// assert_eq!(rain.state_index("False"), Some(1));
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(try_from = "RawVariable")]
pub struct RandomVariable {
    name: String,
    states: Vec<String>,
}

#[derive(Deserialize)]
struct RawVariable {
    name: String,
    states: Vec<String>,
}

impl TryFrom<RawVariable> for RandomVariable {
    type Error = CoreError;

    fn try_from(raw: RawVariable) -> Result<Self, Self::Error> {
        RandomVariable::new(raw.name, raw.states)
    }
}

impl RandomVariable {
    /// Create a variable.
    ///
    /// # Errors
    ///
    /// Returns an error if:
    /// - The name is empty
    /// - There are no states
    /// - A state label is empty or repeated
    pub fn new<S: Into<String>>(
        name: impl Into<String>,
        states: impl IntoIterator<Item = S>,
    ) -> Result<Self, CoreError> {
        let name = name.into();
        if name.is_empty() {
            return Err(CoreError::EmptyName);
        }
        let states: Vec<String> = states.into_iter().map(Into::into).collect();
        if states.is_empty() {
            return Err(CoreError::NoStates { name });
        }
        let mut seen = HashSet::new();
        for s in &states {
            if s.is_empty() {
                return Err(CoreError::EmptyState { name });
            }
            if !seen.insert(s.as_str()) {
                return Err(CoreError::DuplicateState {
                    state: s.clone(),
                    name,
                });
            }
        }
        Ok(Self { name, states })
    }

    /// A two-state variable with states `True`, `False`.
    pub fn binary(name: impl Into<String>) -> Result<Self, CoreError> {
        Self::new(name, ["True", "False"])
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn states(&self) -> &[String] {
        &self.states
    }

    pub fn num_states(&self) -> usize {
        self.states.len()
    }

    /// Position of a state label, if present.
    pub fn state_index(&self, state: &str) -> Option<usize> {
        self.states.iter().position(|s| s == state)
    }

    /// Like [`state_index`](Self::state_index) but failing on unknown labels.
    pub fn require_state(&self, state: &str) -> Result<usize, CoreError> {
        self.state_index(state).ok_or_else(|| CoreError::UnknownState {
            name: self.name.clone(),
            state: state.to_string(),
        })
    }
}

impl fmt::Display for RandomVariable {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}{{{}}}", self.name, self.states.join(", "))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_valid_variable() {
        let v = RandomVariable::new("Weather", ["Sunny", "Cloudy", "Rainy"]).unwrap();
        assert_eq!(v.name(), "Weather");
        assert_eq!(v.num_states(), 3);
        assert_eq!(v.state_index("Rainy"), Some(2));
        assert_eq!(v.state_index("Snow"), None);
        assert!(v.require_state("Snow").is_err());
        assert_eq!(format!("{}", v), "Weather{Sunny, Cloudy, Rainy}");
    }

    #[test]
    fn test_invalid_variables() {
        assert_eq!(
            RandomVariable::new("", ["a"]),
            Err(CoreError::EmptyName)
        );
        assert!(matches!(
            RandomVariable::new("X", Vec::<String>::new()),
            Err(CoreError::NoStates { .. })
        ));
        assert!(matches!(
            RandomVariable::new("X", ["a", ""]),
            Err(CoreError::EmptyState { .. })
        ));
        assert!(matches!(
            RandomVariable::new("X", ["a", "a"]),
            Err(CoreError::DuplicateState { .. })
        ));
    }

    #[test]
    fn test_identity_includes_state_order() {
        let a = RandomVariable::new("X", ["a", "b"]).unwrap();
        let b = RandomVariable::new("X", ["b", "a"]).unwrap();
        assert_ne!(a, b);
        assert_eq!(a, a.clone());
    }

    #[test]
    fn test_deserialize_validates() {
        let ok: RandomVariable =
            serde_json::from_str(r#"{"name":"A","states":["True","False"]}"#).unwrap();
        assert_eq!(ok, RandomVariable::binary("A").unwrap());
        let bad = serde_json::from_str::<RandomVariable>(r#"{"name":"A","states":[]}"#);
        assert!(bad.is_err());
    }
}
