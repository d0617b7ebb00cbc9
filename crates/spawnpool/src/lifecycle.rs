//! Per-instance lifecycle states.
//!
//! ```text
//! Uninitialized -> Inactive -> Active -> Inactive -> ... -> Destroyed
//! ```
//!
//! `Destroyed` is reachable from both `Inactive` and `Active` (a `clear`
//! destroys held instances too); nothing leaves it.

use std::fmt;

use serde::{Deserialize, Serialize};

/// Lifecycle state of a pooled instance.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum InstanceState {
    /// Constructed by the factory, not yet stored.
    Uninitialized,
    /// Parked in the inactive store, ready for reuse.
    Inactive,
    /// Handed out to a caller.
    Active,
    /// Destroyed by `clear`; terminal.
    Destroyed,
}

impl InstanceState {
    /// Whether moving from `self` to `next` is a valid lifecycle step.
    #[must_use]
    pub fn can_transition_to(self, next: Self) -> bool {
        matches!(
            (self, next),
            (Self::Uninitialized, Self::Inactive)
                | (Self::Inactive, Self::Active)
                | (Self::Active, Self::Inactive)
                | (Self::Inactive | Self::Active, Self::Destroyed)
        )
    }

    /// Whether the instance is currently held by a caller.
    #[must_use]
    pub fn is_active(self) -> bool {
        self == Self::Active
    }
}

impl fmt::Display for InstanceState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Self::Uninitialized => "uninitialized",
            Self::Inactive => "inactive",
            Self::Active => "active",
            Self::Destroyed => "destroyed",
        };
        f.write_str(name)
    }
}

#[cfg(test)]
mod tests {
    use rstest::rstest;

    use super::InstanceState::{self, *};

    #[rstest]
    #[case(Uninitialized, Inactive)]
    #[case(Inactive, Active)]
    #[case(Active, Inactive)]
    #[case(Inactive, Destroyed)]
    #[case(Active, Destroyed)]
    fn valid_transitions(#[case] from: InstanceState, #[case] to: InstanceState) {
        assert!(from.can_transition_to(to));
    }

    #[rstest]
    #[case(Uninitialized, Active)]
    #[case(Active, Active)]
    #[case(Inactive, Inactive)]
    #[case(Destroyed, Inactive)]
    #[case(Destroyed, Active)]
    #[case(Uninitialized, Destroyed)]
    fn invalid_transitions(#[case] from: InstanceState, #[case] to: InstanceState) {
        assert!(!from.can_transition_to(to));
    }

    #[test]
    fn display_is_lowercase() {
        assert_eq!(Active.to_string(), "active");
        assert!(Active.is_active());
        assert!(!Inactive.is_active());
    }
}
