use serde::{Deserialize, Serialize};

/// Tunables for a [`Forest`](crate::Forest).
#[derive(Copy, Clone, Debug, Default, Deserialize, Eq, PartialEq, Serialize)]
#[non_exhaustive]
pub struct ForestConfig {
    /// Apply every structural operation to a staged copy of the tree and run
    /// the invariant checker on it before swapping it in. A failed check
    /// leaves the live tree untouched and surfaces as `Corrupt`.
    #[serde(default)]
    pub verify_mutations: bool,
}

impl ForestConfig {
    #[must_use]
    pub const fn new(verify_mutations: bool) -> Self {
        Self { verify_mutations }
    }
}
