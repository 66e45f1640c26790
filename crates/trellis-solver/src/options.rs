//! Solver configuration.

/// Options for a [`Solver`](crate::Solver).
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[cfg_attr(feature = "serde", serde(default))]
pub struct SolverOptions {
    /// Refresh variable values after every Add, Remove, SetStrength and
    /// Suggest instead of waiting for an explicit `update_vars`.
    pub auto_update: bool,
    /// Number of objects per page in the variable and constraint pools.
    pub pool_page_slots: usize,
}

impl Default for SolverOptions {
    fn default() -> Self {
        Self {
            auto_update: false,
            pool_page_slots: 64,
        }
    }
}

impl SolverOptions {
    pub fn with_auto_update(mut self, auto_update: bool) -> Self {
        self.auto_update = auto_update;
        self
    }

    pub fn with_pool_page_slots(mut self, slots: usize) -> Self {
        self.pool_page_slots = slots.max(1);
        self
    }
}
