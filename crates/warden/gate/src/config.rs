//! Gate manager tunables.

use std::time::Duration;

/// Tunables for gate lifecycle timing and consensus.
///
/// Policy packs can override the timeout per gate; everything else is
/// deployment-wide.
#[derive(Clone, Debug)]
pub struct GateConfig {
    /// Gate lifetime when the policy does not override it.
    pub default_timeout: Duration,
    /// Fraction of the timeout window after which the gate is in its
    /// warning period.
    pub warning_fraction: f64,
    /// Passing signals required for key B consensus.
    pub signal_threshold: usize,
    /// How long a session binding stays valid after approval.
    pub session_validity: Duration,
}

impl Default for GateConfig {
    fn default() -> Self {
        Self {
            default_timeout: Duration::from_secs(300),
            warning_fraction: 0.8,
            signal_threshold: 2,
            session_validity: Duration::from_secs(900),
        }
    }
}
