//! Kernel configuration: the chained parameter set carried alongside every
//! state transition, plus the risk weighting used by the cognitive-state
//! (ATS) risk functional.
//!
//! Parameters are chained, not out-of-band config: they travel with the
//! receipt (`params_version`) rather than living in a side file a verifier
//! could disagree about. The literal defaults below are pinned to the
//! governing reference implementation this crate's behavior was specified
//! against, and changing any of them changes `params_version`.

use crate::numeric::{Q, GMI_SCALE};

/// Parameters for the GMI grid kernel's step function.
#[derive(Debug, Clone, PartialEq)]
pub struct GmiParams {
    /// Version string carried into every receipt and state hash.
    pub version: String,
    /// Upper bound for each `rho` grid cell.
    pub rho_max: u64,
    /// Curvature forcing gain applied at active-high tau sites.
    pub alpha_tau: u64,
    /// Curvature decay coefficient.
    pub beta_c: u64,
    /// Curvature diffusion coefficient (discrete Laplacian gain).
    pub d_c: u64,
    /// Coupling from active-high projection back into `theta`.
    pub lambda_c: u64,
    /// Lyapunov weight on the `theta` gradient-energy term.
    pub w_grad_theta: Q,
    /// Lyapunov weight on the `C` (curvature) L2-energy term.
    pub w_c: Q,
    /// Lyapunov weight on the budget barrier term.
    pub w_budget_barrier: Q,
    /// Whether `dV > 0` is force-rejected once the budget has hit zero.
    pub absorb_on_b0: bool,
    /// Domain-separation tag for state hashing.
    pub hash_tag_state: String,
    /// Domain-separation tag for chain-link hashing.
    pub hash_tag_chain: String,
    /// Domain-separation tag for receipt self-hashing.
    pub hash_tag_receipt: String,
    /// Fixed per-step budget spend, charged regardless of acceptance.
    pub budget_spend_per_step: Q,
    /// Receipt id truncation length in bytes (spec default: 8).
    pub receipt_id_len: usize,
}

impl Default for GmiParams {
    fn default() -> Self {
        let scale = GMI_SCALE;
        Self {
            version: "1.5.0".to_string(),
            rho_max: 1000,
            alpha_tau: 10,
            beta_c: 1,
            d_c: 1,
            lambda_c: 5,
            w_grad_theta: Q::from_int(1, scale),
            w_c: Q::from_int(1, scale),
            w_budget_barrier: Q::from_int(1, scale),
            absorb_on_b0: true,
            hash_tag_state: "GMI_STATE_V1_5".to_string(),
            hash_tag_chain: "GMI_CHAIN_V1_5".to_string(),
            hash_tag_receipt: "GMI_RECEIPT_V1_5".to_string(),
            budget_spend_per_step: Q::from_int(1, scale),
            receipt_id_len: 8,
        }
    }
}

impl GmiParams {
    /// Validate the invariants the original parameter set enforces at
    /// construction time.
    pub fn validate(&self) -> Result<(), String> {
        if self.rho_max == 0 {
            return Err("rho_max must be positive".to_string());
        }
        Ok(())
    }
}

/// Weights for the cognitive-state (ATS) risk functional. Each sub-risk
/// contributes `weight * sub_risk`; the reference defaults split the budget
/// evenly across five sub-states.
#[derive(Debug, Clone, PartialEq)]
pub struct RiskWeights {
    pub belief: Q,
    pub memory: Q,
    pub plan: Q,
    pub policy: Q,
    pub io: Q,
}

impl Default for RiskWeights {
    fn default() -> Self {
        let w = Q::from_decimal_str("0.2", crate::numeric::ATS_SCALE).unwrap();
        Self {
            belief: w,
            memory: w,
            plan: w,
            policy: w,
            io: w,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn gmi_defaults_validate() {
        assert!(GmiParams::default().validate().is_ok());
    }

    #[test]
    fn risk_weights_default_to_one_fifth_each() {
        let w = RiskWeights::default();
        assert_eq!(w.belief, w.memory);
        assert_eq!(w.plan, w.policy);
        assert_eq!(w.policy, w.io);
    }
}
