//! The budget law: `ΔV <= 0` leaves the budget untouched; `ΔV > 0` requires
//! `B >= kappa * ΔV` and spends exactly that much, or the transition is
//! insufficient-budget and must be rejected.

use crate::error::RejectCode;
use crate::numeric::Q;

/// Outcome of evaluating the budget law for one proposed risk increase.
#[derive(Debug, Clone, PartialEq)]
pub enum BudgetOutcome {
    /// `ΔV <= 0`: budget is unchanged.
    Unchanged { budget: Q },
    /// `ΔV > 0` and `B >= kappa * ΔV`: budget spent down by `kappa * ΔV`.
    Spent { budget: Q, spent: Q },
    /// `ΔV > 0` and `B < kappa * ΔV`: the transition cannot be admitted.
    Insufficient { required: Q, available: Q },
}

/// Governs budget transitions under a fixed exchange rate `kappa`.
#[derive(Debug, Clone, PartialEq)]
pub struct BudgetManager {
    pub kappa: Q,
}

impl BudgetManager {
    pub fn new(kappa: Q) -> Self {
        Self { kappa }
    }

    /// Evaluate the budget law for a risk delta `dv` (which may be
    /// represented as `Q::zero` when `dv <= 0`, since `Q` cannot hold a
    /// negative value — callers pass `dv_positive_part` computed upstream).
    pub fn compute_transition(&self, budget: &Q, dv_is_increase: bool, dv_positive_part: &Q) -> Result<BudgetOutcome, RejectCode> {
        if !dv_is_increase {
            return Ok(BudgetOutcome::Unchanged { budget: *budget });
        }
        let required = self
            .kappa
            .mul(dv_positive_part)
            .map_err(|_| RejectCode::UnknownError)?;
        if *budget < required {
            return Ok(BudgetOutcome::Insufficient { required, available: *budget });
        }
        let remaining = budget.sub(&required).map_err(|_| RejectCode::UnknownError)?;
        Ok(BudgetOutcome::Spent { budget: remaining, spent: required })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::numeric::GMI_SCALE;

    #[test]
    fn non_increasing_risk_leaves_budget_untouched() {
        let mgr = BudgetManager::new(Q::one(GMI_SCALE));
        let budget = Q::from_int(5, GMI_SCALE);
        let outcome = mgr.compute_transition(&budget, false, &Q::zero(GMI_SCALE)).unwrap();
        assert_eq!(outcome, BudgetOutcome::Unchanged { budget });
    }

    #[test]
    fn sufficient_budget_spends_kappa_times_delta() {
        let mgr = BudgetManager::new(Q::from_int(2, GMI_SCALE));
        let budget = Q::from_int(10, GMI_SCALE);
        let dv = Q::from_int(3, GMI_SCALE);
        let outcome = mgr.compute_transition(&budget, true, &dv).unwrap();
        match outcome {
            BudgetOutcome::Spent { budget: remaining, spent } => {
                assert_eq!(spent, Q::from_int(6, GMI_SCALE));
                assert_eq!(remaining, Q::from_int(4, GMI_SCALE));
            }
            other => panic!("expected Spent, got {other:?}"),
        }
    }

    #[test]
    fn insufficient_budget_is_reported_not_faulted() {
        let mgr = BudgetManager::new(Q::from_int(5, GMI_SCALE));
        let budget = Q::from_int(1, GMI_SCALE);
        let dv = Q::from_int(1, GMI_SCALE);
        let outcome = mgr.compute_transition(&budget, true, &dv).unwrap();
        assert!(matches!(outcome, BudgetOutcome::Insufficient { .. }));
    }
}
