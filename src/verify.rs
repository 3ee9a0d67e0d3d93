//! The receipt verifier: six ordered, fail-fast checks that let a
//! third party confirm a governed transition without trusting whoever
//! produced it.
//!
//! Order matters and is part of the contract: a receipt that fails both the
//! state-hash check and the chain-link check is reported as a state-hash
//! failure, because that check runs first. Shape-agnostic by design — it
//! recomputes risk through [`crate::risk`] rather than trusting the
//! receipt's own `risk_before`/`risk_after` fields, so it works the same way
//! whether the receipt came from the grid kernel or a cognitive-state one.

use crate::budget::{BudgetManager, BudgetOutcome};
use crate::error::RejectCode;
use crate::numeric::Q;
use crate::params::{GmiParams, RiskWeights};
use crate::receipt::{ChainTip, RichReceipt};
use crate::risk::{v_cognitive, v_grid};
use crate::state::{CognitiveState, GridState, State};

/// Per-chain verifier state: the last receipt id seen, used to check chain
/// linkage as receipts stream in.
#[derive(Debug, Clone)]
pub struct VerifierState {
    pub chain_tip: ChainTip,
    pub genesis_seen: bool,
}

impl VerifierState {
    pub fn new() -> Self {
        Self { chain_tip: ChainTip::genesis(), genesis_seen: false }
    }
}

impl Default for VerifierState {
    fn default() -> Self {
        Self::new()
    }
}

/// Result of verifying one receipt.
#[derive(Debug, Clone, PartialEq)]
pub enum VerifyOutcome {
    Accept,
    Reject { code: RejectCode, detail: String },
}

fn risk_of(state: &State, gmi_params: &GmiParams, risk_weights: &RiskWeights) -> Q {
    match state {
        State::Grid(g) => v_grid(g, gmi_params),
        State::Cognitive(c) => v_cognitive(c, risk_weights),
    }
}

fn state_hash(state: &State, gmi_params: &GmiParams) -> Option<[u8; 32]> {
    match state {
        State::Grid(g) => Some(crate::hash::tagged(&gmi_params.hash_tag_state, &g.to_canonical(&gmi_params.version).to_canonical_bytes())),
        State::Cognitive(c) => Some(crate::hash::tagged(&gmi_params.hash_tag_state, &c.to_canonical().to_canonical_bytes())),
    }
}

/// Verify one step's receipt against the states it claims to bridge. Checks
/// run in this fixed order, stopping at the first failure:
///
/// 1. state-hash-before matches `receipt.prev_state_hash`
/// 2. state-hash-after matches `receipt.next_state_hash`
/// 3. recomputed risk matches `receipt.risk_before` / `receipt.risk_after`
/// 4. the budget law holds between `budget_before` and `receipt.budget_after`
/// 5. the receipt's own self-hash is consistent with its content
/// 6. the chain link (`chain_prev` and monotonic receipt id) is consistent
pub fn verify_step(
    state_before: &State,
    state_after: &State,
    receipt: &RichReceipt,
    budget_before: &Q,
    kappa: &Q,
    vstate: &mut VerifierState,
    gmi_params: &GmiParams,
) -> VerifyOutcome {
    let Some(hash_before) = state_hash(state_before, gmi_params) else {
        return VerifyOutcome::Reject { code: RejectCode::InvalidStateSerialization, detail: "before-state".to_string() };
    };
    if hash_before != receipt.prev_state_hash {
        return VerifyOutcome::Reject { code: RejectCode::StateHashMismatch, detail: "prev_state_hash".to_string() };
    }

    let Some(hash_after) = state_hash(state_after, gmi_params) else {
        return VerifyOutcome::Reject { code: RejectCode::InvalidStateSerialization, detail: "after-state".to_string() };
    };
    if hash_after != receipt.next_state_hash {
        return VerifyOutcome::Reject { code: RejectCode::StateHashMismatch, detail: "next_state_hash".to_string() };
    }

    let risk_weights = RiskWeights::default();
    let recomputed_before = risk_of(state_before, gmi_params, &risk_weights);
    let recomputed_after = risk_of(state_after, gmi_params, &risk_weights);
    if recomputed_before != receipt.risk_before || recomputed_after != receipt.risk_after {
        return VerifyOutcome::Reject { code: RejectCode::RiskMismatch, detail: "recomputed risk diverges".to_string() };
    }

    let dv_is_increase = receipt.risk_after > receipt.risk_before;
    let dv_positive_part = receipt.risk_after.positive_delta(&receipt.risk_before).unwrap_or_else(|_| Q::zero(receipt.risk_before.scale()));

    // Which budget law applies depends on which kernel produced the
    // receipt: the grid kernel spends a fixed amount per accepted step
    // (unconditional on the sign of dV, reverted entirely on rejection),
    // while a cognitive-state step follows the general kappa*dV law.
    match state_before {
        State::Grid(_) => {
            let expected = if receipt.reject_code.is_some() {
                *budget_before
            } else {
                budget_before.sub(&gmi_params.budget_spend_per_step).unwrap_or_else(|_| Q::zero(budget_before.scale()))
            };
            if expected != receipt.budget_after {
                return VerifyOutcome::Reject { code: RejectCode::BudgetViolation, detail: "grid fixed-spend budget mismatch".to_string() };
            }
        }
        State::Cognitive(_) => {
            let manager = BudgetManager::new(*kappa);
            match manager.compute_transition(budget_before, dv_is_increase, &dv_positive_part) {
                Ok(BudgetOutcome::Unchanged { budget }) => {
                    if budget != receipt.budget_after && receipt.reject_code.is_none() {
                        return VerifyOutcome::Reject { code: RejectCode::BudgetViolation, detail: "unchanged budget mismatch".to_string() };
                    }
                }
                Ok(BudgetOutcome::Spent { budget, .. }) => {
                    if budget != receipt.budget_after && receipt.reject_code.is_none() {
                        return VerifyOutcome::Reject { code: RejectCode::BudgetViolation, detail: "spent budget mismatch".to_string() };
                    }
                }
                Ok(BudgetOutcome::Insufficient { .. }) => {
                    if receipt.reject_code != Some(RejectCode::InsufficientBudget) && receipt.reject_code.is_none() {
                        return VerifyOutcome::Reject { code: RejectCode::InsufficientBudget, detail: "budget law requires rejection".to_string() };
                    }
                }
                Err(code) => return VerifyOutcome::Reject { code, detail: "budget law fault".to_string() },
            }
        }
    }
    if budget_before.value() == 0 && receipt.budget_after.value() > 0 {
        return VerifyOutcome::Reject { code: RejectCode::NegativeBudget, detail: "budget increased from zero".to_string() };
    }

    let canonical_bytes = receipt.to_canonical().to_canonical_bytes();

    // Receipt self-hash: recompute receipt_id the same way the kernel did
    // and compare, so a receipt carrying a forged id (with everything else
    // left alone) is caught even though `to_canonical` excludes the id
    // itself (it's derived from this object, not part of it).
    let self_hash = crate::hash::tagged(&gmi_params.hash_tag_receipt, &canonical_bytes);
    let expected_receipt_id = crate::hash::receipt_id(&self_hash, gmi_params.receipt_id_len);
    if expected_receipt_id != receipt.receipt_id {
        return VerifyOutcome::Reject { code: RejectCode::InvalidReceiptHash, detail: "receipt_id does not match recomputed self-hash".to_string() };
    }

    let expected_chain_next = crate::hash::chain_next(&gmi_params.hash_tag_chain, &receipt.chain_prev, &canonical_bytes);
    if expected_chain_next != receipt.chain_next {
        return VerifyOutcome::Reject { code: RejectCode::InvalidChainLink, detail: "chain_next does not match recomputed chain hash".to_string() };
    }

    if !vstate.genesis_seen {
        if receipt.prev_receipt_id != crate::hash::GENESIS_RECEIPT_ID {
            return VerifyOutcome::Reject { code: RejectCode::GenesisRequired, detail: "first receipt must chain from genesis".to_string() };
        }
        if receipt.chain_prev != crate::hash::GENESIS_CHAIN_TIP {
            return VerifyOutcome::Reject { code: RejectCode::GenesisRequired, detail: "first receipt must start at the genesis tip".to_string() };
        }
    } else if receipt.chain_prev != vstate.chain_tip.chain_hash || receipt.prev_receipt_id != vstate.chain_tip.last_receipt_id {
        return VerifyOutcome::Reject { code: RejectCode::InvalidChainLink, detail: "chain_prev does not match verifier's running tip".to_string() };
    }

    vstate.genesis_seen = true;
    vstate.chain_tip = vstate.chain_tip.advance(receipt.chain_next, &receipt.receipt_id);

    VerifyOutcome::Accept
}

/// Convenience wrapper for the common case of verifying a grid-kernel step.
pub fn verify_grid_step(
    state_before: &GridState,
    state_after: &GridState,
    receipt: &RichReceipt,
    budget_before: &Q,
    kappa: &Q,
    vstate: &mut VerifierState,
    gmi_params: &GmiParams,
) -> VerifyOutcome {
    verify_step(
        &State::Grid(state_before.clone()),
        &State::Grid(state_after.clone()),
        receipt,
        budget_before,
        kappa,
        vstate,
        gmi_params,
    )
}

/// Convenience wrapper for verifying a cognitive-state (ATS) step.
pub fn verify_cognitive_step(
    state_before: &CognitiveState,
    state_after: &CognitiveState,
    receipt: &RichReceipt,
    budget_before: &Q,
    kappa: &Q,
    vstate: &mut VerifierState,
    gmi_params: &GmiParams,
) -> VerifyOutcome {
    verify_step(
        &State::Cognitive(state_before.clone()),
        &State::Cognitive(state_after.clone()),
        receipt,
        budget_before,
        kappa,
        vstate,
        gmi_params,
    )
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::numeric::GMI_SCALE;
    use crate::state::GridAction;
    use crate::step::step;

    fn flat_state(n: usize, budget: Q) -> GridState {
        GridState {
            rho: vec![vec![0u64; n]; n],
            theta: vec![vec![0i64; n]; n],
            curvature: vec![vec![0u64; n]; n],
            budget,
            t: 0,
        }
    }

    fn noop_action(n: usize) -> GridAction {
        GridAction { drho: vec![vec![0i64; n]; n], dtheta: vec![vec![0i64; n]; n], u_glyph: None }
    }

    #[test]
    fn genuine_step_receipt_verifies_as_accept() {
        let params = GmiParams::default();
        let before = flat_state(2, Q::from_int(5, GMI_SCALE));
        let action = noop_action(2);
        let (after, receipt) = step(&before, &action, &params, &ChainTip::genesis()).unwrap();

        let mut vstate = VerifierState::new();
        let outcome = verify_grid_step(&before, &after, &receipt, &before.budget, &Q::zero(GMI_SCALE), &mut vstate, &params);
        assert_eq!(outcome, VerifyOutcome::Accept);
    }

    #[test]
    fn tampered_next_state_hash_is_rejected() {
        let params = GmiParams::default();
        let before = flat_state(2, Q::from_int(5, GMI_SCALE));
        let action = noop_action(2);
        let (mut after, receipt) = step(&before, &action, &params, &ChainTip::genesis()).unwrap();
        after.t += 1000; // tamper

        let mut vstate = VerifierState::new();
        let outcome = verify_grid_step(&before, &after, &receipt, &before.budget, &Q::zero(GMI_SCALE), &mut vstate, &params);
        assert!(matches!(outcome, VerifyOutcome::Reject { code: RejectCode::StateHashMismatch, .. }));
    }

    #[test]
    fn tampered_receipt_id_is_rejected_even_with_chain_next_untouched() {
        let params = GmiParams::default();
        let before = flat_state(2, Q::from_int(5, GMI_SCALE));
        let action = noop_action(2);
        let (after, mut receipt) = step(&before, &action, &params, &ChainTip::genesis()).unwrap();
        receipt.receipt_id = "ffffffff".to_string();

        let mut vstate = VerifierState::new();
        let outcome = verify_grid_step(&before, &after, &receipt, &before.budget, &Q::zero(GMI_SCALE), &mut vstate, &params);
        assert!(matches!(outcome, VerifyOutcome::Reject { code: RejectCode::InvalidReceiptHash, .. }));
    }

    #[test]
    fn non_genesis_start_is_rejected() {
        let params = GmiParams::default();
        let before = flat_state(1, Q::from_int(1, GMI_SCALE));
        let action = noop_action(1);
        let mut fake_tip = ChainTip::genesis();
        fake_tip.chain_hash[0] = 1;
        let (after, receipt) = step(&before, &action, &params, &fake_tip).unwrap();

        let mut vstate = VerifierState::new();
        let outcome = verify_grid_step(&before, &after, &receipt, &before.budget, &Q::zero(GMI_SCALE), &mut vstate, &params);
        assert!(matches!(outcome, VerifyOutcome::Reject { code: RejectCode::GenesisRequired, .. }));
    }
}
