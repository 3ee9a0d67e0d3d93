//! The replay engine: re-drive [`crate::step::step`] over a recorded action
//! list and assert the resulting receipts are byte-identical to what was
//! recorded, reporting the first point of divergence rather than just
//! "replay failed".

use crate::params::GmiParams;
use crate::receipt::{ChainTip, RichReceipt};
use crate::state::{GridAction, GridState};
use crate::step::step;

/// Faults raised by the replay engine itself (as opposed to a kernel-level
/// fault propagated from [`crate::step::step`]).
#[derive(Debug, thiserror::Error)]
pub enum ReplayError {
    #[error("step {index} faulted: {source}")]
    Step { index: usize, #[source] source: crate::error::KernelError },
}

/// What the replay produced: the final state, final chain tip, and the full
/// receipt trail.
#[derive(Debug, Clone, PartialEq)]
pub struct ReplayReport {
    pub final_state: GridState,
    pub final_chain: ChainTip,
    pub receipts: Vec<RichReceipt>,
}

/// Re-drive `actions` from `state0`/`chain0`, producing a full receipt
/// trail.
pub fn replay(state0: GridState, chain0: ChainTip, actions: &[GridAction], params: &GmiParams) -> Result<ReplayReport, ReplayError> {
    let mut state = state0;
    let mut chain = chain0;
    let mut receipts = Vec::with_capacity(actions.len());

    for (index, action) in actions.iter().enumerate() {
        let (next_state, receipt) = step(&state, action, params, &chain).map_err(|source| ReplayError::Step { index, source })?;
        chain = chain.advance(receipt.chain_next, &receipt.receipt_id);
        state = next_state;
        receipts.push(receipt);
    }

    Ok(ReplayReport { final_state: state, final_chain: chain, receipts })
}

/// Where two replays first disagree.
#[derive(Debug, Clone, PartialEq)]
pub struct Divergence {
    pub index: usize,
    pub reason: String,
}

/// Re-run `replay` and confirm it reproduces `expected_receipts` exactly,
/// returning the first index where it doesn't.
pub fn verify_replay(
    state0: GridState,
    chain0: ChainTip,
    actions: &[GridAction],
    params: &GmiParams,
    expected_receipts: &[RichReceipt],
) -> Result<Option<Divergence>, ReplayError> {
    let report = replay(state0, chain0, actions, params)?;

    if report.receipts.len() != expected_receipts.len() {
        return Ok(Some(Divergence {
            index: report.receipts.len().min(expected_receipts.len()),
            reason: "receipt count differs from expected trail".to_string(),
        }));
    }

    for (index, (actual, expected)) in report.receipts.iter().zip(expected_receipts.iter()).enumerate() {
        if actual != expected {
            return Ok(Some(Divergence { index, reason: "receipt mismatch".to_string() }));
        }
    }

    Ok(None)
}

/// The chain tip implied by a receipt trail, or the genesis tip if empty.
pub fn chain_tip_of(receipts: &[RichReceipt]) -> ChainTip {
    match receipts.last() {
        Some(r) => ChainTip { chain_hash: r.chain_next, last_receipt_id: r.receipt_id.clone() },
        None => ChainTip::genesis(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::numeric::{Q, GMI_SCALE};

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
    fn replay_reproduces_identical_receipts_when_re_run() {
        let params = GmiParams::default();
        let state0 = flat_state(2, Q::from_int(10, GMI_SCALE));
        let actions = vec![noop_action(2), noop_action(2), noop_action(2)];

        let first = replay(state0.clone(), ChainTip::genesis(), &actions, &params).unwrap();
        let divergence = verify_replay(state0, ChainTip::genesis(), &actions, &params, &first.receipts).unwrap();
        assert_eq!(divergence, None);
    }

    #[test]
    fn tampering_with_one_receipt_is_caught_at_its_index() {
        let params = GmiParams::default();
        let state0 = flat_state(2, Q::from_int(10, GMI_SCALE));
        let actions = vec![noop_action(2), noop_action(2), noop_action(2)];

        let mut trail = replay(state0.clone(), ChainTip::genesis(), &actions, &params).unwrap().receipts;
        trail[1].budget_spent = Q::from_int(999, GMI_SCALE);

        let divergence = verify_replay(state0, ChainTip::genesis(), &actions, &params, &trail).unwrap();
        assert_eq!(divergence, Some(Divergence { index: 1, reason: "receipt mismatch".to_string() }));
    }

    #[test]
    fn empty_trail_has_genesis_chain_tip() {
        let tip = chain_tip_of(&[]);
        assert_eq!(tip, ChainTip::genesis());
    }
}
