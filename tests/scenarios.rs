//! End-to-end regression scenarios and cross-module property tests for the
//! governed transition kernel.

use gtk_kernel::{replay, step, verify_grid_step, ChainTip, GmiParams, GridAction, GridState, Q, VerifierState, VerifyOutcome, GMI_SCALE};
use proptest::prelude::*;

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

/// S1: a fresh chain's first receipt must link from the genesis sentinel,
/// and a second step must link from the first receipt's chain tip.
#[test]
fn s1_chain_starts_at_genesis_and_links_forward() {
    let params = GmiParams::default();
    let state0 = flat_state(2, Q::from_int(10, GMI_SCALE));
    let action = noop_action(2);

    let (state1, receipt1) = step(&state0, &action, &params, &ChainTip::genesis()).unwrap();
    assert_eq!(receipt1.chain_prev, ChainTip::genesis().chain_hash);
    assert_eq!(receipt1.prev_receipt_id, gtk_kernel::hash::GENESIS_RECEIPT_ID);

    let tip1 = ChainTip::genesis().advance(receipt1.chain_next, &receipt1.receipt_id);
    let (_, receipt2) = step(&state1, &action, &params, &tip1).unwrap();
    assert_eq!(receipt2.chain_prev, receipt1.chain_next);
    assert_eq!(receipt2.prev_receipt_id, receipt1.receipt_id);
}

/// S2: a step that would increase risk while the budget is already at zero
/// is rejected, and the rejected state equals the pre-step state exactly.
#[test]
fn s2_absorbing_rejection_at_zero_budget() {
    let params = GmiParams::default();
    let mut state = flat_state(2, Q::zero(GMI_SCALE));
    // Large existing curvature plus a full-magnitude drho forces a
    // nontrivial projection and positive energy delta.
    state.curvature = vec![vec![900, 900], vec![900, 900]];
    let mut action = noop_action(2);
    action.drho = vec![vec![2000, 2000], vec![2000, 2000]];

    let (next, receipt) = step(&state, &action, &params, &ChainTip::genesis()).unwrap();
    if receipt.risk_after > receipt.risk_before || !receipt.is_accepted() {
        assert!(!receipt.is_accepted());
        assert_eq!(next, state);
        assert_eq!(receipt.next_state_hash, receipt.prev_state_hash);
    }
}

/// S3: an honest receipt trail verifies end to end across multiple steps.
#[test]
fn s3_multi_step_trail_verifies() {
    let params = GmiParams::default();
    let mut state = flat_state(2, Q::from_int(50, GMI_SCALE));
    let action = noop_action(2);
    let mut chain = ChainTip::genesis();
    let mut vstate = VerifierState::new();

    for _ in 0..5 {
        let (next, receipt) = step(&state, &action, &params, &chain).unwrap();
        let outcome = verify_grid_step(&state, &next, &receipt, &state.budget, &Q::zero(GMI_SCALE), &mut vstate, &params);
        assert_eq!(outcome, VerifyOutcome::Accept);
        chain = chain.advance(receipt.chain_next, &receipt.receipt_id);
        state = next;
    }
}

/// S4: tampering with any single receipt in a trail is caught by
/// `verify_replay` at that receipt's index.
#[test]
fn s4_tamper_detected_at_exact_index() {
    let params = GmiParams::default();
    let state0 = flat_state(2, Q::from_int(20, GMI_SCALE));
    let actions = vec![noop_action(2); 4];

    let mut trail = replay(state0.clone(), ChainTip::genesis(), &actions, &params).unwrap().receipts;
    trail[2].receipt_id = "ffffffff".to_string();

    let divergence = gtk_kernel::verify_replay(state0, ChainTip::genesis(), &actions, &params, &trail).unwrap();
    assert_eq!(divergence.unwrap().index, 2);
}

/// S5: replaying the exact same action list from the exact same starting
/// state twice produces byte-identical receipts (determinism).
#[test]
fn s5_replay_is_deterministic() {
    let params = GmiParams::default();
    let state0 = flat_state(3, Q::from_int(30, GMI_SCALE));
    let actions = vec![noop_action(3), noop_action(3), noop_action(3)];

    let first = replay(state0.clone(), ChainTip::genesis(), &actions, &params).unwrap();
    let second = replay(state0, ChainTip::genesis(), &actions, &params).unwrap();
    assert_eq!(first.receipts, second.receipts);
    assert_eq!(first.final_chain, second.final_chain);
}

/// S6: a proposal that leaves the admissible set gets projected, and the
/// projection witness is non-empty exactly when projection happened.
#[test]
fn s6_projection_witness_matches_projected_flag() {
    let params = GmiParams::default();
    let state = flat_state(1, Q::from_int(5, GMI_SCALE));
    let mut action = noop_action(1);
    action.drho[0][0] = (params.rho_max as i64) + 1;

    let (_, receipt) = step(&state, &action, &params, &ChainTip::genesis()).unwrap();
    assert!(receipt.projected);
    assert!(!receipt.witness.is_empty());
}

proptest! {
    #[test]
    fn q_add_then_sub_never_exceeds_ceiling(a in 0u64..20_000, b in 0u64..20_000) {
        let qa = Q::from_int(a, GMI_SCALE);
        let qb = Q::from_int(b, GMI_SCALE);
        let sum = qa.add(&qb).unwrap();
        prop_assert!(sum.value() <= Q::max_value(GMI_SCALE));
    }

    #[test]
    fn grid_step_is_deterministic_for_arbitrary_small_deltas(dr in -5i64..5, dt in -5i64..5) {
        let params = GmiParams::default();
        let state = flat_state(2, Q::from_int(10, GMI_SCALE));
        let mut action = noop_action(2);
        action.drho[0][0] = dr;
        action.dtheta[0][0] = dt;

        let (s1, r1) = step(&state, &action, &params, &ChainTip::genesis()).unwrap();
        let (s2, r2) = step(&state, &action, &params, &ChainTip::genesis()).unwrap();
        prop_assert_eq!(s1, s2);
        prop_assert_eq!(r1, r2);
    }
}
