//! The GMI step function: the one operation that actually evolves a
//! [`GridState`] forward, enforcing the Lyapunov law (`dV > 0` is rejected,
//! with an absorbing override once the budget has hit zero) and producing a
//! hash-chained receipt either way.
//!
//! Stages, matching the reference pipeline: snapshot -> propose -> project
//! -> curvature update via discrete Laplacian -> fixed budget spend ->
//! Lyapunov check -> receipt emission. A rejection reverts to the
//! pre-step state (including budget) but the chain still advances: the
//! rejection itself is part of the audited history.

use crate::admissible::{in_k, project_k};
use crate::error::{KernelError, RejectCode};
use crate::hash::{self, DIGEST_LEN};
use crate::numeric::{Q, GMI_SCALE};
use crate::params::GmiParams;
use crate::receipt::{ChainTip, RichReceipt};
use crate::risk::{laplacian_grid, v_grid};
use crate::state::{grid_dims, GridAction, GridState, Witness};

fn hash_state(state: &GridState, params: &GmiParams) -> [u8; DIGEST_LEN] {
    let canonical = state.to_canonical(&params.version);
    hash::tagged(&params.hash_tag_state, &canonical.to_canonical_bytes())
}

fn propose(state: &GridState, action: &GridAction, params: &GmiParams) -> Result<GridState, KernelError> {
    let (rows, cols) = state.dims();
    if grid_dims(&action.drho) != (rows, cols) || grid_dims(&action.dtheta) != (rows, cols) {
        return Err(KernelError::ShapeMismatch("action deltas must match state grid dimensions".to_string()));
    }

    let mut theta = vec![vec![0i64; cols]; rows];
    let mut rho = vec![vec![0u64; cols]; rows];
    for i in 0..rows {
        for j in 0..cols {
            let coupled = state.theta[i][j] + action.dtheta[i][j] - (params.lambda_c as i64) * (state.curvature[i][j] as i64);
            theta[i][j] = coupled;

            let delta = action.drho[i][j];
            let base = state.rho[i][j] as i64;
            rho[i][j] = (base + delta).max(0) as u64;
        }
    }

    Ok(GridState {
        rho,
        theta,
        curvature: state.curvature.clone(),
        budget: state.budget,
        t: state.t + 1,
    })
}

fn curvature_update(state: &GridState, witness: &Witness, params: &GmiParams) -> Vec<Vec<u64>> {
    let (rows, cols) = state.dims();
    let laplacian = laplacian_grid(&state.curvature);
    let mut tau = vec![vec![false; cols]; rows];
    for &(i, j) in &witness.rho_active_high {
        tau[i][j] = true;
    }

    let mut out = vec![vec![0u64; cols]; rows];
    for i in 0..rows {
        for j in 0..cols {
            let c = state.curvature[i][j] as i64;
            let forcing = if tau[i][j] { params.alpha_tau as i64 } else { 0 };
            let decay = (params.beta_c as i64) * c;
            let diffusion = (params.d_c as i64) * laplacian[i][j];
            let next = c + forcing - decay + diffusion;
            out[i][j] = next.max(0) as u64;
        }
    }
    out
}

/// Evolve `state` by `action` under `params`, producing the receipt that
/// gets appended after `chain_prev`.
pub fn step(
    state: &GridState,
    action: &GridAction,
    params: &GmiParams,
    chain_prev: &ChainTip,
) -> Result<(GridState, RichReceipt), KernelError> {
    let v_prev = v_grid(state, params);
    let budget_prev = state.budget;
    let prev_hash = hash_state(state, params);

    let proposed = propose(state, action, params)?;

    let (projected_state, witness, was_projected) = if in_k(&proposed, params.rho_max) {
        (proposed, Witness::default(), false)
    } else {
        let (p, w) = project_k(&proposed, params.rho_max);
        (p, w, true)
    };

    let curvature = curvature_update(&projected_state, &witness, params);
    let after_curvature = GridState { curvature, ..projected_state };

    let budget_spent = params.budget_spend_per_step;
    let budget_after_spend = budget_prev.sub(&budget_spent).unwrap_or_else(|_| Q::zero(GMI_SCALE));
    let candidate = GridState { budget: budget_after_spend, ..after_curvature };

    let v_next = v_grid(&candidate, params);
    let dv_is_increase = v_next > v_prev;
    let dv_positive_part = v_next.positive_delta(&v_prev).unwrap_or_else(|_| Q::zero(GMI_SCALE));

    let mut reject_code = None;
    if dv_is_increase {
        reject_code = Some(RejectCode::ViolationIncrease);
    }
    if params.absorb_on_b0 && budget_prev.is_zero() && dv_is_increase {
        reject_code = Some(RejectCode::AbsorbB0DvPos);
    }

    let (final_state, risk_after, budget_after, spent, next_hash, dv_positive_part) = match reject_code {
        Some(_) => (
            state.clone(),
            v_prev,
            budget_prev,
            Q::zero(GMI_SCALE),
            prev_hash,
            Q::zero(GMI_SCALE),
        ),
        None => (candidate.clone(), v_next, budget_after_spend, budget_spent, hash_state(&candidate, params), dv_positive_part),
    };

    let prev_receipt_id = chain_prev.last_receipt_id.clone();
    let mut receipt = RichReceipt {
        params_version: params.version.clone(),
        prev_state_hash: prev_hash,
        next_state_hash: next_hash,
        risk_before: v_prev,
        risk_after,
        risk_delta_positive: dv_positive_part,
        budget_before: budget_prev,
        budget_after,
        budget_spent: spent,
        kappa: Q::zero(GMI_SCALE),
        projected: was_projected,
        witness,
        reject_code,
        prev_receipt_id,
        receipt_id: String::new(),
        chain_prev: chain_prev.chain_hash,
        chain_next: [0u8; DIGEST_LEN],
    };

    let canonical_bytes = receipt.to_canonical().to_canonical_bytes();
    let chain_next_hash = hash::chain_next(&params.hash_tag_chain, &chain_prev.chain_hash, &canonical_bytes);
    receipt.chain_next = chain_next_hash;
    let self_hash = hash::tagged(&params.hash_tag_receipt, &canonical_bytes);
    receipt.receipt_id = hash::receipt_id(&self_hash, params.receipt_id_len);

    Ok((final_state, receipt))
}
