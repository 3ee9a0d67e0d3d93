//! The two state shapes the kernel governs: the GMI grid state that the
//! step function actually evolves, and the ATS cognitive state that the
//! receipt verifier can recompute risk over without caring which shape
//! produced a receipt.

use serde::{Deserialize, Serialize};

use crate::canon::CanonValue;
use crate::numeric::Q;

/// A rectangular grid, stored row-major. Rows may differ in length only if
/// the caller built them that way; every grid operation in this crate
/// assumes a rectangular shape and faults via `KernelError::ShapeMismatch`
/// if it isn't.
pub type Grid<T> = Vec<Vec<T>>;

pub fn grid_dims<T>(grid: &Grid<T>) -> (usize, usize) {
    let rows = grid.len();
    let cols = grid.first().map(|r| r.len()).unwrap_or(0);
    (rows, cols)
}

pub fn is_rectangular<T>(grid: &Grid<T>) -> bool {
    let (_, cols) = grid_dims(grid);
    grid.iter().all(|row| row.len() == cols)
}

/// The GMI grid-world state: population density `rho`, field `theta`,
/// curvature `C`, a non-negative budget, and a step counter.
#[derive(Debug, Clone, PartialEq)]
pub struct GridState {
    pub rho: Grid<u64>,
    pub theta: Grid<i64>,
    pub curvature: Grid<u64>,
    pub budget: Q,
    pub t: u64,
}

impl GridState {
    pub fn dims(&self) -> (usize, usize) {
        grid_dims(&self.rho)
    }

    pub fn is_well_formed(&self) -> bool {
        let (rows, cols) = self.dims();
        is_rectangular(&self.rho)
            && is_rectangular(&self.theta)
            && is_rectangular(&self.curvature)
            && grid_dims(&self.theta) == (rows, cols)
            && grid_dims(&self.curvature) == (rows, cols)
    }

    /// Canonicalize into the object whose hash is the state hash.
    pub fn to_canonical(&self, params_version: &str) -> CanonValue {
        CanonValue::map(vec![
            ("rho".to_string(), CanonValue::from_grid_u64(&self.rho)),
            ("theta".to_string(), CanonValue::from_grid_i64(&self.theta)),
            ("C".to_string(), CanonValue::from_grid_u64(&self.curvature)),
            ("b".to_string(), CanonValue::from_q(&self.budget)),
            ("t".to_string(), CanonValue::Int(self.t as i128)),
            ("v".to_string(), CanonValue::Str(params_version.to_string())),
        ])
        .expect("fixed key set cannot collide")
    }
}

/// An action proposed against a [`GridState`]: per-cell deltas for `rho` and
/// `theta`, plus an optional symbolic glyph input the step function may
/// ignore (reserved for governance extensions outside this crate's scope).
#[derive(Debug, Clone, PartialEq)]
pub struct GridAction {
    pub drho: Grid<i64>,
    pub dtheta: Grid<i64>,
    pub u_glyph: Option<Grid<i64>>,
}

/// Belief sub-state: named belief vectors over `Q` magnitudes.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct BeliefState {
    pub beliefs: Vec<(String, Vec<Q>)>,
}

/// Memory sub-state: a flat bank of optionally-occupied cells.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct MemoryState {
    pub cells: Vec<Option<Q>>,
}

/// Plan sub-state: an ordered list of plan step identifiers.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct PlanState {
    pub steps: Vec<String>,
}

/// Policy sub-state: named policy mappings to a `Q` weight.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct PolicyState {
    pub mappings: Vec<(String, Q)>,
}

/// I/O sub-state: pending input and output buffers.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct IoState {
    pub input_buffer: Vec<Q>,
    pub output_buffer: Vec<Q>,
}

/// The ATS cognitive state: five independently-weighted sub-states whose
/// risk functional is a plain weighted sum (see [`crate::risk`]).
#[derive(Debug, Clone, PartialEq, Default)]
pub struct CognitiveState {
    pub belief: BeliefState,
    pub memory: MemoryState,
    pub plan: PlanState,
    pub policy: PolicyState,
    pub io: IoState,
}

impl CognitiveState {
    pub fn to_canonical(&self) -> CanonValue {
        let beliefs = self
            .belief
            .beliefs
            .iter()
            .map(|(k, v)| (k.clone(), CanonValue::Arr(v.iter().map(CanonValue::from_q).collect())))
            .collect::<Vec<_>>();
        let memory = self
            .memory
            .cells
            .iter()
            .map(|c| match c {
                Some(q) => CanonValue::from_q(q),
                None => CanonValue::Null,
            })
            .collect::<Vec<_>>();
        let plan = self.plan.steps.iter().cloned().map(CanonValue::Str).collect::<Vec<_>>();
        let policy = self
            .policy
            .mappings
            .iter()
            .map(|(k, v)| (k.clone(), CanonValue::from_q(v)))
            .collect::<Vec<_>>();
        let input_buffer = self.io.input_buffer.iter().map(CanonValue::from_q).collect::<Vec<_>>();
        let output_buffer = self.io.output_buffer.iter().map(CanonValue::from_q).collect::<Vec<_>>();

        CanonValue::map(vec![
            ("belief".to_string(), CanonValue::map(beliefs).expect("unique named beliefs")),
            ("memory".to_string(), CanonValue::Arr(memory)),
            ("plan".to_string(), CanonValue::Arr(plan)),
            ("policy".to_string(), CanonValue::map(policy).expect("unique named policies")),
            (
                "io".to_string(),
                CanonValue::map(vec![
                    ("input".to_string(), CanonValue::Arr(input_buffer)),
                    ("output".to_string(), CanonValue::Arr(output_buffer)),
                ])
                .expect("fixed key set cannot collide"),
            ),
        ])
        .expect("fixed key set cannot collide")
    }
}

/// A symbolic action proposed against a [`CognitiveState`]. The algebra is
/// intentionally small: a no-op observation tick, or a named custom action
/// whose effect is opaque to this crate (ATS only needs to verify receipts
/// a governed agent already produced, not reimplement agent cognition).
#[derive(Debug, Clone, PartialEq)]
pub enum SymbolicAction {
    Noop,
    Custom(String),
}

/// Either shape of action, dispatched on the state it targets.
#[derive(Debug, Clone, PartialEq)]
pub enum Action {
    Grid(GridAction),
    Symbolic(SymbolicAction),
}

/// Either shape of state, used wherever a component (the risk functional,
/// the receipt verifier) must stay agnostic to which kernel produced it.
#[derive(Debug, Clone, PartialEq)]
pub enum State {
    Grid(GridState),
    Cognitive(CognitiveState),
}

impl State {
    pub fn as_grid(&self) -> Option<&GridState> {
        match self {
            State::Grid(g) => Some(g),
            State::Cognitive(_) => None,
        }
    }

    pub fn as_cognitive(&self) -> Option<&CognitiveState> {
        match self {
            State::Cognitive(c) => Some(c),
            State::Grid(_) => None,
        }
    }
}

/// Witness recorded by the admissibility projector: which cells were
/// clamped, and in which direction, so a verifier can audit *why* a
/// projection happened rather than just *that* it happened.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct Witness {
    pub rho_active_low: Vec<(usize, usize)>,
    pub rho_active_high: Vec<(usize, usize)>,
    pub c_active_low: Vec<(usize, usize)>,
    pub b_clamped: bool,
}

impl Witness {
    pub fn is_empty(&self) -> bool {
        self.rho_active_low.is_empty()
            && self.rho_active_high.is_empty()
            && self.c_active_low.is_empty()
            && !self.b_clamped
    }

    pub fn to_canonical(&self) -> CanonValue {
        let coords = |v: &[(usize, usize)]| {
            CanonValue::Arr(
                v.iter()
                    .map(|(i, j)| CanonValue::Arr(vec![CanonValue::Int(*i as i128), CanonValue::Int(*j as i128)]))
                    .collect(),
            )
        };
        CanonValue::map(vec![
            ("rho_active_low".to_string(), coords(&self.rho_active_low)),
            ("rho_active_high".to_string(), coords(&self.rho_active_high)),
            ("c_active_low".to_string(), coords(&self.c_active_low)),
            ("b_clamped".to_string(), CanonValue::Bool(self.b_clamped)),
            ("tau_support_count".to_string(), CanonValue::Int(self.rho_active_high.len() as i128)),
        ])
        .expect("fixed key set cannot collide")
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn rectangular_grid_passes_shape_check() {
        let g = GridState {
            rho: vec![vec![0, 1], vec![2, 3]],
            theta: vec![vec![0, 0], vec![0, 0]],
            curvature: vec![vec![0, 0], vec![0, 0]],
            budget: Q::zero(crate::numeric::GMI_SCALE),
            t: 0,
        };
        assert!(g.is_well_formed());
    }

    #[test]
    fn ragged_grid_fails_shape_check() {
        let g = GridState {
            rho: vec![vec![0, 1], vec![2]],
            theta: vec![vec![0, 0], vec![0, 0]],
            curvature: vec![vec![0, 0], vec![0, 0]],
            budget: Q::zero(crate::numeric::GMI_SCALE),
            t: 0,
        };
        assert!(!g.is_well_formed());
    }

    #[test]
    fn witness_empty_when_nothing_clamped() {
        assert!(Witness::default().is_empty());
    }
}
