//! Crate root: public surface and core re-exports for the Governed
//! Transition Kernel.
//!
//! This module is the **single canonical entry-point** for downstream users
//! of the library. It re-exports the numeric, hashing, state, and kernel
//! modules a caller needs without reaching into submodule paths directly.
//!
//! ## Invariants
//!
//! - **Numeric domain.** Every scalar in the kernel is a non-negative
//!   fixed-point [`numeric::Q`] with an implicit decimal scale. There is no
//!   float anywhere in the public surface, and no conversion path from one
//!   into it — see [`numeric`].
//! - **Canonical form.** Anything that gets hashed is built into a
//!   [`canon::CanonValue`] first, whose byte encoding is sorted-key,
//!   minimal-separator, float-free — see [`canon`].
//! - **Hash-chained receipts.** Every governed transition produces a
//!   [`receipt::RichReceipt`] linked to the one before it through
//!   [`hash::chain_next`]; a genesis sentinel seeds the chain — see
//!   [`receipt::ChainTip`].
//! - **Determinism.** [`step::step`] and [`verify::verify_step`] are pure
//!   functions of their inputs: same state, action, and parameters always
//!   produce the same receipt, never a different one from run to run.

#![forbid(unsafe_code)]
#![deny(rust_2018_idioms)]

/// Deterministic fixed-point numeric domain `Q`.
pub mod numeric;
/// Canonical serialization (a JCS/RFC 8785 subset).
pub mod canon;
/// Domain-separated hashing and hash-chained receipts.
pub mod hash;
/// Kernel configuration (chained parameters, risk weights).
pub mod params;
/// Fault and rejection-code taxonomies.
pub mod error;
/// Grid and cognitive state shapes, actions, and projection witnesses.
pub mod state;
/// The Lyapunov / risk functional, in both its forms.
pub mod risk;
/// The admissibility set and its row-major projector.
pub mod admissible;
/// The budget law governing risk-increasing transitions.
pub mod budget;
/// Receipt types: the audit artifact every governed transition produces.
pub mod receipt;
/// The GMI grid-kernel step function.
pub mod step;
/// The ATS receipt verifier.
pub mod verify;
/// The replay engine.
pub mod replay;

pub use crate::error::{KernelError, RejectCode};
pub use crate::numeric::{Q, ATS_SCALE, GMI_SCALE};
pub use crate::params::{GmiParams, RiskWeights};
pub use crate::receipt::{ChainTip, MinimalReceipt, Receipt, RichReceipt};
pub use crate::state::{Action, CognitiveState, GridAction, GridState, State, SymbolicAction};
pub use crate::step::step;
pub use crate::verify::{verify_cognitive_step, verify_grid_step, verify_step, VerifierState, VerifyOutcome};
pub use crate::replay::{replay, verify_replay, ReplayError, ReplayReport};
