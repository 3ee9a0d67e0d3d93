//! The two error taxonomies: faults (programmer/environment errors, surfaced
//! as `Err`) and rejections (a proposed transition was refused under the
//! governing laws, surfaced as data inside an accepted-chain receipt).
//!
//! The split mirrors the rest of the crate's modular error style: each
//! module that can fault (`numeric`, `canon`, `admissible`, ...) gets its own
//! `thiserror` enum, and [`KernelError`] wraps them with `#[from]` at the
//! crate boundary rather than flattening everything into strings.

use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::canon::CanonError;
use crate::numeric::QError;

/// A fault: something the caller asked for that the kernel's algebra cannot
/// express. Distinct from a [`RejectCode`], which is a normal, chain-recorded
/// outcome of governing a transition.
#[derive(Debug, Error)]
pub enum KernelError {
    #[error("numeric fault: {0}")]
    Numeric(#[from] QError),

    #[error("canonicalization fault: {0}")]
    Canon(#[from] CanonError),

    #[error("action does not match the state shape it was applied to")]
    InvalidActionType,

    #[error("grid shape mismatch: {0}")]
    ShapeMismatch(String),

    #[error("state failed canonical serialization: {0}")]
    InvalidStateSerialization(String),
}

/// Rejection codes, matching the wire-contract names a verifier must be able
/// to recognize across implementations.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(into = "String", try_from = "String")]
pub enum RejectCode {
    InvalidActionType,
    InvalidStateSerialization,
    StateHashMismatch,
    InvalidReceiptHash,
    RiskMismatch,
    BudgetViolation,
    InsufficientBudget,
    NegativeBudget,
    InvalidChainLink,
    GenesisRequired,
    ChainTooShort,
    ViolationIncrease,
    AbsorbB0DvPos,
    UnknownError,
}

impl RejectCode {
    /// The wire-contract name, stable across implementations.
    pub fn as_str(&self) -> &'static str {
        match self {
            RejectCode::InvalidActionType => "INVALID_ACTION_TYPE",
            RejectCode::InvalidStateSerialization => "INVALID_STATE_SERIALIZATION",
            RejectCode::StateHashMismatch => "STATE_HASH_MISMATCH",
            RejectCode::InvalidReceiptHash => "INVALID_RECEIPT_HASH",
            RejectCode::RiskMismatch => "RISK_MISMATCH",
            RejectCode::BudgetViolation => "BUDGET_VIOLATION",
            RejectCode::InsufficientBudget => "INSUFFICIENT_BUDGET",
            RejectCode::NegativeBudget => "NEGATIVE_BUDGET",
            RejectCode::InvalidChainLink => "INVALID_CHAIN_LINK",
            RejectCode::GenesisRequired => "GENESIS_REQUIRED",
            RejectCode::ChainTooShort => "CHAIN_TOO_SHORT",
            RejectCode::ViolationIncrease => "VIOLATION_INCREASE",
            RejectCode::AbsorbB0DvPos => "ABSORB_B0_DV_POS",
            RejectCode::UnknownError => "UNKNOWN_ERROR",
        }
    }

    /// Parse a wire-contract name back into a code.
    pub fn from_str(s: &str) -> Option<RejectCode> {
        Some(match s {
            "INVALID_ACTION_TYPE" => RejectCode::InvalidActionType,
            "INVALID_STATE_SERIALIZATION" => RejectCode::InvalidStateSerialization,
            "STATE_HASH_MISMATCH" => RejectCode::StateHashMismatch,
            "INVALID_RECEIPT_HASH" => RejectCode::InvalidReceiptHash,
            "RISK_MISMATCH" => RejectCode::RiskMismatch,
            "BUDGET_VIOLATION" => RejectCode::BudgetViolation,
            "INSUFFICIENT_BUDGET" => RejectCode::InsufficientBudget,
            "NEGATIVE_BUDGET" => RejectCode::NegativeBudget,
            "INVALID_CHAIN_LINK" => RejectCode::InvalidChainLink,
            "GENESIS_REQUIRED" => RejectCode::GenesisRequired,
            "CHAIN_TOO_SHORT" => RejectCode::ChainTooShort,
            "VIOLATION_INCREASE" => RejectCode::ViolationIncrease,
            "ABSORB_B0_DV_POS" => RejectCode::AbsorbB0DvPos,
            _ => return None,
        })
    }
}

impl From<RejectCode> for String {
    fn from(code: RejectCode) -> Self {
        code.as_str().to_string()
    }
}

impl TryFrom<String> for RejectCode {
    type Error = String;

    fn try_from(s: String) -> Result<Self, Self::Error> {
        RejectCode::from_str(&s).ok_or_else(|| format!("unknown reject code: {s}"))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn reject_code_round_trips_through_wire_name() {
        for code in [
            RejectCode::InvalidActionType,
            RejectCode::StateHashMismatch,
            RejectCode::BudgetViolation,
            RejectCode::ViolationIncrease,
            RejectCode::AbsorbB0DvPos,
        ] {
            let name = code.as_str();
            assert_eq!(RejectCode::from_str(name), Some(code));
        }
    }

    #[test]
    fn unknown_wire_name_does_not_parse() {
        assert_eq!(RejectCode::from_str("NOT_A_CODE"), None);
    }
}
