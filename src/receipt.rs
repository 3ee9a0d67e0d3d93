//! Receipts: the audit artifact every governed transition produces,
//! hash-chained to the one before it.
//!
//! There is one receipt shape, [`RichReceipt`], carrying every field a
//! verifier needs to recompute the laws independently. [`MinimalReceipt`] is
//! a pure projection of it (state hashes, chain link, ids only) for callers
//! that only need tamper-evidence, not a full audit trail — the two are
//! never separate code paths, just two views of the same content.

use serde::{Deserialize, Serialize};

use crate::canon::CanonValue;
use crate::error::RejectCode;
use crate::numeric::Q;
use crate::state::Witness;

/// `serde(with = "hex_digest")`: a `[u8; 32]` as a hex string on the wire.
mod hex_digest {
    use serde::{Deserialize, Deserializer, Serializer};

    pub fn serialize<S: Serializer>(digest: &[u8; 32], serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(&hex::encode(digest))
    }

    pub fn deserialize<'de, D: Deserializer<'de>>(deserializer: D) -> Result<[u8; 32], D::Error> {
        let s = String::deserialize(deserializer)?;
        let bytes = hex::decode(&s).map_err(serde::de::Error::custom)?;
        bytes.try_into().map_err(|_| serde::de::Error::custom("expected 32-byte hex digest"))
    }
}

/// The full audit content of one governed transition.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RichReceipt {
    pub params_version: String,
    #[serde(with = "hex_digest")]
    pub prev_state_hash: [u8; 32],
    #[serde(with = "hex_digest")]
    pub next_state_hash: [u8; 32],
    pub risk_before: Q,
    pub risk_after: Q,
    pub risk_delta_positive: Q,
    pub budget_before: Q,
    pub budget_after: Q,
    pub budget_spent: Q,
    pub kappa: Q,
    pub projected: bool,
    pub witness: Witness,
    pub reject_code: Option<RejectCode>,
    pub prev_receipt_id: String,
    pub receipt_id: String,
    #[serde(with = "hex_digest")]
    pub chain_prev: [u8; 32],
    #[serde(with = "hex_digest")]
    pub chain_next: [u8; 32],
}

impl RichReceipt {
    pub fn is_accepted(&self) -> bool {
        self.reject_code.is_none()
    }

    /// The canonical object hashed to produce this receipt's self-hash and
    /// the next chain link. Excludes `receipt_id` and `chain_next`
    /// themselves, since those are *derived from* this object, not part of
    /// it.
    pub fn to_canonical(&self) -> CanonValue {
        let reject = match &self.reject_code {
            Some(code) => CanonValue::Str(code.as_str().to_string()),
            None => CanonValue::Null,
        };
        CanonValue::map(vec![
            ("v".to_string(), CanonValue::Str(self.params_version.clone())),
            ("prev_state_hash".to_string(), CanonValue::Str(hex::encode(self.prev_state_hash))),
            ("next_state_hash".to_string(), CanonValue::Str(hex::encode(self.next_state_hash))),
            ("risk_before".to_string(), CanonValue::from_q(&self.risk_before)),
            ("risk_after".to_string(), CanonValue::from_q(&self.risk_after)),
            ("risk_delta_positive".to_string(), CanonValue::from_q(&self.risk_delta_positive)),
            ("budget_before".to_string(), CanonValue::from_q(&self.budget_before)),
            ("budget_after".to_string(), CanonValue::from_q(&self.budget_after)),
            ("budget_spent".to_string(), CanonValue::from_q(&self.budget_spent)),
            ("kappa".to_string(), CanonValue::from_q(&self.kappa)),
            ("projected".to_string(), CanonValue::Bool(self.projected)),
            ("witness".to_string(), self.witness.to_canonical()),
            ("reject_code".to_string(), reject),
            ("prev_receipt_id".to_string(), CanonValue::Str(self.prev_receipt_id.clone())),
            ("chain_prev".to_string(), CanonValue::Str(hex::encode(self.chain_prev))),
        ])
        .expect("fixed key set cannot collide")
    }
}

/// A pure projection of a [`RichReceipt`] carrying only what's needed to
/// verify tamper-evidence of the chain, not the full audit trail.
#[derive(Debug, Clone, PartialEq)]
pub struct MinimalReceipt {
    pub prev_state_hash: [u8; 32],
    pub next_state_hash: [u8; 32],
    pub prev_receipt_id: String,
    pub receipt_id: String,
    pub chain_prev: [u8; 32],
    pub chain_next: [u8; 32],
}

impl From<&RichReceipt> for MinimalReceipt {
    fn from(r: &RichReceipt) -> Self {
        Self {
            prev_state_hash: r.prev_state_hash,
            next_state_hash: r.next_state_hash,
            prev_receipt_id: r.prev_receipt_id.clone(),
            receipt_id: r.receipt_id.clone(),
            chain_prev: r.chain_prev,
            chain_next: r.chain_next,
        }
    }
}

/// The chain state threaded between steps: the running hash tip plus the id
/// of the last receipt appended, bundled together so a genesis sentinel is
/// one value instead of two independently-tracked ones.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ChainTip {
    pub chain_hash: [u8; 32],
    pub last_receipt_id: String,
}

impl ChainTip {
    pub fn genesis() -> Self {
        Self {
            chain_hash: crate::hash::GENESIS_CHAIN_TIP,
            last_receipt_id: crate::hash::GENESIS_RECEIPT_ID.to_string(),
        }
    }

    pub fn advance(&self, chain_next: [u8; 32], receipt_id: &str) -> Self {
        Self {
            chain_hash: chain_next,
            last_receipt_id: receipt_id.to_string(),
        }
    }
}

/// Either receipt shape, so callers that accept "a receipt" don't have to
/// pick a variant up front.
#[derive(Debug, Clone, PartialEq)]
pub enum Receipt {
    Minimal(MinimalReceipt),
    Rich(RichReceipt),
}

impl Receipt {
    pub fn chain_next(&self) -> [u8; 32] {
        match self {
            Receipt::Minimal(m) => m.chain_next,
            Receipt::Rich(r) => r.chain_next,
        }
    }

    pub fn receipt_id(&self) -> &str {
        match self {
            Receipt::Minimal(m) => &m.receipt_id,
            Receipt::Rich(r) => &r.receipt_id,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::numeric::GMI_SCALE;

    fn sample_rich() -> RichReceipt {
        RichReceipt {
            params_version: "1.5.0".to_string(),
            prev_state_hash: [1u8; 32],
            next_state_hash: [2u8; 32],
            risk_before: Q::zero(GMI_SCALE),
            risk_after: Q::zero(GMI_SCALE),
            risk_delta_positive: Q::zero(GMI_SCALE),
            budget_before: Q::from_int(1, GMI_SCALE),
            budget_after: Q::from_int(1, GMI_SCALE),
            budget_spent: Q::zero(GMI_SCALE),
            kappa: Q::one(GMI_SCALE),
            projected: false,
            witness: Default::default(),
            reject_code: None,
            prev_receipt_id: "00000000".to_string(),
            receipt_id: "deadbeef".to_string(),
            chain_prev: [0u8; 32],
            chain_next: [3u8; 32],
        }
    }

    #[test]
    fn minimal_is_a_pure_projection() {
        let rich = sample_rich();
        let minimal = MinimalReceipt::from(&rich);
        assert_eq!(minimal.next_state_hash, rich.next_state_hash);
        assert_eq!(minimal.chain_next, rich.chain_next);
    }

    #[test]
    fn accepted_receipt_has_no_reject_code() {
        assert!(sample_rich().is_accepted());
    }

    #[test]
    fn canonical_excludes_receipt_id_and_chain_next() {
        let bytes = sample_rich().to_canonical().to_canonical_bytes();
        let s = String::from_utf8(bytes).unwrap();
        assert!(!s.contains("deadbeef"));
        assert!(!s.contains(&hex::encode([3u8; 32])));
    }
}
