// ============================================
// Heuristic scorers
// ============================================
//
// Pure functions over shallow input features. Every source of randomness is
// an explicit `rand::Rng` argument so callers decide between `thread_rng()`
// and a seeded generator.

use serde::{Deserialize, Serialize};

pub mod file_risk;
pub mod phone;
pub mod threat;
pub mod username;

/// UI-facing risk tier.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Severity {
    Green,
    Yellow,
    Orange,
    Red,
}

impl Severity {
    pub fn hex(self) -> &'static str {
        match self {
            Severity::Green => "#16a34a",
            Severity::Yellow => "#f59e0b",
            Severity::Orange => "#f97316",
            Severity::Red => "#dc2626",
        }
    }
}

/// 32-bit rolling string hash (`h * 31 + unit` over UTF-16 code units),
/// returned as an absolute value.
pub fn string_hash(input: &str) -> u32 {
    let mut hash: i32 = 0;
    for unit in input.encode_utf16() {
        hash = hash.wrapping_mul(31).wrapping_add(unit as i32);
    }
    hash.unsigned_abs()
}
