//! Rebalancing rules for a triple that must always sum to a fixed total.
//!
//! Deterministic policy, cyclic over the fields:
//! - edit A: adjust B, keep C
//! - edit B: adjust C, keep A
//! - edit C: adjust A, keep B
//!
//! The edited value is clamped to `[0, total]`; no output is ever negative.

use crate::domain::model::{FieldId, Triple};
use crate::utils::error::{Result, TriadError};

#[derive(Debug, Clone, Copy, Default)]
pub struct TriadCalculator;

impl TriadCalculator {
    pub fn new() -> Self {
        Self
    }

    /// Returns `current` with `edited` set to `new_value` and the other two
    /// fields rebalanced so that the sum equals `total`.
    ///
    /// Fails with [`TriadError::InvalidArgument`] when `total` is negative or
    /// does not fit the triple's component type.
    pub fn adjust(
        &self,
        current: Triple,
        edited: FieldId,
        new_value: i64,
        total: i64,
    ) -> Result<Triple> {
        if total < 0 {
            return Err(TriadError::invalid_argument("total must be >= 0"));
        }
        if total > i64::from(u32::MAX) {
            return Err(TriadError::invalid_argument(format!(
                "total must be <= {}",
                u32::MAX
            )));
        }

        let edited_value = new_value.clamp(0, total);
        let adjust_field = edited.successor();
        let keep_field = edited.predecessor();

        let mut kept = i64::from(current.get(keep_field));
        let mut adjusted = total - edited_value - kept;
        if adjusted < 0 {
            // 調整欄位不足：歸零後由保留欄位吸收剩餘量
            adjusted = 0;
            kept = (total - edited_value - adjusted).max(0);
        }

        // 三個值都落在 [0, total] 之內，轉回 u32 不會溢位
        Ok(Triple::default()
            .with(edited, edited_value as u32)
            .with(adjust_field, adjusted as u32)
            .with(keep_field, kept as u32))
    }
}
