//! Symbol-set diff between two ticker lists

use std::collections::HashSet;

use crate::models::{DiffResult, TickerRecord};

/// Compare the committed master (`before`) with a candidate (`after`).
///
/// Membership is by symbol only. A listing whose name changed counts as
/// unchanged; the new name arrives with the candidate when it is committed.
pub fn compute_diff(before: &[TickerRecord], after: &[TickerRecord]) -> DiffResult {
    let before_symbols: HashSet<&str> = before.iter().map(|s| s.symbol.as_str()).collect();
    let after_symbols: HashSet<&str> = after.iter().map(|s| s.symbol.as_str()).collect();

    let added: Vec<TickerRecord> = after
        .iter()
        .filter(|s| !before_symbols.contains(s.symbol.as_str()))
        .cloned()
        .collect();

    let removed: Vec<TickerRecord> = before
        .iter()
        .filter(|s| !after_symbols.contains(s.symbol.as_str()))
        .cloned()
        .collect();

    DiffResult {
        total_before: before.len(),
        total_after: after.len(),
        unchanged: before.len() - removed.len(),
        added,
        removed,
    }
}
