//! Mapping rows onto row groups.

use crate::error::{ParquetError, Result};

/// Default maximum number of rows per row group.
pub const DEFAULT_ROW_GROUP_SIZE: usize = 5000;

/// The part of one row group covered by a row window.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RowGroupSlice {
    pub row_group: usize,
    /// Leading rows of the group to skip.
    pub skip: usize,
    /// Rows to return after the skipped ones.
    pub take: usize,
}

/// Resolve the window `[offset, offset + count)` against row groups holding
/// `row_counts` rows each.
///
/// Windows running past the end are clamped. Row groups outside the window
/// do not appear in the result.
pub fn resolve_window(
    row_counts: &[usize],
    offset: i64,
    count: Option<usize>,
) -> Result<Vec<RowGroupSlice>> {
    if offset < 0 {
        return Err(ParquetError::range(format!(
            "Row offset must not be negative, got {}",
            offset
        )));
    }
    let total: usize = row_counts.iter().sum();
    let start = usize::try_from(offset).unwrap_or(usize::MAX).min(total);
    let end = match count {
        Some(count) => start.saturating_add(count).min(total),
        None => total,
    };

    let mut slices = Vec::new();
    let mut group_start = 0;
    for (row_group, &rows) in row_counts.iter().enumerate() {
        let group_end = group_start + rows;
        let lo = start.max(group_start);
        let hi = end.min(group_end);
        if lo < hi {
            slices.push(RowGroupSlice {
                row_group,
                skip: lo - group_start,
                take: hi - lo,
            });
        }
        group_start = group_end;
        if group_start >= end {
            break;
        }
    }
    Ok(slices)
}
