//! Column chunk encoding and decoding.
//!
//! A column chunk is the contiguous run of pages holding one leaf column of
//! one row group. Both directions work on [`ColumnValues`], the columnar
//! triple stream produced by shredding and consumed by assembly.

pub mod reader;
pub mod writer;

use crate::value::ParquetValue;

/// Values and levels of one leaf column.
///
/// `def_levels` and `rep_levels` have one entry per occurrence, including
/// nulls; `values` holds only the present values, in order.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ColumnValues {
    pub values: Vec<ParquetValue>,
    pub def_levels: Vec<i16>,
    pub rep_levels: Vec<i16>,
}

impl ColumnValues {
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of level entries.
    pub fn len(&self) -> usize {
        self.def_levels.len()
    }

    pub fn is_empty(&self) -> bool {
        self.def_levels.is_empty()
    }

    pub fn push_value(&mut self, value: ParquetValue, def: i16, rep: i16) {
        self.values.push(value);
        self.def_levels.push(def);
        self.rep_levels.push(rep);
    }

    pub fn push_null(&mut self, def: i16, rep: i16) {
        self.def_levels.push(def);
        self.rep_levels.push(rep);
    }

    /// Number of rows, i.e. entries starting a new record.
    pub fn num_rows(&self) -> usize {
        self.rep_levels.iter().filter(|r| **r == 0).count()
    }

    /// Present values and their levels merged into `(value, rep, def)`
    /// triples, with `None` for nulls and empty collections.
    pub fn triples(&self, max_def_level: i16) -> Vec<(Option<&ParquetValue>, i16, i16)> {
        let mut values = self.values.iter();
        self.def_levels
            .iter()
            .zip(&self.rep_levels)
            .map(|(&def, &rep)| {
                let value = if def == max_def_level { values.next() } else { None };
                (value, rep, def)
            })
            .collect()
    }
}
