use std::sync::Arc;

use indexmap::IndexMap;

use crate::column::ColumnValues;
use crate::descriptor::SchemaDescriptor;
use crate::error::{ParquetError, Result};
use crate::schema::SchemaNode;
use crate::value::ParquetValue;

use super::FieldPlan;

/// Forward-only cursor over one decoded leaf column.
struct LeafCursor {
    path: String,
    max_def: i16,
    values: std::vec::IntoIter<ParquetValue>,
    def_levels: Vec<i16>,
    rep_levels: Vec<i16>,
    pos: usize,
}

impl LeafCursor {
    fn new(path: String, max_def: i16, column: ColumnValues) -> Self {
        Self {
            path,
            max_def,
            values: column.values.into_iter(),
            def_levels: column.def_levels,
            rep_levels: column.rep_levels,
            pos: 0,
        }
    }

    fn is_exhausted(&self) -> bool {
        self.pos >= self.def_levels.len()
    }

    fn peek_def(&self) -> Result<i16> {
        self.def_levels.get(self.pos).copied().ok_or_else(|| {
            ParquetError::corrupt_data(format!(
                "column '{}' ran out of entries after {}",
                self.path, self.pos
            ))
        })
    }

    fn peek_rep(&self) -> Option<i16> {
        self.rep_levels.get(self.pos).copied()
    }

    /// Consume one entry, returning its value if it is present.
    fn advance(&mut self) -> Result<Option<ParquetValue>> {
        let def = self.peek_def()?;
        self.pos += 1;
        if def == self.max_def {
            let value = self.values.next().ok_or_else(|| {
                ParquetError::corrupt_data(format!(
                    "column '{}' has fewer values than its definition levels require",
                    self.path
                ))
            })?;
            Ok(Some(value))
        } else {
            Ok(None)
        }
    }
}

/// Rebuilds rows from per-leaf columns of one row group.
///
/// Iterating yields one `Vec<ParquetValue>` per row, holding the projected
/// top-level fields in schema order. Once the declared row count is reached
/// every column must be fully consumed.
pub struct RecordAssembler<'a> {
    plans: Vec<FieldPlan<'a>>,
    cursors: Vec<Option<LeafCursor>>,
    remaining: usize,
    row: usize,
    finished: bool,
}

impl<'a> RecordAssembler<'a> {
    /// `fields` are top-level field indices; `columns[i]` must be `Some` for
    /// every leaf below them.
    pub fn new(
        descr: &'a SchemaDescriptor,
        fields: &[usize],
        columns: Vec<Option<ColumnValues>>,
        num_rows: usize,
    ) -> Result<Self> {
        if columns.len() != descr.num_columns() {
            return Err(ParquetError::internal(format!(
                "expected {} column slots, got {}",
                descr.num_columns(),
                columns.len()
            )));
        }
        let mut all_plans: Vec<Option<FieldPlan<'a>>> =
            FieldPlan::for_schema(descr).into_iter().map(Some).collect();
        let plans = fields
            .iter()
            .map(|&idx| {
                all_plans.get_mut(idx).and_then(Option::take).ok_or_else(|| {
                    ParquetError::invalid_argument(format!("field index {} is out of range or repeated", idx))
                })
            })
            .collect::<Result<Vec<_>>>()?;

        let mut cursors: Vec<Option<LeafCursor>> = columns
            .into_iter()
            .enumerate()
            .map(|(idx, column)| {
                let leaf = descr.column(idx);
                column.map(|c| LeafCursor::new(leaf.path_string(), leaf.max_def_level, c))
            })
            .collect();
        for plan in &plans {
            for leaf in plan.leaves.clone() {
                if cursors[leaf].is_none() {
                    return Err(ParquetError::internal(format!(
                        "column '{}' is needed but was not decoded",
                        descr.column(leaf).path_string()
                    )));
                }
            }
        }
        // Leaves outside the projection are ignored.
        let projected: Vec<bool> = (0..cursors.len())
            .map(|leaf| plans.iter().any(|p| p.leaves.contains(&leaf)))
            .collect();
        for (cursor, keep) in cursors.iter_mut().zip(projected) {
            if !keep {
                *cursor = None;
            }
        }

        Ok(Self {
            plans,
            cursors,
            remaining: num_rows,
            row: 0,
            finished: false,
        })
    }

    pub fn remaining_rows(&self) -> usize {
        self.remaining
    }

    fn cursor(&mut self, leaf: usize) -> Result<&mut LeafCursor> {
        self.cursors
            .get_mut(leaf)
            .and_then(Option::as_mut)
            .ok_or_else(|| ParquetError::internal(format!("no cursor for leaf {}", leaf)))
    }

    fn check_row_start(&mut self) -> Result<()> {
        let row = self.row;
        for cursor in self.cursors.iter().flatten() {
            match cursor.peek_rep() {
                Some(0) => {}
                Some(rep) => {
                    return Err(ParquetError::corrupt_data(format!(
                        "column '{}': row {} starts with repetition level {}",
                        cursor.path, row, rep
                    )))
                }
                None => {
                    return Err(ParquetError::corrupt_data(format!(
                        "column '{}' ended before row {}",
                        cursor.path, row
                    )))
                }
            }
        }
        Ok(())
    }

    /// Assemble the next row, or `None` once the row group is exhausted.
    pub fn next_row(&mut self) -> Result<Option<Vec<ParquetValue>>> {
        if self.remaining == 0 {
            self.finish()?;
            return Ok(None);
        }
        self.check_row_start()?;

        let plans = std::mem::take(&mut self.plans);
        let row = plans.iter().map(|plan| self.read_node(plan)).collect::<Result<Vec<_>>>();
        self.plans = plans;

        self.remaining -= 1;
        self.row += 1;
        row.map(Some)
    }

    /// Skip `n` rows without materialising their values.
    pub fn skip_rows(&mut self, n: usize) -> Result<()> {
        if n > self.remaining {
            return Err(ParquetError::internal(format!(
                "cannot skip {} rows, only {} remain",
                n, self.remaining
            )));
        }
        for _ in 0..n {
            self.check_row_start()?;
            for cursor in self.cursors.iter_mut().flatten() {
                cursor.advance()?;
                while cursor.peek_rep().is_some_and(|rep| rep > 0) {
                    cursor.advance()?;
                }
            }
            self.remaining -= 1;
            self.row += 1;
        }
        Ok(())
    }

    /// Check that no column has entries beyond the declared rows.
    pub fn finish(&mut self) -> Result<()> {
        if self.finished {
            return Ok(());
        }
        for cursor in self.cursors.iter().flatten() {
            if !cursor.is_exhausted() {
                return Err(ParquetError::corrupt_data(format!(
                    "column '{}' has {} entries left after {} rows",
                    cursor.path,
                    cursor.def_levels.len() - cursor.pos,
                    self.row
                )));
            }
            if cursor.values.len() > 0 {
                return Err(ParquetError::corrupt_data(format!(
                    "column '{}' has {} unused values",
                    cursor.path,
                    cursor.values.len()
                )));
            }
        }
        self.finished = true;
        Ok(())
    }

    /// Consume one entry from every leaf below `plan`.
    fn skip_entry(&mut self, plan: &FieldPlan<'_>) -> Result<()> {
        for leaf in plan.leaves.clone() {
            self.cursor(leaf)?.advance()?;
        }
        Ok(())
    }

    /// Whether the next entry of `plan`'s first leaf continues the repeated node.
    fn continues(&mut self, plan: &FieldPlan<'_>) -> Result<bool> {
        let level = plan.repeated_level();
        Ok(self
            .cursor(plan.leaves.start)?
            .peek_rep()
            .is_some_and(|rep| rep >= level))
    }

    fn read_node(&mut self, plan: &FieldPlan<'_>) -> Result<ParquetValue> {
        let first = plan.leaves.start;
        let def = self.cursor(first)?.peek_def()?;

        if def < plan.def {
            if !plan.node.is_nullable() {
                let cursor = self.cursor(first)?;
                return Err(ParquetError::corrupt_data(format!(
                    "column '{}': definition level {} below the level {} of required field '{}'",
                    cursor.path,
                    def,
                    plan.def,
                    plan.node.name()
                )));
            }
            self.skip_entry(plan)?;
            return Ok(ParquetValue::Null);
        }

        match plan.node {
            SchemaNode::Primitive { .. } => {
                let cursor = self.cursor(first)?;
                match cursor.advance()? {
                    Some(value) => Ok(value),
                    None => Err(ParquetError::corrupt_data(format!(
                        "column '{}': definition level {} does not reach the leaf",
                        cursor.path, def
                    ))),
                }
            }
            SchemaNode::Struct { .. } => {
                let mut record = IndexMap::with_capacity(plan.children.len());
                for child in &plan.children {
                    let value = self.read_node(child)?;
                    record.insert(Arc::from(child.node.name()), value);
                }
                Ok(ParquetValue::Record(record))
            }
            SchemaNode::List { .. } => {
                // Present but without repeated entries.
                if def == plan.def {
                    self.skip_entry(plan)?;
                    return Ok(ParquetValue::List(Vec::new()));
                }
                let item_plan = &plan.children[0];
                let mut items = Vec::new();
                loop {
                    items.push(self.read_node(item_plan)?);
                    if !self.continues(plan)? {
                        break;
                    }
                }
                Ok(ParquetValue::List(items))
            }
            SchemaNode::Map { .. } => {
                if def == plan.def {
                    self.skip_entry(plan)?;
                    return Ok(ParquetValue::Map(Vec::new()));
                }
                let (key_plan, value_plan) = (&plan.children[0], &plan.children[1]);
                let mut entries = Vec::new();
                loop {
                    let key = self.read_node(key_plan)?;
                    let value = self.read_node(value_plan)?;
                    entries.push((key, value));
                    if !self.continues(plan)? {
                        break;
                    }
                }
                Ok(ParquetValue::Map(entries))
            }
        }
    }
}

impl Iterator for RecordAssembler<'_> {
    type Item = Result<Vec<ParquetValue>>;

    fn next(&mut self) -> Option<Self::Item> {
        match self.next_row() {
            Ok(Some(row)) => Some(Ok(row)),
            Ok(None) => None,
            Err(e) => {
                // Stop after the first error.
                self.remaining = 0;
                self.finished = true;
                Some(Err(e))
            }
        }
    }
}
