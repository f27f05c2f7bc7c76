use crate::column::ColumnValues;
use crate::conversion;
use crate::descriptor::SchemaDescriptor;
use crate::error::{ErrorContext, ParquetError, Result};
use crate::schema::{node_kind, SchemaNode};
use crate::value::ParquetValue;

use super::FieldPlan;

static NULL: ParquetValue = ParquetValue::Null;

/// Stripes rows into per-leaf [`ColumnValues`].
///
/// A row that fails to shred leaves the buffers as they were before it.
pub struct Shredder<'a> {
    descr: &'a SchemaDescriptor,
    plans: Vec<FieldPlan<'a>>,
    columns: Vec<ColumnValues>,
    num_rows: usize,
    /// Index of the first row, used in error messages.
    row_offset: usize,
}

impl<'a> Shredder<'a> {
    pub fn new(descr: &'a SchemaDescriptor) -> Self {
        Self {
            descr,
            plans: FieldPlan::for_schema(descr),
            columns: vec![ColumnValues::new(); descr.num_columns()],
            num_rows: 0,
            row_offset: 0,
        }
    }

    /// Continue filling `columns`, numbering rows from `row_offset`.
    pub fn resume(descr: &'a SchemaDescriptor, columns: Vec<ColumnValues>, row_offset: usize) -> Result<Self> {
        if columns.len() != descr.num_columns() {
            return Err(ParquetError::internal(format!(
                "expected {} column buffers, got {}",
                descr.num_columns(),
                columns.len()
            )));
        }
        Ok(Self {
            descr,
            plans: FieldPlan::for_schema(descr),
            columns,
            num_rows: 0,
            row_offset,
        })
    }

    pub fn num_rows(&self) -> usize {
        self.num_rows
    }

    /// Shred one row; `row` holds one value per top-level field.
    pub fn shred_row(&mut self, row: &[ParquetValue]) -> Result<()> {
        let row_idx = self.row_offset + self.num_rows;
        if row.len() != self.plans.len() {
            return Err(ParquetError::schema(format!(
                "row {}: expected {} values, got {}",
                row_idx,
                self.plans.len(),
                row.len()
            )));
        }

        let marks: Vec<(usize, usize)> = self
            .columns
            .iter()
            .map(|c| (c.values.len(), c.def_levels.len()))
            .collect();

        let mut result = Ok(());
        for (plan, value) in self.plans.iter().zip(row) {
            result = shred_node(self.descr, &mut self.columns, plan, value, 0);
            if result.is_err() {
                break;
            }
        }

        match result {
            Ok(()) => {
                self.num_rows += 1;
                Ok(())
            }
            Err(e) => {
                for (column, (values, levels)) in self.columns.iter_mut().zip(marks) {
                    column.values.truncate(values);
                    column.def_levels.truncate(levels);
                    column.rep_levels.truncate(levels);
                }
                Err(e).with_context(|| format!("row {}", row_idx))
            }
        }
    }

    /// Hand out the buffered columns and start over.
    pub fn take_columns(&mut self) -> Vec<ColumnValues> {
        self.row_offset += self.num_rows;
        self.num_rows = 0;
        std::mem::replace(&mut self.columns, vec![ColumnValues::new(); self.descr.num_columns()])
    }

    pub fn finish(self) -> Vec<ColumnValues> {
        self.columns
    }
}

/// Shred a batch of rows in one go.
pub fn shred_rows<R: AsRef<[ParquetValue]>>(descr: &SchemaDescriptor, rows: &[R]) -> Result<Vec<ColumnValues>> {
    let mut shredder = Shredder::new(descr);
    for row in rows {
        shredder.shred_row(row.as_ref())?;
    }
    Ok(shredder.finish())
}

fn shred_node(
    descr: &SchemaDescriptor,
    columns: &mut [ColumnValues],
    plan: &FieldPlan<'_>,
    value: &ParquetValue,
    rep: i16,
) -> Result<()> {
    let field_path = || descr.column(plan.leaves.start).path_string();

    if value.is_null() {
        if !plan.node.is_nullable() {
            return Err(ParquetError::schema(format!(
                "column '{}': null value for required field '{}'",
                field_path(),
                plan.node.name()
            )));
        }
        // Every leaf below gets one null at the deepest present ancestor's level.
        for column in &mut columns[plan.leaves.clone()] {
            column.push_null(plan.def - 1, rep);
        }
        return Ok(());
    }

    match (plan.node, value) {
        (SchemaNode::Primitive { primitive_type, .. }, value) => {
            conversion::check_value(value, primitive_type)
                .with_context(|| format!("column '{}'", field_path()))?;
            columns[plan.leaves.start].push_value(value.clone(), plan.def, rep);
        }
        (SchemaNode::Struct { fields, .. }, ParquetValue::Record(record)) => {
            if let Some(unknown) = record.keys().find(|k| !fields.iter().any(|f| f.name() == k.as_ref())) {
                return Err(ParquetError::schema(format!(
                    "column '{}': struct '{}' has no field named '{}'",
                    field_path(),
                    plan.node.name(),
                    unknown
                )));
            }
            for child in &plan.children {
                let child_value = record.get(child.node.name()).unwrap_or(&NULL);
                shred_node(descr, columns, child, child_value, rep)?;
            }
        }
        (SchemaNode::List { .. }, ParquetValue::List(items)) => {
            if items.is_empty() {
                for column in &mut columns[plan.leaves.clone()] {
                    column.push_null(plan.def, rep);
                }
                return Ok(());
            }
            let item_plan = &plan.children[0];
            for (idx, item) in items.iter().enumerate() {
                let item_rep = if idx == 0 { rep } else { plan.repeated_level() };
                shred_node(descr, columns, item_plan, item, item_rep)?;
            }
        }
        (SchemaNode::Map { .. }, ParquetValue::Map(entries)) => {
            if entries.is_empty() {
                for column in &mut columns[plan.leaves.clone()] {
                    column.push_null(plan.def, rep);
                }
                return Ok(());
            }
            let (key_plan, value_plan) = (&plan.children[0], &plan.children[1]);
            for (idx, (key, val)) in entries.iter().enumerate() {
                let entry_rep = if idx == 0 { rep } else { plan.repeated_level() };
                shred_node(descr, columns, key_plan, key, entry_rep)?;
                shred_node(descr, columns, value_plan, val, entry_rep)?;
            }
        }
        (node, value) => {
            return Err(ParquetError::schema(format!(
                "column '{}': expected {} for field '{}', got {}",
                field_path(),
                node_kind(node),
                node.name(),
                value.type_name()
            )))
        }
    }
    Ok(())
}
