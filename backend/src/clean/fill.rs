//! Missing-value fill policy.

use std::collections::HashMap;

use crate::models::{col, Cell, Table};

/// Value substituted for `STATE` when missing.
pub const UNKNOWN_STATE: &str = "Unknown";

/// Per-column replacement for missing cells, computed on the whole table.
#[derive(Debug, Clone, PartialEq)]
pub struct FillPlan {
    fills: Vec<Option<Cell>>,
}

impl FillPlan {
    pub fn from_table(table: &Table) -> Self {
        let fills = table
            .columns()
            .iter()
            .enumerate()
            .map(|(idx, name)| column_fill(name, table.column(idx)))
            .collect();
        Self { fills }
    }

    /// The replacement for `cell` in column `idx`, if it is missing and
    /// the column has one.
    pub fn fill(&self, idx: usize, cell: &Cell) -> Option<Cell> {
        if !cell.is_missing() {
            return None;
        }
        self.fills.get(idx).cloned().flatten()
    }

    /// Stop filling column `idx`.
    pub fn exclude(&mut self, idx: usize) {
        if let Some(fill) = self.fills.get_mut(idx) {
            *fill = None;
        }
    }

    pub fn for_column(&self, idx: usize) -> Option<&Cell> {
        self.fills.get(idx).and_then(Option::as_ref)
    }
}

fn column_fill<'a>(name: &str, cells: impl Iterator<Item = &'a Cell>) -> Option<Cell> {
    if name == col::ADDRESSLINE2 {
        return Some(Cell::text(""));
    }
    if name == col::STATE {
        return Some(Cell::text(UNKNOWN_STATE));
    }
    if col::CLEANER_DERIVED.contains(&name) {
        return None;
    }

    let cells: Vec<&Cell> = cells.filter(|c| !c.is_missing()).collect();
    if cells.iter().any(|c| matches!(c, Cell::Text(_))) {
        return mode(cells.iter().filter_map(|c| c.as_str())).map(Cell::text);
    }

    let all_int = cells.iter().all(|c| matches!(c, Cell::Int(_)));
    let mut values: Vec<f64> = cells.iter().filter_map(|c| c.as_f64()).collect();
    median(&mut values).map(|m| {
        if all_int && m.fract() == 0.0 {
            Cell::Int(m as i64)
        } else {
            Cell::Float(m)
        }
    })
}

/// Middle value of the sorted values; the mean of the two middle values
/// for an even count.
pub fn median(values: &mut [f64]) -> Option<f64> {
    if values.is_empty() {
        return None;
    }
    values.sort_by(f64::total_cmp);

    let mid = values.len() / 2;
    if values.len() % 2 == 0 {
        Some((values[mid - 1] + values[mid]) / 2.0)
    } else {
        Some(values[mid])
    }
}

/// Most frequent value; ties go to the value encountered first.
pub fn mode<'a>(values: impl Iterator<Item = &'a str>) -> Option<&'a str> {
    let mut counts: HashMap<&str, (usize, usize)> = HashMap::new();
    for (position, value) in values.enumerate() {
        counts.entry(value).or_insert((0, position)).0 += 1;
    }

    counts
        .into_iter()
        .max_by(|(_, (count_a, first_a)), (_, (count_b, first_b))| {
            count_a.cmp(count_b).then(first_b.cmp(first_a))
        })
        .map(|(value, _)| value)
}
