//! Column typing for freshly parsed tables.

use crate::models::{col, is_missing_token, Cell, Row};

/// Type assigned to a whole column when a table is read.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ColumnKind {
    /// Every value is an integer and none is missing.
    Int,
    /// Numeric, with fractional or missing values.
    Float,
    /// Categorical or free text.
    Text,
}

fn parse_number(raw: &str) -> Option<f64> {
    raw.trim().parse::<f64>().ok().filter(|v| v.is_finite())
}

fn parse_integer(raw: &str) -> Option<i64> {
    raw.trim().parse::<i64>().ok()
}

/// Decide the kind of column `name` from its raw values.
pub fn infer_kind(name: &str, values: &[&str]) -> ColumnKind {
    if col::DECLARED_TEXT.contains(&name) || col::is_phone_like(name) {
        return ColumnKind::Text;
    }

    let present: Vec<&str> = values
        .iter()
        .copied()
        .filter(|v| !is_missing_token(v))
        .collect();
    let declared = col::DECLARED_NUMERIC.contains(&name);

    if !declared {
        if present.is_empty() {
            return ColumnKind::Float;
        }
        if !present.iter().all(|v| parse_number(v).is_some()) {
            return ColumnKind::Text;
        }
    }

    let complete = present.len() == values.len();
    if complete && present.iter().all(|v| parse_integer(v).is_some()) {
        ColumnKind::Int
    } else {
        ColumnKind::Float
    }
}

fn to_cell(kind: ColumnKind, raw: String) -> Cell {
    if is_missing_token(&raw) {
        return Cell::Missing;
    }
    match kind {
        ColumnKind::Int => parse_integer(&raw).map(Cell::Int).unwrap_or(Cell::Missing),
        ColumnKind::Float => parse_number(&raw).map(Cell::Float).unwrap_or(Cell::Missing),
        ColumnKind::Text => Cell::Text(raw),
    }
}

/// Turn raw string rows into typed rows, one kind per column.
pub fn type_rows(headers: &[String], raw_rows: Vec<Vec<String>>) -> Vec<Row> {
    let kinds: Vec<ColumnKind> = headers
        .iter()
        .enumerate()
        .map(|(idx, name)| {
            let values: Vec<&str> = raw_rows
                .iter()
                .map(|r| r.get(idx).map(String::as_str).unwrap_or(""))
                .collect();
            infer_kind(name, &values)
        })
        .collect();

    raw_rows
        .into_iter()
        .map(|raw| {
            raw.into_iter()
                .zip(kinds.iter())
                .map(|(value, kind)| to_cell(*kind, value))
                .collect()
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_integer_column() {
        assert_eq!(infer_kind("QTR_ID", &["1", "2", " 3 "]), ColumnKind::Int);
    }

    #[test]
    fn test_missing_value_makes_float() {
        assert_eq!(infer_kind("QUANTITYORDERED", &["30", "", "41"]), ColumnKind::Float);
    }

    #[test]
    fn test_text_column() {
        assert_eq!(infer_kind("POSTALCODE", &["10022", "EC2 5NT"]), ColumnKind::Text);
    }

    #[test]
    fn test_declared_numeric_coerces_garbage() {
        let headers = vec!["PRICEEACH".to_string()];
        let rows = type_rows(&headers, vec![vec!["95.7".into()], vec!["abc".into()]]);

        assert_eq!(rows[0][0], Cell::Float(95.7));
        assert_eq!(rows[1][0], Cell::Missing);
    }

    #[test]
    fn test_declared_text_stays_text() {
        assert_eq!(infer_kind("PHONE", &["2125557818"]), ColumnKind::Text);
        assert_eq!(infer_kind("STATE", &["", ""]), ColumnKind::Text);
        assert_eq!(infer_kind("ORDERDATE", &["2003-02-24"]), ColumnKind::Text);
    }

    #[test]
    fn test_all_missing_column_is_numeric() {
        assert_eq!(infer_kind("TERRITORY_CODE", &["", "NA"]), ColumnKind::Float);
    }
}
