//! Domain models for the sales ETL pipeline.
//!
//! - [`Cell`] - one typed value of a sales record
//! - [`Table`] - ordered columns plus an ordered sequence of rows
//! - [`DealSize`] - the Small / Medium / Large deal category
//! - [`summary`] - the curated summary rows and report KPIs

pub mod summary;

use chrono::{NaiveDate, NaiveDateTime, NaiveTime};
use std::fmt;

pub use summary::{
    CountrySummary, CuratedRow, CuratedTables, CustomerSummary, Kpis, MonthlySummary,
    MonthlyTrendPoint, ProductSummary,
};

// =============================================================================
// Column Names
// =============================================================================

/// Fixed, case-sensitive column names shared by every stage.
pub mod col {
    pub const ORDERNUMBER: &str = "ORDERNUMBER";
    pub const QUANTITYORDERED: &str = "QUANTITYORDERED";
    pub const PRICEEACH: &str = "PRICEEACH";
    pub const ORDERLINENUMBER: &str = "ORDERLINENUMBER";
    pub const SALES: &str = "SALES";
    pub const MSRP: &str = "MSRP";
    pub const ORDERDATE: &str = "ORDERDATE";
    pub const CUSTOMERNAME: &str = "CUSTOMERNAME";
    pub const PRODUCTLINE: &str = "PRODUCTLINE";
    pub const COUNTRY: &str = "COUNTRY";
    pub const STATE: &str = "STATE";
    pub const ADDRESSLINE1: &str = "ADDRESSLINE1";
    pub const ADDRESSLINE2: &str = "ADDRESSLINE2";
    pub const DEALSIZE: &str = "DEALSIZE";
    pub const DEALSIZE_NUM: &str = "DEALSIZE_NUM";
    pub const DAY: &str = "DAY";
    pub const MONTH: &str = "MONTH";
    pub const YEAR: &str = "YEAR";
    pub const TOTALREVENUE: &str = "TOTALREVENUE";

    pub const LIFETIME_VALUE: &str = "LifetimeValue";
    pub const AVG_ORDER_VALUE: &str = "AvgOrderValue";
    pub const TOTAL_ORDERS: &str = "TotalOrders";
    pub const ORDER_FREQUENCY: &str = "OrderFrequency";
    pub const DAYS_SINCE_LAST_ORDER: &str = "DaysSinceLastOrder";
    pub const ORDER_MONTH: &str = "OrderMonth";

    /// Columns coerced to numbers even when some values are malformed.
    pub const DECLARED_NUMERIC: &[&str] = &[
        ORDERNUMBER,
        QUANTITYORDERED,
        PRICEEACH,
        ORDERLINENUMBER,
        SALES,
        MSRP,
    ];

    /// Columns always read as text.
    pub const DECLARED_TEXT: &[&str] = &[ADDRESSLINE1, ADDRESSLINE2, STATE, ORDERDATE];

    /// Source amounts that must never be negative.
    pub const NON_NEGATIVE: &[&str] = &[QUANTITYORDERED, PRICEEACH, SALES];

    /// Columns the cleaner recomputes, so they never take a fill value.
    pub const CLEANER_DERIVED: &[&str] = &[DAY, MONTH, YEAR, DEALSIZE_NUM];

    pub fn is_phone_like(name: &str) -> bool {
        name.to_ascii_uppercase().contains("PHONE")
    }
}

// =============================================================================
// Cells
// =============================================================================

/// Tokens (after trimming) that read as a missing value.
const MISSING_TOKENS: &[&str] = &["", "NA", "N/A", "NaN", "nan", "NULL", "null", "None"];

pub fn is_missing_token(raw: &str) -> bool {
    MISSING_TOKENS.contains(&raw.trim())
}

/// One typed value of a row.
#[derive(Debug, Clone, PartialEq)]
pub enum Cell {
    Missing,
    Int(i64),
    Float(f64),
    Text(String),
    Date(NaiveDateTime),
}

impl Cell {
    pub fn text(value: impl Into<String>) -> Self {
        Cell::Text(value.into())
    }

    pub fn is_missing(&self) -> bool {
        matches!(self, Cell::Missing)
    }

    pub fn as_f64(&self) -> Option<f64> {
        match self {
            Cell::Int(v) => Some(*v as f64),
            Cell::Float(v) => Some(*v),
            _ => None,
        }
    }

    /// Integer view; a float qualifies only when it has no fractional part.
    pub fn as_i64(&self) -> Option<i64> {
        match self {
            Cell::Int(v) => Some(*v),
            Cell::Float(v) if v.fract() == 0.0 && v.is_finite() => Some(*v as i64),
            _ => None,
        }
    }

    pub fn as_str(&self) -> Option<&str> {
        match self {
            Cell::Text(s) => Some(s),
            _ => None,
        }
    }

    /// Date view, parsing text cells on the fly.
    pub fn as_date(&self) -> Option<NaiveDateTime> {
        match self {
            Cell::Date(d) => Some(*d),
            Cell::Text(s) => parse_order_date(s),
            _ => None,
        }
    }

    /// Grouping key: the rendered form, or `None` for a missing cell.
    pub fn key(&self) -> Option<String> {
        (!self.is_missing()).then(|| self.to_string())
    }

    /// `self * other`, staying integral when both sides are.
    pub fn product(&self, other: &Cell) -> Cell {
        match (self, other) {
            (Cell::Int(a), Cell::Int(b)) => match a.checked_mul(*b) {
                Some(v) => Cell::Int(v),
                None => Cell::Float(*a as f64 * *b as f64),
            },
            _ => match (self.as_f64(), other.as_f64()) {
                (Some(a), Some(b)) => Cell::Float(a * b),
                _ => Cell::Missing,
            },
        }
    }

    pub fn from_f64(value: Option<f64>) -> Cell {
        value.map(Cell::Float).unwrap_or(Cell::Missing)
    }
}

impl fmt::Display for Cell {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Cell::Missing => Ok(()),
            Cell::Int(v) => write!(f, "{}", v),
            Cell::Float(v) => f.write_str(&format_float(*v)),
            Cell::Text(s) => f.write_str(s),
            Cell::Date(d) => f.write_str(&format_date(d)),
        }
    }
}

/// Shortest round-trip decimal that always carries a fractional part.
pub fn format_float(value: f64) -> String {
    if value.is_finite() && value.fract() == 0.0 {
        format!("{:.1}", value)
    } else {
        format!("{}", value)
    }
}

fn format_date(date: &NaiveDateTime) -> String {
    if date.time() == NaiveTime::MIN {
        date.format("%Y-%m-%d").to_string()
    } else {
        date.format("%Y-%m-%d %H:%M:%S").to_string()
    }
}

// =============================================================================
// Dates
// =============================================================================

const DATETIME_FORMATS: &[&str] = &[
    "%Y-%m-%d %H:%M:%S",
    "%Y-%m-%dT%H:%M:%S",
    "%Y-%m-%d %H:%M",
    "%m/%d/%Y %H:%M:%S",
    "%m/%d/%Y %H:%M",
];

const DATE_FORMATS: &[&str] = &["%Y-%m-%d", "%m/%d/%Y", "%Y/%m/%d", "%d.%m.%Y"];

/// Parse an order date in any of the accepted extract formats.
pub fn parse_order_date(raw: &str) -> Option<NaiveDateTime> {
    let raw = raw.trim();
    if raw.is_empty() {
        return None;
    }

    DATETIME_FORMATS
        .iter()
        .find_map(|fmt| NaiveDateTime::parse_from_str(raw, fmt).ok())
        .or_else(|| {
            DATE_FORMATS
                .iter()
                .find_map(|fmt| NaiveDate::parse_from_str(raw, fmt).ok())
                .map(|d| d.and_time(NaiveTime::MIN))
        })
}

// =============================================================================
// Deal Size
// =============================================================================

/// Deal-size category with its numeric rank.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DealSize {
    Small,
    Medium,
    Large,
}

impl DealSize {
    /// Exact match on the normalized (title-cased) label.
    pub fn from_label(label: &str) -> Option<Self> {
        match label {
            "Small" => Some(DealSize::Small),
            "Medium" => Some(DealSize::Medium),
            "Large" => Some(DealSize::Large),
            _ => None,
        }
    }

    pub fn rank(self) -> i64 {
        match self {
            DealSize::Small => 1,
            DealSize::Medium => 2,
            DealSize::Large => 3,
        }
    }
}

// =============================================================================
// Tables
// =============================================================================

/// One record, aligned with its table's columns.
pub type Row = Vec<Cell>;

/// Ordered column names plus an ordered sequence of rows.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct Table {
    columns: Vec<String>,
    rows: Vec<Row>,
}

impl Table {
    pub fn new(columns: Vec<String>) -> Self {
        Self {
            columns,
            rows: Vec::new(),
        }
    }

    /// Build a table, padding or truncating rows to the column count.
    pub fn from_rows(columns: Vec<String>, rows: Vec<Row>) -> Self {
        let mut table = Self::new(columns);
        for row in rows {
            table.push_row(row);
        }
        table
    }

    pub fn columns(&self) -> &[String] {
        &self.columns
    }

    pub fn rows(&self) -> &[Row] {
        &self.rows
    }

    pub fn len(&self) -> usize {
        self.rows.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    pub fn column_index(&self, name: &str) -> Option<usize> {
        self.columns.iter().position(|c| c == name)
    }

    pub fn has_column(&self, name: &str) -> bool {
        self.column_index(name).is_some()
    }

    /// Cells of one column, top to bottom.
    pub fn column(&self, idx: usize) -> impl Iterator<Item = &Cell> + '_ {
        self.rows.iter().map(move |r| r.get(idx).unwrap_or(&Cell::Missing))
    }

    /// Cell at `row` in the named column.
    pub fn get(&self, row: usize, name: &str) -> Option<&Cell> {
        let idx = self.column_index(name)?;
        self.rows.get(row).and_then(|r| r.get(idx))
    }

    pub fn push_row(&mut self, mut row: Row) {
        row.resize(self.columns.len(), Cell::Missing);
        self.rows.push(row);
    }
}

/// Index of `name` in `columns`, appending it when absent.
pub fn ensure_column(columns: &mut Vec<String>, name: &str) -> usize {
    match columns.iter().position(|c| c == name) {
        Some(idx) => idx,
        None => {
            columns.push(name.to_string());
            columns.len() - 1
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_float_rendering() {
        assert_eq!(Cell::Float(50.0).to_string(), "50.0");
        assert_eq!(Cell::Float(2.5).to_string(), "2.5");
        assert_eq!(Cell::Float(0.1 + 0.2).to_string(), "0.30000000000000004");
        assert_eq!(Cell::Int(30).to_string(), "30");
        assert_eq!(Cell::Missing.to_string(), "");
    }

    #[test]
    fn test_product_keeps_integers() {
        assert_eq!(Cell::Int(10).product(&Cell::Float(5.0)), Cell::Float(50.0));
        assert_eq!(Cell::Int(4).product(&Cell::Int(3)), Cell::Int(12));
        assert_eq!(Cell::Missing.product(&Cell::Int(3)), Cell::Missing);
    }

    #[test]
    fn test_parse_raw_extract_date() {
        let d = parse_order_date("2/24/2003 0:00").unwrap();
        assert_eq!(d.date(), NaiveDate::from_ymd_opt(2003, 2, 24).unwrap());
        assert_eq!(Cell::Date(d).to_string(), "2003-02-24");
    }

    #[test]
    fn test_parse_rendered_dates_back() {
        let d = parse_order_date("2003-02-24 10:30:00").unwrap();
        assert_eq!(Cell::Date(d).to_string(), "2003-02-24 10:30:00");
        assert!(parse_order_date("2024-01-05").is_some());
        assert!(parse_order_date("not a date").is_none());
        assert!(parse_order_date("13/45/2003").is_none());
    }

    #[test]
    fn test_deal_size_rank() {
        assert_eq!(DealSize::from_label("Medium").map(DealSize::rank), Some(2));
        assert_eq!(DealSize::from_label("Huge"), None);
    }

    #[test]
    fn test_missing_tokens() {
        assert!(is_missing_token("  "));
        assert!(is_missing_token("NaN"));
        assert!(!is_missing_token("0"));
    }

    #[test]
    fn test_push_row_pads() {
        let mut table = Table::new(vec!["A".into(), "B".into()]);
        table.push_row(vec![Cell::Int(1)]);
        assert_eq!(table.get(0, "B"), Some(&Cell::Missing));
    }
}
