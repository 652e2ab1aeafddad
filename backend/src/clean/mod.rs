//! Cleaner stage: raw extract → typed, validated, de-duplicated table.
//!
//! # Row processing
//!
//! ```text
//! raw row ─▶ blank ─▶ fill ─▶ negative? ─▶ normalize ─▶ date? ─▶ derive ─▶ duplicate? ─▶ out
//!                               │ drop                    │ drop               │ drop
//! ```
//!
//! Text that would normalize to a missing token is blanked first, so it
//! is filled like any other missing cell. Medians and modes are computed
//! once over the blanked table before any row is dropped. The order above
//! makes cleaning its own output a no-op.

pub mod fill;
pub mod text;

pub use fill::{median, mode, FillPlan};
pub use text::{digits_only, normalize, title_case};

use std::collections::{BTreeMap, HashSet};

use crate::models::{col, ensure_column, is_missing_token, Cell, DealSize, Row, Table};

use chrono::Datelike;

/// What the cleaner did to its input.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct CleanReport {
    pub rows_read: usize,
    pub rows_written: usize,
    pub duplicates_removed: usize,
    pub invalid_dates_dropped: usize,
    pub negative_amounts_dropped: usize,
    /// Filled cell count per column, for columns with at least one fill
    pub filled: BTreeMap<String, usize>,
}

impl CleanReport {
    pub fn summary(&self) -> String {
        format!(
            "Cleaned: {} → {} rows ({} duplicates, {} bad dates, {} negative amounts)",
            self.rows_read,
            self.rows_written,
            self.duplicates_removed,
            self.invalid_dates_dropped,
            self.negative_amounts_dropped
        )
    }
}

/// Cleaned table with its report.
#[derive(Debug, Clone)]
pub struct CleanOutput {
    pub table: Table,
    pub report: CleanReport,
}

/// Column positions the cleaner works with.
struct Layout {
    quantity: Option<usize>,
    price: Option<usize>,
    date: Option<usize>,
    deal_size: Option<usize>,
    sales_out: Option<usize>,
    calendar_out: Option<(usize, usize, usize)>,
    deal_rank_out: Option<usize>,
    non_negative: Vec<usize>,
    categorical: Vec<bool>,
}

impl Layout {
    fn new(table: &Table, columns: &mut Vec<String>) -> Self {
        let quantity = table.column_index(col::QUANTITYORDERED);
        let price = table.column_index(col::PRICEEACH);
        let date = table.column_index(col::ORDERDATE);
        let deal_size = table.column_index(col::DEALSIZE);

        let sales_out = match (quantity, price) {
            (Some(_), Some(_)) => Some(ensure_column(columns, col::SALES)),
            _ => None,
        };
        let calendar_out = date.map(|_| {
            (
                ensure_column(columns, col::DAY),
                ensure_column(columns, col::MONTH),
                ensure_column(columns, col::YEAR),
            )
        });
        let deal_rank_out = deal_size.map(|_| ensure_column(columns, col::DEALSIZE_NUM));

        let non_negative = col::NON_NEGATIVE
            .iter()
            .filter_map(|name| table.column_index(name))
            .collect();

        let categorical = (0..table.columns().len())
            .map(|idx| {
                Some(idx) != date && table.column(idx).any(|c| matches!(c, Cell::Text(_)))
            })
            .collect();

        Self {
            quantity,
            price,
            date,
            deal_size,
            sales_out,
            calendar_out,
            deal_rank_out,
            non_negative,
            categorical,
        }
    }
}

/// Clean a raw table.
pub fn clean_table(table: &Table) -> CleanOutput {
    let mut columns = table.columns().to_vec();
    let layout = Layout::new(table, &mut columns);
    let table = &blank_unreadable(table, &layout);
    let mut plan = FillPlan::from_table(table);
    if let Some(sales) = layout.sales_out {
        // Always recomputed from quantity and price
        plan.exclude(sales);
    }

    let mut report = CleanReport {
        rows_read: table.len(),
        ..CleanReport::default()
    };
    let mut fill_counts = vec![0usize; table.columns().len()];
    let mut seen: HashSet<Vec<String>> = HashSet::new();
    let mut out = Table::new(columns.clone());

    for row in table.rows() {
        let filled: Row = row
            .iter()
            .enumerate()
            .map(|(idx, cell)| match plan.fill(idx, cell) {
                Some(value) => {
                    fill_counts[idx] += 1;
                    value
                }
                None => cell.clone(),
            })
            .collect();
        if has_negative_amount(&filled, &layout.non_negative) {
            report.negative_amounts_dropped += 1;
            continue;
        }

        let mut cleaned: Row = Vec::with_capacity(columns.len());
        for (idx, cell) in filled.into_iter().enumerate() {
            let cell = match cell {
                Cell::Text(s) if layout.categorical[idx] => {
                    Cell::Text(normalize(&columns[idx], &s))
                }
                other => other,
            };
            cleaned.push(cell);
        }
        cleaned.resize(columns.len(), Cell::Missing);

        if let Some(date_idx) = layout.date {
            match cleaned[date_idx].as_date() {
                Some(date) => cleaned[date_idx] = Cell::Date(date),
                None => {
                    report.invalid_dates_dropped += 1;
                    continue;
                }
            }
        }

        derive_columns(&mut cleaned, &layout);

        let key: Vec<String> = cleaned.iter().map(Cell::to_string).collect();
        if !seen.insert(key) {
            report.duplicates_removed += 1;
            continue;
        }
        out.push_row(cleaned);
    }

    report.rows_written = out.len();
    report.filled = table
        .columns()
        .iter()
        .zip(fill_counts)
        .filter(|(_, n)| *n > 0)
        .map(|(name, n)| (name.clone(), n))
        .collect();

    CleanOutput { table: out, report }
}

/// Categorical text that normalizes to a missing token becomes missing.
fn blank_unreadable(table: &Table, layout: &Layout) -> Table {
    let columns = table.columns();
    let rows = table
        .rows()
        .iter()
        .map(|row| {
            row.iter()
                .enumerate()
                .map(|(idx, cell)| match cell {
                    Cell::Text(s)
                        if layout.categorical[idx]
                            && is_missing_token(&normalize(&columns[idx], s)) =>
                    {
                        Cell::Missing
                    }
                    other => other.clone(),
                })
                .collect()
        })
        .collect();
    Table::from_rows(columns.to_vec(), rows)
}

/// An amount below zero, whether raw or filled.
fn has_negative_amount(row: &Row, columns: &[usize]) -> bool {
    columns
        .iter()
        .filter_map(|idx| row.get(*idx).and_then(Cell::as_f64))
        .any(|v| v < 0.0)
}

fn derive_columns(row: &mut Row, layout: &Layout) {
    if let (Some(out), Some(q), Some(p)) = (layout.sales_out, layout.quantity, layout.price) {
        row[out] = row[q].product(&row[p]);
    }

    if let (Some((day, month, year)), Some(date_idx)) = (layout.calendar_out, layout.date) {
        if let Some(date) = row[date_idx].as_date() {
            row[day] = Cell::Int(i64::from(date.day()));
            row[month] = Cell::Int(i64::from(date.month()));
            row[year] = Cell::Int(i64::from(date.year()));
        }
    }

    if let (Some(out), Some(deal_idx)) = (layout.deal_rank_out, layout.deal_size) {
        row[out] = row[deal_idx]
            .as_str()
            .and_then(DealSize::from_label)
            .map(|size| Cell::Int(size.rank()))
            .unwrap_or(Cell::Missing);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::parser::{parse_str, parse_utf8, table_to_bytes};

    const RAW: &str = "\
ORDERNUMBER,QUANTITYORDERED,PRICEEACH,SALES,ORDERDATE,STATUS,CUSTOMERNAME,PHONE,ADDRESSLINE2,STATE,COUNTRY,PRODUCTLINE,DEALSIZE
10107,30,95.7,2871,2/24/2003 0:00,Shipped,land of toys inc.,2125557818,,NY,usa,Motorcycles,Small
10107,30,95.7,2871,2/24/2003 0:00,Shipped,land of toys inc.,2125557818,,NY,usa,Motorcycles,Small
10121,34,81.35,9999,5/7/2003 0:00,,Reims Collectables,26.47.1555,Level 3,,France,motorcycles,Medium
10134,41,94.74,3884.34,not-a-date,Shipped,Lyon Souveniers,+33 1 46 62 7555,,,France,Motorcycles,Medium
10145,-5,83.26,-416.3,8/25/2003 0:00,Shipped,Toys4GrownUps.com,6265557265,,CA,USA,Motorcycles,Large
10159,49,,5205.27,10/10/2003 0:00,Shipped,Corporate Gift Ideas Co.,6505551386,,CA,USA,  classic cars ,
";

    fn cleaned() -> CleanOutput {
        clean_table(&parse_str(RAW, ',').unwrap())
    }

    #[test]
    fn test_rows_dropped_and_counted() {
        let out = cleaned();

        assert_eq!(out.report.rows_read, 6);
        assert_eq!(out.report.duplicates_removed, 1);
        assert_eq!(out.report.invalid_dates_dropped, 1);
        assert_eq!(out.report.negative_amounts_dropped, 1);
        assert_eq!(out.report.rows_written, 3);
        assert_eq!(out.table.len(), 3);
    }

    #[test]
    fn test_invariants_hold() {
        let out = cleaned();
        let t = &out.table;

        for row in 0..t.len() {
            for name in ["QUANTITYORDERED", "PRICEEACH", "SALES"] {
                let v = t.get(row, name).and_then(Cell::as_f64).unwrap();
                assert!(v >= 0.0, "{} negative in row {}", name, row);
            }
            assert!(matches!(t.get(row, "ORDERDATE"), Some(Cell::Date(_))));
        }
    }

    #[test]
    fn test_sales_recomputed_from_quantity_and_price() {
        let out = cleaned();
        // Raw SALES claimed 9999 for 34 × 81.35
        let sales = out.table.get(1, "SALES").and_then(Cell::as_f64).unwrap();
        assert!((sales - 34.0 * 81.35).abs() < 1e-9);
    }

    #[test]
    fn test_simple_sales_example() {
        let table = parse_str("QUANTITYORDERED,PRICEEACH\n10,5.0\n", ',').unwrap();
        let out = clean_table(&table);
        assert_eq!(out.table.get(0, "SALES"), Some(&Cell::Float(50.0)));
    }

    #[test]
    fn test_fill_policy() {
        let out = cleaned();
        let t = &out.table;

        assert_eq!(t.get(0, "ADDRESSLINE2"), Some(&Cell::text("")));
        assert_eq!(t.get(1, "STATE"), Some(&Cell::text("Unknown")));
        // Mode of STATUS is "Shipped"
        assert_eq!(t.get(1, "STATUS"), Some(&Cell::text("Shipped")));
        // Median of the five raw prices, dropped rows included
        assert_eq!(t.get(2, "PRICEEACH"), Some(&Cell::Float(94.74)));
        assert_eq!(out.report.filled.get("PRICEEACH"), Some(&1));
    }

    #[test]
    fn test_text_normalization() {
        let out = cleaned();
        let t = &out.table;

        assert_eq!(t.get(0, "CUSTOMERNAME"), Some(&Cell::text("Land Of Toys Inc.")));
        assert_eq!(t.get(0, "COUNTRY"), Some(&Cell::text("USA")));
        assert_eq!(t.get(1, "COUNTRY"), Some(&Cell::text("FRANCE")));
        assert_eq!(t.get(1, "PHONE"), Some(&Cell::text("26471555")));
        assert_eq!(t.get(2, "PRODUCTLINE"), Some(&Cell::text("Classic Cars")));
    }

    #[test]
    fn test_calendar_and_deal_rank() {
        let out = cleaned();
        let t = &out.table;

        assert_eq!(t.get(0, "DAY"), Some(&Cell::Int(24)));
        assert_eq!(t.get(0, "MONTH"), Some(&Cell::Int(2)));
        assert_eq!(t.get(0, "YEAR"), Some(&Cell::Int(2003)));
        assert_eq!(t.get(0, "DEALSIZE_NUM"), Some(&Cell::Int(1)));
        assert_eq!(t.get(1, "DEALSIZE_NUM"), Some(&Cell::Int(2)));
        // DEALSIZE mode-filled with "Small", which ties "Medium" but comes first
        assert_eq!(t.get(2, "DEALSIZE"), Some(&Cell::text("Small")));
        assert_eq!(t.get(2, "DEALSIZE_NUM"), Some(&Cell::Int(1)));
    }

    #[test]
    fn test_unknown_deal_size_has_no_rank() {
        let table = parse_str("DEALSIZE\nHuge\nSmall\n", ',').unwrap();
        let out = clean_table(&table);
        assert_eq!(out.table.get(0, "DEALSIZE_NUM"), Some(&Cell::Missing));
        assert_eq!(out.table.get(1, "DEALSIZE_NUM"), Some(&Cell::Int(1)));
    }

    #[test]
    fn test_negative_fill_is_dropped() {
        let csv = "QUANTITYORDERED,PRICEEACH\n-1,2.0\n-3,2.0\n,2.0\n";
        let out = clean_table(&parse_str(csv, ',').unwrap());

        // The median quantity is -2, so the filled row goes as well
        assert_eq!(out.report.negative_amounts_dropped, 3);
        assert!(out.table.is_empty());
    }

    #[test]
    fn test_non_negative_after_fill() {
        let csv = "QUANTITYORDERED,PRICEEACH\n-4,2.0\n6,2.0\n8,2.0\n,3.0\n";
        let out = clean_table(&parse_str(csv, ',').unwrap());

        assert_eq!(out.report.negative_amounts_dropped, 1);
        assert_eq!(out.table.len(), 3);
        assert_eq!(out.table.get(2, "QUANTITYORDERED"), Some(&Cell::Int(6)));
        for row in 0..out.table.len() {
            for name in ["QUANTITYORDERED", "SALES"] {
                let v = out.table.get(row, name).and_then(Cell::as_f64).unwrap();
                assert!(v >= 0.0, "{} negative in row {}", name, row);
            }
        }
    }

    #[test]
    fn test_derived_sales_is_never_filled() {
        let csv = "QUANTITYORDERED,PRICEEACH,SALES\n2,3.0,6.0\n4,1.0,\n";
        let out = clean_table(&parse_str(csv, ',').unwrap());

        assert_eq!(out.table.get(1, "SALES"), Some(&Cell::Float(4.0)));
        assert!(!out.report.filled.contains_key("SALES"));
    }

    #[test]
    fn test_underivable_sales_is_median_filled() {
        let csv = "ORDERNUMBER,SALES\n1,2.0\n2,\n3,4.0\n";
        let out = clean_table(&parse_str(csv, ',').unwrap());

        assert_eq!(out.table.get(1, "SALES"), Some(&Cell::Float(3.0)));
        assert_eq!(out.report.filled.get("SALES"), Some(&1));
    }

    #[test]
    fn test_duplicate_rows_collapse() {
        let csv = "ORDERNUMBER,CUSTOMERNAME\n1,Acme\n1,Acme\n";
        let out = clean_table(&parse_str(csv, ',').unwrap());
        assert_eq!(out.table.len(), 1);
        assert_eq!(out.report.duplicates_removed, 1);
    }

    #[test]
    fn test_cleaning_is_idempotent() {
        let first = table_to_bytes(&cleaned().table).unwrap();
        let second_pass = clean_table(&parse_utf8(&first).unwrap());
        let second = table_to_bytes(&second_pass.table).unwrap();

        assert_eq!(String::from_utf8(first).unwrap(), String::from_utf8(second).unwrap());
        assert_eq!(second_pass.report.duplicates_removed, 0);
        assert!(second_pass.report.filled.keys().all(|k| k == "ADDRESSLINE2"));
    }

    fn clean_twice(csv: &str) -> (String, String) {
        let first = table_to_bytes(&clean_table(&parse_str(csv, ',').unwrap()).table).unwrap();
        let second = table_to_bytes(&clean_table(&parse_utf8(&first).unwrap()).table).unwrap();
        (String::from_utf8(first).unwrap(), String::from_utf8(second).unwrap())
    }

    #[test]
    fn test_text_normalizing_to_missing_is_filled() {
        let (first, second) = clean_twice("ORDERNUMBER,STATUS\n1,none\n2,Shipped\n3,Shipped\n");
        assert!(first.contains("1,Shipped\n"), "{}", first);
        assert_eq!(first, second);

        let (first, second) = clean_twice("ORDERNUMBER,COUNTRY\n1,na\n2,France\n");
        assert!(first.contains("1,FRANCE\n"), "{}", first);
        assert_eq!(first, second);
    }

    #[test]
    fn test_phone_without_digits_is_filled() {
        let (first, second) =
            clean_twice("ORDERNUMBER,PHONE\n1,unknown\n2,555-1234\n3,555-1234\n");
        assert!(first.contains("1,5551234\n"), "{}", first);
        assert_eq!(first, second);
    }

    #[test]
    fn test_missing_columns_skip_derivations() {
        let table = parse_str("CUSTOMERNAME\nacme\n", ',').unwrap();
        let out = clean_table(&table);
        assert_eq!(out.table.columns(), ["CUSTOMERNAME"]);
        assert_eq!(out.table.get(0, "CUSTOMERNAME"), Some(&Cell::text("Acme")));
    }
}
