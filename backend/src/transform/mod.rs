//! Transformer stage: cleaned table → table enriched with derived columns.
//!
//! Revenue and calendar columns are re-derived per record, then customer
//! aggregates are computed and joined back onto every record by name.
//! Row count is preserved apart from records whose date is still bad.

pub mod grouper;

pub use grouper::{customer_profiles, days_between, group_by, left_join, CustomerProfile, ProfileColumns};

use chrono::Datelike;

use crate::logs::log_warning;
use crate::models::{col, ensure_column, Cell, Row, Table};

/// What the transformer did to its input.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct TransformReport {
    pub rows_read: usize,
    pub rows_written: usize,
    pub invalid_dates_dropped: usize,
    pub customers: usize,
    /// Derived steps skipped because an input column is absent
    pub skipped_steps: Vec<String>,
}

impl TransformReport {
    pub fn summary(&self) -> String {
        format!(
            "Transformed: {} → {} rows, {} customers, {} skipped steps",
            self.rows_read,
            self.rows_written,
            self.customers,
            self.skipped_steps.len()
        )
    }

    fn skip(&mut self, step: &str, column: &str) {
        log_warning(format!("Skipping {}: column {} is missing", step, column));
        self.skipped_steps.push(step.to_string());
    }
}

/// Enriched table with its report.
#[derive(Debug, Clone)]
pub struct TransformOutput {
    pub table: Table,
    pub report: TransformReport,
}

/// Output positions of the customer columns.
#[derive(Default)]
struct CustomerOutputs {
    days_since: Option<usize>,
    lifetime: Option<usize>,
    avg_order: Option<usize>,
    total_orders: Option<usize>,
    frequency: Option<usize>,
}

/// Enrich a cleaned table.
pub fn transform_table(table: &Table) -> TransformOutput {
    let mut report = TransformReport {
        rows_read: table.len(),
        ..TransformReport::default()
    };
    let mut columns = table.columns().to_vec();

    let quantity = table.column_index(col::QUANTITYORDERED);
    let price = table.column_index(col::PRICEEACH);
    let date = table.column_index(col::ORDERDATE);
    let customer = table.column_index(col::CUSTOMERNAME);
    let order = table.column_index(col::ORDERNUMBER);
    let sales = match (quantity, price) {
        (Some(_), Some(_)) => Some(ensure_column(&mut columns, col::SALES)),
        _ => table.column_index(col::SALES),
    };

    let revenue = sales.map(|_| ensure_column(&mut columns, col::TOTALREVENUE));
    if revenue.is_none() {
        report.skip("revenue", col::SALES);
    }
    let calendar = date.map(|_| {
        (
            ensure_column(&mut columns, col::DAY),
            ensure_column(&mut columns, col::MONTH),
            ensure_column(&mut columns, col::YEAR),
        )
    });
    if date.is_none() {
        report.skip("calendar and recency", col::ORDERDATE);
    }

    let mut outputs = CustomerOutputs::default();
    if customer.is_some() {
        outputs.days_since = date.map(|_| ensure_column(&mut columns, col::DAYS_SINCE_LAST_ORDER));
    }
    let order_month = date.map(|_| ensure_column(&mut columns, col::ORDER_MONTH));
    match customer {
        Some(_) => {
            if revenue.is_some() {
                outputs.lifetime = Some(ensure_column(&mut columns, col::LIFETIME_VALUE));
                outputs.avg_order = Some(ensure_column(&mut columns, col::AVG_ORDER_VALUE));
            }
            match order {
                Some(_) => {
                    outputs.total_orders = Some(ensure_column(&mut columns, col::TOTAL_ORDERS))
                }
                None => report.skip("total orders", col::ORDERNUMBER),
            }
            if date.is_some() {
                outputs.frequency = Some(ensure_column(&mut columns, col::ORDER_FREQUENCY));
            }
        }
        None => report.skip("customer aggregates", col::CUSTOMERNAME),
    }

    // Steps 1-2: per-record revenue and calendar columns
    let mut rows: Vec<Row> = Vec::with_capacity(table.len());
    for source in table.rows() {
        let mut row = source.clone();
        row.resize(columns.len(), Cell::Missing);

        if let Some(date_idx) = date {
            match row[date_idx].as_date() {
                Some(d) => row[date_idx] = Cell::Date(d),
                None => {
                    report.invalid_dates_dropped += 1;
                    continue;
                }
            }
        }

        if let (Some(out), Some(q), Some(p)) = (sales, quantity, price) {
            row[out] = row[q].product(&row[p]);
        }
        if let (Some(out), Some(s)) = (revenue, sales) {
            row[out] = row[s].clone();
        }
        if let (Some((day, month, year)), Some(d)) = (calendar, date.and_then(|i| row[i].as_date())) {
            row[day] = Cell::Int(i64::from(d.day()));
            row[month] = Cell::Int(i64::from(d.month()));
            row[year] = Cell::Int(i64::from(d.year()));
        }
        if let (Some(out), Some(d)) = (order_month, date.and_then(|i| row[i].as_date())) {
            row[out] = Cell::text(d.format("%Y-%m").to_string());
        }

        rows.push(row);
    }

    // Steps 3-6: customer aggregates, joined back by name
    if let Some(customer_idx) = customer {
        let cols = ProfileColumns { revenue, order, date };
        let profiles = customer_profiles(&rows, customer_idx, cols);
        report.customers = profiles.len();

        rows = left_join(&rows, |r| r[customer_idx].key(), &profiles)
            .into_iter()
            .map(|(row, profile)| enrich(row, profile, date, &outputs))
            .collect();
    }

    report.rows_written = rows.len();
    TransformOutput {
        table: Table::from_rows(columns, rows),
        report,
    }
}

fn enrich(
    row: &Row,
    profile: Option<&CustomerProfile>,
    date: Option<usize>,
    outputs: &CustomerOutputs,
) -> Row {
    let mut out = row.clone();
    let mut set = |idx: Option<usize>, value: Cell| {
        if let Some(i) = idx {
            out[i] = value;
        }
    };

    let Some(profile) = profile else {
        for idx in [
            outputs.days_since,
            outputs.lifetime,
            outputs.avg_order,
            outputs.total_orders,
            outputs.frequency,
        ] {
            set(idx, Cell::Missing);
        }
        return out;
    };

    let record_date = date.and_then(|i| row[i].as_date());
    let days = match (profile.last_order, record_date) {
        (Some(latest), Some(d)) => Cell::Int(days_between(latest, d)),
        _ => Cell::Missing,
    };
    set(outputs.days_since, days);
    set(outputs.lifetime, Cell::Float(profile.lifetime_value));
    set(outputs.avg_order, Cell::from_f64(profile.avg_order_value));
    set(outputs.total_orders, Cell::Int(profile.total_orders as i64));
    set(outputs.frequency, Cell::from_f64(profile.order_frequency));
    out
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::parser::parse_str;

    const CLEANED: &str = "\
ORDERNUMBER,QUANTITYORDERED,PRICEEACH,SALES,ORDERDATE,CUSTOMERNAME,PRODUCTLINE
1,1,10.0,999.0,2024-01-05,Acme,Classic Cars
2,2,10.0,20.0,2024-02-10,Acme,Classic Cars
3,3,10.0,30.0,2024-02-20,Acme,Motorcycles
4,4,2.5,10.0,2024-03-01,Bolt,Motorcycles
";

    fn transformed() -> TransformOutput {
        transform_table(&parse_str(CLEANED, ',').unwrap())
    }

    fn ints(table: &Table, name: &str) -> Vec<i64> {
        (0..table.len())
            .map(|r| table.get(r, name).and_then(Cell::as_i64).unwrap())
            .collect()
    }

    #[test]
    fn test_days_since_last_order() {
        let out = transformed();
        assert_eq!(ints(&out.table, "DaysSinceLastOrder"), [46, 10, 0, 0]);
    }

    #[test]
    fn test_order_frequency_example() {
        let out = transformed();
        assert_eq!(out.table.get(0, "OrderFrequency"), Some(&Cell::Float(1.5)));
        assert_eq!(out.table.get(3, "OrderFrequency"), Some(&Cell::Float(1.0)));
    }

    #[test]
    fn test_sales_always_quantity_times_price() {
        let out = transformed();
        let t = &out.table;
        for r in 0..t.len() {
            let q = t.get(r, "QUANTITYORDERED").and_then(Cell::as_f64).unwrap();
            let p = t.get(r, "PRICEEACH").and_then(Cell::as_f64).unwrap();
            assert_eq!(t.get(r, "SALES").and_then(Cell::as_f64), Some(q * p));
            assert_eq!(t.get(r, "TOTALREVENUE"), t.get(r, "SALES"));
        }
    }

    #[test]
    fn test_aggregates_broadcast_per_customer() {
        let out = transformed();
        let t = &out.table;
        for name in ["LifetimeValue", "AvgOrderValue", "TotalOrders", "OrderFrequency"] {
            assert_eq!(t.get(0, name), t.get(1, name));
            assert_eq!(t.get(1, name), t.get(2, name));
        }
        assert_eq!(t.get(0, "LifetimeValue"), Some(&Cell::Float(60.0)));
        assert_eq!(t.get(0, "AvgOrderValue"), Some(&Cell::Float(20.0)));
        assert_eq!(t.get(0, "TotalOrders"), Some(&Cell::Int(3)));
        assert_eq!(t.get(3, "LifetimeValue"), Some(&Cell::Float(10.0)));
        assert_eq!(out.report.customers, 2);
    }

    #[test]
    fn test_output_columns_and_calendar() {
        let out = transformed();
        assert_eq!(
            out.table.columns(),
            [
                "ORDERNUMBER",
                "QUANTITYORDERED",
                "PRICEEACH",
                "SALES",
                "ORDERDATE",
                "CUSTOMERNAME",
                "PRODUCTLINE",
                "TOTALREVENUE",
                "DAY",
                "MONTH",
                "YEAR",
                "DaysSinceLastOrder",
                "OrderMonth",
                "LifetimeValue",
                "AvgOrderValue",
                "TotalOrders",
                "OrderFrequency",
            ]
        );
        assert_eq!(out.table.get(1, "OrderMonth"), Some(&Cell::text("2024-02")));
        assert_eq!(ints(&out.table, "MONTH"), [1, 2, 2, 3]);
    }

    #[test]
    fn test_transform_is_idempotent() {
        let once = transformed().table;
        let twice = transform_table(&once).table;
        assert_eq!(once, twice);
    }

    #[test]
    fn test_bad_dates_dropped_defensively() {
        let csv = "ORDERDATE,CUSTOMERNAME\n2024-01-01,Acme\nsoon,Acme\n";
        let out = transform_table(&parse_str(csv, ',').unwrap());
        assert_eq!(out.report.invalid_dates_dropped, 1);
        assert_eq!(out.table.len(), 1);
    }

    #[test]
    fn test_missing_customer_column_skips_aggregates() {
        let csv = "QUANTITYORDERED,PRICEEACH\n2,3.0\n";
        let out = transform_table(&parse_str(csv, ',').unwrap());

        assert!(!out.table.has_column("LifetimeValue"));
        assert_eq!(out.table.get(0, "TOTALREVENUE"), Some(&Cell::Float(6.0)));
        assert!(out.report.skipped_steps.contains(&"customer aggregates".to_string()));
    }

    #[test]
    fn test_missing_customer_name_gets_missing_aggregates() {
        let csv = "ORDERNUMBER,SALES,ORDERDATE,CUSTOMERNAME\n1,5.0,2024-01-01,\n2,7.0,2024-01-02,Acme\n";
        let out = transform_table(&parse_str(csv, ',').unwrap());

        assert_eq!(out.table.get(0, "LifetimeValue"), Some(&Cell::Missing));
        assert_eq!(out.table.get(0, "DaysSinceLastOrder"), Some(&Cell::Missing));
        assert_eq!(out.table.get(1, "LifetimeValue"), Some(&Cell::Float(7.0)));
    }

    #[test]
    fn test_records_without_order_number_still_count() {
        let csv = "SALES,ORDERDATE,CUSTOMERNAME\n5.0,2024-01-01,Acme\n7.0,2024-01-15,Acme\n1.0,2024-02-01,Acme\n";
        let out = transform_table(&parse_str(csv, ',').unwrap());

        assert!(!out.table.has_column("TotalOrders"));
        assert!(out.report.skipped_steps.contains(&"total orders".to_string()));
        for row in 0..out.table.len() {
            // Two records in January, one in February
            assert_eq!(out.table.get(row, "OrderFrequency"), Some(&Cell::Float(1.5)));
            assert_eq!(out.table.get(row, "LifetimeValue"), Some(&Cell::Float(13.0)));
        }
    }
}
