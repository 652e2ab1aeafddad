//! Reporter stage: curated tables → KPI figures, rankings and trend.
//!
//! ```text
//! data/curated/*.csv ──▶ read_curated ──▶ build_report ──▶ write_report ──▶ reports/
//!                                                           ├─ kpi_summary.csv
//!                                                           ├─ top_customers.csv
//!                                                           ├─ top_products.csv
//!                                                           ├─ monthly_trend.csv
//!                                                           └─ report.json
//! ```

use chrono::{DateTime, Utc};
use serde::Serialize;
use std::fs;
use std::path::{Path, PathBuf};
use uuid::Uuid;

use crate::error::PipelineResult;
use crate::models::{
    CountrySummary, CuratedRow, CuratedTables, CustomerSummary, Kpis, MonthlySummary,
    MonthlyTrendPoint, ProductSummary,
};
use crate::parser::{read_rows_file, write_rows_file};

pub const TOP_CUSTOMERS_FILE: &str = "top_customers.csv";
pub const TOP_PRODUCTS_FILE: &str = "top_products.csv";
pub const REPORT_JSON_FILE: &str = "report.json";

/// Everything one reporter run produces.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Report {
    pub run_id: Uuid,
    pub generated_at: DateTime<Utc>,
    pub kpis: Kpis,
    pub top_customers: Vec<CustomerSummary>,
    pub top_products: Vec<ProductSummary>,
    pub monthly_trend: Vec<MonthlyTrendPoint>,
    pub countries: Vec<CountrySummary>,
}

fn round2(value: f64) -> f64 {
    (value * 100.0).round() / 100.0
}

/// Headline figures: revenue from the product table, orders from the
/// monthly table.
pub fn compute_kpis(products: &[ProductSummary], monthly: &[MonthlySummary]) -> Kpis {
    let total_revenue: f64 = products.iter().map(|p| p.total_revenue).sum();
    let total_orders: u64 = monthly.iter().map(|m| m.monthly_orders).sum();
    let average_order_value = if total_orders == 0 {
        0.0
    } else {
        round2(total_revenue / total_orders as f64)
    };

    Kpis {
        total_revenue,
        total_orders,
        average_order_value,
    }
}

/// The `n` largest entries by `score`, descending; ties keep input order.
pub fn top_n<T: Clone>(rows: &[T], n: usize, score: impl Fn(&T) -> f64) -> Vec<T> {
    let mut ranked = rows.to_vec();
    ranked.sort_by(|a, b| score(b).total_cmp(&score(a)));
    ranked.truncate(n);
    ranked
}

pub fn monthly_trend(monthly: &[MonthlySummary]) -> Vec<MonthlyTrendPoint> {
    let mut months: Vec<&MonthlySummary> = monthly.iter().collect();
    months.sort_by_key(|m| (m.year, m.month));
    months
        .into_iter()
        .map(|m| MonthlyTrendPoint {
            year_month: m.year_month(),
            monthly_revenue: m.monthly_revenue,
        })
        .collect()
}

pub fn build_report(curated: &CuratedTables, top: usize) -> Report {
    Report {
        run_id: Uuid::new_v4(),
        generated_at: Utc::now(),
        kpis: compute_kpis(&curated.products, &curated.monthly),
        top_customers: top_n(&curated.customers, top, |c| c.lifetime_value),
        top_products: top_n(&curated.products, top, |p| p.total_revenue),
        monthly_trend: monthly_trend(&curated.monthly),
        countries: curated.countries.clone(),
    }
}

/// Path of the CSV holding table `T` inside `dir`.
pub fn table_file<T: CuratedRow>(dir: &Path) -> PathBuf {
    dir.join(format!("{}.csv", T::TABLE))
}

pub fn write_curated(curated: &CuratedTables, dir: &Path) -> PipelineResult<Vec<PathBuf>> {
    let paths = vec![
        table_file::<CustomerSummary>(dir),
        table_file::<ProductSummary>(dir),
        table_file::<MonthlySummary>(dir),
        table_file::<CountrySummary>(dir),
    ];
    write_rows_file(&curated.customers, &paths[0])?;
    write_rows_file(&curated.products, &paths[1])?;
    write_rows_file(&curated.monthly, &paths[2])?;
    write_rows_file(&curated.countries, &paths[3])?;
    Ok(paths)
}

/// Load the four curated tables. Every one must exist with all its columns.
pub fn read_curated(dir: &Path) -> PipelineResult<CuratedTables> {
    Ok(CuratedTables {
        customers: read_rows_file(table_file::<CustomerSummary>(dir))?,
        products: read_rows_file(table_file::<ProductSummary>(dir))?,
        monthly: read_rows_file(table_file::<MonthlySummary>(dir))?,
        countries: read_rows_file(table_file::<CountrySummary>(dir))?,
    })
}

/// Write the report files into `dir`, returning their paths.
pub fn write_report(report: &Report, dir: &Path) -> PipelineResult<Vec<PathBuf>> {
    let kpi_path = table_file::<Kpis>(dir);
    let trend_path = table_file::<MonthlyTrendPoint>(dir);
    let customers_path = dir.join(TOP_CUSTOMERS_FILE);
    let products_path = dir.join(TOP_PRODUCTS_FILE);
    let json_path = dir.join(REPORT_JSON_FILE);

    write_rows_file(std::slice::from_ref(&report.kpis), &kpi_path)?;
    write_rows_file(&report.top_customers, &customers_path)?;
    write_rows_file(&report.top_products, &products_path)?;
    write_rows_file(&report.monthly_trend, &trend_path)?;
    fs::write(&json_path, serde_json::to_string_pretty(report)?)?;

    Ok(vec![kpi_path, customers_path, products_path, trend_path, json_path])
}
