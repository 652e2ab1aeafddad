//! Curated summary rows and report figures.
//!
//! Field names serialize to the exact column names the reporter reads,
//! so these structs double as the CSV schema of each curated table.

use serde::{Deserialize, Serialize};

/// A row type stored in its own curated CSV table.
pub trait CuratedRow {
    /// Table name, used in error messages and as the file stem.
    const TABLE: &'static str;
    /// Columns in output order; every one is required on read.
    const COLUMNS: &'static [&'static str];
}

/// Per-customer totals.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CustomerSummary {
    #[serde(rename = "CUSTOMERNAME")]
    pub customer_name: String,
    #[serde(rename = "LifetimeValue")]
    pub lifetime_value: f64,
    #[serde(rename = "AvgOrderValue")]
    pub avg_order_value: Option<f64>,
    #[serde(rename = "TotalOrders")]
    pub total_orders: u64,
    #[serde(rename = "OrderFrequency")]
    pub order_frequency: Option<f64>,
}

impl CuratedRow for CustomerSummary {
    const TABLE: &'static str = "customer_summary";
    const COLUMNS: &'static [&'static str] = &[
        "CUSTOMERNAME",
        "LifetimeValue",
        "AvgOrderValue",
        "TotalOrders",
        "OrderFrequency",
    ];
}

/// Per-product-line totals.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ProductSummary {
    #[serde(rename = "PRODUCTLINE")]
    pub product_line: String,
    #[serde(rename = "TotalRevenue")]
    pub total_revenue: f64,
    #[serde(rename = "TotalQuantity")]
    pub total_quantity: f64,
    #[serde(rename = "AvgPrice")]
    pub avg_price: Option<f64>,
}

impl CuratedRow for ProductSummary {
    const TABLE: &'static str = "product_summary";
    const COLUMNS: &'static [&'static str] =
        &["PRODUCTLINE", "TotalRevenue", "TotalQuantity", "AvgPrice"];
}

/// Per-calendar-month totals.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MonthlySummary {
    #[serde(rename = "YEAR")]
    pub year: i32,
    #[serde(rename = "MONTH")]
    pub month: u32,
    #[serde(rename = "MonthlyRevenue")]
    pub monthly_revenue: f64,
    #[serde(rename = "MonthlyOrders")]
    pub monthly_orders: u64,
}

impl CuratedRow for MonthlySummary {
    const TABLE: &'static str = "monthly_summary";
    const COLUMNS: &'static [&'static str] = &["YEAR", "MONTH", "MonthlyRevenue", "MonthlyOrders"];
}

impl MonthlySummary {
    /// `YYYY-MM` label of this month.
    pub fn year_month(&self) -> String {
        format!("{}-{:02}", self.year, self.month)
    }
}

/// Per-country totals.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CountrySummary {
    #[serde(rename = "COUNTRY")]
    pub country: String,
    #[serde(rename = "TotalRevenue")]
    pub total_revenue: f64,
    #[serde(rename = "TotalOrders")]
    pub total_orders: u64,
}

impl CuratedRow for CountrySummary {
    const TABLE: &'static str = "country_summary";
    const COLUMNS: &'static [&'static str] = &["COUNTRY", "TotalRevenue", "TotalOrders"];
}

/// The four curated tables, each independent of the others.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct CuratedTables {
    pub customers: Vec<CustomerSummary>,
    pub products: Vec<ProductSummary>,
    pub monthly: Vec<MonthlySummary>,
    pub countries: Vec<CountrySummary>,
}

/// Headline KPI figures.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Kpis {
    #[serde(rename = "TotalRevenue")]
    pub total_revenue: f64,
    #[serde(rename = "TotalOrders")]
    pub total_orders: u64,
    #[serde(rename = "AverageOrderValue")]
    pub average_order_value: f64,
}

impl CuratedRow for Kpis {
    const TABLE: &'static str = "kpi_summary";
    const COLUMNS: &'static [&'static str] = &["TotalRevenue", "TotalOrders", "AverageOrderValue"];
}

/// One point of the monthly revenue trend.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MonthlyTrendPoint {
    #[serde(rename = "YearMonth")]
    pub year_month: String,
    #[serde(rename = "MonthlyRevenue")]
    pub monthly_revenue: f64,
}

impl CuratedRow for MonthlyTrendPoint {
    const TABLE: &'static str = "monthly_trend";
    const COLUMNS: &'static [&'static str] = &["YearMonth", "MonthlyRevenue"];
}
