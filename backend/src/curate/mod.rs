//! Curator stage: transformed table → four grouped summary tables.
//!
//! Each summary is an independent group-by over the transformed rows.
//! Rows without a group key are left out of that summary.

use std::collections::HashSet;

use crate::error::{StageError, StageResult};
use crate::models::{
    col, CountrySummary, CuratedRow, CuratedTables, CustomerSummary, MonthlySummary,
    ProductSummary, Row, Table,
};
use crate::transform::group_by;

/// Resolve the columns a summary needs, failing on the first absent one.
fn require<T: CuratedRow, const N: usize>(table: &Table, names: [&str; N]) -> StageResult<[usize; N]> {
    let mut indices = [0; N];
    for (slot, name) in indices.iter_mut().zip(names) {
        *slot = table
            .column_index(name)
            .ok_or_else(|| StageError::missing_column(T::TABLE, name))?;
    }
    Ok(indices)
}

fn sum(rows: &[&Row], idx: usize) -> f64 {
    rows.iter().filter_map(|r| r[idx].as_f64()).sum()
}

fn mean(rows: &[&Row], idx: usize) -> Option<f64> {
    let values: Vec<f64> = rows.iter().filter_map(|r| r[idx].as_f64()).collect();
    (!values.is_empty()).then(|| values.iter().sum::<f64>() / values.len() as f64)
}

fn distinct(rows: &[&Row], idx: usize) -> u64 {
    rows.iter()
        .filter_map(|r| r[idx].key())
        .collect::<HashSet<_>>()
        .len() as u64
}

pub fn customer_summary(table: &Table) -> StageResult<Vec<CustomerSummary>> {
    let [customer, revenue, order, frequency] = require::<CustomerSummary, 4>(
        table,
        [col::CUSTOMERNAME, col::TOTALREVENUE, col::ORDERNUMBER, col::ORDER_FREQUENCY],
    )?;

    Ok(group_by(table.rows(), |r| r[customer].key())
        .into_iter()
        .map(|(customer_name, rows)| CustomerSummary {
            customer_name,
            lifetime_value: sum(&rows, revenue),
            avg_order_value: mean(&rows, revenue),
            total_orders: distinct(&rows, order),
            order_frequency: mean(&rows, frequency),
        })
        .collect())
}

pub fn product_summary(table: &Table) -> StageResult<Vec<ProductSummary>> {
    let [product, revenue, quantity, price] = require::<ProductSummary, 4>(
        table,
        [col::PRODUCTLINE, col::TOTALREVENUE, col::QUANTITYORDERED, col::PRICEEACH],
    )?;

    Ok(group_by(table.rows(), |r| r[product].key())
        .into_iter()
        .map(|(product_line, rows)| ProductSummary {
            product_line,
            total_revenue: sum(&rows, revenue),
            total_quantity: sum(&rows, quantity),
            avg_price: mean(&rows, price),
        })
        .collect())
}

/// Calendar key of a row; both parts must be present and in range.
fn year_month(row: &Row, year: usize, month: usize) -> Option<(i32, u32)> {
    let y = i32::try_from(row[year].as_i64()?).ok()?;
    let m = u32::try_from(row[month].as_i64()?).ok()?;
    Some((y, m))
}

pub fn monthly_summary(table: &Table) -> StageResult<Vec<MonthlySummary>> {
    let [year, month, revenue, order] = require::<MonthlySummary, 4>(
        table,
        [col::YEAR, col::MONTH, col::TOTALREVENUE, col::ORDERNUMBER],
    )?;

    Ok(group_by(table.rows(), |r| year_month(r, year, month))
        .into_iter()
        .map(|((year, month), rows)| MonthlySummary {
            year,
            month,
            monthly_revenue: sum(&rows, revenue),
            monthly_orders: distinct(&rows, order),
        })
        .collect())
}

pub fn country_summary(table: &Table) -> StageResult<Vec<CountrySummary>> {
    let [country, revenue, order] = require::<CountrySummary, 3>(
        table,
        [col::COUNTRY, col::TOTALREVENUE, col::ORDERNUMBER],
    )?;

    Ok(group_by(table.rows(), |r| r[country].key())
        .into_iter()
        .map(|(country, rows)| CountrySummary {
            country,
            total_revenue: sum(&rows, revenue),
            total_orders: distinct(&rows, order),
        })
        .collect())
}

/// Build all four summaries.
pub fn curate(table: &Table) -> StageResult<CuratedTables> {
    Ok(CuratedTables {
        customers: customer_summary(table)?,
        products: product_summary(table)?,
        monthly: monthly_summary(table)?,
        countries: country_summary(table)?,
    })
}
