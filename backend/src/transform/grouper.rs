//! Group records by key, reduce each group, and join the result back.
//!
//! # Customer profiles
//!
//! ```text
//! Sales records (flat rows)            →  Customer profiles
//! ┌──────────────────────────────┐       ┌──────────────────────────┐
//! │ Acme, #1, 2024-01-05, 10.0   │       │ Acme                     │
//! │ Acme, #2, 2024-02-10, 20.0   │  →    │ Lifetime 60.0, 3 orders  │
//! │ Acme, #3, 2024-02-20, 30.0   │       │ Last order 2024-02-20    │
//! │ Bolt, #4, 2024-03-01, 5.0    │       ├──────────────────────────┤
//! └──────────────────────────────┘       │ Bolt ...                 │
//!                                        └──────────────────────────┘
//! ```
//!
//! Customers are keyed by display name alone; two customers sharing a name
//! are merged into one profile.

use chrono::{Datelike, NaiveDateTime};
use std::collections::{BTreeMap, HashMap, HashSet};
use std::hash::Hash;

use crate::models::{Cell, Row};

/// Group rows by `key`, skipping rows without one. Groups come out in key order.
pub fn group_by<'a, K, F>(rows: &'a [Row], key: F) -> BTreeMap<K, Vec<&'a Row>>
where
    K: Ord,
    F: Fn(&Row) -> Option<K>,
{
    let mut groups: BTreeMap<K, Vec<&'a Row>> = BTreeMap::new();
    for row in rows {
        if let Some(k) = key(row) {
            groups.entry(k).or_default().push(row);
        }
    }
    groups
}

/// Pair every row with the right-hand value for its key (left outer join).
pub fn left_join<'a, 'b, K, V, F>(
    rows: &'a [Row],
    key: F,
    right: &'b HashMap<K, V>,
) -> Vec<(&'a Row, Option<&'b V>)>
where
    K: Eq + Hash,
    F: Fn(&Row) -> Option<K>,
{
    rows.iter()
        .map(|row| (row, key(row).and_then(|k| right.get(&k))))
        .collect()
}

/// Whole days from `date` to `latest`, floored.
pub fn days_between(latest: NaiveDateTime, date: NaiveDateTime) -> i64 {
    (latest - date).num_days()
}

/// Aggregates of one customer, joined onto each of their records.
#[derive(Debug, Clone, PartialEq)]
pub struct CustomerProfile {
    pub lifetime_value: f64,
    /// Mean revenue per record, not per order
    pub avg_order_value: Option<f64>,
    pub total_orders: usize,
    pub order_frequency: Option<f64>,
    pub last_order: Option<NaiveDateTime>,
}

/// Column positions a profile is built from.
#[derive(Debug, Clone, Copy, Default)]
pub struct ProfileColumns {
    pub revenue: Option<usize>,
    pub order: Option<usize>,
    pub date: Option<usize>,
}

/// Accumulates one customer's records.
#[derive(Default)]
struct ProfileBuilder {
    revenue_sum: f64,
    revenue_count: usize,
    orders: HashSet<String>,
    last_order: Option<NaiveDateTime>,
    monthly_orders: BTreeMap<(i32, u32), HashSet<String>>,
}

impl ProfileBuilder {
    fn add(&mut self, position: usize, row: &Row, cols: ProfileColumns) {
        let cell = |idx: Option<usize>| idx.and_then(|i| row.get(i));

        if let Some(revenue) = cell(cols.revenue).and_then(Cell::as_f64) {
            self.revenue_sum += revenue;
            self.revenue_count += 1;
        }

        let order_key = cell(cols.order).and_then(Cell::key);
        if let Some(ref key) = order_key {
            self.orders.insert(key.clone());
        }

        if let Some(date) = cell(cols.date).and_then(Cell::as_date) {
            self.last_order = Some(self.last_order.map_or(date, |d| d.max(date)));
            // Records without an order number count as orders of their own
            self.monthly_orders
                .entry((date.year(), date.month()))
                .or_default()
                .insert(order_key.unwrap_or_else(|| format!("#record-{}", position)));
        }
    }

    fn build(self, cols: ProfileColumns) -> CustomerProfile {
        let order_frequency = match (cols.date, self.monthly_orders.is_empty()) {
            (Some(_), false) => {
                let orders: usize = self.monthly_orders.values().map(HashSet::len).sum();
                Some(orders as f64 / self.monthly_orders.len() as f64)
            }
            _ => None,
        };

        CustomerProfile {
            lifetime_value: self.revenue_sum,
            avg_order_value: (self.revenue_count > 0)
                .then(|| self.revenue_sum / self.revenue_count as f64),
            total_orders: self.orders.len(),
            order_frequency,
            last_order: self.last_order,
        }
    }
}

/// Build one profile per customer name.
pub fn customer_profiles(
    rows: &[Row],
    customer: usize,
    cols: ProfileColumns,
) -> HashMap<String, CustomerProfile> {
    let mut builders: HashMap<String, ProfileBuilder> = HashMap::new();

    for (position, row) in rows.iter().enumerate() {
        if let Some(name) = row.get(customer).and_then(Cell::key) {
            builders.entry(name).or_default().add(position, row, cols);
        }
    }

    builders
        .into_iter()
        .map(|(name, builder)| (name, builder.build(cols)))
        .collect()
}
