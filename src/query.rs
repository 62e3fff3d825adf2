use crate::record::{Money, SalesRecord};
use chrono::NaiveDate;
use std::collections::HashMap;

/// Read-only queries over a fixed slice of sales records
///
/// Every query is pure and repeatable. An empty slice yields zero or empty
/// results, never an error.
#[derive(Debug, Clone, Copy)]
pub struct SalesQuery<'a> {
    records: &'a [SalesRecord],
}

impl<'a> SalesQuery<'a> {
    /// Query over `records`
    pub fn new(records: &'a [SalesRecord]) -> Self {
        Self { records }
    }

    /// Get the underlying records
    pub fn records(&self) -> &'a [SalesRecord] {
        self.records
    }

    /// Sum of amount × quantity over all records
    pub fn total_revenue(&self) -> Money {
        self.records.iter().map(SalesRecord::total_value).sum()
    }

    /// Revenue per category
    pub fn revenue_by_category(&self) -> HashMap<String, Money> {
        self.sum_by(|r| &r.category).into_iter().collect()
    }

    /// Revenue per region
    pub fn revenue_by_region(&self) -> HashMap<String, Money> {
        self.sum_by(|r| &r.region).into_iter().collect()
    }

    /// Number of sales per region
    pub fn count_by_region(&self) -> HashMap<String, usize> {
        self.count_by(|r| &r.region)
    }

    /// Number of sales per category
    pub fn count_by_category(&self) -> HashMap<String, usize> {
        self.count_by(|r| &r.category)
    }

    /// The `n` products with the highest revenue, best first
    pub fn top_products(&self, n: usize) -> Vec<(String, Money)> {
        top_n(self.sum_by(|r| &r.product_name), n)
    }

    /// The `n` sales reps with the highest revenue, best first
    pub fn top_reps(&self, n: usize) -> Vec<(String, Money)> {
        top_n(self.sum_by(|r| &r.sales_rep), n)
    }

    /// Records whose sale date lies in `start..=end`
    pub fn in_date_range(&self, start: NaiveDate, end: NaiveDate) -> Vec<&'a SalesRecord> {
        self.records
            .iter()
            .filter(|r| r.sale_date >= start && r.sale_date <= end)
            .collect()
    }

    /// Revenue per key, in order of first appearance
    fn sum_by<F>(&self, key: F) -> Vec<(String, Money)>
    where
        F: Fn(&SalesRecord) -> &String,
    {
        let mut slots: HashMap<&str, usize> = HashMap::new();
        let mut sums: Vec<(String, Money)> = Vec::new();

        for record in self.records {
            let k = key(record);
            let slot = *slots.entry(k.as_str()).or_insert_with(|| {
                sums.push((k.clone(), Money::ZERO));
                sums.len() - 1
            });
            sums[slot].1 = sums[slot].1 + record.total_value();
        }
        sums
    }

    fn count_by<F>(&self, key: F) -> HashMap<String, usize>
    where
        F: Fn(&SalesRecord) -> &String,
    {
        let mut counts = HashMap::new();
        for record in self.records {
            *counts.entry(key(record).clone()).or_insert(0) += 1;
        }
        counts
    }
}

/// Highest totals first; equal totals keep their first-appearance order
fn top_n(mut totals: Vec<(String, Money)>, n: usize) -> Vec<(String, Money)> {
    totals.sort_by(|a, b| b.1.cmp(&a.1));
    totals.truncate(n);
    totals
}
