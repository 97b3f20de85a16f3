#![allow(dead_code)]

use chrono::{Duration, NaiveDate};
use forecast_prep::data::{ColumnSpec, TimeSeriesTable};
use polars::prelude::*;

pub fn column_spec() -> ColumnSpec {
    ColumnSpec::new("date", &["sales"])
        .with_id_columns(&["region"])
        .with_control_columns(&["promo"])
}

/// Daily rows for each `(region, length)`, grouped by region.
///
/// `sales` is `region_index * 1000 + day`, `promo` alternates 0/1.
pub fn daily_frame(entities: &[(&str, usize)]) -> DataFrame {
    let start = NaiveDate::from_ymd_opt(2023, 1, 1).unwrap();
    let mut dates = Vec::new();
    let mut regions = Vec::new();
    let mut sales = Vec::new();
    let mut promo = Vec::new();

    for (idx, (region, len)) in entities.iter().enumerate() {
        for day in 0..*len {
            dates.push((start + Duration::days(day as i64)).format("%Y-%m-%d").to_string());
            regions.push(region.to_string());
            sales.push(idx as f64 * 1000.0 + day as f64);
            promo.push((day % 2) as f64);
        }
    }

    df!(
        "date" => dates,
        "region" => regions,
        "sales" => sales,
        "promo" => promo
    )
    .unwrap()
}

pub fn daily_table(entities: &[(&str, usize)]) -> TimeSeriesTable {
    TimeSeriesTable::from_dataframe(daily_frame(entities), column_spec()).unwrap()
}

pub fn sales(table: &TimeSeriesTable) -> Vec<f64> {
    table.column_f64("sales").unwrap().into_iter().flatten().collect()
}

pub fn regions(table: &TimeSeriesTable) -> Vec<String> {
    table
        .column_strings("region")
        .unwrap()
        .into_iter()
        .flatten()
        .collect()
}
