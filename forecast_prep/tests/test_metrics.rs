use approx::assert_relative_eq;
use forecast_prep::collaborators::Forecast;
use forecast_prep::data::EntityKey;
use forecast_prep::error::ForecastError;
use forecast_prep::metrics::{compute_metrics, ForecastResult};
use forecast_prep::windows::ForecastWindow;

fn dense(rows: &[&[f64]]) -> Vec<Vec<Option<f64>>> {
    rows.iter()
        .map(|row| row.iter().map(|&v| Some(v)).collect())
        .collect()
}

#[test]
fn longer_actual_is_truncated_to_prediction_horizon() {
    let actual = dense(&[&[1.0, 2.0, 3.0], &[4.0, 5.0, 6.0]]);
    let predicted = vec![vec![1.0, 2.0], vec![4.0, 6.0]];

    let report = compute_metrics(&actual, &predicted, "truncated").unwrap();

    assert_eq!(report.label(), "truncated");
    assert_relative_eq!(report.mean_squared_error(), 0.25);
    assert_relative_eq!(report.root_mean_squared_error(), 0.5);
    assert_relative_eq!(report.mean_absolute_error(), 0.25);
    assert_eq!(report.rows_scored(), 2);
}

#[test]
fn row_with_missing_actual_is_excluded() {
    let actual = vec![
        vec![Some(1.0), Some(2.0)],
        vec![None, None],
        vec![Some(3.0), Some(5.0)],
    ];
    let predicted = vec![vec![2.0, 2.0], vec![100.0, 100.0], vec![3.0, 3.0]];

    let report = compute_metrics(&actual, &predicted, "masked").unwrap();

    // Remaining errors: [1, 0, 0, 2]
    assert_eq!(report.rows_scored(), 2);
    assert_eq!(report.rows_masked(), 1);
    assert_relative_eq!(report.mean_squared_error(), 5.0 / 4.0);
    assert_relative_eq!(report.mean_absolute_error(), 3.0 / 4.0);
}

#[test]
fn partially_missing_row_is_excluded_too() {
    let actual = vec![vec![Some(1.0), None], vec![Some(2.0), Some(2.0)]];
    let predicted = vec![vec![1.0, 1.0], vec![2.0, 3.0]];

    let report = compute_metrics(&actual, &predicted, "partial").unwrap();

    assert_eq!(report.rows_masked(), 1);
    assert_relative_eq!(report.mean_squared_error(), 0.5);
}

#[test]
fn all_rows_missing_is_empty_mask() {
    let actual = vec![vec![None, Some(1.0)], vec![Some(2.0), None]];
    let predicted = vec![vec![1.0, 1.0], vec![2.0, 2.0]];

    let result = compute_metrics(&actual, &predicted, "hollow");

    match result {
        Err(ForecastError::EmptyMask { label, rows }) => {
            assert_eq!(label, "hollow");
            assert_eq!(rows, 2);
        }
        other => panic!("expected EmptyMask, got {:?}", other),
    }
}

#[test]
fn longer_prediction_is_shape_mismatch() {
    let actual = dense(&[&[1.0, 2.0]]);
    let predicted = vec![vec![1.0, 2.0, 3.0]];

    assert!(matches!(
        compute_metrics(&actual, &predicted, "wide"),
        Err(ForecastError::ShapeMismatch(_))
    ));
}

#[test]
fn row_count_mismatch_is_shape_mismatch() {
    let actual = dense(&[&[1.0], &[2.0]]);
    let predicted = vec![vec![1.0]];

    assert!(matches!(
        compute_metrics(&actual, &predicted, "rows"),
        Err(ForecastError::ShapeMismatch(_))
    ));
    assert!(ForecastResult::new(actual, predicted).is_err());
}

#[test]
fn forecast_result_pairs_windows_with_forecasts() {
    let window = ForecastWindow {
        entity: EntityKey::new(vec!["north"]),
        offset: 0,
        target_count: 2,
        past_values: vec![vec![Some(0.0)]; 3],
        future_values: vec![
            vec![Some(1.0), Some(2.0)],
            vec![Some(10.0), Some(20.0)],
            vec![Some(7.0), Some(7.0)],
        ],
        future_timestamps: Vec::new(),
    };
    let forecast = Forecast::new(vec![vec![1.0, 3.0], vec![10.0, 20.0]]);

    let result = ForecastResult::from_windows(&[window.clone()], &[forecast]).unwrap();

    // One row per target channel; the control channel is not scored.
    assert_eq!(result.actual().len(), 2);
    let report = result.evaluate("paired").unwrap();
    assert_relative_eq!(report.mean_squared_error(), 0.25);

    let missing_channel = Forecast::new(vec![vec![1.0, 3.0]]);
    assert!(ForecastResult::from_windows(&[window], &[missing_channel]).is_err());
}

#[test]
fn report_serializes_with_metric_names() {
    let report = compute_metrics(&dense(&[&[1.0]]), &[vec![3.0]], "json").unwrap();
    let json = serde_json::to_value(&report).unwrap();

    assert_eq!(json["label"], "json");
    assert_eq!(json["mean_squared_error"], 4.0);
    assert_eq!(json["root_mean_squared_error"], 2.0);
    assert_eq!(json["mean_absolute_error"], 2.0);
}
