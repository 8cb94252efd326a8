//! End-to-end tests of the chart data pipeline.
//!
//! These tests run rows through quality filtering, aggregation, histogram
//! binning, temperature regression and group comparison, the way a charting
//! layer would call the library.

use chrono::{Duration, TimeZone, Utc};
use heatpump_analytics::algorithms::regression::RobustRegressionOptions;
use heatpump_analytics::models::{
    DataPoint, EnergyMetric, IndexedObservation, MeasurementRow, SystemEfficiency, SystemEnergy,
    SystemProfile,
};
use heatpump_analytics::parsing::parse_measurement_rows_json_str;
use heatpump_analytics::services::{
    auto_energy_bin_size, calculate_daily_taz, calculate_system_az, compare_groups,
    compute_temperature_trend, create_auto_sized_histogram, create_histogram_bins, month_index,
    points_from_observations, AutoBinSizing, CopSeries, HistogramField, TrendOptions,
};
use heatpump_analytics::transformations::{
    filter_realistic_rows, filter_systems_by_realistic_cop, ComparisonGroups, FilterGroup,
    FilterOperator, FilterPredicate,
};
use heatpump_analytics::AnalyticsConfig;

/// Twelve monthly rows per system with a constant COP.
fn monthly_rows(id: &str, cop: f64) -> Vec<MeasurementRow> {
    (0..12)
        .map(|month| {
            let electrical = 100.0 + 20.0 * month as f64;
            MeasurementRow::new(id)
                .with_energy(electrical * cop, electrical)
                .with_heating_energy(electrical * cop * 0.9, electrical * 0.95)
        })
        .collect()
}

#[test]
fn test_monthly_rows_to_histogram() {
    let mut rows = Vec::new();
    for (i, cop) in [2.2, 2.7, 3.3, 3.6, 4.1, 9.5].iter().enumerate() {
        rows.extend(monthly_rows(&format!("hp-{}", i), *cop));
    }

    let systems = calculate_system_az(&rows);
    assert_eq!(systems.len(), 6);

    let realistic = filter_systems_by_realistic_cop(&systems);
    assert_eq!(realistic.len(), 5);
    assert!(realistic.iter().all(|s| s.heating_id != "hp-5"));

    let histogram = create_histogram_bins(&realistic, HistogramField::Az, 0.5, false);
    assert_eq!(histogram.total_count(), realistic.len());
    assert_eq!(histogram.stats.count, realistic.len());
    assert!((histogram.stats.median - 3.3).abs() < 1e-9);

    let labels: Vec<&str> = histogram.bins.iter().map(|b| b.label.as_str()).collect();
    assert_eq!(labels, vec!["2.0-2.5", "2.5-3.0", "3.0-3.5", "3.5-4.0", "4.0-4.5"]);
}

#[test]
fn test_row_filter_before_aggregation() {
    let rows = vec![
        MeasurementRow::new("hp").with_energy(350.0, 100.0),
        MeasurementRow::new("hp").with_energy(-50.0, 10.0),
        MeasurementRow::new("hp").with_energy(5000.0, 10.0),
        MeasurementRow::new("hp").with_energy(300.0, 100.0),
    ];

    let cleaned = filter_realistic_rows(&rows);
    let systems = calculate_system_az(&cleaned);
    assert_eq!(systems[0].az, Some(3.25));
}

#[test]
fn test_energy_mode_histogram() {
    let systems: Vec<SystemEfficiency> = (0..10)
        .map(|i| {
            let electrical = 1000.0 + 250.0 * i as f64;
            SystemEfficiency::from_totals(
                format!("hp-{}", i),
                electrical * 3.5,
                electrical,
                electrical * 3.2,
                electrical * 0.9,
            )
        })
        .collect();

    let energy: Vec<SystemEnergy> = filter_systems_by_realistic_cop(&systems)
        .iter()
        .map(|s| s.to_energy(EnergyMetric::Electrical))
        .collect();
    assert_eq!(energy.len(), 10);

    let values: Vec<f64> = energy.iter().map(|e| e.energy_kwh).collect();
    // range 2250 / 15 = 150
    assert_eq!(auto_energy_bin_size(&values), 150.0);

    let histogram = create_auto_sized_histogram(
        &energy,
        HistogramField::Energy,
        true,
        &AutoBinSizing::default(),
    );
    assert_eq!(histogram.total_count(), 10);
    let heating_total: usize = histogram.bins.iter().map(|b| b.count_heating).sum();
    assert_eq!(heating_total, 10);
}

#[test]
fn test_daily_counters_to_efficiency() {
    let start = Utc.with_ymd_and_hms(2024, 2, 1, 0, 0, 0).unwrap();
    let mut rows = Vec::new();
    for hour in 0..24 {
        let ts = start + Duration::hours(hour);
        rows.push(
            MeasurementRow::new("hp-1")
                .with_energy(10_000.0 + 12.0 * hour as f64, 3_000.0 + 4.0 * hour as f64)
                .with_timestamp(ts),
        );
    }
    rows.reverse();

    let systems = calculate_daily_taz(&rows);
    assert_eq!(systems.len(), 1);
    assert_eq!(systems[0].thermal_energy_total_kwh, 276.0);
    assert_eq!(systems[0].electrical_energy_total_kwh, 92.0);
    assert_eq!(systems[0].az, Some(3.0));
}

#[test]
fn test_temperature_trend_with_outliers() {
    let observations: Vec<IndexedObservation> = (0..30)
        .map(|i| {
            let t = -10.0 + i as f64;
            let mut cop = 3.2 + 0.07 * t;
            if i % 10 == 5 {
                cop += 4.0;
            }
            IndexedObservation::new(format!("{:02}", i), "hp-1")
                .with_az(Some(cop), None)
                .with_temperatures(Some(t), None)
        })
        .collect();

    let points = points_from_observations(&observations, CopSeries::Az);
    let trend = compute_temperature_trend(&points, &TrendOptions::default()).unwrap();

    assert_eq!(trend.sample_size, 30);
    assert!((trend.regression.slope - 0.07).abs() < 0.02);
    assert!((trend.regression.predict(0.0) - 3.2).abs() < 0.2);
    assert_eq!(trend.regression_curve.len(), 50);
    assert_eq!(trend.loess_curve.len(), 50);
    assert_eq!(trend.x_min, -10.0);
    assert_eq!(trend.x_max, 19.0);
}

#[test]
fn test_trend_options_from_config() {
    let config = AnalyticsConfig::from_toml_str(
        r#"
        [regression]
        max_iterations = 25

        [loess]
        curve_points = 10
        "#,
    )
    .unwrap();

    let options = config.trend_options();
    assert_eq!(
        options.robust,
        RobustRegressionOptions {
            max_iterations: 25,
            ..Default::default()
        }
    );

    let points: Vec<DataPoint> = (0..5).map(|i| DataPoint::new(i as f64, 3.0)).collect();
    let trend = compute_temperature_trend(&points, &options).unwrap();
    assert_eq!(trend.regression_curve.len(), 10);
    assert_eq!(trend.regression.r_squared, 0.0);
}

#[test]
fn test_group_comparison_by_month() {
    let profiles = vec![
        SystemProfile {
            heat_pump_type: Some("Luft/Wasser".into()),
            ..SystemProfile::new("air-1")
        },
        SystemProfile {
            heat_pump_type: Some("Sole/Wasser".into()),
            ..SystemProfile::new("ground-1")
        },
    ];

    let mut observations = Vec::new();
    for month in ["01", "02", "07"] {
        let summer = month == "07";
        observations.push(
            IndexedObservation::new(month, "air-1")
                .with_az(Some(if summer { 0.0 } else { 3.0 }), None),
        );
        observations.push(
            IndexedObservation::new(month, "ground-1")
                .with_az(Some(if summer { 0.0 } else { 4.2 }), None),
        );
    }

    let groups = ComparisonGroups::new(
        FilterGroup::new("Air", "#1f77b4").with_filter(FilterPredicate::new(
            "heat_pump_type",
            FilterOperator::StartsWith,
            Some("luft".into()),
        )),
        FilterGroup::new("Ground", "#2ca02c").with_filter(FilterPredicate::new(
            "heat_pump_type",
            FilterOperator::Contains,
            Some("sole".into()),
        )),
    );

    let months = month_index();
    let comparison = compare_groups(&observations, &profiles, &groups, Some(months.as_slice()));

    let indices: Vec<&str> = comparison.rows.iter().map(|r| r.index.as_str()).collect();
    assert_eq!(indices, vec!["01", "02"]);
    assert_eq!(comparison.rows[0].get("az (Air)"), Some(3.0));
    assert_eq!(comparison.rows[0].get("az (Ground)"), Some(4.2));
}

#[test]
fn test_json_rows_through_pipeline() {
    let json = r#"[
        {"heatingId": 1, "thermalEnergyKwh": 350, "electricalEnergyKwh": 100},
        {"heatingId": 1, "thermalEnergyKwh": 450, "electricalEnergyKwh": 100},
        {"heatingId": 2, "thermalEnergyKwh": 990, "electricalEnergyKwh": 100}
    ]"#;

    let rows = parse_measurement_rows_json_str(json).unwrap();
    let systems = filter_systems_by_realistic_cop(&calculate_system_az(&rows));
    assert_eq!(systems.len(), 1);
    assert_eq!(systems[0].heating_id, "1");
    assert_eq!(systems[0].az, Some(4.0));
}
