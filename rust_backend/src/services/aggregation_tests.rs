#[cfg(test)]
mod tests {
    use chrono::{DateTime, NaiveDate, TimeZone, Utc};

    use crate::models::{IndexedObservation, MeasurementRow};
    use crate::services::aggregation::{
        calculate_daily_taz, calculate_system_az, calculate_taz_per_day, group_data_by_index,
        hour_index, month_index, process_dataset, AggregationMode,
    };

    fn at(day: u32, hour: u32) -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2024, 1, day, hour, 0, 0).unwrap()
    }

    fn counter(id: &str, ts: DateTime<Utc>, thermal: f64, electrical: f64) -> MeasurementRow {
        MeasurementRow::new(id)
            .with_energy(thermal, electrical)
            .with_timestamp(ts)
    }

    #[test]
    fn test_system_az_sums_periods() {
        let rows = vec![
            MeasurementRow::new("hp-2").with_energy(400.0, 100.0),
            MeasurementRow::new("hp-1")
                .with_energy(300.0, 100.0)
                .with_heating_energy(250.0, 80.0),
            MeasurementRow::new("hp-1")
                .with_energy(400.0, 100.0)
                .with_heating_energy(350.0, 120.0),
        ];

        let systems = calculate_system_az(&rows);
        assert_eq!(systems.len(), 2);
        assert_eq!(systems[0].heating_id, "hp-1");
        assert_eq!(systems[0].thermal_energy_total_kwh, 700.0);
        assert_eq!(systems[0].az, Some(3.5));
        assert_eq!(systems[0].az_heating, Some(3.0));
        assert_eq!(systems[1].heating_id, "hp-2");
        assert_eq!(systems[1].az, Some(4.0));
        assert_eq!(systems[1].az_heating, None);
    }

    #[test]
    fn test_system_az_null_is_not_zero() {
        let mut partial = MeasurementRow::new("hp").with_energy(300.0, 100.0);
        partial.electrical_energy_kwh = None;
        let rows = vec![partial, MeasurementRow::new("hp").with_energy(100.0, 50.0)];

        let systems = calculate_system_az(&rows);
        assert_eq!(systems[0].thermal_energy_total_kwh, 400.0);
        assert_eq!(systems[0].electrical_energy_total_kwh, 50.0);
        assert_eq!(systems[0].az, Some(8.0));
    }

    #[test]
    fn test_system_az_zero_electrical_gives_none() {
        let rows = vec![MeasurementRow::new("idle").with_energy(0.0, 0.0)];
        let systems = calculate_system_az(&rows);
        assert_eq!(systems[0].az, None);
        assert_eq!(systems[0].az_heating, None);
    }

    #[test]
    fn test_daily_taz_counter_difference() {
        let rows = vec![
            counter("hp", at(1, 23), 1350.0, 400.0),
            counter("hp", at(1, 0), 1000.0, 300.0),
            counter("hp", at(1, 12), 1200.0, 350.0),
        ];

        let systems = calculate_daily_taz(&rows);
        assert_eq!(systems.len(), 1);
        assert_eq!(systems[0].thermal_energy_total_kwh, 350.0);
        assert_eq!(systems[0].electrical_energy_total_kwh, 100.0);
        assert_eq!(systems[0].az, Some(3.5));
    }

    #[test]
    fn test_daily_taz_single_reading() {
        let rows = vec![counter("hp", at(1, 8), 1000.0, 300.0)];
        let systems = calculate_daily_taz(&rows);
        assert_eq!(systems[0].thermal_energy_total_kwh, 0.0);
        assert_eq!(systems[0].electrical_energy_total_kwh, 0.0);
        assert_eq!(systems[0].az, None);
    }

    #[test]
    fn test_daily_taz_uses_non_null_endpoints() {
        let mut last = counter("hp", at(1, 23), 1400.0, 0.0);
        last.electrical_energy_kwh = None;
        let rows = vec![
            counter("hp", at(1, 0), 1000.0, 300.0),
            counter("hp", at(1, 12), 1200.0, 400.0),
            last,
        ];

        let systems = calculate_daily_taz(&rows);
        assert_eq!(systems[0].thermal_energy_total_kwh, 400.0);
        assert_eq!(systems[0].electrical_energy_total_kwh, 100.0);
        assert_eq!(systems[0].az, Some(4.0));
    }

    #[test]
    fn test_daily_taz_skips_rows_without_timestamp() {
        let rows = vec![
            MeasurementRow::new("hp").with_energy(99999.0, 1.0),
            counter("hp", at(1, 0), 1000.0, 300.0),
            counter("hp", at(1, 6), 1300.0, 400.0),
            MeasurementRow::new("untimed").with_energy(10.0, 5.0),
        ];

        let systems = calculate_daily_taz(&rows);
        assert_eq!(systems.len(), 1);
        assert_eq!(systems[0].az, Some(3.0));
    }

    #[test]
    fn test_daily_taz_order_invariant() {
        let rows = vec![
            counter("a", at(1, 0), 10.0, 5.0),
            counter("b", at(1, 3), 500.0, 100.0),
            counter("a", at(1, 9), 40.0, 15.0),
            counter("b", at(1, 1), 200.0, 50.0),
            counter("a", at(1, 5), 20.0, 10.0),
        ];
        let mut reversed = rows.clone();
        reversed.reverse();

        assert_eq!(calculate_daily_taz(&rows), calculate_daily_taz(&reversed));
    }

    #[test]
    fn test_taz_per_day() {
        let rows = vec![
            counter("hp", at(2, 0), 2000.0, 600.0),
            counter("hp", at(1, 0), 1000.0, 300.0),
            counter("hp", at(1, 23), 1900.0, 600.0),
            counter("hp", at(2, 23), 2800.0, 800.0),
        ];

        let days = calculate_taz_per_day(&rows);
        assert_eq!(days.len(), 2);
        assert_eq!(days[0].date, NaiveDate::from_ymd_opt(2024, 1, 1).unwrap());
        assert_eq!(days[0].system.az, Some(3.0));
        assert_eq!(days[1].date, NaiveDate::from_ymd_opt(2024, 1, 2).unwrap());
        assert_eq!(days[1].system.az, Some(4.0));
    }

    fn obs(index: &str, id: &str, az: Option<f64>, outdoor: Option<f64>) -> IndexedObservation {
        IndexedObservation::new(index, id)
            .with_az(az, None)
            .with_temperatures(outdoor, None)
    }

    #[test]
    fn test_group_averages_positive_values_only() {
        let observations = vec![
            obs("01", "a", Some(3.0), Some(-2.0)),
            obs("01", "b", Some(4.0), Some(0.0)),
            obs("01", "c", Some(0.0), None),
            obs("01", "d", Some(-1.0), Some(2.0)),
        ];

        let rows = group_data_by_index(&observations, None);
        assert_eq!(rows.len(), 1);
        assert_eq!(rows[0].az, 3.5);
        assert_eq!(rows[0].az_heating, 0.0);
        assert_eq!(rows[0].outdoor_temperature_c, Some(0.0));
        assert_eq!(rows[0].flow_temperature_c, None);
        assert_eq!(rows[0].sample_count, 4);
    }

    #[test]
    fn test_group_skips_non_finite_values() {
        let observations = vec![
            IndexedObservation::new("05", "a")
                .with_az(Some(f64::INFINITY), Some(f64::NAN))
                .with_temperatures(Some(f64::NAN), Some(35.0)),
            IndexedObservation::new("05", "b")
                .with_az(Some(2.0), Some(3.0))
                .with_temperatures(Some(4.0), Some(f64::NEG_INFINITY)),
        ];

        let rows = group_data_by_index(&observations, None);
        assert_eq!(rows[0].az, 2.0);
        assert_eq!(rows[0].az_heating, 3.0);
        assert_eq!(rows[0].outdoor_temperature_c, Some(4.0));
        assert_eq!(rows[0].flow_temperature_c, Some(35.0));
        assert_eq!(rows[0].sample_count, 2);
    }

    #[test]
    fn test_group_lexicographic_without_canonical() {
        let observations = vec![
            obs("2024-03", "a", Some(3.0), None),
            obs("2024-01", "a", Some(3.0), None),
            obs("2024-02", "a", Some(3.0), None),
        ];
        let indices: Vec<String> = group_data_by_index(&observations, None)
            .into_iter()
            .map(|r| r.index)
            .collect();
        assert_eq!(indices, vec!["2024-01", "2024-02", "2024-03"]);
    }

    #[test]
    fn test_group_fills_canonical_buckets() {
        let observations = vec![obs("03", "a", Some(3.2), None), obs("11", "a", Some(2.9), None)];
        let months = month_index();

        let rows = group_data_by_index(&observations, Some(months.as_slice()));
        assert_eq!(rows.len(), 12);
        assert_eq!(rows[0].index, "01");
        assert_eq!(rows[0].az, 0.0);
        assert_eq!(rows[0].outdoor_temperature_c, None);
        assert_eq!(rows[2].az, 3.2);
        assert_eq!(rows[10].az, 2.9);
        assert_eq!(rows.iter().filter(|r| r.has_positive_value()).count(), 2);
    }

    #[test]
    fn test_group_appends_unknown_indices() {
        let observations = vec![obs("24", "a", Some(3.0), None), obs("05", "a", Some(2.0), None)];
        let hours = hour_index();
        let rows = group_data_by_index(&observations, Some(hours.as_slice()));
        assert_eq!(rows.len(), 25);
        assert_eq!(rows[24].index, "24");
    }

    #[test]
    fn test_passthrough_mode() {
        let observations = vec![
            obs("2024-01-02", "a", Some(3.0), Some(1.0)),
            obs("2024-01-01", "a", Some(-1.0), None),
        ];
        let rows = process_dataset(&observations, AggregationMode::Passthrough, None);
        assert_eq!(rows.len(), 2);
        assert_eq!(rows[0].index, "2024-01-02");
        assert_eq!(rows[1].az, 0.0);
        assert_eq!(rows[1].sample_count, 1);
    }

    #[test]
    fn test_canonical_indices() {
        assert_eq!(month_index().len(), 12);
        assert_eq!(month_index()[0], "01");
        assert_eq!(hour_index().len(), 24);
        assert_eq!(hour_index()[23], "23");
    }
}
