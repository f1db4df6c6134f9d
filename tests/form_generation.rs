use calamine::{Data, Reader, Xlsx};
use planilla::form::columns::{
    Column, CLOUD_DETAIL, LABEL, PRECIPITATION_TOTAL, TMAX, TMIN, WIND_DIRECTION,
};
use planilla::form::layout::{template_row, MEAN_ROW, TOTAL_ROW};
use planilla::{
    filled_day_count, generate, CellValue, CloudLayer, DataSource, Hour, MemoryStore, Planilla, PlanillaConfig,
    RawObservationRow, TemplateGrid, YearMonth, OBSERVATION_COLUMNS,
};
use std::io::Cursor;

/// Three readings per day; TMAX on the 19h reading equals the day number.
fn readings(days: u32) -> Vec<RawObservationRow> {
    (1..=days)
        .flat_map(|day| {
            Hour::ALL.map(|hour| RawObservationRow {
                max_temperature: (hour == Hour::H19).then_some(day as f64),
                min_temperature: (hour == Hour::H7).then_some(2.0),
                dry_bulb: Some(10.0),
                wind_direction: Some(CellValue::from("N")),
                precipitation: Some(0.5),
                ..Default::default()
            })
        })
        .collect()
}

fn suma(form: &planilla::FilledForm, row: usize) -> Option<f64> {
    assert_eq!(form.grid.get(row, LABEL), Some(&CellValue::from("Suma")));
    form.grid.number(row, TMAX)
}

#[test]
fn february_uses_three_decades_over_28_days() {
    let period = YearMonth::new(2023, 2).unwrap();
    let form = generate(TemplateGrid::blank(), "Juliaca", period, &readings(28), None);

    assert_eq!(form.days_filled(), 28);
    assert_eq!(suma(&form, 27), Some(55.0));
    assert_eq!(suma(&form, 38), Some(155.0));
    // Days 21-28 only.
    assert_eq!(suma(&form, 50), Some(196.0));
    assert_eq!(form.grid.number(template_row(29), TMAX), None);

    assert_eq!(form.grid.number(TOTAL_ROW, TMAX), Some(406.0));
    assert_eq!(form.grid.number(MEAN_ROW, TMAX), Some(14.5));
    assert_eq!(form.grid.number(MEAN_ROW, TMIN), Some(2.0));
}

#[test]
fn thirty_one_day_month_means_over_every_day() {
    let period = YearMonth::new(2024, 1).unwrap();
    let form = generate(TemplateGrid::blank(), "PUNO", period, &readings(31), None);

    assert_eq!(form.days_filled(), 31);
    assert_eq!(form.day_rows().last(), Some(&49));
    assert_eq!(suma(&form, 50), Some(286.0));
    assert_eq!(form.grid.number(TOTAL_ROW, TMAX), Some(496.0));
    assert_eq!(form.grid.number(MEAN_ROW, TMAX), Some(16.0));

    // The evening-to-morning total crosses the decade boundary; the last day has none.
    assert_eq!(form.grid.number(template_row(10), PRECIPITATION_TOTAL), Some(1.0));
    assert_eq!(form.grid.number(template_row(31), PRECIPITATION_TOTAL), None);
    assert_eq!(form.grid.number(TOTAL_ROW, PRECIPITATION_TOTAL), Some(30.0));
}

#[test]
fn truncated_observations_stop_at_last_complete_day() {
    let period = YearMonth::new(2024, 4).unwrap();
    let mut rows = readings(15);
    // A lone 7h reading for day 16 is not enough to fill it.
    rows.push(readings(16).remove(45));
    let form = generate(TemplateGrid::blank(), "PUNO", period, &rows, None);

    assert_eq!(form.days_filled(), 15);
    assert_eq!(suma(&form, 27), Some(55.0));
    assert_eq!(suma(&form, 38), Some(65.0));
    assert_eq!(suma(&form, 50), None);
    assert_eq!(form.grid.number(template_row(16), TMIN), None);
    assert_eq!(form.grid.number(template_row(15), PRECIPITATION_TOTAL), None);
    assert_eq!(form.grid.number(MEAN_ROW, TMAX), Some(8.0));
}

#[test]
fn text_columns_never_aggregate() {
    let period = YearMonth::new(2024, 6).unwrap();
    let form = generate(TemplateGrid::blank(), "PUNO", period, &readings(30), None);

    for row in [27, 38, 50, TOTAL_ROW, MEAN_ROW] {
        for hour in Hour::ALL {
            assert_eq!(form.grid.get(row, WIND_DIRECTION.at(hour)), None);
            assert_eq!(form.grid.get(row, CLOUD_DETAIL.at(hour).low_form), None);
        }
    }
    assert_eq!(
        form.grid.get(template_row(1), WIND_DIRECTION.at(Hour::H7)),
        Some(&CellValue::from("N"))
    );
}

#[test]
fn mean_is_total_over_filled_days_in_every_column() {
    let period = YearMonth::new(2024, 3).unwrap();
    let rows: Vec<RawObservationRow> = (1..=31u32)
        .flat_map(|day| {
            let d = day as f64;
            Hour::ALL.map(|hour| RawObservationRow {
                max_temperature: (hour == Hour::H19 && day % 4 != 0).then_some(14.0 + d * 0.13),
                min_temperature: (hour == Hour::H7).then_some(-3.0 + d * 0.07),
                dry_bulb: (day % 2 == 1).then_some(9.0 + d * 0.37),
                wet_bulb: (day % 5 != 0).then_some(4.0 + d / 3.0),
                wind_speed: (hour == Hour::H13 && day % 3 == 0).then_some(d / 7.0),
                low_clouds: CloudLayer {
                    form: None,
                    amount: (day <= 10).then_some((day % 8) as f64),
                },
                // Present on alternate days, so no evening/morning pair is complete.
                precipitation: (day % 2 == 0).then_some(0.3),
                ..Default::default()
            })
        })
        .collect();
    let form = generate(TemplateGrid::blank(), "AZANGARO", period, &rows, None);
    assert_eq!(form.days_filled(), 31);

    let mut partial = 0;
    for col in Column::all().filter(|c| c.is_aggregable()) {
        let count = filled_day_count(&form, col);
        let total = form.grid.number(TOTAL_ROW, col);
        let mean = form.grid.number(MEAN_ROW, col);
        if count == 0 {
            assert_eq!((total, mean), (None, None), "column {}", col.index());
            continue;
        }
        if count < form.days_filled() {
            partial += 1;
        }
        let total = total.unwrap();
        let mean = mean.unwrap();
        // Both rows are rounded to two decimals.
        assert!(
            (mean - total / count as f64).abs() <= 0.01,
            "column {}: mean {} total {} over {} days",
            col.index(),
            mean,
            total,
            count
        );
    }
    assert!(partial >= 4);
    assert_eq!(form.grid.number(TOTAL_ROW, PRECIPITATION_TOTAL), None);
    assert_eq!(filled_day_count(&form, TMAX), 24);
}

fn observation_workbook(rows: &[RawObservationRow]) -> Vec<u8> {
    let mut book = umya_spreadsheet::new_file();
    let sheet = book.get_sheet_mut(&0).unwrap();
    for (col, header) in OBSERVATION_COLUMNS.iter().enumerate() {
        sheet.get_cell_mut((col as u32 + 1, 1)).set_value_string(*header);
    }
    // Only the fields the readings above carry: columns C, D, A and O.
    for (i, row) in rows.iter().enumerate() {
        let r = i as u32 + 2;
        if let Some(v) = row.dry_bulb {
            sheet.get_cell_mut((1, r)).set_value_number(v);
        }
        if let Some(v) = row.max_temperature {
            sheet.get_cell_mut((3, r)).set_value_number(v);
        }
        if let Some(v) = row.min_temperature {
            sheet.get_cell_mut((4, r)).set_value_number(v);
        }
        if let Some(v) = row.precipitation {
            sheet.get_cell_mut((15, r)).set_value_number(v);
        }
    }
    let mut out = Cursor::new(Vec::new());
    umya_spreadsheet::writer::xlsx::write_writer(&book, &mut out).unwrap();
    out.into_inner()
}

fn template_workbook(path: &std::path::Path) {
    let mut book = umya_spreadsheet::new_file();
    let sheet = book.get_sheet_mut(&0).unwrap();
    sheet.set_name("Sheet1");
    sheet.get_cell_mut("A1").set_value_string("PLANILLA CLIMATOLOGICA");
    sheet.add_merge_cells("C6:F6");
    sheet.add_merge_cells("Q7:R7");
    umya_spreadsheet::writer::xlsx::write(&book, path).unwrap();
}

#[tokio::test]
async fn export_through_client() {
    let dir = tempfile::tempdir().unwrap();
    let template = dir.path().join("Planilla de datos.xlsx");
    template_workbook(&template);

    let config = PlanillaConfig {
        template_path: template,
        ..PlanillaConfig::default()
    };
    let store = MemoryStore::new();
    let path = DataSource::Observations {
        station: "JULIACA".to_string(),
        period: YearMonth::new(2023, 2).unwrap(),
    }
    .path(&config.planilla_folder);
    store.insert(path, observation_workbook(&readings(28)));
    let client = Planilla::builder().store(store).config(config).build();

    let exported = client
        .export_form()
        .station("juliaca")
        .year(2023)
        .month(2)
        .call()
        .await
        .unwrap();
    assert_eq!(exported.filename, "Planilla_JULIACA_FEBRERO_2023.xlsx");

    let mut workbook: Xlsx<_> = Xlsx::new(Cursor::new(exported.bytes)).unwrap();
    let range = workbook.worksheet_range("Sheet1").unwrap();
    assert_eq!(
        range.get_value((0, 0)),
        Some(&Data::String("PLANILLA CLIMATOLOGICA".into()))
    );
    assert_eq!(range.get_value((5, 2)), Some(&Data::String("JULIACA".into())));
    // The month label sits inside a merge it does not anchor.
    assert!(matches!(range.get_value((6, 17)), None | Some(Data::Empty)));
    assert_eq!(range.get_value((17, 1)), Some(&Data::Float(1.0)));
    assert_eq!(range.get_value((52, 0)), Some(&Data::String("Media".into())));
}
