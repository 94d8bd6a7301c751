//! Roster load/export integration tests.
//!
//! Fixture workbooks are generated with rust_xlsxwriter into a `TempDir`.

use std::path::Path;

use assert_fs::prelude::*;
use certify_core::{
    roster::{self, GUID_COLUMN},
    types::{CellValue, ColumnMap, Field, TraceId},
    RosterError,
};
use chrono::NaiveDate;
use rust_xlsxwriter::{ExcelDateTime, Format, Workbook};

fn write_fixture(path: &Path) {
    let mut workbook = Workbook::new();
    let date = Format::new().set_num_format("yyyy-mm-dd");
    let sheet = workbook.add_worksheet();
    for (col, header) in ["Full Name", "Specialization", "Email", "Start Date", "End Date"]
        .iter()
        .enumerate()
    {
        sheet.write_string(0, col as u16, *header).unwrap();
    }
    sheet.write_string(1, 0, "Jane Doe").unwrap();
    sheet.write_string(1, 1, "Bioinformatics").unwrap();
    sheet.write_string(1, 2, "jane@example.com").unwrap();
    let start = ExcelDateTime::from_ymd(2024, 1, 10).unwrap();
    let end = ExcelDateTime::from_ymd(2024, 3, 20).unwrap();
    sheet.write_datetime_with_format(1, 3, &start, &date).unwrap();
    sheet.write_datetime_with_format(1, 4, &end, &date).unwrap();
    // Row 3 left blank on purpose.
    sheet.write_string(3, 0, "John Roe").unwrap();
    sheet.write_string(3, 1, "Robotics").unwrap();
    sheet.write_string(3, 3, "2023-12-01 00:00:00").unwrap();
    sheet.write_string(3, 4, "2024-02-15").unwrap();
    workbook.save(path).unwrap();
}

#[test]
fn load_missing_file_returns_not_found() {
    let dir = assert_fs::TempDir::new().unwrap();
    let err = roster::load(&dir.path().join("nope.xlsx"), "Full Name").unwrap_err();
    assert!(matches!(err, RosterError::NotFound { .. }), "got: {err}");
    assert!(err.to_string().contains("nope.xlsx"));
}

#[test]
fn load_reads_headers_records_and_dates() {
    let dir = assert_fs::TempDir::new().unwrap();
    let path = dir.child("input.xlsx");
    write_fixture(path.path());

    let roster = roster::load(path.path(), "Full Name").expect("load");
    let columns = ColumnMap::default();
    assert_eq!(roster.headers.len(), 5);
    assert_eq!(roster.len(), 2, "blank row must be skipped");

    let jane = &roster.records[0];
    assert_eq!(jane.row, 2);
    assert_eq!(jane.text(&columns, Field::FullName).as_deref(), Some("Jane Doe"));
    assert_eq!(
        jane.date(&columns, Field::StartDate).unwrap(),
        NaiveDate::from_ymd_opt(2024, 1, 10)
    );

    let john = &roster.records[1];
    assert_eq!(john.row, 4);
    assert_eq!(
        john.date(&columns, Field::EndDate).unwrap(),
        NaiveDate::from_ymd_opt(2024, 2, 15)
    );
    assert!(john.get("Email").is_blank());
}

#[test]
fn load_without_required_column_fails() {
    let dir = assert_fs::TempDir::new().unwrap();
    let path = dir.child("input.xlsx");
    write_fixture(path.path());
    let err = roster::load(path.path(), "Name").unwrap_err();
    assert!(matches!(err, RosterError::MissingColumn { ref column, .. } if column == "Name"));
}

#[test]
fn export_appends_guid_column_for_every_record() {
    let dir = assert_fs::TempDir::new().unwrap();
    let input = dir.child("input.xlsx");
    write_fixture(input.path());
    let loaded = roster::load(input.path(), "Full Name").unwrap();
    let ids: Vec<TraceId> = loaded.records.iter().map(|_| TraceId::generate()).collect();

    let out = dir.child("exports/roster.xlsx");
    roster::export_with_ids(&loaded, &ids, out.path()).expect("export");
    out.assert(predicates::path::exists());

    let reread = roster::load(out.path(), GUID_COLUMN).expect("reload export");
    assert_eq!(reread.headers.last().map(String::as_str), Some(GUID_COLUMN));
    assert_eq!(reread.len(), loaded.len());
    for (record, id) in reread.records.iter().zip(&ids) {
        assert_eq!(record.get(GUID_COLUMN), &CellValue::Text(id.to_string()));
    }
    let columns = ColumnMap::default();
    assert_eq!(
        reread.records[0].date(&columns, Field::StartDate).unwrap(),
        NaiveDate::from_ymd_opt(2024, 1, 10)
    );
}
