use std::path::Path;

use rust_table_extract::ingestion::{
    read_csv_upload, read_text_upload, read_xlsx_upload, ExtractOptions, UploadForm, UploadedFile,
};
use rust_table_extract::ErrorKind;

fn sheet_xlsx(sheet: &str) -> Vec<u8> {
    let mut wb = rust_xlsxwriter::Workbook::new();
    let ws = wb.add_worksheet();
    ws.set_name(sheet).unwrap();
    ws.write_string(0, 0, "Positions").unwrap();
    ws.write_string(1, 0, "AAA").unwrap();
    ws.write_number(1, 1, 10).unwrap();
    wb.save_to_buffer().unwrap()
}

fn entries_in(dir: &Path) -> usize {
    std::fs::read_dir(dir).unwrap().count()
}

fn opts_in(dir: &Path) -> ExtractOptions {
    ExtractOptions {
        scratch_dir: dir.to_path_buf(),
        ..Default::default()
    }
}

#[test]
fn missing_field_is_reported() {
    let form = UploadForm::new().with_file("other", UploadedFile::new("a.csv", "x\n"));

    let err = read_csv_upload(&form, "file", &ExtractOptions::default()).unwrap_err();

    assert_eq!(err.kind(), ErrorKind::FormFieldMissing);
    assert_eq!(err.to_string(), "upload_file:001: form field 'file' not found");
}

#[test]
fn csv_and_text_uploads() {
    let form = UploadForm::new()
        .with_file("csv", UploadedFile::new("a.csv", "a,b|c\n"))
        .with_file("txt", UploadedFile::new("a.txt", "a,b|c\n"));
    let opts = ExtractOptions::default();

    let csv = read_csv_upload(&form, "csv", &opts).unwrap();
    let txt = read_text_upload(&form, "txt", &opts).unwrap();

    assert_eq!(csv.rows(), &[vec!["a".to_string(), "b|c".to_string()]]);
    assert_eq!(txt.rows(), &[vec!["a,b".to_string(), "c".to_string()]]);
}

#[test]
fn xlsx_upload_is_decoded_and_scratch_file_removed() {
    let dir = tempfile::tempdir().unwrap();
    let form = UploadForm::new().with_file("book", UploadedFile::new("book.xlsx", sheet_xlsx("Sheet1")));

    let t = read_xlsx_upload(&form, "book", &opts_in(dir.path())).unwrap();

    assert_eq!(t.row_count(), 2);
    assert_eq!(t.rows()[1], vec!["AAA", "10"]);
    assert_eq!(entries_in(dir.path()), 0);
}

#[test]
fn xlsx_upload_removes_scratch_file_on_failure() {
    let dir = tempfile::tempdir().unwrap();
    let form = UploadForm::new()
        .with_file("wrong_sheet", UploadedFile::new("book.xlsx", sheet_xlsx("Data")))
        .with_file("garbage", UploadedFile::new("book.xlsx", "not a workbook"));
    let opts = opts_in(dir.path());

    let err = read_xlsx_upload(&form, "wrong_sheet", &opts).unwrap_err();
    assert_eq!(err.kind(), ErrorKind::SheetNotFound);
    assert_eq!(entries_in(dir.path()), 0);

    let err = read_xlsx_upload(&form, "garbage", &opts).unwrap_err();
    assert_eq!(err.kind(), ErrorKind::OpenSpreadsheet);
    assert_eq!(entries_in(dir.path()), 0);
}

#[test]
fn xlsx_upload_with_hostile_filename_stays_in_scratch_dir() {
    let outer = tempfile::tempdir().unwrap();
    let scratch = outer.path().join("scratch");
    std::fs::create_dir(&scratch).unwrap();

    let form = UploadForm::new().with_file(
        "book",
        UploadedFile::new("../escaped.xlsx", sheet_xlsx("Sheet1")),
    );

    read_xlsx_upload(&form, "book", &opts_in(&scratch)).unwrap();

    // Nothing was written next to the scratch dir, and nothing is left inside it.
    assert_eq!(entries_in(outer.path()), 1);
    assert_eq!(entries_in(&scratch), 0);
}

#[test]
fn xlsx_upload_uses_configured_sheet() {
    let dir = tempfile::tempdir().unwrap();
    let form = UploadForm::new().with_file("book", UploadedFile::new("book.xlsx", sheet_xlsx("TabName")));
    let opts = ExtractOptions {
        sheet_name: "TabName".to_string(),
        ..opts_in(dir.path())
    };

    let t = read_xlsx_upload(&form, "book", &opts).unwrap();
    assert_eq!(t.leading_cell(0), Some("Positions"));
}
