//! Error handling tests

use hotsheet_sync::error::HotsheetError;
use std::path::PathBuf;

#[test]
fn test_workbook_error_display() {
    let err = HotsheetError::Workbook {
        path: PathBuf::from("BJP.xlsx"),
        operation: "open hotsheet",
        message: "invalid zip header".to_string(),
    };
    assert_eq!(
        err.to_string(),
        "Failed to open hotsheet BJP.xlsx: invalid zip header"
    );
}

#[test]
fn test_sheet_not_found_display() {
    let err = HotsheetError::SheetNotFound {
        path: PathBuf::from("BSC.xlsx"),
        sheet: "Winter Holiday".to_string(),
    };
    assert_eq!(
        err.to_string(),
        "Sheet 'Winter Holiday' not found in BSC.xlsx"
    );
}

#[test]
fn test_invalid_po_number_display() {
    let err = HotsheetError::InvalidPoNumber {
        sku: "ABC-1".to_string(),
        row: 42,
        value: "PO#12".to_string(),
    };
    let msg = err.to_string();
    assert!(msg.contains("\"PO#12\""));
    assert!(msg.contains("ABC-1"));
    assert!(msg.contains("row 42"));
}

#[test]
fn test_cell_out_of_range_display() {
    let err = HotsheetError::CellOutOfRange {
        column: "ZZZZ".to_string(),
        row: 2,
    };
    assert_eq!(err.to_string(), "Cell ZZZZ2 is outside the worksheet bounds");
}

#[test]
fn test_missing_extract_display() {
    let err = HotsheetError::MissingExtract("purchase order");
    assert_eq!(
        err.to_string(),
        "Missing purchase order extract: a selected section needs it"
    );
}

#[test]
fn test_unknown_section_display() {
    let err = HotsheetError::UnknownSection {
        product: "SMD".to_string(),
        section: "summer".to_string(),
    };
    assert_eq!(err.to_string(), "Product SMD has no section named 'summer'");
}

#[test]
fn test_io_error_from() {
    let io = std::io::Error::new(std::io::ErrorKind::NotFound, "gone");
    let err: HotsheetError = io.into();
    assert!(matches!(err, HotsheetError::Io(_)));
    assert!(err.to_string().starts_with("IO error:"));
}

#[test]
fn test_yaml_error_from() {
    let yaml_err = serde_yaml::from_str::<u32>("not: [a number").unwrap_err();
    let err: HotsheetError = yaml_err.into();
    assert!(err.to_string().starts_with("YAML parsing error:"));
}
