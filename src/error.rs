use std::path::PathBuf;
use thiserror::Error;

pub type HotsheetResult<T> = Result<T, HotsheetError>;

#[derive(Error, Debug)]
pub enum HotsheetError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("YAML parsing error: {0}")]
    Yaml(#[from] serde_yaml::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("Failed to {operation} {}: {message}", path.display())]
    Workbook {
        path: PathBuf,
        operation: &'static str,
        message: String,
    },

    #[error("Sheet '{sheet}' not found in {}", path.display())]
    SheetNotFound { path: PathBuf, sheet: String },

    #[error("Cell {column}{row} is outside the worksheet bounds")]
    CellOutOfRange { column: String, row: u32 },

    #[error("PO number {value:?} for SKU {sku} (PO extract row {row}) is not numeric")]
    InvalidPoNumber { sku: String, row: u32, value: String },

    #[error("Missing {0} extract: a selected section needs it")]
    MissingExtract(&'static str),

    #[error("Unknown product: {0}")]
    UnknownProduct(String),

    #[error("Product {product} has no section named '{section}'")]
    UnknownSection { product: String, section: String },

    #[error("Configuration error: {0}")]
    Config(String),

    #[error("Log setup error: {0}")]
    Log(String),
}
