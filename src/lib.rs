// src/lib.rs
//! Finds tables in HTML pages and turns them into row records that can be
//! printed as a grid or written out as CSV.
pub mod utils;
pub mod fetch;
pub mod extractors;
pub mod render;
pub mod storage;

pub use extractors::{extract_table, ExtractedTable, ExtractionMode, Record, TableExtractor};
pub use utils::error::{AppError, ExtractError, FetchError, StorageError};
