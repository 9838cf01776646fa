//! MS XML spreadsheet writers for the [`datalith`] value model.
//!
//! The table shape is an array of rows (arrays) of scalar cells:
//!
//! ```
//! use datalith::value;
//!
//! let table = value!([[(1u64), "two"], [(3u64), "four"]]);
//! let xml = datalith_xls::to_xls_table(&table).unwrap();
//! assert!(xml.starts_with("<Table><Row><Cell>"));
//! ```
//!
//! Four output scopes nest around the same `<Table>`: bare table, named
//! worksheet, workbook, and full document (XML declaration plus the
//! `mso-application` directive). [`XlsWriter`] is an ordinary
//! [`StreamHandler`](datalith::StreamHandler), so it can also be fed
//! directly by a parser for another format.

#![warn(missing_docs)]

mod error;
mod writer;

pub use error::{Result, XlsError, XlsErrorKind};
pub use writer::{Scope, XlsWriter};

use datalith::{Value, write_value};

fn render(value: &Value, scope: Scope, worksheet_name: &str) -> Result<String> {
    if scope != Scope::Table && worksheet_name.contains(['\\', '/', '?', '*', '[', ']']) {
        return Err(XlsError::new(XlsErrorKind::InvalidWorksheetName));
    }
    let mut writer = XlsWriter::with_scope(Vec::new(), scope, worksheet_name);
    write_value(value, &mut writer)?;
    String::from_utf8(writer.into_inner()).map_err(|_| XlsError::new(XlsErrorKind::InvalidUtf8))
}

/// Render a value as a bare `<Table>`.
pub fn to_xls_table(value: &Value) -> Result<String> {
    render(value, Scope::Table, "")
}

/// Render a value as a named `<Worksheet>`.
pub fn to_xls_worksheet(value: &Value, worksheet_name: &str) -> Result<String> {
    render(value, Scope::Worksheet, worksheet_name)
}

/// Render a value as a `<Workbook>` holding one named worksheet.
pub fn to_xls_workbook(value: &Value, worksheet_name: &str) -> Result<String> {
    render(value, Scope::Workbook, worksheet_name)
}

/// Render a value as a complete spreadsheet document.
pub fn to_xls_document(value: &Value, worksheet_name: &str) -> Result<String> {
    render(value, Scope::Document, worksheet_name)
}

/// Render a value as a complete spreadsheet document (the default form).
pub fn to_xls(value: &Value, worksheet_name: &str) -> Result<String> {
    to_xls_document(value, worksheet_name)
}
