//! Spreadsheet output shapes and error cases.

use datalith::{Array, Subtype, Value, value};
use datalith_xls::{
    XlsErrorKind, to_xls_document, to_xls_table, to_xls_workbook, to_xls_worksheet,
};

#[test]
fn rows_and_cells() {
    let table = value!([[(1u64), "two"], [(3u64), true]]);
    assert_eq!(
        to_xls_table(&table).unwrap(),
        "<Table>\
         <Row><Cell><Data ss:Type=\"Number\">1</Data></Cell>\
         <Cell><Data ss:Type=\"String\">two</Data></Cell></Row>\
         <Row><Cell><Data ss:Type=\"Number\">3</Data></Cell>\
         <Cell><Data ss:Type=\"Boolean\">1</Data></Cell></Row>\
         </Table>"
    );
}

#[test]
fn cell_types() {
    let table = value!([null, false, (-2i64), (2u64), 2.5, "s"]);
    let xml = to_xls_table(&table).unwrap();
    assert_eq!(
        xml,
        "<Table>\
         <Cell><Data ss:Type=\"String\"></Data></Cell>\
         <Cell><Data ss:Type=\"Boolean\">0</Data></Cell>\
         <Cell><Data ss:Type=\"Number\">-2</Data></Cell>\
         <Cell><Data ss:Type=\"Number\">2</Data></Cell>\
         <Cell><Data ss:Type=\"Number\">2.5</Data></Cell>\
         <Cell><Data ss:Type=\"String\">s</Data></Cell>\
         </Table>"
    );
}

#[test]
fn datetime_subtypes_change_cell_type() {
    let mut table = Value::array(Array::new());
    table.push_back(Value::string("2024-01-01").with_subtype(Subtype::DATE));
    table.push_back(Value::string("12:00:00").with_subtype(Subtype::TIME));
    table.push_back(Value::string("2024-01-01T12:00:00").with_subtype(Subtype::DATETIME));
    table.push_back(Value::string("plain"));

    let xml = to_xls_table(&table).unwrap();
    assert_eq!(xml.matches("ss:Type=\"DateTime\"").count(), 3);
    assert_eq!(xml.matches("ss:Type=\"String\"").count(), 1);
}

#[test]
fn text_is_escaped() {
    let table = value!(["a<b>&'\"c"]);
    let xml = to_xls_table(&table).unwrap();
    assert!(xml.contains("a&lt;b&gt;&amp;&apos;&quot;c"));
}

#[test]
fn hundred_thousand_cells() {
    let mut table = Value::array(Array::with_capacity(100_000));
    for i in 0..100_000u64 {
        table.push_back(Value::uint(i));
    }

    let xml = to_xls_table(&table).unwrap();
    assert!(xml.starts_with("<Table><Cell><Data ss:Type=\"Number\">0</Data></Cell>"));
    assert!(xml.ends_with("<Cell><Data ss:Type=\"Number\">99999</Data></Cell></Table>"));
    assert_eq!(xml.matches("<Cell>").count(), 100_000);
}

#[test]
fn scope_nesting() {
    let table = value!([[(1u64)]]);

    let worksheet = to_xls_worksheet(&table, "Sheet & One").unwrap();
    assert!(worksheet.starts_with("<Worksheet ss:Name=\"Sheet &amp; One\"><Table>"));
    assert!(worksheet.ends_with("</Table></Worksheet>"));

    let workbook = to_xls_workbook(&table, "Data").unwrap();
    assert!(workbook.starts_with("<Workbook xmlns=\"urn:schemas-microsoft-com:office:spreadsheet\""));
    assert!(workbook.contains("<Worksheet ss:Name=\"Data\">"));
    assert!(workbook.ends_with("</Workbook>"));

    let document = to_xls_document(&table, "Data").unwrap();
    assert!(document.starts_with("<?xml version=\"1.0\" encoding=\"UTF-8\"?>"));
    assert!(document.contains("<?mso-application progid=\"Excel.Sheet\"?>"));
    assert!(document.ends_with("</Workbook>"));
}

#[test]
fn invalid_worksheet_names_rejected() {
    let table = value!([]);
    for name in ["a/b", "a\\b", "what?", "glob*", "open[", "close]"] {
        let err = to_xls_worksheet(&table, name).unwrap_err();
        assert!(
            matches!(err.kind, XlsErrorKind::InvalidWorksheetName),
            "name {name:?} should be rejected"
        );
    }
}

#[test]
fn objects_and_deep_arrays_rejected() {
    let err = to_xls_table(&value!({"a": 1})).unwrap_err();
    assert!(matches!(err.kind, XlsErrorKind::Stream(_)));

    let err = to_xls_table(&value!([[[1]]])).unwrap_err();
    assert!(matches!(err.kind, XlsErrorKind::Stream(_)));
}
