//! The spreadsheet stream writer.
//!
//! Input shape: the document value is the table; an array element that is
//! itself an array becomes a `<Row>`, scalars become `<Cell>`s. Deeper
//! array nesting and objects have no spreadsheet representation and are
//! rejected.

use std::io::Write;

use log::trace;

use datalith::{StreamError, StreamHandler, Subtype, Value};

/// How much document furniture wraps the `<Table>` element.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Scope {
    /// Just `<Table>...</Table>`.
    Table,
    /// A named `<Worksheet>` around the table.
    Worksheet,
    /// `<Workbook>` with its namespace declarations around the worksheet.
    Workbook,
    /// The XML declaration and `mso-application` directive around the
    /// workbook.
    Document,
}

/// A [`StreamHandler`] emitting an MS XML spreadsheet.
pub struct XlsWriter<W: Write> {
    out: W,
    scope: Scope,
    worksheet_name: String,
    /// Array nesting: 0 outside the table, 1 in the table, 2 in a row.
    array_depth: usize,
    /// Whether the current string cell's `<Data>` prefix has been
    /// written.
    in_string_cell: bool,
}

const NAME_FORBIDDEN: &[char] = &['\\', '/', '?', '*', '[', ']'];

impl<W: Write> XlsWriter<W> {
    /// Write a bare table into `out`.
    pub fn table(out: W) -> Self {
        XlsWriter {
            out,
            scope: Scope::Table,
            worksheet_name: String::new(),
            array_depth: 0,
            in_string_cell: false,
        }
    }

    /// Write a worksheet (or larger scope) into `out`.
    pub fn with_scope(out: W, scope: Scope, worksheet_name: impl Into<String>) -> Self {
        XlsWriter {
            out,
            scope,
            worksheet_name: worksheet_name.into(),
            array_depth: 0,
            in_string_cell: false,
        }
    }

    /// Recover the underlying sink.
    pub fn into_inner(self) -> W {
        self.out
    }

    fn io(err: std::io::Error) -> StreamError {
        StreamError::from(err)
    }

    fn write_escaped(&mut self, bytes: &[u8]) -> Result<(), StreamError> {
        for &b in bytes {
            match b {
                b'"' => self.out.write_all(b"&quot;").map_err(Self::io)?,
                b'&' => self.out.write_all(b"&amp;").map_err(Self::io)?,
                b'\'' => self.out.write_all(b"&apos;").map_err(Self::io)?,
                b'<' => self.out.write_all(b"&lt;").map_err(Self::io)?,
                b'>' => self.out.write_all(b"&gt;").map_err(Self::io)?,
                b if b < 0x20 || b == 0x7f => {
                    write!(self.out, "&#{b};").map_err(Self::io)?;
                }
                b => self.out.write_all(&[b]).map_err(Self::io)?,
            }
        }
        Ok(())
    }

    fn cell_open(&mut self, cell_type: &str) -> Result<(), StreamError> {
        write!(self.out, "<Cell><Data ss:Type=\"{cell_type}\">").map_err(Self::io)
    }

    fn cell_close(&mut self) -> Result<(), StreamError> {
        self.out.write_all(b"</Data></Cell>").map_err(Self::io)
    }

    /// Cell type for a string value: date-ish subtypes become `DateTime`.
    fn string_cell_type(hint: &Value) -> &'static str {
        match hint.get_subtype() {
            Subtype::DATE | Subtype::TIME | Subtype::DATETIME => "DateTime",
            _ => "String",
        }
    }
}

impl<W: Write> StreamHandler for XlsWriter<W> {
    fn begin(&mut self) -> Result<(), StreamError> {
        trace!("xls writer: document start ({:?} scope)", self.scope);
        if self.scope != Scope::Table && self.worksheet_name.contains(NAME_FORBIDDEN) {
            return Err(StreamError::new(datalith::StreamErrorKind::InvalidDocument(
                "worksheet name cannot contain any of '\\/?*[]'".into(),
            )));
        }
        if self.scope == Scope::Document {
            self.out
                .write_all(
                    b"<?xml version=\"1.0\" encoding=\"UTF-8\"?>\r\n\
                      <?mso-application progid=\"Excel.Sheet\"?>",
                )
                .map_err(Self::io)?;
        }
        if self.scope == Scope::Document || self.scope == Scope::Workbook {
            self.out
                .write_all(
                    b"<Workbook xmlns=\"urn:schemas-microsoft-com:office:spreadsheet\"\
                      \x20xmlns:c=\"urn:schemas-microsoft-com:office:component:spreadsheet\"\
                      \x20xmlns:html=\"http://www.w3.org/TR/REC-html40\"\
                      \x20xmlns:o=\"urn:schemas-microsoft-com:office:office\"\
                      \x20xmlns:ss=\"urn:schemas-microsoft-com:office:spreadsheet\"\
                      \x20xmlns:x2=\"http://schemas.microsoft.com/office/excel/2003/xml\"\
                      \x20xmlns:x=\"urn:schemas-microsoft-com:office:excel\"\
                      \x20xmlns:xsi=\"http://www.w3.org/2001/XMLSchema-instance\">",
                )
                .map_err(Self::io)?;
        }
        if self.scope != Scope::Table {
            self.out.write_all(b"<Worksheet ss:Name=\"").map_err(Self::io)?;
            let name = std::mem::take(&mut self.worksheet_name);
            self.write_escaped(name.as_bytes())?;
            self.worksheet_name = name;
            self.out.write_all(b"\">").map_err(Self::io)?;
        }
        self.out.write_all(b"<Table>").map_err(Self::io)
    }

    fn end(&mut self) -> Result<(), StreamError> {
        self.out.write_all(b"</Table>").map_err(Self::io)?;
        if self.scope != Scope::Table {
            self.out.write_all(b"</Worksheet>").map_err(Self::io)?;
        }
        if self.scope == Scope::Document || self.scope == Scope::Workbook {
            self.out.write_all(b"</Workbook>").map_err(Self::io)?;
        }
        Ok(())
    }

    fn begin_array(&mut self, _hint: &Value, _size: Option<usize>) -> Result<(), StreamError> {
        match self.array_depth {
            // The top-level array is the table itself.
            0 => {}
            // A nested array opens a row.
            1 => self.out.write_all(b"<Row>").map_err(Self::io)?,
            _ => return Err(StreamError::unsupported("'array' value in row output")),
        }
        self.array_depth += 1;
        Ok(())
    }

    fn end_array(&mut self, _hint: &Value) -> Result<(), StreamError> {
        self.array_depth -= 1;
        if self.array_depth == 1 {
            self.out.write_all(b"</Row>").map_err(Self::io)?;
        }
        Ok(())
    }

    fn begin_object(&mut self, _hint: &Value, _size: Option<usize>) -> Result<(), StreamError> {
        Err(StreamError::unsupported("'object' value in output"))
    }

    fn end_object(&mut self, _hint: &Value) -> Result<(), StreamError> {
        Err(StreamError::unsupported("'object' value in output"))
    }

    fn begin_string(&mut self, hint: &Value, _size: Option<usize>) -> Result<(), StreamError> {
        self.cell_open(Self::string_cell_type(hint))?;
        self.in_string_cell = true;
        Ok(())
    }

    fn append_to_string(&mut self, chunk: &[u8]) -> Result<(), StreamError> {
        if !self.in_string_cell {
            return Err(StreamError::malformed("append_to_string outside a string"));
        }
        self.write_escaped(chunk)
    }

    fn end_string(&mut self, _hint: &Value) -> Result<(), StreamError> {
        self.in_string_cell = false;
        self.cell_close()
    }

    fn null_value(&mut self, _v: &Value) -> Result<(), StreamError> {
        // Absence renders as an empty string cell.
        self.cell_open("String")?;
        self.cell_close()
    }

    fn bool_value(&mut self, v: &Value) -> Result<(), StreamError> {
        self.cell_open("Boolean")?;
        write!(self.out, "{}", v.as_int()).map_err(Self::io)?;
        self.cell_close()
    }

    fn integer_value(&mut self, v: &Value) -> Result<(), StreamError> {
        self.cell_open("Number")?;
        write!(self.out, "{}", v.get_int_unchecked()).map_err(Self::io)?;
        self.cell_close()
    }

    fn uinteger_value(&mut self, v: &Value) -> Result<(), StreamError> {
        self.cell_open("Number")?;
        write!(self.out, "{}", v.get_uint_unchecked()).map_err(Self::io)?;
        self.cell_close()
    }

    fn real_value(&mut self, v: &Value) -> Result<(), StreamError> {
        self.cell_open("Number")?;
        write!(self.out, "{}", v.get_real_unchecked()).map_err(Self::io)?;
        self.cell_close()
    }
}
