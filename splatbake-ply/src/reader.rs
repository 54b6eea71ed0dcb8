//! Header parsing and columnar payload extraction.

use std::collections::HashMap;

use tracing::debug;

use crate::error::ParseError;
use crate::header::{Element, Encoding, PlyHeader, Property, ScalarType};

/// The conventional name of the point element in splat PLY files.
const VERTEX_ELEMENT: &str = "vertex";

/// Owned per-property columns extracted from the vertex element.
///
/// Every scalar value is widened to f64 on extraction, regardless of its
/// declared source type, so downstream code never deals with mixed widths.
/// All columns have identical length equal to the vertex row count.
#[derive(Debug, Clone, Default)]
pub struct VertexColumns {
    rows: usize,
    columns: HashMap<String, Vec<f64>>,
}

impl VertexColumns {
    /// Build columns directly from owned arrays, e.g. for synthetic data.
    ///
    /// # Panics
    ///
    /// Panics if the columns do not all share one length.
    pub fn from_columns(columns: HashMap<String, Vec<f64>>) -> Self {
        let rows = columns.values().next().map_or(0, Vec::len);
        assert!(
            columns.values().all(|c| c.len() == rows),
            "vertex columns must all have identical length"
        );
        Self { rows, columns }
    }

    /// Number of vertex rows.
    pub fn rows(&self) -> usize {
        self.rows
    }

    /// Whether a property column is present.
    pub fn contains(&self, name: &str) -> bool {
        self.columns.contains_key(name)
    }

    /// Look up a column by property name.
    pub fn column(&self, name: &str) -> Option<&[f64]> {
        self.columns.get(name).map(Vec::as_slice)
    }

    /// Iterate over property names in arbitrary order.
    pub fn names(&self) -> impl Iterator<Item = &str> {
        self.columns.keys().map(String::as_str)
    }
}

/// Parse a PLY byte buffer into its header and the vertex element's
/// columns. Pure over the input; performs no I/O.
pub fn parse(bytes: &[u8]) -> Result<(PlyHeader, VertexColumns), ParseError> {
    let (header, body_start) = parse_header(bytes)?;
    debug!(
        encoding = header.encoding.literal(),
        elements = header.elements.len(),
        "parsed PLY header"
    );

    let columns = match header.encoding {
        Encoding::Ascii => read_ascii_columns(&header, &bytes[body_start..])?,
        Encoding::BinaryLittleEndian | Encoding::BinaryBigEndian => {
            read_binary_columns(&header, &bytes[body_start..])?
        }
    };

    Ok((header, columns))
}

/// Parse the textual header. Returns the header and the byte offset at
/// which the payload begins.
fn parse_header(bytes: &[u8]) -> Result<(PlyHeader, usize), ParseError> {
    let mut cursor = LineCursor::new(bytes);

    let magic = cursor
        .next_line()?
        .ok_or_else(|| ParseError::InvalidHeader("empty input".to_string()))?;
    if magic.trim() != "ply" {
        return Err(ParseError::InvalidHeader(format!(
            "missing ply magic, found {:?}",
            magic.trim()
        )));
    }

    let mut encoding = None;
    let mut version = (1, 0);
    let mut elements: Vec<Element> = Vec::new();

    loop {
        let line = cursor.next_line()?.ok_or_else(|| {
            ParseError::InvalidHeader("header ended without end_header".to_string())
        })?;
        let mut tokens = line.split_whitespace();
        let Some(keyword) = tokens.next() else {
            continue;
        };

        match keyword {
            "comment" | "obj_info" => {}
            "format" => {
                let literal = tokens
                    .next()
                    .ok_or_else(|| ParseError::InvalidHeader("format line missing encoding".to_string()))?;
                encoding = Some(Encoding::from_literal(literal).ok_or_else(|| {
                    ParseError::InvalidHeader(format!("unrecognized encoding {literal:?}"))
                })?);
                let version_token = tokens
                    .next()
                    .ok_or_else(|| ParseError::InvalidHeader("format line missing version".to_string()))?;
                version = parse_version(version_token)?;
            }
            "element" => {
                let name = tokens
                    .next()
                    .ok_or_else(|| ParseError::InvalidHeader("element line missing name".to_string()))?;
                let count = tokens
                    .next()
                    .and_then(|t| t.parse::<usize>().ok())
                    .ok_or_else(|| {
                        ParseError::InvalidHeader(format!("element {name:?} has no valid row count"))
                    })?;
                elements.push(Element {
                    name: name.to_string(),
                    count,
                    properties: Vec::new(),
                });
            }
            "property" => {
                let element = elements.last_mut().ok_or_else(|| {
                    ParseError::InvalidHeader("property declared before any element".to_string())
                })?;
                element.properties.push(parse_property(&mut tokens)?);
            }
            "end_header" => break,
            other => {
                return Err(ParseError::InvalidHeader(format!(
                    "unrecognized header keyword {other:?}"
                )));
            }
        }
    }

    let encoding = encoding
        .ok_or_else(|| ParseError::InvalidHeader("header has no format line".to_string()))?;

    Ok((
        PlyHeader {
            encoding,
            version,
            elements,
        },
        cursor.offset(),
    ))
}

fn parse_version(token: &str) -> Result<(u32, u32), ParseError> {
    let (major, minor) = token
        .split_once('.')
        .ok_or_else(|| ParseError::InvalidHeader(format!("malformed version {token:?}")))?;
    let parsed = (major.parse::<u32>(), minor.parse::<u32>());
    match parsed {
        (Ok(major), Ok(minor)) => Ok((major, minor)),
        _ => Err(ParseError::InvalidHeader(format!(
            "malformed version {token:?}"
        ))),
    }
}

fn parse_property<'a>(
    tokens: &mut impl Iterator<Item = &'a str>,
) -> Result<Property, ParseError> {
    let first = tokens
        .next()
        .ok_or_else(|| ParseError::InvalidHeader("property line missing type".to_string()))?;

    let (list_count, dtype) = if first == "list" {
        let count_name = tokens
            .next()
            .ok_or_else(|| ParseError::InvalidHeader("list property missing count type".to_string()))?;
        let count = scalar_type(count_name)?;
        let type_name = tokens
            .next()
            .ok_or_else(|| ParseError::InvalidHeader("list property missing value type".to_string()))?;
        (Some(count), scalar_type(type_name)?)
    } else {
        (None, scalar_type(first)?)
    };

    let name = tokens
        .next()
        .ok_or_else(|| ParseError::InvalidHeader("property line missing name".to_string()))?;

    Ok(Property {
        name: name.to_string(),
        dtype,
        list_count,
    })
}

fn scalar_type(name: &str) -> Result<ScalarType, ParseError> {
    ScalarType::from_name(name)
        .ok_or_else(|| ParseError::InvalidHeader(format!("unrecognized property type {name:?}")))
}

/// Extract vertex columns from an ASCII payload: one line per row, one
/// whitespace-delimited token per scalar field.
fn read_ascii_columns(header: &PlyHeader, body: &[u8]) -> Result<VertexColumns, ParseError> {
    let mut cursor = LineCursor::new(body);
    let mut result = VertexColumns::default();
    let mut vertex_done = false;

    for element in &header.elements {
        let is_vertex = element.name == VERTEX_ELEMENT && !vertex_done;

        let mut columns: Vec<Vec<f64>> = if is_vertex {
            element
                .properties
                .iter()
                .map(|_| Vec::with_capacity(element.count))
                .collect()
        } else {
            Vec::new()
        };

        for _ in 0..element.count {
            let line = next_data_line(&mut cursor)?;
            let mut tokens = line.split_whitespace();

            for (slot, prop) in element.properties.iter().enumerate() {
                match prop.list_count {
                    Some(_) => {
                        // List fields are never materialized; consume the
                        // count and that many values.
                        let count = parse_token(&mut tokens)? as usize;
                        for _ in 0..count {
                            parse_token(&mut tokens)?;
                        }
                    }
                    None => {
                        let value = parse_token(&mut tokens)?;
                        if is_vertex {
                            columns[slot].push(value);
                        }
                    }
                }
            }
        }

        if is_vertex {
            vertex_done = true;
            result.rows = element.count;
            for (slot, prop) in element.properties.iter().enumerate() {
                if !prop.is_list() {
                    result
                        .columns
                        .insert(prop.name.clone(), std::mem::take(&mut columns[slot]));
                }
            }
        }
    }

    Ok(result)
}

fn next_data_line<'a>(cursor: &mut LineCursor<'a>) -> Result<&'a str, ParseError> {
    loop {
        match cursor.next_line()? {
            Some(line) if line.trim().is_empty() => continue,
            Some(line) => return Ok(line),
            None => return Err(ParseError::UnexpectedToken("<end of data>".to_string())),
        }
    }
}

fn parse_token<'a>(tokens: &mut impl Iterator<Item = &'a str>) -> Result<f64, ParseError> {
    let token = tokens
        .next()
        .ok_or_else(|| ParseError::UnexpectedToken("<end of row>".to_string()))?;
    token
        .parse::<f64>()
        .map_err(|_| ParseError::UnexpectedToken(token.to_string()))
}

/// Extract vertex columns from a binary payload. Each row is the
/// concatenation of every property's typed field in declared order, byte
/// order per the detected encoding.
fn read_binary_columns(header: &PlyHeader, body: &[u8]) -> Result<VertexColumns, ParseError> {
    let mut offset = 0usize;
    let mut result = VertexColumns::default();
    let mut vertex_done = false;

    for element in &header.elements {
        let is_vertex = element.name == VERTEX_ELEMENT && !vertex_done;

        // Fast skip for fixed-width elements we do not extract.
        if !is_vertex && element.properties.iter().all(|p| !p.is_list()) {
            let row_size: usize = element.properties.iter().map(|p| p.dtype.size()).sum();
            take(body, &mut offset, row_size.saturating_mul(element.count))?;
            continue;
        }

        let mut columns: Vec<Vec<f64>> = if is_vertex {
            element
                .properties
                .iter()
                .map(|_| Vec::with_capacity(element.count))
                .collect()
        } else {
            Vec::new()
        };

        for _ in 0..element.count {
            for (slot, prop) in element.properties.iter().enumerate() {
                match prop.list_count {
                    Some(count_type) => {
                        let raw = take(body, &mut offset, count_type.size())?;
                        let count = decode_scalar(raw, count_type, header.encoding) as usize;
                        take(body, &mut offset, count * prop.dtype.size())?;
                    }
                    None => {
                        let raw = take(body, &mut offset, prop.dtype.size())?;
                        if is_vertex {
                            columns[slot].push(decode_scalar(raw, prop.dtype, header.encoding));
                        }
                    }
                }
            }
        }

        if is_vertex {
            vertex_done = true;
            result.rows = element.count;
            for (slot, prop) in element.properties.iter().enumerate() {
                if !prop.is_list() {
                    result
                        .columns
                        .insert(prop.name.clone(), std::mem::take(&mut columns[slot]));
                }
            }
        }
    }

    Ok(result)
}

fn take<'a>(body: &'a [u8], offset: &mut usize, size: usize) -> Result<&'a [u8], ParseError> {
    let available = body.len() - *offset;
    if size > available {
        return Err(ParseError::Truncated {
            needed: size - available,
            available,
        });
    }
    let slice = &body[*offset..*offset + size];
    *offset += size;
    Ok(slice)
}

/// Decode one scalar field, widening to f64.
fn decode_scalar(raw: &[u8], dtype: ScalarType, encoding: Encoding) -> f64 {
    let be = encoding == Encoding::BinaryBigEndian;
    match dtype {
        ScalarType::Int8 => raw[0] as i8 as f64,
        ScalarType::UInt8 => raw[0] as f64,
        ScalarType::Int16 => {
            let b: [u8; 2] = raw.try_into().unwrap();
            (if be { i16::from_be_bytes(b) } else { i16::from_le_bytes(b) }) as f64
        }
        ScalarType::UInt16 => {
            let b: [u8; 2] = raw.try_into().unwrap();
            (if be { u16::from_be_bytes(b) } else { u16::from_le_bytes(b) }) as f64
        }
        ScalarType::Int32 => {
            let b: [u8; 4] = raw.try_into().unwrap();
            (if be { i32::from_be_bytes(b) } else { i32::from_le_bytes(b) }) as f64
        }
        ScalarType::UInt32 => {
            let b: [u8; 4] = raw.try_into().unwrap();
            (if be { u32::from_be_bytes(b) } else { u32::from_le_bytes(b) }) as f64
        }
        ScalarType::Float32 => {
            let b: [u8; 4] = raw.try_into().unwrap();
            (if be { f32::from_be_bytes(b) } else { f32::from_le_bytes(b) }) as f64
        }
        ScalarType::Float64 => {
            let b: [u8; 8] = raw.try_into().unwrap();
            if be { f64::from_be_bytes(b) } else { f64::from_le_bytes(b) }
        }
    }
}

/// Line-oriented cursor over a byte buffer. Lines end at `\n`; a trailing
/// `\r` is stripped so CRLF files parse the same as LF files.
struct LineCursor<'a> {
    bytes: &'a [u8],
    offset: usize,
}

impl<'a> LineCursor<'a> {
    fn new(bytes: &'a [u8]) -> Self {
        Self { bytes, offset: 0 }
    }

    fn offset(&self) -> usize {
        self.offset
    }

    fn next_line(&mut self) -> Result<Option<&'a str>, ParseError> {
        if self.offset >= self.bytes.len() {
            return Ok(None);
        }
        let rest = &self.bytes[self.offset..];
        let (line, consumed) = match rest.iter().position(|&b| b == b'\n') {
            Some(pos) => (&rest[..pos], pos + 1),
            None => (rest, rest.len()),
        };
        self.offset += consumed;

        let line = match line.last() {
            Some(b'\r') => &line[..line.len() - 1],
            _ => line,
        };
        std::str::from_utf8(line)
            .map(Some)
            .map_err(|_| ParseError::InvalidHeader("non-UTF8 header line".to_string()))
    }
}
