//! PLY header data structures.

use std::fmt;

/// Payload encoding declared by the header's `format` line.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Encoding {
    Ascii,
    BinaryLittleEndian,
    BinaryBigEndian,
}

impl Encoding {
    /// Parse the format literal from the header. Any other literal is
    /// rejected by the caller.
    pub fn from_literal(literal: &str) -> Option<Self> {
        match literal {
            "ascii" => Some(Self::Ascii),
            "binary_little_endian" => Some(Self::BinaryLittleEndian),
            "binary_big_endian" => Some(Self::BinaryBigEndian),
            _ => None,
        }
    }

    /// The literal as it appears in a header `format` line.
    pub fn literal(&self) -> &'static str {
        match self {
            Self::Ascii => "ascii",
            Self::BinaryLittleEndian => "binary_little_endian",
            Self::BinaryBigEndian => "binary_big_endian",
        }
    }
}

/// Scalar property types recognized in a PLY header.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ScalarType {
    Int8,
    UInt8,
    Int16,
    UInt16,
    Int32,
    UInt32,
    Float32,
    Float64,
}

impl ScalarType {
    /// Parse a type name. Both the classic names (`char`, `uchar`, ...)
    /// and the sized aliases (`int8`, `uint8`, ...) are accepted.
    pub fn from_name(name: &str) -> Option<Self> {
        match name {
            "char" | "int8" => Some(Self::Int8),
            "uchar" | "uint8" => Some(Self::UInt8),
            "short" | "int16" => Some(Self::Int16),
            "ushort" | "uint16" => Some(Self::UInt16),
            "int" | "int32" => Some(Self::Int32),
            "uint" | "uint32" => Some(Self::UInt32),
            "float" | "float32" => Some(Self::Float32),
            "double" | "float64" => Some(Self::Float64),
            _ => None,
        }
    }

    /// Field width in bytes for binary payloads.
    pub fn size(&self) -> usize {
        match self {
            Self::Int8 | Self::UInt8 => 1,
            Self::Int16 | Self::UInt16 => 2,
            Self::Int32 | Self::UInt32 | Self::Float32 => 4,
            Self::Float64 => 8,
        }
    }

    /// The classic header name for this type.
    pub fn name(&self) -> &'static str {
        match self {
            Self::Int8 => "char",
            Self::UInt8 => "uchar",
            Self::Int16 => "short",
            Self::UInt16 => "ushort",
            Self::Int32 => "int",
            Self::UInt32 => "uint",
            Self::Float32 => "float",
            Self::Float64 => "double",
        }
    }
}

/// One property of an element, in header order.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Property {
    pub name: String,
    pub dtype: ScalarType,
    /// Count type for `property list` declarations. List properties are
    /// recorded but never materialized into vertex columns.
    pub list_count: Option<ScalarType>,
}

impl Property {
    pub fn is_list(&self) -> bool {
        self.list_count.is_some()
    }
}

/// One element declaration: a named block of `count` rows.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Element {
    pub name: String,
    pub count: usize,
    pub properties: Vec<Property>,
}

/// Parsed PLY header: encoding, format version, and elements in file order.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PlyHeader {
    pub encoding: Encoding,
    /// Format version as (major, minor).
    pub version: (u32, u32),
    pub elements: Vec<Element>,
}

impl PlyHeader {
    /// Find an element by name.
    pub fn element(&self, name: &str) -> Option<&Element> {
        self.elements.iter().find(|e| e.name == name)
    }
}

impl fmt::Display for PlyHeader {
    /// Reconstructs the header text, used for diagnostic logs.
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "ply")?;
        writeln!(
            f,
            "format {} {}.{}",
            self.encoding.literal(),
            self.version.0,
            self.version.1
        )?;
        for element in &self.elements {
            writeln!(f, "element {} {}", element.name, element.count)?;
            for prop in &element.properties {
                match prop.list_count {
                    Some(count) => writeln!(
                        f,
                        "property list {} {} {}",
                        count.name(),
                        prop.dtype.name(),
                        prop.name
                    )?,
                    None => writeln!(f, "property {} {}", prop.dtype.name(), prop.name)?,
                }
            }
        }
        write!(f, "end_header")
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_encoding_literals() {
        assert_eq!(Encoding::from_literal("ascii"), Some(Encoding::Ascii));
        assert_eq!(
            Encoding::from_literal("binary_little_endian"),
            Some(Encoding::BinaryLittleEndian)
        );
        assert_eq!(
            Encoding::from_literal("binary_big_endian"),
            Some(Encoding::BinaryBigEndian)
        );
        assert_eq!(Encoding::from_literal("binary"), None);
    }

    #[test]
    fn test_scalar_type_aliases() {
        assert_eq!(ScalarType::from_name("float"), Some(ScalarType::Float32));
        assert_eq!(ScalarType::from_name("float32"), Some(ScalarType::Float32));
        assert_eq!(ScalarType::from_name("uchar"), Some(ScalarType::UInt8));
        assert_eq!(ScalarType::from_name("uint8"), Some(ScalarType::UInt8));
        assert_eq!(ScalarType::from_name("half"), None);
    }

    #[test]
    fn test_scalar_type_sizes() {
        assert_eq!(ScalarType::Int8.size(), 1);
        assert_eq!(ScalarType::UInt16.size(), 2);
        assert_eq!(ScalarType::Float32.size(), 4);
        assert_eq!(ScalarType::Float64.size(), 8);
    }

    #[test]
    fn test_header_display_round_trips_names() {
        let header = PlyHeader {
            encoding: Encoding::BinaryLittleEndian,
            version: (1, 0),
            elements: vec![Element {
                name: "vertex".to_string(),
                count: 2,
                properties: vec![
                    Property {
                        name: "x".to_string(),
                        dtype: ScalarType::Float32,
                        list_count: None,
                    },
                    Property {
                        name: "vertex_indices".to_string(),
                        dtype: ScalarType::Int32,
                        list_count: Some(ScalarType::UInt8),
                    },
                ],
            }],
        };

        let text = header.to_string();
        assert!(text.starts_with("ply\nformat binary_little_endian 1.0\n"));
        assert!(text.contains("element vertex 2\n"));
        assert!(text.contains("property float x\n"));
        assert!(text.contains("property list uchar int vertex_indices\n"));
        assert!(text.ends_with("end_header"));
    }
}
