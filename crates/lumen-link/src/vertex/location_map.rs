use std::fmt;
use std::str::FromStr;

use thiserror::Error;

use crate::limits::MAX_VERTEX_ATTRIBUTE_LOCATIONS;

/// Meaning of a vertex attribute, independent of the identifier the shader gives it.
///
/// `Attr(n)` are generic, user-defined semantics. They live in their own namespace but share the
/// numeric location space with the built-in semantics, so a mesh format mixing both must avoid
/// overlapping locations.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum Semantic {
    Position,
    Normal,
    Tangent,
    BlendWeight,
    BlendIndices,
    Color,
    TexCoord(u8),
    Attr(u8),
}

impl Semantic {
    pub const MAX_TEXCOORD: u8 = 7;
    pub const MAX_ATTR: u8 = 15;
}

impl fmt::Display for Semantic {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Semantic::Position => f.write_str("POSITION"),
            Semantic::Normal => f.write_str("NORMAL"),
            Semantic::Tangent => f.write_str("TANGENT"),
            Semantic::BlendWeight => f.write_str("BLENDWEIGHT"),
            Semantic::BlendIndices => f.write_str("BLENDINDICES"),
            Semantic::Color => f.write_str("COLOR"),
            Semantic::TexCoord(n) => write!(f, "TEXCOORD{n}"),
            Semantic::Attr(n) => write!(f, "ATTR{n}"),
        }
    }
}

#[derive(Debug, Error, Clone, PartialEq, Eq)]
#[error("unknown vertex semantic `{0}`")]
pub struct ParseSemanticError(pub String);

impl FromStr for Semantic {
    type Err = ParseSemanticError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let indexed = |prefix: &str, max: u8| -> Option<u8> {
            let digits = s.strip_prefix(prefix)?;
            if digits.is_empty() || !digits.bytes().all(|b| b.is_ascii_digit()) {
                return None;
            }
            digits.parse::<u8>().ok().filter(|&n| n <= max)
        };

        let semantic = match s {
            "POSITION" => Semantic::Position,
            "NORMAL" => Semantic::Normal,
            "TANGENT" => Semantic::Tangent,
            "BLENDWEIGHT" => Semantic::BlendWeight,
            "BLENDINDICES" => Semantic::BlendIndices,
            "COLOR" => Semantic::Color,
            _ => {
                if let Some(n) = indexed("TEXCOORD", Semantic::MAX_TEXCOORD) {
                    Semantic::TexCoord(n)
                } else if let Some(n) = indexed("ATTR", Semantic::MAX_ATTR) {
                    Semantic::Attr(n)
                } else {
                    return Err(ParseSemanticError(s.to_owned()));
                }
            }
        };
        Ok(semantic)
    }
}

/// Map vertex semantics to GLSL `layout(location = n)` values.
pub trait SemanticLocationMap: fmt::Debug + Send + Sync {
    fn location_for(&self, semantic: Semantic) -> Result<u32, LocationMapError>;
}

/// The fixed semantic table hosts bind their vertex buffers against.
///
/// | semantic        | location |
/// |-----------------|----------|
/// | POSITION        | 0        |
/// | NORMAL          | 1        |
/// | BLENDWEIGHT     | 2        |
/// | BLENDINDICES    | 3        |
/// | COLOR           | 4        |
/// | TEXCOORD0..7    | 5..12    |
/// | TANGENT         | 13       |
/// | ATTR0..15       | 0..15    |
#[derive(Debug, Default, Clone, Copy)]
pub struct StandardLocationMap;

impl SemanticLocationMap for StandardLocationMap {
    fn location_for(&self, semantic: Semantic) -> Result<u32, LocationMapError> {
        let location = match semantic {
            Semantic::Position => 0,
            Semantic::Normal => 1,
            Semantic::BlendWeight => 2,
            Semantic::BlendIndices => 3,
            Semantic::Color => 4,
            Semantic::TexCoord(n @ 0..=Semantic::MAX_TEXCOORD) => 5 + n as u32,
            Semantic::Tangent => 13,
            Semantic::Attr(n) if (n as u32) < MAX_VERTEX_ATTRIBUTE_LOCATIONS => n as u32,
            _ => return Err(LocationMapError::UnsupportedSemantic { semantic }),
        };
        Ok(location)
    }
}

#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum LocationMapError {
    #[error("unsupported vertex semantic {semantic} for location mapping")]
    UnsupportedSemantic { semantic: Semantic },
}
