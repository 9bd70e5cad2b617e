use std::collections::{BTreeMap, HashMap};

use crate::vertex::Semantic;

/// Numeric storage type of a vertex buffer element.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum VertexDataType {
    Int8,
    Uint8,
    Int16,
    Uint16,
    Int32,
    Uint32,
    Float16,
    Float32,
}

impl VertexDataType {
    pub fn is_float(self) -> bool {
        matches!(self, VertexDataType::Float16 | VertexDataType::Float32)
    }

    pub fn is_signed_int(self) -> bool {
        matches!(
            self,
            VertexDataType::Int8 | VertexDataType::Int16 | VertexDataType::Int32
        )
    }
}

/// How the host stores one vertex element.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct VertexElementFormat {
    pub data_type: VertexDataType,
    /// Integer data fetched as normalized floats (`unorm`/`snorm`).
    pub normalized: bool,
}

impl VertexElementFormat {
    pub fn new(data_type: VertexDataType, normalized: bool) -> Self {
        Self {
            data_type,
            normalized,
        }
    }

    /// Integer data that reaches the shader as integers and must be converted to float there.
    pub fn needs_float_conversion(self) -> bool {
        !self.data_type.is_float() && !self.normalized
    }
}

/// Lookup of the host vertex element backing a semantic.
pub trait VertexFormatLookup {
    fn element(&self, semantic: Semantic) -> Option<VertexElementFormat>;
}

impl VertexFormatLookup for HashMap<Semantic, VertexElementFormat> {
    fn element(&self, semantic: Semantic) -> Option<VertexElementFormat> {
        self.get(&semantic).copied()
    }
}

impl VertexFormatLookup for BTreeMap<Semantic, VertexElementFormat> {
    fn element(&self, semantic: Semantic) -> Option<VertexElementFormat> {
        self.get(&semantic).copied()
    }
}

/// Lookup for hosts that only ever feed float (or normalized) vertex data.
#[derive(Debug, Default, Clone, Copy)]
pub struct NoVertexFormats;

impl VertexFormatLookup for NoVertexFormats {
    fn element(&self, _semantic: Semantic) -> Option<VertexElementFormat> {
        None
    }
}
