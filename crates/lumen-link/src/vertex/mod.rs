//! Vertex attribute inputs: semantics, their fixed locations, and the host-side element formats
//! that decide whether an attribute needs an integer shadow input.

mod attributes;
mod format;
mod location_map;

pub use attributes::{assign_attributes, AttributeBinding, AttributeBlock};
pub use format::{NoVertexFormats, VertexDataType, VertexElementFormat, VertexFormatLookup};
pub use location_map::{
    LocationMapError, ParseSemanticError, Semantic, SemanticLocationMap, StandardLocationMap,
};
