//! Shader interface linker.
//!
//! Takes a vertex/fragment source pair written with implicit `attribute`, `varying`, `out` and
//! `uniform` declarations and rewrites both stages to explicit locations and bind group layouts:
//! - vertex attributes get the location of their semantic (see [`vertex::StandardLocationMap`]);
//! - varyings get matching locations in both stages;
//! - value uniforms not provided by an external [`ResourceScope`] are packed into one `std140`
//!   uniform buffer in the mesh bind group, and textures become separate texture/sampler pairs.
//!
//! The entry point is [`ShaderLinker::link`]; [`LinkCache`] memoizes results by content hash.
#![forbid(unsafe_code)]

pub mod bindings;
pub mod cache;
mod emit;
pub mod error;
mod interface;
pub mod layout;
pub mod limits;
pub mod link;
pub mod scan;
pub mod scope;
pub mod stage;
pub mod tables;
pub mod uniform;
pub mod varying;
pub mod vertex;

pub use bindings::{
    BindGroupNames, BindingTable, BufferBinding, HighPrecisionSampling, SampleType,
    TextureBinding, TextureDimension,
};
pub use cache::{LinkCache, LinkCacheLookup, LinkCacheLookupSource, LinkCacheStats};
pub use error::LinkError;
pub use layout::{UniformBufferLayout, UniformFieldLayout};
pub use link::{LinkInput, LinkOptions, LinkedShader, ShaderLinker};
pub use scope::{PreparedScope, ResourceScope};
pub use stage::{ShaderStage, ShaderStages};
pub use tables::LinkTables;
pub use vertex::{
    NoVertexFormats, Semantic, SemanticLocationMap, StandardLocationMap, VertexDataType,
    VertexElementFormat, VertexFormatLookup,
};
