//! Lumen shader tooling.
//!
//! The workspace currently ships one component, the vertex/fragment interface linker in
//! [`link`]. Its main types are re-exported at the top level.

pub use lumen_link as link;

pub use lumen_link::{
    LinkCache, LinkError, LinkInput, LinkOptions, LinkedShader, PreparedScope, ResourceScope,
    Semantic, ShaderLinker, ShaderStage,
};
