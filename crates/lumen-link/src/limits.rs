//! Centralized limits for shader source linking.
//!
//! Shader sources reach the linker from content pipelines and user-authored material chunks, so
//! they are treated as untrusted input. These limits bound the work a single link call can do.

/// Maximum accepted length of one shader stage source, in bytes.
///
/// Real-world generated shaders (including all chunk expansions) stay well below this; anything
/// larger is almost certainly a runaway preprocessor expansion.
pub const MAX_SHADER_SOURCE_BYTES: usize = 1024 * 1024; // 1 MiB

/// Number of vertex input locations the semantic tables may hand out (`0..16`).
///
/// This is WebGPU's guaranteed minimum `maxVertexAttributes`.
pub const MAX_VERTEX_ATTRIBUTE_LOCATIONS: u32 = 16;
