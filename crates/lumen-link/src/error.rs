use thiserror::Error;

use crate::scan::DeclKeyword;
use crate::stage::ShaderStage;
use crate::vertex::{LocationMapError, Semantic};

/// Failure of a single link call.
///
/// Every variant is terminal: the linker never returns a partially linked shader. Variants carry
/// the stage and the offending declaration text (or identifier) so hosts can attribute the
/// failure to a source line without re-scanning.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum LinkError {
    #[error("{stage} shader source is {len} bytes, exceeding the maximum of {max} bytes")]
    SourceTooLarge {
        stage: ShaderStage,
        len: usize,
        max: usize,
    },

    #[error("{stage} shader line {line}: `{keyword}` declaration has no terminating `;`")]
    MalformedDeclaration {
        stage: ShaderStage,
        keyword: DeclKeyword,
        line: usize,
    },

    #[error("{stage} shader: invalid `{keyword}` declaration `{text}`")]
    InvalidDeclaration {
        stage: ShaderStage,
        keyword: DeclKeyword,
        text: String,
    },

    #[error("{stage} shader: invalid uniform declaration `{text}`")]
    InvalidUniformLine { stage: ShaderStage, text: String },

    #[error(
        "{stage} shader: only single uniforms with a literal array size of 1 are supported: `{text}`"
    )]
    UnsupportedUniformArray { stage: ShaderStage, text: String },

    #[error(
        "{stage} shader: a comma on a uniform line is not supported, split it into multiple uniforms: `{text}`"
    )]
    MultiDeclarationUniform { stage: ShaderStage, text: String },

    #[error("uniform `{name}` is declared with conflicting text: `{first}` vs `{second}`")]
    ConflictingUniformRedeclaration {
        name: String,
        first: String,
        second: String,
    },

    #[error("{stage} shader: uniform type `{type_name}` is not recognized in `{text}`")]
    UnrecognizedUniformType {
        stage: ShaderStage,
        type_name: String,
        text: String,
    },

    #[error("uniform `{name}` of type `{type_name}` has no byte size")]
    UnknownUniformByteSize { name: String, type_name: String },

    #[error("vertex attribute `{name}`: {source}")]
    AttributeSemantic {
        name: String,
        #[source]
        source: LocationMapError,
    },

    #[error("vertex attributes {first} and {second} are both mapped to location {location}")]
    AttributeLocationCollision {
        location: u32,
        first: Semantic,
        second: Semantic,
    },

    #[error("vertex shader declares varying `{name}` more than once")]
    DuplicateVarying { name: String },

    #[error(
        "fragment shader requires varying `{name}` but the vertex shader does not produce it: `{text}`"
    )]
    MissingVaryingProducer { name: String, text: String },

    #[error("{count} external scopes leave no bind group for mesh resources ({groups} groups)")]
    TooManyScopes { count: usize, groups: usize },
}
