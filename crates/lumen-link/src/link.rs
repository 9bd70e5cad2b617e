use std::collections::BTreeMap;

use tracing::debug;

use crate::bindings::{BindGroupNames, BindingTable, HighPrecisionSampling};
use crate::emit::emit_stage;
use crate::error::LinkError;
use crate::layout::UniformBufferLayout;
use crate::scan::{scan, DeclKeyword, ScanResult};
use crate::scope::{build_scope_resources, scope_provider, PreparedScope, ResourceScope};
use crate::stage::ShaderStage;
use crate::tables::LinkTables;
use crate::uniform::{merge_uniforms, UniformDeclaration};
use crate::varying::{assign_outputs, match_varyings, OutputBinding, VaryingBinding};
use crate::vertex::{
    assign_attributes, AttributeBinding, NoVertexFormats, Semantic, VertexFormatLookup,
};

#[derive(Debug, Clone, Default, PartialEq, Eq, Hash)]
pub struct LinkOptions {
    pub high_precision_sampling: HighPrecisionSampling,
    pub bind_groups: BindGroupNames,
}

/// Everything one link call reads. Nothing here is retained past the call.
#[derive(Clone, Copy)]
pub struct LinkInput<'a> {
    pub vertex: &'a str,
    pub fragment: &'a str,
    /// Attribute identifier → semantic. Attributes missing here are dropped from the output.
    pub attributes: &'a BTreeMap<String, Semantic>,
    pub vertex_formats: &'a dyn VertexFormatLookup,
    /// External scopes; scope `i` occupies bind group `i`.
    pub scopes: &'a [&'a dyn ResourceScope],
}

impl<'a> LinkInput<'a> {
    /// Input with float-only vertex data and no external scopes.
    pub fn new(
        vertex: &'a str,
        fragment: &'a str,
        attributes: &'a BTreeMap<String, Semantic>,
    ) -> Self {
        Self {
            vertex,
            fragment,
            attributes,
            vertex_formats: &NoVertexFormats,
            scopes: &[],
        }
    }

    pub fn with_vertex_formats(mut self, formats: &'a dyn VertexFormatLookup) -> Self {
        self.vertex_formats = formats;
        self
    }

    pub fn with_scopes(mut self, scopes: &'a [&'a dyn ResourceScope]) -> Self {
        self.scopes = scopes;
        self
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LinkedShader {
    pub vertex: String,
    pub fragment: String,
    /// Layout of the mesh group's uniform buffer; `None` when every value uniform is provided by
    /// an external scope (or there are none).
    pub uniform_buffer: Option<UniformBufferLayout>,
    /// Mesh group bindings.
    pub bindings: BindingTable,
    pub attributes: Vec<AttributeBinding>,
    /// Vertex varyings in declaration order.
    pub varyings: Vec<VaryingBinding>,
    pub outputs: Vec<OutputBinding>,
}

/// Rewrites a vertex/fragment pair to explicit locations and bindings.
///
/// A linker is immutable once built; all per-link state lives in the call.
#[derive(Debug, Clone, Default)]
pub struct ShaderLinker {
    tables: LinkTables,
    options: LinkOptions,
}

impl ShaderLinker {
    pub fn new(options: LinkOptions) -> Self {
        Self::with_tables(LinkTables::standard(), options)
    }

    pub fn with_tables(tables: LinkTables, options: LinkOptions) -> Self {
        Self { tables, options }
    }

    pub fn options(&self) -> &LinkOptions {
        &self.options
    }

    pub fn tables(&self) -> &LinkTables {
        &self.tables
    }

    /// Build an external scope for bind group `group` from uniform payloads such as
    /// `mat4 matrix_viewProjection`.
    pub fn prepare_scope(&self, group: u32, lines: &[&str]) -> Result<PreparedScope, LinkError> {
        let groups = &self.options.bind_groups;
        let name = match groups.name(group) {
            Some(name) if group < groups.mesh_group() => name,
            _ => {
                return Err(LinkError::TooManyScopes {
                    count: group as usize + 1,
                    groups: groups.len(),
                })
            }
        };
        PreparedScope::build(
            group,
            name,
            lines,
            &self.tables,
            self.options.high_precision_sampling,
        )
    }

    pub fn link(&self, input: &LinkInput<'_>) -> Result<LinkedShader, LinkError> {
        let groups = &self.options.bind_groups;
        if input.scopes.len() >= groups.len() {
            return Err(LinkError::TooManyScopes {
                count: input.scopes.len(),
                groups: groups.len(),
            });
        }

        let vs = scan(input.vertex, ShaderStage::Vertex)?;
        let fs = scan(input.fragment, ShaderStage::Fragment)?;
        reject_foreign_declarations(&vs, DeclKeyword::Output, ShaderStage::Vertex)?;
        reject_foreign_declarations(&fs, DeclKeyword::Attribute, ShaderStage::Fragment)?;

        let attributes = assign_attributes(
            &vs.attributes,
            input.attributes,
            input.vertex_formats,
            self.tables.locations(),
        )?;
        let varyings = match_varyings(&vs.varyings, &fs.varyings)?;
        let outputs = assign_outputs(&fs.outputs)?;

        let uniforms = merge_stage_uniforms(&vs, &fs)?;

        let mut values = Vec::new();
        let mut textures = Vec::new();
        for uniform in &uniforms {
            match scope_provider(input.scopes, uniform) {
                Some(group) => debug!(
                    name = uniform.name.as_str(),
                    group,
                    texture = uniform.is_texture,
                    "uniform provided by external scope"
                ),
                None if uniform.is_texture => textures.push(uniform),
                None => values.push(uniform),
            }
        }

        let mesh = build_scope_resources(
            groups.mesh_group(),
            groups.mesh_name(),
            &values,
            &textures,
            &self.tables,
            self.options.high_precision_sampling,
        )?;

        let vertex = emit_stage(
            &vs,
            input.scopes,
            &[attributes.code.as_str(), varyings.vertex_code.as_str()],
            &mesh.code,
        );
        let fragment = emit_stage(
            &fs,
            input.scopes,
            &[varyings.fragment_code.as_str(), outputs.code.as_str()],
            &mesh.code,
        );

        debug!(
            attributes = attributes.bindings.len(),
            varyings = varyings.vertex.len(),
            outputs = outputs.bindings.len(),
            fields = values.len(),
            textures = textures.len(),
            buffer_bytes = mesh.layout.as_ref().map_or(0, |l| l.total_byte_size()),
            "linked shader"
        );

        Ok(LinkedShader {
            vertex,
            fragment,
            uniform_buffer: mesh.layout,
            bindings: mesh.bindings,
            attributes: attributes.bindings,
            varyings: varyings.vertex,
            outputs: outputs.bindings,
        })
    }
}

/// Vertex uniforms first, then fragment uniforms, with repeats removed.
pub(crate) fn merge_stage_uniforms(
    vs: &ScanResult,
    fs: &ScanResult,
) -> Result<Vec<UniformDeclaration>, LinkError> {
    merge_uniforms(
        vs.uniforms
            .iter()
            .map(|text| (ShaderStage::Vertex, text.as_str()))
            .chain(
                fs.uniforms
                    .iter()
                    .map(|text| (ShaderStage::Fragment, text.as_str())),
            ),
    )
}

/// `out` only means a fragment output and `attribute` only a vertex input; either in the other
/// stage would otherwise disappear from the rewritten source.
fn reject_foreign_declarations(
    scanned: &ScanResult,
    keyword: DeclKeyword,
    stage: ShaderStage,
) -> Result<(), LinkError> {
    match scanned.lines(keyword).first() {
        Some(text) => Err(LinkError::InvalidDeclaration {
            stage,
            keyword,
            text: text.clone(),
        }),
        None => Ok(()),
    }
}
