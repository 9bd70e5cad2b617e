//! Resource scopes: bind groups whose resources are declared outside the linked shader.
//!
//! A scope owns one bind group. The linker asks every external scope whether it already provides
//! a uniform or texture; whatever no scope provides ends up in the mesh scope the linker builds.

use std::fmt;

use tracing::debug;

use crate::bindings::{
    build_texture_bindings, BindingTable, BufferBinding, HighPrecisionSampling,
    UNIFORM_BUFFER_SLOT,
};
use crate::error::LinkError;
use crate::layout::UniformBufferLayout;
use crate::stage::{ShaderStage, ShaderStages};
use crate::tables::LinkTables;
use crate::uniform::{merge_uniforms, UniformDeclaration};

/// A pre-existing bind group layout the linker may resolve uniforms and textures against.
pub trait ResourceScope: fmt::Debug {
    fn has_uniform(&self, name: &str) -> bool;
    fn has_texture(&self, name: &str) -> bool;
    /// Declarations for every resource in the scope, spliced verbatim into both stages.
    fn shader_declaration(&self) -> &str;
}

/// Index of the first scope providing `uniform`, which is also its bind group.
pub(crate) fn scope_provider(
    scopes: &[&dyn ResourceScope],
    uniform: &UniformDeclaration,
) -> Option<usize> {
    scopes.iter().position(|scope| {
        if uniform.is_texture {
            scope.has_texture(&uniform.name)
        } else {
            scope.has_uniform(&uniform.name)
        }
    })
}

/// Layout, bindings and declaration code of one bind group.
#[derive(Debug, Clone, PartialEq, Eq)]
pub(crate) struct ScopeResources {
    pub layout: Option<UniformBufferLayout>,
    pub bindings: BindingTable,
    pub code: String,
}

pub(crate) fn build_scope_resources(
    group: u32,
    group_name: &str,
    values: &[&UniformDeclaration],
    textures: &[&UniformDeclaration],
    tables: &LinkTables,
    sampling: HighPrecisionSampling,
) -> Result<ScopeResources, LinkError> {
    let layout = UniformBufferLayout::build(values, tables)?;
    let mut bindings = BindingTable::new(group);
    let mut code = String::new();

    if let Some(layout) = &layout {
        bindings.buffer = Some(BufferBinding {
            name: format!("ub_{group_name}"),
            slot: UNIFORM_BUFFER_SLOT,
            visibility: ShaderStages::VERTEX | ShaderStages::FRAGMENT,
            byte_size: layout.total_byte_size(),
        });
        code.push_str(&layout.shader_declaration(group, group_name, UNIFORM_BUFFER_SLOT));
    }

    bindings.textures =
        build_texture_bindings(textures, bindings.first_texture_slot(), tables, sampling)?;
    code.push_str(&bindings.texture_declarations());

    Ok(ScopeResources {
        layout,
        bindings,
        code,
    })
}

/// A scope built by the host from uniform declarations, laid out with the same rules the linker
/// uses for the mesh group.
///
/// Created by [`ShaderLinker::prepare_scope`](crate::ShaderLinker::prepare_scope).
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PreparedScope {
    name: String,
    resources: ScopeResources,
}

impl PreparedScope {
    pub(crate) fn build(
        group: u32,
        name: &str,
        lines: &[&str],
        tables: &LinkTables,
        sampling: HighPrecisionSampling,
    ) -> Result<Self, LinkError> {
        let uniforms = merge_uniforms(lines.iter().map(|&l| (ShaderStage::Vertex, l)))?;
        let (textures, values): (Vec<_>, Vec<_>) = uniforms.iter().partition(|u| u.is_texture);
        let resources = build_scope_resources(group, name, &values, &textures, tables, sampling)?;

        debug!(
            group,
            name,
            fields = values.len(),
            textures = textures.len(),
            "prepared resource scope"
        );
        Ok(Self {
            name: name.to_owned(),
            resources,
        })
    }

    pub fn group(&self) -> u32 {
        self.resources.bindings.group
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn uniform_buffer(&self) -> Option<&UniformBufferLayout> {
        self.resources.layout.as_ref()
    }

    pub fn bindings(&self) -> &BindingTable {
        &self.resources.bindings
    }
}

impl ResourceScope for PreparedScope {
    fn has_uniform(&self, name: &str) -> bool {
        self.resources
            .layout
            .as_ref()
            .is_some_and(|layout| layout.contains(name))
    }

    fn has_texture(&self, name: &str) -> bool {
        self.resources.bindings.texture(name).is_some()
    }

    fn shader_declaration(&self) -> &str {
        &self.resources.code
    }
}
