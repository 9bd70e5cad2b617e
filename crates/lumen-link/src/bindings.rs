//! Resource binding model shared by the generated shader declarations and the host renderer.
//!
//! Every scope owns one bind group (`layout(set = N)`). Within a group:
//! - `binding = 0` is the scope's uniform buffer, when it has one;
//! - each texture then takes two consecutive bindings, the texture followed by its sampler.
//!
//! External scopes occupy groups `0..n` in the order the host passes them; the mesh scope built by
//! the linker is always the last, highest group (see [`BindGroupNames::mesh_group`]).

use std::fmt::Write;

use tracing::debug;

use crate::error::LinkError;
use crate::stage::ShaderStages;
use crate::tables::LinkTables;
use crate::uniform::{Precision, UniformDeclaration};

/// `@binding` of a scope's uniform buffer.
pub const UNIFORM_BUFFER_SLOT: u32 = 0;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum SampleType {
    Float,
    UnfilterableFloat,
    Depth,
    Sint,
    Uint,
}

impl SampleType {
    /// Prefix of the separate-texture type: `itexture2D`, `utexture3D`, ...
    pub fn glsl_texture_prefix(self) -> &'static str {
        match self {
            SampleType::Sint => "i",
            SampleType::Uint => "u",
            SampleType::Float | SampleType::UnfilterableFloat | SampleType::Depth => "",
        }
    }

    pub fn glsl_sampler_type(self) -> &'static str {
        match self {
            SampleType::Depth => "samplerShadow",
            _ => "sampler",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum TextureDimension {
    D2,
    D3,
    Cube,
    D2Array,
    CubeArray,
}

impl TextureDimension {
    /// Float separate-texture GLSL type; see [`SampleType::glsl_texture_prefix`] for integer
    /// textures.
    pub fn glsl_texture_type(self) -> &'static str {
        match self {
            TextureDimension::D2 => "texture2D",
            TextureDimension::D3 => "texture3D",
            TextureDimension::Cube => "textureCube",
            TextureDimension::D2Array => "texture2DArray",
            TextureDimension::CubeArray => "textureCubeArray",
        }
    }
}

/// How `highp` texture declarations are classified.
///
/// Some backends (WebGPU without `float32-filterable`) cannot filter 32-bit float textures, so
/// `highp` samplers are declared unfilterable by default even though the shader body still calls
/// a filtering sample function. Backends without that limitation can opt out.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum HighPrecisionSampling {
    #[default]
    Unfilterable,
    Filterable,
}

/// Names of the bind groups, indexed by group number. The last entry is the mesh group.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct BindGroupNames(Vec<String>);

impl BindGroupNames {
    /// Returns `None` for an empty list: there must be at least the mesh group.
    pub fn new<I, S>(names: I) -> Option<Self>
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        let names = names.into_iter().map(Into::into).collect::<Vec<_>>();
        (!names.is_empty()).then_some(Self(names))
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn name(&self, group: u32) -> Option<&str> {
        self.0.get(group as usize).map(String::as_str)
    }

    pub fn mesh_group(&self) -> u32 {
        (self.0.len() - 1) as u32
    }

    pub fn mesh_name(&self) -> &str {
        &self.0[self.0.len() - 1]
    }
}

impl Default for BindGroupNames {
    fn default() -> Self {
        Self(vec!["view".into(), "material".into(), "mesh".into()])
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BufferBinding {
    /// Block name used in the declaration (`ub_<group name>`).
    pub name: String,
    pub slot: u32,
    pub visibility: ShaderStages,
    pub byte_size: u32,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TextureBinding {
    pub name: String,
    pub sample_type: SampleType,
    pub dimension: TextureDimension,
    pub visibility: ShaderStages,
    pub texture_slot: u32,
    pub sampler_slot: u32,
}

impl TextureBinding {
    pub fn sampler_name(&self) -> String {
        format!("{}_sampler", self.name)
    }
}

/// Resources of one bind group.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BindingTable {
    pub group: u32,
    pub buffer: Option<BufferBinding>,
    pub textures: Vec<TextureBinding>,
}

impl BindingTable {
    pub fn new(group: u32) -> Self {
        Self {
            group,
            buffer: None,
            textures: Vec::new(),
        }
    }

    pub fn is_empty(&self) -> bool {
        self.buffer.is_none() && self.textures.is_empty()
    }

    pub fn texture(&self, name: &str) -> Option<&TextureBinding> {
        self.textures.iter().find(|t| t.name == name)
    }

    /// First binding available to textures.
    pub fn first_texture_slot(&self) -> u32 {
        match self.buffer {
            Some(_) => UNIFORM_BUFFER_SLOT + 1,
            None => UNIFORM_BUFFER_SLOT,
        }
    }

    /// Texture and sampler declarations for every texture in the table.
    pub fn texture_declarations(&self) -> String {
        let mut code = String::new();
        for texture in &self.textures {
            let _ = writeln!(
                code,
                "layout(set = {}, binding = {}) uniform {}{} {};",
                self.group,
                texture.texture_slot,
                texture.sample_type.glsl_texture_prefix(),
                texture.dimension.glsl_texture_type(),
                texture.name
            );
            let _ = writeln!(
                code,
                "layout(set = {}, binding = {}) uniform {} {};",
                self.group,
                texture.sampler_slot,
                texture.sample_type.glsl_sampler_type(),
                texture.sampler_name()
            );
        }
        code
    }
}

/// Classify texture uniforms and assign them consecutive texture/sampler slot pairs starting
/// at `first_slot`, in input order.
pub fn build_texture_bindings(
    textures: &[&UniformDeclaration],
    first_slot: u32,
    tables: &LinkTables,
    sampling: HighPrecisionSampling,
) -> Result<Vec<TextureBinding>, LinkError> {
    let mut out = Vec::with_capacity(textures.len());
    let mut slot = first_slot;

    for uniform in textures {
        if uniform.array_size > 1 {
            return Err(LinkError::UnsupportedUniformArray {
                stage: uniform.stage,
                text: uniform.text.clone(),
            });
        }
        let dimension = tables.texture_dimension(&uniform.type_name).ok_or_else(|| {
            LinkError::UnrecognizedUniformType {
                stage: uniform.stage,
                type_name: uniform.type_name.clone(),
                text: uniform.text.clone(),
            }
        })?;

        let mut sample_type = SampleType::Float;
        if uniform.precision == Some(Precision::High)
            && sampling == HighPrecisionSampling::Unfilterable
        {
            sample_type = SampleType::UnfilterableFloat;
        }
        if uniform.type_name.starts_with("isampler") {
            sample_type = SampleType::Sint;
        } else if uniform.type_name.starts_with("usampler") {
            sample_type = SampleType::Uint;
        }
        if tables.is_shadow_sampler(&uniform.type_name) {
            sample_type = SampleType::Depth;
        }

        debug!(
            name = uniform.name.as_str(),
            ?sample_type,
            ?dimension,
            slot,
            "assigned texture binding"
        );
        out.push(TextureBinding {
            name: uniform.name.clone(),
            sample_type,
            dimension,
            visibility: ShaderStages::VERTEX | ShaderStages::FRAGMENT,
            texture_slot: slot,
            sampler_slot: slot + 1,
        });
        slot += 2;
    }

    Ok(out)
}
