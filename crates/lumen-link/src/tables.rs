use std::collections::{BTreeMap, BTreeSet};
use std::sync::Arc;

use crate::bindings::TextureDimension;
use crate::vertex::{SemanticLocationMap, StandardLocationMap};

/// Scalar/vector/matrix types and the number of 4-byte elements they occupy in a uniform buffer.
/// Matrices are stored as one vec4 slot per column.
const ELEMENT_COUNTS: &[(&str, u32)] = &[
    ("bool", 1),
    ("int", 1),
    ("uint", 1),
    ("float", 1),
    ("vec2", 2),
    ("ivec2", 2),
    ("uvec2", 2),
    ("bvec2", 2),
    ("vec3", 3),
    ("ivec3", 3),
    ("uvec3", 3),
    ("bvec3", 3),
    ("vec4", 4),
    ("ivec4", 4),
    ("uvec4", 4),
    ("bvec4", 4),
    ("mat2", 8),
    ("mat3", 12),
    ("mat4", 16),
];

const TEXTURE_DIMENSIONS: &[(&str, TextureDimension)] = &[
    ("sampler2D", TextureDimension::D2),
    ("sampler2DShadow", TextureDimension::D2),
    ("isampler2D", TextureDimension::D2),
    ("usampler2D", TextureDimension::D2),
    ("sampler3D", TextureDimension::D3),
    ("isampler3D", TextureDimension::D3),
    ("usampler3D", TextureDimension::D3),
    ("samplerCube", TextureDimension::Cube),
    ("samplerCubeShadow", TextureDimension::Cube),
    ("sampler2DArray", TextureDimension::D2Array),
    ("sampler2DArrayShadow", TextureDimension::D2Array),
    ("isampler2DArray", TextureDimension::D2Array),
    ("usampler2DArray", TextureDimension::D2Array),
    ("samplerCubeArray", TextureDimension::CubeArray),
    ("samplerCubeArrayShadow", TextureDimension::CubeArray),
];

const SHADOW_SAMPLERS: &[&str] = &[
    "sampler2DShadow",
    "samplerCubeShadow",
    "sampler2DArrayShadow",
    "samplerCubeArrayShadow",
];

/// Lookup tables the linker treats as part of its contract with the host.
///
/// Each linker owns its own copy; [`LinkTables::standard`] reproduces the tables hosts bind
/// against. Tests and embedders with different conventions can start from the standard tables
/// and override entries.
#[derive(Debug, Clone)]
pub struct LinkTables {
    locations: Arc<dyn SemanticLocationMap>,
    element_counts: BTreeMap<String, u32>,
    texture_dimensions: BTreeMap<String, TextureDimension>,
    shadow_samplers: BTreeSet<String>,
}

impl LinkTables {
    pub fn standard() -> Self {
        Self {
            locations: Arc::new(StandardLocationMap),
            element_counts: ELEMENT_COUNTS
                .iter()
                .map(|&(ty, count)| (ty.to_owned(), count))
                .collect(),
            texture_dimensions: TEXTURE_DIMENSIONS
                .iter()
                .map(|&(ty, dim)| (ty.to_owned(), dim))
                .collect(),
            shadow_samplers: SHADOW_SAMPLERS.iter().map(|&ty| ty.to_owned()).collect(),
        }
    }

    pub fn with_location_map(mut self, map: impl SemanticLocationMap + 'static) -> Self {
        self.locations = Arc::new(map);
        self
    }

    pub fn locations(&self) -> &dyn SemanticLocationMap {
        self.locations.as_ref()
    }

    pub fn element_count(&self, type_name: &str) -> Option<u32> {
        self.element_counts.get(type_name).copied()
    }

    pub fn set_element_count(&mut self, type_name: impl Into<String>, count: u32) {
        self.element_counts.insert(type_name.into(), count);
    }

    pub fn texture_dimension(&self, type_name: &str) -> Option<TextureDimension> {
        self.texture_dimensions.get(type_name).copied()
    }

    pub fn set_texture_dimension(&mut self, type_name: impl Into<String>, dim: TextureDimension) {
        self.texture_dimensions.insert(type_name.into(), dim);
    }

    pub fn is_shadow_sampler(&self, type_name: &str) -> bool {
        self.shadow_samplers.contains(type_name)
    }

    pub fn add_shadow_sampler(&mut self, type_name: impl Into<String>) {
        self.shadow_samplers.insert(type_name.into());
    }
}

impl Default for LinkTables {
    fn default() -> Self {
        Self::standard()
    }
}
