//! Packed uniform buffer layout for the value uniforms a scope owns.

use std::fmt::Write;

use crate::error::LinkError;
use crate::tables::LinkTables;
use crate::uniform::{Precision, UniformDeclaration};

/// Size of one scalar element in bytes.
const ELEMENT_BYTES: u32 = 4;
/// Alignment of anything wider than 8 bytes, and of the buffer as a whole.
const VEC4_ALIGN: u32 = 16;

pub(crate) fn round_up(value: u32, align: u32) -> u32 {
    value.div_ceil(align) * align
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UniformFieldLayout {
    pub name: String,
    pub type_name: String,
    /// Precision qualifier carried into the block declaration, if any.
    pub precision: Option<Precision>,
    pub element_count: u32,
    pub byte_size: u32,
    pub byte_offset: u32,
    pub array_size: u32,
}

impl UniformFieldLayout {
    pub fn alignment(&self) -> u32 {
        if self.array_size > 0 || self.byte_size > 8 {
            VEC4_ALIGN
        } else {
            self.byte_size
        }
    }

    pub fn end(&self) -> u32 {
        self.byte_offset + self.byte_size
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UniformBufferLayout {
    fields: Vec<UniformFieldLayout>,
    total_byte_size: u32,
}

impl UniformBufferLayout {
    /// Lay out `uniforms` in order. Returns `Ok(None)` when there is nothing to lay out.
    pub fn build(
        uniforms: &[&UniformDeclaration],
        tables: &LinkTables,
    ) -> Result<Option<Self>, LinkError> {
        if uniforms.is_empty() {
            return Ok(None);
        }

        let mut fields = Vec::with_capacity(uniforms.len());
        let mut running = 0u32;

        for uniform in uniforms {
            let element_count = tables.element_count(&uniform.type_name).ok_or_else(|| {
                LinkError::UnrecognizedUniformType {
                    stage: uniform.stage,
                    type_name: uniform.type_name.clone(),
                    text: uniform.text.clone(),
                }
            })?;
            if uniform.array_size > 1 {
                return Err(LinkError::UnsupportedUniformArray {
                    stage: uniform.stage,
                    text: uniform.text.clone(),
                });
            }

            let mut byte_size = element_count * ELEMENT_BYTES;
            if byte_size == 0 {
                return Err(LinkError::UnknownUniformByteSize {
                    name: uniform.name.clone(),
                    type_name: uniform.type_name.clone(),
                });
            }
            // std140 array elements occupy whole vec4 slots.
            if uniform.array_size > 0 {
                byte_size = round_up(byte_size, VEC4_ALIGN);
            }

            let mut field = UniformFieldLayout {
                name: uniform.name.clone(),
                type_name: uniform.type_name.clone(),
                precision: uniform.precision,
                element_count,
                byte_size,
                byte_offset: 0,
                array_size: uniform.array_size,
            };
            field.byte_offset = round_up(running, field.alignment());
            running = field.end();
            fields.push(field);
        }

        Ok(Some(Self {
            fields,
            total_byte_size: round_up(running, VEC4_ALIGN),
        }))
    }

    pub fn fields(&self) -> &[UniformFieldLayout] {
        &self.fields
    }

    pub fn field(&self, name: &str) -> Option<&UniformFieldLayout> {
        self.fields.iter().find(|f| f.name == name)
    }

    pub fn contains(&self, name: &str) -> bool {
        self.field(name).is_some()
    }

    pub fn total_byte_size(&self) -> u32 {
        self.total_byte_size
    }

    /// `std140` block declaration for this layout in bind group `group`.
    pub fn shader_declaration(&self, group: u32, group_name: &str, binding: u32) -> String {
        let mut code = format!(
            "layout(set = {group}, binding = {binding}, std140) uniform ub_{group_name} {{\n"
        );
        for field in &self.fields {
            code.push_str("    ");
            if let Some(precision) = field.precision {
                let _ = write!(code, "{precision} ");
            }
            let _ = write!(code, "{} {}", field.type_name, field.name);
            if field.array_size > 0 {
                let _ = write!(code, "[{}]", field.array_size);
            }
            code.push_str(";\n");
        }
        code.push_str("};\n");
        code
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::stage::ShaderStage;
    use crate::uniform::parse_uniform_line;
    use pretty_assertions::assert_eq;
    use proptest::prelude::*;

    fn parse(lines: &[&str]) -> Vec<UniformDeclaration> {
        lines
            .iter()
            .map(|l| parse_uniform_line(l, ShaderStage::Vertex).unwrap())
            .collect()
    }

    fn build(lines: &[&str]) -> Result<Option<UniformBufferLayout>, LinkError> {
        let uniforms = parse(lines);
        let refs = uniforms.iter().collect::<Vec<_>>();
        UniformBufferLayout::build(&refs, &LinkTables::standard())
    }

    fn offsets(layout: &UniformBufferLayout) -> Vec<(&str, u32, u32)> {
        layout
            .fields()
            .iter()
            .map(|f| (f.name.as_str(), f.byte_offset, f.byte_size))
            .collect()
    }

    #[test]
    fn small_fields_pack_by_their_size() {
        let layout = build(&["float a", "vec2 b", "float c", "vec3 d", "float e"])
            .unwrap()
            .unwrap();
        assert_eq!(
            offsets(&layout),
            vec![("a", 0, 4), ("b", 8, 8), ("c", 16, 4), ("d", 32, 12), ("e", 44, 4)]
        );
        assert_eq!(layout.total_byte_size(), 48);
    }

    #[test]
    fn single_element_array_takes_a_vec4_slot() {
        let layout = build(&["float weights[1]", "float after"]).unwrap().unwrap();
        assert_eq!(offsets(&layout), vec![("weights", 0, 16), ("after", 16, 4)]);
        assert_eq!(layout.total_byte_size(), 32);
    }

    #[test]
    fn nothing_to_lay_out() {
        assert_eq!(build(&[]).unwrap(), None);
    }

    #[test]
    fn array_larger_than_one_is_rejected() {
        let err = build(&["float weights[4]"]).unwrap_err();
        assert_eq!(
            err,
            LinkError::UnsupportedUniformArray {
                stage: ShaderStage::Vertex,
                text: "float weights[4]".into(),
            }
        );
    }

    #[test]
    fn unknown_type_and_zero_size_are_rejected() {
        let err = build(&["dmat4 m"]).unwrap_err();
        assert!(
            matches!(err, LinkError::UnrecognizedUniformType { ref type_name, .. } if type_name == "dmat4"),
            "{err:?}"
        );

        let mut tables = LinkTables::standard();
        tables.set_element_count("void4", 0);
        let uniforms = parse(&["void4 nothing"]);
        let err = UniformBufferLayout::build(&[&uniforms[0]], &tables).unwrap_err();
        assert_eq!(
            err,
            LinkError::UnknownUniformByteSize {
                name: "nothing".into(),
                type_name: "void4".into(),
            }
        );
    }

    #[test]
    fn declaration_keeps_order_precision_and_arrays() {
        let layout = build(&["highp vec4 tint", "mat4 matrix_model", "float weights[1]"])
            .unwrap()
            .unwrap();
        assert_eq!(
            layout.shader_declaration(2, "mesh", 0),
            "layout(set = 2, binding = 0, std140) uniform ub_mesh {\n    \
             highp vec4 tint;\n    \
             mat4 matrix_model;\n    \
             float weights[1];\n\
             };\n"
        );
    }

    const TYPES: &[&str] = &[
        "float", "int", "uint", "bool", "vec2", "ivec2", "vec3", "uvec3", "vec4", "bvec4", "mat2",
        "mat3", "mat4",
    ];

    proptest! {
        #[test]
        fn packed_fields_are_aligned_and_disjoint(
            picks in proptest::collection::vec((0..TYPES.len(), any::<bool>()), 1..24)
        ) {
            let lines = picks
                .iter()
                .enumerate()
                .map(|(i, &(ty, array))| {
                    format!("{} u{i}{}", TYPES[ty], if array { "[1]" } else { "" })
                })
                .collect::<Vec<_>>();
            let uniforms = lines
                .iter()
                .map(|l| parse_uniform_line(l, ShaderStage::Fragment).unwrap())
                .collect::<Vec<_>>();
            let refs = uniforms.iter().collect::<Vec<_>>();
            let layout = UniformBufferLayout::build(&refs, &LinkTables::standard())
                .unwrap()
                .unwrap();

            let mut previous_end = 0;
            for field in layout.fields() {
                prop_assert_eq!(field.byte_offset % field.alignment(), 0);
                prop_assert!(field.byte_offset >= previous_end);
                previous_end = field.end();
            }
            prop_assert_eq!(layout.total_byte_size() % 16, 0);
            prop_assert!(layout.total_byte_size() >= previous_end);
            prop_assert!(layout.total_byte_size() < previous_end + 16);
        }
    }
}
