//! Vertex → fragment interface matching and fragment output locations.

use std::collections::BTreeMap;
use std::fmt::Write;

use crate::error::LinkError;
use crate::interface::parse_interface_line;
use crate::scan::DeclKeyword;
use crate::stage::ShaderStage;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct VaryingBinding {
    pub name: String,
    pub type_name: String,
    pub index: u32,
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct VaryingBlocks {
    pub vertex_code: String,
    pub fragment_code: String,
    /// Vertex outputs in declaration order.
    pub vertex: Vec<VaryingBinding>,
    /// Fragment inputs in declaration order, carrying the vertex-side index.
    pub fragment: Vec<VaryingBinding>,
}

impl VaryingBlocks {
    pub fn index_of(&self, name: &str) -> Option<u32> {
        self.vertex.iter().find(|v| v.name == name).map(|v| v.index)
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct OutputBinding {
    pub name: String,
    pub type_name: String,
    pub index: u32,
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct OutputBlock {
    pub code: String,
    pub bindings: Vec<OutputBinding>,
}

/// Assign vertex varyings increasing locations and make every fragment varying reuse the
/// location of its vertex producer.
pub fn match_varyings(
    vertex_lines: &[String],
    fragment_lines: &[String],
) -> Result<VaryingBlocks, LinkError> {
    let mut blocks = VaryingBlocks::default();
    let mut index_map = BTreeMap::<&str, u32>::new();

    for (index, text) in (0u32..).zip(vertex_lines) {
        let decl = parse_interface_line(text, DeclKeyword::Varying, ShaderStage::Vertex)?;
        if index_map.insert(decl.name, index).is_some() {
            return Err(LinkError::DuplicateVarying {
                name: decl.name.to_owned(),
            });
        }
        let _ = writeln!(
            blocks.vertex_code,
            "layout(location = {index}) {}out {} {};",
            decl.qualifier_prefix(),
            decl.type_name,
            decl.name
        );
        blocks.vertex.push(VaryingBinding {
            name: decl.name.to_owned(),
            type_name: decl.type_name.to_owned(),
            index,
        });
    }

    for text in fragment_lines {
        let decl = parse_interface_line(text, DeclKeyword::Varying, ShaderStage::Fragment)?;
        let Some(&index) = index_map.get(decl.name) else {
            return Err(LinkError::MissingVaryingProducer {
                name: decl.name.to_owned(),
                text: text.clone(),
            });
        };
        let _ = writeln!(
            blocks.fragment_code,
            "layout(location = {index}) {}in {} {};",
            decl.qualifier_prefix(),
            decl.type_name,
            decl.name
        );
        blocks.fragment.push(VaryingBinding {
            name: decl.name.to_owned(),
            type_name: decl.type_name.to_owned(),
            index,
        });
    }

    Ok(blocks)
}

/// Fragment outputs take their declaration order as location.
pub fn assign_outputs(lines: &[String]) -> Result<OutputBlock, LinkError> {
    let mut block = OutputBlock::default();
    for (index, text) in (0u32..).zip(lines) {
        let decl = parse_interface_line(text, DeclKeyword::Output, ShaderStage::Fragment)?;
        let _ = writeln!(
            block.code,
            "layout(location = {index}) {}out {} {};",
            decl.qualifier_prefix(),
            decl.type_name,
            decl.name
        );
        block.bindings.push(OutputBinding {
            name: decl.name.to_owned(),
            type_name: decl.type_name.to_owned(),
            index,
        });
    }
    Ok(block)
}
