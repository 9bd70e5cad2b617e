use std::collections::BTreeMap;
use std::fmt::Write;

use tracing::debug;

use crate::error::LinkError;
use crate::interface::parse_interface_line;
use crate::scan::DeclKeyword;
use crate::stage::ShaderStage;
use crate::vertex::{Semantic, SemanticLocationMap, VertexFormatLookup};

/// Prefix of the integer input that feeds a converted float attribute.
const SHADOW_PREFIX: &str = "_private_";

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AttributeBinding {
    /// Identifier the shader body uses.
    pub name: String,
    pub semantic: Semantic,
    pub location: u32,
    /// Declared (floating point) type.
    pub type_name: String,
    /// Type of the `in` declaration; differs from `type_name` for converted attributes.
    pub input_type: String,
    /// Identifier of the `in` declaration; the shadow identifier for converted attributes.
    pub input_name: String,
    /// Statement declaring `name` from the integer shadow input.
    pub conversion: Option<String>,
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct AttributeBlock {
    pub code: String,
    pub bindings: Vec<AttributeBinding>,
}

/// Component count of a GLSL vector type (`vec3` → 3); scalars count as 1.
fn component_count(type_name: &str) -> u32 {
    type_name
        .chars()
        .last()
        .and_then(|c| c.to_digit(10))
        .unwrap_or(1)
}

fn integer_input_type(signed: bool, components: u32) -> String {
    match (signed, components) {
        (true, 1) => "int".to_owned(),
        (false, 1) => "uint".to_owned(),
        (true, n) => format!("ivec{n}"),
        (false, n) => format!("uvec{n}"),
    }
}

/// Give every mapped vertex attribute an explicit location.
///
/// Attributes whose identifier has no entry in `semantics` are dropped: a shader may declare
/// more inputs than a given mesh format provides.
pub fn assign_attributes(
    lines: &[String],
    semantics: &BTreeMap<String, Semantic>,
    formats: &dyn VertexFormatLookup,
    locations: &dyn SemanticLocationMap,
) -> Result<AttributeBlock, LinkError> {
    let mut used = BTreeMap::<u32, Semantic>::new();
    let mut block = AttributeBlock::default();

    for text in lines {
        let decl = parse_interface_line(text, DeclKeyword::Attribute, ShaderStage::Vertex)?;
        let Some(&semantic) = semantics.get(decl.name) else {
            debug!(name = decl.name, "dropping vertex attribute without a semantic");
            continue;
        };

        let location =
            locations
                .location_for(semantic)
                .map_err(|source| LinkError::AttributeSemantic {
                    name: decl.name.to_owned(),
                    source,
                })?;
        if let Some(&first) = used.get(&location) {
            return Err(LinkError::AttributeLocationCollision {
                location,
                first,
                second: semantic,
            });
        }
        used.insert(location, semantic);

        let converted = formats
            .element(semantic)
            .filter(|element| element.needs_float_conversion());
        let (input_type, input_name, conversion) = match converted {
            Some(element) => {
                let input_name = format!("{SHADOW_PREFIX}{}", decl.name);
                let conversion = format!(
                    "{ty} {name} = {ty}({input_name});",
                    ty = decl.type_name,
                    name = decl.name,
                );
                (
                    integer_input_type(
                        element.data_type.is_signed_int(),
                        component_count(decl.type_name),
                    ),
                    input_name,
                    Some(conversion),
                )
            }
            None => (decl.type_name.to_owned(), decl.name.to_owned(), None),
        };

        let _ = writeln!(
            block.code,
            "layout(location = {location}) in {}{input_type} {input_name};",
            decl.qualifier_prefix()
        );
        if let Some(conversion) = &conversion {
            block.code.push_str(conversion);
            block.code.push('\n');
        }

        block.bindings.push(AttributeBinding {
            name: decl.name.to_owned(),
            semantic,
            location,
            type_name: decl.type_name.to_owned(),
            input_type,
            input_name,
            conversion,
        });
    }

    Ok(block)
}
