use crate::error::LinkError;
use crate::scan::DeclKeyword;
use crate::stage::ShaderStage;
use crate::uniform::is_identifier;

/// Qualifiers that may precede the type of an attribute, varying or output declaration. They are
/// carried through to the rewritten declaration untouched.
const QUALIFIERS: &[&str] = &[
    "lowp",
    "mediump",
    "highp",
    "flat",
    "smooth",
    "noperspective",
    "centroid",
];

/// `[qualifiers] <type> <name>` as used by stage interface declarations.
#[derive(Debug, Clone, PartialEq, Eq)]
pub(crate) struct InterfaceDeclaration<'a> {
    pub qualifiers: Vec<&'a str>,
    pub type_name: &'a str,
    pub name: &'a str,
}

impl InterfaceDeclaration<'_> {
    /// Qualifiers joined with trailing space, ready to prefix the type.
    pub fn qualifier_prefix(&self) -> String {
        let mut out = String::new();
        for q in &self.qualifiers {
            out.push_str(q);
            out.push(' ');
        }
        out
    }
}

pub(crate) fn parse_interface_line(
    text: &str,
    keyword: DeclKeyword,
    stage: ShaderStage,
) -> Result<InterfaceDeclaration<'_>, LinkError> {
    let words = text.split_whitespace().collect::<Vec<_>>();
    let qualifier_count = words
        .iter()
        .take_while(|w| QUALIFIERS.contains(*w))
        .count();

    match words[qualifier_count..] {
        [type_name, name] if is_identifier(type_name) && is_identifier(name) => {
            Ok(InterfaceDeclaration {
                qualifiers: words[..qualifier_count].to_vec(),
                type_name,
                name,
            })
        }
        _ => Err(LinkError::InvalidDeclaration {
            stage,
            keyword,
            text: text.to_owned(),
        }),
    }
}
