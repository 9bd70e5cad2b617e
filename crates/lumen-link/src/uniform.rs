use std::collections::{BTreeMap, BTreeSet};
use std::fmt;

use crate::error::LinkError;
use crate::stage::ShaderStage;

/// GLSL ES precision qualifier.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Precision {
    Low,
    Medium,
    High,
}

impl Precision {
    pub fn from_qualifier(word: &str) -> Option<Self> {
        match word {
            "lowp" => Some(Precision::Low),
            "mediump" => Some(Precision::Medium),
            "highp" => Some(Precision::High),
            _ => None,
        }
    }

    pub fn as_str(self) -> &'static str {
        match self {
            Precision::Low => "lowp",
            Precision::Medium => "mediump",
            Precision::High => "highp",
        }
    }
}

impl fmt::Display for Precision {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A single parsed `uniform` declaration.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UniformDeclaration {
    /// Declaration payload as scanned (without the `uniform` keyword and `;`).
    pub text: String,
    /// Stage the declaration was first seen in.
    pub stage: ShaderStage,
    pub precision: Option<Precision>,
    pub type_name: String,
    pub name: String,
    /// `0` for a plain uniform, otherwise the literal array length.
    pub array_size: u32,
    pub is_texture: bool,
}

pub(crate) fn is_identifier(word: &str) -> bool {
    let mut chars = word.chars();
    match chars.next() {
        Some(c) if c.is_ascii_alphabetic() || c == '_' => {}
        _ => return false,
    }
    chars.all(|c| c.is_ascii_alphanumeric() || c == '_')
}

/// Parse one uniform payload, e.g. `highp vec4 tint` or `float weights[1]`.
pub fn parse_uniform_line(text: &str, stage: ShaderStage) -> Result<UniformDeclaration, LinkError> {
    let invalid = || LinkError::InvalidUniformLine {
        stage,
        text: text.to_owned(),
    };

    let mut words = text.split_whitespace().peekable();
    let precision = words.peek().and_then(|w| Precision::from_qualifier(w));
    if precision.is_some() {
        words.next();
    }
    let type_name = words.next().ok_or_else(invalid)?;

    if text.contains(',') {
        return Err(LinkError::MultiDeclarationUniform {
            stage,
            text: text.to_owned(),
        });
    }
    if type_name.contains('[') {
        return Err(LinkError::UnsupportedUniformArray {
            stage,
            text: text.to_owned(),
        });
    }

    let rest = words.collect::<Vec<_>>().join(" ");
    let (name, array_size) = match rest.find('[') {
        Some(open) => {
            let close = rest.find(']').filter(|&c| c > open).ok_or_else(invalid)?;
            if !rest[close + 1..].trim().is_empty() {
                return Err(invalid());
            }
            let digits = rest[open + 1..close].trim();
            let size = digits
                .bytes()
                .all(|b| b.is_ascii_digit())
                .then(|| digits.parse::<u32>().ok())
                .flatten()
                .ok_or_else(|| LinkError::UnsupportedUniformArray {
                    stage,
                    text: text.to_owned(),
                })?;
            (rest[..open].trim(), size)
        }
        None => (rest.as_str(), 0),
    };
    if !is_identifier(name) {
        return Err(invalid());
    }

    Ok(UniformDeclaration {
        text: text.to_owned(),
        stage,
        precision,
        type_name: type_name.to_owned(),
        name: name.to_owned(),
        array_size,
        is_texture: type_name.contains("sampler"),
    })
}

/// Parse uniform payloads in order, skipping repeats of an already seen declaration.
///
/// Repeats are compared with whitespace collapsed, so `vec4  tint` and `vec4 tint` declared in
/// different stages are the same uniform. Two different declarations of one identifier are a
/// conflict.
pub(crate) fn merge_uniforms<'a>(
    lines: impl IntoIterator<Item = (ShaderStage, &'a str)>,
) -> Result<Vec<UniformDeclaration>, LinkError> {
    let mut seen = BTreeSet::<String>::new();
    let mut by_name = BTreeMap::<String, usize>::new();
    let mut merged = Vec::<UniformDeclaration>::new();

    for (stage, text) in lines {
        let normalized = text.split_whitespace().collect::<Vec<_>>().join(" ");
        if !seen.insert(normalized) {
            continue;
        }
        let decl = parse_uniform_line(text, stage)?;
        if let Some(&first) = by_name.get(&decl.name) {
            return Err(LinkError::ConflictingUniformRedeclaration {
                name: decl.name,
                first: merged[first].text.clone(),
                second: decl.text,
            });
        }
        by_name.insert(decl.name.clone(), merged.len());
        merged.push(decl);
    }

    Ok(merged)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_precision_type_and_name() {
        let u = parse_uniform_line("highp vec4 tint", ShaderStage::Fragment).unwrap();
        assert_eq!(u.precision, Some(Precision::High));
        assert_eq!(u.type_name, "vec4");
        assert_eq!(u.name, "tint");
        assert_eq!(u.array_size, 0);
        assert!(!u.is_texture);

        let u = parse_uniform_line("sampler2DShadow shadowMap", ShaderStage::Fragment).unwrap();
        assert_eq!(u.precision, None);
        assert!(u.is_texture);
    }

    #[test]
    fn parses_literal_array_sizes() {
        let u = parse_uniform_line("float weights[4]", ShaderStage::Vertex).unwrap();
        assert_eq!((u.name.as_str(), u.array_size), ("weights", 4));

        let u = parse_uniform_line("mediump vec3 lights [ 1 ]", ShaderStage::Vertex).unwrap();
        assert_eq!((u.name.as_str(), u.array_size), ("lights", 1));
    }

    #[test]
    fn non_literal_array_size_is_rejected() {
        let err = parse_uniform_line("vec4 bones[MAX_BONES]", ShaderStage::Vertex).unwrap_err();
        assert!(
            matches!(err, LinkError::UnsupportedUniformArray { .. }),
            "{err:?}"
        );
    }

    #[test]
    fn signed_array_size_is_not_a_literal() {
        for text in ["float w[+1]", "float w[-1]", "float w[]", "float w[1u]"] {
            let err = parse_uniform_line(text, ShaderStage::Vertex).unwrap_err();
            assert!(
                matches!(err, LinkError::UnsupportedUniformArray { .. }),
                "{text}: {err:?}"
            );
        }
    }

    #[test]
    fn comma_is_rejected() {
        let err = parse_uniform_line("float a, b", ShaderStage::Fragment).unwrap_err();
        assert_eq!(
            err,
            LinkError::MultiDeclarationUniform {
                stage: ShaderStage::Fragment,
                text: "float a, b".into(),
            }
        );
    }

    #[test]
    fn missing_or_extra_tokens_are_invalid() {
        for text in ["", "highp", "vec4", "vec4 a b", "vec4 3d", "vec4 a[2] b"] {
            let err = parse_uniform_line(text, ShaderStage::Fragment).unwrap_err();
            assert!(
                matches!(err, LinkError::InvalidUniformLine { .. }),
                "{text:?}: {err:?}"
            );
        }
    }

    #[test]
    fn merge_keeps_first_stage_and_skips_repeats() {
        let merged = merge_uniforms([
            (ShaderStage::Vertex, "mat4 matrix_model"),
            (ShaderStage::Vertex, "highp vec4 tint"),
            (ShaderStage::Fragment, "highp  vec4\ttint"),
            (ShaderStage::Fragment, "sampler2D baseTexture"),
        ])
        .unwrap();
        let names = merged
            .iter()
            .map(|u| (u.name.as_str(), u.stage))
            .collect::<Vec<_>>();
        assert_eq!(
            names,
            vec![
                ("matrix_model", ShaderStage::Vertex),
                ("tint", ShaderStage::Vertex),
                ("baseTexture", ShaderStage::Fragment),
            ]
        );
    }

    #[test]
    fn merge_rejects_conflicting_redeclaration() {
        let err = merge_uniforms([
            (ShaderStage::Vertex, "vec4 tint"),
            (ShaderStage::Fragment, "vec3 tint"),
        ])
        .unwrap_err();
        assert_eq!(
            err,
            LinkError::ConflictingUniformRedeclaration {
                name: "tint".into(),
                first: "vec4 tint".into(),
                second: "vec3 tint".into(),
            }
        );
    }
}
