//! Declaration scanning for one shader stage.
//!
//! The scanner recognizes exactly four declaration forms (`attribute`, `varying`, `out` and
//! `uniform`) and never looks at anything else in the source. Each recognized declaration is cut
//! out of the source; the first cut leaves [`PLACEHOLDER`] behind so the emitter has exactly one
//! injection point per stage.

use std::fmt;
use std::ops::Range;

use tracing::trace;

use crate::error::LinkError;
use crate::limits::MAX_SHADER_SOURCE_BYTES;
use crate::stage::ShaderStage;

/// Marker left at the first removed declaration. `@` is not a valid GLSL token, so the marker
/// cannot collide with shader text.
pub const PLACEHOLDER: &str = "@@@";

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum DeclKeyword {
    Attribute,
    Varying,
    Output,
    Uniform,
}

impl DeclKeyword {
    pub fn as_str(self) -> &'static str {
        match self {
            DeclKeyword::Attribute => "attribute",
            DeclKeyword::Varying => "varying",
            DeclKeyword::Output => "out",
            DeclKeyword::Uniform => "uniform",
        }
    }

    fn from_word(word: &str) -> Option<Self> {
        match word {
            "attribute" => Some(DeclKeyword::Attribute),
            "varying" => Some(DeclKeyword::Varying),
            "out" => Some(DeclKeyword::Output),
            "uniform" => Some(DeclKeyword::Uniform),
            _ => None,
        }
    }
}

impl fmt::Display for DeclKeyword {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// One declaration found by [`tokenize`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Declaration {
    pub keyword: DeclKeyword,
    /// Text between the keyword and the terminating `;`, trimmed.
    pub payload: String,
    /// Byte range removed from the source: blanks before the keyword on its line through the
    /// last `;`.
    pub span: Range<usize>,
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ScanResult {
    /// Source with every declaration removed and [`PLACEHOLDER`] at the injection point.
    pub stripped: String,
    /// Byte offset of [`PLACEHOLDER`] within `stripped`.
    pub placeholder_offset: usize,
    pub attributes: Vec<String>,
    pub varyings: Vec<String>,
    pub outputs: Vec<String>,
    pub uniforms: Vec<String>,
}

impl ScanResult {
    pub fn lines(&self, keyword: DeclKeyword) -> &[String] {
        match keyword {
            DeclKeyword::Attribute => &self.attributes,
            DeclKeyword::Varying => &self.varyings,
            DeclKeyword::Output => &self.outputs,
            DeclKeyword::Uniform => &self.uniforms,
        }
    }

    fn lines_mut(&mut self, keyword: DeclKeyword) -> &mut Vec<String> {
        match keyword {
            DeclKeyword::Attribute => &mut self.attributes,
            DeclKeyword::Varying => &mut self.varyings,
            DeclKeyword::Output => &mut self.outputs,
            DeclKeyword::Uniform => &mut self.uniforms,
        }
    }

    /// Replace the placeholder with `block`. Nothing else in the stripped source is touched.
    pub fn splice(&self, block: &str) -> String {
        let head = &self.stripped[..self.placeholder_offset];
        let tail = &self.stripped[self.placeholder_offset + PLACEHOLDER.len()..];
        let mut out = String::with_capacity(self.stripped.len() + block.len());
        out.push_str(head);
        out.push_str(block);
        out.push_str(tail);
        out
    }
}

fn is_ident_start(b: u8) -> bool {
    b.is_ascii_alphabetic() || b == b'_'
}

fn is_ident_continue(b: u8) -> bool {
    b.is_ascii_alphanumeric() || b == b'_'
}

fn line_number(source: &str, offset: usize) -> usize {
    source.as_bytes()[..offset]
        .iter()
        .filter(|&&b| b == b'\n')
        .count()
        + 1
}

/// Find every declaration in `source` in a single linear pass.
///
/// A keyword only starts a declaration when it is a whole word followed by whitespace, sits
/// outside comments and parentheses, and is at a statement boundary: the start of the source,
/// the first token on its line, or the first token after `;`, `{` or `}`. Preprocessor lines are
/// skipped.
pub fn tokenize(source: &str, stage: ShaderStage) -> Result<Vec<Declaration>, LinkError> {
    let bytes = source.as_bytes();
    let mut decls = Vec::new();
    let mut i = 0usize;
    let mut line_start = true;
    let mut after_terminator = true;
    let mut paren_depth = 0u32;
    // End of the previous declaration; blanks before a keyword are only absorbed back to here.
    let mut last_end = 0usize;

    while i < bytes.len() {
        let b = bytes[i];
        match b {
            b'\n' => {
                line_start = true;
                i += 1;
            }
            b' ' | b'\t' | b'\r' => i += 1,
            b'/' if bytes.get(i + 1) == Some(&b'/') => {
                while i < bytes.len() && bytes[i] != b'\n' {
                    i += 1;
                }
            }
            b'/' if bytes.get(i + 1) == Some(&b'*') => {
                i += 2;
                while i < bytes.len() && !(bytes[i] == b'*' && bytes.get(i + 1) == Some(&b'/')) {
                    if bytes[i] == b'\n' {
                        line_start = true;
                    }
                    i += 1;
                }
                i = (i + 2).min(bytes.len());
            }
            b'#' if line_start => {
                // Directives end at the newline, honoring `\` continuations.
                while i < bytes.len() && bytes[i] != b'\n' {
                    if bytes[i] == b'\\' && bytes.get(i + 1) == Some(&b'\n') {
                        i += 1;
                    }
                    i += 1;
                }
            }
            b';' | b'{' | b'}' => {
                after_terminator = true;
                line_start = false;
                i += 1;
            }
            b'(' | b')' => {
                paren_depth = if b == b'(' {
                    paren_depth + 1
                } else {
                    paren_depth.saturating_sub(1)
                };
                after_terminator = false;
                line_start = false;
                i += 1;
            }
            _ if is_ident_start(b) => {
                let start = i;
                while i < bytes.len() && is_ident_continue(bytes[i]) {
                    i += 1;
                }
                let at_boundary = (line_start || after_terminator) && paren_depth == 0;
                line_start = false;
                after_terminator = false;

                let keyword = match DeclKeyword::from_word(&source[start..i]) {
                    Some(keyword) if at_boundary => keyword,
                    _ => continue,
                };
                if !bytes.get(i).is_some_and(|b| b.is_ascii_whitespace()) {
                    continue;
                }

                let Some(rel) = source[i..].find(';') else {
                    return Err(LinkError::MalformedDeclaration {
                        stage,
                        keyword,
                        line: line_number(source, start),
                    });
                };
                let semi = i + rel;
                let mut end = semi + 1;
                while end < bytes.len() && bytes[end] == b';' {
                    end += 1;
                }

                let mut span_start = start;
                while span_start > last_end && matches!(bytes[span_start - 1], b' ' | b'\t') {
                    span_start -= 1;
                }

                let payload = source[i..semi].trim().to_owned();
                trace!(%stage, %keyword, payload = payload.as_str(), "scanned declaration");
                decls.push(Declaration {
                    keyword,
                    payload,
                    span: span_start..end,
                });

                i = end;
                last_end = end;
                after_terminator = true;
            }
            _ => {
                after_terminator = false;
                line_start = false;
                i += 1;
            }
        }
    }

    Ok(decls)
}

/// Offset just past a leading `#version` line, where the placeholder goes when the source has
/// no declarations at all.
fn version_directive_end(source: &str) -> usize {
    let trimmed = source.trim_start();
    if !trimmed.starts_with("#version") {
        return 0;
    }
    let start = source.len() - trimmed.len();
    match source[start..].find('\n') {
        Some(nl) => start + nl + 1,
        None => source.len(),
    }
}

/// Strip all declarations from one stage source and bucket their payloads by keyword.
pub fn scan(source: &str, stage: ShaderStage) -> Result<ScanResult, LinkError> {
    if source.len() > MAX_SHADER_SOURCE_BYTES {
        return Err(LinkError::SourceTooLarge {
            stage,
            len: source.len(),
            max: MAX_SHADER_SOURCE_BYTES,
        });
    }

    let decls = tokenize(source, stage)?;
    let mut result = ScanResult::default();
    let mut stripped = String::with_capacity(source.len() + PLACEHOLDER.len() + 1);

    if decls.is_empty() {
        let at = version_directive_end(source);
        stripped.push_str(&source[..at]);
        if at > 0 && !stripped.ends_with('\n') {
            stripped.push('\n');
        }
        result.placeholder_offset = stripped.len();
        stripped.push_str(PLACEHOLDER);
        stripped.push('\n');
        stripped.push_str(&source[at..]);
        result.stripped = stripped;
        return Ok(result);
    }

    let mut copied_to = 0usize;
    for (n, decl) in decls.into_iter().enumerate() {
        stripped.push_str(&source[copied_to..decl.span.start]);
        if n == 0 {
            result.placeholder_offset = stripped.len();
            stripped.push_str(PLACEHOLDER);
            stripped.push('\n');
        }
        copied_to = decl.span.end;
        result.lines_mut(decl.keyword).push(decl.payload);
    }
    stripped.push_str(&source[copied_to..]);
    result.stripped = stripped;

    Ok(result)
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn buckets_declarations_and_leaves_single_placeholder() {
        let src = "\
#version 450
attribute vec4 vertex_position;
uniform mat4 matrix_model;
varying vec2 vUv0;

void main() {
    gl_Position = matrix_model * vertex_position;
}
";
        let scanned = scan(src, ShaderStage::Vertex).unwrap();
        assert_eq!(scanned.attributes, vec!["vec4 vertex_position"]);
        assert_eq!(scanned.uniforms, vec!["mat4 matrix_model"]);
        assert_eq!(scanned.varyings, vec!["vec2 vUv0"]);
        assert!(scanned.outputs.is_empty());
        assert_eq!(
            scanned.stripped,
            "\
#version 450
@@@




void main() {
    gl_Position = matrix_model * vertex_position;
}
"
        );
        assert_eq!(&scanned.stripped[scanned.placeholder_offset..][..3], PLACEHOLDER);
    }

    #[test]
    fn keywords_inside_comments_parens_and_words_are_ignored() {
        let src = "\
// uniform float commented;
/* varying vec2 alsoCommented; */
void shade(out vec4 color) { color = vec4(1.0); }
float outline;
uniform float real;
";
        let scanned = scan(src, ShaderStage::Fragment).unwrap();
        assert_eq!(scanned.uniforms, vec!["float real"]);
        assert!(scanned.varyings.is_empty());
        assert!(scanned.outputs.is_empty());
        assert!(scanned.stripped.contains("void shade(out vec4 color)"));
        assert!(scanned.stripped.contains("float outline;"));
    }

    #[test]
    fn several_declarations_on_one_line() {
        let src = "uniform float a; uniform float b;;\nvoid main() {}\n";
        let scanned = scan(src, ShaderStage::Fragment).unwrap();
        assert_eq!(scanned.uniforms, vec!["float a", "float b"]);
        assert_eq!(scanned.stripped, "@@@\n\nvoid main() {}\n");
    }

    #[test]
    fn declaration_may_span_lines() {
        let src = "uniform\n    highp vec4\n    tint;\n";
        let scanned = scan(src, ShaderStage::Fragment).unwrap();
        assert_eq!(scanned.uniforms, vec!["highp vec4\n    tint"]);
    }

    #[test]
    fn no_declarations_puts_placeholder_after_version() {
        let scanned = scan("#version 450\nvoid main() {}\n", ShaderStage::Vertex).unwrap();
        assert_eq!(scanned.stripped, "#version 450\n@@@\nvoid main() {}\n");
        assert_eq!(scanned.placeholder_offset, "#version 450\n".len());

        let scanned = scan("void main() {}\n", ShaderStage::Vertex).unwrap();
        assert_eq!(scanned.stripped, "@@@\nvoid main() {}\n");
        assert_eq!(scanned.placeholder_offset, 0);
    }

    #[test]
    fn unterminated_declaration_is_malformed() {
        let err = scan("void main() {}\nuniform vec4 tint\n", ShaderStage::Fragment).unwrap_err();
        assert_eq!(
            err,
            LinkError::MalformedDeclaration {
                stage: ShaderStage::Fragment,
                keyword: DeclKeyword::Uniform,
                line: 2,
            }
        );
    }

    #[test]
    fn rescan_of_stripped_source_finds_nothing() {
        let src = "\
attribute vec3 aPosition;
varying vec3 vNormal; out vec4 fragColor;
uniform sampler2D tex;
void main() {}
";
        let scanned = scan(src, ShaderStage::Vertex).unwrap();
        assert!(tokenize(&scanned.stripped, ShaderStage::Vertex)
            .unwrap()
            .is_empty());
    }

    #[test]
    fn splice_replaces_only_the_placeholder() {
        let scanned = scan("uniform float a;\nvoid main() {}\n", ShaderStage::Fragment).unwrap();
        assert_eq!(
            scanned.splice("layout(set = 2, binding = 0) uniform X { float a; };"),
            "layout(set = 2, binding = 0) uniform X { float a; };\n\nvoid main() {}\n"
        );
    }
}
