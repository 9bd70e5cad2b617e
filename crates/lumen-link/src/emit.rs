use crate::scan::ScanResult;
use crate::scope::ResourceScope;

/// Assemble the injected block for one stage and splice it in at the placeholder.
///
/// Order: external scope declarations (in scope order), the stage's interface declarations, then
/// the mesh scope's buffer and texture declarations.
pub(crate) fn emit_stage(
    scanned: &ScanResult,
    scopes: &[&dyn ResourceScope],
    interface_code: &[&str],
    mesh_code: &str,
) -> String {
    let mut block = String::new();
    for scope in scopes {
        push_section(&mut block, scope.shader_declaration());
    }
    for code in interface_code {
        push_section(&mut block, code);
    }
    push_section(&mut block, mesh_code);
    scanned.splice(&block)
}

fn push_section(block: &mut String, code: &str) {
    if code.is_empty() {
        return;
    }
    block.push_str(code);
    if !code.ends_with('\n') {
        block.push('\n');
    }
}
