use std::collections::BTreeMap;

use lumen_link::scan::{scan, tokenize};
use lumen_link::{
    LinkError, LinkInput, SampleType, Semantic, ShaderLinker, ShaderStage, TextureDimension,
};
use pretty_assertions::assert_eq;
use proptest::prelude::*;

fn attributes(items: &[(&str, Semantic)]) -> BTreeMap<String, Semantic> {
    items.iter().map(|(n, s)| (n.to_string(), *s)).collect()
}

#[test]
fn tint_matrix_and_base_texture_layout() {
    let vs = "\
uniform highp vec4 tint;
uniform mat4 matrix_model;
attribute vec3 aPosition;
void main() { gl_Position = matrix_model * vec4(aPosition, 1.0) * tint.x; }
";
    let fs = "\
uniform highp vec4 tint;
uniform sampler2D baseTexture;
out vec4 color;
void main() { color = tint; }
";
    let map = attributes(&[("aPosition", Semantic::Position)]);
    let linked = ShaderLinker::default()
        .link(&LinkInput::new(vs, fs, &map))
        .unwrap();

    let layout = linked.uniform_buffer.as_ref().unwrap();
    let fields = layout
        .fields()
        .iter()
        .map(|f| (f.name.as_str(), f.byte_offset, f.byte_size))
        .collect::<Vec<_>>();
    assert_eq!(fields, vec![("tint", 0, 16), ("matrix_model", 16, 64)]);
    assert_eq!(layout.total_byte_size(), 80);

    let texture = linked.bindings.texture("baseTexture").unwrap();
    assert_eq!(texture.sample_type, SampleType::Float);
    assert_eq!(texture.dimension, TextureDimension::D2);
    assert_eq!((texture.texture_slot, texture.sampler_slot), (1, 2));
    assert_eq!(linked.bindings.buffer.as_ref().unwrap().byte_size, 80);
}

#[test]
fn identical_inputs_link_identically() {
    let vs = "attribute vec2 aUv;\nvarying vec2 vUv;\nuniform vec4 offset;\nvoid main() {}\n";
    let fs = "varying vec2 vUv;\nuniform sampler2D tex;\nout vec4 color;\nvoid main() {}\n";
    let map = attributes(&[("aUv", Semantic::TexCoord(0))]);
    let linker = ShaderLinker::default();

    let a = linker.link(&LinkInput::new(vs, fs, &map)).unwrap();
    let b = linker.link(&LinkInput::new(vs, fs, &map)).unwrap();
    assert_eq!(a, b);
}

#[test]
fn attributes_sharing_a_location_fail_the_link() {
    let vs = "attribute vec3 aPosition;\nattribute vec4 aExtra;\nvoid main() {}\n";
    let map = attributes(&[("aPosition", Semantic::Position), ("aExtra", Semantic::Attr(0))]);
    let err = ShaderLinker::default()
        .link(&LinkInput::new(vs, "void main() {}\n", &map))
        .unwrap_err();
    assert_eq!(
        err,
        LinkError::AttributeLocationCollision {
            location: 0,
            first: Semantic::Position,
            second: Semantic::Attr(0),
        }
    );
}

#[test]
fn only_scalar_and_single_element_arrays_are_laid_out() {
    let map = BTreeMap::new();
    let linker = ShaderLinker::default();

    let err = linker
        .link(&LinkInput::new(
            "uniform float weights[4];\nvoid main() {}\n",
            "void main() {}\n",
            &map,
        ))
        .unwrap_err();
    assert_eq!(
        err,
        LinkError::UnsupportedUniformArray {
            stage: ShaderStage::Vertex,
            text: "float weights[4]".into(),
        }
    );

    let linked = linker
        .link(&LinkInput::new(
            "uniform float weights;\nvoid main() {}\n",
            "void main() {}\n",
            &map,
        ))
        .unwrap();
    let field = linked.uniform_buffer.as_ref().unwrap().field("weights").unwrap();
    assert_eq!((field.byte_offset, field.byte_size, field.alignment()), (0, 4, 4));
}

#[test]
fn textures_only_use_slots_from_zero() {
    let map = BTreeMap::new();
    let linked = ShaderLinker::default()
        .link(&LinkInput::new(
            "void main() {}\n",
            "uniform sampler2DShadow shadowMap;\nvoid main() {}\n",
            &map,
        ))
        .unwrap();
    assert_eq!(linked.uniform_buffer, None);
    assert_eq!(linked.bindings.buffer, None);
    let shadow = linked.bindings.texture("shadowMap").unwrap();
    assert_eq!(shadow.sample_type, SampleType::Depth);
    assert_eq!((shadow.texture_slot, shadow.sampler_slot), (0, 1));
    assert!(linked
        .fragment
        .contains("layout(set = 2, binding = 1) uniform samplerShadow shadowMap_sampler;\n"));
}

const VERTEX_VARYINGS: &[(&str, &str)] = &[
    ("vec2", "vUv0"),
    ("vec3", "vNormalW"),
    ("vec4", "vColor"),
    ("vec3", "vPositionW"),
    ("float", "vDepth"),
    ("vec2", "vUv1"),
];

proptest! {
    #[test]
    fn fragment_varyings_reuse_vertex_locations(
        picks in proptest::sample::subsequence((0..VERTEX_VARYINGS.len()).collect::<Vec<_>>(), 0..=VERTEX_VARYINGS.len()),
        reversed in any::<bool>(),
    ) {
        let mut vs = String::new();
        for (ty, name) in VERTEX_VARYINGS {
            vs.push_str(&format!("varying {ty} {name};\n"));
        }
        vs.push_str("void main() {}\n");

        let mut consumed = picks.clone();
        if reversed {
            consumed.reverse();
        }
        let mut fs = String::new();
        for &i in &consumed {
            let (ty, name) = VERTEX_VARYINGS[i];
            fs.push_str(&format!("varying {ty} {name};\n"));
        }
        fs.push_str("void main() {}\n");

        let map = BTreeMap::new();
        let linked = ShaderLinker::default().link(&LinkInput::new(&vs, &fs, &map)).unwrap();
        for &i in &consumed {
            let (ty, name) = VERTEX_VARYINGS[i];
            let expected = format!("layout(location = {i}) in {ty} {name};\n");
            prop_assert!(linked.fragment.contains(&expected), "{}", linked.fragment);
            prop_assert_eq!(linked.varyings[i].index as usize, i);
        }
    }

    #[test]
    fn scanning_stripped_source_finds_nothing(
        lines in proptest::collection::vec(
            proptest::sample::select(vec![
                "attribute vec3 aPosition;",
                "    varying vec2 vUv;",
                "uniform highp vec4 tint; uniform float exposure;",
                "out vec4 color;",
                "void main() {",
                "}",
                "    float outline = 1.0;",
                "    color = texture(sampler2D(tex, tex_sampler), vUv);",
                "// uniform float commented;",
                "#define USE_FOG 1",
                "",
            ]),
            0..32,
        )
    ) {
        let source = lines.join("\n");
        let scanned = scan(&source, ShaderStage::Fragment).unwrap();
        prop_assert!(tokenize(&scanned.stripped, ShaderStage::Fragment).unwrap().is_empty());
        prop_assert_eq!(scanned.stripped.matches("@@@").count(), 1);
    }
}
