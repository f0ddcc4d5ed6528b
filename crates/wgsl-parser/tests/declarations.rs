//! Module-scope declaration tests.

use wgsl_ast::{Attribute, Directive, Item};
use wgsl_parser::parse_module;

const SHADER: &str = r#"
enable f16;

struct Particle {
    pos: vec3<f32>,
    @align(16) vel: vec3f,
};

alias Particles = array<Particle>;

@group(0) @binding(1) var<storage, read_write> particles: Particles;
var<workgroup> tile: array<f32, 64>;
override scale: f32 = 1.5;
@id(7) override count: u32;
const N = 4u;

@compute @workgroup_size(8, 8, 1)
fn main(@builtin(global_invocation_id) id: vec3<u32>) {
    particles[id.x].pos += particles[id.x].vel * scale;
}

fn helper(a: f32, b: ptr<function, f32>) -> f32 {
    return a + *b;
}
"#;

#[test]
fn test_item_kinds() {
    let module = parse_module(SHADER).unwrap();
    let counts = module.items.iter().fold([0usize; 7], |mut acc, item| {
        let slot = match item {
            Item::Directive(_) => 0,
            Item::Struct(_) => 1,
            Item::Alias(_) => 2,
            Item::Var(_) => 3,
            Item::Override(_) => 4,
            Item::Const(_) | Item::Let(_) => 5,
            Item::Function(_) => 6,
            Item::ConstAssert(_) => 0,
        };
        acc[slot] += 1;
        acc
    });
    assert_eq!(counts, [1, 1, 1, 2, 2, 1, 2]);
}

#[test]
fn test_module_scope_let() {
    let module = parse_module("let foo = 1 + 2;").unwrap();
    match &module.items[0] {
        Item::Let(decl) => {
            assert_eq!(decl.name, "foo");
            assert!(decl.ty.is_none());
        }
        other => panic!("expected let, got {other:?}"),
    }
}

#[test]
fn test_directive_names() {
    let module = parse_module(SHADER).unwrap();
    assert!(matches!(
        &module.items[0],
        Item::Directive(Directive::Enable(names)) if names == &vec!["f16".to_string()]
    ));
}

#[test]
fn test_global_var_address_space() {
    let module = parse_module(SHADER).unwrap();
    let vars: Vec<_> = module
        .items
        .iter()
        .filter_map(|i| match i {
            Item::Var(v) => Some(v),
            _ => None,
        })
        .collect();
    assert_eq!(vars[0].address_space.as_deref(), Some("storage"));
    assert_eq!(vars[0].access.as_deref(), Some("read_write"));
    assert!(vars[0].group().is_some());
    assert_eq!(vars[1].address_space.as_deref(), Some("workgroup"));
}

#[test]
fn test_entry_point_attributes() {
    let module = parse_module(SHADER).unwrap();
    let main = module.function("main").unwrap();
    assert_eq!(main.stage(), Some("compute"));
    let wg = Attribute::find(&main.attributes, "workgroup_size").unwrap();
    assert_eq!(wg.args.len(), 3);
    let builtin = Attribute::find(&main.params[0].attributes, "builtin").unwrap();
    assert_eq!(builtin.ident_arg(), Some("global_invocation_id"));
}

#[test]
fn test_struct_members() {
    let module = parse_module(SHADER).unwrap();
    let particle = module.structs().next().unwrap();
    assert_eq!(particle.members.len(), 2);
    assert_eq!(particle.members[0].ty.name, "vec3");
    assert!(Attribute::find(&particle.members[1].attributes, "align").is_some());
}

#[test]
fn test_pointer_param_type() {
    let module = parse_module(SHADER).unwrap();
    let helper = module.function("helper").unwrap();
    assert_eq!(helper.params[1].ty.name, "ptr");
    assert_eq!(helper.params[1].ty.args[0].as_name(), Some("function"));
    assert!(helper.return_type.is_some());
}
