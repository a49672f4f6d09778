//! Benchmark profiles for the Tessera model core.
//!
//! - [`reference_context`]: a context holding the standard definitions and
//!   a 32x32 grid under `/body`
//! - [`reference_import`]: a free-standing tree overlapping that grid

#![forbid(unsafe_code)]
#![deny(rustdoc::broken_intra_doc_links)]

use tessera_mesh::Mesh;
use tessera_region::{Context, ContextConfig, Region};
use tessera_test_utils::fixtures::{define_standard, fill_grid};

/// Cells per side of the reference grid.
pub const REFERENCE_CELLS: u32 = 32;

/// Context with the standard definitions and a
/// [`REFERENCE_CELLS`]-square grid under `/body`.
pub fn reference_context() -> Context {
    let context = Context::new(ContextConfig::default()).expect("default config is valid");
    define_standard(context.managers());
    let body = context.root().create_child("body").expect("fresh root");
    let mesh = context.create_mesh(2).expect("2-D mesh");
    fill_grid(&mesh, REFERENCE_CELLS, REFERENCE_CELLS);
    body.attach_domain_container(mesh).expect("fresh region");
    context
}

/// Import tree whose `body` grid has the reference size, so every
/// object merges as a modification.
pub fn reference_import(context: &Context) -> Region {
    let root = context.create_import_root("import").expect("valid name");
    let body = root.create_child("body").expect("fresh root");
    let mesh = Mesh::staging(2, context.managers()).expect("2-D mesh");
    fill_grid(&mesh, REFERENCE_CELLS, REFERENCE_CELLS);
    body.attach_domain_container(mesh).expect("fresh region");
    root
}
