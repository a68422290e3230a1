//! Dependency graphs: raw shapes, the console report parser and the
//! normalizer producing the client-facing tree.

mod normalize;
pub mod raw;
pub mod text;
mod tree;

pub use normalize::Normalizer;
pub use raw::{
    ConfigurationBlock, DependencyReport, LineNode, ProjectOutline, StructuralNode, Subproject,
};
pub use text::{parse_coordinates, parse_dependency_report, parse_project_outline};
pub use tree::{DependencyTree, NodeType};
