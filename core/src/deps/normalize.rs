use super::raw::{DependencyReport, LineNode, StructuralNode, Subproject};
use super::text::parse_coordinates;
use super::tree::{DependencyTree, NodeType};
use crate::config::default_elision_markers;

/// Turns raw dependency graphs into the canonical client tree.
///
/// Both entry points are pure: the same input always yields the same tree.
#[derive(Debug, Clone)]
pub struct Normalizer {
    elision_markers: Vec<String>,
}

impl Default for Normalizer {
    fn default() -> Self {
        Self::new(default_elision_markers())
    }
}

impl Normalizer {
    pub fn new(elision_markers: Vec<String>) -> Self {
        Self { elision_markers }
    }

    /// One depth-0 node per project of the report, named after the project.
    pub fn normalize_report(&self, report: &DependencyReport) -> Vec<DependencyTree> {
        report
            .projects
            .iter()
            .map(|p| self.normalize_subproject(&p.name, Some(p)))
            .collect()
    }

    /// Depth-0 node named `name`. A missing project yields a node without children.
    pub fn normalize_subproject(&self, name: &str, project: Option<&Subproject>) -> DependencyTree {
        let configurations = project
            .map(|p| {
                p.configurations
                    .iter()
                    .filter_map(|block| {
                        let children: Vec<DependencyTree> = block
                            .nodes
                            .iter()
                            .filter_map(|n| self.line_node(n))
                            .collect();
                        if children.is_empty() {
                            return None;
                        }
                        Some(
                            DependencyTree::named(block.name.clone(), NodeType::Configuration)
                                .with_children(children),
                        )
                    })
                    .collect()
            })
            .unwrap_or_default();

        DependencyTree::named(name, NodeType::Project).with_children(configurations)
    }

    fn line_node(&self, node: &LineNode) -> Option<DependencyTree> {
        if node.is_elided(&self.elision_markers) {
            return None;
        }
        let (group, id, version) = parse_coordinates(&node.text);
        Some(DependencyTree {
            name: Some(node.text.clone()),
            group,
            id,
            version,
            node_type: Some(NodeType::Dependency),
            children: node
                .children
                .iter()
                .filter_map(|c| self.line_node(c))
                .collect(),
        })
    }

    /// Flat, ordered list of per-module trees for a structural graph.
    ///
    /// Modules nested in modules are spliced into the list ahead of their
    /// parent, so `project` nodes only ever appear at the top level.
    pub fn normalize_structural(&self, root: &StructuralNode) -> Vec<DependencyTree> {
        let mut modules = Vec::new();
        self.collect_module(root, &mut modules);
        modules
    }

    fn collect_module(&self, module: &StructuralNode, modules: &mut Vec<DependencyTree>) {
        let children = self.structural_children(&module.children, modules);
        modules.push(self_node(module, children));
    }

    fn structural_children(
        &self,
        nodes: &[StructuralNode],
        modules: &mut Vec<DependencyTree>,
    ) -> Vec<DependencyTree> {
        let mut children = Vec::new();
        for node in nodes {
            if node.is_type(NodeType::Project) {
                self.collect_module(node, modules);
            } else if let Some(tree) = self.structural_node(node, modules) {
                children.push(tree);
            }
        }
        children
    }

    fn structural_node(
        &self,
        node: &StructuralNode,
        modules: &mut Vec<DependencyTree>,
    ) -> Option<DependencyTree> {
        // Subtrees marked as seen are expanded at their first occurrence.
        let children = if node.seen_before {
            Vec::new()
        } else {
            self.structural_children(&node.children, modules)
        };
        if node.is_type(NodeType::Configuration) && children.is_empty() {
            return None;
        }
        Some(self_node(node, children))
    }
}

fn self_node(node: &StructuralNode, children: Vec<DependencyTree>) -> DependencyTree {
    DependencyTree {
        name: node.name.clone(),
        group: node.group.clone(),
        id: node.id.clone(),
        version: node.version.clone(),
        node_type: node.node_type,
        children,
    }
}
