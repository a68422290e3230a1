use serde::{Deserialize, Serialize};

use super::tree::NodeType;

/// One line of a console dependency tree and the lines nested below it.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct LineNode {
    pub text: String,
    pub children: Vec<LineNode>,
}

impl LineNode {
    pub fn new(text: impl Into<String>) -> Self {
        Self {
            text: text.into(),
            children: Vec::new(),
        }
    }

    pub fn with_children(mut self, children: Vec<LineNode>) -> Self {
        self.children = children;
        self
    }

    pub fn is_elided(&self, markers: &[String]) -> bool {
        markers.iter().any(|m| self.text.contains(m.as_str()))
    }
}

/// A configuration (source set) block of a console report.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ConfigurationBlock {
    pub name: String,
    pub description: Option<String>,
    pub nodes: Vec<LineNode>,
}

/// All configuration blocks printed for one project.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Subproject {
    pub name: String,
    pub configurations: Vec<ConfigurationBlock>,
}

/// Parsed console output of one `dependencies` invocation.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct DependencyReport {
    pub projects: Vec<Subproject>,
}

impl DependencyReport {
    pub fn first_project(&self) -> Option<&Subproject> {
        self.projects.first()
    }
}

/// Root project name and its direct children, as listed by the `projects` report.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ProjectOutline {
    pub name: String,
    pub children: Vec<String>,
}

/// Node of a dependency graph produced by a programmatic model query.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct StructuralNode {
    #[serde(default)]
    pub name: Option<String>,
    #[serde(default)]
    pub group: Option<String>,
    #[serde(default)]
    pub id: Option<String>,
    #[serde(default)]
    pub version: Option<String>,
    #[serde(rename = "type", default)]
    pub node_type: Option<NodeType>,
    #[serde(default)]
    pub seen_before: bool,
    #[serde(default)]
    pub children: Vec<StructuralNode>,
}

impl StructuralNode {
    pub fn new(name: impl Into<String>, node_type: NodeType) -> Self {
        Self {
            name: Some(name.into()),
            node_type: Some(node_type),
            ..Self::default()
        }
    }

    pub fn with_children(mut self, children: Vec<StructuralNode>) -> Self {
        self.children = children;
        self
    }

    pub fn is_type(&self, node_type: NodeType) -> bool {
        self.node_type == Some(node_type)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn structural_node_accepts_nulls_and_missing_fields() {
        let node: StructuralNode = serde_json::from_str(
            r#"{"name":"app","group":null,"type":"project","children":[
                {"group":"com.x","id":"y","version":"1.0","type":"dependency","seenBefore":true}
            ]}"#,
        )
        .unwrap();
        assert_eq!(node.group, None);
        assert!(node.is_type(NodeType::Project));
        assert!(node.children[0].seen_before);
        assert_eq!(node.children[0].name, None);
    }

    #[test]
    fn elision_uses_any_marker() {
        let markers = vec!["(*)".to_string(), "(n)".to_string()];
        assert!(LineNode::new("org.a:b:1.0 (*)").is_elided(&markers));
        assert!(LineNode::new("org.a:b:1.0 (n)").is_elided(&markers));
        assert!(!LineNode::new("org.a:b:1.0 (c)").is_elided(&markers));
    }
}
