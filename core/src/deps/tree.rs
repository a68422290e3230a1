use serde::{Deserialize, Serialize};

/// Kind of a dependency-graph node.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum NodeType {
    Project,
    Configuration,
    Module,
    Dependency,
    #[serde(other)]
    Unknown,
}

impl NodeType {
    pub fn parse(s: &str) -> Self {
        match s.trim().to_ascii_lowercase().as_str() {
            "project" => Self::Project,
            "configuration" => Self::Configuration,
            "module" => Self::Module,
            "dependency" => Self::Dependency,
            _ => Self::Unknown,
        }
    }

    pub fn as_str(self) -> &'static str {
        match self {
            Self::Project => "project",
            Self::Configuration => "configuration",
            Self::Module => "module",
            Self::Dependency => "dependency",
            Self::Unknown => "unknown",
        }
    }
}

/// Canonical dependency node as returned to clients.
///
/// Optional metadata stays optional in memory and is written as `""` on the
/// wire; reading `""` back yields `None`.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct DependencyTree {
    #[serde(with = "empty_string", default)]
    pub name: Option<String>,
    #[serde(with = "empty_string", default)]
    pub group: Option<String>,
    #[serde(with = "empty_string", default)]
    pub id: Option<String>,
    #[serde(with = "empty_string", default)]
    pub version: Option<String>,
    #[serde(rename = "type", with = "node_type_or_empty", default)]
    pub node_type: Option<NodeType>,
    #[serde(default)]
    pub children: Vec<DependencyTree>,
}

impl DependencyTree {
    pub fn named(name: impl Into<String>, node_type: NodeType) -> Self {
        Self {
            name: Some(name.into()),
            node_type: Some(node_type),
            ..Self::default()
        }
    }

    pub fn with_children(mut self, children: Vec<DependencyTree>) -> Self {
        self.children = children;
        self
    }

    pub fn is_type(&self, node_type: NodeType) -> bool {
        self.node_type == Some(node_type)
    }

    /// Display label: the name, or `group:id:version` for unnamed nodes.
    pub fn label(&self) -> String {
        if let Some(name) = self.name.as_deref().filter(|n| !n.is_empty()) {
            return name.to_string();
        }
        [&self.group, &self.id, &self.version]
            .iter()
            .filter_map(|p| p.as_deref())
            .collect::<Vec<_>>()
            .join(":")
    }

    /// Number of nodes in this subtree, including `self`.
    pub fn node_count(&self) -> usize {
        1 + self.children.iter().map(|c| c.node_count()).sum::<usize>()
    }
}

mod empty_string {
    use serde::{Deserialize, Deserializer, Serializer};

    pub fn serialize<S>(value: &Option<String>, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        serializer.serialize_str(value.as_deref().unwrap_or(""))
    }

    pub fn deserialize<'de, D>(deserializer: D) -> Result<Option<String>, D::Error>
    where
        D: Deserializer<'de>,
    {
        let value = Option::<String>::deserialize(deserializer)?;
        Ok(value.filter(|s| !s.is_empty()))
    }
}

mod node_type_or_empty {
    use super::NodeType;
    use serde::{Deserialize, Deserializer, Serializer};

    pub fn serialize<S>(value: &Option<NodeType>, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        serializer.serialize_str(value.map(NodeType::as_str).unwrap_or(""))
    }

    pub fn deserialize<'de, D>(deserializer: D) -> Result<Option<NodeType>, D::Error>
    where
        D: Deserializer<'de>,
    {
        let value = Option::<String>::deserialize(deserializer)?;
        Ok(value.filter(|s| !s.is_empty()).map(|s| NodeType::parse(&s)))
    }
}
