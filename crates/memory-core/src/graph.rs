// SPDX-License-Identifier: MIT OR Apache-2.0
//! Graph model consumed (not owned) by the retrieval pipeline: typed nodes,
//! directed typed edges, and chunk references into the vector store.

use schemars::JsonSchema;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// Typed node kind.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize, JsonSchema)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum NodeType {
    /// Documentation.
    Doc,
    /// Architecture decision record.
    Adr,
    /// A contract definition.
    Contract,
    /// A service.
    Service,
    /// A package.
    Package,
    /// An agent.
    Agent,
    /// A tool.
    Tool,
    /// An event.
    Event,
    /// A file.
    File,
    /// An API.
    Api,
    /// A port.
    Port,
}

impl NodeType {
    /// Priority used when sorting assembled context: higher sorts first.
    #[must_use]
    pub fn priority(&self) -> u8 {
        match self {
            Self::Doc | Self::Adr => 4,
            Self::Contract | Self::Service => 3,
            Self::Package | Self::Agent | Self::Tool => 2,
            Self::Event | Self::File | Self::Api | Self::Port => 1,
        }
    }
}

/// Directed edge kind.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize, JsonSchema)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum EdgeType {
    /// Source imports target.
    Imports,
    /// Source depends on target.
    DependsOn,
    /// Source implements the contract named by target.
    ImplementsContract,
    /// Source calls the tool named by target.
    CallsTool,
    /// Source emits the event named by target.
    EmitsEvent,
    /// Source exposes the port named by target.
    ExposesPort,
    /// Source references the doc named by target.
    ReferencesDoc,
    /// Source decides with the ADR named by target.
    DecidesWith,
    /// Caller-defined edge type, not one of the eight built-ins. Not part of
    /// the default `expansion.allowed_edges` set.
    Custom(String),
}

/// The eight built-in edge types, the default `expansion.allowed_edges`.
/// Excludes [`EdgeType::Custom`], which a caller must opt into explicitly.
#[must_use]
pub fn default_allowed_edges() -> Vec<EdgeType> {
    vec![
        EdgeType::Imports,
        EdgeType::DependsOn,
        EdgeType::ImplementsContract,
        EdgeType::CallsTool,
        EdgeType::EmitsEvent,
        EdgeType::ExposesPort,
        EdgeType::ReferencesDoc,
        EdgeType::DecidesWith,
    ]
}

/// A typed node in the graph store.
#[derive(Debug, Clone, Serialize, Deserialize, JsonSchema, PartialEq)]
pub struct Node {
    /// Node id.
    pub id: String,
    /// Node type.
    #[serde(rename = "type")]
    pub node_type: NodeType,
    /// Stable key (e.g. a file path or package name).
    pub key: String,
    /// Human-readable label.
    pub label: String,
    /// Free-form metadata.
    #[serde(default)]
    pub meta: BTreeMap<String, serde_json::Value>,
}

/// A directed typed edge.
#[derive(Debug, Clone, Serialize, Deserialize, JsonSchema, PartialEq)]
pub struct Edge {
    /// Edge id.
    pub id: String,
    /// Edge type.
    #[serde(rename = "type")]
    pub edge_type: EdgeType,
    /// Source node id.
    pub src_id: String,
    /// Destination node id.
    pub dst_id: String,
    /// Optional weight used to order neighbor expansion.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub weight: Option<f64>,
}

/// A reference from a graph node to a chunk in the vector store.
#[derive(Debug, Clone, Serialize, Deserialize, JsonSchema, PartialEq)]
pub struct ChunkReference {
    /// Chunk-reference id.
    pub id: String,
    /// Owning node id.
    pub node_id: String,
    /// Vector-store point id.
    pub vector_store_id: String,
    /// File path.
    pub path: String,
    /// Optional inclusive line range.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub line_range: Option<(u32, u32)>,
    /// Free-form metadata.
    #[serde(default)]
    pub meta: BTreeMap<String, serde_json::Value>,
}

impl ChunkReference {
    /// The `path:lineStart-lineEnd` dedup key used by context assembly,
    /// or just `path` when no line range is present.
    #[must_use]
    pub fn dedup_key(&self) -> String {
        match self.line_range {
            Some((start, end)) => format!("{}:{}-{}", self.path, start, end),
            None => self.path.clone(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn node_type_priority_ordering() {
        assert_eq!(NodeType::Doc.priority(), 4);
        assert_eq!(NodeType::Adr.priority(), 4);
        assert_eq!(NodeType::Contract.priority(), 3);
        assert_eq!(NodeType::Service.priority(), 3);
        assert_eq!(NodeType::Package.priority(), 2);
        assert_eq!(NodeType::Tool.priority(), 2);
        assert_eq!(NodeType::Event.priority(), 1);
        assert_eq!(NodeType::Port.priority(), 1);
    }

    #[test]
    fn default_allowed_edges_has_eight_entries_and_excludes_custom() {
        let edges = default_allowed_edges();
        assert_eq!(edges.len(), 8);
        assert!(!edges.iter().any(|e| matches!(e, EdgeType::Custom(_))));
    }

    #[test]
    fn custom_edge_type_round_trips_through_json() {
        let edge_type = EdgeType::Custom("mentors".to_string());
        let json = serde_json::to_string(&edge_type).unwrap();
        let back: EdgeType = serde_json::from_str(&json).unwrap();
        assert_eq!(back, edge_type);
    }

    #[test]
    fn dedup_key_with_line_range() {
        let cr = ChunkReference {
            id: "c1".into(),
            node_id: "n1".into(),
            vector_store_id: "v1".into(),
            path: "src/lib.rs".into(),
            line_range: Some((10, 20)),
            meta: BTreeMap::new(),
        };
        assert_eq!(cr.dedup_key(), "src/lib.rs:10-20");
    }

    #[test]
    fn dedup_key_without_line_range() {
        let cr = ChunkReference {
            id: "c2".into(),
            node_id: "n1".into(),
            vector_store_id: "v2".into(),
            path: "README.md".into(),
            line_range: None,
            meta: BTreeMap::new(),
        };
        assert_eq!(cr.dedup_key(), "README.md");
    }

    #[test]
    fn node_type_serde_is_screaming_snake_case() {
        let json = serde_json::to_string(&NodeType::Adr).unwrap();
        assert_eq!(json, r#""ADR""#);
    }

    #[test]
    fn edge_type_serde_is_screaming_snake_case() {
        let json = serde_json::to_string(&EdgeType::ImplementsContract).unwrap();
        assert_eq!(json, r#""IMPLEMENTS_CONTRACT""#);
    }
}
