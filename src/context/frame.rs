//! Context frames

use crate::graph::ContextType;
use crate::types::{ResourceRecord, RouteTable};
use serde::Serialize;

/// Detail fetched when the frame was pushed, refreshed by `show detail`.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "type", content = "value", rename_all = "kebab-case")]
pub enum FrameDetail {
    None,
    Resource(ResourceRecord),
    RouteTable(RouteTable),
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ContextFrame {
    pub context: ContextType,
    pub resource_id: Option<String>,
    pub resource_label: Option<String>,
    /// Path of the graph scope node whose commands apply in this frame.
    pub node_path: String,
    /// Index of the frame that pushed this one.
    pub parent: Option<usize>,
    pub cached_detail: FrameDetail,
}

impl ContextFrame {
    pub fn root() -> Self {
        Self {
            context: ContextType::Root,
            resource_id: None,
            resource_label: None,
            node_path: "root".to_string(),
            parent: None,
            cached_detail: FrameDetail::None,
        }
    }

    pub fn new(
        context: ContextType,
        node_path: impl Into<String>,
        resource_id: impl Into<String>,
        resource_label: impl Into<String>,
        detail: FrameDetail,
    ) -> Self {
        let label = resource_label.into();
        Self {
            context,
            resource_id: Some(resource_id.into()),
            resource_label: if label.is_empty() { None } else { Some(label) },
            node_path: node_path.into(),
            parent: None,
            cached_detail: detail,
        }
    }

    pub fn is_root(&self) -> bool {
        self.context == ContextType::Root
    }

    /// `vpc:prod`, or `vpc:vpc-123` when the resource has no label.
    pub fn display(&self) -> String {
        let name = self
            .resource_label
            .as_deref()
            .or(self.resource_id.as_deref())
            .unwrap_or_default();
        format!("{}:{}", self.context.prompt_tag(), name)
    }

    pub fn route_table(&self) -> Option<&RouteTable> {
        match &self.cached_detail {
            FrameDetail::RouteTable(table) => Some(table),
            _ => None,
        }
    }

    pub fn record(&self) -> Option<&ResourceRecord> {
        match &self.cached_detail {
            FrameDetail::Resource(record) => Some(record),
            _ => None,
        }
    }
}
