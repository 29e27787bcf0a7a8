//! Core data model: resource records, route tables and route entries.

use ipnetwork::IpNetwork;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fmt;

/// Kinds of resource the inventory can enumerate.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum ResourceKind {
    GlobalNetwork,
    CoreNetwork,
    Segment,
    ConnectPeer,
    Vpc,
    Subnet,
    SecurityGroup,
    NetworkAcl,
    InternetGateway,
    NatGateway,
    VpcEndpoint,
    TransitGateway,
    Attachment,
    RouteTable,
    Firewall,
    RuleGroup,
    Ec2Instance,
    NetworkInterface,
    Elb,
    Listener,
    TargetGroup,
    Vpn,
    Tunnel,
}

impl ResourceKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            ResourceKind::GlobalNetwork => "global-network",
            ResourceKind::CoreNetwork => "core-network",
            ResourceKind::Segment => "segment",
            ResourceKind::ConnectPeer => "connect-peer",
            ResourceKind::Vpc => "vpc",
            ResourceKind::Subnet => "subnet",
            ResourceKind::SecurityGroup => "security-group",
            ResourceKind::NetworkAcl => "network-acl",
            ResourceKind::InternetGateway => "internet-gateway",
            ResourceKind::NatGateway => "nat-gateway",
            ResourceKind::VpcEndpoint => "vpc-endpoint",
            ResourceKind::TransitGateway => "transit-gateway",
            ResourceKind::Attachment => "attachment",
            ResourceKind::RouteTable => "route-table",
            ResourceKind::Firewall => "firewall",
            ResourceKind::RuleGroup => "rule-group",
            ResourceKind::Ec2Instance => "ec2-instance",
            ResourceKind::NetworkInterface => "network-interface",
            ResourceKind::Elb => "elb",
            ResourceKind::Listener => "listener",
            ResourceKind::TargetGroup => "target-group",
            ResourceKind::Vpn => "vpn",
            ResourceKind::Tunnel => "tunnel",
        }
    }
}

impl fmt::Display for ResourceKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A resource as returned by the inventory: identity plus whatever attributes the
/// provider chose to keep.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ResourceRecord {
    pub id: String,
    #[serde(default)]
    pub label: String,
    pub kind: ResourceKind,
    #[serde(default)]
    pub region: Option<String>,
    #[serde(default)]
    pub parent_id: Option<String>,
    #[serde(default)]
    pub raw_attributes: BTreeMap<String, serde_json::Value>,
}

impl ResourceRecord {
    pub fn new(kind: ResourceKind, id: impl Into<String>, label: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            label: label.into(),
            kind,
            region: None,
            parent_id: None,
            raw_attributes: BTreeMap::new(),
        }
    }

    pub fn with_parent(mut self, parent_id: impl Into<String>) -> Self {
        self.parent_id = Some(parent_id.into());
        self
    }

    pub fn with_region(mut self, region: impl Into<String>) -> Self {
        self.region = Some(region.into());
        self
    }

    pub fn with_attribute(mut self, key: impl Into<String>, value: serde_json::Value) -> Self {
        self.raw_attributes.insert(key.into(), value);
        self
    }

    /// Label if the resource has one, id otherwise.
    pub fn display_label(&self) -> &str {
        if self.label.is_empty() {
            &self.id
        } else {
            &self.label
        }
    }

    /// Attribute rendered as plain text (strings without quotes).
    pub fn attribute_text(&self, key: &str) -> Option<String> {
        self.raw_attributes.get(key).map(value_text)
    }
}

pub(crate) fn value_text(value: &serde_json::Value) -> String {
    match value {
        serde_json::Value::String(s) => s.clone(),
        serde_json::Value::Null => String::new(),
        other => other.to_string(),
    }
}

/// Route state as reported by the provider.
///
/// Providers disagree on case (`ACTIVE` vs `active`); parsing is case-insensitive and
/// anything that is neither active nor blackhole is kept verbatim.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(from = "String", into = "String")]
pub enum RouteState {
    #[default]
    Active,
    Blackhole,
    Other(String),
}

impl From<String> for RouteState {
    fn from(value: String) -> Self {
        match value.to_ascii_lowercase().as_str() {
            "active" => RouteState::Active,
            "blackhole" => RouteState::Blackhole,
            _ => RouteState::Other(value),
        }
    }
}

impl From<RouteState> for String {
    fn from(state: RouteState) -> Self {
        state.to_string()
    }
}

impl fmt::Display for RouteState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            RouteState::Active => f.write_str("active"),
            RouteState::Blackhole => f.write_str("blackhole"),
            RouteState::Other(s) => f.write_str(s),
        }
    }
}

/// What a route points at.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(from = "String", into = "String")]
pub enum TargetKind {
    Local,
    InternetGateway,
    EgressOnlyGateway,
    NatGateway,
    Instance,
    NetworkInterface,
    VpcEndpoint,
    VpcPeering,
    VpnGateway,
    TransitGateway,
    Attachment,
    CoreNetwork,
    Other(String),
}

impl TargetKind {
    /// Targets that can hand traffic to another route table.
    ///
    /// Everything else ends a trace.
    pub fn may_forward(&self) -> bool {
        matches!(
            self,
            TargetKind::TransitGateway | TargetKind::Attachment | TargetKind::CoreNetwork
        )
    }

    pub fn as_str(&self) -> &str {
        match self {
            TargetKind::Local => "local",
            TargetKind::InternetGateway => "internet-gateway",
            TargetKind::EgressOnlyGateway => "egress-only-gateway",
            TargetKind::NatGateway => "nat-gateway",
            TargetKind::Instance => "instance",
            TargetKind::NetworkInterface => "network-interface",
            TargetKind::VpcEndpoint => "vpc-endpoint",
            TargetKind::VpcPeering => "vpc-peering",
            TargetKind::VpnGateway => "vpn-gateway",
            TargetKind::TransitGateway => "transit-gateway",
            TargetKind::Attachment => "attachment",
            TargetKind::CoreNetwork => "core-network",
            TargetKind::Other(s) => s,
        }
    }
}

impl From<String> for TargetKind {
    fn from(value: String) -> Self {
        match value.to_ascii_lowercase().replace('_', "-").as_str() {
            "local" => TargetKind::Local,
            "internet-gateway" | "igw" => TargetKind::InternetGateway,
            "egress-only-gateway" | "eigw" => TargetKind::EgressOnlyGateway,
            "nat-gateway" | "nat" => TargetKind::NatGateway,
            "instance" => TargetKind::Instance,
            "network-interface" | "eni" => TargetKind::NetworkInterface,
            "vpc-endpoint" | "endpoint" => TargetKind::VpcEndpoint,
            "vpc-peering" | "peering" => TargetKind::VpcPeering,
            "vpn-gateway" | "vgw" => TargetKind::VpnGateway,
            "transit-gateway" | "tgw" => TargetKind::TransitGateway,
            "attachment" => TargetKind::Attachment,
            "core-network" => TargetKind::CoreNetwork,
            _ => TargetKind::Other(value),
        }
    }
}

impl From<TargetKind> for String {
    fn from(kind: TargetKind) -> Self {
        kind.as_str().to_string()
    }
}

impl fmt::Display for TargetKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// One route. Belongs to exactly one `RouteTable`.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct RouteEntry {
    pub destination: IpNetwork,
    pub target_kind: TargetKind,
    pub target_id: String,
    #[serde(default)]
    pub state: RouteState,
}

impl RouteEntry {
    pub fn new(destination: IpNetwork, target_kind: TargetKind, target_id: impl Into<String>) -> Self {
        Self {
            destination,
            target_kind,
            target_id: target_id.into(),
            state: RouteState::Active,
        }
    }

    pub fn blackhole(mut self) -> Self {
        self.state = RouteState::Blackhole;
        self
    }

    pub fn is_blackhole(&self) -> bool {
        self.state == RouteState::Blackhole
    }
}

/// Association or propagation edge between a route table and an attachment.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Association {
    pub attachment_id: String,
    #[serde(default)]
    pub resource_id: Option<String>,
    #[serde(rename = "type", default)]
    pub attachment_type: String,
    #[serde(default)]
    pub state: String,
}

impl Association {
    pub fn new(attachment_id: impl Into<String>) -> Self {
        Self {
            attachment_id: attachment_id.into(),
            resource_id: None,
            attachment_type: String::new(),
            state: "associated".to_string(),
        }
    }

    pub fn for_resource(mut self, resource_id: impl Into<String>) -> Self {
        self.resource_id = Some(resource_id.into());
        self
    }

    pub fn with_type(mut self, attachment_type: impl Into<String>) -> Self {
        self.attachment_type = attachment_type.into();
        self
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RouteTable {
    pub id: String,
    #[serde(default)]
    pub label: String,
    pub owner_kind: ResourceKind,
    pub owner_id: String,
    #[serde(default)]
    pub region: Option<String>,
    /// Main route table of its owner (VPC semantics).
    #[serde(default)]
    pub main: bool,
    #[serde(default)]
    pub routes: Vec<RouteEntry>,
    #[serde(default)]
    pub associations: Vec<Association>,
    #[serde(default)]
    pub propagations: Vec<Association>,
}

impl RouteTable {
    pub fn new(id: impl Into<String>, owner_kind: ResourceKind, owner_id: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            label: String::new(),
            owner_kind,
            owner_id: owner_id.into(),
            region: None,
            main: false,
            routes: Vec::new(),
            associations: Vec::new(),
            propagations: Vec::new(),
        }
    }

    pub fn with_route(mut self, route: RouteEntry) -> Self {
        self.routes.push(route);
        self
    }

    pub fn with_association(mut self, association: Association) -> Self {
        self.associations.push(association);
        self
    }

    /// True if `id` names one of this table's associated attachments or their resources.
    pub fn is_associated_with(&self, id: &str) -> bool {
        self.associations
            .iter()
            .any(|a| a.attachment_id == id || a.resource_id.as_deref() == Some(id))
    }

    pub fn blackhole_count(&self) -> usize {
        self.routes.iter().filter(|r| r.is_blackhole()).count()
    }

    /// Summary record used when route tables are listed alongside other resources.
    pub fn to_record(&self) -> ResourceRecord {
        let mut record = ResourceRecord::new(ResourceKind::RouteTable, self.id.clone(), self.label.clone())
            .with_parent(self.owner_id.clone())
            .with_attribute("owner_kind", serde_json::json!(self.owner_kind.as_str()))
            .with_attribute("main", serde_json::json!(self.main))
            .with_attribute("routes", serde_json::json!(self.routes.len()))
            .with_attribute("associations", serde_json::json!(self.associations.len()));
        record.region = self.region.clone();
        record
    }
}
