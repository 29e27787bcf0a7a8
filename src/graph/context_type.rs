//! Context types and the parents each may be entered from.

use crate::types::ResourceKind;
use serde::Serialize;
use std::fmt;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize)]
#[serde(rename_all = "kebab-case")]
pub enum ContextType {
    Root,
    GlobalNetwork,
    CoreNetwork,
    RouteTable,
    Vpc,
    TransitGateway,
    Firewall,
    Ec2Instance,
    Elb,
    Vpn,
}

impl ContextType {
    pub const ALL: [ContextType; 10] = [
        ContextType::Root,
        ContextType::GlobalNetwork,
        ContextType::CoreNetwork,
        ContextType::RouteTable,
        ContextType::Vpc,
        ContextType::TransitGateway,
        ContextType::Firewall,
        ContextType::Ec2Instance,
        ContextType::Elb,
        ContextType::Vpn,
    ];

    pub fn name(&self) -> &'static str {
        match self {
            ContextType::Root => "root",
            ContextType::GlobalNetwork => "global-network",
            ContextType::CoreNetwork => "core-network",
            ContextType::RouteTable => "route-table",
            ContextType::Vpc => "vpc",
            ContextType::TransitGateway => "transit-gateway",
            ContextType::Firewall => "firewall",
            ContextType::Ec2Instance => "ec2-instance",
            ContextType::Elb => "elb",
            ContextType::Vpn => "vpn",
        }
    }

    /// Accepts the canonical name, underscores for hyphens, and a few short forms.
    pub fn from_name(name: &str) -> Option<ContextType> {
        let normalized = name.trim().to_ascii_lowercase().replace('_', "-");
        let found = match normalized.as_str() {
            "tgw" => ContextType::TransitGateway,
            "rtb" => ContextType::RouteTable,
            "ec2" => ContextType::Ec2Instance,
            other => return Self::ALL.into_iter().find(|c| c.name() == other),
        };
        Some(found)
    }

    /// Contexts this one may be pushed on top of.
    pub fn entered_from(&self) -> &'static [ContextType] {
        match self {
            ContextType::Root => &[],
            ContextType::CoreNetwork => &[ContextType::GlobalNetwork],
            ContextType::RouteTable => &[
                ContextType::Vpc,
                ContextType::TransitGateway,
                ContextType::CoreNetwork,
            ],
            ContextType::GlobalNetwork
            | ContextType::Vpc
            | ContextType::TransitGateway
            | ContextType::Firewall
            | ContextType::Ec2Instance
            | ContextType::Elb
            | ContextType::Vpn => &[ContextType::Root],
        }
    }

    pub fn resource_kind(&self) -> Option<ResourceKind> {
        match self {
            ContextType::Root => None,
            ContextType::GlobalNetwork => Some(ResourceKind::GlobalNetwork),
            ContextType::CoreNetwork => Some(ResourceKind::CoreNetwork),
            ContextType::RouteTable => Some(ResourceKind::RouteTable),
            ContextType::Vpc => Some(ResourceKind::Vpc),
            ContextType::TransitGateway => Some(ResourceKind::TransitGateway),
            ContextType::Firewall => Some(ResourceKind::Firewall),
            ContextType::Ec2Instance => Some(ResourceKind::Ec2Instance),
            ContextType::Elb => Some(ResourceKind::Elb),
            ContextType::Vpn => Some(ResourceKind::Vpn),
        }
    }

    /// The `show` noun that lists candidates for entering this context.
    pub fn list_noun(&self) -> &'static str {
        match self {
            ContextType::Root => "",
            ContextType::GlobalNetwork => "global-networks",
            ContextType::CoreNetwork => "core-networks",
            ContextType::RouteTable => "route-tables",
            ContextType::Vpc => "vpcs",
            ContextType::TransitGateway => "transit-gateways",
            ContextType::Firewall => "firewalls",
            ContextType::Ec2Instance => "ec2-instances",
            ContextType::Elb => "elbs",
            ContextType::Vpn => "vpns",
        }
    }

    /// Short tag used in the prompt.
    pub fn prompt_tag(&self) -> &'static str {
        match self {
            ContextType::Root => "",
            ContextType::GlobalNetwork => "gn",
            ContextType::CoreNetwork => "cn",
            ContextType::RouteTable => "rtb",
            ContextType::Vpc => "vpc",
            ContextType::TransitGateway => "tgw",
            ContextType::Firewall => "fw",
            ContextType::Ec2Instance => "ec2",
            ContextType::Elb => "elb",
            ContextType::Vpn => "vpn",
        }
    }
}

impl fmt::Display for ContextType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}
