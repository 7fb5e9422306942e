//! Remote resource identities and per-run handles.
//!
//! Resources live only on the provider side; the tool recognizes them by
//! their `Name` and `Environment` tags. Identifiers resolved during a run
//! are carried forward in [`NetworkHandles`] so later steps never have to
//! look the same resource up twice.

/// The tag pair used as the identity key for a resource.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ResourceTags {
    pub name: String,
    pub environment: String,
}

impl ResourceTags {
    pub fn new(name: impl Into<String>, environment: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            environment: environment.into(),
        }
    }
}

/// Desired shape of one subnet: its Name tag, CIDR and availability zone.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SubnetSpec {
    pub name: String,
    pub cidr_block: String,
    pub availability_zone: String,
}

/// A subnet as reported by the provider.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SubnetInfo {
    pub id: String,
    pub name: String,
    pub cidr_block: String,
    pub availability_zone: String,
    pub vpc_id: String,
}

/// An internet gateway as reported by the provider, with the VPC it is
/// attached to, if any.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct GatewayInfo {
    pub id: String,
    pub attached_vpc: Option<String>,
}

/// One route table association. The main association belongs to the VPC
/// itself and is never created or removed by the tool.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RouteTableAssociation {
    pub id: String,
    pub subnet_id: Option<String>,
    pub main: bool,
}

/// Identifiers resolved over the course of a single run.
///
/// Each workflow step records the identifiers it resolved or created here,
/// and later steps consume them instead of querying the provider again.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct NetworkHandles {
    pub vpc_id: Option<String>,
    pub subnet_ids: Vec<String>,
    pub route_table_id: Option<String>,
    pub gateway_id: Option<String>,
}

impl NetworkHandles {
    pub fn new() -> Self {
        Self::default()
    }
}
