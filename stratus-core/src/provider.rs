//! The provider trait abstracting cloud network operations.
//!
//! Each method maps onto a single remote API call. Lookups return `None`
//! rather than an error when nothing matches the tags, so callers decide
//! whether absence means "create it" or "nothing to delete".

use async_trait::async_trait;
use thiserror::Error;

use crate::resource::{
    GatewayInfo, ResourceTags, RouteTableAssociation, SubnetInfo, SubnetSpec,
};

/// Error surfaced by a provider implementation. The message carries the
/// failed remote call; the workflow attaches the step it happened in.
#[derive(Debug, Error)]
#[error("{message}")]
pub struct ProviderError {
    message: String,
}

impl ProviderError {
    pub fn new(message: impl Into<String>) -> Self {
        Self {
            message: message.into(),
        }
    }
}

pub type ProviderResult<T> = Result<T, ProviderError>;

/// Operations the lifecycle workflow needs from a cloud provider.
///
/// Every resource the workflow creates is tagged with `Name` and
/// `Environment` at creation time, and every `find_*` resolves through those
/// same tags. The AWS implementation lives in `stratus-provider-aws`; tests
/// run against an in-memory implementation.
#[async_trait]
pub trait NetworkProvider: Send + Sync {
    async fn find_vpc(&self, tags: &ResourceTags) -> ProviderResult<Option<String>>;
    async fn create_vpc(&self, cidr_block: &str, tags: &ResourceTags) -> ProviderResult<String>;
    /// Enable DNS support and DNS hostname lookups on the VPC.
    async fn enable_dns(&self, vpc_id: &str) -> ProviderResult<()>;
    async fn delete_vpc(&self, vpc_id: &str) -> ProviderResult<()>;

    async fn find_subnet(
        &self,
        spec: &SubnetSpec,
        vpc_id: &str,
        environment: &str,
    ) -> ProviderResult<Option<String>>;
    async fn create_subnet(
        &self,
        spec: &SubnetSpec,
        vpc_id: &str,
        environment: &str,
    ) -> ProviderResult<String>;
    /// All subnets whose Name tag starts with the given prefix.
    async fn subnets_by_prefix(&self, prefix: &str) -> ProviderResult<Vec<SubnetInfo>>;
    async fn delete_subnet(&self, subnet_id: &str) -> ProviderResult<()>;

    /// Resolve the route table by tags, optionally scoped to one VPC.
    async fn find_route_table(
        &self,
        tags: &ResourceTags,
        vpc_id: Option<&str>,
    ) -> ProviderResult<Option<String>>;
    async fn create_route_table(
        &self,
        vpc_id: &str,
        tags: &ResourceTags,
    ) -> ProviderResult<String>;
    async fn route_table_associations(
        &self,
        route_table_id: &str,
    ) -> ProviderResult<Vec<RouteTableAssociation>>;
    /// Associate a subnet, returning the new association identifier.
    async fn associate_subnet(
        &self,
        route_table_id: &str,
        subnet_id: &str,
    ) -> ProviderResult<String>;
    async fn disassociate(&self, association_id: &str) -> ProviderResult<()>;
    async fn delete_route_table(&self, route_table_id: &str) -> ProviderResult<()>;

    async fn find_internet_gateway(
        &self,
        tags: &ResourceTags,
    ) -> ProviderResult<Option<GatewayInfo>>;
    async fn create_internet_gateway(&self, tags: &ResourceTags) -> ProviderResult<String>;
    async fn attach_internet_gateway(
        &self,
        gateway_id: &str,
        vpc_id: &str,
    ) -> ProviderResult<()>;
    async fn detach_internet_gateway(
        &self,
        gateway_id: &str,
        vpc_id: &str,
    ) -> ProviderResult<()>;
    async fn delete_internet_gateway(&self, gateway_id: &str) -> ProviderResult<()>;

    /// Whether the route table already carries a route to the destination.
    async fn route_exists(
        &self,
        route_table_id: &str,
        destination_cidr: &str,
    ) -> ProviderResult<bool>;
    async fn create_route(
        &self,
        route_table_id: &str,
        destination_cidr: &str,
        gateway_id: &str,
    ) -> ProviderResult<()>;
    async fn delete_route(
        &self,
        route_table_id: &str,
        destination_cidr: &str,
    ) -> ProviderResult<()>;
}
