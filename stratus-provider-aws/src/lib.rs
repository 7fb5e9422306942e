//! AWS implementation of the network provider.
//!
//! Every operation maps onto one EC2 API call. Resources are resolved
//! through `tag:Name` and `tag:Environment` filters and tagged at creation
//! time, so a later run recognizes what an earlier run built.

use async_trait::async_trait;
use aws_config::Region;
use aws_sdk_ec2::Client as Ec2Client;
use aws_sdk_ec2::types::{
    AttributeBooleanValue, Filter, ResourceType, Tag, TagSpecification,
};

use stratus_core::provider::{NetworkProvider, ProviderError, ProviderResult};
use stratus_core::resource::{
    GatewayInfo, ResourceTags, RouteTableAssociation, SubnetInfo, SubnetSpec,
};

/// Network provider backed by the EC2 API.
pub struct AwsNetworkProvider {
    client: Ec2Client,
}

impl AwsNetworkProvider {
    /// Create a provider for the given region using the default credential
    /// chain.
    pub async fn new(region: &str) -> Self {
        let config = aws_config::defaults(aws_config::BehaviorVersion::latest())
            .region(Region::new(region.to_string()))
            .load()
            .await;

        Self {
            client: Ec2Client::new(&config),
        }
    }

    /// Create a provider with a specific client (for testing).
    pub fn with_client(client: Ec2Client) -> Self {
        Self { client }
    }

    fn tag_filters(tags: &ResourceTags) -> Vec<Filter> {
        vec![
            Filter::builder()
                .name("tag:Name")
                .values(tags.name.as_str())
                .build(),
            Filter::builder()
                .name("tag:Environment")
                .values(tags.environment.as_str())
                .build(),
        ]
    }

    fn tag_specification(
        resource_type: ResourceType,
        name: &str,
        environment: &str,
    ) -> TagSpecification {
        TagSpecification::builder()
            .resource_type(resource_type)
            .tags(Tag::builder().key("Name").value(name).build())
            .tags(Tag::builder().key("Environment").value(environment).build())
            .build()
    }

    fn name_tag_of(tags: &[Tag]) -> Option<String> {
        tags.iter()
            .find(|t| t.key() == Some("Name"))
            .and_then(|t| t.value())
            .map(String::from)
    }
}

#[async_trait]
impl NetworkProvider for AwsNetworkProvider {
    async fn find_vpc(&self, tags: &ResourceTags) -> ProviderResult<Option<String>> {
        let result = self
            .client
            .describe_vpcs()
            .set_filters(Some(Self::tag_filters(tags)))
            .send()
            .await
            .map_err(|e| ProviderError::new(format!("Failed to describe VPCs: {:?}", e)))?;

        Ok(result
            .vpcs()
            .first()
            .and_then(|vpc| vpc.vpc_id().map(String::from)))
    }

    async fn create_vpc(&self, cidr_block: &str, tags: &ResourceTags) -> ProviderResult<String> {
        let result = self
            .client
            .create_vpc()
            .cidr_block(cidr_block)
            .tag_specifications(Self::tag_specification(
                ResourceType::Vpc,
                &tags.name,
                &tags.environment,
            ))
            .send()
            .await
            .map_err(|e| ProviderError::new(format!("Failed to create VPC: {:?}", e)))?;

        result
            .vpc()
            .and_then(|vpc| vpc.vpc_id())
            .map(String::from)
            .ok_or_else(|| ProviderError::new("VPC created but no ID returned"))
    }

    async fn enable_dns(&self, vpc_id: &str) -> ProviderResult<()> {
        self.client
            .modify_vpc_attribute()
            .vpc_id(vpc_id)
            .enable_dns_support(AttributeBooleanValue::builder().value(true).build())
            .send()
            .await
            .map_err(|e| ProviderError::new(format!("Failed to enable DNS support: {:?}", e)))?;

        self.client
            .modify_vpc_attribute()
            .vpc_id(vpc_id)
            .enable_dns_hostnames(AttributeBooleanValue::builder().value(true).build())
            .send()
            .await
            .map_err(|e| {
                ProviderError::new(format!("Failed to enable DNS hostnames: {:?}", e))
            })?;

        Ok(())
    }

    async fn delete_vpc(&self, vpc_id: &str) -> ProviderResult<()> {
        self.client
            .delete_vpc()
            .vpc_id(vpc_id)
            .send()
            .await
            .map_err(|e| ProviderError::new(format!("Failed to delete VPC: {:?}", e)))?;

        Ok(())
    }

    async fn find_subnet(
        &self,
        spec: &SubnetSpec,
        vpc_id: &str,
        environment: &str,
    ) -> ProviderResult<Option<String>> {
        // Match on everything the subnet is defined by, so a half-renamed or
        // re-addressed subnet is not silently reused.
        let filters = vec![
            Filter::builder()
                .name("cidr-block")
                .values(spec.cidr_block.as_str())
                .build(),
            Filter::builder()
                .name("availability-zone")
                .values(spec.availability_zone.as_str())
                .build(),
            Filter::builder().name("vpc-id").values(vpc_id).build(),
            Filter::builder()
                .name("tag:Name")
                .values(spec.name.as_str())
                .build(),
            Filter::builder()
                .name("tag:Environment")
                .values(environment)
                .build(),
        ];

        let result = self
            .client
            .describe_subnets()
            .set_filters(Some(filters))
            .send()
            .await
            .map_err(|e| ProviderError::new(format!("Failed to describe subnets: {:?}", e)))?;

        Ok(result
            .subnets()
            .first()
            .and_then(|subnet| subnet.subnet_id().map(String::from)))
    }

    async fn create_subnet(
        &self,
        spec: &SubnetSpec,
        vpc_id: &str,
        environment: &str,
    ) -> ProviderResult<String> {
        let result = self
            .client
            .create_subnet()
            .vpc_id(vpc_id)
            .cidr_block(spec.cidr_block.as_str())
            .availability_zone(spec.availability_zone.as_str())
            .tag_specifications(Self::tag_specification(
                ResourceType::Subnet,
                &spec.name,
                environment,
            ))
            .send()
            .await
            .map_err(|e| ProviderError::new(format!("Failed to create subnet: {:?}", e)))?;

        result
            .subnet()
            .and_then(|subnet| subnet.subnet_id())
            .map(String::from)
            .ok_or_else(|| ProviderError::new("Subnet created but no ID returned"))
    }

    async fn subnets_by_prefix(&self, prefix: &str) -> ProviderResult<Vec<SubnetInfo>> {
        let filter = Filter::builder()
            .name("tag:Name")
            .values(format!("{}*", prefix))
            .build();

        let result = self
            .client
            .describe_subnets()
            .filters(filter)
            .send()
            .await
            .map_err(|e| ProviderError::new(format!("Failed to describe subnets: {:?}", e)))?;

        let mut subnets = Vec::new();
        for subnet in result.subnets() {
            let (Some(id), Some(vpc_id)) = (subnet.subnet_id(), subnet.vpc_id()) else {
                continue;
            };
            subnets.push(SubnetInfo {
                id: id.to_string(),
                name: Self::name_tag_of(subnet.tags()).unwrap_or_default(),
                cidr_block: subnet.cidr_block().unwrap_or_default().to_string(),
                availability_zone: subnet.availability_zone().unwrap_or_default().to_string(),
                vpc_id: vpc_id.to_string(),
            });
        }

        Ok(subnets)
    }

    async fn delete_subnet(&self, subnet_id: &str) -> ProviderResult<()> {
        self.client
            .delete_subnet()
            .subnet_id(subnet_id)
            .send()
            .await
            .map_err(|e| ProviderError::new(format!("Failed to delete subnet: {:?}", e)))?;

        Ok(())
    }

    async fn find_route_table(
        &self,
        tags: &ResourceTags,
        vpc_id: Option<&str>,
    ) -> ProviderResult<Option<String>> {
        let mut filters = Self::tag_filters(tags);
        if let Some(vpc_id) = vpc_id {
            filters.push(Filter::builder().name("vpc-id").values(vpc_id).build());
        }

        let result = self
            .client
            .describe_route_tables()
            .set_filters(Some(filters))
            .send()
            .await
            .map_err(|e| {
                ProviderError::new(format!("Failed to describe route tables: {:?}", e))
            })?;

        Ok(result
            .route_tables()
            .first()
            .and_then(|rt| rt.route_table_id().map(String::from)))
    }

    async fn create_route_table(
        &self,
        vpc_id: &str,
        tags: &ResourceTags,
    ) -> ProviderResult<String> {
        let result = self
            .client
            .create_route_table()
            .vpc_id(vpc_id)
            .tag_specifications(Self::tag_specification(
                ResourceType::RouteTable,
                &tags.name,
                &tags.environment,
            ))
            .send()
            .await
            .map_err(|e| ProviderError::new(format!("Failed to create route table: {:?}", e)))?;

        result
            .route_table()
            .and_then(|rt| rt.route_table_id())
            .map(String::from)
            .ok_or_else(|| ProviderError::new("Route table created but no ID returned"))
    }

    async fn route_table_associations(
        &self,
        route_table_id: &str,
    ) -> ProviderResult<Vec<RouteTableAssociation>> {
        let result = self
            .client
            .describe_route_tables()
            .route_table_ids(route_table_id)
            .send()
            .await
            .map_err(|e| {
                ProviderError::new(format!("Failed to describe route table: {:?}", e))
            })?;

        let mut associations = Vec::new();
        if let Some(rt) = result.route_tables().first() {
            for association in rt.associations() {
                let Some(id) = association.route_table_association_id() else {
                    continue;
                };
                associations.push(RouteTableAssociation {
                    id: id.to_string(),
                    subnet_id: association.subnet_id().map(String::from),
                    main: association.main().unwrap_or(false),
                });
            }
        }

        Ok(associations)
    }

    async fn associate_subnet(
        &self,
        route_table_id: &str,
        subnet_id: &str,
    ) -> ProviderResult<String> {
        let result = self
            .client
            .associate_route_table()
            .route_table_id(route_table_id)
            .subnet_id(subnet_id)
            .send()
            .await
            .map_err(|e| {
                ProviderError::new(format!("Failed to associate route table: {:?}", e))
            })?;

        result
            .association_id()
            .map(String::from)
            .ok_or_else(|| ProviderError::new("Association created but no ID returned"))
    }

    async fn disassociate(&self, association_id: &str) -> ProviderResult<()> {
        self.client
            .disassociate_route_table()
            .association_id(association_id)
            .send()
            .await
            .map_err(|e| {
                ProviderError::new(format!("Failed to disassociate route table: {:?}", e))
            })?;

        Ok(())
    }

    async fn delete_route_table(&self, route_table_id: &str) -> ProviderResult<()> {
        self.client
            .delete_route_table()
            .route_table_id(route_table_id)
            .send()
            .await
            .map_err(|e| ProviderError::new(format!("Failed to delete route table: {:?}", e)))?;

        Ok(())
    }

    async fn find_internet_gateway(
        &self,
        tags: &ResourceTags,
    ) -> ProviderResult<Option<GatewayInfo>> {
        let result = self
            .client
            .describe_internet_gateways()
            .set_filters(Some(Self::tag_filters(tags)))
            .send()
            .await
            .map_err(|e| {
                ProviderError::new(format!("Failed to describe internet gateways: {:?}", e))
            })?;

        Ok(result.internet_gateways().first().and_then(|igw| {
            igw.internet_gateway_id().map(|id| GatewayInfo {
                id: id.to_string(),
                attached_vpc: igw
                    .attachments()
                    .first()
                    .and_then(|attachment| attachment.vpc_id())
                    .map(String::from),
            })
        }))
    }

    async fn create_internet_gateway(&self, tags: &ResourceTags) -> ProviderResult<String> {
        let result = self
            .client
            .create_internet_gateway()
            .tag_specifications(Self::tag_specification(
                ResourceType::InternetGateway,
                &tags.name,
                &tags.environment,
            ))
            .send()
            .await
            .map_err(|e| {
                ProviderError::new(format!("Failed to create internet gateway: {:?}", e))
            })?;

        result
            .internet_gateway()
            .and_then(|igw| igw.internet_gateway_id())
            .map(String::from)
            .ok_or_else(|| ProviderError::new("Internet gateway created but no ID returned"))
    }

    async fn attach_internet_gateway(
        &self,
        gateway_id: &str,
        vpc_id: &str,
    ) -> ProviderResult<()> {
        self.client
            .attach_internet_gateway()
            .internet_gateway_id(gateway_id)
            .vpc_id(vpc_id)
            .send()
            .await
            .map_err(|e| {
                ProviderError::new(format!("Failed to attach internet gateway: {:?}", e))
            })?;

        Ok(())
    }

    async fn detach_internet_gateway(
        &self,
        gateway_id: &str,
        vpc_id: &str,
    ) -> ProviderResult<()> {
        self.client
            .detach_internet_gateway()
            .internet_gateway_id(gateway_id)
            .vpc_id(vpc_id)
            .send()
            .await
            .map_err(|e| {
                ProviderError::new(format!("Failed to detach internet gateway: {:?}", e))
            })?;

        Ok(())
    }

    async fn delete_internet_gateway(&self, gateway_id: &str) -> ProviderResult<()> {
        self.client
            .delete_internet_gateway()
            .internet_gateway_id(gateway_id)
            .send()
            .await
            .map_err(|e| {
                ProviderError::new(format!("Failed to delete internet gateway: {:?}", e))
            })?;

        Ok(())
    }

    async fn route_exists(
        &self,
        route_table_id: &str,
        destination_cidr: &str,
    ) -> ProviderResult<bool> {
        let result = self
            .client
            .describe_route_tables()
            .route_table_ids(route_table_id)
            .send()
            .await
            .map_err(|e| {
                ProviderError::new(format!("Failed to describe route table: {:?}", e))
            })?;

        Ok(result.route_tables().first().is_some_and(|rt| {
            rt.routes()
                .iter()
                .any(|route| route.destination_cidr_block() == Some(destination_cidr))
        }))
    }

    async fn create_route(
        &self,
        route_table_id: &str,
        destination_cidr: &str,
        gateway_id: &str,
    ) -> ProviderResult<()> {
        self.client
            .create_route()
            .route_table_id(route_table_id)
            .destination_cidr_block(destination_cidr)
            .gateway_id(gateway_id)
            .send()
            .await
            .map_err(|e| ProviderError::new(format!("Failed to create route: {:?}", e)))?;

        Ok(())
    }

    async fn delete_route(
        &self,
        route_table_id: &str,
        destination_cidr: &str,
    ) -> ProviderResult<()> {
        self.client
            .delete_route()
            .route_table_id(route_table_id)
            .destination_cidr_block(destination_cidr)
            .send()
            .await
            .map_err(|e| ProviderError::new(format!("Failed to delete route: {:?}", e)))?;

        Ok(())
    }
}
