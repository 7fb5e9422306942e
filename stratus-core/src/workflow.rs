//! The ordered, guarded steps that bring the network up and tear it down.
//!
//! Both flows are flat sequences fixed by resource dependency: a route table
//! cannot exist before its VPC, a gateway cannot be detached before it was
//! attached. Every create step looks the resource up by tag first and reuses
//! it when found; every delete step treats "nothing there" as a no-op.
//! Execution is fail-fast: the first failed step ends the run, and whatever
//! was already applied stays applied.

use std::collections::HashSet;

use crate::config::NetworkConfig;
use crate::provider::{NetworkProvider, ProviderError};
use crate::resource::NetworkHandles;

/// What happened to one step of the chain.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum StepOutcome {
    /// The resource was created (or attached/associated) during this run.
    Created { id: String },
    /// A matching resource already existed and its identifier was reused.
    Reused { id: String },
    /// The resource was removed (or detached/disassociated).
    Deleted { id: String },
    /// Nothing to do.
    Skipped { reason: String },
}

impl StepOutcome {
    fn skipped(reason: impl Into<String>) -> Self {
        Self::Skipped {
            reason: reason.into(),
        }
    }
}

/// One executed step: a human-readable label plus its outcome.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StepRecord {
    pub step: String,
    pub outcome: StepOutcome,
}

/// The step that ended a run early, and why.
#[derive(Debug)]
pub struct StepFailure {
    pub step: String,
    pub error: ProviderError,
}

impl std::fmt::Display for StepFailure {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}: {}", self.step, self.error)
    }
}

/// Result of running a whole create or delete chain.
#[derive(Debug, Default)]
pub struct RunReport {
    pub records: Vec<StepRecord>,
    pub failure: Option<StepFailure>,
}

impl RunReport {
    pub fn is_success(&self) -> bool {
        self.failure.is_none()
    }

    pub fn count(&self, matches: impl Fn(&StepOutcome) -> bool) -> usize {
        self.records.iter().filter(|r| matches(&r.outcome)).count()
    }

    pub fn created(&self) -> usize {
        self.count(|o| matches!(o, StepOutcome::Created { .. }))
    }

    pub fn reused(&self) -> usize {
        self.count(|o| matches!(o, StepOutcome::Reused { .. }))
    }

    pub fn deleted(&self) -> usize {
        self.count(|o| matches!(o, StepOutcome::Deleted { .. }))
    }

    pub fn skipped(&self) -> usize {
        self.count(|o| matches!(o, StepOutcome::Skipped { .. }))
    }

    fn push(&mut self, step: impl Into<String>, outcome: StepOutcome) {
        self.records.push(StepRecord {
            step: step.into(),
            outcome,
        });
    }
}

fn fail(step: &str) -> impl Fn(ProviderError) -> StepFailure + '_ {
    move |error| StepFailure {
        step: step.to_string(),
        error,
    }
}

/// Bring the network up: VPC, subnets, route table, associations, internet
/// gateway, attachment, default route. Each step is guarded by a tag lookup.
pub async fn create_network(
    provider: &dyn NetworkProvider,
    config: &NetworkConfig,
    handles: &mut NetworkHandles,
) -> RunReport {
    let mut report = RunReport::default();
    if let Err(failure) = run_create(provider, config, handles, &mut report).await {
        report.failure = Some(failure);
    }
    report
}

async fn run_create(
    provider: &dyn NetworkProvider,
    config: &NetworkConfig,
    handles: &mut NetworkHandles,
    report: &mut RunReport,
) -> Result<(), StepFailure> {
    // VPC
    let vpc_tags = config.vpc_tags();
    let vpc_id = match provider.find_vpc(&vpc_tags).await.map_err(fail("vpc"))? {
        Some(id) => {
            report.push("vpc", StepOutcome::Reused { id: id.clone() });
            id
        }
        None => {
            let id = provider
                .create_vpc(&config.cidr_block, &vpc_tags)
                .await
                .map_err(fail("vpc"))?;
            provider.enable_dns(&id).await.map_err(fail("vpc"))?;
            report.push("vpc", StepOutcome::Created { id: id.clone() });
            id
        }
    };
    handles.vpc_id = Some(vpc_id.clone());

    // Subnets
    for spec in config.subnet_specs() {
        let label = format!("subnet {}", spec.name);
        let found = provider
            .find_subnet(&spec, &vpc_id, &config.environment)
            .await
            .map_err(fail(&label))?;
        let id = match found {
            Some(id) => {
                report.push(&label, StepOutcome::Reused { id: id.clone() });
                id
            }
            None => {
                let id = provider
                    .create_subnet(&spec, &vpc_id, &config.environment)
                    .await
                    .map_err(fail(&label))?;
                report.push(&label, StepOutcome::Created { id: id.clone() });
                id
            }
        };
        handles.subnet_ids.push(id);
    }

    // Route table
    let rtb_tags = config.route_table_tags();
    let route_table_id = match provider
        .find_route_table(&rtb_tags, Some(&vpc_id))
        .await
        .map_err(fail("route table"))?
    {
        Some(id) => {
            report.push("route table", StepOutcome::Reused { id: id.clone() });
            id
        }
        None => {
            let id = provider
                .create_route_table(&vpc_id, &rtb_tags)
                .await
                .map_err(fail("route table"))?;
            report.push("route table", StepOutcome::Created { id: id.clone() });
            id
        }
    };
    handles.route_table_id = Some(route_table_id.clone());

    // Subnet associations
    let associations = provider
        .route_table_associations(&route_table_id)
        .await
        .map_err(fail("associations"))?;
    let associated: HashSet<&str> = associations
        .iter()
        .filter_map(|a| a.subnet_id.as_deref())
        .collect();
    for subnet_id in &handles.subnet_ids {
        let label = format!("association {}", subnet_id);
        if associated.contains(subnet_id.as_str()) {
            report.push(&label, StepOutcome::skipped("already associated"));
        } else {
            let association_id = provider
                .associate_subnet(&route_table_id, subnet_id)
                .await
                .map_err(fail(&label))?;
            report.push(&label, StepOutcome::Created { id: association_id });
        }
    }

    // Internet gateway
    let gw_tags = config.gateway_tags();
    let gateway = provider
        .find_internet_gateway(&gw_tags)
        .await
        .map_err(fail("internet gateway"))?;
    let (gateway_id, attached_vpc) = match gateway {
        Some(info) => {
            report.push(
                "internet gateway",
                StepOutcome::Reused {
                    id: info.id.clone(),
                },
            );
            (info.id, info.attached_vpc)
        }
        None => {
            let id = provider
                .create_internet_gateway(&gw_tags)
                .await
                .map_err(fail("internet gateway"))?;
            report.push("internet gateway", StepOutcome::Created { id: id.clone() });
            (id, None)
        }
    };
    handles.gateway_id = Some(gateway_id.clone());

    // Gateway attachment
    if attached_vpc.as_deref() == Some(vpc_id.as_str()) {
        report.push("gateway attachment", StepOutcome::skipped("already attached"));
    } else {
        provider
            .attach_internet_gateway(&gateway_id, &vpc_id)
            .await
            .map_err(fail("gateway attachment"))?;
        report.push(
            "gateway attachment",
            StepOutcome::Created {
                id: gateway_id.clone(),
            },
        );
    }

    // Default route
    if provider
        .route_exists(&route_table_id, &config.destination_cidr)
        .await
        .map_err(fail("default route"))?
    {
        report.push("default route", StepOutcome::skipped("route already present"));
    } else {
        provider
            .create_route(&route_table_id, &config.destination_cidr, &gateway_id)
            .await
            .map_err(fail("default route"))?;
        report.push(
            "default route",
            StepOutcome::Created {
                id: route_table_id.clone(),
            },
        );
    }

    Ok(())
}

/// Tear the network down in reverse dependency order: route, gateway
/// detachment, gateway, associations, route table, subnets, VPC. A resource
/// that is already gone is a skip, never an error.
pub async fn delete_network(
    provider: &dyn NetworkProvider,
    config: &NetworkConfig,
    handles: &mut NetworkHandles,
) -> RunReport {
    let mut report = RunReport::default();
    if let Err(failure) = run_delete(provider, config, handles, &mut report).await {
        report.failure = Some(failure);
    }
    report
}

async fn run_delete(
    provider: &dyn NetworkProvider,
    config: &NetworkConfig,
    handles: &mut NetworkHandles,
    report: &mut RunReport,
) -> Result<(), StepFailure> {
    // Resolve the route table once; every route-table step below keys off it.
    let route_table_id = provider
        .find_route_table(&config.route_table_tags(), None)
        .await
        .map_err(fail("route table"))?;
    handles.route_table_id = route_table_id.clone();

    // Default route
    match &route_table_id {
        Some(rtb_id) => {
            if provider
                .route_exists(rtb_id, &config.destination_cidr)
                .await
                .map_err(fail("default route"))?
            {
                provider
                    .delete_route(rtb_id, &config.destination_cidr)
                    .await
                    .map_err(fail("default route"))?;
                report.push(
                    "default route",
                    StepOutcome::Deleted {
                        id: rtb_id.clone(),
                    },
                );
            } else {
                report.push(
                    "default route",
                    StepOutcome::skipped(format!("no route to {}", config.destination_cidr)),
                );
            }
        }
        None => report.push("default route", StepOutcome::skipped("route table not found")),
    }

    // Gateway detachment and deletion
    let gateway = provider
        .find_internet_gateway(&config.gateway_tags())
        .await
        .map_err(fail("internet gateway"))?;
    match gateway {
        Some(info) => {
            handles.gateway_id = Some(info.id.clone());
            match &info.attached_vpc {
                Some(vpc_id) => {
                    provider
                        .detach_internet_gateway(&info.id, vpc_id)
                        .await
                        .map_err(fail("gateway attachment"))?;
                    report.push(
                        "gateway attachment",
                        StepOutcome::Deleted {
                            id: info.id.clone(),
                        },
                    );
                }
                None => report.push("gateway attachment", StepOutcome::skipped("not attached")),
            }
            provider
                .delete_internet_gateway(&info.id)
                .await
                .map_err(fail("internet gateway"))?;
            report.push("internet gateway", StepOutcome::Deleted { id: info.id });
        }
        None => {
            report.push("gateway attachment", StepOutcome::skipped("internet gateway not found"));
            report.push("internet gateway", StepOutcome::skipped("not found"));
        }
    }

    // Associations and route table
    match &route_table_id {
        Some(rtb_id) => {
            let associations = provider
                .route_table_associations(rtb_id)
                .await
                .map_err(fail("associations"))?;
            for association in associations {
                if association.main {
                    continue;
                }
                let label = match &association.subnet_id {
                    Some(subnet_id) => format!("association {}", subnet_id),
                    None => format!("association {}", association.id),
                };
                provider
                    .disassociate(&association.id)
                    .await
                    .map_err(fail(&label))?;
                report.push(&label, StepOutcome::Deleted { id: association.id });
            }
            provider
                .delete_route_table(rtb_id)
                .await
                .map_err(fail("route table"))?;
            report.push(
                "route table",
                StepOutcome::Deleted {
                    id: rtb_id.clone(),
                },
            );
        }
        None => report.push("route table", StepOutcome::skipped("not found")),
    }

    // Subnets, resolved by Name-tag prefix
    let subnets = provider
        .subnets_by_prefix(&config.subnet_name_prefix)
        .await
        .map_err(fail("subnets"))?;
    if subnets.is_empty() {
        report.push("subnets", StepOutcome::skipped("none found"));
    }
    for subnet in subnets {
        let label = format!("subnet {}", subnet.name);
        provider
            .delete_subnet(&subnet.id)
            .await
            .map_err(fail(&label))?;
        handles.subnet_ids.push(subnet.id.clone());
        report.push(&label, StepOutcome::Deleted { id: subnet.id });
    }

    // VPC
    match provider
        .find_vpc(&config.vpc_tags())
        .await
        .map_err(fail("vpc"))?
    {
        Some(vpc_id) => {
            handles.vpc_id = Some(vpc_id.clone());
            provider.delete_vpc(&vpc_id).await.map_err(fail("vpc"))?;
            report.push("vpc", StepOutcome::Deleted { id: vpc_id });
        }
        None => report.push("vpc", StepOutcome::skipped("not found")),
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::provider::ProviderResult;
    use crate::resource::{
        GatewayInfo, ResourceTags, RouteTableAssociation, SubnetInfo, SubnetSpec,
    };
    use async_trait::async_trait;
    use std::sync::Mutex;

    fn sample_config() -> NetworkConfig {
        NetworkConfig {
            region: "eu-west-1".to_string(),
            cidr_block: "10.0.0.0/16".to_string(),
            public_subnet_cidrs: vec!["10.0.1.0/24".to_string(), "10.0.2.0/24".to_string()],
            availability_zones: vec!["eu-west-1a".to_string(), "eu-west-1b".to_string()],
            subnet_names: vec!["acme-dev-sub-1".to_string(), "acme-dev-sub-2".to_string()],
            subnet_name_prefix: "acme-dev-sub".to_string(),
            vpc_name: "acme-dev".to_string(),
            route_table_name: "acme-dev-rtb".to_string(),
            gateway_name: "acme-dev-igw".to_string(),
            environment: "Dev".to_string(),
            destination_cidr: "0.0.0.0/0".to_string(),
        }
    }

    #[derive(Default)]
    struct Cloud {
        counter: usize,
        vpcs: Vec<(String, ResourceTags)>,
        subnets: Vec<(String, SubnetSpec, String)>,
        route_tables: Vec<(String, ResourceTags, String)>,
        associations: Vec<(String, String, String)>,
        gateways: Vec<(String, ResourceTags, Option<String>)>,
        routes: Vec<(String, String, String)>,
    }

    impl Cloud {
        fn next_id(&mut self, prefix: &str) -> String {
            self.counter += 1;
            format!("{}-{:04}", prefix, self.counter)
        }
    }

    /// In-memory provider recording every mutating call it receives.
    #[derive(Default)]
    struct MemoryProvider {
        cloud: Mutex<Cloud>,
        mutations: Mutex<Vec<String>>,
    }

    impl MemoryProvider {
        fn mutation_count(&self) -> usize {
            self.mutations.lock().unwrap().len()
        }

        fn record(&self, call: &str) {
            self.mutations.lock().unwrap().push(call.to_string());
        }
    }

    #[async_trait]
    impl NetworkProvider for MemoryProvider {
        async fn find_vpc(&self, tags: &ResourceTags) -> ProviderResult<Option<String>> {
            let cloud = self.cloud.lock().unwrap();
            Ok(cloud
                .vpcs
                .iter()
                .find(|(_, t)| t == tags)
                .map(|(id, _)| id.clone()))
        }

        async fn create_vpc(
            &self,
            _cidr_block: &str,
            tags: &ResourceTags,
        ) -> ProviderResult<String> {
            self.record("create_vpc");
            let mut cloud = self.cloud.lock().unwrap();
            let id = cloud.next_id("vpc");
            cloud.vpcs.push((id.clone(), tags.clone()));
            Ok(id)
        }

        async fn enable_dns(&self, _vpc_id: &str) -> ProviderResult<()> {
            self.record("enable_dns");
            Ok(())
        }

        async fn delete_vpc(&self, vpc_id: &str) -> ProviderResult<()> {
            self.record("delete_vpc");
            let mut cloud = self.cloud.lock().unwrap();
            cloud.vpcs.retain(|(id, _)| id != vpc_id);
            Ok(())
        }

        async fn find_subnet(
            &self,
            spec: &SubnetSpec,
            vpc_id: &str,
            _environment: &str,
        ) -> ProviderResult<Option<String>> {
            let cloud = self.cloud.lock().unwrap();
            Ok(cloud
                .subnets
                .iter()
                .find(|(_, s, v)| s == spec && v == vpc_id)
                .map(|(id, _, _)| id.clone()))
        }

        async fn create_subnet(
            &self,
            spec: &SubnetSpec,
            vpc_id: &str,
            _environment: &str,
        ) -> ProviderResult<String> {
            self.record("create_subnet");
            let mut cloud = self.cloud.lock().unwrap();
            let id = cloud.next_id("subnet");
            cloud
                .subnets
                .push((id.clone(), spec.clone(), vpc_id.to_string()));
            Ok(id)
        }

        async fn subnets_by_prefix(&self, prefix: &str) -> ProviderResult<Vec<SubnetInfo>> {
            let cloud = self.cloud.lock().unwrap();
            Ok(cloud
                .subnets
                .iter()
                .filter(|(_, spec, _)| spec.name.starts_with(prefix))
                .map(|(id, spec, vpc_id)| SubnetInfo {
                    id: id.clone(),
                    name: spec.name.clone(),
                    cidr_block: spec.cidr_block.clone(),
                    availability_zone: spec.availability_zone.clone(),
                    vpc_id: vpc_id.clone(),
                })
                .collect())
        }

        async fn delete_subnet(&self, subnet_id: &str) -> ProviderResult<()> {
            self.record("delete_subnet");
            let mut cloud = self.cloud.lock().unwrap();
            cloud.subnets.retain(|(id, _, _)| id != subnet_id);
            Ok(())
        }

        async fn find_route_table(
            &self,
            tags: &ResourceTags,
            vpc_id: Option<&str>,
        ) -> ProviderResult<Option<String>> {
            let cloud = self.cloud.lock().unwrap();
            Ok(cloud
                .route_tables
                .iter()
                .find(|(_, t, v)| t == tags && vpc_id.is_none_or(|vpc| v == vpc))
                .map(|(id, _, _)| id.clone()))
        }

        async fn create_route_table(
            &self,
            vpc_id: &str,
            tags: &ResourceTags,
        ) -> ProviderResult<String> {
            self.record("create_route_table");
            let mut cloud = self.cloud.lock().unwrap();
            let id = cloud.next_id("rtb");
            cloud
                .route_tables
                .push((id.clone(), tags.clone(), vpc_id.to_string()));
            Ok(id)
        }

        async fn route_table_associations(
            &self,
            route_table_id: &str,
        ) -> ProviderResult<Vec<RouteTableAssociation>> {
            let cloud = self.cloud.lock().unwrap();
            Ok(cloud
                .associations
                .iter()
                .filter(|(_, rtb, _)| rtb == route_table_id)
                .map(|(id, _, subnet)| RouteTableAssociation {
                    id: id.clone(),
                    subnet_id: Some(subnet.clone()),
                    main: false,
                })
                .collect())
        }

        async fn associate_subnet(
            &self,
            route_table_id: &str,
            subnet_id: &str,
        ) -> ProviderResult<String> {
            self.record("associate_subnet");
            let mut cloud = self.cloud.lock().unwrap();
            let id = cloud.next_id("rtbassoc");
            cloud.associations.push((
                id.clone(),
                route_table_id.to_string(),
                subnet_id.to_string(),
            ));
            Ok(id)
        }

        async fn disassociate(&self, association_id: &str) -> ProviderResult<()> {
            self.record("disassociate");
            let mut cloud = self.cloud.lock().unwrap();
            cloud.associations.retain(|(id, _, _)| id != association_id);
            Ok(())
        }

        async fn delete_route_table(&self, route_table_id: &str) -> ProviderResult<()> {
            self.record("delete_route_table");
            let mut cloud = self.cloud.lock().unwrap();
            cloud.route_tables.retain(|(id, _, _)| id != route_table_id);
            Ok(())
        }

        async fn find_internet_gateway(
            &self,
            tags: &ResourceTags,
        ) -> ProviderResult<Option<GatewayInfo>> {
            let cloud = self.cloud.lock().unwrap();
            Ok(cloud
                .gateways
                .iter()
                .find(|(_, t, _)| t == tags)
                .map(|(id, _, attached)| GatewayInfo {
                    id: id.clone(),
                    attached_vpc: attached.clone(),
                }))
        }

        async fn create_internet_gateway(&self, tags: &ResourceTags) -> ProviderResult<String> {
            self.record("create_internet_gateway");
            let mut cloud = self.cloud.lock().unwrap();
            let id = cloud.next_id("igw");
            cloud.gateways.push((id.clone(), tags.clone(), None));
            Ok(id)
        }

        async fn attach_internet_gateway(
            &self,
            gateway_id: &str,
            vpc_id: &str,
        ) -> ProviderResult<()> {
            self.record("attach_internet_gateway");
            let mut cloud = self.cloud.lock().unwrap();
            if let Some(gateway) = cloud.gateways.iter_mut().find(|(id, _, _)| id == gateway_id)
            {
                gateway.2 = Some(vpc_id.to_string());
            }
            Ok(())
        }

        async fn detach_internet_gateway(
            &self,
            gateway_id: &str,
            _vpc_id: &str,
        ) -> ProviderResult<()> {
            self.record("detach_internet_gateway");
            let mut cloud = self.cloud.lock().unwrap();
            if let Some(gateway) = cloud.gateways.iter_mut().find(|(id, _, _)| id == gateway_id)
            {
                gateway.2 = None;
            }
            Ok(())
        }

        async fn delete_internet_gateway(&self, gateway_id: &str) -> ProviderResult<()> {
            self.record("delete_internet_gateway");
            let mut cloud = self.cloud.lock().unwrap();
            cloud.gateways.retain(|(id, _, _)| id != gateway_id);
            Ok(())
        }

        async fn route_exists(
            &self,
            route_table_id: &str,
            destination_cidr: &str,
        ) -> ProviderResult<bool> {
            let cloud = self.cloud.lock().unwrap();
            Ok(cloud
                .routes
                .iter()
                .any(|(rtb, dest, _)| rtb == route_table_id && dest == destination_cidr))
        }

        async fn create_route(
            &self,
            route_table_id: &str,
            destination_cidr: &str,
            gateway_id: &str,
        ) -> ProviderResult<()> {
            self.record("create_route");
            let mut cloud = self.cloud.lock().unwrap();
            cloud.routes.push((
                route_table_id.to_string(),
                destination_cidr.to_string(),
                gateway_id.to_string(),
            ));
            Ok(())
        }

        async fn delete_route(
            &self,
            route_table_id: &str,
            destination_cidr: &str,
        ) -> ProviderResult<()> {
            self.record("delete_route");
            let mut cloud = self.cloud.lock().unwrap();
            cloud
                .routes
                .retain(|(rtb, dest, _)| !(rtb == route_table_id && dest == destination_cidr));
            Ok(())
        }
    }

    /// Provider wrapper that fails a named operation.
    struct FailingProvider {
        inner: MemoryProvider,
        fail_on: &'static str,
    }

    #[async_trait]
    impl NetworkProvider for FailingProvider {
        async fn find_vpc(&self, tags: &ResourceTags) -> ProviderResult<Option<String>> {
            self.inner.find_vpc(tags).await
        }
        async fn create_vpc(
            &self,
            cidr_block: &str,
            tags: &ResourceTags,
        ) -> ProviderResult<String> {
            self.inner.create_vpc(cidr_block, tags).await
        }
        async fn enable_dns(&self, vpc_id: &str) -> ProviderResult<()> {
            self.inner.enable_dns(vpc_id).await
        }
        async fn delete_vpc(&self, vpc_id: &str) -> ProviderResult<()> {
            self.inner.delete_vpc(vpc_id).await
        }
        async fn find_subnet(
            &self,
            spec: &SubnetSpec,
            vpc_id: &str,
            environment: &str,
        ) -> ProviderResult<Option<String>> {
            self.inner.find_subnet(spec, vpc_id, environment).await
        }
        async fn create_subnet(
            &self,
            spec: &SubnetSpec,
            vpc_id: &str,
            environment: &str,
        ) -> ProviderResult<String> {
            if self.fail_on == "create_subnet" {
                return Err(ProviderError::new("CreateSubnet failed"));
            }
            self.inner.create_subnet(spec, vpc_id, environment).await
        }
        async fn subnets_by_prefix(&self, prefix: &str) -> ProviderResult<Vec<SubnetInfo>> {
            self.inner.subnets_by_prefix(prefix).await
        }
        async fn delete_subnet(&self, subnet_id: &str) -> ProviderResult<()> {
            self.inner.delete_subnet(subnet_id).await
        }
        async fn find_route_table(
            &self,
            tags: &ResourceTags,
            vpc_id: Option<&str>,
        ) -> ProviderResult<Option<String>> {
            self.inner.find_route_table(tags, vpc_id).await
        }
        async fn create_route_table(
            &self,
            vpc_id: &str,
            tags: &ResourceTags,
        ) -> ProviderResult<String> {
            self.inner.create_route_table(vpc_id, tags).await
        }
        async fn route_table_associations(
            &self,
            route_table_id: &str,
        ) -> ProviderResult<Vec<RouteTableAssociation>> {
            self.inner.route_table_associations(route_table_id).await
        }
        async fn associate_subnet(
            &self,
            route_table_id: &str,
            subnet_id: &str,
        ) -> ProviderResult<String> {
            self.inner.associate_subnet(route_table_id, subnet_id).await
        }
        async fn disassociate(&self, association_id: &str) -> ProviderResult<()> {
            self.inner.disassociate(association_id).await
        }
        async fn delete_route_table(&self, route_table_id: &str) -> ProviderResult<()> {
            self.inner.delete_route_table(route_table_id).await
        }
        async fn find_internet_gateway(
            &self,
            tags: &ResourceTags,
        ) -> ProviderResult<Option<GatewayInfo>> {
            self.inner.find_internet_gateway(tags).await
        }
        async fn create_internet_gateway(&self, tags: &ResourceTags) -> ProviderResult<String> {
            self.inner.create_internet_gateway(tags).await
        }
        async fn attach_internet_gateway(
            &self,
            gateway_id: &str,
            vpc_id: &str,
        ) -> ProviderResult<()> {
            self.inner.attach_internet_gateway(gateway_id, vpc_id).await
        }
        async fn detach_internet_gateway(
            &self,
            gateway_id: &str,
            vpc_id: &str,
        ) -> ProviderResult<()> {
            self.inner.detach_internet_gateway(gateway_id, vpc_id).await
        }
        async fn delete_internet_gateway(&self, gateway_id: &str) -> ProviderResult<()> {
            self.inner.delete_internet_gateway(gateway_id).await
        }
        async fn route_exists(
            &self,
            route_table_id: &str,
            destination_cidr: &str,
        ) -> ProviderResult<bool> {
            self.inner.route_exists(route_table_id, destination_cidr).await
        }
        async fn create_route(
            &self,
            route_table_id: &str,
            destination_cidr: &str,
            gateway_id: &str,
        ) -> ProviderResult<()> {
            self.inner
                .create_route(route_table_id, destination_cidr, gateway_id)
                .await
        }
        async fn delete_route(
            &self,
            route_table_id: &str,
            destination_cidr: &str,
        ) -> ProviderResult<()> {
            self.inner.delete_route(route_table_id, destination_cidr).await
        }
    }

    #[tokio::test]
    async fn create_builds_everything_in_order() {
        let provider = MemoryProvider::default();
        let config = sample_config();
        let mut handles = NetworkHandles::new();

        let report = create_network(&provider, &config, &mut handles).await;

        assert!(report.is_success());
        // vpc + 2 subnets + route table + 2 associations + gateway +
        // attachment + default route
        assert_eq!(report.created(), 9);
        assert_eq!(report.reused(), 0);
        assert!(handles.vpc_id.is_some());
        assert_eq!(handles.subnet_ids.len(), 2);
        assert!(handles.route_table_id.is_some());
        assert!(handles.gateway_id.is_some());
    }

    #[tokio::test]
    async fn create_twice_reuses_everything() {
        let provider = MemoryProvider::default();
        let config = sample_config();

        let mut first = NetworkHandles::new();
        let report = create_network(&provider, &config, &mut first).await;
        assert!(report.is_success());
        let mutations_after_first = provider.mutation_count();

        let mut second = NetworkHandles::new();
        let report = create_network(&provider, &config, &mut second).await;

        assert!(report.is_success());
        assert_eq!(report.created(), 0);
        assert_eq!(report.reused(), 5); // vpc, 2 subnets, route table, gateway
        assert_eq!(report.skipped(), 4); // 2 associations, attachment, route
        assert_eq!(report.reused() + report.skipped(), report.records.len());
        // No further mutating calls went out.
        assert_eq!(provider.mutation_count(), mutations_after_first);
        // Both runs resolved the same identifiers.
        assert_eq!(first, second);
    }

    #[tokio::test]
    async fn delete_on_empty_cloud_is_all_noops() {
        let provider = MemoryProvider::default();
        let config = sample_config();
        let mut handles = NetworkHandles::new();

        let report = delete_network(&provider, &config, &mut handles).await;

        assert!(report.is_success());
        assert_eq!(report.deleted(), 0);
        assert_eq!(report.skipped(), report.records.len());
        assert_eq!(provider.mutation_count(), 0);
    }

    #[tokio::test]
    async fn delete_tears_down_created_network() {
        let provider = MemoryProvider::default();
        let config = sample_config();

        let mut handles = NetworkHandles::new();
        create_network(&provider, &config, &mut handles).await;

        let mut handles = NetworkHandles::new();
        let report = delete_network(&provider, &config, &mut handles).await;

        assert!(report.is_success());
        // route + attachment + gateway + 2 associations + route table +
        // 2 subnets + vpc
        assert_eq!(report.deleted(), 9);

        let cloud = provider.cloud.lock().unwrap();
        assert!(cloud.vpcs.is_empty());
        assert!(cloud.subnets.is_empty());
        assert!(cloud.route_tables.is_empty());
        assert!(cloud.gateways.is_empty());
        assert!(cloud.routes.is_empty());
        assert!(cloud.associations.is_empty());
    }

    #[tokio::test]
    async fn create_stops_at_first_failure() {
        let provider = FailingProvider {
            inner: MemoryProvider::default(),
            fail_on: "create_subnet",
        };
        let config = sample_config();
        let mut handles = NetworkHandles::new();

        let report = create_network(&provider, &config, &mut handles).await;

        assert!(!report.is_success());
        let failure = report.failure.unwrap();
        assert!(failure.step.starts_with("subnet "));
        // The VPC step ran; nothing after the failed subnet did.
        assert_eq!(report.records.len(), 1);
        assert!(handles.vpc_id.is_some());
        assert!(handles.route_table_id.is_none());
    }

    #[tokio::test]
    async fn reattaches_gateway_left_detached() {
        let provider = MemoryProvider::default();
        let config = sample_config();

        let mut handles = NetworkHandles::new();
        create_network(&provider, &config, &mut handles).await;

        // Simulate an out-of-band detach.
        {
            let mut cloud = provider.cloud.lock().unwrap();
            for gateway in &mut cloud.gateways {
                gateway.2 = None;
            }
        }

        let mut handles = NetworkHandles::new();
        let report = create_network(&provider, &config, &mut handles).await;

        assert!(report.is_success());
        assert_eq!(report.created(), 1); // only the attachment
        let cloud = provider.cloud.lock().unwrap();
        assert!(cloud.gateways[0].2.is_some());
    }
}
