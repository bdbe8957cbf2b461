//! Data sources - read-only lookups the topology is built from

use aws_config::Region;
use aws_sdk_ec2::Client as Ec2Client;
use aws_sdk_ec2::types::Filter;
use nimbus_core::provider::{ProviderError, ProviderResult};

/// Fetch the available availability zones of a region, sorted by name
pub async fn availability_zones(region: &str) -> ProviderResult<Vec<String>> {
    let config = aws_config::defaults(aws_config::BehaviorVersion::latest())
        .region(Region::new(region.to_string()))
        .load()
        .await;
    let client = Ec2Client::new(&config);

    let response = client
        .describe_availability_zones()
        .filters(Filter::builder().name("state").values("available").build())
        .send()
        .await
        .map_err(|e| {
            ProviderError::new(format!("Failed to describe availability zones: {:?}", e))
        })?;

    let mut zones: Vec<String> = response
        .availability_zones()
        .iter()
        .filter_map(|zone| zone.zone_name().map(str::to_string))
        .collect();
    zones.sort();

    if zones.is_empty() {
        return Err(ProviderError::new(format!(
            "No available zones reported for region {}",
            region
        )));
    }

    Ok(zones)
}
