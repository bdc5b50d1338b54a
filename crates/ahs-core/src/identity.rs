//! Instance identity: instance id, availability zone and region.
use std::sync::LazyLock;

use ahs_model::{BackoffStrategy, InstanceIdentity};
use async_trait::async_trait;
use regex::Regex;
use tracing::{debug, info};

use crate::{
    backoff::retry,
    error::{CoreError, CoreResult},
};

static AVAILABILITY_ZONE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"^[a-z]{2}(?:-[a-z]+)+-[0-9]+[a-z]$").expect("availability zone pattern is valid")
});

static REGION: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"^[a-z]{2}(?:-[a-z]+)+-[0-9]+$").expect("region pattern is valid")
});

/// Source of instance identity facts, usually the instance metadata service.
#[async_trait]
pub trait MetadataSource: Send + Sync {
    /// Checks that the service answers at all.
    ///
    /// Fails with [`CoreError::MetadataUnavailable`], which is never retried.
    async fn check_available(&self) -> CoreResult<()>;

    async fn availability_zone(&self) -> CoreResult<String>;

    async fn instance_id(&self) -> CoreResult<String>;
}

/// Resolves the [`InstanceIdentity`] of the running instance.
pub struct IdentityResolver<'a> {
    source: &'a dyn MetadataSource,
    backoff: &'a BackoffStrategy,
}

impl<'a> IdentityResolver<'a> {
    pub fn new(source: &'a dyn MetadataSource, backoff: &'a BackoffStrategy) -> Self {
        Self { source, backoff }
    }

    pub async fn resolve_availability_zone(&self) -> CoreResult<String> {
        debug!("fetching current availability zone from the metadata service");
        let source = self.source;
        let az = retry(self.backoff, "fetch availability zone", move || {
            source.availability_zone()
        })
        .await?;
        info!(availability_zone = %az, "found availability zone");
        Ok(az)
    }

    pub async fn resolve_instance_id(&self) -> CoreResult<String> {
        debug!("fetching current instance id from the metadata service");
        let source = self.source;
        let id = retry(self.backoff, "fetch instance id", move || source.instance_id()).await?;
        info!(instance_id = %id, "found instance id");
        Ok(id)
    }

    /// Checks the service is reachable, then resolves zone, region and instance id.
    pub async fn resolve(&self) -> CoreResult<InstanceIdentity> {
        self.source.check_available().await?;

        let availability_zone = self.resolve_availability_zone().await?;
        let region = compute_region(&availability_zone)?;
        validate_region(&region)?;
        let instance_id = self.resolve_instance_id().await?;

        Ok(InstanceIdentity {
            instance_id,
            availability_zone,
            region,
        })
    }
}

/// Strips the zone letter from an availability zone (`eu-west-1a` → `eu-west-1`).
pub fn compute_region(availability_zone: &str) -> CoreResult<String> {
    if !AVAILABILITY_ZONE.is_match(availability_zone) {
        return Err(CoreError::InvalidAvailabilityZone(
            availability_zone.to_string(),
        ));
    }

    let mut region = availability_zone.to_string();
    region.pop();
    info!(region = %region, "computed region");
    Ok(region)
}

/// Checks the shape of a region name before any client is built for it.
pub fn validate_region(region: &str) -> CoreResult<()> {
    if REGION.is_match(region) {
        Ok(())
    } else {
        Err(CoreError::InvalidRegion(region.to_string()))
    }
}
