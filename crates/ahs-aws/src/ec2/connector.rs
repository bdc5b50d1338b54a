use ahs_core::{
    error::{CoreError, CoreResult},
    run::TagStoreConnector,
    tags::TagStore,
};
use ahs_model::InstanceIdentity;
use async_trait::async_trait;
use tracing::{debug, info};

use super::Ec2TagStore;
use crate::{credentials::Credentials, error::AwsError, imds::ImdsClient};

/// Opens an [`Ec2TagStore`] in the region of the running instance.
///
/// Credentials come from the environment when set, from the instance profile otherwise.
pub struct Ec2Connector<'a> {
    imds: &'a ImdsClient,
    endpoint: Option<String>,
}

impl<'a> Ec2Connector<'a> {
    pub fn new(imds: &'a ImdsClient) -> Self {
        Self {
            imds,
            endpoint: None,
        }
    }

    /// Sends EC2 calls to `endpoint` instead of the public regional endpoint.
    pub fn with_endpoint(mut self, endpoint: impl Into<String>) -> Self {
        self.endpoint = Some(endpoint.into());
        self
    }

    async fn credentials(&self) -> CoreResult<Credentials> {
        if let Some(creds) = Credentials::from_env() {
            debug!("using credentials from the environment");
            return Ok(creds);
        }

        debug!("using instance profile credentials");
        self.imds.instance_credentials().await.map_err(|e| match e {
            AwsError::Credentials(_) | AwsError::Decode(_) => {
                CoreError::TagStoreRejected(e.to_string())
            }
            other => other.into_metadata_error(),
        })
    }
}

#[async_trait]
impl TagStoreConnector for Ec2Connector<'_> {
    async fn connect(&self, identity: &InstanceIdentity) -> CoreResult<Box<dyn TagStore>> {
        let credentials = self.credentials().await?;

        let store = match &self.endpoint {
            Some(endpoint) => Ec2TagStore::with_endpoint(endpoint, &identity.region, credentials),
            None => Ec2TagStore::new(&identity.region, credentials),
        }
        .map_err(AwsError::into_tag_store_error)?;

        info!(region = %identity.region, "connected to EC2");
        Ok(Box::new(store))
    }
}
