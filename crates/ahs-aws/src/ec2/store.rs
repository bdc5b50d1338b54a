use std::{collections::BTreeMap, time::Duration};

use ahs_core::{error::CoreResult, tags::TagStore};
use ahs_model::{InstanceId, Tags};
use async_trait::async_trait;
use reqwest::header::{AUTHORIZATION, CONTENT_TYPE};
use time::OffsetDateTime;
use tracing::{debug, trace};
use url::Url;

use super::response::{
    DescribeInstancesResponse, DescribeTagsResponse, api_error, decode, next_page,
};
use crate::{
    credentials::Credentials,
    error::{AwsError, AwsResult},
    sigv4::{self, FORM_CONTENT_TYPE, SigningRequest},
};

const API_VERSION: &str = "2016-11-15";
const SERVICE: &str = "ec2";
const REQUEST_TIMEOUT: Duration = Duration::from_secs(10);

type Params = Vec<(&'static str, String)>;

/// Tags of EC2 instances, read and written through the EC2 Query API.
pub struct Ec2TagStore {
    http: reqwest::Client,
    endpoint: Url,
    host: String,
    region: String,
    credentials: Credentials,
}

impl Ec2TagStore {
    /// Client for the public regional endpoint `https://ec2.<region>.amazonaws.com`.
    pub fn new(region: &str, credentials: Credentials) -> AwsResult<Self> {
        Self::with_endpoint(&format!("https://ec2.{region}.amazonaws.com"), region, credentials)
    }

    /// Client for a custom endpoint (VPC endpoint, local fake), signing for `region`.
    ///
    /// Fails with [`AwsError::Endpoint`] when `endpoint` is not an absolute URL with a host.
    pub fn with_endpoint(endpoint: &str, region: &str, credentials: Credentials) -> AwsResult<Self> {
        let endpoint = Url::parse(endpoint).map_err(|e| AwsError::Endpoint(format!("{endpoint}: {e}")))?;
        let host = match (endpoint.host_str(), endpoint.port()) {
            (Some(h), Some(p)) => format!("{h}:{p}"),
            (Some(h), None) => h.to_string(),
            (None, _) => return Err(AwsError::Endpoint(endpoint.to_string())),
        };
        let http = reqwest::Client::builder().timeout(REQUEST_TIMEOUT).build()?;

        Ok(Self {
            http,
            endpoint,
            host,
            region: region.to_string(),
            credentials,
        })
    }

    /// Region used in the request signature.
    pub fn region(&self) -> &str {
        &self.region
    }

    /// Sends one signed Query API call and returns the raw XML body.
    async fn call(&self, action: &str, params: &[(&'static str, String)]) -> AwsResult<String> {
        let body = url::form_urlencoded::Serializer::new(String::new())
            .append_pair("Action", action)
            .append_pair("Version", API_VERSION)
            .extend_pairs(params.iter().map(|(k, v)| (*k, v.as_str())))
            .finish();

        let signed = sigv4::sign(
            &self.credentials,
            &SigningRequest {
                service: SERVICE,
                region: &self.region,
                host: &self.host,
                body: &body,
            },
            OffsetDateTime::now_utc(),
        )?;

        let mut req = self
            .http
            .post(self.endpoint.clone())
            .header(CONTENT_TYPE, FORM_CONTENT_TYPE)
            .header("x-amz-date", signed.amz_date)
            .header(AUTHORIZATION, signed.authorization);
        if let Some(token) = signed.security_token {
            req = req.header("x-amz-security-token", token);
        }

        let resp = req.body(body).send().await?;
        let status = resp.status();
        let text = resp.text().await?;
        trace!(action, status = %status, "ec2 response");

        if status.is_success() {
            Ok(text)
        } else {
            Err(api_error(status.as_u16(), &text))
        }
    }

    async fn describe_tags(&self, resource: &str, key: &str) -> AwsResult<Vec<String>> {
        let mut values = Vec::new();
        let mut token = None;

        loop {
            let mut params: Params = vec![
                ("Filter.1.Name", "resource-id".into()),
                ("Filter.1.Value.1", resource.into()),
                ("Filter.2.Name", "key".into()),
                ("Filter.2.Value.1", key.into()),
            ];
            if let Some(t) = token.take() {
                params.push(("NextToken", t));
            }

            let page: DescribeTagsResponse = decode(&self.call("DescribeTags", &params).await?)?;
            values.extend(
                page.tag_set
                    .items
                    .into_iter()
                    .filter(|t| t.resource_id == resource && t.key == key)
                    .map(|t| t.value),
            );

            token = next_page(page.next_token);
            if token.is_none() {
                return Ok(values);
            }
        }
    }

    async fn describe_instances(
        &self,
        key: &str,
        value: &str,
    ) -> AwsResult<BTreeMap<InstanceId, Tags>> {
        let mut found = BTreeMap::new();
        let mut token = None;

        loop {
            let mut params: Params = vec![
                ("Filter.1.Name", format!("tag:{key}")),
                ("Filter.1.Value.1", value.into()),
            ];
            if let Some(t) = token.take() {
                params.push(("NextToken", t));
            }

            let page: DescribeInstancesResponse =
                decode(&self.call("DescribeInstances", &params).await?)?;
            for instance in page
                .reservation_set
                .items
                .into_iter()
                .flat_map(|r| r.instances_set.items)
            {
                let tags: Tags = instance
                    .tag_set
                    .items
                    .into_iter()
                    .map(|t| (t.key, t.value))
                    .collect();
                found.insert(instance.instance_id, tags);
            }

            token = next_page(page.next_token);
            if token.is_none() {
                return Ok(found);
            }
        }
    }

    async fn create_tag(&self, resource: &str, key: &str, value: &str) -> AwsResult<()> {
        let params: Params = vec![
            ("ResourceId.1", resource.into()),
            ("Tag.1.Key", key.into()),
            ("Tag.1.Value", value.into()),
        ];
        self.call("CreateTags", &params).await.map(|_| ())
    }
}

#[async_trait]
impl TagStore for Ec2TagStore {
    async fn tag_values(&self, resource: &str, key: &str) -> CoreResult<Vec<String>> {
        debug!(resource, key, "describing tags");
        self.describe_tags(resource, key)
            .await
            .map_err(AwsError::into_tag_store_error)
    }

    async fn write_tag(&self, resource: &str, key: &str, value: &str) -> CoreResult<()> {
        debug!(resource, key, value, "creating tag");
        self.create_tag(resource, key, value)
            .await
            .map_err(AwsError::into_tag_store_error)
    }

    async fn list_resources_by_tag(
        &self,
        key: &str,
        value: &str,
    ) -> CoreResult<BTreeMap<InstanceId, Tags>> {
        debug!(key, value, "describing instances by tag");
        self.describe_instances(key, value)
            .await
            .map_err(AwsError::into_tag_store_error)
    }
}
