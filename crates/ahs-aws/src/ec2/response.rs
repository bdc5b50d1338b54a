//! XML bodies returned by the EC2 Query API, reduced to the fields the tag store reads.
use serde::Deserialize;

use crate::error::{AwsError, AwsResult};

#[derive(Debug, Default, Deserialize)]
pub(crate) struct DescribeTagsResponse {
    #[serde(rename = "tagSet", default)]
    pub tag_set: ItemSet<TagDescription>,
    #[serde(rename = "nextToken", default)]
    pub next_token: Option<String>,
}

#[derive(Debug, Deserialize)]
pub(crate) struct TagDescription {
    #[serde(rename = "resourceId")]
    pub resource_id: String,
    pub key: String,
    #[serde(default)]
    pub value: String,
}

#[derive(Debug, Default, Deserialize)]
pub(crate) struct DescribeInstancesResponse {
    #[serde(rename = "reservationSet", default)]
    pub reservation_set: ItemSet<Reservation>,
    #[serde(rename = "nextToken", default)]
    pub next_token: Option<String>,
}

#[derive(Debug, Deserialize)]
pub(crate) struct Reservation {
    #[serde(rename = "instancesSet", default)]
    pub instances_set: ItemSet<Instance>,
}

#[derive(Debug, Deserialize)]
pub(crate) struct Instance {
    #[serde(rename = "instanceId")]
    pub instance_id: String,
    #[serde(rename = "tagSet", default)]
    pub tag_set: ItemSet<Tag>,
}

#[derive(Debug, Deserialize)]
pub(crate) struct Tag {
    pub key: String,
    #[serde(default)]
    pub value: String,
}

/// `<xxxSet><item>..</item>..</xxxSet>` wrapper used by every EC2 list.
#[derive(Debug, Deserialize)]
pub(crate) struct ItemSet<T> {
    #[serde(rename = "item", default = "Vec::new")]
    pub items: Vec<T>,
}

impl<T> Default for ItemSet<T> {
    fn default() -> Self {
        Self { items: Vec::new() }
    }
}

#[derive(Debug, Deserialize)]
struct ErrorResponse {
    #[serde(rename = "Errors")]
    errors: ErrorList,
}

#[derive(Debug, Deserialize)]
struct ErrorList {
    #[serde(rename = "Error", default)]
    errors: Vec<ErrorDetail>,
}

#[derive(Debug, Deserialize)]
struct ErrorDetail {
    #[serde(rename = "Code")]
    code: String,
    #[serde(rename = "Message", default)]
    message: String,
}

pub(crate) fn decode<T: for<'de> Deserialize<'de>>(body: &str) -> AwsResult<T> {
    quick_xml::de::from_str(body).map_err(|e| AwsError::Decode(e.to_string()))
}

/// Turns a non-2xx response into [`AwsError::Api`], or [`AwsError::Status`] when the
/// body is not an EC2 error document.
pub(crate) fn api_error(status: u16, body: &str) -> AwsError {
    let first = decode::<ErrorResponse>(body)
        .ok()
        .and_then(|r| r.errors.errors.into_iter().next());

    match first {
        Some(ErrorDetail { code, message }) => AwsError::api(status, &code, &message),
        None => AwsError::status(status, body),
    }
}

/// Empty tokens mark the last page.
pub(crate) fn next_page(token: Option<String>) -> Option<String> {
    token.filter(|t| !t.trim().is_empty())
}

#[cfg(test)]
pub(crate) mod fixtures {
    pub const DESCRIBE_TAGS: &str = r#"<?xml version="1.0" encoding="UTF-8"?>
<DescribeTagsResponse xmlns="http://ec2.amazonaws.com/doc/2016-11-15/">
    <requestId>7a62c49f-347e-4fc4-9331-6e8eEXAMPLE</requestId>
    <tagSet>
        <item>
            <resourceId>i-0123456789abcdef0</resourceId>
            <resourceType>instance</resourceType>
            <key>Name</key>
            <value>web</value>
        </item>
        <item>
            <resourceId>i-0123456789abcdef0</resourceId>
            <resourceType>instance</resourceType>
            <key>empty</key>
            <value/>
        </item>
    </tagSet>
</DescribeTagsResponse>"#;

    pub const DESCRIBE_INSTANCES: &str = r#"<?xml version="1.0" encoding="UTF-8"?>
<DescribeInstancesResponse xmlns="http://ec2.amazonaws.com/doc/2016-11-15/">
    <requestId>8f7724cf-496f-496e-8fe3-example</requestId>
    <reservationSet>
        <item>
            <reservationId>r-1234567890abcdef0</reservationId>
            <ownerId>123456789012</ownerId>
            <groupSet/>
            <instancesSet>
                <item>
                    <instanceId>i-0aaaaaaaaaaaaaaa1</instanceId>
                    <imageId>ami-0abcdef1234567890</imageId>
                    <instanceState>
                        <code>16</code>
                        <name>running</name>
                    </instanceState>
                    <tagSet>
                        <item>
                            <key>ahs:instance-group</key>
                            <value>web</value>
                        </item>
                        <item>
                            <key>ahs:instance-id</key>
                            <value>1</value>
                        </item>
                    </tagSet>
                </item>
                <item>
                    <instanceId>i-0bbbbbbbbbbbbbbb2</instanceId>
                    <instanceState>
                        <code>0</code>
                        <name>pending</name>
                    </instanceState>
                    <tagSet>
                        <item>
                            <key>ahs:instance-group</key>
                            <value>web</value>
                        </item>
                    </tagSet>
                </item>
            </instancesSet>
        </item>
    </reservationSet>
    <nextToken>page-2</nextToken>
</DescribeInstancesResponse>"#;

    pub const ERROR: &str = r#"<?xml version="1.0" encoding="UTF-8"?>
<Response>
    <Errors>
        <Error>
            <Code>UnauthorizedOperation</Code>
            <Message>You are not authorized to perform this operation.</Message>
        </Error>
    </Errors>
    <RequestID>b2bfe5b6-d3c0-4c2b-b48c-example</RequestID>
</Response>"#;
}
