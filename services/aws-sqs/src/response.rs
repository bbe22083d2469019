// Licensed to the Apache Software Foundation (ASF) under one
// or more contributor license agreements.  See the NOTICE file
// distributed with this work for additional information
// regarding copyright ownership.  The ASF licenses this file
// to you under the Apache License, Version 2.0 (the
// "License"); you may not use this file except in compliance
// with the License.  You may obtain a copy of the License at
//
//   http://www.apache.org/licenses/LICENSE-2.0
//
// Unless required by applicable law or agreed to in writing,
// software distributed under the License is distributed on an
// "AS IS" BASIS, WITHOUT WARRANTIES OR CONDITIONS OF ANY
// KIND, either express or implied.  See the License for the
// specific language governing permissions and limitations
// under the License.

use http::StatusCode;
use log::debug;
use quick_xml::de;
use querysign_core::{Error, Result};
use serde::de::DeserializeOwned;
use serde::Deserialize;
use std::collections::BTreeMap;

/// Output of `CreateQueue`.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct CreateQueueOutput {
    /// Url of the created queue.
    pub queue_url: String,
    /// Request id assigned by the service.
    pub request_id: String,
}

/// Output of `ListQueues`.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ListQueuesOutput {
    /// Urls of the matching queues.
    pub queue_urls: Vec<String>,
    /// Request id assigned by the service.
    pub request_id: String,
}

/// Output of `SendMessage`.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SendMessageOutput {
    /// Id of the new message.
    pub message_id: String,
    /// Hex MD5 of the message body as computed by the service.
    pub md5_of_message_body: String,
    /// Request id assigned by the service.
    pub request_id: String,
}

/// A message returned by `ReceiveMessage`.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Message {
    /// Message id.
    pub message_id: String,
    /// Handle used to delete the message or change its visibility.
    pub receipt_handle: String,
    /// Hex MD5 of the body.
    pub md5_of_body: String,
    /// Message body.
    pub body: String,
    /// Requested message attributes.
    pub attributes: BTreeMap<String, String>,
}

/// Output of `ReceiveMessage`.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ReceiveMessageOutput {
    /// Received messages, maybe empty.
    pub messages: Vec<Message>,
    /// Request id assigned by the service.
    pub request_id: String,
}

/// Output of `GetQueueAttributes`.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct GetQueueAttributesOutput {
    /// Queue attributes by name.
    pub attributes: BTreeMap<String, String>,
    /// Request id assigned by the service.
    pub request_id: String,
}

/// Output of operations that only return response metadata.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct EmptyOutput {
    /// Request id assigned by the service.
    pub request_id: String,
}

/// Get the service error code carried by a remote error.
///
/// ```
/// use querysign_core::Error;
/// use querysign_aws_sqs::error_code;
///
/// let err = Error::remote("queue does not exist")
///     .with_context("code: AWS.SimpleQueueService.NonExistentQueue");
/// assert_eq!(error_code(&err), Some("AWS.SimpleQueueService.NonExistentQueue"));
/// ```
pub fn error_code(err: &Error) -> Option<&str> {
    err.context().iter().find_map(|c| c.strip_prefix("code: "))
}

/// Build the remote error used by both the real and the mocked client.
pub(crate) fn remote_error(
    code: &str,
    message: &str,
    request_id: &str,
    status: StatusCode,
) -> Error {
    Error::remote(message)
        .with_context(format!("code: {code}"))
        .with_context(format!("request_id: {request_id}"))
        .with_context(format!("status: {}", status.as_u16()))
}

/// Parse the body of a response to `action`.
///
/// Non-200 responses are turned into remote errors when they carry an
/// `ErrorResponse` document.
pub(crate) fn parse_response<X, T>(action: &str, status: StatusCode, body: &str) -> Result<T>
where
    X: DeserializeOwned,
    T: From<X>,
{
    if status != StatusCode::OK {
        return Err(parse_error(action, status, body));
    }

    let resp: X = de::from_str(body).map_err(|e| {
        Error::unexpected("failed to parse response")
            .with_source(e)
            .with_context(format!("action: {action}"))
            .with_context(format!("response_length: {}", body.len()))
    })?;
    Ok(resp.into())
}

fn parse_error(action: &str, status: StatusCode, body: &str) -> Error {
    match de::from_str::<ErrorResponse>(body) {
        Ok(resp) if !resp.error.code.is_empty() => {
            debug!(
                "{action} failed with {}: {} ({})",
                resp.error.code, resp.error.message, resp.error.kind
            );
            remote_error(
                &resp.error.code,
                &resp.error.message,
                &resp.request_id,
                status,
            )
            .with_context(format!("action: {action}"))
        }
        _ => Error::unexpected("unexpected response status")
            .with_context(format!("action: {action}"))
            .with_context(format!("status: {}", status.as_u16()))
            .with_context(format!("response_length: {}", body.len())),
    }
}

#[derive(Default, Debug, Deserialize)]
#[serde(default, rename_all = "PascalCase")]
struct ErrorResponse {
    error: ErrorDetail,
    request_id: String,
}

#[derive(Default, Debug, Deserialize)]
#[serde(default, rename_all = "PascalCase")]
struct ErrorDetail {
    #[serde(rename = "Type")]
    kind: String,
    code: String,
    message: String,
}

#[derive(Default, Debug, Deserialize)]
#[serde(default, rename_all = "PascalCase")]
struct ResponseMetadata {
    request_id: String,
}

#[derive(Default, Debug, Deserialize)]
#[serde(default, rename_all = "PascalCase")]
struct XmlAttribute {
    name: String,
    value: String,
}

fn into_map(attributes: Vec<XmlAttribute>) -> BTreeMap<String, String> {
    attributes.into_iter().map(|a| (a.name, a.value)).collect()
}

#[derive(Default, Debug, Deserialize)]
#[serde(default, rename_all = "PascalCase")]
pub(crate) struct CreateQueueResponse {
    create_queue_result: CreateQueueResult,
    response_metadata: ResponseMetadata,
}

#[derive(Default, Debug, Deserialize)]
#[serde(default, rename_all = "PascalCase")]
struct CreateQueueResult {
    queue_url: String,
}

impl From<CreateQueueResponse> for CreateQueueOutput {
    fn from(v: CreateQueueResponse) -> Self {
        Self {
            queue_url: v.create_queue_result.queue_url,
            request_id: v.response_metadata.request_id,
        }
    }
}

#[derive(Default, Debug, Deserialize)]
#[serde(default, rename_all = "PascalCase")]
pub(crate) struct ListQueuesResponse {
    list_queues_result: ListQueuesResult,
    response_metadata: ResponseMetadata,
}

#[derive(Default, Debug, Deserialize)]
#[serde(default, rename_all = "PascalCase")]
struct ListQueuesResult {
    #[serde(rename = "QueueUrl")]
    queue_urls: Vec<String>,
}

impl From<ListQueuesResponse> for ListQueuesOutput {
    fn from(v: ListQueuesResponse) -> Self {
        Self {
            queue_urls: v.list_queues_result.queue_urls,
            request_id: v.response_metadata.request_id,
        }
    }
}

#[derive(Default, Debug, Deserialize)]
#[serde(default, rename_all = "PascalCase")]
pub(crate) struct SendMessageResponse {
    send_message_result: SendMessageResult,
    response_metadata: ResponseMetadata,
}

#[derive(Default, Debug, Deserialize)]
#[serde(default, rename_all = "PascalCase")]
struct SendMessageResult {
    message_id: String,
    #[serde(rename = "MD5OfMessageBody")]
    md5_of_message_body: String,
}

impl From<SendMessageResponse> for SendMessageOutput {
    fn from(v: SendMessageResponse) -> Self {
        Self {
            message_id: v.send_message_result.message_id,
            md5_of_message_body: v.send_message_result.md5_of_message_body,
            request_id: v.response_metadata.request_id,
        }
    }
}

#[derive(Default, Debug, Deserialize)]
#[serde(default, rename_all = "PascalCase")]
pub(crate) struct ReceiveMessageResponse {
    receive_message_result: ReceiveMessageResult,
    response_metadata: ResponseMetadata,
}

#[derive(Default, Debug, Deserialize)]
#[serde(default, rename_all = "PascalCase")]
struct ReceiveMessageResult {
    #[serde(rename = "Message")]
    messages: Vec<XmlMessage>,
}

#[derive(Default, Debug, Deserialize)]
#[serde(default, rename_all = "PascalCase")]
struct XmlMessage {
    message_id: String,
    receipt_handle: String,
    #[serde(rename = "MD5OfBody")]
    md5_of_body: String,
    body: String,
    #[serde(rename = "Attribute")]
    attributes: Vec<XmlAttribute>,
}

impl From<ReceiveMessageResponse> for ReceiveMessageOutput {
    fn from(v: ReceiveMessageResponse) -> Self {
        Self {
            messages: v
                .receive_message_result
                .messages
                .into_iter()
                .map(|m| Message {
                    message_id: m.message_id,
                    receipt_handle: m.receipt_handle,
                    md5_of_body: m.md5_of_body,
                    body: m.body,
                    attributes: into_map(m.attributes),
                })
                .collect(),
            request_id: v.response_metadata.request_id,
        }
    }
}

#[derive(Default, Debug, Deserialize)]
#[serde(default, rename_all = "PascalCase")]
pub(crate) struct GetQueueAttributesResponse {
    get_queue_attributes_result: GetQueueAttributesResult,
    response_metadata: ResponseMetadata,
}

#[derive(Default, Debug, Deserialize)]
#[serde(default, rename_all = "PascalCase")]
struct GetQueueAttributesResult {
    #[serde(rename = "Attribute")]
    attributes: Vec<XmlAttribute>,
}

impl From<GetQueueAttributesResponse> for GetQueueAttributesOutput {
    fn from(v: GetQueueAttributesResponse) -> Self {
        Self {
            attributes: into_map(v.get_queue_attributes_result.attributes),
            request_id: v.response_metadata.request_id,
        }
    }
}

/// Response of `ChangeMessageVisibility`, `DeleteMessage`, `DeleteQueue`
/// and `SetQueueAttributes`.
#[derive(Default, Debug, Deserialize)]
#[serde(default, rename_all = "PascalCase")]
pub(crate) struct MetadataResponse {
    response_metadata: ResponseMetadata,
}

impl From<MetadataResponse> for EmptyOutput {
    fn from(v: MetadataResponse) -> Self {
        Self {
            request_id: v.response_metadata.request_id,
        }
    }
}
