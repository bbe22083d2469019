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

use crate::operation::{CreateQueueOptions, ListQueuesOptions, ReceiveMessageOptions};
use crate::response::*;
use crate::{Config, QueueApi};
use async_trait::async_trait;
use http::StatusCode;
use log::debug;
use md5::{Digest, Md5};
use querysign_core::time::{now, DateTime};
use querysign_core::{Error, Result};
use rand::Rng;
use std::collections::{BTreeMap, HashMap};
use std::sync::{Arc, Mutex};
use uuid::Uuid;

/// Regions accepted by [`MockClient`].
pub const MOCK_REGIONS: &[&str] = &[
    "ap-northeast-1",
    "ap-southeast-1",
    "eu-west-1",
    "us-east-1",
    "us-west-1",
    "us-west-2",
    "sa-east-1",
];

const NON_EXISTENT_QUEUE: &str = "AWS.SimpleQueueService.NonExistentQueue";
const RECEIPT_HANDLE_IS_INVALID: &str = "ReceiptHandleIsInvalid";
const INVALID_PARAMETER_VALUE: &str = "InvalidParameterValue";
const READ_COUNT_OUT_OF_RANGE: &str = "ReadCountOutOfRange";

const DEFAULT_VISIBILITY_TIMEOUT: u32 = 30;
const MAX_VISIBILITY_TIMEOUT: u32 = 43200;

/// MockStore is the in-memory repository behind [`MockClient`].
///
/// Data is partitioned by region and access key id, every client built on
/// the same store and the same pair sees the same account. Share the store
/// with `Arc` and drop or [`reset`](MockStore::reset) it to start over.
#[derive(Debug, Default)]
pub struct MockStore {
    data: Mutex<HashMap<String, HashMap<String, AccountData>>>,
}

#[derive(Debug)]
struct AccountData {
    owner_id: String,
    queues: BTreeMap<String, MockQueue>,
}

impl AccountData {
    fn new() -> Self {
        let owner_id = rand::thread_rng().gen_range(0..1_000_000_000_000u64);
        Self {
            owner_id: format!("{owner_id:012}"),
            queues: BTreeMap::new(),
        }
    }
}

#[derive(Debug)]
struct MockQueue {
    name: String,
    attributes: BTreeMap<String, String>,
    messages: Vec<MockMessage>,
}

impl MockQueue {
    fn visibility_timeout(&self) -> u32 {
        self.attributes
            .get("VisibilityTimeout")
            .and_then(|v| v.parse().ok())
            .unwrap_or(DEFAULT_VISIBILITY_TIMEOUT)
    }

    fn message_by_receipt(&mut self, receipt_handle: &str) -> Option<&mut MockMessage> {
        self.messages
            .iter_mut()
            .find(|m| m.receipt_handle.as_deref() == Some(receipt_handle))
    }
}

#[derive(Debug)]
struct MockMessage {
    id: String,
    body: String,
    md5_of_body: String,
    sent_at: DateTime,
    first_received_at: Option<DateTime>,
    receive_count: u32,
    visible_at: DateTime,
    receipt_handle: Option<String>,
}

impl MockStore {
    /// Create an empty store.
    pub fn new() -> Self {
        Self::default()
    }

    /// Drop all data of all accounts.
    pub fn reset(&self) {
        self.data.lock().expect("lock poisoned").clear();
    }

    /// Run `f` on the account of (`region`, `access_key_id`), creating it on
    /// first use. The store stays locked while `f` runs.
    fn with_account<T>(
        &self,
        region: &str,
        access_key_id: &str,
        f: impl FnOnce(&mut AccountData) -> T,
    ) -> T {
        let mut data = self.data.lock().expect("lock poisoned");
        let account = data
            .entry(region.to_string())
            .or_default()
            .entry(access_key_id.to_string())
            .or_insert_with(AccountData::new);
        f(account)
    }

    fn remove_account(&self, region: &str, access_key_id: &str) {
        let mut data = self.data.lock().expect("lock poisoned");
        if let Some(accounts) = data.get_mut(region) {
            accounts.remove(access_key_id);
        }
    }
}

/// MockClient serves queue operations from a [`MockStore`].
///
/// It returns the same outputs and remote error codes as [`Client`](crate::Client),
/// so code written against [`QueueApi`] can be tested without network.
#[derive(Debug, Clone)]
pub struct MockClient {
    store: Arc<MockStore>,
    region: String,
    access_key_id: String,
}

impl MockClient {
    /// Create a mock client for the region and access key id of `config`.
    pub fn new(store: Arc<MockStore>, config: &Config) -> Result<Self> {
        let region = config.region();
        if !MOCK_REGIONS.contains(&region) {
            return Err(Error::config_invalid("unknown region")
                .with_context(format!("region: {region}")));
        }
        let Some(access_key_id) = config.access_key_id.clone() else {
            return Err(Error::config_invalid("access key id is required"));
        };

        Ok(Self {
            store,
            region: region.to_string(),
            access_key_id,
        })
    }

    /// Drop all data of this client's account.
    pub fn reset_data(&self) {
        self.store.remove_account(&self.region, &self.access_key_id);
    }

    fn with_account<T>(&self, f: impl FnOnce(&mut AccountData) -> T) -> T {
        self.store.with_account(&self.region, &self.access_key_id, f)
    }

    fn with_queue<T>(
        &self,
        queue_url: &str,
        f: impl FnOnce(&mut MockQueue) -> Result<T>,
    ) -> Result<T> {
        self.with_account(|account| match account.queues.get_mut(queue_url) {
            Some(queue) => f(queue),
            None => Err(
                sender_error(NON_EXISTENT_QUEUE, "The specified queue does not exist.")
                    .with_context(format!("queue_url: {queue_url}")),
            ),
        })
    }
}

fn request_id() -> String {
    Uuid::new_v4().to_string()
}

fn sender_error(code: &str, message: &str) -> Error {
    remote_error(code, message, &request_id(), StatusCode::BAD_REQUEST)
}

fn timestamp_millis(t: DateTime) -> String {
    t.timestamp_millis().to_string()
}

fn validate_queue_name(name: &str) -> Result<()> {
    let valid = !name.is_empty()
        && name.len() <= 80
        && name
            .bytes()
            .all(|b| b.is_ascii_alphanumeric() || b == b'-' || b == b'_');
    if valid {
        Ok(())
    } else {
        Err(sender_error(
            INVALID_PARAMETER_VALUE,
            "Queue names can only include alphanumeric characters, hyphens, or underscores. 1 to 80 in length.",
        )
        .with_context(format!("queue_name: {name}")))
    }
}

fn validate_visibility_timeout(timeout: u32) -> Result<()> {
    if timeout > MAX_VISIBILITY_TIMEOUT {
        return Err(sender_error(
            INVALID_PARAMETER_VALUE,
            "VisibilityTimeout must be between 0 and 43200 seconds.",
        )
        .with_context(format!("visibility_timeout: {timeout}")));
    }
    Ok(())
}

fn deadline(from: DateTime, timeout: u32) -> DateTime {
    from + chrono::TimeDelta::seconds(i64::from(timeout))
}

#[async_trait]
impl QueueApi for MockClient {
    async fn change_message_visibility(
        &self,
        queue_url: &str,
        receipt_handle: &str,
        visibility_timeout: u32,
    ) -> Result<EmptyOutput> {
        validate_visibility_timeout(visibility_timeout)?;

        self.with_queue(queue_url, |queue| {
            let Some(msg) = queue.message_by_receipt(receipt_handle) else {
                return Err(sender_error(
                    RECEIPT_HANDLE_IS_INVALID,
                    "The input receipt handle is invalid.",
                ));
            };
            msg.visible_at = deadline(now(), visibility_timeout);

            Ok(EmptyOutput {
                request_id: request_id(),
            })
        })
    }

    async fn create_queue(
        &self,
        name: &str,
        opts: &CreateQueueOptions,
    ) -> Result<CreateQueueOutput> {
        validate_queue_name(name)?;
        if let Some(timeout) = opts.default_visibility_timeout {
            validate_visibility_timeout(timeout)?;
        }

        let region = self.region.clone();
        let queue_url = self.with_account(|account| {
            let queue_url = format!("https://queue.amazonaws.com/{}/{name}", account.owner_id);
            if account.queues.contains_key(&queue_url) {
                debug!("queue {name} exists, reuse it");
                return queue_url;
            }

            let created = timestamp_millis(now());
            let mut attributes = BTreeMap::from([
                (
                    "QueueArn".to_string(),
                    format!("arn:aws:sqs:{region}:{}:{name}", account.owner_id),
                ),
                (
                    "VisibilityTimeout".to_string(),
                    opts.default_visibility_timeout
                        .unwrap_or(DEFAULT_VISIBILITY_TIMEOUT)
                        .to_string(),
                ),
                ("MaximumMessageSize".to_string(), "8192".to_string()),
                ("MessageRetentionPeriod".to_string(), "345600".to_string()),
                ("CreatedTimestamp".to_string(), created.clone()),
                ("LastModifiedTimestamp".to_string(), created),
            ]);
            for attr in &opts.attributes {
                attributes.insert(attr.name.clone(), attr.value.clone());
            }

            account.queues.insert(
                queue_url.clone(),
                MockQueue {
                    name: name.to_string(),
                    attributes,
                    messages: Vec::new(),
                },
            );
            queue_url
        });

        Ok(CreateQueueOutput {
            queue_url,
            request_id: request_id(),
        })
    }

    async fn delete_message(&self, queue_url: &str, receipt_handle: &str) -> Result<EmptyOutput> {
        self.with_queue(queue_url, |queue| {
            let before = queue.messages.len();
            queue
                .messages
                .retain(|m| m.receipt_handle.as_deref() != Some(receipt_handle));
            if queue.messages.len() == before {
                return Err(sender_error(
                    RECEIPT_HANDLE_IS_INVALID,
                    "The input receipt handle is invalid.",
                ));
            }

            Ok(EmptyOutput {
                request_id: request_id(),
            })
        })
    }

    async fn delete_queue(&self, queue_url: &str) -> Result<EmptyOutput> {
        self.with_account(|account| match account.queues.remove(queue_url) {
            Some(queue) => {
                debug!("deleted queue {} with {} messages", queue.name, queue.messages.len());
                Ok(EmptyOutput {
                    request_id: request_id(),
                })
            }
            None => Err(
                sender_error(NON_EXISTENT_QUEUE, "The specified queue does not exist.")
                    .with_context(format!("queue_url: {queue_url}")),
            ),
        })
    }

    async fn get_queue_attributes(
        &self,
        queue_url: &str,
        attribute_names: &[String],
    ) -> Result<GetQueueAttributesOutput> {
        self.with_queue(queue_url, |queue| {
            let now = now();
            let visible = queue.messages.iter().filter(|m| m.visible_at <= now).count();

            let mut attributes = queue.attributes.clone();
            attributes.insert(
                "ApproximateNumberOfMessages".to_string(),
                visible.to_string(),
            );
            attributes.insert(
                "ApproximateNumberOfMessagesNotVisible".to_string(),
                (queue.messages.len() - visible).to_string(),
            );

            if !attribute_names.iter().any(|n| n == "All") {
                attributes.retain(|k, _| attribute_names.contains(k));
            }

            Ok(GetQueueAttributesOutput {
                attributes,
                request_id: request_id(),
            })
        })
    }

    async fn list_queues(&self, opts: &ListQueuesOptions) -> Result<ListQueuesOutput> {
        let prefix = opts.queue_name_prefix.as_deref().unwrap_or_default();
        let queue_urls = self.with_account(|account| {
            account
                .queues
                .iter()
                .filter(|(_, q)| q.name.starts_with(prefix))
                .map(|(url, _)| url.clone())
                .collect()
        });

        Ok(ListQueuesOutput {
            queue_urls,
            request_id: request_id(),
        })
    }

    async fn receive_message(
        &self,
        queue_url: &str,
        opts: &ReceiveMessageOptions,
    ) -> Result<ReceiveMessageOutput> {
        let max = opts.max_number_of_messages.unwrap_or(1);
        if !(1..=10).contains(&max) {
            return Err(sender_error(
                READ_COUNT_OUT_OF_RANGE,
                "MaxNumberOfMessages must be between 1 and 10.",
            )
            .with_context(format!("max_number_of_messages: {max}")));
        }
        if let Some(timeout) = opts.visibility_timeout {
            validate_visibility_timeout(timeout)?;
        }
        let all = opts.attribute_names.iter().any(|n| n == "All");

        self.with_queue(queue_url, |queue| {
            let now = now();
            let timeout = opts
                .visibility_timeout
                .unwrap_or_else(|| queue.visibility_timeout());
            let sender_id = queue
                .attributes
                .get("QueueArn")
                .and_then(|arn| arn.split(':').nth(4))
                .unwrap_or_default()
                .to_string();

            let mut messages = Vec::new();
            for msg in queue
                .messages
                .iter_mut()
                .filter(|m| m.visible_at <= now)
                .take(max as usize)
            {
                let receipt_handle = Uuid::new_v4().to_string();
                msg.receipt_handle = Some(receipt_handle.clone());
                msg.visible_at = deadline(now, timeout);
                msg.receive_count += 1;
                let first_received_at = *msg.first_received_at.get_or_insert(now);

                let mut attributes = BTreeMap::from([
                    ("SenderId".to_string(), sender_id.clone()),
                    ("SentTimestamp".to_string(), timestamp_millis(msg.sent_at)),
                    (
                        "ApproximateReceiveCount".to_string(),
                        msg.receive_count.to_string(),
                    ),
                    (
                        "ApproximateFirstReceiveTimestamp".to_string(),
                        timestamp_millis(first_received_at),
                    ),
                ]);
                if !all {
                    attributes.retain(|k, _| opts.attribute_names.contains(k));
                }

                messages.push(Message {
                    message_id: msg.id.clone(),
                    receipt_handle,
                    md5_of_body: msg.md5_of_body.clone(),
                    body: msg.body.clone(),
                    attributes,
                });
            }

            Ok(ReceiveMessageOutput {
                messages,
                request_id: request_id(),
            })
        })
    }

    async fn send_message(&self, queue_url: &str, body: &str) -> Result<SendMessageOutput> {
        self.with_queue(queue_url, |queue| {
            let now = now();
            let msg = MockMessage {
                id: Uuid::new_v4().to_string(),
                body: body.to_string(),
                md5_of_body: hex::encode(Md5::digest(body.as_bytes())),
                sent_at: now,
                first_received_at: None,
                receive_count: 0,
                visible_at: now,
                receipt_handle: None,
            };
            let out = SendMessageOutput {
                message_id: msg.id.clone(),
                md5_of_message_body: msg.md5_of_body.clone(),
                request_id: request_id(),
            };
            queue.messages.push(msg);

            Ok(out)
        })
    }

    async fn set_queue_attributes(
        &self,
        queue_url: &str,
        name: &str,
        value: &str,
    ) -> Result<EmptyOutput> {
        if name == "VisibilityTimeout" {
            let timeout = value.parse::<u32>().map_err(|_| {
                sender_error(INVALID_PARAMETER_VALUE, "VisibilityTimeout must be an integer.")
                    .with_context(format!("value: {value}"))
            })?;
            validate_visibility_timeout(timeout)?;
        }

        self.with_queue(queue_url, |queue| {
            queue.attributes.insert(name.to_string(), value.to_string());
            queue.attributes.insert(
                "LastModifiedTimestamp".to_string(),
                timestamp_millis(now()),
            );

            Ok(EmptyOutput {
                request_id: request_id(),
            })
        })
    }
}
