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

use crate::endpoint::queue_path;
use querysign_core::{FlattenParams, Params, Result};

/// Queue attribute, flattened as `{prefix}.Name` and `{prefix}.Value`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct QueueAttribute {
    /// Attribute name, like `VisibilityTimeout`.
    pub name: String,
    /// Attribute value.
    pub value: String,
}

impl QueueAttribute {
    /// Create a new queue attribute.
    pub fn new(name: impl Into<String>, value: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            value: value.into(),
        }
    }
}

impl FlattenParams for QueueAttribute {
    fn flatten_params(&self, prefix: &str, params: &mut Params) {
        params.insert(format!("{prefix}.Name"), self.name.as_str());
        params.insert(format!("{prefix}.Value"), self.value.as_str());
    }
}

/// Options for `CreateQueue`.
#[derive(Debug, Clone, Default)]
pub struct CreateQueueOptions {
    /// Visibility timeout in seconds for messages of the new queue.
    pub default_visibility_timeout: Option<u32>,
    /// Extra attributes, sent as `Attribute.N.Name` / `Attribute.N.Value`.
    pub attributes: Vec<QueueAttribute>,
}

/// Options for `ListQueues`.
#[derive(Debug, Clone, Default)]
pub struct ListQueuesOptions {
    /// Only return queues whose name starts with this prefix.
    pub queue_name_prefix: Option<String>,
}

/// Options for `ReceiveMessage`.
#[derive(Debug, Clone, Default)]
pub struct ReceiveMessageOptions {
    /// Up to 10 messages are returned, 1 if unset.
    pub max_number_of_messages: Option<u32>,
    /// Override the queue visibility timeout for received messages.
    pub visibility_timeout: Option<u32>,
    /// Message attributes to return, like `All` or `SentTimestamp`.
    pub attribute_names: Vec<String>,
}

/// Operation is one Query API call ready to be signed.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Operation {
    /// Action name.
    pub action: &'static str,
    /// Operation specific parameters.
    pub params: Params,
    /// Request path, `None` for the endpoint path.
    pub path: Option<String>,
}

impl Operation {
    fn new(action: &'static str, params: Params) -> Self {
        Self {
            action,
            params,
            path: None,
        }
    }

    fn for_queue(action: &'static str, queue_url: &str, params: Params) -> Result<Self> {
        Ok(Self {
            action,
            params,
            path: Some(queue_path(queue_url)?),
        })
    }

    /// Change the visibility timeout of a received message.
    pub fn change_message_visibility(
        queue_url: &str,
        receipt_handle: &str,
        visibility_timeout: u32,
    ) -> Result<Self> {
        let params = Params::new()
            .with("ReceiptHandle", receipt_handle)
            .with("VisibilityTimeout", visibility_timeout.to_string());
        Self::for_queue("ChangeMessageVisibility", queue_url, params)
    }

    /// Create a queue.
    pub fn create_queue(name: &str, opts: &CreateQueueOptions) -> Self {
        let mut params = Params::new().with("QueueName", name);
        params.insert_opt(
            "DefaultVisibilityTimeout",
            opts.default_visibility_timeout.map(|v| v.to_string()),
        );
        params.insert_list("Attribute", &opts.attributes);

        Self::new("CreateQueue", params)
    }

    /// Delete a message by its receipt handle.
    pub fn delete_message(queue_url: &str, receipt_handle: &str) -> Result<Self> {
        let params = Params::new().with("ReceiptHandle", receipt_handle);
        Self::for_queue("DeleteMessage", queue_url, params)
    }

    /// Delete a queue.
    pub fn delete_queue(queue_url: &str) -> Result<Self> {
        Self::for_queue("DeleteQueue", queue_url, Params::new())
    }

    /// Get attributes of a queue.
    pub fn get_queue_attributes(queue_url: &str, attribute_names: &[String]) -> Result<Self> {
        let params = Params::new().with_list("AttributeName", attribute_names);
        Self::for_queue("GetQueueAttributes", queue_url, params)
    }

    /// List queues.
    pub fn list_queues(opts: &ListQueuesOptions) -> Self {
        let mut params = Params::new();
        params.insert_opt("QueueNamePrefix", opts.queue_name_prefix.as_deref());

        Self::new("ListQueues", params)
    }

    /// Receive messages.
    pub fn receive_message(queue_url: &str, opts: &ReceiveMessageOptions) -> Result<Self> {
        let mut params = Params::new();
        params.insert_opt(
            "MaxNumberOfMessages",
            opts.max_number_of_messages.map(|v| v.to_string()),
        );
        params.insert_opt(
            "VisibilityTimeout",
            opts.visibility_timeout.map(|v| v.to_string()),
        );
        params.insert_list("AttributeName", &opts.attribute_names);

        Self::for_queue("ReceiveMessage", queue_url, params)
    }

    /// Send a message.
    pub fn send_message(queue_url: &str, body: &str) -> Result<Self> {
        let params = Params::new().with("MessageBody", body);
        Self::for_queue("SendMessage", queue_url, params)
    }

    /// Set one attribute of a queue.
    pub fn set_queue_attributes(queue_url: &str, name: &str, value: &str) -> Result<Self> {
        let mut params = Params::new();
        params.insert_struct("Attribute", &QueueAttribute::new(name, value));
        Self::for_queue("SetQueueAttributes", queue_url, params)
    }
}
