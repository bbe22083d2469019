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

use crate::operation::{
    CreateQueueOptions, ListQueuesOptions, Operation, ReceiveMessageOptions,
};
use crate::provide_credential::DefaultCredentialProvider;
use crate::response::*;
use crate::{Config, Credential, Endpoint, RequestSigner};
use async_trait::async_trait;
use log::debug;
use md5::{Digest, Md5};
use querysign_core::{Context, Error, ProvideCredential, Result, Signer};

/// QueueApi is the set of queue operations shared by [`Client`] and
/// [`MockClient`](crate::MockClient).
#[async_trait]
pub trait QueueApi: Send + Sync {
    /// Change the visibility timeout of a received message.
    async fn change_message_visibility(
        &self,
        queue_url: &str,
        receipt_handle: &str,
        visibility_timeout: u32,
    ) -> Result<EmptyOutput>;

    /// Create a queue, returning the url of an existing queue with the same name.
    async fn create_queue(&self, name: &str, opts: &CreateQueueOptions)
        -> Result<CreateQueueOutput>;

    /// Delete a message by its receipt handle.
    async fn delete_message(&self, queue_url: &str, receipt_handle: &str) -> Result<EmptyOutput>;

    /// Delete a queue with all its messages.
    async fn delete_queue(&self, queue_url: &str) -> Result<EmptyOutput>;

    /// Get attributes of a queue, `All` returns every attribute.
    async fn get_queue_attributes(
        &self,
        queue_url: &str,
        attribute_names: &[String],
    ) -> Result<GetQueueAttributesOutput>;

    /// List queues.
    async fn list_queues(&self, opts: &ListQueuesOptions) -> Result<ListQueuesOutput>;

    /// Receive messages.
    async fn receive_message(
        &self,
        queue_url: &str,
        opts: &ReceiveMessageOptions,
    ) -> Result<ReceiveMessageOutput>;

    /// Send a message.
    async fn send_message(&self, queue_url: &str, body: &str) -> Result<SendMessageOutput>;

    /// Set one attribute of a queue.
    async fn set_queue_attributes(
        &self,
        queue_url: &str,
        name: &str,
        value: &str,
    ) -> Result<EmptyOutput>;
}

/// Client talks to the queue service over the [`HttpSend`](querysign_core::HttpSend)
/// configured in its context.
///
/// Credentials are checked when they are loaded, so a missing or empty key
/// fails with `CredentialInvalid` (or `CredentialExpired`) here, while
/// [`RequestSigner::sign`] reports the same input as `RequestInvalid`.
///
/// ```no_run
/// use querysign_aws_sqs::{Client, Config, QueueApi, CreateQueueOptions};
/// use querysign_core::{Context, OsEnv};
/// use querysign_http_send_reqwest::ReqwestHttpSend;
///
/// # async fn example() -> querysign_core::Result<()> {
/// let ctx = Context::new()
///     .with_http_send(ReqwestHttpSend::default())
///     .with_env(OsEnv);
/// let config = Config::default().from_env(&ctx);
///
/// let client = Client::new(ctx, &config)?;
/// let queue = client.create_queue("orders", &CreateQueueOptions::default()).await?;
/// client.send_message(&queue.queue_url, "hello").await?;
/// # Ok(())
/// # }
/// ```
#[derive(Debug, Clone)]
pub struct Client {
    signer: Signer<Credential>,
    endpoint: Endpoint,
}

impl Client {
    /// Create a new client with the default credential provider.
    pub fn new(ctx: Context, config: &Config) -> Result<Self> {
        let endpoint = Endpoint::from_config(config)?;
        let signer = Signer::new(
            ctx,
            DefaultCredentialProvider::from_config(config),
            RequestSigner::new(),
        );

        Ok(Self { signer, endpoint })
    }

    /// Replace the credential provider.
    pub fn with_credential_provider(
        mut self,
        provider: impl ProvideCredential<Credential = Credential>,
    ) -> Self {
        self.signer = Signer::new(self.signer.context().clone(), provider, RequestSigner::new());
        self
    }

    /// Endpoint in use.
    pub fn endpoint(&self) -> &Endpoint {
        &self.endpoint
    }

    async fn send<X, T>(&self, op: Operation) -> Result<T>
    where
        X: serde::de::DeserializeOwned,
        T: From<X>,
    {
        let action = op.action;
        let mut req = self
            .endpoint
            .signing_request(action, op.path.as_deref())
            .with_params(op.params);
        self.signer.sign(&mut req).await?;

        let req = req.into_form_request()?;
        debug!("sending {action} request to {}", req.uri());

        let resp = self
            .signer
            .context()
            .http_send_as_string(req)
            .await
            .map_err(|e| e.with_context(format!("action: {action}")))?;
        let status = resp.status();
        debug!("got {action} response: {status}");

        parse_response::<X, T>(action, status, resp.body())
    }
}

#[async_trait]
impl QueueApi for Client {
    async fn change_message_visibility(
        &self,
        queue_url: &str,
        receipt_handle: &str,
        visibility_timeout: u32,
    ) -> Result<EmptyOutput> {
        let op =
            Operation::change_message_visibility(queue_url, receipt_handle, visibility_timeout)?;
        self.send::<MetadataResponse, _>(op).await
    }

    async fn create_queue(
        &self,
        name: &str,
        opts: &CreateQueueOptions,
    ) -> Result<CreateQueueOutput> {
        self.send::<CreateQueueResponse, _>(Operation::create_queue(name, opts))
            .await
    }

    async fn delete_message(&self, queue_url: &str, receipt_handle: &str) -> Result<EmptyOutput> {
        let op = Operation::delete_message(queue_url, receipt_handle)?;
        self.send::<MetadataResponse, _>(op).await
    }

    async fn delete_queue(&self, queue_url: &str) -> Result<EmptyOutput> {
        let op = Operation::delete_queue(queue_url)?;
        self.send::<MetadataResponse, _>(op).await
    }

    async fn get_queue_attributes(
        &self,
        queue_url: &str,
        attribute_names: &[String],
    ) -> Result<GetQueueAttributesOutput> {
        let op = Operation::get_queue_attributes(queue_url, attribute_names)?;
        self.send::<GetQueueAttributesResponse, _>(op).await
    }

    async fn list_queues(&self, opts: &ListQueuesOptions) -> Result<ListQueuesOutput> {
        self.send::<ListQueuesResponse, _>(Operation::list_queues(opts))
            .await
    }

    async fn receive_message(
        &self,
        queue_url: &str,
        opts: &ReceiveMessageOptions,
    ) -> Result<ReceiveMessageOutput> {
        let op = Operation::receive_message(queue_url, opts)?;
        self.send::<ReceiveMessageResponse, _>(op).await
    }

    async fn send_message(&self, queue_url: &str, body: &str) -> Result<SendMessageOutput> {
        let op = Operation::send_message(queue_url, body)?;
        let out: SendMessageOutput = self.send::<SendMessageResponse, _>(op).await?;

        // The service echoes the MD5 of what it stored, a mismatch means the
        // body was altered on the way.
        let expected = hex::encode(Md5::digest(body.as_bytes()));
        if !out.md5_of_message_body.eq_ignore_ascii_case(&expected) {
            return Err(Error::unexpected("message body checksum mismatch")
                .with_context(format!("expected: {expected}"))
                .with_context(format!("actual: {}", out.md5_of_message_body))
                .with_context(format!("message_id: {}", out.message_id)));
        }
        Ok(out)
    }

    async fn set_queue_attributes(
        &self,
        queue_url: &str,
        name: &str,
        value: &str,
    ) -> Result<EmptyOutput> {
        let op = Operation::set_queue_attributes(queue_url, name, value)?;
        self.send::<MetadataResponse, _>(op).await
    }
}
