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

//! Example of driving queue operations against the in-memory mock, or a
//! real endpoint when `SQS_EXAMPLE_LIVE=on`.

use anyhow::Result;
use querysign_aws_sqs::{
    Client, Config, CreateQueueOptions, MockClient, MockStore, QueueApi, ReceiveMessageOptions,
};
use querysign_core::{Context, OsEnv};
use querysign_http_send_reqwest::ReqwestHttpSend;
use std::env;
use std::sync::Arc;

async fn run(client: &dyn QueueApi) -> Result<()> {
    let queue = client
        .create_queue("querysign-example", &CreateQueueOptions::default())
        .await?
        .queue_url;
    println!("queue: {queue}");

    let sent = client.send_message(&queue, "hello, queue").await?;
    println!("sent message {} (md5 {})", sent.message_id, sent.md5_of_message_body);

    let received = client
        .receive_message(
            &queue,
            &ReceiveMessageOptions {
                max_number_of_messages: Some(10),
                attribute_names: vec!["All".to_string()],
                ..Default::default()
            },
        )
        .await?;
    for msg in &received.messages {
        println!("received {}: {} {:?}", msg.message_id, msg.body, msg.attributes);
        client.delete_message(&queue, &msg.receipt_handle).await?;
    }

    client.delete_queue(&queue).await?;
    Ok(())
}

#[tokio::main]
async fn main() -> Result<()> {
    env_logger::init();

    let ctx = Context::new()
        .with_http_send(ReqwestHttpSend::default())
        .with_env(OsEnv);
    let config = Config::default().from_env(&ctx);

    if env::var("SQS_EXAMPLE_LIVE").ok().as_deref() == Some("on") {
        let client = Client::new(ctx, &config)?;
        run(&client).await
    } else {
        let config = Config {
            access_key_id: config
                .access_key_id
                .or_else(|| Some("example_access_key_id".to_string())),
            ..config
        };
        let client = MockClient::new(Arc::new(MockStore::new()), &config)?;
        run(&client).await
    }
}
