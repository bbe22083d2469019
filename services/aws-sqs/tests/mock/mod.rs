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

use pretty_assertions::assert_eq;
use querysign_aws_sqs::{
    error_code, Config, CreateQueueOptions, ListQueuesOptions, MockClient, MockStore, QueueApi,
    QueueAttribute, ReceiveMessageOptions,
};
use querysign_core::{ErrorKind, Result};
use std::sync::Arc;

fn config(region: &str, access_key_id: &str) -> Config {
    Config {
        region: Some(region.to_string()),
        access_key_id: Some(access_key_id.to_string()),
        ..Default::default()
    }
}

fn client(store: &Arc<MockStore>) -> MockClient {
    let _ = env_logger::builder().is_test(true).try_init();

    MockClient::new(store.clone(), &config("us-east-1", "access_key_id"))
        .expect("mock client must be built")
}

fn receive_all() -> ReceiveMessageOptions {
    ReceiveMessageOptions {
        max_number_of_messages: Some(10),
        ..Default::default()
    }
}

#[tokio::test]
async fn test_queue_lifecycle() -> Result<()> {
    let store = Arc::new(MockStore::new());
    let client = client(&store);

    let orders = client
        .create_queue("orders", &CreateQueueOptions::default())
        .await?
        .queue_url;
    assert!(orders.starts_with("https://queue.amazonaws.com/"));
    assert!(orders.ends_with("/orders"));

    // Creating the same queue again returns the same url.
    let again = client
        .create_queue("orders", &CreateQueueOptions::default())
        .await?;
    assert_eq!(again.queue_url, orders);

    client
        .create_queue("jobs", &CreateQueueOptions::default())
        .await?;

    let all = client.list_queues(&ListQueuesOptions::default()).await?;
    assert_eq!(all.queue_urls.len(), 2);
    let filtered = client
        .list_queues(&ListQueuesOptions {
            queue_name_prefix: Some("ord".to_string()),
        })
        .await?;
    assert_eq!(filtered.queue_urls, vec![orders.clone()]);

    client.delete_queue(&orders).await?;
    let err = client.delete_queue(&orders).await.unwrap_err();
    assert_eq!(err.kind(), ErrorKind::Remote);
    assert_eq!(
        error_code(&err),
        Some("AWS.SimpleQueueService.NonExistentQueue")
    );

    let err = client.send_message(&orders, "hello").await.unwrap_err();
    assert_eq!(
        error_code(&err),
        Some("AWS.SimpleQueueService.NonExistentQueue")
    );
    Ok(())
}

#[tokio::test]
async fn test_send_receive_delete() -> Result<()> {
    let store = Arc::new(MockStore::new());
    let client = client(&store);
    let queue = client
        .create_queue("orders", &CreateQueueOptions::default())
        .await?
        .queue_url;

    let sent = client.send_message(&queue, "This is a test message").await?;
    assert_eq!(sent.md5_of_message_body, "fafb00f5732ab283681e124bf8747ed1");

    let received = client.receive_message(&queue, &receive_all()).await?;
    assert_eq!(received.messages.len(), 1);
    let msg = &received.messages[0];
    assert_eq!(msg.message_id, sent.message_id);
    assert_eq!(msg.body, "This is a test message");
    assert_eq!(msg.md5_of_body, sent.md5_of_message_body);
    assert!(msg.attributes.is_empty());

    // Received messages stay hidden until the visibility timeout passes.
    let hidden = client.receive_message(&queue, &receive_all()).await?;
    assert!(hidden.messages.is_empty());

    let attrs = client
        .get_queue_attributes(&queue, &["All".to_string()])
        .await?;
    assert_eq!(attrs.attributes["ApproximateNumberOfMessages"], "0");
    assert_eq!(attrs.attributes["ApproximateNumberOfMessagesNotVisible"], "1");

    client.delete_message(&queue, &msg.receipt_handle).await?;
    let err = client
        .delete_message(&queue, &msg.receipt_handle)
        .await
        .unwrap_err();
    assert_eq!(error_code(&err), Some("ReceiptHandleIsInvalid"));

    let attrs = client
        .get_queue_attributes(&queue, &["ApproximateNumberOfMessagesNotVisible".to_string()])
        .await?;
    assert_eq!(attrs.attributes.len(), 1);
    assert_eq!(attrs.attributes["ApproximateNumberOfMessagesNotVisible"], "0");
    Ok(())
}

#[tokio::test]
async fn test_change_message_visibility() -> Result<()> {
    let store = Arc::new(MockStore::new());
    let client = client(&store);
    let queue = client
        .create_queue("orders", &CreateQueueOptions::default())
        .await?
        .queue_url;
    client.send_message(&queue, "first").await?;

    let received = client.receive_message(&queue, &receive_all()).await?;
    let handle = received.messages[0].receipt_handle.clone();
    assert!(client
        .receive_message(&queue, &receive_all())
        .await?
        .messages
        .is_empty());

    client.change_message_visibility(&queue, &handle, 0).await?;

    let opts = ReceiveMessageOptions {
        attribute_names: vec!["ApproximateReceiveCount".to_string()],
        ..receive_all()
    };
    let again = client.receive_message(&queue, &opts).await?;
    assert_eq!(again.messages.len(), 1);
    assert_eq!(again.messages[0].attributes["ApproximateReceiveCount"], "2");
    assert_ne!(again.messages[0].receipt_handle, handle);

    let err = client
        .change_message_visibility(&queue, "not-a-handle", 0)
        .await
        .unwrap_err();
    assert_eq!(error_code(&err), Some("ReceiptHandleIsInvalid"));
    Ok(())
}

#[tokio::test]
async fn test_receive_respects_limits() -> Result<()> {
    let store = Arc::new(MockStore::new());
    let client = client(&store);
    let queue = client
        .create_queue("orders", &CreateQueueOptions::default())
        .await?
        .queue_url;
    for i in 0..3 {
        client.send_message(&queue, &format!("message {i}")).await?;
    }

    let one = client
        .receive_message(&queue, &ReceiveMessageOptions::default())
        .await?;
    assert_eq!(one.messages.len(), 1);
    assert_eq!(one.messages[0].body, "message 0");

    let rest = client.receive_message(&queue, &receive_all()).await?;
    assert_eq!(rest.messages.len(), 2);

    let err = client
        .receive_message(
            &queue,
            &ReceiveMessageOptions {
                max_number_of_messages: Some(11),
                ..Default::default()
            },
        )
        .await
        .unwrap_err();
    assert_eq!(error_code(&err), Some("ReadCountOutOfRange"));
    Ok(())
}

#[tokio::test]
async fn test_queue_attributes() -> Result<()> {
    let store = Arc::new(MockStore::new());
    let client = client(&store);
    let queue = client
        .create_queue(
            "orders",
            &CreateQueueOptions {
                default_visibility_timeout: Some(45),
                attributes: vec![QueueAttribute::new("DelaySeconds", "0")],
            },
        )
        .await?
        .queue_url;

    let attrs = client
        .get_queue_attributes(&queue, &["All".to_string()])
        .await?;
    assert_eq!(attrs.attributes["VisibilityTimeout"], "45");
    assert_eq!(attrs.attributes["DelaySeconds"], "0");
    assert!(attrs.attributes["QueueArn"].starts_with("arn:aws:sqs:us-east-1:"));

    client
        .set_queue_attributes(&queue, "VisibilityTimeout", "60")
        .await?;
    let attrs = client
        .get_queue_attributes(&queue, &["VisibilityTimeout".to_string()])
        .await?;
    assert_eq!(attrs.attributes["VisibilityTimeout"], "60");

    let err = client
        .set_queue_attributes(&queue, "VisibilityTimeout", "forever")
        .await
        .unwrap_err();
    assert_eq!(err.kind(), ErrorKind::Remote);
    assert_eq!(error_code(&err), Some("InvalidParameterValue"));
    Ok(())
}

#[tokio::test]
async fn test_accounts_are_isolated() -> Result<()> {
    let store = Arc::new(MockStore::new());
    let alice = MockClient::new(store.clone(), &config("us-east-1", "alice"))?;
    let bob = MockClient::new(store.clone(), &config("us-east-1", "bob"))?;
    let alice_eu = MockClient::new(store.clone(), &config("eu-west-1", "alice"))?;

    let queue = alice
        .create_queue("orders", &CreateQueueOptions::default())
        .await?
        .queue_url;
    assert_eq!(
        alice
            .list_queues(&ListQueuesOptions::default())
            .await?
            .queue_urls,
        vec![queue.clone()]
    );
    assert!(bob
        .list_queues(&ListQueuesOptions::default())
        .await?
        .queue_urls
        .is_empty());
    assert!(alice_eu
        .list_queues(&ListQueuesOptions::default())
        .await?
        .queue_urls
        .is_empty());

    // Another client with the same region and key shares the account.
    let alice_again = MockClient::new(store.clone(), &config("us-east-1", "alice"))?;
    alice_again.send_message(&queue, "shared").await?;
    let received = alice.receive_message(&queue, &receive_all()).await?;
    assert_eq!(received.messages[0].body, "shared");
    Ok(())
}

#[tokio::test]
async fn test_reset() -> Result<()> {
    let store = Arc::new(MockStore::new());
    let alice = MockClient::new(store.clone(), &config("us-east-1", "alice"))?;
    let bob = MockClient::new(store.clone(), &config("us-east-1", "bob"))?;

    alice
        .create_queue("orders", &CreateQueueOptions::default())
        .await?;
    bob.create_queue("orders", &CreateQueueOptions::default())
        .await?;

    alice.reset_data();
    let empty = ListQueuesOptions::default();
    assert!(alice.list_queues(&empty).await?.queue_urls.is_empty());
    assert_eq!(bob.list_queues(&empty).await?.queue_urls.len(), 1);

    store.reset();
    assert!(bob.list_queues(&empty).await?.queue_urls.is_empty());
    Ok(())
}
