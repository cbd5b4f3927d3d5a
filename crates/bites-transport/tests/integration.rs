//! Integration tests for bites-transport
//!
//! NOTE: These tests need a NATS server. Start one locally
//! (`nats-server -p 4222`) or point `NATS_URL` at one, then run:
//!   cargo test -p bites-transport --test integration -- --ignored

use std::time::Duration;

use bites_core::{BusError, MessageBus};
use bites_transport::NatsBus;

fn nats_url() -> String {
    std::env::var("NATS_URL").unwrap_or_else(|_| "nats://localhost:4222".to_string())
}

#[tokio::test]
#[ignore]
async fn test_publish_reaches_subscriber() {
    let bus = NatsBus::connect(&nats_url()).await.unwrap();
    let mut sub = bus.subscribe("bites.test.publish").await.unwrap();
    bus.client().flush().await.unwrap();

    bus.publish("bites.test.publish", b"hello".to_vec())
        .await
        .unwrap();

    let msg = tokio::time::timeout(Duration::from_secs(5), sub.next())
        .await
        .unwrap()
        .unwrap();
    assert_eq!(msg.payload, b"hello");
    assert!(msg.reply.is_none());
}

#[tokio::test]
#[ignore]
async fn test_request_reply_round_trip() {
    let bus = NatsBus::connect(&nats_url()).await.unwrap();
    let mut sub = bus.subscribe("bites.test.echo").await.unwrap();
    bus.client().flush().await.unwrap();

    let responder = bus.clone();
    tokio::spawn(async move {
        let msg = sub.next().await.unwrap();
        responder
            .publish(&msg.reply.unwrap(), msg.payload)
            .await
            .unwrap();
    });

    let answer = bus
        .request("bites.test.echo", b"ping".to_vec(), Duration::from_secs(5))
        .await
        .unwrap();
    assert_eq!(answer, b"ping");
}

#[tokio::test]
#[ignore]
async fn test_request_without_responders() {
    let bus = NatsBus::connect(&nats_url()).await.unwrap();
    let err = bus
        .request("bites.test.nobody", Vec::new(), Duration::from_secs(2))
        .await
        .unwrap_err();
    assert!(matches!(err, BusError::NoResponders(_) | BusError::Timeout));
}
