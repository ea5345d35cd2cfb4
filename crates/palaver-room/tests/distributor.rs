//! Integration tests for the log distributor task.
//!
//! These run the distributor as a real tokio task behind the post office
//! and drive it from concurrent sender tasks, checking the ordering
//! guarantees: appends linearize into some interleaving that preserves
//! each sender's own order, and a fetch never observes a torn entry.

#![allow(
    clippy::expect_used,
    clippy::unwrap_used,
    clippy::indexing_slicing,
    clippy::arithmetic_side_effects,
    clippy::missing_panics_doc
)]

use std::time::Duration;

use tokio::sync::watch;
use tokio::time::timeout;

use palaver_post::PostOffice;
use palaver_room::{ChatLog, LogDistributor};
use palaver_types::{Address, ChatEntry, Envelope, Payload};

const ROOM: &str = "village";

/// Spawn a distributor and return the broker, the shutdown trigger, and
/// the join handle yielding the final log.
async fn start_room() -> (
    PostOffice,
    watch::Sender<bool>,
    tokio::task::JoinHandle<ChatLog>,
) {
    let post = PostOffice::new();
    let distributor = LogDistributor::register(&post, Address::from(ROOM)).await;
    let (shutdown_tx, shutdown_rx) = watch::channel(false);
    let handle = tokio::spawn(distributor.run(shutdown_rx));
    (post, shutdown_tx, handle)
}

async fn publish(post: &PostOffice, sender: &str, text: &str) {
    let envelope = Envelope::inform(
        Address::from(sender),
        Address::from(ROOM),
        Payload::Entry(ChatEntry::user(text).spoken_by(sender)),
    );
    post.deliver(envelope).await.expect("deliver inform");
}

async fn fetch_since(post: &PostOffice, who: &str, cursor: u64) -> Vec<ChatEntry> {
    let mut mailbox = post.register(Address::from(who)).await;
    let (query, correlation) = Envelope::query(
        Address::from(who),
        Address::from(ROOM),
        Payload::CursorQuery(cursor),
    );
    post.deliver(query).await.expect("deliver query");

    let reply = timeout(Duration::from_secs(5), mailbox.recv())
        .await
        .expect("distributor replied in time")
        .expect("reply envelope");
    assert_eq!(reply.correlation, Some(correlation));
    post.unregister(&Address::from(who)).await;

    match reply.payload {
        Payload::Entries(entries) => entries,
        other => panic!("unexpected reply payload: {other:?}"),
    }
}

#[tokio::test]
async fn append_then_fetch_roundtrip() {
    let (post, shutdown, handle) = start_room().await;

    publish(&post, "p1", "hi").await;
    let entries = fetch_since(&post, "reader", 0).await;
    assert_eq!(entries.len(), 1);
    assert_eq!(entries[0].content, "hi");
    assert_eq!(entries[0].speaker.as_deref(), Some("p1"));

    // Cursor advanced past the entry: nothing new.
    let entries = fetch_since(&post, "reader", 1).await;
    assert!(entries.is_empty());

    shutdown.send(true).expect("signal shutdown");
    let log = handle.await.expect("distributor task");
    assert_eq!(log.len(), 1);
}

#[tokio::test]
async fn concurrent_appends_linearize_preserving_sender_order() {
    let (post, shutdown, handle) = start_room().await;

    const SENDERS: usize = 8;
    const PER_SENDER: usize = 25;

    let mut tasks = Vec::new();
    for s in 0..SENDERS {
        let post = post.clone();
        tasks.push(tokio::spawn(async move {
            let sender = format!("p{s}");
            for i in 0..PER_SENDER {
                publish(&post, &sender, &format!("{sender}:{i}")).await;
            }
        }));
    }
    for task in tasks {
        task.await.expect("sender task");
    }

    let entries = fetch_since(&post, "reader", 0).await;
    assert_eq!(entries.len(), SENDERS * PER_SENDER);

    // No torn entries: every entry is exactly one of the published lines.
    for entry in &entries {
        let (sender, seq) = entry
            .content
            .split_once(':')
            .expect("entry content intact");
        assert!(sender.starts_with('p'));
        assert!(seq.parse::<usize>().is_ok());
    }

    // Each sender's own appends appear in its own publication order.
    for s in 0..SENDERS {
        let sender = format!("p{s}");
        let sequence: Vec<usize> = entries
            .iter()
            .filter(|e| e.speaker.as_deref() == Some(sender.as_str()))
            .map(|e| {
                e.content
                    .split_once(':')
                    .and_then(|(_, seq)| seq.parse().ok())
                    .expect("sequence number")
            })
            .collect();
        let expected: Vec<usize> = (0..PER_SENDER).collect();
        assert_eq!(sequence, expected, "sender {sender} order not preserved");
    }

    shutdown.send(true).expect("signal shutdown");
    let log = handle.await.expect("distributor task");
    assert_eq!(log.len(), SENDERS * PER_SENDER);
}

#[tokio::test]
async fn fetches_interleaved_with_appends_see_consistent_prefixes() {
    let (post, shutdown, handle) = start_room().await;

    let mut last_seen = 0_usize;
    for round in 0..10 {
        publish(&post, "writer", &format!("round {round}")).await;

        let entries = fetch_since(&post, "reader", 0).await;
        // The log only grows, and every fetch reflects a prefix of the
        // total order that includes everything previously acknowledged.
        assert!(entries.len() >= last_seen + 1);
        for (i, entry) in entries.iter().enumerate() {
            assert_eq!(entry.content, format!("round {i}"));
        }
        last_seen = entries.len();
    }

    shutdown.send(true).expect("signal shutdown");
    handle.await.expect("distributor task");
}

#[tokio::test]
async fn distributor_survives_a_dead_querier() {
    let (post, shutdown, handle) = start_room().await;

    // A query whose sender has no mailbox: the reply fails, the room moves on.
    let (query, _) = Envelope::query(
        Address::from("ghost"),
        Address::from(ROOM),
        Payload::CursorQuery(0),
    );
    post.deliver(query).await.expect("deliver query");

    publish(&post, "p1", "still here").await;
    let entries = fetch_since(&post, "reader", 0).await;
    assert_eq!(entries.len(), 1);

    shutdown.send(true).expect("signal shutdown");
    handle.await.expect("distributor task");
}

#[tokio::test]
async fn shutdown_returns_the_final_log() {
    let (post, shutdown, handle) = start_room().await;

    publish(&post, "p1", "one").await;
    publish(&post, "p2", "two").await;
    // Make sure both informs are processed before shutting down.
    let _ = fetch_since(&post, "reader", 0).await;

    shutdown.send(true).expect("signal shutdown");
    let log = handle.await.expect("distributor task");
    assert_eq!(log.len(), 2);
    let contents: Vec<&str> = log.iter().map(|e| e.content.as_str()).collect();
    assert_eq!(contents, vec!["one", "two"]);
}
