//! End-to-end relay scenarios over loopback TCP.

#![allow(clippy::unwrap_used)]
#![allow(clippy::expect_used)]
#![allow(clippy::panic)]

use std::sync::Arc;
use std::time::Duration;

use chatrelay_core::ErrorCode;
use chatrelay_server::{ChatServer, ServerSection};

mod common;
use common::{local_cfg, Event, Peer, RecordingObserver};

async fn start(cfg: ServerSection) -> (ChatServer, Arc<RecordingObserver>) {
    let observer = Arc::new(RecordingObserver::default());
    let server = ChatServer::start(cfg, observer.clone()).await.unwrap();
    (server, observer)
}

#[tokio::test]
async fn alice_and_bob_chat_then_bob_leaves() {
    let (server, observer) = start(local_cfg()).await;
    let addr = server.local_addr();

    let mut alice = Peer::connect(addr, "Alice").await;
    assert_eq!(alice.recv().await, "SERVER: Alice joined the chat.");

    let mut bob = Peer::connect(addr, "Bob").await;
    assert_eq!(bob.recv().await, "SERVER: Bob joined the chat.");
    assert_eq!(alice.recv().await, "SERVER: Bob joined the chat.");
    assert_eq!(server.client_names(), vec!["Alice", "Bob"]);

    alice.send("hi").await;
    assert_eq!(alice.recv().await, "Alice: hi");
    assert_eq!(bob.recv().await, "Alice: hi");
    observer.wait_for(Event::Log("Alice: hi".into())).await;

    drop(bob);
    assert_eq!(alice.recv().await, "SERVER: Bob left the chat.");
    assert_eq!(server.client_count(), 1);
    assert_eq!(server.client_names(), vec!["Alice"]);
    assert_eq!(observer.count(&Event::Removed("Bob".into())), 1);
    assert_eq!(observer.count(&Event::Log("Bob disconnected.".into())), 1);

    server.stop().await;
}

#[tokio::test]
async fn messages_from_one_sender_keep_their_order() {
    let (server, _observer) = start(local_cfg()).await;
    let addr = server.local_addr();

    let mut alice = Peer::connect(addr, "Alice").await;
    alice.recv().await;
    let mut bob = Peer::connect(addr, "Bob").await;
    bob.recv().await;
    alice.recv().await;

    for i in 0..50 {
        alice.send(&format!("m{i}")).await;
    }
    for i in 0..50 {
        assert_eq!(bob.recv().await, format!("Alice: m{i}"));
    }

    server.stop().await;
}

#[tokio::test]
async fn duplicate_names_are_allowed() {
    let (server, _observer) = start(local_cfg()).await;
    let addr = server.local_addr();

    let mut first = Peer::connect(addr, "Sam").await;
    first.recv().await;
    let mut second = Peer::connect(addr, "Sam").await;
    second.recv().await;
    first.recv().await;

    assert_eq!(server.client_names(), vec!["Sam", "Sam"]);

    drop(second);
    assert_eq!(first.recv().await, "SERVER: Sam left the chat.");
    assert_eq!(server.client_count(), 1);

    server.stop().await;
}

#[tokio::test]
async fn bind_conflict_reports_bind_error() {
    let taken = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
    let port = taken.local_addr().unwrap().port();

    let observer = Arc::new(RecordingObserver::default());
    let cfg = ServerSection {
        port,
        ..local_cfg()
    };
    let err = match ChatServer::start(cfg, observer.clone()).await {
        Ok(_) => panic!("bind must fail while the port is taken"),
        Err(e) => e,
    };

    assert_eq!(err.code(), ErrorCode::BindFailed);
    let logs = observer.logs();
    assert_eq!(logs.len(), 1);
    assert!(logs[0].starts_with("Error starting server"), "{logs:?}");
}

#[tokio::test]
async fn failed_handshake_never_registers() {
    let (server, observer) = start(local_cfg()).await;
    let addr = server.local_addr();

    // Closes without a name.
    drop(Peer::connect_silent(addr).await);
    // Sends half a frame, then closes.
    let mut partial = Peer::connect_silent(addr).await;
    partial.send_raw(&[0x00, 0x05, b'a']).await;
    drop(partial);

    let mut alice = Peer::connect(addr, "Alice").await;
    assert_eq!(alice.recv().await, "SERVER: Alice joined the chat.");

    alice.send("still here").await;
    assert_eq!(alice.recv().await, "Alice: still here");
    assert_eq!(server.client_count(), 1);
    assert_eq!(observer.count(&Event::Added("Alice".into())), 1);
    assert!(!observer
        .events()
        .iter()
        .any(|e| matches!(e, Event::Removed(_))));

    server.stop().await;
}

#[tokio::test]
async fn silent_peer_is_dropped_after_handshake_timeout() {
    let cfg = ServerSection {
        handshake_timeout_ms: 100,
        ..local_cfg()
    };
    let (server, _observer) = start(cfg).await;

    let mut silent = Peer::connect_silent(server.local_addr()).await;
    assert!(silent.closed_by_server().await);
    assert_eq!(server.client_count(), 0);

    server.stop().await;
}

#[tokio::test]
async fn oversized_frame_ends_only_the_offender() {
    let cfg = ServerSection {
        max_frame_bytes: 64,
        ..local_cfg()
    };
    let (server, _observer) = start(cfg).await;
    let addr = server.local_addr();

    let mut alice = Peer::connect(addr, "Alice").await;
    alice.recv().await;
    let mut bob = Peer::connect(addr, "Bob").await;
    bob.recv().await;
    alice.recv().await;

    // Declares 255 bytes against a 64 byte limit.
    bob.send_raw(&[0x00, 0xff]).await;
    assert!(bob.closed_by_server().await);
    assert_eq!(alice.recv().await, "SERVER: Bob left the chat.");

    alice.send("ok").await;
    assert_eq!(alice.recv().await, "Alice: ok");
    assert_eq!(server.client_names(), vec!["Alice"]);

    server.stop().await;
}

#[tokio::test]
async fn stop_closes_every_session_once() {
    let (server, observer) = start(local_cfg()).await;
    let addr = server.local_addr();
    let registry = server.registry();

    let mut alice = Peer::connect(addr, "Alice").await;
    alice.recv().await;
    let mut bob = Peer::connect(addr, "Bob").await;
    bob.recv().await;
    alice.recv().await;

    server.stop().await;

    assert!(alice.closed_by_server().await);
    assert!(bob.closed_by_server().await);
    assert!(registry.is_empty());
    assert_eq!(observer.count(&Event::Removed("Alice".into())), 1);
    assert_eq!(observer.count(&Event::Removed("Bob".into())), 1);
    assert_eq!(observer.logs().last().map(String::as_str), Some("Server stopped."));

    // Listener is closed too.
    let refused = tokio::time::timeout(
        Duration::from_secs(5),
        tokio::net::TcpStream::connect(addr),
    )
    .await
    .unwrap();
    assert!(refused.is_err());
}

#[tokio::test]
async fn stats_track_fan_out() {
    let (server, _observer) = start(local_cfg()).await;
    let addr = server.local_addr();

    let mut alice = Peer::connect(addr, "Alice").await;
    alice.recv().await;
    alice.send("hello").await;
    alice.recv().await;

    // The relay counts a delivery right after enqueueing it.
    let deadline = tokio::time::Instant::now() + Duration::from_secs(5);
    while server.stats().deliveries < 2 && tokio::time::Instant::now() < deadline {
        tokio::time::sleep(Duration::from_millis(10)).await;
    }

    let stats = server.stats();
    assert_eq!(stats.broadcasts, 2);
    assert_eq!(stats.deliveries, 2);
    assert_eq!(stats.failed_deliveries, 0);

    server.stop().await;
}

#[tokio::test]
async fn stalled_reader_is_removed_by_write_timeout() {
    let cfg = ServerSection {
        write_timeout_ms: 200,
        outbound_queue: 65536,
        ..local_cfg()
    };
    let (server, observer) = start(cfg).await;
    let addr = server.local_addr();

    let mut alice = Peer::connect(addr, "Alice").await;
    assert_eq!(alice.recv().await, "SERVER: Alice joined the chat.");

    // Handshakes, then never reads.
    let _stall = Peer::connect(addr, "Stall").await;
    assert_eq!(alice.recv().await, "SERVER: Stall joined the chat.");
    assert_eq!(server.client_count(), 2);

    let body = "x".repeat(60_000);
    let echo = format!("Alice: {body}");
    let mut removed = false;
    for _ in 0..2000 {
        alice.send(&body).await;
        let line = alice.recv().await;
        if line == "SERVER: Stall left the chat." {
            removed = true;
            break;
        }
        assert_eq!(line, echo);
    }
    assert!(removed, "stalled reader was never removed");

    observer.wait_for(Event::Removed("Stall".into())).await;
    assert_eq!(server.client_count(), 1);
    assert_eq!(server.client_names(), vec!["Alice"]);

    // Alice is unaffected; an echo queued behind the notice may still arrive.
    alice.send("still here").await;
    loop {
        let line = alice.recv().await;
        if line == "Alice: still here" {
            break;
        }
        assert_eq!(line, echo);
    }

    server.stop().await;
}
