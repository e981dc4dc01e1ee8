//! Delivery tests against a local stub standing in for Discord.

use std::sync::{Arc, Mutex};
use std::time::Duration;

use chrono::Utc;
use songtailor_core::ticket::Ticket;
use songtailor_events::{CreationNotifier, DiscordError, DiscordWebhook, DomainEvent, EventBus};
use tokio::io::{AsyncReadExt, AsyncWriteExt};
use tokio::net::{TcpListener, TcpStream};

type Received = Arc<Mutex<Vec<serde_json::Value>>>;

// ---------------------------------------------------------------------------
// Stub server
// ---------------------------------------------------------------------------

/// Serve one response per connection, taking status codes from `statuses`
/// in order and repeating the last one.
async fn stub_server(statuses: Vec<u16>) -> (String, Received) {
    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let url = format!("http://{}/webhook", listener.local_addr().unwrap());
    let received: Received = Arc::default();

    let bodies = Arc::clone(&received);
    tokio::spawn(async move {
        let mut served = 0usize;
        loop {
            let Ok((mut stream, _)) = listener.accept().await else {
                break;
            };
            let status = statuses[served.min(statuses.len() - 1)];
            served += 1;
            if let Some(body) = read_body(&mut stream).await {
                bodies.lock().unwrap().push(body);
            }
            let response = format!(
                "HTTP/1.1 {status} Stub\r\ncontent-length: 0\r\nconnection: close\r\n\r\n"
            );
            let _ = stream.write_all(response.as_bytes()).await;
            let _ = stream.shutdown().await;
        }
    });

    (url, received)
}

async fn read_body(stream: &mut TcpStream) -> Option<serde_json::Value> {
    let mut buf = Vec::new();
    let mut chunk = [0u8; 4096];
    loop {
        let n = stream.read(&mut chunk).await.ok()?;
        if n == 0 {
            return None;
        }
        buf.extend_from_slice(&chunk[..n]);

        let text = String::from_utf8_lossy(&buf);
        let Some(header_end) = text.find("\r\n\r\n") else {
            continue;
        };
        let content_length = text[..header_end]
            .lines()
            .filter_map(|line| line.split_once(':'))
            .find(|(name, _)| name.trim().eq_ignore_ascii_case("content-length"))
            .and_then(|(_, value)| value.trim().parse::<usize>().ok())
            .unwrap_or(0);
        let body_start = header_end + 4;
        if buf.len() >= body_start + content_length {
            return serde_json::from_slice(&buf[body_start..body_start + content_length]).ok();
        }
    }
}

fn fast_webhook(url: &str) -> DiscordWebhook {
    DiscordWebhook::new(url)
        .unwrap()
        .with_retry_delays(vec![Duration::from_millis(5); 3])
}

fn ticket() -> Ticket {
    Ticket::new(77, "Showcase medley", 5, Utc::now())
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[tokio::test]
async fn delivers_on_first_success() {
    let (url, received) = stub_server(vec![204]).await;
    let delivered = CreationNotifier::notify(&fast_webhook(&url), &DomainEvent::ticket_created(&ticket()))
        .await
        .unwrap();

    assert!(delivered);
    let bodies = received.lock().unwrap();
    assert_eq!(bodies.len(), 1);
    assert_eq!(bodies[0]["embeds"][0]["title"], "New ticket #77: Showcase medley");
}

#[tokio::test]
async fn retries_transient_failures() {
    let (url, received) = stub_server(vec![500, 502, 204]).await;
    fast_webhook(&url)
        .deliver(&serde_json::json!({"content": "hi"}))
        .await
        .unwrap();
    assert_eq!(received.lock().unwrap().len(), 3);
}

#[tokio::test]
async fn gives_up_after_schedule_is_exhausted() {
    let (url, received) = stub_server(vec![503]).await;
    let err = fast_webhook(&url)
        .deliver(&serde_json::json!({"content": "hi"}))
        .await
        .unwrap_err();

    assert!(matches!(err, DiscordError::HttpStatus(503)));
    // One initial attempt plus three retries.
    assert_eq!(received.lock().unwrap().len(), 4);
}

#[tokio::test]
async fn ignores_non_creation_events() {
    let (url, received) = stub_server(vec![204]).await;
    let delivered = CreationNotifier::notify(&fast_webhook(&url), &DomainEvent::ticket_deleted(3))
        .await
        .unwrap();
    assert!(!delivered);
    assert!(received.lock().unwrap().is_empty());
}

#[tokio::test]
async fn background_loop_announces_published_tickets() {
    let (url, received) = stub_server(vec![204]).await;
    let bus = EventBus::default();
    let handle = tokio::spawn(CreationNotifier::new(fast_webhook(&url)).run(bus.subscribe()));

    bus.publish(DomainEvent::ticket_deleted(1));
    bus.publish(DomainEvent::ticket_created(&ticket()));

    for _ in 0..100 {
        if !received.lock().unwrap().is_empty() {
            break;
        }
        tokio::time::sleep(Duration::from_millis(10)).await;
    }
    assert_eq!(received.lock().unwrap().len(), 1);

    drop(bus);
    tokio::time::timeout(Duration::from_secs(1), handle)
        .await
        .expect("loop exits once the bus is dropped")
        .unwrap();
}
