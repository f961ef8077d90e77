use std::net::SocketAddr;

use bytes::Bytes;
use redust::config::Config;
use redust::connection::Connection;
use redust::frame::Frame;
use redust::server::serve;
use tokio::net::{TcpListener, TcpStream};
use tokio::time::{sleep, timeout, Duration};

async fn start_server() -> SocketAddr {
    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    tokio::spawn(serve(listener, Config::default()));
    addr
}

async fn client(addr: SocketAddr) -> Connection {
    Connection::new(TcpStream::connect(addr).await.unwrap())
}

fn bulk(s: &str) -> Frame {
    Frame::Bulk(Bytes::copy_from_slice(s.as_bytes()))
}

fn array(parts: &[&str]) -> Frame {
    Frame::Array(parts.iter().map(|part| bulk(part)).collect())
}

fn ack(kind: &str, name: Option<&str>, count: i64) -> Frame {
    Frame::Array(vec![
        bulk(kind),
        name.map_or(Frame::Null, bulk),
        Frame::Integer(count),
    ])
}

async fn send(connection: &mut Connection, parts: &[&str]) {
    connection.write_frame(array(parts)).await.unwrap();
}

async fn recv(connection: &mut Connection) -> Frame {
    timeout(Duration::from_secs(1), connection.read_frame())
        .await
        .expect("timed out waiting for a frame")
        .unwrap()
        .expect("connection closed")
}

async fn request(connection: &mut Connection, parts: &[&str]) -> Frame {
    send(connection, parts).await;
    recv(connection).await
}

fn numsub(channel: &str, count: i64) -> Frame {
    Frame::Array(vec![bulk(channel), Frame::Integer(count)])
}

/// Disconnects are processed by the server in the background, so poll until they take effect.
async fn wait_for_numsub(observer: &mut Connection, channel: &str, count: i64) {
    let mut remaining = Frame::Null;
    for _ in 0..50 {
        remaining = request(observer, &["PUBSUB", "NUMSUB", channel]).await;
        if remaining == numsub(channel, count) {
            return;
        }
        sleep(Duration::from_millis(20)).await;
    }
    assert_eq!(remaining, numsub(channel, count));
}

#[tokio::test]
async fn subscribe_then_receive_messages() {
    let addr = start_server().await;
    let mut subscriber = client(addr).await;
    let mut publisher = client(addr).await;

    send(&mut subscriber, &["SUBSCRIBE", "news", "sports"]).await;
    assert_eq!(recv(&mut subscriber).await, ack("subscribe", Some("news"), 1));
    assert_eq!(recv(&mut subscriber).await, ack("subscribe", Some("sports"), 2));

    assert_eq!(
        request(&mut publisher, &["PUBLISH", "news", "hello"]).await,
        Frame::Integer(1)
    );
    assert_eq!(
        request(&mut publisher, &["PUBLISH", "weather", "sunny"]).await,
        Frame::Integer(0)
    );

    assert_eq!(
        recv(&mut subscriber).await,
        array(&["message", "news", "hello"])
    );
}

#[tokio::test]
async fn pattern_subscriptions() {
    let addr = start_server().await;
    let mut subscriber = client(addr).await;
    let mut publisher = client(addr).await;

    send(&mut subscriber, &["PSUBSCRIBE", "news.*"]).await;
    assert_eq!(recv(&mut subscriber).await, ack("psubscribe", Some("news.*"), 1));

    assert_eq!(
        request(&mut publisher, &["PUBLISH", "news.tech", "rust"]).await,
        Frame::Integer(1)
    );
    assert_eq!(
        recv(&mut subscriber).await,
        array(&["pmessage", "news.*", "news.tech", "rust"])
    );

    assert_eq!(
        request(&mut publisher, &["PUBSUB", "NUMPAT"]).await,
        Frame::Integer(1)
    );
}

#[tokio::test]
async fn one_delivery_per_subscriber() {
    let addr = start_server().await;
    let mut subscriber = client(addr).await;
    let mut other = client(addr).await;
    let mut publisher = client(addr).await;

    send(&mut subscriber, &["SUBSCRIBE", "news"]).await;
    recv(&mut subscriber).await;
    send(&mut subscriber, &["PSUBSCRIBE", "n*", "news"]).await;
    recv(&mut subscriber).await;
    recv(&mut subscriber).await;

    send(&mut other, &["PSUBSCRIBE", "*"]).await;
    recv(&mut other).await;

    assert_eq!(
        request(&mut publisher, &["PUBLISH", "news", "once"]).await,
        Frame::Integer(2)
    );

    // An exact channel subscription wins over matching patterns.
    assert_eq!(
        recv(&mut subscriber).await,
        array(&["message", "news", "once"])
    );
    assert_eq!(
        recv(&mut other).await,
        array(&["pmessage", "*", "news", "once"])
    );

    assert_eq!(
        request(&mut subscriber, &["PING"]).await,
        Frame::Simple("PONG".to_string())
    );
}

#[tokio::test]
async fn unsubscribe_from_everything() {
    let addr = start_server().await;
    let mut subscriber = client(addr).await;
    let mut publisher = client(addr).await;

    send(&mut subscriber, &["SUBSCRIBE", "a", "b"]).await;
    recv(&mut subscriber).await;
    recv(&mut subscriber).await;

    send(&mut subscriber, &["UNSUBSCRIBE"]).await;
    let Frame::Array(first) = recv(&mut subscriber).await else {
        panic!("expected an unsubscribe acknowledgement");
    };
    let Frame::Array(second) = recv(&mut subscriber).await else {
        panic!("expected an unsubscribe acknowledgement");
    };
    assert_eq!(first[2], Frame::Integer(1));
    assert_eq!(second[2], Frame::Integer(0));

    assert_eq!(
        request(&mut publisher, &["PUBLISH", "a", "gone"]).await,
        Frame::Integer(0)
    );

    assert_eq!(
        request(&mut subscriber, &["UNSUBSCRIBE"]).await,
        ack("unsubscribe", None, 0)
    );
    assert_eq!(
        request(&mut subscriber, &["PUNSUBSCRIBE"]).await,
        ack("punsubscribe", None, 0)
    );
}

#[tokio::test]
async fn disconnect_drops_subscriptions() {
    let addr = start_server().await;
    let mut subscriber = client(addr).await;
    let mut observer = client(addr).await;

    send(&mut subscriber, &["SUBSCRIBE", "room"]).await;
    recv(&mut subscriber).await;

    assert_eq!(
        request(&mut observer, &["PUBSUB", "NUMSUB", "room"]).await,
        numsub("room", 1)
    );

    drop(subscriber);
    wait_for_numsub(&mut observer, "room", 0).await;

    assert_eq!(
        request(&mut observer, &["PUBSUB", "CHANNELS"]).await,
        Frame::Array(vec![])
    );
}

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn no_delivery_after_unsubscribe_ack() {
    let addr = start_server().await;
    let mut subscriber = client(addr).await;
    let mut publisher = client(addr).await;

    send(&mut subscriber, &["SUBSCRIBE", "race"]).await;
    assert_eq!(recv(&mut subscriber).await, ack("subscribe", Some("race"), 1));

    let publishing = tokio::spawn(async move {
        let mut delivered = 0;
        for i in 0..500 {
            let payload = i.to_string();
            match request(&mut publisher, &["PUBLISH", "race", &payload]).await {
                Frame::Integer(count) => delivered += count,
                other => panic!("unexpected reply to PUBLISH: {:?}", other),
            }
        }
        delivered
    });

    let is_message = |frame: &Frame| {
        matches!(frame, Frame::Array(parts) if parts.first() == Some(&bulk("message")))
    };

    let first = recv(&mut subscriber).await;
    assert_eq!(first, array(&["message", "race", "0"]));
    send(&mut subscriber, &["UNSUBSCRIBE", "race"]).await;

    let mut received = 1;
    loop {
        let frame = recv(&mut subscriber).await;
        if frame == ack("unsubscribe", Some("race"), 0) {
            break;
        }
        assert!(is_message(&frame), "unexpected frame {:?}", frame);
        received += 1;
    }

    let delivered = publishing.await.unwrap();

    // Nothing published after the acknowledgement may reach the subscriber.
    assert_eq!(
        request(&mut subscriber, &["PING"]).await,
        Frame::Simple("PONG".to_string())
    );
    assert_eq!(received, delivered);
}

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn disconnect_while_publishing() {
    let addr = start_server().await;
    let mut publisher = client(addr).await;
    let mut observer = client(addr).await;

    let mut subscribers = Vec::new();
    for _ in 0..8 {
        let mut subscriber = client(addr).await;
        send(&mut subscriber, &["SUBSCRIBE", "race"]).await;
        assert_eq!(recv(&mut subscriber).await, ack("subscribe", Some("race"), 1));
        subscribers.push(subscriber);
    }

    let publishing = tokio::spawn(async move {
        let mut counts = Vec::with_capacity(300);
        for _ in 0..300 {
            match request(&mut publisher, &["PUBLISH", "race", "payload"]).await {
                Frame::Integer(count) => counts.push(count),
                other => panic!("unexpected reply to PUBLISH: {:?}", other),
            }
        }
        (publisher, counts)
    });

    for subscriber in subscribers {
        drop(subscriber);
        tokio::task::yield_now().await;
    }

    let (mut publisher, counts) = publishing.await.unwrap();
    assert!(counts.iter().all(|&count| count <= 8));
    assert!(
        counts.windows(2).all(|pair| pair[0] >= pair[1]),
        "receiver counts grew: {:?}",
        counts
    );

    wait_for_numsub(&mut observer, "race", 0).await;
    assert_eq!(
        request(&mut publisher, &["PUBLISH", "race", "late"]).await,
        Frame::Integer(0)
    );
}

#[tokio::test]
async fn monitor_sees_other_clients() {
    let addr = start_server().await;
    let mut monitor = client(addr).await;
    let mut worker = client(addr).await;

    assert_eq!(
        request(&mut monitor, &["MONITOR"]).await,
        Frame::Simple("OK".to_string())
    );

    assert_eq!(
        request(&mut worker, &["SET", "key", "a value"]).await,
        Frame::Simple("OK".to_string())
    );

    let Frame::Simple(line) = recv(&mut monitor).await else {
        panic!("expected a trace line");
    };
    assert!(line.ends_with("\"SET\" \"key\" \"a value\""), "{line}");
    assert!(line.contains(" [0 127.0.0.1:"), "{line}");
}

#[tokio::test]
async fn quit_closes_the_connection() {
    let addr = start_server().await;
    let mut connection = client(addr).await;

    assert_eq!(
        request(&mut connection, &["QUIT"]).await,
        Frame::Simple("OK".to_string())
    );

    let next = timeout(Duration::from_secs(1), connection.read_frame())
        .await
        .expect("timed out waiting for the server to close");
    assert_eq!(next.unwrap(), None);
}
