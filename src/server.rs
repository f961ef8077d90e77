use std::fmt::Write;
use std::net::SocketAddr;
use std::time::{SystemTime, UNIX_EPOCH};
use tokio::net::{TcpListener, TcpStream};
use tokio::sync::mpsc::UnboundedReceiver;
use tracing::{debug, error, info, instrument};

use crate::codec::FrameCodec;
use crate::commands::executable::Executable;
use crate::commands::Command;
use crate::config::Config;
use crate::connection::Connection;
use crate::frame::Frame;
use crate::pubsub::PubSub;
use crate::session::{Clients, Session};
use crate::store::Store;
use crate::Error;

/// State shared by every connection. Cloning is cheap, all clones refer to the same data.
#[derive(Clone, Default)]
pub struct State {
    pub store: Store,
    pub pubsub: PubSub,
    pub clients: Clients,
}

pub async fn run(config: Config) -> Result<(), Error> {
    let _ = tracing_subscriber::fmt()
        .with_max_level(config.log_level)
        .try_init()
        .map_err(|e| debug!("Failed to initialize global tracing: {}", e));

    let listener = TcpListener::bind((config.bind.as_str(), config.port)).await?;

    serve(listener, config).await
}

/// Accepts connections on an already bound listener until accepting fails.
pub async fn serve(listener: TcpListener, config: Config) -> Result<(), Error> {
    let state = State::default();

    info!("Server listening on {}", listener.local_addr()?);

    loop {
        let (socket, client_address) = listener.accept().await?;
        let state = state.clone();
        let codec = FrameCodec::new(config.max_frame_size);
        info!("Accepted connection from {:?}", client_address);

        tokio::spawn(async move {
            if let Err(e) = handle_connection(socket, client_address, state, codec).await {
                error!(cause = %e, "Connection failed");
            }
        });
    }
}

#[instrument(
    name = "connection",
    skip(stream, state, codec),
    fields(connection_id, client_address)
)]
async fn handle_connection(
    stream: TcpStream,
    client_address: SocketAddr,
    state: State,
    codec: FrameCodec,
) -> Result<(), Error> {
    let mut conn = Connection::with_codec(stream, codec);
    let (mut session, mut outbox) = state.clients.connect(client_address);

    tracing::Span::current()
        .record("connection_id", session.id.to_string())
        .record("client_address", client_address.to_string());

    let res = drive(&mut conn, &state, &mut session, &mut outbox).await;

    // The session must not be referenced by any table once the connection is gone.
    state.pubsub.remove_client(&session.id);
    state.clients.disconnect(&session.id);

    info!("Connection closed");
    res
}

/// Serves requests and outbox deliveries until the peer disconnects or asks to quit.
async fn drive(
    conn: &mut Connection,
    state: &State,
    session: &mut Session,
    outbox: &mut UnboundedReceiver<Frame>,
) -> Result<(), Error> {
    loop {
        tokio::select! {
            frame = conn.read_frame() => {
                let Some(frame) = frame? else {
                    return Ok(());
                };

                debug!("Received frame from client: {:?}", frame);
                let replies = process(frame, state, session);
                debug!("Sending response to client: {:?}", replies);
                conn.write_frames(pending(outbox).chain(replies)).await?;

                if session.is_closing() {
                    return conn.shutdown().await;
                }
            }
            Some(frame) = outbox.recv() => {
                conn.write_frame(frame).await?;
            }
        }
    }
}

/// Deliveries already queued for the session. They were published before the request that just
/// ran took effect, so they are written ahead of its replies.
fn pending(outbox: &mut UnboundedReceiver<Frame>) -> impl Iterator<Item = Frame> + '_ {
    std::iter::from_fn(move || outbox.try_recv().ok())
}

/// Runs one request to completion and returns every frame to write back, in order.
fn process(frame: Frame, state: &State, session: &mut Session) -> Vec<Frame> {
    let trace = match state.clients.monitor_count() {
        0 => None,
        _ => trace_line(&frame, session),
    };

    let reply = match Command::try_from(frame) {
        Ok(cmd) => {
            let traced = !matches!(cmd, Command::Monitor(_));
            let reply = cmd
                .exec(state, session)
                .unwrap_or_else(|e| Frame::Error(e.to_string()));

            if let Some(line) = trace.filter(|_| traced) {
                state.clients.trace(line);
            }

            reply
        }
        Err(e) => Frame::Error(e.to_string()),
    };

    let mut replies = session.take_replies();
    replies.push(reply);
    replies
}

/// Renders a request the way monitor clients see it:
/// `<unix time> [<db> <address>] "<command>" "<arg>" ...`
fn trace_line(frame: &Frame, session: &Session) -> Option<String> {
    let Frame::Array(parts) = frame else {
        return None;
    };

    let now = SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .unwrap_or_default();

    let mut line = format!(
        "{}.{:06} [{} {}]",
        now.as_secs(),
        now.subsec_micros(),
        session.db,
        session.addr
    );

    for part in parts {
        let bytes = match part {
            Frame::Bulk(bytes) => bytes.to_vec(),
            part => part.as_text().unwrap_or_default().into_bytes(),
        };
        line.push(' ');
        quote(&bytes, &mut line);
    }

    Some(line)
}

fn quote(bytes: &[u8], dst: &mut String) {
    dst.push('"');
    for &byte in bytes {
        match byte {
            b'"' => dst.push_str("\\\""),
            b'\\' => dst.push_str("\\\\"),
            b'\n' => dst.push_str("\\n"),
            b'\r' => dst.push_str("\\r"),
            b'\t' => dst.push_str("\\t"),
            0x20..=0x7e => dst.push(byte as char),
            _ => {
                let _ = write!(dst, "\\x{:02x}", byte);
            }
        }
    }
    dst.push('"');
}

#[cfg(test)]
mod tests {
    use bytes::Bytes;

    use super::*;
    use crate::commands::testing::{connect, frame};

    #[test]
    fn trace_line_quotes_arguments() {
        let state = State::default();
        let (mut session, _rx) = connect(&state);
        session.db = 2;

        let line = trace_line(&frame(&["SET", "k", "say \"hi\"\n"]), &session).unwrap();
        let (timestamp, rest) = line.split_once(' ').unwrap();

        assert!(timestamp.contains('.'));
        assert_eq!(
            rest,
            "[2 127.0.0.1:6380] \"SET\" \"k\" \"say \\\"hi\\\"\\n\""
        );
    }

    #[test]
    fn process_writes_queued_replies_first() {
        let state = State::default();
        let (mut session, _rx) = connect(&state);

        let replies = process(frame(&["SUBSCRIBE", "a", "b"]), &state, &mut session);

        assert_eq!(replies.len(), 2);
        assert!(session.take_replies().is_empty());
    }

    #[test]
    fn errors_become_replies() {
        let state = State::default();
        let (mut session, _rx) = connect(&state);

        let replies = process(frame(&["NOPE"]), &state, &mut session);

        assert_eq!(
            replies,
            vec![Frame::Error("ERR unknown command 'nope'".to_string())]
        );
    }

    #[test]
    fn monitors_receive_traces_of_other_sessions() {
        let state = State::default();
        let (mut monitor, mut monitor_rx) = connect(&state);
        let (mut client, _rx) = connect(&state);

        process(frame(&["MONITOR"]), &state, &mut monitor);
        assert!(monitor_rx.try_recv().is_err());

        let replies = process(frame(&["SADD", "s", "m"]), &state, &mut client);
        assert_eq!(replies, vec![Frame::Integer(1)]);

        let Frame::Simple(line) = monitor_rx.try_recv().unwrap() else {
            panic!("expected a simple string trace");
        };
        assert!(line.ends_with("[0 127.0.0.1:6380] \"SADD\" \"s\" \"m\""));

        state.clients.disconnect(&monitor.id);
        process(frame(&["SADD", "s", "n"]), &state, &mut client);
        assert!(monitor_rx.try_recv().is_err());
    }

    #[test]
    fn quote_escapes_binary() {
        let mut line = String::new();
        quote(&Bytes::from_static(b"a\x01\\"), &mut line);

        assert_eq!(line, "\"a\\x01\\\\\"");
    }
}
