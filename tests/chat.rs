use std::{net::SocketAddr, time::Duration};

use line_chat::{ChatServer, Config, FederatorHandle};
use tokio::{
    io::{AsyncBufReadExt, AsyncReadExt, AsyncWriteExt, BufReader},
    net::{
        tcp::{OwnedReadHalf, OwnedWriteHalf},
        TcpStream,
    },
    sync::oneshot,
    task::JoinHandle,
    time::timeout,
};

const WAIT: Duration = Duration::from_secs(2);
const PROMPT: &str = "What is your username?: ";

struct TestServer {
    addr: SocketAddr,
    federator: FederatorHandle,
    shutdown: Option<oneshot::Sender<()>>,
    task: JoinHandle<()>,
}

impl TestServer {
    async fn start(max_connections: usize) -> Self {
        let config = Config {
            listen: "127.0.0.1:0".parse().unwrap(),
            max_connections,
            ..Config::default()
        };
        let server = ChatServer::bind(config).await.expect("bind");
        let addr = server.local_addr().expect("local addr");
        let federator = server.federator().clone();

        let (shutdown_tx, shutdown_rx) = oneshot::channel::<()>();
        let task = tokio::spawn(async move {
            server
                .run_until(async move {
                    let _ = shutdown_rx.await;
                })
                .await;
        });

        Self {
            addr,
            federator,
            shutdown: Some(shutdown_tx),
            task,
        }
    }

    async fn stop(mut self) {
        if let Some(tx) = self.shutdown.take() {
            let _ = tx.send(());
        }
        let _ = self.task.await;
    }
}

struct Client {
    reader: BufReader<OwnedReadHalf>,
    writer: OwnedWriteHalf,
}

impl Client {
    async fn connect(addr: SocketAddr) -> Client {
        let stream = TcpStream::connect(addr).await.expect("connect");
        let (reader, writer) = stream.into_split();
        let mut client = Client {
            reader: BufReader::new(reader),
            writer,
        };
        client.expect_prompt().await;
        client
    }

    /// Connect, register `name`, and consume the own join notice
    async fn join(addr: SocketAddr, name: &str) -> Client {
        let mut client = Client::connect(addr).await;
        client.send(name).await;
        assert_eq!(client.line().await, format!("→ {name}"));
        client
    }

    async fn expect_prompt(&mut self) {
        let mut prompt = vec![0u8; PROMPT.len()];
        timeout(WAIT, self.reader.read_exact(&mut prompt))
            .await
            .expect("timed out waiting for prompt")
            .expect("read prompt");
        assert_eq!(String::from_utf8(prompt).unwrap(), PROMPT);
    }

    /// One write per line: the server treats each read as one line
    async fn send(&mut self, line: &str) {
        self.writer
            .write_all(format!("{line}\n").as_bytes())
            .await
            .expect("write");
    }

    async fn line(&mut self) -> String {
        let mut line = String::new();
        let n = timeout(WAIT, self.reader.read_line(&mut line))
            .await
            .expect("timed out waiting for line")
            .expect("read line");
        assert!(n > 0, "connection closed while waiting for a line");
        line.trim_end_matches('\n').to_string()
    }

    /// True once the server has closed the connection
    async fn closed(&mut self) -> bool {
        let mut rest = Vec::new();
        match timeout(WAIT, self.reader.read_to_end(&mut rest)).await {
            Ok(Ok(_)) => rest.is_empty(),
            Ok(Err(_)) => true,
            Err(_) => false,
        }
    }
}

#[tokio::test]
async fn chat_round_trip_reaches_everyone() {
    let server = TestServer::start(10).await;

    let mut alice = Client::join(server.addr, "alice").await;
    let mut bob = Client::join(server.addr, "bob").await;
    assert_eq!(alice.line().await, "→ bob");
    assert_eq!(server.federator.member_count(), 2);

    alice.send("hello").await;
    assert_eq!(alice.line().await, "alice → hello");
    assert_eq!(bob.line().await, "alice → hello");

    bob.send("hi alice").await;
    assert_eq!(alice.line().await, "bob → hi alice");
    assert_eq!(bob.line().await, "bob → hi alice");

    server.stop().await;
}

#[tokio::test]
async fn duplicate_username_is_rejected() {
    let server = TestServer::start(10).await;

    let _alice = Client::join(server.addr, "alice").await;

    let mut imposter = Client::connect(server.addr).await;
    imposter.send("alice").await;
    assert_eq!(imposter.line().await, "Username is already taken, bye.");
    assert!(imposter.closed().await);
    assert_eq!(server.federator.member_count(), 1);

    server.stop().await;
}

#[tokio::test]
async fn blank_username_reprompts() {
    let server = TestServer::start(10).await;

    let mut client = Client::connect(server.addr).await;
    client.send("\r").await;
    assert_eq!(client.line().await, "Invalid username, try again.");
    client.expect_prompt().await;

    client.send("   ").await;
    assert_eq!(client.line().await, "Invalid username, try again.");
    client.expect_prompt().await;

    client.send("carol").await;
    assert_eq!(client.line().await, "→ carol");

    server.stop().await;
}

#[tokio::test]
async fn quit_announces_departure_and_closes() {
    let server = TestServer::start(10).await;

    let mut alice = Client::join(server.addr, "alice").await;
    let mut bob = Client::join(server.addr, "bob").await;
    assert_eq!(alice.line().await, "→ bob");

    alice.send("!quit").await;
    assert_eq!(bob.line().await, "← alice");
    assert_eq!(server.federator.member_count(), 1);
    assert!(alice.closed().await);

    // The name is free again once the departure is processed
    let _again = Client::join(server.addr, "alice").await;
    assert_eq!(bob.line().await, "→ alice");

    server.stop().await;
}

#[tokio::test]
async fn abrupt_disconnect_announces_after_chatting() {
    let server = TestServer::start(10).await;

    let mut alice = Client::join(server.addr, "alice").await;
    let mut bob = Client::join(server.addr, "bob").await;
    assert_eq!(alice.line().await, "→ bob");

    alice.send("brb").await;
    assert_eq!(bob.line().await, "alice → brb");
    drop(alice);

    assert_eq!(bob.line().await, "← alice");

    server.stop().await;
}

#[tokio::test]
async fn connections_over_limit_are_closed() {
    let server = TestServer::start(1).await;

    let _alice = Client::join(server.addr, "alice").await;

    let stream = TcpStream::connect(server.addr).await.expect("connect");
    let (reader, _writer) = stream.into_split();
    let mut reader = BufReader::new(reader);
    let mut received = Vec::new();
    let result = timeout(WAIT, reader.read_to_end(&mut received))
        .await
        .expect("server should close the extra connection");
    assert!(result.is_err() || received.is_empty());

    server.stop().await;
}
