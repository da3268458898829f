//! `RedisStore` against a mock server speaking just enough RESP.
//!
//! The mock counts accepted TCP connections so the tests can check that
//! commands share one connection.

use std::io::{Read, Write};
use std::net::{SocketAddr, TcpListener, TcpStream};
use std::sync::Arc;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::time::Duration;

use infobridge_store::{RedisStore, StoreConnection};

const REPORT: &str = "# Replication\r\nrole:master\r\n# Keyspace\r\ndb0:keys=3,expires=1\r\n";

struct MockRedisServer {
    addr: SocketAddr,
    connections: Arc<AtomicUsize>,
    commands: Arc<std::sync::Mutex<Vec<Vec<String>>>>,
}

impl MockRedisServer {
    fn start() -> Self {
        let listener = TcpListener::bind("127.0.0.1:0").expect("bind to random port");
        let addr = listener.local_addr().expect("local addr");
        let connections = Arc::new(AtomicUsize::new(0));
        let commands = Arc::new(std::sync::Mutex::new(Vec::new()));

        let accepted = Arc::clone(&connections);
        let seen = Arc::clone(&commands);
        std::thread::spawn(move || {
            while let Ok((mut stream, _)) = listener.accept() {
                accepted.fetch_add(1, Ordering::SeqCst);
                let seen = Arc::clone(&seen);
                std::thread::spawn(move || Self::handle_connection(&mut stream, &seen));
            }
        });

        Self {
            addr,
            connections,
            commands,
        }
    }

    fn url(&self) -> String {
        format!("redis://{}", self.addr)
    }

    fn connections(&self) -> usize {
        self.connections.load(Ordering::SeqCst)
    }

    fn commands_named(&self, name: &str) -> Vec<Vec<String>> {
        self.commands
            .lock()
            .unwrap()
            .iter()
            .filter(|c| c.first().is_some_and(|n| n.eq_ignore_ascii_case(name)))
            .cloned()
            .collect()
    }

    fn handle_connection(stream: &mut TcpStream, seen: &std::sync::Mutex<Vec<Vec<String>>>) {
        let mut pending = Vec::new();
        let mut buf = [0u8; 4096];
        loop {
            match stream.read(&mut buf) {
                Ok(0) | Err(_) => break,
                Ok(n) => pending.extend_from_slice(&buf[..n]),
            }

            while let Some((command, used)) = parse_command(&pending) {
                pending.drain(..used);
                let reply = reply_to(&command);
                seen.lock().unwrap().push(command);
                if stream.write_all(reply.as_bytes()).is_err() {
                    return;
                }
            }
        }
    }
}

fn reply_to(command: &[String]) -> String {
    let name = command.first().map(|c| c.to_ascii_uppercase()).unwrap_or_default();
    match name.as_str() {
        "INFO" => format!("${}\r\n{REPORT}\r\n", REPORT.len()),
        "CLUSTER" => "-ERR This instance has cluster support disabled\r\n".to_string(),
        "PING" => "+PONG\r\n".to_string(),
        _ => "+OK\r\n".to_string(),
    }
}

/// One complete `*N` array of bulk strings, plus the bytes it used.
fn parse_command(buf: &[u8]) -> Option<(Vec<String>, usize)> {
    let (header, mut pos) = read_line(buf, 0)?;
    let count: usize = header.strip_prefix('*')?.parse().ok()?;

    let mut args = Vec::with_capacity(count);
    for _ in 0..count {
        let (len_line, next) = read_line(buf, pos)?;
        let len: usize = len_line.strip_prefix('$')?.parse().ok()?;
        let end = next + len;
        if buf.len() < end + 2 {
            return None;
        }
        args.push(String::from_utf8_lossy(&buf[next..end]).into_owned());
        pos = end + 2;
    }
    Some((args, pos))
}

fn read_line(buf: &[u8], from: usize) -> Option<(String, usize)> {
    let rest = buf.get(from..)?;
    let end = rest.windows(2).position(|w| w == b"\r\n")?;
    let line = String::from_utf8_lossy(&rest[..end]).into_owned();
    Some((line, from + end + 2))
}

#[tokio::test]
async fn info_returns_report() {
    let server = MockRedisServer::start();
    let store = RedisStore::open(&server.url())
        .unwrap()
        .with_timeout(Some(Duration::from_secs(5)));

    let report = store.info(Some("all")).await.unwrap();
    assert_eq!(report, REPORT);

    let infos = server.commands_named("INFO");
    assert_eq!(infos, vec![vec!["INFO".to_string(), "all".to_string()]]);
}

#[tokio::test]
async fn commands_share_one_connection() {
    let server = MockRedisServer::start();
    let store = RedisStore::open(&server.url())
        .unwrap()
        .with_timeout(Some(Duration::from_secs(5)));

    for _ in 0..3 {
        store.info(Some("all")).await.unwrap();
        store.info(None).await.unwrap();
        assert!(store.cluster_info().await.is_err());
    }

    assert_eq!(server.commands_named("INFO").len(), 6);
    assert_eq!(server.commands_named("CLUSTER").len(), 3);
    assert_eq!(server.connections(), 1);
}

#[tokio::test]
async fn credentials_with_reserved_characters_reach_the_server() {
    let server = MockRedisServer::start();
    let store = RedisStore::open_as(&server.url(), Some("exporter"), Some("pa/ss#?%41"))
        .unwrap()
        .with_timeout(Some(Duration::from_secs(5)));

    store.info(None).await.unwrap();

    let auth = server.commands_named("AUTH");
    assert_eq!(
        auth,
        vec![vec![
            "AUTH".to_string(),
            "exporter".to_string(),
            "pa/ss#?%41".to_string()
        ]]
    );
}
