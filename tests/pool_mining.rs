//! End-to-end mining against a local pool stub
//!
//! The stub speaks the pool's line protocol over a real TCP socket:
//! - version handshake
//! - MOTD and job requests
//! - result submission answered with a verdict

use duco_miner::miner::worker::REPORTING_WORKER;
use duco_miner::network::pool::{Connector, PoolProtocol};
use duco_miner::{
    AlgorithmType, Config, DifficultyTier, Endpoint, MinerEvent, MiningContext, SharedStats,
    TcpConnector, Worker, WorkerSettings,
};
use std::io::{Read, Write};
use std::net::{TcpListener, TcpStream};
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};
use std::thread;
use std::time::Duration;

const LAST_HASH: &str = "0000a1b2c3";
const WINNING_NONCE: u64 = 42;

/// Reads one request; requests carry no line terminator
fn read_request(stream: &mut TcpStream) -> Option<String> {
    let mut buf = [0u8; 1024];
    match stream.read(&mut buf) {
        Ok(0) | Err(_) => None,
        Ok(n) => Some(String::from_utf8_lossy(&buf[..n]).into_owned()),
    }
}

/// Serves one session: answers MOTD and JOB requests, replies `verdict` to
/// the first submission, then clears `active` and returns the requests seen
fn serve_one_session(
    listener: TcpListener,
    verdict: &'static str,
    active: Arc<AtomicBool>,
) -> thread::JoinHandle<Vec<String>> {
    thread::spawn(move || {
        let (mut stream, _) = listener.accept().unwrap();
        stream.write_all(b"2.7\n").unwrap();

        let mut requests = Vec::new();
        while let Some(request) = read_request(&mut stream) {
            requests.push(request.clone());
            if request == "MOTD" {
                stream.write_all(b"Welcome to the test pool\n").unwrap();
            } else if request.starts_with("JOB") {
                let target = AlgorithmType::DucoS1.digest_hex(LAST_HASH, WINNING_NONCE);
                let job = format!("{},{},1\n", LAST_HASH, target);
                stream.write_all(job.as_bytes()).unwrap();
            } else {
                active.store(false, Ordering::SeqCst);
                stream.write_all(format!("{},Share accepted\n", verdict).as_bytes()).unwrap();
                break;
            }
        }
        requests
    })
}

fn context(endpoint: Endpoint, workers: usize) -> (MiningContext<TcpConnector>, crossbeam_channel::Receiver<MinerEvent>) {
    let (events, receiver) = crossbeam_channel::unbounded();
    let mut config = Config::with_username("revox");
    config.intensity = 100;
    config.start_diff = DifficultyTier::Low;

    let context = MiningContext {
        settings: WorkerSettings::from(&config),
        endpoint,
        connector: TcpConnector::new(Duration::from_secs(5)),
        stats: Arc::new(SharedStats::new(workers)),
        events,
        active: Arc::new(AtomicBool::new(true)),
    };
    (context, receiver)
}

fn local_pool() -> (TcpListener, Endpoint) {
    let listener = TcpListener::bind("127.0.0.1:0").unwrap();
    let port = listener.local_addr().unwrap().port();
    let endpoint = format!("127.0.0.1:{}", port).parse().unwrap();
    (listener, endpoint)
}

#[test]
fn worker_mines_one_accepted_share() {
    let (listener, endpoint) = local_pool();
    let (context, events) = context(endpoint, 1);
    let context = Arc::new(context);
    let server = serve_one_session(listener, "GOOD", Arc::clone(&context.active));

    Worker::new(REPORTING_WORKER, Arc::clone(&context)).run();
    let requests = server.join().unwrap();

    assert_eq!(requests[0], "MOTD");
    assert_eq!(requests[1], "JOB,revox,LOW");

    let fields: Vec<&str> = requests[2].split(',').collect();
    assert_eq!(fields.len(), 4);
    assert_eq!(fields[0], WINNING_NONCE.to_string());
    assert!(fields[1].parse::<f64>().unwrap() > 0.0);
    assert_eq!(fields[2], "Official PC Miner (DUCO-S1) v2.7");
    assert_eq!(fields[3], "None");

    let stats = context.stats.get_stats();
    assert_eq!(stats.shares_accepted, 1);
    assert_eq!(stats.shares_rejected, 0);

    let events: Vec<MinerEvent> = events.try_iter().collect();
    assert!(matches!(
        &events[0],
        MinerEvent::Connected { worker: 0, server_version, outdated: false } if server_version == "2.7"
    ));
    assert!(events.contains(&MinerEvent::Motd {
        worker: 0,
        message: "Welcome to the test pool".into(),
    }));
    match events.iter().find(|e| matches!(e, MinerEvent::ShareAccepted(_))) {
        Some(MinerEvent::ShareAccepted(share)) => {
            assert_eq!((share.accepted, share.rejected), (1, 0));
            assert_eq!(share.difficulty, 1);
        }
        other => panic!("expected an accepted share, got {:?}", other),
    }
}

#[test]
fn block_verdict_is_counted_as_rejected() {
    let (listener, endpoint) = local_pool();
    let (context, events) = context(endpoint, 2);
    let context = Arc::new(context);
    let server = serve_one_session(listener, "BLOCK", Arc::clone(&context.active));

    Worker::new(1, Arc::clone(&context)).run();
    let requests = server.join().unwrap();

    assert_eq!(requests[0], "JOB,revox,LOW");
    assert_eq!(context.stats.shares.rejected(), 1);
    assert_eq!(context.stats.shares.accepted(), 0);
    assert!(events.try_iter().any(|e| e.name() == "block_found"));
}

#[test]
fn connector_reads_handshake_without_eating_the_next_line() {
    let (listener, endpoint) = local_pool();
    let server = thread::spawn(move || {
        let (mut stream, _) = listener.accept().unwrap();
        stream.write_all(b"2.7\nWelcome\n").unwrap();
        read_request(&mut stream)
    });

    let mut session = TcpConnector::new(Duration::from_secs(5))
        .connect(&endpoint)
        .unwrap();
    assert_eq!(session.server_version(), "2.7");
    assert_eq!(session.request_motd().unwrap(), "Welcome");
    assert_eq!(server.join().unwrap().as_deref(), Some("MOTD"));
}

#[test]
fn handshake_newline_in_a_later_segment_keeps_the_session() {
    let (listener, endpoint) = local_pool();
    let server = thread::spawn(move || {
        let (mut stream, _) = listener.accept().unwrap();
        stream.write_all(b"2.7").unwrap();
        thread::sleep(Duration::from_millis(100));
        stream.write_all(b"\n").unwrap();
        let request = read_request(&mut stream);
        stream.write_all(b"abc,ffff,7\n").unwrap();
        request
    });

    let mut session = TcpConnector::new(Duration::from_secs(5))
        .connect(&endpoint)
        .unwrap();
    assert_eq!(session.server_version(), "2.7");
    thread::sleep(Duration::from_millis(200));

    let job = session
        .request_job("revox", DifficultyTier::Net, AlgorithmType::DucoS1)
        .unwrap();
    assert_eq!(job.difficulty, 7);
    assert_eq!(server.join().unwrap().as_deref(), Some("JOB,revox,NET"));
}

#[test]
fn unreachable_pool_is_a_connection_error() {
    let (listener, endpoint) = local_pool();
    drop(listener);

    let err = TcpConnector::new(Duration::from_secs(1))
        .connect(&endpoint)
        .err()
        .unwrap();
    assert!(err.is_connection_failure());
}
