//! Concurrency tests: many simultaneous clients against one server
//!
//! These check the session cap and the consistency of the shared
//! leaderboard and statistics under parallel games.

use assert_approx_eq::assert_approx_eq;
use server::config::GameConfig;
use server::context::ServerContext;
use server::network::Server;
use shared::{decode, encode_line, HintDirection, ServerMessage};
use std::net::SocketAddr;
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::Arc;
use std::time::Duration;
use tokio::io::{AsyncBufReadExt, AsyncWriteExt, BufReader, Lines};
use tokio::net::tcp::OwnedReadHalf;
use tokio::net::TcpStream;
use tokio::sync::{oneshot, Barrier};

async fn start_server(config: GameConfig) -> (SocketAddr, Arc<ServerContext>, oneshot::Sender<()>) {
    let server = Server::new("127.0.0.1:0", config).await.unwrap();
    let addr = server.local_addr().unwrap();
    let context = server.context();
    let (stop_tx, stop_rx) = oneshot::channel::<()>();

    tokio::spawn(server.run_until(async {
        let _ = stop_rx.await;
    }));

    (addr, context, stop_tx)
}

async fn next(lines: &mut Lines<BufReader<OwnedReadHalf>>) -> ServerMessage {
    let line = lines
        .next_line()
        .await
        .unwrap()
        .expect("server closed the connection");
    decode(&line).unwrap()
}

/// Connects, picks `name` and bisects until winning.
///
/// Returns the attempts and score reported in the victory message.
async fn play_full_game(addr: SocketAddr, name: String) -> (u32, u32) {
    let stream = TcpStream::connect(addr).await.unwrap();
    let (read_half, mut writer) = stream.into_split();
    let mut lines = BufReader::new(read_half).lines();

    // stats, leaderboard, prompt
    for _ in 0..3 {
        next(&mut lines).await;
    }
    writer.write_all(encode_line(&name).as_bytes()).await.unwrap();
    assert!(matches!(next(&mut lines).await, ServerMessage::NameAccepted { .. }));
    assert!(matches!(next(&mut lines).await, ServerMessage::GameStart { .. }));

    let (mut low, mut high) = (0i64, 100i64);
    loop {
        let guess = low + (high - low) / 2;
        writer
            .write_all(encode_line(&guess.to_string()).as_bytes())
            .await
            .unwrap();

        match next(&mut lines).await {
            ServerMessage::Hint {
                direction: HintDirection::Grand,
                ..
            } => high = guess - 1,
            ServerMessage::Hint {
                direction: HintDirection::Petit,
                ..
            } => low = guess + 1,
            ServerMessage::Victory {
                attempts, score, ..
            } => return (attempts, score),
            other => panic!("{}: unexpected reply {:?}", name, other),
        }
    }
}

/// Many clients connecting at once never push the session count past the cap
#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn session_cap_holds_under_connection_burst() {
    const CAP: usize = 3;
    const CLIENTS: usize = 12;

    let config = GameConfig {
        max_clients: CAP,
        ..GameConfig::default()
    };
    let (addr, context, _stop) = start_server(config).await;

    let done = Arc::new(AtomicBool::new(false));
    let peak = Arc::new(AtomicUsize::new(0));
    let monitor = {
        let context = Arc::clone(&context);
        let done = Arc::clone(&done);
        let peak = Arc::clone(&peak);
        tokio::spawn(async move {
            while !done.load(Ordering::SeqCst) {
                peak.fetch_max(context.client_counts().active, Ordering::SeqCst);
                tokio::time::sleep(Duration::from_millis(1)).await;
            }
        })
    };

    // Admitted clients keep their connection until every client got its
    // first message, so exactly CAP of them can be admitted.
    let barrier = Arc::new(Barrier::new(CLIENTS));
    let mut handles = Vec::new();
    for _ in 0..CLIENTS {
        let barrier = Arc::clone(&barrier);
        handles.push(tokio::spawn(async move {
            let stream = TcpStream::connect(addr).await.unwrap();
            let mut reader = BufReader::new(stream);
            let mut line = String::new();
            reader.read_line(&mut line).await.unwrap();
            let first = decode(&line).unwrap();

            barrier.wait().await;
            first
        }));
    }

    let mut admitted = 0;
    let mut rejected = 0;
    for handle in handles {
        match handle.await.unwrap() {
            ServerMessage::Stats { .. } => admitted += 1,
            ServerMessage::Error { message } => {
                assert!(message.contains("Server full"));
                rejected += 1;
            }
            other => panic!("Unexpected first message {:?}", other),
        }
    }

    done.store(true, Ordering::SeqCst);
    monitor.await.unwrap();

    assert_eq!(admitted, CAP);
    assert_eq!(rejected, CLIENTS - CAP);
    assert!(peak.load(Ordering::SeqCst) <= CAP);
    assert_eq!(context.client_counts().total_served, CAP as u64);
}

/// Parallel games all land in the statistics
#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn parallel_games_update_stats_consistently() {
    const PLAYERS: usize = 8;

    let (addr, context, _stop) = start_server(GameConfig::default()).await;

    let mut handles = Vec::new();
    for i in 0..PLAYERS {
        let name = format!("Player{}", (b'a' + i as u8) as char);
        handles.push(tokio::spawn(play_full_game(addr, name)));
    }

    let mut attempts = Vec::new();
    for handle in handles {
        attempts.push(handle.await.unwrap().0);
    }

    let stats = context.stats.snapshot().await;
    let total: u32 = attempts.iter().sum();
    assert_eq!(stats.total_games, PLAYERS as u64);
    assert_eq!(stats.total_attempts, total as u64);
    assert_eq!(stats.best_attempts, attempts.iter().copied().min());
    assert_approx_eq!(stats.average_attempts, total as f64 / PLAYERS as f64);
    assert_eq!(context.leaderboard.len().await, PLAYERS);
}

/// With more winners than slots, the leaderboard keeps the best scores
#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn leaderboard_keeps_best_scores_under_contention() {
    const PLAYERS: usize = 10;
    const CAPACITY: usize = 3;

    let config = GameConfig {
        leaderboard_capacity: CAPACITY,
        ..GameConfig::default()
    };
    let (addr, context, _stop) = start_server(config).await;

    let mut handles = Vec::new();
    for i in 0..PLAYERS {
        let name = format!("Racer{}", (b'a' + i as u8) as char);
        handles.push(tokio::spawn(play_full_game(addr, name)));
    }

    let mut scores = Vec::new();
    for handle in handles {
        scores.push(handle.await.unwrap().1);
    }
    scores.sort_unstable_by(|a, b| b.cmp(a));

    let board = context.leaderboard.snapshot().await;
    let kept: Vec<u32> = board.iter().map(|record| record.score).collect();
    assert_eq!(kept, scores[..CAPACITY].to_vec());
}
