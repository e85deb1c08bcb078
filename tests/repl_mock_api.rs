//! Drives the command shell against a canned local rate API, covering
//! the fetching stages the unit tests leave out: instr -> prune ->
//! rates -> gload -> gsearch -> eval.

use std::time::Duration;

use tokio::io::{AsyncReadExt, AsyncWriteExt};
use tokio::net::TcpListener;

use gyre::config::Config;
use gyre::repl::Session;

const INSTRUMENTS_BODY: &str = r#"{"instruments":[
    {"instrument":"A_B","displayName":"A/B"},
    {"instrument":"B_C","displayName":"B/C"},
    {"instrument":"C_A","displayName":"C/A"},
    {"instrument":"D_E","displayName":"D/E"}
]}"#;

const PRICES_BODY: &str = r#"{"prices":[
    {"instrument":"A_B","bid":0.5,"ask":0.5},
    {"instrument":"B_C","bid":0.5,"ask":0.5},
    {"instrument":"C_A","bid":0.5,"ask":0.5}
]}"#;

/// Serve canned JSON on an ephemeral port, one response per connection.
async fn spawn_mock_api() -> String {
    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();

    tokio::spawn(async move {
        loop {
            let Ok((mut sock, _)) = listener.accept().await else {
                break;
            };
            tokio::spawn(async move {
                let mut buf = vec![0u8; 8192];
                let mut read = 0;
                loop {
                    match sock.read(&mut buf[read..]).await {
                        Ok(0) | Err(_) => break,
                        Ok(n) => read += n,
                    }
                    if buf[..read].windows(4).any(|w| w == b"\r\n\r\n") || read == buf.len() {
                        break;
                    }
                }
                let request = String::from_utf8_lossy(&buf[..read]);
                let (status, body) = if request.starts_with("GET /v1/instruments") {
                    ("200 OK", INSTRUMENTS_BODY)
                } else if request.starts_with("GET /v1/prices") {
                    ("200 OK", PRICES_BODY)
                } else {
                    ("404 Not Found", "{}")
                };
                let response = format!(
                    "HTTP/1.1 {status}\r\nContent-Type: application/json\r\n\
                     Content-Length: {}\r\nConnection: close\r\n\r\n{body}",
                    body.len()
                );
                let _ = sock.write_all(response.as_bytes()).await;
                let _ = sock.shutdown().await;
            });
        }
    });

    format!("http://{addr}")
}

#[tokio::test]
async fn test_full_pipeline_against_mock_api() {
    let api_url = spawn_mock_api().await;
    let mut session = Session::new(Config {
        api_url,
        http_timeout: Duration::from_secs(5),
    });

    assert!(session.dispatch("instr").await.unwrap().is_none());
    assert_eq!(
        session.dispatch("getvar instr").await.unwrap().unwrap(),
        "A_B B_C C_A D_E"
    );

    assert!(session.dispatch("prune").await.unwrap().is_none());
    assert_eq!(
        session.dispatch("getvar pruned").await.unwrap().unwrap(),
        "A_B B_C C_A"
    );

    assert!(session.dispatch("rates").await.unwrap().is_none());
    assert_eq!(
        session.dispatch("getvar ratelist").await.unwrap().unwrap(),
        "(A_B, 0.5, 0.5) (B_C, 0.5, 0.5) (C_A, 0.5, 0.5)"
    );

    assert!(session.dispatch("gload").await.unwrap().is_none());
    assert!(session.dispatch("gsearch").await.unwrap().is_none());
    assert_eq!(
        session.dispatch("getvar path").await.unwrap().unwrap(),
        "A->C->B->A"
    );

    let lrate: f64 = session
        .dispatch("getvar lrate")
        .await
        .unwrap()
        .unwrap()
        .parse()
        .unwrap();
    assert!((lrate - 3.0 * 0.5f64.ln()).abs() < 1e-9);

    let out = session.dispatch("eval 100").await.unwrap().unwrap();
    let nums: Vec<f64> = out
        .split(['[', ']', ',', ' '])
        .filter(|t| !t.is_empty())
        .map(|t| t.parse().unwrap())
        .collect();
    assert_eq!(nums.len(), 2);
    assert!((nums[0] - 800.0).abs() < 1e-6);
    assert!((nums[1] - 700.0).abs() < 1e-6);

    assert_eq!(
        session.dispatch("getvar I_isset").await.unwrap().unwrap(),
        "I P R G X"
    );
}

#[tokio::test]
async fn test_fetch_failure_leaves_session_usable() {
    let mut session = Session::new(Config {
        // Nothing listens here; the fetch must fail cleanly.
        api_url: "http://127.0.0.1:9".to_string(),
        http_timeout: Duration::from_millis(300),
    });

    assert!(session.dispatch("instr").await.is_err());
    assert_eq!(
        session.dispatch("getvar I_isset").await.unwrap().unwrap(),
        "- - - - -"
    );
}
