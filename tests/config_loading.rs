//! Loading link configuration and recordings from disk.

use std::io::Write;
use std::path::PathBuf;
use std::time::Duration;
use tecs::{LinkConfig, NodePair, ReplaySource, SampleSource, TelemetryError};

fn temp_file(name: &str, contents: &str) -> PathBuf {
    let path = std::env::temp_dir().join(format!("tecs-{}-{}", std::process::id(), name));
    let mut file = std::fs::File::create(&path).expect("create temp file");
    file.write_all(contents.as_bytes()).expect("write temp file");
    path
}

#[test]
fn full_config_file_loads() {
    let path = temp_file(
        "full.yaml",
        "nodes:\n  flight: 11\n  ground: 12\n\
         test_pattern: PING\n\
         tx_interval_ms: 200\n\
         ground_endpoint: 10.0.0.2:5000\n\
         flight_port: 6000\n\
         receive_timeout_ms: 750\n\
         retry:\n  max_attempts: 3\n  initial_backoff_ms: 10\n  max_backoff_ms: 40\n",
    );
    let config = LinkConfig::load(&path).unwrap();
    std::fs::remove_file(&path).ok();

    assert_eq!(config.nodes, NodePair::new(11, 12));
    assert_eq!(config.test_pattern, "PING");
    assert_eq!(config.tx_interval(), Duration::from_millis(200));
    assert_eq!(config.ground_endpoint.port(), 5000);
    assert_eq!(config.flight_port, 6000);
    assert_eq!(config.receive_timeout(), Duration::from_millis(750));
    assert_eq!(config.retry.backoff(3), Duration::from_millis(40));
}

#[test]
fn invalid_file_names_its_path() {
    let path = temp_file("bad.yaml", "nodes: { flight: 4, ground: 4 }\n");
    let err = LinkConfig::load(&path).unwrap_err();
    std::fs::remove_file(&path).ok();

    match err {
        TelemetryError::Config { path: reported, details } => {
            assert_eq!(reported, path);
            assert!(details.contains("must differ"));
        }
        other => panic!("expected Config error, got {:?}", other),
    }
}

#[tokio::test]
async fn recording_replays_in_order() {
    let path = temp_file(
        "flight.yaml",
        "- { flight_state: 1, altitude: 5.0 }\n- { flight_state: 2, altitude: 60.0 }\n",
    );
    let mut source = ReplaySource::open(&path).unwrap();
    std::fs::remove_file(&path).ok();

    assert_eq!(source.next_sample().await.unwrap().unwrap().altitude, 5.0);
    assert_eq!(source.next_sample().await.unwrap().unwrap().flight_state, 2);
    assert!(source.next_sample().await.unwrap().is_none());
}
