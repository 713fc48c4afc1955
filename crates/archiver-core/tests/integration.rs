//! End-to-end tests for archiver-core against an on-disk store.
//!
//! Run with: `cargo test -p archiver-core --test integration`

use std::io::{BufRead, BufReader, Write};
use std::net::TcpListener;
use std::thread;
use std::time::Duration;

use chrono::{DateTime, TimeZone};
use proptest::prelude::*;
use tempfile::TempDir;

use archiver_core::{
    Error, FetchError, FetchWindow, GatewayClient, HistorySource, ManualClock, MockSource,
    RetryConfig, SampleReader, SyncEngine, downsample, range,
};
use archiver_store::{RecentQuery, Store};
use archiver_types::{HistorySample, QueryWindow};

fn sample(timestamp: i64, co2: i64) -> HistorySample {
    HistorySample {
        timestamp,
        temperature: 21.4,
        humidity: 44,
        pressure: 1011.5,
        co2,
    }
}

fn temp_store() -> (TempDir, Store) {
    let dir = TempDir::new().unwrap();
    let store = Store::open(dir.path().join("aranet4.db")).unwrap();
    (dir, store)
}

#[test]
fn sync_skips_sentinel_and_advances_checkpoint() {
    let (_dir, mut store) = temp_store();
    let source = MockSource::new(
        [100, 200, 300, 400, 500]
            .into_iter()
            .zip([-1, 400, 410, 420, 430])
            .map(|(ts, co2)| sample(ts, co2))
            .collect(),
    );
    let clock = ManualClock::at_timestamp(10_000);

    let report = SyncEngine::new(&mut store, &source, &clock)
        .sync("office", "AA:BB:CC:DD:EE:FF", 3)
        .unwrap();

    assert_eq!(report.fetched, 5);
    assert_eq!(report.filtered, 1);
    assert_eq!(report.inserted, 4);
    assert_eq!(store.count(Some("office")).unwrap(), 4);
    assert_eq!(store.latest_timestamp("office").unwrap(), Some(500));
    assert_eq!(store.oldest_timestamp("office").unwrap(), Some(200));
}

#[test]
fn repeated_sync_is_idempotent() {
    let (_dir, mut store) = temp_store();
    let source = MockSource::new((1..=20).map(|i| sample(i * 300, 500 + i)).collect());
    source.ignore_window(true);
    let clock = ManualClock::at_timestamp(100_000);

    for _ in 0..3 {
        SyncEngine::new(&mut store, &source, &clock)
            .sync("office", "AA:BB", 1)
            .unwrap();
    }

    assert_eq!(store.count(None).unwrap(), 20);
    let rows = store.recent(&RecentQuery::new().oldest_first()).unwrap();
    assert!(rows.windows(2).all(|w| w[0].timestamp < w[1].timestamp));
}

#[test]
fn exhausted_retries_leave_store_untouched() {
    let (_dir, mut store) = temp_store();
    let clock = ManualClock::at_timestamp(1_000);

    let seed = MockSource::new(vec![sample(100, 500)]);
    SyncEngine::new(&mut store, &seed, &clock)
        .sync("office", "AA:BB", 1)
        .unwrap();

    let source = MockSource::failing();
    let err = SyncEngine::new(&mut store, &source, &clock)
        .retry(RetryConfig::immediate(5))
        .sync("office", "AA:BB", 2)
        .unwrap_err();

    assert!(matches!(err, Error::FetchFailed { attempts: 2, .. }));
    assert_eq!(source.call_count(), 2);
    assert_eq!(store.count(None).unwrap(), 1);
    assert_eq!(store.latest_timestamp("office").unwrap(), Some(100));
}

#[test]
fn sync_then_read_window() {
    let (_dir, mut store) = temp_store();
    let source = MockSource::new((1..=5).map(|i| sample(i * 100, 400)).collect());
    let clock = ManualClock::at_timestamp(1_000);
    SyncEngine::new(&mut store, &source, &clock)
        .sync("office", "AA:BB", 1)
        .unwrap();

    let window = QueryWindow::new(100, 500).unwrap();
    let readout = SampleReader::new(&store)
        .read(window, ["temperature", "co2"], 2000)
        .unwrap();
    let stamps: Vec<_> = readout.rows.iter().map(|r| r.timestamp).collect();
    assert_eq!(stamps, vec![100, 200, 300, 400]);
    assert_eq!(readout.rows[0].humidity, None);
}

#[test]
fn default_window_from_utc_today() {
    let now = DateTime::parse_from_rfc3339("2024-06-10T08:00:00Z")
        .unwrap()
        .to_utc();
    let window = range::resolve(None, None, 3, "UTC", now).unwrap();
    assert_eq!(window.to_string(), "2024-06-07 00:00:00 UTC and 2024-06-11 00:00:00 UTC");
}

#[test]
fn store_failure_is_not_retried() {
    let dir = TempDir::new().unwrap();
    let err = Store::open(dir.path().join("missing").join("aranet4.db")).unwrap_err();
    let err: Error = err.into();
    assert!(matches!(err, Error::Store(ref e) if e.is_unavailable()));
}

/// Serve one canned HTTP response and hand back the request line.
fn one_shot_server(status: &'static str, body: &'static str) -> (String, thread::JoinHandle<String>) {
    let listener = TcpListener::bind("127.0.0.1:0").unwrap();
    let addr = listener.local_addr().unwrap();
    let handle = thread::spawn(move || {
        let (mut stream, _) = listener.accept().unwrap();
        let mut reader = BufReader::new(stream.try_clone().unwrap());
        let mut request_line = String::new();
        reader.read_line(&mut request_line).unwrap();
        loop {
            let mut header = String::new();
            reader.read_line(&mut header).unwrap();
            if header == "\r\n" || header.is_empty() {
                break;
            }
        }
        write!(
            stream,
            "HTTP/1.1 {status}\r\nContent-Type: application/json\r\nContent-Length: {}\r\nConnection: close\r\n\r\n{body}",
            body.len()
        )
        .unwrap();
        request_line
    });
    (format!("http://{addr}"), handle)
}

#[test]
fn gateway_fetches_and_decodes_history() {
    let (base, server) = one_shot_server(
        "200 OK",
        r#"{"data":[
            {"timestamp":"2024-06-10T10:00:00Z","co2":612,"temperature":22.5,"pressure":1009.8,"humidity":47},
            {"timestamp":"2024-06-10T10:05:00Z","co2":-1,"temperature":22.5,"pressure":1009.8,"humidity":47}
        ],"pagination":{"count":2,"offset":0,"limit":100,"has_more":false}}"#,
    );
    let client = GatewayClient::new(&base, Duration::from_secs(5)).unwrap();
    let tz = chrono_tz::UTC;
    let window = FetchWindow {
        start: Some(tz.timestamp_opt(1_718_000_000, 0).unwrap()),
        end: tz.timestamp_opt(1_718_100_000, 0).unwrap(),
    };

    let samples = client.fetch_history("AA:BB:CC:DD:EE:FF", &window).unwrap();
    let request_line = server.join().unwrap();

    assert!(request_line.starts_with(
        "GET /api/devices/AA:BB:CC:DD:EE:FF/history?since=1718000000&until=1718100000 "
    ));
    assert_eq!(samples.len(), 2);
    assert_eq!(samples[0].timestamp, 1_718_013_600);
    assert_eq!(samples[0].co2, 612);
    assert!(samples[1].is_sentinel());
}

#[test]
fn gateway_error_status_is_reported() {
    let (base, server) = one_shot_server("404 Not Found", r#"{"error":"unknown device"}"#);
    let client = GatewayClient::new(&base, Duration::from_secs(5)).unwrap();
    let window = FetchWindow {
        start: None,
        end: chrono_tz::UTC.timestamp_opt(0, 0).unwrap(),
    };

    let err = client.fetch_history("nope", &window).unwrap_err();
    let request_line = server.join().unwrap();

    assert!(request_line.starts_with("GET /api/devices/nope/history?until=0 "));
    assert!(matches!(err, FetchError::Api { status: 404, .. }));
}

#[test]
fn unreachable_gateway_fails_sync() {
    // Bind then drop to get a port nobody listens on.
    let port = TcpListener::bind("127.0.0.1:0")
        .unwrap()
        .local_addr()
        .unwrap()
        .port();
    let client = GatewayClient::new(&format!("http://127.0.0.1:{port}"), Duration::from_secs(2)).unwrap();
    let (_dir, mut store) = temp_store();
    let clock = ManualClock::at_timestamp(1_000);

    let err = SyncEngine::new(&mut store, &client, &clock)
        .sync("office", "AA:BB", 2)
        .unwrap_err();

    match err {
        Error::FetchFailed { attempts, last } => {
            assert_eq!(attempts, 2);
            assert!(matches!(last, FetchError::Unreachable { .. }));
        }
        other => panic!("unexpected error: {other}"),
    }
    assert_eq!(store.count(None).unwrap(), 0);
}

proptest! {
    #[test]
    fn downsample_respects_budget(len in 0usize..5_000, max in 0usize..3_000) {
        let (rows, passes) = downsample((0..len).collect::<Vec<_>>(), max);
        prop_assert!(rows.len() <= max.max(1) || len == 0);
        if len <= max.max(1) {
            prop_assert_eq!(passes, 0);
            prop_assert_eq!(rows.len(), len);
        }
    }

    #[test]
    fn downsample_keeps_stride_and_order(len in 1usize..5_000, max in 1usize..3_000) {
        let (rows, passes) = downsample((0..len).collect::<Vec<_>>(), max);
        let stride = 1usize << passes;
        prop_assert_eq!(rows[0], 0);
        for (i, value) in rows.iter().enumerate() {
            prop_assert_eq!(*value, i * stride);
        }
    }

    #[test]
    fn downsample_does_not_overshrink(len in 1usize..5_000, max in 1usize..3_000) {
        let (rows, passes) = downsample((0..len).collect::<Vec<_>>(), max);
        if passes > 0 {
            // One fewer pass would not have fit.
            let previous = len.div_ceil(1usize << (passes - 1));
            prop_assert!(previous > max);
            prop_assert!(!rows.is_empty());
        }
    }

    #[test]
    fn resolved_window_spans_span_plus_one_days(span in 0u32..400, secs in 0i64..4_000_000_000) {
        let now = DateTime::from_timestamp(secs, 0).unwrap();
        let window = range::resolve(None, None, span, "UTC", now).unwrap();
        prop_assert_eq!(window.end() - window.start(), (i64::from(span) + 1) * 86_400);
        prop_assert!(window.contains(secs));
        prop_assert_eq!(window.end() % 86_400, 0);
    }
}
