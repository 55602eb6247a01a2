//! Integration tests for influxdb-inflow.
//!
//! These tests require a running InfluxDB 1.x instance.
//! Start one with: `docker run -d -p 8086:8086 influxdb:1.8`
//!
//! Run tests with: `cargo test --test integration`

use std::time::Duration;

use influxdb_inflow::{Client, Database, Error, Point, Precision};

// Test configuration
const INFLUXDB_HOST: &str = "localhost";
const INFLUXDB_PORT: u16 = 8086;

/// Helper to check if InfluxDB is available
async fn influxdb_available() -> bool {
    let client = reqwest::Client::new();
    client
        .get(format!("http://{}:{}/ping", INFLUXDB_HOST, INFLUXDB_PORT))
        .timeout(Duration::from_secs(2))
        .send()
        .await
        .map(|r| r.status().is_success())
        .unwrap_or(false)
}

/// Helper to create a fresh database with a unique name
async fn fresh_database(name: &str) -> Database {
    let db = Client::new(INFLUXDB_HOST, INFLUXDB_PORT).select_db(name);
    db.drop_database().await.unwrap();
    db.create().await.unwrap();
    db
}

/// Generate N points one second apart
fn generate_points(measurement: &str, count: usize) -> Vec<Point> {
    let base_ts = 1_700_000_000i64; // 2023-11-14
    (0..count)
        .map(|i| {
            Point::builder(measurement)
                .tag("host", format!("server{}", i % 10))
                .tag("region", "us-east")
                .field("value", (i % 100) as f64 + 0.5)
                .field("seq", i as i64)
                .time(base_ts + i as i64, Precision::Seconds)
                .build()
                .unwrap()
        })
        .collect()
}

// ============================================================================
// Basic Integration Tests
// ============================================================================

#[tokio::test]
async fn test_create_and_exists() {
    if !influxdb_available().await {
        eprintln!("Skipping test: InfluxDB not available");
        return;
    }

    let db = fresh_database("inflow_it_create").await;
    assert!(db.exists().await.unwrap());

    db.drop_database().await.unwrap();
    assert!(!db.exists().await.unwrap());
}

#[tokio::test]
async fn test_write_and_query_builder() {
    if !influxdb_available().await {
        eprintln!("Skipping test: InfluxDB not available");
        return;
    }

    let db = fresh_database("inflow_it_write").await;
    db.write_points(&generate_points("test_metric", 100)).await.unwrap();

    let values = db
        .query_builder()
        .select("seq")
        .from("test_metric")
        .where_clause("region = 'us-east'")
        .limit(2)
        .query_result()
        .await
        .unwrap()
        .values_as_strings();

    // time + seq for two rows
    assert_eq!(values.len(), 4, "got {:?}", values);
    assert_eq!(values[1], "0");
    assert_eq!(values[3], "1");
    assert_eq!(
        db.client().last_query().as_deref(),
        Some("SELECT seq FROM test_metric WHERE region = 'us-east' LIMIT 2")
    );
}

#[tokio::test]
async fn test_empty_result() {
    if !influxdb_available().await {
        eprintln!("Skipping test: InfluxDB not available");
        return;
    }

    let db = fresh_database("inflow_it_empty").await;
    let result = db.query("SELECT * FROM nonexistent").await.unwrap();
    assert!(result.is_empty());
    assert!(result.values_as_strings().is_empty());
}

#[tokio::test]
async fn test_group_by_tag() {
    if !influxdb_available().await {
        eprintln!("Skipping test: InfluxDB not available");
        return;
    }

    let db = fresh_database("inflow_it_group").await;
    db.write_points(&generate_points("grouped", 50)).await.unwrap();

    let result = db
        .query_builder()
        .select("count(seq)")
        .from("grouped")
        .group_by("host")
        .query_result()
        .await
        .unwrap();

    let counts: i64 = result
        .records()
        .iter()
        .filter_map(|r| r.get_long("count"))
        .sum();
    assert_eq!(result.series().count(), 10);
    assert_eq!(counts, 50);
}

#[tokio::test]
async fn test_malformed_query_is_database_error() {
    if !influxdb_available().await {
        eprintln!("Skipping test: InfluxDB not available");
        return;
    }

    let db = fresh_database("inflow_it_malformed").await;
    let err = db.query("SELECT FROM WHERE").await.unwrap_err();
    assert!(matches!(err, Error::Database { .. }), "got {:?}", err);
}

#[tokio::test]
async fn test_from_uri() {
    if !influxdb_available().await {
        eprintln!("Skipping test: InfluxDB not available");
        return;
    }

    let db = Database::from_uri(&format!(
        "http://{}:{}/inflow_it_uri",
        INFLUXDB_HOST, INFLUXDB_PORT
    ))
    .unwrap();
    db.create().await.unwrap();
    let point = Point::builder("uri_metric").field("value", 0.85).build().unwrap();
    db.write_point(&point).await.unwrap();

    let result = db.query("SELECT value FROM uri_metric").await.unwrap();
    assert_eq!(result.records()[0].get_double("value"), Some(0.85));
    db.drop_database().await.unwrap();
}
