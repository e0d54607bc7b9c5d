//! Integration tests for verification and exploration over an ingested database

use olist_ingest::config::{IngestConfig, VerifyConfig};
use olist_ingest::explore::Explorer;
use olist_ingest::verify::{CheckStatus, ReferentialCompleteness};
use olist_ingest::{Database, IngestionPipeline, LoadManifest, TableRef, Verifier};
use std::fs;
use std::path::{Path, PathBuf};
use tempfile::TempDir;

/// Write minimal orders / order_items extracts
///
/// `orders` holds `order_count` distinct orders; `order_items` references the
/// first `with_items` of them.
fn write_order_extracts(dir: &Path, order_count: usize, with_items: usize) {
    let mut orders = String::from("order_id,customer_id,order_status,order_purchase_timestamp\n");
    for i in 0..order_count {
        orders.push_str(&format!(
            "order_{i:03},customer_{i:03},delivered,2017-0{}-1{} 09:30:00\n",
            i % 9 + 1,
            i % 10
        ));
    }
    fs::write(dir.join("olist_orders_dataset.csv"), orders).unwrap();

    let mut items = String::from("order_id,order_item_id,price\n");
    for i in 0..with_items {
        // Two line items per order
        items.push_str(&format!("order_{i:03},1,10.5\norder_{i:03},2,3.25\n"));
    }
    fs::write(dir.join("olist_order_items_dataset.csv"), items).unwrap();
}

fn ingest(order_count: usize, with_items: usize) -> (TempDir, PathBuf) {
    let temp_dir = TempDir::new().unwrap();
    let source_dir = temp_dir.path().join("raw");
    fs::create_dir_all(&source_dir).unwrap();
    write_order_extracts(&source_dir, order_count, with_items);

    let db_path = temp_dir.path().join("olist.db");
    let config = IngestConfig::default()
        .with_db_path(&db_path)
        .with_source_dir(&source_dir)
        .with_calendar_years(2017, 2018)
        .without_progress();

    let summary = IngestionPipeline::new(config).run().unwrap();
    // Seven of the nine Olist extracts are absent
    assert_eq!(summary.load_report.skipped.len(), 7);
    assert_eq!(summary.tables_in("raw").count(), 2);

    (temp_dir, db_path)
}

#[test]
fn test_referential_completeness_below_full_is_informational() {
    let (_temp_dir, db_path) = ingest(10, 8);

    let report = Verifier::new(VerifyConfig::default().with_db_path(&db_path))
        .run()
        .unwrap();

    assert_eq!(
        report.completeness,
        Some(ReferentialCompleteness {
            parent_keys: 10,
            child_keys: 8,
        })
    );
    assert_eq!(report.completeness.unwrap().ratio_percent(), Some(80.0));

    let check = report.check("orders with order_items").unwrap();
    assert_eq!(check.status, CheckStatus::Info);
    assert!(check.detail.starts_with("80.0%"));

    // Everything else is healthy
    assert!(report.all_passed(), "unexpected warnings: {:?}", report.checks);
}

#[test]
fn test_verification_of_healthy_database() {
    let (_temp_dir, db_path) = ingest(12, 12);

    let report = Verifier::new(
        VerifyConfig::default()
            .with_db_path(&db_path)
            .with_sample_rows(2),
    )
    .run()
    .unwrap();

    assert_eq!(report.check("schema raw").unwrap().status, CheckStatus::Pass);
    assert_eq!(
        report.check("schema dimensions").unwrap().status,
        CheckStatus::Pass
    );
    assert_eq!(
        report.check("null orders.order_id").unwrap().status,
        CheckStatus::Pass
    );
    assert_eq!(
        report.check("orders with order_items").unwrap().status,
        CheckStatus::Pass
    );

    let range = report
        .check("range orders.order_purchase_timestamp")
        .unwrap();
    assert_eq!(range.status, CheckStatus::Pass);
    assert!(range.detail.contains("2017-01-10 09:30:00"));

    let orders = TableRef::new("raw", "orders").unwrap();
    let items = TableRef::new("raw", "order_items").unwrap();
    let calendar = TableRef::new("dimensions", "calendar").unwrap();
    assert_eq!(report.row_count(&orders), Some(12));
    assert_eq!(report.row_count(&items), Some(24));
    assert_eq!(report.row_count(&calendar), Some(730));

    assert_eq!(report.samples.len(), 3);
    assert_eq!(report.samples[0].1.row_count(), 2);
    // Only 2017-01-01 and 2018-06-15 fall inside a 2017-2018 calendar
    assert_eq!(report.samples[1].1.row_count(), 2);
    assert_eq!(report.samples[2].1.row_count(), 5);

    assert!(report.storage.as_ref().unwrap().size_bytes > 0);
    assert!(report.to_string().contains("raw.orders"));
}

#[test]
fn test_verification_reports_missing_tables_without_failing() {
    let temp_dir = TempDir::new().unwrap();
    let db_path = temp_dir.path().join("empty.db");
    Database::open(&db_path).unwrap().close().unwrap();

    let report = Verifier::new(VerifyConfig::default().with_db_path(&db_path))
        .run()
        .unwrap();

    assert_eq!(report.check("schema raw").unwrap().status, CheckStatus::Warn);
    assert!(report.row_counts.is_empty());
    assert!(report.completeness.is_none());
    assert!(
        report
            .check("null orders.order_id")
            .unwrap()
            .detail
            .starts_with("could not run")
    );
    assert!(!report.all_passed());
}

#[test]
fn test_verification_does_not_modify_database() {
    let (_temp_dir, db_path) = ingest(3, 3);
    let before = fs::read(&db_path).unwrap();

    Verifier::new(VerifyConfig::default().with_db_path(&db_path))
        .run()
        .unwrap();

    assert_eq!(fs::read(&db_path).unwrap(), before);
}

#[test]
fn test_verification_of_missing_database_is_an_error() {
    let temp_dir = TempDir::new().unwrap();
    let result = Verifier::new(VerifyConfig::default().with_db_path(temp_dir.path().join("none.db")))
        .run();
    assert!(result.is_err());
}

#[test]
fn test_explorer_menu_round() {
    let (_temp_dir, db_path) = ingest(5, 5);
    let explorer = Explorer::open(&db_path).unwrap();

    let tables = explorer.run_query(1).unwrap();
    // calendar, region_lookup, order_items, orders
    assert_eq!(tables.row_count(), 4);

    let statuses = explorer.run_query(2).unwrap();
    assert_eq!(statuses.rows[0][0].as_deref(), Some("delivered"));
    assert_eq!(statuses.rows[0][1].as_deref(), Some("5"));

    assert!(explorer.run_query(42).is_err());

    // Query 3 needs raw.customers, which was not loaded; the loop keeps going
    let mut output = Vec::new();
    explorer
        .interactive("3\nabc\n9\n0\n".as_bytes(), &mut output)
        .unwrap();
    let output = String::from_utf8(output).unwrap();
    assert!(output.contains("Error"));
    assert!(output.contains("Invalid choice"));
    assert!(output.contains("January"));
    assert!(output.contains("Goodbye"));

    explorer.close().unwrap();
}

#[test]
fn test_custom_relationship_check() {
    let temp_dir = TempDir::new().unwrap();
    let source_dir = temp_dir.path().join("src");
    fs::create_dir_all(&source_dir).unwrap();

    let parents: String = (1..=10).map(|k| format!("{k},2019-05-0{} 00:00:00\n", k % 9 + 1)).collect();
    fs::write(source_dir.join("parents.csv"), format!("key,created\n{parents}")).unwrap();
    let children: String = (1..=8).map(|k| format!("{k},x\n")).collect();
    fs::write(source_dir.join("children.csv"), format!("key,tag\n{children}")).unwrap();

    let db_path = temp_dir.path().join("custom.db");
    IngestionPipeline::new(
        IngestConfig::default()
            .with_db_path(&db_path)
            .with_source_dir(&source_dir)
            .with_manifest(
                LoadManifest::new([("parents.csv", "parent"), ("children.csv", "child")]).unwrap(),
            )
            .with_calendar_years(2019, 2019)
            .without_progress(),
    )
    .run()
    .unwrap();

    let config = VerifyConfig::default()
        .with_db_path(&db_path)
        .with_relationship(
            TableRef::new("raw", "parent").unwrap(),
            TableRef::new("raw", "child").unwrap(),
            "key",
        )
        .with_timestamp_column("created");

    let report = Verifier::new(config).run().unwrap();
    let completeness = report.completeness.unwrap();
    assert_eq!(completeness.ratio_percent(), Some(80.0));
    assert_eq!(report.check("parent with child").unwrap().status, CheckStatus::Info);
}
