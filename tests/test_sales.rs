use chrono::NaiveDate;
use queue_relay::{
    read_path, read_records, Money, RecordError, SalesQuery, SalesRecord, SessionBuilder, Sink,
};
use std::io::Write;
use std::path::PathBuf;
use std::time::Duration;

fn sample_path() -> PathBuf {
    PathBuf::from(env!("CARGO_MANIFEST_DIR")).join("data/sales_data.csv")
}

fn date(y: i32, m: u32, d: u32) -> NaiveDate {
    NaiveDate::from_ymd_opt(y, m, d).expect("valid date")
}

#[test]
fn test_bundled_sample_analysis() {
    let summary = read_path(sample_path()).expect("read sample");
    assert_eq!(summary.records.len(), 12);
    assert_eq!(summary.skipped, 0);

    let query = SalesQuery::new(&summary.records);
    assert_eq!(query.total_revenue(), Money::from_cents(827_785));

    let by_category = query.revenue_by_category();
    assert_eq!(by_category["Electronics"], Money::from_cents(460_300));
    assert_eq!(by_category["Furniture"], Money::from_cents(335_000));
    assert_eq!(by_category["Stationery"], Money::from_cents(32_485));

    let top = query.top_products(1);
    assert_eq!(top, vec![("Laptop".to_string(), Money::from_cents(300_000))]);

    let reps = query.top_reps(2);
    assert_eq!(reps[0], ("John".to_string(), Money::from_cents(305_300)));
    assert_eq!(reps[1], ("Sara".to_string(), Money::from_cents(213_000)));

    let q1 = query.in_date_range(date(2024, 1, 1), date(2024, 3, 31));
    assert_eq!(q1.len(), 6);
    let q1_revenue: Money = q1.iter().map(|r| r.total_value()).sum();
    assert_eq!(q1_revenue, Money::from_cents(555_000));

    // Quoted comma survives
    assert!(summary
        .records
        .iter()
        .any(|r| r.product_name == "Desk, Standing"));
}

#[test]
fn test_malformed_rows_are_skipped_not_fatal() {
    let mut file = tempfile::NamedTempFile::new().expect("temp file");
    writeln!(
        file,
        "ProductID,ProductName,Category,SaleDate,Amount,Quantity,Region,SalesRep\n\
         P001,Laptop,Electronics,2024-01-15,1000.00,2,North,John\n\
         P002,Mouse,Electronics,15/01/2024,30.00,5,South,Jane\n\
         P003,Chair,Furniture,2024-02-10,abc,3,North,John\n\
         P004,Desk,Furniture\n\
         P005,Lamp,Furniture,2024-02-11,20.00,-1,North,John\n\
         P006,Pen,Stationery,2024-02-12,1.50,10,West,Sara"
    )
    .expect("write rows");

    let summary = read_path(file.path()).expect("read file");
    let ids: Vec<&str> = summary
        .records
        .iter()
        .map(|r| r.product_id.as_str())
        .collect();
    assert_eq!(ids, vec!["P001", "P006"]);
    assert_eq!(summary.skipped, 4);
}

#[test]
fn test_missing_file_is_fatal() {
    let dir = tempfile::tempdir().expect("temp dir");
    let result = read_path(dir.path().join("nope.csv"));
    assert!(matches!(result, Err(RecordError::Io(_))));
}

#[test]
fn test_header_only_input() {
    let data = "ProductID,ProductName,Category,SaleDate,Amount,Quantity,Region,SalesRep\n";
    let summary = read_records(data.as_bytes()).expect("read");
    assert!(summary.records.is_empty());

    let query = SalesQuery::new(&summary.records);
    assert_eq!(query.total_revenue(), Money::ZERO);
    assert!(query.top_products(5).is_empty());
    assert!(query.revenue_by_region().is_empty());
}

#[test]
fn test_records_survive_a_trip_through_the_queue() {
    let summary = read_path(sample_path()).expect("read sample");
    let expected = SalesQuery::new(&summary.records).total_revenue();

    let sink: Sink<SalesRecord> = Sink::new();
    let report = SessionBuilder::new(2)
        .add_producer("loader", summary.records.clone())
        .add_consumer("analyst", sink.clone(), Some(summary.records.len()))
        .build()
        .expect("build")
        .start()
        .expect("start")
        .wait_timeout(Duration::from_secs(10));

    assert!(report.is_clean());
    let received = sink.drain();
    assert_eq!(received, summary.records);
    assert_eq!(SalesQuery::new(&received).total_revenue(), expected);
}
