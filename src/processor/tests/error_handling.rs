//! Error handling tests for the processing pipeline

use super::{processor, write_report};
use crate::error::SunspotError;
use crate::models::DatasetKind;
use crate::processor::SunspotProcessor;
use tempfile::TempDir;

#[test]
fn test_missing_input_directory() {
    let temp_dir = TempDir::new().unwrap();
    let missing = temp_dir.path().join("missing");

    match SunspotProcessor::new(missing.clone(), None) {
        Err(SunspotError::DirectoryNotFound { path }) => assert_eq!(path, missing),
        other => panic!("Expected DirectoryNotFound error, got {:?}", other.map(|_| ())),
    }
}

#[test]
fn test_unprocessable_files_are_skipped() {
    let temp_dir = TempDir::new().unwrap();
    let input = temp_dir.path().join("regions");
    // no era covers 1900
    write_report(&input, "1900-01.csv", "no,ns,first,last,lat\n1,N,3,4,N10\n");
    // old era files need a longitude column
    write_report(&input, "1970-01.csv", "no,ns,first,last,lat\n1,N,jan.3,jan.4,N10\n");
    write_report(&input, "1970-02.csv", "");
    write_report(&input, "scan-notes.csv", "no,ns\n");
    write_report(
        &input,
        "1990-01.csv",
        "no,ns,first,last,lat,lon\n1,N,1990-01-03,1990-01-04,N10,30\n",
    );

    let stats = processor(input, temp_dir.path().join("out"))
        .process()
        .unwrap();

    assert_eq!(stats.files_processed, 1);
    assert_eq!(stats.files_skipped, 4);
    assert_eq!(stats.rows_written, 1);
}

#[test]
fn test_empty_directory_writes_nothing() {
    let temp_dir = TempDir::new().unwrap();
    let input = temp_dir.path().join("regions");
    std::fs::create_dir_all(&input).unwrap();

    let stats = processor(input, temp_dir.path().join("out"))
        .process()
        .unwrap();
    assert_eq!(stats.files_processed, 0);
    assert!(stats.outputs.is_empty());
}

#[test]
fn test_unknown_dataset_kind() {
    let temp_dir = TempDir::new().unwrap();
    let input = temp_dir.path().join("archive");
    write_report(&input, "1990-01.csv", "a,b,c\n1,2,3\n");

    let result = processor(input.clone(), temp_dir.path().join("out")).process();
    match result {
        Err(SunspotError::UnknownDataset { path }) => assert_eq!(path, input),
        other => panic!("Expected UnknownDataset error, got {:?}", other.map(|_| ())),
    }
}

#[test]
fn test_explicit_dataset_overrides_detection() {
    let temp_dir = TempDir::new().unwrap();
    let input = temp_dir.path().join("archive");
    write_report(&input, "1990-01.csv", "date,ns,no,spots\n1990-01-01,N,1,1\n");

    let stats = processor(input, temp_dir.path().join("out"))
        .with_dataset(DatasetKind::ActiveRegion)
        .process()
        .unwrap();

    // a count sheet read as a region file fails its header check
    assert_eq!(stats.files_processed, 0);
    assert_eq!(stats.files_skipped, 1);
}

#[test]
fn test_parent_directory_names_do_not_decide_dataset() {
    let temp_dir = TempDir::new().unwrap();
    let input = temp_dir.path().join("sunspot_counts").join("archive");
    write_report(
        &input,
        "1990-01.csv",
        "no,ns,first,last,lat,lon\n1,N,1990-01-03,1990-01-04,N10,30\n",
    );

    let stats = processor(input, temp_dir.path().join("out"))
        .process()
        .unwrap();

    assert_eq!(stats.files_processed, 1);
    assert_eq!(stats.rows_written, 1);
}

#[test]
fn test_input_name_decides_when_headers_are_unknown() {
    let temp_dir = TempDir::new().unwrap();
    let input = temp_dir.path().join("regions");
    write_report(&input, "1990-01.csv", "a,b,c\n1,2,3\n");

    let stats = processor(input, temp_dir.path().join("out"))
        .process()
        .unwrap();

    assert_eq!(stats.files_processed, 0);
    assert_eq!(stats.files_skipped, 1);
}
