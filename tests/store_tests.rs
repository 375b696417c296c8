// Tests for the fingerprint store and its persisted format

use std::fs;
use std::path::Path;

use imprint::{FingerprintRecord, FingerprintStore, ImprintError};

#[test]
fn test_add_and_lookup() {
    let mut store = FingerprintStore::new();
    assert!(store.is_empty());

    store.add(FingerprintRecord::new("dir1/a.txt", "abcd1234", "crc32"));
    store.add(FingerprintRecord::new("b.txt", "deadbeef", "crc32"));

    assert_eq!(store.len(), 2);
    assert!(store.contains("dir1/a.txt"));
    assert!(!store.contains("missing.txt"));

    let record = store.get("b.txt").unwrap();
    assert_eq!(record.digest, "deadbeef");
    assert_eq!(record.algorithm, "crc32");
}

#[test]
fn test_add_overwrites_existing_path() {
    let mut store = FingerprintStore::new();
    store.add(FingerprintRecord::new("a.txt", "old", "crc32"));
    store.add(FingerprintRecord::new("a.txt", "new", "crc32"));

    assert_eq!(store.len(), 1);
    assert_eq!(store.get("a.txt").unwrap().digest, "new");
}

#[test]
fn test_records_sorted_by_path() {
    let mut store = FingerprintStore::new();
    store.add(FingerprintRecord::new("zebra.txt", "03", "crc32"));
    store.add(FingerprintRecord::new("apple.txt", "01", "crc32"));
    store.add(FingerprintRecord::new("mango.txt", "02", "crc32"));

    let paths: Vec<&str> = store.records().map(|r| r.path.as_str()).collect();
    assert_eq!(paths, vec!["apple.txt", "mango.txt", "zebra.txt"]);
}

#[test]
fn test_save_load_round_trip() {
    let store_path = "test_store_round_trip.csv";

    let mut store = FingerprintStore::new();
    store.add(FingerprintRecord::new("dir1/test.txt", "6b24cc6a", "crc32"));
    store.add(FingerprintRecord::new("test.txt", "1c291ca3", "crc32"));
    store.save(Path::new(store_path)).unwrap();

    let loaded = FingerprintStore::load(Path::new(store_path)).unwrap();
    assert_eq!(loaded.len(), 2);
    assert_eq!(loaded.get("test.txt").unwrap().digest, "1c291ca3");
    assert_eq!(loaded.get("dir1/test.txt").unwrap().digest, "6b24cc6a");
    assert_eq!(loaded.get("dir1/test.txt").unwrap().algorithm, "crc32");

    fs::remove_file(store_path).unwrap();
}

#[test]
fn test_round_trip_is_byte_stable_regardless_of_insertion_order() {
    let path_a = "test_store_stable_a.csv";
    let path_b = "test_store_stable_b.csv";

    let mut store_a = FingerprintStore::new();
    store_a.add(FingerprintRecord::new("x.txt", "01", "md5"));
    store_a.add(FingerprintRecord::new("a.txt", "02", "md5"));
    store_a.save(Path::new(path_a)).unwrap();

    // Same content inserted in the opposite order
    let mut store_b = FingerprintStore::new();
    store_b.add(FingerprintRecord::new("a.txt", "02", "md5"));
    store_b.add(FingerprintRecord::new("x.txt", "01", "md5"));
    store_b.save(Path::new(path_b)).unwrap();

    let bytes_a = fs::read(path_a).unwrap();
    let bytes_b = fs::read(path_b).unwrap();
    assert_eq!(bytes_a, bytes_b);

    fs::remove_file(path_a).unwrap();
    fs::remove_file(path_b).unwrap();
}

#[test]
fn test_path_containing_delimiter_survives_round_trip() {
    let store_path = "test_store_quoted.csv";

    let mut store = FingerprintStore::new();
    store.add(FingerprintRecord::new("dir/a, with comma.txt", "0badf00d", "crc32"));
    store.save(Path::new(store_path)).unwrap();

    let loaded = FingerprintStore::load(Path::new(store_path)).unwrap();
    assert_eq!(loaded.len(), 1);
    assert_eq!(
        loaded.get("dir/a, with comma.txt").unwrap().digest,
        "0badf00d"
    );

    fs::remove_file(store_path).unwrap();
}

#[test]
fn test_load_rejects_wrong_field_count() {
    let store_path = "test_store_malformed.csv";
    fs::write(store_path, "a.txt,0123abcd,crc32\nb.txt,0123abcd\n").unwrap();

    let result = FingerprintStore::load(Path::new(store_path));
    match result {
        Err(ImprintError::MalformedRecord { line, .. }) => assert_eq!(line, 2),
        other => panic!("Expected MalformedRecord, got {:?}", other.map(|s| s.len())),
    }

    fs::remove_file(store_path).unwrap();
}

#[test]
fn test_load_missing_file_is_store_not_found() {
    let result = FingerprintStore::load(Path::new("test_store_does_not_exist.csv"));
    assert!(matches!(result, Err(ImprintError::StoreNotFound { .. })));
}

#[test]
fn test_load_checked_rejects_unknown_algorithm() {
    let store_path = "test_store_unknown_alg.csv";
    fs::write(store_path, "a.txt,0123abcd,rot13\n").unwrap();

    let result = FingerprintStore::load_checked(Path::new(store_path));
    assert!(matches!(
        result,
        Err(ImprintError::UnsupportedAlgorithm { .. })
    ));

    // Plain load does not enforce the allow-list
    let store = FingerprintStore::load(Path::new(store_path)).unwrap();
    assert_eq!(store.len(), 1);

    fs::remove_file(store_path).unwrap();
}

#[test]
fn test_compressed_store_round_trip() {
    let store_path = "test_store_compressed.csv.xz";

    let mut store = FingerprintStore::new();
    store.add(FingerprintRecord::new("a.txt", "1c291ca3", "crc32"));
    store.add(FingerprintRecord::new("dir/b.txt", "6b24cc6a", "crc32"));
    store.save(Path::new(store_path)).unwrap();

    // The on-disk bytes must not be plain CSV
    let raw = fs::read(store_path).unwrap();
    assert!(!raw.starts_with(b"a.txt"));

    let loaded = FingerprintStore::load(Path::new(store_path)).unwrap();
    assert_eq!(loaded.len(), 2);
    assert_eq!(loaded.get("a.txt").unwrap().digest, "1c291ca3");

    fs::remove_file(store_path).unwrap();
}
