// Tests for rename detection between a stored snapshot and a live directory

use std::fs;
use std::path::Path;

use imprint::{Calculator, Comparer, FingerprintRecord, FingerprintStore, ImprintError};

fn snapshot(root: &str) -> FingerprintStore {
    let mut store = FingerprintStore::new();
    Calculator::new()
        .calculate(&mut store, Path::new(root), "sha1", Path::new(root), false)
        .unwrap();
    store
}

#[test]
fn test_simple_rename_is_detected() {
    let root = "test_compare_rename";
    fs::create_dir_all(root).unwrap();
    fs::write(format!("{}/original.txt", root), "stable content").unwrap();
    fs::write(format!("{}/keep.txt", root), "other content").unwrap();

    let old_store = snapshot(root);
    fs::rename(
        format!("{}/original.txt", root),
        format!("{}/renamed.txt", root),
    )
    .unwrap();

    let outcome = Comparer::new()
        .compare_and_match(&old_store, Path::new(root), "sha1", Path::new(root))
        .unwrap();

    assert_eq!(outcome.renames.len(), 1);
    assert_eq!(outcome.renames[0].old_path, "original.txt");
    assert_eq!(outcome.renames[0].new_path, "renamed.txt");
    assert_eq!(outcome.unchanged, 1);
    assert!(outcome.residual.is_empty());

    fs::remove_dir_all(root).unwrap();
}

#[test]
fn test_move_into_subdirectory_is_detected() {
    let root = "test_compare_move";
    fs::create_dir_all(root).unwrap();
    fs::write(format!("{}/doc.txt", root), "document body").unwrap();

    let old_store = snapshot(root);
    fs::create_dir_all(format!("{}/archive", root)).unwrap();
    fs::rename(format!("{}/doc.txt", root), format!("{}/archive/doc.txt", root)).unwrap();

    let outcome = Comparer::new()
        .compare_and_match(&old_store, Path::new(root), "sha1", Path::new(root))
        .unwrap();

    assert_eq!(outcome.renames.len(), 1);
    assert_eq!(outcome.renames[0].old_path, "doc.txt");
    assert_eq!(outcome.renames[0].new_path, "archive/doc.txt");

    fs::remove_dir_all(root).unwrap();
}

#[test]
fn test_new_content_goes_to_residual() {
    let root = "test_compare_new";
    fs::create_dir_all(root).unwrap();
    fs::write(format!("{}/old.txt", root), "existing").unwrap();

    let old_store = snapshot(root);
    fs::write(format!("{}/brand_new.txt", root), "never seen before").unwrap();

    let outcome = Comparer::new()
        .compare_and_match(&old_store, Path::new(root), "sha1", Path::new(root))
        .unwrap();

    assert!(outcome.renames.is_empty());
    assert_eq!(outcome.unchanged, 1);
    assert_eq!(outcome.residual.len(), 1);
    assert!(outcome.residual.contains("brand_new.txt"));

    fs::remove_dir_all(root).unwrap();
}

#[test]
fn test_changed_content_goes_to_residual() {
    let root = "test_compare_changed";
    fs::create_dir_all(root).unwrap();
    fs::write(format!("{}/f.txt", root), "before edit").unwrap();

    let old_store = snapshot(root);
    fs::write(format!("{}/f.txt", root), "after edit").unwrap();

    let outcome = Comparer::new()
        .compare_and_match(&old_store, Path::new(root), "sha1", Path::new(root))
        .unwrap();

    // Same path, different digest: not a rename, not unchanged
    assert!(outcome.renames.is_empty());
    assert_eq!(outcome.unchanged, 0);
    assert_eq!(outcome.residual.len(), 1);
    assert!(outcome.residual.contains("f.txt"));

    fs::remove_dir_all(root).unwrap();
}

#[test]
fn test_unmoved_duplicate_is_never_stolen() {
    let root = "test_compare_duplicate";
    fs::create_dir_all(root).unwrap();
    // Two files with identical content, so identical digests
    fs::write(format!("{}/x.txt", root), "duplicate body").unwrap();
    fs::write(format!("{}/y.txt", root), "duplicate body").unwrap();

    let old_store = snapshot(root);
    // y.txt moves to z.txt; x.txt stays put
    fs::rename(format!("{}/y.txt", root), format!("{}/z.txt", root)).unwrap();

    let outcome = Comparer::new()
        .compare_and_match(&old_store, Path::new(root), "sha1", Path::new(root))
        .unwrap();

    // x.txt must match itself even though z.txt sorts after it and shares the
    // digest; the rename must pair the leftover old path with z.txt
    assert_eq!(outcome.unchanged, 1);
    assert_eq!(outcome.renames.len(), 1);
    assert_eq!(outcome.renames[0].old_path, "y.txt");
    assert_eq!(outcome.renames[0].new_path, "z.txt");
    assert!(outcome.residual.is_empty());

    fs::remove_dir_all(root).unwrap();
}

#[test]
fn test_duplicate_tie_break_is_lexicographic() {
    let root = "test_compare_tiebreak";
    fs::create_dir_all(root).unwrap();
    fs::write(format!("{}/a.txt", root), "same everywhere").unwrap();
    fs::write(format!("{}/b.txt", root), "same everywhere").unwrap();

    let old_store = snapshot(root);
    fs::rename(format!("{}/a.txt", root), format!("{}/c.txt", root)).unwrap();
    fs::rename(format!("{}/b.txt", root), format!("{}/d.txt", root)).unwrap();

    let outcome = Comparer::new()
        .compare_and_match(&old_store, Path::new(root), "sha1", Path::new(root))
        .unwrap();

    // Both sides sorted: first leftover old path pairs with first new path
    assert_eq!(outcome.renames.len(), 2);
    assert_eq!(outcome.renames[0].old_path, "a.txt");
    assert_eq!(outcome.renames[0].new_path, "c.txt");
    assert_eq!(outcome.renames[1].old_path, "b.txt");
    assert_eq!(outcome.renames[1].new_path, "d.txt");

    fs::remove_dir_all(root).unwrap();
}

#[test]
fn test_deleted_files_go_unreported() {
    let root = "test_compare_deleted";
    fs::create_dir_all(root).unwrap();
    fs::write(format!("{}/gone.txt", root), "will vanish").unwrap();
    fs::write(format!("{}/stays.txt", root), "still here").unwrap();

    let old_store = snapshot(root);
    fs::remove_file(format!("{}/gone.txt", root)).unwrap();

    let outcome = Comparer::new()
        .compare_and_match(&old_store, Path::new(root), "sha1", Path::new(root))
        .unwrap();

    assert!(outcome.renames.is_empty());
    assert_eq!(outcome.unchanged, 1);
    assert!(outcome.residual.is_empty());

    fs::remove_dir_all(root).unwrap();
}

#[test]
fn test_empty_old_store_puts_everything_in_residual() {
    let root = "test_compare_empty_old";
    fs::create_dir_all(root).unwrap();
    fs::write(format!("{}/a.txt", root), "a").unwrap();
    fs::write(format!("{}/b.txt", root), "b").unwrap();

    let outcome = Comparer::new()
        .compare_and_match(
            &FingerprintStore::new(),
            Path::new(root),
            "sha1",
            Path::new(root),
        )
        .unwrap();

    assert!(outcome.renames.is_empty());
    assert_eq!(outcome.unchanged, 0);
    assert_eq!(outcome.residual.len(), 2);

    fs::remove_dir_all(root).unwrap();
}

#[test]
fn test_algorithm_mismatch_is_fatal() {
    let root = "test_compare_alg_mismatch";
    fs::create_dir_all(root).unwrap();

    let mut old_store = FingerprintStore::new();
    old_store.add(FingerprintRecord::new("a.txt", "5eb63bbbe01eeed093cb22bb8f5acdc3", "md5"));

    let result =
        Comparer::new().compare_and_match(&old_store, Path::new(root), "sha1", Path::new(root));
    match result {
        Err(ImprintError::AlgorithmMismatch {
            expected, found, ..
        }) => {
            assert_eq!(expected, "sha1");
            assert_eq!(found, "md5");
        }
        _ => panic!("Expected AlgorithmMismatch"),
    }

    fs::remove_dir_all(root).unwrap();
}

#[test]
fn test_save_renames_writes_two_column_csv() {
    let root = "test_compare_save";
    fs::create_dir_all(root).unwrap();
    fs::write(format!("{}/before.txt", root), "payload").unwrap();

    let old_store = snapshot(root);
    fs::rename(format!("{}/before.txt", root), format!("{}/after.txt", root)).unwrap();

    let outcome = Comparer::new()
        .compare_and_match(&old_store, Path::new(root), "sha1", Path::new(root))
        .unwrap();

    let csv_path = format!("{}/renames.csv", root);
    outcome.save_renames(Path::new(&csv_path)).unwrap();

    let content = fs::read_to_string(&csv_path).unwrap();
    assert_eq!(content.trim(), "before.txt,after.txt");

    fs::remove_dir_all(root).unwrap();
}

#[test]
fn test_outcome_json_has_summary() {
    let root = "test_compare_json";
    fs::create_dir_all(root).unwrap();
    fs::write(format!("{}/a.txt", root), "a").unwrap();

    let old_store = snapshot(root);
    let outcome = Comparer::new()
        .compare_and_match(&old_store, Path::new(root), "sha1", Path::new(root))
        .unwrap();

    let json = outcome.to_json().unwrap();
    let parsed: serde_json::Value = serde_json::from_str(&json).unwrap();
    assert_eq!(parsed["summary"]["unchanged_count"], 1);
    assert_eq!(parsed["summary"]["renamed_count"], 0);
    assert_eq!(parsed["summary"]["new_or_changed_count"], 0);
    assert!(parsed["metadata"]["timestamp"].is_string());

    fs::remove_dir_all(root).unwrap();
}
