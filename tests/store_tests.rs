//! Integration tests for `PasswordStore`: init, add, list, get, remove and
//! check against a real directory.

use std::fs;
use std::path::Path;

use citpass::config::StoreConfig;
use citpass::crypto::kdf::{Argon2Params, MIN_MEMORY_KIB};
use citpass::crypto::TAG_LEN;
use citpass::errors::CitpassError;
use citpass::vault::format::HEADER_LEN;
use citpass::vault::{
    IdentifierGenerator, Index, IndexStore, InitOutcome, PasswordEntry, PasswordStore, SealedBlob,
    HEADER_ROW,
};
use tempfile::TempDir;

const PASS: &[u8] = b"correct horse battery staple";

/// A store under a fresh temp dir, with the KDF turned down for speed.
fn test_store() -> (TempDir, PasswordStore) {
    test_store_with_limit(StoreConfig::new("").max_blob_bytes)
}

fn test_store_with_limit(max_blob_bytes: u64) -> (TempDir, PasswordStore) {
    let dir = TempDir::new().expect("temp dir");
    let mut config = StoreConfig::new(dir.path().join("citpass"));
    config.argon2 = Argon2Params {
        memory_kib: MIN_MEMORY_KIB,
        iterations: 1,
        parallelism: 1,
    };
    config.max_blob_bytes = max_blob_bytes;
    (dir, PasswordStore::new(config))
}

fn initialized_store() -> (TempDir, PasswordStore) {
    let (dir, store) = test_store();
    store.init(PASS).expect("init");
    (dir, store)
}

fn entry(title: &str, password: &str) -> PasswordEntry {
    let mut entry = PasswordEntry::default();
    entry.title = title.to_string();
    entry.password = password.to_string();
    entry.username = "alice".to_string();
    entry.url = "https://example.com".to_string();
    entry.notes = "first line\nsecond line".to_string();
    entry
}

fn add(store: &PasswordStore, title: &str, password: &str) -> String {
    store
        .add(PASS, &entry(title, password), &mut IdentifierGenerator::from_clock())
        .expect("add")
}

fn root(store: &PasswordStore) -> &Path {
    &store.config().root
}

// ---------------------------------------------------------------------------
// init
// ---------------------------------------------------------------------------

#[test]
fn init_creates_private_root_and_header_only_index() {
    let (_dir, store) = test_store();
    assert!(!store.is_initialized());

    let report = store.init(PASS).unwrap();
    assert!(report.created_root);
    assert_eq!(report.index, InitOutcome::Created);

    #[cfg(unix)]
    {
        use std::os::unix::fs::PermissionsExt;
        let mode = fs::metadata(root(&store)).unwrap().permissions().mode();
        assert_eq!(mode & 0o777, 0o700);
    }

    let bytes = fs::read(store.config().index_path()).unwrap();
    let blob = SealedBlob::from_bytes(&bytes).unwrap();
    assert_eq!(&blob.open(PASS).unwrap()[..], HEADER_ROW.as_bytes());
    assert!(store.list(PASS).unwrap().is_empty());
}

#[test]
fn init_twice_leaves_the_index_alone() {
    let (_dir, store) = initialized_store();
    add(&store, "Bank", "p@ss");
    let before = fs::read(store.config().index_path()).unwrap();

    let report = store.init(PASS).unwrap();
    assert!(!report.created_root);
    assert_eq!(report.index, InitOutcome::AlreadyExists);
    assert_eq!(fs::read(store.config().index_path()).unwrap(), before);
}

#[test]
fn commands_before_init_report_not_initialized() {
    let (_dir, store) = test_store();

    assert!(matches!(
        store.list(PASS),
        Err(CitpassError::NotInitialized(_))
    ));
    assert!(matches!(
        store.get(PASS, "Bank"),
        Err(CitpassError::NotInitialized(_))
    ));
    assert!(matches!(
        store.remove(PASS, "Bank"),
        Err(CitpassError::NotInitialized(_))
    ));
    assert!(matches!(
        store.add(PASS, &entry("Bank", "x"), &mut IdentifierGenerator::with_seed(1)),
        Err(CitpassError::NotInitialized(_))
    ));
}

// ---------------------------------------------------------------------------
// add / list / get / remove
// ---------------------------------------------------------------------------

#[test]
fn add_list_get_roundtrip() {
    let (_dir, store) = initialized_store();
    let id = add(&store, "Bank", "p@ss");

    assert_eq!(id.len(), store.config().identifier_len);
    assert!(root(&store).join(&id).is_file());

    let rows = store.list(PASS).unwrap();
    assert_eq!(rows.len(), 1);
    assert_eq!(rows[0].identifier, id);
    assert_eq!(rows[0].title, "Bank");

    let got = store.get(PASS, "Bank").unwrap();
    assert_eq!(got, entry("Bank", "p@ss"));
    assert_eq!(got.notes, "first line\nsecond line");
}

#[test]
fn titles_keep_insertion_order() {
    let (_dir, store) = initialized_store();
    for title in ["Mail", "Bank", "Work"] {
        add(&store, title, "x");
    }
    assert_eq!(store.titles(PASS).unwrap(), ["Mail", "Bank", "Work"]);
}

#[test]
fn titles_with_commas_survive() {
    let (_dir, store) = initialized_store();
    add(&store, "Bank, checking, joint", "p@ss");

    assert_eq!(store.titles(PASS).unwrap(), ["Bank, checking, joint"]);
    assert_eq!(
        store.get(PASS, "Bank, checking, joint").unwrap().password,
        "p@ss"
    );
}

#[test]
fn remove_deletes_file_and_row() {
    let (_dir, store) = initialized_store();
    let id = add(&store, "Bank", "p@ss");
    add(&store, "Mail", "m");

    let removed = store.remove(PASS, "Bank").unwrap();
    assert_eq!(removed, id);
    assert!(!root(&store).join(&id).exists());
    assert_eq!(store.titles(PASS).unwrap(), ["Mail"]);
    assert!(matches!(
        store.get(PASS, "Bank"),
        Err(CitpassError::EntryNotFound(_))
    ));
}

#[test]
fn add_then_remove_restores_the_index() {
    let (_dir, store) = initialized_store();
    add(&store, "Mail", "m");
    let before = store.list(PASS).unwrap();

    add(&store, "Bank", "p@ss");
    store.remove(PASS, "Bank").unwrap();

    assert_eq!(store.list(PASS).unwrap(), before);
    assert!(store.check(PASS).unwrap().is_consistent());
}

#[test]
fn remove_of_unknown_title_changes_nothing() {
    let (_dir, store) = initialized_store();
    add(&store, "Bank", "p@ss");

    assert!(matches!(
        store.remove(PASS, "bank"),
        Err(CitpassError::EntryNotFound(_))
    ));
    assert_eq!(store.titles(PASS).unwrap(), ["Bank"]);
}

#[test]
fn remove_tolerates_missing_entry_file() {
    let (_dir, store) = initialized_store();
    let id = add(&store, "Bank", "p@ss");
    fs::remove_file(root(&store).join(&id)).unwrap();

    assert_eq!(store.remove(PASS, "Bank").unwrap(), id);
    assert!(store.list(PASS).unwrap().is_empty());
}

#[test]
fn duplicate_titles_are_rejected() {
    let (_dir, store) = initialized_store();
    add(&store, "Bank", "one");

    let err = store
        .add(PASS, &entry("Bank", "two"), &mut IdentifierGenerator::from_clock())
        .unwrap_err();
    assert!(matches!(err, CitpassError::DuplicateTitle(_)));

    assert_eq!(store.list(PASS).unwrap().len(), 1);
    assert_eq!(store.entries().identifiers().unwrap().len(), 1);
    assert_eq!(store.get(PASS, "Bank").unwrap().password, "one");
}

#[test]
fn invalid_titles_are_rejected_before_touching_disk() {
    let (_dir, store) = initialized_store();

    for title in ["", "two\nlines"] {
        assert!(matches!(
            store.add(PASS, &entry(title, "x"), &mut IdentifierGenerator::from_clock()),
            Err(CitpassError::InvalidTitle(_))
        ));
    }
    assert!(store.entries().identifiers().unwrap().is_empty());
}

#[test]
fn identifier_collision_is_fatal() {
    let (_dir, store) = initialized_store();

    let clash = IdentifierGenerator::with_seed(7).produce(store.config().identifier_len);
    fs::write(root(&store).join(&clash), b"someone else's file").unwrap();

    let err = store
        .add(PASS, &entry("Bank", "p@ss"), &mut IdentifierGenerator::with_seed(7))
        .unwrap_err();
    assert!(matches!(err, CitpassError::IdentifierCollision(ref id) if *id == clash));

    assert!(store.list(PASS).unwrap().is_empty());
    assert_eq!(
        fs::read(root(&store).join(&clash)).unwrap(),
        b"someone else's file"
    );
}

#[test]
fn existing_duplicate_rows_resolve_to_the_first() {
    let (_dir, store) = initialized_store();
    let first = add(&store, "Bank", "first");

    // Rewrite the index with a second "Bank" row pointing at another file.
    let second = add(&store, "Other", "second");
    let text = format!("{HEADER_ROW}\n{first},Bank\n{second},Bank");
    let forged = Index::parse(text.as_bytes()).unwrap();
    store.index().save(PASS, &forged).unwrap();

    assert_eq!(store.index().lookup(PASS, "Bank").unwrap(), first);
    assert_eq!(store.get(PASS, "Bank").unwrap().password, "first");
}

// ---------------------------------------------------------------------------
// IndexStore
// ---------------------------------------------------------------------------

#[test]
fn index_append_issues_fresh_identifiers() {
    let (_dir, store) = initialized_store();
    let index = IndexStore::new(store.config());
    let mut ids = IdentifierGenerator::from_clock();

    let a = index.append(PASS, "Example", &mut ids).unwrap();
    let b = index.append(PASS, "Example 2", &mut ids).unwrap();

    assert_ne!(a, b);
    assert_eq!(index.lookup(PASS, "Example").unwrap(), a);
    assert_eq!(index.list(PASS).unwrap().len(), 2);
}

// ---------------------------------------------------------------------------
// Failure modes
// ---------------------------------------------------------------------------

#[test]
fn wrong_passphrase_is_an_authentication_failure() {
    let (_dir, store) = initialized_store();
    add(&store, "Bank", "p@ss");

    assert!(matches!(
        store.list(b"wrong"),
        Err(CitpassError::AuthenticationFailed)
    ));
    assert!(matches!(
        store.get(b"wrong", "Bank"),
        Err(CitpassError::AuthenticationFailed)
    ));
    assert!(matches!(
        store.remove(b"wrong", "Bank"),
        Err(CitpassError::AuthenticationFailed)
    ));
    assert_eq!(store.titles(PASS).unwrap(), ["Bank"]);
}

#[test]
fn tampered_entry_file_is_rejected() {
    let (_dir, store) = initialized_store();
    let id = add(&store, "Bank", "p@ss");

    let path = root(&store).join(&id);
    let mut bytes = fs::read(&path).unwrap();
    let last = bytes.len() - 1;
    bytes[last] ^= 0x01;
    fs::write(&path, bytes).unwrap();

    assert!(matches!(
        store.get(PASS, "Bank"),
        Err(CitpassError::AuthenticationFailed)
    ));
}

#[test]
fn oversized_index_is_refused_before_reading() {
    let (_dir, store) = initialized_store();
    let limit = store.config().max_blob_bytes;
    let file_len = HEADER_LEN + usize::try_from(limit).unwrap() + 1;
    fs::write(store.config().index_path(), vec![0u8; file_len]).unwrap();

    for result in [
        store.list(PASS).map(|_| ()),
        store.get(PASS, "Bank").map(|_| ()),
        store.remove(PASS, "Bank").map(|_| ()),
    ] {
        assert!(matches!(
            result,
            Err(CitpassError::SizeLimitExceeded { size, limit: l, .. })
                if size == limit + 1 && l == limit
        ));
    }
}

/// An index whose plaintext seals to exactly `payload_len` bytes.
fn index_with_payload_len(payload_len: usize) -> Index {
    let id = IdentifierGenerator::with_seed(3).produce(50);
    let overhead = HEADER_ROW.len() + 1 + id.len() + 1 + TAG_LEN;
    let text = format!("{HEADER_ROW}\n{id},{}", "t".repeat(payload_len - overhead));
    let index = Index::parse(text.as_bytes()).unwrap();
    assert_eq!(index.to_bytes().len() + TAG_LEN, payload_len);
    index
}

#[test]
fn index_at_exactly_the_limit_is_readable() {
    let (_dir, store) = initialized_store();
    let limit = store.config().max_blob_bytes;
    let index = index_with_payload_len(usize::try_from(limit).unwrap());

    store.index().save(PASS, &index).unwrap();

    let rows = store.list(PASS).unwrap();
    assert_eq!(rows.len(), 1);
    assert_eq!(rows[0].title.len(), index.entries()[0].title.len());
}

#[test]
fn index_one_byte_over_the_limit_is_never_written() {
    let (_dir, store) = initialized_store();
    add(&store, "Bank", "p@ss");
    let before = fs::read(store.config().index_path()).unwrap();

    let limit = store.config().max_blob_bytes;
    let index = index_with_payload_len(usize::try_from(limit).unwrap() + 1);

    assert!(matches!(
        store.index().save(PASS, &index),
        Err(CitpassError::SizeLimitExceeded { size, limit: l, .. })
            if size == limit + 1 && l == limit
    ));
    assert_eq!(fs::read(store.config().index_path()).unwrap(), before);
    assert_eq!(store.titles(PASS).unwrap(), ["Bank"]);
}

#[test]
fn oversized_entry_is_refused_and_store_stays_readable() {
    let (_dir, store) = initialized_store();
    add(&store, "Bank", "p@ss");

    let mut huge = entry("Huge", "x");
    huge.notes = "n".repeat(1_000_000);
    let err = store
        .add(PASS, &huge, &mut IdentifierGenerator::from_clock())
        .unwrap_err();
    assert!(matches!(err, CitpassError::SizeLimitExceeded { .. }));

    assert_eq!(store.titles(PASS).unwrap(), ["Bank"]);
    assert_eq!(store.entries().identifiers().unwrap().len(), 1);
    assert!(store.check(PASS).unwrap().is_consistent());
}

#[test]
fn index_growth_past_the_limit_rolls_back_the_entry() {
    // Room for a handful of 50-character rows, far less than any entry cap.
    let (_dir, store) = test_store_with_limit(300);
    store.init(PASS).unwrap();

    let mut added = 0;
    let err = loop {
        let title = format!("t{added}");
        match store.add(PASS, &entry(&title, "x"), &mut IdentifierGenerator::from_clock()) {
            Ok(_) => added += 1,
            Err(e) => break e,
        }
        assert!(added < 10, "index never hit the limit");
    };

    assert!(matches!(err, CitpassError::SizeLimitExceeded { .. }));
    assert!(added >= 1);
    assert_eq!(store.list(PASS).unwrap().len(), added);
    assert_eq!(store.entries().identifiers().unwrap().len(), added);
    assert!(store.check(PASS).unwrap().is_consistent());
}

#[test]
fn truncated_index_is_a_format_error() {
    let (_dir, store) = initialized_store();
    fs::write(store.config().index_path(), b"CTPS").unwrap();

    assert!(matches!(
        store.list(PASS),
        Err(CitpassError::InvalidBlobFormat(_))
    ));
}

// ---------------------------------------------------------------------------
// check / on-disk hygiene
// ---------------------------------------------------------------------------

#[test]
fn check_reports_dangling_rows_and_orphans() {
    let (_dir, store) = initialized_store();
    let bank = add(&store, "Bank", "p@ss");
    add(&store, "Mail", "m");
    assert!(store.check(PASS).unwrap().is_consistent());

    fs::remove_file(root(&store).join(&bank)).unwrap();
    fs::write(root(&store).join("strayfile123"), b"x").unwrap();

    let report = store.check(PASS).unwrap();
    assert!(!report.is_consistent());
    assert_eq!(report.dangling.len(), 1);
    assert_eq!(report.dangling[0].title, "Bank");
    assert_eq!(report.orphans, ["strayfile123"]);
}

#[test]
fn no_temp_files_are_left_behind() {
    let (_dir, store) = initialized_store();
    add(&store, "Bank", "p@ss");
    add(&store, "Mail", "m");
    store.remove(PASS, "Bank").unwrap();

    let leftovers: Vec<String> = fs::read_dir(root(&store))
        .unwrap()
        .map(|d| d.unwrap().file_name().to_string_lossy().into_owned())
        .filter(|name| name.ends_with(".tmp"))
        .collect();
    assert!(leftovers.is_empty(), "leftover temp files: {leftovers:?}");
}

#[cfg(unix)]
#[test]
fn sealed_files_are_owner_only() {
    use std::os::unix::fs::PermissionsExt;

    let (_dir, store) = initialized_store();
    let id = add(&store, "Bank", "p@ss");

    for path in [store.config().index_path(), root(&store).join(&id)] {
        let mode = fs::metadata(&path).unwrap().permissions().mode();
        assert_eq!(mode & 0o777, 0o600, "{}", path.display());
    }
}
