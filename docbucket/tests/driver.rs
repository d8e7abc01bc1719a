use serde::{Deserialize, Serialize};

use docbucket::{key::sequence_key, prelude::*};

#[ctor::ctor]
fn init() {
    colog::init();
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, Document)]
struct Note {
    #[document(key)]
    #[serde(rename = "_id", default)]
    id: String,
    body: String,
}

impl Note {
    fn new(body: &str) -> Self {
        Self { id: String::new(), body: body.to_string() }
    }
}

#[test]
fn documents_survive_reopening_the_file() {
    let dir = tempfile::tempdir().unwrap();
    let config = DriverConfig::builder().path(dir.path().join("notes.redb")).build();

    {
        let driver = Driver::open(config.clone()).unwrap();
        let notes = driver.collection::<Note>("notes").unwrap();
        notes.insert_many([Note::new("first"), Note::new("second")]).unwrap();
        driver.write_metadata("owner", "docs team").unwrap();
        driver.close();
    }

    let driver = Driver::open(config).unwrap();
    assert_eq!(driver.get_collections().unwrap(), vec!["notes"]);
    assert_eq!(driver.read_metadata("owner").unwrap(), serde_json::json!("docs team"));

    let notes = driver.collection::<Note>("notes").unwrap();
    assert_eq!(notes.count().unwrap(), 2);

    // the sequence carries on where the previous session stopped
    let key = notes.insert(Note::new("third")).unwrap();
    assert_eq!(key, sequence_key(3));
    assert_eq!(notes.find_one(|_| true).unwrap().body, "third");
}

#[test]
fn codec_decides_the_stored_bytes() {
    let dir = tempfile::tempdir().unwrap();
    let config = DriverConfig::builder().path(dir.path().join("notes.redb")).build();

    let key = {
        let driver = Driver::with_codec(config.clone(), BsonCodec).unwrap();
        let notes = driver.collection::<Note>("notes").unwrap();
        let key = notes.insert(Note::new("encoded as bson")).unwrap();
        assert_eq!(notes.find_by_key(&key).unwrap().body, "encoded as bson");
        driver.close();
        key
    };

    // BSON records are unreadable as JSON: lookups skip them, scans fail
    let driver = Driver::open(config).unwrap();
    let notes = driver.collection::<Note>("notes").unwrap();
    assert!(notes.find_by_key(&key).unwrap_err().is_not_found());
    assert!(matches!(notes.find_one(|_| true), Err(DocumentStoreError::Decode(_))));
}

#[test]
fn drop_requires_opt_in() {
    let driver = Driver::in_memory().unwrap();
    let notes = driver.collection::<Note>("gated_notes").unwrap();
    notes.insert(Note::new("keep me")).unwrap();

    match notes.drop().unwrap_err() {
        DocumentStoreError::DropNotPermitted { variable, .. } => {
            assert_eq!(variable, "DOCBUCKET_ALLOW_DROP_GATED_NOTES");
        }
        other => panic!("unexpected error: {other}"),
    }
    assert_eq!(notes.count().unwrap(), 1);
    assert_eq!(driver.get_collections().unwrap(), vec!["gated_notes"]);
}

#[test]
fn drop_allowed_by_environment() {
    let driver = Driver::in_memory().unwrap();
    let notes = driver.collection::<Note>("env_notes").unwrap();
    notes.insert(Note::new("temporary")).unwrap();

    unsafe { std::env::set_var("DOCBUCKET_ALLOW_DROP_ENV_NOTES", "true") };
    notes.drop().unwrap();

    assert!(matches!(notes.find_one(|_| true), Err(DocumentStoreError::BucketNotFound(_))));
    assert!(matches!(notes.update_one(Note::new("late")), Err(DocumentStoreError::BucketNotFound(_))));
    assert!(driver.get_collections().unwrap().is_empty());
}

#[test]
fn drop_allowed_by_config() {
    let config = DriverConfig::builder().delete_no_verify(true).build();
    let driver = Driver::open(config).unwrap();
    let notes = driver.collection::<Note>("notes").unwrap();
    let archive = driver.collection::<Note>("archive").unwrap();
    notes.insert(Note::new("temporary")).unwrap();

    notes.drop().unwrap();
    assert_eq!(driver.get_collections().unwrap(), vec!["archive"]);
    assert_eq!(archive.count().unwrap(), 0);
}

#[test]
fn custom_prefix_names_the_variable() {
    let config = DriverConfig::builder().drop_env_prefix("NOTES_APP").build();
    let driver = Driver::open(config).unwrap();
    let notes = driver.collection::<Note>("drafts").unwrap();

    unsafe { std::env::set_var("NOTES_APP_ALLOW_DROP_DRAFTS", "1") };
    notes.drop().unwrap();
}

#[test]
fn closed_driver_rejects_everything_but_collection() {
    let driver = Driver::in_memory().unwrap();
    let notes = driver.collection::<Note>("notes").unwrap();
    notes.insert(Note::new("before close")).unwrap();
    driver.close();

    assert!(driver.is_closed());
    assert!(matches!(notes.insert(Note::new("after")), Err(DocumentStoreError::TransactionClosed)));
    assert!(matches!(notes.update_iter(Some), Err(DocumentStoreError::TransactionClosed)));
    assert!(matches!(notes.delete_iter(|_| true), Err(DocumentStoreError::TransactionClosed)));
    assert!(matches!(
        notes.query(Query::filter(|_: &Note| true)).error(),
        Some(DocumentStoreError::TransactionClosed)
    ));
    assert!(matches!(driver.write_metadata("k", 1), Err(DocumentStoreError::TransactionClosed)));
    assert!(matches!(driver.fields_of("notes"), Err(DocumentStoreError::TransactionClosed)));
}
