#[cfg(feature = "sqlite-backend")]
use std::collections::HashSet;

#[cfg(feature = "sqlite-backend")]
use chrono::Local;
#[cfg(feature = "sqlite-backend")]
use mailstore_lib::{
    conformance, AttachmentStore, BackendBuilder, BackendCapabilities, BackendConfig, Capability,
    FetchType, Flags, Mailbox, MailboxMessage, MailboxPath, MessageStore, SqliteBackend,
    SqliteConfig, UidRange,
};

#[cfg(feature = "sqlite-backend")]
struct SqliteProvider {
    backend: SqliteBackend,
}

#[cfg(feature = "sqlite-backend")]
impl conformance::StoreProvider for SqliteProvider {
    fn attachment_store(&self) -> &dyn AttachmentStore {
        &self.backend
    }

    fn message_store(&self) -> &dyn MessageStore {
        &self.backend
    }

    fn unsupported_capabilities(&self) -> HashSet<Capability> {
        self.backend.unsupported_capabilities()
    }
}

#[cfg(feature = "sqlite-backend")]
#[test]
fn test_sqlite_backend_conformance() {
    env_logger::builder().is_test(true).try_init().ok();

    let db_dir = tempfile::tempdir().unwrap();
    let config = SqliteConfig {
        db_path: db_dir.path().join("mailstore.sqlite"),
    };
    let provider = SqliteProvider {
        backend: SqliteBackend::new(&config).unwrap(),
    };
    let report = conformance::run(&provider).unwrap();

    // The sqlite backend does not implement the partial attachment
    // fetch optimization: the omission scenarios are skipped and the
    // inverse one runs instead.
    assert_eq!(
        vec![
            "messages_fetched_headers_should_omit_attachments",
            "messages_fetched_metadata_should_omit_attachments",
        ],
        report.skipped
    );
    assert!(report
        .passed
        .contains(&"messages_fetched_headers_should_load_attachments_without_partial_fetch"));
}

#[cfg(feature = "sqlite-backend")]
#[test]
fn test_sqlite_backend() {
    env_logger::builder().is_test(true).try_init().ok();

    let db_dir = tempfile::tempdir().unwrap();
    let config = BackendConfig::Sqlite(SqliteConfig {
        db_path: db_dir.path().join("mailstore.sqlite"),
    });
    let store = BackendBuilder::build_message_store(&config).unwrap();
    let mailbox = Mailbox::new(MailboxPath::new("#private", "bob", "INBOX"), 42);

    // check that uids and mod-seqs survive a fresh connection to the
    // same database file
    let content = "Subject: Hello \n\nHello from sqlite.\n";
    for _ in 0..2 {
        let mut message = MailboxMessage::new(
            Local::now(),
            content.as_bytes().to_vec(),
            16,
            Flags::default(),
            Vec::new(),
        );
        store.add_message(&mailbox, &mut message).unwrap();
    }
    assert_eq!(2, store.highest_mod_seq(&mailbox).unwrap());
    drop(store);

    let store = BackendBuilder::build_message_store(&config).unwrap();
    assert_eq!(2, store.highest_mod_seq(&mailbox).unwrap());

    let found = store
        .find_in_mailbox(&mailbox, UidRange::All, FetchType::Full, 10)
        .unwrap();
    assert_eq!(2, found.len());
    assert_eq!(vec![1, 2], found.iter().map(|m| m.uid).collect::<Vec<_>>());
    assert_eq!(content.as_bytes().to_vec(), found[0].content);
}
