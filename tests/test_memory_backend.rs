#[cfg(feature = "memory-backend")]
use std::collections::HashSet;

#[cfg(feature = "memory-backend")]
use chrono::Local;
#[cfg(feature = "memory-backend")]
use mailstore_lib::{
    conformance, Attachment, AttachmentStore, BackendCapabilities, Capability, Cid, FetchType,
    Flags, Mailbox, MailboxMessage, MailboxPath, MemoryBackend, MessageAttachmentPointer,
    MessageStore, UidRange,
};

#[cfg(feature = "memory-backend")]
struct MemoryProvider {
    backend: MemoryBackend,
}

#[cfg(feature = "memory-backend")]
impl conformance::StoreProvider for MemoryProvider {
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

#[cfg(feature = "memory-backend")]
#[test]
fn test_memory_backend_conformance() {
    env_logger::builder().is_test(true).try_init().ok();

    let provider = MemoryProvider {
        backend: MemoryBackend::new(),
    };
    let report = conformance::run(&provider).unwrap();

    // The memory backend supports the partial attachment fetch
    // optimization, so only the inverse scenario is skipped.
    assert_eq!(
        vec!["messages_fetched_headers_should_load_attachments_without_partial_fetch"],
        report.skipped
    );
    assert!(report
        .passed
        .contains(&"messages_fetched_headers_should_omit_attachments"));
}

#[cfg(feature = "memory-backend")]
#[test]
fn test_memory_backend() {
    env_logger::builder().is_test(true).try_init().ok();

    let backend = MemoryBackend::new();
    let mailbox = Mailbox::new(MailboxPath::new("#private", "alice", "INBOX"), 42);

    // check that an attachment can be stored and referenced
    let attachment = Attachment::new("logo", b"image bytes".to_vec(), "image/png");
    backend.store_attachment(&attachment).unwrap();

    let content = "Subject: Hello \n\nSee the attached logo.\n";
    let mut message = MailboxMessage::new(
        Local::now(),
        content.as_bytes().to_vec(),
        16,
        Flags::default(),
        vec![MessageAttachmentPointer::new(
            "logo",
            Some("logo.png".into()),
            Some(Cid::from("cid:logo")),
            true,
        )],
    );
    backend.add_message(&mailbox, &mut message).unwrap();
    assert_eq!(1, message.uid);
    assert_eq!(1, backend.highest_mod_seq(&mailbox).unwrap());

    // check that a full fetch materializes the attachment
    let found = backend
        .find_in_mailbox(&mailbox, UidRange::One(message.uid), FetchType::Full, 10)
        .unwrap();
    assert_eq!(1, found.len());
    assert_eq!(1, found[0].attachments.len());
    assert_eq!(attachment, found[0].attachments[0].attachment);
    assert_eq!(Some("logo.png".into()), found[0].attachments[0].name);

    // check that a headers fetch omits both body and attachments
    let found = backend
        .find_in_mailbox(&mailbox, UidRange::One(message.uid), FetchType::Headers, 10)
        .unwrap();
    assert_eq!(content.as_bytes()[..16].to_vec(), found[0].content);
    assert!(found[0].attachments.is_empty());

    // check that a pointer to a missing attachment is dropped, not
    // reported as an error
    let mut dangling = MailboxMessage::new(
        Local::now(),
        content.as_bytes().to_vec(),
        16,
        Flags::default(),
        vec![MessageAttachmentPointer::new("missing", None, None, false)],
    );
    backend.add_message(&mailbox, &mut dangling).unwrap();
    let found = backend
        .find_in_mailbox(&mailbox, UidRange::One(dangling.uid), FetchType::Full, 10)
        .unwrap();
    assert!(found[0].attachments.is_empty());
}
