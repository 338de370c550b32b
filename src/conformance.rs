//! Conformance module.
//!
//! This module contains the backend-agnostic scenario suite verifying
//! that every backend satisfies the same storage contract. Backends
//! declare the capabilities they do not implement; scenarios whose
//! preconditions require one of them are skipped, scenarios gated the
//! other way around run instead, and everything else runs identically
//! against every backend.

use chrono::Local;
use log::debug;
use std::{collections::HashSet, result};
use thiserror::Error;

use crate::{
    backend, Attachment, AttachmentId, AttachmentStore, Capability, Cid, FetchType, Flags,
    Mailbox, MailboxMessage, MailboxPath, MessageAttachment, MessageAttachmentPointer,
    MessageStore, UidRange,
};

#[derive(Debug, Error)]
pub enum Error {
    #[error("contract violated: {0}")]
    ContractViolation(String),

    #[error(transparent)]
    BackendError(#[from] backend::Error),
}

pub type Result<T> = result::Result<T, Error>;

/// What a backend under test exposes to the suite: its two stores and
/// its capability declaration.
pub trait StoreProvider {
    fn attachment_store(&self) -> &dyn AttachmentStore;
    fn message_store(&self) -> &dyn MessageStore;
    fn unsupported_capabilities(&self) -> HashSet<Capability>;
}

/// Represents the result of one scenario run.
#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub enum Outcome {
    Passed,
    /// The scenario's preconditions require a capability the backend
    /// declares unsupported.
    Skipped,
}

/// Represents the outcome of a full suite run. A contract violation
/// aborts the run with an error instead of being recorded here.
#[derive(Debug, Default)]
pub struct Report {
    pub passed: Vec<&'static str>,
    pub skipped: Vec<&'static str>,
}

type ScenarioFn = fn(&dyn StoreProvider) -> Result<Outcome>;

const SCENARIOS: &[(&str, ScenarioFn)] = &[
    (
        "attachment_store_should_round_trip_payloads",
        attachment_store_should_round_trip_payloads,
    ),
    (
        "store_attachment_should_overwrite_existing_id",
        store_attachment_should_overwrite_existing_id,
    ),
    (
        "get_attachments_should_return_only_existing_ids",
        get_attachments_should_return_only_existing_ids,
    ),
    (
        "attachments_by_id_should_be_empty_when_ids_absent",
        attachments_by_id_should_be_empty_when_ids_absent,
    ),
    (
        "attachments_by_id_should_be_keyed_by_id",
        attachments_by_id_should_be_keyed_by_id,
    ),
    (
        "messages_fetched_full_should_have_attachments_when_one",
        messages_fetched_full_should_have_attachments_when_one,
    ),
    (
        "messages_fetched_full_should_have_attachments_when_two",
        messages_fetched_full_should_have_attachments_when_two,
    ),
    (
        "messages_fetched_full_should_have_no_attachment_when_none",
        messages_fetched_full_should_have_no_attachment_when_none,
    ),
    (
        "messages_fetched_full_should_drop_dangling_pointers",
        messages_fetched_full_should_drop_dangling_pointers,
    ),
    (
        "messages_fetched_body_should_have_attachments",
        messages_fetched_body_should_have_attachments,
    ),
    (
        "messages_fetched_headers_should_omit_attachments",
        messages_fetched_headers_should_omit_attachments,
    ),
    (
        "messages_fetched_metadata_should_omit_attachments",
        messages_fetched_metadata_should_omit_attachments,
    ),
    (
        "messages_fetched_headers_should_load_attachments_without_partial_fetch",
        messages_fetched_headers_should_load_attachments_without_partial_fetch,
    ),
    (
        "fetch_type_should_limit_loaded_content",
        fetch_type_should_limit_loaded_content,
    ),
    (
        "highest_mod_seq_should_be_zero_for_untouched_mailbox",
        highest_mod_seq_should_be_zero_for_untouched_mailbox,
    ),
    (
        "highest_mod_seq_should_strictly_increase_across_adds",
        highest_mod_seq_should_strictly_increase_across_adds,
    ),
    (
        "find_in_mailbox_should_order_by_ascending_uid_and_honor_limit",
        find_in_mailbox_should_order_by_ascending_uid_and_honor_limit,
    ),
    (
        "find_in_mailbox_should_return_empty_when_range_matches_nothing",
        find_in_mailbox_should_return_empty_when_range_matches_nothing,
    ),
];

/// Runs the whole scenario suite against the given provider. Returns
/// the report of passed and skipped scenarios, or the first contract
/// violation with the offending scenario named.
pub fn run(provider: &dyn StoreProvider) -> Result<Report> {
    let mut report = Report::default();

    for &(name, scenario) in SCENARIOS {
        debug!("run scenario: {:?}", name);
        match scenario(provider) {
            Ok(Outcome::Passed) => report.passed.push(name),
            Ok(Outcome::Skipped) => report.skipped.push(name),
            Err(Error::ContractViolation(detail)) => {
                return Err(Error::ContractViolation(format!("{}: {}", name, detail)))
            }
            Err(err) => return Err(err),
        }
    }

    Ok(report)
}

const UID_VALIDITY: u32 = 42;
const LIMIT: usize = 10;
const BODY_START: usize = 16;

fn ensure(condition: bool, detail: impl ToString) -> Result<()> {
    if condition {
        Ok(())
    } else {
        Err(Error::ContractViolation(detail.to_string()))
    }
}

fn lacks_any(provider: &dyn StoreProvider, capabilities: &[Capability]) -> bool {
    let unsupported = provider.unsupported_capabilities();
    capabilities
        .iter()
        .any(|capability| unsupported.contains(capability))
}

fn new_mailbox() -> Mailbox {
    Mailbox::new(
        MailboxPath::new("#private", "ben", "Attachments"),
        UID_VALIDITY,
    )
}

fn new_message(content: &str, pointers: Vec<MessageAttachmentPointer>) -> MailboxMessage {
    MailboxMessage::new(
        Local::now(),
        content.as_bytes().to_vec(),
        BODY_START,
        Flags::default(),
        pointers,
    )
}

struct MessageFixture {
    mailbox: Mailbox,
    without_attachment: MailboxMessage,
    with_one_attachment: MailboxMessage,
    with_two_attachments: MailboxMessage,
    expected_one: Vec<MessageAttachment>,
    expected_two: Vec<MessageAttachment>,
}

/// Replicates the reference data set: attachments "123" and "456",
/// one message referencing the first inline, one referencing both and
/// one referencing nothing.
fn prepare_message_fixture(provider: &dyn StoreProvider) -> Result<MessageFixture> {
    let attachment = Attachment::new("123", b"attachment".to_vec(), "content");
    let attachment2 = Attachment::new("456", b"attachment2".to_vec(), "content");
    provider.attachment_store().store_attachment(&attachment)?;
    provider.attachment_store().store_attachment(&attachment2)?;

    let pointer = MessageAttachmentPointer::new("123", None, Some(Cid::from("cid")), true);
    let pointer2 = MessageAttachmentPointer::new("456", None, Some(Cid::from("cid2")), false);

    let mailbox = new_mailbox();
    let store = provider.message_store();

    let mut without_attachment = new_message("Subject: Test1 \n\nBody1\n.\n", Vec::new());
    store.add_message(&mailbox, &mut without_attachment)?;
    let mut with_one_attachment =
        new_message("Subject: Test7 \n\nBody7\n.\n", vec![pointer.clone()]);
    store.add_message(&mailbox, &mut with_one_attachment)?;
    let mut with_two_attachments = new_message(
        "Subject: Test8 \n\nBody8\n.\n",
        vec![pointer.clone(), pointer2.clone()],
    );
    store.add_message(&mailbox, &mut with_two_attachments)?;

    let expected_one = vec![MessageAttachment::new(
        attachment.clone(),
        None,
        Some(Cid::from("cid")),
        true,
    )];
    let expected_two = vec![
        MessageAttachment::new(attachment, None, Some(Cid::from("cid")), true),
        MessageAttachment::new(attachment2, None, Some(Cid::from("cid2")), false),
    ];

    Ok(MessageFixture {
        mailbox,
        without_attachment,
        with_one_attachment,
        with_two_attachments,
        expected_one,
        expected_two,
    })
}

fn fetch_attachments(
    provider: &dyn StoreProvider,
    fixture: &MessageFixture,
    message: &MailboxMessage,
    fetch_type: FetchType,
) -> Result<Vec<MessageAttachment>> {
    let messages = provider.message_store().find_in_mailbox(
        &fixture.mailbox,
        UidRange::One(message.uid),
        fetch_type,
        LIMIT,
    )?;
    match messages.into_iter().next() {
        Some(found) => Ok(found.attachments),
        None => Err(Error::ContractViolation(format!(
            "expected message with uid {} to be found",
            message.uid
        ))),
    }
}

fn attachment_store_should_round_trip_payloads(
    provider: &dyn StoreProvider,
) -> Result<Outcome> {
    if lacks_any(provider, &[Capability::AttachmentStorage]) {
        return Ok(Outcome::Skipped);
    }

    let attachment = Attachment::new("round-trip", b"round trip payload".to_vec(), "type");
    let store = provider.attachment_store();
    store.store_attachment(&attachment)?;

    let found = store.get_attachments(&HashSet::from([attachment.id.clone()]))?;
    ensure(
        found == vec![attachment],
        format!("stored attachment came back altered: {:?}", found),
    )?;

    Ok(Outcome::Passed)
}

fn store_attachment_should_overwrite_existing_id(
    provider: &dyn StoreProvider,
) -> Result<Outcome> {
    if lacks_any(provider, &[Capability::AttachmentStorage]) {
        return Ok(Outcome::Skipped);
    }

    let store = provider.attachment_store();
    let first = Attachment::new("overwrite", b"first payload".to_vec(), "type");
    store.store_attachment(&first)?;
    let second = Attachment::new("overwrite", b"second payload".to_vec(), "type2");
    store.store_attachment(&second)?;

    let found = store.get_attachments(&HashSet::from([second.id.clone()]))?;
    ensure(
        found == vec![second],
        format!(
            "storing under an existing id should replace the payload, got {:?}",
            found
        ),
    )?;

    Ok(Outcome::Passed)
}

fn get_attachments_should_return_only_existing_ids(
    provider: &dyn StoreProvider,
) -> Result<Outcome> {
    if lacks_any(provider, &[Capability::AttachmentStorage]) {
        return Ok(Outcome::Skipped);
    }

    let attachment = Attachment::new("123", b"attachment".to_vec(), "content");
    let store = provider.attachment_store();
    store.store_attachment(&attachment)?;

    let ids = HashSet::from([attachment.id.clone(), AttachmentId::from("unknown")]);
    let found = store.get_attachments(&ids)?;
    ensure(
        found == vec![attachment],
        format!("absent ids should shrink the result, got {:?}", found),
    )?;

    Ok(Outcome::Passed)
}

fn attachments_by_id_should_be_empty_when_ids_absent(
    provider: &dyn StoreProvider,
) -> Result<Outcome> {
    if lacks_any(provider, &[Capability::AttachmentStorage]) {
        return Ok(Outcome::Skipped);
    }

    let ids = HashSet::from([AttachmentId::from("ghost1"), AttachmentId::from("ghost2")]);
    let by_id = provider.attachment_store().attachments_by_id(&ids)?;
    ensure(
        by_id.is_empty(),
        format!("expected an empty mapping, got {} entries", by_id.len()),
    )?;

    Ok(Outcome::Passed)
}

fn attachments_by_id_should_be_keyed_by_id(provider: &dyn StoreProvider) -> Result<Outcome> {
    if lacks_any(provider, &[Capability::AttachmentStorage]) {
        return Ok(Outcome::Skipped);
    }

    let attachment = Attachment::new("123", b"attachment".to_vec(), "content");
    let attachment2 = Attachment::new("456", b"attachment2".to_vec(), "content");
    let store = provider.attachment_store();
    store.store_attachment(&attachment)?;
    store.store_attachment(&attachment2)?;

    let ids = HashSet::from([attachment.id.clone(), attachment2.id.clone()]);
    let by_id = store.attachments_by_id(&ids)?;
    ensure(by_id.len() == 2, format!("expected 2 entries, got {}", by_id.len()))?;
    ensure(
        by_id.get(&attachment.id) == Some(&attachment)
            && by_id.get(&attachment2.id) == Some(&attachment2),
        "mapping keys do not match the stored attachments",
    )?;

    Ok(Outcome::Passed)
}

fn messages_fetched_full_should_have_attachments_when_one(
    provider: &dyn StoreProvider,
) -> Result<Outcome> {
    if lacks_any(
        provider,
        &[Capability::MessageStorage, Capability::AttachmentStorage],
    ) {
        return Ok(Outcome::Skipped);
    }

    let fixture = prepare_message_fixture(provider)?;
    let attachments = fetch_attachments(
        provider,
        &fixture,
        &fixture.with_one_attachment,
        FetchType::Full,
    )?;
    ensure(
        attachments == fixture.expected_one,
        format!("unexpected attachments: {:?}", attachments),
    )?;

    Ok(Outcome::Passed)
}

fn messages_fetched_full_should_have_attachments_when_two(
    provider: &dyn StoreProvider,
) -> Result<Outcome> {
    if lacks_any(
        provider,
        &[Capability::MessageStorage, Capability::AttachmentStorage],
    ) {
        return Ok(Outcome::Skipped);
    }

    let fixture = prepare_message_fixture(provider)?;
    let attachments = fetch_attachments(
        provider,
        &fixture,
        &fixture.with_two_attachments,
        FetchType::Full,
    )?;
    ensure(
        attachments == fixture.expected_two,
        format!("unexpected attachments: {:?}", attachments),
    )?;

    Ok(Outcome::Passed)
}

fn messages_fetched_full_should_have_no_attachment_when_none(
    provider: &dyn StoreProvider,
) -> Result<Outcome> {
    if lacks_any(
        provider,
        &[Capability::MessageStorage, Capability::AttachmentStorage],
    ) {
        return Ok(Outcome::Skipped);
    }

    let fixture = prepare_message_fixture(provider)?;
    let attachments = fetch_attachments(
        provider,
        &fixture,
        &fixture.without_attachment,
        FetchType::Full,
    )?;
    ensure(
        attachments.is_empty(),
        format!("expected no attachment, got {:?}", attachments),
    )?;

    Ok(Outcome::Passed)
}

/// A persisted pointer whose attachment was never stored is dropped on
/// fetch, not surfaced as an error or a hole in the list.
fn messages_fetched_full_should_drop_dangling_pointers(
    provider: &dyn StoreProvider,
) -> Result<Outcome> {
    if lacks_any(
        provider,
        &[Capability::MessageStorage, Capability::AttachmentStorage],
    ) {
        return Ok(Outcome::Skipped);
    }

    let mailbox = new_mailbox();
    let store = provider.message_store();
    let pointer = MessageAttachmentPointer::new("never-stored", None, None, false);
    let mut message = new_message("Subject: Test1 \n\nBody1\n.\n", vec![pointer]);
    store.add_message(&mailbox, &mut message)?;

    let messages =
        store.find_in_mailbox(&mailbox, UidRange::One(message.uid), FetchType::Full, LIMIT)?;
    ensure(
        messages.len() == 1,
        format!("expected exactly one message, got {}", messages.len()),
    )?;
    ensure(
        messages[0].attachments.is_empty(),
        format!(
            "dangling pointer should resolve to nothing, got {:?}",
            messages[0].attachments
        ),
    )?;

    Ok(Outcome::Passed)
}

fn messages_fetched_body_should_have_attachments(
    provider: &dyn StoreProvider,
) -> Result<Outcome> {
    if lacks_any(
        provider,
        &[Capability::MessageStorage, Capability::AttachmentStorage],
    ) {
        return Ok(Outcome::Skipped);
    }

    let fixture = prepare_message_fixture(provider)?;
    let attachments = fetch_attachments(
        provider,
        &fixture,
        &fixture.with_one_attachment,
        FetchType::Body,
    )?;
    ensure(
        attachments == fixture.expected_one,
        format!("unexpected attachments: {:?}", attachments),
    )?;

    Ok(Outcome::Passed)
}

fn messages_fetched_headers_should_omit_attachments(
    provider: &dyn StoreProvider,
) -> Result<Outcome> {
    if lacks_any(
        provider,
        &[
            Capability::MessageStorage,
            Capability::AttachmentStorage,
            Capability::PartialAttachmentFetch,
        ],
    ) {
        return Ok(Outcome::Skipped);
    }

    let fixture = prepare_message_fixture(provider)?;
    let attachments = fetch_attachments(
        provider,
        &fixture,
        &fixture.with_one_attachment,
        FetchType::Headers,
    )?;
    ensure(
        attachments.is_empty(),
        format!("headers fetch should omit attachments, got {:?}", attachments),
    )?;

    Ok(Outcome::Passed)
}

fn messages_fetched_metadata_should_omit_attachments(
    provider: &dyn StoreProvider,
) -> Result<Outcome> {
    if lacks_any(
        provider,
        &[
            Capability::MessageStorage,
            Capability::AttachmentStorage,
            Capability::PartialAttachmentFetch,
        ],
    ) {
        return Ok(Outcome::Skipped);
    }

    let fixture = prepare_message_fixture(provider)?;
    let attachments = fetch_attachments(
        provider,
        &fixture,
        &fixture.with_one_attachment,
        FetchType::Metadata,
    )?;
    ensure(
        attachments.is_empty(),
        format!("metadata fetch should omit attachments, got {:?}", attachments),
    )?;

    Ok(Outcome::Passed)
}

/// Inverse of the partial fetch scenarios: a backend without the
/// optimization materializes attachments on a headers read too.
fn messages_fetched_headers_should_load_attachments_without_partial_fetch(
    provider: &dyn StoreProvider,
) -> Result<Outcome> {
    if lacks_any(
        provider,
        &[Capability::MessageStorage, Capability::AttachmentStorage],
    ) {
        return Ok(Outcome::Skipped);
    }
    if !lacks_any(provider, &[Capability::PartialAttachmentFetch]) {
        return Ok(Outcome::Skipped);
    }

    let fixture = prepare_message_fixture(provider)?;
    let attachments = fetch_attachments(
        provider,
        &fixture,
        &fixture.with_one_attachment,
        FetchType::Headers,
    )?;
    ensure(
        attachments == fixture.expected_one,
        format!("expected materialized attachments, got {:?}", attachments),
    )?;

    Ok(Outcome::Passed)
}

fn fetch_type_should_limit_loaded_content(provider: &dyn StoreProvider) -> Result<Outcome> {
    if lacks_any(provider, &[Capability::MessageStorage]) {
        return Ok(Outcome::Skipped);
    }

    let mailbox = new_mailbox();
    let store = provider.message_store();
    let content = "Subject: Test1 \n\nBody1\n.\n";
    let mut message = new_message(content, Vec::new());
    store.add_message(&mailbox, &mut message)?;

    let range = UidRange::One(message.uid);
    let metadata = store.find_in_mailbox(&mailbox, range, FetchType::Metadata, LIMIT)?;
    ensure(
        metadata.len() == 1,
        format!("expected exactly one message, got {}", metadata.len()),
    )?;
    ensure(
        metadata[0].content.is_empty(),
        "metadata fetch should load no content",
    )?;

    let headers = store.find_in_mailbox(&mailbox, range, FetchType::Headers, LIMIT)?;
    ensure(
        headers.len() == 1 && headers[0].content == content.as_bytes()[..BODY_START],
        "headers fetch should load the header section only",
    )?;

    let full = store.find_in_mailbox(&mailbox, range, FetchType::Full, LIMIT)?;
    ensure(
        full.len() == 1 && full[0].content == content.as_bytes(),
        "full fetch should load the whole content",
    )?;

    Ok(Outcome::Passed)
}

fn highest_mod_seq_should_be_zero_for_untouched_mailbox(
    provider: &dyn StoreProvider,
) -> Result<Outcome> {
    if lacks_any(provider, &[Capability::MessageStorage]) {
        return Ok(Outcome::Skipped);
    }

    let mod_seq = provider.message_store().highest_mod_seq(&new_mailbox())?;
    ensure(
        mod_seq == 0,
        format!("expected mod-seq 0 for a fresh mailbox, got {}", mod_seq),
    )?;

    Ok(Outcome::Passed)
}

fn highest_mod_seq_should_strictly_increase_across_adds(
    provider: &dyn StoreProvider,
) -> Result<Outcome> {
    if lacks_any(provider, &[Capability::MessageStorage]) {
        return Ok(Outcome::Skipped);
    }

    let mailbox = new_mailbox();
    let store = provider.message_store();
    let mut previous = store.highest_mod_seq(&mailbox)?;

    for n in 0..3 {
        let mut message = new_message("Subject: Test1 \n\nBody1\n.\n", Vec::new());
        store.add_message(&mailbox, &mut message)?;
        let current = store.highest_mod_seq(&mailbox)?;
        ensure(
            current > previous,
            format!(
                "mod-seq did not increase on add {}: {} -> {}",
                n, previous, current
            ),
        )?;
        previous = current;
    }

    Ok(Outcome::Passed)
}

fn find_in_mailbox_should_order_by_ascending_uid_and_honor_limit(
    provider: &dyn StoreProvider,
) -> Result<Outcome> {
    if lacks_any(provider, &[Capability::MessageStorage]) {
        return Ok(Outcome::Skipped);
    }

    let mailbox = new_mailbox();
    let store = provider.message_store();
    let mut uids = Vec::new();
    for _ in 0..3 {
        let mut message = new_message("Subject: Test1 \n\nBody1\n.\n", Vec::new());
        store.add_message(&mailbox, &mut message)?;
        uids.push(message.uid);
    }

    let all = store.find_in_mailbox(&mailbox, UidRange::All, FetchType::Metadata, LIMIT)?;
    let found: Vec<_> = all.iter().map(|message| message.uid).collect();
    ensure(
        found == uids,
        format!("expected ascending uids {:?}, got {:?}", uids, found),
    )?;

    let limited = store.find_in_mailbox(&mailbox, UidRange::All, FetchType::Metadata, 2)?;
    let found: Vec<_> = limited.iter().map(|message| message.uid).collect();
    ensure(
        found == uids[..2],
        format!("expected limit to keep {:?}, got {:?}", &uids[..2], found),
    )?;

    Ok(Outcome::Passed)
}

fn find_in_mailbox_should_return_empty_when_range_matches_nothing(
    provider: &dyn StoreProvider,
) -> Result<Outcome> {
    if lacks_any(provider, &[Capability::MessageStorage]) {
        return Ok(Outcome::Skipped);
    }

    let messages = provider.message_store().find_in_mailbox(
        &new_mailbox(),
        UidRange::One(999),
        FetchType::Full,
        LIMIT,
    )?;
    ensure(
        messages.is_empty(),
        format!("expected no message, got {}", messages.len()),
    )?;

    Ok(Outcome::Passed)
}
