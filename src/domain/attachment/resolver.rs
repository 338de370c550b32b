//! Attachment resolver module.
//!
//! This module contains the resolver turning a message's attachment
//! pointers into read-ready attachment records with a single store
//! round trip.

use log::{debug, trace};
use std::collections::HashSet;

use crate::{backend, AttachmentId, AttachmentStore, MessageAttachment, MessageAttachmentPointer};

/// Joins message attachment pointers with their stored payloads.
///
/// The resolver issues exactly one store round trip per call: the
/// distinct ids referenced by the pointers are collected first, then
/// fetched in one batch, then joined back against every pointer. Two
/// pointers sharing an id each yield their own record over the same
/// payload.
pub struct AttachmentResolver<'a, S: AttachmentStore + ?Sized> {
    store: &'a S,
}

impl<'a, S: AttachmentStore + ?Sized> AttachmentResolver<'a, S> {
    pub fn new(store: &'a S) -> Self {
        Self { store }
    }

    /// Resolves the given pointers into read-ready attachments,
    /// preserving the pointer order.
    ///
    /// A pointer whose id has no stored payload is dropped from the
    /// output; absence is not an error. An empty pointer set resolves
    /// to an empty output without touching the store.
    pub fn resolve(
        &self,
        pointers: &[MessageAttachmentPointer],
    ) -> backend::Result<Vec<MessageAttachment>> {
        if pointers.is_empty() {
            return Ok(Vec::new());
        }

        let ids: HashSet<AttachmentId> = pointers
            .iter()
            .map(|pointer| pointer.attachment_id.clone())
            .collect();
        debug!("distinct attachment ids: {:?}", ids.len());

        let attachments_by_id = self.store.attachments_by_id(&ids)?;
        trace!("fetched attachments: {:?}", attachments_by_id.keys());

        Ok(pointers
            .iter()
            .filter_map(|pointer| {
                attachments_by_id.get(&pointer.attachment_id).map(|attachment| {
                    MessageAttachment::new(
                        attachment.clone(),
                        pointer.name.clone(),
                        pointer.cid.clone(),
                        pointer.is_inline,
                    )
                })
            })
            .collect())
    }
}

#[cfg(test)]
mod tests {
    use std::{
        collections::{HashMap, HashSet},
        sync::atomic::{AtomicUsize, Ordering},
    };

    use crate::{
        backend, Attachment, AttachmentId, AttachmentResolver, AttachmentStore,
        BackendCapabilities, Capability, MessageAttachment, MessageAttachmentPointer,
    };

    /// Attachment store stub counting its batch lookups.
    #[derive(Default)]
    struct StubStore {
        attachments: HashMap<AttachmentId, Attachment>,
        batch_gets: AtomicUsize,
    }

    impl StubStore {
        fn with(attachments: Vec<Attachment>) -> Self {
            Self {
                attachments: attachments
                    .into_iter()
                    .map(|attachment| (attachment.id.clone(), attachment))
                    .collect(),
                batch_gets: AtomicUsize::new(0),
            }
        }

        fn batch_get_count(&self) -> usize {
            self.batch_gets.load(Ordering::SeqCst)
        }
    }

    impl BackendCapabilities for StubStore {
        fn unsupported_capabilities(&self) -> HashSet<Capability> {
            HashSet::default()
        }
    }

    impl AttachmentStore for StubStore {
        fn store_attachment(&self, _attachment: &Attachment) -> backend::Result<()> {
            unimplemented!("read-only stub")
        }

        fn get_attachments(
            &self,
            ids: &HashSet<AttachmentId>,
        ) -> backend::Result<Vec<Attachment>> {
            self.batch_gets.fetch_add(1, Ordering::SeqCst);
            Ok(ids
                .iter()
                .filter_map(|id| self.attachments.get(id).cloned())
                .collect())
        }
    }

    #[test]
    fn resolve_should_return_empty_without_store_access_when_no_pointer() {
        let store = StubStore::default();
        let resolver = AttachmentResolver::new(&store);

        let resolved = resolver.resolve(&[]).unwrap();

        assert!(resolved.is_empty());
        assert_eq!(0, store.batch_get_count());
    }

    #[test]
    fn resolve_should_fan_out_duplicated_ids_with_one_round_trip() {
        let attachment = Attachment::new("1", b"attachment".to_vec(), "type");
        let store = StubStore::with(vec![attachment.clone()]);
        let resolver = AttachmentResolver::new(&store);

        let pointers = vec![
            MessageAttachmentPointer::new("1", Some("name1".into()), None, false),
            MessageAttachmentPointer::new("1", Some("name2".into()), None, false),
        ];
        let resolved = resolver.resolve(&pointers).unwrap();

        assert_eq!(
            vec![
                MessageAttachment::new(attachment.clone(), Some("name1".into()), None, false),
                MessageAttachment::new(attachment, Some("name2".into()), None, false),
            ],
            resolved
        );
        assert_eq!(1, store.batch_get_count());
    }

    #[test]
    fn resolve_should_return_one_record_per_pointer_when_ids_disjoint() {
        let attachment1 = Attachment::new("1", b"attachment1".to_vec(), "type");
        let attachment2 = Attachment::new("2", b"attachment2".to_vec(), "type");
        let store = StubStore::with(vec![attachment1.clone(), attachment2.clone()]);
        let resolver = AttachmentResolver::new(&store);

        let pointers = vec![
            MessageAttachmentPointer::new("1", Some("name1".into()), None, false),
            MessageAttachmentPointer::new("2", Some("name2".into()), None, false),
        ];
        let resolved = resolver.resolve(&pointers).unwrap();

        assert_eq!(
            vec![
                MessageAttachment::new(attachment1, Some("name1".into()), None, false),
                MessageAttachment::new(attachment2, Some("name2".into()), None, false),
            ],
            resolved
        );
        assert_eq!(1, store.batch_get_count());
    }

    #[test]
    fn resolve_should_drop_pointers_with_unknown_id() {
        let attachment = Attachment::new("1", b"attachment".to_vec(), "type");
        let store = StubStore::with(vec![attachment.clone()]);
        let resolver = AttachmentResolver::new(&store);

        let pointers = vec![
            MessageAttachmentPointer::new("1", None, Some("cid".into()), true),
            MessageAttachmentPointer::new("missing", None, None, false),
        ];
        let resolved = resolver.resolve(&pointers).unwrap();

        assert_eq!(
            vec![MessageAttachment::new(
                attachment,
                None,
                Some("cid".into()),
                true
            )],
            resolved
        );
    }
}
