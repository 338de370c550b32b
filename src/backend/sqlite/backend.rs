//! SQLite backend module.
//!
//! This module contains the definition of the SQLite backend and its
//! storage traits implementation. The backend does not declare the
//! partial attachment fetch optimization, so every fetch type
//! materializes attachments.

use chrono::{DateTime, Local};
use log::{debug, trace};
use rusqlite::{params, params_from_iter, types::Value, Connection, OptionalExtension};
use std::{
    collections::HashSet,
    path,
    result,
    sync::{Mutex, MutexGuard},
};
use thiserror::Error;

use crate::{
    backend, Attachment, AttachmentId, AttachmentResolver, AttachmentStore, BackendCapabilities,
    Capability, FetchType, Flags, Mailbox, MailboxMessage, MessageAttachmentPointer, MessageStore,
    SqliteConfig, Uid, UidRange,
};

#[derive(Debug, Error)]
pub enum Error {
    #[error("cannot open sqlite database {1}")]
    OpenDatabaseError(#[source] rusqlite::Error, path::PathBuf),
    #[error("cannot lock sqlite connection: {0}")]
    LockConnectionError(String),
    #[error("cannot store attachment {1}")]
    StoreAttachmentError(#[source] rusqlite::Error, String),
    #[error("cannot get attachments")]
    GetAttachmentsError(#[source] rusqlite::Error),
    #[error("cannot add message to mailbox {1}")]
    AddMessageError(#[source] rusqlite::Error, String),
    #[error("cannot get highest mod-seq of mailbox {1}")]
    GetHighestModSeqError(#[source] rusqlite::Error, String),
    #[error("cannot find messages in mailbox {1}")]
    FindInMailboxError(#[source] rusqlite::Error, String),
    #[error("cannot parse message internal date {1}")]
    ParseInternalDateError(#[source] chrono::ParseError, String),
}

pub type Result<T> = result::Result<T, Error>;

const CREATE_TABLES: &str = "
CREATE TABLE IF NOT EXISTS attachments (
    id           TEXT PRIMARY KEY,
    content_type TEXT NOT NULL,
    content      BLOB NOT NULL
);
CREATE TABLE IF NOT EXISTS mailboxes (
    id              TEXT PRIMARY KEY,
    highest_mod_seq INTEGER NOT NULL DEFAULT 0,
    last_uid        INTEGER NOT NULL DEFAULT 0
);
CREATE TABLE IF NOT EXISTS messages (
    mailbox_id    TEXT NOT NULL,
    uid           INTEGER NOT NULL,
    internal_date TEXT NOT NULL,
    flags         TEXT NOT NULL,
    mod_seq       INTEGER NOT NULL,
    body_start    INTEGER NOT NULL,
    content       BLOB NOT NULL,
    PRIMARY KEY (mailbox_id, uid)
);
CREATE TABLE IF NOT EXISTS message_attachments (
    mailbox_id    TEXT NOT NULL,
    uid           INTEGER NOT NULL,
    position      INTEGER NOT NULL,
    attachment_id TEXT NOT NULL,
    name          TEXT,
    cid           TEXT,
    is_inline     INTEGER NOT NULL,
    PRIMARY KEY (mailbox_id, uid, position)
);
";

const STORE_ATTACHMENT: &str =
    "INSERT OR REPLACE INTO attachments (id, content_type, content) VALUES (?, ?, ?)";

const ENSURE_MAILBOX: &str = "INSERT OR IGNORE INTO mailboxes (id) VALUES (?)";

const BUMP_MAILBOX_COUNTERS: &str =
    "UPDATE mailboxes SET last_uid = last_uid + 1, highest_mod_seq = highest_mod_seq + 1 WHERE id = ?";

const SELECT_MAILBOX_COUNTERS: &str =
    "SELECT last_uid, highest_mod_seq FROM mailboxes WHERE id = ?";

const SELECT_HIGHEST_MOD_SEQ: &str = "SELECT highest_mod_seq FROM mailboxes WHERE id = ?";

const INSERT_MESSAGE: &str = "
    INSERT INTO messages (mailbox_id, uid, internal_date, flags, mod_seq, body_start, content)
    VALUES (?, ?, ?, ?, ?, ?, ?)
";

const INSERT_MESSAGE_ATTACHMENT: &str = "
    INSERT INTO message_attachments (mailbox_id, uid, position, attachment_id, name, cid, is_inline)
    VALUES (?, ?, ?, ?, ?, ?, ?)
";

const SELECT_MESSAGE_ATTACHMENTS: &str = "
    SELECT attachment_id, name, cid, is_inline
    FROM message_attachments
    WHERE mailbox_id = ? AND uid = ?
    ORDER BY position
";

/// Represents the SQLite backend.
pub struct SqliteBackend {
    conn: Mutex<Connection>,
}

impl SqliteBackend {
    pub fn new(config: &SqliteConfig) -> Result<Self> {
        let conn = Connection::open(&config.db_path)
            .map_err(|err| Error::OpenDatabaseError(err, config.db_path.to_owned()))?;
        conn.execute_batch(CREATE_TABLES)
            .map_err(|err| Error::OpenDatabaseError(err, config.db_path.to_owned()))?;

        Ok(Self {
            conn: Mutex::new(conn),
        })
    }

    fn lock(&self) -> Result<MutexGuard<'_, Connection>> {
        self.conn
            .lock()
            .map_err(|err| Error::LockConnectionError(err.to_string()))
    }

    fn message_pointers(
        conn: &Connection,
        mailbox: &Mailbox,
        uid: Uid,
    ) -> rusqlite::Result<Vec<MessageAttachmentPointer>> {
        conn.prepare(SELECT_MESSAGE_ATTACHMENTS)?
            .query_map(params![mailbox.id.as_str(), uid], |row| {
                Ok(MessageAttachmentPointer {
                    attachment_id: AttachmentId::from(row.get::<_, String>(0)?),
                    name: row.get(1)?,
                    cid: row.get::<_, Option<String>>(2)?.map(Into::into),
                    is_inline: row.get(3)?,
                })
            })?
            .collect()
    }

    /// Applies the fetch type projection to a stored message. The
    /// backend lacks the partial attachment fetch optimization, so
    /// attachments are resolved whatever the fetch type.
    fn project(
        &self,
        mut message: MailboxMessage,
        fetch_type: FetchType,
    ) -> backend::Result<MailboxMessage> {
        match fetch_type {
            FetchType::Metadata => message.content = Vec::new(),
            FetchType::Headers => {
                message.content.truncate(message.body_start.min(message.content.len()))
            }
            FetchType::Body | FetchType::Full => (),
        }

        message.attachments =
            AttachmentResolver::new(self).resolve(&message.attachment_pointers)?;

        Ok(message)
    }
}

impl BackendCapabilities for SqliteBackend {
    fn unsupported_capabilities(&self) -> HashSet<Capability> {
        HashSet::from_iter([Capability::PartialAttachmentFetch])
    }
}

impl AttachmentStore for SqliteBackend {
    fn store_attachment(&self, attachment: &Attachment) -> backend::Result<()> {
        debug!("store attachment: {:?}", attachment.id);

        self.lock()?
            .execute(
                STORE_ATTACHMENT,
                params![
                    attachment.id.as_str(),
                    attachment.content_type,
                    attachment.bytes
                ],
            )
            .map_err(|err| {
                Error::StoreAttachmentError(err, attachment.id.as_str().to_owned())
            })?;

        Ok(())
    }

    fn get_attachments(&self, ids: &HashSet<AttachmentId>) -> backend::Result<Vec<Attachment>> {
        debug!("get attachments: {:?} ids", ids.len());

        if ids.is_empty() {
            return Ok(Vec::new());
        }

        let placeholders = vec!["?"; ids.len()].join(", ");
        let sql = format!(
            "SELECT id, content_type, content FROM attachments WHERE id IN ({})",
            placeholders
        );

        let conn = self.lock()?;
        let attachments = conn
            .prepare(&sql)
            .and_then(|mut stmt| {
                stmt.query_map(
                    params_from_iter(ids.iter().map(|id| id.as_str().to_owned())),
                    |row| {
                        Ok(Attachment {
                            id: AttachmentId::from(row.get::<_, String>(0)?),
                            content_type: row.get(1)?,
                            bytes: row.get(2)?,
                        })
                    },
                )?
                .collect::<rusqlite::Result<Vec<_>>>()
            })
            .map_err(Error::GetAttachmentsError)?;

        trace!("attachments found: {:?}", attachments.len());
        Ok(attachments)
    }
}

impl MessageStore for SqliteBackend {
    fn add_message(&self, mailbox: &Mailbox, message: &mut MailboxMessage) -> backend::Result<()> {
        debug!("add message to mailbox: {:?}", mailbox.id);

        let fault = |err| Error::AddMessageError(err, mailbox.id.as_str().to_owned());

        let mut conn = self.lock()?;
        let tx = conn.transaction().map_err(fault)?;

        tx.execute(ENSURE_MAILBOX, params![mailbox.id.as_str()])
            .map_err(fault)?;
        tx.execute(BUMP_MAILBOX_COUNTERS, params![mailbox.id.as_str()])
            .map_err(fault)?;
        let (uid, mod_seq): (Uid, u64) = tx
            .query_row(SELECT_MAILBOX_COUNTERS, params![mailbox.id.as_str()], |row| {
                Ok((row.get(0)?, row.get(1)?))
            })
            .map_err(fault)?;
        trace!("assigned uid: {:?}", uid);

        tx.execute(
            INSERT_MESSAGE,
            params![
                mailbox.id.as_str(),
                uid,
                message.internal_date.to_rfc3339(),
                message.flags.to_string(),
                mod_seq,
                message.body_start,
                message.content
            ],
        )
        .map_err(fault)?;

        for (position, pointer) in message.attachment_pointers.iter().enumerate() {
            tx.execute(
                INSERT_MESSAGE_ATTACHMENT,
                params![
                    mailbox.id.as_str(),
                    uid,
                    position,
                    pointer.attachment_id.as_str(),
                    pointer.name,
                    pointer.cid.as_ref().map(|cid| cid.as_str().to_owned()),
                    pointer.is_inline
                ],
            )
            .map_err(fault)?;
        }

        tx.commit().map_err(fault)?;
        message.uid = uid;

        Ok(())
    }

    fn highest_mod_seq(&self, mailbox: &Mailbox) -> backend::Result<u64> {
        let mod_seq = self
            .lock()?
            .query_row(
                SELECT_HIGHEST_MOD_SEQ,
                params![mailbox.id.as_str()],
                |row| row.get(0),
            )
            .optional()
            .map_err(|err| {
                Error::GetHighestModSeqError(err, mailbox.id.as_str().to_owned())
            })?;

        Ok(mod_seq.unwrap_or_default())
    }

    fn find_in_mailbox(
        &self,
        mailbox: &Mailbox,
        range: UidRange,
        fetch_type: FetchType,
        limit: usize,
    ) -> backend::Result<Vec<MailboxMessage>> {
        debug!("find in mailbox: {:?}", mailbox.id);
        debug!("range: {:?}, fetch type: {:?}, limit: {:?}", range, fetch_type, limit);

        let fault = |err| Error::FindInMailboxError(err, mailbox.id.as_str().to_owned());

        let (condition, range_params) = match range {
            UidRange::One(uid) => ("AND uid = ?", vec![Value::from(uid as i64)]),
            UidRange::Range(from, to) => (
                "AND uid BETWEEN ? AND ?",
                vec![Value::from(from as i64), Value::from(to as i64)],
            ),
            UidRange::From(from) => ("AND uid >= ?", vec![Value::from(from as i64)]),
            UidRange::All => ("", Vec::new()),
        };
        let sql = format!(
            "SELECT uid, internal_date, flags, mod_seq, body_start, content
             FROM messages
             WHERE mailbox_id = ? {}
             ORDER BY uid ASC
             LIMIT ?",
            condition
        );

        let mut query_params = vec![Value::from(mailbox.id.as_str().to_owned())];
        query_params.extend(range_params);
        query_params.push(Value::from(limit as i64));

        let conn = self.lock()?;
        let rows = conn
            .prepare(&sql)
            .and_then(|mut stmt| {
                stmt.query_map(params_from_iter(query_params), |row| {
                    Ok((
                        row.get::<_, Uid>(0)?,
                        row.get::<_, String>(1)?,
                        row.get::<_, String>(2)?,
                        row.get::<_, u64>(3)?,
                        row.get::<_, usize>(4)?,
                        row.get::<_, Vec<u8>>(5)?,
                    ))
                })?
                .collect::<rusqlite::Result<Vec<_>>>()
            })
            .map_err(fault)?;

        let mut messages = Vec::with_capacity(rows.len());
        for (uid, internal_date, flags, mod_seq, body_start, content) in rows {
            let internal_date = DateTime::parse_from_rfc3339(&internal_date)
                .map_err(|err| Error::ParseInternalDateError(err, internal_date.to_owned()))?
                .with_timezone(&Local);
            let attachment_pointers =
                Self::message_pointers(&conn, mailbox, uid).map_err(fault)?;

            messages.push(MailboxMessage {
                uid,
                internal_date,
                flags: Flags::from(flags.as_str()),
                mod_seq,
                body_start,
                content,
                attachment_pointers,
                attachments: Vec::new(),
            });
        }
        drop(conn);

        messages
            .into_iter()
            .map(|message| self.project(message, fetch_type))
            .collect()
    }
}
