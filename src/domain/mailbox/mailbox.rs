use serde::Serialize;
use uuid::Uuid;

/// Represents the identifier of a mailbox, generated at creation
/// time.
#[derive(Clone, Debug, Eq, Hash, PartialEq, Serialize)]
pub struct MailboxId(String);

impl MailboxId {
    pub fn generate() -> Self {
        Self(Uuid::new_v4().to_string())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl From<&str> for MailboxId {
    fn from(id: &str) -> Self {
        Self(id.to_owned())
    }
}

/// Represents the fully qualified name of a mailbox: a namespace, the
/// owning user and the mailbox name.
#[derive(Clone, Debug, Default, Eq, Hash, PartialEq, Serialize)]
pub struct MailboxPath {
    pub namespace: String,
    pub user: String,
    pub name: String,
}

impl MailboxPath {
    pub fn new<N, U, M>(namespace: N, user: U, name: M) -> Self
    where
        N: ToString,
        U: ToString,
        M: ToString,
    {
        Self {
            namespace: namespace.to_string(),
            user: user.to_string(),
            name: name.to_string(),
        }
    }
}

/// Represents a named message container. The mailbox owns a
/// monotonically increasing mod-seq counter, held by the backing
/// store rather than by this struct.
#[derive(Clone, Debug, Eq, PartialEq)]
pub struct Mailbox {
    pub id: MailboxId,
    pub path: MailboxPath,
    pub uid_validity: u32,
}

impl Mailbox {
    pub fn new(path: MailboxPath, uid_validity: u32) -> Self {
        Self {
            id: MailboxId::generate(),
            path,
            uid_validity,
        }
    }
}
