use crate::Uid;

/// Represents a uid range selecting messages in a mailbox.
#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub enum UidRange {
    /// A single uid.
    One(Uid),
    /// A bounded inclusive range.
    Range(Uid, Uid),
    /// Every uid from the given one, inclusive.
    From(Uid),
    /// Every uid.
    All,
}

impl UidRange {
    pub fn contains(&self, uid: Uid) -> bool {
        match *self {
            Self::One(expected) => uid == expected,
            Self::Range(from, to) => from <= uid && uid <= to,
            Self::From(from) => from <= uid,
            Self::All => true,
        }
    }
}

#[cfg(test)]
mod tests {
    use crate::UidRange;

    #[test]
    fn one_should_match_only_its_uid() {
        assert!(UidRange::One(3).contains(3));
        assert!(!UidRange::One(3).contains(2));
        assert!(!UidRange::One(3).contains(4));
    }

    #[test]
    fn range_should_be_inclusive_on_both_ends() {
        assert!(!UidRange::Range(2, 4).contains(1));
        assert!(UidRange::Range(2, 4).contains(2));
        assert!(UidRange::Range(2, 4).contains(3));
        assert!(UidRange::Range(2, 4).contains(4));
        assert!(!UidRange::Range(2, 4).contains(5));
    }

    #[test]
    fn from_should_be_open_ended() {
        assert!(!UidRange::From(2).contains(1));
        assert!(UidRange::From(2).contains(2));
        assert!(UidRange::From(2).contains(u32::MAX));
    }

    #[test]
    fn all_should_match_everything() {
        assert!(UidRange::All.contains(0));
        assert!(UidRange::All.contains(u32::MAX));
    }
}
