use serde::Serialize;

/// Represents the flag variants.
#[derive(Debug, Clone, Eq, Hash, PartialEq, Serialize)]
pub enum Flag {
    Seen,
    Answered,
    Flagged,
    Deleted,
    Draft,
    Recent,
    Custom(String),
}

impl Flag {
    pub fn custom<F: ToString>(flag: F) -> Self {
        Self::Custom(flag.to_string())
    }
}

impl From<&str> for Flag {
    fn from(s: &str) -> Self {
        match s {
            "seen" => Flag::Seen,
            "answered" => Flag::Answered,
            "flagged" => Flag::Flagged,
            "deleted" => Flag::Deleted,
            "draft" => Flag::Draft,
            "recent" => Flag::Recent,
            flag => Flag::Custom(flag.into()),
        }
    }
}

impl ToString for Flag {
    fn to_string(&self) -> String {
        match self {
            Flag::Seen => "seen".into(),
            Flag::Answered => "answered".into(),
            Flag::Flagged => "flagged".into(),
            Flag::Deleted => "deleted".into(),
            Flag::Draft => "draft".into(),
            Flag::Recent => "recent".into(),
            Flag::Custom(flag) => flag.clone(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::Flag;

    #[test]
    fn parse_should_be_the_inverse_of_to_string() {
        let flags = [
            Flag::Seen,
            Flag::Answered,
            Flag::Flagged,
            Flag::Deleted,
            Flag::Draft,
            Flag::Recent,
            Flag::custom("important"),
        ];
        for flag in flags {
            assert_eq!(flag, Flag::from(flag.to_string().as_str()));
        }
    }

    #[test]
    fn parse_should_keep_unknown_names_custom() {
        assert_eq!(Flag::custom("replied"), Flag::from("replied"));
        assert_eq!(Flag::custom("trashed"), Flag::from("trashed"));
    }
}
