use serde::{Deserialize, Serialize};

/// What a member is allowed to do inside a project.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Capability {
    Read,
    Write,
    Complete,
    Delete,
}

/// Permission level held by a project membership, ordered least to most
/// capable. Each level includes every capability of the levels below it.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Permission {
    Read,
    Write,
    Complete,
    Delete,
}

impl Permission {
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Read => "read",
            Self::Write => "write",
            Self::Complete => "complete",
            Self::Delete => "delete",
        }
    }

    #[must_use]
    pub fn parse(value: &str) -> Option<Self> {
        match value {
            "read" => Some(Self::Read),
            "write" => Some(Self::Write),
            "complete" => Some(Self::Complete),
            "delete" => Some(Self::Delete),
            _ => None,
        }
    }

    /// Whether this level grants the given capability.
    #[must_use]
    pub fn allows(self, capability: Capability) -> bool {
        let required = match capability {
            Capability::Read => Self::Read,
            Capability::Write => Self::Write,
            Capability::Complete => Self::Complete,
            Capability::Delete => Self::Delete,
        };
        self >= required
    }
}

impl std::fmt::Display for Permission {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

#[cfg(test)]
mod tests {
    use super::{Capability, Permission};

    #[test]
    fn levels_are_ordered_least_to_most_capable() {
        assert!(Permission::Read < Permission::Write);
        assert!(Permission::Write < Permission::Complete);
        assert!(Permission::Complete < Permission::Delete);
    }

    #[test]
    fn delete_grants_everything() {
        for capability in [
            Capability::Read,
            Capability::Write,
            Capability::Complete,
            Capability::Delete,
        ] {
            assert!(Permission::Delete.allows(capability));
        }
    }

    #[test]
    fn read_grants_only_read() {
        assert!(Permission::Read.allows(Capability::Read));
        assert!(!Permission::Read.allows(Capability::Write));
        assert!(!Permission::Read.allows(Capability::Complete));
        assert!(!Permission::Read.allows(Capability::Delete));
    }

    #[test]
    fn write_cannot_complete_or_delete() {
        assert!(Permission::Write.allows(Capability::Write));
        assert!(!Permission::Write.allows(Capability::Complete));
        assert!(!Permission::Write.allows(Capability::Delete));
    }

    #[test]
    fn round_trips_through_storage_form() {
        for level in [
            Permission::Read,
            Permission::Write,
            Permission::Complete,
            Permission::Delete,
        ] {
            assert_eq!(Permission::parse(level.as_str()), Some(level));
        }
        assert_eq!(Permission::parse("admin"), None);
    }
}
