use lifeline_types::{Reference, REFERENCE_KEY_SIZE};

/// Length of a physical key: scope byte plus reference key.
pub const SCOPED_KEY_SIZE: usize = 1 + REFERENCE_KEY_SIZE;

/// Disjoint key spaces within the backing store.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
#[repr(u8)]
pub enum Scope {
    Lifeline = 1,
    Record = 2,
}

impl Scope {
    pub fn prefix(self) -> u8 {
        self as u8
    }
}

impl std::fmt::Display for Scope {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Lifeline => write!(f, "lifeline"),
            Self::Record => write!(f, "record"),
        }
    }
}

/// Physical key for `reference` within `scope`.
pub fn scoped_key(scope: Scope, reference: &Reference) -> [u8; SCOPED_KEY_SIZE] {
    let mut key = [0u8; SCOPED_KEY_SIZE];
    key[0] = scope.prefix();
    key[1..].copy_from_slice(&reference.key());
    key
}

#[cfg(test)]
mod tests {
    use super::*;
    use lifeline_types::{PulseNumber, RecordId};

    #[test]
    fn prefixes_match_storage_layout() {
        assert_eq!(Scope::Lifeline.prefix(), 0x01);
        assert_eq!(Scope::Record.prefix(), 0x02);
    }

    #[test]
    fn same_reference_different_scopes_differ_only_in_prefix() {
        let r = Reference::new(RecordId::zero(), RecordId::compute(b"r", PulseNumber(9)));
        let lifeline = scoped_key(Scope::Lifeline, &r);
        let record = scoped_key(Scope::Record, &r);
        assert_ne!(lifeline, record);
        assert_eq!(lifeline[1..], record[1..]);
        assert_eq!(&lifeline[1..], &r.key()[..]);
    }
}
