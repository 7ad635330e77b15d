use serde::{Deserialize, Serialize};
use std::fmt;

/// Host-assigned identifier of a render surface (the view's tag).
///
/// Serialized transparently so event payloads carry a bare number in the
/// `target` field.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct TargetId(pub u32);

impl fmt::Display for TargetId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "surface-{}", self.0)
    }
}

impl From<u32> for TargetId {
    fn from(id: u32) -> Self {
        Self(id)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn target_id_display() {
        assert_eq!(TargetId(7).to_string(), "surface-7");
    }

    #[test]
    fn target_id_serializes_as_number() {
        let json = serde_json::to_string(&TargetId(42)).unwrap();
        assert_eq!(json, "42");
        let back: TargetId = serde_json::from_str("42").unwrap();
        assert_eq!(back, TargetId(42));
    }

    #[test]
    fn target_id_hash_and_order() {
        use std::collections::BTreeSet;
        let mut set = BTreeSet::new();
        set.insert(TargetId(3));
        set.insert(TargetId(1));
        set.insert(TargetId(3));
        assert_eq!(set.into_iter().collect::<Vec<_>>(), vec![TargetId(1), TargetId(3)]);
    }
}
