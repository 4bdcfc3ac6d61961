// ── Item revision identifiers ──
//
// Two spellings of the same thing travel through this crate:
//
//   - `ID_REV[;suffix]`, the composite key callers pass in and the key of
//     the HTML cache (e.g. `SPEC-001_A;ACC Specification`)
//   - `ID/REV;SEQ-Name`, the server's `object_string` display value

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::error::CoreError;

/// Item id plus revision id.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct ItemRevisionId {
    pub item_id: String,
    pub revision: String,
}

impl ItemRevisionId {
    pub fn new(item_id: impl Into<String>, revision: impl Into<String>) -> Self {
        Self {
            item_id: item_id.into(),
            revision: revision.into(),
        }
    }

    /// Parse `ID_REV[;suffix]`. The suffix is ignored; the revision is
    /// whatever follows the last `_`.
    pub fn parse(identifier: &str) -> Result<Self, CoreError> {
        let head = identifier.split(';').next().unwrap_or_default().trim();
        match head.rsplit_once('_') {
            Some((item_id, revision)) if !item_id.is_empty() && !revision.is_empty() => {
                Ok(Self::new(item_id, revision))
            }
            _ => Err(CoreError::InvalidIdentifier {
                identifier: identifier.to_owned(),
                reason: "expected ITEMID_REV".into(),
            }),
        }
    }

    /// Parse the id part of an `object_string` (`ID/REV;SEQ-Name`).
    pub fn from_object_string(object_string: &str) -> Self {
        let head = object_string.split(';').next().unwrap_or_default();
        match head.rsplit_once('/') {
            Some((item_id, revision)) => Self::new(item_id, revision),
            None => Self::new(head, ""),
        }
    }
}

impl fmt::Display for ItemRevisionId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}_{}", self.item_id, self.revision)
    }
}

impl FromStr for ItemRevisionId {
    type Err = CoreError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::parse(s)
    }
}

/// Display name embedded in an `object_string`: the text after the last
/// `;`, minus the leading `SEQ-` sequence number.
pub fn display_name(object_string: &str) -> &str {
    let tail = object_string.rsplit(';').next().unwrap_or_default();
    match tail.split_once('-') {
        Some((_, name)) => name,
        None => tail,
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    #[test]
    fn composite_identifier_splits_on_last_underscore() {
        let id = ItemRevisionId::parse("VnV_030116_A;ACC Specification").unwrap();
        assert_eq!(id.item_id, "VnV_030116");
        assert_eq!(id.revision, "A");
        assert_eq!(id.to_string(), "VnV_030116_A");
    }

    #[test]
    fn identifier_without_revision_is_rejected() {
        for bad in ["SPEC-001", "", "_A", "SPEC-001_", ";SPEC_A"] {
            assert!(
                matches!(
                    ItemRevisionId::parse(bad),
                    Err(CoreError::InvalidIdentifier { .. })
                ),
                "{bad:?} should be rejected"
            );
        }
    }

    #[test]
    fn object_string_parts() {
        let s = "REQ-010/A;1-Introduction";
        assert_eq!(
            ItemRevisionId::from_object_string(s),
            ItemRevisionId::new("REQ-010", "A")
        );
        assert_eq!(display_name(s), "Introduction");
    }

    #[test]
    fn display_name_keeps_later_dashes() {
        assert_eq!(display_name("R/A;2.1-Brake - front axle"), "Brake - front axle");
        assert_eq!(display_name("R/A;Plain"), "Plain");
    }
}
