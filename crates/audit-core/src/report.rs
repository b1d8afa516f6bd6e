//! Overlap reporting
//!
//! The final product of an audit: which followed accounts appear on
//! the account's blocked or muted moderation lists.

use crate::graph::MemberRecord;
use std::collections::HashMap;
use std::fmt;

/// One followed account that appears on a moderation list
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct OverlapMatch {
    /// 1-based position within the matches, in follow order
    pub ordinal: usize,
    /// The account's DID
    pub did: String,
    /// The handle recorded for the account on the list
    pub handle: String,
}

/// The audit's result: followed accounts found on moderation lists
#[derive(Debug, Clone, Default)]
pub struct OverlapReport {
    /// The matches, ordered by the follow list
    pub matches: Vec<OverlapMatch>,
}

impl OverlapReport {
    /// Intersect the list members with the follow list
    ///
    /// Membership is keyed by DID; handles are display-only and come
    /// from the list-member record. When the same DID appears on more
    /// than one list, the last occurrence's handle wins. Ordinals
    /// follow the order of `follows`, not the lists.
    pub fn build(members: &[MemberRecord], follows: &[MemberRecord]) -> Self {
        let mut by_did: HashMap<&str, &str> = HashMap::new();
        for member in members {
            by_did.insert(member.did.as_str(), member.handle.as_str());
        }

        let mut matches = Vec::new();
        for follow in follows {
            if let Some(handle) = by_did.get(follow.did.as_str()) {
                matches.push(OverlapMatch {
                    ordinal: matches.len() + 1,
                    did: follow.did.clone(),
                    handle: (*handle).to_string(),
                });
            }
        }

        Self { matches }
    }

    /// Number of followed accounts found on moderation lists
    pub fn count(&self) -> usize {
        self.matches.len()
    }
}

impl fmt::Display for OverlapReport {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for m in &self.matches {
            writeln!(f, "#{} {} ({})", m.ordinal, m.handle, m.did)?;
        }
        writeln!(
            f,
            "{} followed account(s) appear on a blocked or muted list",
            self.count()
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn record(did: &str, handle: &str) -> MemberRecord {
        MemberRecord {
            did: did.to_string(),
            handle: handle.to_string(),
        }
    }

    #[test]
    fn test_matches_follow_the_follow_order() {
        let members = vec![record("did:plc:a", "a.test"), record("did:plc:b", "b.test")];
        let follows = vec![
            record("did:plc:a", "a.test"),
            record("did:plc:c", "c.test"),
            record("did:plc:b", "b.test"),
        ];

        let report = OverlapReport::build(&members, &follows);

        assert_eq!(report.count(), 2);
        assert_eq!(report.matches[0].ordinal, 1);
        assert_eq!(report.matches[0].did, "did:plc:a");
        assert_eq!(report.matches[1].ordinal, 2);
        assert_eq!(report.matches[1].did, "did:plc:b");
    }

    #[test]
    fn test_no_overlap_reports_zero() {
        let members = vec![record("did:plc:a", "a.test")];
        let follows = vec![record("did:plc:z", "z.test")];

        let report = OverlapReport::build(&members, &follows);
        assert_eq!(report.count(), 0);
        assert!(report.matches.is_empty());

        let report = OverlapReport::build(&[], &[]);
        assert_eq!(report.count(), 0);
    }

    #[test]
    fn test_duplicate_member_keeps_last_handle() {
        // The same DID listed twice (two lists, or a handle change
        // between fetches) resolves to the later record's handle.
        let members = vec![
            record("did:plc:a", "old.test"),
            record("did:plc:a", "new.test"),
        ];
        let follows = vec![record("did:plc:a", "whatever.test")];

        let report = OverlapReport::build(&members, &follows);
        assert_eq!(report.count(), 1);
        assert_eq!(report.matches[0].handle, "new.test");
    }

    #[test]
    fn test_display_format() {
        let members = vec![record("did:plc:a", "a.test"), record("did:plc:b", "b.test")];
        let follows = vec![record("did:plc:a", "a.test"), record("did:plc:b", "b.test")];

        let report = OverlapReport::build(&members, &follows);
        assert_eq!(
            report.to_string(),
            "#1 a.test (did:plc:a)\n\
             #2 b.test (did:plc:b)\n\
             2 followed account(s) appear on a blocked or muted list\n"
        );
    }

    #[test]
    fn test_display_empty_report() {
        let report = OverlapReport::default();
        assert_eq!(
            report.to_string(),
            "0 followed account(s) appear on a blocked or muted list\n"
        );
    }
}
