//! Payload to tag conversion
//!
//! Every payload field except `accountId` becomes one tag. Keys are the
//! declared field names and the order is fixed by [`TaggedField::ALL`].

use serde::{Deserialize, Serialize};

use crate::AccountPayload;

/// A single key/value tag attached to an account.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Tag {
    pub key: String,
    pub value: String,
}

impl Tag {
    pub fn new(key: impl Into<String>, value: impl Into<String>) -> Self {
        Self {
            key: key.into(),
            value: value.into(),
        }
    }
}

/// Payload fields that are written as tags, in declaration order.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TaggedField {
    Name,
    CostCenter,
    AccountPoc,
    ApplicationId,
    Env,
    Lob,
}

impl TaggedField {
    pub const ALL: [TaggedField; 6] = [
        TaggedField::Name,
        TaggedField::CostCenter,
        TaggedField::AccountPoc,
        TaggedField::ApplicationId,
        TaggedField::Env,
        TaggedField::Lob,
    ];

    /// Tag key. Matches the keys already present on accounts tagged by earlier deployments.
    pub fn key(self) -> &'static str {
        match self {
            TaggedField::Name => "Name",
            TaggedField::CostCenter => "CostCenter",
            TaggedField::AccountPoc => "AccountPOC",
            TaggedField::ApplicationId => "ApplicationID",
            TaggedField::Env => "Env",
            TaggedField::Lob => "Lob",
        }
    }

    pub fn value(self, payload: &AccountPayload) -> &str {
        match self {
            TaggedField::Name => &payload.name,
            TaggedField::CostCenter => &payload.cost_center,
            TaggedField::AccountPoc => &payload.account_poc,
            TaggedField::ApplicationId => &payload.application_id,
            TaggedField::Env => &payload.env,
            TaggedField::Lob => &payload.lob,
        }
    }
}

/// Build the tag list for a payload.
pub fn account_tags(payload: &AccountPayload) -> Vec<Tag> {
    TaggedField::ALL
        .iter()
        .map(|field| Tag::new(field.key(), field.value(payload)))
        .collect()
}

/// Keys of every tag produced by [`account_tags`], same order.
pub fn tag_keys() -> Vec<String> {
    TaggedField::ALL.iter().map(|field| field.key().to_string()).collect()
}

/// Keys for untagging plus the replacement tags, as used by the update flow.
pub fn keys_and_tags(payload: &AccountPayload) -> (Vec<String>, Vec<Tag>) {
    (tag_keys(), account_tags(payload))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn payload() -> AccountPayload {
        AccountPayload {
            name: "aws_SEC_test_Dev".to_string(),
            cost_center: "01234".to_string(),
            account_poc: "john.doe@example.com".to_string(),
            application_id: "00000000-0000-0000-0000-000000000000".to_string(),
            env: "DEV".to_string(),
            lob: "SEC".to_string(),
            account_id: Some("999999999999".to_string()),
        }
    }

    #[test]
    fn test_account_tags_in_declaration_order() {
        let tags = account_tags(&payload());
        assert_eq!(
            tags,
            vec![
                Tag::new("Name", "aws_SEC_test_Dev"),
                Tag::new("CostCenter", "01234"),
                Tag::new("AccountPOC", "john.doe@example.com"),
                Tag::new("ApplicationID", "00000000-0000-0000-0000-000000000000"),
                Tag::new("Env", "DEV"),
                Tag::new("Lob", "SEC"),
            ]
        );
    }

    #[test]
    fn test_account_id_is_never_tagged() {
        let tags = account_tags(&payload());
        assert_eq!(tags.len(), 6);
        assert!(tags.iter().all(|t| !t.key.eq_ignore_ascii_case("accountid")));
        assert!(tags.iter().all(|t| t.value != "999999999999"));
    }

    #[test]
    fn test_keys_parallel_tags() {
        let (keys, tags) = keys_and_tags(&payload());
        assert_eq!(keys.len(), tags.len());
        for (key, tag) in keys.iter().zip(tags.iter()) {
            assert_eq!(key, &tag.key);
        }
    }

    #[test]
    fn test_tags_are_reproducible() {
        assert_eq!(account_tags(&payload()), account_tags(&payload()));
    }
}
