//! Relation kinds and index lookup over a work item's relation list.
//!
//! Removing a relation is a two-step flow: read the relation list, then
//! patch `/relations/<index>`. The lookups here are the pure half of it.

use std::str::FromStr;

use crate::types::{Attachment, Relation, WorkItemId};
use crate::Error;

/// Link type of file attachments.
pub const ATTACHED_FILE: &str = "AttachedFile";

/// Link type of a work item's parent.
pub const PARENT: &str = "System.LinkTypes.Hierarchy-Reverse";
/// Link type of a work item's children.
pub const CHILD: &str = "System.LinkTypes.Hierarchy-Forward";
/// Link type of a related work item.
pub const RELATED: &str = "System.LinkTypes.Related";

/// Caller-facing relation kind.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RelationKind {
    Parent,
    Child,
    Related,
}

impl RelationKind {
    /// Link type reference name.
    pub fn link_type(&self) -> &'static str {
        match self {
            RelationKind::Parent => PARENT,
            RelationKind::Child => CHILD,
            RelationKind::Related => RELATED,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            RelationKind::Parent => "parent",
            RelationKind::Child => "child",
            RelationKind::Related => "related",
        }
    }
}

impl FromStr for RelationKind {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "parent" => Ok(RelationKind::Parent),
            "child" | "children" => Ok(RelationKind::Child),
            "related" => Ok(RelationKind::Related),
            other => Err(Error::InvalidInput(format!(
                "Invalid relation type: {}",
                other
            ))),
        }
    }
}

/// URL identifying a work item as a relation target.
pub fn work_item_url(organization_url: &str, id: WorkItemId) -> String {
    format!("{}/_apis/wit/workItems/{}", organization_url, id)
}

/// Index of the first relation of `kind` pointing exactly at `target_url`.
pub fn find_link(relations: &[Relation], kind: RelationKind, target_url: &str) -> Option<usize> {
    relations
        .iter()
        .position(|r| r.rel == kind.link_type() && r.url == target_url)
}

/// Index of the first attachment whose URL contains `attachment_id`.
pub fn find_attachment(relations: &[Relation], attachment_id: &str) -> Option<usize> {
    relations
        .iter()
        .position(|r| r.rel == ATTACHED_FILE && r.url.contains(attachment_id))
}

/// Work item ID at the tail of a relation URL, if the tail is numeric.
pub fn target_id(url: &str) -> Option<WorkItemId> {
    url.trim_end_matches('/').rsplit('/').next()?.parse().ok()
}

/// IDs of linked work items, optionally restricted to one kind.
///
/// Without a kind every link counts; relations whose URL does not end in a
/// work item ID (attachments, hyperlinks) are skipped.
pub fn linked_ids(relations: &[Relation], kind: Option<RelationKind>) -> Vec<WorkItemId> {
    relations
        .iter()
        .filter(|r| kind.map_or(true, |kind| r.rel == kind.link_type()))
        .filter_map(|r| target_id(&r.url))
        .collect()
}

/// Attachments among `relations`.
pub fn attachments(relations: &[Relation]) -> Vec<Attachment> {
    relations
        .iter()
        .filter(|r| r.rel == ATTACHED_FILE)
        .map(|r| Attachment {
            id: r
                .url
                .trim_end_matches('/')
                .rsplit('/')
                .next()
                .unwrap_or_default()
                .to_string(),
            name: r
                .attributes
                .get("name")
                .and_then(|v| v.as_str())
                .unwrap_or_default()
                .to_string(),
            url: r.url.clone(),
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::{json, Map};

    const ORG: &str = "https://dev.azure.com/contoso";

    fn relation(rel: &str, url: &str) -> Relation {
        Relation {
            rel: rel.to_string(),
            url: url.to_string(),
            attributes: Map::new(),
        }
    }

    fn sample() -> Vec<Relation> {
        vec![
            relation(RELATED, &work_item_url(ORG, 5)),
            relation(PARENT, &work_item_url(ORG, 9)),
            relation(
                ATTACHED_FILE,
                "https://dev.azure.com/contoso/_apis/wit/attachments/abc-123",
            ),
            relation(RELATED, &work_item_url(ORG, 9)),
        ]
    }

    #[test]
    fn test_kind_parsing() {
        assert_eq!("parent".parse::<RelationKind>().unwrap(), RelationKind::Parent);
        assert_eq!("child".parse::<RelationKind>().unwrap(), RelationKind::Child);
        assert_eq!("children".parse::<RelationKind>().unwrap(), RelationKind::Child);
        assert!("sibling".parse::<RelationKind>().is_err());
        assert_eq!(RelationKind::Child.link_type(), CHILD);
    }

    #[test]
    fn test_find_link_matches_type_and_url() {
        let relations = sample();
        let url = work_item_url(ORG, 9);
        assert_eq!(find_link(&relations, RelationKind::Parent, &url), Some(1));
        assert_eq!(find_link(&relations, RelationKind::Related, &url), Some(3));
        assert_eq!(find_link(&relations, RelationKind::Child, &url), None);
    }

    #[test]
    fn test_find_link_is_exact() {
        let relations = sample();
        let url = work_item_url(ORG, 90);
        assert_eq!(find_link(&relations, RelationKind::Parent, &url), None);
    }

    #[test]
    fn test_find_attachment_substring() {
        let relations = sample();
        assert_eq!(find_attachment(&relations, "abc-123"), Some(2));
        assert_eq!(find_attachment(&relations, "abc"), Some(2));
        assert_eq!(find_attachment(&relations, "zzz"), None);
    }

    #[test]
    fn test_linked_ids() {
        let relations = sample();
        assert_eq!(linked_ids(&relations, None), vec![5, 9, 9]);
        assert_eq!(linked_ids(&relations, Some(RelationKind::Parent)), vec![9]);
        assert!(linked_ids(&relations, Some(RelationKind::Child)).is_empty());
    }

    #[test]
    fn test_linked_ids_all_includes_other_link_types() {
        let relations = vec![
            relation("System.LinkTypes.Dependency-Forward", &work_item_url(ORG, 30)),
            relation("System.LinkTypes.Duplicate-Reverse", &work_item_url(ORG, 31)),
            relation("Hyperlink", "https://example.com/design"),
            relation(ATTACHED_FILE, "https://x/_apis/wit/attachments/abc-123"),
        ];
        assert_eq!(linked_ids(&relations, None), vec![30, 31]);
        assert!(linked_ids(&relations, Some(RelationKind::Related)).is_empty());
    }

    #[test]
    fn test_target_id() {
        assert_eq!(target_id("https://x/_apis/wit/workItems/42"), Some(42));
        assert_eq!(target_id("https://x/_apis/wit/workItems/42/"), Some(42));
        assert_eq!(target_id("https://x/_apis/wit/attachments/abc"), None);
    }

    #[test]
    fn test_attachments() {
        let mut relations = sample();
        relations[2]
            .attributes
            .insert("name".to_string(), json!("log.txt"));

        let found = attachments(&relations);
        assert_eq!(found.len(), 1);
        assert_eq!(found[0].id, "abc-123");
        assert_eq!(found[0].name, "log.txt");
    }
}
