//! Batched DOM change notifications.

/// One entry of a mutation batch, already restricted to what the engine
/// watches: added nodes and `href` attribute changes.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum MutationRecord {
    ChildList { added: Vec<AddedNode> },
    Attribute { name: String, value: Option<String> },
}

/// Summary of an added element.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct AddedNode {
    /// Target of the element itself when it is an anchor.
    pub anchor_href: Option<String>,
    /// Shallow markup check for the short-form marker anywhere inside.
    pub subtree_mentions_marker: bool,
}

impl AddedNode {
    pub fn anchor(href: impl Into<String>) -> Self {
        Self {
            anchor_href: Some(href.into()),
            subtree_mentions_marker: false,
        }
    }

    pub fn container(subtree_mentions_marker: bool) -> Self {
        Self {
            anchor_href: None,
            subtree_mentions_marker,
        }
    }
}
