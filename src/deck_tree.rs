//! Two-level deck hierarchy for pickers.
//!
//! Deck names use `::` as a hierarchy separator. Pickers show top-level decks
//! with their sub-decks nested underneath: a deck `A::B::C` is listed under
//! `A` with display name `B::C`.

use crate::collection::{DeckId, DECK_SEPARATOR};
use crate::host::DeckEntry;
use std::collections::BTreeMap;

/// One row of the deck picker.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DeckNode {
    /// Text shown for this row.
    pub display_name: String,
    /// Name to hand back to the orchestrator when this row is chosen.
    pub full_name: String,
    /// `None` for a placeholder parent whose deck is not in the list.
    pub id: Option<DeckId>,
    pub children: Vec<DeckNode>,
}

impl DeckNode {
    fn leaf(display_name: &str, full_name: &str, id: Option<DeckId>) -> Self {
        Self {
            display_name: display_name.to_string(),
            full_name: full_name.to_string(),
            id,
            children: Vec::new(),
        }
    }
}

/// Group decks by the prefix before their first `::`.
///
/// Roots are sorted by name, children by display name.
pub fn build_deck_tree(decks: &[DeckEntry]) -> Vec<DeckNode> {
    let mut roots: BTreeMap<&str, Option<DeckId>> = BTreeMap::new();
    let mut children: BTreeMap<&str, Vec<DeckNode>> = BTreeMap::new();

    for deck in decks {
        match deck.name.split_once(DECK_SEPARATOR) {
            Some((parent, rest)) => {
                roots.entry(parent).or_insert(None);
                children
                    .entry(parent)
                    .or_default()
                    .push(DeckNode::leaf(rest, &deck.name, Some(deck.id)));
            }
            None => {
                roots.insert(&deck.name, Some(deck.id));
            }
        }
    }

    roots
        .into_iter()
        .map(|(name, id)| {
            let mut node = DeckNode::leaf(name, name, id);
            if let Some(mut kids) = children.remove(name) {
                kids.sort_by(|a, b| a.display_name.cmp(&b.display_name));
                node.children = kids;
            }
            node
        })
        .collect()
}

/// Keep nodes whose display name contains `query` (case-insensitive), plus
/// the ancestors of any kept node. An empty query keeps everything.
pub fn filter_deck_tree(nodes: &[DeckNode], query: &str) -> Vec<DeckNode> {
    let query = query.trim().to_lowercase();
    if query.is_empty() {
        return nodes.to_vec();
    }
    nodes
        .iter()
        .filter_map(|n| filter_node(n, &query))
        .collect()
}

fn filter_node(node: &DeckNode, query: &str) -> Option<DeckNode> {
    let children: Vec<DeckNode> = node
        .children
        .iter()
        .filter_map(|c| filter_node(c, query))
        .collect();
    let matches = node.display_name.to_lowercase().contains(query);
    if matches || !children.is_empty() {
        Some(DeckNode {
            children,
            ..DeckNode::leaf(&node.display_name, &node.full_name, node.id)
        })
    } else {
        None
    }
}

/// Depth-first listing as `(depth, node)` pairs, in display order.
pub fn flatten(nodes: &[DeckNode]) -> Vec<(usize, &DeckNode)> {
    fn walk<'a>(nodes: &'a [DeckNode], depth: usize, out: &mut Vec<(usize, &'a DeckNode)>) {
        for n in nodes {
            out.push((depth, n));
            walk(&n.children, depth + 1, out);
        }
    }
    let mut out = Vec::new();
    walk(nodes, 0, &mut out);
    out
}
