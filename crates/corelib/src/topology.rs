//! Ring topology inspection.
//!
//! Read-only views over the hash ring for debugging and operations:
//! which tokens belong to which nodes, what fraction of the ring each node
//! owns, and a human-readable description. Routing never goes through this
//! module.

use crate::node::Node;
use crate::ring::HashRing;
use crate::token::RingToken;
use std::collections::HashMap;

/// Ring topology view.
///
/// A lightweight wrapper around a ring reference; all operations are
/// read-only and cost O(n) in the number of tokens.
pub struct Topology<'a> {
    ring: &'a HashRing,
}

impl<'a> Topology<'a> {
    pub fn new(ring: &'a HashRing) -> Self {
        Self { ring }
    }

    /// Tokens grouped by owning node, sorted within each node.
    pub fn ownership(&self) -> HashMap<Node, Vec<RingToken>> {
        let mut ownership: HashMap<Node, Vec<RingToken>> = HashMap::new();
        for (token, node) in self.ring.entries() {
            ownership.entry(node.clone()).or_default().push(token);
        }
        for tokens in ownership.values_mut() {
            tokens.sort();
        }
        ownership
    }

    /// Fraction of ring entries each node owns, as a percentage.
    pub fn ownership_percentages(&self) -> HashMap<Node, f64> {
        let total = self.ring.token_count() as f64;
        if total == 0.0 {
            return HashMap::new();
        }
        self.ownership()
            .into_iter()
            .map(|(node, tokens)| (node, tokens.len() as f64 / total * 100.0))
            .collect()
    }

    /// Human-readable description of the ring state.
    pub fn describe(&self) -> String {
        let mut out = String::new();
        out.push_str("Ring Description:\n");
        out.push_str(&format!("  Nodes: {}\n", self.ring.node_count()));
        out.push_str(&format!("  Total Tokens: {}\n", self.ring.token_count()));
        out.push_str(&format!("  Partitioner: {}\n", self.ring.partitioner_name()));

        let ownership = self.ownership();
        let percentages = self.ownership_percentages();
        if !percentages.is_empty() {
            out.push_str("\nNode Ownership:\n");

            // Sort by endpoint for stable output.
            let mut nodes: Vec<_> = percentages.iter().collect();
            nodes.sort_by_key(|(node, _)| (*node).clone());

            for (node, percentage) in nodes {
                let token_count = ownership.get(node).map(|v| v.len()).unwrap_or(0);
                out.push_str(&format!(
                    "  {}: {} tokens ({:.2}%)\n",
                    node, token_count, percentage
                ));
            }
        }
        out
    }
}
