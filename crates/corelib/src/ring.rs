//! Consistent hash ring with virtual nodes.
//!
//! The ring maps token positions to node indices and provides the two
//! lookups the replication protocol is built on:
//!
//! - `primary_for_key`: the node owning the first position strictly
//!   clockwise of the key's token
//! - `replicas_for_key`: the ordered set of distinct physical nodes found
//!   by continuing clockwise from the primary
//!
//! Each physical node is inserted at `V` positions (virtual nodes), which
//! smooths load distribution and bounds how many keys move when membership
//! changes. Every participant configured with the same node list, vnode
//! count and partitioner computes identical lookups; the protocol depends
//! on that agreement.

use crate::error::{Error, Result};
use crate::node::Node;
use crate::partitioner::{Partitioner, SipPartitioner};
use crate::token::RingToken;
use std::collections::{BTreeMap, HashSet};
use std::ops::Bound::{Excluded, Unbounded};
use std::sync::Arc;

/// Default number of virtual nodes per physical node.
pub const DEFAULT_VNODES: usize = 100;

/// The consistent hash ring.
///
/// Owns its node vector and position map; lookups return copied `Node`
/// values. The ring is immutable for the lifetime of a coordinator, so
/// shared lookups need no locking. The membership mutators (`add_node`,
/// `remove_node`) exist for completeness and for tests; the coordinator
/// protocol treats the node set as static.
pub struct HashRing {
    /// Physical nodes, indexed by the values stored in `positions`.
    nodes: Vec<Node>,
    /// Token position -> index into `nodes`.
    positions: BTreeMap<RingToken, usize>,
    /// Virtual nodes inserted per physical node.
    vnodes: usize,
    partitioner: Arc<dyn Partitioner>,
}

impl HashRing {
    /// Build a ring from a non-empty node list with default settings.
    pub fn new(nodes: &[Node]) -> Result<Self> {
        RingBuilder::new().add_nodes(nodes).build()
    }

    /// The node owning the key: the entry at the smallest ring position
    /// strictly greater than the key's token, wrapping to the lowest
    /// position past the top of the token space.
    pub fn primary_for_key(&self, key: &[u8]) -> Node {
        let idx = self.successor_index(self.partitioner.position(key));
        self.nodes[idx].clone()
    }

    /// The ordered replica set for a key.
    ///
    /// Walks clockwise from the primary position collecting distinct
    /// physical nodes until `replication_factor` are gathered. Index 0 is
    /// always `primary_for_key(key)`; the walk order makes the whole
    /// sequence a pure function of the key.
    pub fn replicas_for_key(&self, key: &[u8], replication_factor: usize) -> Result<Vec<Node>> {
        if self.nodes.len() < replication_factor {
            return Err(Error::NotEnoughNodes {
                have: self.nodes.len(),
                need: replication_factor,
            });
        }

        let token = self.partitioner.position(key);
        let mut replicas = Vec::with_capacity(replication_factor);
        let mut seen = HashSet::new();

        // Clockwise walk starting just past the key's token, wrapping once.
        // The ring holds vnodes * nodes entries, so the walk terminates well
        // before exhausting the iterator.
        let walk = self
            .positions
            .range((Excluded(token), Unbounded))
            .chain(self.positions.range(..))
            .map(|(_, &idx)| idx);

        for idx in walk {
            if seen.insert(idx) {
                replicas.push(self.nodes[idx].clone());
                if replicas.len() == replication_factor {
                    break;
                }
            }
        }

        Ok(replicas)
    }

    /// Insert a node and its virtual entries. Fails if the node is already
    /// present.
    pub fn add_node(&mut self, node: Node) -> Result<()> {
        if self.nodes.contains(&node) {
            return Err(Error::DuplicateNode(node));
        }
        self.nodes.push(node);
        let idx = self.nodes.len() - 1;
        self.insert_vnodes(idx);
        Ok(())
    }

    /// Remove a node and every virtual entry that references it.
    ///
    /// Uses swap-removal: the last node slot moves into the vacated index
    /// and its ring entries are remapped, so all remaining entries keep
    /// referencing valid slots.
    pub fn remove_node(&mut self, node: &Node) -> Result<()> {
        let idx = self
            .nodes
            .iter()
            .position(|n| n == node)
            .ok_or_else(|| Error::UnknownNode(node.clone()))?;
        let last = self.nodes.len() - 1;

        self.nodes.swap(idx, last);
        self.nodes.pop();

        self.positions.retain(|_, i| *i != idx);
        if idx != last {
            for i in self.positions.values_mut() {
                if *i == last {
                    *i = idx;
                }
            }
        }
        Ok(())
    }

    /// Number of distinct physical nodes.
    pub fn node_count(&self) -> usize {
        self.nodes.len()
    }

    /// Number of virtual node entries on the ring.
    pub fn token_count(&self) -> usize {
        self.positions.len()
    }

    /// All physical nodes, in slot order.
    pub fn nodes(&self) -> &[Node] {
        &self.nodes
    }

    /// All `(token, node)` entries in ring order. Intended for topology
    /// inspection, not for routing.
    pub fn entries(&self) -> impl Iterator<Item = (RingToken, &Node)> + '_ {
        self.positions.iter().map(|(t, &i)| (*t, &self.nodes[i]))
    }

    pub fn partitioner_name(&self) -> &'static str {
        self.partitioner.name()
    }

    /// Index of the entry strictly clockwise of `token`, wrapping.
    fn successor_index(&self, token: RingToken) -> usize {
        self.positions
            .range((Excluded(token), Unbounded))
            .next()
            .or_else(|| self.positions.iter().next())
            .map(|(_, &idx)| idx)
            .expect("ring is never empty after construction")
    }

    /// Insert the virtual entries for the node at `idx`.
    ///
    /// Positions are `hash("{ip}:{port}:{i}")`. Position collisions resolve
    /// last-writer-wins on insertion; the partitioner is assumed
    /// collision-free for configured inputs.
    fn insert_vnodes(&mut self, idx: usize) {
        let node = &self.nodes[idx];
        for i in 0..self.vnodes {
            let vnode_key = format!("{}:{}:{}", node.ip, node.port, i);
            let token = self.partitioner.position(vnode_key.as_bytes());
            self.positions.insert(token, idx);
        }
    }
}

impl std::fmt::Debug for HashRing {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("HashRing")
            .field("nodes", &self.nodes)
            .field("tokens", &self.positions.len())
            .field("vnodes", &self.vnodes)
            .field("partitioner", &self.partitioner.name())
            .finish()
    }
}

/// Builder for [`HashRing`].
pub struct RingBuilder {
    nodes: Vec<Node>,
    vnodes: usize,
    partitioner: Arc<dyn Partitioner>,
}

impl RingBuilder {
    pub fn new() -> Self {
        Self {
            nodes: Vec::new(),
            vnodes: DEFAULT_VNODES,
            partitioner: Arc::new(SipPartitioner),
        }
    }

    /// Override the virtual node count (default 100).
    pub fn with_vnodes(mut self, vnodes: usize) -> Self {
        self.vnodes = vnodes;
        self
    }

    pub fn with_partitioner(mut self, partitioner: Arc<dyn Partitioner>) -> Self {
        self.partitioner = partitioner;
        self
    }

    pub fn add_node(mut self, node: Node) -> Self {
        self.nodes.push(node);
        self
    }

    pub fn add_nodes(mut self, nodes: &[Node]) -> Self {
        self.nodes.extend_from_slice(nodes);
        self
    }

    /// Build the ring. Fails on an empty node list, a duplicate node, or a
    /// zero vnode count.
    pub fn build(self) -> Result<HashRing> {
        if self.nodes.is_empty() {
            return Err(Error::EmptyNodeList);
        }
        if self.vnodes == 0 {
            return Err(Error::InvalidConfig("vnodes must be positive".into()));
        }
        let mut ring = HashRing {
            nodes: Vec::with_capacity(self.nodes.len()),
            positions: BTreeMap::new(),
            vnodes: self.vnodes,
            partitioner: self.partitioner,
        };
        for node in self.nodes {
            ring.add_node(node)?;
        }
        Ok(ring)
    }
}

impl Default for RingBuilder {
    fn default() -> Self {
        Self::new()
    }
}
