//! Bit trie index
//!
//! Binary trie keyed by the 32 address bits, most significant first, with
//! nodes kept in an arena. A range `addr/p` is stored as a `Covered` edge at
//! depth `p`: every address below that edge is in range.
//!
//! - Inserting under an existing `Covered` edge stops early; the wider
//!   range already includes the new one.
//! - Inserting a wider range over an existing subtree replaces the subtree
//!   with a `Covered` edge and recycles its nodes.
//!
//! There is no build phase: a range is queryable as soon as `insert`
//! returns. Lookups test at most 32 bits.

use super::{Freshness, RangeIndex};
use crate::cidr::Cidr;

/// Bit trie over IPv4 addresses
#[derive(Debug, Clone)]
pub struct BitTrie {
    /// All nodes (arena); index 0 is the root
    nodes: Vec<Node>,
    /// Arena slots released by subsumed subtrees
    free: Vec<u32>,
    /// A `/0` was inserted: everything matches
    all_covered: bool,
    /// Live `Covered` edges (plus one for `all_covered`)
    terminals: usize,
}

/// A node in the trie
#[derive(Debug, Clone, Copy)]
struct Node {
    /// Left child (bit 0), right child (bit 1)
    children: [Edge; 2],
}

/// Where an edge leads
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Edge {
    /// No range below this edge
    Empty,
    /// More specific ranges below (value is node ID)
    Node(u32),
    /// Every address below this edge is in range
    Covered,
}

impl Node {
    const EMPTY: Node = Node {
        children: [Edge::Empty, Edge::Empty],
    };
}

impl Default for BitTrie {
    fn default() -> Self {
        Self::new()
    }
}

impl BitTrie {
    /// Empty trie (root node only)
    pub fn new() -> Self {
        Self {
            nodes: vec![Node::EMPTY],
            free: Vec::new(),
            all_covered: false,
            terminals: 0,
        }
    }

    /// Nodes currently in use, root included
    pub fn node_count(&self) -> usize {
        self.nodes.len() - self.free.len()
    }

    /// Allocate a new node and return its ID, reusing freed slots first
    fn allocate_node(&mut self) -> u32 {
        if let Some(id) = self.free.pop() {
            self.nodes[id as usize] = Node::EMPTY;
            return id;
        }
        let id = self.nodes.len() as u32;
        self.nodes.push(Node::EMPTY);
        id
    }

    /// Return a subtree to the free list, dropping the ranges inside it
    fn release_subtree(&mut self, root: u32) {
        let mut stack = vec![root];
        while let Some(id) = stack.pop() {
            for edge in self.nodes[id as usize].children {
                match edge {
                    Edge::Node(child) => stack.push(child),
                    Edge::Covered => self.terminals -= 1,
                    Edge::Empty => {}
                }
            }
            self.nodes[id as usize] = Node::EMPTY;
            self.free.push(id);
        }
    }

    /// Drop every node but the root
    fn clear(&mut self) {
        self.nodes.truncate(1);
        self.nodes[0] = Node::EMPTY;
        self.free.clear();
        self.terminals = 0;
    }
}

#[inline]
fn bit_at(addr: u32, depth: u8) -> usize {
    ((addr >> (31 - depth)) & 1) as usize
}

impl RangeIndex for BitTrie {
    fn insert(&mut self, block: Cidr) {
        if self.all_covered {
            return;
        }
        if block.prefix == 0 {
            self.clear();
            self.all_covered = true;
            self.terminals = 1;
            return;
        }

        let mut node_id = 0u32; // Start at root

        for depth in 0..block.prefix {
            let bit = bit_at(block.addr, depth);
            let edge = self.nodes[node_id as usize].children[bit];

            if depth + 1 == block.prefix {
                // Reached target depth - this edge becomes the range
                match edge {
                    Edge::Covered => {}
                    Edge::Node(child_id) => {
                        // More specific ranges below are now redundant
                        self.release_subtree(child_id);
                        self.nodes[node_id as usize].children[bit] = Edge::Covered;
                        self.terminals += 1;
                    }
                    Edge::Empty => {
                        self.nodes[node_id as usize].children[bit] = Edge::Covered;
                        self.terminals += 1;
                    }
                }
                return;
            }

            // Need to go deeper
            node_id = match edge {
                // A wider range already covers this one
                Edge::Covered => return,
                Edge::Node(child_id) => child_id,
                Edge::Empty => {
                    let new_id = self.allocate_node();
                    self.nodes[node_id as usize].children[bit] = Edge::Node(new_id);
                    new_id
                }
            };
        }
    }

    fn freshness(&self) -> Freshness {
        Freshness::Clean
    }

    fn build(&mut self) {}

    fn contains(&self, addr: u32) -> bool {
        if self.all_covered {
            return true;
        }

        let mut node_id = 0u32;
        for depth in 0..32 {
            match self.nodes[node_id as usize].children[bit_at(addr, depth)] {
                Edge::Covered => return true,
                Edge::Empty => return false,
                Edge::Node(child_id) => node_id = child_id,
            }
        }

        // A full 32-bit path is an exact host match
        true
    }

    fn range_count(&self) -> usize {
        self.terminals
    }
}
