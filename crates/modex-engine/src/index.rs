//! Hash index: open-chained table from bit-exact row contents to row index.
//!
//! The key is always the scratch row of the pool; chains are threaded through
//! the `h_next` field of the node records, terminated by the sentinel index 0.
//! Find and insert share one chain walk, so interning a successor state is a
//! single pass.

use crate::node::Node;
use crate::pool::StatePool;

/// Returned by [`HashIndex::insert`] when the configured state limit would be
/// exceeded.
#[derive(Debug)]
pub(crate) struct Overflow;

pub(crate) struct HashIndex {
    buckets: Vec<u32>,
    bits: u32,
}

impl HashIndex {
    /// Table of size `2^bits`.
    pub(crate) fn new(bits: u32) -> Self {
        Self {
            buckets: vec![0; 1usize << bits],
            bits,
        }
    }

    /// Multiplicative mixing over the scratch-row words.
    fn bucket_of(&self, pool: &StatePool) -> usize {
        let mut idx: usize = 0;
        for &w in pool.row(pool.scratch()) {
            idx ^= w;
            idx ^= idx >> self.bits;
            idx = idx.wrapping_mul(1234567).wrapping_add(5555555);
            idx ^= idx >> self.bits;
            idx = idx.wrapping_mul(1234567).wrapping_add(5555555);
        }
        idx & (self.buckets.len() - 1)
    }

    fn chain_find(&self, pool: &StatePool, nodes: &[Node], bucket: usize) -> u32 {
        let key = pool.row(pool.scratch());
        let mut ni = self.buckets[bucket];
        while ni != 0 {
            if pool.row(ni) == key {
                return ni;
            }
            ni = nodes[ni as usize].h_next;
        }
        0
    }

    /// Look up the scratch row. Returns 0 when absent.
    pub(crate) fn find(&self, pool: &StatePool, nodes: &[Node]) -> u32 {
        self.chain_find(pool, nodes, self.bucket_of(pool))
    }

    /// Find the scratch row or intern it as a new node. On insertion the
    /// scratch row is promoted (the pool grows a fresh scratch row) and a
    /// zeroed node record is appended and linked to its bucket.
    pub(crate) fn insert(
        &mut self,
        pool: &mut StatePool,
        nodes: &mut Vec<Node>,
        stop_count: usize,
    ) -> Result<(u32, bool), Overflow> {
        let bucket = self.bucket_of(pool);
        let found = self.chain_find(pool, nodes, bucket);
        if found != 0 {
            return Ok((found, false));
        }

        let ni = nodes.len() as u32;
        if ni as usize > stop_count {
            return Err(Overflow);
        }
        nodes.push(Node {
            h_next: self.buckets[bucket],
            ..Node::default()
        });
        self.buckets[bucket] = ni;
        pool.grow();
        Ok((ni, true))
    }
}
