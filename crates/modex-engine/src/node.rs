//! Per-state metadata records.

/// Sentinel for "no transition" / "no node" in u32-indexed links.
pub(crate) const NONE: u32 = u32::MAX;

/// One record per interned state row. Row and node indices coincide; index 0
/// is the sentinel terminating hash chains and predecessor links.
///
/// `e_cnt` is reused across phases: during BFS it counts discovered incoming
/// edges (which later sizes the incoming-edge segments); during progress
/// checking it counts the out-edges not yet proved to reach a progress state.
#[derive(Clone, Copy, Debug, Default)]
pub(crate) struct Node {
    /// Next row in the same hash bucket, 0 = end of chain.
    pub h_next: u32,
    /// Row whose BFS expansion first discovered this row (0 for the initial
    /// state). Always strictly smaller than the row's own index.
    pub prev: u32,
    /// Reused counter, see type docs.
    pub e_cnt: u32,
    /// Next node in the intrusive progress worklist.
    pub p_next: u32,
    /// End offset of this node's incoming-edge segment in the flat edge
    /// array; used as the write cursor while the segment is being filled.
    pub ie_end: u32,
}
