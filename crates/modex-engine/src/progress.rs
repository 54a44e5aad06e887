//! Non-progress detection.
//!
//! After BFS the successor relation is re-generated once more to lay the
//! incoming edges out in a flat counting-sorted array; the progress rounds
//! then propagate "a progress state is reachable" backwards over those edges
//! with an intrusive worklist threaded through the node records. Round 0
//! checks may-progress (some path reaches a progress state), round 1 checks
//! must-progress (every cycle and terminal state contains one), round 2 runs
//! only under stubborn-set reduction and checks that termination stays
//! reachable, which the reduction's correctness argument relies on.

use crate::explorer::{Abort, Explorer, Flow};
use crate::model::Model;
use crate::node::NONE;
use crate::report::{CheckFailure, FailureKind, Trace, TypicalTail};
use tracing::debug;

impl<M: Model> Explorer<M> {
    /// Lay out the incoming-edge array: prefix sums over the per-node edge
    /// counts give each node its segment, and a replay of the exploration
    /// fills the segments in order.
    pub(crate) fn build_incoming_edges(&mut self) -> Flow<()> {
        self.iedges = vec![0; self.nr_edges];
        self.nodes[0].ie_end = 0;
        if self.nodes.len() > 1 {
            self.nodes[1].ie_end = 0;
        }
        for ni in 2..self.nodes.len() {
            self.nodes[ni].ie_end = self.nodes[ni - 1].ie_end + self.nodes[ni - 1].e_cnt;
        }

        self.backward = true;
        let replay = self.build_state_space();
        self.backward = false;
        replay
    }

    /// One backward fixed-point round. Round 0: a node is good when some
    /// path from it reaches a may-progress state (or a terminal state unless
    /// `dl_not_may`), so the counter is a 0/1 has-outgoing-edges flag and
    /// the first good successor clears it. Round 1: a node is good when
    /// every maximal path from it keeps meeting must-progress states, so the
    /// counter holds the full out-degree and every successor must prove
    /// itself. Round 2 is round 0 with "progress" = termination.
    pub(crate) fn verify_progress(&mut self, round: u8) -> Flow<()> {
        debug!(round, "verifying progress");
        for ni in 1..self.nodes.len() {
            self.nodes[ni].e_cnt = 0;
        }
        if round == 1 {
            for ei in 0..self.iedges.len() {
                self.nodes[self.iedges[ei] as usize].e_cnt += 1;
            }
        } else {
            for ei in 0..self.iedges.len() {
                self.nodes[self.iedges[ei] as usize].e_cnt = 1;
            }
        }

        // Clear the counters of progress states; terminal states already
        // carry 0 unless the dl_not_* switches revoke that.
        if round == 0 {
            for ni in 1..self.nodes.len() {
                if self.config.dl_not_may && self.nodes[ni].e_cnt == 0 {
                    self.nodes[ni].e_cnt = 1;
                }
                if self.nodes[ni].e_cnt != 0 {
                    self.pool.bind(ni as u32);
                    if self.model.is_may_progress(&self.state_ref()) {
                        self.nodes[ni].e_cnt = 0;
                    }
                }
            }
        } else if round == 1 {
            for ni in 1..self.nodes.len() {
                if self.config.dl_not_must && self.nodes[ni].e_cnt == 0 {
                    self.nodes[ni].e_cnt = 1;
                }
                if self.nodes[ni].e_cnt != 0 {
                    self.pool.bind(ni as u32);
                    if self.model.is_must_progress(&self.state_ref()) {
                        self.nodes[ni].e_cnt = 0;
                    }
                }
            }
        }

        // Backward propagation: seed the worklist with every good node, then
        // discharge incoming edges until nothing changes. The worklist is
        // threaded through p_next, so no allocation grows with the space.
        let mut p_list: u32 = 0;
        for ni in 1..self.nodes.len() {
            if self.nodes[ni].e_cnt == 0 {
                self.nodes[ni].p_next = p_list;
                p_list = ni as u32;
            }
        }
        while p_list != 0 {
            let seg_start = self.nodes[p_list as usize - 1].ie_end as usize;
            let seg_end = self.nodes[p_list as usize].ie_end as usize;
            for ei in seg_start..seg_end {
                let ni = self.iedges[ei] as usize;
                if self.nodes[ni].e_cnt != 0 {
                    self.nodes[ni].e_cnt -= 1;
                    if self.nodes[ni].e_cnt == 0 {
                        self.nodes[ni].p_next = self.nodes[p_list as usize].p_next;
                        self.nodes[p_list as usize].p_next = ni as u32;
                    }
                }
            }
            p_list = self.nodes[p_list as usize].p_next;
        }

        // Any node left with a non-zero counter violates the property.
        for ni in 1..self.nodes.len() {
            if self.nodes[ni].e_cnt != 0 {
                let kind = match round {
                    0 => FailureKind::MayProgress,
                    1 => FailureKind::MustProgress,
                    _ => FailureKind::TerminationUnreachable,
                };
                let states = {
                    let witness_prev = self.nodes[ni].prev;
                    self.history(witness_prev)
                };
                let tail = self.typical_tail(ni as u32, false)?;
                return Err(Abort::Full(Box::new(CheckFailure {
                    kind,
                    message: String::new(),
                    trace: Trace {
                        states,
                        tail: Some(tail),
                    },
                })));
            }
        }
        Ok(())
    }

    /// Walk a typical execution forward from `start` until it closes a cycle
    /// or gets stuck, re-threading `prev` along the walk. Transitions are
    /// tried in ascending order; successors whose counter is zero (already
    /// proved good) are avoided, so a progress counterexample stays inside
    /// the violating region. When every enabled successor is good the walk
    /// ends at the current state as if it were terminal. With `interning`
    /// (the typical-execution mode) successors are interned on the fly and
    /// all of them qualify.
    pub(crate) fn typical_tail(&mut self, start: u32, interning: bool) -> Flow<TypicalTail> {
        let mut at = start;
        let mut nprev: u32 = 0;
        loop {
            // Mark and re-thread the walk: a marked successor closes the
            // cycle, and prev now records the walk instead of the BFS tree.
            self.nodes[at as usize].e_cnt = NONE;
            self.nodes[at as usize].prev = nprev;
            nprev = at;
            self.pool.copy_to_scratch(at);

            let mut advance = at;
            let mut tr = 0;
            while tr < self.nr_trans {
                let enabled = self.with_state_mut(|model, s| model.fire(tr, s));
                let mut advanced = false;
                if enabled {
                    if self.config.symmetry {
                        self.with_state_mut(|model, s| model.symmetry_representative(s));
                    }
                    let target = if interning {
                        let stop = self.config.stop_count;
                        let (t, was_new) = self
                            .index
                            .insert(&mut self.pool, &mut self.nodes, stop)
                            .map_err(|_| Abort::At {
                                kind: FailureKind::StateLimit,
                                message: "Maximum number of states exceeded".into(),
                                node: at,
                            })?;
                        if was_new {
                            self.nodes[t as usize].e_cnt = 1;
                        }
                        t
                    } else {
                        self.index.find(&self.pool, &self.nodes)
                    };
                    if target != 0 && self.nodes[target as usize].e_cnt != 0 {
                        advance = target;
                        advanced = true;
                    } else {
                        self.pool.copy_to_scratch(at);
                    }
                }
                self.take_fault(at, FailureKind::TransitionFiring)?;
                if advanced {
                    break;
                }
                tr += 1;
            }

            at = advance;
            if self.nodes[at as usize].e_cnt == NONE {
                break;
            }
        }

        // `at` re-entered the walk (or is the stuck end); everything before
        // it is the approach, the rest from `at` to the walk end is the
        // cycle (or the lone terminal state).
        let approach = {
            let before = self.nodes[at as usize].prev;
            self.history(before)
        };
        self.nodes[at as usize].prev = 0;
        let cycle = self.history(nprev);
        Ok(TypicalTail { approach, cycle })
    }
}
