//! Stubborn-set reduction.
//!
//! At each expanded state the engine fires a stubborn set instead of all
//! transitions: starting from an untried transition, a depth-first closure
//! over the model's obligation relation finds a strongly connected component
//! of transitions that is obligation-closed; the component is fired as a
//! whole, and expansion of the state stops at the first component that
//! contained an enabled transition.

use crate::explorer::{Abort, Explorer, Flow};
use crate::model::{Model, Obligation};
use crate::node::NONE;
use crate::report::FailureKind;

/// Per-transition scratch for the obligation closure. The `found` marks use
/// a monotonically growing epoch so that resetting them between states is a
/// single counter bump; only on wrap-around is the array rewritten.
pub(crate) struct StubbornScratch {
    /// Epoch stamp: transition already visited at the current state.
    found: Vec<u32>,
    /// Next obligation alternative to request for each visited transition.
    pub(crate) cursor: Vec<u32>,
    /// Tarjan low index into the component stack; `NONE` once the
    /// transition's component has completed.
    pub(crate) min: Vec<u32>,
    /// Depth-first stack.
    pub(crate) dfs: Vec<u32>,
    /// Component stack in completion order.
    pub(crate) scc: Vec<u32>,
    epoch: u32,
}

impl StubbornScratch {
    pub(crate) fn new(nr_trans: u32) -> Self {
        let n = nr_trans as usize;
        Self {
            found: vec![0; n],
            cursor: vec![0; n],
            min: vec![0; n],
            dfs: Vec::with_capacity(n),
            scc: Vec::with_capacity(n),
            epoch: 0,
        }
    }

    /// Invalidate all `found` marks for a freshly expanded state.
    pub(crate) fn begin_node(&mut self) {
        self.epoch = self.epoch.wrapping_add(1);
        if self.epoch == 0 {
            self.found.fill(0);
            self.epoch = 1;
        }
    }

    #[inline]
    pub(crate) fn seen(&self, tr: u32) -> bool {
        self.found[tr as usize] == self.epoch
    }

    /// Begin a new depth-first search rooted at `tr`.
    pub(crate) fn start(&mut self, tr: u32) {
        self.found[tr as usize] = self.epoch;
        self.cursor[tr as usize] = 0;
        self.min[tr as usize] = 0;
        self.dfs.clear();
        self.scc.clear();
        self.dfs.push(tr);
        self.scc.push(tr);
    }

    /// Push a newly discovered transition onto both stacks.
    pub(crate) fn enter(&mut self, tr: u32) {
        self.found[tr as usize] = self.epoch;
        self.cursor[tr as usize] = 0;
        self.min[tr as usize] = self.scc.len() as u32;
        self.dfs.push(tr);
        self.scc.push(tr);
    }
}

impl<M: Model> Explorer<M> {
    /// Expand `q_first` under stubborn-set reduction. Transitions are tried
    /// as closure starting points in the configured outer order; each
    /// completed component is fired against `q_first`, and the expansion
    /// ends with the first component that contained an enabled transition.
    pub(crate) fn expand_stubborn(&mut self, q_first: u32) -> Flow<()> {
        let mut some_fired = false;
        self.stub.begin_node();

        for i in 0..self.tr_order.len() {
            let tr = self.tr_order[i];
            if self.stub.seen(tr) {
                continue;
            }
            self.stub.start(tr);

            while let Some(&t1) = self.stub.dfs.last() {
                let sm1 = self.stub.min[t1 as usize];
                match self.next_alternative(t1, q_first)? {
                    None => {
                        // Obligations of t1 exhausted: backtrack.
                        self.stub.dfs.pop();
                        if self.stub.scc[sm1 as usize] == t1 {
                            // t1 roots a completed component: fire it in
                            // component-stack order.
                            for ii in sm1 as usize..self.stub.scc.len() {
                                let t = self.stub.scc[ii];
                                self.stub.min[t as usize] = NONE;
                                some_fired |= self.try_transition(q_first, t)?;
                            }
                            if some_fired {
                                return Ok(());
                            }
                            self.stub.scc.truncate(sm1 as usize);
                        } else if let Some(&parent) = self.stub.dfs.last() {
                            if self.stub.min[parent as usize] > sm1 {
                                self.stub.min[parent as usize] = sm1;
                            }
                        }
                    }
                    Some(t2) if !self.stub.seen(t2) => self.stub.enter(t2),
                    Some(t2) => {
                        // Back or cross edge; completed components carry
                        // min == NONE and never propagate.
                        if sm1 > self.stub.min[t2 as usize] {
                            self.stub.min[t1 as usize] = self.stub.min[t2 as usize];
                        }
                    }
                }
            }
        }
        Ok(())
    }

    /// Next unseen obligation alternative of `t1` at the current state, or
    /// `None` when the alternatives are exhausted.
    fn next_alternative(&mut self, t1: u32, q_first: u32) -> Flow<Option<u32>> {
        let cursor = self.stub.cursor[t1 as usize];
        let alt = match self.model.obligations(t1, &self.state_ref()) {
            Obligation::None => None,
            Obligation::OneOf(list) => {
                if cursor == 0 && self.config.sanity_checks {
                    for (i, &a) in list.iter().enumerate() {
                        if list[..i].contains(&a) {
                            return Err(Abort::At {
                                kind: FailureKind::StubbornSet,
                                message: "Same element twice in stb list".into(),
                                node: q_first,
                            });
                        }
                    }
                }
                list.get(cursor as usize).copied()
            }
            Obligation::All => (cursor < self.nr_trans).then_some(cursor),
        };
        if let Some(t2) = alt {
            if t2 >= self.nr_trans {
                return Err(Abort::At {
                    kind: FailureKind::StubbornSet,
                    message: "Transition number out of range in stb list".into(),
                    node: q_first,
                });
            }
            self.stub.cursor[t1 as usize] = cursor + 1;
        }
        Ok(alt)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_epoch_marks_reset_per_node() {
        let mut s = StubbornScratch::new(3);
        s.begin_node();
        assert!(!s.seen(0));
        s.start(0);
        assert!(s.seen(0));
        assert!(!s.seen(1));
        s.begin_node();
        assert!(!s.seen(0));
    }

    #[test]
    fn test_epoch_wraparound_rewrites_marks() {
        let mut s = StubbornScratch::new(2);
        s.epoch = u32::MAX - 1;
        s.begin_node();
        s.start(1);
        assert!(s.seen(1));
        // The next bump wraps; stale marks must not survive even though the
        // counter itself repeats.
        s.begin_node();
        assert_eq!(s.epoch, 1);
        assert!(!s.seen(1));
    }

    #[test]
    fn test_enter_records_component_position() {
        let mut s = StubbornScratch::new(4);
        s.begin_node();
        s.start(2);
        s.enter(3);
        assert_eq!(s.min[2], 0);
        assert_eq!(s.min[3], 1);
        assert_eq!(s.dfs, vec![2, 3]);
        assert_eq!(s.scc, vec![2, 3]);
    }
}
