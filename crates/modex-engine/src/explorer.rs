//! Breadth-first state-space exploration.
//!
//! The queue is implicit: node indices double as queue positions, so
//! advancing `q_first` through the node array visits states in discovery
//! order and newly interned rows are automatically "enqueued". Each popped
//! row is copied into the scratch row, transitions are fired against the
//! copy, successors are interned, and safety and deadlock predicates are
//! evaluated online. The same loop is replayed as a second pass to populate
//! the incoming-edge array (see [`crate::progress`]).

use crate::config::CheckConfig;
use crate::index::HashIndex;
use crate::layout::LayoutBuilder;
use crate::model::{Model, StateMut, StateRef};
use crate::node::Node;
use crate::pool::StatePool;
use crate::report::{
    CheckFailure, FailureKind, RunReport, Trace, TypicalTail, Verdict,
};
use crate::stubborn::StubbornScratch;
use tracing::{debug, info, warn};

/// First-failure-wins abort carried through the checking phases by `?`.
pub(crate) enum Abort {
    /// Failure located at a node; the counterexample is the history of that
    /// node (zero-length for node 0).
    At {
        kind: FailureKind,
        message: String,
        node: u32,
    },
    /// Fully assembled failure (progress violations, whose traces carry a
    /// typical continuation).
    Full(Box<CheckFailure>),
}

pub(crate) type Flow<T> = Result<T, Abort>;

struct RunOutcome {
    caveat: Option<&'static str>,
    typical: Option<TypicalTail>,
}

/// The checking engine. Owns the state pool, the node metadata, the hash
/// index, the incoming-edge array, and the stubborn-set scratch; the model
/// only ever sees the current row through the views.
pub struct Explorer<M: Model> {
    pub(crate) model: M,
    pub(crate) config: CheckConfig,
    pub(crate) pool: StatePool,
    pub(crate) nodes: Vec<Node>,
    pub(crate) index: HashIndex,
    pub(crate) nr_trans: u32,
    pub(crate) nr_edges: usize,
    /// Transition trial order: descending by default, ascending under
    /// `try_forward`.
    pub(crate) tr_order: Vec<u32>,
    pub(crate) stub: StubbornScratch,
    /// Flat incoming-edge array, segmented per node by `ie_end`.
    pub(crate) iedges: Vec<u32>,
    /// True while the reverse-edge pass replays the exploration.
    pub(crate) backward: bool,
    /// Latched modelling fault, first one wins; checked after callbacks.
    pub(crate) fault: Option<&'static str>,
    /// Whether per-node edge counters and the incoming-edge array are kept.
    pub(crate) progress_structs: bool,
    setup_fault: Option<&'static str>,
}

impl<M: Model> Explorer<M> {
    /// Run the model's declaration phase and set up the engine structures.
    /// Declaration faults are latched and reported by [`run`](Self::run).
    pub fn new(mut model: M, config: CheckConfig) -> Self {
        let mut builder = LayoutBuilder::new();
        let nr_trans = model.declare(&mut builder);
        let (layout, setup_fault) = builder.finish();
        debug!(
            transitions = nr_trans,
            words = layout.words(),
            "model declared"
        );

        // An all-ones transition count is itself a modelling error; do not
        // size anything from it.
        let usable = if nr_trans == u32::MAX { 0 } else { nr_trans };
        let tr_order: Vec<u32> = if config.try_forward {
            (0..usable).collect()
        } else {
            (0..usable).rev().collect()
        };
        let stub = StubbornScratch::new(if config.stubborn { usable } else { 0 });
        let progress_structs = config.progress_structs();

        Self {
            pool: StatePool::new(layout),
            nodes: vec![Node::default()],
            index: HashIndex::new(config.hash_bits),
            nr_trans,
            nr_edges: 0,
            tr_order,
            stub,
            iedges: Vec::new(),
            backward: false,
            fault: None,
            progress_structs,
            setup_fault,
            model,
            config,
        }
    }

    /// Run every configured check and return the report. Never panics on
    /// model misbehaviour: modelling errors become `Verdict::Failed`.
    pub fn run(&mut self) -> RunReport {
        let outcome = self.run_inner();
        let mut typical = None;
        let verdict = match outcome {
            Ok(RunOutcome {
                caveat: None,
                typical: t,
            }) => {
                typical = t;
                Verdict::Pass
            }
            Ok(RunOutcome {
                caveat: Some(reason),
                ..
            }) => Verdict::Inconclusive(reason),
            Err(abort) => Verdict::Failed(self.failure_of(abort)),
        };
        RunReport {
            states: self.state_count(),
            edges: self.nr_edges,
            verdict,
            typical,
        }
    }

    fn run_inner(&mut self) -> Flow<RunOutcome> {
        if let Some(msg) = self.setup_fault.take() {
            return Err(Abort::At {
                kind: FailureKind::Initialization,
                message: msg.into(),
                node: 0,
            });
        }
        if let Some(msg) = self.config.nothing_to_check() {
            return Err(Abort::At {
                kind: FailureKind::Initialization,
                message: msg.into(),
                node: 0,
            });
        }

        self.store_initial_state()?;

        if self.config.only_typical {
            let tail = self.typical_tail(1, true)?;
            return Ok(RunOutcome {
                caveat: None,
                typical: Some(tail),
            });
        }

        self.build_state_space()?;
        info!(
            states = self.state_count(),
            edges = self.nr_edges,
            "state space constructed"
        );

        if self.progress_structs {
            self.build_incoming_edges()?;
            if self.config.check_may_progress {
                self.verify_progress(0)?;
            }
            if self.config.check_must_progress {
                self.verify_progress(1)?;
            }
            if self.config.stubborn {
                self.verify_progress(2)?;
            }
        }

        let caveat = if self.config.stubborn && self.config.check_must_progress {
            warn!("must-progress verdicts are not guaranteed under stubborn-set reduction");
            Some("Must progress is unreliable with stubborn sets")
        } else if !self.config.check_deadlock
            && !self.config.check_may_progress
            && !self.config.check_must_progress
        {
            Some("Nothing was defined to test that the model makes progress")
        } else {
            None
        };
        Ok(RunOutcome {
            caveat,
            typical: None,
        })
    }

    /// Initialise the model on row 1, canonicalise it, intern it, and check
    /// it against the safety predicate.
    fn store_initial_state(&mut self) -> Flow<()> {
        let scratch = self.pool.scratch();
        self.pool.bind(scratch);
        self.with_state_mut(|model, s| model.init(s));
        if self.config.symmetry {
            self.with_state_mut(|model, s| model.symmetry_representative(s));
        }
        let stop = self.config.stop_count;
        let (ni, was_new) = self
            .index
            .insert(&mut self.pool, &mut self.nodes, stop)
            .map_err(|_| Abort::At {
                kind: FailureKind::StateLimit,
                message: "Maximum number of states exceeded".into(),
                node: 0,
            })?;
        debug_assert!(ni == 1 && was_new);
        self.take_fault(1, FailureKind::Initialization)?;
        if self.nr_trans == u32::MAX {
            return Err(Abort::At {
                kind: FailureKind::TooManyTransitions,
                message: String::new(),
                node: 0,
            });
        }
        if self.config.check_state {
            self.pool.bind(1);
            if let Some(msg) = self.model.check_state(&self.state_ref()) {
                return Err(Abort::At {
                    kind: FailureKind::Safety,
                    message: msg.into(),
                    node: 1,
                });
            }
        }
        Ok(())
    }

    /// The BFS loop, shared between the forward (constructing) pass and the
    /// backward (incoming-edge) pass. The backward pass must take exactly
    /// the decisions of the forward pass, so the only difference is inside
    /// [`try_transition`](Self::try_transition).
    pub(crate) fn build_state_space(&mut self) -> Flow<()> {
        let mut q_first: u32 = 1;
        while (q_first as usize) < self.nodes.len() {
            if self.config.show_count != 0 && q_first as usize % self.config.show_count == 0 {
                if self.backward {
                    info!(states = q_first, "states backwards-processed");
                } else {
                    info!(states = q_first, "states constructed");
                }
            }

            let old_edges = self.nr_edges;
            self.pool.copy_to_scratch(q_first);
            if self.config.stubborn {
                self.expand_stubborn(q_first)?;
            } else {
                for i in 0..self.tr_order.len() {
                    let tr = self.tr_order[i];
                    self.try_transition(q_first, tr)?;
                }
            }

            // Faults are checked per transition only while sanity checks are
            // on; this per-node check keeps explicit model failures from
            // being lost when they are off.
            self.take_fault(q_first, FailureKind::TransitionFiring)?;

            // A state without outgoing edges is terminal; ask the model
            // whether terminating there is legal. Forward pass only.
            if !self.backward
                && old_edges == self.nr_edges
                && self.config.check_deadlock
            {
                self.pool.bind(q_first);
                if let Some(msg) = self.model.check_deadlock(&self.state_ref()) {
                    return Err(Abort::At {
                        kind: FailureKind::IllegalDeadlock,
                        message: msg.into(),
                        node: q_first,
                    });
                }
            }

            q_first += 1;
        }
        Ok(())
    }

    /// Fire `tr` against the scratch copy of `n1` and process the successor.
    /// Returns whether the transition was enabled. The scratch row is
    /// restored from `n1` before returning whenever the firing succeeded.
    pub(crate) fn try_transition(&mut self, n1: u32, tr: u32) -> Flow<bool> {
        let enabled = self.with_state_mut(|model, s| model.fire(tr, s));
        if self.config.sanity_checks {
            self.take_fault(n1, FailureKind::TransitionFiring)?;
        }
        if !enabled {
            return Ok(false);
        }

        if self.config.symmetry {
            self.with_state_mut(|model, s| model.symmetry_representative(s));
            self.take_fault(n1, FailureKind::TransitionFiring)?;
        }

        if self.backward {
            // Replay: the successor must already be interned; append the
            // source to its incoming-edge segment.
            let target = self.index.find(&self.pool, &self.nodes);
            if target == 0 {
                return Err(Abort::At {
                    kind: FailureKind::TransitionFiring,
                    message: "Transition firing differed between passes".into(),
                    node: n1,
                });
            }
            let slot = self.nodes[target as usize].ie_end;
            self.iedges[slot as usize] = n1;
            self.nodes[target as usize].ie_end = slot + 1;
            self.pool.copy_to_scratch(n1);
            return Ok(true);
        }

        let stop = self.config.stop_count;
        let (n2, was_new) = self
            .index
            .insert(&mut self.pool, &mut self.nodes, stop)
            .map_err(|_| Abort::At {
                kind: FailureKind::StateLimit,
                message: "Maximum number of states exceeded".into(),
                node: n1,
            })?;
        self.nr_edges += 1;
        self.nodes[n2 as usize].e_cnt += 1;

        if was_new {
            self.nodes[n2 as usize].prev = n1;
            if self.config.check_state {
                // The promoted row is still the current row.
                if let Some(msg) = self.model.check_state(&self.state_ref()) {
                    return Err(Abort::At {
                        kind: FailureKind::Safety,
                        message: msg.into(),
                        node: n2,
                    });
                }
            }
        }

        self.pool.copy_to_scratch(n1);
        Ok(true)
    }

    /// Read-only view of the current row.
    pub(crate) fn state_ref(&self) -> StateRef<'_> {
        StateRef {
            row: self.pool.current_row(),
            row_index: self.pool.current(),
        }
    }

    /// Run a callback against a mutable view of the current row.
    pub(crate) fn with_state_mut<R>(&mut self, f: impl FnOnce(&M, &mut StateMut<'_>) -> R) -> R {
        let sanity = self.config.sanity_checks;
        let row_index = self.pool.current();
        let Self {
            model, pool, fault, ..
        } = self;
        let mut s = StateMut {
            row: pool.current_row_mut(),
            row_index,
            sanity,
            fault,
        };
        f(model, &mut s)
    }

    /// Turn a latched modelling fault into an abort at `node`.
    pub(crate) fn take_fault(&mut self, node: u32, kind: FailureKind) -> Flow<()> {
        match self.fault.take() {
            Some(msg) => Err(Abort::At {
                kind,
                message: msg.into(),
                node,
            }),
            None => Ok(()),
        }
    }

    fn failure_of(&mut self, abort: Abort) -> CheckFailure {
        match abort {
            Abort::Full(failure) => *failure,
            Abort::At {
                kind,
                message,
                node,
            } => CheckFailure {
                kind,
                message,
                trace: Trace {
                    states: self.history(node),
                    tail: None,
                },
            },
        }
    }

    // -- Post-run inspection --------------------------------------------

    /// Number of constructed states (the sentinel row does not count).
    pub fn state_count(&self) -> usize {
        self.nodes.len().saturating_sub(1)
    }

    /// Number of explored edges.
    pub fn edge_count(&self) -> usize {
        self.nr_edges
    }

    /// Number of structural transitions the model declared.
    pub fn transition_count(&self) -> u32 {
        self.nr_trans
    }

    /// The node whose expansion first discovered `ni` (0 for the initial
    /// state).
    pub fn parent(&self, ni: u32) -> u32 {
        self.nodes[ni as usize].prev
    }

    /// Raw words of row `ni`.
    pub fn row_words(&self, ni: u32) -> &[usize] {
        self.pool.row(ni)
    }

    /// Current value of the reused per-node counter: after a run without
    /// progress rounds this is the number of discovered incoming edges.
    pub fn node_counter(&self, ni: u32) -> u32 {
        self.nodes[ni as usize].e_cnt
    }

    /// Incoming-edge segment of `ni`; valid once the backward pass has run.
    pub fn incoming(&self, ni: u32) -> &[u32] {
        let ni = ni as usize;
        let start = self.nodes[ni - 1].ie_end as usize;
        let end = self.nodes[ni].ie_end as usize;
        &self.iedges[start..end]
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::layout::{LayoutBuilder, WORD_BITS};
    use crate::model::{StateMut, StateRef};
    use crate::report::Verdict;

    /// One counter stepping 0..=len, terminal at len.
    struct Chain {
        len: usize,
        bad_at: Option<usize>,
        reject_end: bool,
        x: Option<crate::layout::Var>,
    }

    impl Chain {
        fn new(len: usize) -> Self {
            Self {
                len,
                bad_at: None,
                reject_end: false,
                x: None,
            }
        }
    }

    impl Model for Chain {
        fn declare(&mut self, b: &mut LayoutBuilder) -> u32 {
            self.x = Some(b.var(8));
            1
        }
        fn fire(&self, _tr: u32, s: &mut StateMut<'_>) -> bool {
            let x = self.x.unwrap();
            if s.get(x) < self.len {
                s.set(x, s.get(x) + 1);
                true
            } else {
                false
            }
        }
        fn format_state(&self, s: &StateRef<'_>) -> String {
            format!("x={}", s.get(self.x.unwrap()))
        }
        fn check_state(&self, s: &StateRef<'_>) -> Option<&'static str> {
            match self.bad_at {
                Some(bad) if s.get(self.x.unwrap()) == bad => Some("reached the bad value"),
                _ => None,
            }
        }
        fn check_deadlock(&self, s: &StateRef<'_>) -> Option<&'static str> {
            if self.reject_end && s.get(self.x.unwrap()) == self.len {
                Some("stopped before the end")
            } else {
                None
            }
        }
    }

    /// Two independent counters; the stubborn obligations are empty because
    /// the transitions commute.
    struct TwoCounters {
        max: usize,
        bad_at_corner: bool,
        a: Option<crate::layout::Var>,
        b: Option<crate::layout::Var>,
    }

    impl TwoCounters {
        fn new(max: usize) -> Self {
            Self {
                max,
                bad_at_corner: false,
                a: None,
                b: None,
            }
        }
    }

    impl Model for TwoCounters {
        fn declare(&mut self, b: &mut LayoutBuilder) -> u32 {
            self.a = Some(b.var(4));
            self.b = Some(b.var(4));
            2
        }
        fn fire(&self, tr: u32, s: &mut StateMut<'_>) -> bool {
            let var = if tr == 0 {
                self.a.unwrap()
            } else {
                self.b.unwrap()
            };
            if s.get(var) < self.max {
                s.set(var, s.get(var) + 1);
                true
            } else {
                false
            }
        }
        fn format_state(&self, s: &StateRef<'_>) -> String {
            format!("a={} b={}", s.get(self.a.unwrap()), s.get(self.b.unwrap()))
        }
        fn check_state(&self, s: &StateRef<'_>) -> Option<&'static str> {
            if self.bad_at_corner
                && s.get(self.a.unwrap()) == self.max
                && s.get(self.b.unwrap()) == self.max
            {
                Some("both counters saturated")
            } else {
                None
            }
        }
    }

    fn run_with(model: impl Model, config: CheckConfig) -> RunReport {
        let mut explorer = Explorer::new(model, config);
        explorer.run()
    }

    #[test]
    fn test_chain_exploration_counts() {
        let config = CheckConfig {
            check_deadlock: true,
            ..Default::default()
        };
        let mut explorer = Explorer::new(Chain::new(5), config);
        let report = explorer.run();
        assert!(report.verdict.is_pass(), "got {:?}", report.verdict);
        assert_eq!(report.states, 6);
        assert_eq!(report.edges, 5);
        // BFS predecessors point strictly backwards.
        for ni in 2..=6 {
            assert_eq!(explorer.parent(ni), ni - 1);
        }
        assert_eq!(explorer.parent(1), 0);
    }

    #[test]
    fn test_safety_violation_has_minimal_history() {
        let model = Chain {
            bad_at: Some(3),
            ..Chain::new(5)
        };
        let config = CheckConfig {
            check_state: true,
            check_deadlock: true,
            ..Default::default()
        };
        let report = run_with(model, config);
        let failure = report.verdict.failure().expect("expected a failure");
        assert_eq!(failure.kind, FailureKind::Safety);
        assert_eq!(failure.message, "reached the bad value");
        assert_eq!(
            failure.trace.states,
            vec!["x=0", "x=1", "x=2", "x=3"]
        );
    }

    #[test]
    fn test_illegal_deadlock_reported_at_terminal() {
        let model = Chain {
            reject_end: true,
            ..Chain::new(3)
        };
        let config = CheckConfig {
            check_deadlock: true,
            ..Default::default()
        };
        let report = run_with(model, config);
        let failure = report.verdict.failure().unwrap();
        assert_eq!(failure.kind, FailureKind::IllegalDeadlock);
        assert_eq!(failure.trace.states.len(), 4);
        assert_eq!(failure.trace.states.last().unwrap(), "x=3");
    }

    #[test]
    fn test_safety_only_run_is_inconclusive() {
        let config = CheckConfig {
            check_state: true,
            ..Default::default()
        };
        let report = run_with(Chain::new(2), config);
        match report.verdict {
            Verdict::Inconclusive(reason) => {
                assert!(reason.contains("progress"), "got {reason}")
            }
            other => panic!("expected Inconclusive, got {other:?}"),
        }
    }

    #[test]
    fn test_no_checks_enabled_fails_fast() {
        let report = run_with(Chain::new(2), CheckConfig::default());
        let failure = report.verdict.failure().unwrap();
        assert_eq!(failure.kind, FailureKind::Initialization);
        assert!(failure.trace.states.is_empty());
    }

    #[test]
    fn test_too_many_transitions() {
        struct Degenerate;
        impl Model for Degenerate {
            fn declare(&mut self, b: &mut LayoutBuilder) -> u32 {
                b.var(1);
                u32::MAX
            }
            fn fire(&self, _tr: u32, _s: &mut StateMut<'_>) -> bool {
                false
            }
            fn format_state(&self, _s: &StateRef<'_>) -> String {
                String::new()
            }
        }
        let config = CheckConfig {
            check_deadlock: true,
            ..Default::default()
        };
        let report = run_with(Degenerate, config);
        let failure = report.verdict.failure().unwrap();
        assert_eq!(failure.kind, FailureKind::TooManyTransitions);
    }

    #[test]
    fn test_declaration_fault_reported() {
        struct WideVar;
        impl Model for WideVar {
            fn declare(&mut self, b: &mut LayoutBuilder) -> u32 {
                b.var(WORD_BITS + 1);
                1
            }
            fn fire(&self, _tr: u32, _s: &mut StateMut<'_>) -> bool {
                false
            }
            fn format_state(&self, _s: &StateRef<'_>) -> String {
                String::new()
            }
        }
        let config = CheckConfig {
            check_deadlock: true,
            ..Default::default()
        };
        let report = run_with(WideVar, config);
        let failure = report.verdict.failure().unwrap();
        assert_eq!(failure.kind, FailureKind::Initialization);
        assert_eq!(failure.message, "Too many bits in a state variable");
    }

    #[test]
    fn test_out_of_range_write_is_a_firing_error() {
        struct Corrupt {
            x: Option<crate::layout::Var>,
        }
        impl Model for Corrupt {
            fn declare(&mut self, b: &mut LayoutBuilder) -> u32 {
                self.x = Some(b.var(1));
                1
            }
            fn fire(&self, _tr: u32, s: &mut StateMut<'_>) -> bool {
                if s.get(self.x.unwrap()) == 0 {
                    s.set(self.x.unwrap(), 2); // does not fit one bit
                    true
                } else {
                    false
                }
            }
            fn format_state(&self, s: &StateRef<'_>) -> String {
                format!("x={}", s.get(self.x.unwrap()))
            }
        }
        let config = CheckConfig {
            check_deadlock: true,
            ..Default::default()
        };
        let report = run_with(Corrupt { x: None }, config);
        let failure = report.verdict.failure().unwrap();
        assert_eq!(failure.kind, FailureKind::TransitionFiring);
        assert_eq!(
            failure.message,
            "Assigned an out of range value to a variable"
        );
        assert_eq!(failure.trace.states, vec!["x=0"]);
    }

    #[test]
    fn test_state_limit() {
        let config = CheckConfig {
            check_deadlock: true,
            stop_count: 3,
            ..Default::default()
        };
        let report = run_with(Chain::new(10), config);
        let failure = report.verdict.failure().unwrap();
        assert_eq!(failure.kind, FailureKind::StateLimit);
        assert_eq!(failure.message, "Maximum number of states exceeded");
    }

    #[test]
    fn test_full_product_exploration() {
        let config = CheckConfig {
            check_deadlock: true,
            ..Default::default()
        };
        let report = run_with(TwoCounters::new(3), config);
        assert!(report.verdict.is_pass());
        assert_eq!(report.states, 16);
        assert_eq!(report.edges, 24);
    }

    #[test]
    fn test_stubborn_reduction_explores_fewer_states() {
        let full = run_with(
            TwoCounters::new(3),
            CheckConfig {
                check_deadlock: true,
                ..Default::default()
            },
        );
        let reduced = run_with(
            TwoCounters::new(3),
            CheckConfig {
                check_deadlock: true,
                stubborn: true,
                ..Default::default()
            },
        );
        assert!(full.verdict.is_pass());
        assert!(reduced.verdict.is_pass());
        assert!(
            reduced.states < full.states,
            "reduction did not shrink the space: {} vs {}",
            reduced.states,
            full.states
        );
    }

    #[test]
    fn test_stubborn_reduction_preserves_safety_verdict() {
        for stubborn in [false, true] {
            let model = TwoCounters {
                bad_at_corner: true,
                ..TwoCounters::new(3)
            };
            let config = CheckConfig {
                check_state: true,
                check_deadlock: true,
                stubborn,
                ..Default::default()
            };
            let report = run_with(model, config);
            let failure = report.verdict.failure().unwrap_or_else(|| {
                panic!("stubborn={stubborn}: corner not found")
            });
            assert_eq!(failure.kind, FailureKind::Safety);
        }
    }

    #[test]
    fn test_forward_order_changes_tie_broken_path() {
        // Both orders reach the corner at the same minimal depth, but the
        // intermediate tie-broken states differ.
        let run = |forward: bool| {
            let model = TwoCounters {
                bad_at_corner: true,
                ..TwoCounters::new(2)
            };
            let config = CheckConfig {
                check_state: true,
                check_deadlock: true,
                try_forward: forward,
                ..Default::default()
            };
            run_with(model, config)
        };
        let backward = run(false);
        let forward = run(true);
        let bt = &backward.verdict.failure().unwrap().trace.states;
        let ft = &forward.verdict.failure().unwrap().trace.states;
        assert_eq!(bt.len(), ft.len());
        assert_eq!(bt.len(), 5);
        assert_ne!(bt[1], ft[1]);
    }

    #[test]
    fn test_typical_execution_of_chain_ends_in_terminal() {
        let config = CheckConfig {
            only_typical: true,
            ..Default::default()
        };
        let report = run_with(Chain::new(2), config);
        assert!(report.verdict.is_pass());
        let tail = report.typical.expect("typical tail missing");
        assert_eq!(tail.approach, vec!["x=0", "x=1"]);
        assert_eq!(tail.cycle, vec!["x=2"]);
        assert_eq!(report.states, 3);
    }

    #[test]
    fn test_symmetry_representative_shrinks_the_space() {
        // Two interchangeable counters: the representative orders them, so
        // states are multisets instead of pairs.
        struct SymCounters {
            max: usize,
            a: Option<crate::layout::Var>,
            b: Option<crate::layout::Var>,
        }
        impl Model for SymCounters {
            fn declare(&mut self, b: &mut LayoutBuilder) -> u32 {
                self.a = Some(b.var(4));
                self.b = Some(b.var(4));
                2
            }
            fn fire(&self, tr: u32, s: &mut StateMut<'_>) -> bool {
                let var = if tr == 0 {
                    self.a.unwrap()
                } else {
                    self.b.unwrap()
                };
                if s.get(var) < self.max {
                    s.set(var, s.get(var) + 1);
                    true
                } else {
                    false
                }
            }
            fn format_state(&self, s: &StateRef<'_>) -> String {
                format!("a={} b={}", s.get(self.a.unwrap()), s.get(self.b.unwrap()))
            }
            fn symmetry_representative(&self, s: &mut StateMut<'_>) {
                let (a, b) = (self.a.unwrap(), self.b.unwrap());
                let (x, y) = (s.get(a), s.get(b));
                if x > y {
                    s.set(a, y);
                    s.set(b, x);
                }
            }
        }

        let run = |symmetry: bool| {
            let config = CheckConfig {
                check_deadlock: true,
                symmetry,
                ..Default::default()
            };
            run_with(
                SymCounters {
                    max: 3,
                    a: None,
                    b: None,
                },
                config,
            )
        };
        let plain = run(false);
        let canonical = run(true);
        assert!(plain.verdict.is_pass());
        assert!(canonical.verdict.is_pass());
        assert_eq!(plain.states, 16);
        // Multisets {a, b} with 0 <= a <= b <= 3.
        assert_eq!(canonical.states, 10);
    }

    #[test]
    fn test_hash_identity_no_duplicate_rows() {
        let config = CheckConfig {
            check_deadlock: true,
            hash_bits: 2, // force long chains
            ..Default::default()
        };
        let mut explorer = Explorer::new(TwoCounters::new(3), config);
        let report = explorer.run();
        assert!(report.verdict.is_pass());
        for i in 1..=report.states as u32 {
            for j in (i + 1)..=report.states as u32 {
                assert_ne!(
                    explorer.row_words(i),
                    explorer.row_words(j),
                    "rows {i} and {j} collide"
                );
            }
        }
    }

    #[test]
    fn test_edge_count_matches_node_counters() {
        let config = CheckConfig {
            check_deadlock: true,
            ..Default::default()
        };
        let mut explorer = Explorer::new(TwoCounters::new(2), config);
        let report = explorer.run();
        assert!(report.verdict.is_pass());
        let total: u64 = (1..=report.states as u32)
            .map(|ni| explorer.node_counter(ni) as u64)
            .sum();
        assert_eq!(total, report.edges as u64);
    }
}

