//! Check configuration.

use crate::model::Features;

/// Configuration for one checking run. Every switch is independent; the
/// derived decisions (whether progress structures are maintained, whether the
/// may-terminating round runs) are computed by the explorer from this.
#[derive(Clone, Debug)]
pub struct CheckConfig {
    /// Evaluate the safety predicate on every newly interned state.
    pub check_state: bool,
    /// Evaluate the deadlock predicate on terminal states.
    pub check_deadlock: bool,
    /// Check that some may-progress state is reachable from every state.
    pub check_may_progress: bool,
    /// Check that every cycle and terminal state contains a must-progress
    /// state.
    pub check_must_progress: bool,
    /// Canonicalise successors through the model's symmetry representative.
    pub symmetry: bool,
    /// Use stubborn-set reduction driven by the model's obligations.
    pub stubborn: bool,
    /// Do not model check; print one typical execution ending in a cycle or
    /// terminal state.
    pub only_typical: bool,
    /// Try transitions in ascending order (default is descending, so that
    /// high-numbered "unusual" transitions surface errors earlier).
    pub try_forward: bool,
    /// Terminal states do NOT count as may-progress states by default.
    pub dl_not_may: bool,
    /// Terminal states do NOT count as must-progress states by default.
    pub dl_not_must: bool,
    /// Skip all progress work, saving the incoming-edge array.
    pub no_progress_check: bool,
    /// Range and obligation-list checks in the hot paths.
    pub sanity_checks: bool,
    /// Log the running state count every this many states; 0 disables.
    pub show_count: usize,
    /// Abort exploration after this many states.
    pub stop_count: usize,
    /// Hash table size is `2^hash_bits`.
    pub hash_bits: u32,
}

impl Default for CheckConfig {
    fn default() -> Self {
        Self {
            check_state: false,
            check_deadlock: false,
            check_may_progress: false,
            check_must_progress: false,
            symmetry: false,
            stubborn: false,
            only_typical: false,
            try_forward: false,
            dl_not_may: false,
            dl_not_must: false,
            no_progress_check: false,
            sanity_checks: true,
            show_count: 1000,
            stop_count: 30_000_000,
            hash_bits: 23,
        }
    }
}

impl CheckConfig {
    /// Configuration with exactly the checks and reductions the model
    /// declares in its [`Features`].
    pub fn from_features(f: Features) -> Self {
        Self {
            check_state: f.safety,
            check_deadlock: f.deadlock,
            check_may_progress: f.may_progress,
            check_must_progress: f.must_progress,
            symmetry: f.symmetry,
            stubborn: f.stubborn,
            ..Self::default()
        }
    }

    /// Whether the run maintains the progress structures (per-node edge
    /// counters and the incoming-edge array). Needed for the progress rounds
    /// and, under stubborn reduction with safety checking, for the
    /// may-terminating round; a typical-execution run always needs them.
    pub(crate) fn progress_structs(&self) -> bool {
        if self.only_typical {
            return true;
        }
        if self.no_progress_check {
            return false;
        }
        self.check_may_progress
            || self.check_must_progress
            || (self.stubborn && self.check_state)
    }

    /// None when at least one property would be checked.
    pub(crate) fn nothing_to_check(&self) -> Option<&'static str> {
        if self.only_typical
            || self.check_state
            || self.check_deadlock
            || self.check_may_progress
            || self.check_must_progress
        {
            None
        } else {
            Some("no property check is enabled")
        }
    }
}
