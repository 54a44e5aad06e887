//! The engine→model contract.
//!
//! A model is a Rust value implementing [`Model`], linked with the engine
//! into one program. The engine owns all state storage; the model reads and
//! writes its declared variables through the [`StateRef`]/[`StateMut`] views,
//! which the engine binds to a definite row before every callback. Models
//! must not cache row contents or indices across calls.

use crate::layout::{LayoutBuilder, Var};
use smallvec::SmallVec;

/// Stubborn-set obligation for one transition.
///
/// If the inspected transition is in the stubborn set of the current state,
/// at least one of the listed alternatives must also be in it; the engine
/// picks which. `All` demands every transition. Listing the same transition
/// twice in one `OneOf` is a modelling error.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum Obligation {
    /// No additional transitions are required.
    None,
    /// At least one of these transitions must join the set (up to four, as
    /// larger disjunctions can always be split across helper transitions).
    OneOf(SmallVec<[u32; 4]>),
    /// The stubborn set must contain all transitions.
    All,
}

impl Obligation {
    /// Convenience constructor: `one_of(&[t1, t2])`.
    pub fn one_of(alternatives: &[u32]) -> Self {
        Obligation::OneOf(SmallVec::from_slice(alternatives))
    }
}

/// Which optional callbacks a model implements, and which reductions it
/// supports. The CLI seeds its check configuration from this; the engine
/// only calls hooks the configuration enables.
#[derive(Clone, Copy, Debug, Default)]
pub struct Features {
    pub safety: bool,
    pub deadlock: bool,
    pub may_progress: bool,
    pub must_progress: bool,
    pub symmetry: bool,
    pub stubborn: bool,
}

/// Read-only view of the current row.
pub struct StateRef<'a> {
    pub(crate) row: &'a [usize],
    pub(crate) row_index: u32,
}

impl StateRef<'_> {
    /// Value of a state variable, in `0..2^bits`.
    #[inline]
    pub fn get(&self, var: Var) -> usize {
        var.read(self.row)
    }

    /// True iff the current row is the initial state.
    #[inline]
    pub fn is_initial(&self) -> bool {
        self.row_index == 1
    }

    /// True iff every declared variable is zero.
    #[inline]
    pub fn is_zero(&self) -> bool {
        self.row.iter().all(|&w| w == 0)
    }
}

/// Mutable view of the current row, handed to [`Model::fire`] and the other
/// state-changing callbacks. Modelling faults raised here are latched
/// first-one-wins and checked by the engine after the callback returns.
pub struct StateMut<'a> {
    pub(crate) row: &'a mut [usize],
    pub(crate) row_index: u32,
    pub(crate) sanity: bool,
    pub(crate) fault: &'a mut Option<&'static str>,
}

impl StateMut<'_> {
    #[inline]
    pub fn get(&self, var: Var) -> usize {
        var.read(self.row)
    }

    /// Write a variable. A value that does not fit the declared width is a
    /// modelling error; the store is not undone.
    #[inline]
    pub fn set(&mut self, var: Var, val: usize) {
        let in_range = var.write(self.row, val);
        if self.sanity && !in_range {
            self.fail("Assigned an out of range value to a variable");
        }
    }

    /// Raise a modelling error. The first message wins.
    pub fn fail(&mut self, msg: &'static str) {
        if self.fault.is_none() {
            *self.fault = Some(msg);
        }
    }

    #[inline]
    pub fn is_initial(&self) -> bool {
        self.row_index == 1
    }

    #[inline]
    pub fn is_zero(&self) -> bool {
        self.row.iter().all(|&w| w == 0)
    }
}

/// A finite-state model. Transitions are numbered `0..T`; giving "unusual"
/// events (timeouts, message loss) the larger numbers makes counterexamples
/// surface them earlier under the default descending trial order.
pub trait Model {
    /// Declare every state variable and return the number of structural
    /// transitions `T`. Returning `u32::MAX` is a modelling error.
    fn declare(&mut self, b: &mut LayoutBuilder) -> u32;

    /// Write non-zero initial variable values. The default initial state is
    /// all zeros.
    fn init(&self, _s: &mut StateMut<'_>) {}

    /// Fire transition `tr` against the current row. Returns false and
    /// leaves the row unchanged when `tr` is disabled; otherwise mutates the
    /// row to the successor state and returns true.
    fn fire(&self, tr: u32, s: &mut StateMut<'_>) -> bool;

    /// Render the current row on one line for counterexamples.
    fn format_state(&self, s: &StateRef<'_>) -> String;

    /// Safety predicate: `None` when the current row is good, else an error
    /// message.
    fn check_state(&self, _s: &StateRef<'_>) -> Option<&'static str> {
        None
    }

    /// Deadlock predicate: `None` when terminating in the current row is
    /// acceptable, else an error message.
    fn check_deadlock(&self, _s: &StateRef<'_>) -> Option<&'static str> {
        None
    }

    /// True iff the current row is a user-designated may-progress state.
    fn is_may_progress(&self, _s: &StateRef<'_>) -> bool {
        false
    }

    /// True iff the current row is a user-designated must-progress state.
    fn is_must_progress(&self, _s: &StateRef<'_>) -> bool {
        false
    }

    /// Map the current row to the canonical member of its symmetry class,
    /// in place.
    fn symmetry_representative(&self, _s: &mut StateMut<'_>) {}

    /// Stubborn-set obligation of `tr` in the current state.
    fn obligations(&self, _tr: u32, _s: &StateRef<'_>) -> Obligation {
        Obligation::None
    }

    /// Which optional callbacks and reductions this model supports.
    fn features(&self) -> Features {
        Features::default()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_out_of_range_write_latches_fault() {
        let mut b = LayoutBuilder::new();
        let v = b.var(1);
        let mut row = vec![0usize; 1];
        let mut fault = None;
        let mut s = StateMut {
            row: &mut row,
            row_index: 1,
            sanity: true,
            fault: &mut fault,
        };
        s.set(v, 2);
        s.fail("later message");
        assert_eq!(fault, Some("Assigned an out of range value to a variable"));
    }

    #[test]
    fn test_sanity_off_skips_range_check() {
        let mut b = LayoutBuilder::new();
        let v = b.var(1);
        let mut row = vec![0usize; 1];
        let mut fault = None;
        let mut s = StateMut {
            row: &mut row,
            row_index: 1,
            sanity: false,
            fault: &mut fault,
        };
        s.set(v, 2);
        assert!(fault.is_none());
    }

    #[test]
    fn test_view_helpers() {
        let mut b = LayoutBuilder::new();
        let v = b.var(4);
        let mut row = vec![0usize; 1];
        let mut fault = None;
        let mut s = StateMut {
            row: &mut row,
            row_index: 1,
            sanity: true,
            fault: &mut fault,
        };
        assert!(s.is_initial());
        assert!(s.is_zero());
        s.set(v, 9);
        assert!(!s.is_zero());
        assert_eq!(s.get(v), 9);
    }

    #[test]
    fn test_obligation_one_of() {
        assert_eq!(
            Obligation::one_of(&[3, 1]),
            Obligation::OneOf(SmallVec::from_slice(&[3, 1]))
        );
    }
}
