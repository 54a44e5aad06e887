//! Explicit-state model checker for finite-state concurrent systems.
//!
//! A model is a Rust value implementing [`Model`]: it declares bit-packed
//! state variables, fires numbered transitions, and supplies property
//! predicates. The engine enumerates the reachable state space in
//! breadth-first order and decides safety, deadlock, and may/must-progress
//! properties, producing minimal-length counterexamples on violation.
//! Symmetry and stubborn-set reduction are available when the model provides
//! the corresponding hooks.
//!
//! ```no_run
//! use modex_engine::{CheckConfig, Explorer, LayoutBuilder, Model, StateMut, StateRef, Var};
//!
//! struct Counter {
//!     count: Option<Var>,
//! }
//!
//! impl Model for Counter {
//!     fn declare(&mut self, b: &mut LayoutBuilder) -> u32 {
//!         self.count = Some(b.var(3));
//!         1
//!     }
//!     fn fire(&self, _tr: u32, s: &mut StateMut<'_>) -> bool {
//!         let count = self.count.unwrap();
//!         if s.get(count) < 5 {
//!             s.set(count, s.get(count) + 1);
//!             true
//!         } else {
//!             false
//!         }
//!     }
//!     fn format_state(&self, s: &StateRef<'_>) -> String {
//!         format!("count = {}", s.get(self.count.unwrap()))
//!     }
//!     fn check_state(&self, s: &StateRef<'_>) -> Option<&'static str> {
//!         (s.get(self.count.unwrap()) > 5).then_some("count ran away")
//!     }
//! }
//!
//! let config = CheckConfig {
//!     check_state: true,
//!     check_deadlock: true,
//!     ..CheckConfig::default()
//! };
//! let mut explorer = Explorer::new(Counter { count: None }, config);
//! let report = explorer.run();
//! println!("{}", report.render());
//! ```

pub mod config;
pub mod explorer;
pub mod layout;
pub mod model;
pub mod report;

mod index;
mod node;
mod pool;
mod progress;
mod stubborn;
mod trace;

pub use config::CheckConfig;
pub use explorer::Explorer;
pub use layout::{Layout, LayoutBuilder, Var, WORD_BITS};
pub use model::{Features, Model, Obligation, StateMut, StateRef};
pub use report::{
    CheckFailure, FailureKind, RunReport, Trace, TypicalTail, Verdict,
};
