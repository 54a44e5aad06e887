//! Example models for the modex checker.
//!
//! Three classics: the wolf/sheep/cabbage river crossing (safety predicate
//! as a goal finder), a banking system over lossy channels (safety and
//! may-progress), and the alternating-bit protocol with failure and
//! recovery (full feature set including stubborn-set obligations).

pub mod abp;
pub mod bank;
pub mod wgc;

pub use abp::AlternatingBit;
pub use bank::Banking;
pub use wgc::RiverCrossing;
