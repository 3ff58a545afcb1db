//! Navigation helpers for the `extent-list` crate.
//!
//! `extent-list` is UI-agnostic and focuses on extent bookkeeping. This crate provides the
//! framework-neutral pieces list adapters need on top of it:
//!
//! - [`ListController`]: queries, mutations, `jump_to_item` and `animate_to_item`
//! - [`ScrollPosition`]: the seam to the adapter's scroll container
//! - [`Curve`]: easing for tick-driven animations
//!
//! Animations are cooperative: the adapter calls [`ListController::tick`] once per frame.
#![cfg_attr(not(feature = "std"), no_std)]
#![forbid(unsafe_code)]

extern crate alloc;

#[cfg(test)]
extern crate std;

#[macro_use]
mod macros;

mod controller;
mod curve;
mod position;
mod task;

#[cfg(test)]
mod tests;

pub use controller::{ListController, PositionId};
pub use curve::Curve;
pub use position::{BasicScrollPosition, ScrollPosition};
pub use task::{AnimationCompletion, AnimationOutcome, AnimationState, AnimationTask, IndexGetter};
