//! Extent tracking and budgeted layout for virtualized lists.
//!
//! A virtualized list only measures the items near its viewport. Everything else is placed
//! using estimated extents (sizes along the scroll axis). This crate keeps track of which
//! extents are estimates and which are measured, bounds how much measuring a single layout
//! pass may do, and turns "reveal item `i`" requests into scroll offsets.
//!
//! It is UI-agnostic. A layout driver (the widget/render integration) is expected to:
//! - report viewport geometry through [`LayoutFrame`] at the start of each pass
//! - write measured extents through the [`LayoutPass`] it holds
//! - optionally provide a synchronous [`MeasureItem`] hook and a precalculation policy
//!
//! For jump/animate navigation over scroll positions, see the `extent-list-adapter` crate.
#![cfg_attr(not(feature = "std"), no_std)]
#![forbid(unsafe_code)]

extern crate alloc;

#[cfg(test)]
extern crate std;

#[macro_use]
mod macros;

mod budget;
mod error;
mod estimate;
mod fenwick;
mod manager;
mod options;
mod policy;
mod table;
mod types;


#[cfg(feature = "std")]
pub use budget::StdClock;
pub use budget::{
    BudgetPhase, Clock, DEFAULT_LAYOUT_BUDGET, ItemCountLayoutBudget, LayoutBudget,
    TimeLayoutBudget,
};
pub use error::ExtentError;
pub use estimate::{AspectRatioExtent, ExtentEstimator, FixedExtent};
pub use manager::{Changes, ExtentManager, LayoutPass, ListenerId};
pub use options::{ExtentListOptions, ListenerCallback, MeasureItem, RequestLayout};
pub use policy::{
    AlwaysPrecalculate, ExtentPrecalculationPolicy, NeverPrecalculate, PrecalculateBelow,
    PrecalculationContext, PrecalculationHandle,
};
pub use table::ExtentTable;
pub use types::{Axis, ExtentEntry, LayoutFrame, Rect, VirtualRange};
