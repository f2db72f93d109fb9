//! Wager construction: the Crossing combination generator and the
//! wager draft that collects legs before submission.

pub mod crossing;
pub mod draft;

pub use crossing::{generate, Combination, CombinationClass, CombinationSet};
pub use draft::{WagerDraft, WagerLeg};
