//! Wire and domain types shared by the review client and its front ends.

pub mod domain;
pub mod protocol;
