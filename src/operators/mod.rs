//! The standard operator catalogue.
//!
//! Reusable [`Mapper`](crate::Mapper), [`Reducer`](crate::Reducer) and
//! [`Joiner`](crate::Joiner) implementations, organized by contract:
//!
//! - [`mappers`] -- per-row transforms: filtering, projection, splitting,
//!   text normalization, arithmetic, date handling, geometry.
//! - [`reducers`] -- per-group aggregates: first, count, sum, mean, top-N,
//!   term frequency.
//! - [`joiners`] -- the four join strategies (inner, outer, left, right)
//!   sharing the pairwise combination rule.
//!
//! Everything here is built purely on the public operator contracts; user
//! code can mix these with its own implementations freely.

pub mod joiners;
pub mod mappers;
pub mod reducers;

pub use joiners::{InnerJoiner, LeftJoiner, OuterJoiner, RightJoiner};
pub use mappers::*;
pub use reducers::*;
