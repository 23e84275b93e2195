//! Tower layers applied to every route.

pub mod cors;
