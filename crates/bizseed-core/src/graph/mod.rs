//! # Dependency Graph
//!
//! Foreign keys of a domain form a directed graph (child → parent). The
//! orderer in `topo` walks it to find a generation order in which every
//! parent table is populated before any table that references it.

pub mod dag;
pub mod topo;
pub mod visualize;

pub use topo::order;
