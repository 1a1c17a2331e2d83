//! Prebuilt road networks for the in-memory kernel.

pub mod merge;

pub use merge::{merge_kernel, merge_network, spawn_platoon, MergeNetworkParams};
