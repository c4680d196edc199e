pub mod data_core;
pub mod display_tree;
pub mod notify;
pub mod performance;
pub mod reveal;
pub mod search;
pub mod source;
