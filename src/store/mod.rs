//! View state kept for one session
//!
//! Plain reducers over action enums. Nothing here talks to the backend and
//! nothing is reconciled with it; the last write wins.

mod item_store;
mod project_store;

pub use item_store::*;
pub use project_store::*;

/// The view state of one session
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ViewState {
    pub projects: ProjectStore,
    pub items: ItemStore,
}

impl ViewState {
    pub fn new() -> Self {
        Self::default()
    }
}
