//! Local copy of the remote tracking script, refreshed on a fixed interval.

mod cache;

pub use cache::{ScriptCache, ScriptError};
