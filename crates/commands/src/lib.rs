//! Command grammar, allow-list store, and the message dispatcher.

pub mod allowlist;
pub mod dispatch;
pub mod help;
pub mod parse;

pub use {
    allowlist::Allowlist,
    dispatch::{Dispatcher, Outbound},
    parse::Command,
};
