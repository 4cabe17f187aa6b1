//! Client for the Synapse registration-token admin API.
//!
//! Wraps the five token operations (list, create, get, delete,
//! delete-all) behind the [`TokenService`] trait and provides the pure
//! markdown renderers used for chat replies.

pub mod client;
pub mod error;
pub mod render;
pub mod types;

pub use {
    client::{RegistrationClient, TokenService},
    error::RegistrationError,
    types::Token,
};
