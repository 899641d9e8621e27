//! Query parameters and response bodies of the JSON API.

pub mod contacts;
pub mod deals;
pub mod tasks;
