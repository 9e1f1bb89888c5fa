//! Payloads of Delve's JSON-RPC API (version 2).

mod api;
mod requests;
mod responses;

pub use api::*;
pub use requests::*;
pub use responses::*;
