//! yieldcast: crop yield prediction client.
//!
//! Collects agronomic parameters, submits them to a remote prediction
//! service, and shapes the returned estimate into chart-ready series.
//!
//! - [`schema`]: the form fields, defaults and choice sets
//! - [`session`]: the submission state machine and its event loop
//! - [`client`]: the HTTP prediction client and failure taxonomy
//! - [`derive`]: pure derivation of trend and balance series
//! - [`config`]: layered TOML and environment configuration
//! - [`diagnostics`]: JSONL journal of completed cycles

pub mod client;
pub mod config;
pub mod derive;
pub mod diagnostics;
pub mod schema;
pub mod session;
