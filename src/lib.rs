//! sql-tutor - a browser-based SQL tutor.
//!
//! Lessons and tutorials are served over a JSON API; learner SQL is graded
//! by the answer evaluator or run in the try-it sandbox, and results are
//! rendered as tables on the client side.

pub mod app;
pub mod client;
pub mod config;
pub mod content;
pub mod db;
pub mod error;
pub mod logging;
pub mod policy;
pub mod query;
pub mod render;
pub mod server;
