//! Integration tests for the SQL tutor.

pub mod client_test;
pub mod pipeline_test;
pub mod postgres_test;
