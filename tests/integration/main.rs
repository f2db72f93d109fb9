//! Integration test target.

mod mock_api;
mod submission_flow;
