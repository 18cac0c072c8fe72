//! HTTP surface of the issue tracker: routes, configuration and the
//! screenshot host client. Storage and consistency rules live in
//! `issue-tracker-core`.

pub mod api;
pub mod config;
pub mod upload;
