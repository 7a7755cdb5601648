//! Song recommendation voting backend.
//!
//! Users submit recommendations (a song name and a YouTube link) and vote on
//! them. A downvote that pushes a score below -5 deletes the recommendation.
//! Reads cover the latest entries, the top scorers and a weighted random pick
//! that favours recommendations scoring above 10.

pub mod api;
pub mod config;
pub mod db;
pub mod error;
pub mod middleware;
pub mod models;
pub mod services;
