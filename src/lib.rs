//! Upcoming-events listing backed by a hosted content store.
//!
//! Queries are described by a [`query::QueryDescriptor`], fetched through a
//! [`content::ContentSource`], and cached per [`query::QueryKey`] by
//! [`cache::QueryCache`]. [`view::UpcomingEvents`] projects the cached state
//! into what a consumer displays.

pub mod assets;
pub mod cache;
pub mod config;
pub mod content;
pub mod error;
pub mod infra;
pub mod query;
pub mod view;
