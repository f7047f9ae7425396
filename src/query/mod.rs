//! Structured queries against the content store and the cache keys derived
//! from them.

mod descriptor;
mod keys;

pub use descriptor::{
    EVENT_TYPE, Filter, FilterValue, NOW_PARAM, ProjectedField, Projection, QueryDescriptor,
    SortDirection, SortOrder, UPCOMING_EVENTS_LIMIT, Window,
};
pub use keys::QueryKey;
