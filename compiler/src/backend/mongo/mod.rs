//! MongoDB filter documents
//!
//! Fragments are filter documents (`serde_json::Value`) in MongoDB's query
//! language; the builder assembles them into `find` options.

mod builder;
mod processor;

pub use builder::MongoQuery;
pub use processor::MongoProcessor;
