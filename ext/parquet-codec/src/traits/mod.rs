//! Read-only views over library types.

mod schema;

pub use schema::SchemaInspector;
