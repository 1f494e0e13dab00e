pub mod cypher_refs;
pub mod errors;
pub mod graph_schema;
pub mod schema_discovery;
pub mod schema_validator;

pub use errors::GraphCatalogError;
pub use graph_schema::{GraphSchema, SchemaPattern};
pub use schema_discovery::discover_schema;
pub use schema_validator::{SchemaCatalog, SchemaValidation, SchemaValidator};
