pub mod schema;
pub mod validation;

pub use schema::{CompletionSchema, SchemaDocs, SchemaHandle};
pub use validation::{contract_issues, inject_schema_instructions};
