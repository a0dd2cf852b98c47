mod completion_schema;
mod schema_extraction;

use proc_macro::TokenStream;

/// Registers a struct as the structured completion format the model is asked to produce.
///
/// Generates a `CompletionSchema` impl whose JSON schema is built once with
/// `schemars` and decorated with the struct and field doc comments.
///
/// ```ignore
/// #[completion_schema(name = "TripPlan")]
/// pub struct TripPlan { /* ... */ }
/// ```
#[proc_macro_attribute]
pub fn completion_schema(attr: TokenStream, item: TokenStream) -> TokenStream {
    completion_schema::completion_schema(attr, item)
}
