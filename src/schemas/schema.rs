use schemars::{
    schema::{RootSchema, Schema},
    JsonSchema,
};
use serde::de::DeserializeOwned;
use serde_json::Value;
use std::{any::TypeId, sync::Arc};

/// Doc comments lifted off a struct by `#[completion_schema]`.
#[derive(Debug, Clone, Copy)]
pub struct SchemaDocs {
    /// Name the model is told to conform to
    pub name: &'static str,
    pub description: Option<&'static str>,
    /// `(json property, doc)` pairs
    pub fields: &'static [(&'static str, &'static str)],
}

impl SchemaDocs {
    /// Fill in titles and descriptions schemars left empty.
    fn decorate(&self, root: &mut RootSchema) {
        let metadata = root.schema.metadata();
        metadata.title.get_or_insert_with(|| self.name.to_string());
        if let Some(description) = self.description {
            metadata
                .description
                .get_or_insert_with(|| description.to_string());
        }

        let Some(object) = root.schema.object.as_mut() else {
            return;
        };
        for (property, doc) in self.fields {
            if let Some(Schema::Object(field)) = object.properties.get_mut(*property) {
                field
                    .metadata()
                    .description
                    .get_or_insert_with(|| (*doc).to_string());
            }
        }
    }
}

/// JSON schema of a response type, generated once and shared.
#[derive(Clone, Debug)]
pub struct SchemaHandle {
    schema_name: &'static str,
    type_name: &'static str,
    type_id: TypeId,
    schema_json: Arc<Value>,
}

impl SchemaHandle {
    /// Generate the schema for `T` and decorate it with `docs`.
    pub fn for_type<T: JsonSchema + 'static>(docs: SchemaDocs) -> Self {
        let mut root = schemars::schema_for!(T);
        docs.decorate(&mut root);

        let full_name = std::any::type_name::<T>();
        let type_name = full_name.rsplit("::").next().unwrap_or(full_name);
        let schema_json = serde_json::to_value(&root)
            .unwrap_or_else(|err| panic!("schema for {type_name} is not serializable: {err}"));

        Self {
            schema_name: docs.name,
            type_name,
            type_id: TypeId::of::<T>(),
            schema_json: Arc::new(schema_json),
        }
    }

    pub fn schema_name(&self) -> &'static str {
        self.schema_name
    }

    /// Rust type name without its module path.
    pub fn type_name(&self) -> &'static str {
        self.type_name
    }

    pub fn type_id(&self) -> TypeId {
        self.type_id
    }

    pub fn schema_json(&self) -> &Value {
        &self.schema_json
    }

    /// Prompt text asking the model for exactly one object of this schema.
    pub fn instructions(&self) -> String {
        let schema = serde_json::to_string_pretty(self.schema_json())
            .unwrap_or_else(|_| self.schema_json().to_string());
        format!(
            "{REQUIREMENT_MARKER} reply with exactly one JSON object that conforms to the `{}` schema below. \
             Do not wrap it in markdown fences and do not add any text before or after it.\n{schema}",
            self.schema_name
        )
    }
}

/// Leading words of [`SchemaHandle::instructions`]; used to avoid injecting twice.
pub(crate) const REQUIREMENT_MARKER: &str = "Structured response requirement:";

/// Implemented by `#[completion_schema]` for response types such as `TripPlan`.
pub trait CompletionSchema: DeserializeOwned + Send + Sync + 'static {
    fn schema() -> &'static SchemaHandle;
}
