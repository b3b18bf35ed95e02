use schemars::gen::SchemaGenerator;
use schemars::JsonSchema;
use serde::de::DeserializeOwned;

/// Types a language model is asked to produce as a JSON object
pub trait LlmResponse: DeserializeOwned + JsonSchema {
    /// JSON schema embedded in prompts so the model knows the expected shape
    fn json_schema_string() -> String {
        let mut gen = SchemaGenerator::default();
        let schema = gen.root_schema_for::<Self>();
        serde_json::to_string_pretty(&schema).unwrap_or_else(|_| "{}".to_string())
    }
}
