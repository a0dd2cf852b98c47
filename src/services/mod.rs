pub mod llm_client;
pub mod planning;

pub use llm_client::{completion_text, ChatCompletionRequest, CompletionBackend, LlmClient};
pub use planning::{build_system_prompt, build_user_prompt, is_transport_request};
