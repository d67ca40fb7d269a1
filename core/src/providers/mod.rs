pub mod factory;
pub mod ollama;
pub mod openai;
pub mod retry;

pub use factory::create_oracle;
pub use ollama::OllamaOracle;
pub use openai::OpenAIOracle;
pub use retry::RetryPolicy;
