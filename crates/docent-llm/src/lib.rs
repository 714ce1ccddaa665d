//! Generation backends for the answer pipeline.
//!
//! Currently one backend: any OpenAI-compatible chat completions API
//! (Groq, OpenAI, local inference servers) consumed over SSE.

pub mod openai;

pub use openai::OpenAiCompatibleBackend;
