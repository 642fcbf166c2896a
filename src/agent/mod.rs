//! The two model-backed stages of a request.
//!
//! The [`Searcher`] gathers vocabulary for a topic from the vocabulary store,
//! falling back to web results compiled by the model. The [`Writer`] turns
//! that vocabulary into five Dutch sentences with English translations.

mod llm;
mod searcher;
mod writer;

pub use llm::{ChatModel, ChatTurn, OpenAIChat, Role};
pub use searcher::{Searcher, SearcherOutput};
pub use writer::{parse_draft, Draft, Writer};

#[cfg(test)]
pub(crate) use llm::test_support;
