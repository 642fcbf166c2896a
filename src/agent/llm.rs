//! Chat model abstraction shared by the searcher and writer stages.

use crate::config::ModelSettings;
use crate::error::{Result, VerhaalError};
use crate::openai::create_client_with_timeout;
use async_openai::types::{
    ChatCompletionRequestAssistantMessageArgs, ChatCompletionRequestMessage,
    ChatCompletionRequestSystemMessageArgs, ChatCompletionRequestUserMessageArgs,
    CreateChatCompletionRequestArgs, ResponseFormat,
};
use async_trait::async_trait;
use std::time::Duration;
use tracing::{debug, instrument};

/// Who authored a turn in a conversation.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Role {
    System,
    User,
    Assistant,
}

/// One message sent to the model.
#[derive(Debug, Clone, PartialEq)]
pub struct ChatTurn {
    pub role: Role,
    pub content: String,
}

impl ChatTurn {
    pub fn system(content: impl Into<String>) -> Self {
        Self { role: Role::System, content: content.into() }
    }

    pub fn user(content: impl Into<String>) -> Self {
        Self { role: Role::User, content: content.into() }
    }

    pub fn assistant(content: impl Into<String>) -> Self {
        Self { role: Role::Assistant, content: content.into() }
    }
}

/// A language model that completes a conversation.
#[async_trait]
pub trait ChatModel: Send + Sync {
    /// Return the model's reply. With `json_mode` the model is asked for a JSON object.
    async fn complete(&self, turns: &[ChatTurn], json_mode: bool) -> Result<String>;
}

/// OpenAI chat completions.
pub struct OpenAIChat {
    client: async_openai::Client<async_openai::config::OpenAIConfig>,
    model: String,
    temperature: f32,
}

impl OpenAIChat {
    pub fn new(model: &str) -> Result<Self> {
        Self::from_settings(&ModelSettings {
            chat_model: model.to_string(),
            ..ModelSettings::default()
        })
    }

    pub fn from_settings(settings: &ModelSettings) -> Result<Self> {
        Ok(Self {
            client: create_client_with_timeout(Duration::from_secs(settings.request_timeout_secs))?,
            model: settings.chat_model.clone(),
            temperature: settings.temperature,
        })
    }

    pub fn model(&self) -> &str {
        &self.model
    }

    fn to_message(turn: &ChatTurn) -> Result<ChatCompletionRequestMessage> {
        let message = match turn.role {
            Role::System => ChatCompletionRequestSystemMessageArgs::default()
                .content(turn.content.clone())
                .build()
                .map_err(|e| VerhaalError::Generation(e.to_string()))?
                .into(),
            Role::User => ChatCompletionRequestUserMessageArgs::default()
                .content(turn.content.clone())
                .build()
                .map_err(|e| VerhaalError::Generation(e.to_string()))?
                .into(),
            Role::Assistant => ChatCompletionRequestAssistantMessageArgs::default()
                .content(turn.content.clone())
                .build()
                .map_err(|e| VerhaalError::Generation(e.to_string()))?
                .into(),
        };
        Ok(message)
    }
}

#[async_trait]
impl ChatModel for OpenAIChat {
    #[instrument(skip(self, turns), fields(model = %self.model, turns = turns.len()))]
    async fn complete(&self, turns: &[ChatTurn], json_mode: bool) -> Result<String> {
        let messages = turns
            .iter()
            .map(Self::to_message)
            .collect::<Result<Vec<_>>>()?;

        let mut args = CreateChatCompletionRequestArgs::default();
        args.model(&self.model)
            .messages(messages)
            .temperature(self.temperature);
        if json_mode {
            args.response_format(ResponseFormat::JsonObject);
        }
        let request = args
            .build()
            .map_err(|e| VerhaalError::Generation(e.to_string()))?;

        let response = self.client.chat().create(request).await.map_err(|e| {
            VerhaalError::OpenAI(format!("Failed to generate response: {}", e))
        })?;

        let content = response
            .choices
            .first()
            .and_then(|c| c.message.content.as_ref())
            .ok_or_else(|| VerhaalError::Generation("Empty response from LLM".to_string()))?
            .clone();

        debug!("Model response: {}", truncate(&content, 500));
        Ok(content)
    }
}

/// Cut a string to at most `max` bytes on a char boundary, for logging.
pub(crate) fn truncate(s: &str, max: usize) -> &str {
    if s.len() <= max {
        return s;
    }
    let mut end = max;
    while !s.is_char_boundary(end) {
        end -= 1;
    }
    &s[..end]
}

#[cfg(test)]
pub(crate) mod test_support {
    use super::*;
    use std::collections::VecDeque;
    use std::sync::Mutex;

    /// Replays canned replies in order and records every conversation it saw.
    pub struct ScriptedModel {
        replies: Mutex<VecDeque<Result<String>>>,
        pub seen: Mutex<Vec<Vec<ChatTurn>>>,
    }

    impl ScriptedModel {
        pub fn new(replies: Vec<Result<String>>) -> Self {
            Self {
                replies: Mutex::new(replies.into_iter().collect()),
                seen: Mutex::new(Vec::new()),
            }
        }

        pub fn replying(replies: &[&str]) -> Self {
            Self::new(replies.iter().map(|r| Ok(r.to_string())).collect())
        }

        pub fn calls(&self) -> usize {
            self.seen.lock().unwrap().len()
        }
    }

    #[async_trait]
    impl ChatModel for ScriptedModel {
        async fn complete(&self, turns: &[ChatTurn], _json_mode: bool) -> Result<String> {
            self.seen.lock().unwrap().push(turns.to_vec());
            self.replies
                .lock()
                .unwrap()
                .pop_front()
                .unwrap_or_else(|| Err(VerhaalError::OpenAI("no scripted reply left".to_string())))
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_turn_constructors() {
        assert_eq!(ChatTurn::system("a").role, Role::System);
        assert_eq!(ChatTurn::user("b").role, Role::User);
        assert_eq!(ChatTurn::assistant("c").content, "c");
    }

    #[test]
    fn test_message_conversion() {
        let message = OpenAIChat::to_message(&ChatTurn::user("Hallo")).unwrap();
        assert!(matches!(message, ChatCompletionRequestMessage::User(_)));
    }

    #[test]
    fn test_truncate_respects_char_boundary() {
        assert_eq!(truncate("hallo", 10), "hallo");
        assert_eq!(truncate("één", 1), "");
        assert_eq!(truncate("abcdef", 3), "abc");
    }

    #[test]
    fn test_openai_chat_model_name() {
        let chat = OpenAIChat::new("gpt-4o-mini").unwrap();
        assert_eq!(chat.model(), "gpt-4o-mini");
    }
}
