use std::sync::Arc;

use anyhow::Result;
use tracing::debug;

use crate::llm::{ChatBackend, CompletionRequest, Message};
use crate::prompts;
use crate::state::Sampling;

/// Dialogue history of one research run. Only ever grows.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Conversation(Vec<Message>);

impl Conversation {
    pub fn messages(&self) -> &[Message] {
        &self.0
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    fn push(&mut self, message: Message) {
        self.0.push(message);
    }
}

pub struct Synthesizer {
    llm: Arc<dyn ChatBackend>,
    sampling: Sampling,
}

impl Synthesizer {
    pub fn new(llm: Arc<dyn ChatBackend>, sampling: Sampling) -> Self {
        Self { llm, sampling }
    }

    /// First answer, grounded only in `context`.
    pub async fn answer(&self, question: &str, context: &str) -> Result<(String, Conversation)> {
        let mut conversation = Conversation::default();
        conversation.push(Message::user(prompts::answer_prompt(question, context)));
        debug!(context_len = context.len(), "Requesting answer");
        let answer = self.complete(&conversation).await?;
        Ok((answer, conversation))
    }

    /// Ask the model to pick up where `prior_answer` stopped.
    pub async fn continue_answer(
        &self,
        mut conversation: Conversation,
        prior_answer: &str,
    ) -> Result<(String, Conversation)> {
        conversation.push(Message::assistant(prior_answer));
        conversation.push(Message::user(prompts::CONTINUE_PROMPT));
        debug!(turns = conversation.len(), "Requesting continuation");
        let answer = self.complete(&conversation).await?;
        Ok((answer, conversation))
    }

    async fn complete(&self, conversation: &Conversation) -> Result<String> {
        let request = CompletionRequest {
            max_tokens: self.sampling.max_tokens,
            temperature: self.sampling.temperature,
            messages: conversation.messages().to_vec(),
        };
        self.llm.complete(&request).await
    }
}
