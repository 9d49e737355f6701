//! Transcript data model.

use serde::{Deserialize, Serialize};

/// One question/answer pair. The answer stays `None` until the responder
/// returns; either side may be absent in files written by older versions.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Message {
    #[serde(default)]
    pub user: Option<String>,
    #[serde(default)]
    pub bot: Option<String>,
}

/// The ordered transcript, persisted as `{"mensagens_chat": [...]}`.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct SessionState {
    #[serde(rename = "mensagens_chat", default)]
    pub messages: Vec<Message>,
}

impl SessionState {
    pub fn new() -> Self {
        Self::default()
    }

    /// Append a question with no answer yet and return its index.
    pub fn push_question(&mut self, question: impl Into<String>) -> usize {
        self.messages.push(Message {
            user: Some(question.into()),
            bot: None,
        });
        self.messages.len() - 1
    }

    /// Fill the answer of the message at `index`. Returns false when the
    /// index is out of range.
    pub fn fill_answer(&mut self, index: usize, answer: impl Into<String>) -> bool {
        match self.messages.get_mut(index) {
            Some(message) => {
                message.bot = Some(answer.into());
                true
            }
            None => false,
        }
    }

    pub fn clear(&mut self) {
        self.messages.clear();
    }

    pub fn is_empty(&self) -> bool {
        self.messages.is_empty()
    }

    pub fn len(&self) -> usize {
        self.messages.len()
    }
}
