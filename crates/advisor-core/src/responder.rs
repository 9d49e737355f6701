//! Turns a question plus uploaded context into a model answer.

use std::sync::Arc;
use std::time::Duration;

use advisor_docs::{DEFAULT_MAX_CHUNKS, DEFAULT_MAX_WORDS, chunk_words, select_relevant};
use advisor_types::{
    ApiError, ChatCompletionRequest, ChatMessage, Usage, provider::ChatProvider,
};

/// Preamble of every system prompt.
pub const PERSONA: &str = "Você é um chatbot estratégico desenvolvido pela AD&M Consultoria, \
uma empresa especialista em gestão empresarial com foco em operações, finanças, marketing e estratégia. \
Seu papel é oferecer respostas inteligentes e críticas que ajudem o cliente a pensar de forma estratégica, \
tanto para dúvidas básicas quanto para geração de insights valiosos.\n\n";

/// Shown instead of an answer when no file contributed any text.
pub const NO_CONTEXT_WARNING: &str = "⚠️ Nenhum contexto foi carregado.";

/// Knobs for a [`Responder`].
#[derive(Debug, Clone)]
pub struct ResponderSettings {
    pub model: String,
    pub temperature: f32,
    pub max_tokens: u32,
    pub max_chunk_words: usize,
    pub max_selected_chunks: usize,
    /// Pause before each provider call. Zero disables it.
    pub pre_call_delay: Duration,
    /// Replaces [`PERSONA`] when set.
    pub persona: Option<String>,
}

impl Default for ResponderSettings {
    fn default() -> Self {
        Self {
            model: "gpt-4o".into(),
            temperature: 0.7,
            max_tokens: 1000,
            max_chunk_words: DEFAULT_MAX_WORDS,
            max_selected_chunks: DEFAULT_MAX_CHUNKS,
            pre_call_delay: Duration::from_secs(1),
            persona: None,
        }
    }
}

/// Outcome of a successful [`Responder::respond`].
#[derive(Debug, Clone, PartialEq)]
pub enum Reply {
    /// The context was empty; the provider was not called.
    NoContext,
    Answer { text: String, usage: Option<Usage> },
}

impl Reply {
    /// Text to record as the bot's answer.
    pub fn text(&self) -> &str {
        match self {
            Reply::NoContext => NO_CONTEXT_WARNING,
            Reply::Answer { text, .. } => text,
        }
    }
}

/// Conventional answer text for a failed completion.
pub fn present_error(error: &ApiError) -> String {
    format!("Erro ao gerar resposta: {error}")
}

/// Persona followed by one labeled section per selected chunk.
pub fn build_system_prompt(persona: &str, chunks: &[&str]) -> String {
    let mut prompt = String::from(persona);
    for (i, chunk) in chunks.iter().enumerate() {
        prompt.push_str(&format!("--- Part {} of Context ---\n{chunk}\n\n", i + 1));
    }
    prompt
}

/// Builds prompts from selected context and asks the provider for an answer.
pub struct Responder {
    provider: Arc<dyn ChatProvider>,
    settings: ResponderSettings,
}

impl Responder {
    pub fn new(provider: Arc<dyn ChatProvider>, settings: ResponderSettings) -> Self {
        Self { provider, settings }
    }

    pub fn settings(&self) -> &ResponderSettings {
        &self.settings
    }

    /// Build the two-message request for `question` over `context`.
    pub fn build_request(&self, question: &str, context: &str) -> ChatCompletionRequest {
        let chunks = chunk_words(context, self.settings.max_chunk_words);
        let selected = select_relevant(question, &chunks, self.settings.max_selected_chunks);
        tracing::debug!(
            "Selected {} of {} chunks for the prompt",
            selected.len(),
            chunks.len()
        );
        if selected.is_empty() {
            tracing::warn!(
                "No context chunk matched the question; answering from the persona alone"
            );
        }

        let persona = self.settings.persona.as_deref().unwrap_or(PERSONA);
        ChatCompletionRequest {
            model: self.settings.model.clone(),
            messages: vec![
                ChatMessage::system(build_system_prompt(persona, &selected)),
                ChatMessage::user(question),
            ],
            temperature: Some(self.settings.temperature),
            max_tokens: Some(self.settings.max_tokens),
        }
    }

    /// Answer `question` using `context`. An empty context short-circuits to
    /// [`Reply::NoContext`] without touching the provider.
    pub async fn respond(&self, question: &str, context: &str) -> Result<Reply, ApiError> {
        if context.is_empty() {
            return Ok(Reply::NoContext);
        }

        let request = self.build_request(question, context);

        if !self.settings.pre_call_delay.is_zero() {
            tokio::time::sleep(self.settings.pre_call_delay).await;
        }

        tracing::debug!(
            "Requesting completion from {} (model {})",
            self.provider.name(),
            request.model
        );
        let response = self.provider.complete(&request).await?;
        let text = response.first_text()?.to_string();
        Ok(Reply::Answer {
            text,
            usage: response.usage,
        })
    }
}
