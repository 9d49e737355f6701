//! One question/answer turn against the uploaded files.

use advisor_docs::{Extractor, UploadedFile};
use advisor_session::SessionState;
use advisor_types::{ApiError, ExtractError};

use crate::responder::{Reply, Responder, present_error};

/// Result of a completed turn. The answer text is already recorded in the
/// session state at `index`.
#[derive(Debug)]
pub struct TurnOutcome {
    pub index: usize,
    pub reply: Result<Reply, ApiError>,
}

impl TurnOutcome {
    pub fn is_error(&self) -> bool {
        self.reply.is_err()
    }
}

/// Build the context from `files`, record `question`, and fill in the answer.
///
/// Extraction errors abort before `state` is touched. Provider failures do
/// not: the answer becomes the presented error string. Persisting `state` is
/// left to the caller.
pub async fn run_turn(
    state: &mut SessionState,
    extractor: &Extractor,
    responder: &Responder,
    files: &[UploadedFile],
    question: &str,
) -> Result<TurnOutcome, ExtractError> {
    let context = extractor.build_context(files).await?;
    tracing::debug!(
        "Built {} bytes of context from {} files",
        context.len(),
        files.len()
    );

    let index = state.push_question(question);
    let reply = responder.respond(question, &context).await;
    let answer = match &reply {
        Ok(reply) => reply.text().to_string(),
        Err(e) => {
            tracing::warn!("Completion failed ({:?}): {e}", e.kind());
            present_error(e)
        }
    };
    state.fill_answer(index, answer);

    Ok(TurnOutcome { index, reply })
}
