//! Transcript rendering for the terminal.

use advisor_session::{Message, SessionState};
use advisor_types::truncate_string;

/// Shown when the transcript is empty.
pub const GREETING: &str =
    "👋 Olá! Envie arquivos e faça sua pergunta para obter insights estratégicos.";

pub const USER_LABEL: &str = "Você:";
pub const BOT_LABEL: &str = "AD&M Consultoria:";

/// Byte cap for one side of a `/history` line.
const PREVIEW_BYTES: usize = 72;

/// Full transcript, or the greeting when there is nothing to show.
pub fn transcript(state: &SessionState) -> String {
    if state.is_empty() {
        return GREETING.to_string();
    }
    state
        .messages
        .iter()
        .map(exchange)
        .collect::<Vec<_>>()
        .join("\n")
}

/// One question/answer pair. Absent sides are skipped.
pub fn exchange(message: &Message) -> String {
    let mut out = String::new();
    if let Some(user) = &message.user {
        out.push_str(&format!("{USER_LABEL} {user}\n"));
    }
    if let Some(bot) = &message.bot {
        out.push_str(&format!("{BOT_LABEL} {bot}\n"));
    }
    out
}

/// Numbered one-line summaries for `/history`.
pub fn history(state: &SessionState) -> Vec<String> {
    state
        .messages
        .iter()
        .enumerate()
        .map(|(i, m)| {
            let user = m.user.as_deref().unwrap_or("");
            let bot = m.bot.as_deref().unwrap_or("(sem resposta)");
            format!(
                "{:>3}. {}  →  {}",
                i + 1,
                truncate_string(user, PREVIEW_BYTES),
                truncate_string(bot, PREVIEW_BYTES)
            )
        })
        .collect()
}
