//! Advisor CLI: strategic answers grounded in your documents.

mod render;

use advisor_api::{OpenAiProvider, RetryConfig};
use advisor_config::{AdvisorConfig, CliOverrides};
use advisor_core::{Reply, Responder, ResponderSettings, TurnOutcome, run_turn};
use advisor_docs::{Extractor, OcrEngine, TesseractOcr, UploadedFile};
use advisor_session::{SessionState, SessionStore};
use advisor_types::{AdvisorError, Usage};
use anyhow::{Context, Result};
use clap::Parser;
use std::io::{self, BufRead, Write};
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::Duration;

#[derive(Parser)]
#[command(
    name = "advisor",
    version,
    about = "Ask strategic questions about your documents"
)]
struct Cli {
    /// Attach a file (PDF, DOCX, TXT, PNG, JPG). Repeatable.
    #[arg(short, long = "file", value_name = "FILE")]
    files: Vec<PathBuf>,

    /// Ask a single question and print the answer (non-interactive)
    #[arg(short, long)]
    print: Option<String>,

    /// Model to use
    #[arg(long)]
    model: Option<String>,

    /// Maximum tokens in the response
    #[arg(long)]
    max_tokens: Option<u32>,

    /// Sampling temperature
    #[arg(long)]
    temperature: Option<f32>,

    /// API key (overrides OPENAI_API_KEY)
    #[arg(long)]
    api_key: Option<String>,

    /// Transcript file (default: estado_bot.json)
    #[arg(long)]
    session_file: Option<PathBuf>,

    /// Enable verbose/debug logging
    #[arg(long)]
    verbose: bool,
}

/// Everything a turn needs, built once from the resolved config.
struct App {
    extractor: Extractor,
    responder: Responder,
    store: SessionStore,
    model: String,
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    // Set up logging
    let log_level = if cli.verbose { "debug" } else { "warn" };
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new(log_level)),
        )
        .with_writer(io::stderr)
        .init();

    let app = build_app(CliOverrides {
        api_key: cli.api_key,
        model: cli.model,
        max_tokens: cli.max_tokens,
        temperature: cli.temperature,
        session_path: cli.session_file,
    })?;
    let mut state = app
        .store
        .load()
        .await
        .with_context(|| format!("Failed to load {}", app.store.path().display()))?;

    if let Some(raw) = cli.print {
        // Print mode: one turn, answer on stdout
        let Some(question) = nonblank_question(&raw) else {
            eprintln!("Empty question; nothing to ask.");
            return Ok(());
        };
        let outcome = ask(&app, &mut state, &cli.files, question).await?;
        println!("{}", state.messages[outcome.index].bot.as_deref().unwrap_or(""));
        if let Ok(Reply::Answer {
            usage: Some(usage), ..
        }) = &outcome.reply
        {
            print_usage(usage);
        }
        return Ok(());
    }

    repl(&app, &mut state, cli.files).await
}

fn build_app(overrides: CliOverrides) -> Result<App, AdvisorError> {
    let config = AdvisorConfig::load(overrides)?;
    let provider = OpenAiProvider::new(&config.api_key, &config.api_base_url)?
        .with_retry_config(RetryConfig::with_max_retries(config.max_retries));

    let responder = Responder::new(
        Arc::new(provider),
        ResponderSettings {
            model: config.model.clone(),
            temperature: config.temperature,
            max_tokens: config.max_tokens,
            max_chunk_words: config.max_chunk_words,
            max_selected_chunks: config.max_selected_chunks,
            pre_call_delay: Duration::from_millis(config.pre_call_delay_ms),
            persona: config.persona.clone(),
        },
    );

    let ocr: Arc<dyn OcrEngine> = Arc::new(TesseractOcr::new(
        &config.tesseract_path,
        config.ocr_languages.clone(),
    ));

    tracing::debug!(
        "Using model {} at {}, session file {}",
        config.model,
        config.api_base_url,
        config.session_path.display()
    );

    Ok(App {
        extractor: Extractor::new(ocr),
        responder,
        store: SessionStore::new(&config.session_path),
        model: config.model.clone(),
    })
}

/// Read the attachments fresh, run one turn, and persist the transcript.
async fn ask(
    app: &App,
    state: &mut SessionState,
    paths: &[PathBuf],
    question: &str,
) -> Result<TurnOutcome> {
    let files = read_files(paths).await?;
    let outcome = run_turn(state, &app.extractor, &app.responder, &files, question).await?;
    app.store
        .save(state)
        .await
        .with_context(|| format!("Failed to save {}", app.store.path().display()))?;
    Ok(outcome)
}

async fn read_files(paths: &[PathBuf]) -> Result<Vec<UploadedFile>> {
    let mut files = Vec::with_capacity(paths.len());
    for path in paths {
        let file = UploadedFile::read(path)
            .await
            .with_context(|| format!("Failed to read {}", path.display()))?;
        files.push(file);
    }
    Ok(files)
}

async fn repl(app: &App, state: &mut SessionState, mut attached: Vec<PathBuf>) -> Result<()> {
    let stdin = io::stdin();
    let mut total_usage = Usage::default();

    eprintln!(
        "advisor v{} (model: {}, session: {})",
        env!("CARGO_PKG_VERSION"),
        app.model,
        app.store.path().display()
    );
    eprintln!("Type your question. /help for commands, Ctrl+D to exit.\n");
    println!("{}", render::transcript(state));
    if !attached.is_empty() {
        print_files(&attached);
    }

    loop {
        eprint!("> ");
        io::stderr().flush()?;

        let mut input = String::new();
        let bytes_read = stdin.lock().read_line(&mut input)?;
        if bytes_read == 0 {
            eprintln!();
            break;
        }

        let input = input.trim();
        if input.is_empty() {
            continue;
        }

        // Handle slash commands
        if let Some(handled) = handle_slash_command(input, app, state, &mut attached).await {
            match handled {
                SlashResult::Continue => continue,
                SlashResult::Break => break,
                SlashResult::Unknown => {
                    eprintln!("Unknown command: {input}. Type /help for available commands.");
                    continue;
                }
            }
        }

        match ask(app, state, &attached, input).await {
            Ok(outcome) => {
                println!();
                print!("{}", render::exchange(&state.messages[outcome.index]));
                if let Ok(Reply::Answer {
                    usage: Some(usage), ..
                }) = &outcome.reply
                {
                    total_usage.add(usage);
                }
            }
            Err(e) => {
                eprintln!("\nError: {e:#}");
            }
        }

        println!();
    }

    print_usage(&total_usage);
    Ok(())
}

enum SlashResult {
    Continue,
    Break,
    Unknown,
}

async fn handle_slash_command(
    input: &str,
    app: &App,
    state: &mut SessionState,
    attached: &mut Vec<PathBuf>,
) -> Option<SlashResult> {
    if !input.starts_with('/') {
        return None;
    }

    let (cmd, args) = match input.split_once(' ') {
        Some((c, a)) => (c, Some(a.trim()).filter(|a| !a.is_empty())),
        None => (input, None),
    };

    match cmd {
        "/quit" | "/exit" => Some(SlashResult::Break),
        "/attach" => {
            match args {
                Some(path) => attach(attached, Path::new(path)),
                None => eprintln!("Usage: /attach <path>"),
            }
            Some(SlashResult::Continue)
        }
        "/detach" => {
            match args {
                Some(name) => detach(attached, name),
                None => eprintln!("Usage: /detach <file name>"),
            }
            Some(SlashResult::Continue)
        }
        "/files" => {
            print_files(attached);
            Some(SlashResult::Continue)
        }
        "/history" => {
            if state.is_empty() {
                eprintln!("No messages yet.");
            }
            for line in render::history(state) {
                eprintln!("{line}");
            }
            Some(SlashResult::Continue)
        }
        "/clear" => {
            match app.store.clear(state).await {
                Ok(()) => eprintln!("Conversation cleared."),
                Err(e) => eprintln!("Failed to clear session: {e}"),
            }
            Some(SlashResult::Continue)
        }
        "/help" => {
            print_help();
            Some(SlashResult::Continue)
        }
        _ => Some(SlashResult::Unknown),
    }
}

fn attach(attached: &mut Vec<PathBuf>, path: &Path) {
    if !path.is_file() {
        eprintln!("Not a file: {}", path.display());
        return;
    }
    if attached.iter().any(|p| p == path) {
        eprintln!("Already attached: {}", path.display());
        return;
    }
    if !has_known_extension(path) {
        eprintln!(
            "Warning: {} has an unsupported extension and will contribute no text",
            path.display()
        );
    }
    attached.push(path.to_path_buf());
    eprintln!("Attached {} ({} files)", path.display(), attached.len());
}

/// Same test the extractor applies: the extension of the file name only.
fn has_known_extension(path: &Path) -> bool {
    path.file_name()
        .is_some_and(|name| advisor_docs::FileKind::from_name(&name.to_string_lossy()).is_some())
}

fn nonblank_question(raw: &str) -> Option<&str> {
    Some(raw.trim()).filter(|q| !q.is_empty())
}

fn detach(attached: &mut Vec<PathBuf>, name: &str) {
    let before = attached.len();
    attached.retain(|p| {
        p.as_os_str() != name && p.file_name().is_none_or(|f| f != name)
    });
    if attached.len() == before {
        eprintln!("No attached file named {name}");
    } else {
        eprintln!("Detached {name}");
    }
}

fn print_files(attached: &[PathBuf]) {
    if attached.is_empty() {
        eprintln!("No files attached.");
        return;
    }
    eprintln!("Attached files:");
    for path in attached {
        eprintln!("  {}", path.display());
    }
}

fn print_usage(usage: &Usage) {
    eprintln!(
        "Tokens: prompt {}, completion {}, total {}",
        usage.prompt_tokens, usage.completion_tokens, usage.total_tokens
    );
}

fn print_help() {
    eprintln!("Available commands:");
    eprintln!("  /attach <path>  Attach a file to every following question");
    eprintln!("  /detach <name>  Remove an attached file");
    eprintln!("  /files          List attached files");
    eprintln!("  /history        Show the conversation so far");
    eprintln!("  /clear          Clear the conversation (and its saved file)");
    eprintln!("  /help           Show this help");
    eprintln!("  /quit           Exit");
    eprintln!();
    eprintln!("Supported files: .pdf, .docx, .txt, .png, .jpg, .jpeg");
}
