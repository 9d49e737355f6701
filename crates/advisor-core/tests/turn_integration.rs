//! End-to-end turn tests: files → context → prompt → HTTP → session file.
//!
//! A raw TCP server stands in for the chat-completions endpoint so the real
//! `OpenAiProvider` is exercised, then the transcript is persisted and
//! reloaded through `SessionStore`.
//!
//! Run with: `cargo test -p advisor-core --test turn_integration -- --ignored`

use std::sync::{Arc, Mutex};
use std::time::Duration;

use advisor_api::OpenAiProvider;
use advisor_core::{PERSONA, Responder, ResponderSettings, run_turn};
use advisor_docs::{Extractor, OcrEngine, TesseractOcr, UploadedFile};
use advisor_session::{SessionState, SessionStore};
use advisor_types::FailureKind;
use tokio::io::{AsyncReadExt, AsyncWriteExt};
use tokio::net::TcpListener;

const COMPLETION_BODY: &str = r#"{"id":"chatcmpl-turn","object":"chat.completion","model":"gpt-4o","choices":[{"index":0,"message":{"role":"assistant","content":"Reduza o prazo médio de recebimento."},"finish_reason":"stop"}],"usage":{"prompt_tokens":80,"completion_tokens":9,"total_tokens":89}}"#;

fn http_response(status_line: &str, body: &str) -> String {
    format!(
        "HTTP/1.1 {status_line}\r\n\
         Content-Type: application/json\r\n\
         Content-Length: {}\r\n\
         Connection: close\r\n\
         \r\n\
         {body}",
        body.len()
    )
}

/// Read headers plus a Content-Length body.
async fn read_request(socket: &mut tokio::net::TcpStream) -> String {
    let mut data = Vec::new();
    let mut buf = [0u8; 4096];
    loop {
        let n = match socket.read(&mut buf).await {
            Ok(0) | Err(_) => break,
            Ok(n) => n,
        };
        data.extend_from_slice(&buf[..n]);
        let text = String::from_utf8_lossy(&data);
        if let Some(header_end) = text.find("\r\n\r\n") {
            let content_length = text[..header_end]
                .lines()
                .find_map(|l| {
                    let (name, value) = l.split_once(':')?;
                    name.eq_ignore_ascii_case("content-length")
                        .then(|| value.trim().parse::<usize>().ok())
                        .flatten()
                })
                .unwrap_or(0);
            if data.len() >= header_end + 4 + content_length {
                break;
            }
        }
    }
    String::from_utf8_lossy(&data).into_owned()
}

/// Serve `response` to every connection and keep the request bodies.
async fn start_test_server(response: String) -> (String, Arc<Mutex<Vec<String>>>) {
    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    let bodies = Arc::new(Mutex::new(Vec::new()));
    let bodies_clone = Arc::clone(&bodies);

    tokio::spawn(async move {
        while let Ok((mut socket, _)) = listener.accept().await {
            let response = response.clone();
            let bodies = Arc::clone(&bodies_clone);
            tokio::spawn(async move {
                let request = read_request(&mut socket).await;
                if let Some((_, body)) = request.split_once("\r\n\r\n") {
                    bodies.lock().unwrap().push(body.to_string());
                }
                let _ = socket.write_all(response.as_bytes()).await;
                let _ = socket.flush().await;
            });
        }
    });

    (format!("http://{addr}"), bodies)
}

fn pipeline(base_url: &str) -> (Extractor, Responder) {
    let provider = Arc::new(OpenAiProvider::new("sk-test", base_url).unwrap());
    let responder = Responder::new(
        provider,
        ResponderSettings {
            pre_call_delay: Duration::ZERO,
            ..Default::default()
        },
    );
    let ocr: Arc<dyn OcrEngine> = Arc::new(TesseractOcr::default());
    (Extractor::new(ocr), responder)
}

#[tokio::test]
#[ignore]
async fn answered_turn_is_persisted() {
    let (base_url, bodies) = start_test_server(http_response("200 OK", COMPLETION_BODY)).await;
    let (extractor, responder) = pipeline(&base_url);
    let tmp = tempfile::TempDir::new().unwrap();
    let store = SessionStore::new(tmp.path().join("estado_bot.json"));

    let mut state = store.load().await.unwrap();
    let files = [
        UploadedFile::new("caixa.txt", "O fluxo de caixa ficou negativo em março."),
        UploadedFile::new("logo.bmp", vec![0x42, 0x4D]),
    ];
    let outcome = run_turn(&mut state, &extractor, &responder, &files, "Como melhorar o caixa?")
        .await
        .unwrap();
    assert!(!outcome.is_error());
    store.save(&state).await.unwrap();

    let reloaded = store.load().await.unwrap();
    assert_eq!(reloaded.messages.len(), 1);
    assert_eq!(
        reloaded.messages[0].bot.as_deref(),
        Some("Reduza o prazo médio de recebimento.")
    );

    let bodies = bodies.lock().unwrap();
    assert_eq!(bodies.len(), 1);
    let sent: serde_json::Value = serde_json::from_str(&bodies[0]).unwrap();
    assert_eq!(sent["model"], "gpt-4o");
    assert_eq!(sent["max_tokens"], 1000);
    let system = sent["messages"][0]["content"].as_str().unwrap();
    assert!(system.starts_with(PERSONA));
    assert!(system.contains(
        "--- Part 1 of Context ---\n--- caixa.txt --- O fluxo de caixa ficou negativo em março.--- logo.bmp ---"
    ));
    assert_eq!(sent["messages"][1]["content"], "Como melhorar o caixa?");
}

#[tokio::test]
#[ignore]
async fn auth_failure_is_recorded_as_answer() {
    let (base_url, _bodies) = start_test_server(http_response(
        "401 Unauthorized",
        r#"{"error":{"message":"Incorrect API key provided"}}"#,
    ))
    .await;
    let (extractor, responder) = pipeline(&base_url);
    let mut state = SessionState::new();
    let files = [UploadedFile::new("a.txt", "qualquer coisa")];

    let outcome = run_turn(&mut state, &extractor, &responder, &files, "coisa")
        .await
        .unwrap();
    let err = outcome.reply.as_ref().unwrap_err();
    assert_eq!(err.kind(), FailureKind::Auth);
    let answer = state.messages[0].bot.as_deref().unwrap();
    assert!(answer.starts_with("Erro ao gerar resposta: "), "got {answer:?}");
}

#[tokio::test]
#[ignore]
async fn second_turn_appends_after_first() {
    let (base_url, bodies) = start_test_server(http_response("200 OK", COMPLETION_BODY)).await;
    let (extractor, responder) = pipeline(&base_url);
    let mut state = SessionState::new();
    let files = [UploadedFile::new("metas.txt", "meta de receita 2025")];

    run_turn(&mut state, &extractor, &responder, &files, "receita")
        .await
        .unwrap();
    let second = run_turn(&mut state, &extractor, &responder, &files, "e a meta?")
        .await
        .unwrap();

    assert_eq!(second.index, 1);
    assert_eq!(state.messages[1].user.as_deref(), Some("e a meta?"));
    assert_eq!(bodies.lock().unwrap().len(), 2);
}
