use std::fs;
use std::time::Duration;

use gptcard_core::ENTER_KEY_CODE;
use gptcard_engine::{ContentScript, ContentScriptSettings, Document, LocalStorage, NodeId, Signal};
use serde_json::json;
use tempfile::TempDir;
use wiremock::matchers::{header, method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

const PAGE: &str = r#"<html><body><div id="root"><div class="editor-container"></div></div></body></html>"#;
const SETTLE: Duration = Duration::from_secs(5);

fn open_card(script: &mut ContentScript) -> NodeId {
    let container = script.document().find_by_class("editor-container").unwrap();
    let added = script
        .document_mut()
        .append_html(
            container,
            r#"<div class="ProseMirror" contenteditable="true"><p>notes</p></div><div class="card-toolbar"></div>"#,
        )
        .unwrap();
    script.pump();
    added[0]
}

fn run_command(script: &mut ContentScript, editor: NodeId, line: &str) {
    script
        .document_mut()
        .append_html(editor, &format!("<p>{line}</p>"))
        .unwrap();
    script.pump();
    script.key_down(editor, ENTER_KEY_CODE);
    script.pump();
    assert!(script.run_until_idle(SETTLE));
}

#[test]
fn reloaded_config_is_used_for_the_next_command() {
    let runtime = tokio::runtime::Runtime::new().unwrap();
    let server = runtime.block_on(MockServer::start());
    runtime.block_on(
        Mock::given(method("POST"))
            .and(path("/v1/completions"))
            .and(header("authorization", "Bearer sk-fresh"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({
                "choices": [{ "text": "configured answer" }]
            })))
            .expect(1)
            .mount(&server),
    );

    let temp = TempDir::new().unwrap();
    let storage_path = temp.path().join("storage.ron");
    fs::write(&storage_path, r#"(gpt_config: (api_key: ""))"#).unwrap();

    let mut settings = ContentScriptSettings::default();
    settings.core.prefill_delay = Duration::from_millis(20);
    let mut script = ContentScript::new(
        Document::parse(PAGE),
        LocalStorage::open(&storage_path).unwrap(),
        settings,
    );
    script.handle_signal(Signal::Init);
    let editor = open_card(&mut script);

    run_command(&mut script, editor, "hey gpt, first try");
    let text = script.document().inner_text(editor).unwrap();
    assert!(text.contains("** An error occurred when calling GPT-3."));

    fs::write(
        &storage_path,
        format!(
            r#"(gpt_config: (api_key: "sk-fresh", api_base: Some("{}/v1")))"#,
            server.uri()
        ),
    )
    .unwrap();
    script.reload_config();

    run_command(&mut script, editor, "hey gpt, second try");
    let html = script.document().inner_html(editor).unwrap();
    assert!(html.ends_with("<blockquote>configured answer</blockquote><p></p>"));
    assert_eq!(html.matches("<blockquote>").count(), 2);
}
