use std::sync::Arc;

use crate::llm::{ChatMessage, ROLE_ASSISTANT};
use crate::retrieval::RetrievedPassage;

pub mod templates;
pub mod urls;

pub use templates::DEFAULT_LANGUAGE;
pub use urls::TrustedUrls;

/// Separator printed between passages in the context block.
const PASSAGE_SEPARATOR: &str = "\n---\n";

/// Assembles the system/user message pair for one question.
///
/// Pure and deterministic: identical inputs produce byte-identical output.
/// The only process-wide input is the trusted-URL list, which is immutable
/// after startup.
pub struct PromptBuilder {
    trusted_urls: Arc<TrustedUrls>,
}

impl PromptBuilder {
    pub fn new(trusted_urls: Arc<TrustedUrls>) -> Self {
        Self { trusted_urls }
    }

    pub fn trusted_urls(&self) -> &TrustedUrls {
        &self.trusted_urls
    }

    pub fn build(
        &self,
        question: &str,
        passages: &[RetrievedPassage],
        history: &[ChatMessage],
        language: &str,
    ) -> Vec<ChatMessage> {
        let tpl = templates::for_language(language);

        let mut system = String::new();
        system.push_str(tpl.system);
        system.push_str("\n\n");
        system.push_str(tpl.url_policy);
        system.push_str("\n\n");
        system.push_str(tpl.url_heading);
        system.push('\n');
        system.push_str(&self.trusted_urls.as_block());

        let mut user = String::new();
        user.push_str(tpl.scaffold);

        if !history.is_empty() {
            user.push_str("\n\n");
            user.push_str(tpl.history_heading);
            for turn in history {
                let label = if turn.role == ROLE_ASSISTANT {
                    tpl.assistant_label
                } else {
                    tpl.user_label
                };
                user.push('\n');
                user.push_str(label);
                user.push_str(": ");
                user.push_str(&turn.content);
            }
        }

        user.push_str("\n\n");
        user.push_str(tpl.context_heading);
        user.push('\n');
        let rendered: Vec<String> = passages.iter().map(render_passage).collect();
        user.push_str(&rendered.join(PASSAGE_SEPARATOR));

        user.push_str("\n\n");
        user.push_str(tpl.question_heading);
        user.push('\n');
        user.push_str(question);

        vec![ChatMessage::system(system), ChatMessage::user(user)]
    }
}

fn render_passage(passage: &RetrievedPassage) -> String {
    let mut block = format!("[Source {}]\n{}", passage.source_index, passage.content);
    if let Some(page) = passage.metadata.page {
        block.push_str(&format!("\n[Page: {page}]"));
    }
    // Only sanitized URLs reach this point; the orchestrator drops the rest.
    if let Some(url) = &passage.metadata.url {
        block.push_str(&format!("\n[URL: {url}]"));
    }
    block
}
