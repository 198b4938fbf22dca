use std::convert::Infallible;
use std::sync::Arc;

use axum::body::{Body, Bytes};
use futures_util::stream::{self, Stream};
use tokio::sync::mpsc;

use crate::core::errors::ApiError;

/// Terminal frame; its absence tells the client the stream failed.
pub const DONE_FRAME: &str = "d:{\"finishReason\":\"stop\"}\n";

/// Boundary to the answer-persistence collaborator. Called once per request,
/// on natural stream completion only, with the full accumulated answer.
pub trait TranscriptSink: Send + Sync {
    fn store(&self, question: &str, answer: &str);
}

/// Default sink: persistence lives outside this core, so the hand-off is
/// just logged.
pub struct LoggingSink;

impl TranscriptSink for LoggingSink {
    fn store(&self, question: &str, answer: &str) {
        tracing::debug!(
            question_chars = question.chars().count(),
            answer_chars = answer.chars().count(),
            "answer complete, handing off transcript"
        );
    }
}

/// Encode one text fragment as a wire frame: `0:"<escaped>"` plus newline.
pub fn encode_frame(fragment: &str) -> String {
    format!("0:\"{}\"\n", escape_fragment(fragment))
}

fn escape_fragment(fragment: &str) -> String {
    let mut escaped = String::with_capacity(fragment.len());
    for c in fragment.chars() {
        match c {
            '\\' => escaped.push_str("\\\\"),
            '"' => escaped.push_str("\\\""),
            '\n' => escaped.push_str("\\n"),
            '\r' => escaped.push_str("\\r"),
            other => escaped.push(other),
        }
    }
    escaped
}

struct RelayState {
    rx: mpsc::Receiver<Result<String, ApiError>>,
    question: String,
    accumulated: String,
    sink: Arc<dyn TranscriptSink>,
    finished: bool,
}

/// Re-emit generator fragments as wire frames, one frame per fragment, each
/// flushed as it arrives. The full text accumulates alongside and is handed
/// to the sink when the generator completes naturally.
///
/// On a mid-stream error the stream ends without the done frame and nothing
/// is persisted. Dropping the stream (client disconnect) drops the receiver,
/// which cancels the upstream task; partial text is discarded.
pub fn relay_stream(
    rx: mpsc::Receiver<Result<String, ApiError>>,
    question: String,
    sink: Arc<dyn TranscriptSink>,
) -> impl Stream<Item = Result<Bytes, Infallible>> {
    let state = RelayState {
        rx,
        question,
        accumulated: String::new(),
        sink,
        finished: false,
    };

    stream::unfold(state, |mut st| async move {
        if st.finished {
            return None;
        }
        match st.rx.recv().await {
            Some(Ok(fragment)) => {
                st.accumulated.push_str(&fragment);
                let frame = encode_frame(&fragment);
                Some((Ok(Bytes::from(frame)), st))
            }
            Some(Err(err)) => {
                tracing::error!("generation stream aborted mid-flight: {err}");
                st.finished = true;
                None
            }
            None => {
                st.finished = true;
                let answer = st.accumulated.trim();
                if !answer.is_empty() {
                    st.sink.store(&st.question, answer);
                }
                Some((Ok(Bytes::from_static(DONE_FRAME.as_bytes())), st))
            }
        }
    })
}

pub fn body(
    rx: mpsc::Receiver<Result<String, ApiError>>,
    question: String,
    sink: Arc<dyn TranscriptSink>,
) -> Body {
    Body::from_stream(relay_stream(rx, question, sink))
}
