//! OpenAI-compatible chat completions backend.
//!
//! `decide` sends one non-streaming request and parses a JSON action from the
//! reply. `narrate` sends a streaming request and turns the SSE `data:` lines
//! into text chunks. Every transport or parse problem becomes an `AiError`.

use std::collections::VecDeque;

use async_trait::async_trait;
use futures::stream::{self, BoxStream, StreamExt};
use reqwest::StatusCode;
use serde_json::{json, Value as JsonValue};
use tracing::debug;

use super::config::AiConfig;
use super::context::AiContext;
use super::trait_def::{AiError, DecisionGateway, TextStream};
use crate::domain::{Action, Role};

pub struct ChatCompletionsGateway {
    client: reqwest::Client,
    base_url: String,
    model: String,
    api_key: Option<String>,
    temperature: f32,
}

impl ChatCompletionsGateway {
    pub const NAME: &'static str = "chat_completions";
    pub const VERSION: &'static str = "1.0.0";

    pub fn new(config: &AiConfig) -> Result<Self, AiError> {
        let base_url = config
            .base_url
            .clone()
            .ok_or_else(|| AiError::Internal("AI_BASE_URL is required".into()))?;
        let model = config
            .model
            .clone()
            .ok_or_else(|| AiError::Internal("AI_MODEL is required".into()))?;
        let client = reqwest::Client::builder()
            .build()
            .map_err(|e| AiError::Internal(e.to_string()))?;
        Ok(Self {
            client,
            base_url,
            model,
            api_key: config.api_key.clone(),
            temperature: config.temperature(),
        })
    }

    fn url(&self) -> String {
        format!("{}/chat/completions", self.base_url.trim_end_matches('/'))
    }

    fn body(&self, role: Role, ctx: &AiContext, stream: bool) -> JsonValue {
        json!({
            "model": self.model,
            "temperature": self.temperature,
            "stream": stream,
            "messages": [
                {"role": "system", "content": system_prompt(role)},
                {"role": "user", "content": ctx.render_prompt()},
            ],
        })
    }

    async fn send(&self, body: &JsonValue) -> Result<reqwest::Response, AiError> {
        let mut req = self.client.post(self.url()).json(body);
        if let Some(key) = &self.api_key {
            req = req.bearer_auth(key);
        }
        let resp = req
            .send()
            .await
            .map_err(|e| AiError::Transport(e.to_string()))?;
        let status = resp.status();
        if status != StatusCode::OK {
            return Err(AiError::Transport(format!("chat http={}", status.as_u16())));
        }
        Ok(resp)
    }
}

fn system_prompt(role: Role) -> String {
    format!(
        "You play the {role} in a werewolf party game. Stay in character, never reveal \
         hidden information you were not given, and follow the reply format exactly."
    )
}

/// Extract the first JSON object from a reply and read it as an action.
pub fn parse_action(content: &str) -> Result<Action, AiError> {
    let start = content
        .find('{')
        .ok_or_else(|| AiError::Malformed(format!("no JSON object in '{content}'")))?;
    let end = content
        .rfind('}')
        .filter(|&end| end > start)
        .ok_or_else(|| AiError::Malformed(format!("unterminated JSON in '{content}'")))?;
    serde_json::from_str(&content[start..=end]).map_err(|e| AiError::Malformed(e.to_string()))
}

#[derive(Debug, PartialEq, Eq)]
pub enum SseEvent {
    Content(String),
    Done,
    Ignore,
}

/// Interpret one SSE line of a streamed chat completion.
pub fn parse_sse_line(line: &str) -> Result<SseEvent, AiError> {
    let Some(data) = line.strip_prefix("data:") else {
        return Ok(SseEvent::Ignore);
    };
    let data = data.trim();
    if data == "[DONE]" {
        return Ok(SseEvent::Done);
    }
    let value: JsonValue =
        serde_json::from_str(data).map_err(|e| AiError::Malformed(e.to_string()))?;
    let content = value
        .get("choices")
        .and_then(|c| c.as_array())
        .and_then(|c| c.first())
        .and_then(|c| c.get("delta"))
        .and_then(|d| d.get("content"))
        .and_then(|c| c.as_str());
    Ok(match content {
        Some(text) if !text.is_empty() => SseEvent::Content(text.to_string()),
        _ => SseEvent::Ignore,
    })
}

struct SseState {
    bytes: BoxStream<'static, Result<Vec<u8>, AiError>>,
    buf: Vec<u8>,
    pending: VecDeque<Result<String, AiError>>,
    done: bool,
}

impl SseState {
    /// Move every complete line out of the buffer.
    fn drain_lines(&mut self, flush: bool) {
        loop {
            let line = match self.buf.iter().position(|b| *b == b'\n') {
                Some(pos) => self.buf.drain(..=pos).collect::<Vec<u8>>(),
                None if flush && !self.buf.is_empty() => std::mem::take(&mut self.buf),
                None => return,
            };
            let line = String::from_utf8_lossy(&line);
            match parse_sse_line(line.trim()) {
                Ok(SseEvent::Content(text)) => self.pending.push_back(Ok(text)),
                Ok(SseEvent::Ignore) => {}
                Ok(SseEvent::Done) => {
                    self.done = true;
                    return;
                }
                Err(e) => {
                    self.pending.push_back(Err(e));
                    self.done = true;
                    return;
                }
            }
        }
    }
}

fn sse_text_stream(resp: reqwest::Response) -> TextStream {
    let bytes = resp
        .bytes_stream()
        .map(|r| r.map(|b| b.to_vec()).map_err(|e| AiError::Transport(e.to_string())))
        .boxed();
    let state = SseState {
        bytes,
        buf: Vec::new(),
        pending: VecDeque::new(),
        done: false,
    };
    stream::unfold(state, |mut st| async move {
        loop {
            if let Some(item) = st.pending.pop_front() {
                return Some((item, st));
            }
            if st.done {
                return None;
            }
            match st.bytes.next().await {
                Some(Ok(chunk)) => {
                    st.buf.extend_from_slice(&chunk);
                    st.drain_lines(false);
                }
                Some(Err(e)) => {
                    st.done = true;
                    return Some((Err(e), st));
                }
                None => {
                    st.drain_lines(true);
                    st.done = true;
                }
            }
        }
    })
    .boxed()
}

#[async_trait]
impl DecisionGateway for ChatCompletionsGateway {
    fn name(&self) -> &'static str {
        Self::NAME
    }

    async fn decide(&self, role: Role, ctx: &AiContext) -> Result<Action, AiError> {
        let resp = self.send(&self.body(role, ctx, false)).await?;
        let body: JsonValue = resp
            .json()
            .await
            .map_err(|e| AiError::Malformed(e.to_string()))?;
        let content = body
            .get("choices")
            .and_then(|c| c.as_array())
            .and_then(|c| c.first())
            .and_then(|c| c.get("message"))
            .and_then(|m| m.get("content"))
            .and_then(|c| c.as_str())
            .ok_or_else(|| AiError::Malformed("reply has no message content".into()))?;
        debug!(room_id = ctx.room_id, seat = ctx.seat, task = ctx.task.as_str(), reply = %content, "AI reply");
        parse_action(content)
    }

    async fn narrate(&self, role: Role, ctx: &AiContext) -> Result<TextStream, AiError> {
        let resp = self.send(&self.body(role, ctx, true)).await?;
        Ok(sse_text_stream(resp))
    }
}
