use std::sync::Arc;

use async_trait::async_trait;
use serde::Deserialize;
use tracing::{debug, warn};

use super::{Context, WorkerCapability, WorkerFault, WorkerReply};
use crate::anthropic::{AnthropicError, Message, MessageSender, MessagesRequest};
use crate::workflow::Role;

const NETWORK_PROMPT: &str = "You are the network diagnostic specialist of an IT helpdesk. \
Investigate connectivity, routing and name-resolution problems described in the ticket and \
state the concrete resolution steps.";

const CLOUD_PROMPT: &str = "You are the cloud service specialist of an IT helpdesk. \
Investigate problems with cloud storage buckets, regions, permissions and managed services \
described in the ticket and state the concrete resolution steps.";

const SUMMARIZER_PROMPT: &str = "You write the closing summary of an IT helpdesk ticket. \
In two or three short paragraphs cover the original issue, the diagnostic steps taken, \
the final resolution and relevant technical details.";

const DECISION_FORMAT: &str = "Respond with ONLY valid JSON, no other text.\n\
Format: {\"text\": \"<your response>\", \"next\": <null or one of: triage, intake, memory-check>}\n\
Use \"next\": \"triage\" only if the ticket belongs to a different specialist.";

/// Routing decision a model returns alongside its text.
#[derive(Debug, Deserialize)]
pub struct RoleDecision {
    pub text: String,
    #[serde(default)]
    pub next: Option<String>,
}

/// A role backed by the Anthropic Messages API.
pub struct LlmWorker<S> {
    client: Arc<S>,
    role: Role,
    model: String,
    system_prompt: String,
    default_next: Role,
    max_tokens: u32,
}

impl<S: MessageSender> LlmWorker<S> {
    pub fn new(
        client: Arc<S>,
        role: Role,
        model: impl Into<String>,
        system_prompt: impl Into<String>,
        default_next: Role,
    ) -> Self {
        Self {
            client,
            role,
            model: model.into(),
            system_prompt: system_prompt.into(),
            default_next,
            max_tokens: 2048,
        }
    }

    pub fn network(client: Arc<S>, model: impl Into<String>) -> Self {
        Self::new(client, Role::NetworkWorker, model, NETWORK_PROMPT, Role::MemoryCheck)
    }

    pub fn cloud(client: Arc<S>, model: impl Into<String>) -> Self {
        Self::new(client, Role::CloudWorker, model, CLOUD_PROMPT, Role::MemoryCheck)
    }

    pub fn summarizer(client: Arc<S>, model: impl Into<String>) -> Self {
        Self::new(client, Role::Summarizer, model, SUMMARIZER_PROMPT, Role::Closer)
    }

    fn request(&self, ctx: &Context<'_>) -> MessagesRequest {
        let mut transcript = format!("Ticket:\n{}\n", ctx.ticket_text());
        if !ctx.messages.is_empty() {
            transcript.push_str("\nConversation so far:\n");
            for m in ctx.messages {
                transcript.push_str(&format!("[{}] {}\n", m.role, m.text));
            }
        }
        transcript.push('\n');
        transcript.push_str(DECISION_FORMAT);

        MessagesRequest {
            model: self.model.clone(),
            max_tokens: self.max_tokens,
            system: Some(self.system_prompt.clone()),
            messages: vec![Message {
                role: "user".into(),
                content: transcript,
            }],
        }
    }

    /// Turn the raw model text into a reply. Plain text (no JSON object)
    /// becomes the response text and routes to the default successor.
    fn interpret(&self, raw: &str) -> WorkerReply {
        let Some(decision) = parse_decision(raw) else {
            return WorkerReply::route(self.default_next, raw.trim());
        };
        let next = match decision.next.as_deref().map(str::parse::<Role>) {
            Some(Ok(role)) => role,
            Some(Err(e)) => {
                warn!(role = %self.role, error = %e, "Model named an unknown role, using default");
                self.default_next
            }
            None => self.default_next,
        };
        WorkerReply::route(next, decision.text)
    }
}

fn parse_decision(raw: &str) -> Option<RoleDecision> {
    let start = raw.find('{')?;
    let end = raw.rfind('}')?;
    if end < start {
        return None;
    }
    serde_json::from_str(&raw[start..=end]).ok()
}

fn classify(e: AnthropicError) -> WorkerFault {
    if e.is_transient() {
        WorkerFault::Transient(e.to_string())
    } else {
        WorkerFault::Fatal(e.to_string())
    }
}

#[async_trait]
impl<S: MessageSender + 'static> WorkerCapability for LlmWorker<S> {
    async fn invoke(&self, ctx: Context<'_>) -> Result<WorkerReply, WorkerFault> {
        if let Some(previous) = ctx.last_from(self.role)
            && previous.next == Some(self.default_next)
        {
            debug!(role = %self.role, "Reusing earlier resolution for this ticket");
            return Ok(WorkerReply::route(self.default_next, previous.text.clone()));
        }

        let response = self
            .client
            .send_message(&self.request(&ctx))
            .await
            .map_err(classify)?;
        Ok(self.interpret(&response.text()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::anthropic::types::{ContentBlock, MessagesResponse, Usage};
    use crate::memory::{InMemoryStore, MemoryCache};
    use crate::worker::{
        CloserWorker, ContextMessage, IntakeWorker, MemoryCheckWorker, ScriptedWorker,
        TicketBrief, TriageWorker,
    };
    use crate::workflow::{TerminalState, WorkflowEngine};
    use std::sync::atomic::{AtomicU32, Ordering};

    struct MockClient {
        result: Result<String, u16>,
        calls: AtomicU32,
    }

    impl MockClient {
        fn ok(text: &str) -> Arc<Self> {
            Arc::new(Self {
                result: Ok(text.to_string()),
                calls: AtomicU32::new(0),
            })
        }

        fn status(status: u16) -> Arc<Self> {
            Arc::new(Self {
                result: Err(status),
                calls: AtomicU32::new(0),
            })
        }
    }

    #[async_trait]
    impl MessageSender for MockClient {
        async fn send_message(
            &self,
            _req: &MessagesRequest,
        ) -> Result<MessagesResponse, AnthropicError> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            match &self.result {
                Ok(text) => Ok(MessagesResponse {
                    id: "mock".into(),
                    content: vec![ContentBlock {
                        content_type: "text".into(),
                        text: text.clone(),
                    }],
                    model: "mock".into(),
                    stop_reason: Some("end_turn".into()),
                    usage: Usage {
                        input_tokens: 0,
                        output_tokens: 0,
                    },
                }),
                Err(status) => Err(AnthropicError::ApiError {
                    status: *status,
                    message: "mock error".into(),
                }),
            }
        }
    }

    fn brief() -> TicketBrief {
        TicketBrief::from_text("Cannot reach host 10.0.0.5")
    }

    #[tokio::test]
    async fn json_decision_defaults_to_memory_check() {
        let client = MockClient::ok(r#"{"text": "Restarted gateway service", "next": null}"#);
        let worker = LlmWorker::network(client, "claude-test");
        let brief = brief();
        let reply = worker.invoke(Context::new(&brief, &[])).await.unwrap();
        assert_eq!(
            reply,
            WorkerReply::route(Role::MemoryCheck, "Restarted gateway service")
        );
    }

    #[tokio::test]
    async fn json_decision_can_send_back_to_triage() {
        let client = MockClient::ok(
            "```json\n{\"text\": \"This is an S3 permissions issue\", \"next\": \"triage\"}\n```",
        );
        let worker = LlmWorker::network(client, "claude-test");
        let brief = brief();
        let reply = worker.invoke(Context::new(&brief, &[])).await.unwrap();
        assert_eq!(
            reply,
            WorkerReply::route(Role::Triage, "This is an S3 permissions issue")
        );
    }

    #[tokio::test]
    async fn plain_text_routes_to_default() {
        let client = MockClient::ok("  The gateway was restarted and the host is reachable.  ");
        let worker = LlmWorker::summarizer(client, "claude-test");
        let brief = brief();
        let reply = worker.invoke(Context::new(&brief, &[])).await.unwrap();
        assert_eq!(
            reply,
            WorkerReply::route(
                Role::Closer,
                "The gateway was restarted and the host is reachable."
            )
        );
    }

    #[tokio::test]
    async fn unknown_role_falls_back_to_default() {
        let client = MockClient::ok(r#"{"text": "done", "next": "janitor"}"#);
        let worker = LlmWorker::cloud(client, "claude-test");
        let brief = brief();
        let reply = worker.invoke(Context::new(&brief, &[])).await.unwrap();
        assert_eq!(reply, WorkerReply::route(Role::MemoryCheck, "done"));
    }

    #[tokio::test]
    async fn earlier_response_is_reused_without_a_call() {
        let client = MockClient::ok(r#"{"text": "fresh", "next": null}"#);
        let worker = LlmWorker::network(Arc::clone(&client), "claude-test");
        let brief = brief();
        let messages = vec![ContextMessage::routed(
            Role::NetworkWorker,
            "Restarted gateway service",
            Role::MemoryCheck,
        )];
        let reply = worker.invoke(Context::new(&brief, &messages)).await.unwrap();
        assert_eq!(
            reply,
            WorkerReply::route(Role::MemoryCheck, "Restarted gateway service")
        );
        assert_eq!(client.calls.load(Ordering::SeqCst), 0);
    }

    #[tokio::test]
    async fn earlier_decline_is_not_reused() {
        let client = MockClient::ok(r#"{"text": "Raised MTU on the tunnel", "next": null}"#);
        let worker = LlmWorker::network(Arc::clone(&client), "claude-test");
        let brief = brief();
        let messages = vec![
            ContextMessage::routed(Role::NetworkWorker, "Not a network issue", Role::Triage),
            ContextMessage::routed(Role::Triage, "Please diagnose", Role::NetworkWorker),
        ];
        let reply = worker.invoke(Context::new(&brief, &messages)).await.unwrap();
        assert_eq!(
            reply,
            WorkerReply::route(Role::MemoryCheck, "Raised MTU on the tunnel")
        );
        assert_eq!(client.calls.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn repeated_decline_never_completes_or_stores() {
        let client = MockClient::ok(
            r#"{"text": "Not a network issue, this is S3 permissions", "next": "triage"}"#,
        );
        let cache = Arc::new(MemoryCache::new(InMemoryStore::new()));
        let engine = WorkflowEngine::builder()
            .worker(Role::Intake, IntakeWorker)
            .worker(Role::MemoryCheck, MemoryCheckWorker::new(Arc::clone(&cache)))
            .worker(Role::Triage, TriageWorker::default())
            .worker(Role::NetworkWorker, LlmWorker::network(Arc::clone(&client), "claude-test"))
            .worker(
                Role::CloudWorker,
                ScriptedWorker::new(WorkerReply::route(Role::MemoryCheck, "Fixed bucket policy")),
            )
            .worker(
                Role::Summarizer,
                ScriptedWorker::new(WorkerReply::route(Role::Closer, "summary")),
            )
            .worker(Role::Closer, CloserWorker)
            .build()
            .unwrap();

        let result = engine.start("Bucket reports AccessDenied").await.unwrap();

        assert!(!result.is_resolved());
        assert_eq!(result.terminal_state, TerminalState::HandoffLimitExceeded);
        assert!(!result.handoff_sequence.contains(&Role::Summarizer));
        assert!(cache.list().await.unwrap().is_empty());
        assert!(client.calls.load(Ordering::SeqCst) > 1);
    }

    #[tokio::test]
    async fn api_errors_are_classified() {
        let brief = brief();

        let worker = LlmWorker::network(MockClient::status(529), "claude-test");
        let fault = worker.invoke(Context::new(&brief, &[])).await.unwrap_err();
        assert!(fault.is_transient());

        let worker = LlmWorker::network(MockClient::status(400), "claude-test");
        let fault = worker.invoke(Context::new(&brief, &[])).await.unwrap_err();
        assert!(!fault.is_transient());
    }

    #[test]
    fn request_includes_transcript_and_system_prompt() {
        let worker = LlmWorker::cloud(MockClient::ok(""), "claude-test");
        let brief = TicketBrief::from_text("Bucket reports AccessDenied");
        let messages = vec![ContextMessage::new(Role::Triage, "Please diagnose")];
        let req = worker.request(&Context::new(&brief, &messages));
        assert_eq!(req.model, "claude-test");
        assert!(req.system.as_deref().unwrap().contains("cloud service specialist"));
        assert!(req.messages[0].content.contains("Bucket reports AccessDenied"));
        assert!(req.messages[0].content.contains("[triage] Please diagnose"));
    }
}
