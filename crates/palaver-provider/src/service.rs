//! The LLM provider task: a mailbox-driven responder.
//!
//! One service can back many participants; each query carries its own
//! context and correlation id, so replies never cross. A backend failure
//! is answered with an empty entry, which the querying participant treats
//! as a pass, so a flaky API degrades to silence instead of wedging the
//! conversation.

use tokio::sync::watch;
use tracing::{debug, info, warn};

use palaver_post::{Mailbox, PostOffice};
use palaver_types::{Address, ChatEntry, Envelope, Intent, Payload};

use crate::llm::LlmBackend;

/// A provider task answering context queries through an LLM backend.
pub struct LlmProviderService {
    address: Address,
    post: PostOffice,
    mailbox: Mailbox,
    backend: LlmBackend,
}

impl LlmProviderService {
    /// Register a provider under `address` on the given broker.
    pub async fn register(post: &PostOffice, address: Address, backend: LlmBackend) -> Self {
        let mailbox = post.register(address.clone()).await;
        info!(provider = %address, backend = backend.name(), "provider registered");
        Self {
            address,
            post: post.clone(),
            mailbox,
            backend,
        }
    }

    /// Serve queries until shutdown, then unregister.
    pub async fn run(mut self, mut shutdown: watch::Receiver<bool>) {
        loop {
            tokio::select! {
                _ = shutdown.changed() => break,
                envelope = self.mailbox.recv() => match envelope {
                    Some(envelope) => self.handle(envelope).await,
                    None => break,
                },
            }
        }
        self.post.unregister(&self.address).await;
        info!(provider = %self.address, "provider stopped");
    }

    /// Answer one query; anything other than a context query is dropped.
    async fn handle(&self, envelope: Envelope) {
        let (Intent::Query, Payload::Context(context)) = (envelope.intent, &envelope.payload)
        else {
            warn!(
                provider = %self.address,
                sender = %envelope.sender,
                kind = envelope.payload.kind(),
                "malformed envelope dropped"
            );
            return;
        };

        let content = match self.backend.complete(context).await {
            Ok(text) => text,
            Err(e) => {
                // An empty reply reads as a pass on the participant side.
                warn!(
                    provider = %self.address,
                    backend = self.backend.name(),
                    error = %e,
                    "completion failed, replying with a pass"
                );
                String::new()
            }
        };
        debug!(
            provider = %self.address,
            querier = %envelope.sender,
            context_len = context.len(),
            reply_len = content.len(),
            "answered context query"
        );

        let reply = Envelope::reply_to(
            &envelope,
            self.address.clone(),
            Payload::Entry(ChatEntry::assistant(content)),
        );
        if let Err(e) = self.post.deliver(reply).await {
            warn!(provider = %self.address, error = %e, "reply delivery failed");
        }
    }
}
