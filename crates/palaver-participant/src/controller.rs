//! The participant state machine and its run loop.
//!
//! States are a tagged enum with one handler per tag, dispatched by an
//! explicit match in [`ParticipantController::run`]:
//!
//! ```text
//! NAMING -> JOINING -> FETCHING <-> GENERATING -> PUBLISHING
//!                         ^  \________________________/
//!                         \__ retry on timeout (self-loop)
//! ```
//!
//! GENERATING is reachable only from FETCHING; FETCHING is reachable from
//! JOINING, GENERATING, and PUBLISHING (the recurring loop). There is no
//! terminal state in normal operation -- the loop runs until the shutdown
//! signal fires. A failure at any stage past naming degrades to "go
//! re-read the log": the conversation is eventually consistent and
//! self-heals under transient message loss.

use rand::rngs::SmallRng;
use tokio::sync::watch;
use tracing::{debug, info, warn};

use palaver_post::{Mailbox, PostOffice};
use palaver_types::{
    Address, ChatEntry, Envelope, ParticipantIdentity, Payload, Personality,
};

use crate::config::{ParticipantConfig, ParticipantKind, jitter};
use crate::error::ParticipantError;
use crate::memory::ConversationMemory;
use crate::pending::{self, PendingRequest, ReplyOutcome, RequestKind};
use crate::prompts;

/// The states of the participant loop.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ParticipantState {
    /// Ask the provider for an identity name (initial state).
    Naming,
    /// Reset the cursor and optionally announce entry.
    Joining,
    /// Pull everything after the cursor from the room.
    Fetching,
    /// Ask the provider for a reply to the current context.
    Generating,
    /// Publish the newest memory entry to the room.
    Publishing,
}

impl ParticipantState {
    /// Short name for logging.
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Naming => "naming",
            Self::Joining => "joining",
            Self::Fetching => "fetching",
            Self::Generating => "generating",
            Self::Publishing => "publishing",
        }
    }
}

/// Why a participant stopped without error.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StopReason {
    /// The external shutdown signal fired.
    Cancelled,
    /// The participant's own mailbox closed underneath it.
    MailboxClosed,
}

/// What a state handler resolved to.
#[derive(Debug, PartialEq, Eq)]
enum Transition {
    /// Continue the loop in this state.
    To(ParticipantState),
    /// Leave the loop cleanly.
    Stop(StopReason),
}

/// One participant: an independently cancellable task driving the
/// conversational loop over addressed envelopes.
pub struct ParticipantController {
    address: Address,
    post: PostOffice,
    mailbox: Mailbox,
    config: ParticipantConfig,
    personality: Personality,
    identity: Option<ParticipantIdentity>,
    memory: ConversationMemory,
    cursor: u64,
    rng: SmallRng,
}

impl ParticipantController {
    /// Register a participant under `address` on the given broker.
    ///
    /// The personality is drawn once from the injected random source and
    /// never changes; the same source later drives the pacing jitter.
    pub async fn register(
        post: &PostOffice,
        address: Address,
        config: ParticipantConfig,
        mut rng: SmallRng,
    ) -> Self {
        let personality = Personality::pick(&mut rng);
        let mailbox = post.register(address.clone()).await;
        let memory = ConversationMemory::new(config.max_memory);
        info!(
            participant = %address,
            personality = %personality,
            kind = ?config.kind,
            "participant registered"
        );
        Self {
            address,
            post: post.clone(),
            mailbox,
            config,
            personality,
            identity: None,
            memory,
            cursor: 0,
            rng,
        }
    }

    /// The participant's mailbox address.
    pub const fn address(&self) -> &Address {
        &self.address
    }

    /// The chosen display name, once the naming phase has completed.
    pub fn name(&self) -> Option<&str> {
        self.identity.as_ref().map(|i| i.name.as_str())
    }

    /// Run the loop until shutdown or an unrecoverable failure.
    ///
    /// The mailbox is unregistered on every exit path; a stopped
    /// participant emits no further queries or publishes.
    ///
    /// # Errors
    ///
    /// Returns [`ParticipantError`] if the naming phase fails (transport
    /// or timeout) or the join announcement cannot be sent. All later
    /// failures are absorbed by the loop itself.
    pub async fn run(
        mut self,
        mut shutdown: watch::Receiver<bool>,
    ) -> Result<StopReason, ParticipantError> {
        let mut state = ParticipantState::Naming;

        let outcome = loop {
            if *shutdown.borrow() {
                break Ok(StopReason::Cancelled);
            }
            debug!(participant = %self.address, state = state.as_str(), "entering state");

            let transition = match state {
                ParticipantState::Naming => self.naming(&mut shutdown).await,
                ParticipantState::Joining => self.joining().await,
                ParticipantState::Fetching => Ok(self.fetching(&mut shutdown).await),
                ParticipantState::Generating => Ok(self.generating(&mut shutdown).await),
                ParticipantState::Publishing => Ok(self.publishing(&mut shutdown).await),
            };

            match transition {
                Ok(Transition::To(next)) => state = next,
                Ok(Transition::Stop(reason)) => break Ok(reason),
                Err(e) => break Err(e),
            }
        };

        self.post.unregister(&self.address).await;
        match &outcome {
            Ok(reason) => info!(participant = %self.address, reason = ?reason, "participant stopped"),
            Err(e) => warn!(participant = %self.address, error = %e, "participant failed"),
        }
        outcome
    }

    /// NAMING: query the provider for an identity name.
    ///
    /// Unlike every later state, failure here is unrecoverable -- a
    /// participant that cannot even request its name cannot proceed.
    async fn naming(
        &mut self,
        shutdown: &mut watch::Receiver<bool>,
    ) -> Result<Transition, ParticipantError> {
        let context = prompts::naming_request(self.personality);
        let (query, correlation) = Envelope::query(
            self.address.clone(),
            self.config.provider.clone(),
            Payload::Context(context),
        );
        self.post
            .deliver(query)
            .await
            .map_err(|source| ParticipantError::NamingSend { source })?;

        let pending = PendingRequest::new(
            self.config.provider.clone(),
            RequestKind::Name,
            correlation,
            self.config.generate_timeout,
        );
        match pending::await_reply(&mut self.mailbox, &pending, shutdown).await {
            ReplyOutcome::Reply(Payload::Entry(entry)) => {
                let name = entry.content.trim().to_owned();
                if name.is_empty() {
                    return Err(ParticipantError::NamingFailed {
                        reason: "provider returned a blank name".to_owned(),
                    });
                }
                info!(participant = %self.address, name = name, "identity chosen");
                self.identity = Some(ParticipantIdentity::new(name, self.personality));
                if !self.pause(shutdown).await {
                    return Ok(Transition::Stop(StopReason::Cancelled));
                }
                Ok(Transition::To(ParticipantState::Joining))
            }
            ReplyOutcome::Reply(_) | ReplyOutcome::TimedOut => {
                Err(ParticipantError::NamingFailed {
                    reason: "no naming reply within the deadline".to_owned(),
                })
            }
            ReplyOutcome::Cancelled => Ok(Transition::Stop(StopReason::Cancelled)),
            ReplyOutcome::MailboxClosed => Ok(Transition::Stop(StopReason::MailboxClosed)),
        }
    }

    /// JOINING: reset the cursor, optionally announce entry to the room.
    async fn joining(&mut self) -> Result<Transition, ParticipantError> {
        self.cursor = 0;

        if self.config.announce_join {
            let name = self.display_name();
            let notice = ChatEntry::system(format!("{name} has entered the room"));
            let inform = Envelope::inform(
                self.address.clone(),
                self.config.room.clone(),
                Payload::Entry(notice),
            );
            info!(participant = %self.address, name = name, "announcing entry");
            self.post
                .deliver(inform)
                .await
                .map_err(|source| ParticipantError::JoinAnnounce { source })?;
        }

        Ok(Transition::To(ParticipantState::Fetching))
    }

    /// FETCHING: pull everything after the cursor; on timeout, retry.
    async fn fetching(&mut self, shutdown: &mut watch::Receiver<bool>) -> Transition {
        let (query, correlation) = Envelope::query(
            self.address.clone(),
            self.config.room.clone(),
            Payload::CursorQuery(self.cursor),
        );
        debug!(participant = %self.address, cursor = self.cursor, "fetching since cursor");

        if let Err(e) = self.post.deliver(query).await {
            warn!(participant = %self.address, error = %e, "fetch query send failed, retrying");
            return self.pause_then(shutdown, ParticipantState::Fetching).await;
        }

        let pending = PendingRequest::new(
            self.config.room.clone(),
            RequestKind::Fetch,
            correlation,
            self.config.fetch_timeout,
        );
        match pending::await_reply(&mut self.mailbox, &pending, shutdown).await {
            ReplyOutcome::Reply(Payload::Entries(entries)) => {
                let count = u64::try_from(entries.len()).unwrap_or(u64::MAX);
                self.cursor = self.cursor.saturating_add(count);

                if entries.is_empty() {
                    debug!(participant = %self.address, "room quiet, adding filler line");
                    self.memory.push(prompts::filler_entry());
                } else {
                    debug!(
                        participant = %self.address,
                        new_entries = entries.len(),
                        cursor = self.cursor,
                        "merged new entries into memory"
                    );
                    self.memory.extend(entries);
                }

                self.pause_then(shutdown, ParticipantState::Generating).await
            }
            ReplyOutcome::Reply(_) | ReplyOutcome::TimedOut => {
                warn!(
                    participant = %self.address,
                    room = %self.config.room,
                    "fetch reply timed out, retrying"
                );
                self.pause_then(shutdown, ParticipantState::Fetching).await
            }
            ReplyOutcome::Cancelled => Transition::Stop(StopReason::Cancelled),
            ReplyOutcome::MailboxClosed => Transition::Stop(StopReason::MailboxClosed),
        }
    }

    /// GENERATING: ask the provider for a reply to the current context.
    ///
    /// An empty reply is the provider's "pass": the turn is abandoned and
    /// the loop goes back to reading the room, memory untouched.
    async fn generating(&mut self, shutdown: &mut watch::Receiver<bool>) -> Transition {
        let mut context = match (self.config.kind, &self.identity) {
            (ParticipantKind::Automated, Some(identity)) => prompts::framing(identity),
            _ => Vec::new(),
        };
        context.extend(self.memory.snapshot());

        let (query, correlation) = Envelope::query(
            self.address.clone(),
            self.config.provider.clone(),
            Payload::Context(context),
        );
        if let Err(e) = self.post.deliver(query).await {
            warn!(participant = %self.address, error = %e, "generate query send failed");
            return self.pause_then(shutdown, ParticipantState::Fetching).await;
        }

        let pending = PendingRequest::new(
            self.config.provider.clone(),
            RequestKind::Generate,
            correlation,
            self.config.generate_timeout,
        );
        match pending::await_reply(&mut self.mailbox, &pending, shutdown).await {
            ReplyOutcome::Reply(Payload::Entry(entry)) if !entry.is_blank() => {
                self.memory.push(ChatEntry::assistant(entry.content));
                Transition::To(ParticipantState::Publishing)
            }
            ReplyOutcome::Reply(_) => {
                debug!(participant = %self.address, "provider passed, abandoning this turn");
                self.pause_then(shutdown, ParticipantState::Fetching).await
            }
            ReplyOutcome::TimedOut => {
                warn!(
                    participant = %self.address,
                    provider = %self.config.provider,
                    "generation reply timed out"
                );
                self.pause_then(shutdown, ParticipantState::Fetching).await
            }
            ReplyOutcome::Cancelled => Transition::Stop(StopReason::Cancelled),
            ReplyOutcome::MailboxClosed => Transition::Stop(StopReason::MailboxClosed),
        }
    }

    /// PUBLISHING: publish the newest memory entry to the room, unless it
    /// is the synthetic filler. Send failure is non-fatal.
    async fn publishing(&mut self, shutdown: &mut watch::Receiver<bool>) -> Transition {
        let Some(last) = self.memory.latest().cloned() else {
            return Transition::To(ParticipantState::Fetching);
        };

        if !prompts::is_filler(&last) {
            let name = self.display_name();
            let published =
                ChatEntry::user(format!("{name}: {}", last.content)).spoken_by(name);
            let inform = Envelope::inform(
                self.address.clone(),
                self.config.room.clone(),
                Payload::Entry(published),
            );
            if let Err(e) = self.post.deliver(inform).await {
                warn!(participant = %self.address, error = %e, "publish failed, continuing");
            }
            if !self.pause(shutdown).await {
                return Transition::Stop(StopReason::Cancelled);
            }
        }

        Transition::To(ParticipantState::Fetching)
    }

    /// The display name, blank until naming completes.
    fn display_name(&self) -> String {
        self.identity
            .as_ref()
            .map(|i| i.name.clone())
            .unwrap_or_default()
    }

    /// Jittered cooperative pause; returns `false` if shutdown fired.
    async fn pause(&mut self, shutdown: &mut watch::Receiver<bool>) -> bool {
        let delay = jitter(
            &mut self.rng,
            self.config.wait_period,
            self.config.wait_variance,
        );
        if delay.is_zero() {
            return true;
        }
        tokio::select! {
            _ = shutdown.changed() => false,
            () = tokio::time::sleep(delay) => true,
        }
    }

    /// Pause, then continue to `next` (or stop if shutdown fired).
    async fn pause_then(
        &mut self,
        shutdown: &mut watch::Receiver<bool>,
        next: ParticipantState,
    ) -> Transition {
        if self.pause(shutdown).await {
            Transition::To(next)
        } else {
            Transition::Stop(StopReason::Cancelled)
        }
    }
}
