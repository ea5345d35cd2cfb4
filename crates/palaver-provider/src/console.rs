//! The interactive console provider.
//!
//! Backs a human-driven participant: naming queries turn into a name
//! prompt on stdout, generation queries clear the screen, reprint the
//! lines the participant has seen, and wait for a typed reply. An empty
//! reply is a pass.
//!
//! Slash commands are handled locally and never reach the room:
//!
//! - `/help` -- list the commands
//! - `/vote` -- placeholder, voting is not wired up yet
//! - `/bye`, `/exit`, `/quit` -- leave the simulation
//!
//! The task finishes when the human leaves; the engine treats that
//! completion as the shutdown trigger for everything else.

use tokio::io::{AsyncBufReadExt, BufReader, Lines, Stdin};
use tokio::sync::watch;
use tracing::{info, warn};

use palaver_post::{Mailbox, PostOffice};
use palaver_types::{Address, ChatEntry, Envelope, Intent, Payload, Role};

use crate::error::ProviderError;

/// ANSI clear-screen-and-home sequence, written before each redraw.
const CLEAR_SCREEN: &str = "\x1b[2J\x1b[H";

/// A provider that answers queries by asking the person at the terminal.
pub struct ConsoleProvider {
    address: Address,
    post: PostOffice,
    mailbox: Mailbox,
    lines: Lines<BufReader<Stdin>>,
    named: bool,
}

impl ConsoleProvider {
    /// Register a console provider under `address` on the given broker.
    pub async fn register(post: &PostOffice, address: Address) -> Self {
        let mailbox = post.register(address.clone()).await;
        info!(provider = %address, "console provider registered");
        Self {
            address,
            post: post.clone(),
            mailbox,
            lines: BufReader::new(tokio::io::stdin()).lines(),
            named: false,
        }
    }

    /// Serve queries until the human leaves or shutdown fires.
    ///
    /// # Errors
    ///
    /// Returns [`ProviderError::ConsoleRead`] if stdin fails mid-session.
    pub async fn run(
        mut self,
        mut shutdown: watch::Receiver<bool>,
    ) -> Result<(), ProviderError> {
        let outcome = loop {
            tokio::select! {
                _ = shutdown.changed() => break Ok(()),
                envelope = self.mailbox.recv() => match envelope {
                    Some(envelope) => match self.handle(envelope).await {
                        Ok(true) => {}
                        Ok(false) => break Ok(()),
                        Err(e) => break Err(e),
                    },
                    None => break Ok(()),
                },
            }
        };
        self.post.unregister(&self.address).await;
        info!(provider = %self.address, "console provider stopped");
        outcome
    }

    /// Answer one query. Returns `Ok(false)` when the human typed a
    /// leave command.
    async fn handle(&mut self, envelope: Envelope) -> Result<bool, ProviderError> {
        let (Intent::Query, Payload::Context(context)) = (envelope.intent, &envelope.payload)
        else {
            warn!(
                provider = %self.address,
                sender = %envelope.sender,
                kind = envelope.payload.kind(),
                "malformed envelope dropped"
            );
            return Ok(true);
        };

        let reply_content = if self.named {
            redraw(context);
            match self.read_chat_line().await? {
                Some(line) => line,
                None => {
                    // Pass the turn so the participant is not left waiting,
                    // then report the leave upward.
                    self.reply(&envelope, String::new()).await;
                    return Ok(false);
                }
            }
        } else {
            let name = self.read_name().await?;
            self.named = true;
            name
        };

        self.reply(&envelope, reply_content).await;
        Ok(true)
    }

    /// Prompt for a display name until a valid one is typed.
    async fn read_name(&mut self) -> Result<String, ProviderError> {
        loop {
            println!("Choose a name (one word, no '/'): ");
            let Some(line) = self.next_line().await? else {
                // stdin closed before a name was given; the participant's
                // naming timeout will take it from here.
                return Ok(String::new());
            };
            let name = line.trim();
            if name.is_empty() {
                println!("A name cannot be empty.");
            } else if name.contains(char::is_whitespace) {
                println!("A name must be a single word.");
            } else if name.contains('/') {
                println!("A name cannot contain '/'.");
            } else {
                return Ok(name.to_owned());
            }
        }
    }

    /// Prompt for a chat line, handling slash commands locally.
    ///
    /// Returns `Ok(None)` when the human wants to leave.
    async fn read_chat_line(&mut self) -> Result<Option<String>, ProviderError> {
        loop {
            println!("> ");
            let Some(line) = self.next_line().await? else {
                return Ok(None);
            };
            let line = line.trim();
            match line {
                "/bye" | "/exit" | "/quit" => return Ok(None),
                "/help" => {
                    println!("Commands: /help, /vote, /bye (also /exit, /quit).");
                    println!("An empty line passes your turn.");
                }
                "/vote" => {
                    println!("Voting is not available yet.");
                }
                other if other.starts_with('/') => {
                    println!("Unknown command '{other}'. Try /help.");
                }
                other => return Ok(Some(other.to_owned())),
            }
        }
    }

    async fn next_line(&mut self) -> Result<Option<String>, ProviderError> {
        self.lines
            .next_line()
            .await
            .map_err(|source| ProviderError::ConsoleRead { source })
    }

    /// Send the reply back to the querying participant.
    async fn reply(&self, query: &Envelope, content: String) {
        let reply = Envelope::reply_to(
            query,
            self.address.clone(),
            Payload::Entry(ChatEntry::assistant(content)),
        );
        if let Err(e) = self.post.deliver(reply).await {
            warn!(provider = %self.address, error = %e, "reply delivery failed");
        }
    }
}

/// Clear the terminal and reprint the whole visible context.
fn redraw(context: &[ChatEntry]) {
    print!("{CLEAR_SCREEN}");
    for line in visible_lines(context) {
        println!("{line}");
    }
}

/// The context lines shown to the human, in order. Assistant entries
/// are the participant's own unpublished replies and stay hidden;
/// everything else is kept, repeats included.
fn visible_lines(context: &[ChatEntry]) -> Vec<&str> {
    context
        .iter()
        .filter(|entry| entry.role != Role::Assistant)
        .map(|entry| entry.content.as_str())
        .collect()
}
