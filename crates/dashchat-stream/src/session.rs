//! Stream session controller: drives one chat turn from request to terminal
//! state.
//!
//! ```text
//! idle -> sending -> streaming -> completed
//!            |           |------> failed     (error frame, transport failure)
//!            |---------------------> failed  (rejected, no credential, network)
//! sending | streaming -> cancelled           (abort)
//! ```
//!
//! The controller suspends only while waiting for response headers and for
//! each body read. Frames decoded from one read are applied in order before
//! the next read is issued, and the abort flag is checked before each one.
//! Dropping the `start` future mid-turn (a timeout, a losing `select!` arm)
//! finalizes the session as cancelled.

use std::fmt;
use std::sync::Arc;

use futures::StreamExt as _;
use tokio::sync::{mpsc, watch};
use tracing::{debug, info, instrument, warn};

use crate::client::ClientInner;
use crate::decoder::FrameDecoder;
use crate::errors::{SessionError, SessionFailure, TransportError};
use crate::event::SessionEvent;
use crate::frame::Frame;
use crate::message::{Message, Transcript};
use crate::transport::{ByteStream, ChatRequest};

const IN_BAND_ERROR_PREFIX: &str = "⚠️ Error: ";
const IN_BAND_ERROR_FALLBACK: &str = "the assistant reported an error";
const TRANSPORT_FAILURE_NOTICE: &str =
    "⚠️ Connection interrupted before the response finished. Please try again.";

/// Lifecycle of a single chat turn.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, serde::Serialize, serde::Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SessionState {
    Idle,
    Sending,
    Streaming,
    Completed,
    Cancelled,
    Failed,
}

impl SessionState {
    pub fn as_str(self) -> &'static str {
        match self {
            SessionState::Idle => "idle",
            SessionState::Sending => "sending",
            SessionState::Streaming => "streaming",
            SessionState::Completed => "completed",
            SessionState::Cancelled => "cancelled",
            SessionState::Failed => "failed",
        }
    }

    /// `completed`, `failed` and `cancelled` admit no further transitions.
    pub fn is_terminal(self) -> bool {
        matches!(
            self,
            SessionState::Completed | SessionState::Cancelled | SessionState::Failed
        )
    }

    /// True while a request is in flight.
    pub fn is_active(self) -> bool {
        matches!(self, SessionState::Sending | SessionState::Streaming)
    }
}

impl fmt::Display for SessionState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Handle used to cancel a running session from elsewhere.
#[derive(Clone)]
pub struct AbortHandle {
    tx: watch::Sender<bool>,
}

impl AbortHandle {
    /// Requests cancellation.
    ///
    /// Observed at the session's next suspension point and before each
    /// buffered frame; effects already applied are kept. Has no effect on a
    /// session that has not started or has already finished.
    pub fn abort(&self) {
        let _ = self.tx.send(true);
    }
}

enum Step {
    Abort,
    Read(Option<Result<bytes::Bytes, TransportError>>),
}

/// Controller for one chat turn. Single use: `start` runs at most once.
pub struct ChatSession {
    id: uuid::Uuid,
    client: Arc<ClientInner>,
    transcript: Transcript,
    decoder: FrameDecoder,
    state: SessionState,
    assistant_index: Option<usize>,
    failure: Option<SessionFailure>,
    seq: u64,
    abort_tx: watch::Sender<bool>,
    abort_rx: watch::Receiver<bool>,
    events: Option<mpsc::UnboundedSender<SessionEvent>>,
}

impl ChatSession {
    pub(crate) fn new(client: Arc<ClientInner>, transcript: Transcript) -> Self {
        let (abort_tx, abort_rx) = watch::channel(false);
        Self {
            id: uuid::Uuid::new_v4(),
            client,
            transcript,
            decoder: FrameDecoder::new(),
            state: SessionState::Idle,
            assistant_index: None,
            failure: None,
            seq: 0,
            abort_tx,
            abort_rx,
            events: None,
        }
    }

    pub fn id(&self) -> uuid::Uuid {
        self.id
    }

    pub fn state(&self) -> SessionState {
        self.state
    }

    pub fn transcript(&self) -> &Transcript {
        &self.transcript
    }

    pub fn into_transcript(self) -> Transcript {
        self.transcript
    }

    /// Failure recorded when the session ended in `Failed`.
    pub fn failure(&self) -> Option<&SessionFailure> {
        self.failure.as_ref()
    }

    /// Content of the assistant entry this session created, if any.
    pub fn assistant_reply(&self) -> Option<&str> {
        self.assistant_index
            .and_then(|idx| self.transcript.get(idx))
            .map(|m| m.content.as_str())
    }

    /// Returns a handle that can cancel the session while `start` is running.
    pub fn abort_handle(&self) -> AbortHandle {
        AbortHandle {
            tx: self.abort_tx.clone(),
        }
    }

    /// Subscribes to session events. A later call replaces the earlier
    /// subscriber.
    pub fn subscribe(&mut self) -> mpsc::UnboundedReceiver<SessionEvent> {
        let (tx, rx) = mpsc::unbounded_channel();
        self.events = Some(tx);
        rx
    }

    /// Cancels the session if it is sending or streaming.
    ///
    /// While `start` is awaiting, use an [`AbortHandle`] or drop the `start`
    /// future instead.
    pub fn cancel(&mut self) {
        if self.state.is_active() {
            self.finish_cancelled();
        }
    }

    /// Runs the turn for `message` and returns the terminal state.
    ///
    /// The user message is appended to the transcript right away. `Err` is
    /// only returned when the message is blank or the session already ran;
    /// request, stream, and server failures resolve to
    /// `SessionState::Failed` with details in [`ChatSession::failure`].
    pub async fn start(
        &mut self,
        message: impl Into<String>,
    ) -> Result<SessionState, SessionError> {
        let message = message.into();
        if message.trim().is_empty() {
            return Err(SessionError::Validation("message must not be empty".into()));
        }
        if self.state != SessionState::Idle {
            return Err(SessionError::AlreadyStarted { state: self.state });
        }

        // Aborts requested before the turn began do not apply to it.
        self.abort_tx.send_replace(false);

        let mut turn = ActiveTurn { session: self };
        turn.session.run_turn(message).await;
        Ok(turn.session.state)
    }

    #[instrument(name = "chat_session", skip_all, fields(session_id = %self.id))]
    async fn run_turn(&mut self, message: String) {
        let history = self.transcript.messages().to_vec();
        self.transcript.push(Message::user(message.clone()));
        self.transition(SessionState::Sending);

        let Some(credential) = self.client.credentials.credential() else {
            self.fail(SessionFailure::missing_credential());
            return;
        };

        let request = ChatRequest {
            message,
            conversation_history: history,
            current_data: self.client.context.as_ref().and_then(|c| c.snapshot()),
        };
        debug!(
            session_id = %self.id,
            history = request.conversation_history.len(),
            "sending chat request"
        );

        let transport = self.client.transport.clone();
        let opened = tokio::select! {
            biased;
            _ = abort_requested(&mut self.abort_rx) => None,
            opened = transport.open(&request, &credential) => Some(opened),
        };

        match opened {
            None => self.finish_cancelled(),
            Some(Err(err)) => self.fail(err.into()),
            Some(Ok(body)) => {
                self.transition(SessionState::Streaming);
                self.assistant_index = Some(self.transcript.push(Message::assistant("")));
                self.pump(body).await;
            }
        }
    }

    /// Applies one frame to the transcript.
    ///
    /// Only has an effect while streaming; returns whether the frame was
    /// applied.
    pub fn apply_frame(&mut self, frame: Frame) -> bool {
        if self.state != SessionState::Streaming {
            debug!(
                session_id = %self.id,
                state = %self.state,
                "ignoring frame outside streaming"
            );
            return false;
        }
        let Some(idx) = self.assistant_index else {
            return false;
        };

        match frame {
            Frame::Content(text) => {
                if text.is_empty() {
                    return true;
                }
                self.transcript.append_content(idx, &text);
                let seq = self.seq;
                self.seq = self.seq.saturating_add(1);
                debug!(session_id = %self.id, seq, "content delta");
                self.emit(SessionEvent::ContentDelta {
                    session_id: self.id,
                    seq,
                    text,
                });
            }
            Frame::End => {
                self.transition(SessionState::Completed);
                let content = self.assistant_reply().unwrap_or_default().to_string();
                info!(session_id = %self.id, chars = content.len(), "chat session completed");
                if let Some(narrator) = &self.client.narrator {
                    narrator.speak(&content);
                }
                self.emit(SessionEvent::Completed {
                    session_id: self.id,
                    content,
                });
            }
            Frame::Error(message) => {
                let message = message.unwrap_or_else(|| IN_BAND_ERROR_FALLBACK.to_string());
                self.transcript
                    .replace_content(idx, format!("{IN_BAND_ERROR_PREFIX}{message}"));
                self.fail(SessionFailure::InBand { message });
            }
        }
        true
    }

    async fn pump(&mut self, mut body: ByteStream) {
        loop {
            let step = tokio::select! {
                biased;
                _ = abort_requested(&mut self.abort_rx) => Step::Abort,
                next = body.next() => Step::Read(next),
            };

            match step {
                Step::Abort => {
                    self.finish_cancelled();
                    return;
                }
                Step::Read(Some(Ok(chunk))) => {
                    let frames = self.decoder.feed(&chunk);
                    if self.apply_batch(frames) {
                        return;
                    }
                }
                Step::Read(Some(Err(err))) => {
                    self.fail_after_accept(SessionFailure::from(err));
                    return;
                }
                Step::Read(None) => {
                    let frames = self.decoder.flush();
                    if self.apply_batch(frames) {
                        return;
                    }
                    self.fail_after_accept(SessionFailure::Transport {
                        message: "response ended before an end event".into(),
                    });
                    return;
                }
            }
        }
    }

    /// Applies decoded frames in order; returns true once the session is over.
    fn apply_batch(&mut self, frames: Vec<Frame>) -> bool {
        for frame in frames {
            if *self.abort_rx.borrow() {
                self.finish_cancelled();
                return true;
            }
            self.apply_frame(frame);
            if self.state.is_terminal() {
                return true;
            }
        }
        false
    }

    fn fail_after_accept(&mut self, failure: SessionFailure) {
        if let Some(idx) = self.assistant_index {
            let partial = self.assistant_reply().unwrap_or_default();
            let content = if partial.is_empty() {
                TRANSPORT_FAILURE_NOTICE.to_string()
            } else {
                format!("{partial}\n\n{TRANSPORT_FAILURE_NOTICE}")
            };
            self.transcript.replace_content(idx, content);
        }
        self.fail(failure);
    }

    fn fail(&mut self, failure: SessionFailure) {
        warn!(session_id = %self.id, error = %failure, "chat session failed");
        self.transition(SessionState::Failed);
        self.failure = Some(failure.clone());
        self.emit(SessionEvent::Failed {
            session_id: self.id,
            failure,
        });
    }

    fn finish_cancelled(&mut self) {
        info!(session_id = %self.id, "chat session cancelled");
        self.transition(SessionState::Cancelled);
        let partial = self.assistant_reply().unwrap_or_default().to_string();
        self.emit(SessionEvent::Cancelled {
            session_id: self.id,
            partial,
        });
    }

    fn transition(&mut self, next: SessionState) {
        debug!(session_id = %self.id, from = %self.state, to = %next, "session state change");
        self.state = next;
        self.emit(SessionEvent::StateChanged {
            session_id: self.id,
            state: next,
        });
    }

    fn emit(&self, event: SessionEvent) {
        if let Some(tx) = &self.events {
            let _ = tx.send(event);
        }
    }
}

/// Exclusive borrow of a session for the length of one `start` call.
///
/// If the call is dropped while the turn is still active, the session is
/// finalized as cancelled so it never stays in `sending` or `streaming`.
struct ActiveTurn<'a> {
    session: &'a mut ChatSession,
}

impl Drop for ActiveTurn<'_> {
    fn drop(&mut self) {
        if self.session.state.is_active() {
            debug!(session_id = %self.session.id, "start dropped before the turn finished");
            self.session.finish_cancelled();
        }
    }
}

/// Resolves once an abort has been requested.
async fn abort_requested(rx: &mut watch::Receiver<bool>) {
    loop {
        if *rx.borrow_and_update() {
            return;
        }
        if rx.changed().await.is_err() {
            return futures::future::pending().await;
        }
    }
}
