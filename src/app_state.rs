use std::sync::Arc;

use crossterm::event::KeyCode;
use tokio::sync::{mpsc, watch};
use tracing::{debug, error, info};

use crate::chat::{ChatBackend, ChatError, ChatReply};
use crate::constants::{BOT_LABEL, SEND_FAILED_REPLY, USER_LABEL};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Sender {
    User,
    Bot,
}

impl Sender {
    pub fn label(self) -> &'static str {
        match self {
            Sender::User => USER_LABEL,
            Sender::Bot => BOT_LABEL,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Message {
    sender: Sender,
    text: String,
}

impl Message {
    pub fn user(text: impl Into<String>) -> Self {
        Self {
            sender: Sender::User,
            text: text.into(),
        }
    }

    pub fn bot(text: impl Into<String>) -> Self {
        Self {
            sender: Sender::Bot,
            text: text.into(),
        }
    }

    pub fn sender(&self) -> Sender {
        self.sender
    }

    pub fn text(&self) -> &str {
        &self.text
    }
}

/// Messages in display order. Entries can be appended but never touched again.
#[derive(Debug, Default, Clone)]
pub struct ChatHistory {
    messages: Vec<Message>,
}

impl ChatHistory {
    pub fn push(&mut self, message: Message) {
        self.messages.push(message);
    }

    pub fn len(&self) -> usize {
        self.messages.len()
    }

    pub fn is_empty(&self) -> bool {
        self.messages.is_empty()
    }

    pub fn last(&self) -> Option<&Message> {
        self.messages.last()
    }

    pub fn as_slice(&self) -> &[Message] {
        &self.messages
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct RequestId(pub u64);

impl std::fmt::Display for RequestId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "#{}", self.0)
    }
}

/// Result of one finished send, queued for the event loop to apply.
#[derive(Debug)]
pub enum ChatUpdate {
    ReplyReceived { request: RequestId, reply: ChatReply },
    SendFailed { request: RequestId, error: ChatError },
}

impl ChatUpdate {
    pub fn request(&self) -> RequestId {
        match self {
            ChatUpdate::ReplyReceived { request, .. } | ChatUpdate::SendFailed { request, .. } => {
                *request
            }
        }
    }
}

/// Session state of the chat widget.
///
/// All mutation happens on the task that owns the widget. Sends run as
/// spawned tasks and report back through an internal queue, which is
/// drained with [`ChatWidget::process_updates`] or [`ChatWidget::next_update`].
pub struct ChatWidget<B> {
    draft: String,
    history: ChatHistory,
    last_reply: String,
    backend: Arc<B>,
    next_request: u64,
    in_flight: usize,
    updates_tx: mpsc::UnboundedSender<ChatUpdate>,
    updates_rx: mpsc::UnboundedReceiver<ChatUpdate>,
    revision: watch::Sender<u64>,
}

impl<B> ChatWidget<B> {
    pub fn new(backend: B) -> Self {
        Self::with_shared_backend(Arc::new(backend))
    }

    pub fn with_shared_backend(backend: Arc<B>) -> Self {
        let (updates_tx, updates_rx) = mpsc::unbounded_channel();
        let (revision, _) = watch::channel(0);
        Self {
            draft: String::new(),
            history: ChatHistory::default(),
            last_reply: String::new(),
            backend,
            next_request: 0,
            in_flight: 0,
            updates_tx,
            updates_rx,
            revision,
        }
    }

    pub fn draft(&self) -> &str {
        &self.draft
    }

    pub fn history(&self) -> &ChatHistory {
        &self.history
    }

    pub fn last_reply(&self) -> &str {
        &self.last_reply
    }

    pub fn in_flight(&self) -> usize {
        self.in_flight
    }

    /// Receiver whose value changes whenever the widget state does.
    pub fn subscribe(&self) -> watch::Receiver<u64> {
        self.revision.subscribe()
    }

    pub fn update_draft(&mut self, text: impl Into<String>) {
        let text = text.into();
        if text != self.draft {
            self.draft = text;
            self.notify();
        }
    }

    /// Applies every completion that has already arrived, oldest first.
    pub fn process_updates(&mut self) -> usize {
        let mut applied = 0;
        while let Ok(update) = self.updates_rx.try_recv() {
            self.apply_update(update);
            applied += 1;
        }
        applied
    }

    /// Waits for the next completion without applying it.
    pub async fn next_update(&mut self) -> Option<ChatUpdate> {
        self.updates_rx.recv().await
    }

    pub fn apply_update(&mut self, update: ChatUpdate) {
        self.in_flight = self.in_flight.saturating_sub(1);
        match update {
            ChatUpdate::ReplyReceived { request, reply } => {
                debug!(%request, "Applying chat reply");
                self.last_reply = reply.response.clone();
                self.history.push(Message::bot(reply.response));
                self.draft.clear();
            }
            ChatUpdate::SendFailed { request, error } => {
                error!(%request, error = ?error, "Failed to send message to chat backend");
                self.history.push(Message::bot(SEND_FAILED_REPLY));
            }
        }
        self.notify();
    }

    fn notify(&self) {
        self.revision.send_modify(|revision| *revision += 1);
    }
}

impl<B: ChatBackend> ChatWidget<B> {
    /// Sends the current draft unless it is blank.
    ///
    /// The user entry is in the history when this returns. The backend call
    /// runs on a spawned task, so this must be called inside a tokio runtime.
    pub fn submit_draft(&mut self) -> Option<RequestId> {
        if self.draft.trim().is_empty() {
            debug!("Ignoring submit of blank draft");
            return None;
        }

        let message = self.draft.clone();
        let request = RequestId(self.next_request);
        self.next_request += 1;

        self.history.push(Message::user(message.clone()));
        self.in_flight += 1;
        self.notify();

        info!(%request, len = message.len(), "Sending message to chat backend");

        let backend = Arc::clone(&self.backend);
        let tx = self.updates_tx.clone();
        tokio::spawn(async move {
            let update = match backend.send_message(message).await {
                Ok(reply) => ChatUpdate::ReplyReceived { request, reply },
                Err(error) => ChatUpdate::SendFailed { request, error },
            };
            if tx.send(update).is_err() {
                debug!(%request, "Chat widget dropped before reply arrived");
            }
        });

        Some(request)
    }

    /// Enter sends the draft; every other key is left to the text input.
    pub fn handle_key_trigger(&mut self, key: KeyCode) -> Option<RequestId> {
        match key {
            KeyCode::Enter => self.submit_draft(),
            _ => None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::VecDeque;
    use std::sync::Mutex;

    /// Replies from a fixed script and records what it was asked.
    #[derive(Default)]
    struct ScriptedBackend {
        replies: Mutex<VecDeque<Result<ChatReply, ChatError>>>,
        received: Mutex<Vec<String>>,
    }

    impl ScriptedBackend {
        fn replying(replies: Vec<Result<ChatReply, ChatError>>) -> Self {
            Self {
                replies: Mutex::new(replies.into()),
                received: Mutex::new(Vec::new()),
            }
        }
    }

    impl ChatBackend for ScriptedBackend {
        async fn send_message(&self, message: String) -> Result<ChatReply, ChatError> {
            self.received.lock().unwrap().push(message);
            self.replies
                .lock()
                .unwrap()
                .pop_front()
                .expect("scripted backend ran out of replies")
        }
    }

    fn server_error() -> ChatError {
        ChatError::Status {
            status: reqwest::StatusCode::INTERNAL_SERVER_ERROR,
            body: "boom".to_string(),
        }
    }

    async fn settle<B: ChatBackend>(widget: &mut ChatWidget<B>) {
        let update = widget.next_update().await.unwrap();
        widget.apply_update(update);
    }

    #[tokio::test]
    async fn test_successful_send() {
        let backend = Arc::new(ScriptedBackend::replying(vec![Ok(ChatReply::text("¡Hola!"))]));
        let mut widget = ChatWidget::with_shared_backend(Arc::clone(&backend));

        widget.update_draft("hola");
        assert_eq!(widget.submit_draft(), Some(RequestId(0)));
        settle(&mut widget).await;

        assert_eq!(
            widget.history().as_slice(),
            &[Message::user("hola"), Message::bot("¡Hola!")]
        );
        assert_eq!(widget.draft(), "");
        assert_eq!(widget.last_reply(), "¡Hola!");
        assert_eq!(widget.in_flight(), 0);
        assert_eq!(*backend.received.lock().unwrap(), vec!["hola".to_string()]);
    }

    #[tokio::test]
    async fn test_blank_draft_is_ignored() {
        let backend = Arc::new(ScriptedBackend::default());
        let mut widget = ChatWidget::with_shared_backend(Arc::clone(&backend));

        for blank in ["", "   ", "\t\n "] {
            widget.update_draft(blank);
            assert_eq!(widget.submit_draft(), None);
            assert!(widget.history().is_empty());
            assert_eq!(widget.draft(), blank);
        }

        tokio::task::yield_now().await;
        assert!(backend.received.lock().unwrap().is_empty());
        assert_eq!(widget.in_flight(), 0);
    }

    #[tokio::test]
    async fn test_failed_send_keeps_draft() {
        let mut widget = ChatWidget::new(ScriptedBackend::replying(vec![Err(server_error())]));

        widget.update_draft("test");
        widget.submit_draft();
        settle(&mut widget).await;

        assert_eq!(
            widget.history().as_slice(),
            &[Message::user("test"), Message::bot(SEND_FAILED_REPLY)]
        );
        assert_eq!(widget.draft(), "test");
        assert_eq!(widget.last_reply(), "");
    }

    #[tokio::test]
    async fn test_user_entry_appended_before_reply() {
        let mut widget = ChatWidget::new(ScriptedBackend::replying(vec![Ok(ChatReply::text("ok"))]));

        widget.update_draft("  padded  ");
        widget.submit_draft();

        // Nothing has been applied yet; the user entry is already there, untrimmed.
        assert_eq!(widget.history().as_slice(), &[Message::user("  padded  ")]);
        assert_eq!(widget.in_flight(), 1);

        settle(&mut widget).await;
        assert_eq!(widget.history().len(), 2);
    }

    #[tokio::test]
    async fn test_enter_key_triggers_submit() {
        let mut widget = ChatWidget::new(ScriptedBackend::replying(vec![Ok(ChatReply::text("ok"))]));
        widget.update_draft("hola");

        assert_eq!(widget.handle_key_trigger(KeyCode::Char('x')), None);
        assert_eq!(widget.handle_key_trigger(KeyCode::Tab), None);
        assert!(widget.history().is_empty());

        assert!(widget.handle_key_trigger(KeyCode::Enter).is_some());
        assert_eq!(widget.history().len(), 1);
    }

    #[tokio::test]
    async fn test_history_is_append_only() {
        let mut widget = ChatWidget::new(ScriptedBackend::replying(vec![
            Ok(ChatReply::text("uno")),
            Err(server_error()),
            Ok(ChatReply::text("tres")),
        ]));

        let mut seen: Vec<Message> = Vec::new();
        for draft in ["a", " ", "b", "", "c"] {
            widget.update_draft(draft);
            if widget.submit_draft().is_some() {
                settle(&mut widget).await;
            }
            let current = widget.history().as_slice();
            assert!(current.len() >= seen.len());
            assert_eq!(&current[..seen.len()], seen.as_slice());
            seen = current.to_vec();
        }
        assert_eq!(seen.len(), 6);
    }

    #[tokio::test]
    async fn test_subscribers_see_changes() {
        let mut widget = ChatWidget::new(ScriptedBackend::replying(vec![Ok(ChatReply::text("ok"))]));
        let mut changes = widget.subscribe();
        assert!(!changes.has_changed().unwrap());

        widget.update_draft("hola");
        assert!(changes.has_changed().unwrap());
        changes.borrow_and_update();

        widget.update_draft("hola");
        assert!(!changes.has_changed().unwrap());

        widget.submit_draft();
        assert!(changes.has_changed().unwrap());
        changes.borrow_and_update();

        settle(&mut widget).await;
        assert!(changes.has_changed().unwrap());
    }

    #[tokio::test]
    async fn test_process_updates_drains_queue() {
        let mut widget = ChatWidget::new(ScriptedBackend::replying(vec![
            Ok(ChatReply::text("uno")),
            Ok(ChatReply::text("dos")),
        ]));
        assert_eq!(widget.process_updates(), 0);

        widget.update_draft("a");
        widget.submit_draft();
        widget.update_draft("b");
        widget.submit_draft();
        assert_eq!(widget.in_flight(), 2);

        let mut applied = 0;
        while applied < 2 {
            tokio::task::yield_now().await;
            applied += widget.process_updates();
        }
        assert_eq!(widget.history().len(), 4);
        assert_eq!(widget.in_flight(), 0);
    }

    #[tokio::test]
    async fn test_reply_after_widget_dropped() {
        let backend = Arc::new(ScriptedBackend::replying(vec![Ok(ChatReply::text("late"))]));
        {
            let mut widget = ChatWidget::with_shared_backend(Arc::clone(&backend));
            widget.update_draft("bye");
            widget.submit_draft();
        }
        // The spawned send still runs to completion without a widget to report to.
        for _ in 0..10 {
            tokio::task::yield_now().await;
        }
        assert_eq!(*backend.received.lock().unwrap(), vec!["bye".to_string()]);
    }
}
