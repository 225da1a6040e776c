use tokio::task::JoinHandle;

use crate::client::ChatClient;
use crate::transcript::{BotReply, Transcript};

pub struct App {
    // Core state
    pub should_quit: bool,

    // Input state
    pub input: String,
    pub cursor: usize, // cursor position in input, in chars

    // Transcript state
    pub transcript: Transcript,
    pub reply_task: Option<JoinHandle<anyhow::Result<BotReply>>>,

    // Chat panel state
    pub scroll: u16,
    pub chat_height: u16, // Height of chat area for scroll calculations
    pub chat_width: u16,  // Width of chat area for wrap calculations

    // Animation state
    pub animation_frame: u8, // 0-2 for ellipsis animation

    // Backend
    pub client: ChatClient,
}

impl App {
    pub fn new(client: ChatClient) -> Self {
        Self {
            should_quit: false,

            input: String::new(),
            cursor: 0,

            transcript: Transcript::new(),
            reply_task: None,

            scroll: 0,
            chat_height: 0,
            chat_width: 0,

            animation_frame: 0,

            client,
        }
    }

    /// Whether a request is currently in flight
    pub fn is_waiting(&self) -> bool {
        self.reply_task.is_some()
    }

    /// Submit the current input buffer as a chat message.
    ///
    /// Whitespace-only input is a silent no-op. While a reply is pending the
    /// submission is refused, so at most one request is ever in flight and the
    /// transcript never holds more than one pending entry.
    pub fn submit_message(&mut self) {
        let message = self.input.trim().to_string();
        if message.is_empty() || self.reply_task.is_some() {
            return;
        }

        self.input.clear();
        self.cursor = 0;

        self.transcript.push_user(&message);
        self.transcript.push_pending();

        // Scroll so "Thinking..." is visible
        self.scroll_to_bottom();

        // Spawn background task to query the backend; the event loop polls it
        let client = self.client.clone();
        self.reply_task = Some(tokio::spawn(async move { client.send(&message).await }));
    }

    /// Resolve the in-flight request if it has settled.
    ///
    /// Called from the event loop on every iteration; the tick timer
    /// guarantees it runs shortly after the task finishes. Each submission is
    /// settled exactly once because the handle is taken before joining.
    pub async fn poll_reply(&mut self) {
        let finished = self
            .reply_task
            .as_ref()
            .map(|task| task.is_finished())
            .unwrap_or(false);
        if !finished {
            return;
        }

        if let Some(task) = self.reply_task.take() {
            match task.await {
                Ok(Ok(reply)) => self.transcript.settle(reply),
                // Transport failure or a panicked task: same generic error entry
                Ok(Err(_)) | Err(_) => self.transcript.settle_failed(),
            }
            self.scroll_to_bottom();
        }
    }

    /// Tick animation frame (called by Tick event)
    pub fn tick_animation(&mut self) {
        if self.transcript.has_pending() {
            self.animation_frame = (self.animation_frame + 1) % 3;
        }
    }

    // Chat panel scrolling
    pub fn scroll_down(&mut self) {
        let max_scroll = self
            .transcript_line_count()
            .saturating_sub(self.visible_height());
        if self.scroll < max_scroll {
            self.scroll = self.scroll.saturating_add(1);
        }
    }

    pub fn scroll_up(&mut self) {
        self.scroll = self.scroll.saturating_sub(1);
    }

    pub fn scroll_half_page_down(&mut self) {
        let half_page = self.visible_height() / 2;
        let max_scroll = self
            .transcript_line_count()
            .saturating_sub(self.visible_height());
        self.scroll = (self.scroll + half_page).min(max_scroll);
    }

    pub fn scroll_half_page_up(&mut self) {
        let half_page = self.visible_height() / 2;
        self.scroll = self.scroll.saturating_sub(half_page);
    }

    /// Scroll the chat panel so the newest entry is visible
    pub fn scroll_to_bottom(&mut self) {
        let total_lines = self.transcript_line_count();
        let visible_height = self.visible_height();

        if total_lines > visible_height {
            self.scroll = total_lines.saturating_sub(visible_height);
        } else {
            self.scroll = 0;
        }
    }

    fn visible_height(&self) -> u16 {
        if self.chat_height > 0 {
            self.chat_height
        } else {
            20
        }
    }

    /// Estimate rendered transcript height for scroll calculations
    fn transcript_line_count(&self) -> u16 {
        // Use actual chat width for wrap calculation, default to 50 if not set
        let wrap_width = if self.chat_width > 0 {
            self.chat_width as usize
        } else {
            50
        };

        let mut total_lines: u16 = 0;

        for entry in self.transcript.entries() {
            total_lines += 1; // Role line ("You:" or "Bot:")
            if entry.text.is_empty() {
                total_lines += 1; // Pending entries render one "Thinking..." line
            }
            for line in entry.text.lines() {
                // Use character count, not byte length, for proper UTF-8 handling
                let char_count = line.chars().count();
                if char_count == 0 {
                    total_lines += 1; // Empty line still takes one line
                } else {
                    total_lines += ((char_count / wrap_width) + 1) as u16;
                }
            }
            total_lines += 1; // Blank line after entry
        }

        total_lines
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::transcript::{
        EntryRole, EntryStatus, NO_RESPONSE_TEXT, SERVER_ERROR_TEXT, TRANSPORT_FAILURE_TEXT,
    };
    use std::time::Duration;

    fn app_for(server: &mockito::ServerGuard) -> App {
        App::new(ChatClient::new(&format!("{}/api/chat", server.url())))
    }

    async fn settle(app: &mut App) {
        while app.reply_task.is_some() {
            app.poll_reply().await;
            tokio::time::sleep(Duration::from_millis(5)).await;
        }
    }

    #[tokio::test]
    async fn submit_appends_user_and_resolved_bot_entry() {
        let mut server = mockito::Server::new_async().await;
        server
            .mock("POST", "/api/chat")
            .with_status(200)
            .with_body(r#"{"response":"hi"}"#)
            .create_async()
            .await;

        let mut app = app_for(&server);
        app.input = "hello".to_string();
        app.submit_message();

        assert!(app.input.is_empty());
        assert!(app.is_waiting());
        assert!(app.transcript.has_pending());

        settle(&mut app).await;

        let entries = app.transcript.entries();
        assert_eq!(entries.len(), 2);
        assert_eq!(entries[0].role, EntryRole::User);
        assert_eq!(entries[0].text, "hello");
        assert_eq!(entries[1].role, EntryRole::Bot);
        assert_eq!(entries[1].status, EntryStatus::Final);
        assert_eq!(entries[1].text, "hi");
    }

    #[tokio::test]
    async fn whitespace_input_is_a_no_op_and_sends_nothing() {
        let mut server = mockito::Server::new_async().await;
        let mock = server
            .mock("POST", "/api/chat")
            .expect(0)
            .create_async()
            .await;

        let mut app = app_for(&server);
        app.input = "   \n  ".to_string();
        app.submit_message();

        assert!(app.transcript.is_empty());
        assert!(!app.is_waiting());
        mock.assert_async().await;
    }

    #[tokio::test]
    async fn server_error_payload_yields_fixed_error_entry() {
        let mut server = mockito::Server::new_async().await;
        server
            .mock("POST", "/api/chat")
            .with_status(200)
            .with_body(r#"{"error":"x"}"#)
            .create_async()
            .await;

        let mut app = app_for(&server);
        app.input = "hello".to_string();
        app.submit_message();
        settle(&mut app).await;

        let bot = &app.transcript.entries()[1];
        assert_eq!(bot.status, EntryStatus::Error);
        assert_eq!(bot.text, SERVER_ERROR_TEXT);
    }

    #[tokio::test]
    async fn empty_payload_yields_no_response_entry() {
        let mut server = mockito::Server::new_async().await;
        server
            .mock("POST", "/api/chat")
            .with_status(200)
            .with_body("{}")
            .create_async()
            .await;

        let mut app = app_for(&server);
        app.input = "hello".to_string();
        app.submit_message();
        settle(&mut app).await;

        let bot = &app.transcript.entries()[1];
        assert_eq!(bot.status, EntryStatus::Final);
        assert_eq!(bot.text, NO_RESPONSE_TEXT);
    }

    #[tokio::test]
    async fn bad_status_yields_transport_failure_entry() {
        let mut server = mockito::Server::new_async().await;
        server
            .mock("POST", "/api/chat")
            .with_status(502)
            .with_body("bad gateway")
            .create_async()
            .await;

        let mut app = app_for(&server);
        app.input = "hello".to_string();
        app.submit_message();
        settle(&mut app).await;

        let entries = app.transcript.entries();
        assert_eq!(entries.len(), 2);
        assert!(!app.transcript.has_pending());
        assert_eq!(entries[1].status, EntryStatus::Error);
        assert_eq!(entries[1].text, TRANSPORT_FAILURE_TEXT);
    }

    #[tokio::test]
    async fn connection_refused_yields_transport_failure_entry() {
        // Nothing listens on this port
        let mut app = App::new(ChatClient::new("http://127.0.0.1:1/api/chat"));
        app.input = "hello".to_string();
        app.submit_message();
        settle(&mut app).await;

        let bot = &app.transcript.entries()[1];
        assert_eq!(bot.status, EntryStatus::Error);
        assert_eq!(bot.text, TRANSPORT_FAILURE_TEXT);
    }

    #[tokio::test]
    async fn second_submit_while_waiting_is_refused() {
        let mut server = mockito::Server::new_async().await;
        let mock = server
            .mock("POST", "/api/chat")
            .with_status(200)
            .with_body(r#"{"response":"hi"}"#)
            .expect(1)
            .create_async()
            .await;

        let mut app = app_for(&server);
        app.input = "first".to_string();
        app.submit_message();

        app.input = "second".to_string();
        app.submit_message();

        // The refused submission leaves its input untouched
        assert_eq!(app.input, "second");

        settle(&mut app).await;

        let entries = app.transcript.entries();
        assert_eq!(entries.len(), 2);
        assert_eq!(entries[0].text, "first");
        mock.assert_async().await;
    }

    #[tokio::test]
    async fn each_submission_settles_exactly_once() {
        let mut server = mockito::Server::new_async().await;
        server
            .mock("POST", "/api/chat")
            .with_status(200)
            .with_body(r#"{"response":"hi"}"#)
            .expect(2)
            .create_async()
            .await;

        let mut app = app_for(&server);
        app.input = "one".to_string();
        app.submit_message();
        settle(&mut app).await;

        // Extra polls after settling must not add entries
        app.poll_reply().await;
        app.poll_reply().await;
        assert_eq!(app.transcript.entries().len(), 2);

        app.input = "two".to_string();
        app.submit_message();
        settle(&mut app).await;
        assert_eq!(app.transcript.entries().len(), 4);
    }
}
