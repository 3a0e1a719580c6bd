use ratatui::layout::Rect;
use tokio::task::JoinHandle;
use tracing::error;

use crate::chat::{ChatInputs, ChatInteractionHandler};
use crate::error::{ChatError, REQUEST_FAILURE_ALERT};
use crate::input::TextField;
use crate::message::Message;
use crate::transcript::{Transcript, TranscriptStore};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Focus {
    Endpoint,
    Message,
}

pub type SendTask = JoinHandle<Result<Message, ChatError>>;

pub struct App {
    pub should_quit: bool,
    pub focus: Focus,
    pub inputs: ChatInputs,

    // Chat state
    pub transcript: Transcript,
    pub chat: ChatInteractionHandler,
    pub pending: Vec<SendTask>,

    // Modal alert; blocks other input until dismissed
    pub alert: Option<String>,

    // Transcript view
    pub scroll: u16,
    pub follow_tail: bool,
    pub chat_height: u16, // inner height of the transcript pane
    pub chat_width: u16,  // inner width, for wrap calculations

    pub animation_frame: u8,

    // Areas for mouse hit-testing (updated during render)
    pub transcript_area: Option<Rect>,
    pub endpoint_area: Option<Rect>,
    pub message_area: Option<Rect>,
    pub send_button_area: Option<Rect>,
}

impl App {
    pub fn new(chat: ChatInteractionHandler, transcript: Transcript, endpoint: String) -> Self {
        // Start in the message field when the endpoint is already known
        let focus = if endpoint.is_empty() {
            Focus::Endpoint
        } else {
            Focus::Message
        };

        Self {
            should_quit: false,
            focus,
            inputs: ChatInputs {
                endpoint: TextField::new(endpoint),
                question: TextField::default(),
            },

            transcript,
            chat,
            pending: Vec::new(),

            alert: None,

            scroll: 0,
            follow_tail: true,
            chat_height: 0,
            chat_width: 0,

            animation_frame: 0,

            transcript_area: None,
            endpoint_area: None,
            message_area: None,
            send_button_area: None,
        }
    }

    pub fn focused_field(&mut self) -> &mut TextField {
        match self.focus {
            Focus::Endpoint => &mut self.inputs.endpoint,
            Focus::Message => &mut self.inputs.question,
        }
    }

    pub fn focus_next(&mut self) {
        self.focus = match self.focus {
            Focus::Endpoint => Focus::Message,
            Focus::Message => Focus::Endpoint,
        };
    }

    /// Shared by every send trigger (Enter in the message field, the Send button)
    pub fn submit(&mut self) {
        match self.chat.begin(&mut self.inputs) {
            Ok(pending) => {
                let chat = self.chat.clone();
                self.pending
                    .push(tokio::spawn(async move { chat.complete(pending).await }));
                self.follow_tail = true;
            }
            Err(err) => self.show_alert(err.alert_text()),
        }
    }

    /// Collect finished sends and raise an alert for each failure
    pub async fn poll_pending(&mut self) {
        if !self.pending.iter().any(|task| task.is_finished()) {
            return;
        }

        let (finished, running): (Vec<SendTask>, Vec<SendTask>) = self
            .pending
            .drain(..)
            .partition(|task| task.is_finished());
        self.pending = running;

        for task in finished {
            match task.await {
                Ok(Ok(_)) => self.follow_tail = true,
                Ok(Err(err)) => self.show_alert(err.alert_text()),
                Err(join_err) => {
                    error!(error = %join_err, "Send task did not complete");
                    self.show_alert(REQUEST_FAILURE_ALERT);
                }
            }
        }
    }

    pub fn pending_count(&self) -> usize {
        self.pending.len()
    }

    pub fn show_alert(&mut self, text: impl Into<String>) {
        self.alert = Some(text.into());
    }

    pub fn dismiss_alert(&mut self) {
        self.alert = None;
    }

    /// Tick animation frame (called by Tick event)
    pub fn tick_animation(&mut self) {
        if !self.pending.is_empty() {
            self.animation_frame = (self.animation_frame + 1) % 3;
        }
    }

    /// Number of rendered lines the transcript occupies at the current width
    pub fn transcript_line_count(&self) -> u16 {
        // Use actual chat width for wrap calculation, default to 50 if not set
        let wrap_width = if self.chat_width > 0 {
            self.chat_width as usize
        } else {
            50
        };

        let mut total_lines: usize = 0;

        for msg in self.transcript.entries() {
            total_lines += 1; // Origin label
            let mut text_lines = 0;
            for line in msg.text().lines() {
                let char_count = line.chars().count();
                text_lines += char_count.div_ceil(wrap_width).max(1);
            }
            total_lines += text_lines.max(1);
            total_lines += 1; // Blank line after message
        }

        if !self.pending.is_empty() {
            total_lines += 2; // Label + waiting indicator
        }

        total_lines.min(u16::MAX as usize) as u16
    }

    fn max_scroll(&self) -> u16 {
        let visible_height = if self.chat_height > 0 {
            self.chat_height
        } else {
            20
        };
        self.transcript_line_count().saturating_sub(visible_height)
    }

    pub fn scroll_to_bottom(&mut self) {
        self.scroll = self.max_scroll();
    }

    pub fn scroll_up(&mut self, lines: u16) {
        self.scroll = self.scroll.saturating_sub(lines);
        self.follow_tail = false;
    }

    pub fn scroll_down(&mut self, lines: u16) {
        let max = self.max_scroll();
        self.scroll = self.scroll.saturating_add(lines).min(max);
        self.follow_tail = self.scroll == max;
    }

    pub fn page_size(&self) -> u16 {
        self.chat_height.max(2) / 2
    }
}
