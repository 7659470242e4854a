//! Listener adapters that turn presenter callbacks into events the owning
//! thread drains at its own pace.

use crate::domain::model::{Field, FieldId, Triple};
use crate::domain::ports::{SendListener, TriadListener};
use crossbeam_channel::{unbounded, Receiver, Sender};

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SendEvent {
    Idle,
    Sending,
    Success(String),
    Error(String),
    ValidationError { field: Field, message: String },
}

/// Forwards send notifications over a channel.
///
/// Completion callbacks fire on the executor's thread; the receiver side is
/// drained by the view on the thread that owns the presenters.
#[derive(Debug, Clone)]
pub struct ChannelSendListener {
    tx: Sender<SendEvent>,
}

impl ChannelSendListener {
    pub fn channel() -> (Self, Receiver<SendEvent>) {
        let (tx, rx) = unbounded();
        (Self { tx }, rx)
    }

    fn forward(&self, event: SendEvent) {
        if self.tx.send(event).is_err() {
            tracing::debug!("send event dropped, view is gone");
        }
    }
}

impl SendListener for ChannelSendListener {
    fn on_idle(&self) {
        self.forward(SendEvent::Idle);
    }

    fn on_sending(&self) {
        self.forward(SendEvent::Sending);
    }

    fn on_success(&self, message: &str) {
        self.forward(SendEvent::Success(message.to_string()));
    }

    fn on_error(&self, message: &str) {
        self.forward(SendEvent::Error(message.to_string()));
    }

    fn on_validation_error(&self, field: Field, message: &str) {
        self.forward(SendEvent::ValidationError {
            field,
            message: message.to_string(),
        });
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TriadEvent {
    ValuesChanged(Triple),
    TotalChanged(u32),
    ValidationError {
        field: Option<FieldId>,
        message: String,
    },
}

/// Buffers triad notifications until the view renders them.
#[derive(Debug, Default)]
pub struct TriadEventQueue {
    events: Vec<TriadEvent>,
}

impl TriadEventQueue {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn drain(&mut self) -> Vec<TriadEvent> {
        std::mem::take(&mut self.events)
    }

    pub fn is_empty(&self) -> bool {
        self.events.is_empty()
    }
}

impl TriadListener for TriadEventQueue {
    fn on_values_changed(&mut self, values: Triple) {
        self.events.push(TriadEvent::ValuesChanged(values));
    }

    fn on_total_changed(&mut self, total: u32) {
        self.events.push(TriadEvent::TotalChanged(total));
    }

    fn on_validation_error(&mut self, field: Option<FieldId>, message: &str) {
        self.events.push(TriadEvent::ValidationError {
            field,
            message: message.to_string(),
        });
    }
}
