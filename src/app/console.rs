use crate::adapters::channel::{ChannelSendListener, SendEvent, TriadEvent, TriadEventQueue};
use crate::core::send_presenter::{SendPresenter, SubmitTicket};
use crate::core::triad_presenter::TriadPresenter;
use crate::domain::model::{FieldId, Triple};
use crate::domain::ports::{Executor, RemoteClient};
use crate::utils::error::Result;
use crossbeam_channel::{Receiver, RecvTimeoutError};
use std::io::Write;
use std::sync::Arc;
use std::time::{Duration, Instant};

const DEFAULT_SEND_WAIT: Duration = Duration::from_secs(10);

const HELP: &str = "\
Commands:
  a|b|c <value>        edit a triad field
  total <value>        change the triad total
  send <id> <amount>   submit to the remote endpoint
  show                 render both panels
  help                 this text
  quit                 leave";

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Flow {
    Continue,
    Quit,
}

/// Line-oriented view for the triad and send panels.
///
/// Plays the role of the widget toolkit: it keeps the text shown in each
/// field, writes presenter state back into those fields and forwards user
/// commands to the presenters.
pub struct ConsoleShell<W: Write> {
    triad: TriadPresenter<TriadEventQueue>,
    send: SendPresenter,
    send_events: Receiver<SendEvent>,
    send_wait: Duration,
    fields: [String; 3],
    field_errors: [bool; 3],
    total_text: String,
    status: String,
    out: W,
}

impl<W: Write> ConsoleShell<W> {
    pub fn new(
        out: W,
        total: u32,
        initial: Triple,
        client: Arc<dyn RemoteClient>,
        executor: Arc<dyn Executor>,
    ) -> Result<Self> {
        let triad = TriadPresenter::new(TriadEventQueue::new(), i64::from(total), initial)?;
        let (listener, send_events) = ChannelSendListener::channel();
        let send = SendPresenter::new(client, executor, Arc::new(listener));

        let mut shell = Self {
            triad,
            send,
            send_events,
            send_wait: DEFAULT_SEND_WAIT,
            fields: Default::default(),
            field_errors: [false; 3],
            total_text: String::new(),
            status: String::new(),
            out,
        };
        shell.render_triad()?;
        shell.pump()?;
        Ok(shell)
    }

    /// How long a `send` command waits for the outcome before returning.
    pub fn with_send_wait(mut self, wait: Duration) -> Self {
        self.send_wait = wait;
        self
    }

    pub fn handle_line(&mut self, line: &str) -> Result<Flow> {
        let mut parts = line.split_whitespace();
        let Some(command) = parts.next() else {
            return Ok(Flow::Continue);
        };
        let rest: Vec<&str> = parts.collect();

        match command.to_ascii_lowercase().as_str() {
            "quit" | "exit" => return Ok(Flow::Quit),
            "help" => writeln!(self.out, "{}", HELP)?,
            "show" => {
                self.write_triad()?;
                self.write_status()?;
            }
            "total" => {
                self.triad.set_total_text(&rest.join(" "));
                self.render_triad()?;
            }
            "send" => {
                let identifier = rest.first().copied().unwrap_or("");
                let amount = rest.get(1).copied().unwrap_or("");
                match self.send.submit(identifier, amount) {
                    // view 在 Sending 期間不接受新的 submit
                    SubmitTicket::Dispatched(_) => self.await_send_outcome()?,
                    SubmitTicket::Rejected(_) => self.pump()?,
                }
            }
            other => match FieldId::parse(other) {
                Some(field) => {
                    self.clear_field_errors();
                    self.triad.on_field_edited(field, &rest.join(" "));
                    self.render_triad()?;
                }
                None => writeln!(self.out, "Unknown command {:?}, try \"help\"", other)?,
            },
        }

        Ok(Flow::Continue)
    }

    /// Applies pending send notifications on the calling thread.
    pub fn pump(&mut self) -> Result<()> {
        while let Ok(event) = self.send_events.try_recv() {
            self.apply_send_event(event)?;
        }
        Ok(())
    }

    fn await_send_outcome(&mut self) -> Result<()> {
        let deadline = Instant::now() + self.send_wait;
        loop {
            let remaining = deadline.saturating_duration_since(Instant::now());
            match self.send_events.recv_timeout(remaining) {
                Ok(event) => {
                    let terminal = matches!(event, SendEvent::Success(_) | SendEvent::Error(_));
                    self.apply_send_event(event)?;
                    if terminal {
                        return Ok(());
                    }
                }
                Err(RecvTimeoutError::Timeout) => {
                    writeln!(self.out, "[send] still waiting, the outcome will show up later")?;
                    return Ok(());
                }
                Err(RecvTimeoutError::Disconnected) => return Ok(()),
            }
        }
    }

    fn apply_send_event(&mut self, event: SendEvent) -> Result<()> {
        self.status = match event {
            SendEvent::Idle => "Idle".to_string(),
            SendEvent::Sending => "Sending...".to_string(),
            SendEvent::Success(message) | SendEvent::Error(message) => message,
            SendEvent::ValidationError { field, message } => {
                writeln!(self.out, "[send] invalid {}", field)?;
                message
            }
        };
        self.write_status()
    }

    fn render_triad(&mut self) -> Result<()> {
        let events = self.triad.listener_mut().drain();
        for event in events {
            match event {
                TriadEvent::ValuesChanged(values) => {
                    // 寫回欄位時會觸發編輯事件，必須在 guard 範圍內
                    let mut guard = self.triad.programmatic_update();
                    for field in FieldId::ALL {
                        let text = values.get(field).to_string();
                        self.fields[index(field)] = text.clone();
                        guard.on_field_edited(field, &text);
                    }
                    drop(guard);
                    self.clear_field_errors();
                }
                TriadEvent::TotalChanged(total) => self.total_text = total.to_string(),
                TriadEvent::ValidationError { field, message } => {
                    match field {
                        Some(field) => {
                            self.field_errors[index(field)] = true;
                            writeln!(self.out, "[triad] {}: {}", field, message)?;
                        }
                        None => writeln!(self.out, "[triad] {}", message)?,
                    }
                }
            }
        }
        self.write_triad()
    }

    fn write_triad(&mut self) -> Result<()> {
        write!(self.out, "Total: {}", self.total_text)?;
        for field in FieldId::ALL {
            let marker = if self.field_errors[index(field)] { "!" } else { "" };
            write!(self.out, " | {}: {}{}", field, self.fields[index(field)], marker)?;
        }
        writeln!(self.out)?;
        Ok(())
    }

    fn write_status(&mut self) -> Result<()> {
        writeln!(self.out, "Status: {}", self.status)?;
        Ok(())
    }

    fn clear_field_errors(&mut self) {
        self.field_errors = [false; 3];
    }

    pub fn triad(&self) -> &TriadPresenter<TriadEventQueue> {
        &self.triad
    }

    pub fn field_text(&self, field: FieldId) -> &str {
        &self.fields[index(field)]
    }

    pub fn has_field_error(&self, field: FieldId) -> bool {
        self.field_errors[index(field)]
    }

    pub fn status(&self) -> &str {
        &self.status
    }

    pub fn output(&self) -> &W {
        &self.out
    }

    pub fn into_output(self) -> W {
        self.out
    }

    pub fn help() -> &'static str {
        HELP
    }
}

fn index(field: FieldId) -> usize {
    match field {
        FieldId::First => 0,
        FieldId::Second => 1,
        FieldId::Third => 2,
    }
}
