use crate::domain::model::{Field, Outcome, Payload};
use crate::domain::ports::{Executor, RemoteClient, SendListener};
use crate::utils::error::{Result, TriadError};
use crate::utils::validation::parse_non_negative_int;
use std::any::Any;
use std::panic::{catch_unwind, AssertUnwindSafe};
use std::sync::Arc;

pub const IDENTIFIER_REQUIRED_MESSAGE: &str = "Identifier is required.";
pub const AMOUNT_INVALID_MESSAGE: &str = "Amount must be a whole number >= 0.";
pub const DEFAULT_SUCCESS_MESSAGE: &str = "Sent OK";
pub const DEFAULT_ERROR_MESSAGE: &str = "Remote error";
pub const SEND_FAILURE_PREFIX: &str = "Failed to send: ";

/// What `submit` did with the input.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SubmitTicket {
    Rejected(Field),
    Dispatched(Payload),
}

/// Validate-then-submit workflow: `Idle -> Sending -> {Success, Error}`.
///
/// The remote call runs on the injected [`Executor`]; the presenter makes no
/// assumption about which thread delivers the completion notification.
pub struct SendPresenter {
    client: Arc<dyn RemoteClient>,
    executor: Arc<dyn Executor>,
    listener: Arc<dyn SendListener>,
}

impl SendPresenter {
    pub fn new(
        client: Arc<dyn RemoteClient>,
        executor: Arc<dyn Executor>,
        listener: Arc<dyn SendListener>,
    ) -> Self {
        listener.on_idle();
        Self {
            client,
            executor,
            listener,
        }
    }

    pub fn submit(&self, identifier_text: &str, amount_text: &str) -> SubmitTicket {
        // 驗證輸入
        let identifier = identifier_text.trim();
        if identifier.is_empty() {
            tracing::warn!("Submit rejected: empty identifier");
            self.listener
                .on_validation_error(Field::Identifier, IDENTIFIER_REQUIRED_MESSAGE);
            return SubmitTicket::Rejected(Field::Identifier);
        }
        let Some(amount) = parse_non_negative_int(amount_text) else {
            tracing::warn!("Submit rejected: invalid amount {:?}", amount_text);
            self.listener
                .on_validation_error(Field::Amount, AMOUNT_INVALID_MESSAGE);
            return SubmitTicket::Rejected(Field::Amount);
        };

        let payload = Payload::new(identifier, amount);
        self.listener.on_sending();
        tracing::info!(
            identifier = %payload.identifier,
            amount = payload.amount,
            "Dispatching remote call"
        );

        let client = Arc::clone(&self.client);
        let listener = Arc::clone(&self.listener);
        let job_payload = payload.clone();
        self.executor.execute(Box::new(move || {
            deliver(call_remote(client.as_ref(), &job_payload), listener.as_ref());
        }));

        SubmitTicket::Dispatched(payload)
    }
}

/// Runs the remote call, turning a panicking client into an error result.
fn call_remote(client: &dyn RemoteClient, payload: &Payload) -> Result<Outcome> {
    catch_unwind(AssertUnwindSafe(|| client.send(payload))).unwrap_or_else(|cause| {
        Err(TriadError::RemoteError {
            message: panic_message(cause.as_ref()),
        })
    })
}

fn panic_message(cause: &(dyn Any + Send)) -> String {
    if let Some(s) = cause.downcast_ref::<&str>() {
        s.to_string()
    } else if let Some(s) = cause.downcast_ref::<String>() {
        s.clone()
    } else {
        "client panicked".to_string()
    }
}

fn deliver(result: Result<Outcome>, listener: &dyn SendListener) {
    match result {
        Ok(outcome) if outcome.is_success() => {
            let message = outcome.message().unwrap_or(DEFAULT_SUCCESS_MESSAGE);
            tracing::info!("Remote call succeeded: {}", message);
            listener.on_success(message);
        }
        Ok(outcome) => {
            let message = outcome.message().unwrap_or(DEFAULT_ERROR_MESSAGE);
            tracing::warn!("Remote call reported failure: {}", message);
            listener.on_error(message);
        }
        Err(e) => {
            tracing::warn!("Remote call raised: {}", e);
            listener.on_error(&format!("{}{}", SEND_FAILURE_PREFIX, e));
        }
    }
}
