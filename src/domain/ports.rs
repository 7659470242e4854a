use crate::domain::model::{Field, FieldId, Outcome, Payload, Triple};
use crate::utils::error::Result;

/// Remote collaborator that receives a submitted payload.
///
/// Implementations bound their own connect/reply time; the presenter never
/// cancels or times out a call.
pub trait RemoteClient: Send + Sync {
    fn send(&self, payload: &Payload) -> Result<Outcome>;
}

pub type Job = Box<dyn FnOnce() + Send + 'static>;

/// Execution context for the remote call: inline or background.
pub trait Executor: Send + Sync {
    fn execute(&self, job: Job);
}

/// 三欄位面板的通知介面，由 view 實作
pub trait TriadListener {
    fn on_values_changed(&mut self, values: Triple);
    fn on_total_changed(&mut self, total: u32);
    fn on_validation_error(&mut self, field: Option<FieldId>, message: &str);
}

/// Notifications of the send panel. Completion callbacks may arrive from
/// the executor's thread.
pub trait SendListener: Send + Sync {
    fn on_idle(&self);
    fn on_sending(&self);
    fn on_success(&self, message: &str);
    fn on_error(&self, message: &str);
    fn on_validation_error(&self, field: Field, message: &str);
}
