pub mod send_presenter;
pub mod triad;
pub mod triad_presenter;

pub use crate::domain::model::{Field, FieldId, Outcome, Payload, Triple};
pub use crate::domain::ports::{Executor, RemoteClient, SendListener, TriadListener};
pub use crate::utils::error::Result;
