pub mod adapters;
pub mod app;
pub mod config;
pub mod core;
pub mod domain;
pub mod utils;

#[cfg(feature = "cli")]
pub use config::CliConfig;

pub use adapters::executor::{ExecutorMode, InlineExecutor, TokioExecutor, WorkerExecutor};
pub use adapters::xmlrpc::XmlRpcClient;
pub use app::console::ConsoleShell;
pub use config::AppConfig;
pub use crate::core::{
    send_presenter::SendPresenter, triad::TriadCalculator, triad_presenter::TriadPresenter,
};
pub use domain::model::{Field, FieldId, Outcome, Payload, Triple};
pub use utils::error::{Result, TriadError};
