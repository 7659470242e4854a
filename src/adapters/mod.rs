// Adapters layer: concrete implementations of the domain ports
// (executors, transport, listener bridges).

pub mod channel;
pub mod executor;
pub mod xmlrpc;
