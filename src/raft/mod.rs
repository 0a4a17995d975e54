//! Message plumbing shared with the consensus layer.

mod inbound;

pub use inbound::{
    InMemoryInbound, Inbound, LoggingInbound, MemberId, MessageHandler, MessageLogger,
    TracingMessageLogger,
};
