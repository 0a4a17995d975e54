use async_trait::async_trait;
use std::fmt;
use std::sync::{Arc, Mutex as StdMutex};
use tokio::sync::Mutex;
use tracing::{Level, event};

/// Identity of the local cluster member, attached to every logged message.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct MemberId(String);

impl MemberId {
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }
}

impl fmt::Display for MemberId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// Receives messages delivered by an `Inbound`.
#[async_trait]
pub trait MessageHandler<M>: Send + Sync {
    async fn handle(&self, message: M);
}

/// Source of inbound messages that dispatches to registered handlers.
pub trait Inbound<M>: Send + Sync {
    fn register_handler(&self, handler: Arc<dyn MessageHandler<M>>);
}

/// Records an inbound message on behalf of `me`.
pub trait MessageLogger<M>: Send + Sync {
    fn log_inbound(&self, me: &MemberId, message: &M);
}

/// Emits one `tracing` event per inbound message.
#[derive(Debug, Clone, Copy, Default)]
pub struct TracingMessageLogger;

impl<M: fmt::Debug> MessageLogger<M> for TracingMessageLogger {
    fn log_inbound(&self, me: &MemberId, message: &M) {
        event!(Level::INFO, member = %me, message = ?message, "inbound raft message");
    }
}

// ============================================================================
// Logging Inbound
// ============================================================================

/// Wraps an `Inbound` so that every handler registered through it logs each
/// message before handling it.
///
/// Each wrapped handler owns its own lock: calls into one handler never
/// overlap, while distinct handlers still run independently.
pub struct LoggingInbound<I, L> {
    inbound: I,
    logger: Arc<L>,
    me: MemberId,
}

impl<I, L> LoggingInbound<I, L> {
    pub fn new(inbound: I, logger: Arc<L>, me: MemberId) -> Self {
        Self { inbound, logger, me }
    }
}

impl<M, I, L> Inbound<M> for LoggingInbound<I, L>
where
    M: Send + 'static,
    I: Inbound<M>,
    L: MessageLogger<M> + 'static,
{
    fn register_handler(&self, handler: Arc<dyn MessageHandler<M>>) {
        self.inbound.register_handler(Arc::new(LoggingHandler {
            handler,
            logger: Arc::clone(&self.logger),
            me: self.me.clone(),
            serial: Mutex::new(()),
        }));
    }
}

struct LoggingHandler<M, L> {
    handler: Arc<dyn MessageHandler<M>>,
    logger: Arc<L>,
    me: MemberId,
    serial: Mutex<()>,
}

#[async_trait]
impl<M, L> MessageHandler<M> for LoggingHandler<M, L>
where
    M: Send + 'static,
    L: MessageLogger<M> + 'static,
{
    async fn handle(&self, message: M) {
        let _turn = self.serial.lock().await;
        self.logger.log_inbound(&self.me, &message);
        self.handler.handle(message).await;
    }
}

// ============================================================================
// In-Memory Inbound
// ============================================================================

/// Delivers messages in-process to every registered handler.
pub struct InMemoryInbound<M> {
    handlers: StdMutex<Vec<Arc<dyn MessageHandler<M>>>>,
}

impl<M> Default for InMemoryInbound<M> {
    fn default() -> Self {
        Self {
            handlers: StdMutex::new(Vec::new()),
        }
    }
}

impl<M: Clone + Send + 'static> InMemoryInbound<M> {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn handler_count(&self) -> usize {
        self.snapshot().len()
    }

    /// Hands `message` to each registered handler in registration order.
    pub async fn deliver(&self, message: M) {
        for handler in self.snapshot() {
            handler.handle(message.clone()).await;
        }
    }

    fn snapshot(&self) -> Vec<Arc<dyn MessageHandler<M>>> {
        self.handlers
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
            .clone()
    }
}

impl<M: Send + 'static> Inbound<M> for InMemoryInbound<M> {
    fn register_handler(&self, handler: Arc<dyn MessageHandler<M>>) {
        self.handlers
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
            .push(handler);
    }
}

impl<M: Send + 'static, T: Inbound<M>> Inbound<M> for Arc<T> {
    fn register_handler(&self, handler: Arc<dyn MessageHandler<M>>) {
        (**self).register_handler(handler)
    }
}
