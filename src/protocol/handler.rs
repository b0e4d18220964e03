use crate::framing::PacketHistory;
use crate::protocol::protocol_error::ProtocolError;
use crate::protocol::response::Response;
use crate::protocol::session::SessionConfig;

/// State a handler may read or mutate while executing.
///
/// The session is the only mutable piece; history is read-only here because
/// appends happen at transmission time in the dispatcher.
pub struct HandlerContext<'a> {
    pub session: &'a mut SessionConfig,
    pub history: &'a PacketHistory,
}

/// One command capability in the dispatch table.
///
/// Implementations return the responses to stream; the dispatcher frames
/// them, appends the sentinel, and converts errors into `[ERROR]` lines, so
/// a failing handler never halts the dispatch loop.
pub trait CommandHandler: Send {
    /// Uppercase command name this handler answers to.
    fn name(&self) -> &'static str;

    fn execute(
        &mut self,
        args: &[String],
        ctx: &mut HandlerContext<'_>,
    ) -> Result<Vec<Response>, ProtocolError>;
}
