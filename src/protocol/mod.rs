pub mod command;
pub mod constants;
pub mod dispatcher;
pub mod handler;
pub mod handlers;
pub mod peripherals;
pub mod protocol_error;
pub mod receiver;
pub mod response;
pub mod session;

pub use command::Command;
pub use dispatcher::{CommandProtocol, DispatchState};
pub use handler::{CommandHandler, HandlerContext};
pub use protocol_error::ProtocolError;
pub use receiver::{MessageReceiver, ReceiveState};
pub use response::Response;
pub use session::SessionConfig;
