//! Built-in rover command handlers.

use std::sync::{Arc, Mutex};

use crate::image_codec::{DEFAULT_BIT_DEPTH, DEFAULT_IMAGE_SIZE, ImageCodec};
use crate::protocol::handler::{CommandHandler, HandlerContext};
use crate::protocol::peripherals::{Actuator, FrameSource};
use crate::protocol::protocol_error::ProtocolError;
use crate::protocol::response::Response;

pub struct StatusHandler;

impl CommandHandler for StatusHandler {
    fn name(&self) -> &'static str {
        "STATUS"
    }

    fn execute(
        &mut self,
        _args: &[String],
        _ctx: &mut HandlerContext<'_>,
    ) -> Result<Vec<Response>, ProtocolError> {
        Ok(vec![Response::text("Rover is online and ready")])
    }
}

pub struct EchoHandler;

impl CommandHandler for EchoHandler {
    fn name(&self) -> &'static str {
        "ECHO"
    }

    fn execute(
        &mut self,
        args: &[String],
        _ctx: &mut HandlerContext<'_>,
    ) -> Result<Vec<Response>, ProtocolError> {
        if args.is_empty() {
            return Err(ProtocolError::Usage("ECHO <text>"));
        }
        Ok(vec![Response::Text(args.join(" "))])
    }
}

pub struct MoveHandler {
    actuator: Arc<Mutex<dyn Actuator>>,
}

impl MoveHandler {
    #[must_use]
    pub fn new(actuator: Arc<Mutex<dyn Actuator>>) -> Self {
        Self { actuator }
    }
}

impl CommandHandler for MoveHandler {
    fn name(&self) -> &'static str {
        "MOVE"
    }

    fn execute(
        &mut self,
        args: &[String],
        _ctx: &mut HandlerContext<'_>,
    ) -> Result<Vec<Response>, ProtocolError> {
        let direction = args
            .first()
            .ok_or(ProtocolError::Usage("MOVE <direction> <distance>"))?
            .to_uppercase();
        let distance: i32 = args
            .get(1)
            .ok_or(ProtocolError::Usage("MOVE <direction> <distance>"))?
            .parse()
            .map_err(|_| ProtocolError::InvalidArgument("distance must be an integer".into()))?;

        self.actuator
            .lock()
            .map_err(|e| ProtocolError::Handler(e.to_string()))?
            .drive(&direction, distance)
            .map_err(ProtocolError::Handler)?;
        Ok(vec![Response::Text(format!(
            "Moving {direction} for {distance} units"
        ))])
    }
}

pub struct LedHandler {
    actuator: Arc<Mutex<dyn Actuator>>,
}

impl LedHandler {
    #[must_use]
    pub fn new(actuator: Arc<Mutex<dyn Actuator>>) -> Self {
        Self { actuator }
    }
}

impl CommandHandler for LedHandler {
    fn name(&self) -> &'static str {
        "LED"
    }

    fn execute(
        &mut self,
        args: &[String],
        _ctx: &mut HandlerContext<'_>,
    ) -> Result<Vec<Response>, ProtocolError> {
        let on = match args.first().map(|s| s.to_uppercase()).as_deref() {
            Some("ON") => true,
            Some("OFF") => false,
            _ => return Err(ProtocolError::Usage("LED <ON|OFF>")),
        };
        self.actuator
            .lock()
            .map_err(|e| ProtocolError::Handler(e.to_string()))?
            .led(on)
            .map_err(ProtocolError::Handler)?;
        Ok(vec![Response::Text(format!(
            "LED {}",
            if on { "ON" } else { "OFF" }
        ))])
    }
}

pub struct StopHandler {
    actuator: Arc<Mutex<dyn Actuator>>,
}

impl StopHandler {
    #[must_use]
    pub fn new(actuator: Arc<Mutex<dyn Actuator>>) -> Self {
        Self { actuator }
    }
}

impl CommandHandler for StopHandler {
    fn name(&self) -> &'static str {
        "STOP"
    }

    fn execute(
        &mut self,
        _args: &[String],
        _ctx: &mut HandlerContext<'_>,
    ) -> Result<Vec<Response>, ProtocolError> {
        self.actuator
            .lock()
            .map_err(|e| ProtocolError::Handler(e.to_string()))?
            .stop()
            .map_err(ProtocolError::Handler)?;
        Ok(vec![Response::text("Stopping all activity")])
    }
}

/// `IMAGE [bit_depth] [size] [BIN]` - capture, encode, stream.
///
/// The hex text form is the default; `BIN` switches to the binary packet
/// path (file header + seq/total chunks).
pub struct ImageHandler {
    source: Box<dyn FrameSource>,
}

impl ImageHandler {
    #[must_use]
    pub fn new(source: Box<dyn FrameSource>) -> Self {
        Self { source }
    }
}

impl CommandHandler for ImageHandler {
    fn name(&self) -> &'static str {
        "IMAGE"
    }

    fn execute(
        &mut self,
        args: &[String],
        _ctx: &mut HandlerContext<'_>,
    ) -> Result<Vec<Response>, ProtocolError> {
        let mut bit_depth = DEFAULT_BIT_DEPTH;
        let mut size = DEFAULT_IMAGE_SIZE;
        let mut binary = false;

        if let Some(depth_arg) = args.first() {
            bit_depth = depth_arg.parse().map_err(|_| {
                ProtocolError::InvalidArgument("bit depth must be an integer".into())
            })?;
        }
        if let Some(size_arg) = args.get(1) {
            let edge: u32 = size_arg.parse().map_err(|_| {
                ProtocolError::InvalidArgument("size must be an integer".into())
            })?;
            if edge == 0 {
                return Err(ProtocolError::InvalidArgument("size must be positive".into()));
            }
            size = (edge, edge);
        }
        if let Some(flag) = args.get(2) {
            match flag.to_uppercase().as_str() {
                "BIN" => binary = true,
                "HEX" => binary = false,
                _ => return Err(ProtocolError::Usage("IMAGE [bit_depth] [size] [BIN|HEX]")),
            }
        }

        let codec = ImageCodec::new(bit_depth, size)?;
        let frame = self.source.capture()?;
        if binary {
            Ok(vec![Response::Binary(codec.encode(&frame)?)])
        } else {
            Ok(vec![Response::Blob(codec.encode_hex(&frame)?.into_bytes())])
        }
    }
}

pub struct ConfigHandler;

const CONFIG_USAGE: &str = "CONFIG <OUTPUT_LENGTH|LOGGING|TIMESTAMP|CHUNKING> <value>";

impl CommandHandler for ConfigHandler {
    fn name(&self) -> &'static str {
        "CONFIG"
    }

    fn execute(
        &mut self,
        args: &[String],
        ctx: &mut HandlerContext<'_>,
    ) -> Result<Vec<Response>, ProtocolError> {
        let key = args
            .first()
            .ok_or(ProtocolError::Usage(CONFIG_USAGE))?
            .to_uppercase();
        let value = args
            .get(1)
            .ok_or(ProtocolError::Usage(CONFIG_USAGE))?
            .to_uppercase();

        match key.as_str() {
            "OUTPUT_LENGTH" => {
                let length: usize = value.parse().map_err(|_| {
                    ProtocolError::InvalidArgument("OUTPUT_LENGTH must be an integer".into())
                })?;
                ctx.session.set_output_length(length)?;
            }
            "LOGGING" => ctx.session.logging_enabled = parse_on_off(&value)?,
            "TIMESTAMP" => ctx.session.timestamp_enabled = parse_on_off(&value)?,
            "CHUNKING" => ctx.session.chunking_enabled = parse_on_off(&value)?,
            _ => return Err(ProtocolError::Usage(CONFIG_USAGE)),
        }
        Ok(vec![Response::Text(format!("CONFIG {key} set to {value}"))])
    }
}

fn parse_on_off(value: &str) -> Result<bool, ProtocolError> {
    match value {
        "ON" => Ok(true),
        "OFF" => Ok(false),
        _ => Err(ProtocolError::InvalidArgument(format!(
            "expected ON or OFF, got {value}"
        ))),
    }
}

/// `HISTORY <n>` - replay the last n transmitted payloads verbatim.
pub struct HistoryHandler;

impl CommandHandler for HistoryHandler {
    fn name(&self) -> &'static str {
        "HISTORY"
    }

    fn execute(
        &mut self,
        args: &[String],
        ctx: &mut HandlerContext<'_>,
    ) -> Result<Vec<Response>, ProtocolError> {
        let n: usize = args
            .first()
            .ok_or(ProtocolError::Usage("HISTORY <count>"))?
            .parse()
            .map_err(|_| ProtocolError::InvalidArgument("count must be an integer".into()))?;
        Ok(ctx.history.last(n).into_iter().map(Response::Raw).collect())
    }
}

/// `RESEND <i[,j,...]>` - replay specific packets by absolute index.
///
/// Evicted indices report "not found"; that is the designed retransmission
/// horizon, not a failure of the command.
pub struct ResendHandler;

impl CommandHandler for ResendHandler {
    fn name(&self) -> &'static str {
        "RESEND"
    }

    fn execute(
        &mut self,
        args: &[String],
        ctx: &mut HandlerContext<'_>,
    ) -> Result<Vec<Response>, ProtocolError> {
        if args.is_empty() {
            return Err(ProtocolError::Usage("RESEND <index[,index,...]>"));
        }
        let mut responses = Vec::new();
        for token in args.join(",").split(',').filter(|s| !s.is_empty()) {
            let index: u64 = token.trim().parse().map_err(|_| {
                ProtocolError::InvalidArgument(format!("bad packet index: {token}"))
            })?;
            match ctx.history.by_index(index) {
                Some(payload) => responses.push(Response::Raw(payload)),
                None => responses.push(Response::Text(format!("packet {index} not found"))),
            }
        }
        Ok(responses)
    }
}

/// The full rover handler table.
#[must_use]
pub fn default_handlers(
    actuator: Arc<Mutex<dyn Actuator>>,
    frame_source: Box<dyn FrameSource>,
) -> Vec<Box<dyn CommandHandler>> {
    vec![
        Box::new(StatusHandler),
        Box::new(EchoHandler),
        Box::new(MoveHandler::new(actuator.clone())),
        Box::new(LedHandler::new(actuator.clone())),
        Box::new(StopHandler::new(actuator)),
        Box::new(ImageHandler::new(frame_source)),
        Box::new(ConfigHandler),
        Box::new(HistoryHandler),
        Box::new(ResendHandler),
    ]
}
