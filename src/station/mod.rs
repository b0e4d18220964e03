pub mod demux;
pub mod events;
pub mod reader;
pub mod reconstructor;
pub mod station_error;

pub use demux::{DemuxEvent, DualModeLineDemux};
pub use events::StationEvent;
pub use reader::StreamReader;
pub use reconstructor::Reconstructor;
pub use station_error::StationError;
