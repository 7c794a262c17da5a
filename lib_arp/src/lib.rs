extern crate chrono;
extern crate ipnetwork;
extern crate pnet;
#[macro_use] extern crate failure;
#[macro_use] extern crate serde_derive;
#[macro_use] extern crate log;

mod channel;
mod config;
mod listen;
mod node;
mod packet;
mod session;
mod subnet;
mod sweep;

pub use channel::{open_channel, FrameReceiver, FrameSender};
pub use config::{parse_interval, ScanConfig, SubnetPolicy};
pub use node::ObservedReply;
pub use packet::{build_request, decode_frame, ArpMessage};
pub use session::ScanSession;
pub use subnet::host_addresses;

pub type ArpResult<T> = std::result::Result<T, ArpError>;

#[derive(Debug, Fail)]
pub enum ArpError {

    #[fail(display = "ConfigurationError: {}", _0)]
    Configuration(String),

    #[fail(display = "CaptureOpenError: {}", _0)]
    CaptureOpen(String),

    #[fail(display = "WriteError: {}", _0)]
    Write(String),

    #[fail(display = "ReadError: {}", _0)]
    Read(String),
}
