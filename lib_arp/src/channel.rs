use std::io;
use std::time::Duration;

use pnet::datalink::{self, Channel, DataLinkReceiver, DataLinkSender, NetworkInterface};

use crate::{ArpError, ArpResult};

/// Outbound half of the capture boundary.
pub trait FrameSender: Send {
    fn send_frame(&mut self, frame: &[u8]) -> ArpResult<()>;
}

/// Inbound half of the capture boundary. `Ok(None)` means the read timed
/// out with no frame available, so callers can re-check their stop signal.
pub trait FrameReceiver: Send {
    fn recv_frame(&mut self) -> ArpResult<Option<Vec<u8>>>;
}

struct DatalinkSender {
    inner: Box<dyn DataLinkSender>,
}

struct DatalinkReceiver {
    inner: Box<dyn DataLinkReceiver>,
}

impl FrameSender for DatalinkSender {
    fn send_frame(&mut self, frame: &[u8]) -> ArpResult<()> {
        match self.inner.send_to(frame, None) {
            Some(Ok(())) => Ok(()),
            Some(Err(e)) => Err(ArpError::Write(e.to_string())),
            None => Err(ArpError::Write("datalink sender rejected the frame".to_string())),
        }
    }
}

impl FrameReceiver for DatalinkReceiver {
    fn recv_frame(&mut self) -> ArpResult<Option<Vec<u8>>> {
        match self.inner.next() {
            Ok(frame) => Ok(Some(frame.to_vec())),
            Err(ref e) if is_read_timeout(e) => Ok(None),
            Err(e) => Err(ArpError::Read(e.to_string())),
        }
    }
}

fn is_read_timeout(e: &io::Error) -> bool {
    matches!(
        e.kind(),
        io::ErrorKind::TimedOut | io::ErrorKind::WouldBlock | io::ErrorKind::Interrupted
    )
}

/// Opens one raw Ethernet channel on `iface` and returns its two halves.
/// The underlying socket is shared by both halves and released once both
/// are dropped, so the session closes it exactly once. The read timeout
/// bounds how long a pending shutdown can wait on a silent link.
pub fn open_channel(
    iface: &NetworkInterface,
    read_timeout: Duration,
) -> ArpResult<(Box<dyn FrameSender>, Box<dyn FrameReceiver>)> {
    let config = datalink::Config {
        read_timeout: Some(read_timeout),
        ..Default::default()
    };
    match datalink::channel(iface, config) {
        Ok(Channel::Ethernet(tx, rx)) => {
            debug!("opened capture channel on {}", iface.name);
            Ok((
                Box::new(DatalinkSender { inner: tx }),
                Box::new(DatalinkReceiver { inner: rx }),
            ))
        }
        Ok(_) => Err(ArpError::CaptureOpen(format!(
            "interface {} returned an unknown channel type",
            iface.name
        ))),
        Err(e) => Err(ArpError::CaptureOpen(format!(
            "cannot open capture channel on {}: {}",
            iface.name, e
        ))),
    }
}
