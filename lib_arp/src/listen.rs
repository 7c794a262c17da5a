use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

use crate::channel::FrameReceiver;
use crate::node::ObservedReply;
use crate::packet::{self, ArpMessage};
use crate::ArpResult;

/// Watches the capture boundary for ARP traffic until `stop` is raised,
/// logging every ARP message seen. Returns the number of accepted ARP
/// frames. A read error aborts the loop and raises `stop` so the sibling
/// sweep loop terminates too.
pub fn listen(mut rx: Box<dyn FrameReceiver>, stop: Arc<AtomicBool>) -> ArpResult<u64> {
    let mut accepted: u64 = 0;

    while !stop.load(Ordering::SeqCst) {
        let frame = match rx.recv_frame() {
            Ok(Some(frame)) => frame,
            // Read timed out with no frame, go back and re-check stop.
            Ok(None) => continue,
            Err(e) => {
                stop.store(true, Ordering::SeqCst);
                error!("capture read failed: {}", e);
                return Err(e);
            }
        };

        let message = match packet::decode_frame(&frame) {
            Some(message) => message,
            None => continue,
        };
        accepted += 1;
        register(&message);
    }

    info!("Read {} ARP packets", accepted);
    Ok(accepted)
}

/// Logs one accepted ARP message. Requests are observed passively (no reply
/// is generated); replies become an [`ObservedReply`].
fn register(message: &ArpMessage) -> Option<ObservedReply> {
    if !message.is_reply() {
        info!("Who has {}? Tell {}", message.target_ip, message.sender_ip);
        return None;
    }
    let node = ObservedReply::new(message.sender_ip, message.sender_mac);
    info!("{}", node);
    Some(node)
}
