use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::thread;
use std::time::Duration;

use pnet::datalink::MacAddr;

use crate::channel::FrameSender;
use crate::config::ScanConfig;
use crate::packet;
use crate::subnet;
use crate::ArpResult;

// Granularity of the interruptible inter-sweep sleep.
const SLEEP_SLICE: Duration = Duration::from_millis(100);

/// Broadcasts one ARP request sweep immediately and then one per interval
/// until `stop` is raised. A single write failure aborts the loop, raises
/// `stop` for the sibling listen loop and surfaces as a `WriteError`; the
/// handle is treated as invalid, not retried.
pub fn sweep_on_interval(
    mut tx: Box<dyn FrameSender>,
    stop: Arc<AtomicBool>,
    config: &ScanConfig,
) -> ArpResult<()> {
    loop {
        if stop.load(Ordering::SeqCst) {
            return Ok(());
        }
        match sweep(tx.as_mut(), &stop, config) {
            Ok(true) => info!("Requested ARP replies for broadcast"),
            // Shutdown cut the sweep short, nothing more to announce.
            Ok(false) => return Ok(()),
            Err(e) => {
                stop.store(true, Ordering::SeqCst);
                error!("cannot write frames on {}: {}", config.interface.name, e);
                return Err(e);
            }
        }
        if wait_interruptible(config.interval, &stop) {
            return Ok(());
        }
    }
}

/// Writes one broadcast request per usable host address, in ascending
/// order. The stop flag is re-checked between writes so no frame goes out
/// once shutdown has been observed; `Ok(false)` means the sweep was cut
/// short by shutdown.
fn sweep(tx: &mut dyn FrameSender, stop: &AtomicBool, config: &ScanConfig) -> ArpResult<bool> {
    let source_ip = config.network.ip();
    for target_ip in subnet::host_addresses(config.network) {
        if stop.load(Ordering::SeqCst) {
            return Ok(false);
        }
        let frame = packet::build_request(
            config.source_mac,
            source_ip,
            MacAddr::broadcast(),
            target_ip,
        );
        tx.send_frame(&frame)?;
    }
    Ok(true)
}

/// Sleeps for `interval` in small slices, returning early (and `true`) as
/// soon as `stop` is raised. This keeps the timer itself cancellable
/// instead of leaving an orphaned tick producer behind.
fn wait_interruptible(interval: Duration, stop: &AtomicBool) -> bool {
    let mut remaining = interval;
    while remaining > Duration::ZERO {
        if stop.load(Ordering::SeqCst) {
            return true;
        }
        let nap = remaining.min(SLEEP_SLICE);
        thread::sleep(nap);
        remaining -= nap;
    }
    stop.load(Ordering::SeqCst)
}
