use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::thread;
use std::time::Duration;

use crate::channel::{self, FrameReceiver, FrameSender};
use crate::config::ScanConfig;
use crate::{listen, sweep, ArpError, ArpResult};

// How long a silent link can delay a shutdown observation in the listener.
const READ_TIMEOUT: Duration = Duration::from_millis(500);

/// One scan session: owns the capture boundary for its lifetime and runs
/// the listen and sweep loops as two OS threads sharing a broadcast stop
/// flag. The underlying channel is released once both loops have joined.
pub struct ScanSession {
    config: ScanConfig,
}

impl ScanSession {
    pub fn new(config: ScanConfig) -> Self {
        ScanSession { config }
    }

    /// Runs until `stop` is raised (interrupt handler, or either loop
    /// failing), then joins both loops. The first loop error wins.
    pub fn run(self, stop: Arc<AtomicBool>) -> ArpResult<()> {
        let (tx, rx) = channel::open_channel(&self.config.interface, READ_TIMEOUT)?;
        self.run_with_channel(tx, rx, stop)
    }

    fn run_with_channel(
        self,
        tx: Box<dyn FrameSender>,
        rx: Box<dyn FrameReceiver>,
        stop: Arc<AtomicBool>,
    ) -> ArpResult<()> {
        let listener_stop = Arc::clone(&stop);
        let listener = thread::spawn(move || listen::listen(rx, listener_stop));

        let sweeper_stop = Arc::clone(&stop);
        let config = self.config;
        let sweeper = thread::spawn(move || sweep::sweep_on_interval(tx, sweeper_stop, &config));

        let swept = sweeper.join().unwrap_or_else(|_| {
            stop.store(true, Ordering::SeqCst);
            Err(ArpError::Write("sweep loop panicked".to_string()))
        });
        let listened = listener.join().unwrap_or_else(|_| {
            Err(ArpError::Read("listen loop panicked".to_string()))
        });
        debug!("both loops joined, releasing capture channel");

        swept?;
        listened?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::net::Ipv4Addr;
    use std::sync::Mutex;
    use std::time::Instant;

    use ipnetwork::Ipv4Network;
    use pnet::datalink::{MacAddr, NetworkInterface};

    fn test_config() -> ScanConfig {
        let interface = NetworkInterface {
            name: "test0".to_string(),
            description: String::new(),
            index: 7,
            mac: Some(MacAddr::new(0x01, 0x02, 0x03, 0x04, 0x05, 0x06)),
            ips: vec![],
            flags: 0,
        };
        ScanConfig {
            source_mac: interface.mac.unwrap(),
            interface,
            network: Ipv4Network::new(Ipv4Addr::new(10, 0, 0, 5), 24).unwrap(),
            interval: Duration::from_secs(60),
        }
    }

    struct CountingSender {
        frames: Arc<Mutex<usize>>,
    }

    impl FrameSender for CountingSender {
        fn send_frame(&mut self, _frame: &[u8]) -> ArpResult<()> {
            *self.frames.lock().unwrap() += 1;
            Ok(())
        }
    }

    struct SilentReceiver;

    impl FrameReceiver for SilentReceiver {
        fn recv_frame(&mut self) -> ArpResult<Option<Vec<u8>>> {
            thread::sleep(Duration::from_millis(10));
            Ok(None)
        }
    }

    struct BrokenSender;

    impl FrameSender for BrokenSender {
        fn send_frame(&mut self, _frame: &[u8]) -> ArpResult<()> {
            Err(ArpError::Write("injection failed".to_string()))
        }
    }

    #[test]
    fn session_sweeps_once_and_shuts_down_within_the_grace_period() {
        let frames = Arc::new(Mutex::new(0));
        let tx = CountingSender { frames: Arc::clone(&frames) };
        let stop = Arc::new(AtomicBool::new(false));

        let session_stop = Arc::clone(&stop);
        let runner = thread::spawn(move || {
            ScanSession::new(test_config()).run_with_channel(
                Box::new(tx),
                Box::new(SilentReceiver),
                session_stop,
            )
        });

        // Let the first sweep go out, then interrupt.
        let deadline = Instant::now() + Duration::from_millis(1100);
        while *frames.lock().unwrap() < 254 && Instant::now() < deadline {
            thread::sleep(Duration::from_millis(10));
        }
        assert_eq!(*frames.lock().unwrap(), 254);

        let signalled = Instant::now();
        stop.store(true, Ordering::SeqCst);
        runner.join().expect("session should not panic").unwrap();
        assert!(signalled.elapsed() < Duration::from_secs(2));
        assert_eq!(*frames.lock().unwrap(), 254);
    }

    #[test]
    fn a_failing_sweeper_stops_the_listener_too() {
        let stop = Arc::new(AtomicBool::new(false));
        let result = ScanSession::new(test_config()).run_with_channel(
            Box::new(BrokenSender),
            Box::new(SilentReceiver),
            Arc::clone(&stop),
        );
        assert!(matches!(result, Err(ArpError::Write(_))));
        assert!(stop.load(Ordering::SeqCst));
    }
}
