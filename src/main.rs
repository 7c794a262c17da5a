use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

use clap::{Parser, Subcommand};

use lib_arp::{ArpError, ArpResult, ScanConfig, ScanSession, SubnetPolicy};

#[derive(Parser)]
#[command(name = "lansweep", version, about = "Discover hosts on the local subnet via ARP")]
struct Cli {
    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// Start listening to ARP packets on the given interface and print them
    /// to stdout, while periodically asking the whole subnet to answer.
    Scan {
        /// Network interface to scan
        interface: String,

        /// How often to broadcast a new round of ARP requests. A possibly
        /// signed decimal duration with a unit suffix from
        /// "ns", "us", "ms", "s", "m" or "h", such as "300ms" or "1.5h".
        #[arg(short, long, default_value = "20s")]
        interval: String,
    },
}

fn main() {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info"))
        .format_timestamp_secs()
        .init();

    let cli = Cli::parse();
    match cli.command {
        Command::Scan { interface, interval } => {
            if let Err(e) = run_scan(&interface, &interval) {
                eprintln!("[ERROR]: {}", e);
                std::process::exit(1);
            }
        }
    }
}

fn run_scan(interface: &str, interval: &str) -> ArpResult<()> {
    if users::get_effective_uid() != 0 {
        return Err(ArpError::Configuration(
            "must run as root to open a raw capture channel".to_string(),
        ));
    }

    let config = ScanConfig::new(interface, interval, SubnetPolicy::default())?;

    let stop = Arc::new(AtomicBool::new(false));
    let handler_stop = Arc::clone(&stop);
    ctrlc::set_handler(move || handler_stop.store(true, Ordering::SeqCst)).map_err(|e| {
        ArpError::Configuration(format!("cannot install interrupt handler: {}", e))
    })?;

    ScanSession::new(config).run(stop)
}
