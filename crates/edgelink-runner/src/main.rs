//! `edgelink`: run one side of the framed serial link.
//!
//! ```text
//! edgelink --role edge --port /dev/ttyUSB0
//! edgelink --role controller --config controller.yaml --duration-secs 30
//! edgelink --loopback --duration-secs 5
//! ```

use std::path::PathBuf;
use std::process::ExitCode;
use std::sync::Arc;
use std::time::{Duration, Instant};

use clap::Parser;
use edgelink_runner::{
    list_ports, spawn_loopback_pair, ConfigError, LinkConfig, LinkError, LinkNode, Role,
    SerialChannel, Shutdown,
};
use tracing::{error, info, warn};
use tracing_subscriber::EnvFilter;

#[derive(Debug, Parser)]
#[command(
    author,
    version,
    about = "Edge/controller endpoint for the framed serial request/acknowledge link",
    long_about = None
)]
struct Cli {
    /// Role to play (required unless given in --config or using --loopback)
    #[arg(long, value_enum)]
    role: Option<Role>,

    /// YAML configuration file; flags override its values
    #[arg(long, value_name = "FILE")]
    config: Option<PathBuf>,

    /// Serial port name (defaults to COM6 for edge, COM5 for controller)
    #[arg(long)]
    port: Option<String>,

    /// Serial baud rate
    #[arg(long)]
    baud: Option<u32>,

    /// Transmit interval in milliseconds
    #[arg(long)]
    interval_ms: Option<u64>,

    /// Receive polling interval in milliseconds
    #[arg(long)]
    poll_ms: Option<u64>,

    /// Abandon unterminated frames at this many bytes
    #[arg(long)]
    max_frame_len: Option<usize>,

    /// Only receive (and acknowledge); do not send periodic packets
    #[arg(long)]
    listen_only: bool,

    /// Stop after this many seconds instead of waiting for Ctrl-C
    #[arg(long)]
    duration_secs: Option<u64>,

    /// Run an edge and a controller against each other in-process
    #[arg(long, conflicts_with_all = ["role", "port", "config"])]
    loopback: bool,

    /// List available serial ports and exit
    #[arg(long)]
    list_ports: bool,

    /// Log filter used when RUST_LOG is unset
    #[arg(long, default_value = "info")]
    log_level: String,
}

impl Cli {
    fn apply_overrides(&self, mut config: LinkConfig) -> Result<LinkConfig, ConfigError> {
        if let Some(port) = &self.port {
            config.port = Some(port.clone());
        }
        if let Some(baud) = self.baud {
            config.baud_rate = baud;
        }
        if let Some(interval) = self.interval_ms {
            config.tx_interval_ms = Some(interval);
        }
        if let Some(poll) = self.poll_ms {
            config.poll_interval_ms = poll;
        }
        if let Some(max) = self.max_frame_len {
            config.max_frame_len = max;
        }
        if self.listen_only {
            config.transmit = false;
        }
        config.validate()?;
        Ok(config)
    }

    fn node_config(&self) -> Result<LinkConfig, ConfigError> {
        let mut config = match (&self.config, self.role) {
            (Some(path), _) => LinkConfig::load(path)?,
            (None, Some(role)) => LinkConfig::for_role(role),
            (None, None) => {
                return Err(ConfigError::Invalid(
                    "--role is required without --config".into(),
                ))
            }
        };
        if let Some(role) = self.role {
            config.role = role;
        }
        self.apply_overrides(config)
    }
}

fn init_tracing(default_filter: &str) {
    let env_filter = EnvFilter::try_from_default_env()
        .or_else(|_| EnvFilter::try_new(default_filter))
        .unwrap_or_else(|_| EnvFilter::new("info"));
    tracing_subscriber::fmt()
        .with_env_filter(env_filter)
        .with_thread_names(true)
        .init();
}

/// Block until shutdown, the optional deadline, or every node has exited.
fn wait_for_exit(signal: &Shutdown, nodes: &[&LinkNode], duration: Option<Duration>) {
    let deadline = duration.map(|d| Instant::now() + d);
    loop {
        if nodes.iter().all(|node| node.is_finished()) {
            return;
        }
        let slice = match deadline {
            Some(deadline) => {
                let remaining = deadline.saturating_duration_since(Instant::now());
                if remaining.is_zero() {
                    info!("Run duration elapsed, stopping");
                    signal.trigger();
                    return;
                }
                remaining.min(Duration::from_millis(250))
            }
            None => Duration::from_millis(250),
        };
        if signal.wait(slice) {
            return;
        }
    }
}

fn install_ctrlc(signal: &Shutdown) {
    let signal = signal.clone();
    if let Err(e) = ctrlc::set_handler(move || {
        info!("Ctrl-C received, stopping");
        signal.trigger();
    }) {
        warn!("Failed to install Ctrl-C handler: {}", e);
    }
}

fn run(cli: &Cli) -> Result<(), LinkError> {
    let duration = cli.duration_secs.map(Duration::from_secs);

    if cli.loopback {
        let edge = cli.apply_overrides(LinkConfig::for_role(Role::Edge))?;
        let controller = cli.apply_overrides(LinkConfig::for_role(Role::Controller))?;
        let (edge_node, controller_node) = spawn_loopback_pair(&edge, &controller)?;

        let signal = edge_node.shutdown_signal();
        install_ctrlc(&signal);
        wait_for_exit(&signal, &[&edge_node, &controller_node], duration);
        signal.trigger();

        let edge_result = edge_node.join();
        let controller_result = controller_node.join();
        return edge_result.and(controller_result);
    }

    let config = cli.node_config()?;
    let channel = SerialChannel::open(&config)?;
    let node = LinkNode::spawn(&config, Arc::new(channel))?;

    let signal = node.shutdown_signal();
    install_ctrlc(&signal);
    wait_for_exit(&signal, &[&node], duration);
    signal.trigger();
    node.join()
}

fn main() -> ExitCode {
    let cli = Cli::parse();
    init_tracing(&cli.log_level);
    edgelink_metrics::describe_metrics();

    if cli.list_ports {
        return match list_ports() {
            Ok(ports) if ports.is_empty() => {
                println!("No serial ports found");
                ExitCode::SUCCESS
            }
            Ok(ports) => {
                for port in ports {
                    println!("{}", port);
                }
                ExitCode::SUCCESS
            }
            Err(e) => {
                error!("Failed to enumerate serial ports: {}", e);
                ExitCode::FAILURE
            }
        };
    }

    match run(&cli) {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            error!("{}", e);
            ExitCode::FAILURE
        }
    }
}
