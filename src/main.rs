use anyhow::{Context, Result};
use clap::Parser;
use env_logger::Env;
use midi_bridge::{
    bridge::Bridge,
    config::{self, Args, FrontEnd},
    http,
    midi::{MidiOutputBackend, MidirBackend},
    registry::PortRegistry,
    shutdown, ws,
};
use std::sync::Arc;
use tokio::{net::TcpListener, runtime};

fn main() -> Result<()> {
    env_logger::Builder::from_env(Env::default().default_filter_or("info")).init();
    let args = Args::parse();

    let backend: Arc<dyn MidiOutputBackend> = Arc::new(MidirBackend);
    let Some(front_end) = args.command.front_end() else {
        for name in backend.port_names()? {
            println!("{name}");
        }
        return Ok(());
    };

    log::info!("=== MIDI Bridge (Ctrl+C to Quit) ===");
    let registry = PortRegistry::new(backend).context("enumerate MIDI outputs")?;
    let default_device =
        config::resolve_default_device(args.default_device.as_deref(), registry.known_devices())?;

    log::info!("Available MIDI Output Devices:");
    for name in registry.known_devices() {
        if *name == default_device {
            log::info!("\t{name} (default)");
        } else {
            log::info!("\t{name}");
        }
    }

    let bridge = Arc::new(Bridge::new(registry, default_device));

    // WebSocket clients share one cooperative thread; HTTP gets a worker pool.
    let rt = match front_end {
        FrontEnd::Ws => runtime::Builder::new_current_thread(),
        FrontEnd::Http => runtime::Builder::new_multi_thread(),
    }
    .enable_all()
    .build()
    .context("build tokio runtime")?;

    let served = rt.block_on(async {
        let listener = TcpListener::bind((args.host.as_str(), args.port))
            .await
            .with_context(|| format!("bind {}:{}", args.host, args.port))?;
        match front_end {
            FrontEnd::Ws => ws::serve(listener, Arc::clone(&bridge), shutdown::signal()).await,
            FrontEnd::Http => http::serve(listener, Arc::clone(&bridge), shutdown::signal()).await,
        }
    });

    log::info!("Closing all open MIDI ports");
    bridge.registry().close_all();
    log::info!("=== MIDI Bridge Stopped ===");
    served
}
