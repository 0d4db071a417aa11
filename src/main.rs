#![forbid(unsafe_code)]

mod cli;

use anyhow::{Context, Result};
use clap::Parser;
use tracing::{error, info, warn, Level as TraceLevel};
use tracing_subscriber::FmtSubscriber;

use cli::{CliArgs, Command};
use sidebar_dock::x11::{RandrMonitors, StrutTransport, X11Context, X11Window};
use sidebar_dock::{ConfigStore, ConfigUpdate, DockEvent, SidebarDock};

fn init_logging() -> Result<()> {
    // Parse log level from environment variable
    let log_level = match std::env::var("LOG_LEVEL")
        .unwrap_or_else(|_| "info".to_string())
        .to_lowercase()
        .as_str()
    {
        "trace" => TraceLevel::TRACE,
        "debug" => TraceLevel::DEBUG,
        "warn" => TraceLevel::WARN,
        "error" => TraceLevel::ERROR,
        _ => TraceLevel::INFO,
    };

    let subscriber = FmtSubscriber::builder()
        .with_max_level(log_level)
        .with_writer(std::io::stderr)
        .finish();
    tracing::subscriber::set_global_default(subscriber).context("Failed to install tracing subscriber")?;
    Ok(())
}

fn run(store: ConfigStore, window: Option<u32>, active: bool, embed: bool, restore: bool) -> Result<()> {
    let ctx = X11Context::connect()?;
    let screen = ctx.screen();
    info!(
        screen = ctx.screen_num,
        width = screen.width_in_pixels,
        height = screen.height_in_pixels,
        "Connected to X11"
    );

    let window = match window {
        Some(w) => w,
        None if active => ctx.active_window()?.context("No active window reported by the window manager")?,
        None => anyhow::bail!("No window given"),
    };

    let mut dock = SidebarDock::new(
        X11Window::new(&ctx, window),
        RandrMonitors::new(&ctx),
        StrutTransport::new(&ctx),
        store,
    );
    dock.subscribe(|event| match event {
        DockEvent::Error(message) => error!(message = %message, "Dock error"),
        other => info!(event = ?other, "Dock event"),
    });

    if restore && !dock.restore_free_geometry() {
        warn!(window = window, "No free-floating geometry restored");
    }
    if (embed || dock.config().last_embedded) && !dock.embed() {
        warn!(window = window, "Window left undocked");
    }

    // Release the reservation whatever ended the signal loop
    let result = wait_for_signals(&mut dock);
    dock.cleanup();
    result
}

#[cfg(unix)]
fn wait_for_signals<W, M, T>(dock: &mut SidebarDock<W, M, T>) -> Result<()>
where
    W: sidebar_dock::HostWindow,
    M: sidebar_dock::MonitorResolver,
    T: sidebar_dock::AppBarTransport,
{
    use signal_hook::consts::{SIGHUP, SIGINT, SIGTERM, SIGUSR1};
    use signal_hook::iterator::Signals;

    let mut signals =
        Signals::new([SIGUSR1, SIGHUP, SIGINT, SIGTERM]).context("Failed to register signal handlers")?;
    info!(pid = std::process::id(), "Running; SIGUSR1 toggles, SIGHUP reloads config");

    for signal in signals.forever() {
        match signal {
            SIGUSR1 => {
                let ok = dock.toggle();
                info!(ok = ok, embedded = dock.is_embedded(), "Toggled dock");
            }
            SIGHUP => {
                if let Err(e) = dock.reload_config() {
                    warn!(error = %e, "Failed to reload config");
                }
            }
            _ => {
                info!(signal = signal, "Shutting down");
                break;
            }
        }
    }
    Ok(())
}

#[cfg(not(unix))]
fn wait_for_signals<W, M, T>(_dock: &mut SidebarDock<W, M, T>) -> Result<()>
where
    W: sidebar_dock::HostWindow,
    M: sidebar_dock::MonitorResolver,
    T: sidebar_dock::AppBarTransport,
{
    anyhow::bail!("The run command needs Unix signals")
}

fn set_options(store: &ConfigStore, options: &[(String, String)]) -> Result<()> {
    let update = ConfigUpdate::from_options(options.iter().map(|(k, v)| (k, v)))?;
    let mut config = store.load();
    config.apply(&update)?;
    store.save(&config)?;
    info!(path = %store.path().display(), "Updated config");
    Ok(())
}

fn main() -> Result<()> {
    init_logging()?;
    let args = CliArgs::parse();
    let store = ConfigStore::new(args.config.unwrap_or_else(ConfigStore::default_path));

    match args.command {
        Command::Run {
            window,
            active,
            embed,
            restore,
        } => run(store, window, active, embed, restore),
        Command::Status => {
            let config = store.load();
            let json = serde_json::to_string_pretty(&config).context("Failed to serialize config")?;
            println!("{}", json);
            Ok(())
        }
        Command::Set { options } => set_options(&store, &options),
    }
}
