// Portal Autologin - Main Entry Point
// Copyright (C) 2026 Christos A. Daggas
// SPDX-License-Identifier: MIT

//! # Portal Autologin
//!
//! Background daemon that accepts captive portal pages on known Wi-Fi
//! networks.

use std::env;
use std::path::PathBuf;
use std::process::ExitCode;
use std::sync::Arc;
use tokio::sync::mpsc;
use tracing::{debug, error, info, warn};

use portal_autologin::models::ProfileTemplate;
use portal_autologin::network::{HttpProbe, NmNetwork};
use portal_autologin::services::{
    AutomationController, AutomationDriver, DesktopNotifier, DriverRegistry, LogNotifier,
    NetworkOrchestrator, Notifier,
};
use portal_autologin::storage::{default_config_dir, ProfileStore, SETTINGS_FILENAME};
use portal_autologin::ui::atspi::AtspiTree;
use portal_autologin::ui::UiTree;
use portal_autologin::{AppConfig, Result, APP_NAME, VERSION};

/// Print version information and exit.
fn print_version() {
    println!("{} {}", APP_NAME, VERSION);
    println!("Copyright (C) 2026 Christos A. Daggas");
    println!("License: MIT");
    println!();
    println!("Captive portal auto-login daemon for Linux Wi-Fi networks.");
}

/// Print help information and exit.
fn print_help() {
    println!(
        "Usage: {} [OPTIONS]",
        env::args().next().unwrap_or_else(|| "portal-autologin".to_string())
    );
    println!();
    println!("Captive portal auto-login daemon for Linux Wi-Fi networks.");
    println!();
    println!("Options:");
    println!("  -h, --help            Show this help message and exit");
    println!("  -v, --version         Show version information and exit");
    println!("  -d, --debug           Enable debug logging");
    println!("  -c, --config <PATH>   Read settings from PATH");
    println!("      --list-profiles   Print stored profiles and exit");
    println!("      --list-templates  Print built-in profile templates and exit");
    println!();
    println!("Environment variables:");
    println!("  RUST_LOG              Set log level (trace, debug, info, warn, error)");
}

fn list_profiles(store: &ProfileStore) {
    for profile in store.load_profiles() {
        println!(
            "{}\t{}\t{}\t{}",
            profile.id,
            profile.match_type.as_str(),
            profile.ssid,
            if profile.enabled { "enabled" } else { "disabled" }
        );
    }
}

fn list_templates() {
    for template in ProfileTemplate::all() {
        println!(
            "{:<16} {:<24} {}",
            template.name(),
            template.default_ssid(),
            template.description()
        );
    }
}

async fn run_daemon(config: AppConfig, store: Arc<ProfileStore>) -> Result<()> {
    let tree = match AtspiTree::connect().await {
        Ok(tree) => tree,
        Err(e) => {
            warn!("Accessibility bus unavailable, portal automation disabled: {}", e);
            AtspiTree::disconnected()
        }
    };
    let tree = Arc::new(tree);

    let notifier: Arc<dyn Notifier> = if config.show_notifications {
        match DesktopNotifier::connect().await {
            Ok(notifier) => Arc::new(notifier),
            Err(e) => {
                warn!("Desktop notifications unavailable: {}", e);
                Arc::new(LogNotifier)
            }
        }
    } else {
        Arc::new(LogNotifier)
    };

    let controller = Arc::new(AutomationController::new(
        Arc::clone(&tree),
        notifier,
        config.automation.clone(),
    ));

    let mut drivers = DriverRegistry::new();
    drivers.register(Arc::new(AutomationDriver::new(
        Arc::clone(&controller),
        config.automation.handoff_delay(),
    )));

    let network = Arc::new(NmNetwork::new());
    let orchestrator = NetworkOrchestrator::new(
        network.clone(),
        Arc::new(HttpProbe::new(&config.network)?),
        store,
        Arc::new(drivers),
        config.network.clone(),
    );

    let (ui_tx, mut ui_rx) = mpsc::channel(64);
    if tree.is_available() {
        let pump_tree = Arc::clone(&tree);
        tokio::spawn(async move {
            if let Err(e) = pump_tree.run_event_pump(ui_tx).await {
                warn!("Accessibility event pump stopped: {}", e);
            }
        });
    }
    tokio::spawn(async move {
        while let Some(kind) = ui_rx.recv().await {
            if controller.handle_ui_event(kind).is_none() {
                debug!("UI event {:?} ignored", kind);
            }
        }
    });

    let (net_tx, net_rx) = mpsc::channel(32);
    let watcher = tokio::spawn(async move { network.watch_events(net_tx).await });
    let orchestrator = tokio::spawn(orchestrator.run(net_rx));

    info!("{} running", APP_NAME);
    tokio::select! {
        _ = tokio::signal::ctrl_c() => info!("Interrupted, shutting down"),
        result = watcher => match result {
            Ok(Ok(())) => info!("NetworkManager watcher finished"),
            Ok(Err(e)) => return Err(e),
            Err(e) => error!("NetworkManager watcher panicked: {}", e),
        },
        _ = orchestrator => info!("Network orchestrator finished"),
    }
    Ok(())
}

fn main() -> ExitCode {
    let args: Vec<String> = env::args().collect();
    let mut debug_mode = false;
    let mut config_path: Option<PathBuf> = None;
    let mut show_profiles = false;
    let mut show_templates = false;

    let mut iter = args.iter().skip(1);
    while let Some(arg) = iter.next() {
        match arg.as_str() {
            "-h" | "--help" => {
                print_help();
                return ExitCode::SUCCESS;
            }
            "-v" | "--version" => {
                print_version();
                return ExitCode::SUCCESS;
            }
            "-d" | "--debug" => {
                debug_mode = true;
            }
            "-c" | "--config" => match iter.next() {
                Some(path) => config_path = Some(PathBuf::from(path)),
                None => {
                    eprintln!("Option {} requires a path", arg);
                    return ExitCode::FAILURE;
                }
            },
            "--list-profiles" => {
                show_profiles = true;
            }
            "--list-templates" => {
                show_templates = true;
            }
            _ => {
                eprintln!("Unknown option: {}", arg);
                eprintln!("Try '--help' for more information.");
                return ExitCode::FAILURE;
            }
        }
    }

    if show_templates {
        list_templates();
        return ExitCode::SUCCESS;
    }

    let config_path = config_path.unwrap_or_else(|| default_config_dir().join(SETTINGS_FILENAME));
    let (config, load_error) = match AppConfig::load(&config_path) {
        Ok(config) => (config, None),
        Err(e) => (AppConfig::default(), Some(e)),
    };

    // Initialize logging with appropriate level
    let directive = if debug_mode { "debug" } else { config.log_level.as_str() };
    let filter = tracing_subscriber::EnvFilter::builder()
        .with_default_directive(tracing::Level::INFO.into())
        .parse_lossy(format!(
            "{},{}",
            directive,
            env::var("RUST_LOG").unwrap_or_default()
        ));
    tracing_subscriber::fmt().with_env_filter(filter).init();

    if let Some(e) = load_error {
        warn!("Failed to load settings from {:?}, using defaults: {}", config_path, e);
    }

    let store = Arc::new(ProfileStore::new());
    if show_profiles {
        list_profiles(&store);
        return ExitCode::SUCCESS;
    }

    info!("Starting {} v{}", APP_NAME, VERSION);
    info!("Settings: {:?}", config_path);

    let runtime = match tokio::runtime::Builder::new_multi_thread()
        .enable_all()
        .build()
    {
        Ok(runtime) => runtime,
        Err(e) => {
            eprintln!("Failed to create Tokio runtime: {}", e);
            return ExitCode::FAILURE;
        }
    };

    match runtime.block_on(run_daemon(config, store)) {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            error!("{}", e);
            ExitCode::FAILURE
        }
    }
}
