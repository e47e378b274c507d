use std::sync::atomic::AtomicUsize;
use std::sync::Arc;
use tokio::net::TcpListener;

use custom_page_loader::config::{AppState, Config};
use custom_page_loader::logger;
use custom_page_loader::server::{
    create_reusable_listener, start_server_loop, start_signal_handler, ListenerKind,
    SignalHandler,
};

fn main() -> Result<(), Box<dyn std::error::Error>> {
    // Config file path (without extension) from argv[1], default "config"
    let config_path = std::env::args().nth(1).unwrap_or_else(|| "config".to_string());
    let cfg = Config::load_from(&config_path)?;
    logger::init(&cfg)?;

    let mut runtime_builder = tokio::runtime::Builder::new_multi_thread();
    runtime_builder.enable_all();
    if let Some(workers) = cfg.server.workers {
        runtime_builder.worker_threads(workers);
    }
    let runtime = runtime_builder.build()?;

    runtime.block_on(async_main(cfg))
}

async fn async_main(cfg: Config) -> Result<(), Box<dyn std::error::Error>> {
    let site_addr = cfg.socket_addr()?;
    let admin_addr = cfg.admin_socket_addr()?;

    let site_listener = create_reusable_listener(site_addr)?;
    let admin_listener = create_reusable_listener(admin_addr)?;

    std::fs::create_dir_all(&cfg.bundles.upload_dir)?;
    let state = Arc::new(AppState::new(&cfg));
    logger::log_server_start(&site_addr, &admin_addr, &cfg);

    // Use LocalSet for spawn_local support
    let local = tokio::task::LocalSet::new();
    local
        .run_until(run_dual_servers(site_listener, admin_listener, state))
        .await
}

async fn run_dual_servers(
    site_listener: TcpListener,
    admin_listener: TcpListener,
    state: Arc<AppState>,
) -> Result<(), Box<dyn std::error::Error>> {
    let signals = Arc::new(SignalHandler::new());
    start_signal_handler(Arc::clone(&signals));

    let admin_state = Arc::clone(&state);
    let admin_signals = Arc::clone(&signals);
    let admin_task = tokio::task::spawn_local(async move {
        if let Err(e) = start_server_loop(
            admin_listener,
            admin_state,
            Arc::new(AtomicUsize::new(0)),
            ListenerKind::Admin,
            admin_signals,
        )
        .await
        {
            logger::log_error(&format!("Admin listener error: {e}"));
        }
    });

    start_server_loop(
        site_listener,
        state,
        Arc::new(AtomicUsize::new(0)),
        ListenerKind::Site,
        signals,
    )
    .await?;

    let _ = admin_task.await;
    Ok(())
}
