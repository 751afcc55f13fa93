use std::net::SocketAddr;
use tracing::{info, warn};
use tracing_subscriber::EnvFilter;
use vm_snapshot_agent::auth::{get_or_create_api_key, AccessControl, PermissionMap};
use vm_snapshot_agent::dispatcher::SnapshotDispatcher;
use vm_snapshot_agent::inventory::Inventory;
use vm_snapshot_agent::routes::{routes, AppState};
use vm_snapshot_agent::settings::load_settings;
use vm_snapshot_agent::task_manager::TaskManager;
use vm_snapshot_agent::utils::HrefBuilder;

//-----------------------------------------------------
// MAIN FUNCTION
//-----------------------------------------------------

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| EnvFilter::new("info,vm_snapshot_agent=debug")),
        )
        .init();

    info!(version = env!("CARGO_PKG_VERSION"), "Starting VM snapshot agent");
    let settings = load_settings();
    let permissions = PermissionMap::standard();

    // Without configured users, fall back to a single generated admin key
    let access = if settings.users.is_empty() {
        let api_key = get_or_create_api_key(&settings.api_key_file)?;
        info!(path = %settings.api_key_file.display(), "No users configured, admin API key in use");
        AccessControl::admin(&api_key, &permissions)
    } else {
        info!(users = settings.users.len(), "Loaded API users");
        AccessControl::new(&settings.users)
    };

    let inventory = match &settings.inventory_file {
        Some(path) => Inventory::load(path)?,
        None => {
            warn!("No inventory_file configured, starting with an empty inventory");
            Inventory::new()
        }
    };

    let tasks = TaskManager::new();
    let dispatcher = SnapshotDispatcher::new(
        inventory,
        tasks.clone(),
        permissions,
        HrefBuilder::new(&settings.server.base_url),
    );
    let routes = routes(AppState::new(dispatcher, access, tasks));

    let addr: SocketAddr = format!("{}:{}", settings.server.bind, settings.server.port).parse()?;
    info!(%addr, "Server starting");
    warp::serve(routes).run(addr).await;

    Ok(())
}
