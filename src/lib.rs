pub mod cli;
pub mod config;
pub mod llm;
pub mod models;
pub mod server;
pub mod session;
pub mod store;

use cli::Args;
use config::settings::SettingsService;
use llm::chat::new_registry;
use log::info;
use server::Server;
use session::ChatSession;
use std::error::Error;
use std::net::SocketAddr;
use std::sync::Arc;

pub async fn run(args: Args) -> Result<(), Box<dyn Error + Send + Sync>> {
    info!("--- Core Configuration ---");
    info!("Store Type: {}", args.store_type);
    match args.store_type.as_str() {
        "redis" => {
            info!("Store Redis URL: {}", args.store_redis_url);
            info!("Store Redis Prefix: {}", args.store_redis_prefix);
        }
        "file" => {
            let path = args.store_path.clone().unwrap_or_else(store::default_store_path);
            info!("Store Path: {}", path.display());
        }
        _ => {}
    }
    info!("Mock Mode: {}", args.mock);
    if let Some(port) = args.http_port {
        info!("HTTP Bridge: {}:{}", args.http_host, port);
    }
    info!("-------------------------");

    let store = store::create_store(&args).await?;
    let settings = Arc::new(SettingsService::load(Arc::clone(&store)).await?);

    for (provider, key) in args.supplied_keys() {
        info!("Importing {} API key from arguments", provider.display_name());
        settings.save_api_key(provider, &key).await?;
    }

    if args.provider.is_some() || args.model.is_some() || args.theme.is_some() {
        let saved = settings.update_settings(|s| {
            if let Some(provider) = args.provider {
                if provider != s.provider {
                    s.model = None;
                }
                s.provider = provider;
            }
            if let Some(model) = &args.model {
                s.model = Some(model.clone());
            }
            if let Some(theme) = args.theme {
                s.theme = theme;
            }
        }).await?;
        info!("Selected {} ({})", saved.provider.display_name(), saved.effective_model());
    }

    let registry = new_registry(&args.llm_config())?;
    let session = Arc::new(ChatSession::new(registry, settings, store));

    if let Some(message) = &args.message {
        session.load_history().await?;
        match session.submit(message).await? {
            Some(reply) => println!("{}", cli::shell::format_message(&reply)),
            None => println!("{}", session.status()),
        }
        return Ok(());
    }

    if let Some(port) = args.http_port {
        let addr: SocketAddr = format!("{}:{}", args.http_host, port).parse()?;
        info!("Starting HTTP bridge on: {}", addr);
        Server::new(addr, session).run().await?;
        return Ok(());
    }

    cli::shell::run(session).await
}
