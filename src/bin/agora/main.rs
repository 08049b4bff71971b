use actix::Actor;
use actix_web::middleware::Logger;
use actix_web::web::Data;
use actix_web::{App, HttpServer};
use agora::notifications::{Discard, NotificationHub, PushChannel};
use agora::web::notifications_ws::NotificationServer;
use agora::{app_config, db, CommentBoard, FlagWorkflow, FollowGraph, InteractionLedger, SessionRegistry, WarningLog};
use anyhow::Context;
use env_logger::Env;
use std::sync::Arc;

#[actix_web::main]
async fn main() -> anyhow::Result<()> {
    init_lib_mods();
    app_config::init();

    let config = app_config::get_config();

    db::init_db(config.database.url.clone()).await;
    let pool = db::get_db_pool().to_owned();
    db::init_schema(&pool)
        .await
        .context("Failed to apply database schema")?;

    match agora::admin::ensure_default_admin(&pool, &config.admin).await {
        Ok(Some(admin)) => log::info!("Default admin is user {}", admin.id),
        Ok(None) => {}
        Err(e) => log::error!("Failed to seed default admin: {}", e),
    }

    let notification_server = NotificationServer::new(config.notifications.mailbox_capacity).start();
    let push: Arc<dyn PushChannel> = if config.notifications.push_enabled {
        Arc::new(notification_server.clone())
    } else {
        log::info!("Real-time push disabled");
        Arc::new(Discard)
    };

    let hub = NotificationHub::new(pool.clone(), push);
    let sessions = SessionRegistry::new(config.session.token_bytes);
    let ledger = InteractionLedger::new(pool.clone(), hub.clone());
    let flags = FlagWorkflow::new(pool.clone(), hub.clone());
    let warnings = WarningLog::new(pool.clone(), hub.clone());
    let comments = CommentBoard::new(pool.clone(), hub.clone());
    let follows = FollowGraph::new(pool.clone());

    let bind_address = config.site.bind_address.clone();
    log::info!("{} listening on {}", config.site.name, bind_address);

    HttpServer::new(move || {
        App::new()
            .app_data(Data::new(notification_server.clone()))
            .app_data(Data::new(hub.clone()))
            .app_data(Data::new(sessions.clone()))
            .app_data(Data::new(ledger.clone()))
            .app_data(Data::new(flags.clone()))
            .app_data(Data::new(warnings.clone()))
            .app_data(Data::new(comments.clone()))
            .app_data(Data::new(follows.clone()))
            .wrap(Logger::new("%a %{User-Agent}i"))
            .configure(agora::web::configure)
    })
    .bind(&bind_address)
    .with_context(|| format!("Failed to bind {}", bind_address))?
    .run()
    .await?;

    Ok(())
}

/// Initialize third party crates we rely on but don't have control over.
fn init_lib_mods() {
    // A missing .env is fine; configuration also comes from config.toml and the environment.
    if let Err(e) = dotenv::dotenv() {
        eprintln!("No .env loaded: {}", e);
    }

    let filter = app_config::site().log_filter;
    env_logger::Builder::from_env(Env::default().default_filter_or(filter)).init();
}
