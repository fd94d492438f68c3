use anyhow::Result;
use renamebot::bot::{FlowController, MembershipGate};
use renamebot::config::Config;
use renamebot::server::{PollingService, RestartPolicy, Supervisor};
use renamebot::session::{Clock, SessionStore, SessionSweeper, SystemClock};
use renamebot::telegram::{TelegramApi, TelegramClient};
use std::sync::Arc;
use tokio_util::sync::CancellationToken;
use tracing::{info, warn};

pub async fn run(config: Config) -> Result<()> {
    let token = config.bot_token()?.to_string();
    let client = TelegramClient::new(
        token,
        config.telegram.api_base.clone(),
        config.request_timeout()?,
    )?;
    let api: Arc<dyn TelegramApi> = Arc::new(client);

    let store = SessionStore::new();
    let clock: Arc<dyn Clock> = Arc::new(SystemClock);
    let gate = MembershipGate::new(
        config.membership.channel.clone(),
        config.membership.enforce,
    );

    info!("{}", "=".repeat(50));
    info!("Bot is starting...");
    info!(
        "Channel: {}",
        config.membership.channel.as_deref().unwrap_or("(none)")
    );
    info!("Membership enforced: {}", config.membership.enforce);
    info!("Session TTL: {}", config.session.ttl);
    info!("{}", "=".repeat(50));

    let cancel = CancellationToken::new();

    let sweeper = SessionSweeper::new(
        store.clone(),
        clock.clone(),
        config.sweep_interval()?,
        config.session_ttl()?,
    )
    .spawn(cancel.clone());

    let controller = Arc::new(FlowController::new(
        api.clone(),
        store,
        clock,
        gate,
        config.rename.clone(),
    ));
    let polling = PollingService::new(api, controller, config.telegram.poll_timeout);
    let supervisor = Supervisor::new(
        "Telegram polling",
        RestartPolicy::from_config(&config.supervisor)?,
    );

    let shutdown = cancel.clone();
    tokio::spawn(async move {
        if tokio::signal::ctrl_c().await.is_ok() {
            info!("Shutdown requested");
            shutdown.cancel();
        }
    });

    let polling = &polling;
    let token = &cancel;
    let result = supervisor.run(&cancel, move || polling.run(token)).await;

    cancel.cancel();
    if let Err(e) = sweeper.await {
        warn!("Session sweeper ended abnormally: {}", e);
    }

    result?;
    info!("Bot stopped");
    Ok(())
}
