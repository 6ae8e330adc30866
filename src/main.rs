use anyhow::Result;
use serenity::{
    http::Http,
    model::{gateway::GatewayIntents, id::ApplicationId},
    Client,
};
use songbird::{SerenityInit, Songbird};
use std::sync::Arc;
use tracing::{error, info};

mod audio;
mod bot;
mod config;
mod sources;
mod ui;

use crate::audio::player::SongbirdEngine;
use crate::bot::{commands, MusicBot};
use crate::config::Config;

#[tokio::main]
async fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::from_default_env()
                .add_directive("slash_jukebox=debug".parse()?)
                .add_directive("serenity=info".parse()?)
                .add_directive("songbird=info".parse()?),
        )
        .init();

    info!("🎵 Iniciando slash-jukebox v{}", env!("CARGO_PKG_VERSION"));

    let config = Config::load()?;
    info!("{}", config.summary());

    let application_id = ApplicationId::new(config.application_id);
    let http = Arc::new(Http::new(&config.discord_token));
    http.set_application_id(application_id);

    // Se publican una vez por arranque; el gateway no espera.
    commands::spawn_registration(http.clone());

    let intents = GatewayIntents::GUILDS | GatewayIntents::GUILD_VOICE_STATES;

    let voice = Songbird::serenity();
    let engine = SongbirdEngine::new(
        voice.clone(),
        http,
        config.default_volume,
        config.max_queue_size,
    );
    let handler = MusicBot::new(Arc::new(engine));

    let mut client = Client::builder(&config.discord_token, intents)
        .application_id(application_id)
        .event_handler(handler)
        .register_songbird_with(voice)
        .await?;

    let shard_manager = client.shard_manager.clone();
    tokio::spawn(async move {
        match tokio::signal::ctrl_c().await {
            Ok(()) => {
                info!("⚠️ Señal de shutdown recibida, cerrando shards...");
                shard_manager.shutdown_all().await;
            }
            Err(e) => error!("No se pudo escuchar Ctrl+C: {:?}", e),
        }
    });

    info!("🚀 Conectando al gateway");
    if let Err(why) = client.start().await {
        error!("Error al ejecutar cliente: {:?}", why);
    }

    Ok(())
}
