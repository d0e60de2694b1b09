//! Chorus CLI - consensus-sampling chat assistant with moderation

use std::path::PathBuf;

use anyhow::{bail, Context};
use clap::Parser;
use tracing::info;
use tracing_subscriber::EnvFilter;

use chorus_cli::{
    build_chorus, build_client, load_config, router, spawn_session_sweeper, AppState,
};
use chorus_core::{Conversation, TurnOutcome, TurnRequest, DEFAULT_TEMPERATURE};

#[derive(Parser)]
#[command(name = "chorus")]
#[command(about = "Chorus - chat assistant that answers with the consensus of several samples")]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(clap::Subcommand)]
enum Commands {
    /// Run the HTTP chat service
    Serve {
        /// Configuration file path
        #[arg(short, long, env = "CHORUS_CONFIG")]
        config: Option<PathBuf>,

        /// Listen address, overriding the configuration
        #[arg(short, long, env = "CHORUS_BIND")]
        bind: Option<String>,
    },
    /// Check configuration validity and credential presence
    Check {
        /// Configuration file path
        #[arg(short, long, env = "CHORUS_CONFIG")]
        config: Option<PathBuf>,
    },
    /// Send a single message and print the reply
    Ask {
        /// The message to send
        message: String,

        /// Configuration file path
        #[arg(short, long, env = "CHORUS_CONFIG")]
        config: Option<PathBuf>,

        /// Ask for step-by-step reasoning
        #[arg(long)]
        reasoning: bool,

        /// Request one completion instead of comparing samples
        #[arg(long)]
        single: bool,

        /// Temperature for --single
        #[arg(long, default_value_t = DEFAULT_TEMPERATURE)]
        temperature: f64,
    },
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .with_writer(std::io::stderr)
        .init();

    match cli.command {
        Commands::Serve { config, bind } => {
            let mut config = load_config(config.as_deref())?;
            if let Some(bind) = bind {
                config.server.bind_addr = bind;
                config.validate()?;
            }
            let chorus = build_chorus(&config)?;
            let state = AppState::with_sessions(chorus, config.session_store());
            let sweeper = spawn_session_sweeper(state.sessions.clone());
            let app = router(state);

            let listener = tokio::net::TcpListener::bind(&config.server.bind_addr)
                .await
                .with_context(|| format!("binding {}", config.server.bind_addr))?;
            info!(
                addr = %config.server.bind_addr,
                model = %config.provider.model,
                fail_mode = ?config.moderation.fail_mode,
                "Chorus listening"
            );

            axum::serve(listener, app)
                .with_graceful_shutdown(async {
                    let _ = tokio::signal::ctrl_c().await;
                })
                .await
                .context("HTTP server stopped")?;

            if let Some(sweeper) = sweeper {
                sweeper.abort();
            }
        }
        Commands::Check { config } => {
            let config = load_config(config.as_deref())?;
            build_client(&config)?;
            println!("Configuration OK");
            println!(
                "  provider:     {} ({})",
                config.provider.base_url, config.provider.model
            );
            println!("  temperatures: {:?}", config.sampler.temperatures);
            println!("  pacing:       {} ms", config.sampler.pacing_ms);
            println!(
                "  moderation:   enabled={} fail_mode={:?}",
                config.moderation.enabled, config.moderation.fail_mode
            );
            println!("  context:      {} messages", config.history.max_context_messages);
            println!("  listen:       {}", config.server.bind_addr);
            println!(
                "  sessions:     max {} idle {}",
                config.server.max_sessions,
                match config.server.session_idle_ttl() {
                    Some(ttl) => format!("{}s", ttl.as_secs()),
                    None => "never expires".to_string(),
                }
            );
        }
        Commands::Ask {
            message,
            config,
            reasoning,
            single,
            temperature,
        } => {
            let config = load_config(config.as_deref())?;
            let chorus = build_chorus(&config)?;
            let request = TurnRequest::new(message)
                .with_reasoning_mode(reasoning)
                .with_compare_responses(!single)
                .with_temperature(temperature);

            let mut conversation = Conversation::new();
            match chorus.send_message(&mut conversation, &request).await {
                TurnOutcome::Reply(reply) => println!("[{}] {}", reply.timestamp, reply.response),
                TurnOutcome::Rejected(rejection) => bail!("{}", rejection),
            }
        }
    }

    Ok(())
}
