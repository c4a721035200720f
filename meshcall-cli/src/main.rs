use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use colored::*;
use meshcall_core::IceServerConfig;
use meshcall_relay::{DEFAULT_BIND_ADDR, RelayConfig};
use meshcall_session::{SessionBuilder, SessionConfig, SessionEvent, WsConnector};
use std::sync::Arc;
use tracing::info;
use tracing_subscriber::EnvFilter;

#[derive(Parser)]
#[command(name = "meshcall", version, about = "Full-mesh call relay and client")]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Run the signaling relay
    Relay {
        #[arg(long, env = "MESHCALL_BIND", default_value = DEFAULT_BIND_ADDR)]
        bind: String,

        /// STUN/TURN URL pushed to clients; repeat or comma-separate for several
        #[arg(long = "ice-server", env = "MESHCALL_ICE_SERVERS", value_delimiter = ',')]
        ice_servers: Vec<String>,
    },

    /// Join a room and report what happens until Ctrl-C
    Join {
        #[arg(long, env = "MESHCALL_RELAY_URL", default_value = "ws://127.0.0.1:8080/ws")]
        url: String,

        #[arg(short, long, env = "MESHCALL_ROOM")]
        room: String,

        #[arg(short, long, env = "MESHCALL_USER")]
        user: String,

        /// Display name; defaults to the user id
        #[arg(short, long, env = "MESHCALL_NAME")]
        name: Option<String>,

        /// Handshake timeout in milliseconds
        #[arg(long, default_value_t = 5000)]
        handshake_timeout_ms: u64,

        #[arg(long)]
        muted: bool,

        #[arg(long)]
        share_screen: bool,
    },
}

#[tokio::main]
async fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .init();

    match Cli::parse().command {
        Commands::Relay { bind, ice_servers } => {
            let mut config = RelayConfig {
                bind,
                ..Default::default()
            };
            if !ice_servers.is_empty() {
                config.ice_servers = ice_servers.into_iter().map(IceServerConfig::stun).collect();
            }

            println!("{} {}", "Relay starting on".green().bold(), config.bind);
            meshcall_relay::serve(config).await?;
        }

        Commands::Join {
            url,
            room,
            user,
            name,
            handshake_timeout_ms,
            muted,
            share_screen,
        } => {
            let name = name.unwrap_or_else(|| user.clone());
            let config = SessionConfig {
                handshake_timeout: std::time::Duration::from_millis(handshake_timeout_ms),
                ..Default::default()
            };

            let (session, mut events) = SessionBuilder::new(Arc::new(WsConnector::new(url.clone())))
                .config(config)
                .join(room.as_str(), &user, &name)
                .await
                .with_context(|| format!("Failed to join room {room} via {url}"))?;

            println!(
                "{} {} as {}",
                "Joined room".green().bold(),
                room,
                session.local_peer_id().to_string().cyan()
            );

            if muted {
                session.toggle_audio().await?;
                println!("{}", "Microphone muted".yellow());
            }
            if share_screen {
                match session.start_screen_share().await {
                    Ok(()) => println!("{}", "Sharing screen".cyan()),
                    Err(e) => println!("{} {}", "Screen share unavailable:".yellow(), e),
                }
            }

            loop {
                tokio::select! {
                    _ = tokio::signal::ctrl_c() => {
                        info!("Interrupted");
                        break;
                    }
                    event = events.recv() => match event {
                        Some(event) => print_event(&event),
                        None => break,
                    },
                }
            }

            session.leave().await?;
            println!("{}", "Left the room".green().bold());
        }
    }

    Ok(())
}

fn print_event(event: &SessionEvent) {
    match event {
        SessionEvent::ParticipantJoined(p) => {
            println!("{} {} ({})", "+".green().bold(), p.display_name, p.peer_id)
        }
        SessionEvent::ParticipantLeft(peer_id) => println!("{} {}", "-".red().bold(), peer_id),
        SessionEvent::PeerConnected(peer_id) => {
            println!("{} {}", "connected".green(), peer_id)
        }
        SessionEvent::PeerFailed { peer_id, reason } => {
            println!("{} {}: {}", "failed".red().bold(), peer_id, reason)
        }
        SessionEvent::RemoteTrackAdded { peer_id, track } => {
            println!("{} {:?} from {}", "track".cyan(), track.kind, peer_id)
        }
        SessionEvent::RemoteStreamRemoved(peer_id) => {
            println!("{} {}", "stream removed".yellow(), peer_id)
        }
        SessionEvent::ScreenShareEnded => println!("{}", "Screen share ended".yellow()),
        SessionEvent::SignalingDisconnected => {
            println!("{}", "Relay connection lost".red().bold())
        }
    }
}
