//! # blackhole
//!
//! Command line client for Black Hole games.
//!
//! ## Example
//!
//! ```bash
//! # Start a game with five random black holes
//! blackhole create --random-setup
//!
//! # Follow it, and play red's 15 on C4 from another terminal
//! blackhole watch http://localhost:8027/play.html#<id>
//! blackhole play <id> C4 15
//! ```

use anyhow::{bail, Context, Result};
use blackhole_core::{
    field_influence, random_setup, Coords, GameState, Player, INITIAL_STONES,
};
use blackhole_sync::{
    create_game, join_link, GameSession, HttpStore, StateId, SubmitOutcome, SyncConfig,
};
use clap::{Parser, Subcommand};
use std::fmt::Write as _;
use std::path::PathBuf;
use std::sync::Arc;
use tracing::info;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

/// Command line client for Black Hole games.
#[derive(Parser, Debug)]
#[command(name = "blackhole")]
#[command(version, about, long_about = None)]
struct Cli {
    /// TOML configuration file
    #[arg(long, global = true)]
    config: Option<PathBuf>,

    /// State store collection URL, e.g. http://localhost:8027/states
    #[arg(long, global = true)]
    states_url: Option<String>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand, Debug)]
enum Commands {
    /// Create a new game and print its join link
    Create {
        /// Initial encoded state (default: empty board)
        #[arg(conflicts_with = "random_setup")]
        state: Option<String>,

        /// Start with five black holes on random fields
        #[arg(long)]
        random_setup: bool,
    },

    /// Decode a state string and describe it
    Show {
        /// Encoded state
        state: String,

        /// Print the JSON view instead
        #[arg(long)]
        json: bool,
    },

    /// Follow a game and print every change
    Watch {
        /// Game id or join link
        game: String,
    },

    /// Play one stone
    Play {
        /// Game id or join link
        game: String,

        /// Field name, e.g. C4
        field: Coords,

        /// Stone value: positive for red, negative for blue, 0 for a black hole
        #[arg(allow_negative_numbers = true)]
        value: i32,
    },
}

#[tokio::main]
async fn main() -> Result<()> {
    tracing_subscriber::registry()
        .with(tracing_subscriber::EnvFilter::new(
            std::env::var("RUST_LOG").unwrap_or_else(|_| "info".into()),
        ))
        .with(tracing_subscriber::fmt::layer())
        .init();

    let cli = Cli::parse();
    let config = load_config(&cli)?;

    match cli.command {
        Commands::Create {
            state,
            random_setup: random,
        } => create(&config, state, random).await,
        Commands::Show { state, json } => show(&state, json),
        Commands::Watch { game } => watch(config, &game).await,
        Commands::Play { game, field, value } => play(config, &game, field, value).await,
    }
}

fn load_config(cli: &Cli) -> Result<SyncConfig> {
    let config = match &cli.config {
        Some(path) => SyncConfig::from_file(path)?,
        None => SyncConfig::default(),
    };
    let mut config = config.with_env_overrides()?;
    if let Some(url) = &cli.states_url {
        config = config.with_states_url(url.clone());
    }
    Ok(config)
}

async fn create(config: &SyncConfig, state: Option<String>, random: bool) -> Result<()> {
    let initial = if random {
        random_setup(&mut rand::thread_rng()).encode()
    } else {
        state.unwrap_or_default()
    };

    let store = HttpStore::new(config.states_url.clone());
    let id = create_game(&store, &initial)
        .await
        .context("Failed to create game")?;

    println!("Game id: {}", id);
    println!("Join link: {}", join_link(config.base_url(), &id));
    Ok(())
}

fn show(encoded: &str, json: bool) -> Result<()> {
    let state = GameState::decode(encoded.trim()).context("Invalid state string")?;
    if json {
        println!("{}", serde_json::to_string_pretty(&state.to_view())?);
    } else {
        print!("{}", describe(&state));
    }
    Ok(())
}

async fn open_session(config: SyncConfig, game: &str) -> Result<GameSession<HttpStore>> {
    let id = StateId::parse(game)?;
    let store = Arc::new(HttpStore::new(config.states_url.clone()));
    let session = GameSession::new(store, id, config);
    session
        .initialize()
        .await
        .context("Failed to load game state")?;
    Ok(session)
}

async fn watch(config: SyncConfig, game: &str) -> Result<()> {
    let session = open_session(config, game).await?;
    let mut updates = session.subscribe();
    if let Some(state) = session.state() {
        print!("{}", describe(&state));
    }

    let mut poller = session.spawn_polling();
    loop {
        tokio::select! {
            _ = tokio::signal::ctrl_c() => {
                info!("Interrupted, shutting down");
                session.shutdown();
                break;
            }
            changed = updates.changed() => {
                if changed.is_err() {
                    break;
                }
                let state = updates.borrow_and_update().as_ref().map(|s| s.state.clone());
                if let Some(state) = state {
                    println!();
                    print!("{}", describe(&state));
                }
            }
            result = &mut poller => {
                result.context("Polling task panicked")??;
                break;
            }
        }
    }
    Ok(())
}

async fn play(config: SyncConfig, game: &str, field: Coords, value: i32) -> Result<()> {
    let session = open_session(config, game).await?;
    match session.submit_move(field, value).await? {
        SubmitOutcome::Accepted => {
            println!("Played {} on {}.", value.abs(), field);
            Ok(())
        }
        SubmitOutcome::Conflict => {
            bail!("Game state has changed! Wait for the new state, and try again.")
        }
        SubmitOutcome::InvalidMove => {
            let state = session.state().unwrap_or_default();
            bail!("Invalid move {}={}. {}", field, value, state.status())
        }
        SubmitOutcome::Busy => bail!("Another move is still being submitted"),
    }
}

/// Human-readable summary: status, move list, and what is left to play.
fn describe(state: &GameState) -> String {
    let mut out = String::new();
    let _ = writeln!(out, "State:  {}", state.encode());
    let _ = writeln!(out, "Status: {}", state.status());

    let history = state.history();
    let holes: Vec<String> = history
        .iter()
        .take(INITIAL_STONES)
        .filter_map(|m| blackhole_core::index_to_coords(m.field_index()))
        .map(|c| c.to_string())
        .collect();
    if !holes.is_empty() {
        let _ = writeln!(out, "Black holes: {}", holes.join(" "));
    }

    for (turn, pair) in history
        .get(INITIAL_STONES..)
        .unwrap_or_default()
        .chunks(2)
        .enumerate()
    {
        let red = pair.first().map(|m| m.to_string()).unwrap_or_default();
        let blue = pair.get(1).map(|m| m.to_string()).unwrap_or_default();
        let _ = writeln!(out, "{:>3}. {:<8}{}", turn + 1, red, blue);
    }

    match state.next_player() {
        Some(player @ (Player::Red | Player::Blue)) => {
            let stones: Vec<String> = state
                .available_stones(player)
                .iter()
                .map(|v| v.abs().to_string())
                .collect();
            let _ = writeln!(out, "{} stones left: {}", player.name(), stones.join(" "));
        }
        Some(Player::Neutral) => {}
        None => {
            for coords in state.empty_fields() {
                let influence = field_influence(state, coords);
                let _ = writeln!(
                    out,
                    "Black hole on {}: red {}, blue {}",
                    coords, influence.red, influence.blue
                );
            }
        }
    }
    out
}
