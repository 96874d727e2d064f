use std::collections::HashMap;
use std::path::{Path, PathBuf};

use anyhow::{bail, Context, Result};
use clap::{Parser, Subcommand};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use swiss_engine::config::AppConfig;
use swiss_engine::models::{
    MatchResult, Participant, ParticipantId, Tournament, TournamentId, TournamentSettings,
};
use swiss_engine::service;
use swiss_engine::store::{JsonlStore, TournamentStore};
use swiss_engine::tiebreak::parse_keys;

#[derive(Parser)]
#[command(name = "swiss-engine")]
#[command(about = "Swiss-system tournament pairing and standings")]
#[command(version)]
struct Cli {
    /// Path to configuration file
    #[arg(long, default_value = "./config.toml")]
    config: String,

    /// Data directory path (overrides the config file)
    #[arg(long)]
    data_dir: Option<String>,

    /// Log level (trace, debug, info, warn, error)
    #[arg(long)]
    log_level: Option<String>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Create a tournament with a roster
    Init {
        /// Tournament name
        name: String,

        /// Players as "Name" or "Name:rating", comma-separated
        #[arg(long, value_delimiter = ',')]
        players: Vec<String>,

        /// Planned number of rounds
        #[arg(long, default_value = "5")]
        rounds: u32,

        /// Ordered comma-separated tiebreak keys
        #[arg(long)]
        tiebreakers: Option<String>,
    },

    /// Create a demo tournament with a built-in roster
    SeedDemo {
        /// Tournament name
        #[arg(long, default_value = "Casual Club Night")]
        name: String,

        /// Planned number of rounds
        #[arg(long, default_value = "5")]
        rounds: u32,
    },

    /// Pair the next round
    Pair {
        name: String,

        /// Seed for the round-1 color draw
        #[arg(long, default_value = "0")]
        seed: u64,
    },

    /// Record a board result
    Record {
        name: String,

        #[arg(long)]
        round: u32,

        #[arg(long)]
        board: u32,

        /// One of: white_wins, black_wins, draw, forfeit_white, forfeit_black
        #[arg(long)]
        result: String,
    },

    /// Mark a round completed
    Complete {
        name: String,

        #[arg(long)]
        round: u32,
    },

    /// Print the standings table
    Standings { name: String },
}

fn tournament_id(name: &str) -> TournamentId {
    TournamentId::from_name(name)
}

fn parse_roster(entries: &[String]) -> Result<Vec<Participant>> {
    let mut roster = Vec::with_capacity(entries.len());
    for (i, entry) in entries.iter().enumerate() {
        let id = (i + 1) as ParticipantId;
        match entry.split_once(':') {
            Some((name, rating)) => {
                let rating: u32 = rating
                    .trim()
                    .parse()
                    .with_context(|| format!("bad rating in roster entry {:?}", entry))?;
                roster.push(Participant::new(id, name.trim()).with_rating(rating));
            }
            None => roster.push(Participant::new(id, entry.trim())),
        }
    }
    Ok(roster)
}

fn parse_result_tag(tag: &str) -> Result<MatchResult> {
    let parsed: MatchResult = serde_json::from_str(&format!("\"{}\"", tag))?;
    if parsed == MatchResult::NotPlayed && tag != "not_played" {
        bail!("unknown result tag: {}", tag);
    }
    Ok(parsed)
}

fn roster_names(store: &JsonlStore, id: &TournamentId) -> Result<HashMap<ParticipantId, String>> {
    Ok(store
        .load_active_participants(id)?
        .into_iter()
        .map(|p| (p.id, p.name))
        .collect())
}

fn main() -> Result<()> {
    let cli = Cli::parse();

    let config = AppConfig::load_or_default(Path::new(&cli.config))?;
    let data_dir = cli
        .data_dir
        .map(PathBuf::from)
        .unwrap_or_else(|| config.data_dir.clone());
    let log_level = cli.log_level.unwrap_or_else(|| config.log_level.clone());

    let filter = tracing_subscriber::EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new(&log_level));
    tracing_subscriber::registry()
        .with(filter)
        .with(tracing_subscriber::fmt::layer())
        .init();

    let store = JsonlStore::new(data_dir);

    match cli.command {
        Commands::Init {
            name,
            players,
            rounds,
            tiebreakers,
        } => {
            if players.len() < 2 {
                bail!("need at least 2 players, got {}", players.len());
            }
            let mut settings = TournamentSettings::default().with_rounds(rounds);
            if let Some(keys) = tiebreakers {
                settings = settings.with_tiebreakers(keys);
            }
            let tournament = Tournament::new(&name).with_settings(settings);
            let roster = parse_roster(&players)?;
            store.create_tournament(&tournament)?;
            store.add_participants(&tournament.id, &roster)?;
            println!(
                "created {:?} with {} players over {} rounds",
                name,
                roster.len(),
                tournament.settings.rounds
            );
        }

        Commands::SeedDemo { name, rounds } => {
            let tournament = Tournament::new(&name)
                .with_settings(TournamentSettings::default().with_rounds(rounds));
            let demo_roster = [
                ("Anna", 1920),
                ("Boris", 1810),
                ("Carla", 1760),
                ("Dmitri", 1685),
                ("Elena", 1640),
                ("Farid", 1590),
                ("Grete", 1510),
                ("Henrik", 1450),
            ];
            let roster: Vec<Participant> = demo_roster
                .iter()
                .enumerate()
                .map(|(i, &(player, rating))| {
                    Participant::new((i + 1) as ParticipantId, player).with_rating(rating)
                })
                .collect();
            store.create_tournament(&tournament)?;
            store.add_participants(&tournament.id, &roster)?;
            println!(
                "seeded demo tournament {:?} with {} players over {} rounds",
                name,
                roster.len(),
                tournament.settings.rounds
            );
        }

        Commands::Pair { name, seed } => {
            let id = tournament_id(&name);
            let inserted = service::generate_next_round(&store, &id, seed)?;
            let names = roster_names(&store, &id)?;
            let round = inserted.first().map(|m| m.round_no).unwrap_or(0);
            println!("round {} pairings:", round);
            for m in &inserted {
                let white = names.get(&m.white_id).cloned().unwrap_or_default();
                match m.black_id {
                    Some(black_id) => {
                        let black = names.get(&black_id).cloned().unwrap_or_default();
                        println!("  board {}: {} (white) vs {} (black)", m.board_no, white, black);
                    }
                    None => println!("  board {}: {} has the bye", m.board_no, white),
                }
            }
        }

        Commands::Record {
            name,
            round,
            board,
            result,
        } => {
            let id = tournament_id(&name);
            let tournament = store.load_tournament(&id)?;
            let tag = parse_result_tag(&result)?;
            let matches = store.load_existing_matches(&id, round)?;
            let row = matches
                .iter()
                .find(|m| m.board_no == board)
                .with_context(|| format!("no board {} in round {}", board, round))?;
            // bye rows are single-player by construction; keep them that way
            if row.black_id.is_some()
                && matches!(tag, MatchResult::Bye | MatchResult::NotPlayed)
            {
                bail!(
                    "{} is not a valid result for the two-player board {} in round {}",
                    result,
                    board,
                    round
                );
            }
            if row.black_id.is_none() && tag != MatchResult::Bye {
                bail!("board {} in round {} is a bye board", board, round);
            }
            let settings = &tournament.settings;
            let (score_white, score_black) = match tag {
                MatchResult::WhiteWins => (settings.points_win, settings.points_loss),
                MatchResult::BlackWins => (settings.points_loss, settings.points_win),
                MatchResult::Draw => (settings.points_draw, settings.points_draw),
                MatchResult::ForfeitWhite => (settings.points_loss, settings.points_win),
                MatchResult::ForfeitBlack => (settings.points_win, settings.points_loss),
                MatchResult::Bye => (settings.bye_points, 0.0),
                MatchResult::NotPlayed => (0.0, 0.0),
            };
            store.record_result(&id, &row.id, tag, score_white, score_black)?;
            println!("recorded {} on round {} board {}", result, round, board);
        }

        Commands::Complete { name, round } => {
            let id = tournament_id(&name);
            store.mark_round_completed(&id, round)?;
            println!("round {} completed", round);
        }

        Commands::Standings { name } => {
            let id = tournament_id(&name);
            let tournament = store.load_tournament(&id)?;
            let names = roster_names(&store, &id)?;
            let keys = parse_keys(&tournament.settings.tiebreakers);
            let table = service::compute_standings(&store, &id)?;

            println!("standings for {:?}:", tournament.name);
            for row in &table {
                let player = names
                    .get(&row.participant_id)
                    .cloned()
                    .unwrap_or_default();
                let tiebreaks: Vec<String> = keys
                    .iter()
                    .filter_map(|k| {
                        row.tiebreak_values
                            .get(k.as_str())
                            .map(|v| format!("{}={:.2}", k.as_str(), v))
                    })
                    .collect();
                println!(
                    "  {:>2}. {:<20} {:>4.1}  {}",
                    row.rank,
                    player,
                    row.score,
                    tiebreaks.join("  ")
                );
            }
        }
    }

    Ok(())
}
