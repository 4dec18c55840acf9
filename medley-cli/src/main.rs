//! Coach console for Medley.
//!
//! Loads the roster document, runs the process-start recovery pass
//! (stale-data sweep plus session boundary tick), applies one coach
//! command, and persists the document back through the storage seam.

mod report;
mod store;

use std::path::PathBuf;

use anyhow::{Context, Result};
use chrono::NaiveDate;
use clap::{Parser, Subcommand, ValueEnum};
use colored::Colorize;

use medley_engine::{
    Catalog, Clock, FixedClock, Gender, LevelUp, QuestAction, RosterEngine, SessionSlot,
    SystemClock, XpCategory, apply_quest_action, roster_csv, toggle_challenge, toggle_checkpoint,
    toggle_present,
};
use report::{print_audit, print_report, print_roster};
use store::JsonFileStore;

#[derive(Debug, Clone, Copy, ValueEnum, Default)]
enum CategoryArg {
    #[default]
    Pool,
    Weight,
    Meet,
}

impl From<CategoryArg> for XpCategory {
    fn from(value: CategoryArg) -> Self {
        match value {
            CategoryArg::Pool => Self::Pool,
            CategoryArg::Weight => Self::Weight,
            CategoryArg::Meet => Self::Meet,
        }
    }
}

#[derive(Debug, Clone, Copy, ValueEnum, Default)]
enum GenderArg {
    Female,
    Male,
    #[default]
    Unspecified,
}

impl From<GenderArg> for Gender {
    fn from(value: GenderArg) -> Self {
        match value {
            GenderArg::Female => Self::Female,
            GenderArg::Male => Self::Male,
            GenderArg::Unspecified => Self::Unspecified,
        }
    }
}

#[derive(Debug, Clone, Copy, ValueEnum)]
enum SlotArg {
    Morning,
    Afternoon,
    Evening,
}

impl From<SlotArg> for SessionSlot {
    fn from(value: SlotArg) -> Self {
        match value {
            SlotArg::Morning => Self::Morning,
            SlotArg::Afternoon => Self::Afternoon,
            SlotArg::Evening => Self::Evening,
        }
    }
}

#[derive(Debug, Clone, Copy, ValueEnum)]
enum QuestActionArg {
    Assign,
    Start,
    Submit,
    Deny,
    Approve,
}

impl From<QuestActionArg> for QuestAction {
    fn from(value: QuestActionArg) -> Self {
        match value {
            QuestActionArg::Assign => Self::Assign,
            QuestActionArg::Start => Self::Start,
            QuestActionArg::Submit => Self::Submit,
            QuestActionArg::Deny => Self::Deny,
            QuestActionArg::Approve => Self::Approve,
        }
    }
}

#[derive(Debug, Parser)]
#[command(name = "medley", version)]
#[command(about = "Coach console for the Medley engagement tracker")]
struct Args {
    /// Directory holding roster documents
    #[arg(long, default_value = ".")]
    data_dir: PathBuf,

    /// Roster document key inside the data directory
    #[arg(long, default_value = "roster")]
    team: String,

    /// Actor label recorded on audit entries
    #[arg(long, default_value = "coach")]
    actor: String,

    /// Override today's date (YYYY-MM-DD) for deterministic replays
    #[arg(long)]
    date: Option<NaiveDate>,

    /// Override the session slot (only meaningful with --date)
    #[arg(long, value_enum)]
    slot: Option<SlotArg>,

    #[command(subcommand)]
    command: Command,
}

#[derive(Debug, Subcommand)]
enum Command {
    /// Create an empty roster document
    Init,
    /// Add an athlete to the roster
    Add {
        name: String,
        #[arg(long)]
        age: Option<u8>,
        #[arg(long, value_enum, default_value_t)]
        gender: GenderArg,
        #[arg(long, default_value = "team")]
        group: String,
    },
    /// Remove an athlete (explicit coach removal)
    Remove { id: String },
    /// List athletes with levels and streaks
    List,
    /// Toggle an athlete's presence for the current session
    CheckIn {
        id: String,
        #[arg(long, value_enum, default_value_t)]
        category: CategoryArg,
    },
    /// Toggle one checkpoint for an athlete
    Checkpoint {
        id: String,
        checkpoint: String,
        #[arg(long, value_enum, default_value_t)]
        category: CategoryArg,
    },
    /// Toggle a weight challenge for an athlete
    Challenge { id: String, challenge: String },
    /// Drive a quest through its lifecycle
    Quest {
        id: String,
        quest: String,
        #[arg(value_enum)]
        action: QuestActionArg,
    },
    /// Create or replace a team challenge
    AddTeamChallenge {
        id: String,
        name: String,
        #[arg(long)]
        target: u32,
        #[arg(long, default_value_t = 0)]
        reward: i64,
    },
    /// Update a team challenge's progress
    ChallengeProgress { id: String, current: u32 },
    /// Run only the boundary tick and recovery sweep
    Tick,
    /// Print the analytics report
    Report,
    /// Export the roster as CSV
    Export {
        #[arg(long)]
        output: Option<PathBuf>,
    },
    /// Show the most recent audit entries
    Audit {
        #[arg(long, default_value_t = 20)]
        limit: usize,
    },
    /// Undo the single most recent audit entry
    Undo,
}

#[derive(Debug, Clone, Copy)]
enum CliClock {
    System(SystemClock),
    Fixed(FixedClock),
}

impl Clock for CliClock {
    fn today(&self) -> NaiveDate {
        match self {
            Self::System(clock) => clock.today(),
            Self::Fixed(clock) => clock.today(),
        }
    }

    fn now(&self) -> chrono::DateTime<chrono::Utc> {
        match self {
            Self::System(clock) => clock.now(),
            Self::Fixed(clock) => clock.now(),
        }
    }

    fn slot(&self) -> SessionSlot {
        match self {
            Self::System(clock) => clock.slot(),
            Self::Fixed(clock) => clock.slot(),
        }
    }
}

fn build_clock(args: &Args) -> CliClock {
    match args.date {
        Some(date) => {
            let slot = args.slot.map_or(SessionSlot::Morning, SessionSlot::from);
            CliClock::Fixed(FixedClock::new(date, slot))
        }
        None => CliClock::System(SystemClock),
    }
}

fn announce_level_up(level_up: Option<LevelUp>) {
    if let Some(level_up) = level_up {
        println!(
            "{} {} -> {}",
            "LEVEL UP!".yellow().bold(),
            level_up.from.name,
            level_up.to.name.bold()
        );
    }
}

fn announce_delta(applied: bool, delta: i64) {
    if !applied {
        println!("{}", "No matching athlete or catalog entry; nothing changed.".dimmed());
    } else if delta == 0 {
        // Informational: the action stood, but the daily cap ate the XP.
        println!("{}", "Applied; no XP granted (daily cap reached).".yellow());
    } else if delta > 0 {
        println!("{}", format!("{delta:+} XP").green());
    } else {
        println!("{}", format!("{delta:+} XP").red());
    }
}

fn run(args: &Args) -> Result<()> {
    let clock = build_clock(args);
    let store = JsonFileStore::new(&args.data_dir);
    let engine = RosterEngine::new(store.clone());

    // load_team runs the recovery passes (boundary tick, stale sweep)
    // before any command touches the document.
    let mut roster = engine
        .load_team(&args.team, &clock)
        .with_context(|| format!("loading roster {:?}", args.team))?;

    let catalog = Catalog::shared();
    let actor = args.actor.as_str();

    match &args.command {
        Command::Init => {
            println!("Initialized roster {:?}", store.document_path(&args.team));
        }
        Command::Add {
            name,
            age,
            gender,
            group,
        } => {
            let id = roster.add_athlete(name, *age, (*gender).into(), group);
            println!("Added {} as {}", name.bold(), id.cyan());
        }
        Command::Remove { id } => match roster.remove_athlete(id) {
            Some(athlete) => println!("Removed {}", athlete.name.bold()),
            None => println!("{}", "No athlete with that id.".dimmed()),
        },
        Command::List => print_roster(&roster),
        Command::CheckIn { id, category } => {
            let outcome = toggle_present(&mut roster, catalog, &clock, actor, id, (*category).into());
            match outcome {
                Some(outcome) => {
                    let word = if outcome.present { "present" } else { "absent" };
                    println!("Marked {id} {word}");
                    announce_delta(true, outcome.xp_delta);
                    announce_level_up(outcome.level_up);
                }
                None => announce_delta(false, 0),
            }
        }
        Command::Checkpoint {
            id,
            checkpoint,
            category,
        } => {
            let outcome = toggle_checkpoint(
                &mut roster,
                catalog,
                &clock,
                actor,
                id,
                (*category).into(),
                checkpoint,
            );
            match outcome {
                Some(outcome) => {
                    announce_delta(true, outcome.xp_delta);
                    announce_level_up(outcome.level_up);
                }
                None => announce_delta(false, 0),
            }
        }
        Command::Challenge { id, challenge } => {
            let outcome = toggle_challenge(&mut roster, catalog, &clock, actor, id, challenge);
            match outcome {
                Some(outcome) => {
                    announce_delta(true, outcome.xp_delta);
                    announce_level_up(outcome.level_up);
                }
                None => announce_delta(false, 0),
            }
        }
        Command::Quest { id, quest, action } => {
            let outcome = apply_quest_action(
                &mut roster,
                catalog,
                &clock,
                actor,
                id,
                quest,
                (*action).into(),
            );
            match outcome {
                Some(outcome) => {
                    println!("Quest {quest} is now {}", outcome.state.to_string().cyan());
                    if outcome.awarded > 0 {
                        announce_delta(true, outcome.awarded);
                    }
                    announce_level_up(outcome.level_up);
                }
                None => announce_delta(false, 0),
            }
        }
        Command::AddTeamChallenge {
            id,
            name,
            target,
            reward,
        } => {
            roster.team_challenges.retain(|c| c.id != *id);
            roster.team_challenges.push(medley_engine::TeamChallenge {
                id: id.clone(),
                name: name.clone(),
                target: *target,
                current: 0,
                reward_xp: *reward,
            });
            println!("Team challenge {} registered", name.bold());
        }
        Command::ChallengeProgress { id, current } => {
            match roster.set_team_challenge_progress(id, *current) {
                Some(stored) => println!("Progress for {id}: {stored}"),
                None => println!("{}", "No team challenge with that id.".dimmed()),
            }
        }
        Command::Tick => {
            println!("Recovery pass complete.");
        }
        Command::Report => print_report(&roster, catalog, clock.today()),
        Command::Export { output } => {
            let csv = roster_csv(&roster);
            match output {
                Some(path) => {
                    std::fs::write(path, &csv)
                        .with_context(|| format!("writing export to {}", path.display()))?;
                    println!("Exported {} athletes to {}", roster.athletes.len(), path.display());
                }
                None => print!("{csv}"),
            }
        }
        Command::Audit { limit } => print_audit(&roster, *limit),
        Command::Undo => match roster.undo_last(clock.today()) {
            Some(entry) => {
                println!("Undid: {}", entry.label);
                announce_delta(true, -entry.xp_delta);
            }
            None => println!("{}", "Nothing to undo.".dimmed()),
        },
    }

    // A failed save means the command must not be considered applied.
    engine
        .save_team(&args.team, &roster)
        .with_context(|| format!("saving roster {:?}", args.team))?;
    Ok(())
}

fn main() -> Result<()> {
    env_logger::init();
    let args = Args::parse();
    run(&args)
}
