use std::error::Error;
use std::fs;
use std::io::{self, BufRead, Write};
use std::path::{Path, PathBuf};
use std::process;
use std::sync::Arc;
use std::time::Duration;

use clap::{ArgAction, Parser};
use tracing_subscriber::EnvFilter;

use unoflow::{
    Color, GameBuilder, GameConfig, GameError, GameEvent, GameSession, GameState, Side,
    TurnCoordinator, VisualUpdateNotifier, describe_event, render_state, snapshot,
};

/// Default seed when none is given on the command line.
const DEFAULT_SEED: u64 = 0x0DD5_EED5;

#[derive(Parser, Debug)]
#[command(name = "play", about = "Play UNO against the machine in the terminal.")]
struct Args {
    /// RNG seed for the deck shuffle and the machine's choices
    #[arg(short = 's', long = "seed", default_value_t = DEFAULT_SEED)]
    seed: u64,

    /// Milliseconds the machine thinks before each action
    #[arg(long = "thinking-ms", default_value_t = 1500)]
    thinking_ms: u64,

    /// Milliseconds the human has to declare UNO
    #[arg(long = "callout-ms", default_value_t = 3000)]
    callout_ms: u64,

    /// Resume the game stored in this file, if it exists
    #[arg(long = "load")]
    load: Option<PathBuf>,

    /// File written by the `save` command
    #[arg(long = "save", default_value = "uno-save.bin")]
    save: PathBuf,

    /// Log engine internals to stderr
    #[arg(short = 'v', long = "verbose", action = ArgAction::SetTrue)]
    verbose: bool,
}

/// Prints every engine event as it happens.
struct ConsoleNotifier;

impl VisualUpdateNotifier for ConsoleNotifier {
    fn notify(&self, event: &GameEvent) {
        println!("  * {}", describe_event(event));
    }
}

fn main() {
    if let Err(err) = run() {
        eprintln!("Error: {err}");
        process::exit(1);
    }
}

fn run() -> Result<(), Box<dyn Error>> {
    let args = Args::parse();
    init_tracing(args.verbose);

    let config = GameConfig {
        seed: args.seed,
        thinking_delay: Duration::from_millis(args.thinking_ms),
        human_callout_window: Duration::from_millis(args.callout_ms),
        ..GameConfig::default()
    };
    let notifier: Arc<dyn VisualUpdateNotifier> = Arc::new(ConsoleNotifier);
    let coordinator = match load_saved(args.load.as_deref())? {
        Some(state) => {
            println!("Resuming saved game.");
            TurnCoordinator::from_state(state, config, Some(notifier))?
        }
        None => GameBuilder::new()
            .with_config(config)
            .with_notifier(notifier)
            .build()?,
    };
    let coordinator = Arc::new(coordinator);
    let session = GameSession::start(Arc::clone(&coordinator))?;

    print_help();
    println!("{}", render_state(&coordinator.snapshot()));
    let stdin = io::stdin();
    let mut lines = stdin.lock().lines();
    while !coordinator.is_ended() {
        print!("> ");
        io::stdout().flush()?;
        let Some(line) = lines.next() else {
            break;
        };
        let line = line?;
        let mut parts = line.split_whitespace();
        let command = parts.next().unwrap_or("").to_ascii_lowercase();
        let result = match command.as_str() {
            "" | "show" => {
                println!("{}", render_state(&coordinator.snapshot()));
                Ok(())
            }
            "p" | "play" => play(&coordinator, parts.next(), &mut lines),
            "d" | "draw" => coordinator.draw_and_pass(Side::Human).map(|_| ()),
            "u" | "uno" => coordinator.declare_uno(Side::Human),
            "c" | "callout" => coordinator.call_out(Side::Human),
            "pause" => {
                session.pause();
                println!("Paused. Type 'resume' to continue.");
                Ok(())
            }
            "resume" => {
                session.resume();
                Ok(())
            }
            "s" | "save" => {
                match save(&coordinator.snapshot(), &args.save) {
                    Ok(()) => println!("Saved to {}", args.save.display()),
                    Err(err) => println!("  ! could not save: {err}"),
                }
                Ok(())
            }
            "h" | "help" => {
                print_help();
                Ok(())
            }
            "q" | "quit" => break,
            other => {
                println!("Unknown command '{other}'. Type 'help' for a list.");
                Ok(())
            }
        };
        if let Err(err) = result {
            println!("  ! {err}");
        }
    }

    session.shutdown();
    if let Some(winner) = coordinator.check_winner() {
        println!(
            "Game over: {}",
            if winner == Side::Human { "you win" } else { "the machine wins" }
        );
    }
    Ok(())
}

fn play(
    coordinator: &TurnCoordinator,
    index: Option<&str>,
    lines: &mut impl Iterator<Item = io::Result<String>>,
) -> Result<(), GameError> {
    let hand = coordinator.hand(Side::Human);
    let Some(card) = index
        .and_then(|raw| raw.parse::<usize>().ok())
        .and_then(|idx| hand.get(idx).copied())
    else {
        println!("Usage: play <hand index> (0..{})", hand.len().saturating_sub(1));
        return Ok(());
    };
    let mut prompt = || prompt_color(lines);
    coordinator.submit_move(Side::Human, &card, &mut prompt)?;
    Ok(())
}

/// Asks for a wild color; anything unreadable falls back to the default.
fn prompt_color(lines: &mut impl Iterator<Item = io::Result<String>>) -> Color {
    print!("Choose a color [r/g/b/y]: ");
    let _ = io::stdout().flush();
    lines
        .next()
        .and_then(Result::ok)
        .and_then(|line| Color::parse(&line))
        .unwrap_or(Color::FALLBACK)
}

fn load_saved(path: Option<&Path>) -> Result<Option<GameState>, Box<dyn Error>> {
    let Some(path) = path else {
        return Ok(None);
    };
    if !path.exists() {
        return Ok(None);
    }
    let bytes = fs::read(path)?;
    Ok(snapshot::load(&bytes)?)
}

fn save(state: &GameState, path: &Path) -> Result<(), Box<dyn Error>> {
    let bytes = snapshot::save(state)?;
    fs::write(path, bytes)?;
    Ok(())
}

fn init_tracing(verbose: bool) {
    let filter = std::env::var("RUST_LOG")
        .map(EnvFilter::new)
        .unwrap_or_else(|_| EnvFilter::new(if verbose { "debug" } else { "warn" }));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(io::stderr)
        .try_init()
        .ok();
}

fn print_help() {
    println!("Commands:");
    println!("  play <n>   play card n from your hand");
    println!("  draw       draw a card and pass (only without a playable card)");
    println!("  uno        declare UNO when holding one card");
    println!("  callout    catch the machine sitting on one undeclared card");
    println!("  pause      freeze the machine and the UNO timers; 'resume' to continue");
    println!("  save       write the game to the save file");
    println!("  show       print the table and your hand");
    println!("  quit       leave the game");
}
