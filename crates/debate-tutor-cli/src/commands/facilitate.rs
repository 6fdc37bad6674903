//! Interactive facilitation of a saved scenario.
//!
//! Reads one command per line from stdin. Events are printed as JSON lines;
//! guidance is printed as plain text. While the countdown runs, its expiry is
//! announced as soon as it happens.

use std::io::BufRead;
use std::path::Path;
use std::str::FromStr;

use debate_tutor_core::{
    Access, Config, CoreError, Event, GuidanceTable, Result, ScenarioDb, ValidationError,
    Walkthrough,
};
use tokio::sync::broadcast::error::RecvError;
use tokio::sync::mpsc;
use tracing::{debug, info};

use super::load_scenario;

const HELP: &str = "commands: next | prev | go <stage> <activity> | start | pause | reset | status | guide | help | quit";

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Command {
    Next,
    Prev,
    /// 1-based stage and activity.
    Go(usize, usize),
    Start,
    Pause,
    Reset,
    Status,
    Guide,
    Help,
    Quit,
}

impl FromStr for Command {
    type Err = ValidationError;

    fn from_str(line: &str) -> Result<Self, Self::Err> {
        let mut words = line.split_whitespace();
        let command = match words.next().unwrap_or_default() {
            "next" | "n" => Command::Next,
            "prev" | "p" => Command::Prev,
            "go" => {
                let mut index = |field: &str| {
                    words
                        .next()
                        .and_then(|w| w.parse::<usize>().ok())
                        .filter(|&i| i >= 1)
                        .ok_or_else(|| ValidationError::invalid(field, "expected a number from 1"))
                };
                let stage = index("stage")?;
                let activity = index("activity")?;
                Command::Go(stage, activity)
            }
            "start" => Command::Start,
            "pause" => Command::Pause,
            "reset" => Command::Reset,
            "status" | "s" => Command::Status,
            "guide" | "g" => Command::Guide,
            "help" | "?" => Command::Help,
            "quit" | "q" | "exit" => Command::Quit,
            other => {
                return Err(ValidationError::invalid(
                    "command",
                    format!("unknown command '{other}'"),
                ))
            }
        };
        Ok(command)
    }
}

fn print_event(event: &Event) -> Result<()> {
    println!("{}", serde_json::to_string(event)?);
    Ok(())
}

fn print_guidance(walk: &Walkthrough, guidance: &GuidanceTable) {
    let activity = walk.current_activity();
    let entry = guidance.get(&activity.id);
    if entry.is_empty() {
        return;
    }
    println!("== {} ({} min)", activity.title, activity.time_minutes);
    println!("{}", entry.guide_text);
    for question in &entry.example_questions {
        println!("  - {question}");
    }
}

/// Apply one command. Returns `false` when the session should end.
fn execute(walk: &mut Walkthrough, guidance: &GuidanceTable, command: Command) -> Result<bool> {
    match command {
        Command::Next => {
            let event = walk.next();
            print_event(&event)?;
            if matches!(event, Event::ActivitySelected { .. }) {
                print_guidance(walk, guidance);
            }
        }
        Command::Prev => match walk.previous() {
            Some(event) => {
                print_event(&event)?;
                print_guidance(walk, guidance);
            }
            None => eprintln!("already at the first activity"),
        },
        Command::Go(stage, activity) => {
            let event = walk.select_activity(stage - 1, activity - 1)?;
            print_event(&event)?;
            print_guidance(walk, guidance);
        }
        Command::Start => match walk.start_timer() {
            Some(event) => print_event(&event)?,
            None => eprintln!("timer is already running or at zero; use reset"),
        },
        Command::Pause => match walk.pause_timer() {
            Some(event) => print_event(&event)?,
            None => eprintln!("timer is not running"),
        },
        Command::Reset => print_event(&walk.reset_timer())?,
        Command::Status => print_event(&walk.snapshot())?,
        Command::Guide => print_guidance(walk, guidance),
        Command::Help => println!("{HELP}"),
        Command::Quit => return Ok(false),
    }
    Ok(true)
}

/// Lines from stdin, read on a plain thread outside the runtime.
fn spawn_stdin_reader() -> mpsc::UnboundedReceiver<std::io::Result<String>> {
    let (tx, rx) = mpsc::unbounded_channel();
    std::thread::spawn(move || {
        for line in std::io::stdin().lock().lines() {
            if tx.send(line).is_err() {
                break;
            }
        }
    });
    rx
}

pub async fn run(id: &str, user: Option<&str>) -> Result<()> {
    let config = Config::load()?;
    let db = ScenarioDb::open()?;
    let scenario = load_scenario(&db, id, user, Access::Read)?;

    let mut guidance = GuidanceTable::standard();
    if let Some(path) = &config.facilitation.guidance_path {
        let merged = guidance.load_overrides(Path::new(path))?;
        debug!(merged, path = %path, "loaded guidance overrides");
    }

    let mut walk = Walkthrough::new(scenario)?;
    let mut events = walk.subscribe();
    info!(id, title = %walk.scenario().title, "facilitation started");

    eprintln!("{HELP}");
    print_event(&walk.snapshot())?;
    print_guidance(&walk, &guidance);

    let mut input = spawn_stdin_reader();
    loop {
        tokio::select! {
            line = input.recv() => {
                let Some(line) = line.transpose()? else { break };
                let line = line.trim();
                if line.is_empty() {
                    continue;
                }
                let keep_going = line
                    .parse::<Command>()
                    .map_err(CoreError::from)
                    .and_then(|command| execute(&mut walk, &guidance, command));
                match keep_going {
                    Ok(true) => {}
                    Ok(false) => break,
                    Err(e) => eprintln!("error: {e}"),
                }
            }
            event = events.recv() => match event {
                Ok(event @ Event::TimerExpired { .. }) => {
                    if config.facilitation.announce_expiry {
                        print_event(&event)?;
                        eprintln!("\x07time is up: {}", walk.current_activity().title);
                    }
                }
                Ok(_) => {}
                Err(RecvError::Lagged(skipped)) => debug!(skipped, "countdown events lagged"),
                Err(RecvError::Closed) => break,
            },
        }
    }

    info!(id, "facilitation ended");
    Ok(())
}
