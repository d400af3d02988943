//! Headless shell: drives the simulation from line commands on stdin.
//!
//! Commands, one per line:
//! `w`/`s` forward/back, `a`/`d` strafe, `q`/`e` turn, `attack`, `cast`,
//! `rest`, `talk`, `fight`, `mode`, `fps`, `map`, `1`..`6` select a member,
//! `save N`, `load N`, `quit`.

use std::io::{self, BufRead};
use std::sync::mpsc::{self, Receiver, TryRecvError};
use std::thread;
use std::time::{Duration, Instant};

use party_crawler::config::GameConfig;
use party_crawler::engine::initialization::start_game;
use party_crawler::input::{MoveDir, RotateDir};
use party_crawler::{FrameInput, Intent, LoopControl};

/// One parsed command line
enum Command {
    /// Held for a number of frames so real-time movement covers ground
    Hold(Intent),
    Once(Intent),
    Fight,
    Unknown(String),
}

fn parse_command(line: &str) -> Option<Command> {
    let mut words = line.split_whitespace();
    let word = words.next()?;
    let slot = || words.clone().next().and_then(|n| n.parse::<u8>().ok());
    let command = match word {
        "w" => Command::Hold(Intent::Move(MoveDir::Forward)),
        "s" => Command::Hold(Intent::Move(MoveDir::Back)),
        "a" => Command::Hold(Intent::Move(MoveDir::StrafeLeft)),
        "d" => Command::Hold(Intent::Move(MoveDir::StrafeRight)),
        "q" => Command::Hold(Intent::Rotate(RotateDir::Left)),
        "e" => Command::Hold(Intent::Rotate(RotateDir::Right)),
        "attack" => Command::Once(Intent::Attack),
        "cast" => Command::Once(Intent::CastEquippedSpell),
        "rest" => Command::Once(Intent::Rest),
        "talk" => Command::Once(Intent::Interact),
        "fight" => Command::Fight,
        "mode" => Command::Once(Intent::ToggleMode),
        "fps" => Command::Once(Intent::ShowFps),
        "map" => Command::Once(Intent::MapOverlay),
        "esc" => Command::Once(Intent::Cancel),
        "quit" | "exit" => Command::Once(Intent::Exit),
        "save" => match slot() {
            Some(n) => Command::Once(Intent::Save(n)),
            None => Command::Unknown(line.to_string()),
        },
        "load" => match slot() {
            Some(n) => Command::Once(Intent::Load(n)),
            None => Command::Unknown(line.to_string()),
        },
        other => match other.parse::<usize>() {
            Ok(n) if n >= 1 => Command::Once(Intent::SelectCharacter(n - 1)),
            _ => Command::Unknown(line.to_string()),
        },
    };
    Some(command)
}

/// Read stdin on its own thread so the frame loop never blocks
fn spawn_stdin_reader() -> Receiver<String> {
    let (tx, rx) = mpsc::channel();
    thread::spawn(move || {
        for line in io::stdin().lock().lines() {
            let Ok(line) = line else { break };
            if tx.send(line).is_err() {
                break;
            }
        }
    });
    rx
}

fn main() -> Result<(), Box<dyn std::error::Error>> {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();

    let config = GameConfig::load_default()?;
    let _profiler = if config.profiler {
        puffin::set_scopes_on(true);
        match puffin_http::Server::new(&config.profiler_addr) {
            Ok(server) => {
                log::info!("Profiler listening on {}", config.profiler_addr);
                Some(server)
            }
            Err(err) => {
                log::warn!("Profiler disabled: {err}");
                None
            }
        }
    } else {
        None
    };

    let tick = Duration::from_secs_f64(1.0 / f64::from(config.ticks_per_second.max(1)));
    let hold_frames = (config.ticks_per_second / 3).max(1);
    let max_frames = config.max_frames;
    let mut game = match start_game(config) {
        Ok(game) => game,
        Err(err) => {
            log::error!("Cannot start: {err}");
            return Err(err.into());
        }
    };

    let lines = spawn_stdin_reader();
    let started = Instant::now();
    let mut held: Option<(Intent, u32)> = None;
    let mut seen = 0u64;
    let mut input_closed = false;

    loop {
        let frame_start = Instant::now();
        let mut intents = Vec::new();
        if !input_closed {
            match lines.try_recv() {
                Ok(line) => match parse_command(&line) {
                    Some(Command::Hold(intent)) => held = Some((intent, hold_frames)),
                    Some(Command::Once(intent)) => intents.push(intent),
                    Some(Command::Fight) => {
                        let _ = game.choose_combat();
                    }
                    Some(Command::Unknown(text)) => println!("? {text}"),
                    None => {}
                },
                Err(TryRecvError::Empty) => {}
                Err(TryRecvError::Disconnected) => input_closed = true,
            }
        }
        if let Some((intent, frames)) = held.take() {
            intents.push(intent.clone());
            if frames > 1 {
                held = Some((intent, frames - 1));
            }
        }

        let now_ms = u64::try_from(started.elapsed().as_millis()).unwrap_or(u64::MAX);
        let control = game.update(&FrameInput::new(now_ms, intents));

        for line in game.combat_log().since(seen) {
            println!("{line}");
        }
        seen = game.combat_log().total();
        game.drain_events();

        if control == LoopControl::ExitRequested {
            break;
        }
        if max_frames.is_some_and(|max| game.metrics().frame >= max) {
            log::info!("Stopping after {} frames", game.metrics().frame);
            break;
        }
        if input_closed && held.is_none() && max_frames.is_none() {
            break;
        }
        if let Some(rest) = tick.checked_sub(frame_start.elapsed()) {
            thread::sleep(rest);
        }
    }

    if game.is_game_over() {
        let leader = game
            .state()
            .party
            .members
            .first()
            .map_or_else(|| "Party".to_string(), |c| c.name.clone());
        match game.record_high_score(&leader) {
            Ok(Some(rank)) => println!("High score! Rank {}", rank + 1),
            Ok(None) => {}
            Err(err) => log::warn!("High score not recorded: {err}"),
        }
    }
    Ok(())
}
