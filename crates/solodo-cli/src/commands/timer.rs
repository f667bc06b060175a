use std::io::Write;
use std::time::Duration;

use clap::Subcommand;
use solodo_core::session::SessionController;
use solodo_core::storage::{Config, Database};
use solodo_core::timer::{format_signed, Mode};

#[derive(Subcommand)]
pub enum TimerAction {
    /// Start a study interval
    Start,
    /// Stop studying and begin the break; records the study log
    Stop {
        /// Tag to attach to the recorded session (repeatable)
        #[arg(long = "tag")]
        tags: Vec<String>,
        /// Free-text memo for the recorded session
        #[arg(long)]
        memo: Option<String>,
    },
    /// End the break and return to idle
    Reset,
    /// Print current timer state as JSON
    Status,
    /// Tick the timer once a second until it goes idle
    Watch,
}

pub fn run(action: TimerAction) -> Result<(), Box<dyn std::error::Error>> {
    let config = Config::load_or_default();
    let db = Database::open()?;
    let mut controller = SessionController::new(db, &config);

    match action {
        TimerAction::Start => match controller.start() {
            Some(event) => println!("{}", serde_json::to_string_pretty(&event)?),
            None => {
                eprintln!("a session is already running");
                println!("{}", serde_json::to_string_pretty(&controller.snapshot())?);
            }
        },
        TimerAction::Stop { tags, memo } => {
            // The log entry is appended before the break transition; a
            // store failure surfaces here and the timer stays in studying.
            match controller.stop(&tags, memo.as_deref())? {
                Some(event) => println!("{}", serde_json::to_string_pretty(&event)?),
                None => {
                    eprintln!("no study session to stop");
                    println!("{}", serde_json::to_string_pretty(&controller.snapshot())?);
                }
            }
        }
        TimerAction::Reset => match controller.reset() {
            Some(event) => println!("{}", serde_json::to_string_pretty(&event)?),
            None => {
                eprintln!("no break to reset");
                println!("{}", serde_json::to_string_pretty(&controller.snapshot())?);
            }
        },
        TimerAction::Status => {
            if let Some(event) = controller.tick() {
                println!("{}", serde_json::to_string_pretty(&event)?);
            }
            println!("{}", serde_json::to_string_pretty(&controller.snapshot())?);
        }
        TimerAction::Watch => watch(controller)?,
    }
    Ok(())
}

/// Interactive 1-second ticker.
///
/// The interval is dropped and re-created after every mode change (cancel
/// the previous ticker, start a new one) and the loop exits when the
/// engine goes idle, so no ticker outlives the state that armed it.
fn watch(mut controller: SessionController) -> Result<(), Box<dyn std::error::Error>> {
    if !controller.is_running() {
        println!("timer is idle");
        return Ok(());
    }

    let runtime = tokio::runtime::Runtime::new()?;
    runtime.block_on(async move {
        let mut ticker = tokio::time::interval(Duration::from_secs(1));
        loop {
            ticker.tick().await;

            let mode_before = controller.mode();
            let event = controller.tick();
            if controller.mode() != mode_before {
                ticker = tokio::time::interval(Duration::from_secs(1));
            }

            if let Some(event) = &event {
                println!();
                println!("{}", serde_json::to_string_pretty(event)?);
            }

            match controller.mode() {
                Mode::Idle => {
                    println!("timer is idle");
                    return Ok(());
                }
                mode => {
                    print!(
                        "\r{:8} {}   ",
                        mode.as_str(),
                        format_signed(controller.remaining_secs())
                    );
                    std::io::stdout().flush().ok();
                }
            }
        }
    })
}
