use std::{
    io::BufRead,
    sync::{
        atomic::{AtomicBool, Ordering},
        mpsc::{self, Receiver, RecvTimeoutError, TryRecvError},
        Arc,
    },
    thread,
    time::Duration,
};

use anyhow::Result;
use log::{debug, info, warn};

use jump_height_estimator::session::{Command, ControlSurface};

const IDLE_POLL_INTERVAL: Duration = Duration::from_millis(200);

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ConsoleCommand {
    Session(Command),
    Quit,
}

pub fn parse_console_command(line: &str) -> Option<ConsoleCommand> {
    match line.trim().to_ascii_lowercase().as_str() {
        "start" | "s" => Some(ConsoleCommand::Session(Command::Start)),
        "stop" | "x" => Some(ConsoleCommand::Session(Command::Stop)),
        "quit" | "q" | "exit" => Some(ConsoleCommand::Quit),
        _ => None,
    }
}

/// Ctrl+C always means Stop (or Quit when nothing is running). With `interactive`,
/// commands are also read line by line from stdin on a helper thread.
pub struct ConsoleControls {
    interrupted: Arc<AtomicBool>,
    commands: Option<Receiver<ConsoleCommand>>,
    quit: bool,
}

impl ConsoleControls {
    pub fn new(interactive: bool) -> Result<Self> {
        let interrupted = Arc::new(AtomicBool::new(false));
        signal_hook::flag::register(signal_hook::consts::SIGINT, Arc::clone(&interrupted))?;

        let commands = if interactive {
            let (tx, rx) = mpsc::channel();
            thread::spawn(move || {
                let stdin = std::io::stdin();
                for line in stdin.lock().lines() {
                    let Ok(line) = line else { break };
                    match parse_console_command(&line) {
                        Some(command) => {
                            if tx.send(command).is_err() {
                                return;
                            }
                        }
                        None if line.trim().is_empty() => {}
                        None => warn!("Unknown command \"{}\"; try start, stop or quit", line.trim()),
                    }
                }
                debug!("stdin closed");
                let _ = tx.send(ConsoleCommand::Quit);
            });
            Some(rx)
        } else {
            None
        };

        Ok(ConsoleControls {
            interrupted,
            commands,
            quit: false,
        })
    }

    pub fn quit_requested(&self) -> bool {
        self.quit
    }

    /// Block until a command arrives while no session is running. None means quit.
    pub fn wait_for_command(&mut self) -> Option<Command> {
        loop {
            if self.quit {
                return None;
            }
            if self.interrupted.swap(false, Ordering::Relaxed) {
                info!("Interrupted; quitting");
                self.quit = true;
                return None;
            }

            let Some(commands) = &self.commands else {
                return None;
            };
            match commands.recv_timeout(IDLE_POLL_INTERVAL) {
                Ok(ConsoleCommand::Session(command)) => return Some(command),
                Ok(ConsoleCommand::Quit) | Err(RecvTimeoutError::Disconnected) => {
                    self.quit = true;
                }
                Err(RecvTimeoutError::Timeout) => {}
            }
        }
    }
}

impl ControlSurface for ConsoleControls {
    fn poll_command(&mut self) -> Option<Command> {
        if self.interrupted.swap(false, Ordering::Relaxed) {
            info!("Interrupted; stopping session");
            return Some(Command::Stop);
        }

        let commands = self.commands.as_ref()?;
        match commands.try_recv() {
            Ok(ConsoleCommand::Session(command)) => Some(command),
            Ok(ConsoleCommand::Quit) => {
                self.quit = true;
                Some(Command::Stop)
            }
            Err(TryRecvError::Empty) | Err(TryRecvError::Disconnected) => None,
        }
    }
}
