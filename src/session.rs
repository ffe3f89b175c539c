//! Operator signals delivered to the frame loop.
//!
//! Begin and abort requests travel over a channel and are drained once per
//! frame, so they never interrupt frame processing halfway.

use crate::game::SessionCommand;
use log::{debug, info};
use std::io::BufRead;
use std::sync::mpsc::{self, Receiver, Sender};
use std::thread::{self, JoinHandle};

/// Receiving end of the operator signal channel
pub struct SessionControl {
    receiver: Receiver<SessionCommand>,
}

/// Create a connected sender and [`SessionControl`]
#[must_use]
pub fn channel() -> (Sender<SessionCommand>, SessionControl) {
    let (sender, receiver) = mpsc::channel();
    (sender, SessionControl { receiver })
}

impl SessionControl {
    /// Take every command that arrived since the last call, without blocking
    #[must_use]
    pub fn drain(&self) -> Vec<SessionCommand> {
        self.receiver.try_iter().collect()
    }
}

/// Map a line typed by the operator to a command
///
/// An empty line or `s` begins the session, `q` aborts it.
#[must_use]
pub fn command_for_line(line: &str) -> Option<SessionCommand> {
    match line.trim().to_lowercase().as_str() {
        "" | "s" | "start" => Some(SessionCommand::Begin),
        "q" | "quit" | "abort" => Some(SessionCommand::Abort),
        _ => None,
    }
}

/// Forward commands typed on `input` until it closes or the receiver goes away
pub fn forward_lines<B: BufRead>(input: B, sender: &Sender<SessionCommand>) {
    for line in input.lines() {
        let Ok(line) = line else {
            break;
        };
        match command_for_line(&line) {
            Some(command) => {
                if sender.send(command).is_err() {
                    break;
                }
            }
            None => debug!("Unrecognised operator input: {:?}", line),
        }
    }
}

/// Read operator commands from stdin on a background thread
pub fn spawn_stdin_reader(sender: Sender<SessionCommand>) -> JoinHandle<()> {
    info!("Operator console ready: press Enter to start, type q to abort");
    thread::spawn(move || forward_lines(std::io::stdin().lock(), &sender))
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Cursor;

    #[test]
    fn test_line_mapping() {
        assert_eq!(command_for_line(""), Some(SessionCommand::Begin));
        assert_eq!(command_for_line(" S \n"), Some(SessionCommand::Begin));
        assert_eq!(command_for_line("q"), Some(SessionCommand::Abort));
        assert_eq!(command_for_line("hello"), None);
    }

    #[test]
    fn test_forward_lines_in_order() {
        let (sender, control) = channel();
        forward_lines(Cursor::new("start\nnoise\nq\n"), &sender);
        assert_eq!(control.drain(), vec![SessionCommand::Begin, SessionCommand::Abort]);
        assert!(control.drain().is_empty());
    }

    #[test]
    fn test_forward_stops_when_receiver_dropped() {
        let (sender, control) = channel();
        drop(control);
        forward_lines(Cursor::new("s\ns\n"), &sender);
    }
}
