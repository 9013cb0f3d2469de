// Line-based input source: turns terminal lines into raw key events.

use crate::domain::{InputEvent, KeyCode};

use std::io::BufRead;
use tokio::sync::mpsc;
use tracing::{debug, warn};

/// Parses `down <key>` / `up <key>` where `<key>` is a key code or a name.
///
/// Returns `None` for blank lines and anything that is not a key transition.
pub fn parse_input_line(line: &str) -> Option<InputEvent> {
    let mut parts = line.split_whitespace();
    let edge = parts.next()?.to_ascii_lowercase();
    let key = parse_key(parts.next()?)?;
    if parts.next().is_some() {
        return None;
    }

    match edge.as_str() {
        "down" | "d" | "press" => Some(InputEvent::KeyDown(key)),
        "up" | "u" | "release" => Some(InputEvent::KeyUp(key)),
        _ => None,
    }
}

fn parse_key(token: &str) -> Option<KeyCode> {
    if let Ok(code) = token.parse::<u32>() {
        return Some(KeyCode(code));
    }

    let key = match token.to_ascii_lowercase().as_str() {
        "left" => KeyCode::ARROW_LEFT,
        "right" => KeyCode::ARROW_RIGHT,
        "up" => KeyCode::ARROW_UP,
        "down" => KeyCode::ARROW_DOWN,
        "space" => KeyCode::SPACE,
        "a" => KeyCode::A,
        "d" => KeyCode::D,
        "s" => KeyCode::S,
        "w" => KeyCode::W,
        "z" => KeyCode::Z,
        _ => return None,
    };
    Some(key)
}

/// Forwards parsed lines from `reader` until it ends or the session stops listening.
///
/// Blocking: runs on a dedicated thread because a pending terminal read cannot be cancelled.
pub fn forward_lines<B: BufRead>(reader: B, input_tx: mpsc::Sender<InputEvent>) {
    for line in reader.lines() {
        let line = match line {
            Ok(line) => line,
            Err(err) => {
                warn!(error = %err, "failed to read input line");
                break;
            }
        };

        let Some(event) = parse_input_line(&line) else {
            if !line.trim().is_empty() {
                debug!(%line, "unrecognized input line");
            }
            continue;
        };

        if input_tx.blocking_send(event).is_err() {
            debug!("session stopped listening for input");
            break;
        }
    }
}

pub fn spawn_stdin_reader(input_tx: mpsc::Sender<InputEvent>) -> std::io::Result<()> {
    std::thread::Builder::new()
        .name("stdin-input".to_string())
        .spawn(move || forward_lines(std::io::stdin().lock(), input_tx))
        .map(|_| ())
}
