//! Plain-text rendering of server messages for the terminal

use shared::{HintDirection, ScoreEntry, ServerMessage};
use std::fmt::Write;

const RULE: &str = "+-----+------------+--------+--------+--------+";

/// Formats an uptime in seconds as `HHh MMm SSs`
pub fn format_uptime(seconds: u64) -> String {
    format!(
        "{:02}h {:02}m {:02}s",
        seconds / 3600,
        (seconds % 3600) / 60,
        seconds % 60
    )
}

pub fn render_leaderboard(scores: &[ScoreEntry]) -> String {
    let mut out = String::new();
    let _ = writeln!(out, "{}", RULE);
    let _ = writeln!(
        out,
        "| {:>3} | {:<10} | {:>6} | {:>6} | {:>6} |",
        "#", "Player", "Score", "Tries", "Time"
    );
    let _ = writeln!(out, "{}", RULE);

    if scores.is_empty() {
        let _ = writeln!(out, "| {:^43} |", "No scores yet");
    }
    for entry in scores {
        let _ = writeln!(
            out,
            "| {:>3} | {:<10} | {:>6} | {:>6} | {:>5}s |",
            entry.rank, entry.name, entry.score, entry.attempts, entry.duration
        );
    }

    let _ = write!(out, "{}", RULE);
    out
}

/// Renders one message as the text shown to the player
pub fn render(message: &ServerMessage) -> String {
    match message {
        ServerMessage::Stats {
            uptime,
            active_clients,
            total_served,
            total_games,
            best_attempts,
            avg_attempts,
        } => {
            let best = if *total_games == 0 {
                "-".to_string()
            } else {
                best_attempts.to_string()
            };
            format!(
                "== Server statistics ==\n\
                 Uptime         : {}\n\
                 Active players : {}\n\
                 Total served   : {}\n\
                 Games played   : {}\n\
                 Best attempts  : {}\n\
                 Avg attempts   : {:.1}",
                format_uptime(*uptime),
                active_clients,
                total_served,
                total_games,
                best,
                avg_attempts
            )
        }
        ServerMessage::Leaderboard { scores, .. } => {
            format!("== Top scores ==\n{}", render_leaderboard(scores))
        }
        ServerMessage::Prompt { message } => message.clone(),
        ServerMessage::NameAccepted { name } => format!("Welcome {}!", name),
        ServerMessage::GameStart { player, min, max } => format!(
            "== New game ==\n\
             Player   : {}\n\
             Range    : {} - {}\n\
             Commands : stats | quit",
            player, min, max
        ),
        ServerMessage::Hint {
            direction,
            attempts,
        } => match direction {
            HintDirection::Grand => format!("Too high! (attempt #{})", attempts),
            HintDirection::Petit => format!("Too low! (attempt #{})", attempts),
        },
        ServerMessage::Victory {
            player,
            number,
            attempts,
            duration,
            score,
        } => format!(
            "== Congratulations {}! ==\n\
             Number   : {}\n\
             Attempts : {}\n\
             Time     : {}s\n\
             Score    : {} points",
            player, number, attempts, duration, score
        ),
        ServerMessage::Error { message } => format!("Error: {}", message),
        ServerMessage::Bye { message } => message.clone(),
    }
}
