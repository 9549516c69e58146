//! Wire protocol text
//!
//! Plain-text, newline-terminated lines. No framing header, no length
//! prefix. Broadcast lines are stored without their trailing newline; the
//! federator appends it when fanning out.

/// Sent when a connection is accepted and after every invalid attempt (no newline)
pub const USERNAME_PROMPT: &str = "What is your username?: ";

/// Sent when the submitted name is empty
pub const INVALID_USERNAME: &str = "Invalid username, try again.\n";

/// Sent to a joining client whose name is already in use, before closing
pub const USERNAME_TAKEN: &str = "Username is already taken, bye.\n";

/// Sent to a joining client when membership is at capacity, before closing
pub const SERVER_FULL: &str = "Server is full, bye.\n";

/// The only client command
pub const QUIT_COMMAND: &str = "!quit";

/// `→ name`
pub fn join_notice(name: &str) -> String {
    format!("→ {}", name)
}

/// `← name`
pub fn leave_notice(name: &str) -> String {
    format!("← {}", name)
}

/// `name → text`
pub fn chat_line(name: &str, text: &str) -> String {
    format!("{} → {}", name, text)
}
