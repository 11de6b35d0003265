//! Exchange names and routing-key conventions shared by the game server and
//! clients.

pub const EXCHANGE_PERIL_DIRECT: &str = "peril_direct";
pub const EXCHANGE_PERIL_TOPIC: &str = "peril_topic";
pub const EXCHANGE_PERIL_DLX: &str = "peril_dlx";
pub const DEAD_LETTER_QUEUE: &str = "peril_dlq";

pub const PAUSE_KEY: &str = "pause";
pub const ARMY_MOVES_PREFIX: &str = "army_moves";
pub const WAR_RECOGNITIONS_PREFIX: &str = "war";
pub const GAME_LOG_SLUG: &str = "game_logs";

/// `<prefix>.<username>`, used for per-player queues and keys.
pub fn user_key(prefix: &str, username: &str) -> String {
    format!("{prefix}.{username}")
}

/// `<prefix>.*`: any single token after the prefix.
pub fn any_one(prefix: &str) -> String {
    format!("{prefix}.*")
}

/// `<prefix>.#`: the prefix followed by zero or more tokens.
pub fn any_tail(prefix: &str) -> String {
    format!("{prefix}.#")
}

/// AMQP topic matching: `*` matches exactly one dot-separated token, `#`
/// matches zero or more.
pub fn topic_matches(pattern: &str, key: &str) -> bool {
    let pattern: Vec<&str> = pattern.split('.').collect();
    let key: Vec<&str> = key.split('.').collect();
    match_tokens(&pattern, &key)
}

fn match_tokens(pattern: &[&str], key: &[&str]) -> bool {
    match pattern.split_first() {
        None => key.is_empty(),
        Some((&"#", rest)) => (0..=key.len()).any(|skip| match_tokens(rest, &key[skip..])),
        Some((&head, rest)) => match key.split_first() {
            Some((&token, key_rest)) if head == "*" || head == token => {
                match_tokens(rest, key_rest)
            }
            _ => false,
        },
    }
}
