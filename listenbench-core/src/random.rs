//! Random identifiers and sampling helpers used by scenarios

use rand::distributions::Alphanumeric;
use rand::seq::SliceRandom;
use rand::Rng;

const NAME_WORDS: &[&str] = &[
    "blue", "late", "night", "summer", "rain", "morning", "drive", "quiet", "neon", "coffee",
    "sunset", "road", "trip", "focus", "winter", "city", "dream", "party", "chill", "retro",
];

/// Random alphanumeric string of the given length
pub fn random_string(len: usize) -> String {
    rand::thread_rng()
        .sample_iter(&Alphanumeric)
        .take(len)
        .map(char::from)
        .collect()
}

/// Human-looking name, used for display names and playlist names
pub fn display_name() -> String {
    let mut rng = rand::thread_rng();
    let words = rng.gen_range(1..=3);
    let mut parts: Vec<&str> = (0..words)
        .filter_map(|_| NAME_WORDS.choose(&mut rng).copied())
        .collect();
    parts.dedup();
    format!("{} {}", parts.join(" "), rng.gen_range(1..1000))
}

/// Fresh account name for signup
pub fn generate_user_account() -> String {
    format!("user-{}", uuid::Uuid::new_v4().simple())
}

/// Up to `n` distinct elements in random order
pub fn sample<T: Clone>(items: &[T], n: usize) -> Vec<T> {
    items
        .choose_multiple(&mut rand::thread_rng(), n.min(items.len()))
        .cloned()
        .collect()
}

/// True with probability `percent`/100
pub fn chance(percent: u32) -> bool {
    rand::thread_rng().gen_range(0..100) < percent
}
