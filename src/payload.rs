use chrono::Utc;
use rand::Rng;
use rand::seq::IndexedRandom;
use serde_json::{Value, json};

const WORDS: &[&str] = &[
    "technology",
    "innovation",
    "development",
    "software",
    "database",
    "performance",
    "optimization",
    "scalability",
    "architecture",
    "microservices",
    "MongoDB",
    "Spring Boot",
    "Java",
    "application",
    "system",
    "CQRS",
    "latency",
];

const COMMENT_ALPHABET: &[u8] = b"abcdefghijklmnopqrstuvwxyzABCDEFGHIJKLMNOPQRSTUVWXYZ0123456789 ";

pub const COMMENT_LENGTH: usize = 50;

pub const EMOJIS: &[&str] = &[
    "\u{1F44D}",
    "\u{2764}\u{FE0F}",
    "\u{1F602}",
    "\u{1F389}",
    "\u{1F680}",
    "\u{1F62E}",
    "\u{1F622}",
    "\u{1F44E}",
];

/// Build a post body. `id` embeds the index, the current unix time and a
/// random suffix so repeated runs never collide.
pub fn generate_post<R: Rng + ?Sized>(index: usize, rng: &mut R) -> Value {
    let word_count = rng.random_range(8..=12);
    let words: Vec<&str> = WORDS.choose_multiple(rng, word_count).copied().collect();
    let suffix: u32 = rng.random_range(1000..=9999);
    let id_suffix: u32 = rng.random_range(1000..=9999);

    json!({
        "id": format!("bench_post_{}_{}_{}", index, Utc::now().timestamp(), id_suffix),
        "title": format!("Benchmark post #{}", index),
        "content": format!("Benchmark post #{} - {} - {}", index, words.join(" "), suffix),
    })
}

/// Build a comment body of random alphanumerics and spaces.
pub fn generate_comment<R: Rng + ?Sized>(rng: &mut R) -> Value {
    let content: String = (0..COMMENT_LENGTH)
        .filter_map(|_| COMMENT_ALPHABET.choose(rng).map(|b| *b as char))
        .collect();
    json!({ "content": content })
}

pub fn generate_reaction<R: Rng + ?Sized>(rng: &mut R) -> Value {
    let emoji = EMOJIS.choose(rng).copied().unwrap_or("\u{1F44D}");
    json!({ "emoji": emoji })
}
