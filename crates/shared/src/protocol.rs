use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::error::UnavailableReason;

pub const OFFICIAL_JOKE_LABEL: &str = "Official Joke API";
pub const JOKE_API_LABEL: &str = "JokeAPI.dev";

/// Categories JokeAPI is asked to exclude on every request.
pub const JOKE_API_BLACKLIST_FLAGS: &[&str] = &[
    "nsfw",
    "religious",
    "political",
    "racist",
    "sexist",
    "explicit",
];

const PART_SEPARATOR: &str = "\n\n";

/// Body of `GET /random_joke` on the Official Joke API.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct OfficialJoke {
    pub setup: String,
    pub punchline: String,
}

impl OfficialJoke {
    pub fn parse(body: &[u8]) -> Result<Self, UnavailableReason> {
        let joke: OfficialJoke = serde_json::from_slice(body)
            .map_err(|err| UnavailableReason::Malformed(err.to_string()))?;
        require_text("setup", &joke.setup)?;
        require_text("punchline", &joke.punchline)?;
        Ok(joke)
    }

    pub fn display_text(&self) -> String {
        join_parts(&self.setup, &self.punchline)
    }
}

/// JokeAPI payload, discriminated by its `type` field.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "lowercase")]
pub enum JokeApiJoke {
    Single { joke: String },
    #[serde(rename = "twopart")]
    TwoPart { setup: String, delivery: String },
}

impl JokeApiJoke {
    /// Validates a raw JokeAPI body. Error envelopes (`"error": true`) and
    /// payloads missing the fields their discriminant requires are rejected.
    pub fn parse(body: &[u8]) -> Result<Self, UnavailableReason> {
        let value: Value = serde_json::from_slice(body)
            .map_err(|err| UnavailableReason::Malformed(err.to_string()))?;

        if value.get("error").and_then(Value::as_bool).unwrap_or(false) {
            let message = value
                .get("message")
                .and_then(Value::as_str)
                .unwrap_or("unspecified JokeAPI error");
            return Err(UnavailableReason::Upstream(message.to_string()));
        }

        let joke: JokeApiJoke = serde_json::from_value(value)
            .map_err(|err| UnavailableReason::Malformed(err.to_string()))?;
        match &joke {
            JokeApiJoke::Single { joke } => require_text("joke", joke)?,
            JokeApiJoke::TwoPart { setup, delivery } => {
                require_text("setup", setup)?;
                require_text("delivery", delivery)?;
            }
        }
        Ok(joke)
    }

    pub fn display_text(&self) -> String {
        match self {
            JokeApiJoke::Single { joke } => joke.clone(),
            JokeApiJoke::TwoPart { setup, delivery } => join_parts(setup, delivery),
        }
    }
}

fn join_parts(first: &str, second: &str) -> String {
    format!("{first}{PART_SEPARATOR}{second}")
}

fn require_text(field: &str, value: &str) -> Result<(), UnavailableReason> {
    if value.trim().is_empty() {
        return Err(UnavailableReason::Malformed(format!("field `{field}` is empty")));
    }
    Ok(())
}

#[cfg(test)]
#[path = "tests/protocol_tests.rs"]
mod tests;
