//! Canned-response generator for demo and offline runs.
//!
//! Replies only promise category membership; wording is filler.

use async_trait::async_trait;
use log::debug;
use once_cell::sync::Lazy;
use rand::{ rngs::StdRng, seq::SliceRandom, SeedableRng };
use regex::Regex;
use std::sync::Mutex;
use std::time::Duration;

use super::ChatClient;
use crate::llm::error::ProviderError;

const GREETINGS: &[&str] = &[
    "Hello! How can I assist you today?",
    "Hi there! What can I help you with?",
    "Greetings! How may I be of service?",
    "Hello! I'm here to help. What do you need?",
];

const QUESTION_OPENERS: &[&str] = &[
    "That's an interesting question. Based on my knowledge, ",
    "I'd be happy to answer that. ",
    "Great question! Here's what I know: ",
    "Let me think about that. ",
];

const FACTS: &[&str] = &[
    "The Earth is approximately 4.54 billion years old.",
    "The Great Barrier Reef is the world's largest coral reef system.",
    "The human body contains about 60% water.",
    "A group of flamingos is called a flamboyance.",
    "Honey never spoils when it is stored sealed.",
    "A day on Venus is longer than a year on Venus.",
    "The Hawaiian alphabet has only 12 letters.",
];

const CODE_SNIPPETS: &[&str] = &[
    "Here's a simple Python function to solve that:\n\n```python\ndef solution(input_data):\n    return input_data.split()\n```",
    "You could implement that in JavaScript like this:\n\n```javascript\nfunction processData(data) {\n  return data.map(item => item * 2);\n}\n```",
    "Here's how you might approach this problem:\n\n1. Parse the input\n2. Apply the algorithm\n3. Format the output",
    "This is a classic problem that can be solved using dynamic programming. Break it down into smaller subproblems.",
];

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Category {
    Greeting,
    Question,
    Code,
    Fact,
}

static GREETING: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"(?i)^\s*(hey|greetings)|\b(hello|hi)\b").expect("valid greeting pattern")
});

static CODE: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"(?i)code|program|function|algorithm|solve").expect("valid code pattern")
});

/// First match wins: greeting, question, code, then fact.
pub fn classify(message: &str) -> Category {
    if GREETING.is_match(message) {
        Category::Greeting
    } else if message.contains('?') {
        Category::Question
    } else if CODE.is_match(message) {
        Category::Code
    } else {
        Category::Fact
    }
}

pub struct MockChatClient {
    display_name: String,
    rng: Mutex<StdRng>,
    delay: Duration,
}

impl MockChatClient {
    pub fn new(display_name: &str, delay: Duration) -> Self {
        Self::with_rng(display_name, StdRng::from_entropy(), delay)
    }

    /// Deterministic picker: the same seed and inputs give the same replies.
    pub fn with_seed(display_name: &str, seed: u64, delay: Duration) -> Self {
        Self::with_rng(display_name, StdRng::seed_from_u64(seed), delay)
    }

    fn with_rng(display_name: &str, rng: StdRng, delay: Duration) -> Self {
        Self {
            display_name: display_name.to_string(),
            rng: Mutex::new(rng),
            delay,
        }
    }

    fn compose(&self, category: Category, message: &str) -> String {
        let mut rng = self.rng.lock().unwrap_or_else(|poisoned| poisoned.into_inner());
        let mut pick = |list: &[&'static str]| -> &'static str { list.choose(&mut *rng).copied().unwrap_or_default() };

        let body = match category {
            Category::Greeting => pick(GREETINGS).to_string(),
            Category::Question => format!("{}{}", pick(QUESTION_OPENERS), pick(FACTS)),
            Category::Code => pick(CODE_SNIPPETS).to_string(),
            Category::Fact => format!("I processed your message: \"{}\". {}", message, pick(FACTS)),
        };
        format!("{}: {}", self.display_name, body)
    }
}

#[async_trait]
impl ChatClient for MockChatClient {
    async fn send(
        &self,
        message: &str,
        _api_key: &str,
        model: &str
    ) -> Result<String, ProviderError> {
        let category = classify(message);
        debug!("Mock {} ({}) answering as {:?}", self.display_name, model, category);
        let reply = self.compose(category, message);
        if !self.delay.is_zero() {
            tokio::time::sleep(self.delay).await;
        }
        Ok(reply)
    }

    fn display_name(&self) -> &str {
        &self.display_name
    }

    fn requires_credential(&self) -> bool {
        false
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn classifies_by_keyword() {
        assert_eq!(classify("Hello there"), Category::Greeting);
        assert_eq!(classify("hey, you"), Category::Greeting);
        assert_eq!(classify("HI"), Category::Greeting);
        assert_eq!(classify("What is rust?"), Category::Question);
        assert_eq!(classify("write a function to sort"), Category::Code);
        assert_eq!(classify("this is a thing"), Category::Fact);
    }

    #[test]
    fn greeting_beats_question() {
        assert_eq!(classify("hi, can you solve this?"), Category::Greeting);
    }

    #[tokio::test]
    async fn same_seed_same_replies() {
        let a = MockChatClient::with_seed("Claude", 42, Duration::ZERO);
        let b = MockChatClient::with_seed("Claude", 42, Duration::ZERO);

        for input in ["hello", "why?", "show me code", "plain words"] {
            let left = a.send(input, "", "claude").await.unwrap();
            let right = b.send(input, "", "claude").await.unwrap();
            assert_eq!(left, right);
        }
    }

    #[tokio::test]
    async fn replies_stay_in_their_category() {
        let client = MockChatClient::with_seed("ChatGPT", 7, Duration::ZERO);

        let greeting = client.send("hello", "", "gpt-4").await.unwrap();
        let body = greeting.strip_prefix("ChatGPT: ").unwrap();
        assert!(GREETINGS.contains(&body));

        let question = client.send("how old is the earth?", "", "gpt-4").await.unwrap();
        let body = question.strip_prefix("ChatGPT: ").unwrap();
        assert!(QUESTION_OPENERS.iter().any(|o| body.starts_with(o)));
        assert!(FACTS.iter().any(|f| body.ends_with(f)));

        let fact = client.send("nice weather", "", "gpt-4").await.unwrap();
        assert!(fact.starts_with("ChatGPT: I processed your message: \"nice weather\". "));
    }
}
