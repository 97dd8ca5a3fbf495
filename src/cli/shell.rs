//! Line-oriented terminal front end over a `ChatSession`.

use log::error;
use std::error::Error;
use std::sync::Arc;
use tokio::io::{ self, AsyncBufReadExt, AsyncWriteExt, BufReader };

use crate::llm::ProviderId;
use crate::models::chat::{ ChatMessage, Role };
use crate::models::settings::Theme;
use crate::session::ChatSession;

const HELP: &str = "\
Commands:
  /provider <claude|openai|v0|groq>  select provider
  /model <id>                        select model (empty resets to provider default)
  /key <provider> <key>              save an API key (omit key to remove it)
  /theme <light|dark|system>         save theme preference
  /font <small|medium|large>         save font size preference
  /clear                             clear the conversation
  /history                           print the conversation
  /status                            print status and selection
  /help                              show this help
  /quit                              exit
Anything else is sent as a message.";

#[derive(Debug, PartialEq, Eq)]
pub enum Command {
    Send(String),
    Provider(ProviderId),
    Model(Option<String>),
    Key(ProviderId, String),
    Theme(Theme),
    Font(String),
    Clear,
    History,
    Status,
    Help,
    Quit,
    Empty,
    Invalid(String),
}

pub fn parse_command(line: &str) -> Command {
    let trimmed = line.trim();
    if trimmed.is_empty() {
        return Command::Empty;
    }
    if !trimmed.starts_with('/') {
        return Command::Send(trimmed.to_string());
    }

    let mut parts = trimmed.split_whitespace();
    let name = parts.next().unwrap_or_default();
    let rest: Vec<&str> = parts.collect();

    match (name, rest.as_slice()) {
        ("/provider", [id]) =>
            match id.parse() {
                Ok(provider) => Command::Provider(provider),
                Err(e) => Command::Invalid(format!("{}", e)),
            }
        ("/model", []) => Command::Model(None),
        ("/model", [id]) => Command::Model(Some(id.to_string())),
        ("/key", [id, key @ ..]) =>
            match id.parse() {
                Ok(provider) => Command::Key(provider, key.join(" ")),
                Err(e) => Command::Invalid(format!("{}", e)),
            }
        ("/theme", [theme]) =>
            match theme.parse() {
                Ok(theme) => Command::Theme(theme),
                Err(e) => Command::Invalid(e),
            }
        ("/font", [size]) =>
            match *size {
                "small" | "medium" | "large" => Command::Font(size.to_string()),
                other => Command::Invalid(format!("Unsupported font size: {}", other)),
            }
        ("/clear", []) => Command::Clear,
        ("/history", []) => Command::History,
        ("/status", []) => Command::Status,
        ("/help", []) => Command::Help,
        ("/quit", []) | ("/exit", []) => Command::Quit,
        _ => Command::Invalid(format!("Unknown command: {} (try /help)", trimmed)),
    }
}

pub fn format_message(message: &ChatMessage) -> String {
    let label = match message.role {
        Role::User => "You",
        Role::Assistant => "AI",
        Role::System => "System",
    };
    format!("{}: {}", label, message.content)
}

async fn print(out: &mut io::Stdout, text: &str) -> io::Result<()> {
    out.write_all(text.as_bytes()).await?;
    out.write_all(b"\n").await?;
    out.flush().await
}

/// Runs one command. Returns `false` when the shell should exit.
pub async fn execute(
    session: &ChatSession,
    command: Command,
    out: &mut io::Stdout
) -> Result<bool, Box<dyn Error + Send + Sync>> {
    let settings = session.settings();
    match command {
        Command::Empty => {}
        Command::Send(text) => {
            if let Some(reply) = session.submit(&text).await? {
                print(out, &format_message(&reply)).await?;
            }
            print(out, &format!("[{}]", session.status())).await?;
        }
        Command::Provider(provider) => {
            let saved = settings.update_settings(|s| {
                s.provider = provider;
                s.model = None;
            }).await?;
            print(out, &format!("Provider: {} ({})", provider.display_name(), saved.effective_model())).await?;
        }
        Command::Model(model) => {
            let saved = settings.update_settings(|s| {
                s.model = model;
            }).await?;
            print(out, &format!("Model: {}", saved.effective_model())).await?;
        }
        Command::Key(provider, key) => {
            settings.save_api_key(provider, &key).await?;
            print(out, "Settings saved").await?;
        }
        Command::Theme(theme) => {
            settings.update_settings(|s| {
                s.theme = theme;
            }).await?;
            print(out, &format!("Theme: {}", theme)).await?;
        }
        Command::Font(size) => {
            settings.update_settings(|s| {
                s.font_size = size.clone();
            }).await?;
            print(out, &format!("Font size: {}", size)).await?;
        }
        Command::Clear => {
            if session.clear().await? {
                print(out, "Conversation cleared").await?;
            }
        }
        Command::History => {
            for message in session.conversation().await.iter() {
                print(out, &format_message(message)).await?;
            }
        }
        Command::Status => {
            let current = settings.settings().await;
            print(
                out,
                &format!(
                    "{} | {} / {} | keys: {:?}",
                    session.status(),
                    current.provider.display_name(),
                    current.effective_model(),
                    settings.credentials().await.configured()
                )
            ).await?;
        }
        Command::Help => print(out, HELP).await?,
        Command::Invalid(reason) => print(out, &reason).await?,
        Command::Quit => {
            return Ok(false);
        }
    }
    Ok(true)
}

pub async fn run(session: Arc<ChatSession>) -> Result<(), Box<dyn Error + Send + Sync>> {
    let mut out = io::stdout();
    let history = session.load_history().await?;
    for message in history.iter() {
        print(&mut out, &format_message(message)).await?;
    }
    print(&mut out, "Type /help for commands.").await?;

    let mut lines = BufReader::new(io::stdin()).lines();
    while let Some(line) = lines.next_line().await? {
        match execute(&session, parse_command(&line), &mut out).await {
            Ok(true) => {}
            Ok(false) => {
                break;
            }
            Err(e) => {
                error!("Command failed: {}", e);
                print(&mut out, &format!("Error: {}", e)).await?;
            }
        }
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn plain_text_is_sent_trimmed() {
        assert_eq!(parse_command("  hello there \n"), Command::Send("hello there".to_string()));
        assert_eq!(parse_command("   "), Command::Empty);
    }

    #[test]
    fn parses_selection_commands() {
        assert_eq!(parse_command("/provider chatgpt"), Command::Provider(ProviderId::OpenAI));
        assert_eq!(parse_command("/model gemma2-9b-it"), Command::Model(Some("gemma2-9b-it".to_string())));
        assert_eq!(parse_command("/model"), Command::Model(None));
        assert_eq!(parse_command("/theme dark"), Command::Theme(Theme::Dark));
        assert_eq!(parse_command("/font large"), Command::Font("large".to_string()));
    }

    #[test]
    fn key_command_allows_removal() {
        assert_eq!(parse_command("/key groq gsk_1"), Command::Key(ProviderId::Groq, "gsk_1".to_string()));
        assert_eq!(parse_command("/key v0.dev"), Command::Key(ProviderId::V0, String::new()));
    }

    #[test]
    fn bad_commands_are_reported_not_sent() {
        assert!(matches!(parse_command("/provider bard"), Command::Invalid(_)));
        assert!(matches!(parse_command("/font huge"), Command::Invalid(_)));
        assert!(matches!(parse_command("/frobnicate"), Command::Invalid(_)));
        assert!(matches!(parse_command("/clear now"), Command::Invalid(_)));
    }

    #[test]
    fn formats_messages_with_role_labels() {
        assert_eq!(format_message(&ChatMessage::user("hi")), "You: hi");
        assert_eq!(format_message(&ChatMessage::assistant("yo", None)), "AI: yo");
        assert_eq!(format_message(&ChatMessage::system("Error: x")), "System: Error: x");
    }
}
