//! Terminal chat with the road-safety consultant.
//!
//! Reads lines with `dialoguer` until the driver types `/quit`. Slash
//! commands show or export the transcript.

use dialoguer::Input;
use safe_drive_ai::chat::ChatService;

use crate::{ChatSession, export_json, format_transcript};

/// Shown before the first message.
pub const WELCOME: &str = "Road Safety Consultant\n\
     Ask me about Nigerian traffic laws, road conditions, or emergency steps.\n\
     Commands: /transcript, /export, /quit";

/// Shown while a reply is awaited.
const THINKING: &str = "Thinking safely...";

/// Slash commands understood by the chat prompt.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Command {
    Quit,
    Transcript,
    Export,
}

impl Command {
    fn parse(line: &str) -> Option<Self> {
        match line.trim() {
            "/quit" | "/exit" | "/q" => Some(Self::Quit),
            "/transcript" | "/show" => Some(Self::Transcript),
            "/export" => Some(Self::Export),
            _ => None,
        }
    }
}

/// Runs the chat loop and returns the finished session.
///
/// # Errors
///
/// Returns an error if reading from the terminal or exporting fails.
pub async fn run(service: &dyn ChatService) -> Result<ChatSession, Box<dyn std::error::Error>> {
    let mut session = ChatSession::new();
    println!("{WELCOME}\n");

    loop {
        let line: String = Input::new()
            .with_prompt("You")
            .allow_empty(true)
            .interact_text()?;

        match Command::parse(&line) {
            Some(Command::Quit) => break,
            Some(Command::Transcript) => {
                if let Some(title) = session.title() {
                    println!("Conversation: {title}\n");
                }
                print!("{}", format_transcript(session.transcript()));
                continue;
            }
            Some(Command::Export) => {
                println!("{}", export_json(session.transcript())?);
                continue;
            }
            None => {}
        }

        if line.trim().is_empty() {
            continue;
        }

        println!("{THINKING}");
        let reply = session.send_message(service, &line).await?;
        println!("\nSafe Drive AI: {}\n", reply.content);
    }

    Ok(session)
}
