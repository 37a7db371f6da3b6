//! Interactive chat keeping a conversation history across turns.
//!
//! Type 'quit' or 'exit' to end the conversation.

use std::io::{self, BufRead, Write};

use mini_openrouter::{Client, Message};

fn main() -> Result<(), mini_openrouter::Error> {
    let client = Client::new(None, None)?;

    let mut history = vec![Message::system(
        "You are a helpful, knowledgeable, and friendly AI assistant.",
    )];

    println!("Chatting with {}. Type 'quit' or 'exit' to leave.", mini_openrouter::DEFAULT_CHAT_MODEL);

    let stdin = io::stdin();
    loop {
        print!("\nYou: ");
        io::stdout().flush().ok();

        let mut line = String::new();
        if stdin.lock().read_line(&mut line).unwrap_or(0) == 0 {
            break;
        }

        let input = line.trim();
        if input.is_empty() {
            continue;
        }
        if matches!(input, "quit" | "exit" | "bye") {
            break;
        }

        history.push(Message::user(input));

        match client.send(history.clone()) {
            Ok(response) => {
                let reply = response.text().unwrap_or("(no reply)").to_string();
                println!("AI: {}", reply);
                history.push(Message::assistant(reply));
            }
            Err(e) => {
                // Drop the failed turn so the history stays consistent
                history.pop();
                println!("request failed: {}", e);
            }
        }
    }

    let user_turns = history.iter().filter(|m| m.role == "user").count();
    let ai_turns = history.iter().filter(|m| m.role == "assistant").count();
    println!(
        "\n{} messages total ({} from you, {} replies)",
        history.len(),
        user_turns,
        ai_turns
    );

    Ok(())
}
