use mini_openrouter::{ChatCompletions, Client, Message};

fn main() -> Result<(), mini_openrouter::Error> {
    let client = Client::new(None, None)?;

    // Create a new chat completion request
    let mut request = ChatCompletions::default();

    // Add a message to the chat history
    request
        .messages
        .push(Message::user("Hello! Can you tell me a fun fact about space?"));

    // Send the request to OpenRouter
    let response = client.chat_completions(&request)?;

    // Print the generated completion
    println!("{}", response.text().unwrap_or("(no reply)"));

    if let Some(total) = response.usage.as_ref().and_then(|u| u.total_tokens) {
        println!("Tokens used: {}", total);
    }

    Ok(())
}
