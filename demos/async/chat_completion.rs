use mini_openrouter::{Client, Message};

#[tokio::main]
async fn main() -> Result<(), mini_openrouter::Error> {
    let client = Client::new(None, None)?;

    // Simple chat with the default model
    let message = "Hello! Can you tell me a fun fact about space?";
    let response = client.send(message).await?;
    println!("User: {}", message);
    println!("AI: {}", response.text().unwrap_or("(no reply)"));

    // Same thing, naming a different model
    let message = "Write a short poem about coding";
    let response = client
        .send_with_model(message, "anthropic/claude-3-haiku")
        .await?;
    println!("\nUser: {}", message);
    println!("AI (Claude): {}", response.text().unwrap_or("(no reply)"));

    // Multi-turn conversation
    let conversation = vec![
        Message::user("What's the capital of France?"),
        Message::assistant("The capital of France is Paris."),
        Message::user("What's the population of that city?"),
    ];
    let response = client.send(conversation).await?;
    println!("\nUser: What's the population of that city?");
    println!("AI: {}", response.text().unwrap_or("(no reply)"));

    Ok(())
}
