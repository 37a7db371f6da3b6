//! Send the same prompt to several models and compare the replies.

use std::time::Instant;

use mini_openrouter::Client;

const MODELS: &[&str] = &[
    "openai/gpt-3.5-turbo",
    "anthropic/claude-3-haiku",
    "meta-llama/llama-3.1-8b-instruct",
];

fn main() -> Result<(), mini_openrouter::Error> {
    let client = Client::new(None, None)?;
    let prompt = "Explain quantum computing in simple terms that a 10-year-old could understand.";

    println!("Prompt: {}\n", prompt);

    for model in MODELS {
        println!("--- {} ---", model);

        let start = Instant::now();
        match client.send_with_model(prompt, model) {
            Ok(response) => {
                let reply = response.text().unwrap_or("(no reply)");
                println!("{}", reply);
                print!("({:.2}s", start.elapsed().as_secs_f64());
                if let Some(total) = response.usage.as_ref().and_then(|u| u.total_tokens) {
                    print!(", {} tokens", total);
                }
                println!(", {} characters)\n", reply.len());
            }
            Err(e) => println!("request failed: {}\n", e),
        }
    }

    Ok(())
}
