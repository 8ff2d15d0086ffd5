//! Fetch a prompt from Langfuse three ways: the production version, a labelled version and an exact version.
//!
//! Requires `LANGFUSE_PUBLIC_KEY` and `LANGFUSE_SECRET_KEY` (and optionally `LANGFUSE_HOST`),
//! either exported or in a `.env` file.
use prompt_compile::providers::langfuse::Client;
use prompt_compile::{FetchRequest, Prompt, PromptProvider, ProviderError};

const PROMPT_NAME: &str = "langfuse-playground/example";

#[tokio::main]
async fn main() -> Result<(), anyhow::Error> {
    tracing_subscriber::fmt::init();
    dotenvy::dotenv().ok();

    let client = match Client::from_env() {
        Ok(client) => client,
        Err(e @ ProviderError::Configuration(_)) => {
            eprintln!("{e}");
            eprintln!("Create a .env file with your project's API keys (Settings > API Keys in the Langfuse dashboard).");
            return Err(e.into());
        }
        Err(e) => return Err(e.into()),
    };

    let requests = [
        ("Production prompt", FetchRequest::new(PROMPT_NAME)),
        ("Labelled prompt", FetchRequest::new(PROMPT_NAME).label("251105")),
        ("Versioned prompt", FetchRequest::new(PROMPT_NAME).version(1)),
    ];

    for (title, request) in requests {
        println!("{title}: {PROMPT_NAME} ({})", request.selector());

        match client.fetch(request).await {
            Ok(prompt) => print_prompt(&prompt),
            Err(e) => println!("Could not fetch prompt: {e}"),
        }
    }

    Ok(())
}

fn print_prompt(prompt: &Prompt) {
    println!("  name:    {}", prompt.name);
    println!("  version: {}", prompt.version);
    println!("  labels:  {}", prompt.labels.join(", "));
    println!("  config:  {}", prompt.config);
    println!("  variables: {}", prompt.template().variables().join(", "));
    println!("{}\n", prompt.source());
}
