//! An example of using prompt templating with an agent.
//!
//! The template is fetched from a prompt store (an in-memory one here, so only `OPENAI_API_KEY` is needed),
//! compiled with your variables and sent to the agent.
use rig::client::ProviderClient;
use rig::{client::completion::CompletionClientDyn, providers::openai};

use prompt_compile::providers::in_memory::InMemoryPromptStore;
use prompt_compile::{FetchRequest, PromptProvider, PromptTemplating};

#[tokio::main]
async fn main() -> Result<(), anyhow::Error> {
    tracing_subscriber::fmt::init();
    dotenvy::dotenv().ok();

    let mut store = InMemoryPromptStore::new();
    store.insert("greeting", TEMPLATE, &["production"]);

    let prompt = store.fetch(FetchRequest::new("greeting")).await?;

    let client = openai::Client::from_env();

    let agent = client
        .agent("gpt-4o")
        .preamble(
            "You are a helpful assistant. Ensure you call the user by their name when responding.",
        )
        .build();

    let res = agent
        .with_prompt_template(prompt)
        .with_variable("user", "Rig")
        .prompt()
        .await?;

    println!("GPT-4o: {res}");

    Ok(())
}

const TEMPLATE: &str = "Hello, ChatGPT! My name is {{ user }}!";
