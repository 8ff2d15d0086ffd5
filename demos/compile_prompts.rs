//! Fetch a prompt from Langfuse and compile it with different variable sets.
//!
//! The last variable set is deliberately incomplete to show how a missing variable is reported.
//! A template that works well with this example:
//!
//! ```text
//! You are a helpful AI assistant named {{assistant_name}}.
//! User {{user_name}} asks: {{question}}
//! Please provide a detailed answer in {{language}}.
//! ```
use prompt_compile::providers::langfuse::Client;
use prompt_compile::{CompileError, FetchRequest, Prompt, PromptProvider, VariableSet};

const PROMPT_NAME: &str = "langfuse-playground/compile-example";

#[tokio::main]
async fn main() -> Result<(), anyhow::Error> {
    tracing_subscriber::fmt::init();
    dotenvy::dotenv().ok();

    let client = Client::from_env()?;
    let prompt = client.fetch(FetchRequest::new(PROMPT_NAME)).await?;

    println!("Prompt {} (version {})", prompt.name, prompt.version);
    println!("{}\n", prompt.source());

    let full = VariableSet::new()
        .with_variable("assistant_name", "Claude")
        .with_variable("user_name", "Serena")
        .with_variable("question", "How does prompt management work?")
        .with_variable("language", "Korean");
    compile_and_print(&prompt, &full);

    let other = VariableSet::new()
        .with_variable("assistant_name", "AI Helper")
        .with_variable("user_name", "developer")
        .with_variable("question", "How do I get started with async Rust?")
        .with_variable("language", "English");
    compile_and_print(&prompt, &other);

    let partial = VariableSet::new()
        .with_variable("user_name", "tester")
        .with_variable("question", "What happens when variables are missing?");
    compile_and_print(&prompt, &partial);

    Ok(())
}

fn compile_and_print(prompt: &Prompt, variables: &VariableSet) {
    println!("Variables:");
    for (k, v) in variables.iter() {
        println!("  {k}: {v}");
    }

    match prompt.compile(variables) {
        Ok(text) => println!("Compiled:\n{text}\n"),
        Err(e @ CompileError::MissingVariable { .. }) => {
            println!("Compilation failed: {e}");
            println!("Every placeholder in the template needs a value.\n");
        }
        Err(e) => println!("Compilation failed: {e}\n"),
    }
}
