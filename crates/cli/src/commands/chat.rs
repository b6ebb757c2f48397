//! `wayfarer chat` — Interactive or single-message chat mode.
//!
//! Streams the agent's [`RunEvent`]s to the terminal: plan text behind a
//! `[Plan]` prefix, answer deltas behind `Assistant:`, and a capability
//! trailer (`[Used: ...]`) after each turn.

use std::io::Write;
use std::sync::Arc;
use tokio::io::{AsyncBufReadExt, BufReader};
use tokio::sync::mpsc;
use wayfarer_agent::{AgentLoop, RunEvent};
use wayfarer_config::AppConfig;
use wayfarer_config::preferences::{load_preferences, save_preferences};
use wayfarer_core::message::Message;

const PREFERENCES_PROMPT: &str = "Tell me your traveling preferences (e.g. are you vegetarian? \
     do you like nightlife?) so I can plan your trip better.";

pub async fn run(message: Option<String>) -> Result<(), Box<dyn std::error::Error>> {
    let config = AppConfig::load().map_err(|e| format!("Failed to load config: {e}"))?;

    // Check for API key early — give a clear error
    if config.api_key.is_none() {
        eprintln!();
        eprintln!("  ERROR: No LLM API key configured!");
        eprintln!();
        eprintln!("  Set one of these environment variables:");
        eprintln!("    OPENAI_API_KEY=sk-...        (for OpenAI)");
        eprintln!("    OPENROUTER_API_KEY=sk-or-... (for OpenRouter)");
        eprintln!("    WAYFARER_API_KEY=sk-...      (generic)");
        eprintln!();
        eprintln!("  Or add api_key to your config file:");
        eprintln!("    {}", AppConfig::config_dir().join("config.toml").display());
        eprintln!();
        return Err("No API key found. See above for setup instructions.".into());
    }

    if config.weather.api_key.is_none() {
        eprintln!("  Note: OPENWEATHER_API_KEY is not set — weather queries will fail.");
    }

    // Build provider from config
    let router = wayfarer_providers::build_from_config(&config);
    let provider = router.default().ok_or("No default provider configured")?;

    // Build tools and the agent loop
    let registry = Arc::new(wayfarer_tools::default_registry(&config));
    let agent = Arc::new(
        AgentLoop::new(
            provider,
            &config.default_model,
            config.default_temperature,
            registry,
        )
        .with_max_tokens(config.default_max_tokens)
        .with_tool_concurrency(config.agent.max_concurrent_tools)
        .with_max_rounds(config.agent.max_rounds),
    );

    let prefs_path = AppConfig::preferences_path();
    let mut preferences = load_preferences(&prefs_path);

    if let Some(msg) = message {
        // Single message mode
        run_turn(&agent, Vec::new(), &msg, &preferences).await?;
        println!();
        return Ok(());
    }

    // Interactive mode
    println!();
    println!("Hi! I'm your travel assistant. I can help you with weather, places of interest etc.");
    println!("(type 'quit' or 'exit' to stop)");
    println!();

    let stdin = BufReader::new(tokio::io::stdin());
    let mut lines = stdin.lines();

    // First run: capture preferences before the conversation starts
    if preferences.is_empty() {
        println!("Assistant: {PREFERENCES_PROMPT}");
        print!("You: ");
        std::io::stdout().flush()?;
        if let Some(line) = lines.next_line().await? {
            let line = line.trim().to_string();
            if !line.is_empty() {
                if let Err(e) = save_preferences(&prefs_path, &line) {
                    eprintln!("  (could not save preferences: {e})");
                }
                preferences = line;
            }
        }
        println!();
    }

    let mut history: Vec<Message> = Vec::new();

    loop {
        print!("You: ");
        std::io::stdout().flush()?;

        let Some(line) = lines.next_line().await? else {
            println!("\nGoodbye!");
            break; // EOF (Ctrl+D)
        };
        let input = line.trim().to_string();

        if input.is_empty() {
            println!("Please enter a valid input");
            continue;
        }
        if matches!(input.to_lowercase().as_str(), "quit" | "exit" | "q") {
            println!("Goodbye!");
            break;
        }

        match run_turn(&agent, std::mem::take(&mut history), &input, &preferences).await {
            Ok(next_history) => history = next_history,
            Err(e) => {
                eprintln!("\n  [Error] {e}");
            }
        }
        println!();
    }

    Ok(())
}

/// Run one turn, printing events as they stream, and return the next
/// history seed. On failure the history seed is lost for this turn; the
/// caller starts the next turn from an empty seed.
async fn run_turn(
    agent: &Arc<AgentLoop>,
    history: Vec<Message>,
    input: &str,
    preferences: &str,
) -> Result<Vec<Message>, Box<dyn std::error::Error>> {
    let (tx, mut rx) = mpsc::unbounded_channel();

    let agent = agent.clone();
    let input = input.to_string();
    let prefs = (!preferences.is_empty()).then(|| preferences.to_string());
    let handle = tokio::spawn(async move {
        agent.run(history, &input, prefs.as_deref(), &tx).await
    });

    let mut streamed_plan = false;
    let mut streamed_answer = false;

    while let Some(event) = rx.recv().await {
        match event {
            RunEvent::PlanDelta { content } => {
                if !streamed_plan {
                    print!("\n[Plan] ");
                    streamed_plan = true;
                }
                print!("{content}");
                std::io::stdout().flush()?;
            }
            RunEvent::Plan { .. } => {
                if streamed_plan {
                    println!();
                }
            }
            RunEvent::AnswerDelta { content } => {
                if !streamed_answer {
                    print!("\nAssistant: ");
                    streamed_answer = true;
                }
                print!("{content}");
                std::io::stdout().flush()?;
            }
            RunEvent::Result {
                content,
                used_weather,
                used_places,
                ..
            } => {
                if streamed_answer {
                    println!();
                } else {
                    println!("\nAssistant: {content}");
                }
                if used_weather || used_places {
                    let mut parts = Vec::new();
                    if used_weather {
                        parts.push("Weather API");
                    }
                    if used_places {
                        parts.push("Places (OpenStreetMap)");
                    }
                    println!("\n  [Used: {}]", parts.join(", "));
                } else {
                    println!("\n  [No external APIs were used]");
                }
            }
        }
    }

    let outcome = handle.await.map_err(|e| format!("agent task failed: {e}"))??;
    Ok(outcome.history)
}
