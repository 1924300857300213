// Copyright (c) 2026 100monkeys.ai
// SPDX-License-Identifier: AGPL-3.0

//! One-shot generation against a configured model

use anyhow::{Context, Result};
use clap::Args;
use colored::Colorize;
use std::path::PathBuf;

use scriptorium_core::domain::llm::GenerationRequest;

use super::load_registry;

#[derive(Args, Debug, Clone)]
pub struct GenerateArgs {
    /// Registered model name
    #[arg(value_name = "MODEL")]
    pub model: String,

    /// Prompt text
    #[arg(value_name = "PROMPT")]
    pub prompt: String,

    /// System prompt
    #[arg(long)]
    pub system: Option<String>,

    #[arg(long)]
    pub max_tokens: Option<u32>,

    #[arg(long)]
    pub temperature: Option<f64>,

    #[arg(long)]
    pub top_p: Option<f64>,

    #[arg(long)]
    pub top_k: Option<u32>,

    /// Stop sequence (repeatable)
    #[arg(long = "stop", value_name = "SEQUENCE")]
    pub stop: Vec<String>,

    /// Print the full normalized response as JSON
    #[arg(long)]
    pub json: bool,
}

impl GenerateArgs {
    pub fn to_request(&self) -> GenerationRequest {
        GenerationRequest {
            prompt: self.prompt.clone(),
            max_tokens: self.max_tokens,
            temperature: self.temperature,
            top_p: self.top_p,
            top_k: self.top_k,
            stop_sequences: (!self.stop.is_empty()).then(|| self.stop.clone()),
            system_prompt: self.system.clone(),
        }
    }
}

pub async fn execute(args: GenerateArgs, config_path: Option<PathBuf>) -> Result<()> {
    let (_, registry) = load_registry(config_path)?;

    let response = registry
        .generate(&args.model, &args.to_request())
        .await
        .with_context(|| format!("Generation with '{}' failed", args.model))?;

    if args.json {
        println!("{}", serde_json::to_string_pretty(&response)?);
        return Ok(());
    }

    println!("{}", response.text);
    if !response.usage.is_empty() {
        eprintln!(
            "{}",
            format!(
                "[{} / {}] usage: {}",
                response.provider,
                response.model,
                serde_json::Value::Object(response.usage)
            )
            .dimmed()
        );
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::Parser;

    #[derive(Parser)]
    struct TestCli {
        #[command(flatten)]
        args: GenerateArgs,
    }

    #[test]
    fn test_flags_map_onto_request() {
        let cli = TestCli::parse_from([
            "generate",
            "m1",
            "hello",
            "--system",
            "be brief",
            "--temperature",
            "0.2",
            "--stop",
            "END",
            "--stop",
            "\n\n",
        ]);
        let request = cli.args.to_request();

        assert_eq!(request.prompt, "hello");
        assert_eq!(request.temperature, Some(0.2));
        assert_eq!(request.max_tokens, None);
        assert_eq!(request.system_prompt.as_deref(), Some("be brief"));
        assert_eq!(
            request.stop_sequences,
            Some(vec!["END".to_string(), "\n\n".to_string()])
        );
    }

    #[test]
    fn test_no_stop_flags_means_no_stop_sequences() {
        let cli = TestCli::parse_from(["generate", "m1", "hello"]);
        assert_eq!(cli.args.to_request().stop_sequences, None);
    }
}
