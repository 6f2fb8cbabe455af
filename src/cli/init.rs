//! `megg init` command
//!
//! Without content, analyzes the directory and prints the questions a
//! scope's identity should answer. With `--info` (or `--interactive`),
//! creates the scope.
//!
//! # Usage
//! ```bash
//! megg init                              # Analyze current directory
//! megg init --info "# Proj\n\nWhat it is"  # Create the scope
//! megg init services/api --interactive   # Answer the questions in the terminal
//! ```

use std::path::{Path, PathBuf};

use anyhow::Result;
use clap::Args;
use colored::Colorize;
use dialoguer::{Confirm, Input};

use crate::config::Config;
use crate::core::init::{analyze_project, format_init_analysis, InitAnalysis};
use crate::core::writer::init_scope;

#[derive(Args, Debug)]
pub struct InitArgs {
    /// Directory to initialize (default: current directory)
    pub path: Option<PathBuf>,

    /// Identity content (markdown) for the scope
    #[arg(long)]
    pub info: Option<String>,

    /// Initial knowledge content
    #[arg(long)]
    pub knowledge: Option<String>,

    /// Prompt for identity content
    #[arg(short, long)]
    pub interactive: bool,
}

pub fn run(args: InitArgs, config: &Config) -> Result<()> {
    let root = super::target_or_cwd(args.path);

    if let Some(info) = &args.info {
        return create(&root, info, args.knowledge.as_deref(), config);
    }

    let analysis = analyze_project(&root, config);

    if args.interactive {
        if let InitAnalysis::NeedsInput {
            root: resolved,
            questions,
            ..
        } = &analysis
        {
            return prompt_and_create(resolved, questions, config);
        }
    }

    println!("{}", format_init_analysis(&analysis));
    Ok(())
}

fn create(root: &Path, info: &str, knowledge: Option<&str>, config: &Config) -> Result<()> {
    let marker = init_scope(root, info, knowledge, config)?;
    println!("{} megg initialized in {}", "✓".green(), marker.display());
    Ok(())
}

fn prompt_and_create(root: &Path, questions: &[String], config: &Config) -> Result<()> {
    let default_name = root
        .file_name()
        .map(|n| n.to_string_lossy().into_owned())
        .unwrap_or_else(|| "Project".to_string());

    let name: String = Input::new()
        .with_prompt("Name")
        .default(default_name)
        .interact_text()?;

    let mut identity = format!("# {}\n", name.trim());
    for question in questions {
        let answer: String = Input::new()
            .with_prompt(question)
            .allow_empty(true)
            .interact_text()?;
        if !answer.trim().is_empty() {
            identity.push_str(&format!("\n## {}\n\n{}\n", question, answer.trim()));
        }
    }

    let proceed = Confirm::new()
        .with_prompt(format!("Create memory in {}?", root.display()))
        .default(true)
        .interact()?;
    if !proceed {
        println!("{}", "Aborted.".dimmed());
        return Ok(());
    }

    create(root, &identity, None, config)
}
