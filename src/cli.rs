//! CLI interface for teachbot

use std::io::{self, IsTerminal, Write};
use std::path::PathBuf;

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};

use crate::config::{self, Config};
use crate::knowledge::{self, JsonFileStore, KnowledgeBase, StorageError};
use crate::session::SessionController;
use crate::shell::{run_session, LineShell, TerminalShell};

#[derive(Parser)]
#[command(name = "teachbot")]
#[command(about = "Chat bot that answers from a question/answer knowledge base and learns what it doesn't know", long_about = None)]
#[command(version)]
struct Cli {
    /// Knowledge base file (overrides the configured path)
    #[arg(long, global = true, env = "TEACHBOT_KB")]
    kb: Option<PathBuf>,

    /// Similarity threshold in (0, 1] (overrides the configured value)
    #[arg(short, long, global = true)]
    threshold: Option<f64>,

    #[command(subcommand)]
    command: Option<Commands>,
}

#[derive(Subcommand)]
enum Commands {
    /// Start a chat session (default when no command given)
    Chat,
    /// Answer a single question and exit; never learns
    Ask {
        /// The question
        #[arg(required = true, num_args = 1..)]
        question: Vec<String>,
    },
    /// List every known question and answer
    List,
    /// Create an empty knowledge base file
    Init {
        /// Overwrite an existing file
        #[arg(short, long)]
        force: bool,
    },
    /// Configure the bot
    Config {
        /// Show current configuration
        #[arg(long)]
        show: bool,
        /// Set the similarity threshold
        #[arg(long)]
        set_threshold: Option<f64>,
        /// Set the knowledge base path
        #[arg(long)]
        set_kb: Option<String>,
        /// Reset configuration to defaults
        #[arg(long)]
        reset: bool,
    },
}

/// Parse arguments and run the selected command
pub fn run() -> Result<()> {
    let cli = Cli::parse();

    if let Some(Commands::Config { show, set_threshold, set_kb, reset }) = &cli.command {
        return run_config(*show, *set_threshold, set_kb.as_deref(), *reset);
    }

    let config = effective_config(&cli)?;

    match cli.command {
        None | Some(Commands::Chat) => chat(&config),
        Some(Commands::Ask { question }) => ask(&mut io::stdout().lock(), &config, &question.join(" ")),
        Some(Commands::List) => list(&mut io::stdout().lock(), &config),
        Some(Commands::Init { force }) => init(&mut io::stdout().lock(), &config, force),
        Some(Commands::Config { .. }) => Ok(()),
    }
}

/// Config file merged with command-line overrides
fn effective_config(cli: &Cli) -> Result<Config> {
    apply_overrides(Config::load()?, cli.kb.clone(), cli.threshold)
}

/// Overrides win over the file; only the merged result has to be valid
fn apply_overrides(mut config: Config, kb: Option<PathBuf>, threshold: Option<f64>) -> Result<Config> {
    if let Some(path) = kb {
        config.knowledge.path = path;
    }
    if let Some(threshold) = threshold {
        config.matching.threshold = threshold;
    }
    config.validate()?;
    Ok(config)
}

fn open_session(config: &Config) -> Result<SessionController<JsonFileStore>> {
    let store = JsonFileStore::new(&config.knowledge.path);
    let matcher = config.matching.matcher()?;

    let controller = match SessionController::new(store, matcher) {
        Ok(controller) => controller,
        Err(e @ StorageError::NotFound { .. }) => {
            return Err(e).context("Run `teachbot init` to create an empty knowledge base");
        }
        Err(e) => return Err(e).context("Could not load the knowledge base"),
    };

    Ok(controller.with_quit_command(config.session.quit_command.clone()))
}

fn chat(config: &Config) -> Result<()> {
    let mut controller = open_session(config)?;
    tracing::info!(
        path = %config.knowledge.path.display(),
        entries = controller.knowledge().len(),
        threshold = config.matching.threshold,
        "Starting chat session"
    );

    if io::stdin().is_terminal() {
        let mut shell = TerminalShell::new()?;
        shell.print_banner(controller.knowledge().len(), &config.session.quit_command);
        run_session(&mut controller, &mut shell);
    } else {
        let mut shell = LineShell::new(io::stdin().lock(), io::stdout());
        run_session(&mut controller, &mut shell);
    }

    Ok(())
}

/// Print the best answer, then the ranked candidates when more than one
/// is configured
fn ask(out: &mut impl Write, config: &Config, question: &str) -> Result<()> {
    let controller = open_session(config)?;
    let question = question.trim();

    let Some(entry) = controller.lookup(question) else {
        writeln!(out, "No match.")?;
        return Ok(());
    };
    writeln!(out, "{}", entry.answer)?;

    let questions = controller.knowledge().questions();
    let ranked = controller.matcher().close_matches(question, &questions);
    if ranked.len() > 1 {
        writeln!(out)?;
        writeln!(out, "Closest questions:")?;
        for m in &ranked {
            writeln!(out, "  {:.2}  {}", m.score, m.candidate)?;
        }
    }
    Ok(())
}

fn list(out: &mut impl Write, config: &Config) -> Result<()> {
    let base = knowledge::load(&config.knowledge.path)
        .context("Could not load the knowledge base")?;
    write_entries(out, &base)
}

fn write_entries(out: &mut impl Write, base: &KnowledgeBase) -> Result<()> {
    if base.is_empty() {
        writeln!(out, "The knowledge base is empty.")?;
        return Ok(());
    }

    for (i, entry) in base.entries().iter().enumerate() {
        writeln!(out, "{:>3}. Q: {}", i + 1, entry.question)?;
        writeln!(out, "     A: {}", entry.answer)?;
    }
    Ok(())
}

fn init(out: &mut impl Write, config: &Config, force: bool) -> Result<()> {
    knowledge::init(&config.knowledge.path, force)
        .context("Could not create the knowledge base")?;
    writeln!(out, "Created empty knowledge base at {}", config.knowledge.path.display())?;
    Ok(())
}

fn run_config(show: bool, set_threshold: Option<f64>, set_kb: Option<&str>, reset: bool) -> Result<()> {
    if reset {
        return config::reset_config();
    }
    if let Some(threshold) = set_threshold {
        config::set_threshold(threshold)?;
    }
    if let Some(path) = set_kb {
        config::set_knowledge_path(path)?;
    }
    if show || (set_threshold.is_none() && set_kb.is_none()) {
        config::show_config()?;
    }
    Ok(())
}
