use std::env;
use std::fs;
use std::process;

use anyhow::{bail, Context, Result};
use lantern::config::Config;
use lantern::interpreter::Interpreter;
use lantern::io_terminal::TerminalIo;
use lantern::vm::{Game, VM};
use log::{debug, info};

fn usage(program: &str) {
    println!("lantern - Z-Machine interpreter for version 1-3 story files");
    println!();
    println!("Usage: {program} <story_file> [--config <file.toml>]");
    println!();
    println!("The config file may set random_seed, instruction_limit and log_filter.");
}

struct Args {
    story: String,
    config: Option<String>,
}

fn parse_args(args: &[String]) -> Result<Option<Args>> {
    let mut story = None;
    let mut config = None;
    let mut iter = args.iter().skip(1);
    while let Some(arg) = iter.next() {
        match arg.as_str() {
            "-h" | "--help" => return Ok(None),
            "--config" => {
                let path = iter.next().context("--config needs a file name")?;
                config = Some(path.clone());
            }
            other if other.starts_with('-') => bail!("unknown option {other}"),
            other => {
                if story.replace(other.to_string()).is_some() {
                    bail!("only one story file may be given");
                }
            }
        }
    }
    Ok(story.map(|story| Args { story, config }))
}

fn run(args: Args) -> Result<()> {
    let config = match &args.config {
        Some(path) => Config::load(path)?,
        None => Config::default(),
    };
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or(&config.log_filter))
        .init();

    debug!("loading story {}", args.story);
    let bytes = fs::read(&args.story)
        .with_context(|| format!("cannot read story file '{}'", args.story))?;
    let game = Game::from_memory(bytes)
        .with_context(|| format!("'{}' is not a playable story", args.story))?;
    let vm = VM::with_rng(game, config.rng())?;
    let mut interpreter = Interpreter::new(vm, Box::new(TerminalIo::new()));
    interpreter.set_instruction_limit(config.instruction_limit);

    interpreter.run()?;
    info!("story ended after {} instructions", interpreter.instruction_count());
    Ok(())
}

fn main() {
    let args: Vec<String> = env::args().collect();
    let program = args.first().map_or("lantern", String::as_str);
    let parsed = match parse_args(&args) {
        Ok(Some(parsed)) => parsed,
        Ok(None) => {
            usage(program);
            return;
        }
        Err(e) => {
            eprintln!("Error: {e}");
            eprintln!();
            usage(program);
            process::exit(2);
        }
    };
    if let Err(e) = run(parsed) {
        eprintln!("\nError: {e:#}");
        process::exit(1);
    }
}
