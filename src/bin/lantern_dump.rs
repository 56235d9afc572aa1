use std::env;
use std::fs;

use anyhow::{bail, Context, Result};
use lantern::dictionary::Dictionary;
use lantern::text::AbbreviationTable;
use lantern::vm::Game;
use lantern::zobject::ObjectTable;
use log::debug;

#[derive(Debug)]
struct Options {
    header: bool,
    objects: bool,
    tree: bool,
    abbreviations: bool,
    dictionary: bool,
    stories: Vec<String>,
}

fn usage(program: &str) {
    eprintln!("Usage: {program} [options] <story-file>...");
    eprintln!("\nOptions:");
    eprintln!("  -i         Show the story header (default; -i=false hides it)");
    eprintln!("  -o         Show all objects");
    eprintln!("  -t         Show the object tree");
    eprintln!("  -a         Show the abbreviations");
    eprintln!("  -d         Show the dictionary");
    eprintln!("  -h         Show this help message");
}

fn parse_args(args: &[String]) -> Result<Option<Options>> {
    let mut options = Options {
        header: true,
        objects: false,
        tree: false,
        abbreviations: false,
        dictionary: false,
        stories: Vec::new(),
    };
    for arg in args.iter().skip(1) {
        match arg.as_str() {
            "-i" => options.header = true,
            "-i=false" => options.header = false,
            "-o" => options.objects = true,
            "-t" => options.tree = true,
            "-a" => options.abbreviations = true,
            "-d" => options.dictionary = true,
            "-h" | "--help" => return Ok(None),
            other if other.starts_with('-') => bail!("unknown option {other}"),
            story => options.stories.push(story.to_string()),
        }
    }
    if options.stories.is_empty() {
        return Ok(None);
    }
    Ok(Some(options))
}

fn dump_story(path: &str, options: &Options) -> Result<()> {
    let bytes = fs::read(path).with_context(|| format!("unable to open story {path}"))?;
    debug!("loaded {} bytes from {}", bytes.len(), path);
    let game = Game::from_memory(bytes)?;
    let memory = &game.memory;
    let header = &game.header;
    let abbrevs = AbbreviationTable::new(header.abbrev_table as usize);

    println!("\nStory file is {path}");

    if options.header {
        println!("{header}");
    }

    if options.objects || options.tree {
        let objects = ObjectTable::load(memory, header, &abbrevs)?;
        if options.objects {
            print!("\n    **** Objects ****\n\n");
            println!("  Object count = {}\n", objects.len());
            for id in 1..=objects.len() as u16 {
                print!("{:3}. {}", id, objects.dump(memory, id)?);
            }
        }
        if options.tree {
            print!("\n    **** Object tree ****\n\n");
            print!("{}", objects.tree());
        }
    }

    if options.abbreviations {
        print!("\n    **** Abbreviations ****\n\n");
        if header.abbrev_table == 0 {
            println!("  No abbreviation information.");
        } else {
            for (i, abbr) in abbrevs.all(memory)?.iter().enumerate() {
                println!("  [{i:2}] \"{abbr}\"");
            }
        }
    }

    if options.dictionary {
        let dictionary = Dictionary::load(memory, header.dictionary as usize, &abbrevs)?;
        println!("{dictionary}");
    }

    println!();
    Ok(())
}

fn main() {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("warn")).init();

    let args: Vec<String> = env::args().collect();
    let program = args.first().map_or("lantern-dump", String::as_str);
    let options = match parse_args(&args) {
        Ok(Some(options)) => options,
        Ok(None) => {
            usage(program);
            std::process::exit(1);
        }
        Err(e) => {
            eprintln!("Error: {e}");
            usage(program);
            std::process::exit(1);
        }
    };

    let mut failed = false;
    for story in &options.stories {
        if let Err(e) = dump_story(story, &options) {
            eprintln!("\nError: {e:#}");
            failed = true;
        }
    }
    if failed {
        std::process::exit(1);
    }
}
