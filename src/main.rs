#![warn(clippy::pedantic, clippy::nursery, clippy::cargo)]
#![deny(
    clippy::use_self,
    rust_2018_idioms,
    missing_debug_implementations,
    clippy::missing_panics_doc
)]

use std::{
    error::Error,
    io::{self, BufRead, Write},
    path::PathBuf,
    thread,
};

use clap::{Parser, Subcommand};
use periodic_alarms::{command, config::Config, display, AlarmCore};

#[derive(Parser)]
#[command(author, version, about, long_about = None)]
struct Args {
    /// config file to use instead of the one in the user config directory
    #[clap(long, short, global = true)]
    config: Option<PathBuf>,
    #[clap(subcommand)]
    command: Option<Command>,
}
#[derive(Subcommand)]
enum Command {
    /// write the default config file
    Init {
        #[clap(long, short)]
        force: bool,
    },
}

fn main() -> Result<(), Box<dyn Error>> {
    // initilize the logger
    simple_file_logger::init_logger!("periodic_alarms").expect("couldn't initialize logger");

    let args = Args::parse();
    let config_path = match args.config {
        Some(path) => path,
        None => Config::config_path()?,
    };
    if let Some(Command::Init { force }) = args.command {
        if force || !config_path.exists() {
            Config::new().save(&config_path)?;
            println!("wrote {}", config_path.display());
        } else {
            println!("{} already exists, use --force to overwrite", config_path.display());
        }
        return Ok(());
    }

    let config = Config::load_or_default(&config_path)?;
    let core = AlarmCore::start(&config)?;

    let events = core.events;
    let time_format = config.time_format.clone();
    let _printer = thread::Builder::new()
        .name("printer".to_string())
        .spawn(move || {
            for event in events {
                println!("{}", display::render(&event, &time_format));
            }
        })?;

    let stdin = io::stdin();
    let mut lines = stdin.lock().lines();
    loop {
        print!("{}", config.prompt);
        io::stdout().flush()?;
        let Some(line) = lines.next() else {
            log::info!("input closed, exiting");
            return Ok(());
        };
        match command::parse(&line?) {
            Ok(Some(request)) => {
                core.intake.submit(request);
            }
            Ok(None) => {}
            Err(e) => {
                log::warn!("{e}");
                eprintln!("Bad command");
            }
        }
    }
}
