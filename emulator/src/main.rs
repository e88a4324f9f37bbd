mod board;
mod profiles;
mod runner;
mod scenario;

use std::env;
use std::fs;
use std::io::{self, IsTerminal, Read};
use std::process;

use profiles::Profile;
use scenario::Scenario;

const USAGE: &str = "Usage: coldstart-emulator [--profile <name>] | --scenario <path|-> | -";

enum Source {
    Profile(Profile),
    File(String),
    Stdin,
}

fn main() -> io::Result<()> {
    let source = parse_args().unwrap_or_else(|err| {
        eprintln!("{err}");
        eprintln!("{USAGE}");
        eprintln!(
            "Profiles: {}",
            Profile::ALL.map(Profile::tag).join(", ")
        );
        process::exit(2);
    });

    let script = match &source {
        Source::Profile(profile) => profile.script().to_owned(),
        Source::File(path) => fs::read_to_string(path)?,
        Source::Stdin => {
            let mut text = String::new();
            io::stdin().read_to_string(&mut text)?;
            text
        }
    };

    let scenario = Scenario::parse(&script).unwrap_or_else(|err| {
        eprintln!("{err}");
        process::exit(2);
    });

    let stdout = io::stdout();
    let color = stdout.is_terminal();
    runner::run(&scenario, stdout.lock(), color)?;
    Ok(())
}

fn parse_args() -> Result<Source, String> {
    let mut args = env::args().skip(1);
    let Some(arg) = args.next() else {
        return Ok(Source::Profile(Profile::ColdStart));
    };

    if arg == "-" {
        Ok(Source::Stdin)
    } else if let Some(value) = arg.strip_prefix("--profile=") {
        Profile::from_tag(value).map(Source::Profile)
    } else if arg == "--profile" {
        let value = args.next().ok_or("Expected value after --profile")?;
        Profile::from_tag(&value).map(Source::Profile)
    } else if let Some(value) = arg.strip_prefix("--scenario=") {
        Ok(scenario_source(value))
    } else if arg == "--scenario" {
        let value = args.next().ok_or("Expected value after --scenario")?;
        Ok(scenario_source(&value))
    } else {
        Profile::from_tag(&arg).map(Source::Profile)
    }
}

fn scenario_source(value: &str) -> Source {
    if value == "-" {
        Source::Stdin
    } else {
        Source::File(value.to_owned())
    }
}
