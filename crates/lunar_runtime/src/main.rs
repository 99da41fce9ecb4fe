//! Lunar Runtime
//!
//! Boots the shared Lua state and drives it from Lua snippets or from host
//! JavaScript files that see the bridge as the global `lua` object.

use std::path::PathBuf;

use anyhow::{bail, Context, Result};
use lunar_core::InterpreterOptions;
use lunar_script::{state, HostRuntime};
use lunar_services::{LoggingSettings, Settings};
use tracing_subscriber::EnvFilter;

const USAGE: &str =
    "usage: lunar [--settings <file.json>] [--lua <snippet>]... [host-script.js]...";

/// Command line, in the order given.
#[derive(Debug, Default, PartialEq)]
struct Invocation {
    settings: Option<PathBuf>,
    snippets: Vec<String>,
    scripts: Vec<PathBuf>,
}

impl Invocation {
    fn parse(args: impl IntoIterator<Item = String>) -> Result<Option<Self>> {
        let mut invocation = Invocation::default();
        let mut args = args.into_iter();

        while let Some(arg) = args.next() {
            match arg.as_str() {
                "-h" | "--help" => return Ok(None),
                "--settings" => {
                    let path = args.next().context("--settings needs a file path")?;
                    invocation.settings = Some(PathBuf::from(path));
                }
                "--lua" => {
                    let snippet = args.next().context("--lua needs a snippet")?;
                    invocation.snippets.push(snippet);
                }
                flag if flag.starts_with("--") => bail!("unknown option '{}'\n{}", flag, USAGE),
                script => invocation.scripts.push(PathBuf::from(script)),
            }
        }

        Ok(Some(invocation))
    }
}

fn main() -> Result<()> {
    let Some(invocation) = Invocation::parse(std::env::args().skip(1))? else {
        println!("{}", USAGE);
        return Ok(());
    };

    let settings = match &invocation.settings {
        Some(path) => Settings::load(path)?,
        None => Settings::default(),
    };

    // Initialize logging
    init_logging(&settings.logging);
    tracing::info!("Lunar v{}", lunar_core::VERSION);

    let options = InterpreterOptions {
        open_std_libs: settings.interpreter.open_std_libs,
        memory_limit: settings.interpreter.memory_limit,
    };
    let bridge = state::init(&options).context("failed to initialize the Lua VM")?;

    for path in &settings.interpreter.preload {
        let source = std::fs::read_to_string(path)
            .with_context(|| format!("failed to read preload script {}", path.display()))?;
        bridge
            .execute(&source)
            .with_context(|| format!("preload script {} failed", path.display()))?;
        tracing::info!("Preloaded {}", path.display());
    }

    // Snippet failures are reported and the run continues.
    for snippet in &invocation.snippets {
        match bridge.execute(snippet) {
            Ok(value) => println!("{}", value.to_json()),
            Err(err) => eprintln!("{}", err),
        }
    }

    if !invocation.scripts.is_empty() {
        let host = HostRuntime::new(state::shared()?)?;
        for script in &invocation.scripts {
            tracing::info!("Running host script {}", script.display());
            host.execute_file(script)?;
        }
    }

    Ok(())
}

fn init_logging(logging: &LoggingSettings) {
    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(&logging.filter));
    tracing_subscriber::fmt().with_env_filter(filter).init();
}
