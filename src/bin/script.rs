use std::error;
use std::fs::File;
use std::io::{self, stdin, BufRead, BufReader, Write};
use std::path::{Path, PathBuf};
use std::result;
use std::thread;

use clap::{Parser as CliParser, ValueEnum};
use fern::colors::{Color, ColoredLevelConfig};
use log::{debug, LevelFilter};
use program::perror;

extern crate script;
use script::core::{parse, tokenize, Interpreter, ScriptError, STACK_SIZE};

type Error = Box<dyn error::Error>;
type Result<T> = result::Result<T, Error>;

#[derive(CliParser, Debug)]
#[command(name = "script", version)]
#[command(about = "Runs a script line by line, or starts a prompt when none is given.")]
struct Args {
    /// Script to run instead of the prompt
    script: Option<PathBuf>,

    /// Diagnostics written to stderr at this level and above
    #[arg(long, value_enum, default_value_t = LogLevel::Warn)]
    log_level: LogLevel,

    /// Print the tokens of every line before running it
    #[arg(long, default_value_t = false)]
    tokens: bool,
}

#[derive(Clone, Copy, Debug, ValueEnum)]
enum LogLevel {
    Off,
    Error,
    Warn,
    Info,
    Debug,
    Trace,
}

impl From<LogLevel> for LevelFilter {
    fn from(level: LogLevel) -> Self {
        match level {
            LogLevel::Off => LevelFilter::Off,
            LogLevel::Error => LevelFilter::Error,
            LogLevel::Warn => LevelFilter::Warn,
            LogLevel::Info => LevelFilter::Info,
            LogLevel::Debug => LevelFilter::Debug,
            LogLevel::Trace => LevelFilter::Trace,
        }
    }
}

// stdout belongs to the running program, so diagnostics go to stderr.
fn init_logger(level: LevelFilter) -> Result<()> {
    let colors = ColoredLevelConfig::new()
        .error(Color::Red)
        .warn(Color::Yellow)
        .info(Color::Green)
        .debug(Color::Blue)
        .trace(Color::Magenta);

    fern::Dispatch::new()
        .format(move |out, message, record| {
            out.finish(format_args!(
                "[{:<5}] [{}] {}",
                colors.color(record.level()),
                record.target(),
                message
            ))
        })
        .level(level)
        .chain(io::stderr())
        .apply()?;

    Ok(())
}

/// Runs one line of source. Syntax errors are handed back without
/// evaluating anything.
fn run(line: &str, interpreter: &mut Interpreter, show_tokens: bool) -> script::core::Result<()> {
    if show_tokens {
        for token in tokenize(line) {
            println!("{}", token);
        }
    }

    let (program, errors) = parse(line);
    if !errors.is_empty() {
        return Err(ScriptError::Syntax(errors));
    }

    let result = interpreter.interpret(&program);
    if program.displays_result() || result.is_error() {
        println!("{}", result);
    }

    Ok(())
}

// A bad line never ends the session.
fn report(r: script::core::Result<()>) {
    if let Err(e) = r {
        println!("{}", e);
    }
}

fn run_prompt(show_tokens: bool) -> Result<()> {
    println!("Script programming language v{}", env!("CARGO_PKG_VERSION"));
    println!("Type Ctrl+C to exit...");

    let stdin = stdin();
    let mut interpreter = Interpreter::new();
    loop {
        print!(">>> ");
        io::stdout().flush()?;

        let mut buf = String::with_capacity(1024);
        if stdin.lock().read_line(&mut buf)? == 0 {
            println!();
            return Ok(());
        }

        report(run(&buf, &mut interpreter, show_tokens));
    }
}

fn run_file(path: &Path, show_tokens: bool) -> Result<()> {
    debug!("running {}", path.display());

    let file = File::open(path).map_err(ScriptError::from)?;
    let buf = BufReader::new(file);
    let mut interpreter = Interpreter::new();
    for line in buf.lines() {
        let line = line.map_err(ScriptError::from)?;
        report(run(&line, &mut interpreter, show_tokens));
    }

    Ok(())
}

fn fail_if_err(r: Result<()>) {
    if let Err(e) = r {
        perror(e)
    }
}

fn main() {
    let args = Args::parse();
    fail_if_err(init_logger(args.log_level.into()));

    // Deep recursion in a script needs more stack than the main thread has.
    let runner = thread::Builder::new()
        .name("script".to_owned())
        .stack_size(STACK_SIZE)
        .spawn(move || match args.script {
            Some(path) => fail_if_err(run_file(&path, args.tokens)),
            None => fail_if_err(run_prompt(args.tokens)),
        });

    match runner {
        Ok(handle) => {
            if handle.join().is_err() {
                perror("interpreter thread panicked".to_owned())
            }
        }
        Err(e) => perror(e),
    }
}
