use std::io::{self, Write};
use std::path::PathBuf;
use std::time::{Duration, Instant};

use clap::Parser;
use crossterm::event::{self, Event, KeyCode, KeyEventKind, KeyModifiers};
use crossterm::execute;
use crossterm::style::{Color, Print, ResetColor, SetForegroundColor};
use crossterm::terminal;
use num_bigint::BigUint;
use prime_search::{
    format_elapsed, ComputationWorker, DiagnosticLog, Error, ProbablePrimeGenerator, ResultWriter,
    Settings, ValueSize, WorkOutcome,
};
use tracing::{error, info};
use tracing_subscriber::layer::SubscriberExt;
use tracing_subscriber::util::SubscriberInitExt;

const DASHED_LINE: &str = "---------------------------------------------";

#[derive(Parser, Debug)]
#[command(name = "prime-console")]
#[command(
    about = "Finds large probable primes on a cancellable background worker",
    long_about = None
)]
#[command(version)]
struct Args {
    /// Number of primes to find
    #[arg(short = 'n', long, env = "PRIME_QUANTITY")]
    quantity: Option<u32>,

    /// Target size of each prime in bits
    #[arg(short, long, env = "PRIME_PRIME_BIT_SIZE")]
    bits: Option<u64>,

    /// Compact output file format and minimal console text
    #[arg(short, long, env = "PRIME_SILENT_MODE")]
    silent: bool,

    /// Worker poll interval in milliseconds
    #[arg(long, env = "PRIME_POLL_INTERVAL_MS")]
    poll_interval_ms: Option<u64>,

    /// File found primes are appended to
    #[arg(short, long, env = "PRIME_OUTPUT_FILE")]
    output: Option<PathBuf>,

    /// Diagnostic log destination
    #[arg(long, env = "PRIME_LOG_FILE")]
    log_file: Option<PathBuf>,

    /// Enable the diagnostic call log
    #[arg(long, env = "PRIME_LOGGING_ENABLED")]
    log: bool,

    /// Miller-Rabin rounds per candidate
    #[arg(long, env = "PRIME_PRIMALITY_ROUNDS")]
    rounds: Option<u32>,
}

impl Args {
    fn apply(self, settings: &mut Settings) {
        if let Some(quantity) = self.quantity {
            settings.quantity = quantity;
        }
        if let Some(bits) = self.bits {
            settings.prime_bit_size = bits;
        }
        if let Some(interval) = self.poll_interval_ms {
            settings.poll_interval_ms = interval;
        }
        if let Some(output) = self.output {
            settings.output_file = output;
        }
        if let Some(log_file) = self.log_file {
            settings.log_file = log_file;
        }
        if let Some(rounds) = self.rounds {
            settings.primality_rounds = rounds;
        }
        settings.silent_mode |= self.silent;
        settings.logging_enabled |= self.log;
    }
}

/// Raw terminal mode for the lifetime of the guard, so single key presses
/// arrive without Enter.
struct RawMode;

impl RawMode {
    fn enable() -> io::Result<Self> {
        terminal::enable_raw_mode()?;
        Ok(Self)
    }
}

impl Drop for RawMode {
    fn drop(&mut self) {
        let _ = terminal::disable_raw_mode();
    }
}

fn print_colored(color: Color, text: &str) {
    let mut stdout = io::stdout();
    execute!(stdout, SetForegroundColor(color), Print(text), ResetColor).ok();
    stdout.flush().ok();
}

fn println_colored(color: Color, text: &str) {
    print_colored(color, text);
    println!();
}

fn display_banner() {
    println_colored(Color::White, "Prime Search (Console)");
    println_colored(Color::White, DASHED_LINE);
    println_colored(Color::White, "TO EXIT: [ESC] or [Q]");
    println!();
}

fn display_error(cause: &Error) {
    println!();
    println_colored(Color::Red, "Worker returned an error:");
    println_colored(Color::Red, &format!("Message: \"{cause}\""));
}

fn is_abort_key(code: KeyCode, modifiers: KeyModifiers) -> bool {
    match code {
        KeyCode::Esc | KeyCode::Char('q') | KeyCode::Char('Q') => true,
        KeyCode::Char('c') => modifiers.contains(KeyModifiers::CONTROL),
        _ => false,
    }
}

/// Waits up to `timeout` for an abort key. Without a terminal it just sleeps.
fn abort_requested(raw: Option<&RawMode>, timeout: Duration) -> io::Result<bool> {
    if raw.is_none() {
        std::thread::sleep(timeout);
        return Ok(false);
    }
    if event::poll(timeout)? {
        if let Event::Key(key) = event::read()? {
            return Ok(key.kind == KeyEventKind::Press && is_abort_key(key.code, key.modifiers));
        }
    }
    Ok(false)
}

/// Polls the worker until its run terminates, cancelling on an abort key.
fn wait_for_worker(
    worker: &mut ComputationWorker<ProbablePrimeGenerator>,
    poll_interval: Duration,
    show_progress: bool,
) -> io::Result<()> {
    let raw = RawMode::enable().ok();
    let mut last_tick = Instant::now();
    let mut abort_sent = false;

    while worker.is_busy() {
        if abort_sent {
            std::thread::sleep(poll_interval);
            continue;
        }
        if abort_requested(raw.as_ref(), poll_interval)? {
            worker.cancel_worker();
            abort_sent = true;
        }
        if show_progress && last_tick.elapsed() >= Duration::from_secs(1) {
            print_colored(Color::DarkGrey, ".");
            last_tick = Instant::now();
        }
    }
    drop(raw);

    if abort_sent {
        println!();
        println_colored(Color::Yellow, "Abort key received.");
        println!();
    }
    Ok(())
}

fn report_prime(
    prime: &BigUint,
    elapsed: Duration,
    settings: &Settings,
    writer: &ResultWriter,
    count: u32,
) -> prime_search::Result<()> {
    writer.append(prime)?;

    if !settings.silent_mode {
        let size = ValueSize::of(prime);
        println!("] {} (time elapsed)", format_elapsed(elapsed));
        println!();
        println!(
            " ACTUAL SIZE: {} bits ({} decimal digits)",
            size.bits, size.digits
        );
        println!(" OUTPUT:  {}", writer.path().display());
        println!();
    }
    print_colored(Color::Green, &format!("({count})"));
    if !settings.silent_mode {
        println!();
    }
    Ok(())
}

fn main() -> Result<(), Box<dyn std::error::Error>> {
    let args = Args::parse();

    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env().unwrap_or_else(|_| "warn".into()),
        )
        .with(tracing_subscriber::fmt::layer().with_writer(io::stderr))
        .init();

    let mut settings = Settings::from_env().unwrap_or_else(|e| {
        error!("Failed to load configuration: {e}");
        info!("Using default configuration");
        Settings::default()
    });
    args.apply(&mut settings);

    if let Err(e) = settings.validate() {
        println_colored(Color::Red, &format!("Configuration validation failed: {e}"));
        return Err(e.into());
    }
    info!("Running with {settings:?}");

    let log = DiagnosticLog::to_file(&settings.log_file);
    log.set_enabled(settings.logging_enabled);

    let generator = ProbablePrimeGenerator::new(settings.primality_rounds)?;
    let mut worker = ComputationWorker::with_log(generator, log.clone());
    let writer = ResultWriter::new(&settings.output_file, settings.output_mode());

    display_banner();

    let mut aborted = false;
    for counter in 1..=settings.quantity {
        if !settings.silent_mode {
            println!("{DASHED_LINE}");
            println!("({counter} of {})", settings.quantity);
            println!();
            println!(" TARGET SIZE: {} bits", settings.prime_bit_size);
            println!();
            print!(" [");
            io::stdout().flush().ok();
        }

        if !worker.start_worker(settings.prime_bit_size) {
            println_colored(Color::Red, "Worker refused to start. Aborting...");
            break;
        }
        wait_for_worker(&mut worker, settings.poll_interval(), !settings.silent_mode)?;

        let elapsed = worker.run_time().unwrap_or_default();
        match worker.take_outcome() {
            Some(WorkOutcome::Success(prime)) => {
                if let Err(e) = report_prime(&prime, elapsed, &settings, &writer, counter) {
                    display_error(&e);
                    break;
                }
            }
            Some(WorkOutcome::Error(cause)) => {
                display_error(&cause);
                break;
            }
            Some(WorkOutcome::Canceled) => {
                aborted = true;
                break;
            }
            None => {
                println!();
                println_colored(Color::Red, "Result object empty! Aborting...");
                break;
            }
        }
    }

    println!();
    println!("{DASHED_LINE}");
    if settings.logging_enabled {
        println!(
            "Diagnostic log overhead: {}",
            format_elapsed(log.total_execution_time())
        );
    }
    if aborted {
        println_colored(Color::Yellow, "Aborted.");
    } else {
        println_colored(Color::White, "Finished.");
    }
    Ok(())
}
