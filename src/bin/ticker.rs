//! Headless host shell: drives the ticker through resume/pause cycles and
//! renders ticks to the console from a dedicated UI thread.

use hello_jnicallback::{
    init_dev_logging, init_file_logging, init_logging, ActivityHost, Config, LifecycleController,
    LocalRuntime, LogStatus, TickView, TimerActivity, UiThread,
};
use std::path::PathBuf;
use std::sync::Arc;
use std::thread;
use std::time::Duration;
use tracing::{error, info};

#[derive(Debug)]
struct Args {
    config: Option<PathBuf>,
    seconds: u64,
    cycles: u32,
    interval_ms: Option<u64>,
    create_thread: bool,
    param: Option<String>,
    log_dir: Option<PathBuf>,
    dev_log: bool,
}

impl Args {
    fn from_env() -> Result<Self, String> {
        let args: Vec<String> = std::env::args().collect();
        let prog = args.first().map(String::as_str).unwrap_or("ticker");

        let mut parsed = Self {
            config: None,
            seconds: 5,
            cycles: 1,
            interval_ms: None,
            create_thread: false,
            param: None,
            log_dir: None,
            dev_log: false,
        };

        let mut iter = args.iter().skip(1);
        while let Some(arg) = iter.next() {
            match arg.as_str() {
                "--help" | "-h" => return Err(Self::usage(prog)),
                "--config" => parsed.config = Some(PathBuf::from(Self::value(&mut iter, arg)?)),
                "--seconds" => parsed.seconds = Self::number(&mut iter, arg)?,
                "--cycles" => parsed.cycles = Self::number(&mut iter, arg)?,
                "--interval-ms" => parsed.interval_ms = Some(Self::number(&mut iter, arg)?),
                "--create-thread" => parsed.create_thread = true,
                "--param" => parsed.param = Some(Self::value(&mut iter, arg)?.clone()),
                "--log-dir" => parsed.log_dir = Some(PathBuf::from(Self::value(&mut iter, arg)?)),
                "--dev-log" => parsed.dev_log = true,
                opt => return Err(format!("Unknown option: {}\n\n{}", opt, Self::usage(prog))),
            }
        }

        Ok(parsed)
    }

    fn value<'a>(iter: &mut impl Iterator<Item = &'a String>, flag: &str) -> Result<&'a String, String> {
        iter.next().ok_or_else(|| format!("Missing value for {}", flag))
    }

    fn number<'a, T: std::str::FromStr>(iter: &mut impl Iterator<Item = &'a String>, flag: &str) -> Result<T, String> {
        let raw = Self::value(iter, flag)?;
        raw.parse().map_err(|_| format!("Invalid number for {}: {}", flag, raw))
    }

    fn usage(prog: &str) -> String {
        format!(
            "ticker - native ticker thread demo\n\n\
            USAGE:\n    {} [OPTIONS]\n\n\
            OPTIONS:\n    \
            -h, --help            Print help information\n    \
            --config <path>       Load configuration from a TOML file\n    \
            --seconds <n>         Time units to stay resumed per cycle (default 5)\n    \
            --cycles <n>          Resume/pause cycles to run (default 1)\n    \
            --interval-ms <ms>    Override the length of one time unit\n    \
            --create-thread       Also spawn the auxiliary native thread\n    \
            --param <text>        Start parameter handed to the ticker\n    \
            --log-dir <path>      Write JSON logs to daily-rotated files\n    \
            --dev-log             Debug-level logging with span events",
            prog
        )
    }
}

/// Prints every render on its own line
struct ConsoleView;

impl TickView for ConsoleView {
    fn set_text(&self, text: &str) {
        println!("tick {}", text);
    }
}

fn main() -> Result<(), Box<dyn std::error::Error>> {
    let args = match Args::from_env() {
        Ok(args) => args,
        Err(message) => {
            eprintln!("{}", message);
            std::process::exit(2);
        }
    };

    let mut config = match &args.config {
        Some(path) => Config::load(path)?,
        None => Config::discover(),
    };
    if let Some(interval_ms) = args.interval_ms {
        config.ticker.interval_ms = interval_ms.max(1);
    }

    let _guard = if let Some(dir) = &args.log_dir {
        init_file_logging(dir)
    } else if args.dev_log {
        init_dev_logging()
    } else {
        init_logging(config.logging.to_log_config())
    };
    info!(?args, "ticker host starting");

    let runtime = Arc::new(LocalRuntime::new());
    runtime.adopt_current_thread();

    let ui = UiThread::spawn("ui")?;
    let activity = Arc::new(TimerActivity::new(Arc::new(ui.handle()), Arc::new(ConsoleView)));
    let controller = LifecycleController::new(runtime.clone(), Arc::new(LogStatus), config.ticker.clone());
    let mut host = ActivityHost::new(activity.clone(), controller);
    if let Some(param) = &args.param {
        host = host.with_start_param(param.as_str());
    }

    println!("{}", host.greeting());

    if args.create_thread {
        match host.controller().create_thread("create thread para") {
            Ok(handle) => drop(handle),
            Err(e) => error!(error = %e, "create_thread failed"),
        }
    }

    let resumed_for = config.ticker.interval() * u32::try_from(args.seconds).unwrap_or(u32::MAX);
    for cycle in 1..=args.cycles {
        info!(cycle, "resume");
        host.on_activate()?;
        thread::sleep(resumed_for);
        host.on_deactivate();
        info!(cycle, elapsed = %activity.snapshot(), "pause");
    }

    ui.flush(Duration::from_secs(5));
    let stats = host.controller().stats();
    println!(
        "final {} ({} ticks delivered, {} overruns)",
        activity.snapshot(),
        stats.delivered,
        stats.overruns
    );

    drop(host);
    runtime.shutdown();
    ui.shutdown();
    Ok(())
}
