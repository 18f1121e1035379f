use anyhow::{bail, Context, Result};
use clap::Parser;
use dotenv::dotenv;
use log::{info, LevelFilter};
use log4rs::{
    append::console::ConsoleAppender,
    config::{Appender, Config as LogConfig, Root},
    encode::pattern::PatternEncoder,
};

use annolog::configure::shared_settings;
use annolog::{logged_class, sink_info, LogClass, LogLevel, Loggable, LoggedMethod, Logged, LoggerInfo, Sink};

#[derive(Parser, Debug)]
#[command(name = "annolog", about = "Runs a logged method on a sample counter")]
struct Args {
    /// Log file name (without extension) under the configured log directory
    #[arg(long, default_value = "session1")]
    session: String,

    /// Value the counter is set to inside the logged call
    #[arg(long, default_value_t = 5)]
    count: u32,

    /// Masks requested by the logged call
    #[arg(long = "mask", default_values_t = vec!["default".to_string()])]
    masks: Vec<String>,

    /// Make the logged call fail after its entry line
    #[arg(long)]
    fail: bool,
}

struct Counter {
    count: u32,
    step: u32,
    logger_info: Option<LoggerInfo>,
}

logged_class!(Counter, logger_info, {
    LogClass::builder("Counter")
        .logger("session1")
        .property("count", |c: &Counter| c.count)
        .property("step", |c: &Counter| c.step)
        .loggable(Loggable::new("count").level(LogLevel::Info).template("<name>=<value>"))
        .loggable(Loggable::new("step").level(LogLevel::Debug).masks(["verbose"]))
        .build()
});

impl Counter {
    /// Counter logging to `<session>.log` instead of the declared file.
    fn new(session: &str) -> Result<Self> {
        let info = Counter::log_class()?
            .logger_info()
            .context("Counter declares no logger")?;
        Ok(Self {
            count: 0,
            step: 0,
            logger_info: Some(LoggerInfo { filename: session.to_string(), ..info }),
        })
    }
}

fn setup_cli_logger() -> Result<()> {
    let stdout = ConsoleAppender::builder()
        .encoder(Box::new(PatternEncoder::new("{d(%Y-%m-%d %H:%M:%S)} [{l}] - {m}{n}")))
        .build();

    let log_config = LogConfig::builder()
        .appender(Appender::builder().build("stdout", Box::new(stdout)))
        .build(Root::builder().appender("stdout").build(LevelFilter::Info))?;

    log4rs::init_config(log_config)?;
    Ok(())
}

fn main() -> Result<()> {
    dotenv().ok();
    setup_cli_logger().context("failed to set up cli logger")?;

    let args = Args::parse();
    let mut counter = Counter::new(&args.session)?;
    let method = LoggedMethod::new("increment")
        .masks(args.masks.iter().cloned())
        .entry("start")
        .exit("end");

    let target = args.count;
    let fail = args.fail;
    let result = method.try_invoke(&mut counter, |c: &mut Counter| -> Result<u32> {
        let previous = c.count;
        c.step = target.saturating_sub(previous);
        c.count = target;
        if fail {
            bail!("increment aborted on request");
        }
        Ok(previous)
    });

    let mut summary = Sink::with_destination("annolog", &args.session)?;
    summary.set_label("summary")?;
    match &result {
        Ok(previous) => sink_info!(summary, "counter moved from {} to {}", previous, counter.count),
        Err(e) => summary.error(&e.to_string()),
    }

    let log_path = shared_settings()?.log_dir.join(format!("{}.log", args.session));
    info!("Log written to {}", log_path.display());

    result.map(|_| ())
}
