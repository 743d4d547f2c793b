use log::LevelFilter;
use log4rs::append::console::{ConsoleAppender, Target};
use log4rs::config::{Appender, Config, Root};
use log4rs::encode::pattern::PatternEncoder;
use std::error::Error;
use std::path::Path;
use swipam_inventory::cli::Cli;
use swipam_inventory::cmd;

const LOG_CONFIG: &str = "log4rs.yml";

/// Log to stderr; stdout carries the inventory.
fn init_logging() -> Result<(), Box<dyn Error>> {
    if Path::new(LOG_CONFIG).exists() {
        log4rs::init_file(LOG_CONFIG, Default::default())?;
        return Ok(());
    }
    let level = std::env::var("SWIPAM_LOG")
        .ok()
        .and_then(|l| l.parse().ok())
        .unwrap_or(LevelFilter::Warn);
    let stderr = ConsoleAppender::builder()
        .target(Target::Stderr)
        .encoder(Box::new(PatternEncoder::new(
            "{d(%Y-%m-%d %H:%M:%S)} {h({l:5})} {t} - {m}{n}",
        )))
        .build();
    let config = Config::builder()
        .appender(Appender::builder().build("stderr", Box::new(stderr)))
        .build(Root::builder().appender("stderr").build(level))?;
    log4rs::init_config(config)?;
    Ok(())
}

fn main() -> Result<(), Box<dyn Error>> {
    // Do as little as possible in main.rs as it can't contain any tests
    dotenv::dotenv().ok();
    init_logging()?;
    log::info!("#Start main()");

    let cli = Cli::parse_args();
    let stdout = std::io::stdout();
    let mut out = stdout.lock();
    cmd::run(&cli, &mut out)?;

    Ok(())
}
