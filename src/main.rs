use clap::Parser;
use pendantkit::config::Cli;
use pendantkit::magic::MAGIC_NAMES;
use pendantkit::processor::{Processor, ProcessorConfig};
use pendantkit_communication::{Controller, ControllerConfig};
use pendantkit_core::MacroSet;
use pendantkit_pendant::{Pendant, PendantConfig};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::Duration;
use tracing::{debug, error, info};

fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();
    pendantkit::init_logging(&cli.log_level, cli.log_file.as_deref())?;
    info!("pendantkit {} (built {})", pendantkit::VERSION, pendantkit::BUILD_DATE);

    if !cli.macro_path.exists() {
        error!(
            "Macro key definitions file not found: {}",
            cli.macro_path.display()
        );
        std::process::exit(1);
    }
    if cli.verbose > 0 {
        println!("    Macro definitions file: {}", cli.macro_path.display());
    }
    let macros = MacroSet::load(&cli.macro_path, MAGIC_NAMES)?;
    info!(
        "Loaded {} macros: {}",
        macros.len(),
        serde_json::to_string_pretty(&macros.to_named_map())?
    );

    // TERM, HUP, and INT all clear the run flag; the workers and device
    // readers observe it on their next poll tick.
    let run = Arc::new(AtomicBool::new(true));
    let signal_run = Arc::clone(&run);
    ctrlc::set_handler(move || {
        debug!("Caught termination signal");
        signal_run.store(false, Ordering::Relaxed);
    })?;

    let pendant = Arc::new(Pendant::open(Arc::clone(&run), PendantConfig::default())?);
    let controller = Arc::new(Controller::open(
        &cli.port,
        cli.baud,
        Arc::clone(&run),
        ControllerConfig::default(),
    )?);

    let processor = Processor::start(
        controller,
        pendant,
        macros,
        Arc::clone(&run),
        ProcessorConfig::default(),
    );

    while run.load(Ordering::Relaxed) && processor.is_alive() {
        std::thread::sleep(Duration::from_millis(200));
    }

    info!("Shutting down");
    processor.shutdown();
    info!("Done");
    Ok(())
}
