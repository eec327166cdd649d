use VirtualLab::cli::cli_main::run_interactive_menu;
use VirtualLab::settings::LabConfig;
use log::LevelFilter;
use simplelog::{ColorChoice, CombinedLogger, Config, TermLogger, TerminalMode, WriteLogger};
use std::fs::File;

const LOG_FILE: &str = "virtual_lab.log";

pub fn main() {
    let mut loggers: Vec<Box<dyn simplelog::SharedLogger>> = vec![TermLogger::new(
        LevelFilter::Warn,
        Config::default(),
        TerminalMode::Mixed,
        ColorChoice::Auto,
    )];
    if let Ok(file) = File::create(LOG_FILE) {
        loggers.push(WriteLogger::new(LevelFilter::Info, Config::default(), file));
    }
    let _ = CombinedLogger::init(loggers);

    let config = LabConfig::load();
    run_interactive_menu(&config);
}
