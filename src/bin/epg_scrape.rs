//! Scrapes channel pages and writes their listings to epg.xml

#[cfg(not(target_env = "msvc"))]
#[global_allocator]
static GLOBAL: mimalloc::MiMalloc = mimalloc::MiMalloc;

use std::process::ExitCode;

use epg_grab::cli::main_with;
use epg_grab::sources::ScrapeSource;

fn main() -> ExitCode {
    main_with(|config| (ScrapeSource::from_config(config), config.scrape_output.clone()))
}
