//! Filters the compressed XMLTV feed down to one locale and writes tr-epg.xml

// Use mimalloc for faster memory allocation (Linux, macOS)
#[cfg(not(target_env = "msvc"))]
#[global_allocator]
static GLOBAL: mimalloc::MiMalloc = mimalloc::MiMalloc;

use std::process::ExitCode;

use epg_grab::cli::main_with;
use epg_grab::sources::FeedSource;

fn main() -> ExitCode {
    main_with(|config| (FeedSource::from_config(config), config.feed_output.clone()))
}
