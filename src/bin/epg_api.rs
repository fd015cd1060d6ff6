//! Converts today's listings from the JSON EPG API to epg.xml

#[cfg(not(target_env = "msvc"))]
#[global_allocator]
static GLOBAL: mimalloc::MiMalloc = mimalloc::MiMalloc;

use std::process::ExitCode;

use epg_grab::cli::main_with;
use epg_grab::sources::ApiSource;

fn main() -> ExitCode {
    main_with(|config| (ApiSource::from_config(config), config.api_output.clone()))
}
