//! A font manager: ingest font files, deduplicate them by content, and
//! browse them by family, favorite, and collection.

use fontshelf::core;

fn main() {
    let result = core::platform::get_cli_args().and_then(core::run_app);
    if let Err(error) = result {
        core::platform::handle_error(error);
    }
}
