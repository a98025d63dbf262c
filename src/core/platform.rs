//! Process-level error handling and argument parsing

/// Print the error chain to stderr and exit with code 1.
pub fn handle_error(error: anyhow::Error) {
    eprintln!();
    eprintln!("fontshelf failed:");
    eprintln!("{error}");
    for cause in error.chain().skip(1) {
        eprintln!("  caused by: {cause}");
    }
    eprintln!();
    eprintln!("Try running with --help for usage information.");
    std::process::exit(1);
}

/// Parse and validate command line arguments.
pub fn get_cli_args() -> anyhow::Result<crate::core::cli::CliArgs> {
    use clap::Parser;
    let args = crate::core::cli::CliArgs::parse();
    args.validate().map_err(anyhow::Error::msg)?;
    Ok(args)
}
