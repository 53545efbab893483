fn main() {
    let options = match qlaunch_core::runtime::parse_cli_args(std::env::args_os()) {
        Ok(options) => options,
        Err(error) => error.exit(),
    };

    if let Err(error) = qlaunch_core::logging::init(options.verbose) {
        eprintln!("[qlaunch] logging disabled: {error}");
    }

    if let Err(error) = qlaunch_core::runtime::run_with_options(options) {
        tracing::error!(%error, "setup failed");
        eprintln!("[qlaunch] {error}");
        std::process::exit(1);
    }
}
