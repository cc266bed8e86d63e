fn main() {
    #[cfg(feature = "cli")]
    framekit::cli::run();

    #[cfg(not(feature = "cli"))]
    {
        eprintln!("framekit: CLI not enabled. Rebuild with `--features cli`.");
        std::process::exit(1);
    }
}
