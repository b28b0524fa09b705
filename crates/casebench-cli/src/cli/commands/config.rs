use crate::cli::args::ConfigArgs;
use crate::exit_codes;

/// Prints the resolved configuration so it can be saved and edited as a config file.
pub fn print_config(args: ConfigArgs) -> anyhow::Result<i32> {
    let cfg = match args.harness.resolve() {
        Ok(cfg) => cfg,
        Err(e) => {
            eprintln!("config error: {e:#}");
            return Ok(exit_codes::EXIT_CONFIG_ERROR);
        }
    };
    println!("# effective workers: {}", cfg.effective_workers());
    print!("{}", serde_yaml::to_string(&cfg)?);
    Ok(exit_codes::EXIT_SUCCESS)
}
