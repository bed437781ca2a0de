use scanner_conf::{Conf, ConfigError};
use tracing_subscriber::EnvFilter;

// Usage: cargo run --example resolve -- [key=value ...]
// Set RUST_LOG=debug to see which settings files get merged.
fn main() -> Result<(), ConfigError> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .with_writer(std::io::stderr)
        .init();

    let cli_props: Vec<(String, String)> = std::env::args()
        .skip(1)
        .filter_map(|arg| {
            let (key, value) = arg.trim_start_matches("-D").split_once('=')?;
            Some((key.to_string(), value.to_string()))
        })
        .collect();

    let conf = Conf::builder()
        .with_process_environment()
        .with_cli_properties(cli_props)
        .build()?;

    let props = conf.properties()?;
    for (key, value) in props.iter() {
        println!("{key}={value}");
    }

    Ok(())
}
