use palaver::{cli, telemetry, Node};

fn main() {
    let cli = cli::parse_from(std::env::args_os());
    telemetry::init(cli.verbose);

    if let Err(err) = run(&cli) {
        tracing::error!("error: {err}");
        std::process::exit(1);
    }
}

fn run(cli: &cli::Cli) -> palaver::Result<()> {
    let config = cli.resolve()?;
    let handle = Node::new(config).start()?;
    handle.wait();
    Ok(())
}
