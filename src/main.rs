use std::io;

use clap::Parser;

use bmfont_convert::{run, Args};

fn main() -> anyhow::Result<()> {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info"))
        .format_timestamp(None)
        .init();

    let args = Args::parse();
    run(args, &mut io::stdin().lock(), &mut io::stdout().lock())?;
    Ok(())
}
