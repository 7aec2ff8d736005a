use anyhow::Result;
use clap::Parser;

fn main() -> Result<()> {
    let cli = prodaccess::cli::Cli::parse();
    prodaccess::cli::init_logging(cli.verbose);
    prodaccess::util::privilege::restrict_umask();
    cli.run()
}
