use crate::cli::CliContext;
use crate::core::ssh;
use anyhow::Result;
use std::io::Write;

pub fn run(ctx: &CliContext) -> Result<()> {
    let key = ssh::read_public_key(&ctx.config.ssh_pubkey)?;
    let mut stdout = std::io::stdout();
    stdout.write_all(key.trim_end().as_bytes())?;
    stdout.write_all(b"\n")?;
    stdout.flush()?;
    Ok(())
}
