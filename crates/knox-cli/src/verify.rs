//! Email verification — submit the code the registry mailed to you.

use std::io::{self, Write};

use anyhow::{Context as _, Result, bail};
use knox_api::RegistryApi;

/// Prompt for the emailed verification code and submit it.
///
/// Reads one line from stdin, so piped input works too:
/// `echo CODE | knox verify`.
pub async fn execute(api: &dyn RegistryApi) -> Result<()> {
    print!("  Verification code: ");
    io::stdout().flush().context("failed to flush stdout")?;

    let mut line = String::new();
    io::stdin()
        .read_line(&mut line)
        .context("failed to read verification code")?;

    let code = line.trim();
    if code.is_empty() {
        bail!("a verification code is required");
    }

    api.verify_email(code).await?;
    Ok(())
}
