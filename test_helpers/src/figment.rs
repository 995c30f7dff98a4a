//! Running option-extraction tests inside a `figment::Jail`.
//!
//! The jail isolates environment variables set through [`figment::Jail`] and
//! restores them once the closure returns, so `NEEDSCFG_*` overrides never
//! leak between tests.

use anyhow::{Result, anyhow};

/// Executes `f` inside a [`figment::Jail`], returning the closure's output.
///
/// The closure returns an `anyhow::Result`, so library errors can be
/// propagated with `?` directly.
///
/// # Errors
///
/// Returns the closure's error, or an error if the jail cannot be set up.
pub fn with_jail<F, T>(f: F) -> Result<T>
where
    F: FnOnce(&mut figment::Jail) -> Result<T>,
{
    let mut output = None;
    figment::Jail::try_with(|jail| {
        output = Some(f(jail).map_err(|err| figment::Error::from(format!("{err:#}")))?);
        Ok(())
    })
    .map_err(|err| anyhow!(err.to_string()))?;
    output.ok_or_else(|| anyhow!("jail closure did not return a value"))
}
