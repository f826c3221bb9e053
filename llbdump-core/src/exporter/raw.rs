//! `raw` renderer: the definition bytes, untouched.

use std::io::Write;

use crate::error::Result;

/// Copy `input` to `out` verbatim. The bytes are never decoded, so this
/// succeeds even for input that is not a valid definition.
pub fn write<W: Write>(input: &[u8], out: &mut W) -> Result<()> {
    out.write_all(input)?;
    out.flush()?;
    Ok(())
}
