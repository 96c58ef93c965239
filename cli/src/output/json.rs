use anyhow::Result;
use sdkify::ChangeReport;
use std::io::Write;

pub fn write_json_report<W: Write>(w: &mut W, report: &ChangeReport) -> Result<()> {
    serde_json::to_writer_pretty(&mut *w, report)?;
    writeln!(w)?;
    Ok(())
}
