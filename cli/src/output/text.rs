use anyhow::Result;
use sdkify::{ChangeOp, ChangeReport};
use std::io::Write;

pub fn write_text_report<W: Write>(
    w: &mut W,
    report: &ChangeReport,
    project: &str,
    target: &str,
) -> Result<()> {
    writeln!(w, "Project \"{}\" against an SDK baseline ({}):", project, target)?;

    if report.is_empty() {
        writeln!(w, "  No differences found.")?;
        write_summary(w, report)?;
        return Ok(());
    }

    let property_ops: Vec<&ChangeOp> = report.property_ops().collect();
    let item_ops: Vec<&ChangeOp> = report.item_ops().collect();

    if !property_ops.is_empty() {
        writeln!(w, "Properties:")?;
        for op in &property_ops {
            writeln!(w, "  {}", render_op(op))?;
        }
        writeln!(w)?;
    }

    if !item_ops.is_empty() {
        writeln!(w, "Items:")?;
        for op in &item_ops {
            writeln!(w, "  {}", render_op(op))?;
        }
        writeln!(w)?;
    }

    write_summary(w, report)?;

    Ok(())
}

fn render_op(op: &ChangeOp) -> String {
    match op {
        ChangeOp::PropertyAdded { name, value } => {
            format!("+ {} = {}", name, value)
        }
        ChangeOp::PropertyRemoved { name, value } => {
            format!("- {} = {}", name, value)
        }
        ChangeOp::PropertyChanged {
            name,
            old_value,
            new_value,
        } => {
            format!("~ {}: {} -> {}", name, old_value, new_value)
        }
        ChangeOp::ItemAdded { item_type, include } => {
            format!("+ {} \"{}\"", item_type, include)
        }
        ChangeOp::ItemRemoved { item_type, include } => {
            format!("- {} \"{}\"", item_type, include)
        }
        ChangeOp::ItemChanged {
            item_type,
            include,
            changed_metadata,
        } => {
            format!(
                "~ {} \"{}\" (metadata: {})",
                item_type,
                include,
                changed_metadata.join(", ")
            )
        }
        other => format!("{:?}", other),
    }
}

fn write_summary<W: Write>(w: &mut W, report: &ChangeReport) -> Result<()> {
    let properties = report.property_ops().count();
    let items = report.item_ops().count();
    writeln!(
        w,
        "Summary: {} property change(s), {} item change(s)",
        properties, items
    )?;
    if !report.complete {
        writeln!(w, "Note: comparison is incomplete.")?;
    }
    Ok(())
}
