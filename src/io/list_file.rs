use crate::types::{PlanResult, ProductType, RunContext};
use chrono::{Datelike, Timelike};
use std::fs;
use std::path::Path;

/// Which of the three output artifacts a file name is built for
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ListKind {
    Primary,
    Coherence6d,
    Coherence12d,
}

/// Builds the run-stamped list file name. The date/time render unpadded
/// (`3082026`, `14:5:9`); this matches the names previously generated lists
/// were written under and is part of the interoperability contract.
pub fn list_file_name(ctx: &RunContext, kind: ListKind) -> String {
    let stamp_date = format!(
        "{}{}{}",
        ctx.generated_at.day(),
        ctx.generated_at.month(),
        ctx.generated_at.year()
    );
    let stamp_time = format!(
        "{}:{}:{}",
        ctx.generated_at.hour(),
        ctx.generated_at.minute(),
        ctx.generated_at.second()
    );
    let suffix = match (ctx.product_type, kind) {
        (ProductType::Grd, ListKind::Primary) => "_GRD_backscatter.txt",
        (ProductType::Slc, ListKind::Primary) => "_SLC_polarimetry.txt",
        (_, ListKind::Coherence6d) => "_SLC_coherence_6d.txt",
        (_, ListKind::Coherence12d) => "_SLC_coherence_12d.txt",
    };
    format!(
        "{}_tiles_{}_{}_{}_{}_{}{}",
        ctx.area_name,
        ctx.product_type.label(),
        ctx.start_date,
        ctx.end_date,
        stamp_date,
        stamp_time,
        suffix
    )
}

/// Renders one record as a list-file line: fields quoted and joined by
/// `', '` inside brackets. Multi-member path fields are already comma-space
/// joined strings by the time they get here.
pub fn format_line(fields: &[String]) -> String {
    format!("['{}']", fields.join("', '"))
}

/// Companion reader for a single line: split on the literal `', '`, then
/// strip quote and bracket characters. The round trip with `format_line` is
/// authoritative and must be preserved bit-for-bit.
pub fn parse_line(line: &str) -> Vec<String> {
    line.trim_end_matches('\n')
        .split("', '")
        .map(|entry| entry.replace(['\'', '[', ']'], ""))
        .collect()
}

/// Writes all rows to `path`, replacing any pre-existing file
pub fn write_list(path: &Path, rows: &[Vec<String>]) -> PlanResult<()> {
    let mut content = String::new();
    for row in rows {
        content.push_str(&format_line(row));
        content.push('\n');
    }
    fs::write(path, content)?;
    log::info!("wrote {} line(s) to {}", rows.len(), path.display());
    Ok(())
}

/// Reads a previously written list back into its field lists
pub fn read_list(path: &Path) -> PlanResult<Vec<Vec<String>>> {
    let content = fs::read_to_string(path)?;
    Ok(content.lines().map(parse_line).collect())
}
