use std::fs::{self, File};
use std::io::{self, BufWriter, Write};
use std::path::Path;

use serde::Serialize;

use super::snapshot::CommunitySnapshot;
use crate::model::Community;

/// Write an iterator of serializable items to a JSONL file (one JSON object per line).
fn write_jsonl<T: Serialize>(path: &Path, items: impl Iterator<Item = T>) -> io::Result<()> {
    let mut writer = BufWriter::new(File::create(path)?);
    for item in items {
        serde_json::to_writer(&mut writer, &item)?;
        writer.write_all(b"\n")?;
    }
    writer.flush()
}

/// Flush a community snapshot to JSONL files in the given output directory.
///
/// Creates the output directory if it does not exist. Writes 4 files:
/// - `people.jsonl` — one Person per line, dead and departed included
/// - `polycules.jsonl` — one Polycule per line, with its love matrix
/// - `years.jsonl` — one YearRecord per line
/// - `chronicle.jsonl` — every community history record, in order
pub fn flush_to_jsonl(community: &Community, output_dir: &Path) -> io::Result<()> {
    fs::create_dir_all(output_dir)?;

    let snapshot = CommunitySnapshot::capture(community);
    write_jsonl(&output_dir.join("people.jsonl"), snapshot.people.iter())?;
    write_jsonl(
        &output_dir.join("polycules.jsonl"),
        snapshot.polycules.iter(),
    )?;
    write_jsonl(&output_dir.join("years.jsonl"), snapshot.years.iter())?;
    write_jsonl(
        &output_dir.join("chronicle.jsonl"),
        snapshot.chronicle.iter(),
    )?;

    Ok(())
}
