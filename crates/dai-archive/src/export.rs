//! Audit export: one CSV row per archive record.
//!
//! Column order and presence are a stable interface. New columns are only
//! ever appended.

use std::io;

use crate::error::ArchiveResult;
use crate::record::ArchiveRecord;

/// Header of the audit CSV.
pub const AUDIT_COLUMNS: [&str; 13] = [
    "id",
    "name",
    "type",
    "category",
    "classified_at",
    "status",
    "visibility",
    "actor",
    "deleted_at",
    "deleted_by",
    "deletion_action",
    "warnings",
    "original_reference",
];

/// One audit row, in [`AUDIT_COLUMNS`] order.
pub fn audit_row(record: &ArchiveRecord) -> [String; 13] {
    let deletion = record.deletion.as_ref();
    [
        record.id.to_string(),
        record.name.clone(),
        record.target.type_label().to_string(),
        record
            .category
            .map(|c| c.as_str().to_string())
            .unwrap_or_default(),
        record
            .classified_at
            .map(|t| t.to_rfc3339())
            .unwrap_or_default(),
        record.status.as_str().to_string(),
        record
            .visibility
            .map(|v| v.as_str().to_string())
            .unwrap_or_default(),
        record.actor.clone(),
        deletion.map(|d| d.at.to_rfc3339()).unwrap_or_default(),
        deletion.map(|d| d.actor.clone()).unwrap_or_default(),
        deletion
            .map(|d| d.action.as_str().to_string())
            .unwrap_or_default(),
        record.flags.names().join(";"),
        record.target.reference().to_string(),
    ]
}

/// Write the audit CSV for `records` to `out`.
pub fn write_audit_csv<'a, W, I>(records: I, out: W) -> ArchiveResult<usize>
where
    W: io::Write,
    I: IntoIterator<Item = &'a ArchiveRecord>,
{
    let mut writer = csv::Writer::from_writer(out);
    writer.write_record(AUDIT_COLUMNS)?;
    let mut rows = 0;
    for record in records {
        writer.write_record(audit_row(record))?;
        rows += 1;
    }
    writer.flush()?;
    Ok(rows)
}
