//! Unified-diff patch parsing.
//!
//! Extracts the added lines of one file's patch as (line number,
//! content) pairs, where line numbers refer to the new version of the
//! file. Pure and best-effort: malformed input is skipped, never an
//! error.

use tracing::debug;

use crate::domain::LineChange;

/// Parse unified-diff patch text into the ordered sequence of added
/// lines.
///
/// A `@@ -old_start,old_count +new_start,new_count @@` hunk header
/// seeds the new-file line cursor. Added lines (`+`, excluding the
/// `+++` file marker) are emitted and advance the cursor; deletions
/// (`-`) do neither; context lines advance without emitting. A
/// malformed hunk header is skipped without moving the cursor, so one
/// bad hunk never aborts the rest of the patch.
pub fn parse_patch(patch: &str) -> Vec<LineChange> {
    let mut changes = Vec::new();
    let mut current_line: u32 = 0;

    for raw in patch.split('\n') {
        if raw.starts_with("@@") {
            match parse_hunk_start(raw) {
                Some(start) => current_line = start,
                None => debug!(header = raw, "skipping malformed hunk header"),
            }
        } else if raw.starts_with('+') && !raw.starts_with("+++") {
            changes.push(LineChange {
                line: current_line,
                content: raw[1..].trim().to_string(),
            });
            current_line += 1;
        } else if raw.starts_with('-') {
            // Deletion: exists only in the old version.
        } else {
            current_line += 1;
        }
    }

    changes
}

/// Extract the new-file start line from a hunk header, i.e. the
/// `start` of the `+start[,count]` field.
fn parse_hunk_start(header: &str) -> Option<u32> {
    let new_range = header.split(' ').find(|part| part.starts_with('+'))?;
    let start = new_range
        .trim_start_matches('+')
        .split(',')
        .next()?
        .parse::<u32>()
        .ok()?;
    Some(start)
}
