//! Edit command: bulk-edit an entry as a JSON document in `$EDITOR`.

use std::io::Write;
use std::process::Command;

use anyhow::{Context, Result, bail};
use clap::Args;
use tally_core::{Entry, EntryDocument, EntryId, EntryStore, Tracker};

use super::Session;
use super::util::describe;

#[derive(Debug, Args)]
pub struct EditArgs {
    /// Entry to edit; defaults to the most recent entry.
    pub id: Option<String>,
}

pub fn run<W: Write>(
    writer: &mut W,
    session: &mut Session<'_>,
    editor: &str,
    args: &EditArgs,
) -> Result<()> {
    let mut tracker = Tracker::new(&mut *session.db);
    let entry = match &args.id {
        Some(id) => tracker.get(&EntryId::new(id.as_str())?)?,
        None => match tracker.last(None)? {
            Some(entry) => entry,
            None => {
                writeln!(writer, "No entries to edit")?;
                return Ok(());
            }
        },
    };

    let original = EntryDocument::from(&entry)
        .to_json()
        .context("failed to render entry")?;
    let edited = edit_in_editor(editor, &original)?;
    match apply_document(&mut tracker, &entry, &original, &edited)? {
        Some(updated) => writeln!(writer, "Entry updated: {}", describe(&updated))?,
        None => writeln!(writer, "No changes")?,
    }
    Ok(())
}

/// Applies an edited document to `entry`.
///
/// Returns `None` when the text came back unchanged. The document's pause
/// list replaces the stored one.
pub fn apply_document<S: EntryStore + ?Sized>(
    tracker: &mut Tracker<'_, S>,
    entry: &Entry,
    original: &str,
    edited: &str,
) -> Result<Option<Entry>> {
    if edited.trim() == original.trim() {
        return Ok(None);
    }
    let document = EntryDocument::from_json(edited).context("failed to parse edited entry")?;
    if document.id != entry.id {
        bail!(
            "entry id cannot be changed (was {}, now {})",
            entry.id,
            document.id
        );
    }
    let request = document.into_request()?;
    let updated = tracker.edit(request)?;
    Ok(Some(updated))
}

/// Writes `contents` to a temporary `.json` file, opens it in `editor`, and
/// returns the saved text.
fn edit_in_editor(editor: &str, contents: &str) -> Result<String> {
    let mut file = tempfile::Builder::new()
        .prefix("tally-")
        .suffix(".json")
        .tempfile()
        .context("failed to create temporary file")?;
    file.write_all(contents.as_bytes())
        .and_then(|()| file.flush())
        .context("failed to write temporary file")?;

    let mut parts = editor.split_whitespace();
    let program = parts.next().context("editor command is empty")?;
    tracing::debug!(editor, path = %file.path().display(), "launching editor");
    let status = Command::new(program)
        .args(parts)
        .arg(file.path())
        .status()
        .with_context(|| format!("failed to launch editor {program:?}"))?;
    if !status.success() {
        bail!("editor {program:?} exited with status {status}");
    }

    std::fs::read_to_string(file.path())
        .with_context(|| format!("failed to read {}", file.path().display()))
}
