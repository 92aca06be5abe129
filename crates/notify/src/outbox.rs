use crate::message::Notification;
use crate::sink::NotificationSink;
use anyhow::{Context, Result};
use std::fs::{self, OpenOptions};
use std::io::Write;
use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicUsize, Ordering};
use time::OffsetDateTime;
use time::macros::format_description;
use tracing::info;

const INDEX_FILE: &str = "MOC - Outbox.md";

pub struct OutboxPaths {
    pub root: PathBuf,
    pub index_dir: PathBuf,
    pub pending_dir: PathBuf,
}

impl OutboxPaths {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        let root = root.into();
        Self {
            index_dir: root.join("00_Index"),
            pending_dir: root.join("Pending"),
            root,
        }
    }

    pub fn ensure(&self) -> Result<()> {
        fs::create_dir_all(&self.index_dir)?;
        fs::create_dir_all(&self.pending_dir)?;
        Ok(())
    }
}

/// Queues notifications as Markdown notes for a relay process to send.
/// Every delivery regenerates the outbox index.
pub struct OutboxSink {
    paths: OutboxPaths,
    next_seq: AtomicUsize,
}

impl OutboxSink {
    pub fn open(root: &Path) -> Result<Self> {
        let paths = OutboxPaths::new(root);
        paths.ensure()?;
        let last = pending_notes(&paths.pending_dir)?
            .iter()
            .filter_map(|stem| note_seq(stem))
            .max()
            .unwrap_or(0);
        Ok(Self {
            paths,
            next_seq: AtomicUsize::new(last + 1),
        })
    }

    pub fn paths(&self) -> &OutboxPaths {
        &self.paths
    }

    /// Stems of the queued notes, oldest first.
    pub fn pending(&self) -> Result<Vec<String>> {
        pending_notes(&self.paths.pending_dir)
    }

    pub fn write_index(&self) -> Result<()> {
        let mut lines: Vec<String> = Vec::new();
        lines.push("# MOC - Outbox".to_string());
        lines.push(String::new());
        lines.push("This index is generated. Do not edit manually.".to_string());
        lines.push(String::new());

        let pending = self.pending()?;
        if pending.is_empty() {
            lines.push("_No pending notifications._".to_string());
        }
        for stem in pending {
            lines.push(format!("- [[Pending/{stem}|{stem}]]"));
        }

        fs::write(self.paths.index_dir.join(INDEX_FILE), lines.join("\n"))?;
        Ok(())
    }
}

impl NotificationSink for OutboxSink {
    fn deliver(&self, notification: &Notification) -> Result<()> {
        let seq = self.next_seq.fetch_add(1, Ordering::SeqCst);
        let queued_at = OffsetDateTime::now_utc().format(format_description!(
            "[year]-[month]-[day]T[hour]:[minute]:[second]Z"
        ))?;
        let stem = format!("{seq:06}-{}", file_safe(&notification.chat_id));
        let note_path = self.paths.pending_dir.join(format!("{stem}.md"));

        // a relay may have consumed older notes; never overwrite a queued one
        let mut file = OpenOptions::new()
            .write(true)
            .create_new(true)
            .open(&note_path)
            .with_context(|| format!("creating {}", note_path.display()))?;
        file.write_all(render_note(&stem, &queued_at, notification)?.as_bytes())
            .with_context(|| format!("writing {}", note_path.display()))?;
        self.write_index()?;
        info!(note = %stem, chat_id = %notification.chat_id, "queued notification");
        Ok(())
    }
}

fn render_note(id: &str, queued_at: &str, n: &Notification) -> Result<String> {
    let mut md = String::new();
    md.push_str("---\n");
    md.push_str(&format!("id: {id}\n"));
    md.push_str(&format!("chat_id: \"{}\"\n", n.chat_id.replace('"', "\\\"")));
    md.push_str(&format!("parse_mode: {}\n", n.parse_mode));
    md.push_str(&format!("queued_at: {queued_at}\n"));
    if let Some(markup) = &n.reply_markup {
        md.push_str("reply_markup_json: |\n");
        md.push_str(&indent_yaml_block(&serde_json::to_string_pretty(markup)?));
    }
    md.push_str("---\n\n");
    md.push_str(&n.text);
    md.push('\n');
    Ok(md)
}

fn pending_notes(dir: &Path) -> Result<Vec<String>> {
    if !dir.exists() {
        return Ok(Vec::new());
    }
    let mut stems: Vec<String> = fs::read_dir(dir)?
        .filter_map(|entry| entry.ok())
        .filter_map(|entry| {
            let path = entry.path();
            if path.extension().and_then(|ext| ext.to_str()) != Some("md") {
                return None;
            }
            Some(path.file_stem()?.to_str()?.to_string())
        })
        .collect();
    stems.sort();
    Ok(stems)
}

fn note_seq(stem: &str) -> Option<usize> {
    stem.split_once('-')?.0.parse().ok()
}

fn indent_yaml_block(s: &str) -> String {
    let mut out = String::new();
    for line in s.lines() {
        out.push_str("  ");
        out.push_str(line);
        out.push('\n');
    }
    out
}

fn file_safe(chat_id: &str) -> String {
    chat_id
        .chars()
        .map(|c| if c.is_ascii_alphanumeric() || c == '-' { c } else { '_' })
        .collect()
}
