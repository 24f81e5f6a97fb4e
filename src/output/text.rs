//! Human-readable run summary.

use std::io::{self, Write};

use bytesize::ByteSize;
use yansi::{Color, Paint, Style};

use crate::engine::RunReport;

const RULE_WIDTH: usize = 60;

/// Text rendering of a [`RunReport`].
#[derive(Debug)]
pub struct TextOutput<'a> {
    report: &'a RunReport,
    color: bool,
}

impl<'a> TextOutput<'a> {
    /// Render `report` with colour (subject to the global `yansi` switch).
    #[must_use]
    pub fn new(report: &'a RunReport) -> Self {
        Self {
            report,
            color: true,
        }
    }

    /// Enable or disable colour for this rendering.
    #[must_use]
    pub fn with_color(mut self, color: bool) -> Self {
        self.color = color;
        self
    }

    fn paint(&self, text: impl std::fmt::Display, style: Style) -> String {
        if self.color {
            text.to_string().paint(style).to_string()
        } else {
            text.to_string()
        }
    }

    /// Write the summary to `w`.
    ///
    /// # Errors
    ///
    /// Returns any error from the writer.
    pub fn write_to<W: Write>(&self, w: &mut W) -> io::Result<()> {
        let r = self.report;
        let rule = "=".repeat(RULE_WIDTH);
        let bold = Style::new().bold();
        let good = Style::new().fg(Color::Green).bold();
        let warn = Style::new().fg(Color::Yellow);
        let bad = Style::new().fg(Color::Red);

        if r.duplicates.is_empty() {
            writeln!(w, "{}", self.paint("No duplicates found!", good))?;
            return Ok(());
        }

        writeln!(w, "{}", rule)?;
        writeln!(w, "{}", self.paint("Summary:", bold))?;
        if r.from_cache {
            writeln!(w, "  Results loaded from cache")?;
        }
        if let Some(ref stats) = r.catalog_stats {
            writeln!(w, "  Files in primary: {}", stats.files_found)?;
        }
        if let Some(ref stats) = r.finder_stats {
            writeln!(w, "  Files in secondary: {}", stats.files_scanned)?;
            writeln!(
                w,
                "  Skipped by size: {} ({:.1}%)",
                stats.skipped_by_size,
                stats.prefilter_rate()
            )?;
        }
        writeln!(
            w,
            "  Duplicates found: {}",
            self.paint(r.duplicates.len(), bold)
        )?;
        writeln!(w, "  Space to free: {}", ByteSize::b(r.reclaimable_bytes))?;

        let unreadable = r.catalog_stats.as_ref().map_or(0, |s| s.errors.len())
            + r.finder_stats.as_ref().map_or(0, |s| s.errors.len());
        if unreadable > 0 {
            writeln!(
                w,
                "  {}",
                self.paint(format!("Unreadable entries skipped: {}", unreadable), warn)
            )?;
        }
        writeln!(w, "{}", rule)?;

        if !r.delete_requested {
            writeln!(w, "Run with --delete to remove these files")?;
            return Ok(());
        }
        if r.confirmed == Some(false) {
            writeln!(w, "{}", self.paint("Deletion cancelled.", warn))?;
            return Ok(());
        }

        if let Some(ref deleted) = r.deleted {
            writeln!(w)?;
            writeln!(w, "{}", rule)?;
            let verb = if r.delete_mode.is_permanent() {
                "Files deleted"
            } else {
                "Files moved to trash"
            };
            writeln!(w, "  {}: {}", verb, self.paint(deleted.success_count(), good))?;
            if deleted.failure_count() > 0 {
                writeln!(
                    w,
                    "  {}",
                    self.paint(format!("Failed: {}", deleted.failure_count()), bad)
                )?;
            }
            if deleted.skipped > 0 {
                writeln!(
                    w,
                    "  {}",
                    self.paint(format!("Not attempted (interrupted): {}", deleted.skipped), warn)
                )?;
            }
            let pruned = r.pruned.as_ref().map_or(0, |p| p.count());
            writeln!(w, "  Empty directories removed: {}", pruned)?;
            writeln!(w, "  Space freed: {}", ByteSize::b(deleted.bytes_freed))?;
            writeln!(w, "{}", rule)?;
        }
        Ok(())
    }

    /// Render to a string.
    #[must_use]
    pub fn render(&self) -> String {
        let mut buf = Vec::new();
        // Writing to a Vec cannot fail.
        let _ = self.write_to(&mut buf);
        String::from_utf8_lossy(&buf).into_owned()
    }
}
