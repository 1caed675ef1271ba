use crate::common_scraper::RunSummary;
use crossterm::{
    cursor::MoveToPreviousLine,
    execute,
    style::{Color, Print, ResetColor, SetForegroundColor},
    terminal::{Clear, ClearType},
};
use std::io;

const LINE_WIDTH: usize = 80;

pub struct ScraperTUI {
    listing_lines: Vec<ListingLineState>,
    progress_bar_printed: bool,
}

#[derive(Clone)]
struct ListingLineState {
    label: String,
    status: ListingStatus,
}

#[derive(Clone, Copy, PartialEq)]
enum ListingStatus {
    Pending,       // Grey
    InProgress,    // White
    Saved(u8),     // Green, with priority
    Skipped,       // Yellow
    Failed,        // Red
}

impl ScraperTUI {
    pub fn new() -> Self {
        Self {
            listing_lines: Vec::new(),
            progress_bar_printed: false,
        }
    }

    pub fn start_search(&mut self, source: &str, query: &str) -> io::Result<()> {
        execute!(
            io::stdout(),
            SetForegroundColor(Color::White),
            Print(format!("⏳ Searching {} for \"{}\"...\n", source, query)),
            ResetColor
        )
    }

    pub fn finish_search(&mut self, found: usize) -> io::Result<()> {
        execute!(
            io::stdout(),
            MoveToPreviousLine(1),
            Clear(ClearType::CurrentLine),
            SetForegroundColor(Color::DarkGrey),
            Print(format!("✓ Found {} businesses\n", found)),
            ResetColor
        )
    }

    /// Add a listing to be processed (initially greyed out)
    pub fn add_listing(&mut self, label: String) -> io::Result<()> {
        execute!(
            io::stdout(),
            SetForegroundColor(Color::DarkGrey),
            Print(format!("  ⏳ {}\n", Self::truncate(&label))),
            ResetColor
        )?;

        self.listing_lines.push(ListingLineState {
            label,
            status: ListingStatus::Pending,
        });
        Ok(())
    }

    /// Print the progress bar once every listing has been added
    pub fn show_initial_progress_bar(&mut self) -> io::Result<()> {
        if !self.progress_bar_printed && !self.listing_lines.is_empty() {
            self.print_progress_bar()?;
            self.progress_bar_printed = true;
        }
        Ok(())
    }

    pub fn start_listing(&mut self, index: usize) -> io::Result<()> {
        self.set_status(index, ListingStatus::InProgress)
    }

    pub fn complete_listing(&mut self, index: usize, priority: u8) -> io::Result<()> {
        self.set_status(index, ListingStatus::Saved(priority))
    }

    pub fn skip_listing(&mut self, index: usize) -> io::Result<()> {
        self.set_status(index, ListingStatus::Skipped)
    }

    pub fn fail_listing(&mut self, index: usize) -> io::Result<()> {
        self.set_status(index, ListingStatus::Failed)
    }

    pub fn show_final_summary(&mut self, summary: &RunSummary) -> io::Result<()> {
        self.clear_progress_bar()?;

        execute!(
            io::stdout(),
            Print("─".repeat(LINE_WIDTH)),
            Print("\n"),
            SetForegroundColor(Color::Green),
            Print(format!(
                "✅ Saved {} ({} new, {} updated)",
                summary.saved(),
                summary.inserted,
                summary.updated
            )),
            ResetColor
        )?;

        if summary.skipped > 0 {
            execute!(
                io::stdout(),
                SetForegroundColor(Color::Yellow),
                Print(format!(", {} skipped", summary.skipped)),
                ResetColor
            )?;
        }

        if summary.failed > 0 {
            execute!(
                io::stdout(),
                SetForegroundColor(Color::Red),
                Print(format!(", {} failed", summary.failed)),
                ResetColor
            )?;
        }

        execute!(
            io::stdout(),
            SetForegroundColor(Color::DarkGrey),
            Print(format!(" | DB: {} total\n", summary.total_in_store)),
            ResetColor
        )
    }

    fn set_status(&mut self, index: usize, status: ListingStatus) -> io::Result<()> {
        let Some(line) = self.listing_lines.get_mut(index) else {
            return Ok(());
        };
        line.status = status;
        self.redraw_from(index)
    }

    fn redraw_from(&self, index: usize) -> io::Result<()> {
        let mut lines_back = self.listing_lines.len() - index;

        // Separator and progress bar sit below the listing lines
        if self.progress_bar_printed {
            lines_back += 2;
        }

        execute!(
            io::stdout(),
            MoveToPreviousLine(lines_back as u16),
            Clear(ClearType::FromCursorDown),
        )?;

        for line in &self.listing_lines[index..] {
            self.draw_listing_line(line)?;
        }

        if self.progress_bar_printed {
            self.print_progress_bar()?;
        }

        Ok(())
    }

    fn draw_listing_line(&self, line: &ListingLineState) -> io::Result<()> {
        let (color, icon, suffix) = match line.status {
            ListingStatus::Pending => (Color::DarkGrey, "⏳", String::new()),
            ListingStatus::InProgress => (Color::White, "🔄", String::new()),
            ListingStatus::Saved(priority) => (Color::Green, "✅", format!("  [P{}]", priority)),
            ListingStatus::Skipped => (Color::Yellow, "⚠️", "  (no place_id)".to_string()),
            ListingStatus::Failed => (Color::Red, "❌", String::new()),
        };

        execute!(
            io::stdout(),
            SetForegroundColor(color),
            Print(format!("  {} {}{}\n", icon, Self::truncate(&line.label), suffix)),
            ResetColor
        )
    }

    fn truncate(label: &str) -> String {
        if label.chars().count() > 60 {
            let head: String = label.chars().take(57).collect();
            format!("{}...", head)
        } else {
            label.to_string()
        }
    }

    fn print_progress_bar(&self) -> io::Result<()> {
        if self.listing_lines.is_empty() {
            return Ok(());
        }

        execute!(
            io::stdout(),
            Print("─".repeat(LINE_WIDTH)),
            Print("\n"),
            SetForegroundColor(Color::White),
            Print(self.create_progress_bar_text()),
            Print("\n"),
            ResetColor
        )
    }

    fn create_progress_bar_text(&self) -> String {
        let done = self
            .listing_lines
            .iter()
            .filter(|l| !matches!(l.status, ListingStatus::Pending | ListingStatus::InProgress))
            .count();
        let failed = self
            .listing_lines
            .iter()
            .filter(|l| l.status == ListingStatus::Failed)
            .count();
        let total = self.listing_lines.len();
        let percentage = (done * 100) / total.max(1);

        let bar_width = 30;
        let filled = (done * bar_width) / total.max(1);
        let progress_bar = format!("[{}{}]", "█".repeat(filled), "░".repeat(bar_width - filled));

        if failed > 0 {
            format!(
                "Progress: {} {}/{} ({}%) | {} failed",
                progress_bar, done, total, percentage, failed
            )
        } else {
            format!("Progress: {} {}/{} ({}%)", progress_bar, done, total, percentage)
        }
    }

    fn clear_progress_bar(&self) -> io::Result<()> {
        if self.progress_bar_printed {
            execute!(
                io::stdout(),
                MoveToPreviousLine(2),
                Clear(ClearType::FromCursorDown),
            )?;
        }
        Ok(())
    }
}

impl Default for ScraperTUI {
    fn default() -> Self {
        Self::new()
    }
}
