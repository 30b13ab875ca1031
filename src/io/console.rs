//! Console status output
//!
//! After every pass the terminal is redrawn with a device table (unless
//! privacy mode is on) and a status line with device and zone counts.

use crate::services::change_detector::ChangeDetector;
use crate::services::normalizer::format_timestamp;
use crossterm::tty::IsTty;
use ratatui::backend::{Backend, CrosstermBackend};
use ratatui::layout::{Constraint, Direction, Layout, Rect};
use ratatui::style::{Color, Modifier, Style};
use ratatui::widgets::{Block, Borders, Paragraph, Row, Table};
use ratatui::{Frame, Terminal};
use std::io::{self, Stdout};

const HEADERS: [&str; 4] = ["Device", "Device ID", "Last Update", "Location"];

/// Location shown for devices whose zone is resolved by Home Assistant
const HA_ZONE_BASED: &str = "HA Zone based";

/// Redraws the status screen after each pass
pub struct StatusConsole<B: Backend> {
    terminal: Terminal<B>,
    privacy: bool,
}

impl<B: Backend> StatusConsole<B> {
    pub fn new(backend: B, privacy: bool) -> io::Result<Self> {
        Ok(Self { terminal: Terminal::new(backend)?, privacy })
    }

    /// Clear the screen and draw the current device states
    pub fn show(&mut self, detector: &ChangeDetector, zone_count: usize, manual_zones: bool) -> io::Result<()> {
        let privacy = self.privacy;
        // Log lines on stderr share the screen; force a full redraw
        self.terminal.clear()?;
        self.terminal.draw(|f| draw_status(f, detector, zone_count, manual_zones, privacy))?;
        Ok(())
    }
}

/// Console on stdout, or `None` when stdout is not a terminal
pub fn stdout_console(privacy: bool) -> io::Result<Option<StatusConsole<CrosstermBackend<Stdout>>>> {
    let stdout = io::stdout();
    if !stdout.is_tty() {
        return Ok(None);
    }
    StatusConsole::new(CrosstermBackend::new(stdout), privacy).map(Some)
}

/// Table rows (Device, Device ID, Last Update, Location) sorted by last update
pub fn device_rows(detector: &ChangeDetector, manual_zones: bool) -> Vec<[String; 4]> {
    let mut rows: Vec<[String; 4]> = detector
        .iter()
        .map(|(name, state)| {
            let location = if manual_zones || state.zone_label.is_unknown() {
                state.zone_label.to_string()
            } else {
                HA_ZONE_BASED.to_string()
            };
            [name.to_string(), state.device_id.clone(), format_timestamp(&state.last_update), location]
        })
        .collect();
    rows.sort_by(|a, b| a[2].cmp(&b[2]).then_with(|| a[0].cmp(&b[0])));
    rows
}

pub fn status_line(detector: &ChangeDetector, zone_count: usize) -> String {
    format!("Synchronizing {} devices and {} known locations", detector.len(), zone_count)
}

fn draw_status(f: &mut Frame, detector: &ChangeDetector, zone_count: usize, manual_zones: bool, privacy: bool) {
    let chunks = Layout::default()
        .direction(Direction::Vertical)
        .constraints([
            Constraint::Min(0),    // Devices
            Constraint::Length(1), // Status
        ])
        .split(f.area());

    if !privacy {
        draw_device_table(f, chunks[0], device_rows(detector, manual_zones));
    }
    f.render_widget(Paragraph::new(status_line(detector, zone_count)), chunks[1]);
}

fn draw_device_table(f: &mut Frame, area: Rect, rows: Vec<[String; 4]>) {
    let table = Table::new(
        rows.into_iter().map(Row::new),
        [
            Constraint::Fill(2),    // Device
            Constraint::Fill(2),    // Device ID
            Constraint::Length(26), // Last Update
            Constraint::Fill(1),    // Location
        ],
    )
    .header(Row::new(HEADERS).style(Style::default().fg(Color::Cyan).add_modifier(Modifier::BOLD)))
    .block(Block::default().title(" FindMy devices ").borders(Borders::ALL));

    f.render_widget(table, area);
}
