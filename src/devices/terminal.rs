// SPDX-License-Identifier: GPL-3.0-only

//! Terminal display and input
//!
//! Renders the appliance screen into the terminal using Unicode half-block
//! characters for improved vertical resolution, and maps keyboard input to
//! the logical buttons. This stands in for the SPI display and GPIO pad on
//! development machines.
//!
//! Key map: Space = shutter, g = gallery, b/Esc = back, arrows = navigate,
//! q or Ctrl+C = power off.

use crate::constants::{BATTERY_LOW_PERCENT, BATTERY_WARN_PERCENT};
use crate::devices::{Button, ButtonLevels, DisplaySink, InputSource, Overlay};
use crate::errors::DeviceError;
use crate::frame::Frame;
use crossterm::{
    event::{self, Event, KeyCode, KeyEventKind, KeyModifiers},
    execute,
    terminal::{EnterAlternateScreen, LeaveAlternateScreen, disable_raw_mode, enable_raw_mode},
};
use ratatui::{
    Terminal, backend::CrosstermBackend, buffer::Buffer, layout::Rect, style::Color,
    style::Style, widgets::Widget,
};
use std::io::{Stdout, stdout};
use std::time::Duration;
use tracing::info;

/// Width of the battery bar in terminal cells
const BATTERY_BAR_WIDTH: u16 = 10;

pub struct TerminalDisplay {
    terminal: Terminal<CrosstermBackend<Stdout>>,
    restored: bool,
}

impl TerminalDisplay {
    /// Set up the terminal (raw mode, alternate screen)
    pub fn init() -> Result<Self, DeviceError> {
        enable_raw_mode().map_err(|e| DeviceError::DisplayUnavailable(e.to_string()))?;
        let mut out = stdout();
        execute!(out, EnterAlternateScreen)
            .map_err(|e| DeviceError::DisplayUnavailable(e.to_string()))?;
        let terminal = Terminal::new(CrosstermBackend::new(out))
            .map_err(|e| DeviceError::DisplayUnavailable(e.to_string()))?;
        info!("Display initialized");
        Ok(Self {
            terminal,
            restored: false,
        })
    }
}

impl DisplaySink for TerminalDisplay {
    fn render(&mut self, frame: Option<&Frame>, overlay: &Overlay) -> std::io::Result<()> {
        self.terminal.draw(|f| {
            let screen = ScreenWidget { frame, overlay };
            f.render_widget(screen, f.area());
        })?;
        Ok(())
    }

    fn shutdown(&mut self) -> std::io::Result<()> {
        if self.restored {
            return Ok(());
        }
        self.restored = true;
        disable_raw_mode()?;
        execute!(self.terminal.backend_mut(), LeaveAlternateScreen)?;
        self.terminal.show_cursor()?;
        info!("Display restored");
        Ok(())
    }
}

impl Drop for TerminalDisplay {
    fn drop(&mut self) {
        let _ = DisplaySink::shutdown(self);
    }
}

/// One full appliance screen: the frame plus overlay corners
struct ScreenWidget<'a> {
    frame: Option<&'a Frame>,
    overlay: &'a Overlay,
}

impl Widget for ScreenWidget<'_> {
    fn render(self, area: Rect, buf: &mut Buffer) {
        if area.width == 0 || area.height < 3 {
            return;
        }

        // Top and bottom rows are reserved for the overlay
        let image_area = Rect {
            x: area.x,
            y: area.y + 1,
            width: area.width,
            height: area.height - 2,
        };

        match self.frame {
            Some(frame) => render_frame(frame, image_area, buf),
            None => {
                // Blank screen; gallery's "no images" text goes through
                // index_info so the placeholder is centered like a frame
                if let Some(text) = &self.overlay.index_info {
                    let x = image_area.x
                        + image_area.width.saturating_sub(text.len() as u16) / 2;
                    let y = image_area.y + image_area.height / 2;
                    buf.set_string(x, y, text, Style::default().fg(Color::Gray));
                }
            }
        }

        let white = Style::default().fg(Color::White);

        // Date top-left, time top-right
        if let Some(date) = &self.overlay.date {
            buf.set_string(area.x, area.y, date, white);
        }
        if let Some(time) = &self.overlay.time {
            let x = area.x + area.width.saturating_sub(time.len() as u16);
            buf.set_string(x, area.y, time, white);
        }

        // Mode label (or image position in the gallery) bottom-left
        let bottom = area.y + area.height - 1;
        let label = match (self.frame.is_some(), &self.overlay.index_info) {
            (true, Some(info)) => info,
            _ => &self.overlay.mode_label,
        };
        buf.set_string(area.x, bottom, label, white);

        // Battery bottom-right
        if let Some(percent) = self.overlay.battery_percent {
            render_battery(percent, area, bottom, buf);
        }
    }
}

/// Render the frame with half-block characters, aspect-fit and centered
///
/// Each terminal cell shows two vertical pixels: upper half via the
/// foreground color of '▀', lower half via the background color.
fn render_frame(frame: &Frame, area: Rect, buf: &mut Buffer) {
    if frame.width == 0 || frame.height == 0 || area.width == 0 || area.height == 0 {
        return;
    }

    let frame_aspect = frame.width as f64 / frame.height as f64;
    let term_width = area.width as f64;
    let term_height = (area.height * 2) as f64;

    let (display_width, display_height) = if term_width / term_height > frame_aspect {
        let h = term_height;
        let w = h * frame_aspect;
        (w as u16, (h / 2.0) as u16)
    } else {
        let w = term_width;
        let h = w / frame_aspect;
        (w as u16, (h / 2.0) as u16)
    };
    let display_width = display_width.max(1);
    let display_height = display_height.max(1);

    let x_offset = area.x + (area.width.saturating_sub(display_width)) / 2;
    let y_offset = area.y + (area.height.saturating_sub(display_height)) / 2;

    let x_scale = frame.width as f64 / display_width as f64;
    let y_scale = frame.height as f64 / (display_height * 2) as f64;

    for ty in 0..display_height {
        for tx in 0..display_width {
            let term_x = x_offset + tx;
            let term_y = y_offset + ty;
            if term_x >= area.x + area.width || term_y >= area.y + area.height {
                continue;
            }

            let src_x = (tx as f64 * x_scale) as u32;
            let src_y_top = (ty as f64 * 2.0 * y_scale) as u32;
            let src_y_bottom = ((ty as f64 * 2.0 + 1.0) * y_scale) as u32;

            let (tr, tg, tb) = frame.pixel_rgb(src_x, src_y_top);
            let (br, bg, bb) = frame.pixel_rgb(src_x, src_y_bottom);

            if let Some(cell) = buf.cell_mut((term_x, term_y)) {
                cell.set_char('▀');
                cell.set_fg(Color::Rgb(tr, tg, tb));
                cell.set_bg(Color::Rgb(br, bg, bb));
            }
        }
    }
}

/// Battery bar, colored by charge level
fn render_battery(percent: f32, area: Rect, bottom: u16, buf: &mut Buffer) {
    let percent = percent.clamp(0.0, 100.0);
    let fill_color = if percent > BATTERY_WARN_PERCENT {
        Color::Green
    } else if percent > BATTERY_LOW_PERCENT {
        Color::Yellow
    } else {
        Color::Red
    };

    let text = format!("{:3.0}% ", percent);
    let total = text.len() as u16 + BATTERY_BAR_WIDTH + 2;
    if area.width < total {
        return;
    }
    let mut x = area.x + area.width - total;
    buf.set_string(x, bottom, &text, Style::default().fg(Color::White));
    x += text.len() as u16;

    let filled = (percent / 100.0 * BATTERY_BAR_WIDTH as f32).round() as u16;
    if let Some(cell) = buf.cell_mut((x, bottom)) {
        cell.set_char('[');
        cell.set_fg(Color::White);
    }
    for i in 0..BATTERY_BAR_WIDTH {
        if let Some(cell) = buf.cell_mut((x + 1 + i, bottom)) {
            if i < filled {
                cell.set_char('█');
                cell.set_fg(fill_color);
            } else {
                cell.set_char(' ');
            }
        }
    }
    if let Some(cell) = buf.cell_mut((x + 1 + BATTERY_BAR_WIDTH, bottom)) {
        cell.set_char(']');
        cell.set_fg(Color::White);
    }
}

/// Keyboard mapped to the logical button pad
///
/// Each `sample` drains pending key events; a key press reads as the
/// button's level being high for that sample. Auto-repeat shows up as
/// repeated presses and is absorbed by the debouncer above this layer.
#[derive(Default)]
pub struct TerminalInput;

impl TerminalInput {
    pub fn new() -> Self {
        Self
    }
}

impl InputSource for TerminalInput {
    fn sample(&mut self) -> ButtonLevels {
        let mut levels = ButtonLevels::default();
        while event::poll(Duration::ZERO).unwrap_or(false) {
            let Ok(Event::Key(key)) = event::read() else {
                continue;
            };
            if key.kind != KeyEventKind::Press {
                continue;
            }
            // Raw mode swallows the interrupt signal, so Ctrl+C arrives
            // here as a key event and must act as the power button
            if key.code == KeyCode::Char('c') && key.modifiers.contains(KeyModifiers::CONTROL) {
                levels.set(Button::Power, true);
                continue;
            }
            match key.code {
                KeyCode::Char(' ') => levels.set(Button::Shutter, true),
                KeyCode::Char('g') => levels.set(Button::Gallery, true),
                KeyCode::Char('b') | KeyCode::Esc => levels.set(Button::Back, true),
                KeyCode::Left => levels.set(Button::Left, true),
                KeyCode::Right => levels.set(Button::Right, true),
                KeyCode::Char('q') => levels.set(Button::Power, true),
                _ => {}
            }
        }
        levels
    }
}
