// SPDX-License-Identifier: GPL-3.0-only

//! Terminal photo booth
//!
//! Renders the three booth stages to the terminal. Images use Unicode
//! half-block characters for improved vertical resolution.

use crate::app::{AppModel, Flags, Message, Runtime, Stage};
use crate::backends::camera::{CameraFrame, GstCameraBackend};
use crate::config::Config;
use crate::constants::{WELCOME_MESSAGE, timing};
use crate::environment::{EnvironmentReading, SystemReporter};
use crate::filters::{FilterType, apply_filter};
use crossterm::{
    event::{self, Event, KeyCode, KeyEvent, KeyEventKind, KeyModifiers},
    execute,
    terminal::{EnterAlternateScreen, LeaveAlternateScreen, disable_raw_mode, enable_raw_mode},
};
use image::RgbaImage;
use ratatui::{
    Terminal,
    backend::CrosstermBackend,
    buffer::Buffer,
    layout::{Alignment, Constraint, Layout, Rect},
    style::{Color, Modifier, Style},
    text::{Line, Span},
    widgets::{Block, Borders, Paragraph, Widget},
};
use std::io::{self, stdout};
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};
use tokio::sync::mpsc::{UnboundedSender, unbounded_channel};
use tracing::{error, info};

/// Run the booth in the terminal until the user quits
pub fn run(config: Config) -> Result<(), Box<dyn std::error::Error>> {
    let runtime = tokio::runtime::Runtime::new()?;

    // Set up terminal
    enable_raw_mode()?;
    let mut stdout = stdout();
    execute!(stdout, EnterAlternateScreen)?;
    let backend = CrosstermBackend::new(stdout);
    let mut terminal = Terminal::new(backend)?;

    // Run the app
    let result = runtime.block_on(run_booth(&mut terminal, config));

    // Restore terminal
    disable_raw_mode()?;
    execute!(terminal.backend_mut(), LeaveAlternateScreen)?;
    terminal.show_cursor()?;

    result
}

async fn run_booth(
    terminal: &mut Terminal<CrosstermBackend<io::Stdout>>,
    config: Config,
) -> Result<(), Box<dyn std::error::Error>> {
    let mut runtime = Runtime::new(
        GstCameraBackend::new(config.camera.clone()),
        SystemReporter::from_config(&config),
        config.save_directory(),
    );
    let (mut model, commands) = AppModel::init(Flags {
        filter: config.default_filter,
        mirror_preview: config.mirror_preview,
    });
    if runtime.execute(commands).is_break() {
        return Ok(());
    }

    let (keys_tx, mut keys_rx) = unbounded_channel();
    let input = InputThread::spawn(keys_tx);
    let mut redraw = tokio::time::interval(timing::RENDER_INTERVAL);
    redraw.set_missed_tick_behavior(tokio::time::MissedTickBehavior::Skip);

    let result = loop {
        let message = tokio::select! {
            message = runtime.next_message() => message,
            Some(key) = keys_rx.recv() => key_to_message(key, model.stage),
            _ = redraw.tick() => None,
        };

        if let Some(message) = message
            && runtime.dispatch(&mut model, message).is_break()
        {
            break Ok(());
        }

        let frame = runtime.current_frame().cloned();
        if let Err(e) = terminal.draw(|f| draw(f, &model, frame.as_ref())) {
            error!(error = %e, "Failed to draw booth");
            runtime.shutdown();
            break Err(e.into());
        }
    };

    input.stop();
    info!("Booth closed");
    result
}

/// Map a key press to a booth message for the current stage
pub fn key_to_message(key: KeyEvent, stage: Stage) -> Option<Message> {
    if key.kind != KeyEventKind::Press {
        return None;
    }
    // Ctrl+C to quit
    if key.code == KeyCode::Char('c') && key.modifiers.contains(KeyModifiers::CONTROL) {
        return Some(Message::Quit);
    }

    match (stage, key.code) {
        (_, KeyCode::Char('q') | KeyCode::Esc) => Some(Message::Quit),
        (Stage::Live, KeyCode::Char(' ') | KeyCode::Enter) => Some(Message::Shutter),
        (Stage::Live, KeyCode::Char(c)) => c
            .to_digit(10)
            .and_then(|n| (n as usize).checked_sub(1))
            .and_then(FilterType::from_index)
            .map(Message::SelectFilter),
        (Stage::Captured, KeyCode::Char('s')) => Some(Message::Save),
        (Stage::Captured, KeyCode::Char('t')) => Some(Message::TakeAnother),
        _ => None,
    }
}

/// Reads key events on a plain thread and forwards them to the event loop
struct InputThread {
    running: Arc<AtomicBool>,
    handle: Option<std::thread::JoinHandle<()>>,
}

impl InputThread {
    fn spawn(keys: UnboundedSender<KeyEvent>) -> Self {
        let running = Arc::new(AtomicBool::new(true));
        let flag = running.clone();
        let handle = std::thread::spawn(move || {
            while flag.load(Ordering::Relaxed) {
                match event::poll(timing::RENDER_INTERVAL) {
                    Ok(true) => match event::read() {
                        Ok(Event::Key(key)) => {
                            if keys.send(key).is_err() {
                                break;
                            }
                        }
                        Ok(_) => {}
                        Err(e) => {
                            error!(error = %e, "Failed to read terminal event");
                            break;
                        }
                    },
                    Ok(false) => {}
                    Err(e) => {
                        error!(error = %e, "Failed to poll terminal events");
                        break;
                    }
                }
            }
        });
        Self {
            running,
            handle: Some(handle),
        }
    }

    fn stop(mut self) {
        self.running.store(false, Ordering::Relaxed);
        if let Some(handle) = self.handle.take() {
            let _ = handle.join();
        }
    }
}

fn draw(f: &mut ratatui::Frame, model: &AppModel, frame: Option<&CameraFrame>) {
    let area = f.area();
    match model.stage {
        Stage::Notification => f.render_widget(Welcome, area),
        Stage::Live => {
            let [env_area, preview_area, filter_area, status_area] = Layout::vertical([
                Constraint::Length(1),
                Constraint::Min(1),
                Constraint::Length(1),
                Constraint::Length(1),
            ])
            .areas(area);

            f.render_widget(EnvironmentBar(&model.environment), env_area);
            let preview = frame.and_then(|frame| {
                preview_image(frame, preview_area, model.filter, model.mirror_preview)
            });
            // Camera failures only reach the log; the preview just stays empty
            f.render_widget(
                ImageWidget {
                    image: preview.as_ref(),
                    placeholder: "Waiting for camera...",
                },
                preview_area,
            );
            if let Some(label) = model.countdown_label() {
                f.render_widget(CountdownOverlay(label), preview_area);
            }
            f.render_widget(FilterBar(model.filter), filter_area);
            f.render_widget(
                StatusBar {
                    message: status_message(model),
                },
                status_area,
            );
        }
        Stage::Captured => {
            let [env_area, image_area, status_area] = Layout::vertical([
                Constraint::Length(1),
                Constraint::Min(1),
                Constraint::Length(1),
            ])
            .areas(area);

            f.render_widget(EnvironmentBar(&model.environment), env_area);
            f.render_widget(
                ImageWidget {
                    image: model.captured.as_ref().map(|c| c.image.as_ref()),
                    placeholder: "No photo",
                },
                image_area,
            );
            f.render_widget(
                StatusBar {
                    message: status_message(model),
                },
                status_area,
            );
        }
    }
}

fn status_message(model: &AppModel) -> String {
    let keys = match model.stage {
        Stage::Notification => "'q' quit",
        Stage::Live if model.camera_error.is_some() => "camera unavailable, see log | 'q' quit",
        Stage::Live if model.shutter_enabled() => "space shutter | 1-6 filter | 'q' quit",
        Stage::Live => "1-6 filter | 'q' quit",
        Stage::Captured => "'s' save | 't' take another | 'q' quit",
    };
    match &model.status {
        Some(status) => format!("{} | {}", status, keys),
        None => keys.to_string(),
    }
}

/// Size in cells of an image fitted into an area, keeping its aspect ratio
///
/// Each cell shows two vertical pixels.
pub fn fit_dimensions(width: u32, height: u32, area_width: u16, area_height: u16) -> (u16, u16) {
    if width == 0 || height == 0 || area_width == 0 || area_height == 0 {
        return (0, 0);
    }
    let image_aspect = width as f64 / height as f64;
    let term_width = area_width as f64;
    let term_height = area_height as f64 * 2.0;

    if term_width / term_height > image_aspect {
        // Terminal is wider - fit to height
        let w = term_height * image_aspect;
        ((w as u16).max(1), area_height)
    } else {
        // Terminal is taller - fit to width
        let h = term_width / image_aspect;
        (area_width, ((h / 2.0) as u16).max(1))
    }
}

/// Downscale a frame for the preview, with the filter and mirroring applied
fn preview_image(frame: &CameraFrame, area: Rect, filter: FilterType, mirror: bool) -> Option<RgbaImage> {
    let full = frame.to_rgba_image()?;
    let (cols, rows) = fit_dimensions(full.width(), full.height(), area.width, area.height);
    if cols == 0 || rows == 0 {
        return None;
    }

    let mut small = image::imageops::thumbnail(&full, cols as u32, rows as u32 * 2);
    apply_filter(&mut small, filter, cols as f32 / full.width() as f32);
    if mirror {
        image::imageops::flip_horizontal_in_place(&mut small);
    }
    Some(small)
}

/// Widget that renders an image using half-block characters
struct ImageWidget<'a> {
    image: Option<&'a RgbaImage>,
    placeholder: &'a str,
}

impl Widget for ImageWidget<'_> {
    fn render(self, area: Rect, buf: &mut Buffer) {
        let Some(image) = self.image else {
            render_centered(self.placeholder, area, buf, Style::default());
            return;
        };

        let (display_width, display_height) =
            fit_dimensions(image.width(), image.height(), area.width, area.height);
        if display_width == 0 || display_height == 0 {
            return;
        }

        // Center the image
        let x_offset = area.x + (area.width.saturating_sub(display_width)) / 2;
        let y_offset = area.y + (area.height.saturating_sub(display_height)) / 2;

        // Scale factors
        let x_scale = image.width() as f64 / display_width as f64;
        let y_scale = image.height() as f64 / (display_height as f64 * 2.0);

        // Upper half (▀) colored with fg, lower half with bg
        for ty in 0..display_height {
            for tx in 0..display_width {
                let src_x = (tx as f64 * x_scale) as u32;
                let src_y_top = (ty as f64 * 2.0 * y_scale) as u32;
                let src_y_bottom = ((ty as f64 * 2.0 + 1.0) * y_scale) as u32;

                if let Some(cell) = buf.cell_mut((x_offset + tx, y_offset + ty)) {
                    cell.set_char('▀');
                    cell.set_fg(sample_pixel(image, src_x, src_y_top));
                    cell.set_bg(sample_pixel(image, src_x, src_y_bottom));
                }
            }
        }
    }
}

fn sample_pixel(image: &RgbaImage, x: u32, y: u32) -> Color {
    let x = x.min(image.width() - 1);
    let y = y.min(image.height() - 1);
    let [r, g, b, _] = image.get_pixel(x, y).0;
    Color::Rgb(r, g, b)
}

fn render_centered(text: &str, area: Rect, buf: &mut Buffer, style: Style) {
    let width = text.chars().count() as u16;
    let x = area.x + area.width.saturating_sub(width) / 2;
    let y = area.y + area.height / 2;
    if y < area.y + area.height && x < area.x + area.width {
        buf.set_stringn(x, y, text, area.width as usize, style);
    }
}

/// Welcome notification
struct Welcome;

impl Widget for Welcome {
    fn render(self, area: Rect, buf: &mut Buffer) {
        let width = (WELCOME_MESSAGE.chars().count() as u16 + 8).min(area.width);
        let height = 3.min(area.height);
        let popup = Rect {
            x: area.x + area.width.saturating_sub(width) / 2,
            y: area.y + area.height.saturating_sub(height) / 2,
            width,
            height,
        };
        Paragraph::new(WELCOME_MESSAGE)
            .alignment(Alignment::Center)
            .style(Style::default().fg(Color::White).add_modifier(Modifier::BOLD))
            .block(
                Block::default()
                    .borders(Borders::ALL)
                    .border_style(Style::default().fg(Color::Magenta)),
            )
            .render(popup, buf);
    }
}

/// Countdown label drawn over the preview
struct CountdownOverlay(&'static str);

impl Widget for CountdownOverlay {
    fn render(self, area: Rect, buf: &mut Buffer) {
        let label = format!("  {}  ", self.0);
        render_centered(
            &label,
            area,
            buf,
            Style::default()
                .fg(Color::White)
                .bg(Color::Black)
                .add_modifier(Modifier::BOLD),
        );
    }
}

/// Temperature and AQI, or the lookup error
struct EnvironmentBar<'a>(&'a EnvironmentReading);

impl Widget for EnvironmentBar<'_> {
    fn render(self, area: Rect, buf: &mut Buffer) {
        let label = Style::default().fg(Color::Gray);
        let value = Style::default().fg(Color::White).add_modifier(Modifier::BOLD);

        let mut spans = vec![
            Span::styled("AQI: ", label),
            Span::styled(self.0.aqi_label(), value),
            Span::raw("  "),
            Span::styled("TEMP: ", label),
            Span::styled(self.0.temperature_label(), value),
        ];
        if let Some(message) = self.0.status_message() {
            spans.push(Span::raw("  "));
            spans.push(Span::styled(message, Style::default().fg(Color::Yellow)));
        }
        Paragraph::new(Line::from(spans)).render(area, buf);
    }
}

/// Filter choices with their number keys, selected one highlighted
struct FilterBar(FilterType);

impl Widget for FilterBar {
    fn render(self, area: Rect, buf: &mut Buffer) {
        let spans: Vec<Span> = FilterType::ALL
            .iter()
            .enumerate()
            .flat_map(|(i, filter)| {
                let style = if *filter == self.0 {
                    Style::default().fg(Color::Black).bg(Color::White)
                } else {
                    Style::default().fg(Color::White)
                };
                [
                    Span::styled(format!(" {} {} ", i + 1, filter.display_name()), style),
                    Span::raw(" "),
                ]
            })
            .collect();
        Paragraph::new(Line::from(spans))
            .alignment(Alignment::Center)
            .render(area, buf);
    }
}

/// Status bar widget
struct StatusBar {
    message: String,
}

impl Widget for StatusBar {
    fn render(self, area: Rect, buf: &mut Buffer) {
        let style = Style::default().fg(Color::White).bg(Color::DarkGray);
        // Fill background
        for x in area.x..area.x + area.width {
            if let Some(cell) = buf.cell_mut((x, area.y)) {
                cell.set_char(' ');
                cell.set_bg(Color::DarkGray);
            }
        }
        buf.set_stringn(area.x, area.y, &self.message, area.width as usize, style);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn press(code: KeyCode) -> KeyEvent {
        KeyEvent::new(code, KeyModifiers::NONE)
    }

    #[test]
    fn test_keys_in_live_stage() {
        assert!(matches!(
            key_to_message(press(KeyCode::Char(' ')), Stage::Live),
            Some(Message::Shutter)
        ));
        assert!(matches!(
            key_to_message(press(KeyCode::Char('2')), Stage::Live),
            Some(Message::SelectFilter(FilterType::Sepia))
        ));
        assert!(matches!(
            key_to_message(press(KeyCode::Char('6')), Stage::Live),
            Some(Message::SelectFilter(FilterType::Contrast))
        ));
        assert!(key_to_message(press(KeyCode::Char('7')), Stage::Live).is_none());
        assert!(key_to_message(press(KeyCode::Char('0')), Stage::Live).is_none());
        assert!(key_to_message(press(KeyCode::Char('s')), Stage::Live).is_none());
    }

    #[test]
    fn test_keys_in_captured_stage() {
        assert!(matches!(
            key_to_message(press(KeyCode::Char('s')), Stage::Captured),
            Some(Message::Save)
        ));
        assert!(matches!(
            key_to_message(press(KeyCode::Char('t')), Stage::Captured),
            Some(Message::TakeAnother)
        ));
        assert!(key_to_message(press(KeyCode::Char(' ')), Stage::Captured).is_none());
    }

    #[test]
    fn test_quit_keys_everywhere() {
        for stage in [Stage::Notification, Stage::Live, Stage::Captured] {
            assert!(matches!(
                key_to_message(press(KeyCode::Char('q')), stage),
                Some(Message::Quit)
            ));
            assert!(matches!(
                key_to_message(
                    KeyEvent::new(KeyCode::Char('c'), KeyModifiers::CONTROL),
                    stage
                ),
                Some(Message::Quit)
            ));
        }
    }

    #[test]
    fn test_fit_dimensions() {
        // 4:3 frame in a wide terminal is limited by height
        assert_eq!(fit_dimensions(640, 480, 200, 30), (80, 30));
        // ... and in a narrow one by width
        assert_eq!(fit_dimensions(640, 480, 40, 50), (40, 15));
        assert_eq!(fit_dimensions(0, 480, 40, 50), (0, 0));
    }

    #[test]
    fn test_preview_is_mirrored() {
        let mut data = Vec::new();
        for _ in 0..4 {
            for x in 0..8u8 {
                data.extend_from_slice(&[x * 30, 0, 0, 255]);
            }
        }
        // 8x4 fits 4x1 cells, i.e. a 4x2 preview
        let frame = CameraFrame::from_rgba(8, 4, data);
        let area = Rect::new(0, 0, 8, 1);

        let plain = preview_image(&frame, area, FilterType::None, false).unwrap();
        let mirrored = preview_image(&frame, area, FilterType::None, true).unwrap();

        let last = plain.width() - 1;
        assert_eq!(plain.get_pixel(0, 0), mirrored.get_pixel(last, 0));
    }

    #[test]
    fn test_image_widget_placeholder() {
        let area = Rect::new(0, 0, 30, 3);
        let mut buf = Buffer::empty(area);
        ImageWidget {
            image: None,
            placeholder: "Waiting for camera...",
        }
        .render(area, &mut buf);

        let row: String = (0..30).map(|x| buf[(x, 1)].symbol().to_string()).collect();
        assert!(row.contains("Waiting for camera..."));
    }

    fn screen_text(model: &AppModel) -> String {
        let mut terminal = Terminal::new(ratatui::backend::TestBackend::new(60, 8)).unwrap();
        terminal.draw(|f| draw(f, model, None)).unwrap();
        terminal
            .backend()
            .buffer()
            .content()
            .iter()
            .map(|cell| cell.symbol())
            .collect()
    }

    #[test]
    fn test_camera_failure_keeps_preview_blank() {
        let model = AppModel {
            stage: Stage::Live,
            camera_error: Some(crate::errors::CameraError::PermissionDenied),
            ..Default::default()
        };

        let screen = screen_text(&model);

        assert!(screen.contains("Waiting for camera..."));
        assert!(!screen.contains("Camera access denied"));
        assert!(!screen.contains("space shutter"));
    }
}
