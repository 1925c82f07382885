// SPDX-License-Identifier: GPL-3.0-only

//! Terminal photo booth
//!
//! Live preview on the left, gallery on the right, both rendered with Unicode
//! half-block characters for double vertical resolution.

use crate::backends::camera::{self, CameraFrame};
use crate::booth::{PhotoBooth, Shot, ShotId, ShotStatus};
use crate::config::Config;
use crate::constants::timing;
use crate::pipelines::photo::decode_data_uri;

use crossterm::{
    event::{self, Event, KeyCode, KeyEventKind, KeyModifiers},
    execute,
    terminal::{EnterAlternateScreen, LeaveAlternateScreen, disable_raw_mode, enable_raw_mode},
};
use image::RgbaImage;
use ratatui::{
    Terminal,
    backend::CrosstermBackend,
    buffer::Buffer,
    layout::{Constraint, Layout, Rect},
    style::{Color, Style, Stylize},
    widgets::{Block, Borders, List, ListItem, Widget},
};
use std::io::{self, stdout};
use std::sync::Arc;
use tracing::{info, warn};

/// Run the terminal booth
pub fn run(config: Config) -> Result<(), Box<dyn std::error::Error>> {
    let rt = tokio::runtime::Runtime::new()?;

    let booth = Arc::new(PhotoBooth::new(config.capture_profile()));
    let backend = camera::get_backend(config.backend, config.still_image_path.as_deref());
    let mounted = rt.block_on(booth.mount(backend, config.stream_request()));
    if mounted {
        rt.block_on(booth.wait_for_frame(timing::FIRST_FRAME_TIMEOUT));
    }

    // Set up terminal
    enable_raw_mode()?;
    let mut stdout = stdout();
    execute!(stdout, EnterAlternateScreen)?;
    let backend = CrosstermBackend::new(stdout);
    let mut terminal = Terminal::new(backend)?;

    let result = run_app(&mut terminal, &rt, &booth, config.mirror_preview, mounted);

    // Restore terminal
    disable_raw_mode()?;
    execute!(terminal.backend_mut(), LeaveAlternateScreen)?;
    terminal.show_cursor()?;

    booth.shutdown();
    result
}

fn run_app(
    terminal: &mut Terminal<CrosstermBackend<io::Stdout>>,
    rt: &tokio::runtime::Runtime,
    booth: &Arc<PhotoBooth>,
    mirror: bool,
    mounted: bool,
) -> Result<(), Box<dyn std::error::Error>> {
    let mut show_help = false;
    let mut thumbnail = Thumbnail::default();
    let placeholder = if mounted {
        "Waiting for camera..."
    } else {
        "Camera unavailable"
    };

    loop {
        let frame = booth.current_frame();
        let shots = booth.shots();
        thumbnail.update(shots.first());

        let status_message = if show_help {
            build_help_message()
        } else {
            build_status_message(booth.is_capturing(), shots.len())
        };

        terminal.draw(|f| {
            let [body, status_area] =
                Layout::vertical([Constraint::Min(1), Constraint::Length(1)]).areas(f.area());
            let [preview_area, side_area] =
                Layout::horizontal([Constraint::Min(20), Constraint::Length(34)]).areas(body);
            let [thumb_area, list_area] =
                Layout::vertical([Constraint::Percentage(50), Constraint::Percentage(50)])
                    .areas(side_area);

            f.render_widget(
                HalfBlockImage {
                    picture: frame.as_deref().map(Picture::Frame),
                    mirror,
                    placeholder,
                },
                preview_area,
            );

            let thumb_block = Block::default().borders(Borders::ALL).title(" Latest ");
            let thumb_inner = thumb_block.inner(thumb_area);
            f.render_widget(thumb_block, thumb_area);
            f.render_widget(
                HalfBlockImage {
                    picture: thumbnail.image().map(Picture::Image),
                    mirror: false,
                    placeholder: "No shots yet",
                },
                thumb_inner,
            );

            let items: Vec<ListItem> = shots.iter().map(shot_item).collect();
            let list = List::new(items).block(
                Block::default()
                    .borders(Borders::ALL)
                    .title(format!(" Shots ({}) ", shots.len())),
            );
            f.render_widget(list, list_area);

            f.render_widget(
                StatusBar {
                    message: &status_message,
                },
                status_area,
            );
        })?;

        // Handle input with timeout for frame updates
        if event::poll(timing::UI_POLL_INTERVAL)?
            && let Event::Key(key) = event::read()?
            && key.kind == KeyEventKind::Press
        {
            // Ctrl+C to quit
            if key.code == KeyCode::Char('c') && key.modifiers.contains(KeyModifiers::CONTROL) {
                break;
            }

            match key.code {
                KeyCode::Char('p') | KeyCode::Char(' ') => {
                    show_help = false;
                    let booth = Arc::clone(booth);
                    rt.spawn(async move {
                        if let Some(id) = booth.capture().await {
                            info!(%id, "Captured from terminal");
                        }
                    });
                }
                KeyCode::Char('r') => {
                    show_help = false;
                    booth.reset();
                }
                KeyCode::Char('h') => show_help = !show_help,
                KeyCode::Char('q') => break,
                _ => {}
            }
        }
    }

    Ok(())
}

fn build_status_message(capturing: bool, count: usize) -> String {
    let state = if capturing { "Developing..." } else { "Ready" };
    format!(
        "{} | {} shot(s) | 'p' picture | 'r' reset | 'h' help | 'q' quit",
        state, count
    )
}

fn build_help_message() -> String {
    "p/space: Take picture | r: Clear gallery | h: Toggle help | q/Ctrl+C: Quit".to_string()
}

fn shot_item(shot: &Shot) -> ListItem<'static> {
    let (label, color) = match shot.status {
        Some(ShotStatus::Developing) => ("developing", Color::Yellow),
        Some(ShotStatus::Reviewed) => ("reviewed", Color::Green),
        None => ("", Color::Gray),
    };
    let id = shot.id.to_string();
    ListItem::new(format!("{}  {}  {}", shot.date, &id[..8], label)).style(Style::default().fg(color))
}

/// Decoded copy of the newest shot, refreshed only when it changes
#[derive(Default)]
struct Thumbnail {
    current: Option<(ShotId, RgbaImage)>,
}

impl Thumbnail {
    fn update(&mut self, latest: Option<&Shot>) {
        let Some(shot) = latest else {
            self.current = None;
            return;
        };
        if self.current.as_ref().is_some_and(|(id, _)| *id == shot.id) {
            return;
        }
        self.current = match decode_data_uri(&shot.image) {
            Ok(img) => Some((shot.id, img)),
            Err(e) => {
                warn!(id = %shot.id, error = %e, "Cannot decode shot for preview");
                None
            }
        };
    }

    fn image(&self) -> Option<&RgbaImage> {
        self.current.as_ref().map(|(_, img)| img)
    }
}

/// Anything the half-block widget can sample
#[derive(Clone, Copy)]
enum Picture<'a> {
    Frame(&'a CameraFrame),
    Image(&'a RgbaImage),
}

impl Picture<'_> {
    fn size(&self) -> (u32, u32) {
        match self {
            Picture::Frame(frame) => (frame.width, frame.height),
            Picture::Image(img) => img.dimensions(),
        }
    }

    fn sample(&self, x: u32, y: u32) -> Color {
        let [r, g, b, _] = match self {
            Picture::Frame(frame) => frame.pixel(x, y),
            Picture::Image(img) => {
                let x = x.min(img.width().saturating_sub(1));
                let y = y.min(img.height().saturating_sub(1));
                img.get_pixel(x, y).0
            }
        };
        Color::Rgb(r, g, b)
    }
}

/// Widget that renders a picture using half-block characters
struct HalfBlockImage<'a> {
    picture: Option<Picture<'a>>,
    mirror: bool,
    placeholder: &'a str,
}

impl Widget for HalfBlockImage<'_> {
    fn render(self, area: Rect, buf: &mut Buffer) {
        let picture = match self.picture {
            Some(p) if p.size().0 > 0 && p.size().1 > 0 && area.width > 0 && area.height > 0 => p,
            _ => {
                let msg = self.placeholder;
                let x = area.x + (area.width.saturating_sub(msg.len() as u16)) / 2;
                let y = area.y + area.height / 2;
                if y < area.y + area.height && x < area.x + area.width {
                    buf.set_string(x, y, msg, Style::default().dim());
                }
                return;
            }
        };
        let (width, height) = picture.size();

        // Each terminal cell displays 2 vertical pixels
        let aspect = width as f64 / height as f64;
        let term_width = area.width as f64;
        let term_height = (area.height as f64) * 2.0;

        let (display_width, display_height) = if term_width / term_height > aspect {
            let h = term_height;
            ((h * aspect) as u16, (h / 2.0) as u16)
        } else {
            let w = term_width;
            (w as u16, (w / aspect / 2.0) as u16)
        };
        if display_width == 0 || display_height == 0 {
            return;
        }

        let x_offset = area.x + (area.width.saturating_sub(display_width)) / 2;
        let y_offset = area.y + (area.height.saturating_sub(display_height)) / 2;

        let x_scale = width as f64 / display_width as f64;
        let y_scale = height as f64 / (display_height as f64 * 2.0);

        for ty in 0..display_height {
            for tx in 0..display_width {
                let col = if self.mirror {
                    display_width - 1 - tx
                } else {
                    tx
                };
                let src_x = (col as f64 * x_scale) as u32;
                let src_y_top = (ty as f64 * 2.0 * y_scale) as u32;
                let src_y_bottom = ((ty as f64 * 2.0 + 1.0) * y_scale) as u32;

                if let Some(cell) = buf.cell_mut((x_offset + tx, y_offset + ty)) {
                    cell.set_char('▀');
                    cell.set_fg(picture.sample(src_x, src_y_top));
                    cell.set_bg(picture.sample(src_x, src_y_bottom));
                }
            }
        }
    }
}

/// Status bar widget
struct StatusBar<'a> {
    message: &'a str,
}

impl Widget for StatusBar<'_> {
    fn render(self, area: Rect, buf: &mut Buffer) {
        for x in area.x..area.x + area.width {
            if let Some(cell) = buf.cell_mut((x, area.y)) {
                cell.set_char(' ');
                cell.set_bg(Color::DarkGray);
            }
        }

        let text: String = self.message.chars().take(area.width as usize).collect();
        buf.set_string(
            area.x,
            area.y,
            text,
            Style::default().fg(Color::White).bg(Color::DarkGray),
        );
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_half_block_mirror() {
        let mut img = RgbaImage::from_pixel(2, 2, image::Rgba([0, 0, 0, 255]));
        img.put_pixel(0, 0, image::Rgba([255, 0, 0, 255]));
        img.put_pixel(0, 1, image::Rgba([255, 0, 0, 255]));

        let area = Rect::new(0, 0, 2, 1);
        let mut plain = Buffer::empty(area);
        HalfBlockImage {
            picture: Some(Picture::Image(&img)),
            mirror: false,
            placeholder: "",
        }
        .render(area, &mut plain);
        assert_eq!(plain[(0, 0)].fg, Color::Rgb(255, 0, 0));

        let mut mirrored = Buffer::empty(area);
        HalfBlockImage {
            picture: Some(Picture::Image(&img)),
            mirror: true,
            placeholder: "",
        }
        .render(area, &mut mirrored);
        assert_eq!(mirrored[(1, 0)].fg, Color::Rgb(255, 0, 0));
        assert_eq!(mirrored[(0, 0)].fg, Color::Rgb(0, 0, 0));
    }

    #[test]
    fn test_placeholder_without_picture() {
        let area = Rect::new(0, 0, 20, 3);
        let mut buf = Buffer::empty(area);
        HalfBlockImage {
            picture: None,
            mirror: false,
            placeholder: "No shots",
        }
        .render(area, &mut buf);
        assert_eq!(buf[(6, 1)].symbol(), "N");
    }

    #[test]
    fn test_thumbnail_caches_by_id() {
        let img = RgbaImage::from_pixel(4, 4, image::Rgba([1, 1, 1, 255]));
        let shot = Shot {
            id: ShotId::new(),
            image: crate::pipelines::photo::encode_data_uri(&img).unwrap(),
            date: "19 Oct 2026".into(),
            status: None,
        };
        let mut thumb = Thumbnail::default();
        thumb.update(Some(&shot));
        assert_eq!(thumb.image().unwrap().dimensions(), (4, 4));
        thumb.update(None);
        assert!(thumb.image().is_none());
    }
}
