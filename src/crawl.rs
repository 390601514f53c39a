use crate::gpu::DeviceReading;
use crate::options::ViewOptions;
use ratatui::{
    layout::Rect,
    style::{Color, Modifier, Style},
    text::{Line, Span},
    widgets::{Block, Borders, Paragraph},
    Frame,
};

/// Builds one crawl frame as plain text rows, top to bottom. Pure in
/// (size, tick, readings), so it can be asserted on without a terminal.
///
/// Each device's utilization bar drifts upward, wrapping at the top, with a
/// per-device speed offset. Later devices overwrite earlier ones on a row
/// collision; this path is cosmetic.
#[must_use]
pub fn crawl_rows(
    width: u16,
    height: u16,
    readings: &[DeviceReading],
    tick: u64,
    bar_char: char,
) -> Vec<String> {
    let width = width.max(1) as usize;
    let height = height.max(1) as u64;

    let mut rows = vec![String::new(); height as usize];

    for (slot, reading) in readings.iter().enumerate() {
        let speed = 1 + (slot as u64 % 3);
        let climbed = (tick * speed) % height;
        let row = (height - 1 - climbed) as usize;

        let label = format!("{} {:3.0}% ", reading.name, reading.utilization);
        let bar_cells =
            ((reading.utilization / 100.0) * width as f64).round().clamp(0.0, width as f64) as usize;

        let mut content = label;
        content.extend(std::iter::repeat(bar_char).take(bar_cells));
        rows[row] = content.chars().take(width).collect();
    }

    rows
}

pub fn draw_crawl(
    f: &mut Frame,
    area: Rect,
    readings: &[DeviceReading],
    tick: u64,
    options: &ViewOptions,
) {
    let block = Block::default()
        .borders(Borders::ALL)
        .title(" crawl ")
        .border_style(Style::default().fg(Color::DarkGray));
    let inner = block.inner(area);
    f.render_widget(block, area);

    let rows = crawl_rows(
        inner.width,
        inner.height,
        readings,
        tick,
        options.bar_char,
    );

    let lines: Vec<Line> = rows
        .into_iter()
        .map(|row| {
            Line::from(Span::styled(
                row,
                Style::default()
                    .fg(Color::Green)
                    .add_modifier(Modifier::BOLD),
            ))
        })
        .collect();

    f.render_widget(Paragraph::new(lines), inner);
}

#[cfg(test)]
mod tests {
    use super::*;

    fn reading(name: &str, utilization: f64) -> DeviceReading {
        DeviceReading {
            index: 0,
            name: name.to_string(),
            temperature: 50.0,
            utilization,
            memory_used: 0.0,
            memory_total: 0.0,
        }
    }

    #[test]
    fn test_crawl_is_deterministic() {
        let readings = vec![reading("GPU0", 50.0)];
        let a = crawl_rows(40, 10, &readings, 7, '█');
        let b = crawl_rows(40, 10, &readings, 7, '█');
        assert_eq!(a, b);
    }

    #[test]
    fn test_bar_starts_at_bottom_and_drifts_upward() {
        let readings = vec![reading("GPU0", 50.0)];

        let frame = crawl_rows(40, 10, &readings, 0, '█');
        assert!(frame[9].starts_with("GPU0"));

        let frame = crawl_rows(40, 10, &readings, 3, '█');
        assert!(frame[6].starts_with("GPU0"));

        // Wraps around after reaching the top
        let frame = crawl_rows(40, 10, &readings, 10, '█');
        assert!(frame[9].starts_with("GPU0"));
    }

    #[test]
    fn test_rows_never_exceed_width() {
        let readings = vec![reading("a-gpu-with-a-fairly-long-name", 100.0)];
        for row in crawl_rows(12, 4, &readings, 2, '█') {
            assert!(row.chars().count() <= 12);
        }
    }

    #[test]
    fn test_degenerate_size_is_clamped() {
        let readings = vec![reading("GPU0", 50.0)];
        let frame = crawl_rows(0, 0, &readings, 5, '█');
        assert_eq!(frame.len(), 1);
    }

    #[test]
    fn test_devices_move_at_different_speeds() {
        let readings = vec![reading("GPU0", 10.0), reading("GPU1", 10.0)];
        let frame = crawl_rows(40, 16, &readings, 3, '█');

        let gpu0_row = frame.iter().position(|r| r.starts_with("GPU0")).unwrap();
        let gpu1_row = frame.iter().position(|r| r.starts_with("GPU1")).unwrap();
        assert_ne!(gpu0_row, gpu1_row);
    }
}
