use crate::{
    collector::Collector,
    crawl::draw_crawl,
    gpu::{DeviceReading, GpuSampler},
    history::{aggregate, HistoryBuffer, HistoryEntry, Sample, HISTORY_CAPACITY},
    input::InputEvent,
    logger::SampleLogger,
    options::ViewOptions,
};
use anyhow::Result;
use crossterm::{
    event::{self, Event, KeyEventKind},
    execute,
    terminal::{disable_raw_mode, enable_raw_mode, EnterAlternateScreen, LeaveAlternateScreen},
};
use ratatui::{
    backend::CrosstermBackend,
    layout::{Constraint, Direction, Layout, Rect},
    style::{Color, Modifier, Style},
    text::{Line, Span},
    widgets::{Block, Borders, Gauge, Paragraph, Sparkline},
    Frame, Terminal,
};
use std::{
    collections::HashMap,
    time::{Duration, Instant, SystemTime},
};

/// Control states driven exclusively by keyboard events.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RunState {
    NotStarted,
    Running,
    Paused,
    Stopped,
}

/// The two main rendering paths; the crawl toggle is an independent
/// override that never combines with either.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ViewMode {
    Horizontal,
    Vertical,
}

impl ViewMode {
    #[must_use]
    pub fn next(&self) -> Self {
        match self {
            Self::Horizontal => Self::Vertical,
            Self::Vertical => Self::Horizontal,
        }
    }
}

pub struct DisplayState {
    pub run_state: RunState,
    pub view_mode: ViewMode,
    pub options: ViewOptions,
    pub histories: HashMap<u32, HistoryBuffer>,
    pub latest: Vec<DeviceReading>,
    pub probe_error: Option<String>,
    pub tick: u64,
    dirty: bool,
}

impl DisplayState {
    #[must_use]
    pub fn new(options: ViewOptions) -> Self {
        Self {
            run_state: RunState::NotStarted,
            view_mode: ViewMode::Horizontal,
            options,
            histories: HashMap::new(),
            latest: Vec::new(),
            probe_error: None,
            tick: 0,
            dirty: true,
        }
    }

    /// Start key: NotStarted -> Running, then toggles Running <-> Paused.
    pub fn start_pause(&mut self) {
        self.run_state = match self.run_state {
            RunState::NotStarted | RunState::Paused => RunState::Running,
            RunState::Running => RunState::Paused,
            RunState::Stopped => RunState::Stopped,
        };
    }

    pub fn stop(&mut self) {
        self.run_state = RunState::Stopped;
    }

    /// Folds one display tick into the history: staged samples are averaged
    /// per device; a device with nothing staged falls back to its latest
    /// instantaneous reading.
    pub fn record_tick(&mut self, mut staged: HashMap<u32, Vec<Sample>>, latest: Vec<DeviceReading>) {
        for reading in &latest {
            let samples = staged.remove(&reading.index).unwrap_or_default();
            let entry = aggregate(&samples).unwrap_or_else(|| HistoryEntry {
                utilization: reading.utilization,
                memory_percent: reading.memory_percent(),
                timestamp: SystemTime::now(),
            });

            self.histories
                .entry(reading.index)
                .or_insert_with(|| HistoryBuffer::new(HISTORY_CAPACITY))
                .push(entry);
        }

        self.latest = latest;
        self.latest.sort_by_key(|r| r.index);
        self.tick += 1;
    }
}

pub fn run_ui(
    options: ViewOptions,
    sampler: Box<dyn GpuSampler>,
    log_file: Option<String>,
) -> Result<()> {
    enable_raw_mode()?;
    execute!(std::io::stdout(), EnterAlternateScreen)?;

    let backend = CrosstermBackend::new(std::io::stdout());
    let mut terminal = Terminal::new(backend)?;

    let cleanup = options.cleanup;
    let mut state = DisplayState::new(options);
    let result = event_loop(&mut terminal, &mut state, sampler, log_file);

    let _ = disable_raw_mode();
    let _ = execute!(std::io::stdout(), LeaveAlternateScreen);

    if !cleanup {
        print_final_summary(&state.latest);
    }

    result
}

fn event_loop(
    terminal: &mut Terminal<CrosstermBackend<std::io::Stdout>>,
    state: &mut DisplayState,
    sampler: Box<dyn GpuSampler>,
    log_file: Option<String>,
) -> Result<()> {
    let mut sampler = Some(sampler);
    let mut collector: Option<Collector> = None;
    let mut logger = match log_file {
        Some(path) => Some(SampleLogger::new(&path)?),
        None => None,
    };
    let mut last_render = Instant::now();

    loop {
        // Input polling; short timeout so render ticks stay on schedule.
        if event::poll(Duration::from_millis(50))? {
            match event::read()? {
                Event::Key(key_event) if key_event.kind == KeyEventKind::Press => {
                    let input_event = InputEvent::from_key_event(key_event);
                    let was_paused = state.run_state == RunState::Paused;
                    handle_input(state, input_event);

                    if let Some(ref collector) = collector {
                        let paused = state.run_state == RunState::Paused;
                        if paused != was_paused {
                            collector.set_paused(paused);
                        }
                    }
                }
                Event::Resize(_, _) => state.dirty = true,
                _ => {}
            }
        }

        if state.run_state == RunState::Stopped {
            break;
        }

        // Monitoring begins: hand the sampler to its thread.
        if state.run_state == RunState::Running && collector.is_none() {
            if let Some(sampler) = sampler.take() {
                collector = Some(Collector::spawn(sampler, state.options.sample_interval()));
                // First frame renders on the next pass of the loop.
                last_render = Instant::now()
                    .checked_sub(state.options.render_interval())
                    .unwrap_or_else(Instant::now);
            }
        }

        // Aggregate staged samples into the history on each display tick.
        if state.run_state == RunState::Running
            && last_render.elapsed() >= state.options.render_interval()
        {
            if let Some(ref collector) = collector {
                let shared = collector.shared();
                state.record_tick(shared.drain(), shared.latest());
                state.probe_error = shared.probe_error();

                if let Some(ref mut logger) = logger {
                    let _ = logger.log_tick(&state.latest);
                }
            }
            last_render = Instant::now();
            state.dirty = true;
        }

        // The start screen (and a paused dashboard) is only redrawn when
        // something changed, to avoid flicker from needless clears.
        if state.dirty {
            terminal.draw(|f| draw_ui(f, state))?;
            state.dirty = false;
        }
    }

    if let Some(mut collector) = collector {
        collector.stop();
    }

    Ok(())
}

/// Applies one input event to the state machine. Option-adjusting keys are
/// only accepted before monitoring starts; view-mode and pause keys stay
/// live throughout.
pub fn handle_input(state: &mut DisplayState, event: InputEvent) {
    match event {
        InputEvent::Quit => {
            state.stop();
            return;
        }
        InputEvent::StartPause => {
            state.start_pause();
            state.dirty = true;
            return;
        }
        InputEvent::SwitchView => {
            state.view_mode = state.view_mode.next();
            state.dirty = true;
            return;
        }
        InputEvent::ToggleCrawl => {
            state.options.toggle_crawl();
            state.dirty = true;
            return;
        }
        _ => {}
    }

    if state.run_state != RunState::NotStarted {
        return;
    }

    match event {
        InputEvent::FasterSampling => state.options.faster_sampling(),
        InputEvent::SlowerSampling => state.options.slower_sampling(),
        InputEvent::FasterDisplay => state.options.faster_display(),
        InputEvent::SlowerDisplay => state.options.slower_display(),
        InputEvent::ToggleCompact => state.options.toggle_compact(),
        InputEvent::ToggleAnimate => state.options.toggle_animate(),
        InputEvent::TogglePixel => state.options.toggle_pixel(),
        InputEvent::ToggleSparkline => state.options.toggle_sparkline(),
        InputEvent::CycleBackground => state.options.cycle_background(),
        _ => return,
    }
    state.dirty = true;
}

pub fn draw_ui(f: &mut Frame, state: &DisplayState) {
    if state.run_state == RunState::NotStarted {
        draw_start_screen(f, f.area(), state);
        return;
    }

    let chunks = Layout::default()
        .direction(Direction::Vertical)
        .constraints([Constraint::Min(3), Constraint::Length(3)])
        .split(f.area());

    if state.options.crawl {
        draw_crawl(f, chunks[0], &state.latest, state.tick, &state.options);
    } else {
        match state.view_mode {
            ViewMode::Horizontal => draw_horizontal_view(f, chunks[0], state),
            ViewMode::Vertical => draw_vertical_view(f, chunks[0], state),
        }
    }

    draw_status_line(f, chunks[1], state);
}

fn draw_start_screen(f: &mut Frame, area: Rect, state: &DisplayState) {
    let options = &state.options;
    let on_off = |v: bool| if v { "on" } else { "off" };

    let lines = vec![
        Line::from(Span::styled(
            "nvsharptop - GPU monitor",
            Style::default().fg(Color::Cyan).add_modifier(Modifier::BOLD),
        )),
        Line::from(""),
        Line::from(format!(
            "  sample interval   {:.2}s   (+ faster, - slower)",
            options.sample_interval_secs()
        )),
        Line::from(format!(
            "  display interval  {:.2}s   (> faster, < slower)",
            options.display_interval_secs()
        )),
        Line::from(format!("  compact           {}    (c)", on_off(options.compact))),
        Line::from(format!("  animate           {}    (a)", on_off(options.animate))),
        Line::from(format!("  pixel bars        {}    (p)", on_off(options.pixel))),
        Line::from(format!("  sparkline         {}    (o)", on_off(options.sparkline))),
        Line::from(format!(
            "  background        {}  (b)",
            options.background.token()
        )),
        Line::from(format!(
            "  thresholds        warn {}% / high {}%",
            options.warn_threshold(),
            options.high_threshold()
        )),
        Line::from(""),
        Line::from(Span::styled(
            "  Space to start, v to switch view, n for crawl mode, q to quit",
            Style::default().fg(Color::Gray),
        )),
    ];

    let screen = Paragraph::new(lines).block(
        Block::default()
            .borders(Borders::ALL)
            .title(" ready ")
            .border_style(Style::default().fg(Color::DarkGray)),
    );
    f.render_widget(screen, area);
}

fn draw_horizontal_view(f: &mut Frame, area: Rect, state: &DisplayState) {
    let table_height = (state.latest.len() as u16 + 3).min(area.height);
    let chunks = Layout::default()
        .direction(Direction::Vertical)
        .constraints([Constraint::Length(table_height), Constraint::Min(0)])
        .split(area);

    draw_summary_table(f, chunks[0], state);

    if state.options.compact || state.latest.is_empty() {
        return;
    }

    // One chart strip per device: utilization and memory bars, latest
    // values only, plus the optional utilization sparkline.
    let per_device: u16 = if state.options.sparkline { 3 } else { 2 };
    let constraints: Vec<Constraint> = state
        .latest
        .iter()
        .map(|_| Constraint::Length(per_device))
        .collect();
    let device_chunks = Layout::default()
        .direction(Direction::Vertical)
        .constraints(constraints)
        .split(chunks[1]);

    for (reading, chunk) in state.latest.iter().zip(device_chunks.iter()) {
        draw_device_bars(f, *chunk, reading, state);
    }
}

fn draw_summary_table(f: &mut Frame, area: Rect, state: &DisplayState) {
    let mut content = String::new();
    content.push_str("GPU  NAME                      TEMP   UTIL     MEMORY\n");

    for reading in &state.latest {
        content.push_str(&format!(
            "{:<4} {:<25} {:>3.0}C  {:>4.0}%  {:>6.0}/{:<6.0} MiB\n",
            reading.index,
            truncate_name(&reading.name, 25),
            reading.temperature,
            reading.utilization,
            reading.memory_used,
            reading.memory_total,
        ));
    }

    let paused = if state.run_state == RunState::Paused {
        " [PAUSED]"
    } else {
        ""
    };
    let table = Paragraph::new(content).block(
        Block::default()
            .borders(Borders::ALL)
            .title(format!(" devices{paused} ")),
    );
    f.render_widget(table, area);
}

fn draw_device_bars(f: &mut Frame, area: Rect, reading: &DeviceReading, state: &DisplayState) {
    if area.height == 0 {
        return;
    }

    let rows: Vec<Constraint> = if state.options.sparkline {
        vec![
            Constraint::Length(1),
            Constraint::Length(1),
            Constraint::Length(1),
        ]
    } else {
        vec![Constraint::Length(1), Constraint::Length(1)]
    };
    let chunks = Layout::default()
        .direction(Direction::Vertical)
        .constraints(rows)
        .split(area);

    let util = reading.utilization.clamp(0.0, 100.0);
    let util_gauge = Gauge::default()
        .gauge_style(Style::default().fg(utilization_color(util, &state.options)))
        .ratio(util / 100.0)
        .label(format!("{} util {util:3.0}%", reading.name));
    f.render_widget(util_gauge, chunks[0]);

    let mem = reading.memory_percent().clamp(0.0, 100.0);
    let mem_gauge = Gauge::default()
        .gauge_style(Style::default().fg(Color::Magenta))
        .ratio(mem / 100.0)
        .label(format!("{} mem  {mem:3.0}%", reading.name));
    f.render_widget(mem_gauge, chunks[1]);

    if state.options.sparkline {
        if let Some(history) = state.histories.get(&reading.index) {
            let data: Vec<u64> = history
                .snapshot()
                .iter()
                .map(|e| e.utilization.clamp(0.0, 100.0) as u64)
                .collect();
            let sparkline = Sparkline::default()
                .data(&data)
                .max(100)
                .style(Style::default().fg(Color::Green));
            f.render_widget(sparkline, chunks[2]);
        }
    }
}

fn draw_vertical_view(f: &mut Frame, area: Rect, state: &DisplayState) {
    if state.latest.is_empty() {
        let placeholder = Paragraph::new("no data yet")
            .block(Block::default().borders(Borders::ALL).title(" history "))
            .style(Style::default().fg(Color::Yellow));
        f.render_widget(placeholder, area);
        return;
    }

    let count = state.latest.len() as u32;
    let constraints: Vec<Constraint> = state
        .latest
        .iter()
        .map(|_| Constraint::Ratio(1, count))
        .collect();
    let chunks = Layout::default()
        .direction(Direction::Vertical)
        .constraints(constraints)
        .split(area);

    for (reading, chunk) in state.latest.iter().zip(chunks.iter()) {
        draw_device_history(f, *chunk, reading, state);
    }
}

fn draw_device_history(f: &mut Frame, area: Rect, reading: &DeviceReading, state: &DisplayState) {
    let inner = if state.options.compact {
        area
    } else {
        let paused = if state.run_state == RunState::Paused {
            " [PAUSED]"
        } else {
            ""
        };
        let block = Block::default().borders(Borders::ALL).title(format!(
            " {} {} · {:.0}% util · {:.0}% mem · {:.0}C{} ",
            reading.index,
            reading.name,
            reading.utilization,
            reading.memory_percent(),
            reading.temperature,
            paused,
        ));
        let inner = block.inner(area);
        f.render_widget(block, area);
        inner
    };

    let entries = state
        .histories
        .get(&reading.index)
        .map(HistoryBuffer::snapshot)
        .unwrap_or_default();

    if entries.is_empty() {
        let placeholder =
            Paragraph::new("no data yet").style(Style::default().fg(Color::Yellow));
        f.render_widget(placeholder, inner);
        return;
    }

    let lines = history_grid(inner.width, inner.height, &entries, &state.options);
    f.render_widget(Paragraph::new(lines), inner);
}

/// One cell of the vertical grid.
#[derive(Clone, Copy, PartialEq)]
enum Cell {
    Utilization(char),
    Memory(char),
    Background,
}

/// Splits one history entry into a column of cells: memory from the top,
/// utilization from the bottom, background in between. Utilization is never
/// clipped; the memory segment is truncated first when both would overlap.
fn column_cells(entry: &HistoryEntry, rows: usize, options: &ViewOptions) -> Vec<Cell> {
    let rows_f = rows as f64;
    let util_exact = (entry.utilization.clamp(0.0, 100.0) / 100.0) * rows_f;
    let mem_exact = (entry.memory_percent.clamp(0.0, 100.0) / 100.0) * rows_f;

    let (mut util_span, util_frac) = segment_span(util_exact, rows, options.pixel);
    let (mut mem_span, mem_frac) = segment_span(mem_exact, rows, options.pixel);
    util_span = util_span.min(rows);
    let util_partial = util_frac.map(fractional_glyph);
    let mut mem_partial = mem_frac.map(memory_fraction_glyph);

    if mem_span + util_span > rows {
        // A truncated segment ends in a hard cut, not a fractional cell.
        mem_span = rows - util_span;
        mem_partial = None;
    }

    let mut cells = vec![Cell::Background; rows];

    for (row, cell) in cells.iter_mut().enumerate().take(mem_span) {
        let glyph = if row + 1 == mem_span {
            mem_partial.unwrap_or(options.bar_char)
        } else {
            options.bar_char
        };
        *cell = Cell::Memory(glyph);
    }

    for offset in 0..util_span {
        let row = rows - 1 - offset;
        let glyph = if offset + 1 == util_span {
            util_partial.unwrap_or(options.bar_char)
        } else {
            options.bar_char
        };
        cells[row] = Cell::Utilization(glyph);
    }

    cells
}

/// Whole cells covered by a segment, plus the fractional remainder when
/// pixel mode renders it as a sub-character cell. Without pixel mode the
/// segment rounds to whole cells.
fn segment_span(exact: f64, rows: usize, pixel: bool) -> (usize, Option<f64>) {
    if !pixel {
        return ((exact.round() as usize).min(rows), None);
    }

    let full = (exact.floor() as usize).min(rows);
    let frac = exact - exact.floor();
    if frac > 0.0 && full < rows {
        (full + 1, Some(frac))
    } else {
        (full, None)
    }
}

/// Lower eighth blocks by fractional remainder; the shade ramp is used for
/// the top-down memory segment, which has no lower-block mirror.
fn fractional_glyph(frac: f64) -> char {
    const EIGHTHS: [char; 7] = ['▁', '▂', '▃', '▄', '▅', '▆', '▇'];
    let idx = ((frac * 8.0).ceil() as usize).clamp(1, 7) - 1;
    EIGHTHS[idx]
}

fn memory_fraction_glyph(frac: f64) -> char {
    if frac < 1.0 / 3.0 {
        '░'
    } else if frac < 2.0 / 3.0 {
        '▒'
    } else {
        '▓'
    }
}

/// Builds the grid rows for one device, newest column rightmost, one
/// character per column so the bar history is continuous.
fn history_grid(
    width: u16,
    height: u16,
    entries: &[HistoryEntry],
    options: &ViewOptions,
) -> Vec<Line<'static>> {
    let width = width.max(1) as usize;
    let rows = height.max(1) as usize;

    // Column index counted from the right edge: rightmost = newest. Each
    // column carries its entry's utilization for tier coloring.
    let columns: Vec<Option<(Vec<Cell>, f64)>> = (0..width)
        .map(|col| {
            let offset = width - 1 - col;
            if offset < entries.len() {
                let entry = &entries[entries.len() - 1 - offset];
                Some((column_cells(entry, rows, options), entry.utilization))
            } else {
                None
            }
        })
        .collect();

    let background_style = Style::default().fg(Color::DarkGray);
    let memory_style = Style::default().fg(Color::Magenta);

    (0..rows)
        .map(|row| {
            let mut spans: Vec<Span<'static>> = Vec::new();
            let mut run = String::new();
            let mut run_style = background_style;

            for column in &columns {
                let (ch, style) = match column {
                    Some((cells, utilization)) => match cells[row] {
                        Cell::Utilization(ch) => (
                            ch,
                            Style::default().fg(utilization_color(*utilization, options)),
                        ),
                        Cell::Memory(ch) => (ch, memory_style),
                        Cell::Background => (options.background.as_char(), background_style),
                    },
                    None => (options.background.as_char(), background_style),
                };

                if style != run_style && !run.is_empty() {
                    spans.push(Span::styled(std::mem::take(&mut run), run_style));
                }
                run_style = style;
                run.push(ch);
            }
            if !run.is_empty() {
                spans.push(Span::styled(run, run_style));
            }

            Line::from(spans)
        })
        .collect()
}

fn utilization_color(utilization: f64, options: &ViewOptions) -> Color {
    if utilization >= f64::from(options.high_threshold()) {
        Color::Red
    } else if utilization >= f64::from(options.warn_threshold()) {
        Color::Yellow
    } else {
        Color::Green
    }
}

fn draw_status_line(f: &mut Frame, area: Rect, state: &DisplayState) {
    let mut spans = vec![
        Span::styled("Space", Style::default().fg(Color::Yellow)),
        Span::styled(" pause  ", Style::default().fg(Color::Gray)),
        Span::styled("v", Style::default().fg(Color::Yellow)),
        Span::styled(" view  ", Style::default().fg(Color::Gray)),
        Span::styled("n", Style::default().fg(Color::Yellow)),
        Span::styled(" crawl  ", Style::default().fg(Color::Gray)),
        Span::styled("q", Style::default().fg(Color::Yellow)),
        Span::styled(" quit", Style::default().fg(Color::Gray)),
    ];

    if state.run_state == RunState::Paused {
        spans.push(Span::styled(
            "  [PAUSED]",
            Style::default().fg(Color::Yellow).add_modifier(Modifier::BOLD),
        ));
    }

    if let Some(ref error) = state.probe_error {
        spans.push(Span::styled(
            format!("  {error}"),
            Style::default().fg(Color::Red),
        ));
    }

    let status = Paragraph::new(Line::from(spans))
        .block(Block::default().borders(Borders::ALL));
    f.render_widget(status, area);
}

fn truncate_name(name: &str, max: usize) -> String {
    if name.chars().count() <= max {
        name.to_string()
    } else {
        let truncated: String = name.chars().take(max.saturating_sub(1)).collect();
        format!("{truncated}…")
    }
}

fn print_final_summary(readings: &[DeviceReading]) {
    if readings.is_empty() {
        println!("nvsharptop: no readings collected");
        return;
    }

    for reading in readings {
        println!(
            "GPU {} {}: {:.0}% util, {:.0}/{:.0} MiB, {:.0}C",
            reading.index,
            reading.name,
            reading.utilization,
            reading.memory_used,
            reading.memory_total,
            reading.temperature,
        );
    }
}
