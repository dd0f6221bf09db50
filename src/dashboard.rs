use std::f64::consts::TAU;
use std::io;
use std::sync::mpsc::{self, Receiver};
use std::thread;
use std::time::Duration;

use braillegraph::{
    GlyphMode, GraphConfig, GraphMeter, GraphMeterWidget, Palette, Result, ValueSource,
};
use crossterm::event::{self, Event, KeyCode, KeyEventKind};
use ratatui::{
    Frame,
    layout::{Alignment, Constraint, Direction, Layout, Rect},
    style::{Color, Modifier, Style},
    text::{Line, Span},
    widgets::{Block, Borders, Paragraph},
};
use tracing::{debug, info};

const SAMPLER_TICK: Duration = Duration::from_millis(100);
const MAX_DELAY_TENTHS: u32 = 100;

enum SampleEvent {
    Update(Waveforms),
}

/// One reading of every synthetic source.
struct Waveforms {
    cpu: [f64; 2],
    net: [f64; 3],
    mem: [f64; 1],
}

impl Waveforms {
    fn at(t: f64) -> Self {
        let wave = |period: f64, phase: f64| (TAU * t / period + phase).sin();

        let user = 35.0 + 25.0 * wave(12.0, 0.0) + 5.0 * wave(1.3, 0.4);
        let system = 12.0 + 8.0 * wave(5.0, 1.0);

        // Spans several powers of two so the scale label moves.
        let magnitude = 2f64.powf(12.0 + 8.0 * wave(40.0, 0.0));
        let rx = magnitude * (1.0 + 0.5 * wave(3.0, 0.0));
        let tx = magnitude * 0.4 * (1.0 + 0.5 * wave(7.0, 2.0));
        let dropped = if wave(9.0, 0.5) > 0.8 { magnitude * 0.2 } else { 0.0 };

        let resident = 2f64.powf(28.0 + 2.0 * wave(60.0, 1.5));

        Self {
            cpu: [user.max(0.0), system.max(0.0)],
            net: [rx, tx, dropped],
            mem: [resident],
        }
    }
}

/// A fixed-size source whose values are replaced on every update.
struct SyntheticSource<const N: usize> {
    caption: &'static str,
    values: [f64; N],
    total: f64,
}

impl<const N: usize> SyntheticSource<N> {
    fn new(caption: &'static str, total: f64) -> Self {
        Self {
            caption,
            values: [0.0; N],
            total,
        }
    }
}

impl<const N: usize> ValueSource for SyntheticSource<N> {
    fn caption(&self) -> &str {
        self.caption
    }

    fn values(&self) -> &[f64] {
        &self.values
    }

    fn total(&self) -> f64 {
        self.total
    }
}

struct DashboardState {
    cpu: SyntheticSource<2>,
    net: SyntheticSource<3>,
    mem: SyntheticSource<1>,

    cpu_meter: GraphMeter,
    net_meter: GraphMeter,
    mem_meter: GraphMeter,
}

impl DashboardState {
    fn new(config: &GraphConfig) -> Result<Self> {
        let cpu = SyntheticSource::new("CPU", 100.0);
        let net = SyntheticSource::new("Net", 0.0);
        let mem = SyntheticSource::new("Mem", 0.0);
        Ok(Self {
            cpu_meter: GraphMeter::new(config, &cpu)?,
            net_meter: GraphMeter::new(config, &net)?,
            mem_meter: GraphMeter::new(config, &mem)?,
            cpu,
            net,
            mem,
        })
    }

    fn update(&mut self, data: Waveforms) {
        self.cpu.values = data.cpu;
        self.net.values = data.net;
        self.mem.values = data.mem;
    }

    fn meters_mut(&mut self) -> [&mut GraphMeter; 3] {
        [&mut self.cpu_meter, &mut self.net_meter, &mut self.mem_meter]
    }
}

pub struct Dashboard {
    delay_tenths: u32,
    glyphs: GlyphMode,
    graph_height: u16,
    palette: Palette,
    state: DashboardState,
    sample_receiver: Receiver<SampleEvent>,
}

impl Dashboard {
    pub fn new(config: &GraphConfig) -> Result<Self> {
        let palette = config.palette.resolve()?;
        let state = DashboardState::new(config)?;
        let (tx, rx) = mpsc::channel::<SampleEvent>();

        // Spawn the synthetic sampler; it stops once the receiver is gone.
        thread::spawn(move || {
            let mut t = 0.0;
            loop {
                if tx.send(SampleEvent::Update(Waveforms::at(t))).is_err() {
                    break;
                }
                t += SAMPLER_TICK.as_secs_f64();
                thread::sleep(SAMPLER_TICK);
            }
        });

        info!(
            height = config.height,
            delay_tenths = config.delay_tenths,
            glyphs = ?config.glyphs,
            "dashboard ready"
        );

        Ok(Dashboard {
            delay_tenths: config.delay_tenths,
            glyphs: config.glyphs,
            graph_height: config.height,
            palette,
            state,
            sample_receiver: rx,
        })
    }

    pub fn run(&mut self) -> io::Result<()> {
        // ==============================================================================
        // Terminal Setup
        // ==============================================================================
        crossterm::terminal::enable_raw_mode()?;
        let mut stdout = io::stdout();
        crossterm::execute!(stdout, crossterm::terminal::EnterAlternateScreen)?;

        let backend = ratatui::backend::CrosstermBackend::new(stdout);
        let mut terminal = ratatui::Terminal::new(backend)?;

        // ==============================================================================
        // Main Event Loop
        // ==============================================================================
        let result = self.event_loop(&mut terminal);

        // ==============================================================================
        // Cleanup
        // ==============================================================================
        crossterm::terminal::disable_raw_mode()?;
        crossterm::execute!(
            terminal.backend_mut(),
            crossterm::terminal::LeaveAlternateScreen
        )?;
        terminal.show_cursor()?;

        result
    }

    fn event_loop(
        &mut self,
        terminal: &mut ratatui::Terminal<ratatui::backend::CrosstermBackend<io::Stdout>>,
    ) -> io::Result<()> {
        loop {
            // Take the newest readings before drawing; meters sample on draw.
            while let Ok(SampleEvent::Update(data)) = self.sample_receiver.try_recv() {
                self.state.update(data);
            }

            terminal.draw(|f| self.render(f))?;

            if event::poll(Duration::from_millis(50))? {
                if let Event::Key(key) = event::read()? {
                    if key.kind == KeyEventKind::Press {
                        match key.code {
                            KeyCode::Char('q') | KeyCode::Esc => break,
                            KeyCode::Char('+') | KeyCode::Char('=') => {
                                self.set_delay((self.delay_tenths + 1).min(MAX_DELAY_TENTHS));
                            }
                            KeyCode::Char('-') => {
                                self.set_delay(self.delay_tenths.saturating_sub(1).max(1));
                            }
                            KeyCode::Char('g') => self.toggle_glyphs(),
                            _ => {}
                        }
                    }
                }
            }
        }

        Ok(())
    }

    fn set_delay(&mut self, tenths: u32) {
        if tenths == self.delay_tenths {
            return;
        }
        debug!(from = self.delay_tenths, to = tenths, "changing sample delay");
        self.delay_tenths = tenths;
        for meter in self.state.meters_mut() {
            meter.clock_mut().set_interval_tenths(tenths);
        }
    }

    fn toggle_glyphs(&mut self) {
        self.glyphs = match self.glyphs {
            GlyphMode::Braille => GlyphMode::Ascii,
            GlyphMode::Ascii => GlyphMode::Braille,
        };
        for meter in self.state.meters_mut() {
            meter.set_glyphs(self.glyphs);
        }
    }

    fn render(&mut self, frame: &mut Frame) {
        let meter_rows = self.graph_height + 2;
        let chunks = Layout::default()
            .direction(Direction::Vertical)
            .constraints([
                Constraint::Length(3),          // Header
                Constraint::Length(meter_rows), // CPU
                Constraint::Length(meter_rows), // Network
                Constraint::Length(meter_rows), // Memory
                Constraint::Min(0),
                Constraint::Length(3), // Footer
            ])
            .split(frame.area());

        // ==============================================================================
        // Header
        // ==============================================================================
        let header = Paragraph::new(vec![Line::from(vec![
            Span::styled(
                "braillegraph",
                Style::default()
                    .fg(Color::Cyan)
                    .add_modifier(Modifier::BOLD),
            ),
            Span::raw(" - synthetic meters"),
        ])])
        .block(Block::default().borders(Borders::ALL))
        .alignment(Alignment::Center);
        frame.render_widget(header, chunks[0]);

        // ==============================================================================
        // Meters
        // ==============================================================================
        let cpu_title = format!(
            " CPU: user {:.0}% sys {:.0}% ",
            self.state.cpu.values[0], self.state.cpu.values[1]
        );
        self.render_meter(frame, chunks[1], Meter::Cpu, cpu_title);

        let net_title = format!(
            " Network: rx {:.0} tx {:.0} drop {:.0} ",
            self.state.net.values[0], self.state.net.values[1], self.state.net.values[2]
        );
        self.render_meter(frame, chunks[2], Meter::Net, net_title);

        let mem_title = format!(
            " Memory: {:.1} MiB ",
            self.state.mem.values[0] / 1_048_576.0
        );
        self.render_meter(frame, chunks[3], Meter::Mem, mem_title);

        // ==============================================================================
        // Footer with Controls
        // ==============================================================================
        let footer_text = format!(
            "Delay: {:.1}s | [+/-] Adjust Delay | [g] Glyphs | [q/ESC] Quit",
            f64::from(self.delay_tenths) / 10.0
        );
        let footer = Paragraph::new(footer_text)
            .block(Block::default().borders(Borders::ALL))
            .alignment(Alignment::Center)
            .style(Style::default().fg(Color::DarkGray));
        frame.render_widget(footer, chunks[5]);
    }

    fn render_meter(&mut self, frame: &mut Frame, area: Rect, which: Meter, title: String) {
        let block = Block::default()
            .title(title)
            .borders(Borders::ALL)
            .border_style(self.palette.style(braillegraph::Attr::Border));
        let state = &mut self.state;
        match which {
            Meter::Cpu => frame.render_widget(
                GraphMeterWidget::new(&mut state.cpu_meter, &state.cpu, &self.palette)
                    .block(block),
                area,
            ),
            Meter::Net => frame.render_widget(
                GraphMeterWidget::new(&mut state.net_meter, &state.net, &self.palette)
                    .block(block),
                area,
            ),
            Meter::Mem => frame.render_widget(
                GraphMeterWidget::new(&mut state.mem_meter, &state.mem, &self.palette)
                    .block(block),
                area,
            ),
        }
    }
}

#[derive(Clone, Copy)]
enum Meter {
    Cpu,
    Net,
    Mem,
}
