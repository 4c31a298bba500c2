//! Terminal AR simulator running the full placement pipeline

use arplace_core::{
    ArResult, FrameLoop, FrameOutcome, PlacementConfig, PyramidRenderer, ReferenceFrame,
    ScreenPoint, SessionState, Viewport,
};
use crossterm::{
    cursor,
    event::{
        self, DisableMouseCapture, EnableMouseCapture, Event, KeyCode, KeyEvent, MouseButton,
        MouseEvent, MouseEventKind,
    },
    execute, queue,
    style::{Color, Print, ResetColor, SetForegroundColor},
    terminal::{self},
};
use std::io::{self, stdout, Write};
use std::time::{Duration, Instant};

pub mod device;
pub mod renderer;

pub use device::{SimulatedDevice, SimulatedHost, TickScheduler};
pub use renderer::AsciiRasterizer;

const WALK_STEP: f32 = 0.15;
const LOOK_STEP: f32 = 0.05;

/// Rows reserved for the HUD line.
const HUD_ROWS: u16 = 1;

/// Simulation settings outside the placement config
#[derive(Debug, Clone)]
pub struct SimulationConfig {
    pub eye_height: f32,
    pub target_fps: u32,
}

impl Default for SimulationConfig {
    fn default() -> Self {
        Self {
            eye_height: 1.5,
            target_fps: 30,
        }
    }
}

type TerminalLoop = FrameLoop<SimulatedHost, TickScheduler, PyramidRenderer<AsciiRasterizer>>;

/// Main application struct for the terminal simulator
pub struct TerminalApp {
    frame_loop: TerminalLoop,
    device: SimulatedDevice,
    simulation: SimulationConfig,
    last_outcome: FrameOutcome,
    status: String,
    last_second: Instant,
    frame_count: u32,
    fps: f32,
}

impl TerminalApp {
    pub fn new(config: PlacementConfig, simulation: SimulationConfig) -> ArResult<Self> {
        let (columns, rows) = terminal::size().unwrap_or((80, 24));
        Self::with_terminal_size(config, simulation, columns, rows)
    }

    /// Build for a terminal of `columns` x `rows` cells, HUD included.
    pub fn with_terminal_size(
        config: PlacementConfig,
        simulation: SimulationConfig,
        columns: u16,
        rows: u16,
    ) -> ArResult<Self> {
        let rows = rows.saturating_sub(HUD_ROWS).max(1);

        let rasterizer = AsciiRasterizer::new(columns as usize, rows as usize);
        let renderer = PyramidRenderer::new(rasterizer)?;
        let frame_loop = FrameLoop::new(
            SimulatedHost::default(),
            TickScheduler::default(),
            renderer,
            config,
        );

        Ok(Self {
            frame_loop,
            device: SimulatedDevice::new(simulation.eye_height, columns, rows),
            simulation,
            last_outcome: FrameOutcome::Ignored,
            status: "press Enter to start".to_string(),
            last_second: Instant::now(),
            frame_count: 0,
            fps: 0.0,
        })
    }

    pub fn run(&mut self) -> io::Result<()> {
        terminal::enable_raw_mode()?;
        execute!(
            stdout(),
            terminal::EnterAlternateScreen,
            EnableMouseCapture,
            cursor::Hide
        )?;

        let result = self.main_loop();

        // Cleanup
        self.frame_loop.stop();
        terminal::disable_raw_mode()?;
        execute!(
            stdout(),
            DisableMouseCapture,
            terminal::LeaveAlternateScreen,
            cursor::Show
        )?;

        result
    }

    fn main_loop(&mut self) -> io::Result<()> {
        let target_frame_time = Duration::from_millis(1000 / self.simulation.target_fps.max(1) as u64);

        while self.frame_loop.state() != SessionState::Ended {
            let frame_start = Instant::now();

            while event::poll(Duration::from_millis(0))? {
                self.handle_event(event::read()?);
            }

            self.tick();
            self.present()?;

            let elapsed = frame_start.elapsed();
            if elapsed < target_frame_time {
                std::thread::sleep(target_frame_time - elapsed);
            }
        }

        Ok(())
    }

    fn handle_event(&mut self, event: Event) {
        match event {
            Event::Key(KeyEvent { code, .. }) => self.handle_key(code),
            Event::Mouse(MouseEvent {
                kind: MouseEventKind::Down(MouseButton::Left),
                column,
                row,
                ..
            }) => {
                // The scene starts below the HUD
                let Some(row) = row.checked_sub(HUD_ROWS) else {
                    return;
                };
                let rasterizer = self.frame_loop.renderer().backend();
                if (row as usize) < rasterizer.height() && (column as usize) < rasterizer.width() {
                    let tap = ScreenPoint::from_pixels(
                        column as f32 + 0.5,
                        row as f32 + 0.5,
                        rasterizer.width() as f32,
                        rasterizer.height() as f32,
                    );
                    self.frame_loop.tap(tap.x, tap.y);
                }
            }
            Event::Resize(columns, rows) => {
                let rows = rows.saturating_sub(HUD_ROWS).max(1);
                self.device.resize(columns, rows);
                self.frame_loop
                    .resize(Viewport::new(columns as u32, rows as u32));
            }
            _ => {}
        }
    }

    fn handle_key(&mut self, code: KeyCode) {
        match code {
            KeyCode::Char('q') | KeyCode::Esc => self.frame_loop.stop(),
            KeyCode::Enter if self.frame_loop.state() == SessionState::Idle => {
                if let Err(err) = self.frame_loop.start() {
                    self.status = err.to_string();
                }
            }
            KeyCode::Char(' ') | KeyCode::Enter => {
                self.frame_loop.tap(ScreenPoint::CENTER.x, ScreenPoint::CENTER.y);
            }
            KeyCode::Char('w') => self.device.walk(WALK_STEP, 0.0),
            KeyCode::Char('s') => self.device.walk(-WALK_STEP, 0.0),
            KeyCode::Char('a') => self.device.walk(0.0, -WALK_STEP),
            KeyCode::Char('d') => self.device.walk(0.0, WALK_STEP),
            KeyCode::Left => self.device.look(LOOK_STEP, 0.0),
            KeyCode::Right => self.device.look(-LOOK_STEP, 0.0),
            KeyCode::Up => self.device.look(0.0, LOOK_STEP),
            KeyCode::Down => self.device.look(0.0, -LOOK_STEP),
            KeyCode::Char('g') => {
                self.device.tracking_lost = !self.device.tracking_lost;
                tracing::info!(lost = self.device.tracking_lost, "tracking gap toggled");
            }
            KeyCode::Char('r') => self.fire_reset(),
            _ => {}
        }
    }

    fn fire_reset(&mut self) {
        let Some(frame) = self.frame_loop.reference_frame().cloned() else {
            return;
        };
        let correction = self.device.drift(&frame);
        self.frame_loop.reset(Some(&correction));
    }

    /// Resolve host requests, then run the frame callback if one is due.
    fn tick(&mut self) {
        let host = self.frame_loop.host_mut();
        let session = host.take_session_request();
        let reference = host.take_frame_request();
        if session {
            self.frame_loop.host_mut().active = true;
            self.frame_loop.session_ready();
        }
        if reference {
            self.frame_loop.reference_frame_ready(ReferenceFrame::base());
        }

        if let Some(handle) = self.frame_loop.scheduler_mut().take_due() {
            let frame = self.device.frame();
            self.last_outcome = self.frame_loop.on_frame(handle, &frame);
        }

        self.frame_count += 1;
        let now = Instant::now();
        if (now - self.last_second).as_secs() >= 1 {
            self.fps = self.frame_count as f32 / (now - self.last_second).as_secs_f32();
            self.frame_count = 0;
            self.last_second = now;
        }
    }

    fn present(&mut self) -> io::Result<()> {
        let mut stdout = stdout();
        queue!(stdout, cursor::MoveTo(0, HUD_ROWS))?;
        self.frame_loop.renderer().backend().draw(&mut stdout)?;

        queue!(
            stdout,
            cursor::MoveTo(0, 0),
            terminal::Clear(terminal::ClearType::CurrentLine),
            SetForegroundColor(Color::Yellow),
            Print(self.hud_line()),
            ResetColor
        )?;

        stdout.flush()
    }

    fn hud_line(&self) -> String {
        let tracking = match (self.frame_loop.state(), self.last_outcome) {
            (SessionState::Idle, _) => self.status.as_str(),
            (SessionState::WaitingForSession, _) => "starting...",
            (_, FrameOutcome::TrackingGap) => "tracking lost",
            (_, FrameOutcome::Rendered { .. }) => "tracking",
            _ => "waiting for pose",
        };
        format!(
            "arplace | {tracking} | placed: {} | frames: {} | frame gen: {} | FPS: {:.0} | WASD move, arrows look, Space/click place, g gap, r reset, q quit",
            self.frame_loop.placement().placements().len(),
            self.frame_loop.frames_rendered(),
            self.frame_loop
                .reference_frame()
                .map_or(0, ReferenceFrame::generation),
            self.fps,
        )
    }
}
