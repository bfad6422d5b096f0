//! Terminal simulator for the escale control core.
//!
//! Composes escale-core the way the firmware does (input, load cell sampling,
//! view stack, dashboard) on top of a synthetic load cell, and prints every
//! flushed frame as text.
//!
//! # Commands
//!
//! | Key | Action                              |
//! |-----|-------------------------------------|
//! | a   | Press the left button (tare/cancel) |
//! | b   | Press the right button (calibrate)  |
//! | +   | Put the 100 g weight on the scale   |
//! | -   | Take the weight off                 |
//! | q   | Quit                                |
//!
//! Commands are read from stdin, one or more per line, or replayed from
//! `--script <keys>` (e.g. `--script "b+b-a"`).
//!
//! `--profile <file>` loads a TOML `ScaleConfig` (see `profiles/fast.toml`).
//! `--unplugged` simulates a device whose load cell does not answer; the
//! simulator then shows the status page instead of the dashboard.

use std::cell::RefCell;
use std::collections::VecDeque;
use std::path::{Path, PathBuf};
use std::process::ExitCode;
use std::rc::Rc;
use std::sync::mpsc::{self, Receiver, TryRecvError};
use std::thread;
use std::time::{Duration, Instant};

use clap::Parser;
use env_logger::Env;
use log::{error, info, warn};

use escale_core::app_state::AppState;
use escale_core::config::{BUTTON_HOLD_OFF_MS, ScaleConfig};
use escale_core::error::{SchedulerError, SensorError};
use escale_core::input::{Button, Level};
use escale_core::pages::{MessagePage, status_model};
use escale_core::run_loop::RunLoop;
use escale_core::scale::{self, WeightSensor};
use escale_core::tasks::{CalibrationTask, DashboardTask, InputTask, TaringTask};
use escale_core::ui::display::Frame;
use escale_core::ui::{BoundView, MemoryDisplay, ViewRole, ViewStackTask};

#[derive(Parser)]
#[command(name = "escale-sim")]
#[command(about = "Run the escale control core against a simulated load cell")]
#[command(long_about = None)]
struct Cli {
    /// Replay these command keys instead of reading stdin (e.g. "b+b-a")
    #[arg(long, short)]
    script: Option<String>,

    /// TOML file overriding the default scale configuration
    #[arg(long, short)]
    profile: Option<PathBuf>,

    /// Simulate a load cell that does not respond
    #[arg(long)]
    unplugged: bool,
}

// ---------------------------------------------------------------------------
// Simulation constants
// ---------------------------------------------------------------------------

/// Wall-clock duration of one run loop tick when typing live (~30 Hz).
const TICK_DURATION: Duration = Duration::from_millis(33);

/// Simulated button clock advance per tick (ms).
const SIM_TICK_MS: u32 = 100;

/// Ticks between two applied commands.
const SCRIPT_STEP_TICKS: u32 = 10;

/// Ticks run after the last command before exiting.
const SETTLE_TICKS: u32 = 20;

/// Raw reading of the empty simulated load cell.
const EMPTY_RAW: i32 = 8_400;

/// Raw counts per gram of the simulated load cell.
const COUNTS_PER_GRAM: i32 = 212;

/// Mass put on the scale by `+`.
const LOAD_GRAMS: i32 = 100;

/// Text columns of a 128 px wide panel with a 6 px font.
const PANEL_COLUMNS: usize = 21;

static BUTTON_A: Button = Button::new(BUTTON_HOLD_OFF_MS);
static BUTTON_B: Button = Button::new(BUTTON_HOLD_OFF_MS);

// ---------------------------------------------------------------------------
// Synthetic load cell
// ---------------------------------------------------------------------------

/// Load cell with a fixed offset, a linear response and a little ripple.
struct SimulatedLoadCell {
    load_grams: i32,
    samples: u32,
    plugged: bool,
}

impl SimulatedLoadCell {
    fn new(plugged: bool) -> Self {
        Self {
            load_grams: 0,
            samples: 0,
            plugged,
        }
    }
}

impl WeightSensor for SimulatedLoadCell {
    fn sample(&mut self) -> Result<i32, SensorError> {
        if !self.plugged {
            return Err(SensorError::NotFound);
        }
        self.samples = self.samples.wrapping_add(1);
        let ripple = (self.samples % 5) as i32 - 2;
        Ok(EMPTY_RAW + self.load_grams * COUNTS_PER_GRAM + ripple)
    }

    fn reset(&mut self) {
        self.samples = 0;
    }
}

// ---------------------------------------------------------------------------
// Commands
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Command {
    PressA,
    PressB,
    Load,
    Unload,
    Quit,
}

impl Command {
    fn parse(key: char) -> Option<Self> {
        match key.to_ascii_lowercase() {
            'a' => Some(Command::PressA),
            'b' => Some(Command::PressB),
            '+' => Some(Command::Load),
            '-' => Some(Command::Unload),
            'q' => Some(Command::Quit),
            _ => None,
        }
    }
}

/// Where commands come from: a script or stdin.
///
/// Commands are applied one every `SCRIPT_STEP_TICKS` ticks so each press
/// lands on a settled page.
struct Source {
    pending: VecDeque<char>,
    stdin: Option<Receiver<char>>,
    drained_at: Option<u32>,
}

impl Source {
    fn new(script: Option<&str>) -> Self {
        match script {
            Some(keys) => Self {
                pending: keys.chars().filter(|key| !key.is_whitespace()).collect(),
                stdin: None,
                drained_at: None,
            },
            None => Self {
                pending: VecDeque::new(),
                stdin: Some(spawn_stdin_reader()),
                drained_at: None,
            },
        }
    }

    /// Whether commands are typed live, as opposed to replayed.
    fn is_live(&self) -> bool {
        self.stdin.is_some()
    }

    /// Command due at `tick`, `Some(None)` for a tick without one, or `None`
    /// once the input is exhausted and the last workflow has settled.
    fn poll(&mut self, tick: u32) -> Option<Option<Command>> {
        if let Some(rx) = &self.stdin {
            let mut closed = false;
            loop {
                match rx.try_recv() {
                    Ok(key) if key.is_whitespace() => {}
                    Ok(key) => self.pending.push_back(key),
                    Err(TryRecvError::Empty) => break,
                    Err(TryRecvError::Disconnected) => {
                        closed = true;
                        break;
                    }
                }
            }
            if closed {
                self.stdin = None;
            }
        }

        if tick == 0 || tick % SCRIPT_STEP_TICKS != 0 {
            return Some(None);
        }
        if let Some(key) = self.pending.pop_front() {
            self.drained_at = None;
            return Some(Command::parse(key));
        }
        if self.is_live() {
            return Some(None);
        }

        let drained_at = *self.drained_at.get_or_insert(tick);
        if tick - drained_at >= SETTLE_TICKS {
            None
        } else {
            Some(None)
        }
    }
}

fn spawn_stdin_reader() -> Receiver<char> {
    let (tx, rx) = mpsc::channel();
    thread::spawn(move || {
        for line in std::io::stdin().lines() {
            let Ok(line) = line else {
                break;
            };
            for key in line.chars() {
                if tx.send(key).is_err() {
                    return;
                }
            }
        }
    });
    rx
}

// ---------------------------------------------------------------------------
// Frame output
// ---------------------------------------------------------------------------

fn print_frame(frame: &Frame, tick: u32) {
    let mut rows: Vec<(i32, Vec<char>)> = Vec::new();
    for line in &frame.lines {
        let row = match rows.iter().position(|(y, _)| *y == line.at.y) {
            Some(index) => index,
            None => {
                rows.push((line.at.y, vec![' '; PANEL_COLUMNS]));
                rows.len() - 1
            }
        };
        let column = (line.at.x.max(0) / 6) as usize;
        for (offset, ch) in line.text.chars().enumerate() {
            if let Some(cell) = rows[row].1.get_mut(column + offset) {
                *cell = ch;
            }
        }
    }
    rows.sort_by_key(|(y, _)| *y);

    println!("+{}+ tick {}", "-".repeat(PANEL_COLUMNS), tick);
    for (_, cells) in rows {
        println!("|{}|", cells.into_iter().collect::<String>());
    }
    println!("+{}+", "-".repeat(PANEL_COLUMNS));
}

// ---------------------------------------------------------------------------
// Configuration
// ---------------------------------------------------------------------------

fn load_profile(path: &Path) -> Result<ScaleConfig, String> {
    let text = std::fs::read_to_string(path).map_err(|e| format!("cannot read {}: {}", path.display(), e))?;
    toml::from_str(&text).map_err(|e| format!("invalid profile {}: {}", path.display(), e))
}

// ---------------------------------------------------------------------------
// Composition
// ---------------------------------------------------------------------------

/// Register the device tasks. A device that came up faulted shows its status
/// page and never offers the workflows.
fn compose(
    run_loop: &mut RunLoop,
    state: &AppState,
    sensor: &Rc<RefCell<SimulatedLoadCell>>,
    display: MemoryDisplay,
    config: ScaleConfig,
) -> Result<(), SchedulerError> {
    run_loop.register(InputTask::new(&BUTTON_A, &BUTTON_B))?;
    run_loop.register(scale::sampling_task(sensor.clone(), config.reads_per_tick))?;
    let stack = run_loop.register(ViewStackTask::new(display))?;

    if !state.mode.is_interactive() {
        warn!("Device came up in {:?} mode", state.mode);
        if let Some(stack) = run_loop.find::<ViewStackTask>(stack) {
            if let Err(e) = stack.push(BoundView::<MessagePage>::new(ViewRole::Message, status_model)) {
                warn!("Status page not shown: {}", e);
            }
        }
        return Ok(());
    }

    let tare_sensor = sensor.clone();
    let calibration_sensor = sensor.clone();
    run_loop.register(DashboardTask::new(
        move || TaringTask::new(scale::taring_work(tare_sensor.clone(), config)),
        move || CalibrationTask::new(scale::calibration_work(calibration_sensor.clone(), config)),
    ))?;
    Ok(())
}

// ---------------------------------------------------------------------------
// Entry point
// ---------------------------------------------------------------------------

fn main() -> ExitCode {
    env_logger::Builder::from_env(Env::default().default_filter_or("info")).init();
    info!("Starting escale simulator");
    info!("Keys: a=Tare/Cancel  b=Calibrate  +=Load 100 g  -=Unload  q=Quit");

    let cli = Cli::parse();
    let config = match cli.profile.as_deref().map(load_profile) {
        Some(Ok(config)) => {
            info!("Loaded profile {:?}", config);
            config
        }
        Some(Err(e)) => {
            error!("{}", e);
            return ExitCode::FAILURE;
        }
        None => ScaleConfig::default(),
    };
    let sensor = Rc::new(RefCell::new(SimulatedLoadCell::new(!cli.unplugged)));
    let display = MemoryDisplay::new();
    let probe = display.probe();

    // Bring-up tare, as the device does before the first tick
    let mut state = AppState::new();
    if let Err(e) = scale::measure_zero_offset(&mut state, &mut *sensor.borrow_mut(), &config) {
        scale::record_sensor_error(&mut state, e);
    }
    info!("Zero offset {}", state.zero_offset);

    let mut run_loop = RunLoop::new();
    if let Err(e) = compose(&mut run_loop, &state, &sensor, display, config) {
        error!("Cannot compose the run loop: {}", e);
        return ExitCode::FAILURE;
    }

    let mut source = Source::new(cli.script.as_deref());
    let mut now_ms: u32 = SIM_TICK_MS;
    let mut shown = 0;

    // -----------------------------------------------------------------------
    // Main loop
    // -----------------------------------------------------------------------
    'running: loop {
        let tick_start = Instant::now();
        let tick = run_loop.ticks();

        // --- Commands -----------------------------------------------------
        match source.poll(tick) {
            None => break 'running,
            Some(None) => {}
            Some(Some(command)) => {
                info!("Command {:?}", command);
                match command {
                    Command::PressA => {
                        BUTTON_A.update(Level::Down, now_ms);
                    }
                    Command::PressB => {
                        BUTTON_B.update(Level::Down, now_ms);
                    }
                    Command::Load => sensor.borrow_mut().load_grams = LOAD_GRAMS,
                    Command::Unload => sensor.borrow_mut().load_grams = 0,
                    Command::Quit => break 'running,
                }
            }
        }

        // --- Tick ---------------------------------------------------------
        run_loop.run(&mut state);

        // Buttons are released half a tick after being pressed
        BUTTON_A.update(Level::Up, now_ms + SIM_TICK_MS / 2);
        BUTTON_B.update(Level::Up, now_ms + SIM_TICK_MS / 2);
        now_ms = now_ms.wrapping_add(SIM_TICK_MS);

        // --- Output -------------------------------------------------------
        if probe.flush_count() != shown {
            shown = probe.flush_count();
            match probe.last_frame() {
                Some(frame) => print_frame(&frame, tick),
                None => warn!("Flush without a frame"),
            }
        }

        // --- Pacing -------------------------------------------------------
        if source.is_live() {
            let elapsed = tick_start.elapsed();
            if elapsed < TICK_DURATION {
                thread::sleep(TICK_DURATION - elapsed);
            }
        }
    }

    info!(
        "Simulator exiting: weight {:.1} g, factor {:.2}",
        state.weight, state.calibration_factor
    );
    ExitCode::SUCCESS
}
