use crate::config::Mode;
use crate::input::{collect_frame_input, Command};
use crate::model::RenderCell;
use crate::pointer::GridLayout;
use crate::render::{draw_grid, draw_text, Terminal, HUD_ROWS};
use crate::sim::Sim;
use crossterm::style::Color;
use std::time::{Duration, Instant};

const DEFAULT_SEED: u64 = 0xC0FFEE;
const TARGET_FPS: f32 = 60.0;
// One frame at a glacial 10fps; anything slower (suspend, debugger) must
// not turn into a single giant integration step.
const MAX_DT: f32 = 0.1;

pub(crate) struct App {
    term: Terminal,
    sim: Sim,
    layout: GridLayout,
    scratch: Vec<RenderCell>,
    last_pointer: Option<(u16, u16)>,
    should_quit: bool,
    render_failed: bool,
    fps: f32,
    frames: u32,
    fps_timer: Instant,
}

impl App {
    fn init() -> anyhow::Result<Self> {
        // No surface, no program: terminal setup failure aborts startup.
        let term = Terminal::begin()?;
        let layout = GridLayout::new(term.cols, term.rows, HUD_ROWS);

        log::info!(
            "flipgrid starting: {}x{} terminal, seed {:#x}",
            term.cols,
            term.rows,
            DEFAULT_SEED
        );
        log::info!("controls: mouse hovers, 1 labil, 2 stable, space freeze, r reset, q quit");

        Ok(Self {
            term,
            sim: Sim::new(DEFAULT_SEED),
            layout,
            scratch: Vec::new(),
            last_pointer: None,
            should_quit: false,
            render_failed: false,
            fps: 0.0,
            frames: 0,
            fps_timer: Instant::now(),
        })
    }

    fn run(&mut self) -> anyhow::Result<()> {
        let frame_dt = Duration::from_secs_f32(1.0 / TARGET_FPS);
        let mut last_frame = Instant::now();

        while !self.should_quit {
            if self.term.resize_if_needed()? {
                self.layout = GridLayout::new(self.term.cols, self.term.rows, HUD_ROWS);
            }

            let input = collect_frame_input(frame_dt)?;
            if input.resized && self.term.resize_if_needed()? {
                self.layout = GridLayout::new(self.term.cols, self.term.rows, HUD_ROWS);
            }
            for cmd in input.commands {
                self.apply(cmd);
            }
            if let Some(p) = input.pointer {
                self.last_pointer = Some(p);
            }

            let now = Instant::now();
            let dt = now
                .saturating_duration_since(last_frame)
                .as_secs_f32()
                .min(MAX_DT);
            last_frame = now;

            self.sim.tick(self.last_pointer, &self.layout, dt);

            if !self.render_failed {
                if let Err(e) = self.render_frame() {
                    // Degrade instead of tearing down: stop drawing and hold
                    // the simulation, keys other than freeze still work.
                    log::error!("render failed, freezing display: {e:#}");
                    self.render_failed = true;
                    self.sim.force_freeze();
                }
            }

            self.frames += 1;
            let elapsed = self.fps_timer.elapsed();
            if elapsed >= Duration::from_secs(1) {
                self.fps = self.frames as f32 / elapsed.as_secs_f32();
                self.frames = 0;
                self.fps_timer = Instant::now();
            }

            spin_sleep(frame_dt, now);
        }

        self.term.end()?;
        Ok(())
    }

    fn apply(&mut self, cmd: Command) {
        match cmd {
            Command::Quit => self.should_quit = true,
            Command::SelectLabil => self.sim.set_mode(Mode::Labil),
            Command::SelectStable => self.sim.set_mode(Mode::Stable),
            Command::Reset => self.sim.reset_grid(),
            Command::ToggleFreeze => {
                if !self.render_failed {
                    self.sim.toggle_freeze();
                }
            }
        }
    }

    fn render_frame(&mut self) -> anyhow::Result<()> {
        self.term.cur.clear();
        self.sim.grid.snapshot(&mut self.scratch);
        draw_grid(&mut self.term.cur, &self.scratch, &self.layout);
        self.draw_hud();
        self.term.present()?;
        Ok(())
    }

    fn draw_hud(&mut self) {
        let active = self
            .sim
            .tracker
            .active()
            .map(|(c, r)| format!("({c},{r})"))
            .unwrap_or_else(|| "-".into());
        let status = format!(
            " flipgrid  mode:{}  {}  t:{:>6.1}s  fps:{:>3.0}  cell:{}",
            self.sim.mode.name(),
            if self.sim.frozen() { "frozen" } else { "live  " },
            self.sim.clock.elapsed(),
            self.fps,
            active
        );
        draw_text(&mut self.term.cur, 0, 0, &status, Color::White);
        draw_text(
            &mut self.term.cur,
            0,
            1,
            " hover to flip | 1 labil  2 stable  space freeze  r reset  q quit",
            Color::DarkGrey,
        );
    }
}

pub(crate) fn run() -> anyhow::Result<()> {
    let mut app = App::init()?;
    app.run()?;
    Ok(())
}

fn spin_sleep(target: Duration, now: Instant) {
    let end = now + target;
    loop {
        let t = Instant::now();
        if t >= end {
            break;
        }
        if end - t > Duration::from_millis(2) {
            std::thread::sleep(Duration::from_millis(1));
        } else {
            std::hint::spin_loop();
        }
    }
}
