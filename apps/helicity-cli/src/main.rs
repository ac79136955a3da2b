use anyhow::Context;
use clap::{Parser, Subcommand};
use glam::Vec3;
use helicity_input::{ControlEvent, Controls, Key};
use helicity_kernel::{Tuning, World, WorldEvent};
use helicity_render::{
    DebugTextRenderer, DrawList, FrameDriver, FrameSnapshot, MAX_TIME_SCALE, MIN_TIME_SCALE, Renderer,
    ViewState,
};
use serde::Serialize;
use std::collections::BTreeMap;
use std::path::{Path, PathBuf};
use std::time::Duration;
use tracing_subscriber::EnvFilter;

/// One display refresh at 60 Hz.
const FRAME_DT: Duration = Duration::from_millis(16);

#[derive(Parser)]
#[command(name = "helicity-cli", about = "Headless runs of the helicopter and city scene")]
struct Cli {
    /// Enable verbose logging
    #[arg(short, long, global = true)]
    verbose: bool,

    /// JSON file with simulation tunables
    #[arg(long, global = true)]
    config: Option<PathBuf>,

    /// Override the number of box slots
    #[arg(long, global = true)]
    max_boxes: Option<usize>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Print version, tunables and per-frame draw counts
    Info,
    /// Climb, cruise around the city and drop boxes, then print the last frame
    Fly {
        /// Number of frames to simulate
        #[arg(short, long, default_value = "300")]
        frames: u64,
        /// Frames spent climbing before cruising
        #[arg(long, default_value = "60")]
        climb: u64,
        /// Release a box every N cruising frames (0 disables)
        #[arg(long, default_value = "60")]
        drop_every: u64,
        /// Camera key to press before flying (1-5)
        #[arg(long, default_value = "1", value_parser = clap::value_parser!(u8).range(1..=5))]
        camera: u8,
        /// Simulation steps per rendered frame
        #[arg(long, default_value = "1.0")]
        time_scale: f32,
        /// Also print a report every N frames (0 prints only the last)
        #[arg(long, default_value = "0")]
        report_every: u64,
        /// Print snapshots as JSON
        #[arg(long)]
        json: bool,
    },
    /// Drop boxes from full height and report where and when they land
    Drops {
        /// Boxes to release
        #[arg(short, long, default_value = "3")]
        count: usize,
        /// Frames between releases
        #[arg(short, long, default_value = "20")]
        interval: u64,
        /// Print the report as JSON
        #[arg(long)]
        json: bool,
    },
}

fn load_tuning(config: Option<&Path>, max_boxes: Option<usize>) -> anyhow::Result<Tuning> {
    let mut tuning = match config {
        Some(path) => Tuning::load(path).with_context(|| format!("loading {}", path.display()))?,
        None => Tuning::default(),
    };
    if let Some(n) = max_boxes {
        tuning.max_boxes = n;
        tuning.validate()?;
    }
    Ok(tuning)
}

/// World plus everything needed to render it headless.
struct Session {
    world: World,
    view: ViewState,
    controls: Controls,
    driver: FrameDriver,
    draws: DrawList,
}

impl Session {
    fn new(tuning: Tuning) -> Self {
        let world = World::new(tuning);
        let driver = FrameDriver::new(&world);
        let mut draws = DrawList::new();
        driver.init_primitives(&mut draws);
        Self {
            world,
            view: ViewState::default(),
            controls: Controls::new(),
            driver,
            draws,
        }
    }

    fn key_down(&mut self, key: Key) {
        let action = self
            .controls
            .apply(ControlEvent::KeyDown(key), &mut self.world, &mut self.view);
        tracing::debug!(key = key.name(), ?action, "key down");
    }

    fn key_up(&mut self, key: Key) {
        self.controls
            .apply(ControlEvent::KeyUp(key), &mut self.world, &mut self.view);
    }

    fn frame(&mut self) {
        self.driver
            .render_frame(&mut self.world, &self.view, FRAME_DT, &mut self.draws);
    }

    fn snapshot(&self) -> FrameSnapshot {
        FrameSnapshot::capture(&self.world, &self.view, &self.draws)
    }
}

fn print_snapshot(snapshot: &FrameSnapshot, json: bool) -> anyhow::Result<()> {
    if json {
        println!("{}", serde_json::to_string(snapshot)?);
    } else {
        print!("{}", DebugTextRenderer::new().render(snapshot));
    }
    Ok(())
}

#[derive(Debug, Serialize)]
struct DropRecord {
    slot: usize,
    released_frame: u64,
    origin: [f32; 3],
    landed_frame: Option<u64>,
    landed_at: Option<[f32; 3]>,
    drift: f32,
    expired_frame: Option<u64>,
}

fn run_drops(session: &mut Session, count: usize, interval: u64) -> Vec<DropRecord> {
    let tuning = session.world.tuning().clone();
    session.key_down(Key::ArrowUp);
    while session.world.helicopter().height < tuning.max_height {
        session.frame();
    }
    session.key_up(Key::ArrowUp);
    session.key_down(Key::ArrowLeft);
    session.world.drain_events();

    let mut records: Vec<DropRecord> = Vec::new();
    // slot -> index into records, for boxes in flight
    let mut live: BTreeMap<usize, usize> = BTreeMap::new();
    let mut since_release = interval;
    let mut released = 0;
    // Stop once every released box has expired, with a hard cap.
    let limit = session.world.frame() + (count as u64 + 1) * interval.max(1) + 1000;

    while session.world.frame() < limit {
        if released < count && since_release >= interval {
            session.key_down(Key::Space);
            since_release = 0;
        }
        since_release += 1;
        session.frame();
        let frame = session.world.frame();

        for event in session.world.drain_events() {
            match event {
                WorldEvent::BoxReleased { slot, origin } => {
                    released += 1;
                    live.insert(slot, records.len());
                    records.push(DropRecord {
                        slot,
                        released_frame: frame,
                        origin: origin.to_array(),
                        landed_frame: None,
                        landed_at: None,
                        drift: 0.0,
                        expired_frame: None,
                    });
                }
                WorldEvent::BoxExpired { slot } => {
                    if let Some(i) = live.remove(&slot) {
                        records[i].expired_frame = Some(frame);
                    }
                }
                WorldEvent::ReleaseRejected { outcome } => {
                    tracing::warn!(?outcome, "release rejected");
                    released += 1;
                }
                WorldEvent::CapacityChanged { .. } => {}
            }
        }

        for (&slot, &i) in &live {
            let record = &mut records[i];
            if record.landed_frame.is_some() {
                continue;
            }
            let Some(b) = session.world.boxes().get(slot) else {
                continue;
            };
            if b.is_resting(&tuning) {
                let at = b.position();
                record.landed_frame = Some(frame);
                record.landed_at = Some(at.to_array());
                record.drift = Vec3::new(at.x, 0.0, at.z).distance(Vec3::new(
                    record.origin[0],
                    0.0,
                    record.origin[2],
                ));
            }
        }

        if released >= count && live.is_empty() {
            break;
        }
    }
    records
}

fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    let filter = if cli.verbose { "debug" } else { "info" };
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::new(filter))
        .with_writer(std::io::stderr)
        .init();

    let tuning = load_tuning(cli.config.as_deref(), cli.max_boxes)?;

    match cli.command {
        Commands::Info => {
            println!("helicity-cli v{}", env!("CARGO_PKG_VERSION"));
            println!("tuning: {}", tuning.to_json_pretty()?);

            let mut session = Session::new(tuning);
            session.frame();
            let snapshot = session.snapshot();
            println!("draws per frame (landed, no boxes): {}", snapshot.total_draws());
            for (name, n) in &snapshot.draws {
                println!("  {name}: {n}");
            }
        }
        Commands::Fly {
            frames,
            climb,
            drop_every,
            camera,
            time_scale,
            report_every,
            json,
        } => {
            let mut session = Session::new(tuning);
            session.view.time_scale = time_scale.clamp(MIN_TIME_SCALE, MAX_TIME_SCALE);
            session.key_down(Key::Digit(camera));
            session.key_down(Key::ArrowUp);

            for i in 1..=frames {
                if i == climb + 1 {
                    session.key_up(Key::ArrowUp);
                    session.key_down(Key::ArrowLeft);
                }
                if i > climb && drop_every > 0 && (i - climb) % drop_every == 0 {
                    session.key_down(Key::Space);
                }
                session.frame();
                if report_every > 0 && i % report_every == 0 && i != frames {
                    print_snapshot(&session.snapshot(), json)?;
                }
            }
            print_snapshot(&session.snapshot(), json)?;
        }
        Commands::Drops {
            count,
            interval,
            json,
        } => {
            let mut session = Session::new(tuning);
            let records = run_drops(&mut session, count, interval);

            if json {
                println!("{}", serde_json::to_string_pretty(&records)?);
            } else {
                println!("{} boxes released", records.len());
                for r in &records {
                    let landed = match (r.landed_frame, r.landed_at) {
                        (Some(f), Some(p)) => {
                            format!("landed frame {f} at ({:.2}, {:.2}, {:.2})", p[0], p[1], p[2])
                        }
                        _ => "never landed".to_string(),
                    };
                    let expired = r
                        .expired_frame
                        .map_or_else(|| "still active".to_string(), |f| format!("expired frame {f}"));
                    println!(
                        "  [{}] released frame {} from height {:.2}, {landed}, drift {:.2}, {expired}",
                        r.slot, r.released_frame, r.origin[1], r.drift
                    );
                }
            }
        }
    }

    Ok(())
}
