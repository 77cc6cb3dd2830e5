#![deny(
    unsafe_code,
    missing_docs,
    dead_code,
    unused_results,
    non_snake_case,
    unreachable_pub
)]

//! Command-line adapter that drives the Revolution progression engine.
//!
//! The binary owns the scheduling loop: it loads a save if one exists,
//! advances the world at a fixed cadence, runs the automation system after
//! every tick, reports milestones, and writes the save back when the run
//! ends.

mod save_file;

use std::{fs, path::PathBuf, time::Duration};

use anyhow::{Context, Result};
use clap::Parser;
use glam::Vec2;
use revolution_core::{Command, Event};
use revolution_rendering::{compose_scene, RenderingBackend, Scene};
use revolution_system_automation::Automation;
use revolution_world::{self as world, query, World};

/// Command-line options controlling a simulation run.
#[derive(Debug, Parser)]
#[command(name = "revolution", about = "Drives the Revolution progression engine")]
struct Args {
    /// Number of scheduler passes to simulate before exiting.
    #[arg(long, default_value_t = 600)]
    ticks: u32,

    /// Milliseconds of simulated time advanced per pass.
    #[arg(long, default_value_t = 100)]
    tick_ms: u64,

    /// Path of the save file to load and update.
    #[arg(long, default_value = "revolution.save")]
    save: PathBuf,

    /// Forces the auto-buy toggle on for this run.
    #[arg(long)]
    auto_buy: bool,

    /// Forces the auto-promote toggle on for this run.
    #[arg(long)]
    auto_promo: bool,
}

/// Entry point for the Revolution command-line interface.
fn main() -> Result<()> {
    let args = Args::parse();
    run(&args)
}

fn run(args: &Args) -> Result<()> {
    let mut world = load_world(args);
    let mut automation = Automation::new();
    let mut backend = TextBackend::default();
    let dt = Duration::from_millis(args.tick_ms);

    apply_startup_toggles(&mut world, args);

    for _ in 0..args.ticks {
        let mut events = Vec::new();
        world::apply(&mut world, Command::Tick { dt }, &mut events);

        let mut commands = Vec::new();
        automation.handle(
            &events,
            &query::progress(&world),
            &query::ring_view(&world),
            &query::skill_levels(&world),
            &mut commands,
        );
        for command in commands {
            world::apply(&mut world, command, &mut events);
        }

        report_milestones(&events);
        let scene = compose_scene(Vec2::ZERO, &query::ring_view(&world), &events);
        backend
            .present(&scene)
            .context("presenting the frame failed")?;

        // Persist after every applied batch so an interrupted run loses at
        // most one pass of progress.
        let encoded = save_file::encode(&query::snapshot(&world));
        fs::write(&args.save, encoded)
            .with_context(|| format!("writing save file {}", args.save.display()))?;
    }

    let progress = query::progress(&world);
    println!(
        "final score {:.2}, prestige points {:.0}, promotion level {}, infinity points {}",
        progress.score, progress.prestige_points, progress.promotion_level, progress.infinity_points
    );
    Ok(())
}

/// Loads the saved world, falling back to a fresh one when the save file is
/// absent or unreadable. A corrupt save is reported but never fatal.
fn load_world(args: &Args) -> World {
    let Ok(contents) = fs::read_to_string(&args.save) else {
        return World::new();
    };
    match save_file::decode(&contents) {
        Ok(snapshot) => World::from_snapshot(snapshot),
        Err(error) => {
            eprintln!(
                "ignoring save file {}: {error}",
                args.save.display()
            );
            World::new()
        }
    }
}

fn apply_startup_toggles(world: &mut World, args: &Args) {
    let mut events = Vec::new();
    if args.auto_buy {
        world::apply(world, Command::SetAutoBuy { enabled: true }, &mut events);
    }
    if args.auto_promo {
        world::apply(world, Command::SetAutoPromo { enabled: true }, &mut events);
    }
}

fn report_milestones(events: &[Event]) {
    for event in events {
        match event {
            Event::PrestigePerformed { gain, total_points } => {
                println!("prestige: +{gain:.0} points ({total_points:.0} total)");
            }
            Event::PromotionPerformed { level } => {
                println!("promotion reached level {level}");
            }
            Event::InfinityReached { infinity_points } => {
                println!("infinity reached, {infinity_points} points banked");
            }
            _ => {}
        }
    }
}

/// Text backend that prints a one-line summary of each composed frame.
#[derive(Debug, Default)]
struct TextBackend {
    frames: u64,
}

impl RenderingBackend for TextBackend {
    fn present(&mut self, scene: &Scene) -> Result<()> {
        self.frames += 1;
        if scene.pulses.is_empty() {
            return Ok(());
        }
        let summary = scene
            .pulses
            .iter()
            .map(|pulse| format!("ring {} x{}", pulse.ring.get(), pulse.revolutions))
            .collect::<Vec<_>>()
            .join(", ");
        println!("frame {}: {summary}", self.frames);
        Ok(())
    }
}
