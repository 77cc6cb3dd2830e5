#![deny(
    unsafe_code,
    missing_docs,
    dead_code,
    unused_results,
    non_snake_case,
    unreachable_pub
)]

//! Shared rendering contracts for Revolution adapters.
//!
//! Backends never read the world directly. The driving loop composes a
//! [`Scene`] from query views after each pass and hands it to a
//! [`RenderingBackend`], so any backend (terminal, graphical) presents the
//! same deterministic projection of the simulation.

use anyhow::Result as AnyResult;
use glam::Vec2;
use revolution_core::{Event, RingIndex, FAST_REVS_PER_SEC};
use revolution_world::query::RingView;

/// RGBA color used when presenting frames.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct Color {
    /// Red channel intensity in the range 0.0..=1.0.
    pub red: f32,
    /// Green channel intensity in the range 0.0..=1.0.
    pub green: f32,
    /// Blue channel intensity in the range 0.0..=1.0.
    pub blue: f32,
    /// Alpha channel intensity in the range 0.0..=1.0.
    pub alpha: f32,
}

impl Color {
    /// Creates a new color from floating point channels.
    #[must_use]
    pub const fn new(red: f32, green: f32, blue: f32, alpha: f32) -> Self {
        Self {
            red,
            green,
            blue,
            alpha,
        }
    }

    /// Creates an opaque color from a hue angle in degrees at full
    /// saturation and value.
    #[must_use]
    pub fn from_hue(hue_degrees: f32) -> Self {
        let hue = hue_degrees.rem_euclid(360.0) / 60.0;
        let x = 1.0 - (hue % 2.0 - 1.0).abs();
        let (red, green, blue) = match hue as u32 {
            0 => (1.0, x, 0.0),
            1 => (x, 1.0, 0.0),
            2 => (0.0, 1.0, x),
            3 => (0.0, x, 1.0),
            4 => (x, 0.0, 1.0),
            _ => (1.0, 0.0, x),
        };
        Self {
            red,
            green,
            blue,
            alpha: 1.0,
        }
    }
}

/// Declarative description of a single ring track and its moving dot.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct RingSprite {
    /// Ring the sprite visualises.
    pub ring: RingIndex,
    /// Position of the moving dot in world units relative to the center.
    pub dot_position: Vec2,
    /// Track radius in world units.
    pub radius: f32,
    /// Track color, spread across the hue wheel by ring index.
    pub color: Color,
    /// Above a presentation threshold the dot is replaced by a solid band;
    /// individual positions are meaningless at that angular speed.
    pub solid_band: bool,
}

/// Transient flash emitted when a ring banks revolutions this pass.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct RewardPulse {
    /// Ring that completed the revolutions.
    pub ring: RingIndex,
    /// Revolutions banked in the pass that produced this pulse.
    pub revolutions: u64,
}

/// Complete frame description handed to a rendering backend.
#[derive(Clone, Debug, PartialEq, Default)]
pub struct Scene {
    /// Ring sprites ordered innermost first.
    pub rings: Vec<RingSprite>,
    /// Reward pulses produced by the pass this frame projects.
    pub pulses: Vec<RewardPulse>,
}

/// Composes a scene from the ring view and the pass's events.
///
/// `center` is the clock's center in the backend's world units; dot
/// positions are offsets from it using the standard mathematical
/// orientation (angle zero pointing right, counter-clockwise positive).
#[must_use]
pub fn compose_scene(center: Vec2, rings: &RingView, events: &[Event]) -> Scene {
    let sprites = rings
        .iter()
        .map(|snapshot| {
            let radius = snapshot.ring.radius() as f32;
            let offset = Vec2::new(
                snapshot.angle.cos() as f32,
                snapshot.angle.sin() as f32,
            ) * radius;
            RingSprite {
                ring: snapshot.ring,
                dot_position: center + offset,
                radius,
                color: Color::from_hue(f32::from(snapshot.ring.get()) * 40.0),
                solid_band: snapshot.revolutions_per_second > FAST_REVS_PER_SEC,
            }
        })
        .collect();

    let pulses = events
        .iter()
        .filter_map(|event| match event {
            Event::RevolutionCompleted { ring, revolutions } => Some(RewardPulse {
                ring: *ring,
                revolutions: *revolutions,
            }),
            _ => None,
        })
        .collect();

    Scene {
        rings: sprites,
        pulses,
    }
}

/// Contract implemented by presentation backends.
pub trait RenderingBackend {
    /// Presents a composed scene, returning an error when the sink fails.
    fn present(&mut self, scene: &Scene) -> AnyResult<()>;
}

#[cfg(test)]
mod tests {
    use super::*;
    use revolution_core::Command;
    use revolution_world::{apply, query, World};
    use std::time::Duration;

    fn ticked_world(dt: Duration) -> (World, Vec<Event>) {
        let mut world = World::new();
        let mut events = Vec::new();
        apply(&mut world, Command::Tick { dt }, &mut events);
        (world, events)
    }

    #[test]
    fn scene_contains_one_sprite_per_ring() {
        let (world, events) = ticked_world(Duration::from_millis(100));
        let scene = compose_scene(Vec2::ZERO, &query::ring_view(&world), &events);
        assert_eq!(scene.rings.len(), 9);
        assert!(scene.rings[0].radius < scene.rings[8].radius);
    }

    #[test]
    fn dots_sit_on_their_track_radius() {
        let (world, events) = ticked_world(Duration::from_millis(700));
        let center = Vec2::new(120.0, 80.0);
        let scene = compose_scene(center, &query::ring_view(&world), &events);
        for sprite in &scene.rings {
            let distance = (sprite.dot_position - center).length();
            assert!(
                (distance - sprite.radius).abs() < 1e-3,
                "dot off track for ring {:?}",
                sprite.ring
            );
        }
    }

    #[test]
    fn slow_rings_are_not_rendered_as_bands() {
        let (world, events) = ticked_world(Duration::from_millis(100));
        let scene = compose_scene(Vec2::ZERO, &query::ring_view(&world), &events);
        // At level 0 the inner ring turns at half a revolution per second.
        assert!(scene.rings.iter().all(|sprite| !sprite.solid_band));
    }

    #[test]
    fn reward_pulses_mirror_revolution_events() {
        let (world, events) = ticked_world(Duration::from_millis(4_300));
        let scene = compose_scene(Vec2::ZERO, &query::ring_view(&world), &events);
        assert_eq!(
            scene.pulses,
            vec![RewardPulse {
                ring: RingIndex::new(0).expect("ring 0"),
                revolutions: 2,
            }],
        );
    }
}
