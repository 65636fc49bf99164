//! Clearance-guarded random walk
//!
//! Each iteration tries one checked forward step. When the strip ahead
//! leaves the street, uniformly random turn angles are sampled until one
//! gives a clear heading; the robot turns by it and steps again. Nothing
//! guarantees progress, so the number of samples per obstruction is capped.

use crate::driver::MotionDriver;
use crate::error::{NavError, Result};
use crate::geometry::normalize_angle;
use chakra_io::{Actuator, FrameSource};
use rand::Rng;

/// Summary of a finished walk
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct WalkReport {
    /// Forward steps taken
    pub steps: u32,
    /// Evasive turns made
    pub turns: u32,
}

/// Wander along the street for `iterations` steps of `step_duration` seconds
pub fn random_walk<A, F, R>(
    driver: &mut MotionDriver<A, F>,
    iterations: u32,
    step_duration: f32,
    max_heading_samples: u32,
    rng: &mut R,
) -> Result<WalkReport>
where
    A: Actuator,
    F: FrameSource,
    R: Rng + ?Sized,
{
    let mut report = WalkReport::default();
    let step_distance = driver
        .calibration()
        .distance_for_duration(step_duration, driver.motion().speed) as f32;

    for i in 0..iterations {
        while !try_step(driver, step_duration)? {
            let heading = driver.estimator().heading();
            let angle = find_clear_turn(driver, heading, step_distance, max_heading_samples, rng)?
                .ok_or_else(|| {
                    tracing::warn!(
                        "No clear heading after {} samples, giving up",
                        max_heading_samples
                    );
                    NavError::ObstacleAhead {
                        heading,
                        distance: step_distance,
                    }
                })?;

            driver.turn(angle)?;
            report.turns += 1;
        }
        report.steps += 1;
        tracing::debug!(
            "Walk step {}/{} heading {:.0}°",
            i + 1,
            iterations,
            driver.estimator().heading()
        );
    }

    tracing::info!(
        "Random walk finished: {} steps, {} evasive turns",
        report.steps,
        report.turns
    );
    Ok(report)
}

/// Checked forward step; `false` when the way is blocked
fn try_step<A: Actuator, F: FrameSource>(
    driver: &mut MotionDriver<A, F>,
    step_duration: f32,
) -> Result<bool> {
    match driver.forward(driver.forward_move(step_duration).checked()) {
        Ok(_) => Ok(true),
        Err(NavError::ObstacleAhead { .. }) => Ok(false),
        Err(e) => Err(e),
    }
}

fn find_clear_turn<A, F, R>(
    driver: &MotionDriver<A, F>,
    heading: f32,
    distance: f32,
    max_samples: u32,
    rng: &mut R,
) -> Result<Option<f32>>
where
    A: Actuator,
    F: FrameSource,
    R: Rng + ?Sized,
{
    for _ in 0..max_samples {
        let angle = rng.gen_range(-180..=180) as f32;
        let candidate = normalize_angle(heading + angle);
        if driver.path_clear(candidate, distance)? {
            tracing::debug!("Heading {:.0}° is clear, turning {:.0}°", candidate, angle);
            return Ok(Some(angle));
        }
    }
    Ok(None)
}
