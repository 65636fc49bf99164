//! Waypoint navigation on the street graph
//!
//! Route following is a bounded pursuit per waypoint:
//!
//! ```text
//! APPROACHING ──distance <= tolerance──────────────> ARRIVED
//!      │ ▲
//!      └─┘ distance > tolerance, attempts < max: drive towards, attempts += 1
//! APPROACHING ──attempts >= max, still outside──────> RETRY_EXHAUSTED
//! ```

use super::{ExhaustedPolicy, RouteReport, WaypointDriver, WaypointOutcome};
use crate::config::NavigationConfig;
use crate::driver::MotionDriver;
use crate::error::{NavError, Result};
use crate::geometry::PixelPoint;
use crate::graph::{Route, StreetGraph, Waypoint};
use chakra_io::{Actuator, FrameSource};

/// Route planner and follower
pub struct Navigator {
    graph: StreetGraph,
    config: NavigationConfig,
}

impl Navigator {
    pub fn new(graph: StreetGraph, config: NavigationConfig) -> Self {
        Self { graph, config }
    }

    pub fn graph(&self) -> &StreetGraph {
        &self.graph
    }

    pub fn config(&self) -> &NavigationConfig {
        &self.config
    }

    /// Shortest route between the nodes nearest to `current` and `destination`
    pub fn plan_route(&self, current: PixelPoint, destination: PixelPoint) -> Result<Route> {
        let start = self
            .graph
            .nearest_node(current)
            .ok_or_else(|| NavError::Graph("Street graph has no nodes".to_string()))?;
        let goal = self
            .graph
            .nearest_node(destination)
            .ok_or_else(|| NavError::Graph("Street graph has no nodes".to_string()))?;

        let route = self.graph.shortest_path(start.id, goal.id).inspect_err(|e| {
            tracing::error!("Route planning from {} to {} failed: {}", current, destination, e);
        })?;

        tracing::info!(
            "Route planned from node {} to node {}: {} waypoints, weight {:.1}",
            start.id,
            goal.id,
            route.waypoints.len(),
            route.total_weight
        );
        Ok(route)
    }

    /// Pursue every waypoint of `route` in order
    pub fn follow_route<D: WaypointDriver>(
        &self,
        driver: &mut D,
        route: &Route,
    ) -> Result<RouteReport> {
        let mut report = RouteReport::default();

        for waypoint in &route.waypoints {
            let outcome = self.pursue(driver, waypoint)?;

            if let WaypointOutcome::RetryExhausted { attempts, distance } = outcome {
                tracing::warn!(
                    "Waypoint {} not reached after {} attempts ({:.1}px away)",
                    waypoint.node_id,
                    attempts,
                    distance
                );
                if self.config.exhausted_policy == ExhaustedPolicy::Abort {
                    return Err(NavError::WaypointRetryExhausted {
                        node: waypoint.node_id,
                        attempts,
                        distance,
                    });
                }
            }

            report.legs.push((*waypoint, outcome));
        }

        tracing::info!(
            "Route finished: {}/{} waypoints reached",
            report.legs.iter().filter(|(_, o)| o.is_arrived()).count(),
            report.legs.len()
        );
        Ok(report)
    }

    /// Plan from the current position to the node nearest `(x, y)` and follow it
    pub fn navigate_to<D: WaypointDriver>(
        &self,
        driver: &mut D,
        x: i32,
        y: i32,
    ) -> Result<RouteReport> {
        let current = driver.position().ok_or(NavError::PositionUnresolved)?;
        let route = self.plan_route(current, PixelPoint::new(x, y))?;
        self.follow_route(driver, &route)
    }

    fn pursue<D: WaypointDriver>(&self, driver: &mut D, waypoint: &Waypoint) -> Result<WaypointOutcome> {
        let target = PixelPoint::new(waypoint.x, waypoint.y);
        let mut attempts = 0;

        loop {
            let position = driver.position().ok_or(NavError::PositionUnresolved)?;
            let distance = position.distance_to(target);

            if distance <= self.config.waypoint_tolerance {
                tracing::info!(
                    "Arrived at waypoint {} {} ({:.1}px, {} attempts)",
                    waypoint.node_id,
                    target,
                    distance,
                    attempts
                );
                return Ok(WaypointOutcome::Arrived { attempts, distance });
            }
            if attempts >= self.config.max_attempts {
                return Ok(WaypointOutcome::RetryExhausted { attempts, distance });
            }

            tracing::debug!(
                "Approaching waypoint {} {}, {:.1}px away (attempt {})",
                waypoint.node_id,
                target,
                distance,
                attempts + 1
            );
            driver.drive_towards(waypoint.x, waypoint.y)?;
            attempts += 1;
        }
    }
}

impl<A: Actuator, F: FrameSource> WaypointDriver for MotionDriver<A, F> {
    fn position(&self) -> Option<PixelPoint> {
        self.estimator().position()
    }

    fn drive_towards(&mut self, x: i32, y: i32) -> Result<f32> {
        MotionDriver::drive_towards(self, x, y)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::graph::{GraphEdge, GraphNode};
    use std::collections::VecDeque;

    /// Driver whose position follows a fixed script, one entry per drive
    struct ScriptedDriver {
        position: Option<PixelPoint>,
        script: VecDeque<PixelPoint>,
        drives: Vec<(i32, i32)>,
        fail_after: Option<usize>,
    }

    impl ScriptedDriver {
        fn new(start: PixelPoint, script: &[PixelPoint]) -> Self {
            Self {
                position: Some(start),
                script: script.iter().copied().collect(),
                drives: Vec::new(),
                fail_after: None,
            }
        }
    }

    impl WaypointDriver for ScriptedDriver {
        fn position(&self) -> Option<PixelPoint> {
            self.position
        }

        fn drive_towards(&mut self, x: i32, y: i32) -> Result<f32> {
            if self.fail_after == Some(self.drives.len()) {
                return Err(NavError::Actuator(chakra_io::Error::Disconnected(
                    "link lost".to_string(),
                )));
            }
            self.drives.push((x, y));
            if let Some(next) = self.script.pop_front() {
                self.position = Some(next);
            }
            let p = self.position.unwrap_or_default();
            Ok(p.distance_to(PixelPoint::new(x, y)))
        }
    }

    fn graph() -> StreetGraph {
        let nodes = vec![
            GraphNode { id: 1, x: 0, y: 0 },
            GraphNode { id: 2, x: 100, y: 0 },
            GraphNode { id: 3, x: 100, y: 100 },
            GraphNode { id: 4, x: 400, y: 400 },
        ];
        let edges = [
            GraphEdge { from: 1, to: 2, weight: None },
            GraphEdge { from: 2, to: 3, weight: None },
        ];
        StreetGraph::from_parts(nodes, &edges, false).unwrap()
    }

    fn navigator(policy: ExhaustedPolicy) -> Navigator {
        let config = NavigationConfig {
            exhausted_policy: policy,
            ..Default::default()
        };
        Navigator::new(graph(), config)
    }

    fn single(x: i32, y: i32) -> Route {
        Route {
            waypoints: vec![Waypoint { node_id: 9, x, y }],
            total_weight: 0.0,
        }
    }

    #[test]
    fn test_plan_route_snaps_to_nearest_nodes() {
        let nav = navigator(ExhaustedPolicy::Skip);
        let route = nav
            .plan_route(PixelPoint::new(5, 8), PixelPoint::new(110, 95))
            .unwrap();
        assert_eq!(route.node_ids(), vec![1, 2, 3]);
        assert_eq!(route.total_weight, 200.0);

        assert!(matches!(
            nav.plan_route(PixelPoint::new(0, 0), PixelPoint::new(390, 390)),
            Err(NavError::NoPathFound { from: 1, to: 4 })
        ));
    }

    #[test]
    fn test_retry_exhausted_after_exactly_two_attempts() {
        let nav = navigator(ExhaustedPolicy::Skip);
        // 100 -> 40 -> 25, never within 20
        let mut driver = ScriptedDriver::new(
            PixelPoint::new(100, 0),
            &[PixelPoint::new(40, 0), PixelPoint::new(25, 0), PixelPoint::new(0, 0)],
        );

        let report = nav.follow_route(&mut driver, &single(0, 0)).unwrap();
        assert_eq!(driver.drives.len(), 2);
        assert_eq!(
            report.last(),
            Some(WaypointOutcome::RetryExhausted {
                attempts: 2,
                distance: 25.0
            })
        );
        assert!(!report.all_arrived());
    }

    #[test]
    fn test_arrival_within_tolerance() {
        let nav = navigator(ExhaustedPolicy::Skip);
        let mut driver = ScriptedDriver::new(PixelPoint::new(100, 0), &[PixelPoint::new(15, 0)]);

        let report = nav.follow_route(&mut driver, &single(0, 0)).unwrap();
        assert_eq!(
            report.last(),
            Some(WaypointOutcome::Arrived {
                attempts: 1,
                distance: 15.0
            })
        );

        // Already there: no drive at all
        let mut parked = ScriptedDriver::new(PixelPoint::new(20, 0), &[]);
        let report = nav.follow_route(&mut parked, &single(0, 0)).unwrap();
        assert!(report.all_arrived());
        assert!(parked.drives.is_empty());
    }

    #[test]
    fn test_skip_policy_continues_with_next_waypoint() {
        let nav = navigator(ExhaustedPolicy::Skip);
        let route = Route {
            waypoints: vec![
                Waypoint { node_id: 1, x: 0, y: 0 },
                Waypoint { node_id: 2, x: 300, y: 0 },
            ],
            total_weight: 300.0,
        };
        let mut driver = ScriptedDriver::new(
            PixelPoint::new(100, 0),
            &[PixelPoint::new(60, 0), PixelPoint::new(50, 0), PixelPoint::new(290, 0)],
        );

        let report = nav.follow_route(&mut driver, &route).unwrap();
        assert_eq!(report.legs.len(), 2);
        assert!(!report.legs[0].1.is_arrived());
        assert!(report.legs[1].1.is_arrived());
        assert_eq!(report.exhausted().map(|w| w.node_id).collect::<Vec<_>>(), vec![1]);
    }

    #[test]
    fn test_abort_policy_stops_route() {
        let nav = navigator(ExhaustedPolicy::Abort);
        let route = Route {
            waypoints: vec![
                Waypoint { node_id: 1, x: 0, y: 0 },
                Waypoint { node_id: 2, x: 300, y: 0 },
            ],
            total_weight: 300.0,
        };
        let mut driver = ScriptedDriver::new(
            PixelPoint::new(100, 0),
            &[PixelPoint::new(60, 0), PixelPoint::new(50, 0)],
        );

        let err = nav.follow_route(&mut driver, &route).unwrap_err();
        assert!(matches!(
            err,
            NavError::WaypointRetryExhausted {
                node: 1,
                attempts: 2,
                ..
            }
        ));
        assert_eq!(driver.drives, vec![(0, 0), (0, 0)]);
    }

    #[test]
    fn test_actuator_failure_aborts() {
        let nav = navigator(ExhaustedPolicy::Skip);
        let mut driver = ScriptedDriver::new(PixelPoint::new(100, 0), &[]);
        driver.fail_after = Some(0);

        assert!(matches!(
            nav.follow_route(&mut driver, &single(0, 0)),
            Err(NavError::Actuator(_))
        ));
    }

    #[test]
    fn test_unresolved_position() {
        let nav = navigator(ExhaustedPolicy::Skip);
        let mut driver = ScriptedDriver::new(PixelPoint::new(0, 0), &[]);
        driver.position = None;

        assert!(matches!(
            nav.navigate_to(&mut driver, 100, 100),
            Err(NavError::PositionUnresolved)
        ));
    }

    #[test]
    fn test_navigate_to_follows_planned_route() {
        let nav = navigator(ExhaustedPolicy::Skip);
        let mut driver = ScriptedDriver::new(
            PixelPoint::new(3, 4),
            &[PixelPoint::new(98, 2), PixelPoint::new(101, 97)],
        );

        let report = nav.navigate_to(&mut driver, 120, 120).unwrap();
        assert!(report.all_arrived());
        assert_eq!(driver.drives, vec![(100, 0), (100, 100)]);
    }
}
