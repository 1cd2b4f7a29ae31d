//! Routing between arbitrary coordinates.
//!
//! Each query point snaps to the nearest arc within tolerance. The arc endpoint
//! nearer the projected foot becomes the entry (or exit) node, the node-to-node
//! search runs between those, and the two feet are spliced onto the result as
//! synthetic waypoints. If the search already traverses the snapped arc, the
//! partial length from the endpoint to the foot is subtracted and the endpoint
//! is replaced by the foot; otherwise the partial length is added.

use super::{solve_between_indices, Route, Waypoint};
use crate::config::SearchConfig;
use crate::error::{GraphError, Result};
use crate::geometry::{self, Coordinate};
use crate::graph::Network;
use crate::matrix::NeighborMatrix;
use crate::spatial;
use log::debug;

/// A query point snapped onto an arc.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Snap {
    /// Arena index of the arc
    pub arc: usize,
    /// Perpendicular foot on the arc, clamped to the segment
    pub foot: Coordinate,
    /// Arena index of the arc endpoint nearer the foot
    pub node: usize,
    /// Distance from `node` to `foot` along the arc
    pub partial: f64,
}

/// Snap `at` onto the nearest arc within `tolerance`.
pub fn snap_to_arc(network: &Network, at: &Coordinate, tolerance: f64) -> Option<Snap> {
    let system = network.config().coordinate_system;
    let candidates = network.spatial_index().arc_candidates(system, at, tolerance);

    let (arc_index, _) = spatial::closest_within(candidates, tolerance, |i| {
        let arc = network.arcs().get(i)?;
        let (a, b) = arc.geometry?;
        network.node_index(arc.start)?;
        network.node_index(arc.end)?;
        Some(spatial::arc_distance(system, at, &a, &b))
    })?;

    let arc = &network.arcs()[arc_index];
    let (a, b) = arc.geometry?;
    let (foot, _) = geometry::project_onto_segment(at, &a, &b);
    let to_start = geometry::distance(system, &foot, &a);
    let to_end = geometry::distance(system, &foot, &b);
    let (node_id, partial) = if to_start <= to_end {
        (arc.start, to_start)
    } else {
        (arc.end, to_end)
    };

    Some(Snap {
        arc: arc_index,
        foot,
        node: network.node_index(node_id)?,
        partial,
    })
}

/// Route between two coordinates.
///
/// Returns [`Route::not_found`] when either point has no arc within tolerance
/// or the snapped nodes are disconnected.
pub(crate) fn solve_between_points(
    network: &Network,
    matrix: &NeighborMatrix,
    start: &Coordinate,
    end: &Coordinate,
    search: &SearchConfig,
) -> Result<Route> {
    if !(search.tolerance >= 0.0) {
        return Err(GraphError::invalid(format!(
            "snap tolerance must be >= 0, got {}",
            search.tolerance
        )));
    }
    let (Some(from), Some(to)) = (
        snap_to_arc(network, start, search.tolerance),
        snap_to_arc(network, end, search.tolerance),
    ) else {
        debug!("No arc within {} of a query point", search.tolerance);
        return Ok(Route::not_found());
    };

    if from.arc == to.arc {
        let system = network.config().coordinate_system;
        return Ok(Route {
            waypoints: vec![Waypoint::synthetic(from.foot), Waypoint::synthetic(to.foot)],
            arcs: vec![from.arc],
            impedance: geometry::distance(system, &from.foot, &to.foot),
            exists: true,
        });
    }

    let route = solve_between_indices(network, matrix, from.node, to.node, search.algorithm)?;
    if !route.exists {
        return Ok(route);
    }
    Ok(splice(route, &from, &to))
}

fn splice(mut route: Route, from: &Snap, to: &Snap) -> Route {
    if route.arcs.first() == Some(&from.arc) {
        route.impedance -= from.partial;
        route.waypoints[0] = Waypoint::synthetic(from.foot);
    } else {
        route.impedance += from.partial;
        route.waypoints.insert(0, Waypoint::synthetic(from.foot));
        route.arcs.insert(0, from.arc);
    }

    if route.arcs.last() == Some(&to.arc) {
        route.impedance -= to.partial;
        if let Some(last) = route.waypoints.last_mut() {
            *last = Waypoint::synthetic(to.foot);
        }
    } else {
        route.impedance += to.partial;
        route.waypoints.push(Waypoint::synthetic(to.foot));
        route.arcs.push(to.arc);
    }
    route
}
