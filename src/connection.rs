//! Connection derivation
//!
//! A connection is declared as a line between two component points. Every
//! grid point on that line becomes a terminal the document model can wire
//! to. Edge terminals are the ends of the line that may chain directly onto
//! another component.

use std::collections::HashSet;
use std::fmt;
use std::ops::{BitOr, BitOrAssign};

use glam::{DVec2, dvec2};

use crate::condition::{ConditionContext, ConditionTree};
use crate::log::{debug, warn};
use crate::point::ComponentPoint;
use crate::types::{GridSize, LayoutInformation, LayoutOptions};

/// Name given to connections declared without one.
pub const DEFAULT_CONNECTION_NAME: &str = "#";

/// Which ends of a connection line are edge terminals.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum ConnectionEdge {
    #[default]
    None,
    Start,
    End,
    Both,
}

impl ConnectionEdge {
    pub fn from_token(token: &str) -> Option<ConnectionEdge> {
        match token.trim().to_ascii_lowercase().as_str() {
            "" | "none" => Some(ConnectionEdge::None),
            "start" => Some(ConnectionEdge::Start),
            "end" => Some(ConnectionEdge::End),
            "both" => Some(ConnectionEdge::Both),
            _ => None,
        }
    }

    fn includes_start(self) -> bool {
        matches!(self, ConnectionEdge::Start | ConnectionEdge::Both)
    }

    fn includes_end(self) -> bool {
        matches!(self, ConnectionEdge::End | ConnectionEdge::Both)
    }
}

/// Properties of a derived terminal.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Default)]
pub struct ConnectionFlags(u8);

impl ConnectionFlags {
    pub const NONE: ConnectionFlags = ConnectionFlags(0);
    pub const EDGE: ConnectionFlags = ConnectionFlags(1);
    pub const HORIZONTAL: ConnectionFlags = ConnectionFlags(1 << 1);
    pub const VERTICAL: ConnectionFlags = ConnectionFlags(1 << 2);

    pub fn contains(self, other: ConnectionFlags) -> bool {
        self.0 & other.0 == other.0
    }

    pub fn is_edge(self) -> bool {
        self.contains(ConnectionFlags::EDGE)
    }
}

impl BitOr for ConnectionFlags {
    type Output = ConnectionFlags;

    fn bitor(self, rhs: ConnectionFlags) -> ConnectionFlags {
        ConnectionFlags(self.0 | rhs.0)
    }
}

impl BitOrAssign for ConnectionFlags {
    fn bitor_assign(&mut self, rhs: ConnectionFlags) {
        self.0 |= rhs.0;
    }
}

impl fmt::Display for ConnectionFlags {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let mut names = Vec::new();
        if self.contains(ConnectionFlags::EDGE) {
            names.push("edge");
        }
        if self.contains(ConnectionFlags::HORIZONTAL) {
            names.push("horizontal");
        }
        if self.contains(ConnectionFlags::VERTICAL) {
            names.push("vertical");
        }
        if names.is_empty() {
            f.write_str("none")
        } else {
            f.write_str(&names.join("|"))
        }
    }
}

/// A terminal produced by derivation.
#[derive(Debug, Clone, PartialEq)]
pub struct ConnectionPoint {
    pub location: DVec2,
    pub name: String,
    pub flags: ConnectionFlags,
}

/// A declared line of terminals.
#[derive(Debug, Clone, PartialEq)]
pub struct ConnectionDescription {
    pub name: String,
    pub start: ComponentPoint,
    pub end: ComponentPoint,
    pub edge: ConnectionEdge,
}

impl ConnectionDescription {
    pub fn new(name: impl Into<String>, start: ComponentPoint, end: ComponentPoint, edge: ConnectionEdge) -> Self {
        Self {
            name: name.into(),
            start,
            end,
            edge,
        }
    }

    /// Grid terminals along the line, ordered from the numerically lower
    /// end. The start is snapped up and the end down before the two are
    /// ordered. A line that is not axis-aligned once resolved derives nothing.
    pub fn derive(&self, layout: &LayoutInformation, options: &LayoutOptions) -> Vec<ConnectionPoint> {
        let mut start = self.start.resolve(layout, options);
        let mut end = self.end.resolve(layout, options);
        if options.absolute {
            start += layout.location;
            end += layout.location;
        }

        let same_x = start.x == end.x;
        let same_y = start.y == end.y;
        let (along_x, flags) = match (same_x, same_y) {
            (true, true) => {
                let flags = if layout.orientation.is_horizontal() {
                    ConnectionFlags::HORIZONTAL
                } else {
                    ConnectionFlags::VERTICAL
                };
                let edge = if self.edge == ConnectionEdge::None {
                    ConnectionFlags::NONE
                } else {
                    ConnectionFlags::EDGE
                };
                return vec![self.point(start, flags | edge)];
            }
            (false, true) => (true, ConnectionFlags::HORIZONTAL),
            (true, false) => (false, ConnectionFlags::VERTICAL),
            (false, false) => {
                warn!(
                    "connection `{}` from {} to {} is not axis-aligned, skipped",
                    self.name, self.start, self.end
                );
                return Vec::new();
            }
        };

        let (from, to, fixed) = if along_x {
            (start.x, end.x, start.y)
        } else {
            (start.y, end.y, start.x)
        };
        let grid = options.grid_size;
        let snapped_from = grid.snap_up(from);
        let snapped_to = grid.snap_down(to);
        let reversed = snapped_from > snapped_to;
        if reversed && from < to {
            debug!(
                "connection `{}` is shorter than one grid step, terminals at {} and {}",
                self.name, snapped_to, snapped_from
            );
        }
        let (low, high) = if reversed {
            (snapped_to, snapped_from)
        } else {
            (snapped_from, snapped_to)
        };

        let steps = ((high - low) / grid.raw()).round() as usize;
        let (start_index, end_index) = if reversed { (steps, 0) } else { (0, steps) };

        (0..=steps)
            .map(|i| {
                let along = low + i as f64 * grid.raw();
                let location = if along_x { dvec2(along, fixed) } else { dvec2(fixed, along) };
                let mut point_flags = flags;
                if (i == start_index && self.edge.includes_start()) || (i == end_index && self.edge.includes_end()) {
                    point_flags |= ConnectionFlags::EDGE;
                }
                self.point(location, point_flags)
            })
            .collect()
    }

    fn point(&self, location: DVec2, flags: ConnectionFlags) -> ConnectionPoint {
        ConnectionPoint {
            location,
            name: self.name.clone(),
            flags,
        }
    }
}

/// Connections active under a condition.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct ConnectionGroup {
    pub conditions: ConditionTree,
    pub connections: Vec<ConnectionDescription>,
}

impl ConnectionGroup {
    pub fn new(conditions: ConditionTree, connections: Vec<ConnectionDescription>) -> Self {
        Self {
            conditions,
            connections,
        }
    }

    pub fn is_active(&self, state: &dyn ConditionContext) -> bool {
        self.conditions.is_met(state)
    }
}

/// Terminals keyed by grid location, where the first terminal derived at a
/// location wins.
#[derive(Debug, Clone, Default)]
pub struct ConnectionSet {
    grid: GridSize,
    points: Vec<ConnectionPoint>,
    seen: HashSet<(i64, i64)>,
}

impl ConnectionSet {
    pub fn new() -> Self {
        Self::default()
    }

    /// A set whose locations are compared in steps of `grid`.
    pub fn with_grid(grid: GridSize) -> Self {
        Self {
            grid,
            ..Self::default()
        }
    }

    fn key(&self, location: DVec2) -> (i64, i64) {
        let cell = (location / self.grid.raw()).round();
        (cell.x as i64, cell.y as i64)
    }

    /// Add a terminal unless one already exists at its grid location.
    pub fn insert(&mut self, point: ConnectionPoint) -> bool {
        let key = self.key(point.location);
        if self.seen.insert(key) {
            self.points.push(point);
            true
        } else {
            false
        }
    }

    pub fn extend(&mut self, points: impl IntoIterator<Item = ConnectionPoint>) {
        for point in points {
            self.insert(point);
        }
    }

    pub fn get(&self, location: DVec2) -> Option<&ConnectionPoint> {
        let key = self.key(location);
        self.points.iter().find(|p| self.key(p.location) == key)
    }

    pub fn len(&self) -> usize {
        self.points.len()
    }

    pub fn is_empty(&self) -> bool {
        self.points.is_empty()
    }

    pub fn iter(&self) -> std::slice::Iter<'_, ConnectionPoint> {
        self.points.iter()
    }

    pub fn into_vec(self) -> Vec<ConnectionPoint> {
        self.points
    }
}
