//! Connection routing between flowchart nodes
//!
//! A connection first tries the straight segment between its anchors. When an
//! obstacle is in the way, the plane around the flowchart is cut into square
//! cells and an A* search finds the shortest cell path, preferring fewer turns
//! among equally short paths. Detours are then pulled back onto the inflated
//! obstacles they go around. If no path exists the straight segment is used and
//! the connection is reported as unrouted.

use std::cmp::Ordering;
use std::collections::BinaryHeap;

use log::{debug, trace};

use super::anchors::HasAnchors;
use super::config::LayoutConfig;
use super::error::LayoutError;
use super::geometry::segment_enters_interior;
use super::obstacles::ObstacleSet;
use super::types::{BoundingBox, Point, RouteStatus};

/// Cost of a straight step between neighboring cells
const STRAIGHT_STEP: u64 = 1000;

/// Cost of a diagonal step (1000 * sqrt(2), rounded up)
const DIAGONAL_STEP: u64 = 1415;

/// Neighbor offsets as (column, row); the first four are the cardinal moves
const DIRECTIONS: [(i32, i32); 8] = [
    (0, -1),
    (0, 1),
    (-1, 0),
    (1, 0),
    (-1, -1),
    (1, -1),
    (-1, 1),
    (1, 1),
];

/// Edge of a bounding box for connection attachment
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Edge {
    Top,
    Bottom,
    Left,
    Right,
}

impl Edge {
    /// Outward unit step, as (column, row)
    fn normal(self) -> (i32, i32) {
        match self {
            Edge::Top => (0, -1),
            Edge::Bottom => (0, 1),
            Edge::Left => (-1, 0),
            Edge::Right => (1, 0),
        }
    }

    /// Edge a point on the outline of `bounds` lies on, if any.
    ///
    /// Corners count as the top or bottom edge.
    pub fn at_point(bounds: &BoundingBox, point: Point) -> Option<Edge> {
        const EPS: f64 = 1e-6;
        if !bounds.inflate(EPS).contains(point) {
            return None;
        }
        if (point.y - bounds.y).abs() <= EPS {
            Some(Edge::Top)
        } else if (point.y - bounds.bottom()).abs() <= EPS {
            Some(Edge::Bottom)
        } else if (point.x - bounds.x).abs() <= EPS {
            Some(Edge::Left)
        } else if (point.x - bounds.right()).abs() <= EPS {
            Some(Edge::Right)
        } else {
            None
        }
    }
}

/// Get the attachment point on a bounding box edge
pub fn attachment_point(bounds: &BoundingBox, edge: Edge) -> Point {
    let name = match edge {
        Edge::Top => "topCenter",
        Edge::Bottom => "bottomCenter",
        Edge::Left => "centerLeft",
        Edge::Right => "centerRight",
    };
    bounds.anchor(name).unwrap_or_else(|| bounds.center())
}

/// Determine the facing edges to connect two bounding boxes
pub fn best_edges(from: &BoundingBox, to: &BoundingBox) -> (Edge, Edge) {
    let dx = to.center().x - from.center().x;
    let dy = to.center().y - from.center().y;

    // Overlap horizontally means one box is above the other
    let h_overlap = from.x < to.right() && from.right() > to.x;
    // Overlap vertically means the boxes sit side by side
    let v_overlap = from.y < to.bottom() && from.bottom() > to.y;

    let primarily_vertical = dy.abs() > dx.abs() * 1.5;

    let vertical = if (h_overlap && !v_overlap) || primarily_vertical {
        true
    } else if v_overlap && !h_overlap {
        false
    } else {
        dx.abs() <= dy.abs()
    };

    match (vertical, dx > 0.0, dy > 0.0) {
        (true, _, true) => (Edge::Bottom, Edge::Top),
        (true, _, false) => (Edge::Top, Edge::Bottom),
        (false, true, _) => (Edge::Right, Edge::Left),
        (false, false, _) => (Edge::Left, Edge::Right),
    }
}

/// One end of a connection
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Endpoint<'a> {
    /// Node id, exempt from obstacle checks for this connection
    pub node: &'a str,
    pub bounds: BoundingBox,
    pub anchor: Point,
    /// Side of the node the anchor sits on; `None` for interior anchors
    pub edge: Option<Edge>,
}

impl<'a> Endpoint<'a> {
    pub fn new(node: &'a str, bounds: BoundingBox, anchor: Point) -> Self {
        Self {
            node,
            bounds,
            anchor,
            edge: Edge::at_point(&bounds, anchor),
        }
    }

    pub fn on_edge(node: &'a str, bounds: BoundingBox, edge: Edge) -> Self {
        Self {
            node,
            bounds,
            anchor: attachment_point(&bounds, edge),
            edge: Some(edge),
        }
    }

    /// Direction a path leaves this endpoint: the edge normal, or the
    /// dominant axis toward the other end for interior anchors
    fn outward(&self, toward: Point) -> (i32, i32) {
        if let Some(edge) = self.edge {
            return edge.normal();
        }
        let d = toward - self.anchor;
        if d.x.abs() >= d.y.abs() {
            if d.x >= 0.0 {
                (1, 0)
            } else {
                (-1, 0)
            }
        } else if d.y >= 0.0 {
            (0, 1)
        } else {
            (0, -1)
        }
    }
}

/// A computed connection path
#[derive(Debug, Clone, PartialEq)]
pub struct Route {
    pub path: Vec<Point>,
    pub status: RouteStatus,
}

/// Square cells covering the routing region
#[derive(Debug, Clone)]
pub struct RoutingGrid {
    cell: f64,
    min_x: f64,
    min_y: f64,
    cols: usize,
    rows: usize,
    blocked: Vec<bool>,
}

impl RoutingGrid {
    /// Cover all inflated obstacles and the given points with a margin of two
    /// cells plus the obstacle inflation. A cell is blocked when its square
    /// overlaps an inflated obstacle, so a step between free cells never cuts
    /// through one.
    pub fn build(
        flowchart: &str,
        obstacles: &ObstacleSet,
        points: &[Point],
        cell: f64,
        max_cells: usize,
    ) -> Result<Self, LayoutError> {
        let region = points
            .iter()
            .fold(obstacles.extent(), |acc, p| match acc {
                Some(b) => Some(b.expand_to_include(*p)),
                None => Some(BoundingBox::new(p.x, p.y, 0.0, 0.0)),
            })
            .unwrap_or_default()
            .inflate(cell * 2.0 + obstacles.inflation());

        let cols = ((region.width / cell).ceil() as usize).max(1);
        let rows = ((region.height / cell).ceil() as usize).max(1);
        let cells = cols.saturating_mul(rows);
        if cells > max_cells {
            return Err(LayoutError::GridTooLarge {
                flowchart: flowchart.to_string(),
                cells,
                max: max_cells,
            });
        }

        let mut grid = Self {
            cell,
            min_x: region.x,
            min_y: region.y,
            cols,
            rows,
            blocked: vec![false; cells],
        };
        for obstacle in obstacles.iter() {
            let b = &obstacle.inflated;
            let (c0, r0) = grid.clamped_cell(Point::new(b.x, b.y));
            let (c1, r1) = grid.clamped_cell(Point::new(b.right(), b.bottom()));
            for row in r0..=r1 {
                for col in c0..=c1 {
                    if b.intersects(&grid.cell_bounds(col, row)) {
                        grid.blocked[row * cols + col] = true;
                    }
                }
            }
        }
        debug!(flowchart, cols, rows; "Built routing grid");
        Ok(grid)
    }

    pub fn cell_center(&self, col: usize, row: usize) -> Point {
        Point::new(
            self.min_x + (col as f64 + 0.5) * self.cell,
            self.min_y + (row as f64 + 0.5) * self.cell,
        )
    }

    fn cell_bounds(&self, col: usize, row: usize) -> BoundingBox {
        BoundingBox::new(
            self.min_x + col as f64 * self.cell,
            self.min_y + row as f64 * self.cell,
            self.cell,
            self.cell,
        )
    }

    pub fn is_blocked(&self, col: usize, row: usize) -> bool {
        self.blocked[row * self.cols + col]
    }

    fn clamped_cell(&self, p: Point) -> (usize, usize) {
        let col = ((p.x - self.min_x) / self.cell).floor().max(0.0) as usize;
        let row = ((p.y - self.min_y) / self.cell).floor().max(0.0) as usize;
        (col.min(self.cols - 1), row.min(self.rows - 1))
    }

    fn neighbor(&self, col: usize, row: usize, (dc, dr): (i32, i32)) -> Option<(usize, usize)> {
        let c = col.checked_add_signed(dc as isize)?;
        let r = row.checked_add_signed(dr as isize)?;
        (c < self.cols && r < self.rows).then_some((c, r))
    }

    /// Free cell closest to `p`, searching square rings outward.
    ///
    /// Ties go to the lower row, then the lower column.
    pub fn nearest_free(&self, p: Point) -> Option<(usize, usize)> {
        let (col, row) = self.clamped_cell(p);
        if !self.is_blocked(col, row) {
            return Some((col, row));
        }
        let max_ring = self.cols.max(self.rows);
        for ring in 1..=max_ring as isize {
            let mut best: Option<(f64, usize, usize)> = None;
            for dr in -ring..=ring {
                for dc in -ring..=ring {
                    if dr.abs() != ring && dc.abs() != ring {
                        continue;
                    }
                    let (Some(c), Some(r)) =
                        (col.checked_add_signed(dc), row.checked_add_signed(dr))
                    else {
                        continue;
                    };
                    if c >= self.cols || r >= self.rows || self.is_blocked(c, r) {
                        continue;
                    }
                    let d = self.cell_center(c, r).distance(p);
                    let better = match best {
                        None => true,
                        Some((bd, bc, br)) => d
                            .total_cmp(&bd)
                            .then(r.cmp(&br))
                            .then(c.cmp(&bc))
                            .is_lt(),
                    };
                    if better {
                        best = Some((d, c, r));
                    }
                }
            }
            if let Some((_, c, r)) = best {
                return Some((c, r));
            }
        }
        None
    }
}

/// Path cost, compared by distance first and number of turns second
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, PartialOrd, Ord)]
struct Cost {
    distance: u64,
    bends: u32,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
struct GridState {
    col: usize,
    row: usize,
    dir: u8,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
struct GridEntry {
    estimate: Cost,
    cost: Cost,
    state: GridState,
}

impl Ord for GridEntry {
    // BinaryHeap is a max-heap: the smallest estimate, then the lowest row,
    // column and direction must compare greatest
    fn cmp(&self, other: &Self) -> Ordering {
        other
            .estimate
            .cmp(&self.estimate)
            .then_with(|| other.state.row.cmp(&self.state.row))
            .then_with(|| other.state.col.cmp(&self.state.col))
            .then_with(|| other.state.dir.cmp(&self.state.dir))
    }
}

impl PartialOrd for GridEntry {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

fn direction_index(step: (i32, i32)) -> u8 {
    DIRECTIONS
        .iter()
        .position(|d| *d == step)
        .unwrap_or(0) as u8
}

/// Routes the connections of one flowchart over a shared grid
#[derive(Debug, Clone)]
pub struct Router<'a> {
    obstacles: &'a ObstacleSet,
    grid: RoutingGrid,
    diagonal_moves: bool,
    occupancy_penalty: Option<u64>,
    occupancy: Vec<u16>,
}

impl<'a> Router<'a> {
    /// Build the grid for a flowchart; `endpoints` are all anchors that will be routed
    pub fn new(
        flowchart: &str,
        obstacles: &'a ObstacleSet,
        endpoints: &[Point],
        config: &LayoutConfig,
    ) -> Result<Self, LayoutError> {
        let grid = RoutingGrid::build(
            flowchart,
            obstacles,
            endpoints,
            config.grid_size,
            config.max_grid_cells,
        )?;
        let occupancy_penalty = config
            .avoid_connectors
            .then(|| (config.connector_penalty * STRAIGHT_STEP as f64).round() as u64);
        let cells = grid.cols * grid.rows;
        Ok(Self {
            obstacles,
            grid,
            diagonal_moves: config.diagonal_moves,
            occupancy_penalty,
            occupancy: vec![0; cells],
        })
    }

    /// Route one connection; earlier routes only matter when connector avoidance is on
    pub fn route(&mut self, from: &Endpoint<'_>, to: &Endpoint<'_>) -> Route {
        if self.direct_is_clear(from, to) {
            return Route {
                path: vec![from.anchor, to.anchor],
                status: RouteStatus::Direct,
            };
        }
        match self.grid_path(from, to) {
            Some((cells, path)) => {
                if self.occupancy_penalty.is_some() {
                    self.mark_occupied(&cells);
                }
                let exempt = [from.node, to.node];
                if let Some(clearance) = self.obstacles.clearance(&path, &exempt) {
                    debug!(from = from.node, to = to.node, clearance; "Routed around obstacles");
                }
                Route {
                    path,
                    status: RouteStatus::Routed,
                }
            }
            None => Route {
                path: vec![from.anchor, to.anchor],
                status: RouteStatus::Unrouted,
            },
        }
    }

    fn direct_is_clear(&self, from: &Endpoint<'_>, to: &Endpoint<'_>) -> bool {
        let exempt = [from.node, to.node];
        !self.obstacles.segment_blocked(from.anchor, to.anchor, &exempt)
            && !segment_enters_interior(from.anchor, to.anchor, &from.bounds)
            && !segment_enters_interior(from.anchor, to.anchor, &to.bounds)
    }

    /// Cells visited by the search and the final path through them
    fn grid_path(
        &self,
        from: &Endpoint<'_>,
        to: &Endpoint<'_>,
    ) -> Option<(Vec<(usize, usize)>, Vec<Point>)> {
        let out_dir = from.outward(to.anchor);
        let in_dir = to.outward(from.anchor);

        let start = self.port(from, out_dir)?;
        let goal = self.port(to, in_dir)?;
        let arrival = (-in_dir.0, -in_dir.1);

        let first = self.grid.cell_center(start.0, start.1);
        let last = self.grid.cell_center(goal.0, goal.1);
        let start_corner = elbow(from.anchor, first, out_dir);
        let end_corner = elbow(to.anchor, last, in_dir);

        // A port snapped past a neighboring node is unreachable
        let exempt = [from.node, to.node];
        let stubs = [
            (from.anchor, start_corner),
            (start_corner, first),
            (last, end_corner),
            (end_corner, to.anchor),
        ];
        if stubs
            .iter()
            .any(|&(a, b)| self.obstacles.segment_blocked(a, b, &exempt))
        {
            return None;
        }

        let cells = self.search(start, direction_index(out_dir), goal, direction_index(arrival))?;

        let mut points = Vec::with_capacity(cells.len() + 4);
        points.push(from.anchor);
        points.push(start_corner);
        points.extend(cells.iter().map(|&(c, r)| self.grid.cell_center(c, r)));
        points.push(end_corner);
        points.push(to.anchor);
        let path = tighten_path(&points, self.obstacles);
        Some((cells, path))
    }

    /// Free cell just outside the endpoint's own inflated box along `dir`
    fn port(&self, end: &Endpoint<'_>, dir: (i32, i32)) -> Option<(usize, usize)> {
        let inflated = end.bounds.inflate(self.obstacles.inflation());
        let a = end.anchor;
        let clearance = match dir {
            (1, _) => inflated.right() - a.x,
            (-1, _) => a.x - inflated.x,
            (_, 1) => inflated.bottom() - a.y,
            _ => a.y - inflated.y,
        }
        .max(0.0);
        let reach = clearance + self.grid.cell / 2.0;
        let outside = a + Point::new(dir.0 as f64, dir.1 as f64) * reach;
        self.grid.nearest_free(outside)
    }

    fn search(
        &self,
        start: (usize, usize),
        start_dir: u8,
        goal: (usize, usize),
        goal_dir: u8,
    ) -> Option<Vec<(usize, usize)>> {
        if start == goal {
            return Some(vec![start]);
        }

        let grid = &self.grid;
        let ndirs = if self.diagonal_moves { 8 } else { 4 };
        let state_index = |s: GridState| (s.row * grid.cols + s.col) * ndirs + s.dir as usize;
        let heuristic = |col: usize, row: usize| {
            let dc = col.abs_diff(goal.0) as f64;
            let dr = row.abs_diff(goal.1) as f64;
            (STRAIGHT_STEP as f64 * dc.hypot(dr)).floor() as u64
        };

        let states = grid.cols * grid.rows * ndirs;
        let mut best: Vec<Option<Cost>> = vec![None; states];
        let mut prev: Vec<Option<GridState>> = vec![None; states];
        let mut heap = BinaryHeap::new();

        let origin = GridState {
            col: start.0,
            row: start.1,
            dir: start_dir,
        };
        best[state_index(origin)] = Some(Cost::default());
        heap.push(GridEntry {
            estimate: Cost {
                distance: heuristic(start.0, start.1),
                bends: 0,
            },
            cost: Cost::default(),
            state: origin,
        });

        let mut expanded = 0usize;
        let mut reached = None;
        while let Some(GridEntry { cost, state, .. }) = heap.pop() {
            if best[state_index(state)] != Some(cost) {
                continue;
            }
            expanded += 1;
            if (state.col, state.row) == goal {
                reached = Some(state);
                break;
            }
            for (dir, &step) in DIRECTIONS.iter().enumerate().take(ndirs) {
                let Some((col, row)) = grid.neighbor(state.col, state.row, step) else {
                    continue;
                };
                if grid.is_blocked(col, row) {
                    continue;
                }
                let diagonal = step.0 != 0 && step.1 != 0;
                if diagonal
                    && (grid.is_blocked(col, state.row) || grid.is_blocked(state.col, row))
                {
                    continue;
                }

                let dir = dir as u8;
                let step_cost = if diagonal { DIAGONAL_STEP } else { STRAIGHT_STEP };
                let mut distance = cost.distance + step_cost;
                if let Some(penalty) = self.occupancy_penalty {
                    distance += penalty * u64::from(self.occupancy[row * grid.cols + col]);
                }
                let mut bends = cost.bends + u32::from(dir != state.dir);
                if (col, row) == goal && dir != goal_dir {
                    bends += 1;
                }
                let next_cost = Cost { distance, bends };
                let next = GridState { col, row, dir };
                let idx = state_index(next);
                if best[idx].is_some_and(|b| b <= next_cost) {
                    continue;
                }
                best[idx] = Some(next_cost);
                prev[idx] = Some(state);
                heap.push(GridEntry {
                    estimate: Cost {
                        distance: distance + heuristic(col, row),
                        bends,
                    },
                    cost: next_cost,
                    state: next,
                });
            }
        }
        trace!(expanded, found = reached.is_some(); "A* search finished");

        let mut current = reached?;
        let mut cells = vec![(current.col, current.row)];
        while let Some(p) = prev[state_index(current)] {
            cells.push((p.col, p.row));
            current = p;
        }
        cells.reverse();
        Some(cells)
    }

    fn mark_occupied(&mut self, cells: &[(usize, usize)]) {
        for &(col, row) in cells {
            let slot = &mut self.occupancy[row * self.grid.cols + col];
            *slot = slot.saturating_add(1);
        }
    }
}

/// Corner joining an anchor to the first cell center along the stub direction
fn elbow(anchor: Point, center: Point, dir: (i32, i32)) -> Point {
    if dir.0 != 0 {
        Point::new(center.x, anchor.y)
    } else {
        Point::new(anchor.x, center.y)
    }
}

/// Pull every U-shaped detour back toward the run it leaves from.
///
/// The middle segment of a U slides until it meets an inflated obstacle or one
/// of its legs vanishes. Only axis-aligned runs move, and the swept area is
/// free, so the path stays outside every inflated obstacle.
fn tighten_path(points: &[Point], obstacles: &ObstacleSet) -> Vec<Point> {
    let mut path = simplify_path(points);
    for _ in 0..points.len() * 4 {
        let slide = (1..path.len().saturating_sub(2))
            .find_map(|i| detour_slide(&path, i, obstacles).map(|s| (i, s)));
        let Some((i, (horizontal, to))) = slide else {
            break;
        };
        for p in &mut path[i..=i + 1] {
            if horizontal {
                p.y = to;
            } else {
                p.x = to;
            }
        }
        path = simplify_path(&path);
    }
    path
}

/// Where the segment `path[i]..path[i + 1]` can slide to shorten its U.
///
/// Returns whether the segment is horizontal and its new cross coordinate.
fn detour_slide(path: &[Point], i: usize, obstacles: &ObstacleSet) -> Option<(bool, f64)> {
    const EPS: f64 = 1e-9;
    let horizontal = (path[i].y - path[i + 1].y).abs() <= EPS;
    if !horizontal && (path[i].x - path[i + 1].x).abs() > EPS {
        return None;
    }
    // Work as if the segment were horizontal
    let flip = |p: Point| if horizontal { p } else { Point::new(p.y, p.x) };
    let (before, a, b, after) = (
        flip(path[i - 1]),
        flip(path[i]),
        flip(path[i + 1]),
        flip(path[i + 2]),
    );
    if (before.x - a.x).abs() > EPS || (after.x - b.x).abs() > EPS {
        return None;
    }
    let incoming = a.y - before.y;
    let outgoing = after.y - b.y;
    if incoming * outgoing >= 0.0 {
        return None;
    }

    // The shorter leg bounds the slide
    let mut to = if incoming.abs() <= outgoing.abs() {
        before.y
    } else {
        after.y
    };
    let down = incoming < 0.0;
    let (lo, hi) = (a.x.min(b.x), a.x.max(b.x));
    for obstacle in obstacles.iter() {
        let r = obstacle.inflated;
        let r = if horizontal {
            r
        } else {
            BoundingBox::new(r.y, r.x, r.height, r.width)
        };
        if r.x >= hi - EPS || r.right() <= lo + EPS {
            continue;
        }
        if down {
            if r.y >= a.y - EPS {
                to = to.min(r.y.max(a.y));
            } else if r.bottom() > a.y + EPS {
                return None;
            }
        } else if r.bottom() <= a.y + EPS {
            to = to.max(r.bottom().min(a.y));
        } else if r.y < a.y - EPS {
            return None;
        }
    }
    ((to - a.y).abs() > EPS).then_some((horizontal, to))
}

/// Drop repeated points and every point lying on the line through its neighbors.
///
/// A short back-track left by snapping to a cell center is collinear as well and
/// disappears with it.
pub fn simplify_path(points: &[Point]) -> Vec<Point> {
    let mut out: Vec<Point> = Vec::with_capacity(points.len());
    for &p in points {
        if out.last().is_some_and(|last| last.approx_eq(p, 1e-6)) {
            continue;
        }
        while out.len() >= 2 {
            let a = out[out.len() - 2];
            let b = out[out.len() - 1];
            let (u, v) = (b - a, p - b);
            let cross = u.x * v.y - u.y * v.x;
            if cross.abs() <= 1e-9 * (u.length() * v.length()).max(1.0) {
                out.pop();
            } else {
                break;
            }
        }
        out.push(p);
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::layout::element::NodeBox;
    use crate::layout::geometry::segment_intersects_rect;
    use pretty_assertions::assert_eq;

    fn node(id: &str, x: f64, y: f64, w: f64, h: f64) -> NodeBox {
        NodeBox {
            id: id.to_string(),
            bounds: BoundingBox::new(x, y, w, h),
        }
    }

    fn route_between(nodes: &[NodeBox], from: &str, to: &str, config: &LayoutConfig) -> Route {
        let obstacles = ObstacleSet::from_nodes(nodes, config.obstacle_inflation());
        let a = nodes.iter().find(|n| n.id == from).unwrap();
        let b = nodes.iter().find(|n| n.id == to).unwrap();
        let (ea, eb) = best_edges(&a.bounds, &b.bounds);
        let start = Endpoint::on_edge(&a.id, a.bounds, ea);
        let end = Endpoint::on_edge(&b.id, b.bounds, eb);
        let mut router =
            Router::new("test", &obstacles, &[start.anchor, end.anchor], config).unwrap();
        router.route(&start, &end)
    }

    #[test]
    fn test_attachment_point_top() {
        let bounds = BoundingBox::new(0.0, 0.0, 100.0, 50.0);
        assert_eq!(attachment_point(&bounds, Edge::Top), Point::new(50.0, 0.0));
    }

    #[test]
    fn test_attachment_point_left() {
        let bounds = BoundingBox::new(0.0, 0.0, 100.0, 50.0);
        assert_eq!(attachment_point(&bounds, Edge::Left), Point::new(0.0, 25.0));
    }

    #[test]
    fn test_best_edges_horizontal() {
        let a = BoundingBox::new(0.0, 0.0, 50.0, 50.0);
        let b = BoundingBox::new(200.0, 0.0, 50.0, 50.0);
        assert_eq!(best_edges(&a, &b), (Edge::Right, Edge::Left));
        assert_eq!(best_edges(&b, &a), (Edge::Left, Edge::Right));
    }

    #[test]
    fn test_best_edges_vertical() {
        let a = BoundingBox::new(0.0, 0.0, 50.0, 50.0);
        let b = BoundingBox::new(0.0, 200.0, 50.0, 50.0);
        assert_eq!(best_edges(&a, &b), (Edge::Bottom, Edge::Top));
        assert_eq!(best_edges(&b, &a), (Edge::Top, Edge::Bottom));
    }

    #[test]
    fn test_edge_at_point() {
        let b = BoundingBox::new(0.0, 0.0, 10.0, 10.0);
        assert_eq!(Edge::at_point(&b, Point::new(10.0, 5.0)), Some(Edge::Right));
        assert_eq!(Edge::at_point(&b, Point::new(0.0, 0.0)), Some(Edge::Top));
        assert_eq!(Edge::at_point(&b, Point::new(5.0, 5.0)), None);
        assert_eq!(Edge::at_point(&b, Point::new(50.0, 5.0)), None);
    }

    #[test]
    fn test_simplify_removes_collinear_points() {
        let raw = [
            Point::new(0.0, 0.0),
            Point::new(10.0, 0.0),
            Point::new(20.0, 0.0),
            Point::new(20.0, 0.0),
            Point::new(20.0, 10.0),
            Point::new(20.0, 30.0),
        ];
        assert_eq!(
            simplify_path(&raw),
            vec![Point::new(0.0, 0.0), Point::new(20.0, 0.0), Point::new(20.0, 30.0)]
        );
    }

    #[test]
    fn test_simplify_drops_snap_backtrack() {
        let raw = [
            Point::new(0.0, 0.0),
            Point::new(10.0, 0.0),
            Point::new(10.0, 5.0),
            Point::new(10.0, -40.0),
        ];
        assert_eq!(
            simplify_path(&raw),
            vec![Point::new(0.0, 0.0), Point::new(10.0, 0.0), Point::new(10.0, -40.0)]
        );
    }

    #[test]
    fn test_clear_line_is_direct() {
        let nodes = [node("a", 0.0, 0.0, 50.0, 40.0), node("b", 200.0, 0.0, 50.0, 40.0)];
        let route = route_between(&nodes, "a", "b", &LayoutConfig::default());
        assert_eq!(route.status, RouteStatus::Direct);
        assert_eq!(route.path, vec![Point::new(50.0, 20.0), Point::new(200.0, 20.0)]);
    }

    #[test]
    fn test_routes_around_blocking_node() {
        let nodes = [
            node("a", 0.0, 0.0, 50.0, 40.0),
            node("wall", 100.0, -60.0, 40.0, 160.0),
            node("b", 200.0, 0.0, 50.0, 40.0),
        ];
        let config = LayoutConfig::default();
        let route = route_between(&nodes, "a", "b", &config);
        assert_eq!(route.status, RouteStatus::Routed);
        assert_eq!(route.path.first(), Some(&Point::new(50.0, 20.0)));
        assert_eq!(route.path.last(), Some(&Point::new(200.0, 20.0)));

        let wall = nodes[1].bounds.inflate(config.obstacle_inflation());
        for segment in route.path.windows(2) {
            assert!(
                !segment_enters_interior(segment[0], segment[1], &wall),
                "segment {segment:?} crosses the wall"
            );
        }
        // The detour hugs the inflated wall
        assert!(route.path.iter().any(|p| p.y == wall.y || p.y == wall.bottom()));
    }

    #[test]
    fn test_coarse_grid_does_not_step_over_thin_node() {
        let nodes = [
            node("a", 0.0, 100.0, 60.0, 40.0),
            node("wall", 200.0, 60.0, 4.0, 120.0),
            node("b", 400.0, 100.0, 60.0, 40.0),
        ];
        let config = LayoutConfig::default().with_grid_size(60.0);
        let route = route_between(&nodes, "a", "b", &config);
        assert_eq!(route.status, RouteStatus::Routed);
        let wall = nodes[1].bounds;
        for segment in route.path.windows(2) {
            assert!(
                !segment_intersects_rect(segment[0], segment[1], &wall),
                "segment {segment:?} crosses the wall"
            );
            assert!(!segment_enters_interior(
                segment[0],
                segment[1],
                &wall.inflate(config.obstacle_inflation())
            ));
        }
    }

    #[test]
    fn test_tighten_pulls_detour_onto_obstacle() {
        let obstacles = ObstacleSet::from_nodes(&[node("wall", 100.0, 0.0, 20.0, 40.0)], 10.0);
        let raw = [
            Point::new(0.0, 20.0),
            Point::new(50.0, 20.0),
            Point::new(50.0, -45.0),
            Point::new(170.0, -45.0),
            Point::new(170.0, 20.0),
            Point::new(220.0, 20.0),
        ];
        assert_eq!(
            tighten_path(&raw, &obstacles),
            vec![
                Point::new(0.0, 20.0),
                Point::new(50.0, 20.0),
                Point::new(50.0, -10.0),
                Point::new(170.0, -10.0),
                Point::new(170.0, 20.0),
                Point::new(220.0, 20.0),
            ]
        );
    }

    #[test]
    fn test_tighten_collapses_free_jog() {
        let raw = [
            Point::new(0.0, 0.0),
            Point::new(20.0, 0.0),
            Point::new(20.0, 5.0),
            Point::new(30.0, 5.0),
            Point::new(30.0, -50.0),
        ];
        assert_eq!(
            tighten_path(&raw, &ObstacleSet::default()),
            vec![Point::new(0.0, 0.0), Point::new(30.0, 0.0), Point::new(30.0, -50.0)]
        );
    }

    #[test]
    fn test_enclosed_target_is_unrouted() {
        // Ring of nodes around the target leaves no free cell next to it
        let mut nodes = vec![node("a", -300.0, 0.0, 40.0, 40.0), node("b", 0.0, 0.0, 40.0, 40.0)];
        for (i, (x, y)) in [
            (-80.0, -80.0),
            (0.0, -80.0),
            (80.0, -80.0),
            (-80.0, 0.0),
            (80.0, 0.0),
            (-80.0, 80.0),
            (0.0, 80.0),
            (80.0, 80.0),
        ]
        .into_iter()
        .enumerate()
        {
            nodes.push(node(&format!("w{i}"), x, y, 40.0, 40.0));
        }
        let route = route_between(&nodes, "a", "b", &LayoutConfig::default());
        assert_eq!(route.status, RouteStatus::Unrouted);
        assert_eq!(route.path, vec![Point::new(-260.0, 20.0), Point::new(0.0, 20.0)]);
    }

    #[test]
    fn test_grid_budget_enforced() {
        let nodes = [node("a", 0.0, 0.0, 10.0, 10.0), node("b", 5000.0, 5000.0, 10.0, 10.0)];
        let obstacles = ObstacleSet::from_nodes(&nodes, 20.0);
        let config = LayoutConfig::default().with_max_grid_cells(1000);
        let err = Router::new("big", &obstacles, &[], &config).unwrap_err();
        assert!(matches!(err, LayoutError::GridTooLarge { max: 1000, .. }));
    }

    #[test]
    fn test_nearest_free_prefers_closest_cell() {
        let obstacles = ObstacleSet::from_nodes(&[node("a", 0.0, 0.0, 20.0, 20.0)], 0.0);
        let grid = RoutingGrid::build("g", &obstacles, &[], 10.0, 10_000).unwrap();
        let inside = Point::new(5.0, 10.0);
        let (col, row) = grid.nearest_free(inside).unwrap();
        assert!(!grid.is_blocked(col, row));
        assert_eq!(grid.cell_center(col, row), Point::new(-5.0, 5.0));
    }

    #[test]
    fn test_routing_is_deterministic() {
        let nodes = [
            node("a", 0.0, 0.0, 50.0, 40.0),
            node("wall", 100.0, -60.0, 40.0, 160.0),
            node("b", 200.0, 0.0, 50.0, 40.0),
        ];
        let config = LayoutConfig::default();
        assert_eq!(
            route_between(&nodes, "a", "b", &config),
            route_between(&nodes, "a", "b", &config)
        );
    }

    #[test]
    fn test_diagonal_route_clears_obstacles() {
        let nodes = [
            node("a", 0.0, 0.0, 50.0, 40.0),
            node("wall", 100.0, -60.0, 40.0, 160.0),
            node("b", 200.0, 150.0, 50.0, 40.0),
        ];
        let config = LayoutConfig::default().with_diagonal_moves(true);
        let diagonal = route_between(&nodes, "a", "b", &config);
        assert_eq!(diagonal.status, RouteStatus::Routed);
        let wall = nodes[1].bounds.inflate(config.obstacle_inflation());
        assert!(diagonal
            .path
            .windows(2)
            .all(|w| !segment_enters_interior(w[0], w[1], &wall)));
    }
}
