//! Per-frame hit regions registered by the renderer.

use kanban_core::id::ItemId;

use super::CollisionStrategy;

/// Terminal cell coordinate.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct Point {
    /// Column.
    pub x: u16,
    /// Row.
    pub y: u16,
}

impl Point {
    /// Construct a point.
    #[must_use]
    pub const fn new(x: u16, y: u16) -> Self {
        Self { x, y }
    }

    /// Squared euclidean distance to `other`.
    #[must_use]
    pub fn distance_sq(self, other: Self) -> u32 {
        let dx = u32::from(self.x.abs_diff(other.x));
        let dy = u32::from(self.y.abs_diff(other.y));
        dx * dx + dy * dy
    }
}

/// Axis-aligned rectangle in terminal cells.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct Bounds {
    /// Left column.
    pub x: u16,
    /// Top row.
    pub y: u16,
    /// Width in cells.
    pub width: u16,
    /// Height in cells.
    pub height: u16,
}

impl Bounds {
    /// Construct bounds.
    #[must_use]
    pub const fn new(x: u16, y: u16, width: u16, height: u16) -> Self {
        Self {
            x,
            y,
            width,
            height,
        }
    }

    /// Whether `point` lies inside.
    #[must_use]
    pub fn contains(&self, point: Point) -> bool {
        let right = u32::from(self.x) + u32::from(self.width);
        let bottom = u32::from(self.y) + u32::from(self.height);
        point.x >= self.x
            && point.y >= self.y
            && u32::from(point.x) < right
            && u32::from(point.y) < bottom
    }

    /// Center in doubled coordinates, which keeps odd sizes exact.
    fn center2(&self) -> (i64, i64) {
        (
            2 * i64::from(self.x) + i64::from(self.width),
            2 * i64::from(self.y) + i64::from(self.height),
        )
    }
}

/// Handle to a registered region.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct RegionId(usize);

/// A registered hit-test rectangle.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Region {
    /// Enclosing region, registered earlier in the same frame.
    pub parent: Option<RegionId>,
    /// Screen rectangle.
    pub bounds: Bounds,
    /// Item this region lifts and accepts drops for.
    pub target: Option<ItemId>,
    /// Presses inside this region never start a drag.
    pub no_drag: bool,
}

/// Keyboard navigation direction.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Direction {
    /// Towards row 0.
    Up,
    /// Away from row 0.
    Down,
    /// Towards column 0.
    Left,
    /// Away from column 0.
    Right,
}

/// Regions for one rendered frame, in registration order.
#[derive(Debug, Clone, Default)]
pub struct RegionMap {
    regions: Vec<Region>,
}

impl RegionMap {
    /// Empty map.
    #[must_use]
    pub const fn new() -> Self {
        Self {
            regions: Vec::new(),
        }
    }

    /// Forget every region; call at the start of each frame.
    pub fn clear(&mut self) {
        self.regions.clear();
    }

    /// Number of registered regions.
    #[must_use]
    pub fn len(&self) -> usize {
        self.regions.len()
    }

    /// Whether nothing is registered.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.regions.is_empty()
    }

    /// Register a region. A parent that was not registered earlier is dropped.
    pub fn register(
        &mut self,
        parent: Option<RegionId>,
        bounds: Bounds,
        target: Option<ItemId>,
    ) -> RegionId {
        self.push(Region {
            parent: parent.filter(|p| p.0 < self.regions.len()),
            bounds,
            target,
            no_drag: false,
        })
    }

    /// Register a region in which presses never start a drag.
    pub fn register_no_drag(&mut self, parent: Option<RegionId>, bounds: Bounds) -> RegionId {
        self.push(Region {
            parent: parent.filter(|p| p.0 < self.regions.len()),
            bounds,
            target: None,
            no_drag: true,
        })
    }

    fn push(&mut self, region: Region) -> RegionId {
        self.regions.push(region);
        RegionId(self.regions.len() - 1)
    }

    /// Look up a region.
    #[must_use]
    pub fn get(&self, id: RegionId) -> Option<&Region> {
        self.regions.get(id.0)
    }

    /// First region registered for `item`.
    #[must_use]
    pub fn region_of(&self, item: ItemId) -> Option<RegionId> {
        self.regions
            .iter()
            .position(|region| region.target == Some(item))
            .map(RegionId)
    }

    /// `id` followed by each of its ancestors.
    pub fn ancestry(&self, id: RegionId) -> impl Iterator<Item = &Region> + '_ {
        self.ancestor_ids(id).filter_map(|id| self.get(id))
    }

    fn ancestor_ids(&self, id: RegionId) -> impl Iterator<Item = RegionId> + '_ {
        std::iter::successors(self.get(id).map(|_| id), |current| {
            self.get(*current).and_then(|region| region.parent)
        })
    }

    fn depth(&self, id: RegionId) -> usize {
        self.ancestor_ids(id).count()
    }

    /// Deepest region containing `point`; ties go to the earliest registration.
    #[must_use]
    pub fn innermost_at(&self, point: Point) -> Option<RegionId> {
        self.deepest(point, |_| true)
    }

    fn deepest(&self, point: Point, accept: impl Fn(&Region) -> bool) -> Option<RegionId> {
        let mut best: Option<(usize, RegionId)> = None;
        for (index, region) in self.regions.iter().enumerate() {
            if !region.bounds.contains(point) || !accept(region) {
                continue;
            }
            let id = RegionId(index);
            let depth = self.depth(id);
            if best.is_none_or(|(best_depth, _)| depth > best_depth) {
                best = Some((depth, id));
            }
        }
        best.map(|(_, id)| id)
    }

    /// Whether a press at `point` sits inside a no-drag region or one of its
    /// descendants.
    #[must_use]
    pub fn is_drag_blocked(&self, point: Point) -> bool {
        self.innermost_at(point)
            .is_some_and(|id| self.is_within_no_drag(id))
    }

    /// Whether `id` or any ancestor is marked no-drag.
    #[must_use]
    pub fn is_within_no_drag(&self, id: RegionId) -> bool {
        self.ancestry(id).any(|region| region.no_drag)
    }

    /// Item a press at `point` would lift: the nearest target walking up from
    /// the innermost region.
    #[must_use]
    pub fn draggable_at(&self, point: Point) -> Option<ItemId> {
        let id = self.innermost_at(point)?;
        self.ancestry(id).find_map(|region| region.target)
    }

    /// Whether any descendant of `id` carries a target.
    #[must_use]
    pub fn has_target_descendants(&self, id: RegionId) -> bool {
        self.regions.iter().enumerate().any(|(index, region)| {
            region.target.is_some()
                && self
                    .ancestor_ids(RegionId(index))
                    .skip(1)
                    .any(|ancestor| ancestor == id)
        })
    }

    /// Resolve the drop target under `point` among targets passing `eligible`.
    #[must_use]
    pub fn resolve(
        &self,
        point: Point,
        strategy: CollisionStrategy,
        eligible: impl Fn(ItemId) -> bool,
    ) -> Option<ItemId> {
        let accept = |region: &Region| region.target.is_some_and(&eligible);
        let id = match strategy {
            CollisionStrategy::PointerWithin => self.deepest(point, accept)?,
            CollisionStrategy::ClosestCenter => {
                let probe = (2 * i64::from(point.x), 2 * i64::from(point.y));
                self.nearest(|region| accept(region).then(|| sq_dist(region.bounds.center2(), probe)))?
            }
        };
        self.get(id).and_then(|region| region.target)
    }

    /// Nearest eligible target strictly in `direction` from `from`'s region.
    #[must_use]
    pub fn neighbor(
        &self,
        from: ItemId,
        direction: Direction,
        eligible: impl Fn(ItemId) -> bool,
    ) -> Option<ItemId> {
        let origin = self.get(self.region_of(from)?)?.bounds.center2();
        let id = self.nearest(|region| {
            let target = region.target?;
            if target == from || !eligible(target) {
                return None;
            }
            let center = region.bounds.center2();
            let ahead = match direction {
                Direction::Up => center.1 < origin.1,
                Direction::Down => center.1 > origin.1,
                Direction::Left => center.0 < origin.0,
                Direction::Right => center.0 > origin.0,
            };
            ahead.then(|| sq_dist(center, origin))
        })?;
        self.get(id).and_then(|region| region.target)
    }

    /// Region minimizing `score`; ties go to the earliest registration.
    fn nearest(&self, score: impl Fn(&Region) -> Option<i64>) -> Option<RegionId> {
        let mut best: Option<(i64, RegionId)> = None;
        for (index, region) in self.regions.iter().enumerate() {
            let Some(value) = score(region) else {
                continue;
            };
            if best.is_none_or(|(best_value, _)| value < best_value) {
                best = Some((value, RegionId(index)));
            }
        }
        best.map(|(_, id)| id)
    }
}

const fn sq_dist(a: (i64, i64), b: (i64, i64)) -> i64 {
    let dx = a.0 - b.0;
    let dy = a.1 - b.1;
    dx * dx + dy * dy
}
