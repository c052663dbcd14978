use std::{
    cmp::Ordering,
    collections::{BinaryHeap, HashMap, VecDeque},
};

use rand::{Rng, SeedableRng, rngs::StdRng};

use crate::{
    ElementId, Position,
    office::{Element, OfficeState},
};

/// A one-tile step a caller can turn into an absolute move target.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Direction {
    Up,
    Down,
    Left,
    Right,
}

impl Direction {
    pub const ALL: [Direction; 4] = [
        Direction::Up,
        Direction::Down,
        Direction::Left,
        Direction::Right,
    ];

    pub fn delta(self) -> (isize, isize) {
        match self {
            Direction::Up => (0, -1),
            Direction::Down => (0, 1),
            Direction::Left => (-1, 0),
            Direction::Right => (1, 0),
        }
    }

    /// Returns the position one step away, or `None` if it would go below zero.
    ///
    /// The result is not checked against any grid; the engine does that.
    pub fn step(self, from: Position) -> Option<Position> {
        let (dx, dy) = self.delta();
        Some(Position {
            x: from.x.checked_add_signed(dx)?,
            y: from.y.checked_add_signed(dy)?,
        })
    }

    /// Converts a move between two adjacent positions into a direction.
    fn between(src: Position, dst: Position) -> Option<Direction> {
        Direction::ALL
            .into_iter()
            .find(|direction| direction.step(src) == Some(dst))
    }
}

/// Trait for caller-side strategies that steer the character.
pub trait Pilot {
    /// Proposes the next step, or `None` to stand still.
    /// `&mut self` allows the pilot to keep a plan between calls.
    fn next_direction(&mut self, office: &OfficeState) -> Option<Direction>;
}

/// Wanders around at random.
#[derive(Debug)]
pub struct RandomWalker {
    rng: StdRng,
}

impl RandomWalker {
    pub fn new(seed: u64) -> Self {
        Self {
            rng: StdRng::seed_from_u64(seed),
        }
    }
}

impl Pilot for RandomWalker {
    fn next_direction(&mut self, office: &OfficeState) -> Option<Direction> {
        let open: Vec<Direction> = Direction::ALL
            .into_iter()
            .filter(|direction| {
                direction
                    .step(office.character_position)
                    .is_some_and(|target| office.is_walkable(target))
            })
            .collect();
        if open.is_empty() {
            return None;
        }
        Some(open[self.rng.random_range(0..open.len())])
    }
}

/// Walks the character until a target element is within reach.
#[derive(Debug)]
pub struct RouteToElement {
    target: ElementId,
    range: usize,
    current_plan: VecDeque<Position>,
}

impl RouteToElement {
    pub fn new(target: impl Into<ElementId>, range: usize) -> Self {
        Self {
            target: target.into(),
            range,
            current_plan: VecDeque::new(),
        }
    }

    pub fn target(&self) -> &str {
        &self.target
    }

    /// Checks whether the character can already use the target.
    pub fn arrived(&self, office: &OfficeState) -> bool {
        office
            .element(&self.target)
            .is_some_and(|element| in_range(element, office.character_position, self.range))
    }

    /// A* search to the nearest position from which `goal` is in range.
    fn plan(&self, office: &OfficeState, goal: Position) -> Option<Vec<Position>> {
        // For priority queue
        #[derive(Clone, Eq, PartialEq)]
        struct PrioritizedItem {
            priority: usize,
            position: Position,
        }

        impl Ord for PrioritizedItem {
            fn cmp(&self, other: &Self) -> Ordering {
                // Reverse ordering for min-heap behavior
                other.priority.cmp(&self.priority)
            }
        }

        impl PartialOrd for PrioritizedItem {
            fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
                Some(self.cmp(other))
            }
        }

        let start = office.character_position;
        let heuristic = |position: &Position| {
            position
                .manhattan_distance(&goal)
                .saturating_sub(self.range)
        };

        let mut frontier = BinaryHeap::new();
        let mut came_from: HashMap<Position, Position> = HashMap::new();
        let mut cost_so_far: HashMap<Position, usize> = HashMap::new();

        frontier.push(PrioritizedItem {
            priority: heuristic(&start),
            position: start,
        });
        cost_so_far.insert(start, 0);

        let mut reached = None;

        while let Some(PrioritizedItem {
            position: current, ..
        }) = frontier.pop()
        {
            if current.manhattan_distance(&goal) <= self.range {
                reached = Some(current);
                break;
            }

            let cost = cost_so_far.get(&current).copied().unwrap_or(usize::MAX);
            for neighbor in walkable_neighbors(office, current) {
                let new_cost = cost.saturating_add(1);
                if cost_so_far
                    .get(&neighbor)
                    .is_none_or(|&known| new_cost < known)
                {
                    cost_so_far.insert(neighbor, new_cost);
                    frontier.push(PrioritizedItem {
                        priority: new_cost + heuristic(&neighbor),
                        position: neighbor,
                    });
                    came_from.insert(neighbor, current);
                }
            }
        }

        // Reconstruct path
        let mut current = reached?;
        let mut path = vec![current];
        while current != start {
            current = *came_from.get(&current)?;
            path.push(current);
        }
        path.reverse();
        Some(path)
    }
}

impl Pilot for RouteToElement {
    fn next_direction(&mut self, office: &OfficeState) -> Option<Direction> {
        let goal = office.element(&self.target)?.position;
        if self.arrived(office) {
            self.current_plan.clear();
            return None;
        }

        // Follow the existing plan while it still lines up with the character
        if let Some(next) = self.current_plan.pop_front() {
            if let Some(direction) = Direction::between(office.character_position, next) {
                if office.is_walkable(next) {
                    return Some(direction);
                }
            }
            self.current_plan.clear();
        }

        let plan = self.plan(office, goal)?;
        self.current_plan.extend(plan.into_iter().skip(1));
        let next = self.current_plan.pop_front()?;
        Direction::between(office.character_position, next)
    }
}

fn in_range(element: &Element, position: Position, range: usize) -> bool {
    element.position.manhattan_distance(&position) <= range
}

/// Gets walkable orthogonal neighbors of a position.
fn walkable_neighbors(office: &OfficeState, position: Position) -> Vec<Position> {
    Direction::ALL
        .into_iter()
        .filter_map(|direction| direction.step(position))
        .filter(|neighbor| office.is_walkable(*neighbor))
        .collect()
}

/// Elements the character can use from where it stands, nearest first.
pub fn elements_in_range(office: &OfficeState, range: usize) -> Vec<&Element> {
    let position = office.character_position;
    let mut reachable: Vec<&Element> = office
        .elements
        .iter()
        .filter(|element| in_range(element, position, range))
        .collect();
    reachable.sort_by_key(|element| element.position.manhattan_distance(&position));
    reachable
}
