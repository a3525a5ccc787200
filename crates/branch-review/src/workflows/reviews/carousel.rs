//! Featured-branch rotation.
//!
//! Manual stepping and timed advance share one index and go through the same
//! transition, so a tick can never observe a half-applied manual step.

use serde::{Deserialize, Serialize};
use std::time::Duration;

use super::ranking::views::BranchCard;
use super::ranking::{BranchAggregate, BranchRanking};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CarouselState {
    Idle,
    AutoAdvancing { elapsed: Duration },
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Direction {
    Next,
    Prev,
}

#[derive(Debug, Clone, Copy)]
enum Step {
    Manual(Direction),
    Tick(Duration),
}

/// Circular cursor over a list of `len` items.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Carousel {
    len: usize,
    index: usize,
    interval: Duration,
    state: CarouselState,
}

impl Carousel {
    pub fn new(len: usize, interval: Duration) -> Self {
        let mut carousel = Self {
            len,
            index: 0,
            interval,
            state: CarouselState::Idle,
        };
        carousel.resume();
        carousel
    }

    pub fn len(&self) -> usize {
        self.len
    }

    pub fn is_empty(&self) -> bool {
        self.len == 0
    }

    pub fn state(&self) -> CarouselState {
        self.state
    }

    pub fn index(&self) -> Option<usize> {
        (self.len > 0).then_some(self.index)
    }

    pub fn next(&mut self) -> Option<usize> {
        self.transition(Step::Manual(Direction::Next))
    }

    pub fn prev(&mut self) -> Option<usize> {
        self.transition(Step::Manual(Direction::Prev))
    }

    pub fn step(&mut self, direction: Direction) -> Option<usize> {
        self.transition(Step::Manual(direction))
    }

    /// Advance the timer; moves at most one position per call.
    pub fn tick(&mut self, elapsed: Duration) -> Option<usize> {
        self.transition(Step::Tick(elapsed))
    }

    pub fn pause(&mut self) {
        self.state = CarouselState::Idle;
    }

    pub fn resume(&mut self) {
        self.state = if self.len > 1 && !self.interval.is_zero() {
            CarouselState::AutoAdvancing {
                elapsed: Duration::ZERO,
            }
        } else {
            CarouselState::Idle
        };
    }

    /// Recreate the cursor for a recomputed list.
    pub fn reset(&mut self, len: usize) {
        *self = Self::new(len, self.interval);
    }

    fn transition(&mut self, step: Step) -> Option<usize> {
        if self.len == 0 {
            return None;
        }

        match step {
            Step::Manual(direction) => {
                self.index = match direction {
                    Direction::Next => (self.index + 1) % self.len,
                    Direction::Prev => (self.index + self.len - 1) % self.len,
                };
                if let CarouselState::AutoAdvancing { elapsed } = &mut self.state {
                    *elapsed = Duration::ZERO;
                }
            }
            Step::Tick(delta) => {
                if let CarouselState::AutoAdvancing { elapsed } = &mut self.state {
                    *elapsed += delta;
                    if *elapsed >= self.interval {
                        *elapsed = Duration::ZERO;
                        self.index = (self.index + 1) % self.len;
                    }
                }
            }
        }

        Some(self.index)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum Lane {
    Outstanding,
    NeedsImprovement,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct FeaturedBranch {
    pub position: usize,
    pub of: usize,
    #[serde(flatten)]
    pub card: BranchCard,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct FeaturedView {
    pub outstanding: Option<FeaturedBranch>,
    pub needs_improvement: Option<FeaturedBranch>,
}

/// One carousel per ranking partition.
#[derive(Debug, Clone)]
pub struct RankingCarousels {
    outstanding: Vec<BranchAggregate>,
    needs_improvement: Vec<BranchAggregate>,
    outstanding_cursor: Carousel,
    needs_improvement_cursor: Carousel,
}

impl RankingCarousels {
    pub fn new(interval: Duration) -> Self {
        Self {
            outstanding: Vec::new(),
            needs_improvement: Vec::new(),
            outstanding_cursor: Carousel::new(0, interval),
            needs_improvement_cursor: Carousel::new(0, interval),
        }
    }

    /// Recreate the cursors when the partitions changed. Returns whether they were reset.
    pub fn refresh(&mut self, ranking: &BranchRanking) -> bool {
        if self.outstanding == ranking.outstanding
            && self.needs_improvement == ranking.needs_improvement
        {
            return false;
        }

        self.outstanding = ranking.outstanding.clone();
        self.needs_improvement = ranking.needs_improvement.clone();
        self.outstanding_cursor.reset(self.outstanding.len());
        self.needs_improvement_cursor
            .reset(self.needs_improvement.len());
        true
    }

    pub fn tick(&mut self, elapsed: Duration) {
        self.outstanding_cursor.tick(elapsed);
        self.needs_improvement_cursor.tick(elapsed);
    }

    pub fn step(&mut self, lane: Lane, direction: Direction) -> Option<usize> {
        self.cursor_mut(lane).step(direction)
    }

    pub fn cursor(&self, lane: Lane) -> &Carousel {
        match lane {
            Lane::Outstanding => &self.outstanding_cursor,
            Lane::NeedsImprovement => &self.needs_improvement_cursor,
        }
    }

    fn cursor_mut(&mut self, lane: Lane) -> &mut Carousel {
        match lane {
            Lane::Outstanding => &mut self.outstanding_cursor,
            Lane::NeedsImprovement => &mut self.needs_improvement_cursor,
        }
    }

    pub fn featured(&self) -> FeaturedView {
        FeaturedView {
            outstanding: featured(&self.outstanding, &self.outstanding_cursor),
            needs_improvement: featured(&self.needs_improvement, &self.needs_improvement_cursor),
        }
    }
}

fn featured(items: &[BranchAggregate], cursor: &Carousel) -> Option<FeaturedBranch> {
    let index = cursor.index()?;
    items.get(index).map(|aggregate| FeaturedBranch {
        position: index + 1,
        of: items.len(),
        card: BranchCard::from_aggregate(aggregate),
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    const INTERVAL: Duration = Duration::from_secs(5);

    #[test]
    fn manual_next_wraps_to_first() {
        let mut carousel = Carousel::new(3, INTERVAL);
        assert_eq!(carousel.index(), Some(0));
        assert_eq!(carousel.next(), Some(1));
        assert_eq!(carousel.next(), Some(2));
        assert_eq!(carousel.next(), Some(0));
    }

    #[test]
    fn manual_prev_wraps_to_last() {
        let mut carousel = Carousel::new(3, INTERVAL);
        assert_eq!(carousel.prev(), Some(2));
        assert_eq!(carousel.prev(), Some(1));
    }

    #[test]
    fn ticks_advance_once_per_interval() {
        let mut carousel = Carousel::new(3, INTERVAL);
        assert_eq!(carousel.tick(Duration::from_secs(3)), Some(0));
        assert_eq!(carousel.tick(Duration::from_secs(3)), Some(1));
        // A very late tick still moves a single position.
        assert_eq!(carousel.tick(Duration::from_secs(60)), Some(2));
    }

    #[test]
    fn manual_step_restarts_the_timer() {
        let mut carousel = Carousel::new(3, INTERVAL);
        carousel.tick(Duration::from_secs(4));
        assert_eq!(carousel.next(), Some(1));
        assert_eq!(carousel.tick(Duration::from_secs(4)), Some(1));
        assert_eq!(carousel.tick(Duration::from_secs(1)), Some(2));
    }

    #[test]
    fn single_and_empty_lists_stay_idle() {
        let mut single = Carousel::new(1, INTERVAL);
        assert_eq!(single.state(), CarouselState::Idle);
        assert_eq!(single.next(), Some(0));

        let mut empty = Carousel::new(0, INTERVAL);
        assert_eq!(empty.next(), None);
        assert_eq!(empty.tick(INTERVAL), None);
    }

    #[test]
    fn paused_carousel_ignores_ticks() {
        let mut carousel = Carousel::new(2, INTERVAL);
        carousel.pause();
        assert_eq!(carousel.tick(INTERVAL), Some(0));
        carousel.resume();
        assert_eq!(carousel.tick(INTERVAL), Some(1));
    }
}
