//! Per-level scaffolding and placement capacities.
//!
//! Scaffolding is always acquired in ascending level order and released in
//! descending order. Every worker requests levels in the same total order,
//! so no cycle of workers waiting on each other can form.

use std::sync::atomic::{AtomicUsize, Ordering};

use ascent_common::config::LevelSpec;

use crate::sync::BoundedResource;

/// One level: scaffolding slots plus the placements it still accepts.
#[derive(Debug)]
pub struct Level {
    index: usize,
    scaffolding: BoundedResource,
    placement: BoundedResource,
    placed: AtomicUsize,
}

impl Level {
    fn new(index: usize, spec: LevelSpec) -> Self {
        Self {
            index,
            scaffolding: BoundedResource::new(spec.scaffolding),
            placement: BoundedResource::new(spec.placement),
            placed: AtomicUsize::new(0),
        }
    }

    /// Index of this level, 0 being the ground level.
    pub fn index(&self) -> usize {
        self.index
    }

    /// Scaffolding resource of this level.
    pub fn scaffolding(&self) -> &BoundedResource {
        &self.scaffolding
    }

    /// Placement resource of this level.
    pub fn placement(&self) -> &BoundedResource {
        &self.placement
    }

    /// Successful placements so far.
    pub fn placed(&self) -> usize {
        self.placed.load(Ordering::Acquire)
    }
}

/// A scaffolding step taken while climbing or descending.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Step {
    /// Level acquired or released.
    pub level: usize,
    /// Scaffolding slots in use at that level right after the step.
    pub in_use: usize,
    /// Scaffolding capacity of that level.
    pub capacity: usize,
}

/// Ordered set of levels.
#[derive(Debug)]
pub struct LevelPool {
    levels: Vec<Level>,
}

impl LevelPool {
    /// Create closed levels from their specs.
    pub fn new(specs: &[LevelSpec]) -> Self {
        Self {
            levels: specs
                .iter()
                .enumerate()
                .map(|(index, &spec)| Level::new(index, spec))
                .collect(),
        }
    }

    /// Open every scaffolding and placement resource.
    pub fn open(&self) {
        for level in &self.levels {
            level.scaffolding.initialize();
            level.placement.initialize();
        }
    }

    /// Number of levels.
    pub fn len(&self) -> usize {
        self.levels.len()
    }

    /// Whether the pool has no levels.
    pub fn is_empty(&self) -> bool {
        self.levels.is_empty()
    }

    /// Level at `index`.
    ///
    /// # Panics
    ///
    /// If `index` is out of range.
    pub fn level(&self, index: usize) -> &Level {
        &self.levels[index]
    }

    /// All levels, ground first.
    pub fn iter(&self) -> impl Iterator<Item = &Level> {
        self.levels.iter()
    }

    /// Claim a placement permit on the highest level that still has one.
    ///
    /// Levels are tried from the top down and the scan stops at the first
    /// success, which spreads load towards the upper levels first.
    pub fn claim_highest(&self) -> Option<usize> {
        self.levels
            .iter()
            .rev()
            .find(|level| level.placement.try_acquire())
            .map(Level::index)
    }

    /// Acquire scaffolding for levels `0..=top`, lowest first.
    ///
    /// `on_step` runs after each level is acquired.
    pub fn climb<F>(&self, top: usize, mut on_step: F) -> Chain<'_>
    where
        F: FnMut(Step),
    {
        let mut chain = Chain {
            pool: self,
            held: Vec::with_capacity(top + 1),
        };
        for level in &self.levels[..=top] {
            level.scaffolding.acquire();
            chain.held.push(level.index);
            on_step(Step {
                level: level.index,
                in_use: level.scaffolding.in_use(),
                capacity: level.scaffolding.max(),
            });
        }
        chain
    }

    /// Count a placement at `level`, returning the new total for that level.
    pub fn record_placement(&self, level: usize) -> usize {
        let placed = self.levels[level].placed.fetch_add(1, Ordering::AcqRel) + 1;
        debug_assert!(
            placed <= self.levels[level].placement.max(),
            "level {} over-placed",
            level
        );
        placed
    }

    /// Placements recorded per level.
    pub fn placements(&self) -> Vec<usize> {
        self.levels.iter().map(Level::placed).collect()
    }

    /// Whether every level's placement capacity is used up.
    pub fn is_exhausted(&self) -> bool {
        self.levels
            .iter()
            .all(|level| level.placement.available() == 0)
    }
}

/// Scaffolding held by one worker: always a contiguous run `0..=top`.
///
/// Dropping a chain without calling [`Chain::descend`] still releases its
/// levels, top first.
#[derive(Debug)]
pub struct Chain<'a> {
    pool: &'a LevelPool,
    held: Vec<usize>,
}

impl Chain<'_> {
    /// Highest level held.
    pub fn top(&self) -> Option<usize> {
        self.held.last().copied()
    }

    /// Levels held, in acquisition order.
    pub fn held(&self) -> &[usize] {
        &self.held
    }

    /// Release every held level, highest first.
    ///
    /// `on_step` runs after each level is released.
    pub fn descend<F>(mut self, mut on_step: F)
    where
        F: FnMut(Step),
    {
        while let Some(step) = self.release_top() {
            on_step(step);
        }
    }

    fn release_top(&mut self) -> Option<Step> {
        let index = self.held.pop()?;
        let scaffolding = &self.pool.levels[index].scaffolding;
        scaffolding.release(1);
        Some(Step {
            level: index,
            in_use: scaffolding.in_use(),
            capacity: scaffolding.max(),
        })
    }
}

impl Drop for Chain<'_> {
    fn drop(&mut self) {
        while self.release_top().is_some() {}
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Arc;
    use std::thread;

    fn pool(specs: &[(usize, usize)]) -> LevelPool {
        let specs: Vec<_> = specs.iter().map(|&(k, p)| LevelSpec::new(k, p)).collect();
        let pool = LevelPool::new(&specs);
        pool.open();
        pool
    }

    #[test]
    fn test_claim_prefers_highest_level() {
        let pool = pool(&[(3, 2), (1, 1)]);
        assert_eq!(pool.claim_highest(), Some(1));
        assert_eq!(pool.claim_highest(), Some(0));
        assert_eq!(pool.claim_highest(), Some(0));
        assert_eq!(pool.claim_highest(), None);
        assert!(pool.is_exhausted());
    }

    #[test]
    fn test_claim_leaves_other_levels_untouched() {
        let pool = pool(&[(3, 2), (1, 1)]);
        pool.claim_highest();
        assert_eq!(pool.level(0).placement().available(), 2);
        assert_eq!(pool.level(1).placement().available(), 0);
        assert!(!pool.is_exhausted());
    }

    #[test]
    fn test_climb_ascends_and_descend_mirrors() {
        let pool = pool(&[(3, 4), (2, 3), (1, 1)]);
        let mut climbed = Vec::new();
        let chain = pool.climb(2, |step| climbed.push(step.level));
        assert_eq!(climbed, vec![0, 1, 2]);
        assert_eq!(chain.held(), &[0, 1, 2]);
        assert_eq!(chain.top(), Some(2));
        assert_eq!(pool.level(0).scaffolding().in_use(), 1);

        let mut descended = Vec::new();
        chain.descend(|step| descended.push((step.level, step.in_use)));
        assert_eq!(descended, vec![(2, 0), (1, 0), (0, 0)]);
        for level in pool.iter() {
            assert_eq!(level.scaffolding().available(), level.scaffolding().max());
        }
    }

    #[test]
    fn test_climb_reports_usage() {
        let pool = pool(&[(3, 4)]);
        let _held = pool.climb(0, |_| {});
        let mut steps = Vec::new();
        let chain = pool.climb(0, |step| steps.push(step));
        assert_eq!(
            steps,
            vec![Step {
                level: 0,
                in_use: 2,
                capacity: 3
            }]
        );
        drop(chain);
        assert_eq!(pool.level(0).scaffolding().in_use(), 1);
    }

    #[test]
    fn test_dropped_chain_releases_everything() {
        let pool = pool(&[(1, 1), (1, 1)]);
        {
            let _chain = pool.climb(1, |_| {});
            assert_eq!(pool.level(1).scaffolding().available(), 0);
        }
        assert_eq!(pool.level(0).scaffolding().available(), 1);
        assert_eq!(pool.level(1).scaffolding().available(), 1);
    }

    #[test]
    fn test_record_placement_counts_per_level() {
        let pool = pool(&[(1, 2), (1, 1)]);
        assert_eq!(pool.record_placement(0), 1);
        assert_eq!(pool.record_placement(0), 2);
        assert_eq!(pool.record_placement(1), 1);
        assert_eq!(pool.placements(), vec![2, 1]);
    }

    #[test]
    fn test_contended_climbs_do_not_deadlock() {
        let pool = Arc::new(pool(&[(2, 1), (1, 1), (1, 1)]));
        let handles: Vec<_> = (0..6)
            .map(|i| {
                let pool = pool.clone();
                thread::spawn(move || {
                    for round in 0..100 {
                        let top = (i + round) % 3;
                        let chain = pool.climb(top, |_| {});
                        assert_eq!(chain.held().len(), top + 1);
                        chain.descend(|_| {});
                    }
                })
            })
            .collect();
        for handle in handles {
            handle.join().unwrap();
        }
        for level in pool.iter() {
            assert_eq!(level.scaffolding().in_use(), 0);
        }
    }
}
