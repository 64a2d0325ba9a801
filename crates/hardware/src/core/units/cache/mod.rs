//! Set-Associative Cache Model.
//!
//! This module implements the tag array of one cache level. It tracks which lines are
//! present, whether they are dirty, and the age metadata replacement policies use; it stores
//! no data (the simulator is timing-only). It provides:
//! 1. **Lookup:** `access` updates recency and dirtiness on a hit and runs the prefetcher.
//! 2. **Fill:** `fill` installs a line, choosing an invalid way first and otherwise asking the
//!    replacement policy; a valid victim is returned so the caller can write it back.
//! 3. **Invalidation:** `invalidate` removes a line, used to keep an inclusive L2.
//!
//! Miss timing, MSHRs, and the path to the next level live in `soc::hierarchy`.

/// Cache replacement policy implementations (FIFO, LRU, MRU, PLRU, Random).
pub mod policies;

use self::policies::{
    FifoPolicy, LruPolicy, MruPolicy, PlruPolicy, RandomPolicy, ReplacementPolicy,
};
use crate::common::Addr;
use crate::config::{CacheConfig, Prefetcher as PrefetcherType, ReplacementPolicy as PolicyType};
use crate::core::units::prefetch::{NextLinePrefetcher, Prefetcher, StridePrefetcher};

/// Tag, state, and age metadata of one cache line.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct LineState {
    /// Address tag.
    pub tag: u64,
    /// The line holds a block.
    pub valid: bool,
    /// The block was written since it was filled.
    pub dirty: bool,
    /// Access stamp of the most recent hit or fill.
    pub last_touch: u64,
    /// Access stamp of the fill.
    pub inserted_at: u64,
}

/// A valid line displaced by a fill or an invalidation.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct Evicted {
    /// Line-aligned address of the displaced block.
    pub addr: Addr,
    /// The block must be written back.
    pub dirty: bool,
}

/// Outcome of a demand lookup.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct CacheAccess {
    /// The line was present.
    pub hit: bool,
    /// Lines installed by the prefetcher as a side effect.
    pub prefetched: Vec<Addr>,
    /// Valid lines displaced by those prefetch fills.
    pub evicted: Vec<Evicted>,
}

/// Tag array of a set-associative cache with a replacement policy and optional prefetcher.
#[derive(Debug)]
pub struct Cache {
    /// Optional hardware prefetcher (boxed for dynamic dispatch; `Send + Sync` for thread safety).
    pub prefetcher: Option<Box<dyn Prefetcher + Send + Sync>>,
    lines: Vec<LineState>,
    num_sets: usize,
    ways: usize,
    line_bytes: u64,
    policy: Box<dyn ReplacementPolicy + Send + Sync>,
    /// Monotonic access counter used as the age stamp.
    stamp: u64,
}

impl Cache {
    /// Creates an empty cache with the configured geometry, policy, and prefetcher.
    ///
    /// The configuration is assumed validated (power-of-two set count and line size).
    pub fn new(config: &CacheConfig) -> Self {
        let num_sets = config.num_sets().max(1);
        let ways = config.ways.max(1);

        let policy: Box<dyn ReplacementPolicy + Send + Sync> = match config.policy {
            PolicyType::Fifo => Box::new(FifoPolicy),
            PolicyType::Random => Box::<RandomPolicy>::default(),
            PolicyType::Plru => Box::new(PlruPolicy::new(num_sets, ways)),
            PolicyType::Lru => Box::new(LruPolicy),
            PolicyType::Mru => Box::new(MruPolicy),
        };

        let prefetcher: Option<Box<dyn Prefetcher + Send + Sync>> = match config.prefetcher {
            PrefetcherType::NextLine => Some(Box::new(NextLinePrefetcher::new(
                config.line_bytes,
                config.prefetch_degree,
            ))),
            PrefetcherType::Stride => Some(Box::new(StridePrefetcher::new(
                config.line_bytes,
                config.prefetch_table_size,
                config.prefetch_degree,
            ))),
            PrefetcherType::None => None,
        };

        Self {
            prefetcher,
            lines: vec![LineState::default(); num_sets * ways],
            num_sets,
            ways,
            line_bytes: config.line_bytes as u64,
            policy,
            stamp: 0,
        }
    }

    /// Line size in bytes.
    pub const fn line_bytes(&self) -> u64 {
        self.line_bytes
    }

    /// Aligns `addr` down to its line.
    #[inline]
    pub const fn line_addr(&self, addr: Addr) -> Addr {
        addr & !(self.line_bytes - 1)
    }

    #[inline]
    const fn set_and_tag(&self, addr: Addr) -> (usize, u64) {
        let line = addr / self.line_bytes;
        (
            (line % self.num_sets as u64) as usize,
            line / self.num_sets as u64,
        )
    }

    fn find(&self, addr: Addr) -> Option<(usize, usize)> {
        let (set, tag) = self.set_and_tag(addr);
        let base = set * self.ways;
        (0..self.ways)
            .find(|&way| {
                let line = &self.lines[base + way];
                line.valid && line.tag == tag
            })
            .map(|way| (set, way))
    }

    const fn next_stamp(&mut self) -> u64 {
        self.stamp += 1;
        self.stamp
    }

    /// Returns true if the line holding `addr` is present.
    pub fn contains(&self, addr: Addr) -> bool {
        self.find(addr).is_some()
    }

    /// Performs a demand lookup.
    ///
    /// On a hit the line's recency is refreshed and a write marks it dirty. A miss changes
    /// nothing; the caller fills the line when it decides the miss is serviced. Either way the
    /// prefetcher observes the access and its candidates are installed immediately.
    pub fn access(&mut self, addr: Addr, is_write: bool) -> CacheAccess {
        let stamp = self.next_stamp();
        let hit = if let Some((set, way)) = self.find(addr) {
            let line = &mut self.lines[set * self.ways + way];
            line.last_touch = stamp;
            line.dirty |= is_write;
            self.policy.touch(set, way);
            true
        } else {
            false
        };

        let mut result = CacheAccess {
            hit,
            ..CacheAccess::default()
        };
        let candidates = self
            .prefetcher
            .as_mut()
            .map(|p| p.observe(addr, hit))
            .unwrap_or_default();
        for target in candidates {
            let target = self.line_addr(target);
            if target == self.line_addr(addr) || self.contains(target) {
                continue;
            }
            if let Some(victim) = self.fill(target, false) {
                result.evicted.push(victim);
            }
            result.prefetched.push(target);
        }
        result
    }

    /// Installs the line holding `addr`.
    ///
    /// # Returns
    ///
    /// The valid line that was displaced, if any. Filling a line that is already present
    /// only refreshes it (and ORs in `dirty`).
    pub fn fill(&mut self, addr: Addr, dirty: bool) -> Option<Evicted> {
        let stamp = self.next_stamp();
        if let Some((set, way)) = self.find(addr) {
            let line = &mut self.lines[set * self.ways + way];
            line.dirty |= dirty;
            line.last_touch = stamp;
            self.policy.touch(set, way);
            return None;
        }

        let (set, tag) = self.set_and_tag(addr);
        let base = set * self.ways;
        let set_lines = &self.lines[base..base + self.ways];
        let way = match set_lines.iter().position(|l| !l.valid) {
            Some(way) => way,
            None => self.policy.victim(set, set_lines).min(self.ways - 1),
        };

        let old = self.lines[base + way];
        let evicted = old.valid.then(|| Evicted {
            addr: (old.tag * self.num_sets as u64 + set as u64) * self.line_bytes,
            dirty: old.dirty,
        });
        self.lines[base + way] = LineState {
            tag,
            valid: true,
            dirty,
            last_touch: stamp,
            inserted_at: stamp,
        };
        self.policy.touch(set, way);
        evicted
    }

    /// Removes the line holding `addr`, returning it if it was present.
    pub fn invalidate(&mut self, addr: Addr) -> Option<Evicted> {
        let (set, way) = self.find(addr)?;
        let line_addr = self.line_addr(addr);
        let line = &mut self.lines[set * self.ways + way];
        line.valid = false;
        Some(Evicted {
            addr: line_addr,
            dirty: std::mem::take(&mut line.dirty),
        })
    }
}
