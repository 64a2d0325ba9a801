//! Memory hierarchy: L1I and L1D behind an L2 crossbar, a shared L2, and the system
//! crossbar to the memory controller.
//!
//! The hierarchy is timing-only. When the core issues a request the whole path is walked
//! immediately and the completion cycle is computed from each component's occupancy state
//! (crossbar layers, MSHRs, DRAM banks and bus); the response is then delivered through an
//! event queue when that cycle arrives. It provides:
//! 1. **Ports:** At most `cache_load_ports` loads and `cache_store_ports` stores per cycle on the
//!    L1D and one fetch per cycle on the L1I. A refused request is retried by the core.
//! 2. **MSHRs:** A miss to a line that is already outstanding merges with it. An L1 with every
//!    MSHR busy refuses the request; an L2 with every MSHR busy queues it until one frees.
//! 3. **Write-back:** Dirty victims travel down one level; with `inclusive` set, L2 evictions
//!    also invalidate the L1 copies.

use std::collections::BTreeMap;

use crate::common::{Addr, Cycle};
use crate::config::{CacheConfig, Config};
use crate::core::units::cache::{Cache, Evicted};
use crate::sim::event_queue::EventQueue;
use crate::soc::memory::{MemoryController, build_controller};
use crate::soc::xbar::{Crossbar, HEADER_BYTES};
use crate::stats::{CacheStats, SimStats};

/// Identifier of an outstanding request.
pub type ReqId = u64;

/// The core-side port a request came from.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum MemPort {
    /// Instruction fetch (L1I).
    Fetch,
    /// Load (L1D load port).
    Load,
    /// Store drain (L1D store port).
    Store,
}

/// A completed request.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct MemResponse {
    /// Request identifier returned when the request was accepted.
    pub id: ReqId,
    /// Originating port.
    pub port: MemPort,
    /// Requested address.
    pub addr: Addr,
}

/// Why a request was not accepted this cycle.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum MemRefusal {
    /// Every port of this kind has been used this cycle.
    PortBusy,
    /// The L1 has no free MSHR for a new miss.
    MshrFull,
}

#[derive(Debug)]
struct Level {
    cache: Cache,
    latency: u64,
    response_latency: u64,
    max_mshrs: usize,
    /// Outstanding misses: line address to fill cycle.
    mshrs: BTreeMap<Addr, Cycle>,
    stats: CacheStats,
}

impl Level {
    fn new(config: &CacheConfig) -> Self {
        Self {
            cache: Cache::new(config),
            latency: config.latency,
            response_latency: config.response_latency,
            max_mshrs: config.mshrs,
            mshrs: BTreeMap::new(),
            stats: CacheStats::default(),
        }
    }

    /// Retires MSHRs whose fill has arrived by `now` and returns how many remain.
    fn outstanding(&mut self, now: Cycle) -> usize {
        self.mshrs.retain(|_, ready| *ready > now);
        self.mshrs.len()
    }

    /// Fill cycle of an outstanding miss to `line`.
    fn pending_fill(&self, line: Addr, now: Cycle) -> Option<Cycle> {
        self.mshrs.get(&line).copied().filter(|ready| *ready > now)
    }
}

/// The cache hierarchy and memory controller.
#[derive(Debug)]
pub struct MemoryHierarchy {
    l1_i: Level,
    l1_d: Level,
    l2: Level,
    l2_xbar: Crossbar,
    system_xbar: Crossbar,
    controller: Box<dyn MemoryController>,
    inclusive: bool,
    line_bytes: u64,
    load_ports: usize,
    store_ports: usize,
    loads_used: usize,
    stores_used: usize,
    fetch_used: bool,
    responses: EventQueue<MemResponse>,
    next_id: ReqId,
    l1_d_invalidations: Vec<Addr>,
    load_port_stalls: u64,
    store_port_stalls: u64,
}

impl MemoryHierarchy {
    /// Builds an empty (cold) hierarchy.
    pub fn new(config: &Config) -> Self {
        let c = &config.cache;
        Self {
            l1_i: Level::new(&c.l1_i),
            l1_d: Level::new(&c.l1_d),
            l2: Level::new(&c.l2),
            l2_xbar: Crossbar::new(c.l2_xbar.clone()),
            system_xbar: Crossbar::new(c.system_xbar.clone()),
            controller: build_controller(config),
            inclusive: c.inclusive,
            line_bytes: c.l2.line_bytes as u64,
            load_ports: config.lsq.cache_load_ports,
            store_ports: config.lsq.cache_store_ports,
            loads_used: 0,
            stores_used: 0,
            fetch_used: false,
            responses: EventQueue::new(),
            next_id: 0,
            l1_d_invalidations: Vec::new(),
            load_port_stalls: 0,
            store_port_stalls: 0,
        }
    }

    /// Line size shared by every level.
    pub const fn line_bytes(&self) -> u64 {
        self.line_bytes
    }

    /// Opens a new cycle: every port becomes available again.
    pub const fn begin_cycle(&mut self) {
        self.loads_used = 0;
        self.stores_used = 0;
        self.fetch_used = false;
    }

    /// Requests the instruction block holding `addr`.
    pub fn try_fetch(&mut self, addr: Addr, now: Cycle) -> Result<ReqId, MemRefusal> {
        if self.fetch_used {
            return Err(MemRefusal::PortBusy);
        }
        let ready = self.access_l1(MemPort::Fetch, addr, false, now)?;
        self.fetch_used = true;
        Ok(self.respond(MemPort::Fetch, addr, ready))
    }

    /// Issues a load through an L1D load port.
    pub fn try_load(&mut self, addr: Addr, now: Cycle) -> Result<ReqId, MemRefusal> {
        if self.loads_used >= self.load_ports {
            self.load_port_stalls += 1;
            return Err(MemRefusal::PortBusy);
        }
        let ready = self.access_l1(MemPort::Load, addr, false, now)?;
        self.loads_used += 1;
        Ok(self.respond(MemPort::Load, addr, ready))
    }

    /// Writes a committed store through an L1D store port (write-allocate).
    pub fn try_store(&mut self, addr: Addr, now: Cycle) -> Result<ReqId, MemRefusal> {
        if self.stores_used >= self.store_ports {
            self.store_port_stalls += 1;
            return Err(MemRefusal::PortBusy);
        }
        let ready = self.access_l1(MemPort::Store, addr, true, now)?;
        self.stores_used += 1;
        Ok(self.respond(MemPort::Store, addr, ready))
    }

    /// Returns every response due by `now`, in completion order.
    ///
    /// Requests issued after this call must not be older than `now`.
    pub fn tick(&mut self, now: Cycle) -> Vec<MemResponse> {
        self.l2_xbar.retire(now);
        self.system_xbar.retire(now);
        self.responses.drain_due(now)
    }

    /// L1D lines removed by back-invalidation since the last call.
    ///
    /// The load/store queue snoops these to catch load-load ordering hazards.
    pub fn take_l1_d_invalidations(&mut self) -> Vec<Addr> {
        std::mem::take(&mut self.l1_d_invalidations)
    }

    /// True while any response is still in flight.
    pub fn has_pending(&self) -> bool {
        !self.responses.is_empty()
    }

    /// Copies the hierarchy counters into `stats`.
    pub fn collect_stats(&self, stats: &mut SimStats) {
        stats.l1_i = self.l1_i.stats.clone();
        stats.l1_d = self.l1_d.stats.clone();
        stats.l2 = self.l2.stats.clone();
        stats.dram = self.controller.stats().clone();
        stats.load_port_stalls = self.load_port_stalls;
        stats.store_port_stalls = self.store_port_stalls;
    }

    fn respond(&mut self, port: MemPort, addr: Addr, ready: Cycle) -> ReqId {
        let id = self.next_id;
        self.next_id += 1;
        self.responses.schedule(ready, MemResponse { id, port, addr });
        id
    }

    const fn l1(&mut self, port: MemPort) -> &mut Level {
        match port {
            MemPort::Fetch => &mut self.l1_i,
            MemPort::Load | MemPort::Store => &mut self.l1_d,
        }
    }

    /// Walks the path for an L1 access and returns the cycle the data is back at the core.
    fn access_l1(
        &mut self,
        port: MemPort,
        addr: Addr,
        is_write: bool,
        now: Cycle,
    ) -> Result<Cycle, MemRefusal> {
        let line = addr & !(self.line_bytes - 1);
        let level = self.l1(port);

        if let Some(fill) = level.pending_fill(line, now) {
            level.stats.mshr_merges += 1;
            if is_write {
                let _ = level.cache.fill(line, true);
            }
            return Ok(fill.max(now + level.latency));
        }
        if !level.cache.contains(addr) && level.outstanding(now) >= level.max_mshrs {
            level.stats.mshr_full += 1;
            return Err(MemRefusal::MshrFull);
        }

        let access = level.cache.access(addr, is_write);
        level.stats.prefetches += access.prefetched.len() as u64;
        let latency = level.latency;
        let response_latency = level.response_latency;
        self.write_back_from_l1(port, &access.evicted, now);
        if access.hit {
            self.l1(port).stats.hits += 1;
            return Ok(now + latency);
        }

        self.l1(port).stats.misses += 1;
        let lookup_done = now + latency;
        let at_l2 = self.l2_xbar.request(lookup_done, HEADER_BYTES);
        let l2_ready = self.access_l2(line, at_l2);
        let ready = self.l2_xbar.response(l2_ready, self.line_bytes) + response_latency;

        let level = self.l1(port);
        let victim = level.cache.fill(line, is_write);
        let _ = level.mshrs.insert(line, ready);
        if let Some(victim) = victim {
            self.write_back_from_l1(port, &[victim], lookup_done);
        }
        Ok(ready)
    }

    /// Sends dirty L1 victims to the L2.
    fn write_back_from_l1(&mut self, port: MemPort, victims: &[Evicted], now: Cycle) {
        for victim in victims.iter().filter(|v| v.dirty) {
            self.l1(port).stats.writebacks += 1;
            let at_l2 = self.l2_xbar.request(now, self.line_bytes);
            if let Some(evicted) = self.l2.cache.fill(victim.addr, true) {
                self.evict_from_l2(evicted, at_l2);
            }
        }
    }

    /// Looks `line` up in the L2 at cycle `t`, going to memory on a miss.
    fn access_l2(&mut self, line: Addr, t: Cycle) -> Cycle {
        if let Some(fill) = self.l2.pending_fill(line, t) {
            self.l2.stats.mshr_merges += 1;
            return fill.max(t + self.l2.latency);
        }

        let access = self.l2.cache.access(line, false);
        self.l2.stats.prefetches += access.prefetched.len() as u64;
        for evicted in access.evicted {
            self.evict_from_l2(evicted, t);
        }
        if access.hit {
            self.l2.stats.hits += 1;
            return t + self.l2.latency;
        }

        let mut start = t;
        if self.l2.outstanding(t) >= self.l2.max_mshrs {
            self.l2.stats.mshr_full += 1;
            if let Some(first_free) = self.l2.mshrs.values().min() {
                start = start.max(*first_free);
            }
        }
        self.l2.stats.misses += 1;
        let lookup_done = start + self.l2.latency;
        let at_memory = self.system_xbar.request(lookup_done, HEADER_BYTES);
        let data = self.controller.access(line, false, at_memory);
        let ready = self.system_xbar.response(data, self.line_bytes) + self.l2.response_latency;

        let victim = self.l2.cache.fill(line, false);
        let _ = self.l2.mshrs.insert(line, ready);
        if let Some(victim) = victim {
            self.evict_from_l2(victim, lookup_done);
        }
        ready
    }

    /// Handles a line leaving the L2: back-invalidation when inclusive, and write-back.
    fn evict_from_l2(&mut self, victim: Evicted, t: Cycle) {
        let mut dirty = victim.dirty;
        if self.inclusive {
            if let Some(copy) = self.l1_i.cache.invalidate(victim.addr) {
                self.l2.stats.back_invalidations += 1;
                dirty |= copy.dirty;
            }
            if let Some(copy) = self.l1_d.cache.invalidate(victim.addr) {
                self.l2.stats.back_invalidations += 1;
                dirty |= copy.dirty;
                self.l1_d_invalidations.push(copy.addr);
            }
        }
        if dirty {
            self.l2.stats.writebacks += 1;
            let at_memory = self.system_xbar.request(t, self.line_bytes);
            let _ = self.controller.access(victim.addr, true, at_memory);
        }
    }
}
