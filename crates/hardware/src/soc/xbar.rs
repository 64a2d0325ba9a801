//! Crossbar interconnect between cache levels.
//!
//! A crossbar has a request layer and a response layer. Each layer carries one packet at a
//! time for the packet's transfer time, `ceil(bytes / width)` cycles. On top of that
//! occupancy a request pays the frontend and forward latencies and a response pays the
//! response latency.
//!
//! The hierarchy computes a request's whole path when the request is issued, so a layer
//! can be asked about a packet that is ready long after one asked about later. Each layer
//! therefore keeps the intervals it has already promised and places a packet in the first
//! gap at or after its ready cycle. A packet is only delayed by packets that hold the layer
//! when it is ready, never by one that is still hundreds of cycles away.

use std::collections::BTreeMap;

use crate::common::Cycle;
use crate::config::XbarConfig;

/// Bytes in a request packet without data (address and command).
pub const HEADER_BYTES: u64 = 8;

/// Reserved occupancy of one layer: start cycle to end cycle (exclusive).
#[derive(Clone, Debug, Default)]
struct Layer {
    busy: BTreeMap<Cycle, Cycle>,
}

impl Layer {
    /// Books `len` cycles in the first free gap starting at or after `ready`.
    fn reserve(&mut self, ready: Cycle, len: u64) -> Cycle {
        if len == 0 {
            return ready;
        }
        let mut start = ready;
        // An interval starting before `ready` may still cover it.
        let from = self
            .busy
            .range(..=ready)
            .next_back()
            .map_or(ready, |(&s, _)| s);
        for (&s, &e) in self.busy.range(from..) {
            if e <= start {
                continue;
            }
            if s >= start + len {
                break;
            }
            start = e;
        }
        let _ = self.busy.insert(start, start + len);
        start
    }

    /// Forgets intervals that ended by `now`.
    fn retire(&mut self, now: Cycle) {
        self.busy.retain(|_, end| *end > now);
    }
}

/// A two-layer crossbar.
#[derive(Clone, Debug)]
pub struct Crossbar {
    config: XbarConfig,
    request_layer: Layer,
    response_layer: Layer,
    /// Cycles packets spent waiting for a busy layer.
    pub contention_cycles: u64,
}

impl Crossbar {
    /// Creates an idle crossbar.
    pub fn new(config: XbarConfig) -> Self {
        Self {
            config,
            request_layer: Layer::default(),
            response_layer: Layer::default(),
            contention_cycles: 0,
        }
    }

    /// Cycles the data path is occupied by `bytes`.
    ///
    /// # Returns
    ///
    /// `ceil(bytes / width_bytes)` transfers.
    pub const fn transfer_cycles(&self, bytes: u64) -> u64 {
        bytes.div_ceil(self.config.width_bytes)
    }

    /// Sends a request of `bytes` that reaches the crossbar at `now`.
    ///
    /// # Returns
    ///
    /// The cycle the request arrives at the downstream port.
    pub fn request(&mut self, now: Cycle, bytes: u64) -> Cycle {
        let occupancy = self.transfer_cycles(bytes);
        let start = self.request_layer.reserve(now, occupancy);
        self.contention_cycles += start - now;
        start + self.config.frontend_latency + self.config.forward_latency + occupancy
    }

    /// Returns a response of `bytes` that is ready downstream at `ready`.
    ///
    /// # Returns
    ///
    /// The cycle the response arrives at the upstream port.
    pub fn response(&mut self, ready: Cycle, bytes: u64) -> Cycle {
        let occupancy = self.transfer_cycles(bytes);
        let start = self.response_layer.reserve(ready, occupancy);
        self.contention_cycles += start - ready;
        start + self.config.response_latency + occupancy
    }

    /// Drops bookkeeping for transfers finished by `now`.
    ///
    /// Every packet offered after this call must be ready at or after `now`.
    pub fn retire(&mut self, now: Cycle) {
        self.request_layer.retire(now);
        self.response_layer.retire(now);
    }
}
