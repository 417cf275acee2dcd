use crate::error::SampleError;
use crate::index::SamplingIndex;
use crate::store::ItemStore;
use crate::{Key, Value, Weight};
use rand::Rng;
use smallvec::SmallVec;

/// One proposal copy; `nth` is its rank among the owning slot's copies.
#[derive(Clone, Copy)]
struct ProposalCell {
    slot: u32,
    nth: u32,
}

/// Per-slot bookkeeping: where this slot's copies sit in the cell array and
/// the cached acceptance probability `weight / (count * unit)`.
#[derive(Default)]
struct Entry {
    positions: SmallVec<[u32; 4]>,
    accept: f64,
}

/// Weighted sampler over a flat array of proposal copies.
///
/// A slot of weight `w` owns `ceil(w / unit)` cells, where `unit` is the mean
/// positive weight frozen at the last rebuild. A draw picks a cell uniformly
/// and accepts it with the slot's cached probability, so a slot is returned
/// proportionally to `w` regardless of how the rounding to whole cells fell.
///
/// Mutations keep per-slot counts in sync incrementally. Once the total
/// weight or the number of weighted items drifts past a factor of two from
/// its rebuild anchor the whole array is rebuilt around a fresh `unit`,
/// which keeps the array at O(items) cells and the per-draw acceptance rate
/// above one fifth. The drift test runs before the incremental path so a
/// single huge reweighting rebuilds instead of flooding the array with
/// copies.
pub struct DynamicProposalArray {
    store: ItemStore,
    entries: Vec<Entry>,
    cells: Vec<ProposalCell>,
    /// Weight one cell stands for; `0.0` while nothing has positive weight.
    unit: f64,
    /// Live keys with positive weight.
    positive_count: usize,
    anchor_total: f64,
    anchor_positive: usize,
}

impl DynamicProposalArray {
    fn ensure_entries(&mut self) {
        if self.entries.len() < self.store.num_slots() {
            self.entries
                .resize_with(self.store.num_slots(), Entry::default);
        }
    }

    fn needs_rebuild(&self) -> bool {
        if self.anchor_positive == 0 {
            return self.positive_count > 0;
        }

        let total = self.store.total_weight();
        2.0 * total < self.anchor_total
            || total > 2.0 * self.anchor_total
            || 2 * self.positive_count < self.anchor_positive
            || self.positive_count > 2 * self.anchor_positive
    }

    /// Rebuilds every cell around a fresh `unit` and re-anchors the drift
    /// window. Runs in O(live items + cells).
    fn rebuild(&mut self) {
        self.cells.clear();
        for entry in &mut self.entries {
            entry.positions.clear();
            entry.accept = 0.0;
        }

        let mut total = 0.0;
        let mut positive = 0;
        for slot in self.store.live_slots() {
            let weight = self.store.item(slot).weight;
            if weight > 0.0 {
                total += weight;
                positive += 1;
            }
        }

        self.positive_count = positive;
        self.anchor_total = total;
        self.anchor_positive = positive;
        if positive == 0 {
            self.unit = 0.0;
            return;
        }
        self.unit = total / positive as f64;

        for slot in self.store.live_slots() {
            let weight = self.store.item(slot).weight;
            if weight <= 0.0 {
                continue;
            }
            let count = (weight / self.unit).ceil() as usize;
            let entry = &mut self.entries[slot];
            entry.accept = weight / (count as f64 * self.unit);
            for nth in 0..count {
                entry.positions.push(self.cells.len() as u32);
                self.cells.push(ProposalCell {
                    slot: slot as u32,
                    nth: nth as u32,
                });
            }
        }
    }

    /// Brings one slot's copy count and acceptance in line with its weight.
    fn resync_slot(&mut self, slot: usize, weight: Weight) {
        let target = if weight > 0.0 {
            (weight / self.unit).ceil() as usize
        } else {
            0
        };

        while self.entries[slot].positions.len() > target {
            self.remove_copy(slot);
        }
        while self.entries[slot].positions.len() < target {
            self.add_copy(slot);
        }

        self.entries[slot].accept = if target == 0 {
            0.0
        } else {
            weight / (target as f64 * self.unit)
        };
    }

    fn add_copy(&mut self, slot: usize) {
        let entry = &mut self.entries[slot];
        let nth = entry.positions.len() as u32;
        entry.positions.push(self.cells.len() as u32);
        self.cells.push(ProposalCell {
            slot: slot as u32,
            nth,
        });
    }

    /// Drops the slot's highest-ranked copy and backfills its cell with the
    /// array's last cell, fixing that cell's back-pointer.
    fn remove_copy(&mut self, slot: usize) {
        let cell_pos = match self.entries[slot].positions.pop() {
            Some(pos) => pos as usize,
            None => unreachable!("slot {} owns no proposal cells", slot),
        };

        let last = self.cells[self.cells.len() - 1];
        self.cells.pop();
        if cell_pos < self.cells.len() {
            self.cells[cell_pos] = last;
            self.entries[last.slot as usize].positions[last.nth as usize] = cell_pos as u32;
        }
    }
}

impl SamplingIndex for DynamicProposalArray {
    const NAME: &'static str = "proposal";

    fn with_capacity(items: usize) -> Self {
        Self {
            store: ItemStore::with_capacity(items),
            entries: Vec::with_capacity(items),
            cells: Vec::with_capacity(2 * items),
            unit: 0.0,
            positive_count: 0,
            anchor_total: 0.0,
            anchor_positive: 0,
        }
    }

    fn build(items: impl IntoIterator<Item = (Key, Value, Weight)>) -> Result<Self, SampleError> {
        let mut index = Self::new();
        for (key, value, weight) in items {
            index.store.insert(key, value, weight)?;
        }
        index.ensure_entries();
        index.rebuild();
        Ok(index)
    }

    fn insert(&mut self, key: Key, value: Value, weight: Weight) -> Result<(), SampleError> {
        let slot = self.store.insert(key, value, weight)?;
        self.ensure_entries();
        if weight > 0.0 {
            self.positive_count += 1;
        }

        if self.needs_rebuild() {
            self.rebuild();
        } else {
            self.resync_slot(slot, weight);
        }
        Ok(())
    }

    fn delete(&mut self, key: Key) -> Result<(), SampleError> {
        let (slot, item) = self.store.remove(key)?;
        if item.weight > 0.0 {
            self.positive_count -= 1;
        }

        if self.needs_rebuild() {
            self.rebuild();
        } else {
            self.resync_slot(slot, 0.0);
        }
        Ok(())
    }

    fn update(&mut self, key: Key, weight: Weight) -> Result<(), SampleError> {
        let (slot, old_weight) = self.store.set_weight(key, weight)?;
        match (old_weight > 0.0, weight > 0.0) {
            (false, true) => self.positive_count += 1,
            (true, false) => self.positive_count -= 1,
            _ => {}
        }

        if self.needs_rebuild() {
            self.rebuild();
        } else {
            self.resync_slot(slot, weight);
        }
        Ok(())
    }

    fn sample(&self, rng: &mut impl Rng) -> Result<(Key, Value), SampleError> {
        if self.cells.is_empty() {
            return Err(SampleError::EmptyDomain);
        }

        loop {
            let cell = self.cells[rng.gen_range(0..self.cells.len())];
            if rng.gen::<f64>() < self.entries[cell.slot as usize].accept {
                let item = self.store.item(cell.slot as usize);
                return Ok((item.key, item.value));
            }
        }
    }

    fn lookup(&self, key: Key) -> Option<(Value, Weight)> {
        self.store.get(key).map(|item| (item.value, item.weight))
    }

    fn len(&self) -> usize {
        self.store.len()
    }

    fn total_weight(&self) -> f64 {
        self.store.total_weight()
    }
}
