use crate::error::SampleError;
use crate::{Key, Value, Weight};
use fxhash::FxHashMap;

#[derive(Clone, Copy, Debug, PartialEq)]
pub struct Item {
    pub key: Key,
    pub value: Value,
    pub weight: Weight,
}

/// Slot arena for live items, addressed by key.
///
/// Slots are stable while an item is live and recycled after deletion, so the
/// owning sampling layer can keep per-slot state in parallel vectors and
/// relocate items by index swaps. Failed preconditions leave the store
/// untouched.
#[derive(Default)]
pub struct ItemStore {
    slots: Vec<Item>,
    free_slots: Vec<usize>,
    slot_of_key: FxHashMap<Key, usize>,
    total_weight: f64,
}

impl ItemStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_capacity(capacity: usize) -> Self {
        Self {
            slots: Vec::with_capacity(capacity),
            free_slots: Vec::new(),
            slot_of_key: FxHashMap::default(),
            total_weight: 0.0,
        }
    }

    /// Number of live keys, including keys whose weight is currently zero.
    pub fn len(&self) -> usize {
        self.slot_of_key.len()
    }

    pub fn is_empty(&self) -> bool {
        self.slot_of_key.is_empty()
    }

    /// Highest slot index handed out so far; parallel vectors are sized by this.
    pub fn num_slots(&self) -> usize {
        self.slots.len()
    }

    pub fn total_weight(&self) -> f64 {
        self.total_weight
    }

    pub fn contains(&self, key: Key) -> bool {
        self.slot_of_key.contains_key(&key)
    }

    pub fn slot_of(&self, key: Key) -> Option<usize> {
        self.slot_of_key.get(&key).copied()
    }

    pub fn get(&self, key: Key) -> Option<&Item> {
        self.slot_of(key).map(|slot| &self.slots[slot])
    }

    pub fn weight_of(&self, key: Key) -> Option<Weight> {
        self.get(key).map(|item| item.weight)
    }

    /// Item in a known-live slot. Slot indices come from this store; handing
    /// in a freed slot is a defect of the owning layer.
    pub fn item(&self, slot: usize) -> &Item {
        &self.slots[slot]
    }

    pub fn live_slots(&self) -> impl Iterator<Item = usize> + '_ {
        self.slot_of_key.values().copied()
    }

    pub fn insert(&mut self, key: Key, value: Value, weight: Weight) -> Result<usize, SampleError> {
        assert_valid_weight(weight);
        if self.contains(key) {
            return Err(SampleError::KeyConflict(key));
        }

        let item = Item { key, value, weight };
        let slot = match self.free_slots.pop() {
            Some(slot) => {
                self.slots[slot] = item;
                slot
            }
            None => {
                self.slots.push(item);
                self.slots.len() - 1
            }
        };

        self.slot_of_key.insert(key, slot);
        self.total_weight += weight;
        Ok(slot)
    }

    pub fn remove(&mut self, key: Key) -> Result<(usize, Item), SampleError> {
        let slot = match self.slot_of_key.remove(&key) {
            Some(slot) => slot,
            None => return Err(SampleError::UnknownKey(key)),
        };

        let item = self.slots[slot];
        self.free_slots.push(slot);
        self.total_weight -= item.weight;
        if self.slot_of_key.is_empty() {
            // snap to exact zero; residual drift must not outlive the population
            self.total_weight = 0.0;
        }
        Ok((slot, item))
    }

    /// Sets the weight of a live key, returning its slot and previous weight.
    pub fn set_weight(&mut self, key: Key, weight: Weight) -> Result<(usize, Weight), SampleError> {
        assert_valid_weight(weight);
        let slot = match self.slot_of(key) {
            Some(slot) => slot,
            None => return Err(SampleError::UnknownKey(key)),
        };

        let old_weight = self.slots[slot].weight;
        self.slots[slot].weight = weight;
        self.total_weight += weight - old_weight;
        Ok((slot, old_weight))
    }
}

#[inline]
fn assert_valid_weight(weight: Weight) {
    assert!(
        weight >= 0.0 && weight.is_finite(),
        "weight must be finite and non-negative, got {}",
        weight
    );
}
