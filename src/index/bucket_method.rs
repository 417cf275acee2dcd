use crate::dyadic;
use crate::error::SampleError;
use crate::index::SamplingIndex;
use crate::store::ItemStore;
use crate::{Key, Value, Weight};
use rand::Rng;

const UNINITIALIZED: u32 = u32::MAX;

/// One bucket for every exponent a positive f64 can take.
const NUM_BUCKETS: usize = (dyadic::MAX_EXPONENT - dyadic::MIN_EXPONENT + 1) as usize;

#[derive(Clone, Copy)]
struct Placement {
    bucket: u32,
    pos: u32,
}

impl Placement {
    const NONE: Placement = Placement {
        bucket: UNINITIALIZED,
        pos: UNINITIALIZED,
    };

    fn is_placed(&self) -> bool {
        self.bucket != UNINITIALIZED
    }
}

struct Bucket {
    /// Slots of the members, in arbitrary order.
    members: Vec<u32>,
    /// Running sum of the member weights; exactly `0.0` whenever empty.
    total: f64,
    /// Position in the active list, `UNINITIALIZED` while empty.
    active_pos: u32,
}

impl Bucket {
    fn new() -> Self {
        Self {
            members: Vec::new(),
            total: 0.0,
            active_pos: UNINITIALIZED,
        }
    }
}

/// Weighted sampler over dyadic weight classes.
///
/// Bucket `j` holds the items whose weight lies in `[2^j, 2^(j+1))`. A draw
/// first picks a bucket proportionally to its weight sum, then rejection
/// samples a member against the bucket's upper bound. Members of one bucket
/// differ by less than a factor of two, so a proposal is accepted with
/// probability at least one half and a draw costs an expected constant number
/// of trials on top of the bucket scan.
pub struct BucketMethod {
    store: ItemStore,
    buckets: Vec<Bucket>,
    /// Placement of every slot; parallel to the store's slot arena.
    placements: Vec<Placement>,
    /// Ids of the non-empty buckets, in arbitrary order.
    active: Vec<u32>,
}

impl BucketMethod {
    fn bucket_id(weight: Weight) -> usize {
        (dyadic::exponent(weight) - dyadic::MIN_EXPONENT) as usize
    }

    fn grow_placements(&mut self) {
        if self.store.num_slots() > self.placements.len() {
            self.placements.resize(self.store.num_slots(), Placement::NONE);
        }
    }

    fn activate(&mut self, bucket_id: usize) {
        self.buckets[bucket_id].active_pos = self.active.len() as u32;
        self.active.push(bucket_id as u32);
    }

    fn deactivate(&mut self, bucket_id: usize) {
        let pos = self.buckets[bucket_id].active_pos as usize;
        self.active.swap_remove(pos);
        if pos < self.active.len() {
            let moved = self.active[pos] as usize;
            self.buckets[moved].active_pos = pos as u32;
        }
        self.buckets[bucket_id].active_pos = UNINITIALIZED;
    }

    fn place(&mut self, slot: usize, weight: Weight) {
        let bucket_id = Self::bucket_id(weight);
        if self.buckets[bucket_id].members.is_empty() {
            self.activate(bucket_id);
        }

        let bucket = &mut self.buckets[bucket_id];
        bucket.members.push(slot as u32);
        bucket.total += weight;
        self.placements[slot] = Placement {
            bucket: bucket_id as u32,
            pos: (bucket.members.len() - 1) as u32,
        };
    }

    fn displace(&mut self, slot: usize, weight: Weight) {
        let placement = self.placements[slot];
        debug_assert!(placement.is_placed());
        let bucket_id = placement.bucket as usize;
        let pos = placement.pos as usize;

        let bucket = &mut self.buckets[bucket_id];
        bucket.members.swap_remove(pos);
        bucket.total -= weight;
        let now_empty = bucket.members.is_empty();
        if pos < bucket.members.len() {
            let moved = bucket.members[pos] as usize;
            self.placements[moved].pos = placement.pos;
        }

        if now_empty {
            self.buckets[bucket_id].total = 0.0;
            self.deactivate(bucket_id);
        }
        self.placements[slot] = Placement::NONE;
    }

    /// Weighted choice among the active buckets, two passes over the active
    /// list. Summing afresh per draw keeps the choice insensitive to drift in
    /// any globally maintained total.
    fn select_bucket<R: Rng + ?Sized>(&self, rng: &mut R) -> usize {
        let sum: f64 = self
            .active
            .iter()
            .map(|&b| self.buckets[b as usize].total)
            .sum();

        let mut remaining = rng.gen::<f64>() * sum;
        for &b in &self.active {
            remaining -= self.buckets[b as usize].total;
            if remaining < 0.0 {
                return b as usize;
            }
        }
        // rounding can leave a sliver past the last bucket
        self.active[self.active.len() - 1] as usize
    }
}

impl SamplingIndex for BucketMethod {
    const NAME: &'static str = "bucket";

    fn with_capacity(items: usize) -> Self {
        Self {
            store: ItemStore::with_capacity(items),
            buckets: std::iter::repeat_with(Bucket::new).take(NUM_BUCKETS).collect(),
            placements: Vec::with_capacity(items),
            active: Vec::new(),
        }
    }

    fn insert(&mut self, key: Key, value: Value, weight: Weight) -> Result<(), SampleError> {
        let slot = self.store.insert(key, value, weight)?;
        self.grow_placements();
        self.placements[slot] = Placement::NONE;
        if weight > 0.0 {
            self.place(slot, weight);
        }
        Ok(())
    }

    fn delete(&mut self, key: Key) -> Result<(), SampleError> {
        let (slot, item) = self.store.remove(key)?;
        if item.weight > 0.0 {
            self.displace(slot, item.weight);
        }
        Ok(())
    }

    fn update(&mut self, key: Key, weight: Weight) -> Result<(), SampleError> {
        let (slot, old_weight) = self.store.set_weight(key, weight)?;

        if old_weight > 0.0 && weight > 0.0 {
            let bucket_id = Self::bucket_id(old_weight);
            if bucket_id == Self::bucket_id(weight) {
                // same dyadic class: membership stands, only the mass moves
                self.buckets[bucket_id].total += weight - old_weight;
                return Ok(());
            }
        }

        if old_weight > 0.0 {
            self.displace(slot, old_weight);
        }
        if weight > 0.0 {
            self.place(slot, weight);
        }
        Ok(())
    }

    fn sample(&self, rng: &mut impl Rng) -> Result<(Key, Value), SampleError> {
        if self.active.is_empty() {
            return Err(SampleError::EmptyDomain);
        }

        let bucket = &self.buckets[self.select_bucket(rng)];
        loop {
            let slot = bucket.members[rng.gen_range(0..bucket.members.len())] as usize;
            let item = self.store.item(slot);
            // accept with weight / 2^(j+1), at least one half within a bucket
            if rng.gen::<f64>() * 2.0 < dyadic::normalized_fraction(item.weight) {
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

#[cfg(test)]
mod test {
    use super::*;
    use assert_float_eq::assert_float_relative_eq;
    use pcg_rand::Pcg64;
    use rand::SeedableRng;

    fn bucket_of(index: &BucketMethod, key: Key) -> Option<i32> {
        let slot = index.store.slot_of(key)?;
        let placement = index.placements[slot];
        placement
            .is_placed()
            .then(|| placement.bucket as i32 + dyadic::MIN_EXPONENT)
    }

    #[test]
    fn weights_land_in_their_dyadic_class() {
        let mut index = BucketMethod::new();
        index.insert(0, 0, 8.0).unwrap();
        index.insert(1, 0, 7.99).unwrap();
        index.insert(2, 0, 1.0).unwrap();
        index.insert(3, 0, 0.75).unwrap();
        index.insert(4, 0, 1e30).unwrap();
        index.insert(5, 0, f64::from_bits(1)).unwrap();

        assert_eq!(bucket_of(&index, 0), Some(3));
        assert_eq!(bucket_of(&index, 1), Some(2));
        assert_eq!(bucket_of(&index, 2), Some(0));
        assert_eq!(bucket_of(&index, 3), Some(-1));
        assert_eq!(bucket_of(&index, 4), Some(99));
        assert_eq!(bucket_of(&index, 5), Some(dyadic::MIN_EXPONENT));

        assert_eq!(index.active.len(), 6);
    }

    #[test]
    fn members_of_one_class_share_a_bucket() {
        let mut index = BucketMethod::new();
        index.insert(0, 0, 4.0).unwrap();
        index.insert(1, 0, 5.5).unwrap();
        index.insert(2, 0, 7.999).unwrap();

        assert_eq!(index.active.len(), 1);
        let bucket = &index.buckets[BucketMethod::bucket_id(4.0)];
        assert_eq!(bucket.members.len(), 3);
        assert_float_relative_eq!(bucket.total, 17.499);
    }

    #[test]
    fn zero_weight_items_are_not_placed() {
        let mut index = BucketMethod::new();
        index.insert(0, 0, 0.0).unwrap();

        assert_eq!(bucket_of(&index, 0), None);
        assert!(index.active.is_empty());
        assert_eq!(index.len(), 1);
    }

    #[test]
    fn same_class_update_only_moves_mass() {
        let mut index = BucketMethod::new();
        index.insert(0, 0, 4.0).unwrap();
        index.insert(1, 0, 6.0).unwrap();

        index.update(0, 7.5).unwrap();

        assert_eq!(bucket_of(&index, 0), Some(2));
        let bucket = &index.buckets[BucketMethod::bucket_id(4.0)];
        assert_eq!(bucket.members.len(), 2);
        assert_float_relative_eq!(bucket.total, 13.5);
        assert_eq!(index.active.len(), 1);
    }

    #[test]
    fn boundary_weights_relocate_to_the_upper_class() {
        let mut index = BucketMethod::new();
        index.insert(0, 0, 7.9).unwrap();
        assert_eq!(bucket_of(&index, 0), Some(2));

        index.update(0, 8.0).unwrap();
        assert_eq!(bucket_of(&index, 0), Some(3));

        index.update(0, 7.999_999).unwrap();
        assert_eq!(bucket_of(&index, 0), Some(2));
    }

    #[test]
    fn cross_class_update_relocates_the_member() {
        let mut index = BucketMethod::new();
        index.insert(0, 0, 4.0).unwrap();

        index.update(0, 1e-9).unwrap();

        assert_eq!(bucket_of(&index, 0), Some(-30));
        assert_eq!(index.active.len(), 1);
        let vacated = &index.buckets[BucketMethod::bucket_id(4.0)];
        assert!(vacated.members.is_empty());
        assert_eq!(vacated.total, 0.0);
        assert_eq!(vacated.active_pos, UNINITIALIZED);
    }

    #[test]
    fn emptied_buckets_reset_their_total_exactly() {
        let mut index = BucketMethod::new();
        index.insert(0, 0, 1e30).unwrap();
        index.insert(1, 0, 1.25e30).unwrap();
        index.delete(0).unwrap();
        index.delete(1).unwrap();

        let bucket = &index.buckets[BucketMethod::bucket_id(1e30)];
        assert_eq!(bucket.total, 0.0);
        assert!(index.active.is_empty());
        assert_eq!(index.total_weight(), 0.0);
    }

    #[test]
    fn reused_slots_start_without_a_placement() {
        let mut index = BucketMethod::new();
        index.insert(0, 0, 2.0).unwrap();
        index.delete(0).unwrap();
        index.insert(1, 0, 0.0).unwrap();

        assert_eq!(index.store.num_slots(), 1, "slot was recycled");
        assert_eq!(bucket_of(&index, 1), None);
        assert!(index.active.is_empty());
    }

    #[test]
    fn bucket_totals_track_their_members_through_churn() {
        let mut rng = Pcg64::seed_from_u64(0xb0c_e7);
        let mut index = BucketMethod::new();

        for key in 0..200u64 {
            let weight = 10f64.powf(rng.gen_range(-12.0..12.0));
            index.insert(key, key, weight).unwrap();
        }
        for key in (0..200u64).step_by(3) {
            index.update(key, 10f64.powf(rng.gen_range(-12.0..12.0)))
                .unwrap();
        }
        for key in (0..200u64).step_by(5) {
            index.delete(key).unwrap();
        }

        for &bucket_id in &index.active {
            let bucket = &index.buckets[bucket_id as usize];
            assert!(!bucket.members.is_empty());
            let fresh: f64 = bucket
                .members
                .iter()
                .map(|&slot| index.store.item(slot as usize).weight)
                .sum();
            assert_float_relative_eq!(bucket.total, fresh, 1e-9);
        }

        let placed = index
            .placements
            .iter()
            .filter(|placement| placement.is_placed())
            .count();
        let member_count: usize = index
            .active
            .iter()
            .map(|&b| index.buckets[b as usize].members.len())
            .sum();
        assert_eq!(placed, member_count);
        assert_eq!(placed, index.len(), "every live key has positive weight");
    }

    #[test]
    fn back_pointers_survive_swap_removal() {
        let mut index = BucketMethod::new();
        for key in 0..6u64 {
            index.insert(key, key, 5.0).unwrap();
        }

        // removing from the middle relocates the last member
        index.delete(2).unwrap();
        index.delete(0).unwrap();

        let bucket = &index.buckets[BucketMethod::bucket_id(5.0)];
        for (pos, &slot) in bucket.members.iter().enumerate() {
            let placement = index.placements[slot as usize];
            assert_eq!(placement.pos as usize, pos);
            assert_eq!(placement.bucket as usize, BucketMethod::bucket_id(5.0));
        }
        assert_eq!(bucket.members.len(), 4);
    }
}
