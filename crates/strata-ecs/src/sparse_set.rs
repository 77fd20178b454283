use crate::entity::Entity;

/// Page length used when no configuration overrides it.
pub const DEFAULT_PAGE_SIZE: usize = 32;

/// Marks a sparse slot whose entity is not a member.
const ABSENT: u32 = u32::MAX;

/// Paged sparse set of entities.
///
/// `dense` holds the members contiguously for iteration. `pages` maps an
/// entity id to its position in `dense`; pages are allocated only when an id
/// inside them is added, so sparse id spaces stay cheap.
///
/// For every member `e`, `pages[page(e)][offset(e)]` is the index of `e` in
/// `dense`; every other allocated slot holds `ABSENT`.
#[derive(Debug, Clone)]
pub struct SparseSet {
    dense: Vec<Entity>,
    pages: Vec<Option<Box<[u32]>>>,
    page_size: usize,
}

impl SparseSet {
    pub fn new() -> Self {
        Self::with_page_size(DEFAULT_PAGE_SIZE)
    }

    /// # Panics
    /// Panics if `page_size` is zero.
    pub fn with_page_size(page_size: usize) -> Self {
        assert!(page_size > 0, "sparse set page size must be non-zero");
        Self {
            dense: Vec::new(),
            pages: Vec::new(),
            page_size,
        }
    }

    fn locate(&self, entity: Entity) -> (usize, usize) {
        let size = self.page_size as u64;
        ((entity.id() / size) as usize, (entity.id() % size) as usize)
    }

    fn slot(&self, entity: Entity) -> Option<u32> {
        let (page, offset) = self.locate(entity);
        let index = self.pages.get(page)?.as_ref()?[offset];
        (index != ABSENT).then_some(index)
    }

    fn slot_mut(&mut self, entity: Entity) -> Option<&mut u32> {
        let (page, offset) = self.locate(entity);
        self.pages.get_mut(page)?.as_mut().map(|p| &mut p[offset])
    }

    /// Add `entity` to the set. Returns `false` if it was already a member.
    pub fn add(&mut self, entity: Entity) -> bool {
        if self.contains(entity) {
            return false;
        }
        let index = self.dense.len() as u32;
        assert!(index != ABSENT, "sparse set is full");

        let (page, offset) = self.locate(entity);
        if page >= self.pages.len() {
            self.pages.resize_with(page + 1, || None);
        }
        let page_size = self.page_size;
        let slots = self.pages[page]
            .get_or_insert_with(|| vec![ABSENT; page_size].into_boxed_slice());
        slots[offset] = index;
        self.dense.push(entity);
        true
    }

    /// Remove `entity`. Returns `false` if it was not a member.
    ///
    /// The last member moves into the vacated position, so removal reorders iteration.
    pub fn remove(&mut self, entity: Entity) -> bool {
        let Some(index) = self.slot(entity) else {
            return false;
        };
        if let Some(slot) = self.slot_mut(entity) {
            *slot = ABSENT;
        }

        let index = index as usize;
        self.dense.swap_remove(index);
        if let Some(&moved) = self.dense.get(index) {
            if let Some(slot) = self.slot_mut(moved) {
                *slot = index as u32;
            }
        }
        true
    }

    pub fn contains(&self, entity: Entity) -> bool {
        self.slot(entity).is_some()
    }

    /// Position of `entity` in the dense sequence.
    pub fn index_of(&self, entity: Entity) -> Option<usize> {
        self.slot(entity).map(|i| i as usize)
    }

    /// Drop every member and every page.
    pub fn clear(&mut self) {
        self.dense.clear();
        self.pages.clear();
    }

    pub fn len(&self) -> usize {
        self.dense.len()
    }

    pub fn is_empty(&self) -> bool {
        self.dense.is_empty()
    }

    pub fn page_size(&self) -> usize {
        self.page_size
    }

    /// Number of pages currently backed by memory.
    pub fn allocated_pages(&self) -> usize {
        self.pages.iter().filter(|p| p.is_some()).count()
    }

    /// Members in dense order.
    pub fn as_slice(&self) -> &[Entity] {
        &self.dense
    }

    pub fn iter(&self) -> impl Iterator<Item = Entity> + '_ {
        self.dense.iter().copied()
    }
}

impl Default for SparseSet {
    fn default() -> Self {
        Self::new()
    }
}

impl<'a> IntoIterator for &'a SparseSet {
    type Item = Entity;
    type IntoIter = std::iter::Copied<std::slice::Iter<'a, Entity>>;

    fn into_iter(self) -> Self::IntoIter {
        self.dense.iter().copied()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rand::rngs::StdRng;
    use rand::{Rng, SeedableRng};

    fn e(id: u64) -> Entity {
        Entity::from_raw(id)
    }

    fn assert_consistent(set: &SparseSet) {
        for (index, entity) in set.iter().enumerate() {
            assert_eq!(set.index_of(entity), Some(index), "{entity:?} out of place");
        }
        let mapped: usize = set
            .pages
            .iter()
            .flatten()
            .map(|page| page.iter().filter(|&&slot| slot != ABSENT).count())
            .sum();
        assert_eq!(mapped, set.len());
    }

    #[test]
    fn add_and_contains() {
        let mut set = SparseSet::new();
        assert!(set.add(e(3)));
        assert!(set.add(e(70)));
        assert!(set.contains(e(3)));
        assert!(set.contains(e(70)));
        assert!(!set.contains(e(4)));
        assert!(!set.contains(e(1_000)));
        assert_eq!(set.len(), 2);
    }

    #[test]
    fn duplicate_add_is_ignored() {
        let mut set = SparseSet::new();
        assert!(set.add(e(5)));
        assert!(!set.add(e(5)));
        assert_eq!(set.len(), 1);
        assert_consistent(&set);
    }

    #[test]
    fn pages_are_allocated_lazily() {
        let mut set = SparseSet::with_page_size(16);
        set.add(e(1_000));
        assert_eq!(set.allocated_pages(), 1);
        set.add(e(1_001));
        assert_eq!(set.allocated_pages(), 1);
        set.add(e(2));
        assert_eq!(set.allocated_pages(), 2);
    }

    #[test]
    fn remove_last_truncates() {
        let mut set = SparseSet::new();
        set.add(e(1));
        set.add(e(2));
        assert!(set.remove(e(2)));
        assert_eq!(set.as_slice(), &[e(1)]);
        assert!(!set.contains(e(2)));
    }

    #[test]
    fn remove_swaps_last_into_hole() {
        let mut set = SparseSet::new();
        set.add(e(10));
        set.add(e(20));
        set.add(e(30));
        assert!(set.remove(e(10)));
        assert_eq!(set.as_slice(), &[e(30), e(20)]);
        assert_eq!(set.index_of(e(30)), Some(0));
        assert!(set.contains(e(30)));
        assert!(!set.contains(e(10)));
        assert_consistent(&set);
    }

    #[test]
    fn remove_absent_is_noop() {
        let mut set = SparseSet::new();
        set.add(e(1));
        assert!(!set.remove(e(2)));
        assert!(!set.remove(e(500)));
        assert_eq!(set.len(), 1);
    }

    #[test]
    fn clear_drops_everything() {
        let mut set = SparseSet::new();
        set.add(e(1));
        set.add(e(100));
        set.clear();
        assert!(set.is_empty());
        assert_eq!(set.allocated_pages(), 0);
        assert!(!set.contains(e(1)));
        assert!(set.add(e(1)));
    }

    #[test]
    fn iteration_is_restartable() {
        let mut set = SparseSet::new();
        set.add(e(4));
        set.add(e(8));
        let first: Vec<_> = set.iter().collect();
        let second: Vec<_> = (&set).into_iter().collect();
        assert_eq!(first, second);
        assert_eq!(first, vec![e(4), e(8)]);
    }

    #[test]
    fn random_operations_keep_dense_and_pages_consistent() {
        let mut rng = StdRng::seed_from_u64(0x5eed);
        let mut set = SparseSet::with_page_size(8);
        let mut live = std::collections::HashSet::new();

        for _ in 0..2_000 {
            let id = rng.gen_range(0..200u64);
            if rng.gen_bool(0.6) {
                assert_eq!(set.add(e(id)), live.insert(id));
            } else {
                assert_eq!(set.remove(e(id)), live.remove(&id));
            }
            assert_eq!(set.len(), live.len());
        }

        for id in 0..200u64 {
            assert_eq!(set.contains(e(id)), live.contains(&id));
        }
        assert_consistent(&set);
    }
}
