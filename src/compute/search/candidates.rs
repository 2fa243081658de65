//! Candidate generation: equipment layouts and modifier pages.

use std::collections::HashSet;

use crate::schema::{ItemRecord, ModifierRecord, SearchError, Stat};

use crate::compute::build::{EQUIPMENT_SLOTS, Equipment, EquipmentSlot, ModifierSet};

/// Largest level pool; each level takes one byte of the packed permutation key.
pub const MAX_POOL: usize = 8;

/// Pad `slots` with empty placeholders to a full equipment array.
pub fn fixed_equipment<'a>(slots: &[EquipmentSlot<'a>]) -> Equipment<'a> {
    let mut equipment = [EquipmentSlot::EMPTY; EQUIPMENT_SLOTS];
    for (target, slot) in equipment.iter_mut().zip(slots) {
        *target = *slot;
    }
    equipment
}

/// Every distinct ordering of `pool`, in factorial-index order.
///
/// Orderings that repeat an earlier one (possible when the pool has repeated
/// values) are dropped.
pub fn level_permutations(pool: &[u8]) -> Result<Vec<Vec<u8>>, SearchError> {
    if pool.len() > MAX_POOL {
        return Err(SearchError::TooMany {
            what: "search levels",
            count: pool.len(),
            max: MAX_POOL,
        });
    }

    let n = pool.len();
    let total: u64 = (1..=n as u64).product();
    let mut seen = HashSet::new();
    let mut permutations = Vec::new();

    for index in 0..total {
        let mut rest = index;
        let mut remaining: Vec<usize> = (0..n).collect();
        let mut permutation = Vec::with_capacity(n);
        let mut key = 0u64;

        for slot in 0..n {
            let radix = remaining.len() as u64;
            let pick = (rest % radix) as usize;
            rest /= radix;

            let value = pool[remaining.remove(pick)];
            key |= u64::from(value) << (8 * slot);
            permutation.push(value);
        }

        if seen.insert(key) {
            permutations.push(permutation);
        }
    }

    log::debug!(
        "{} distinct level assignments out of {} orderings",
        permutations.len(),
        total
    );
    Ok(permutations)
}

/// Equipment candidates for a level-pool search.
///
/// Pinned slots come first, then empty padding, then the free items with
/// their assigned levels.
pub fn item_level_candidates<'a>(
    pinned: &[EquipmentSlot<'a>],
    free: &[&'a ItemRecord],
    pool: &[u8],
) -> Result<Vec<Equipment<'a>>, SearchError> {
    if free.len() < 2 {
        return Err(SearchError::TooFewFreeItems(free.len()));
    }
    if free.len() != pool.len() {
        return Err(SearchError::PoolMismatch {
            items: free.len(),
            pool: pool.len(),
        });
    }
    if pinned.len() + free.len() > EQUIPMENT_SLOTS {
        return Err(SearchError::TooMany {
            what: "items",
            count: pinned.len() + free.len(),
            max: EQUIPMENT_SLOTS,
        });
    }

    let padding = EQUIPMENT_SLOTS - pinned.len() - free.len();
    let candidates = level_permutations(pool)?
        .into_iter()
        .map(|levels| {
            let mut equipment = [EquipmentSlot::EMPTY; EQUIPMENT_SLOTS];
            for (i, slot) in pinned.iter().enumerate() {
                equipment[i] = *slot;
            }
            let offset = pinned.len() + padding;
            for (i, (item, level)) in free.iter().zip(levels).enumerate() {
                equipment[offset + i] = EquipmentSlot::new(item, level);
            }
            equipment
        })
        .collect();
    Ok(candidates)
}

/// Fill the slots left after `pinned` with every combination of `pool`
/// items at `level`, in increasing pool order.
pub fn item_combinations<'a>(
    pinned: &[EquipmentSlot<'a>],
    pool: &[&'a ItemRecord],
    level: u8,
) -> Result<Vec<Equipment<'a>>, SearchError> {
    if pinned.len() > EQUIPMENT_SLOTS {
        return Err(SearchError::TooMany {
            what: "items",
            count: pinned.len(),
            max: EQUIPMENT_SLOTS,
        });
    }
    let open = EQUIPMENT_SLOTS - pinned.len();
    let mut candidates = Vec::new();
    let mut chosen = Vec::with_capacity(open);
    choose(pool, open, 0, &mut chosen, &mut |picked| {
        let mut equipment = fixed_equipment(pinned);
        for (i, &index) in picked.iter().enumerate() {
            equipment[pinned.len() + i] = EquipmentSlot::new(pool[index], level);
        }
        candidates.push(equipment);
    });

    log::debug!(
        "{} item combinations of {} from {} items",
        candidates.len(),
        open,
        pool.len()
    );
    Ok(candidates)
}

fn choose<T>(
    pool: &[T],
    k: usize,
    start: usize,
    chosen: &mut Vec<usize>,
    emit: &mut impl FnMut(&[usize]),
) {
    if chosen.len() == k {
        emit(chosen);
        return;
    }
    let needed = k - chosen.len();
    for index in start..pool.len() {
        if pool.len() - index < needed {
            break;
        }
        chosen.push(index);
        choose(pool, k, index + 1, chosen, emit);
        chosen.pop();
    }
}

/// Minimums a full modifier page must meet.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct PageConstraints {
    /// Minimum picks per family.
    pub min_family: Vec<(String, usize)>,
    /// Minimum summed page value per stat.
    pub min_stat: Vec<(Stat, f64)>,
}

impl PageConstraints {
    pub fn is_empty(&self) -> bool {
        self.min_family.is_empty() && self.min_stat.is_empty()
    }

    pub fn accepts(&self, page: &ModifierSet<'_>) -> bool {
        let families_ok = self
            .min_family
            .iter()
            .all(|(family, min)| page.family_count(family) >= *min);
        if !families_ok {
            return false;
        }
        if self.min_stat.is_empty() {
            return true;
        }
        let stats = page.stats();
        self.min_stat
            .iter()
            .all(|(stat, min)| stats.get(*stat) + 1e-9 >= *min)
    }
}

/// Every full page buildable from `palette` (modifier, maximum count) that
/// satisfies `constraints`.
pub fn expand_modifier_sets<'a>(
    palette: &[(&'a ModifierRecord, usize)],
    constraints: &PageConstraints,
) -> Vec<ModifierSet<'a>> {
    // reachable[i]: most picks entries i.. can still contribute
    let mut reachable = vec![0; palette.len() + 1];
    for i in (0..palette.len()).rev() {
        reachable[i] = reachable[i + 1] + palette[i].1.min(ModifierSet::CAPACITY);
    }

    let mut pages = Vec::new();
    let mut current = Vec::new();
    let mut generated = 0usize;
    expand(
        palette,
        &reachable,
        0,
        ModifierSet::CAPACITY,
        &mut current,
        &mut |picks| {
            generated += 1;
            let page = ModifierSet::from_full(picks.to_vec());
            if constraints.accepts(&page) {
                pages.push(page);
            }
        },
    );

    log::debug!(
        "{} modifier pages kept of {} full pages from a palette of {}",
        pages.len(),
        generated,
        palette.len()
    );
    pages
}

fn expand<'a>(
    palette: &[(&'a ModifierRecord, usize)],
    reachable: &[usize],
    index: usize,
    remaining: usize,
    current: &mut Vec<(&'a ModifierRecord, usize)>,
    emit: &mut impl FnMut(&[(&'a ModifierRecord, usize)]),
) {
    if remaining == 0 {
        emit(current);
        return;
    }
    if index == palette.len() || reachable[index] < remaining {
        return;
    }

    let (modifier, max) = palette[index];
    for count in 0..=max.min(remaining) {
        if count > 0 {
            current.push((modifier, count));
        }
        expand(palette, reachable, index + 1, remaining - count, current, emit);
        if count > 0 {
            current.pop();
        }
    }
}
