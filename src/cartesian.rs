//! Odometer-style iteration over the Cartesian product of several lists,
//! with the ability to skip every remaining combination that shares a
//! prefix with the last one returned.
//!
//! The last dimension changes fastest. After `next()` returns a combination
//! whose elements `0..=i` are already known to be inconsistent, `advance(i)`
//! moves straight to the next combination that differs at dimension `i` or
//! earlier, pruning the whole sub-cube behind it.

pub struct AdvancingIterator<'a, T> {
    space: &'a [Vec<T>],
    /// Position of the next combination to return; None once exhausted.
    next: Option<Vec<usize>>,
    /// Position of the combination last returned by `next()`.
    last: Vec<usize>,
}

impl<'a, T> AdvancingIterator<'a, T> {
    pub fn new(space: &'a [Vec<T>]) -> Self {
        let exhausted = space.is_empty() || space.iter().any(|dim| dim.is_empty());
        Self {
            space,
            next: (!exhausted).then(|| vec![0; space.len()]),
            last: Vec::new(),
        }
    }

    pub fn has_next(&self) -> bool {
        self.next.is_some()
    }

    /// Total number of combinations in the space.
    pub fn size(&self) -> usize {
        space_size(self.space)
    }

    /// Skip all remaining combinations that agree with the last returned
    /// one on dimensions `0..=dim`.
    pub fn advance(&mut self, dim: usize) {
        if self.last.is_empty() || dim >= self.space.len() {
            return;
        }
        let mut pos = self.last.clone();
        for p in pos.iter_mut().skip(dim + 1) {
            *p = 0;
        }
        if increment(&mut pos, dim, self.space) {
            // Never move backwards past a position already queued.
            match &self.next {
                Some(queued) if *queued > pos => {}
                _ => self.next = Some(pos),
            }
        } else {
            self.next = None;
        }
    }
}

impl<'a, T> Iterator for AdvancingIterator<'a, T> {
    type Item = Vec<&'a T>;

    fn next(&mut self) -> Option<Self::Item> {
        let pos = self.next.take()?;
        let item = pos
            .iter()
            .zip(self.space)
            .map(|(&i, dim)| &dim[i])
            .collect();

        let mut following = pos.clone();
        if let Some(last_dim) = following.len().checked_sub(1) {
            if increment(&mut following, last_dim, self.space) {
                self.next = Some(following);
            }
        }
        self.last = pos;
        Some(item)
    }
}

/// Add one at `dim`, carrying towards dimension 0. Returns false when the
/// carry runs off the front.
fn increment<T>(pos: &mut [usize], dim: usize, space: &[Vec<T>]) -> bool {
    let mut d = dim;
    loop {
        pos[d] += 1;
        if pos[d] < space[d].len() {
            return true;
        }
        pos[d] = 0;
        if d == 0 {
            return false;
        }
        d -= 1;
    }
}

/// Number of combinations; zero if any dimension is empty.
pub fn space_size<T>(space: &[Vec<T>]) -> usize {
    if space.is_empty() {
        return 0;
    }
    space
        .iter()
        .map(Vec::len)
        .try_fold(1usize, |acc, n| acc.checked_mul(n))
        .unwrap_or(usize::MAX)
}

#[cfg(test)]
#[path = "tests/cartesian.rs"]
mod tests;
