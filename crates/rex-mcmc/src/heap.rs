/// Double-ended priority queue laid out as a min-max heap in a `Vec`.
///
/// Nodes on even depths are smaller than or equal to all of their
/// descendants, nodes on odd depths are greater than or equal to them. The
/// root therefore holds the minimum and one of its two children the maximum.
/// Insertion and both removals are `O(log n)`; peeks and `len` are `O(1)`.
#[derive(Debug, Clone, PartialEq)]
pub struct MinMaxHeap<T> {
    data: Vec<T>,
}

impl<T> Default for MinMaxHeap<T> {
    fn default() -> Self {
        Self { data: Vec::new() }
    }
}

fn is_min_level(index: usize) -> bool {
    // depth = floor(log2(index + 1))
    (usize::BITS - 1 - (index + 1).leading_zeros()) % 2 == 0
}

fn parent(index: usize) -> usize {
    (index - 1) / 2
}

impl<T: PartialOrd> MinMaxHeap<T> {
    /// Creates an empty heap.
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of stored elements.
    pub fn len(&self) -> usize {
        self.data.len()
    }

    /// Whether the heap is empty.
    pub fn is_empty(&self) -> bool {
        self.data.is_empty()
    }

    /// Removes every element, keeping the allocation.
    pub fn clear(&mut self) {
        self.data.clear();
    }

    /// Element at heap position `index`; positions are stable until the next mutation.
    pub fn get(&self, index: usize) -> Option<&T> {
        self.data.get(index)
    }

    /// Iterates the elements in heap order (not sorted).
    pub fn iter(&self) -> std::slice::Iter<'_, T> {
        self.data.iter()
    }

    /// Smallest element.
    pub fn peek_min(&self) -> Option<&T> {
        self.data.first()
    }

    /// Largest element.
    pub fn peek_max(&self) -> Option<&T> {
        self.max_index().map(|idx| &self.data[idx])
    }

    fn max_index(&self) -> Option<usize> {
        match self.data.len() {
            0 => None,
            1 => Some(0),
            2 => Some(1),
            _ => Some(if self.data[2] > self.data[1] { 2 } else { 1 }),
        }
    }

    /// Inserts `value`.
    pub fn push(&mut self, value: T) {
        self.data.push(value);
        self.bubble_up(self.data.len() - 1);
    }

    /// Removes and returns the smallest element.
    pub fn pop_min(&mut self) -> Option<T> {
        if self.data.is_empty() {
            return None;
        }
        let value = self.data.swap_remove(0);
        if !self.data.is_empty() {
            self.trickle_down(0);
        }
        Some(value)
    }

    /// Removes and returns the largest element.
    pub fn pop_max(&mut self) -> Option<T> {
        let index = self.max_index()?;
        let value = self.data.swap_remove(index);
        if index < self.data.len() {
            self.trickle_down(index);
        }
        Some(value)
    }

    /// Consumes the heap, returning its elements in ascending order.
    pub fn into_sorted_vec(mut self) -> Vec<T> {
        let mut sorted = Vec::with_capacity(self.data.len());
        while let Some(value) = self.pop_min() {
            sorted.push(value);
        }
        sorted
    }

    fn bubble_up(&mut self, index: usize) {
        if index == 0 {
            return;
        }
        let p = parent(index);
        if is_min_level(index) {
            if self.data[index] > self.data[p] {
                self.data.swap(index, p);
                self.bubble_up_max(p);
            } else {
                self.bubble_up_min(index);
            }
        } else if self.data[index] < self.data[p] {
            self.data.swap(index, p);
            self.bubble_up_min(p);
        } else {
            self.bubble_up_max(index);
        }
    }

    fn bubble_up_min(&mut self, mut index: usize) {
        while index >= 3 {
            let grandparent = parent(parent(index));
            if self.data[index] < self.data[grandparent] {
                self.data.swap(index, grandparent);
                index = grandparent;
            } else {
                break;
            }
        }
    }

    fn bubble_up_max(&mut self, mut index: usize) {
        while index >= 3 {
            let grandparent = parent(parent(index));
            if self.data[index] > self.data[grandparent] {
                self.data.swap(index, grandparent);
                index = grandparent;
            } else {
                break;
            }
        }
    }

    fn trickle_down(&mut self, index: usize) {
        if is_min_level(index) {
            self.trickle_down_by(index, |a, b| a < b);
        } else {
            self.trickle_down_by(index, |a, b| a > b);
        }
    }

    /// Shared sift for both level kinds; `better(a, b)` is `<` on min levels and `>` on max levels.
    fn trickle_down_by(&mut self, mut index: usize, better: impl Fn(&T, &T) -> bool) {
        loop {
            let first_child = 2 * index + 1;
            if first_child >= self.data.len() {
                return;
            }
            // Children and grandchildren are contiguous: 2i+1..=2i+2 and 4i+3..=4i+6.
            let mut best = first_child;
            let candidates = std::iter::once(first_child + 1)
                .chain(4 * index + 3..=4 * index + 6)
                .filter(|&c| c < self.data.len());
            for candidate in candidates {
                if better(&self.data[candidate], &self.data[best]) {
                    best = candidate;
                }
            }
            if !better(&self.data[best], &self.data[index]) {
                return;
            }
            self.data.swap(best, index);
            if best <= first_child + 1 {
                return;
            }
            let p = parent(best);
            if better(&self.data[p], &self.data[best]) {
                self.data.swap(p, best);
            }
            index = best;
        }
    }
}
