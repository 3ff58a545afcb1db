use alloc::vec::Vec;
use core::cmp;

/// Prefix sums over item extents.
#[derive(Clone, Debug, Default)]
pub(crate) struct Fenwick {
    tree: Vec<f64>, // 1-indexed
    max_bit: usize,
}

impl Fenwick {
    /// Builds the tree in `O(n)`.
    pub(crate) fn from_extents(extents: &[f64]) -> Self {
        let n = extents.len();
        let mut tree = alloc::vec![0.0f64; n + 1];
        for i in 1..=n {
            tree[i] += extents[i - 1];
            let j = i + lsb(i);
            if j <= n {
                tree[j] += tree[i];
            }
        }
        Self {
            tree,
            max_bit: highest_power_of_two_leq(n),
        }
    }

    pub(crate) fn len(&self) -> usize {
        self.tree.len().saturating_sub(1)
    }

    pub(crate) fn truncate(&mut self, new_len: usize) {
        if new_len >= self.len() {
            return;
        }
        // Node i only covers indexes <= i, so the surviving prefix stays valid.
        self.tree.truncate(new_len + 1);
        self.max_bit = highest_power_of_two_leq(new_len);
    }

    /// Appends a value in `O(log n)`.
    pub(crate) fn push_value(&mut self, value: f64) {
        let new_len = self.len() + 1;
        // tree[i] stores the sum of the last lsb(i) values ending at i.
        let start_exclusive = new_len - lsb(new_len);
        let before = self.prefix_sum(new_len - 1) - self.prefix_sum(start_exclusive);
        self.tree.push(before + value);
        self.max_bit = highest_power_of_two_leq(new_len);
    }

    /// Rebuilds the nodes covering `values[start..]`, resizing to `values.len()`.
    ///
    /// Nodes up to `start` only cover earlier values and are kept, so this is
    /// `O(values.len() - start + log n)`.
    pub(crate) fn rebuild_from(&mut self, start: usize, values: &[f64]) {
        let n = values.len();
        let start = cmp::min(start, n);
        debug_assert!(start <= self.len(), "rebuild_from past the built prefix");
        self.tree.truncate(start + 1);
        // An empty tree has no sentinel node yet.
        self.tree.resize(start + 1, 0.0);
        self.tree.extend_from_slice(&values[start..]);

        // Kept nodes whose parent is rebuilt: the prefix chain of `start`.
        let mut j = start;
        while j > 0 {
            let parent = j + lsb(j);
            if parent <= n {
                self.tree[parent] += self.tree[j];
            }
            j &= j - 1;
        }
        for i in start + 1..=n {
            let parent = i + lsb(i);
            if parent <= n {
                self.tree[parent] += self.tree[i];
            }
        }
        self.max_bit = highest_power_of_two_leq(n);
    }

    pub(crate) fn add(&mut self, index: usize, delta: f64) {
        let n = self.len();
        if index >= n || delta == 0.0 {
            return;
        }
        let mut i = index + 1;
        while i <= n {
            self.tree[i] += delta;
            i += lsb(i);
        }
    }

    /// Sum of the first `count` values.
    pub(crate) fn prefix_sum(&self, count: usize) -> f64 {
        let mut i = cmp::min(count, self.len());
        let mut sum = 0.0;
        while i > 0 {
            sum += self.tree[i];
            i &= i - 1;
        }
        sum
    }

    /// Returns the number of leading values whose running sum is `<= target`.
    ///
    /// `lower_bound(offset)` is the index of the item covering `offset` (unclamped).
    pub(crate) fn lower_bound(&self, mut target: f64) -> usize {
        let n = self.len();
        if n == 0 || target < 0.0 {
            return 0;
        }

        let mut idx = 0usize;
        let mut bit = self.max_bit;
        while bit != 0 {
            let next = idx + bit;
            if next <= n && self.tree[next] <= target {
                target -= self.tree[next];
                idx = next;
            }
            bit >>= 1;
        }
        idx
    }
}

fn lsb(i: usize) -> usize {
    i & i.wrapping_neg()
}

fn highest_power_of_two_leq(n: usize) -> usize {
    if n == 0 {
        return 0;
    }
    let mut p = 1usize;
    while p <= n / 2 {
        p <<= 1;
    }
    p
}
