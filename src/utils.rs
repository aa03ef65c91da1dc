/// A trait that provides easy access to the first element of a slice.
pub trait Front<T> {
    fn mut_front(&mut self) -> &mut T;
}

/// A trait that provides easy access to the last element of a slice.
pub trait Back<T> {
    fn back(&self) -> &T;
    fn mut_back(&mut self) -> &mut T;
}

impl<T> Front<T> for [T] {
    #[inline(always)]
    fn mut_front(&mut self) -> &mut T {
        &mut self[0]
    }
}

impl<T> Back<T> for [T] {
    #[inline(always)]
    fn back(&self) -> &T {
        &self[self.len() - 1]
    }
    #[inline(always)]
    fn mut_back(&mut self) -> &mut T {
        let i = self.len() - 1;
        &mut self[i]
    }
}

/// Borrows elements `i` and `i + 1` of `items` at once, the first shared and
/// the second mutably.
pub fn read_write<T>(items: &mut [T], i: usize) -> (&T, &mut T) {
    let (before, after) = items[i..].split_at_mut(1);
    (&before[0], &mut after[0])
}

/// Borrows elements `i` and `i + 1` of `items` at once, the first mutably and
/// the second shared.
pub fn write_read<T>(items: &mut [T], i: usize) -> (&mut T, &T) {
    let (before, after) = items[i..].split_at_mut(1);
    (&mut before[0], &after[0])
}
