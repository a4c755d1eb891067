//! Formatting implementation for the RadixTree

use std::fmt::{Debug, Formatter, Result};

use super::*;

impl<T: Debug> Debug for RadixTree<T> {
    fn fmt(&self, f: &mut Formatter<'_>) -> Result {
        f.debug_map().entries(self.iter()).finish()
    }
}
