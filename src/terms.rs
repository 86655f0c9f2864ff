//! Free-text partition terms.
//!
//! A term of width `k` is a `k`-combination of the alphabet rendered as a
//! string. Letter order doesn't change what a term matches, so only
//! combinations are produced, in lexicographic order of alphabet positions.

/// The `k`-combinations of an alphabet. Cheap to clone; every call to
/// [`TermSpace::iter`] starts a fresh enumeration.
#[derive(Debug, Clone)]
pub struct TermSpace {
    alphabet: Vec<char>,
    width: usize,
}

impl TermSpace {
    pub fn new(alphabet: &[char], width: usize) -> Self {
        Self {
            alphabet: alphabet.to_vec(),
            width,
        }
    }

    /// Number of terms, `C(n, k)`. Width 0 is the unfiltered root and has no terms.
    pub fn term_count(&self) -> u128 {
        let n = self.alphabet.len() as u128;
        let k = self.width as u128;
        if k == 0 || k > n {
            return 0;
        }
        let k = k.min(n - k);
        (0..k).fold(1u128, |acc, i| acc * (n - i) / (i + 1))
    }

    pub fn iter(&self) -> Terms<'_> {
        let indices = if self.width == 0 || self.width > self.alphabet.len() {
            None
        } else {
            Some((0..self.width).collect())
        };
        Terms {
            alphabet: &self.alphabet,
            indices,
        }
    }
}

impl<'a> IntoIterator for &'a TermSpace {
    type Item = String;
    type IntoIter = Terms<'a>;

    fn into_iter(self) -> Self::IntoIter {
        self.iter()
    }
}

/// Lazy producer over a [`TermSpace`]. Holds only the current index vector.
#[derive(Debug, Clone)]
pub struct Terms<'a> {
    alphabet: &'a [char],
    /// Positions of the next combination, `None` once exhausted.
    indices: Option<Vec<usize>>,
}

impl Iterator for Terms<'_> {
    type Item = String;

    fn next(&mut self) -> Option<String> {
        let indices = self.indices.as_mut()?;
        let term = indices.iter().map(|&i| self.alphabet[i]).collect();

        let n = self.alphabet.len();
        let k = indices.len();
        // Rightmost position that can still move forward.
        match (0..k).rev().find(|&i| indices[i] < n - k + i) {
            Some(i) => {
                indices[i] += 1;
                for j in i + 1..k {
                    indices[j] = indices[j - 1] + 1;
                }
            }
            None => self.indices = None,
        }
        Some(term)
    }
}
