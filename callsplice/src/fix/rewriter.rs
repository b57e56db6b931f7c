//! Byte-range safe text rewriter.
//!
//! Edits are expressed against the *original* source using byte offsets, so
//! callers never have to account for shifts caused by earlier edits.
//!
//! # Usage
//!
//! ```
//! use callsplice::fix::{ByteRangeRewriter, Edit};
//!
//! let source = "foreach ($a as $b) { f(); }";
//! let mut rewriter = ByteRangeRewriter::new(source);
//! rewriter.add_edit(Edit::insert(21, "$r = "));
//! let fixed = rewriter.apply().expect("should apply");
//! assert_eq!(fixed, "foreach ($a as $b) { $r = f(); }");
//! ```

use std::fmt;

/// A single edit operation
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Edit {
    /// Start byte offset (inclusive)
    pub start_byte: usize,
    /// End byte offset (exclusive)
    pub end_byte: usize,
    /// Replacement content
    pub replacement: String,
}

impl Edit {
    /// Create a new edit
    #[must_use]
    pub fn new(start_byte: usize, end_byte: usize, replacement: impl Into<String>) -> Self {
        Self {
            start_byte,
            end_byte,
            replacement: replacement.into(),
        }
    }

    /// Create an insertion edit (insert before position)
    #[must_use]
    pub fn insert(position: usize, content: impl Into<String>) -> Self {
        Self::new(position, position, content)
    }

    /// Whether this edit only inserts text
    #[must_use]
    pub const fn is_insertion(&self) -> bool {
        self.start_byte == self.end_byte
    }

    /// Check if this edit overlaps with another.
    ///
    /// Two insertions at the same offset do not overlap; they are applied in
    /// the order they were added.
    #[must_use]
    pub const fn overlaps(&self, other: &Self) -> bool {
        self.start_byte < other.end_byte && other.start_byte < self.end_byte
    }
}

/// Error during rewriting
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RewriteError {
    /// Two or more edits have overlapping ranges
    OverlappingEdits {
        /// Index of first overlapping edit
        edit_a: usize,
        /// Index of second overlapping edit
        edit_b: usize,
    },
    /// Edit range is out of bounds or inverted
    OutOfBounds {
        /// Index of the bad edit
        edit_index: usize,
        /// End byte of the edit
        end_byte: usize,
        /// Length of the source
        source_len: usize,
    },
    /// An edit boundary falls inside a multi-byte character
    NotCharBoundary {
        /// Index of the bad edit
        edit_index: usize,
        /// Offending byte offset
        byte: usize,
    },
}

impl fmt::Display for RewriteError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::OverlappingEdits { edit_a, edit_b } => {
                write!(f, "Overlapping edits at indices {edit_a} and {edit_b}")
            }
            Self::OutOfBounds {
                edit_index,
                end_byte,
                source_len,
            } => {
                write!(
                    f,
                    "Edit {edit_index} out of bounds: end_byte {end_byte} > source length {source_len}"
                )
            }
            Self::NotCharBoundary { edit_index, byte } => {
                write!(
                    f,
                    "Edit {edit_index} splits a UTF-8 character at byte {byte}"
                )
            }
        }
    }
}

impl std::error::Error for RewriteError {}

/// Safe text rewriter using byte ranges
///
/// This rewriter applies edits in reverse order to preserve byte positions,
/// and validates that edits don't overlap.
#[derive(Debug, Clone)]
pub struct ByteRangeRewriter {
    /// Original source text
    source: String,
    /// Pending edits
    edits: Vec<Edit>,
}

impl ByteRangeRewriter {
    /// Create a new rewriter for the given source
    #[must_use]
    pub fn new(source: impl Into<String>) -> Self {
        Self {
            source: source.into(),
            edits: Vec::new(),
        }
    }

    /// Add an edit to the pending list
    pub fn add_edit(&mut self, edit: Edit) {
        self.edits.push(edit);
    }

    /// Add multiple edits
    pub fn add_edits(&mut self, edits: impl IntoIterator<Item = Edit>) {
        self.edits.extend(edits);
    }

    /// Pending edits, in the order they were added
    #[must_use]
    pub fn edits(&self) -> &[Edit] {
        &self.edits
    }

    /// Check if there are any pending edits
    #[must_use]
    pub fn has_edits(&self) -> bool {
        !self.edits.is_empty()
    }

    /// Validate edits without applying them
    ///
    /// # Errors
    /// Returns error if edits overlap, are out of bounds, or split a character
    pub fn validate(&self) -> Result<(), RewriteError> {
        for (i, edit) in self.edits.iter().enumerate() {
            if edit.end_byte > self.source.len() || edit.start_byte > edit.end_byte {
                return Err(RewriteError::OutOfBounds {
                    edit_index: i,
                    end_byte: edit.end_byte,
                    source_len: self.source.len(),
                });
            }
            for byte in [edit.start_byte, edit.end_byte] {
                if !self.source.is_char_boundary(byte) {
                    return Err(RewriteError::NotCharBoundary {
                        edit_index: i,
                        byte,
                    });
                }
            }
        }

        // Neighbours in start order are enough to find any overlap.
        let mut order: Vec<usize> = (0..self.edits.len()).collect();
        order.sort_by_key(|&i| (self.edits[i].start_byte, self.edits[i].end_byte));
        for pair in order.windows(2) {
            let (a, b) = (pair[0], pair[1]);
            if self.edits[a].overlaps(&self.edits[b]) {
                return Err(RewriteError::OverlappingEdits {
                    edit_a: a.min(b),
                    edit_b: a.max(b),
                });
            }
        }

        Ok(())
    }

    /// Apply all edits and return the modified source
    ///
    /// Edits are applied from the end of the text towards the start so the
    /// offsets of the remaining edits stay valid.
    ///
    /// # Errors
    /// Returns error if edits overlap, are out of bounds, or split a character
    pub fn apply(self) -> Result<String, RewriteError> {
        self.validate()?;

        let mut result = self.source;
        let mut indexed: Vec<(usize, Edit)> = self.edits.into_iter().enumerate().collect();

        // Descending by start, replacements before insertions at the same
        // start, and among equal ranges the later edit first so earlier
        // insertions end up in front.
        indexed.sort_by(|(ia, a), (ib, b)| {
            b.start_byte
                .cmp(&a.start_byte)
                .then(b.end_byte.cmp(&a.end_byte))
                .then(ib.cmp(ia))
        });

        for (_, edit) in indexed {
            result.replace_range(edit.start_byte..edit.end_byte, &edit.replacement);
        }

        Ok(result)
    }
}

/// Builder for constructing multiple edits
#[derive(Debug, Default)]
pub struct EditBuilder {
    edits: Vec<Edit>,
}

impl EditBuilder {
    /// Create a new edit builder
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Add an insertion edit
    #[must_use]
    pub fn insert(mut self, position: usize, content: impl Into<String>) -> Self {
        self.edits.push(Edit::insert(position, content));
        self
    }

    /// Build the list of edits
    #[must_use]
    pub fn build(self) -> Vec<Edit> {
        self.edits
    }
}
