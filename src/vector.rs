//! Persistent (immutable) vector based on a radix balanced tree.
//!
//! This module provides [`RadixVector`], an immutable indexed sequence
//! that uses structural sharing for efficient operations.
//!
//! # Internal Structure
//!
//! A vector is a 32-way branching trie plus a tail buffer:
//!
//! - The trie holds all elements except the most recently appended ones,
//!   packed into 32-element leaves. Off the rightmost path every branch
//!   is fully populated, so child arrays are dense and a slot index can
//!   be computed from the element index with shifts and masks alone.
//! - The tail buffer holds up to 32 trailing elements. Appends copy only
//!   the tail; once it fills, the whole buffer is pushed into the trie as
//!   a leaf by bumping a reference count, not by copying elements.
//!
//! All operations return new vectors without modifying the original, and
//! unchanged subtrees are shared between the old and new versions.

use std::fmt;

use arrayvec::ArrayVec;
use smallvec::SmallVec;
use static_assertions::const_assert_eq;

use crate::Shared;
use crate::error::VectorError;

// =============================================================================
// Constants
// =============================================================================

/// Branching factor: children per branch and elements per leaf.
const BRANCH_WIDTH: usize = 32;

/// Bits of the index consumed per tree level.
const WIDTH_BITS: usize = 5;

/// Bit mask for extracting a slot index within a node.
const INDEX_MASK: usize = BRANCH_WIDTH - 1;

/// Maximum tree depth for 32-bit element counts; sizes iterator stacks.
const MAX_DEPTH: usize = 8;

const_assert_eq!(BRANCH_WIDTH, 1 << WIDTH_BITS);

// =============================================================================
// Node Definition
// =============================================================================

/// Child array of a branch node. Dense: only the rightmost path of the
/// tree may leave trailing slots unused, which the fill count expresses.
type Children<T> = ArrayVec<Shared<Node<T>>, BRANCH_WIDTH>;

/// Element array of a leaf node (and of the tail buffer).
type Slots<T> = ArrayVec<T, BRANCH_WIDTH>;

/// Internal node of the radix balanced tree.
///
/// Leaves keep their slots behind a shared pointer so a full tail buffer
/// can become a leaf without copying its elements.
enum Node<T> {
    /// Branch node containing child nodes.
    Branch(Children<T>),
    /// Leaf node containing element values.
    Leaf(Shared<Slots<T>>),
}

// =============================================================================
// RadixVector Definition
// =============================================================================

/// A persistent (immutable) vector based on a radix balanced tree.
///
/// Every operation that would modify the vector returns a new handle and
/// leaves the original untouched; the two handles share all unchanged
/// subtrees. A handle is a few words plus shared references, so cloning
/// one is O(1).
///
/// # Time Complexity
///
/// | Operation    | Complexity                      |
/// |--------------|---------------------------------|
/// | `new`        | O(1)                            |
/// | `len`        | O(1)                            |
/// | `get`        | O(log32 N)                      |
/// | `set`        | O(log32 N)                      |
/// | `push`       | O(log32 N), amortized O(1)      |
/// | `pop`        | O(log32 N)                      |
/// | `from_slice` | O(N)                            |
/// | `iter`       | O(1) to create, O(N) to iterate |
///
/// # Examples
///
/// ```rust
/// use radixvec::RadixVector;
///
/// let vector: RadixVector<i32> = (0..100).collect();
/// assert_eq!(vector.len(), 100);
/// assert_eq!(vector.get(50), Ok(&50));
/// ```
pub struct RadixVector<T> {
    /// Total number of elements, including those in the tail.
    length: usize,
    /// Shift amount for index calculation: (tree height - 1) * `WIDTH_BITS`.
    shift: usize,
    /// Root of the trie; `None` while every element fits in the tail.
    root: Option<Shared<Node<T>>>,
    /// Tail buffer holding the most recently appended elements.
    tail: Shared<Slots<T>>,
}

impl<T> Clone for RadixVector<T> {
    fn clone(&self) -> Self {
        Self {
            length: self.length,
            shift: self.shift,
            root: self.root.clone(),
            tail: self.tail.clone(),
        }
    }
}

impl<T> RadixVector<T> {
    /// Creates a new empty vector.
    ///
    /// # Examples
    ///
    /// ```rust
    /// use radixvec::RadixVector;
    ///
    /// let vector: RadixVector<i32> = RadixVector::new();
    /// assert!(vector.is_empty());
    /// ```
    #[inline]
    #[must_use]
    pub fn new() -> Self {
        Self {
            length: 0,
            shift: WIDTH_BITS,
            root: None,
            tail: Shared::new(Slots::new()),
        }
    }

    /// Creates a vector containing a single element.
    ///
    /// # Examples
    ///
    /// ```rust
    /// use radixvec::RadixVector;
    ///
    /// let vector = RadixVector::singleton(42);
    /// assert_eq!(vector.len(), 1);
    /// assert_eq!(vector.get(0), Ok(&42));
    /// ```
    #[inline]
    #[must_use]
    pub fn singleton(element: T) -> Self {
        let mut tail = Slots::new();
        tail.push(element);
        Self {
            length: 1,
            shift: WIDTH_BITS,
            root: None,
            tail: Shared::new(tail),
        }
    }

    /// Returns the number of elements in the vector.
    #[inline]
    #[must_use]
    pub const fn len(&self) -> usize {
        self.length
    }

    /// Returns `true` if the vector contains no elements.
    #[inline]
    #[must_use]
    pub const fn is_empty(&self) -> bool {
        self.length == 0
    }

    /// Returns the index of the first element held by the tail buffer.
    ///
    /// Elements at this index and above live in the tail; everything
    /// below lives in the tree.
    #[inline]
    const fn tail_offset(&self) -> usize {
        if self.length < BRANCH_WIDTH {
            0
        } else {
            ((self.length - 1) >> WIDTH_BITS) << WIDTH_BITS
        }
    }

    /// Returns a reference to the element at the given index.
    ///
    /// Indices are never clamped: any index at or past the length fails
    /// with [`VectorError::IndexOutOfRange`].
    ///
    /// # Errors
    ///
    /// Returns [`VectorError::IndexOutOfRange`] if `index >= self.len()`.
    ///
    /// # Examples
    ///
    /// ```rust
    /// use radixvec::{RadixVector, VectorError};
    ///
    /// let vector: RadixVector<i32> = (1..=5).collect();
    /// assert_eq!(vector.get(0), Ok(&1));
    /// assert_eq!(vector.get(4), Ok(&5));
    /// assert_eq!(
    ///     vector.get(10),
    ///     Err(VectorError::IndexOutOfRange { index: 10, length: 5 })
    /// );
    /// ```
    pub fn get(&self, index: usize) -> Result<&T, VectorError> {
        let out_of_range = VectorError::IndexOutOfRange {
            index,
            length: self.length,
        };

        if index >= self.length {
            return Err(out_of_range);
        }

        let tail_offset = self.tail_offset();

        if index >= tail_offset {
            // Element is in the tail
            self.tail.get(index - tail_offset).ok_or(out_of_range)
        } else {
            // Element is in the tree
            self.tree_element(index).ok_or(out_of_range)
        }
    }

    /// Gets an element from the tree by radix descent.
    fn tree_element(&self, index: usize) -> Option<&T> {
        let mut node = self.root.as_ref()?;
        let mut level = self.shift;

        while level > 0 {
            match node.as_ref() {
                Node::Branch(children) => {
                    node = children.get((index >> level) & INDEX_MASK)?;
                    level -= WIDTH_BITS;
                }
                Node::Leaf(_) => break,
            }
        }

        match node.as_ref() {
            Node::Leaf(slots) => slots.get(index & INDEX_MASK),
            Node::Branch(_) => None,
        }
    }

    /// Returns a reference to the first element, or `None` if empty.
    #[inline]
    #[must_use]
    pub fn first(&self) -> Option<&T> {
        self.get(0).ok()
    }

    /// Returns a reference to the last element, or `None` if empty.
    ///
    /// O(1): the last element is always in the tail.
    #[inline]
    #[must_use]
    pub fn last(&self) -> Option<&T> {
        if self.is_empty() {
            None
        } else {
            self.tail.last()
        }
    }

    /// Returns an iterator over references to the elements, front to back.
    ///
    /// Iteration walks leaf-array blocks with a bounded traversal stack,
    /// visiting each node once, so the whole pass is O(N).
    ///
    /// # Examples
    ///
    /// ```rust
    /// use radixvec::RadixVector;
    ///
    /// let vector: RadixVector<i32> = (1..=5).collect();
    /// let collected: Vec<&i32> = vector.iter().collect();
    /// assert_eq!(collected, vec![&1, &2, &3, &4, &5]);
    /// ```
    #[must_use]
    pub fn iter(&self) -> RadixVectorIterator<'_, T> {
        RadixVectorIterator::new(self)
    }

    /// Returns the leaf covering the given offset, for tail refill on pop.
    fn leaf_at(&self, offset: usize) -> Shared<Slots<T>> {
        let mut node = match self.root.as_ref() {
            Some(root) => root,
            None => return Shared::new(Slots::new()),
        };
        let mut level = self.shift;

        while level > 0 {
            match node.as_ref() {
                Node::Branch(children) => {
                    match children.get((offset >> level) & INDEX_MASK) {
                        Some(child) => {
                            node = child;
                            level -= WIDTH_BITS;
                        }
                        None => return Shared::new(Slots::new()),
                    }
                }
                Node::Leaf(_) => break,
            }
        }

        match node.as_ref() {
            Node::Leaf(slots) => slots.clone(),
            Node::Branch(_) => Shared::new(Slots::new()),
        }
    }

    /// Builds a single-child path of the given height down to a node.
    fn new_path(level: usize, node: Node<T>) -> Node<T> {
        if level == 0 {
            node
        } else {
            let mut children = Children::new();
            children.push(Shared::new(Self::new_path(level - WIDTH_BITS, node)));
            Node::Branch(children)
        }
    }

    /// Pushes a promoted tail leaf down the rightmost edge of the tree,
    /// copying only the nodes along that edge.
    fn push_leaf(
        node: &Node<T>,
        level: usize,
        tail_offset: usize,
        leaf: Shared<Slots<T>>,
    ) -> Node<T> {
        match node {
            Node::Branch(children) => {
                let slot = (tail_offset >> level) & INDEX_MASK;
                let mut new_children = children.clone();

                let new_child = if level == WIDTH_BITS {
                    // Bottom branch level: the leaf becomes a direct child
                    Shared::new(Node::Leaf(leaf))
                } else if let Some(child) = children.get(slot) {
                    Shared::new(Self::push_leaf(child, level - WIDTH_BITS, tail_offset, leaf))
                } else {
                    Shared::new(Self::new_path(level - WIDTH_BITS, Node::Leaf(leaf)))
                };

                if slot < new_children.len() {
                    new_children[slot] = new_child;
                } else {
                    new_children.push(new_child);
                }

                Node::Branch(new_children)
            }
            // Unreachable in a well-formed tree
            Node::Leaf(_) => Node::Leaf(leaf),
        }
    }

    /// Removes the rightmost leaf, returning `None` for nodes that become
    /// empty so ancestors can drop them from their child arrays.
    fn drop_rightmost_leaf(node: &Node<T>, level: usize, offset: usize) -> Option<Node<T>> {
        match node {
            Node::Branch(children) => {
                let slot = (offset >> level) & INDEX_MASK;
                let mut new_children = children.clone();

                if level == WIDTH_BITS {
                    new_children.pop();
                } else if let Some(child) = children.get(slot) {
                    match Self::drop_rightmost_leaf(child, level - WIDTH_BITS, offset) {
                        Some(new_child) => new_children[slot] = Shared::new(new_child),
                        None => {
                            new_children.pop();
                        }
                    }
                }

                if new_children.is_empty() {
                    None
                } else {
                    Some(Node::Branch(new_children))
                }
            }
            Node::Leaf(_) => None,
        }
    }

    /// Removes the rightmost leaf from the tree and demotes a single-child
    /// root by one level, mirroring root growth on push.
    fn pop_tail_leaf(&self, offset: usize) -> (Option<Shared<Node<T>>>, usize) {
        let root = match self.root.as_ref() {
            Some(root) => root,
            None => return (None, WIDTH_BITS),
        };

        match Self::drop_rightmost_leaf(root, self.shift, offset) {
            None => (None, WIDTH_BITS),
            Some(Node::Branch(children))
                if self.shift > WIDTH_BITS && children.len() == 1 =>
            {
                (Some(children[0].clone()), self.shift - WIDTH_BITS)
            }
            Some(node) => (Some(Shared::new(node)), self.shift),
        }
    }

    /// Builds a vector from an owned buffer in O(N), bottom-up.
    fn from_buffer(elements: Vec<T>) -> Self {
        if elements.is_empty() {
            return Self::new();
        }

        let length = elements.len();

        // Small vectors live entirely in the tail
        if length <= BRANCH_WIDTH {
            let tail: Slots<T> = elements.into_iter().collect();
            return Self {
                length,
                shift: WIDTH_BITS,
                root: None,
                tail: Shared::new(tail),
            };
        }

        // The trailing 1..=32 elements become the tail; the rest fill
        // whole leaves, keeping the tree leaf-aligned.
        let mut tail_length = length % BRANCH_WIDTH;
        if tail_length == 0 {
            tail_length = BRANCH_WIDTH;
        }

        let mut elements = elements;
        let tail_elements = elements.split_off(length - tail_length);
        let (root, shift) = Self::build_tree(elements);

        Self {
            length,
            shift,
            root: Some(root),
            tail: Shared::new(tail_elements.into_iter().collect()),
        }
    }

    /// Builds the tree for a leaf-aligned buffer, level by level.
    fn build_tree(elements: Vec<T>) -> (Shared<Node<T>>, usize) {
        let mut level_nodes: Vec<Shared<Node<T>>> =
            Vec::with_capacity(elements.len().div_ceil(BRANCH_WIDTH));
        let mut iter = elements.into_iter();

        loop {
            let slots: Slots<T> = iter.by_ref().take(BRANCH_WIDTH).collect();
            if slots.is_empty() {
                break;
            }
            level_nodes.push(Shared::new(Node::Leaf(Shared::new(slots))));
        }

        let mut shift = WIDTH_BITS;

        while level_nodes.len() > BRANCH_WIDTH {
            let mut next_level: Vec<Shared<Node<T>>> =
                Vec::with_capacity(level_nodes.len().div_ceil(BRANCH_WIDTH));
            for chunk in level_nodes.chunks(BRANCH_WIDTH) {
                let children: Children<T> = chunk.iter().cloned().collect();
                next_level.push(Shared::new(Node::Branch(children)));
            }
            level_nodes = next_level;
            shift += WIDTH_BITS;
        }

        let root_children: Children<T> = level_nodes.into_iter().collect();
        (Shared::new(Node::Branch(root_children)), shift)
    }
}

impl<T: Clone> RadixVector<T> {
    /// Appends an element to the back of the vector.
    ///
    /// Returns a new vector; the original is unchanged. Appending copies
    /// at most the 32-element tail buffer, and once per 32 pushes the
    /// full buffer is promoted into the tree along a single rightmost
    /// path, which amortizes to O(1) per push.
    ///
    /// # Examples
    ///
    /// ```rust
    /// use radixvec::RadixVector;
    ///
    /// let vector = RadixVector::new().push(1).push(2).push(3);
    /// assert_eq!(vector.len(), 3);
    /// assert_eq!(vector.get(2), Ok(&3));
    /// ```
    #[must_use]
    pub fn push(&self, element: T) -> Self {
        if self.tail.len() < BRANCH_WIDTH {
            // Tail has space, copy it and append
            let mut new_tail = self.tail.as_ref().clone();
            new_tail.push(element);

            Self {
                length: self.length + 1,
                shift: self.shift,
                root: self.root.clone(),
                tail: Shared::new(new_tail),
            }
        } else {
            self.push_full_tail(element)
        }
    }

    /// Promotes the full tail into the tree as a leaf and starts a fresh
    /// tail with the pushed element.
    fn push_full_tail(&self, element: T) -> Self {
        // Promoting the tail is a reference-count bump, not an element copy
        let leaf = self.tail.clone();
        let tail_offset = self.tail_offset();

        let mut new_tail = Slots::new();
        new_tail.push(element);

        let (root, shift) = match &self.root {
            None => {
                // First leaf: the tree starts at height one
                let mut children = Children::new();
                children.push(Shared::new(Node::Leaf(leaf)));
                (Shared::new(Node::Branch(children)), WIDTH_BITS)
            }
            Some(root) if (tail_offset >> self.shift) >= BRANCH_WIDTH => {
                // Tree is full at the current height: grow a new root
                // whose first child is the old root
                let mut children = Children::new();
                children.push(root.clone());
                children.push(Shared::new(Self::new_path(self.shift, Node::Leaf(leaf))));
                (
                    Shared::new(Node::Branch(children)),
                    self.shift + WIDTH_BITS,
                )
            }
            Some(root) => (
                Shared::new(Self::push_leaf(root, self.shift, tail_offset, leaf)),
                self.shift,
            ),
        };

        Self {
            length: self.length + 1,
            shift,
            root: Some(root),
            tail: Shared::new(new_tail),
        }
    }

    /// Returns a new vector with the element at `index` replaced.
    ///
    /// Copies the nodes along the path to the target leaf and shares
    /// every other node with the original; a tail hit copies only the
    /// tail buffer.
    ///
    /// # Errors
    ///
    /// Returns [`VectorError::IndexOutOfRange`] if `index >= self.len()`.
    /// The original vector is unchanged on any error path.
    ///
    /// # Examples
    ///
    /// ```rust
    /// use radixvec::RadixVector;
    ///
    /// let vector: RadixVector<i32> = (1..=5).collect();
    /// let updated = vector.set(2, 100).unwrap();
    ///
    /// assert_eq!(updated.get(2), Ok(&100));
    /// assert_eq!(vector.get(2), Ok(&3)); // Original unchanged
    /// ```
    pub fn set(&self, index: usize, element: T) -> Result<Self, VectorError> {
        let out_of_range = VectorError::IndexOutOfRange {
            index,
            length: self.length,
        };

        if index >= self.length {
            return Err(out_of_range);
        }

        let tail_offset = self.tail_offset();

        if index >= tail_offset {
            // Element is in the tail
            let mut new_tail = self.tail.as_ref().clone();
            new_tail[index - tail_offset] = element;

            return Ok(Self {
                length: self.length,
                shift: self.shift,
                root: self.root.clone(),
                tail: Shared::new(new_tail),
            });
        }

        match &self.root {
            Some(root) => Ok(Self {
                length: self.length,
                shift: self.shift,
                root: Some(Shared::new(Self::set_in_node(
                    root, self.shift, index, element,
                ))),
                tail: self.tail.clone(),
            }),
            None => Err(out_of_range),
        }
    }

    /// Path-copying update: one new node per level, siblings shared.
    fn set_in_node(node: &Node<T>, level: usize, index: usize, element: T) -> Node<T> {
        match node {
            Node::Branch(children) => {
                let slot = (index >> level) & INDEX_MASK;
                let mut new_children = children.clone();
                if let Some(child) = children.get(slot) {
                    new_children[slot] = Shared::new(Self::set_in_node(
                        child,
                        level - WIDTH_BITS,
                        index,
                        element,
                    ));
                }
                Node::Branch(new_children)
            }
            Node::Leaf(slots) => {
                let mut new_slots = slots.as_ref().clone();
                if let Some(target) = new_slots.get_mut(index & INDEX_MASK) {
                    *target = element;
                }
                Node::Leaf(Shared::new(new_slots))
            }
        }
    }

    /// Removes the last element, returning the new vector and the element.
    ///
    /// If the removal empties the tail buffer, the rightmost tree leaf is
    /// pulled out to become the new tail, and a root left with a single
    /// child is demoted by one level.
    ///
    /// # Errors
    ///
    /// Returns [`VectorError::EmptyVector`] if the vector has no elements.
    ///
    /// # Examples
    ///
    /// ```rust
    /// use radixvec::RadixVector;
    ///
    /// let vector: RadixVector<i32> = (1..=5).collect();
    /// let (remaining, element) = vector.pop().unwrap();
    ///
    /// assert_eq!(element, 5);
    /// assert_eq!(remaining.len(), 4);
    /// assert_eq!(vector.len(), 5); // Original unchanged
    /// ```
    pub fn pop(&self) -> Result<(Self, T), VectorError> {
        if self.is_empty() {
            return Err(VectorError::EmptyVector);
        }

        if self.length == 1 {
            return Ok((Self::new(), self.tail[0].clone()));
        }

        if self.tail.len() > 1 {
            // Just shrink the tail
            let mut new_tail = self.tail.as_ref().clone();
            let Some(element) = new_tail.pop() else {
                return Err(VectorError::EmptyVector);
            };

            let vector = Self {
                length: self.length - 1,
                shift: self.shift,
                root: self.root.clone(),
                tail: Shared::new(new_tail),
            };

            return Ok((vector, element));
        }

        // The tail empties: refill it with the rightmost tree leaf
        let element = self.tail[0].clone();
        let new_tail_offset = self.length - 1 - BRANCH_WIDTH;
        let new_tail = self.leaf_at(new_tail_offset);
        let (root, shift) = self.pop_tail_leaf(new_tail_offset);

        let vector = Self {
            length: self.length - 1,
            shift,
            root,
            tail: new_tail,
        };

        Ok((vector, element))
    }

    /// Creates a vector from a slice, cloning the elements.
    ///
    /// O(N): leaves are filled left to right and the tree is built
    /// bottom-up, avoiding the per-push path-copy overhead.
    ///
    /// # Examples
    ///
    /// ```rust
    /// use radixvec::RadixVector;
    ///
    /// let vector = RadixVector::from_slice(&[1, 2, 3, 4, 5]);
    /// assert_eq!(vector.len(), 5);
    /// assert_eq!(vector.get(0), Ok(&1));
    /// ```
    #[must_use]
    pub fn from_slice(slice: &[T]) -> Self {
        Self::from_buffer(slice.to_vec())
    }
}

// =============================================================================
// Iterator Implementation
// =============================================================================

/// The processing state of an iterator: tree blocks first, then the
/// tail buffer, then done.
#[derive(Clone, Copy, PartialEq, Eq)]
enum IterPhase {
    /// Currently walking leaves of the tree.
    Tree,
    /// Currently draining the tail buffer.
    Tail,
    /// All elements have been returned.
    Done,
}

/// A stack entry for depth-first tree traversal: a branch's child array
/// and the next child to visit.
struct TraversalFrame<'a, T> {
    children: &'a Children<T>,
    position: usize,
}

/// An iterator over references to the elements of a [`RadixVector`].
///
/// Walks the tree depth-first with a stack bounded by the tree height,
/// yielding out of one cached leaf array at a time, so a full pass is
/// O(N) rather than O(N log32 N).
pub struct RadixVectorIterator<'a, T> {
    /// The vector being iterated (also supplies the tail).
    vector: &'a RadixVector<T>,
    /// Traversal stack; depth never exceeds `MAX_DEPTH`.
    stack: SmallVec<[TraversalFrame<'a, T>; MAX_DEPTH]>,
    /// The leaf currently being drained.
    leaf: Option<&'a [T]>,
    /// Position within the current leaf.
    leaf_index: usize,
    /// Current phase.
    phase: IterPhase,
    /// Position within the tail buffer.
    tail_index: usize,
    /// Number of elements already returned.
    yielded: usize,
}

impl<'a, T> RadixVectorIterator<'a, T> {
    fn new(vector: &'a RadixVector<T>) -> Self {
        let phase = if vector.is_empty() {
            IterPhase::Done
        } else if vector.root.is_some() {
            IterPhase::Tree
        } else {
            IterPhase::Tail
        };

        let mut iterator = Self {
            vector,
            stack: SmallVec::new(),
            leaf: None,
            leaf_index: 0,
            phase,
            tail_index: 0,
            yielded: 0,
        };

        if let Some(root) = vector.root.as_ref() {
            match root.as_ref() {
                Node::Branch(children) => {
                    iterator.stack.push(TraversalFrame {
                        children,
                        position: 0,
                    });
                    iterator.descend_to_next_leaf();
                }
                Node::Leaf(slots) => {
                    iterator.leaf = Some(slots.as_slice());
                }
            }
        }

        iterator
    }

    /// Advances the traversal stack to the next unvisited leaf, popping
    /// exhausted branches on the way. Clears the cached leaf when the
    /// tree is exhausted.
    fn descend_to_next_leaf(&mut self) {
        self.leaf = None;
        self.leaf_index = 0;

        while let Some(frame) = self.stack.last_mut() {
            let children = frame.children;

            if frame.position >= children.len() {
                self.stack.pop();
                continue;
            }

            let child = &children[frame.position];
            frame.position += 1;

            match child.as_ref() {
                Node::Branch(grandchildren) => {
                    self.stack.push(TraversalFrame {
                        children: grandchildren,
                        position: 0,
                    });
                }
                Node::Leaf(slots) => {
                    self.leaf = Some(slots.as_slice());
                    return;
                }
            }
        }
    }
}

impl<'a, T> Iterator for RadixVectorIterator<'a, T> {
    type Item = &'a T;

    fn next(&mut self) -> Option<Self::Item> {
        loop {
            match self.phase {
                IterPhase::Tree => {
                    if let Some(leaf) = self.leaf {
                        if self.leaf_index < leaf.len() {
                            let element = &leaf[self.leaf_index];
                            self.leaf_index += 1;
                            self.yielded += 1;
                            return Some(element);
                        }
                        self.descend_to_next_leaf();
                        if self.leaf.is_none() {
                            self.phase = IterPhase::Tail;
                        }
                    } else {
                        self.phase = IterPhase::Tail;
                    }
                }
                IterPhase::Tail => {
                    if self.tail_index < self.vector.tail.len() {
                        let element = &self.vector.tail[self.tail_index];
                        self.tail_index += 1;
                        self.yielded += 1;
                        return Some(element);
                    }
                    self.phase = IterPhase::Done;
                    return None;
                }
                IterPhase::Done => return None,
            }
        }
    }

    fn size_hint(&self) -> (usize, Option<usize>) {
        let remaining = self.vector.length.saturating_sub(self.yielded);
        (remaining, Some(remaining))
    }
}

impl<T> ExactSizeIterator for RadixVectorIterator<'_, T> {
    fn len(&self) -> usize {
        self.vector.length.saturating_sub(self.yielded)
    }
}

/// A stack entry for the owning iterator; holds the branch node itself
/// to avoid borrowing from the consumed vector.
struct OwnedFrame<T> {
    node: Shared<Node<T>>,
    position: usize,
}

/// An owning iterator over the elements of a [`RadixVector`].
///
/// Elements are cloned out of the shared leaves as they are returned.
pub struct RadixVectorIntoIterator<T> {
    /// The consumed vector (supplies the tail and the length).
    vector: RadixVector<T>,
    /// Traversal stack; depth never exceeds `MAX_DEPTH`.
    stack: SmallVec<[OwnedFrame<T>; MAX_DEPTH]>,
    /// The leaf currently being drained.
    leaf: Option<Shared<Slots<T>>>,
    /// Position within the current leaf.
    leaf_index: usize,
    /// Current phase.
    phase: IterPhase,
    /// Position within the tail buffer.
    tail_index: usize,
    /// Number of elements already returned.
    yielded: usize,
}

impl<T> RadixVectorIntoIterator<T> {
    fn new(vector: RadixVector<T>) -> Self {
        let phase = if vector.is_empty() {
            IterPhase::Done
        } else if vector.root.is_some() {
            IterPhase::Tree
        } else {
            IterPhase::Tail
        };

        let root = vector.root.clone();
        let mut iterator = Self {
            vector,
            stack: SmallVec::new(),
            leaf: None,
            leaf_index: 0,
            phase,
            tail_index: 0,
            yielded: 0,
        };

        if let Some(root) = root {
            if let Node::Leaf(slots) = root.as_ref() {
                iterator.leaf = Some(slots.clone());
            } else {
                iterator.stack.push(OwnedFrame {
                    node: root,
                    position: 0,
                });
                iterator.descend_to_next_leaf();
            }
        }

        iterator
    }

    /// Advances the traversal stack to the next unvisited leaf.
    fn descend_to_next_leaf(&mut self) {
        self.leaf = None;
        self.leaf_index = 0;

        while let Some(frame) = self.stack.last_mut() {
            let children = match frame.node.as_ref() {
                Node::Branch(children) => children,
                Node::Leaf(_) => {
                    self.stack.pop();
                    continue;
                }
            };

            if frame.position >= children.len() {
                self.stack.pop();
                continue;
            }

            let child = children[frame.position].clone();
            frame.position += 1;

            match child.as_ref() {
                Node::Leaf(slots) => {
                    self.leaf = Some(slots.clone());
                    return;
                }
                Node::Branch(_) => {}
            }

            self.stack.push(OwnedFrame {
                node: child,
                position: 0,
            });
        }
    }
}

impl<T: Clone> Iterator for RadixVectorIntoIterator<T> {
    type Item = T;

    fn next(&mut self) -> Option<Self::Item> {
        loop {
            match self.phase {
                IterPhase::Tree => {
                    if let Some(leaf) = self.leaf.as_ref() {
                        if self.leaf_index < leaf.len() {
                            let element = leaf[self.leaf_index].clone();
                            self.leaf_index += 1;
                            self.yielded += 1;
                            return Some(element);
                        }
                        self.descend_to_next_leaf();
                        if self.leaf.is_none() {
                            self.phase = IterPhase::Tail;
                        }
                    } else {
                        self.phase = IterPhase::Tail;
                    }
                }
                IterPhase::Tail => {
                    if self.tail_index < self.vector.tail.len() {
                        let element = self.vector.tail[self.tail_index].clone();
                        self.tail_index += 1;
                        self.yielded += 1;
                        return Some(element);
                    }
                    self.phase = IterPhase::Done;
                    return None;
                }
                IterPhase::Done => return None,
            }
        }
    }

    fn size_hint(&self) -> (usize, Option<usize>) {
        let remaining = self.vector.length.saturating_sub(self.yielded);
        (remaining, Some(remaining))
    }
}

impl<T: Clone> ExactSizeIterator for RadixVectorIntoIterator<T> {
    fn len(&self) -> usize {
        self.vector.length.saturating_sub(self.yielded)
    }
}

// =============================================================================
// Standard Trait Implementations
// =============================================================================

impl<T> Default for RadixVector<T> {
    #[inline]
    fn default() -> Self {
        Self::new()
    }
}

impl<T> FromIterator<T> for RadixVector<T> {
    fn from_iter<I: IntoIterator<Item = T>>(iter: I) -> Self {
        Self::from_buffer(iter.into_iter().collect())
    }
}

impl<T: Clone> IntoIterator for RadixVector<T> {
    type Item = T;
    type IntoIter = RadixVectorIntoIterator<T>;

    #[inline]
    fn into_iter(self) -> Self::IntoIter {
        RadixVectorIntoIterator::new(self)
    }
}

impl<'a, T> IntoIterator for &'a RadixVector<T> {
    type Item = &'a T;
    type IntoIter = RadixVectorIterator<'a, T>;

    #[inline]
    fn into_iter(self) -> Self::IntoIter {
        self.iter()
    }
}

impl<T: PartialEq> PartialEq for RadixVector<T> {
    fn eq(&self, other: &Self) -> bool {
        if self.length != other.length {
            return false;
        }
        self.iter().zip(other.iter()).all(|(a, b)| a == b)
    }
}

impl<T: Eq> Eq for RadixVector<T> {}

impl<T: fmt::Debug> fmt::Debug for RadixVector<T> {
    fn fmt(&self, formatter: &mut fmt::Formatter<'_>) -> fmt::Result {
        formatter.debug_list().entries(self.iter()).finish()
    }
}

// =============================================================================
// Serde Support
// =============================================================================

#[cfg(feature = "serde")]
impl<T: serde::Serialize> serde::Serialize for RadixVector<T> {
    fn serialize<S>(&self, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: serde::Serializer,
    {
        use serde::ser::SerializeSeq;
        let mut seq = serializer.serialize_seq(Some(self.len()))?;
        for element in self {
            seq.serialize_element(element)?;
        }
        seq.end()
    }
}

#[cfg(feature = "serde")]
struct RadixVectorVisitor<T> {
    marker: std::marker::PhantomData<T>,
}

#[cfg(feature = "serde")]
impl<'de, T> serde::de::Visitor<'de> for RadixVectorVisitor<T>
where
    T: serde::Deserialize<'de>,
{
    type Value = RadixVector<T>;

    fn expecting(&self, formatter: &mut fmt::Formatter<'_>) -> fmt::Result {
        formatter.write_str("a sequence")
    }

    fn visit_seq<A>(self, mut seq: A) -> Result<Self::Value, A::Error>
    where
        A: serde::de::SeqAccess<'de>,
    {
        const MAX_PREALLOCATE: usize = 4096;
        let capacity = seq.size_hint().unwrap_or(0).min(MAX_PREALLOCATE);
        let mut elements = Vec::with_capacity(capacity);
        while let Some(element) = seq.next_element()? {
            elements.push(element);
        }
        Ok(RadixVector::from_buffer(elements))
    }
}

#[cfg(feature = "serde")]
impl<'de, T> serde::Deserialize<'de> for RadixVector<T>
where
    T: serde::Deserialize<'de>,
{
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: serde::Deserializer<'de>,
    {
        deserializer.deserialize_seq(RadixVectorVisitor {
            marker: std::marker::PhantomData,
        })
    }
}

// =============================================================================
// Tests
// =============================================================================


// =============================================================================
// Thread Safety Tests (arc feature only)
// =============================================================================


#[cfg(all(test, feature = "arc"))]
mod multithread_tests {
    use super::*;
    use rstest::rstest;
    use std::thread;

    #[rstest]
    fn test_vector_shared_across_threads() {
        let vector: RadixVector<i64> = (0..10000).collect();

        let vector1 = vector.clone();
        let vector2 = vector;

        let handle1 = thread::spawn(move || vector1.iter().sum::<i64>());
        let handle2 = thread::spawn(move || vector2.iter().sum::<i64>());

        let sum1 = handle1.join().unwrap();
        let sum2 = handle2.join().unwrap();

        assert_eq!(sum1, sum2);
        assert_eq!(sum1, (0..10000).sum::<i64>());
    }

    #[rstest]
    fn test_divergent_handles_across_threads() {
        let base: RadixVector<i32> = (0..1000).collect();

        let left = base.clone();
        let right = base;

        let handle1 = thread::spawn(move || left.push(1).push(2).push(3));
        let handle2 = thread::spawn(move || right.set(0, -1).unwrap());

        let extended = handle1.join().unwrap();
        let updated = handle2.join().unwrap();

        assert_eq!(extended.len(), 1003);
        assert_eq!(extended.get(0), Ok(&0));
        assert_eq!(updated.len(), 1000);
        assert_eq!(updated.get(0), Ok(&-1));
    }
}

#[cfg(all(test, feature = "serde"))]
mod serde_tests {
    use super::*;
    use rstest::rstest;

    #[rstest]
    fn test_serialize_empty() {
        let vector: RadixVector<i32> = RadixVector::new();
        let json = serde_json::to_string(&vector).unwrap();
        assert_eq!(json, "[]");
    }

    #[rstest]
    fn test_serialize_multiple_elements() {
        let vector: RadixVector<i32> = (1..=3).collect();
        let json = serde_json::to_string(&vector).unwrap();
        assert_eq!(json, "[1,2,3]");
    }

    #[rstest]
    fn test_deserialize_multiple_elements() {
        let json = "[1,2,3]";
        let vector: RadixVector<i32> = serde_json::from_str(json).unwrap();
        assert_eq!(vector.len(), 3);
        assert_eq!(vector.get(0), Ok(&1));
        assert_eq!(vector.get(2), Ok(&3));
    }

    #[rstest]
    fn test_roundtrip_large() {
        let original: RadixVector<i32> = (0..100).collect();
        let json = serde_json::to_string(&original).unwrap();
        let restored: RadixVector<i32> = serde_json::from_str(&json).unwrap();
        assert_eq!(original, restored);
    }
}
