//! LRU Recency List Module
//!
//! Slab-backed doubly-linked list holding a partition's entries in recency order.

// == Slot Index ==
/// Handle to a node inside an [`LruList`].
///
/// Handles stay valid until the node is removed; freed slots are recycled.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct SlotIdx(usize);

#[derive(Debug)]
struct Node<K, V> {
    key: K,
    value: V,
    prev: Option<SlotIdx>,
    next: Option<SlotIdx>,
}

// == LRU List ==
/// Recency-ordered sequence of key/value entries.
///
/// Entries are linked by slot index instead of pointers:
/// - Front (head) = Most recently used
/// - Back (tail) = Least recently used
///
/// Insert, move-to-front, unlink and pop-back are all O(1).
#[derive(Debug)]
pub struct LruList<K, V> {
    slots: Vec<Option<Node<K, V>>>,
    free: Vec<usize>,
    head: Option<SlotIdx>,
    tail: Option<SlotIdx>,
    len: usize,
}

impl<K, V> Default for LruList<K, V> {
    fn default() -> Self {
        Self::new()
    }
}

impl<K, V> LruList<K, V> {
    // == Constructor ==
    /// Creates a new empty list.
    pub fn new() -> Self {
        Self {
            slots: Vec::new(),
            free: Vec::new(),
            head: None,
            tail: None,
            len: 0,
        }
    }

    /// Creates an empty list with room for `capacity` nodes.
    pub fn with_capacity(capacity: usize) -> Self {
        Self {
            slots: Vec::with_capacity(capacity),
            ..Self::new()
        }
    }

    // == Push Front ==
    /// Inserts an entry at the most recently used position.
    pub fn push_front(&mut self, key: K, value: V) -> SlotIdx {
        let idx = self.alloc(Node {
            key,
            value,
            prev: None,
            next: self.head,
        });

        match self.head {
            Some(old_head) => self.node_mut(old_head).prev = Some(idx),
            None => self.tail = Some(idx),
        }
        self.head = Some(idx);
        self.len += 1;
        idx
    }

    // == Touch ==
    /// Marks an entry as recently used (moves to front).
    pub fn touch(&mut self, idx: SlotIdx) {
        if self.head == Some(idx) {
            return;
        }
        self.unlink(idx);

        let old_head = self.head;
        {
            let node = self.node_mut(idx);
            node.prev = None;
            node.next = old_head;
        }
        match old_head {
            Some(h) => self.node_mut(h).prev = Some(idx),
            None => self.tail = Some(idx),
        }
        self.head = Some(idx);
    }

    // == Remove ==
    /// Unlinks an entry and returns its key and value.
    ///
    /// Returns None if the slot is vacant.
    pub fn remove(&mut self, idx: SlotIdx) -> Option<(K, V)> {
        self.slots.get(idx.0)?.as_ref()?;
        self.unlink(idx);

        let node = self.slots[idx.0].take()?;
        self.free.push(idx.0);
        self.len -= 1;
        Some((node.key, node.value))
    }

    // == Pop Back ==
    /// Removes and returns the least recently used entry.
    ///
    /// Returns None if the list is empty.
    pub fn pop_back(&mut self) -> Option<(K, V)> {
        let tail = self.tail?;
        self.remove(tail)
    }

    // == Accessors ==
    /// Returns the value stored at `idx`.
    pub fn get(&self, idx: SlotIdx) -> Option<&V> {
        self.slots.get(idx.0)?.as_ref().map(|n| &n.value)
    }

    /// Returns a mutable reference to the value stored at `idx`.
    pub fn get_mut(&mut self, idx: SlotIdx) -> Option<&mut V> {
        self.slots.get_mut(idx.0)?.as_mut().map(|n| &mut n.value)
    }

    /// Returns the least recently used key without removing it.
    pub fn peek_oldest(&self) -> Option<&K> {
        let tail = self.tail?;
        self.slots[tail.0].as_ref().map(|n| &n.key)
    }

    /// Iterates keys from most to least recently used.
    pub fn keys(&self) -> Keys<'_, K, V> {
        Keys {
            list: self,
            current: self.head,
        }
    }

    /// Returns the number of linked entries.
    pub fn len(&self) -> usize {
        self.len
    }

    /// Returns true if no entries are linked.
    pub fn is_empty(&self) -> bool {
        self.len == 0
    }

    // -- internal --

    fn alloc(&mut self, node: Node<K, V>) -> SlotIdx {
        match self.free.pop() {
            Some(slot) => {
                self.slots[slot] = Some(node);
                SlotIdx(slot)
            }
            None => {
                self.slots.push(Some(node));
                SlotIdx(self.slots.len() - 1)
            }
        }
    }

    /// Detaches `idx` from its neighbours, patching head/tail.
    fn unlink(&mut self, idx: SlotIdx) {
        let (prev, next) = {
            let node = self.node_mut(idx);
            (node.prev.take(), node.next.take())
        };

        match prev {
            Some(p) => self.node_mut(p).next = next,
            None => self.head = next,
        }
        match next {
            Some(n) => self.node_mut(n).prev = prev,
            None => self.tail = prev,
        }
    }

    fn node_mut(&mut self, idx: SlotIdx) -> &mut Node<K, V> {
        self.slots[idx.0]
            .as_mut()
            .unwrap_or_else(|| unreachable!("dangling slot index {}", idx.0))
    }
}

// == Key Iterator ==
/// Iterator over keys in recency order, see [`LruList::keys`].
#[derive(Debug)]
pub struct Keys<'a, K, V> {
    list: &'a LruList<K, V>,
    current: Option<SlotIdx>,
}

impl<'a, K, V> Iterator for Keys<'a, K, V> {
    type Item = &'a K;

    fn next(&mut self) -> Option<Self::Item> {
        let idx = self.current?;
        let node = self.list.slots[idx.0].as_ref()?;
        self.current = node.next;
        Some(&node.key)
    }
}
