//! Lock-free single-producer single-consumer ring buffer.
//!
//! Bounded to a compile-time power-of-two capacity. Head and tail live on
//! separate cache lines so producer and consumer never fight over the same
//! line. Not safe to share beyond one producer and one consumer.

use crossbeam::utils::CachePadded;
use std::cell::UnsafeCell;
use std::mem::MaybeUninit;
use std::sync::atomic::{AtomicUsize, Ordering};

pub struct Spsc<T, const CAPACITY: usize> {
    buffer: Box<[UnsafeCell<MaybeUninit<T>>; CAPACITY]>,
    head: CachePadded<AtomicUsize>,
    tail: CachePadded<AtomicUsize>,
}

unsafe impl<T: Send, const CAPACITY: usize> Send for Spsc<T, CAPACITY> {}
unsafe impl<T: Send, const CAPACITY: usize> Sync for Spsc<T, CAPACITY> {}

impl<T, const CAPACITY: usize> Spsc<T, CAPACITY> {
    /// `CAPACITY` must be a power of two; the queue holds at most
    /// `CAPACITY - 1` items at a time.
    pub fn new() -> Self {
        assert!(CAPACITY.is_power_of_two(), "SPSC capacity must be a power of two");
        assert!(CAPACITY >= 2, "SPSC capacity must be at least 2");
        let buffer = {
            let mut v: Vec<UnsafeCell<MaybeUninit<T>>> = Vec::with_capacity(CAPACITY);
            for _ in 0..CAPACITY {
                v.push(UnsafeCell::new(MaybeUninit::uninit()));
            }
            v.into_boxed_slice().try_into().unwrap_or_else(|_| unreachable!())
        };
        Self {
            buffer,
            head: CachePadded::new(AtomicUsize::new(0)),
            tail: CachePadded::new(AtomicUsize::new(0)),
        }
    }

    #[inline]
    fn mask(i: usize) -> usize {
        i & (CAPACITY - 1)
    }

    /// Producer side. Returns `false` without blocking if the queue is full.
    pub fn push(&self, item: T) -> bool {
        let tail = self.tail.load(Ordering::Relaxed);
        let next_tail = (tail + 1) % CAPACITY;
        let head = self.head.load(Ordering::Acquire);
        if next_tail == head {
            return false;
        }
        unsafe {
            (*self.buffer[Self::mask(tail)].get()).write(item);
        }
        self.tail.store(next_tail, Ordering::Release);
        true
    }

    /// Consumer side. Returns `None` without blocking if the queue is empty.
    pub fn pop(&self) -> Option<T> {
        let head = self.head.load(Ordering::Relaxed);
        let tail = self.tail.load(Ordering::Acquire);
        if head == tail {
            return None;
        }
        let item = unsafe { (*self.buffer[Self::mask(head)].get()).assume_init_read() };
        let next_head = (head + 1) % CAPACITY;
        self.head.store(next_head, Ordering::Release);
        Some(item)
    }

    pub fn is_empty(&self) -> bool {
        self.head.load(Ordering::Acquire) == self.tail.load(Ordering::Acquire)
    }

    pub fn len(&self) -> usize {
        let head = self.head.load(Ordering::Acquire);
        let tail = self.tail.load(Ordering::Acquire);
        (tail + CAPACITY - head) % CAPACITY
    }

    pub fn capacity(&self) -> usize {
        CAPACITY - 1
    }
}

impl<T, const CAPACITY: usize> Default for Spsc<T, CAPACITY> {
    fn default() -> Self {
        Self::new()
    }
}

impl<T, const CAPACITY: usize> Drop for Spsc<T, CAPACITY> {
    fn drop(&mut self) {
        while self.pop().is_some() {}
    }
}
