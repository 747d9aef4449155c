//! Infrastructure containers shared by the scheduler's wait queues.

pub mod priority_queue;

pub use priority_queue::PriorityQueue;
