//! Lock-free command queue from connection handlers to the game loop
//!
//! Uses crossbeam-channel for MPSC submission without blocking: many
//! connection tasks push, the game loop drains everything pending at the
//! start of each tick. Generic over the command type so the simulation
//! side stays independent of the transport.

use crossbeam_channel::{bounded, Receiver, Sender, TrySendError};

/// Bounded queue; the receiver side lives with the game loop
pub struct CommandQueue<C> {
    sender: Sender<C>,
    receiver: Receiver<C>,
    capacity: usize,
}

impl<C> CommandQueue<C> {
    /// Capacity should absorb the worst burst between two ticks
    /// (a few commands per player per 33 ms)
    pub fn new(capacity: usize) -> Self {
        let (sender, receiver) = bounded(capacity);
        Self {
            sender,
            receiver,
            capacity,
        }
    }

    /// New submission handle; each connection task holds its own clone
    pub fn handle(&self) -> CommandSender<C> {
        CommandSender {
            sender: self.sender.clone(),
        }
    }

    /// Drain everything pending for this tick
    pub fn drain(&self) -> Vec<C> {
        self.receiver.try_iter().collect()
    }

    #[inline]
    pub fn pending_count(&self) -> usize {
        self.receiver.len()
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.receiver.is_empty()
    }

    #[inline]
    pub fn capacity(&self) -> usize {
        self.capacity
    }
}

impl<C> Default for CommandQueue<C> {
    fn default() -> Self {
        Self::new(1024)
    }
}

/// Clonable submission handle for connection tasks
pub struct CommandSender<C> {
    sender: Sender<C>,
}

impl<C> Clone for CommandSender<C> {
    fn clone(&self) -> Self {
        Self {
            sender: self.sender.clone(),
        }
    }
}

impl<C> CommandSender<C> {
    /// Non-blocking submit; `Full` signals backpressure to the caller
    #[inline]
    pub fn try_send(&self, command: C) -> Result<(), QueueError> {
        self.sender.try_send(command).map_err(|e| match e {
            TrySendError::Full(_) => QueueError::Full,
            TrySendError::Disconnected(_) => QueueError::Disconnected,
        })
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum QueueError {
    /// Queue is full (backpressure)
    Full,
    /// Game loop stopped
    Disconnected,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_submit_and_drain_preserves_order() {
        let queue: CommandQueue<u32> = CommandQueue::new(10);
        let handle = queue.handle();

        handle.try_send(1).unwrap();
        handle.try_send(2).unwrap();
        handle.try_send(3).unwrap();
        assert_eq!(queue.pending_count(), 3);

        assert_eq!(queue.drain(), vec![1, 2, 3]);
        assert!(queue.is_empty());
    }

    #[test]
    fn test_backpressure_when_full() {
        let queue: CommandQueue<u32> = CommandQueue::new(2);
        let handle = queue.handle();

        handle.try_send(1).unwrap();
        handle.try_send(2).unwrap();
        assert_eq!(handle.try_send(3), Err(QueueError::Full));

        queue.drain();
        assert!(handle.try_send(3).is_ok());
    }

    #[test]
    fn test_handles_are_independent() {
        let queue: CommandQueue<&str> = CommandQueue::new(10);
        let a = queue.handle();
        let b = a.clone();

        a.try_send("a").unwrap();
        b.try_send("b").unwrap();
        assert_eq!(queue.drain(), vec!["a", "b"]);
    }

    #[test]
    fn test_disconnected_after_queue_drop() {
        let queue: CommandQueue<u32> = CommandQueue::new(2);
        let handle = queue.handle();
        drop(queue);
        assert_eq!(handle.try_send(1), Err(QueueError::Disconnected));
    }

    #[test]
    fn test_default_capacity() {
        let queue: CommandQueue<u32> = CommandQueue::default();
        assert_eq!(queue.capacity(), 1024);
    }
}
