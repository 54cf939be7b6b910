//! # Subscription Queues
//!
//! Unbounded single-consumer queue of payloads. The push side is cloned into
//! the pub/sub registry once per subscribed topic; the consume side is a
//! `Stream` that ends once the queue is closed.
//!
//! Publishers never wait on consumers. A slow consumer grows its own queue.

use std::collections::HashMap;
use std::pin::Pin;
use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};
use std::sync::{Arc, Mutex};
use std::task::{Context, Poll, Waker};

use futures_util::Stream;
use serde_json::Value;
use tokio::sync::mpsc;
use uuid::Uuid;

/// Queue identifier used as the registry key
pub type QueueId = Uuid;

/// Shared queue state. Every consume handle parks its own waker, so a push
/// or a close reaches all pending consumers.
#[derive(Debug, Default)]
struct QueueState {
    closed: AtomicBool,
    next_handle: AtomicU64,
    wakers: Mutex<HashMap<u64, Waker>>,
}

impl QueueState {
    fn new_handle(&self) -> u64 {
        self.next_handle.fetch_add(1, Ordering::Relaxed)
    }

    fn park(&self, handle: u64, waker: &Waker) {
        if let Ok(mut wakers) = self.wakers.lock() {
            let stale = wakers
                .get(&handle)
                .map_or(true, |parked| !parked.will_wake(waker));
            if stale {
                wakers.insert(handle, waker.clone());
            }
        }
    }

    fn forget(&self, handle: u64) {
        if let Ok(mut wakers) = self.wakers.lock() {
            wakers.remove(&handle);
        }
    }

    fn wake_all(&self) {
        let parked: Vec<Waker> = match self.wakers.lock() {
            Ok(mut wakers) => wakers.drain().map(|(_, waker)| waker).collect(),
            Err(_) => Vec::new(),
        };
        for waker in parked {
            waker.wake();
        }
    }
}

/// Push side of a subscription queue
#[derive(Debug, Clone)]
pub struct Queue {
    id: QueueId,
    sender: mpsc::UnboundedSender<Value>,
    state: Arc<QueueState>,
}

/// Consume side of a subscription queue.
///
/// Clones share one underlying queue; each payload is yielded once.
#[derive(Debug)]
pub struct PayloadStream {
    handle: u64,
    receiver: Arc<Mutex<mpsc::UnboundedReceiver<Value>>>,
    state: Arc<QueueState>,
}

/// Create a new queue
pub fn channel() -> (Queue, PayloadStream) {
    let (sender, receiver) = mpsc::unbounded_channel();
    let state = Arc::new(QueueState::default());
    let queue = Queue {
        id: Uuid::new_v4(),
        sender,
        state: Arc::clone(&state),
    };
    let stream = PayloadStream {
        handle: state.new_handle(),
        receiver: Arc::new(Mutex::new(receiver)),
        state,
    };
    (queue, stream)
}

impl Queue {
    pub fn id(&self) -> QueueId {
        self.id
    }

    /// Append a payload. Returns false if the queue is closed.
    pub fn push(&self, payload: Value) -> bool {
        if self.is_closed() {
            return false;
        }
        let sent = self.sender.send(payload).is_ok();
        if sent {
            self.state.wake_all();
        }
        sent
    }

    /// Finalize the queue; pending and future payloads are discarded.
    pub fn close(&self) {
        if !self.state.closed.swap(true, Ordering::AcqRel) {
            self.state.wake_all();
        }
    }

    pub fn is_closed(&self) -> bool {
        self.state.closed.load(Ordering::Acquire) || self.sender.is_closed()
    }
}

impl PayloadStream {
    pub fn is_closed(&self) -> bool {
        self.state.closed.load(Ordering::Acquire)
    }
}

impl Clone for PayloadStream {
    fn clone(&self) -> Self {
        Self {
            handle: self.state.new_handle(),
            receiver: Arc::clone(&self.receiver),
            state: Arc::clone(&self.state),
        }
    }
}

impl Drop for PayloadStream {
    fn drop(&mut self) {
        self.state.forget(self.handle);
    }
}

impl Stream for PayloadStream {
    type Item = Value;

    fn poll_next(self: Pin<&mut Self>, cx: &mut Context<'_>) -> Poll<Option<Self::Item>> {
        self.state.park(self.handle, cx.waker());
        if self.is_closed() {
            return Poll::Ready(None);
        }
        match self.receiver.lock() {
            Ok(mut receiver) => receiver.poll_recv(cx),
            Err(_) => Poll::Ready(None),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use futures_util::StreamExt;
    use serde_json::json;

    #[tokio::test]
    async fn test_push_preserves_order() {
        let (queue, mut stream) = channel();
        assert!(queue.push(json!(1)));
        assert!(queue.push(json!(2)));

        assert_eq!(stream.next().await, Some(json!(1)));
        assert_eq!(stream.next().await, Some(json!(2)));
    }

    #[tokio::test]
    async fn test_close_discards_and_ends() {
        let (queue, mut stream) = channel();
        queue.push(json!("pending"));
        queue.close();
        queue.close();

        assert!(!queue.push(json!("late")));
        assert_eq!(stream.next().await, None);
    }

    #[tokio::test]
    async fn test_close_wakes_waiting_consumer() {
        let (queue, mut stream) = channel();
        let consumer = tokio::spawn(async move { stream.next().await });

        tokio::task::yield_now().await;
        queue.close();

        let result = tokio::time::timeout(std::time::Duration::from_secs(1), consumer)
            .await
            .unwrap()
            .unwrap();
        assert_eq!(result, None);
    }

    #[tokio::test]
    async fn test_close_wakes_every_pending_handle() {
        let (queue, stream) = channel();
        let mut first = stream.clone();
        let mut second = stream;
        let a = tokio::spawn(async move { first.next().await });
        let b = tokio::spawn(async move { second.next().await });

        tokio::task::yield_now().await;
        tokio::time::sleep(std::time::Duration::from_millis(20)).await;
        queue.close();

        for consumer in [a, b] {
            let result = tokio::time::timeout(std::time::Duration::from_secs(1), consumer)
                .await
                .expect("pending handle hung after close")
                .unwrap();
            assert_eq!(result, None);
        }
    }

    #[tokio::test]
    async fn test_push_reaches_earlier_pending_handle() {
        let (queue, stream) = channel();
        let mut first = stream.clone();
        let mut second = stream;
        let a = tokio::spawn(async move { first.next().await });
        tokio::time::sleep(std::time::Duration::from_millis(20)).await;
        let b = tokio::spawn(async move { second.next().await });
        tokio::time::sleep(std::time::Duration::from_millis(20)).await;

        queue.push(json!(1));
        queue.push(json!(2));

        let mut received = Vec::new();
        for consumer in [a, b] {
            let value = tokio::time::timeout(std::time::Duration::from_secs(1), consumer)
                .await
                .expect("pending handle missed a push")
                .unwrap();
            received.push(value.unwrap());
        }
        received.sort_by_key(|v| v.as_i64());
        assert_eq!(received, vec![json!(1), json!(2)]);
    }

    #[tokio::test]
    async fn test_clones_share_one_queue() {
        let (queue, stream) = channel();
        let mut a = stream.clone();
        let mut b = stream;
        queue.push(json!("x"));
        queue.push(json!("y"));

        assert_eq!(a.next().await, Some(json!("x")));
        assert_eq!(b.next().await, Some(json!("y")));
    }
}
