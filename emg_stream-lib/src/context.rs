use tokio::sync::broadcast;
use crate::message::Message;

/// A small wrapper around a Tokio broadcast channel,
/// used to fan-out decoded packets to every connected viewer.
#[derive(Clone)]
pub struct Context {
    pub tx: broadcast::Sender<Message>,
}

impl Context {
    /// Create a new Context with a channel of the given capacity.
    pub fn new(capacity: usize) -> Self {
        let (tx, _rx) = broadcast::channel(capacity);
        Self { tx }
    }

    /// Publish to whoever is listening; no subscribers is not an error.
    pub fn publish(&self, msg: Message) -> usize {
        self.tx.send(msg).unwrap_or(0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn publish_reaches_subscribers() {
        let ctx = Context::new(8);
        assert_eq!(ctx.publish(Message::Gap { received_at: 0, missing_packets: 1 }), 0);

        let mut rx = ctx.tx.subscribe();
        assert_eq!(ctx.publish(Message::Gap { received_at: 5, missing_packets: 2 }), 1);
        match rx.recv().await.unwrap() {
            Message::Gap { missing_packets, .. } => assert_eq!(missing_packets, 2),
            other => panic!("unexpected {:?}", other),
        }
    }
}
