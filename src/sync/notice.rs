use tokio::sync::mpsc;

/// Severity of a user-facing notification.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum NoticeLevel {
    Info,
    Error,
}

/// A non-blocking, user-visible notification emitted by background
/// operations. The UI drains these; nothing in the engine blocks on them.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Notice {
    pub level: NoticeLevel,
    pub message: String,
}

/// Cloneable handle for emitting notices.
#[derive(Clone)]
pub struct NoticeSender(mpsc::UnboundedSender<Notice>);

impl NoticeSender {
    pub fn channel() -> (NoticeSender, mpsc::UnboundedReceiver<Notice>) {
        let (tx, rx) = mpsc::unbounded_channel();
        (NoticeSender(tx), rx)
    }

    pub fn info(&self, message: impl Into<String>) {
        self.send(NoticeLevel::Info, message.into());
    }

    pub fn error(&self, message: impl Into<String>) {
        self.send(NoticeLevel::Error, message.into());
    }

    fn send(&self, level: NoticeLevel, message: String) {
        // A closed receiver means the surface is gone; drop silently.
        let _ = self.0.send(Notice { level, message });
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_notices_arrive_in_order() {
        let (tx, mut rx) = NoticeSender::channel();
        tx.info("loaded");
        tx.error("write failed");

        assert_eq!(rx.recv().await.unwrap().level, NoticeLevel::Info);
        let second = rx.recv().await.unwrap();
        assert_eq!(second.level, NoticeLevel::Error);
        assert_eq!(second.message, "write failed");
    }

    #[tokio::test]
    async fn test_send_after_receiver_dropped_is_silent() {
        let (tx, rx) = NoticeSender::channel();
        drop(rx);
        tx.error("nobody listening");
    }
}
