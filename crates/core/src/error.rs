#[derive(Debug, thiserror::Error)]
pub enum CoreError {
    #[error("Queue is full (capacity {capacity})")]
    QueueFull { capacity: usize },

    #[error("Internal error: {0}")]
    Internal(String),
}
