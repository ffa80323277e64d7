use async_trait::async_trait;
use axum::extract::ws::{Message, WebSocket};
use futures::{
    sink::SinkExt,
    stream::{SplitSink, SplitStream, StreamExt},
};
use thiserror::Error;

/// A single WebSocket frame as seen by the hub
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Frame {
    Binary(Vec<u8>),
    Text(String),
    Ping(Vec<u8>),
    Pong(Vec<u8>),
    Close,
}

impl Frame {
    /// Application payload carried by a data frame, `None` for control frames
    pub fn into_payload(self) -> Option<Vec<u8>> {
        match self {
            Frame::Binary(bytes) => Some(bytes),
            Frame::Text(text) => Some(text.into_bytes()),
            Frame::Ping(_) | Frame::Pong(_) | Frame::Close => None,
        }
    }
}

#[derive(Debug, Error)]
pub enum SocketError {
    #[error("connection closed")]
    ConnectionClosed,

    #[error("send failed: {0}")]
    SendFailed(String),

    #[error("receive failed: {0}")]
    ReceiveFailed(String),

    #[error("no data received within {0:?}")]
    ReadTimeout(std::time::Duration),

    #[error("write did not complete within {0:?}")]
    WriteTimeout(std::time::Duration),
}

/// Inbound half of a client transport
#[async_trait]
pub trait FrameReader: Send {
    /// Receive the next frame (None once the stream has ended)
    async fn recv_frame(&mut self) -> Result<Option<Frame>, SocketError>;
}

/// Outbound half of a client transport
#[async_trait]
pub trait FrameWriter: Send {
    async fn send_frame(&mut self, frame: Frame) -> Result<(), SocketError>;

    /// Send a close frame and release the outbound half
    async fn close(&mut self) -> Result<(), SocketError>;
}

impl From<Frame> for Message {
    fn from(frame: Frame) -> Self {
        match frame {
            Frame::Binary(bytes) => Message::Binary(bytes),
            Frame::Text(text) => Message::Text(text),
            Frame::Ping(bytes) => Message::Ping(bytes),
            Frame::Pong(bytes) => Message::Pong(bytes),
            Frame::Close => Message::Close(None),
        }
    }
}

impl From<Message> for Frame {
    fn from(message: Message) -> Self {
        match message {
            Message::Binary(bytes) => Frame::Binary(bytes),
            Message::Text(text) => Frame::Text(text),
            Message::Ping(bytes) => Frame::Ping(bytes),
            Message::Pong(bytes) => Frame::Pong(bytes),
            Message::Close(_) => Frame::Close,
        }
    }
}

#[async_trait]
impl FrameReader for SplitStream<WebSocket> {
    async fn recv_frame(&mut self) -> Result<Option<Frame>, SocketError> {
        match self.next().await {
            Some(Ok(message)) => Ok(Some(message.into())),
            Some(Err(e)) => Err(SocketError::ReceiveFailed(e.to_string())),
            None => Ok(None),
        }
    }
}

#[async_trait]
impl FrameWriter for SplitSink<WebSocket, Message> {
    async fn send_frame(&mut self, frame: Frame) -> Result<(), SocketError> {
        self.send(frame.into())
            .await
            .map_err(|e| SocketError::SendFailed(e.to_string()))
    }

    async fn close(&mut self) -> Result<(), SocketError> {
        // Closing the sink emits the close frame
        SinkExt::close(self)
            .await
            .map_err(|e| SocketError::SendFailed(e.to_string()))
    }
}

#[cfg(test)]
pub mod test_utils {
    use super::*;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::sync::Arc;
    use tokio::sync::mpsc;

    /// Reader fed by the test through an unbounded channel
    pub struct ChannelReader {
        inbound: mpsc::UnboundedReceiver<Result<Frame, SocketError>>,
    }

    #[async_trait]
    impl FrameReader for ChannelReader {
        async fn recv_frame(&mut self) -> Result<Option<Frame>, SocketError> {
            match self.inbound.recv().await {
                Some(Ok(frame)) => Ok(Some(frame)),
                Some(Err(e)) => Err(e),
                None => Ok(None),
            }
        }
    }

    /// Writer that forwards every frame to the test and counts closes
    pub struct ChannelWriter {
        outbound: mpsc::UnboundedSender<Frame>,
        closes: Arc<AtomicUsize>,
    }

    #[async_trait]
    impl FrameWriter for ChannelWriter {
        async fn send_frame(&mut self, frame: Frame) -> Result<(), SocketError> {
            self.outbound
                .send(frame)
                .map_err(|_| SocketError::ConnectionClosed)
        }

        async fn close(&mut self) -> Result<(), SocketError> {
            self.closes.fetch_add(1, Ordering::SeqCst);
            let _ = self.outbound.send(Frame::Close);
            Ok(())
        }
    }

    /// Client side of a channel transport
    pub struct TestClient {
        pub to_server: mpsc::UnboundedSender<Result<Frame, SocketError>>,
        pub from_server: mpsc::UnboundedReceiver<Frame>,
        pub closes: Arc<AtomicUsize>,
    }

    impl TestClient {
        pub fn send(&self, frame: Frame) {
            let _ = self.to_server.send(Ok(frame));
        }

        pub fn fail(&self) {
            let _ = self
                .to_server
                .send(Err(SocketError::ReceiveFailed("reset".to_string())));
        }

        pub fn close_count(&self) -> usize {
            self.closes.load(Ordering::SeqCst)
        }
    }

    pub fn channel_transport() -> (ChannelReader, ChannelWriter, TestClient) {
        let (to_server, inbound) = mpsc::unbounded_channel();
        let (outbound, from_server) = mpsc::unbounded_channel();
        let closes = Arc::new(AtomicUsize::new(0));

        (
            ChannelReader { inbound },
            ChannelWriter {
                outbound,
                closes: closes.clone(),
            },
            TestClient {
                to_server,
                from_server,
                closes,
            },
        )
    }
}
