//! Send/receive contract for server-side streams.

use std::future::Future;

use async_trait::async_trait;
use tokio::sync::mpsc;
use tokio_stream::wrappers::ReceiverStream;
use tonic::{Status, Streaming};

/// Server half of a streaming call.
#[async_trait]
pub trait ServerStream: Send {
    type Request: prost::Message + Clone + 'static;
    type Response: prost::Message + Clone + 'static;

    /// Push one message to the client.
    async fn send(&mut self, message: Self::Response) -> Result<(), Status>;

    /// Next message from the client; `Ok(None)` once the client half-closes.
    async fn recv(&mut self) -> Result<Option<Self::Request>, Status>;
}

/// Stream backed by a tonic inbound half and a channel feeding the
/// response body.
pub struct ChannelStream<Req, Resp> {
    inbound: Option<Streaming<Req>>,
    outbound: mpsc::Sender<Result<Resp, Status>>,
}

/// Response body handed back to tonic.
pub type ResponseStream<Resp> = ReceiverStream<Result<Resp, Status>>;

impl<Req, Resp> ChannelStream<Req, Resp> {
    /// Build a stream with no inbound half (server streaming).
    pub fn outbound_only(buffer: usize) -> (Self, ResponseStream<Resp>) {
        Self::with_inbound(None, buffer)
    }

    /// Build a stream reading from `inbound` (bidirectional).
    pub fn with_inbound(inbound: Option<Streaming<Req>>, buffer: usize) -> (Self, ResponseStream<Resp>) {
        let (tx, rx) = mpsc::channel(buffer);
        (
            Self {
                inbound,
                outbound: tx,
            },
            ReceiverStream::new(rx),
        )
    }

    /// Terminate the response body with `status`.
    ///
    /// The returned future owns its sender, so it can be awaited after the
    /// stream itself is dropped.
    pub fn fail(&self, status: Status) -> impl Future<Output = ()> + Send + 'static
    where
        Resp: Send + 'static,
    {
        let outbound = self.outbound.clone();
        async move {
            let _ = outbound.send(Err(status)).await;
        }
    }
}

#[async_trait]
impl<Req, Resp> ServerStream for ChannelStream<Req, Resp>
where
    Req: prost::Message + Clone + 'static,
    Resp: prost::Message + Clone + 'static,
{
    type Request = Req;
    type Response = Resp;

    async fn send(&mut self, message: Resp) -> Result<(), Status> {
        self.outbound
            .send(Ok(message))
            .await
            .map_err(|_| Status::cancelled("client closed the stream"))
    }

    async fn recv(&mut self) -> Result<Option<Req>, Status> {
        match self.inbound.as_mut() {
            Some(inbound) => inbound.message().await,
            None => Ok(None),
        }
    }
}
