//! Diagnostics: `testing.TestService`.

use std::time::Duration;

use tonic::{Code, Status};

use crate::proto::testing::{PingRequest, PingResponse};
use crate::rpc::ServerStream;
use crate::security::Caller;

/// Responses produced by `PingList` when the request does not say.
pub const DEFAULT_PING_COUNT: u32 = 100;

#[derive(Debug, Clone, Copy, Default)]
pub struct PingService;

impl PingService {
    pub async fn ping(&self, _caller: Caller, request: PingRequest) -> Result<PingResponse, Status> {
        if request.error_code_returned != 0 {
            let code = Code::from(request.error_code_returned);
            return Err(Status::new(code, format!("ping asked for {code:?}")));
        }
        Ok(PingResponse {
            value: request.value,
            counter: 0,
        })
    }

    /// Stream `count` echoes of the request.
    pub async fn ping_list<S>(&self, _caller: Caller, request: PingRequest, stream: &mut S) -> Result<(), Status>
    where
        S: ServerStream<Request = PingRequest, Response = PingResponse>,
    {
        let count = if request.count == 0 { DEFAULT_PING_COUNT } else { request.count };
        let delay = Duration::from_millis(u64::from(request.delay_ms));

        for counter in 0..count {
            if !delay.is_zero() && counter > 0 {
                tokio::time::sleep(delay).await;
            }
            stream
                .send(PingResponse {
                    value: request.value.clone(),
                    counter: counter as i32,
                })
                .await?;
        }
        Ok(())
    }

    /// Echo every inbound message with a running counter until the client
    /// closes its half.
    pub async fn ping_stream<S>(&self, _caller: Caller, stream: &mut S) -> Result<(), Status>
    where
        S: ServerStream<Request = PingRequest, Response = PingResponse>,
    {
        let mut counter = 0;
        while let Some(request) = stream.recv().await? {
            counter += 1;
            stream
                .send(PingResponse {
                    value: request.value,
                    counter,
                })
                .await?;
        }
        Ok(())
    }
}
