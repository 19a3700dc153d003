//! Pluggable read-only taps on unary and streaming traffic.
//!
//! # Responsibilities
//! - Keep three name-keyed registries: unary, stream-request, stream-response
//! - Fan call outcomes out to every registered observer
//! - Decorate server streams so each send/recv is observed
//!
//! # Design Decisions
//! - One registry-wide lock guards registration and fan-out alike. Fan-out
//!   is serialized, so a slow observer delays every concurrent call. The lock
//!   is never held across an `.await`; only the synchronous fan-out runs
//!   under it.
//! - Observers run strictly after the handler or transport operation has
//!   completed and cannot change what the caller receives.

use std::collections::HashMap;
use std::fmt;
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

use async_trait::async_trait;
use tonic::Status;

use super::context::CallInfo;
use super::stream::ServerStream;

/// Type-erased view of a wire message.
pub trait Payload: fmt::Debug + Send + Sync {
    /// Rust type name of the message.
    fn message_name(&self) -> &'static str;
    /// Size of the protobuf encoding in bytes.
    fn wire_len(&self) -> usize;
    /// Protobuf encoding of the message.
    fn wire_bytes(&self) -> Vec<u8>;
}

impl<M: prost::Message> Payload for M {
    fn message_name(&self) -> &'static str {
        std::any::type_name::<M>()
    }

    fn wire_len(&self) -> usize {
        self.encoded_len()
    }

    fn wire_bytes(&self) -> Vec<u8> {
        self.encode_to_vec()
    }
}

/// Observes completed unary calls.
pub trait UnaryObserver: Send + Sync {
    fn name(&self) -> &str;
    fn observe_unary(&self, info: &CallInfo, request: &dyn Payload, response: Result<&dyn Payload, &Status>);
}

/// Observes messages received on server streams.
pub trait StreamRequestObserver: Send + Sync {
    fn name(&self) -> &str;
    /// `Ok(None)` marks the client closing its half of the stream.
    fn observe_stream_request(&self, info: &CallInfo, request: Result<Option<&dyn Payload>, &Status>);
}

/// Observes messages sent on server streams.
pub trait StreamResponseObserver: Send + Sync {
    fn name(&self) -> &str;
    fn observe_stream_response(&self, info: &CallInfo, response: &dyn Payload, error: Option<&Status>);
}

#[derive(Default)]
struct Observers {
    unary: HashMap<String, Arc<dyn UnaryObserver>>,
    stream_request: HashMap<String, Arc<dyn StreamRequestObserver>>,
    stream_response: HashMap<String, Arc<dyn StreamResponseObserver>>,
}

/// Registry of observers, owned by the endpoint and shared with the chain.
#[derive(Default)]
pub struct ObserverRegistry {
    observers: Mutex<Observers>,
}

impl ObserverRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    fn lock(&self) -> MutexGuard<'_, Observers> {
        self.observers.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// Register `observer`, replacing any observer with the same name.
    pub fn register_unary_observer(&self, observer: Arc<dyn UnaryObserver>) {
        let name = observer.name().to_string();
        tracing::debug!(observer = %name, "Unary observer registered");
        self.lock().unary.insert(name, observer);
    }

    /// Remove the unary observer called `name`, if any.
    pub fn delete_unary_observer(&self, name: &str) {
        self.lock().unary.remove(name);
    }

    pub fn register_stream_request_observer(&self, observer: Arc<dyn StreamRequestObserver>) {
        let name = observer.name().to_string();
        tracing::debug!(observer = %name, "Stream request observer registered");
        self.lock().stream_request.insert(name, observer);
    }

    pub fn delete_stream_request_observer(&self, name: &str) {
        self.lock().stream_request.remove(name);
    }

    pub fn register_stream_response_observer(&self, observer: Arc<dyn StreamResponseObserver>) {
        let name = observer.name().to_string();
        tracing::debug!(observer = %name, "Stream response observer registered");
        self.lock().stream_response.insert(name, observer);
    }

    pub fn delete_stream_response_observer(&self, name: &str) {
        self.lock().stream_response.remove(name);
    }

    /// Names of registered unary observers, sorted.
    pub fn unary_observer_names(&self) -> Vec<String> {
        let mut names: Vec<_> = self.lock().unary.keys().cloned().collect();
        names.sort();
        names
    }

    pub(crate) fn notify_unary(&self, info: &CallInfo, request: &dyn Payload, response: Result<&dyn Payload, &Status>) {
        let observers = self.lock();
        for observer in observers.unary.values() {
            observer.observe_unary(info, request, response);
        }
    }

    pub(crate) fn notify_stream_request(&self, info: &CallInfo, request: Result<Option<&dyn Payload>, &Status>) {
        let observers = self.lock();
        for observer in observers.stream_request.values() {
            observer.observe_stream_request(info, request);
        }
    }

    pub(crate) fn notify_stream_response(&self, info: &CallInfo, response: &dyn Payload, error: Option<&Status>) {
        let observers = self.lock();
        for observer in observers.stream_response.values() {
            observer.observe_stream_response(info, response, error);
        }
    }
}

impl fmt::Debug for ObserverRegistry {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let observers = self.lock();
        f.debug_struct("ObserverRegistry")
            .field("unary", &observers.unary.len())
            .field("stream_request", &observers.stream_request.len())
            .field("stream_response", &observers.stream_response.len())
            .finish()
    }
}

/// Server stream decorator that reports every message to the registry.
pub struct ObservedStream<S> {
    inner: S,
    info: CallInfo,
    registry: Arc<ObserverRegistry>,
}

impl<S> ObservedStream<S> {
    pub fn new(inner: S, info: CallInfo, registry: Arc<ObserverRegistry>) -> Self {
        Self { inner, info, registry }
    }

    pub fn info(&self) -> &CallInfo {
        &self.info
    }

    pub fn get_ref(&self) -> &S {
        &self.inner
    }

    pub fn into_inner(self) -> S {
        self.inner
    }
}

#[async_trait]
impl<S: ServerStream> ServerStream for ObservedStream<S> {
    type Request = S::Request;
    type Response = S::Response;

    async fn send(&mut self, message: Self::Response) -> Result<(), Status> {
        let sent = message.clone();
        let result = self.inner.send(message).await;
        self.registry
            .notify_stream_response(&self.info, &sent, result.as_ref().err());
        result
    }

    async fn recv(&mut self) -> Result<Option<Self::Request>, Status> {
        let result = self.inner.recv().await;
        let observed = match &result {
            Ok(Some(message)) => Ok(Some(message as &dyn Payload)),
            Ok(None) => Ok(None),
            Err(status) => Err(status),
        };
        self.registry.notify_stream_request(&self.info, observed);
        result
    }
}

#[cfg(test)]
pub(crate) mod tests {
    use super::*;
    use crate::proto::testing::{PingRequest, PingResponse};
    use crate::rpc::context::{CallKind, Transport};
    use std::collections::VecDeque;

    /// Records every notification as a short string.
    #[derive(Default)]
    pub(crate) struct Recorder {
        pub(crate) name: String,
        pub(crate) events: Mutex<Vec<String>>,
    }

    impl Recorder {
        pub(crate) fn named(name: &str) -> Arc<Self> {
            Arc::new(Self {
                name: name.to_string(),
                events: Mutex::new(Vec::new()),
            })
        }

        pub(crate) fn events(&self) -> Vec<String> {
            self.events.lock().unwrap().clone()
        }

        fn push(&self, event: String) {
            self.events.lock().unwrap().push(event);
        }
    }

    impl UnaryObserver for Recorder {
        fn name(&self) -> &str {
            &self.name
        }

        fn observe_unary(&self, info: &CallInfo, _request: &dyn Payload, response: Result<&dyn Payload, &Status>) {
            match response {
                Ok(_) => self.push(format!("{} ok", info.method)),
                Err(status) => self.push(format!("{} {:?}", info.method, status.code())),
            }
        }
    }

    impl StreamRequestObserver for Recorder {
        fn name(&self) -> &str {
            &self.name
        }

        fn observe_stream_request(&self, _info: &CallInfo, request: Result<Option<&dyn Payload>, &Status>) {
            match request {
                Ok(Some(message)) => self.push(format!("recv {}", message.wire_len())),
                Ok(None) => self.push("recv end".to_string()),
                Err(status) => self.push(format!("recv {:?}", status.code())),
            }
        }
    }

    impl StreamResponseObserver for Recorder {
        fn name(&self) -> &str {
            &self.name
        }

        fn observe_stream_response(&self, _info: &CallInfo, response: &dyn Payload, error: Option<&Status>) {
            self.push(format!("send {} {}", response.wire_len(), error.is_some()));
        }
    }

    /// In-memory stream: scripted inbound messages, recorded outbound ones.
    pub(crate) struct ScriptedStream {
        pub(crate) inbound: VecDeque<PingRequest>,
        pub(crate) sent: Vec<PingResponse>,
        pub(crate) closed: bool,
    }

    #[async_trait]
    impl ServerStream for ScriptedStream {
        type Request = PingRequest;
        type Response = PingResponse;

        async fn send(&mut self, message: PingResponse) -> Result<(), Status> {
            if self.closed {
                return Err(Status::cancelled("closed"));
            }
            self.sent.push(message);
            Ok(())
        }

        async fn recv(&mut self) -> Result<Option<PingRequest>, Status> {
            Ok(self.inbound.pop_front())
        }
    }

    fn info() -> CallInfo {
        CallInfo {
            method: "/testing.TestService/PingStream",
            kind: CallKind::BidiStreaming,
            transport: Transport::Rpc,
            headers: Vec::new(),
        }
    }

    #[test]
    fn registering_same_name_replaces_observer() {
        let registry = ObserverRegistry::new();
        let first = Recorder::named("tap");
        let second = Recorder::named("tap");
        registry.register_unary_observer(first.clone());
        registry.register_unary_observer(second.clone());

        let request = PingRequest::default();
        let response = PingResponse::default();
        registry.notify_unary(&info(), &request, Ok(&response));

        assert!(first.events().is_empty());
        assert_eq!(second.events().len(), 1);
        assert_eq!(registry.unary_observer_names(), vec!["tap".to_string()]);
    }

    #[test]
    fn deleting_unknown_name_is_a_noop() {
        let registry = ObserverRegistry::new();
        registry.delete_unary_observer("missing");
        registry.delete_stream_request_observer("missing");
        registry.delete_stream_response_observer("missing");

        let tap = Recorder::named("tap");
        registry.register_unary_observer(tap.clone());
        registry.delete_unary_observer("tap");
        registry.notify_unary(&info(), &PingRequest::default(), Err(&Status::internal("x")));
        assert!(tap.events().is_empty());
    }

    #[test]
    fn unary_observers_see_handler_errors() {
        let registry = ObserverRegistry::new();
        let tap = Recorder::named("tap");
        registry.register_unary_observer(tap.clone());

        registry.notify_unary(&info(), &PingRequest::default(), Err(&Status::not_found("gone")));
        assert_eq!(tap.events(), vec!["/testing.TestService/PingStream NotFound".to_string()]);
    }

    #[tokio::test]
    async fn observed_stream_reports_in_order_after_transport() {
        let registry = Arc::new(ObserverRegistry::new());
        let tap = Recorder::named("tap");
        registry.register_stream_request_observer(tap.clone());
        registry.register_stream_response_observer(tap.clone());

        let inner = ScriptedStream {
            inbound: VecDeque::from([PingRequest {
                value: "a".into(),
                ..Default::default()
            }]),
            sent: Vec::new(),
            closed: false,
        };
        let mut stream = ObservedStream::new(inner, info(), Arc::clone(&registry));

        let first = stream.recv().await.unwrap().unwrap();
        stream
            .send(PingResponse {
                value: first.value,
                counter: 1,
            })
            .await
            .unwrap();
        assert!(stream.recv().await.unwrap().is_none());

        assert_eq!(
            tap.events(),
            vec!["recv 3".to_string(), "send 5 false".to_string(), "recv end".to_string()]
        );
        assert_eq!(stream.into_inner().sent.len(), 1);
    }

    #[tokio::test]
    async fn observed_stream_reports_send_errors() {
        let registry = Arc::new(ObserverRegistry::new());
        let tap = Recorder::named("tap");
        registry.register_stream_response_observer(tap.clone());

        let inner = ScriptedStream {
            inbound: VecDeque::new(),
            sent: Vec::new(),
            closed: true,
        };
        let mut stream = ObservedStream::new(inner, info(), registry);

        assert!(stream.send(PingResponse::default()).await.is_err());
        assert_eq!(tap.events(), vec!["send 0 true".to_string()]);
    }
}
