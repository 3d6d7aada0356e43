// Copyright (c) 2025 Steve Wagner (ciroque@live.com)
// SPDX-License-Identifier: MIT

//! Isolated conversion contexts.
//!
//! A context is a tokio task that owns one backend instance and talks to its
//! owner only through messages:
//!
//! - **Inbox**: unbounded `mpsc` of `START_CONVERSION` deliveries, each tagged
//!   with a request id allocated by the [`ContextHandle`] and carrying the
//!   sender half of that request's reply channel
//! - **Replies**: unbounded `mpsc` per request; the caller's only source of
//!   truth for its request. It closes once the request is done or the context
//!   stops
//! - **Outbox**: `broadcast` of [`Envelope`]s for observers. Lagging observers
//!   lose envelopes; callers never depend on it
//! - **State**: a `watch` of [`ContextState`]
//!
//! Requests are processed strictly one at a time. The backend body runs in its
//! own task so that a panic faults the context instead of unwinding through
//! the message loop, and so teardown can abort it.

use std::any::Any;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;

use tokio::runtime::Handle;
use tokio::sync::{broadcast, mpsc, watch};
use tokio_util::sync::CancellationToken;
use tracing::Instrument;

use crate::context::protocol::{
    ConversionCompletePayload, ConversionStartedPayload, Envelope, ErrorDetail, InboundMessage,
    ReadyPayload, StartConversionPayload, WorkerMessage,
};
use crate::errors::ConversionError;
use crate::observability::messages::backend::BackendConversionFailed;
use crate::observability::messages::context::{ContextFaulted, ContextSpawned, ContextStopped};
use crate::observability::messages::StructuredLog;
use crate::traits::{BackendRequest, ConversionBackend, ProgressReporter};

static NEXT_CONTEXT_ID: AtomicU64 = AtomicU64::new(1);

/// Lifecycle of an isolated context.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ContextState {
    Starting,
    Ready,
    Busy,
    Terminated,
    /// The backend panicked; carries the panic message.
    Faulted(String),
}

impl ContextState {
    pub fn is_live(&self) -> bool {
        matches!(self, ContextState::Starting | ContextState::Ready | ContextState::Busy)
    }
}

#[derive(Debug)]
struct Delivery {
    request_id: u64,
    message: InboundMessage,
    reply: mpsc::UnboundedSender<WorkerMessage>,
}

/// A request accepted by a context.
///
/// `replies` yields the request's messages in order and ends after the
/// terminal one. It ends early, without a terminal message, when the context
/// stops first.
#[derive(Debug)]
pub struct PendingRequest {
    pub id: u64,
    pub replies: mpsc::UnboundedReceiver<WorkerMessage>,
}

/// The task side of a context.
pub struct IsolatedContext {
    id: u64,
    backend_id: String,
    backend: Arc<dyn ConversionBackend>,
    inbox: mpsc::UnboundedReceiver<Delivery>,
    outbox: broadcast::Sender<Envelope>,
    state: watch::Sender<ContextState>,
    shutdown: CancellationToken,
}

impl IsolatedContext {
    /// Spawn a context for `backend` on `runtime` and return the owner's handle.
    ///
    /// `event_buffer` is the outbox capacity; observers that fall further
    /// behind than this lose the oldest envelopes. Replies are unaffected.
    pub fn spawn(
        backend_id: impl Into<String>,
        backend: Arc<dyn ConversionBackend>,
        runtime: &Handle,
        event_buffer: usize,
    ) -> ContextHandle {
        let backend_id = backend_id.into();
        let id = NEXT_CONTEXT_ID.fetch_add(1, Ordering::Relaxed);
        let worker_type = backend.backend_type();

        let (inbox_tx, inbox_rx) = mpsc::unbounded_channel();
        let (outbox, _) = broadcast::channel(event_buffer.max(1));
        let (state_tx, state_rx) = watch::channel(ContextState::Starting);
        let shutdown = CancellationToken::new();

        let spawned = ContextSpawned {
            backend_id: &backend_id,
            context_id: id,
            worker_type,
        };
        spawned.log();
        let span = spawned.span("run");

        let context = IsolatedContext {
            id,
            backend_id: backend_id.clone(),
            backend,
            inbox: inbox_rx,
            outbox: outbox.clone(),
            state: state_tx,
            shutdown: shutdown.clone(),
        };
        runtime.spawn(context.run().instrument(span));

        ContextHandle {
            id,
            backend_id,
            worker_type,
            inbox: inbox_tx,
            outbox,
            state: state_rx,
            shutdown,
            next_request: AtomicU64::new(1),
        }
    }

    async fn run(mut self) {
        // Any exit from the loop, including a fault, marks the context as gone.
        let _guard = self.shutdown.clone().drop_guard();

        self.state.send_replace(ContextState::Ready);
        self.emit(Envelope::broadcast(WorkerMessage::Ready {
            payload: ReadyPayload {
                worker_type: self.backend.backend_type().to_string(),
            },
        }));

        loop {
            let delivery = tokio::select! {
                biased;
                _ = self.shutdown.cancelled() => break,
                delivery = self.inbox.recv() => match delivery {
                    Some(delivery) => delivery,
                    None => break,
                },
            };

            if let Err(reason) = self.handle(delivery).await {
                ContextFaulted {
                    backend_id: &self.backend_id,
                    context_id: self.id,
                    reason: &reason,
                }
                .log();
                break;
            }
        }

        if self.state.borrow().is_live() {
            self.state.send_replace(ContextState::Terminated);
        }
        ContextStopped {
            backend_id: &self.backend_id,
            context_id: self.id,
        }
        .log();
    }

    /// Process one delivery. `Err` carries a fault reason and stops the context;
    /// the state is already `Faulted` by then.
    async fn handle(&mut self, delivery: Delivery) -> Result<(), String> {
        let Delivery {
            request_id,
            message,
            reply,
        } = delivery;

        match message {
            InboundMessage::StartConversion { payload } => {
                self.start_conversion(request_id, payload, reply).await
            }
        }
    }

    async fn start_conversion(
        &mut self,
        request_id: u64,
        payload: StartConversionPayload,
        reply: mpsc::UnboundedSender<WorkerMessage>,
    ) -> Result<(), String> {
        self.state.send_replace(ContextState::Busy);

        let StartConversionPayload {
            file,
            target_format,
        } = payload;
        let file_name = file.name.clone();

        self.respond(
            request_id,
            &reply,
            WorkerMessage::ConversionStarted {
                payload: ConversionStartedPayload {
                    file_name: file_name.clone(),
                    source_format: file.extension(),
                    target_format: target_format.clone(),
                },
            },
        );

        let outbox = self.outbox.clone();
        let progress_reply = reply.clone();
        let progress = ProgressReporter::new(move |progress| {
            let message = WorkerMessage::ProgressUpdate { progress };
            let _ = progress_reply.send(message.clone());
            let _ = outbox.send(Envelope::for_request(request_id, message));
        });
        let backend = Arc::clone(&self.backend);
        let request = BackendRequest {
            file,
            target_format: target_format.clone(),
        };
        let mut body = tokio::spawn(async move { backend.convert(request, &progress).await });

        let joined = tokio::select! {
            biased;
            _ = self.shutdown.cancelled() => {
                body.abort();
                return Ok(());
            }
            joined = &mut body => joined,
        };

        let message = match joined {
            Ok(Ok(result)) => WorkerMessage::ConversionComplete {
                result,
                payload: ConversionCompletePayload {
                    file_name,
                    target_format,
                },
            },
            Ok(Err(error)) => {
                let detail = error.to_string();
                BackendConversionFailed {
                    backend_type: self.backend.backend_type(),
                    kind: error.name(),
                    message: &detail,
                }
                .log();
                WorkerMessage::ConversionError {
                    error: ErrorDetail {
                        message: Some(detail),
                        name: error.name().to_string(),
                    },
                }
            }
            Err(join_error) if join_error.is_panic() => {
                // Faulted must be visible before the reply channel closes.
                let reason = panic_message(join_error.into_panic());
                self.state.send_replace(ContextState::Faulted(reason.clone()));
                return Err(reason);
            }
            Err(join_error) => WorkerMessage::ConversionError {
                error: ErrorDetail {
                    message: Some(join_error.to_string()),
                    name: "InternalError".to_string(),
                },
            },
        };

        self.respond(request_id, &reply, message);
        self.state.send_replace(ContextState::Ready);
        Ok(())
    }

    /// Send a request-scoped message to its caller and to observers.
    fn respond(
        &self,
        request_id: u64,
        reply: &mpsc::UnboundedSender<WorkerMessage>,
        message: WorkerMessage,
    ) {
        // A caller that gave up has dropped its receiver.
        let _ = reply.send(message.clone());
        self.emit(Envelope::for_request(request_id, message));
    }

    fn emit(&self, envelope: Envelope) {
        // No observers is not an error.
        let _ = self.outbox.send(envelope);
    }
}

fn panic_message(payload: Box<dyn Any + Send>) -> String {
    if let Some(message) = payload.downcast_ref::<&str>() {
        format!("backend panicked: {}", message)
    } else if let Some(message) = payload.downcast_ref::<String>() {
        format!("backend panicked: {}", message)
    } else {
        "backend panicked".to_string()
    }
}

/// The owner's side of a context: a send-capable reference plus access to the
/// outbox and lifecycle state.
#[derive(Debug)]
pub struct ContextHandle {
    id: u64,
    backend_id: String,
    worker_type: &'static str,
    inbox: mpsc::UnboundedSender<Delivery>,
    outbox: broadcast::Sender<Envelope>,
    state: watch::Receiver<ContextState>,
    shutdown: CancellationToken,
    next_request: AtomicU64,
}

impl ContextHandle {
    pub fn id(&self) -> u64 {
        self.id
    }

    pub fn backend_id(&self) -> &str {
        &self.backend_id
    }

    pub fn worker_type(&self) -> &'static str {
        self.worker_type
    }

    pub fn state(&self) -> ContextState {
        self.state.borrow().clone()
    }

    /// Observe envelopes emitted after this call, for every request.
    pub fn subscribe(&self) -> broadcast::Receiver<Envelope> {
        self.outbox.subscribe()
    }

    /// Queue a message for the context. The returned request owns the only
    /// receiver for that request's replies.
    pub fn post(&self, message: InboundMessage) -> Result<PendingRequest, ConversionError> {
        if self.is_terminated() {
            return Err(self.termination_error());
        }

        let id = self.next_request.fetch_add(1, Ordering::Relaxed);
        let (reply, replies) = mpsc::unbounded_channel();
        self.inbox
            .send(Delivery {
                request_id: id,
                message,
                reply,
            })
            .map_err(|_| self.termination_error())?;
        Ok(PendingRequest { id, replies })
    }

    /// Signal the context to stop. A conversion still running is aborted.
    pub fn terminate(&self) {
        self.shutdown.cancel();
    }

    pub fn is_terminated(&self) -> bool {
        self.shutdown.is_cancelled()
    }

    /// Resolves once the context has stopped for any reason.
    pub async fn terminated(&self) {
        self.shutdown.cancelled().await
    }

    /// Panic message when the context faulted.
    pub fn failure_reason(&self) -> Option<String> {
        match &*self.state.borrow() {
            ContextState::Faulted(reason) => Some(reason.clone()),
            _ => None,
        }
    }

    /// Error for calls that can no longer be served by this context.
    pub fn termination_error(&self) -> ConversionError {
        match self.failure_reason() {
            Some(reason) => ConversionError::Transport(reason),
            None => ConversionError::ContextTerminated {
                backend_id: self.backend_id.clone(),
            },
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::backends::stub::{GatedBackend, PanickingBackend, ScriptedBackend};
    use crate::config::FormatTable;
    use crate::context::protocol::InputFile;
    use crate::errors::BackendError;
    use std::time::Duration;

    fn png_to_jpg() -> FormatTable {
        FormatTable::from_pairs(&[("png", &["jpg"])])
    }

    fn spawn(backend: Arc<dyn ConversionBackend>) -> ContextHandle {
        IsolatedContext::spawn("test", backend, &Handle::current(), 64)
    }

    /// Drain a request's replies until the channel closes.
    async fn collect_replies(request: &mut PendingRequest) -> Vec<WorkerMessage> {
        let mut collected = Vec::new();
        loop {
            let next = tokio::time::timeout(Duration::from_secs(5), request.replies.recv())
                .await
                .expect("timed out waiting for reply");
            match next {
                Some(message) => collected.push(message),
                None => return collected,
            }
        }
    }

    fn start(name: &str) -> InboundMessage {
        InboundMessage::start_conversion(InputFile::new(name, vec![0u8; 4]), "jpg")
    }

    /// Observe envelopes for `request_id` up to and including its terminal message.
    async fn observe_request(
        events: &mut broadcast::Receiver<Envelope>,
        request_id: u64,
    ) -> Vec<WorkerMessage> {
        let mut collected = Vec::new();
        loop {
            let envelope = tokio::time::timeout(Duration::from_secs(5), events.recv())
                .await
                .expect("timed out waiting for envelope")
                .unwrap();
            if envelope.request_id != Some(request_id) {
                continue;
            }
            let terminal = envelope.message.is_terminal();
            collected.push(envelope.message);
            if terminal {
                return collected;
            }
        }
    }

    async fn wait_for_state(handle: &ContextHandle, expected: ContextState) {
        for _ in 0..100 {
            if handle.state() == expected {
                return;
            }
            tokio::task::yield_now().await;
        }
        panic!("context never reached {:?}, last state {:?}", expected, handle.state());
    }

    #[tokio::test]
    async fn test_ready_is_broadcast_on_start() {
        let handle = spawn(Arc::new(ScriptedBackend::succeeding(png_to_jpg())));
        let mut events = handle.subscribe();

        let ready = events.recv().await.unwrap();
        assert_eq!(ready.request_id, None);
        assert_eq!(
            ready.message,
            WorkerMessage::Ready {
                payload: ReadyPayload {
                    worker_type: "scripted".into()
                }
            }
        );
        assert_eq!(handle.state(), ContextState::Ready);
        assert_eq!(handle.worker_type(), "scripted");
    }

    #[tokio::test]
    async fn test_request_message_order() {
        let handle = spawn(Arc::new(ScriptedBackend::succeeding(png_to_jpg())));

        let mut request = handle.post(start("photo.PNG")).unwrap();
        let messages = collect_replies(&mut request).await;

        let kinds: Vec<&str> = messages.iter().map(|m| m.kind()).collect();
        assert_eq!(
            kinds,
            ["CONVERSION_STARTED", "PROGRESS_UPDATE", "PROGRESS_UPDATE", "CONVERSION_COMPLETE"]
        );
        assert_eq!(
            messages[0],
            WorkerMessage::ConversionStarted {
                payload: ConversionStartedPayload {
                    file_name: "photo.PNG".into(),
                    source_format: "png".into(),
                    target_format: "jpg".into(),
                }
            }
        );
        assert_eq!(messages[1], WorkerMessage::ProgressUpdate { progress: 25.0 });
        assert_eq!(messages[2], WorkerMessage::ProgressUpdate { progress: 75.0 });
        wait_for_state(&handle, ContextState::Ready).await;
    }

    #[tokio::test]
    async fn test_backend_error_becomes_conversion_error() {
        let backend = ScriptedBackend::failing(
            png_to_jpg(),
            BackendError::Decode("Image conversion failed: Failed to load image".into()),
        );
        let handle = spawn(Arc::new(backend));

        let mut request = handle.post(start("broken.png")).unwrap();
        let messages = collect_replies(&mut request).await;

        assert_eq!(
            messages.last().unwrap(),
            &WorkerMessage::ConversionError {
                error: ErrorDetail {
                    message: Some("Image conversion failed: Failed to load image".into()),
                    name: "DecodeError".into(),
                }
            }
        );
        // A backend error is not a fault; the context keeps serving.
        wait_for_state(&handle, ContextState::Ready).await;
        assert!(handle.post(start("next.png")).is_ok());
    }

    #[tokio::test]
    async fn test_requests_are_serialized() {
        let backend = Arc::new(GatedBackend::new(png_to_jpg()));
        let gate = Arc::clone(&backend.gate);
        let entered = Arc::clone(&backend.entered);
        let handle = spawn(backend);
        let mut events = handle.subscribe();

        let first = handle.post(start("a.png")).unwrap().id;
        let second = handle.post(start("b.png")).unwrap().id;
        assert_ne!(first, second);

        // Let the first conversion reach its gate.
        loop {
            let envelope = events.recv().await.unwrap();
            if envelope.request_id == Some(first) && envelope.message.kind() == "PROGRESS_UPDATE" {
                break;
            }
        }
        for _ in 0..20 {
            tokio::task::yield_now().await;
        }
        assert_eq!(entered.load(Ordering::SeqCst), 1);
        assert_eq!(handle.state(), ContextState::Busy);

        gate.add_permits(1);
        let mut order = Vec::new();
        loop {
            let envelope = events.recv().await.unwrap();
            order.push((envelope.request_id, envelope.message.kind()));
            if envelope.request_id == Some(second) && envelope.message.kind() == "PROGRESS_UPDATE" {
                break;
            }
        }
        let first_done = order
            .iter()
            .position(|e| *e == (Some(first), "CONVERSION_COMPLETE"))
            .unwrap();
        let second_started = order
            .iter()
            .position(|e| *e == (Some(second), "CONVERSION_STARTED"))
            .unwrap();
        assert!(first_done < second_started);

        gate.add_permits(1);
        let rest = observe_request(&mut events, second).await;
        assert_eq!(rest.last().unwrap().kind(), "CONVERSION_COMPLETE");
        assert_eq!(entered.load(Ordering::SeqCst), 2);
    }

    #[tokio::test]
    async fn test_panic_faults_context() {
        let handle = spawn(Arc::new(PanickingBackend {
            conversions: png_to_jpg(),
        }));

        let mut request = handle.post(start("crash.png")).unwrap();
        let messages = collect_replies(&mut request).await;
        assert!(messages.iter().all(|m| !m.is_terminal()));

        // The fault is recorded before the reply channel closes.
        let reason = handle.failure_reason().unwrap();
        assert!(reason.contains("simulated backend crash"), "reason: {}", reason);
        assert!(matches!(handle.state(), ContextState::Faulted(_)));

        let error = handle.post(start("again.png")).unwrap_err();
        assert_eq!(error, ConversionError::Transport(reason));
        tokio::time::timeout(Duration::from_secs(5), handle.terminated())
            .await
            .unwrap();
    }

    #[tokio::test]
    async fn test_replies_survive_lagging_outbox() {
        let handle = IsolatedContext::spawn(
            "test",
            Arc::new(ScriptedBackend::succeeding(png_to_jpg())),
            &Handle::current(),
            1,
        );
        // An observer that never reads falls behind immediately.
        let _stalled = handle.subscribe();

        let mut requests: Vec<PendingRequest> = (0..40)
            .map(|i| handle.post(start(&format!("{}.png", i))).unwrap())
            .collect();

        for request in requests.iter_mut() {
            let messages = collect_replies(request).await;
            assert_eq!(messages.len(), 4, "request {}", request.id);
            assert_eq!(messages.last().unwrap().kind(), "CONVERSION_COMPLETE");
        }
    }

    #[tokio::test]
    async fn test_terminate_closes_queued_replies() {
        let backend = Arc::new(GatedBackend::new(png_to_jpg()));
        let handle = spawn(backend);

        let mut running = handle.post(start("running.png")).unwrap();
        let mut queued = handle.post(start("queued.png")).unwrap();
        let first = running.replies.recv().await.unwrap();
        assert_eq!(first.kind(), "CONVERSION_STARTED");

        handle.terminate();

        let running_rest = collect_replies(&mut running).await;
        assert!(running_rest.iter().all(|m| !m.is_terminal()));
        assert!(collect_replies(&mut queued).await.is_empty());
        assert_eq!(
            handle.termination_error(),
            ConversionError::ContextTerminated {
                backend_id: "test".into()
            }
        );
    }

    #[tokio::test]
    async fn test_terminate_aborts_in_flight_conversion() {
        let backend = Arc::new(GatedBackend::new(png_to_jpg()));
        let entered = Arc::clone(&backend.entered);
        let handle = spawn(backend);
        let mut events = handle.subscribe();

        let request_id = handle.post(start("slow.png")).unwrap().id;
        loop {
            let envelope = events.recv().await.unwrap();
            if envelope.request_id == Some(request_id) && envelope.message.kind() == "PROGRESS_UPDATE" {
                break;
            }
        }
        assert_eq!(entered.load(Ordering::SeqCst), 1);

        handle.terminate();
        handle.terminated().await;
        wait_for_state(&handle, ContextState::Terminated).await;
        assert!(handle.failure_reason().is_none());

        let error = handle.post(start("late.png")).unwrap_err();
        assert_eq!(
            error,
            ConversionError::ContextTerminated {
                backend_id: "test".into()
            }
        );
    }
}
