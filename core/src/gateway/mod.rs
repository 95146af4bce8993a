//! Classifier Gateway
//!
//! Bridges the selection pipeline to an out-of-process (or remote)
//! classifier. Turns `initialize`/`classify`/`dispose` calls into correlated
//! wire messages with per-call timeouts and clean cancellation.
//!
//! # Architecture
//!
//! ```text
//! +-------------------+   outbound channel   +------------------+
//! | ClassifierGateway | -------------------> |                  |
//! |  pending table    |                      |     I/O task     | <-> transport
//! |  state machine    | <------------------- |                  |
//! +-------------------+   oneshot settles    +------------------+
//! ```
//!
//! A single I/O task owns the transport. `classify` registers a oneshot
//! sender in the pending table keyed by correlation id, sends the tagged
//! request, and races the response against a deadline. Removal from the
//! pending table is the only settle point, so each request settles at most
//! once — by response, timeout, or disposal, whichever comes first.
//!
//! # State Machine
//!
//! ```text
//! Uninitialized -> Initializing -> Ready -> Disposed
//!                       |            |
//!                       +-> Failed <-+   (permanently unusable)
//! ```

pub mod frame;
pub mod protocol;
pub mod transport;

use std::collections::HashMap;
use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use parking_lot::Mutex;
use tokio::sync::{mpsc, oneshot};
use tracing::{debug, warn};

use crate::classifier::{Classifier, ClassifyError};
use crate::types::{ClassificationInput, ClassificationResult, ModelConfig};

pub use protocol::{ClassifyRequest, ClassifyResponse, RequestId};
pub use transport::{ChannelTransport, ClassifierTransport, FramedTransport, TransportError};

/// Gateway lifecycle states
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum GatewayState {
    /// Constructed, initialize not yet called
    Uninitialized,
    /// Init message sent, waiting for the ready acknowledgment
    Initializing,
    /// Accepting classify calls
    Ready,
    /// Initialization or transport failed; construct a new instance
    Failed,
    /// Torn down
    Disposed,
}

/// Gateway timeout and channel configuration
#[derive(Clone, Copy, Debug)]
pub struct GatewayConfig {
    /// Overall deadline for initialization
    pub init_timeout: Duration,
    /// Per-call deadline for classification
    pub classify_timeout: Duration,
    /// Capacity of the outbound request channel
    pub channel_capacity: usize,
}

impl Default for GatewayConfig {
    fn default() -> Self {
        Self {
            init_timeout: Duration::from_secs(30),
            classify_timeout: Duration::from_secs(10),
            channel_capacity: 32,
        }
    }
}

type Settle = oneshot::Sender<Result<ClassificationResult, ClassifyError>>;

/// State shared between the gateway handle and its I/O task
struct Shared {
    state: Mutex<GatewayState>,
    pending: Mutex<HashMap<RequestId, Settle>>,
    init_waiter: Mutex<Option<oneshot::Sender<Result<(), ClassifyError>>>>,
}

impl Shared {
    /// Route one response to whatever is waiting on it
    fn dispatch(&self, msg: ClassifyResponse) {
        match msg {
            ClassifyResponse::Ready => {
                if let Some(waiter) = self.init_waiter.lock().take() {
                    let _ = waiter.send(Ok(()));
                } else {
                    debug!("unexpected ready acknowledgment ignored");
                }
            }
            ClassifyResponse::Result { result, id } => {
                if let Some(settle) = self.pending.lock().remove(&id) {
                    let _ = settle.send(Ok(result));
                } else {
                    debug!(%id, "late or unmatched result dropped");
                }
            }
            ClassifyResponse::Error { error, id: Some(id) } => {
                if let Some(settle) = self.pending.lock().remove(&id) {
                    let _ = settle.send(Err(ClassifyError::Remote(error)));
                } else {
                    debug!(%id, "late or unmatched error dropped");
                }
            }
            ClassifyResponse::Error { error, id: None } => {
                if let Some(waiter) = self.init_waiter.lock().take() {
                    let _ = waiter.send(Err(ClassifyError::Init(error)));
                } else {
                    warn!(error = %error, "unsolicited classifier error ignored");
                }
            }
        }
    }

    /// Reject everything outstanding and mark the gateway unusable
    fn fail_all(&self, err: &ClassifyError) {
        {
            let mut state = self.state.lock();
            if *state != GatewayState::Disposed {
                *state = GatewayState::Failed;
            }
        }
        let drained: Vec<Settle> = {
            let mut pending = self.pending.lock();
            pending.drain().map(|(_, settle)| settle).collect()
        };
        for settle in drained {
            let _ = settle.send(Err(err.clone()));
        }
        if let Some(waiter) = self.init_waiter.lock().take() {
            let _ = waiter.send(Err(err.clone()));
        }
    }
}

/// Async gateway to a remote classifier
///
/// One long-lived connection per instance. Construction spawns the I/O task,
/// so a tokio runtime must be current. A failed instance stays failed;
/// callers construct a new gateway to reconnect.
pub struct ClassifierGateway {
    shared: Arc<Shared>,
    outbound: mpsc::Sender<ClassifyRequest>,
    config: GatewayConfig,
}

impl ClassifierGateway {
    /// Create a gateway over the given transport and spawn its I/O task
    #[must_use]
    pub fn new<T: ClassifierTransport>(transport: T, config: GatewayConfig) -> Self {
        let shared = Arc::new(Shared {
            state: Mutex::new(GatewayState::Uninitialized),
            pending: Mutex::new(HashMap::new()),
            init_waiter: Mutex::new(None),
        });

        let (outbound, outbound_rx) = mpsc::channel(config.channel_capacity);
        tokio::spawn(run_io(transport, outbound_rx, Arc::clone(&shared)));

        Self {
            shared,
            outbound,
            config,
        }
    }

    /// Current lifecycle state
    #[must_use]
    pub fn state(&self) -> GatewayState {
        *self.shared.state.lock()
    }

    /// Number of requests currently awaiting a response
    #[must_use]
    pub fn pending_requests(&self) -> usize {
        self.shared.pending.lock().len()
    }

    /// Initialize the remote classifier
    ///
    /// Sends `init` and waits for the ready acknowledgment under
    /// [`GatewayConfig::init_timeout`]. Only one initialize may be in flight;
    /// failure leaves the gateway permanently in [`GatewayState::Failed`].
    ///
    /// # Errors
    ///
    /// [`ClassifyError::InitTimeout`] when the acknowledgment does not arrive
    /// in time, [`ClassifyError::Init`] when the classifier reports an
    /// initialization failure or the gateway is not freshly constructed.
    pub async fn initialize(&self, config: ModelConfig) -> Result<(), ClassifyError> {
        {
            let mut state = self.shared.state.lock();
            match *state {
                GatewayState::Uninitialized => *state = GatewayState::Initializing,
                GatewayState::Initializing => {
                    return Err(ClassifyError::Init(
                        "initialization already in flight".to_string(),
                    ))
                }
                GatewayState::Ready => {
                    return Err(ClassifyError::Init("already initialized".to_string()))
                }
                GatewayState::Failed => {
                    return Err(ClassifyError::Init(
                        "gateway failed; construct a new instance".to_string(),
                    ))
                }
                GatewayState::Disposed => return Err(ClassifyError::Disposed),
            }
        }

        let (waiter_tx, waiter_rx) = oneshot::channel();
        *self.shared.init_waiter.lock() = Some(waiter_tx);

        if self
            .outbound
            .send(ClassifyRequest::Init { config })
            .await
            .is_err()
        {
            self.shared.init_waiter.lock().take();
            self.shared
                .fail_all(&ClassifyError::Transport("io task stopped".to_string()));
            return Err(ClassifyError::Transport("io task stopped".to_string()));
        }

        match tokio::time::timeout(self.config.init_timeout, waiter_rx).await {
            Ok(Ok(Ok(()))) => {
                let mut state = self.shared.state.lock();
                match *state {
                    GatewayState::Disposed => Err(ClassifyError::Disposed),
                    _ => {
                        *state = GatewayState::Ready;
                        Ok(())
                    }
                }
            }
            Ok(Ok(Err(err))) => {
                let mut state = self.shared.state.lock();
                if *state != GatewayState::Disposed {
                    *state = GatewayState::Failed;
                }
                Err(err)
            }
            // Waiter dropped without settling; the io task is gone.
            Ok(Err(_)) => Err(ClassifyError::Transport("gateway stopped".to_string())),
            Err(_elapsed) => {
                // Disarm: drop the waiter so a late ready is a no-op.
                self.shared.init_waiter.lock().take();
                let mut state = self.shared.state.lock();
                if *state != GatewayState::Disposed {
                    *state = GatewayState::Failed;
                }
                Err(ClassifyError::InitTimeout)
            }
        }
    }

    /// Classify content through the remote classifier
    ///
    /// Registers a pending request under a fresh correlation id, sends the
    /// tagged `classify` message, and waits for a matching response under
    /// [`GatewayConfig::classify_timeout`].
    ///
    /// # Errors
    ///
    /// [`ClassifyError::NotReady`] unless the gateway is ready (no wire
    /// message is sent), [`ClassifyError::Timeout`] when the deadline
    /// elapses, [`ClassifyError::Remote`] for classifier-reported failures,
    /// [`ClassifyError::Disposed`] when torn down mid-flight.
    pub async fn classify(
        &self,
        input: ClassificationInput,
    ) -> Result<ClassificationResult, ClassifyError> {
        if self.state() != GatewayState::Ready {
            return Err(ClassifyError::NotReady);
        }

        let id = RequestId::new();
        let (settle_tx, mut settle_rx) = oneshot::channel();
        self.shared.pending.lock().insert(id.clone(), settle_tx);

        // Disposal may have raced the insert; the pending table decides.
        if self.state() != GatewayState::Ready {
            self.shared.pending.lock().remove(&id);
            return Err(ClassifyError::Disposed);
        }

        if self
            .outbound
            .send(ClassifyRequest::Classify {
                input,
                id: id.clone(),
            })
            .await
            .is_err()
        {
            self.shared.pending.lock().remove(&id);
            return Err(ClassifyError::Transport("io task stopped".to_string()));
        }

        match tokio::time::timeout(self.config.classify_timeout, &mut settle_rx).await {
            Ok(Ok(outcome)) => outcome,
            Ok(Err(_)) => Err(ClassifyError::Transport("gateway stopped".to_string())),
            Err(_elapsed) => {
                if self.shared.pending.lock().remove(&id).is_some() {
                    Err(ClassifyError::Timeout)
                } else {
                    // A response or teardown won the race at the deadline;
                    // the settled outcome is already in the channel.
                    match settle_rx.try_recv() {
                        Ok(outcome) => outcome,
                        Err(_) => Err(ClassifyError::Timeout),
                    }
                }
            }
        }
    }

    /// Tear the gateway down
    ///
    /// Rejects every pending request with [`ClassifyError::Disposed`], clears
    /// the pending table, sends a best-effort `dispose` message, and stops
    /// the I/O task. Idempotent: a second call changes nothing.
    pub async fn dispose(&self) {
        {
            let mut state = self.shared.state.lock();
            if *state == GatewayState::Disposed {
                return;
            }
            *state = GatewayState::Disposed;
        }

        let drained: Vec<Settle> = {
            let mut pending = self.shared.pending.lock();
            pending.drain().map(|(_, settle)| settle).collect()
        };
        for settle in drained {
            let _ = settle.send(Err(ClassifyError::Disposed));
        }
        if let Some(waiter) = self.shared.init_waiter.lock().take() {
            let _ = waiter.send(Err(ClassifyError::Disposed));
        }

        // Best-effort: the io task forwards this and then exits, which
        // releases the transport.
        let _ = self.outbound.send(ClassifyRequest::Dispose).await;
    }
}

#[async_trait]
impl Classifier for ClassifierGateway {
    async fn initialize(&self, config: ModelConfig) -> Result<(), ClassifyError> {
        ClassifierGateway::initialize(self, config).await
    }

    async fn classify(
        &self,
        input: ClassificationInput,
    ) -> Result<ClassificationResult, ClassifyError> {
        ClassifierGateway::classify(self, input).await
    }

    async fn dispose(&self) {
        ClassifierGateway::dispose(self).await;
    }
}

/// I/O task: sole owner of the transport
///
/// Forwards outbound requests and dispatches inbound responses until the
/// gateway is dropped, disposed, or the transport fails.
async fn run_io<T: ClassifierTransport>(
    mut transport: T,
    mut outbound_rx: mpsc::Receiver<ClassifyRequest>,
    shared: Arc<Shared>,
) {
    loop {
        tokio::select! {
            maybe = outbound_rx.recv() => {
                let Some(msg) = maybe else {
                    // Gateway handle dropped.
                    break;
                };
                let is_dispose = matches!(msg, ClassifyRequest::Dispose);
                if let Err(err) = transport.send(msg).await {
                    if !is_dispose {
                        shared.fail_all(&ClassifyError::Transport(err.to_string()));
                    }
                    break;
                }
                if is_dispose {
                    break;
                }
            }
            response = transport.recv() => {
                match response {
                    Ok(msg) => shared.dispatch(msg),
                    Err(err) => {
                        shared.fail_all(&ClassifyError::Transport(err.to_string()));
                        break;
                    }
                }
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::category::Category;
    use serde_json::json;
    use tokio::time::sleep;

    fn test_config() -> GatewayConfig {
        GatewayConfig {
            init_timeout: Duration::from_millis(200),
            classify_timeout: Duration::from_millis(200),
            channel_capacity: 8,
        }
    }

    fn echo_result(input: &ClassificationInput) -> ClassificationResult {
        ClassificationResult {
            category: Category::Text,
            confidence: 0.9,
            alternatives: vec![],
            data: json!({ "echo": input.content }),
            metrics: Default::default(),
        }
    }

    /// Remote stub: acks init, echoes classifies after an optional delay.
    fn spawn_echo_remote(
        mut request_rx: mpsc::Receiver<ClassifyRequest>,
        response_tx: mpsc::Sender<ClassifyResponse>,
        delay: Duration,
    ) {
        tokio::spawn(async move {
            while let Some(request) = request_rx.recv().await {
                match request {
                    ClassifyRequest::Init { .. } => {
                        let _ = response_tx.send(ClassifyResponse::Ready).await;
                    }
                    ClassifyRequest::Classify { input, id } => {
                        let tx = response_tx.clone();
                        tokio::spawn(async move {
                            sleep(delay).await;
                            let _ = tx
                                .send(ClassifyResponse::Result {
                                    result: echo_result(&input),
                                    id,
                                })
                                .await;
                        });
                    }
                    ClassifyRequest::Dispose => break,
                }
            }
        });
    }

    #[tokio::test]
    async fn test_classify_before_init_sends_nothing() {
        let (transport, mut request_rx, _response_tx) = ChannelTransport::new_pair(8);
        let gateway = ClassifierGateway::new(transport, test_config());

        let result = gateway.classify(ClassificationInput::new("hello")).await;
        assert_eq!(result.unwrap_err(), ClassifyError::NotReady);

        // No wire message went out.
        assert!(request_rx.try_recv().is_err());
        assert_eq!(gateway.pending_requests(), 0);
    }

    #[tokio::test]
    async fn test_initialize_then_classify() {
        let (transport, request_rx, response_tx) = ChannelTransport::new_pair(8);
        spawn_echo_remote(request_rx, response_tx, Duration::ZERO);

        let gateway = ClassifierGateway::new(transport, test_config());
        gateway.initialize(ModelConfig::default()).await.unwrap();
        assert_eq!(gateway.state(), GatewayState::Ready);

        let result = gateway
            .classify(ClassificationInput::new("hello"))
            .await
            .unwrap();
        assert_eq!(result.data["echo"], "hello");
        assert_eq!(gateway.pending_requests(), 0);
    }

    // Paused clock: the init deadline fires without real waiting.
    #[tokio::test(start_paused = true)]
    async fn test_init_timeout_marks_failed() {
        let (transport, _request_rx, _response_tx) = ChannelTransport::new_pair(8);
        let gateway = ClassifierGateway::new(transport, test_config());

        let result = gateway.initialize(ModelConfig::default()).await;
        assert_eq!(result.unwrap_err(), ClassifyError::InitTimeout);
        assert_eq!(gateway.state(), GatewayState::Failed);

        // A failed instance stays failed.
        let retry = gateway.initialize(ModelConfig::default()).await;
        assert!(matches!(retry.unwrap_err(), ClassifyError::Init(_)));
    }

    #[tokio::test]
    async fn test_init_error_response() {
        let (transport, mut request_rx, response_tx) = ChannelTransport::new_pair(8);
        tokio::spawn(async move {
            let _ = request_rx.recv().await;
            let _ = response_tx
                .send(ClassifyResponse::Error {
                    error: "model load failed".to_string(),
                    id: None,
                })
                .await;
        });

        let gateway = ClassifierGateway::new(transport, test_config());
        let result = gateway.initialize(ModelConfig::default()).await;
        assert_eq!(
            result.unwrap_err(),
            ClassifyError::Init("model load failed".to_string())
        );
        assert_eq!(gateway.state(), GatewayState::Failed);
    }

    #[tokio::test]
    async fn test_out_of_order_responses_settle_by_id() {
        let (transport, mut request_rx, response_tx) = ChannelTransport::new_pair(8);

        // Remote answers the second classify before the first.
        tokio::spawn(async move {
            let _ = request_rx.recv().await; // init
            let _ = response_tx.send(ClassifyResponse::Ready).await;

            let mut held = Vec::new();
            for _ in 0..2 {
                if let Some(ClassifyRequest::Classify { input, id }) = request_rx.recv().await {
                    held.push((input, id));
                }
            }
            for (input, id) in held.into_iter().rev() {
                let _ = response_tx
                    .send(ClassifyResponse::Result {
                        result: echo_result(&input),
                        id,
                    })
                    .await;
            }
        });

        let gateway = Arc::new(ClassifierGateway::new(transport, test_config()));
        gateway.initialize(ModelConfig::default()).await.unwrap();

        let first = {
            let gateway = Arc::clone(&gateway);
            tokio::spawn(async move { gateway.classify(ClassificationInput::new("first")).await })
        };
        let second = {
            let gateway = Arc::clone(&gateway);
            tokio::spawn(async move { gateway.classify(ClassificationInput::new("second")).await })
        };

        let first = first.await.unwrap().unwrap();
        let second = second.await.unwrap().unwrap();
        assert_eq!(first.data["echo"], "first");
        assert_eq!(second.data["echo"], "second");
    }

    // Paused clock: deadline ordering is deterministic, no wall-time races.
    #[tokio::test(start_paused = true)]
    async fn test_timeout_removes_pending_and_late_response_is_noop() {
        let (transport, request_rx, response_tx) = ChannelTransport::new_pair(8);
        // Remote is slower than the classify deadline.
        spawn_echo_remote(request_rx, response_tx, Duration::from_millis(500));

        let gateway = ClassifierGateway::new(transport, test_config());
        gateway.initialize(ModelConfig::default()).await.unwrap();

        let result = gateway.classify(ClassificationInput::new("slow")).await;
        assert_eq!(result.unwrap_err(), ClassifyError::Timeout);
        assert_eq!(gateway.pending_requests(), 0);

        // Let the late response arrive; it must be dropped silently.
        sleep(Duration::from_millis(500)).await;
        assert_eq!(gateway.pending_requests(), 0);
        assert_eq!(gateway.state(), GatewayState::Ready);
    }

    #[tokio::test]
    async fn test_remote_error_rejects_matching_request() {
        let (transport, mut request_rx, response_tx) = ChannelTransport::new_pair(8);
        tokio::spawn(async move {
            let _ = request_rx.recv().await; // init
            let _ = response_tx.send(ClassifyResponse::Ready).await;
            if let Some(ClassifyRequest::Classify { id, .. }) = request_rx.recv().await {
                let _ = response_tx
                    .send(ClassifyResponse::Error {
                        error: "inference exploded".to_string(),
                        id: Some(id),
                    })
                    .await;
            }
        });

        let gateway = ClassifierGateway::new(transport, test_config());
        gateway.initialize(ModelConfig::default()).await.unwrap();

        let result = gateway.classify(ClassificationInput::new("boom")).await;
        assert_eq!(
            result.unwrap_err(),
            ClassifyError::Remote("inference exploded".to_string())
        );
    }

    #[tokio::test]
    async fn test_dispose_rejects_all_pending() {
        let (transport, mut request_rx, response_tx) = ChannelTransport::new_pair(8);
        // Remote acks init but never answers classifies.
        tokio::spawn(async move {
            while let Some(request) = request_rx.recv().await {
                if matches!(request, ClassifyRequest::Init { .. }) {
                    let _ = response_tx.send(ClassifyResponse::Ready).await;
                }
            }
        });

        let config = GatewayConfig {
            classify_timeout: Duration::from_secs(5),
            ..test_config()
        };
        let gateway = Arc::new(ClassifierGateway::new(transport, config));
        gateway.initialize(ModelConfig::default()).await.unwrap();

        let mut handles = Vec::new();
        for n in 0..3 {
            let gateway = Arc::clone(&gateway);
            handles.push(tokio::spawn(async move {
                gateway
                    .classify(ClassificationInput::new(format!("req {n}")))
                    .await
            }));
        }

        // Let all three reach the pending table.
        while gateway.pending_requests() < 3 {
            sleep(Duration::from_millis(5)).await;
        }

        gateway.dispose().await;
        assert_eq!(gateway.state(), GatewayState::Disposed);
        assert_eq!(gateway.pending_requests(), 0);

        for handle in handles {
            let result = handle.await.unwrap();
            assert_eq!(result.unwrap_err(), ClassifyError::Disposed);
        }

        // Idempotent.
        gateway.dispose().await;
        assert_eq!(gateway.state(), GatewayState::Disposed);

        let result = gateway.classify(ClassificationInput::new("after")).await;
        assert_eq!(result.unwrap_err(), ClassifyError::NotReady);
    }

    #[tokio::test]
    async fn test_transport_failure_rejects_pending_and_disables() {
        let (transport, mut request_rx, response_tx) = ChannelTransport::new_pair(8);

        let gateway = Arc::new(ClassifierGateway::new(
            transport,
            GatewayConfig {
                classify_timeout: Duration::from_secs(5),
                ..test_config()
            },
        ));

        // Ack init, then drop both channel ends to simulate connection loss.
        let gateway_clone = Arc::clone(&gateway);
        let init = tokio::spawn(async move {
            gateway_clone.initialize(ModelConfig::default()).await
        });
        let _ = request_rx.recv().await; // the init message
        response_tx.send(ClassifyResponse::Ready).await.unwrap();
        init.await.unwrap().unwrap();

        let pending = {
            let gateway = Arc::clone(&gateway);
            tokio::spawn(async move { gateway.classify(ClassificationInput::new("doomed")).await })
        };
        while gateway.pending_requests() < 1 {
            sleep(Duration::from_millis(5)).await;
        }

        drop(request_rx);
        drop(response_tx);

        let result = pending.await.unwrap();
        assert!(matches!(result.unwrap_err(), ClassifyError::Transport(_)));
        assert_eq!(gateway.state(), GatewayState::Failed);

        // No reconnect: further classifies fail immediately.
        let result = gateway.classify(ClassificationInput::new("again")).await;
        assert_eq!(result.unwrap_err(), ClassifyError::NotReady);
    }
}
