//! Server coordinator.
//!
//! Each accepted connection carries exactly one framed request: read,
//! decode, dispatch, reply, close. GETs are pure local store reads. PUTs
//! apply locally first; the key's primary then fans the timestamped write
//! out to the other replicas and waits for a cluster majority before
//! acknowledging.

use crate::error::{ReplicationError, Result};
use crate::pool::WorkerPool;
use crate::quorum::QuorumWait;
use crate::rpc;
use crate::store::Store;
use corelib::{ClusterConfig, HashRing, Node, RingBuilder};
use std::net::{TcpListener, TcpStream};
use std::sync::Arc;
use tracing::{debug, info, warn};

use wire::{
    decode_client, encode_server, recv_frame, send_frame, ClientMessage, GetRequest, GetResponse,
    PutRequest, PutResponse, Reply, ServerMessage,
};

/// One server node: store, ring view, and the replication coordinator.
pub struct Server {
    inner: Arc<ServerInner>,
    pool: WorkerPool,
}

struct ServerInner {
    config: ClusterConfig,
    /// This server's own endpoint, resolved from the configured node list.
    identity: Node,
    ring: HashRing,
    store: Store,
}

impl Server {
    /// Set up a server for the configured node listening on `port`.
    ///
    /// Fails if the configuration is invalid or `port` does not belong to
    /// any configured node; the primary check in the PUT path depends on
    /// knowing this server's exact endpoint.
    pub fn new(port: u16, config: ClusterConfig) -> Result<Self> {
        config.validate()?;
        let identity = config
            .node_on_port(port)
            .cloned()
            .ok_or(ReplicationError::UnknownServerPort(port))?;
        let ring = RingBuilder::new()
            .with_vnodes(config.virtual_nodes)
            .add_nodes(&config.nodes)
            .build()?;
        let pool = WorkerPool::new(config.workers);
        Ok(Self {
            inner: Arc::new(ServerInner {
                config,
                identity,
                ring,
                store: Store::new(),
            }),
            pool,
        })
    }

    /// Bind and serve until the process exits.
    pub fn run(self) -> Result<()> {
        let listener = self.bind()?;
        self.serve(listener);
        Ok(())
    }

    /// Bind, then serve on a background thread. Returns once the socket is
    /// listening, so callers (tests, mostly) can connect immediately.
    pub fn spawn(self) -> Result<ServerHandle> {
        let listener = self.bind()?;
        let identity = self.inner.identity.clone();
        let thread = std::thread::Builder::new()
            .name(format!("server-{}", identity.port))
            .spawn(move || self.serve(listener))
            .expect("failed to spawn server thread");
        Ok(ServerHandle {
            identity,
            _thread: thread,
        })
    }

    fn bind(&self) -> Result<TcpListener> {
        let addr = format!("0.0.0.0:{}", self.inner.identity.port);
        let listener = TcpListener::bind(&addr).map_err(|source| ReplicationError::Bind {
            addr: addr.clone(),
            source,
        })?;
        info!(server = %self.inner.identity, "listening");
        Ok(listener)
    }

    /// Accept loop. A failing accept or connection is logged and never
    /// aborts the loop.
    fn serve(self, listener: TcpListener) {
        for connection in listener.incoming() {
            match connection {
                Ok(stream) => {
                    let inner = Arc::clone(&self.inner);
                    self.pool.submit(move || inner.handle_connection(stream));
                }
                Err(e) => warn!(error = %e, "failed to accept connection"),
            }
        }
    }
}

/// Handle to a server running on a background thread.
pub struct ServerHandle {
    identity: Node,
    _thread: std::thread::JoinHandle<()>,
}

impl ServerHandle {
    pub fn identity(&self) -> &Node {
        &self.identity
    }
}

impl ServerInner {
    fn handle_connection(&self, mut stream: TcpStream) {
        if let Ok(peer) = stream.peer_addr() {
            debug!(%peer, "accepted connection");
        }

        let request = match recv_frame(&mut stream) {
            Ok(payload) => payload,
            Err(e) => {
                warn!(error = %e, "failed to read request");
                return;
            }
        };

        let reply = match decode_client(&request) {
            Ok(ClientMessage::Get(request)) => ServerMessage::ok(Reply::Get(self.get(request))),
            Ok(ClientMessage::Put(request)) => ServerMessage::ok(Reply::Put(self.put(request))),
            Err(e) => {
                warn!(error = %e, "invalid request");
                ServerMessage::invalid(format!("failed to decode request: {}", e))
            }
        };

        match encode_server(&reply) {
            Ok(payload) => {
                if let Err(e) = send_frame(&mut stream, &payload) {
                    warn!(error = %e, "failed to send reply");
                }
            }
            Err(e) => warn!(error = %e, "failed to encode reply"),
        }
    }

    fn get(&self, request: GetRequest) -> GetResponse {
        let response = match self.store.get(&request.key) {
            Some(entry) => GetResponse::found(entry.value, entry.timestamp),
            None => GetResponse::not_found(),
        };
        debug!(key = %request.key, found = response.found, "served get");
        response
    }

    /// Apply a PUT locally, then replicate it if this server is the key's
    /// primary.
    fn put(&self, request: PutRequest) -> PutResponse {
        let applied_ts = self
            .store
            .put(&request.key, request.value.clone(), request.timestamp);

        // The forwarded request pins the applied timestamp, so every
        // replica stores the value under the same identity.
        let forwarded = PutRequest {
            key: request.key,
            value: request.value,
            timestamp: Some(applied_ts),
        };
        self.replicate(forwarded)
    }

    fn replicate(&self, request: PutRequest) -> PutResponse {
        let replicas = match self
            .ring
            .replicas_for_key(request.key.as_bytes(), self.config.replication_factor)
        {
            Ok(replicas) => replicas,
            Err(e) => {
                warn!(error = %e, "cannot resolve replica set");
                return PutResponse { success: false };
            }
        };

        // Non-primary replicas store the value and acknowledge; only the
        // primary fans out.
        if replicas[0] != self.identity {
            return PutResponse { success: true };
        }

        let quorum = self.config.quorum();
        // The primary's own successful local apply is one vote.
        let wait = Arc::new(QuorumWait::new(1));

        for replica in replicas.into_iter().skip(1) {
            let wait = Arc::clone(&wait);
            let message = ClientMessage::Put(request.clone());
            std::thread::spawn(move || match forward_put(&replica, &message) {
                Ok(true) => {
                    debug!(%replica, "replica acknowledged put");
                    wait.record_success();
                }
                Ok(false) => warn!(%replica, "replica rejected put"),
                Err(e) => warn!(%replica, error = %e, "replication send failed"),
            });
        }

        let success = wait.wait(quorum, self.config.replication_timeout);
        info!(
            key = %request.key,
            acknowledged = wait.count(),
            quorum,
            success,
            "replication round finished"
        );
        PutResponse { success }
    }
}

/// Send a forwarded PUT to one replica and report its acknowledgement.
fn forward_put(replica: &Node, message: &ClientMessage) -> Result<bool> {
    let reply = rpc::exchange(replica, message)?;
    let response = reply
        .into_put_response()
        .ok_or_else(|| ReplicationError::InvalidResponse("reply is not a put response".into()))?;
    Ok(response.success)
}
