//! Client coordinator.
//!
//! PUTs go to the key's primary in a single exchange; the primary owns
//! replication. GETs fan out to the whole replica set, wait for a cluster
//! majority of responses, reconcile by last-write-wins on the logical
//! timestamp, and heal divergent replicas with background read repair.

use crate::error::{ReplicationError, Result};
use crate::pool::WorkerPool;
use crate::rpc;
use corelib::{ClusterConfig, HashRing, Node, RingBuilder};
use crossbeam::channel::{self, RecvTimeoutError};
use std::time::Instant;
use tracing::{debug, info, warn};
use wire::{ClientMessage, GetRequest, GetResponse, PutRequest};

/// A reconciled read result.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Lookup {
    pub value: String,
    pub timestamp: u64,
}

/// Client-side entry point to the cluster.
pub struct Client {
    config: ClusterConfig,
    ring: HashRing,
    /// Background pool for fire-and-forget read-repair writes.
    repair_pool: WorkerPool,
}

impl Client {
    pub fn new(config: ClusterConfig) -> Result<Self> {
        config.validate()?;
        let ring = RingBuilder::new()
            .with_vnodes(config.virtual_nodes)
            .add_nodes(&config.nodes)
            .build()?;
        let repair_pool = WorkerPool::new(config.workers);
        Ok(Self {
            config,
            ring,
            repair_pool,
        })
    }

    /// Write a key through its primary.
    ///
    /// A transport failure is an error; the returned flag is the server's
    /// own replication verdict, which callers may treat as informational.
    pub fn put(&self, key: &str, value: &str) -> Result<bool> {
        let primary = self.ring.primary_for_key(key.as_bytes());
        let message = ClientMessage::Put(PutRequest {
            key: key.to_owned(),
            value: value.to_owned(),
            timestamp: None,
        });

        let reply = rpc::exchange(&primary, &message)?;
        let response = reply
            .into_put_response()
            .ok_or_else(|| ReplicationError::InvalidResponse("reply is not a put response".into()))?;
        info!(key, %primary, success = response.success, "put acknowledged");
        Ok(response.success)
    }

    /// Read a key from a majority of the cluster.
    ///
    /// Returns `Ok(None)` when a quorum answered but nobody had the key,
    /// and `Err(QuorumTimeout)` when too few replicas answered in time.
    pub fn get(&self, key: &str) -> Result<Option<Lookup>> {
        let replicas = self
            .ring
            .replicas_for_key(key.as_bytes(), self.config.replication_factor)?;
        let quorum = self.config.quorum();

        // One short-lived task per replica; results come back tagged with
        // the replica's index so the slot vector stays aligned.
        let (tx, rx) = channel::unbounded();
        for (index, replica) in replicas.iter().cloned().enumerate() {
            let tx = tx.clone();
            let message = ClientMessage::Get(GetRequest { key: key.to_owned() });
            std::thread::spawn(move || {
                let outcome = rpc::exchange(&replica, &message);
                // The coordinator may have departed after its deadline;
                // a dead channel just means this result is discarded.
                let _ = tx.send((index, replica, outcome));
            });
        }
        drop(tx);

        let deadline = Instant::now() + self.config.get_timeout;
        let mut responses: Vec<GetResponse> = vec![GetResponse::not_found(); replicas.len()];
        let mut completed = 0;

        while completed < quorum {
            match rx.recv_deadline(deadline) {
                Ok((index, _, Ok(reply))) => {
                    // Any parsed reply counts toward the quorum; malformed
                    // bodies degrade to a not-found placeholder.
                    responses[index] = reply.into_get_response().unwrap_or_default();
                    completed += 1;
                }
                Ok((_, replica, Err(e))) => {
                    warn!(%replica, error = %e, "get sub-request failed");
                }
                Err(RecvTimeoutError::Timeout) | Err(RecvTimeoutError::Disconnected) => break,
            }
        }

        if completed < quorum {
            warn!(key, received = completed, required = quorum, "get quorum failed");
            return Err(ReplicationError::QuorumTimeout {
                received: completed,
                required: quorum,
            });
        }

        // Last write wins; strict comparison keeps the first replica in
        // ring order on ties.
        let mut chosen: Option<&GetResponse> = None;
        for response in responses.iter().filter(|r| r.found) {
            let timestamp = response.timestamp.unwrap_or(0);
            if chosen.map_or(true, |c| timestamp > c.timestamp.unwrap_or(0)) {
                chosen = Some(response);
            }
        }

        match chosen.cloned() {
            Some(winner) => {
                self.schedule_read_repair(key, &replicas, &responses, &winner);
                debug!(key, timestamp = winner.timestamp, "get reconciled");
                Ok(Some(Lookup {
                    value: winner.value.clone().unwrap_or_default(),
                    timestamp: winner.timestamp.unwrap_or_default(),
                }))
            }
            None => Ok(None),
        }
    }

    /// Queue a direct PUT of the winning value to every replica whose
    /// response differs from it. Fire-and-forget: the GET reply never
    /// waits on repair.
    fn schedule_read_repair(
        &self,
        key: &str,
        replicas: &[Node],
        responses: &[GetResponse],
        winner: &GetResponse,
    ) {
        for (replica, response) in replicas.iter().zip(responses) {
            if response.found
                && response.timestamp == winner.timestamp
                && response.value == winner.value
            {
                continue;
            }

            let replica = replica.clone();
            let stale = response.clone();
            let message = ClientMessage::Put(PutRequest {
                key: key.to_owned(),
                value: winner.value.clone().unwrap_or_default(),
                timestamp: None,
            });
            let winner = winner.clone();
            self.repair_pool.submit(move || {
                match rpc::exchange(&replica, &message) {
                    Ok(_) => info!(
                        %replica,
                        stale_ts = stale.timestamp,
                        fresh_ts = winner.timestamp,
                        "read repair applied"
                    ),
                    Err(e) => warn!(%replica, error = %e, "read repair failed"),
                }
            });
        }
    }
}
