//! Socket registry: passenger sockets per trip, driver sockets per driver,
//! user sockets per user.
//!
//! Every trip has its own topic lock. A fanout holds that lock for the whole
//! send loop, so two fanouts to the same trip never interleave. Handles that
//! fail during a fanout are dropped from the topic before the lock is
//! released and from the other indexes right after.

use std::sync::Arc;

use dashmap::DashMap;
use serde::Serialize;
use tokio::sync::Mutex;
use tracing::debug;

use seatline_core::types::{DriverId, TripId, UserId};

use super::handle::{ConnectionHandle, ConnectionId, ConnectionRole};

/// Outcome of one fanout.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct DeliveryReport {
    /// Sockets the frame was queued on.
    pub delivered: usize,
    /// Sockets removed because the send failed.
    pub removed: usize,
}

/// Registry sizes, reported by the health endpoint.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct ConnectionCounts {
    /// All registered sockets.
    pub connections: usize,
    /// Trips with at least one subscriber.
    pub trips: usize,
    /// Connected drivers.
    pub drivers: usize,
    /// Users with at least one socket.
    pub users: usize,
}

/// Subscribers of one trip.
#[derive(Debug, Default)]
struct TripTopic {
    subscribers: Mutex<Vec<Arc<ConnectionHandle>>>,
}

/// Thread-safe index of every live socket.
#[derive(Debug, Default)]
pub struct SocketRegistry {
    /// Trip ID → subscribed passenger sockets.
    trips: DashMap<TripId, Arc<TripTopic>>,
    /// Driver ID → the driver's socket. One socket per driver.
    drivers: DashMap<DriverId, Arc<ConnectionHandle>>,
    /// User ID → the user's sockets.
    users: DashMap<UserId, Vec<Arc<ConnectionHandle>>>,
    /// Connection ID → handle.
    by_id: DashMap<ConnectionId, Arc<ConnectionHandle>>,
}

impl SocketRegistry {
    /// Creates an empty registry.
    pub fn new() -> Self {
        Self::default()
    }

    /// Index a handle under its role. A driver registering again replaces
    /// (and closes) the previous socket, which is returned.
    pub async fn add(&self, handle: Arc<ConnectionHandle>) -> Option<Arc<ConnectionHandle>> {
        self.by_id.insert(handle.id, handle.clone());
        match handle.role {
            ConnectionRole::Passenger { trip_id, user_id } => {
                if let Some(user_id) = user_id {
                    self.users.entry(user_id).or_default().push(handle.clone());
                }
                let topic = self.topic_or_create(trip_id);
                topic.subscribers.lock().await.push(handle);
                None
            }
            ConnectionRole::Driver { driver_id } => {
                let replaced = self.drivers.insert(driver_id, handle)?;
                self.by_id.remove(&replaced.id);
                replaced.close();
                debug!(driver_id = %driver_id, conn_id = %replaced.id, "Driver socket replaced");
                Some(replaced)
            }
            ConnectionRole::User { user_id } => {
                self.users.entry(user_id).or_default().push(handle);
                None
            }
        }
    }

    /// Remove a handle from every index.
    pub async fn remove(&self, conn_id: &ConnectionId) -> Option<Arc<ConnectionHandle>> {
        let (_, handle) = self.by_id.remove(conn_id)?;
        if let ConnectionRole::Passenger { trip_id, .. } = handle.role {
            if let Some(topic) = self.topic(trip_id) {
                topic.subscribers.lock().await.retain(|c| c.id != *conn_id);
                drop(topic);
                self.prune_topic(trip_id);
            }
        }
        self.detach(&handle);
        Some(handle)
    }

    /// Gets a connection by ID.
    pub fn get(&self, conn_id: &ConnectionId) -> Option<Arc<ConnectionHandle>> {
        self.by_id.get(conn_id).map(|entry| entry.value().clone())
    }

    /// Whether the connection is still registered.
    pub fn contains(&self, conn_id: &ConnectionId) -> bool {
        self.by_id.contains_key(conn_id)
    }

    /// Send a frame to every subscriber of a trip. Failed sockets are
    /// deregistered; nothing is retried.
    pub async fn fanout_trip(&self, trip_id: TripId, frame: &str) -> DeliveryReport {
        let Some(topic) = self.topic(trip_id) else {
            return DeliveryReport::default();
        };

        let mut report = DeliveryReport::default();
        let mut failed = Vec::new();
        {
            let mut subscribers = topic.subscribers.lock().await;
            for conn in subscribers.iter() {
                if conn.send(frame) {
                    report.delivered += 1;
                } else {
                    failed.push(conn.clone());
                }
            }
            if !failed.is_empty() {
                subscribers.retain(|c| !failed.iter().any(|f| f.id == c.id));
            }
        }
        drop(topic);

        for conn in &failed {
            debug!(trip_id = %trip_id, conn_id = %conn.id, "Dropping socket after failed send");
            self.by_id.remove(&conn.id);
            self.detach(conn);
        }
        report.removed = failed.len();
        self.prune_topic(trip_id);
        report
    }

    /// Send a frame to a driver's socket. Returns whether it was queued.
    pub async fn send_to_driver(&self, driver_id: DriverId, frame: &str) -> bool {
        let Some(conn) = self.drivers.get(&driver_id).map(|e| e.value().clone()) else {
            return false;
        };
        if conn.send(frame) {
            return true;
        }
        self.remove(&conn.id).await;
        false
    }

    /// Send a frame to every socket of a user.
    pub async fn send_to_user(&self, user_id: UserId, frame: &str) -> DeliveryReport {
        let conns = self
            .users
            .get(&user_id)
            .map(|entry| entry.value().clone())
            .unwrap_or_default();

        let mut report = DeliveryReport::default();
        for conn in conns {
            if conn.send(frame) {
                report.delivered += 1;
            } else {
                self.remove(&conn.id).await;
                report.removed += 1;
            }
        }
        report
    }

    /// Number of sockets subscribed to a trip.
    pub async fn trip_subscriber_count(&self, trip_id: TripId) -> usize {
        match self.topic(trip_id) {
            Some(topic) => topic.subscribers.lock().await.len(),
            None => 0,
        }
    }

    /// Registry sizes.
    pub fn counts(&self) -> ConnectionCounts {
        ConnectionCounts {
            connections: self.by_id.len(),
            trips: self.trips.len(),
            drivers: self.drivers.len(),
            users: self.users.len(),
        }
    }

    /// Close and forget every socket.
    pub fn drain(&self) -> usize {
        let handles: Vec<Arc<ConnectionHandle>> =
            self.by_id.iter().map(|entry| entry.value().clone()).collect();
        for conn in &handles {
            conn.close();
        }
        self.by_id.clear();
        self.trips.clear();
        self.drivers.clear();
        self.users.clear();
        handles.len()
    }

    fn topic(&self, trip_id: TripId) -> Option<Arc<TripTopic>> {
        self.trips.get(&trip_id).map(|entry| entry.value().clone())
    }

    fn topic_or_create(&self, trip_id: TripId) -> Arc<TripTopic> {
        self.trips.entry(trip_id).or_default().value().clone()
    }

    /// Drop an empty topic nobody else is holding.
    fn prune_topic(&self, trip_id: TripId) {
        self.trips.remove_if(&trip_id, |_, topic| {
            Arc::strong_count(topic) == 1
                && topic
                    .subscribers
                    .try_lock()
                    .map(|subscribers| subscribers.is_empty())
                    .unwrap_or(false)
        });
    }

    /// Remove a handle from the driver and user indexes.
    fn detach(&self, handle: &ConnectionHandle) {
        let user_id = match handle.role {
            ConnectionRole::Driver { driver_id } => {
                self.drivers.remove_if(&driver_id, |_, current| current.id == handle.id);
                None
            }
            ConnectionRole::Passenger { user_id, .. } => user_id,
            ConnectionRole::User { user_id } => Some(user_id),
        };

        if let Some(user_id) = user_id {
            if let Some(mut conns) = self.users.get_mut(&user_id) {
                conns.retain(|c| c.id != handle.id);
                if conns.is_empty() {
                    drop(conns);
                    self.users.remove_if(&user_id, |_, conns| conns.is_empty());
                }
            }
        }
    }
}
