//! Two replicas of one group, each with its own handler worker and
//! reconciliation loop, sharing a blob store and a lease service.

use std::sync::Arc;
use std::time::Duration;

use crossbeam_channel::{unbounded, Receiver, Sender};
use vicinity_core::{BlobStore, Clock, LeaseService, ManualClock, UserId};
use vicinity_engine::{
    HandlerConfig, Message, MessageHandler, MessageKind, ReconcileConfig, ReconciliationLoop,
    WorkerReport,
};
use vicinity_lock::{DistributedLock, LockConfig, MemoryLeaseService};
use vicinity_space::{IndexConfig, SpatialIndex};
use vicinity_store::{MemoryBlobStore, ReplicaStore, StoreConfig};
use vicinity_test_utils::fixtures::{manual_clock, CARIBBEAN, CARIBBEAN_EAST};

struct Node {
    store: Arc<ReplicaStore>,
    sync: ReconciliationLoop,
    inbox: Sender<Message>,
    outbox: Receiver<Message>,
    worker: std::thread::JoinHandle<WorkerReport>,
}

fn node(
    clock: &Arc<ManualClock>,
    blobs: &Arc<MemoryBlobStore>,
    leases: &Arc<dyn LeaseService>,
) -> Node {
    let store = Arc::new(
        ReplicaStore::new(
            StoreConfig::default(),
            SpatialIndex::new(IndexConfig::default()).unwrap(),
            Arc::clone(clock) as Arc<dyn Clock>,
        )
        .unwrap(),
    );
    let lock = Arc::new(
        DistributedLock::new(
            Arc::clone(leases),
            LockConfig {
                retry_interval: Duration::from_millis(5),
                ..LockConfig::default()
            },
        )
        .unwrap(),
    );
    let sync = ReconciliationLoop::spawn(
        Arc::clone(&store),
        Arc::clone(blobs) as Arc<dyn BlobStore>,
        Arc::clone(&lock),
        ReconcileConfig::default(),
    )
    .unwrap();
    let handler =
        Arc::new(MessageHandler::new(Arc::clone(&store), lock, HandlerConfig::default()).unwrap());
    let (in_tx, in_rx) = unbounded();
    let (out_tx, out_rx) = unbounded();
    let worker = handler.spawn_worker(in_rx, out_tx).unwrap();
    Node {
        store,
        sync,
        inbox: in_tx,
        outbox: out_rx,
        worker,
    }
}

fn location(id: &str, user: &str, (lat, long): (f64, f64)) -> Message {
    Message {
        id: id.into(),
        receiver: "gateway".into(),
        user: user.into(),
        kind: MessageKind::SendLocation,
        body: format!(r#"{{"lat":{lat},"long":{long}}}"#),
    }
}

fn nearby(id: &str, user: &str) -> Message {
    Message {
        id: id.into(),
        receiver: "gateway".into(),
        user: user.into(),
        kind: MessageKind::RequestNearby,
        body: String::new(),
    }
}

fn wait_until(cond: impl Fn() -> bool) {
    let deadline = std::time::Instant::now() + Duration::from_secs(5);
    while !cond() {
        assert!(std::time::Instant::now() < deadline, "timed out");
        std::thread::sleep(Duration::from_millis(2));
    }
}

#[test]
fn users_on_different_replicas_find_each_other_after_sync() {
    let clock = manual_clock();
    let blobs = Arc::new(MemoryBlobStore::new());
    let leases: Arc<dyn LeaseService> = Arc::new(MemoryLeaseService::new());
    let mut a = node(&clock, &blobs, &leases);
    let mut b = node(&clock, &blobs, &leases);

    a.inbox.send(location("1", "alice", CARIBBEAN)).unwrap();
    b.inbox.send(location("2", "bob", CARIBBEAN_EAST)).unwrap();
    wait_until(|| a.store.len() == 1 && b.store.len() == 1);

    a.sync.sync_now().unwrap();
    b.sync.sync_now().unwrap();
    a.sync.sync_now().unwrap();

    a.inbox.send(nearby("3", "alice")).unwrap();
    let reply = a.outbox.recv_timeout(Duration::from_secs(5)).unwrap();
    assert_eq!(reply.kind, MessageKind::RequestNearby);
    let users: Vec<UserId> = serde_json::from_str(&reply.body).unwrap();
    assert_eq!(users, vec![UserId::from("bob")]);

    b.inbox.send(nearby("4", "bob")).unwrap();
    let reply = b.outbox.recv_timeout(Duration::from_secs(5)).unwrap();
    let users: Vec<UserId> = serde_json::from_str(&reply.body).unwrap();
    assert_eq!(users, vec![UserId::from("alice")]);

    for n in [a, b] {
        let Node {
            mut sync,
            inbox,
            worker,
            ..
        } = n;
        drop(inbox);
        let report = worker.join().unwrap();
        assert_eq!(report.failed, 0);
        assert_eq!(sync.shutdown().failures, 0);
    }
}

#[test]
fn broadcast_message_is_applied_by_one_replica_only() {
    let clock = manual_clock();
    let blobs = Arc::new(MemoryBlobStore::new());
    let leases: Arc<dyn LeaseService> = Arc::new(MemoryLeaseService::new());
    let a = node(&clock, &blobs, &leases);
    let b = node(&clock, &blobs, &leases);

    let m = location("dup", "carol", CARIBBEAN);
    a.inbox.send(m.clone()).unwrap();
    b.inbox.send(m).unwrap();
    drop(a.inbox);
    drop(b.inbox);

    let ra = a.worker.join().unwrap();
    let rb = b.worker.join().unwrap();
    assert_eq!(ra.received + rb.received, 2);
    assert_eq!(a.store.len() + b.store.len(), 1);
}

#[test]
fn nearby_for_user_never_seen_replies_with_error() {
    let clock = manual_clock();
    let blobs = Arc::new(MemoryBlobStore::new());
    let leases: Arc<dyn LeaseService> = Arc::new(MemoryLeaseService::new());
    let a = node(&clock, &blobs, &leases);

    a.inbox.send(nearby("5", "nobody")).unwrap();
    let reply = a.outbox.recv_timeout(Duration::from_secs(5)).unwrap();
    assert_eq!(reply.kind, MessageKind::Error);
    assert_eq!(reply.id, "5");
}
