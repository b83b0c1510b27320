//! Storage manager
//!
//! The asynchronous public contract over the persistence gateway. A
//! dedicated writer thread owns the [`Database`] and drains a command
//! channel; commands are applied strictly in arrival order, one at a
//! time, with every multi-step invariant (cascade delete, duplication,
//! remove-all) inside a single gateway transaction. Callers therefore
//! never observe a half-applied write: a deleted box's goods vanish with
//! it, a duplicated box appears together with its duplicated goods.
//!
//! Reads flow through the same channel and see either the pre- or the
//! post-state of any in-flight write. Callers only await a reply over a
//! oneshot; the blocking SQLite work never runs on the async runtime.
//!
//! ## Usage
//!
//! ```ignore
//! let manager = StorageManager::open(&config)?;
//!
//! manager.add_boxes(vec![StorageBox::new("Kitchen")]).await?;
//! let boxes = manager.fetch_boxes().await?;
//! ```

use tokio::sync::{mpsc, oneshot};
use tracing::{debug, warn};
use uuid::Uuid;

use crate::config::Config;
use crate::models::{Good, StorageBox};
use crate::storage::error::{StorageError, StorageResult};
use crate::storage::gateway::{Database, EntityKind};
use crate::storage::mapper;

/// Marker appended to the name/title of a duplicated entity.
///
/// Appended on every duplication, so duplicating a duplicate yields
/// `"name (copy) (copy)"`.
pub const COPY_SUFFIX: &str = " (copy)";

/// Pending writes queued ahead of a caller before backpressure kicks in
const COMMAND_BUFFER: usize = 64;

type Responder<T> = oneshot::Sender<StorageResult<T>>;

/// Commands sent to the writer thread
enum Command {
    AddBoxes(Vec<StorageBox>, Responder<()>),
    AddGoods(Vec<Good>, Responder<()>),
    FetchBoxes(Responder<Vec<StorageBox>>),
    FetchGoods(Responder<Vec<Good>>),
    FetchBox(Uuid, Responder<Option<StorageBox>>),
    FetchGood(Uuid, Responder<Option<Good>>),
    FetchGoodsByBox(Uuid, Responder<Vec<Good>>),
    FetchBoxesWithGoods(Responder<Vec<StorageBox>>),
    BoxCount(Responder<i64>),
    GoodCount(Responder<i64>),
    RemoveBox(Uuid, Responder<()>),
    RemoveGood(Uuid, Responder<()>),
    RemoveAllBoxes(Responder<()>),
    UpdateBox(StorageBox, Responder<()>),
    DuplicateBox {
        uid: Uuid,
        with_goods: bool,
        reply: Responder<()>,
    },
    DuplicateGood(Uuid, Responder<()>),
}

/// Asynchronous storage manager for boxes and goods
///
/// Cheap to clone; all clones share the same writer thread. Dropping the
/// last clone closes the command channel and the writer thread exits
/// after draining queued work.
#[derive(Clone)]
pub struct StorageManager {
    command_tx: mpsc::Sender<Command>,
}

impl StorageManager {
    /// Open the store at the configured path
    pub fn open(config: &Config) -> StorageResult<Self> {
        Self::spawn(Database::open(config)?)
    }

    /// Open an in-memory store (for testing)
    pub fn open_in_memory() -> StorageResult<Self> {
        Self::spawn(Database::open_in_memory()?)
    }

    fn spawn(db: Database) -> StorageResult<Self> {
        let (command_tx, command_rx) = mpsc::channel(COMMAND_BUFFER);

        std::thread::Builder::new()
            .name("stowage-writer".to_string())
            .spawn(move || writer_loop(db, command_rx))
            .map_err(|e| {
                StorageError::Unavailable(format!("failed to spawn writer thread: {}", e))
            })?;

        Ok(Self { command_tx })
    }

    // ==================== Add ====================

    /// Insert all given boxes as one transaction
    pub async fn add_boxes(&self, boxes: Vec<StorageBox>) -> StorageResult<()> {
        self.request(|reply| Command::AddBoxes(boxes, reply)).await
    }

    /// Insert all given goods as one transaction
    pub async fn add_goods(&self, goods: Vec<Good>) -> StorageResult<()> {
        self.request(|reply| Command::AddGoods(goods, reply)).await
    }

    // ==================== Fetch ====================

    /// Get all boxes, `items` left empty (cheap read)
    pub async fn fetch_boxes(&self) -> StorageResult<Vec<StorageBox>> {
        self.request(Command::FetchBoxes).await
    }

    /// Get all goods
    pub async fn fetch_goods(&self) -> StorageResult<Vec<Good>> {
        self.request(Command::FetchGoods).await
    }

    /// Get the box with the given uid; a miss is `None`, not an error
    pub async fn fetch_box(&self, uid: Uuid) -> StorageResult<Option<StorageBox>> {
        self.request(|reply| Command::FetchBox(uid, reply)).await
    }

    /// Get the good with the given uid; a miss is `None`, not an error
    pub async fn fetch_good(&self, uid: Uuid) -> StorageResult<Option<Good>> {
        self.request(|reply| Command::FetchGood(uid, reply)).await
    }

    /// Get every good assigned to the given box
    pub async fn fetch_goods_by_box(&self, box_uid: Uuid) -> StorageResult<Vec<Good>> {
        self.request(|reply| Command::FetchGoodsByBox(box_uid, reply))
            .await
    }

    /// Get all boxes with `items` populated from the goods table
    pub async fn fetch_boxes_with_goods(&self) -> StorageResult<Vec<StorageBox>> {
        self.request(Command::FetchBoxesWithGoods).await
    }

    // ==================== Count ====================

    /// Number of live boxes, without materializing rows
    pub async fn box_count(&self) -> StorageResult<i64> {
        self.request(Command::BoxCount).await
    }

    /// Number of live goods, without materializing rows
    pub async fn good_count(&self) -> StorageResult<i64> {
        self.request(Command::GoodCount).await
    }

    // ==================== Remove ====================

    /// Delete the box and every good assigned to it, as one transaction
    ///
    /// A missing uid is a no-op, not an error.
    pub async fn remove_box(&self, uid: Uuid) -> StorageResult<()> {
        self.request(|reply| Command::RemoveBox(uid, reply)).await
    }

    /// Delete exactly one good, no cascade; missing uid is a no-op
    pub async fn remove_good(&self, uid: Uuid) -> StorageResult<()> {
        self.request(|reply| Command::RemoveGood(uid, reply)).await
    }

    /// Clear both tables, leaving the store fully empty
    pub async fn remove_all_boxes(&self) -> StorageResult<()> {
        self.request(Command::RemoveAllBoxes).await
    }

    // ==================== Update ====================

    /// Replace the stored box's mutable fields by uid match
    ///
    /// Fails with [`StorageError::NotFound`] if the uid has no row.
    pub async fn update_box(&self, bx: StorageBox) -> StorageResult<()> {
        self.request(|reply| Command::UpdateBox(bx, reply)).await
    }

    // ==================== Duplicate ====================

    /// Clone the box under a fresh uid with a copy-marked name
    ///
    /// When `with_goods`, every assigned good is cloned too: fresh uid,
    /// `box_uid` pointed at the clone, copy-marked title. The whole clone
    /// set appears atomically. Missing uid fails with `NotFound`.
    pub async fn duplicate_box(&self, uid: Uuid, with_goods: bool) -> StorageResult<()> {
        self.request(|reply| Command::DuplicateBox {
            uid,
            with_goods,
            reply,
        })
        .await
    }

    /// Clone one good: fresh uid, same `box_uid`, copy-marked title
    pub async fn duplicate_good(&self, uid: Uuid) -> StorageResult<()> {
        self.request(|reply| Command::DuplicateGood(uid, reply))
            .await
    }

    async fn request<T>(
        &self,
        build: impl FnOnce(Responder<T>) -> Command,
    ) -> StorageResult<T> {
        let (reply_tx, reply_rx) = oneshot::channel();
        self.command_tx
            .send(build(reply_tx))
            .await
            .map_err(|_| StorageError::Unavailable("writer thread has stopped".to_string()))?;
        reply_rx
            .await
            .map_err(|_| StorageError::Unavailable("writer thread dropped the reply".to_string()))?
    }
}

// ==================== Writer thread ====================

fn writer_loop(mut db: Database, mut commands: mpsc::Receiver<Command>) {
    debug!("writer thread started");

    while let Some(command) = commands.blocking_recv() {
        match command {
            Command::AddBoxes(boxes, reply) => {
                let _ = reply.send(add_boxes(&mut db, &boxes));
            }
            Command::AddGoods(goods, reply) => {
                let _ = reply.send(add_goods(&mut db, &goods));
            }
            Command::FetchBoxes(reply) => {
                let _ = reply.send(fetch_boxes(&db));
            }
            Command::FetchGoods(reply) => {
                let _ = reply.send(fetch_goods(&db));
            }
            Command::FetchBox(uid, reply) => {
                let _ = reply.send(fetch_box(&db, uid));
            }
            Command::FetchGood(uid, reply) => {
                let _ = reply.send(fetch_good(&db, uid));
            }
            Command::FetchGoodsByBox(box_uid, reply) => {
                let _ = reply.send(fetch_goods_by_box(&db, box_uid));
            }
            Command::FetchBoxesWithGoods(reply) => {
                let _ = reply.send(fetch_boxes_with_goods(&db));
            }
            Command::BoxCount(reply) => {
                let _ = reply.send(db.count(EntityKind::Box));
            }
            Command::GoodCount(reply) => {
                let _ = reply.send(db.count(EntityKind::Good));
            }
            Command::RemoveBox(uid, reply) => {
                let _ = reply.send(remove_box(&mut db, uid));
            }
            Command::RemoveGood(uid, reply) => {
                let _ = reply.send(remove_good(&db, uid));
            }
            Command::RemoveAllBoxes(reply) => {
                let _ = reply.send(remove_all_boxes(&mut db));
            }
            Command::UpdateBox(bx, reply) => {
                let _ = reply.send(update_box(&db, &bx));
            }
            Command::DuplicateBox {
                uid,
                with_goods,
                reply,
            } => {
                let _ = reply.send(duplicate_box(&mut db, uid, with_goods));
            }
            Command::DuplicateGood(uid, reply) => {
                let _ = reply.send(duplicate_good(&mut db, uid));
            }
        }
    }

    debug!("command channel closed, writer thread exiting");
}

// ==================== Operations ====================
//
// Every multi-step write runs inside one gateway transaction; returning
// an error before `commit` rolls the whole step back.

fn add_boxes(db: &mut Database, boxes: &[StorageBox]) -> StorageResult<()> {
    let tx = db.transaction()?;
    for bx in boxes {
        tx.insert_box(&mapper::box_to_row(bx))?;
    }
    tx.commit()?;
    debug!("added {} boxes", boxes.len());
    Ok(())
}

fn add_goods(db: &mut Database, goods: &[Good]) -> StorageResult<()> {
    let tx = db.transaction()?;
    for good in goods {
        tx.insert_good(&mapper::good_to_row(good))?;
    }
    tx.commit()?;
    debug!("added {} goods", goods.len());
    Ok(())
}

fn fetch_boxes(db: &Database) -> StorageResult<Vec<StorageBox>> {
    db.fetch_boxes()?
        .into_iter()
        .map(mapper::row_to_box)
        .collect()
}

fn fetch_goods(db: &Database) -> StorageResult<Vec<Good>> {
    db.fetch_goods()?
        .into_iter()
        .map(mapper::row_to_good)
        .collect()
}

fn fetch_box(db: &Database, uid: Uuid) -> StorageResult<Option<StorageBox>> {
    db.fetch_box(&uid.to_string())?
        .map(mapper::row_to_box)
        .transpose()
}

fn fetch_good(db: &Database, uid: Uuid) -> StorageResult<Option<Good>> {
    db.fetch_good(&uid.to_string())?
        .map(mapper::row_to_good)
        .transpose()
}

fn fetch_goods_by_box(db: &Database, box_uid: Uuid) -> StorageResult<Vec<Good>> {
    db.fetch_goods_by_box(&box_uid.to_string())?
        .into_iter()
        .map(mapper::row_to_good)
        .collect()
}

fn fetch_boxes_with_goods(db: &Database) -> StorageResult<Vec<StorageBox>> {
    let mut boxes = fetch_boxes(db)?;
    for bx in &mut boxes {
        bx.items = fetch_goods_by_box(db, bx.uid)?;
    }
    Ok(boxes)
}

fn remove_box(db: &mut Database, uid: Uuid) -> StorageResult<()> {
    let tx = db.transaction()?;
    let goods = tx.delete_goods_by_box(&uid.to_string())?;
    let boxes = tx.delete_by_uid(EntityKind::Box, &uid.to_string())?;
    tx.commit()?;

    if boxes == 0 {
        debug!("remove_box: no box with uid {}, nothing to do", uid);
    } else {
        debug!("removed box {} and {} goods", uid, goods);
    }
    Ok(())
}

fn remove_good(db: &Database, uid: Uuid) -> StorageResult<()> {
    let deleted = db.delete_by_uid(EntityKind::Good, &uid.to_string())?;
    debug!("removed {} good(s) for uid {}", deleted, uid);
    Ok(())
}

fn remove_all_boxes(db: &mut Database) -> StorageResult<()> {
    let tx = db.transaction()?;
    let goods = tx.delete_all(EntityKind::Good)?;
    let boxes = tx.delete_all(EntityKind::Box)?;
    tx.commit()?;
    debug!("cleared store: {} boxes, {} goods", boxes, goods);
    Ok(())
}

fn update_box(db: &Database, bx: &StorageBox) -> StorageResult<()> {
    let changed = db.update_box(&mapper::box_to_row(bx))?;
    if changed == 0 {
        warn!("update_box: no box with uid {}", bx.uid);
        return Err(StorageError::NotFound {
            kind: EntityKind::Box,
            uid: bx.uid,
        });
    }
    Ok(())
}

fn duplicate_box(db: &mut Database, uid: Uuid, with_goods: bool) -> StorageResult<()> {
    let tx = db.transaction()?;

    let original = match tx.fetch_box(&uid.to_string())? {
        Some(row) => mapper::row_to_box(row)?,
        None => {
            return Err(StorageError::NotFound {
                kind: EntityKind::Box,
                uid,
            })
        }
    };

    let copy = StorageBox::with_uid(
        Uuid::new_v4(),
        format!("{}{}", original.name, COPY_SUFFIX),
    );
    tx.insert_box(&mapper::box_to_row(&copy))?;

    let mut cloned_goods = 0;
    if with_goods {
        for row in tx.fetch_goods_by_box(&uid.to_string())? {
            let good = mapper::row_to_good(row)?;
            let clone = Good::with_uid(
                Uuid::new_v4(),
                format!("{}{}", good.title, COPY_SUFFIX),
                Some(copy.uid),
            );
            tx.insert_good(&mapper::good_to_row(&clone))?;
            cloned_goods += 1;
        }
    }

    tx.commit()?;
    debug!(
        "duplicated box {} as {} with {} goods",
        uid, copy.uid, cloned_goods
    );
    Ok(())
}

fn duplicate_good(db: &mut Database, uid: Uuid) -> StorageResult<()> {
    let tx = db.transaction()?;

    let original = match tx.fetch_good(&uid.to_string())? {
        Some(row) => mapper::row_to_good(row)?,
        None => {
            return Err(StorageError::NotFound {
                kind: EntityKind::Good,
                uid,
            })
        }
    };

    let clone = Good::with_uid(
        Uuid::new_v4(),
        format!("{}{}", original.title, COPY_SUFFIX),
        original.box_uid,
    );
    tx.insert_good(&mapper::good_to_row(&clone))?;

    tx.commit()?;
    debug!("duplicated good {} as {}", uid, clone.uid);
    Ok(())
}
