// Copyright (C) 2026 Fred Clausen
// Use of this source code is governed by an MIT-style
// license that can be found in the LICENSE file or at
// https://opensource.org/licenses/MIT.

//! The inventory ledger: the source of truth for available blood stock.
//!
//! The ledger owns every [`BloodUnit`] from the moment the splitter registers
//! it. Units are grouped into buckets keyed by `(facility, blood group,
//! component)`, and each bucket carries its own lock, so reservations on one
//! key serialize against each other without blocking the rest of the
//! inventory. Reserve, commit and release are the only operations that move
//! stock in and out of `reserved`; no two reservations can jointly exceed a
//! bucket's availability, and `available` never goes negative.
//!
//! Reservations are all-or-nothing. A request that cannot be covered in full
//! fails with `InsufficientStock`, which the request matcher treats as a
//! decision input rather than an error. Lock contention on a bucket is
//! retried a bounded number of times; exhausting the retries also reads as
//! `InsufficientStock`, never as a panic or an indefinite block.

use crate::error::CoreError;
use hemolink_domain::{BloodComponent, BloodGroup, BloodUnit, ManifestLine, UnitStatus};
use std::collections::HashMap;
use std::sync::atomic::{AtomicI64, Ordering};
use std::sync::{Arc, Mutex, MutexGuard, RwLock, TryLockError};
use time::OffsetDateTime;
use tracing::{debug, info, warn};

/// How many times `reserve` retries a contended bucket lock before giving up.
const RESERVE_LOCK_ATTEMPTS: u32 = 64;

/// The key identifying one stock bucket.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct StockKey {
    /// The facility holding the stock.
    pub facility_id: i64,
    /// The blood group of the stock.
    pub blood_group: BloodGroup,
    /// The component of the stock.
    pub component: BloodComponent,
}

impl StockKey {
    /// Creates a stock key.
    #[must_use]
    pub const fn new(facility_id: i64, blood_group: BloodGroup, component: BloodComponent) -> Self {
        Self {
            facility_id,
            blood_group,
            component,
        }
    }

    /// A stable ordering key, used when several buckets must be locked at once.
    fn ordering_key(&self) -> (i64, &'static str, &'static str) {
        (
            self.facility_id,
            self.blood_group.as_str(),
            self.component.as_str(),
        )
    }
}

/// A reservation currently held against one stock bucket.
///
/// The reservation pins a concrete set of units in `reserved` until it is
/// committed (units become `used`) or released (units return to `available`).
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StockReservation {
    /// The ledger-assigned reservation identifier.
    pub reservation_id: i64,
    /// The facility the stock was reserved at.
    pub facility_id: i64,
    /// The blood group of the reserved stock.
    pub blood_group: BloodGroup,
    /// The component of the reserved stock.
    pub component: BloodComponent,
    /// The pinned units and their volumes.
    pub lines: Vec<ManifestLine>,
}

impl StockReservation {
    /// Total reserved volume, in milliliters.
    #[must_use]
    pub fn reserved_quantity_ml(&self) -> u64 {
        self.lines
            .iter()
            .map(|line| u64::from(line.quantity_ml))
            .sum()
    }
}

/// Available volume for one `(blood group, component)` pair at a facility.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct StockLevel {
    /// The blood group of the stock.
    pub blood_group: BloodGroup,
    /// The component of the stock.
    pub component: BloodComponent,
    /// Screened, unexpired, unreserved volume in milliliters.
    pub available_ml: u32,
}

type Bucket = Arc<Mutex<Vec<BloodUnit>>>;

/// Tracks every blood unit and serializes stock movements per bucket.
#[derive(Debug)]
pub struct InventoryLedger {
    /// Stock buckets, one lock each. The outer lock only guards the map
    /// shape; unit state is always mutated under the bucket's own lock.
    buckets: RwLock<HashMap<StockKey, Bucket>>,
    /// Reservations currently held, by id. Entries are removed exactly once,
    /// by commit or release, so a reservation can never be settled twice.
    reservations: Mutex<HashMap<i64, StockReservation>>,
    next_unit_id: AtomicI64,
    next_reservation_id: AtomicI64,
}

impl InventoryLedger {
    /// Creates an empty ledger.
    #[must_use]
    pub fn new() -> Self {
        Self {
            buckets: RwLock::new(HashMap::new()),
            reservations: Mutex::new(HashMap::new()),
            next_unit_id: AtomicI64::new(0),
            next_reservation_id: AtomicI64::new(0),
        }
    }

    /// Registers freshly split units, minting their canonical ids.
    ///
    /// Units enter in `testing` and do not count as available stock until the
    /// lab callback passes them.
    ///
    /// # Errors
    ///
    /// Returns `CoreError::Internal` if a ledger lock is poisoned.
    pub fn register_units(&self, units: Vec<BloodUnit>) -> Result<Vec<BloodUnit>, CoreError> {
        let mut registered: Vec<BloodUnit> = Vec::with_capacity(units.len());

        for unit in units {
            let unit_id: i64 = self.next_unit_id.fetch_add(1, Ordering::SeqCst) + 1;
            let unit: BloodUnit = unit.with_id(unit_id);
            let key: StockKey =
                StockKey::new(unit.facility_id, unit.blood_group, unit.component);

            let bucket: Bucket = self.bucket_for(key)?;
            let mut guard: MutexGuard<'_, Vec<BloodUnit>> = lock_bucket(&bucket)?;
            guard.push(unit.clone());
            drop(guard);

            registered.push(unit);
        }

        info!(count = registered.len(), "Registered blood units");
        Ok(registered)
    }

    /// Applies a lab screening result to a unit in `testing`.
    ///
    /// A passing result makes the unit `available`; a failing one makes it
    /// `rejected`. Both are one-way.
    ///
    /// # Errors
    ///
    /// Returns `CoreError::NotFound` if the unit does not exist, or
    /// `CoreError::StateConflict` if the unit is not awaiting screening.
    pub fn mark_tested(&self, unit_id: i64, passed: bool) -> Result<BloodUnit, CoreError> {
        self.with_unit_mut(unit_id, |unit| {
            if unit.status != UnitStatus::Testing {
                return Err(CoreError::StateConflict {
                    entity: "blood unit",
                    id: unit_id,
                    reason: format!(
                        "lab results only apply to units in testing (status is '{}')",
                        unit.status
                    ),
                });
            }

            unit.status = if passed {
                UnitStatus::Available
            } else {
                UnitStatus::Rejected
            };

            debug!(unit_id, passed, status = %unit.status, "Applied lab result");
            Ok(unit.clone())
        })
    }

    /// Returns the screened, unexpired, unreserved volume under a key.
    ///
    /// # Errors
    ///
    /// Returns `CoreError::Internal` if a ledger lock is poisoned.
    pub fn available(
        &self,
        facility_id: i64,
        blood_group: BloodGroup,
        component: BloodComponent,
        now: OffsetDateTime,
    ) -> Result<u32, CoreError> {
        let key: StockKey = StockKey::new(facility_id, blood_group, component);
        let Some(bucket) = self.existing_bucket(key)? else {
            return Ok(0);
        };

        let guard: MutexGuard<'_, Vec<BloodUnit>> = lock_bucket(&bucket)?;
        Ok(available_in(&guard, now))
    }

    /// Available volume per `(group, component)` pair at one facility.
    ///
    /// # Errors
    ///
    /// Returns `CoreError::Internal` if a ledger lock is poisoned.
    pub fn stock_levels(
        &self,
        facility_id: i64,
        now: OffsetDateTime,
    ) -> Result<Vec<StockLevel>, CoreError> {
        let buckets: Vec<(StockKey, Bucket)> = self.snapshot_buckets()?;
        let mut levels: Vec<StockLevel> = Vec::new();

        for (key, bucket) in buckets {
            if key.facility_id != facility_id {
                continue;
            }
            let guard: MutexGuard<'_, Vec<BloodUnit>> = lock_bucket(&bucket)?;
            let available_ml: u32 = available_in(&guard, now);
            drop(guard);

            if available_ml > 0 {
                levels.push(StockLevel {
                    blood_group: key.blood_group,
                    component: key.component,
                    available_ml,
                });
            }
        }

        levels.sort_by_key(|level| (level.blood_group.as_str(), level.component.as_str()));
        Ok(levels)
    }

    /// Atomically reserves `quantity_ml` of stock under one key.
    ///
    /// The covering set is chosen earliest-expiry-first so short-dated stock
    /// leaves the shelf before it is lost to the sweep. Reservations are
    /// all-or-nothing: partial coverage is never returned.
    ///
    /// # Errors
    ///
    /// Returns `CoreError::InsufficientStock` if the bucket cannot cover the
    /// requested volume, or if lock contention on the bucket exhausts the
    /// bounded retry budget.
    pub fn reserve(
        &self,
        facility_id: i64,
        blood_group: BloodGroup,
        component: BloodComponent,
        quantity_ml: u32,
        now: OffsetDateTime,
    ) -> Result<StockReservation, CoreError> {
        hemolink_domain::validate_quantity(quantity_ml)?;

        let key: StockKey = StockKey::new(facility_id, blood_group, component);
        let Some(bucket) = self.existing_bucket(key)? else {
            return Err(insufficient(key, quantity_ml, 0));
        };

        let mut guard: MutexGuard<'_, Vec<BloodUnit>> =
            self.acquire_with_retry(&bucket, key, quantity_ml)?;

        let mut candidates: Vec<usize> = guard
            .iter()
            .enumerate()
            .filter(|(_, unit)| unit.status == UnitStatus::Available && !unit.is_expired(now))
            .map(|(index, _)| index)
            .collect();
        candidates.sort_by_key(|&index| guard[index].expires_at);

        let available: u64 = candidates
            .iter()
            .map(|&index| u64::from(guard[index].quantity_ml))
            .sum();
        let needed: u64 = u64::from(quantity_ml);

        if available < needed {
            return Err(insufficient(key, quantity_ml, clamp_ml(available)));
        }

        let mut covered: u64 = 0;
        let mut lines: Vec<ManifestLine> = Vec::new();
        for index in candidates {
            if covered >= needed {
                break;
            }
            let unit: &mut BloodUnit = &mut guard[index];
            let unit_id: i64 = unit.id().ok_or_else(|| {
                CoreError::Internal(String::from("ledger holds a unit without an id"))
            })?;
            unit.status = UnitStatus::Reserved;
            lines.push(ManifestLine::new(unit_id, unit.quantity_ml));
            covered += u64::from(unit.quantity_ml);
        }
        drop(guard);

        let reservation_id: i64 = self.next_reservation_id.fetch_add(1, Ordering::SeqCst) + 1;
        let reservation: StockReservation = StockReservation {
            reservation_id,
            facility_id,
            blood_group,
            component,
            lines,
        };

        let mut reservations = lock_reservations(&self.reservations)?;
        reservations.insert(reservation_id, reservation.clone());
        drop(reservations);

        info!(
            reservation_id,
            facility_id,
            blood_group = %blood_group,
            component = %component,
            quantity_ml,
            reserved_ml = reservation.reserved_quantity_ml(),
            "Reserved stock"
        );
        Ok(reservation)
    }

    /// Rolls a reservation back in full, restocking every pinned unit.
    ///
    /// Returns the restocked volume; `reserve` followed by `release` restores
    /// `available` to exactly its prior value.
    ///
    /// # Errors
    ///
    /// Returns `CoreError::NotFound` if the reservation does not exist or was
    /// already settled.
    pub fn release(&self, reservation_id: i64) -> Result<u32, CoreError> {
        let restocked: u32 = self.settle(reservation_id, &[])?;
        info!(reservation_id, restocked_ml = restocked, "Released reservation");
        Ok(restocked)
    }

    /// Settles a reservation after a failed delivery.
    ///
    /// Units in `consumed_unit_ids` were physically handed over and become
    /// `used`; everything else restocks to `available`. Returns the restocked
    /// volume.
    ///
    /// # Errors
    ///
    /// Returns `CoreError::NotFound` if the reservation does not exist or a
    /// consumed id is not part of it.
    pub fn release_except(
        &self,
        reservation_id: i64,
        consumed_unit_ids: &[i64],
    ) -> Result<u32, CoreError> {
        let restocked: u32 = self.settle(reservation_id, consumed_unit_ids)?;
        info!(
            reservation_id,
            restocked_ml = restocked,
            consumed_units = consumed_unit_ids.len(),
            "Released reservation after delivery failure"
        );
        Ok(restocked)
    }

    /// Commits a reservation: every pinned unit becomes `used`.
    ///
    /// # Errors
    ///
    /// Returns `CoreError::NotFound` if the reservation does not exist or was
    /// already settled.
    pub fn commit(&self, reservation_id: i64) -> Result<(), CoreError> {
        let reservation: StockReservation = self.take_reservation(reservation_id)?;
        let consumed: Vec<i64> = reservation.lines.iter().map(|line| line.unit_id).collect();
        self.flip_reserved(&reservation, &consumed)?;
        info!(reservation_id, units = consumed.len(), "Committed reservation");
        Ok(())
    }

    /// Expires shelved units past their shelf life.
    ///
    /// Only `available` and `testing` units are swept; reserved units are
    /// already promised to a delivery and settle through its outcome. The
    /// sweep is idempotent: already-expired units are untouched.
    ///
    /// # Errors
    ///
    /// Returns `CoreError::Internal` if a ledger lock is poisoned.
    pub fn sweep_expired(&self, now: OffsetDateTime) -> Result<Vec<i64>, CoreError> {
        let buckets: Vec<(StockKey, Bucket)> = self.snapshot_buckets()?;
        let mut expired: Vec<i64> = Vec::new();

        for (_, bucket) in buckets {
            let mut guard: MutexGuard<'_, Vec<BloodUnit>> = lock_bucket(&bucket)?;
            for unit in guard.iter_mut() {
                let sweepable: bool =
                    matches!(unit.status, UnitStatus::Available | UnitStatus::Testing);
                if sweepable && unit.is_expired(now) {
                    unit.status = UnitStatus::Expired;
                    if let Some(unit_id) = unit.id() {
                        expired.push(unit_id);
                    }
                }
            }
        }

        if !expired.is_empty() {
            info!(count = expired.len(), "Expired units past shelf life");
        }
        Ok(expired)
    }

    /// Voids a donation's still-idle units so the donation can be re-split.
    ///
    /// Only `testing` and `available` units can be voided. If any of the
    /// donation's units has been reserved or used, the stock is already
    /// promised and the void is refused outright. Expired and rejected units
    /// are left as they are.
    ///
    /// # Errors
    ///
    /// Returns `CoreError::StateConflict` if any unit from the donation is
    /// reserved or used.
    pub fn void_units_for_donation(&self, donation_id: i64) -> Result<Vec<i64>, CoreError> {
        let mut holding: Vec<(StockKey, Bucket)> = self
            .snapshot_buckets()?
            .into_iter()
            .collect();
        // Multi-bucket operation: acquire in a stable order so two concurrent
        // voids cannot deadlock.
        holding.sort_by_key(|(key, _)| key.ordering_key());

        let mut guards: Vec<MutexGuard<'_, Vec<BloodUnit>>> = Vec::with_capacity(holding.len());
        for (_, bucket) in &holding {
            guards.push(lock_bucket(bucket)?);
        }

        for guard in &guards {
            for unit in guard.iter().filter(|unit| unit.donation_id == donation_id) {
                if matches!(unit.status, UnitStatus::Reserved | UnitStatus::Used) {
                    return Err(CoreError::StateConflict {
                        entity: "blood unit",
                        id: unit.id().unwrap_or_default(),
                        reason: format!(
                            "unit is {} and can no longer be voided",
                            unit.status
                        ),
                    });
                }
            }
        }

        let mut voided: Vec<i64> = Vec::new();
        for guard in &mut guards {
            for unit in guard
                .iter_mut()
                .filter(|unit| unit.donation_id == donation_id)
            {
                if matches!(unit.status, UnitStatus::Testing | UnitStatus::Available) {
                    unit.status = UnitStatus::Rejected;
                    if let Some(unit_id) = unit.id() {
                        voided.push(unit_id);
                    }
                }
            }
        }
        drop(guards);

        info!(donation_id, count = voided.len(), "Voided split units");
        Ok(voided)
    }

    /// Looks up one unit by id.
    ///
    /// # Errors
    ///
    /// Returns `CoreError::NotFound` if the unit does not exist.
    pub fn get_unit(&self, unit_id: i64) -> Result<BloodUnit, CoreError> {
        self.with_unit_mut(unit_id, |unit| Ok(unit.clone()))
    }

    /// All units produced by one donation, in registration order.
    ///
    /// # Errors
    ///
    /// Returns `CoreError::Internal` if a ledger lock is poisoned.
    pub fn units_for_donation(&self, donation_id: i64) -> Result<Vec<BloodUnit>, CoreError> {
        let buckets: Vec<(StockKey, Bucket)> = self.snapshot_buckets()?;
        let mut units: Vec<BloodUnit> = Vec::new();

        for (_, bucket) in buckets {
            let guard: MutexGuard<'_, Vec<BloodUnit>> = lock_bucket(&bucket)?;
            units.extend(
                guard
                    .iter()
                    .filter(|unit| unit.donation_id == donation_id)
                    .cloned(),
            );
        }

        units.sort_by_key(BloodUnit::id);
        Ok(units)
    }

    /// Returns a held reservation by id, if it has not been settled yet.
    ///
    /// # Errors
    ///
    /// Returns `CoreError::NotFound` if the reservation does not exist.
    pub fn get_reservation(&self, reservation_id: i64) -> Result<StockReservation, CoreError> {
        let reservations = lock_reservations(&self.reservations)?;
        reservations
            .get(&reservation_id)
            .cloned()
            .ok_or(CoreError::NotFound {
                entity: "reservation",
                id: reservation_id,
            })
    }

    /// Removes a reservation from the registry, exactly once.
    fn take_reservation(&self, reservation_id: i64) -> Result<StockReservation, CoreError> {
        let mut reservations = lock_reservations(&self.reservations)?;
        reservations
            .remove(&reservation_id)
            .ok_or(CoreError::NotFound {
                entity: "reservation",
                id: reservation_id,
            })
    }

    /// Settles a reservation: consumed units become `used`, the rest restock.
    fn settle(&self, reservation_id: i64, consumed_unit_ids: &[i64]) -> Result<u32, CoreError> {
        let reservation: StockReservation = {
            let reservations = lock_reservations(&self.reservations)?;
            let held: &StockReservation =
                reservations
                    .get(&reservation_id)
                    .ok_or(CoreError::NotFound {
                        entity: "reservation",
                        id: reservation_id,
                    })?;

            for consumed in consumed_unit_ids {
                if !held.lines.iter().any(|line| line.unit_id == *consumed) {
                    return Err(CoreError::NotFound {
                        entity: "reserved blood unit",
                        id: *consumed,
                    });
                }
            }
            held.clone()
        };

        // The registry entry is only removed once the consumed set is known
        // to be valid, so a bad failure report leaves the reservation intact.
        self.take_reservation(reservation_id)?;
        self.flip_reserved(&reservation, consumed_unit_ids)?;

        let restocked: u64 = reservation
            .lines
            .iter()
            .filter(|line| !consumed_unit_ids.contains(&line.unit_id))
            .map(|line| u64::from(line.quantity_ml))
            .sum();
        Ok(clamp_ml(restocked))
    }

    /// Moves a settled reservation's units out of `reserved`.
    fn flip_reserved(
        &self,
        reservation: &StockReservation,
        consumed_unit_ids: &[i64],
    ) -> Result<(), CoreError> {
        let key: StockKey = StockKey::new(
            reservation.facility_id,
            reservation.blood_group,
            reservation.component,
        );
        let bucket: Bucket = self
            .existing_bucket(key)?
            .ok_or_else(|| CoreError::Internal(String::from("reservation bucket vanished")))?;
        let mut guard: MutexGuard<'_, Vec<BloodUnit>> = lock_bucket(&bucket)?;

        for line in &reservation.lines {
            let unit: &mut BloodUnit = guard
                .iter_mut()
                .find(|unit| unit.id() == Some(line.unit_id))
                .ok_or_else(|| {
                    CoreError::Internal(format!(
                        "reserved unit {} missing from its bucket",
                        line.unit_id
                    ))
                })?;

            unit.status = if consumed_unit_ids.contains(&line.unit_id) {
                UnitStatus::Used
            } else {
                UnitStatus::Available
            };
        }
        drop(guard);
        Ok(())
    }

    /// Finds a unit anywhere in the ledger and applies `f` under its bucket lock.
    fn with_unit_mut<T>(
        &self,
        unit_id: i64,
        f: impl FnOnce(&mut BloodUnit) -> Result<T, CoreError>,
    ) -> Result<T, CoreError> {
        let buckets: Vec<(StockKey, Bucket)> = self.snapshot_buckets()?;

        for (_, bucket) in buckets {
            let mut guard: MutexGuard<'_, Vec<BloodUnit>> = lock_bucket(&bucket)?;
            if let Some(unit) = guard.iter_mut().find(|unit| unit.id() == Some(unit_id)) {
                return f(unit);
            }
        }

        Err(CoreError::NotFound {
            entity: "blood unit",
            id: unit_id,
        })
    }

    /// Returns the bucket for a key, creating it if absent.
    fn bucket_for(&self, key: StockKey) -> Result<Bucket, CoreError> {
        let mut buckets = self
            .buckets
            .write()
            .map_err(|_| CoreError::Internal(String::from("bucket registry lock poisoned")))?;
        Ok(buckets
            .entry(key)
            .or_insert_with(|| Arc::new(Mutex::new(Vec::new())))
            .clone())
    }

    /// Returns the bucket for a key if one exists.
    fn existing_bucket(&self, key: StockKey) -> Result<Option<Bucket>, CoreError> {
        let buckets = self
            .buckets
            .read()
            .map_err(|_| CoreError::Internal(String::from("bucket registry lock poisoned")))?;
        Ok(buckets.get(&key).cloned())
    }

    /// Clones the current bucket map so iteration never holds the outer lock.
    fn snapshot_buckets(&self) -> Result<Vec<(StockKey, Bucket)>, CoreError> {
        let buckets = self
            .buckets
            .read()
            .map_err(|_| CoreError::Internal(String::from("bucket registry lock poisoned")))?;
        Ok(buckets
            .iter()
            .map(|(key, bucket)| (*key, bucket.clone()))
            .collect())
    }

    /// Acquires a bucket lock with a bounded retry budget.
    ///
    /// Contention exhaustion reads as out of stock, per the reservation
    /// contract: the caller sees a normal `InsufficientStock` decision input,
    /// never a lock error.
    fn acquire_with_retry<'a>(
        &self,
        bucket: &'a Mutex<Vec<BloodUnit>>,
        key: StockKey,
        quantity_ml: u32,
    ) -> Result<MutexGuard<'a, Vec<BloodUnit>>, CoreError> {
        let mut attempts: u32 = 0;
        loop {
            match bucket.try_lock() {
                Ok(guard) => return Ok(guard),
                Err(TryLockError::Poisoned(_)) => {
                    return Err(CoreError::Internal(String::from(
                        "stock bucket lock poisoned",
                    )));
                }
                Err(TryLockError::WouldBlock) => {
                    attempts += 1;
                    if attempts >= RESERVE_LOCK_ATTEMPTS {
                        warn!(
                            facility_id = key.facility_id,
                            blood_group = %key.blood_group,
                            component = %key.component,
                            attempts,
                            "Reservation lock contention exhausted"
                        );
                        return Err(insufficient(key, quantity_ml, 0));
                    }
                    std::thread::yield_now();
                }
            }
        }
    }
}

impl Default for InventoryLedger {
    fn default() -> Self {
        Self::new()
    }
}

/// Sums the reservable volume in one locked bucket.
fn available_in(units: &[BloodUnit], now: OffsetDateTime) -> u32 {
    let total: u64 = units
        .iter()
        .filter(|unit| unit.status == UnitStatus::Available && !unit.is_expired(now))
        .map(|unit| u64::from(unit.quantity_ml))
        .sum();
    clamp_ml(total)
}

/// Clamps a 64-bit volume into the 32-bit range used by requests.
fn clamp_ml(total: u64) -> u32 {
    u32::try_from(total).unwrap_or(u32::MAX)
}

const fn insufficient(key: StockKey, requested_ml: u32, available_ml: u32) -> CoreError {
    CoreError::InsufficientStock {
        facility_id: key.facility_id,
        blood_group: key.blood_group,
        component: key.component,
        requested_ml,
        available_ml,
    }
}

fn lock_bucket<'a>(
    bucket: &'a Mutex<Vec<BloodUnit>>,
) -> Result<MutexGuard<'a, Vec<BloodUnit>>, CoreError> {
    bucket
        .lock()
        .map_err(|_| CoreError::Internal(String::from("stock bucket lock poisoned")))
}

fn lock_reservations<'a>(
    reservations: &'a Mutex<HashMap<i64, StockReservation>>,
) -> Result<MutexGuard<'a, HashMap<i64, StockReservation>>, CoreError> {
    reservations
        .lock()
        .map_err(|_| CoreError::Internal(String::from("reservation registry lock poisoned")))
}
