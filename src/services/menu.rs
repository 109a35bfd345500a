use std::collections::{BTreeMap, BTreeSet};
use std::sync::Arc;

use bytes::Bytes;
use chrono::Utc;

use crate::{
    error::MenuError,
    models::menu::{
        canonical_menu_id, is_canonical_for, is_teaching_day, month_key, teaching_days,
        weekday_label, AttachmentFile, DailyMenuRecord, MonthlyMenuAttachment,
        FIRST_TEACHING_DAY, TEACHING_DAYS, WEEKS_PER_MONTH,
    },
    services::{
        blob::{sanitize_file_name, BlobStore},
        calendar::{first_of_month, week_dates},
    },
    store::{DocumentStore, Filter, WriteOp},
};

pub const MENUS: &str = "menus";
/// Monthly attachment records share this collection with other site settings.
pub const SETTINGS: &str = "settings";

/// Reads and writes the weekly menus of one (year, month) at a time.
#[derive(Clone)]
pub struct MenuRepository {
    store: Arc<dyn DocumentStore>,
}

impl MenuRepository {
    pub fn new(store: Arc<dyn DocumentStore>) -> Self {
        Self { store }
    }

    /// One record per (week, day) for the month, or the blank 20-row
    /// template when nothing is stored.
    pub async fn load_month(
        &self,
        year: i32,
        month: u32,
    ) -> Result<Vec<DailyMenuRecord>, MenuError> {
        let records = self.load_reconciled(year, month).await?;
        if records.is_empty() {
            tracing::debug!("No menus stored for {}/{}, using blank template", month, year);
            return blank_month(year, month);
        }
        Ok(records)
    }

    /// Stored records for the month after reconciliation, without gap filling.
    pub async fn load_reconciled(
        &self,
        year: i32,
        month: u32,
    ) -> Result<Vec<DailyMenuRecord>, MenuError> {
        first_of_month(year, month)?;

        // Matched by field: legacy ids carry no month prefix.
        let docs = self
            .store
            .query_eq(
                MENUS,
                &[Filter::eq("month", month), Filter::eq("year", year)],
            )
            .await
            .map_err(MenuError::QueryFailure)?;

        let total = docs.len();
        let records: Vec<DailyMenuRecord> = docs
            .into_iter()
            .filter_map(|doc| {
                let id = doc.id.clone();
                DailyMenuRecord::from_document(doc)
                    .map_err(|e| tracing::warn!("Skipping malformed menu document {}: {}", id, e))
                    .ok()
            })
            .collect();

        let reconciled = reconcile(year, month, records);
        tracing::debug!(
            "Loaded {} menu documents for {}/{}, {} after reconciliation",
            total,
            month,
            year,
            reconciled.len()
        );
        Ok(reconciled)
    }

    /// Upserts the five days of `week` under canonical ids in one atomic batch.
    pub async fn save_week(
        &self,
        year: i32,
        month: u32,
        week: u8,
        records: &[DailyMenuRecord],
    ) -> Result<Vec<DailyMenuRecord>, MenuError> {
        let dates = week_dates(week, month, year)?;
        validate_week_days(records)?;

        let mut saved = Vec::with_capacity(records.len());
        let mut ops = Vec::with_capacity(records.len());
        for record in records {
            let id = canonical_menu_id(year, month, week, record.day_of_week);
            let normalized = DailyMenuRecord {
                id: Some(id.clone()),
                week,
                day: weekday_label(record.day_of_week)
                    .unwrap_or_default()
                    .to_string(),
                date: dates[(record.day_of_week - FIRST_TEACHING_DAY) as usize].clone(),
                month,
                year,
                ..record.clone()
            };
            ops.push(WriteOp::set(MENUS, id, normalized.to_document_data()));
            saved.push(normalized);
        }

        self.store.commit(ops).await.map_err(|e| {
            tracing::error!("Saving week {} of {}/{} failed: {}", week, month, year, e);
            MenuError::PersistenceError(e)
        })?;
        tracing::info!("Saved menu week {} of {}/{}", week, month, year);

        saved.sort_by_key(DailyMenuRecord::key);
        Ok(saved)
    }

    pub async fn get_attachment(
        &self,
        year: i32,
        month: u32,
    ) -> Result<Option<MonthlyMenuAttachment>, MenuError> {
        first_of_month(year, month)?;
        let key = month_key(year, month);
        let Some(doc) = self
            .store
            .get(SETTINGS, &key)
            .await
            .map_err(MenuError::QueryFailure)?
        else {
            return Ok(None);
        };

        match serde_json::from_value::<MonthlyMenuAttachment>(doc.data) {
            Ok(attachment) if !attachment.monthly_menu_url.is_empty() => Ok(Some(attachment)),
            Ok(_) => Ok(None),
            Err(e) => {
                tracing::warn!("Ignoring malformed attachment record {}: {}", key, e);
                Ok(None)
            }
        }
    }

    /// Links an uploaded file to the month, replacing any previous link.
    pub async fn set_attachment(
        &self,
        year: i32,
        month: u32,
        file: AttachmentFile,
    ) -> Result<MonthlyMenuAttachment, MenuError> {
        first_of_month(year, month)?;
        let attachment = MonthlyMenuAttachment {
            monthly_menu_url: file.url,
            file_name: file.file_name,
            month,
            year,
            updated_at: Some(Utc::now()),
            storage_path: file.storage_path,
        };
        let data = serde_json::to_value(&attachment)
            .map_err(|e| MenuError::AttachmentError(e.to_string()))?;
        self.store
            .set(SETTINGS, &month_key(year, month), data)
            .await
            .map_err(|e| MenuError::AttachmentError(e.to_string()))?;
        tracing::info!("Linked monthly menu file for {}/{}", month, year);
        Ok(attachment)
    }

    /// Unlinks the month's file, then removes the uploaded blob behind it.
    /// A blob that cannot be removed is logged and left behind.
    pub async fn delete_attachment(
        &self,
        blobs: &dyn BlobStore,
        year: i32,
        month: u32,
    ) -> Result<(), MenuError> {
        let previous = self
            .get_attachment(year, month)
            .await
            .map_err(|e| MenuError::AttachmentError(e.to_string()))?;
        self.store
            .delete(SETTINGS, &month_key(year, month))
            .await
            .map_err(|e| MenuError::AttachmentError(e.to_string()))?;
        tracing::info!("Unlinked monthly menu file for {}/{}", month, year);

        if let Some(path) = previous.and_then(|a| a.storage_path) {
            remove_blob(blobs, &path).await;
        }
        Ok(())
    }

    /// Uploads the sheet to the blob store and links it to the month.
    /// The blob of a replaced upload is removed once the new link is stored.
    pub async fn upload_attachment(
        &self,
        blobs: &dyn BlobStore,
        year: i32,
        month: u32,
        file_name: &str,
        bytes: Bytes,
    ) -> Result<MonthlyMenuAttachment, MenuError> {
        first_of_month(year, month)?;
        if bytes.is_empty() {
            return Err(MenuError::Validation("Vui lòng chọn file".into()));
        }
        let previous = self
            .get_attachment(year, month)
            .await
            .map_err(|e| MenuError::AttachmentError(e.to_string()))?;

        let file_name = sanitize_file_name(file_name);
        let path = format!(
            "menus/monthly/{year}_{month}_{}_{file_name}",
            Utc::now().timestamp_millis()
        );
        let url = blobs
            .upload(&path, bytes)
            .await
            .map_err(|e| MenuError::AttachmentError(e.to_string()))?;
        let linked = self
            .set_attachment(
                year,
                month,
                AttachmentFile {
                    url,
                    file_name,
                    storage_path: Some(path.clone()),
                },
            )
            .await;

        match linked {
            Ok(attachment) => {
                if let Some(old) = previous.and_then(|a| a.storage_path) {
                    if old != path {
                        remove_blob(blobs, &old).await;
                    }
                }
                Ok(attachment)
            }
            Err(e) => {
                // The new blob is unreachable without its link.
                remove_blob(blobs, &path).await;
                Err(e)
            }
        }
    }
}

async fn remove_blob(blobs: &dyn BlobStore, path: &str) {
    if let Err(e) = blobs.delete(path).await {
        tracing::warn!("Could not remove blob {}: {}", path, e);
    }
}

/// Collapses duplicates to one record per (week, dayOfWeek).
///
/// For each key the first record (ordered by week, day, then id) is
/// challenged by every later one. A challenger wins when it has the
/// canonical id for this month and the holder does not, or when both share
/// the same id form and only the challenger has content. Ordering by id
/// first makes the outcome independent of the order the store returned.
pub fn reconcile(year: i32, month: u32, mut records: Vec<DailyMenuRecord>) -> Vec<DailyMenuRecord> {
    records.sort_by(|a, b| a.key().cmp(&b.key()).then_with(|| a.id.cmp(&b.id)));

    let mut retained: BTreeMap<(u8, u8), DailyMenuRecord> = BTreeMap::new();
    for candidate in records {
        match retained.get(&candidate.key()) {
            None => {
                retained.insert(candidate.key(), candidate);
            }
            Some(current) => {
                if challenger_wins(year, month, &candidate, current) {
                    retained.insert(candidate.key(), candidate);
                }
            }
        }
    }
    retained.into_values().collect()
}

fn challenger_wins(
    year: i32,
    month: u32,
    candidate: &DailyMenuRecord,
    current: &DailyMenuRecord,
) -> bool {
    let canonical = |r: &DailyMenuRecord| {
        r.id
            .as_deref()
            .is_some_and(|id| is_canonical_for(id, year, month))
    };
    match (canonical(candidate), canonical(current)) {
        (true, false) => true,
        (a, b) if a == b => candidate.has_content() && !current.has_content(),
        _ => false,
    }
}

/// Blank rows for weeks 1–4, Monday to Friday.
pub fn blank_month(year: i32, month: u32) -> Result<Vec<DailyMenuRecord>, MenuError> {
    let mut rows = Vec::with_capacity(WEEKS_PER_MONTH as usize * TEACHING_DAYS);
    for week in 1..=WEEKS_PER_MONTH {
        rows.extend(blank_week(year, month, week)?);
    }
    Ok(rows)
}

pub fn blank_week(year: i32, month: u32, week: u8) -> Result<Vec<DailyMenuRecord>, MenuError> {
    let dates = week_dates(week, month, year)?;
    Ok(teaching_days()
        .zip(dates)
        .map(|(day_of_week, date)| DailyMenuRecord::blank(year, month, week, day_of_week, date))
        .collect())
}

/// Batch that rewrites a month's stored menus under canonical ids only.
///
/// Each reconciled winner is written to its canonical id; every other
/// document of the month is deleted. Returns an empty batch when the month
/// is already clean.
pub fn canonicalize_month(year: i32, month: u32, records: Vec<DailyMenuRecord>) -> Vec<WriteOp> {
    let stored: Vec<String> = records.iter().filter_map(|r| r.id.clone()).collect();
    let winners = reconcile(year, month, records);

    let mut ops = Vec::new();
    let mut targets = BTreeSet::new();
    for winner in winners {
        let target = canonical_menu_id(year, month, winner.week, winner.day_of_week);
        if winner.id.as_deref() != Some(target.as_str()) {
            ops.push(WriteOp::set(MENUS, target.clone(), winner.to_document_data()));
        }
        targets.insert(target);
    }
    for id in stored {
        if !targets.contains(&id) {
            ops.push(WriteOp::delete(MENUS, id));
        }
    }
    ops
}

fn validate_week_days(records: &[DailyMenuRecord]) -> Result<(), MenuError> {
    if records.len() != TEACHING_DAYS {
        return Err(MenuError::Validation(format!(
            "Một tuần cần đúng {TEACHING_DAYS} ngày, nhận {}",
            records.len()
        )));
    }
    let mut seen = BTreeSet::new();
    for record in records {
        if !is_teaching_day(record.day_of_week) {
            return Err(MenuError::Validation(format!(
                "Ngày trong tuần không hợp lệ: {}",
                record.day_of_week
            )));
        }
        if !seen.insert(record.day_of_week) {
            return Err(MenuError::Validation(format!(
                "Ngày {} bị lặp lại",
                record.day_of_week
            )));
        }
    }
    Ok(())
}
