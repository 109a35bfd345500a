use std::collections::BTreeSet;

use crate::{
    error::AppError,
    models::schedule::ScheduleItem,
    store::{DocumentStore, StoreError, WriteOp},
};

pub const SCHEDULES: &str = "schedules";

const DEFAULT_SCHEDULE: [(&str, &str); 9] = [
    ("07:00 - 08:00", "Đón trẻ, Thể dục sáng, Điểm danh"),
    ("08:00 - 08:30", "Ăn sáng"),
    ("08:30 - 10:00", "Hoạt động học tập & Vui chơi ngoài trời"),
    ("10:00 - 11:00", "Hoạt động góc & Kỹ năng"),
    ("11:00 - 12:00", "Ăn trưa"),
    ("12:00 - 14:30", "Ngủ trưa"),
    ("14:30 - 15:30", "Ăn xế & Vệ sinh cá nhân"),
    ("15:30 - 16:30", "Học năng khiếu / Tiếng Anh"),
    ("16:30 - 17:30", "Trả trẻ"),
];

pub fn default_schedule() -> Vec<ScheduleItem> {
    DEFAULT_SCHEDULE
        .iter()
        .zip(1u32..)
        .map(|((time, activity), id)| ScheduleItem {
            id,
            time: time.to_string(),
            activity: activity.to_string(),
        })
        .collect()
}

pub struct ScheduleService;

impl ScheduleService {
    /// Stored rows ordered by id, or the default day when none are stored.
    pub async fn list(store: &dyn DocumentStore) -> Result<Vec<ScheduleItem>, StoreError> {
        let docs = store.list(SCHEDULES).await?;
        let mut items: Vec<ScheduleItem> = docs
            .into_iter()
            .filter_map(|doc| {
                serde_json::from_value(doc.data)
                    .map_err(|e| tracing::warn!("Skipping malformed schedule row {}: {}", doc.id, e))
                    .ok()
            })
            .collect();
        if items.is_empty() {
            return Ok(default_schedule());
        }
        items.sort_by_key(|item| item.id);
        Ok(items)
    }

    /// Replaces the whole timetable in one batch, removing rows no longer listed.
    pub async fn replace(
        store: &dyn DocumentStore,
        items: Vec<ScheduleItem>,
    ) -> Result<Vec<ScheduleItem>, AppError> {
        let mut ids = BTreeSet::new();
        for item in &items {
            if item.time.trim().is_empty() || item.activity.trim().is_empty() {
                return Err(AppError::BadRequest(format!(
                    "Dòng {} thiếu thời gian hoặc hoạt động",
                    item.id
                )));
            }
            if !ids.insert(item.id.to_string()) {
                return Err(AppError::BadRequest(format!("Dòng {} bị lặp lại", item.id)));
            }
        }

        let existing = store.list(SCHEDULES).await?;
        let mut ops: Vec<WriteOp> = existing
            .into_iter()
            .filter(|doc| !ids.contains(&doc.id))
            .map(|doc| WriteOp::delete(SCHEDULES, doc.id))
            .collect();
        for item in &items {
            let data = serde_json::to_value(item).map_err(|e| AppError::BadRequest(e.to_string()))?;
            ops.push(WriteOp::set(SCHEDULES, item.id.to_string(), data));
        }
        store.commit(ops).await?;
        tracing::info!("Saved schedule with {} rows", items.len());

        let mut items = items;
        items.sort_by_key(|item| item.id);
        Ok(items)
    }
}
