//! What the editing panel and the public menu page see.
//!
//! Both surfaces go through [`MenuRepository`]; failures end up as
//! [`Notice`]s instead of errors so a page never breaks on a bad fetch.

use bytes::Bytes;
use chrono::{Datelike, NaiveDate};
use serde::Serialize;

use crate::{
    error::MenuError,
    models::menu::{is_valid_week, DailyMenuRecord, MealSlot, MonthlyMenuAttachment},
    services::{
        blob::BlobStore,
        calendar::current_week_of_month,
        menu::{blank_month, MenuRepository},
    },
};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum NoticeLevel {
    Success,
    Error,
}

/// User-visible outcome of an action (toast).
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Notice {
    pub level: NoticeLevel,
    pub message: String,
}

impl Notice {
    pub fn success(message: impl Into<String>) -> Self {
        Self {
            level: NoticeLevel::Success,
            message: message.into(),
        }
    }

    pub fn error(message: impl Into<String>) -> Self {
        Self {
            level: NoticeLevel::Error,
            message: message.into(),
        }
    }

    pub fn is_error(&self) -> bool {
        self.level == NoticeLevel::Error
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct WeekTab {
    pub week: u8,
    pub days: Vec<DailyMenuRecord>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct EditingView {
    pub year: i32,
    pub month: u32,
    pub weeks: Vec<WeekTab>,
    pub attachment: Option<MonthlyMenuAttachment>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct PublicMenuView {
    pub year: i32,
    pub month: u32,
    pub active_week: u8,
    pub days: Vec<DailyMenuRecord>,
    pub attachment: Option<MonthlyMenuAttachment>,
    /// Set when `days` is the illustrative sample rather than stored data.
    pub is_sample: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub notice: Option<Notice>,
}

/// Records and attachment of one month, fetched together.
#[derive(Debug, Clone, PartialEq)]
pub struct MonthSnapshot {
    pub records: Vec<DailyMenuRecord>,
    pub attachment: Option<MonthlyMenuAttachment>,
}

pub async fn load_snapshot(
    repo: &MenuRepository,
    year: i32,
    month: u32,
) -> Result<MonthSnapshot, MenuError> {
    let records = repo.load_month(year, month).await?;
    let attachment = repo.get_attachment(year, month).await?;
    Ok(MonthSnapshot {
        records,
        attachment,
    })
}

/// Overlays `records` on the blank month so every (week, day) cell exists.
pub fn complete_month(
    year: i32,
    month: u32,
    records: Vec<DailyMenuRecord>,
) -> Result<Vec<DailyMenuRecord>, MenuError> {
    let mut cells = blank_month(year, month)?;
    for record in records {
        if let Some(cell) = cells.iter_mut().find(|c| c.key() == record.key()) {
            *cell = record;
        }
    }
    Ok(cells)
}

pub fn group_weeks(records: &[DailyMenuRecord]) -> Vec<WeekTab> {
    let mut tabs: Vec<WeekTab> = Vec::new();
    for record in records {
        match tabs.iter_mut().find(|t| t.week == record.week) {
            Some(tab) => tab.days.push(record.clone()),
            None => tabs.push(WeekTab {
                week: record.week,
                days: vec![record.clone()],
            }),
        }
    }
    tabs.sort_by_key(|t| t.week);
    tabs
}

/// Full month for the admin panel, one tab per week.
pub async fn editing_view(
    repo: &MenuRepository,
    year: i32,
    month: u32,
) -> Result<EditingView, MenuError> {
    let snapshot = load_snapshot(repo, year, month).await?;
    let cells = complete_month(year, month, snapshot.records)?;
    Ok(EditingView {
        year,
        month,
        weeks: group_weeks(&cells),
        attachment: snapshot.attachment,
    })
}

const SAMPLE_WEEK: [(&str, &str, &str); 5] = [
    ("02/12", "Cơm tôm rim thịt + Canh chua", "Sữa chua + Trái cây"),
    ("03/12", "Thịt kho trứng + Canh rau ngót", "Bánh flan"),
    ("04/12", "Gà roti + Canh bí đỏ", "Sinh tố bơ"),
    ("05/12", "Cá hồi áp chảo + Canh cải", "Chè hạt sen"),
    ("06/12", "Mực xào rau củ + Canh rong biển", "Nước cam ép"),
];

/// Illustrative week shown on the public page when nothing is published.
/// Display only: it never reaches the store.
pub fn sample_week(year: i32) -> Vec<DailyMenuRecord> {
    SAMPLE_WEEK
        .iter()
        .zip(2u8..)
        .map(|((date, lunch, snack), day_of_week)| DailyMenuRecord {
            main_meal: lunch.to_string(),
            afternoon_snack1: snack.to_string(),
            ..DailyMenuRecord::blank(year, 12, 1, day_of_week, date.to_string())
        })
        .collect()
}

/// Read-only menu of the month containing `today`.
pub async fn public_view(
    repo: &MenuRepository,
    today: NaiveDate,
    requested_week: Option<u8>,
) -> PublicMenuView {
    let (year, month) = (today.year(), today.month());
    let active_week = requested_week
        .filter(|w| is_valid_week(*w))
        .unwrap_or_else(|| current_week_of_month(today));

    let mut notice = None;
    let records = match repo.load_reconciled(year, month).await {
        Ok(records) => records,
        Err(e) => {
            tracing::error!("Public menu load for {}/{} failed: {}", month, year, e);
            notice = Some(Notice::error("Lỗi khi tải thực đơn"));
            Vec::new()
        }
    };
    let attachment = match repo.get_attachment(year, month).await {
        Ok(attachment) => attachment,
        Err(e) => {
            tracing::warn!("Monthly menu file lookup for {}/{} failed: {}", month, year, e);
            None
        }
    };

    let (days, is_sample) = if records.is_empty() {
        (sample_week(year), true)
    } else {
        let days = complete_month(year, month, records)
            .unwrap_or_default()
            .into_iter()
            .filter(|r| r.week == active_week)
            .collect();
        (days, false)
    };

    PublicMenuView {
        year,
        month,
        active_week,
        days,
        attachment,
        is_sample,
        notice,
    }
}

/// Handed out by [`MenuEditor::begin_load`]; a result applied with an
/// outdated ticket is dropped.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct LoadTicket {
    generation: u64,
    pub year: i32,
    pub month: u32,
}

/// In-memory editing session over one month of menus.
///
/// Edits stay local until the active week is saved; saving writes only that
/// week. Switching month discards everything unsaved.
///
/// This is the library-side editing API for embedding clients (the admin
/// panel keeps the same session rules in the browser and talks to the HTTP
/// routes, which are stateless). It is exported as `vanganh_api::MenuEditor`.
pub struct MenuEditor {
    repo: MenuRepository,
    year: i32,
    month: u32,
    active_week: u8,
    records: Vec<DailyMenuRecord>,
    attachment: Option<MonthlyMenuAttachment>,
    generation: u64,
}

impl MenuEditor {
    pub fn new(repo: MenuRepository, year: i32, month: u32) -> Self {
        Self {
            repo,
            year,
            month,
            active_week: 1,
            records: Vec::new(),
            attachment: None,
            generation: 0,
        }
    }

    pub fn year(&self) -> i32 {
        self.year
    }

    pub fn month(&self) -> u32 {
        self.month
    }

    pub fn active_week(&self) -> u8 {
        self.active_week
    }

    pub fn attachment(&self) -> Option<&MonthlyMenuAttachment> {
        self.attachment.as_ref()
    }

    pub fn records(&self) -> &[DailyMenuRecord] {
        &self.records
    }

    /// Switches to a month and invalidates any load still in flight.
    pub fn begin_load(&mut self, year: i32, month: u32) -> LoadTicket {
        self.generation += 1;
        self.year = year;
        self.month = month;
        self.records.clear();
        self.attachment = None;
        LoadTicket {
            generation: self.generation,
            year,
            month,
        }
    }

    /// Applies a finished load unless a newer one has started since.
    pub fn apply_load(
        &mut self,
        ticket: LoadTicket,
        result: Result<MonthSnapshot, MenuError>,
    ) -> Option<Notice> {
        if ticket.generation != self.generation {
            tracing::debug!(
                "Discarding stale menu load for {}/{}",
                ticket.month,
                ticket.year
            );
            return None;
        }
        let loaded = result.and_then(|snapshot| {
            let cells = complete_month(ticket.year, ticket.month, snapshot.records)?;
            Ok((cells, snapshot.attachment))
        });
        match loaded {
            Ok((cells, attachment)) => {
                self.records = cells;
                self.attachment = attachment;
                None
            }
            Err(e) => {
                tracing::error!("Menu load for {}/{} failed: {}", ticket.month, ticket.year, e);
                self.records.clear();
                self.attachment = None;
                Some(Notice::error("Lỗi khi tải thực đơn"))
            }
        }
    }

    pub async fn select_month(&mut self, year: i32, month: u32) -> Option<Notice> {
        let ticket = self.begin_load(year, month);
        let result = load_snapshot(&self.repo, year, month).await;
        self.apply_load(ticket, result)
    }

    pub async fn reload(&mut self) -> Option<Notice> {
        self.select_month(self.year, self.month).await
    }

    pub fn set_active_week(&mut self, week: u8) -> Result<(), MenuError> {
        if !is_valid_week(week) {
            return Err(MenuError::Validation(format!("Tuần không hợp lệ: {week}")));
        }
        self.active_week = week;
        Ok(())
    }

    pub fn active_days(&self) -> Vec<&DailyMenuRecord> {
        self.records
            .iter()
            .filter(|r| r.week == self.active_week)
            .collect()
    }

    fn active_cell(&mut self, day_of_week: u8) -> Option<&mut DailyMenuRecord> {
        let week = self.active_week;
        self.records
            .iter_mut()
            .find(|r| r.week == week && r.day_of_week == day_of_week)
    }

    pub fn edit_meal(&mut self, day_of_week: u8, slot: MealSlot, value: impl Into<String>) {
        if let Some(cell) = self.active_cell(day_of_week) {
            cell.set_slot(slot, value.into());
        }
    }

    pub fn set_holiday(&mut self, day_of_week: u8, is_holiday: bool) {
        if let Some(cell) = self.active_cell(day_of_week) {
            cell.is_holiday = is_holiday;
        }
    }

    pub fn set_holiday_name(&mut self, day_of_week: u8, name: impl Into<String>) {
        if let Some(cell) = self.active_cell(day_of_week) {
            cell.holiday_name = Some(name.into());
        }
    }

    /// Persists the active week only. On failure the edits stay in place.
    pub async fn save_active_week(&mut self) -> Notice {
        let week = self.active_week;
        let days: Vec<DailyMenuRecord> = self.active_days().into_iter().cloned().collect();
        match self.repo.save_week(self.year, self.month, week, &days).await {
            Ok(saved) => {
                for record in saved {
                    if let Some(cell) = self.records.iter_mut().find(|c| c.key() == record.key()) {
                        *cell = record;
                    }
                }
                Notice::success(format!(
                    "Đã lưu thực đơn tuần {week} (Tháng {}) thành công!",
                    self.month
                ))
            }
            Err(e) => {
                tracing::error!("Error saving menu: {}", e);
                Notice::error("Lỗi khi lưu thực đơn")
            }
        }
    }

    pub async fn upload_attachment(
        &mut self,
        blobs: &dyn BlobStore,
        file_name: &str,
        bytes: Bytes,
    ) -> Notice {
        if bytes.is_empty() {
            return Notice::error("Vui lòng chọn file");
        }
        match self
            .repo
            .upload_attachment(blobs, self.year, self.month, file_name, bytes)
            .await
        {
            Ok(attachment) => {
                self.attachment = Some(attachment);
                Notice::success("Đã tải lên thực đơn tháng thành công!")
            }
            Err(e) => {
                tracing::error!("Error uploading monthly menu: {}", e);
                Notice::error("Lỗi khi tải lên file")
            }
        }
    }

    pub async fn delete_attachment(&mut self, blobs: &dyn BlobStore) -> Notice {
        match self.repo.delete_attachment(blobs, self.year, self.month).await {
            Ok(()) => {
                self.attachment = None;
                Notice::success("Đã xóa file thực đơn tháng.")
            }
            Err(e) => {
                tracing::error!("Error deleting monthly menu: {}", e);
                Notice::error("Lỗi khi xóa file")
            }
        }
    }

    pub fn view(&self) -> EditingView {
        EditingView {
            year: self.year,
            month: self.month,
            weeks: group_weeks(&self.records),
            attachment: self.attachment.clone(),
        }
    }
}
