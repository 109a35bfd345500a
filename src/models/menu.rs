use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::store::Document;

/// Weeks shown per month, each anchored on the month's first Monday.
pub const WEEKS_PER_MONTH: u8 = 4;
/// Monday is 2 and Friday is 6, as printed on the school's menu sheets.
pub const FIRST_TEACHING_DAY: u8 = 2;
pub const LAST_TEACHING_DAY: u8 = 6;
pub const TEACHING_DAYS: usize = (LAST_TEACHING_DAY - FIRST_TEACHING_DAY + 1) as usize;

const WEEKDAY_LABELS: [&str; TEACHING_DAYS] = ["Thứ 2", "Thứ 3", "Thứ 4", "Thứ 5", "Thứ 6"];

pub fn teaching_days() -> impl Iterator<Item = u8> {
    FIRST_TEACHING_DAY..=LAST_TEACHING_DAY
}

pub fn is_teaching_day(day_of_week: u8) -> bool {
    (FIRST_TEACHING_DAY..=LAST_TEACHING_DAY).contains(&day_of_week)
}

pub fn is_valid_week(week: u8) -> bool {
    (1..=WEEKS_PER_MONTH).contains(&week)
}

/// Display label ("Thứ 2" … "Thứ 6") for a teaching day.
pub fn weekday_label(day_of_week: u8) -> Option<&'static str> {
    if !is_teaching_day(day_of_week) {
        return None;
    }
    Some(WEEKDAY_LABELS[(day_of_week - FIRST_TEACHING_DAY) as usize])
}

/// Key of the month: `menu_<year>_<month>`. Also the id of the month's
/// attachment record in the `settings` collection.
pub fn month_key(year: i32, month: u32) -> String {
    format!("menu_{year}_{month}")
}

/// Canonical document id: `menu_<year>_<month>_week<week>_day<dayOfWeek>`.
pub fn canonical_menu_id(year: i32, month: u32, week: u8, day_of_week: u8) -> String {
    format!("{}_week{week}_day{day_of_week}", month_key(year, month))
}

/// Whether `id` uses the canonical scheme for this month rather than the
/// older `week<w>_day<d>` form.
pub fn is_canonical_for(id: &str, year: i32, month: u32) -> bool {
    id.strip_prefix(&month_key(year, month))
        .is_some_and(|rest| rest.starts_with('_'))
}

/// The four editable meal columns of a day.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum MealSlot {
    MorningSnack,
    MainMeal,
    AfternoonSnack1,
    AfternoonSnack2,
}

/// One row of a weekly menu.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DailyMenuRecord {
    /// Document id; `None` for rows generated from the empty-month template.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub id: Option<String>,
    pub week: u8,
    pub day_of_week: u8,
    #[serde(default)]
    pub day: String,
    #[serde(default)]
    pub date: String,
    #[serde(default)]
    pub morning_snack: String,
    #[serde(default)]
    pub main_meal: String,
    #[serde(default)]
    pub afternoon_snack1: String,
    #[serde(default)]
    pub afternoon_snack2: String,
    #[serde(default)]
    pub is_holiday: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub holiday_name: Option<String>,
    pub month: u32,
    pub year: i32,
}

impl DailyMenuRecord {
    /// Empty row for a (week, day) slot; `date` is filled in by the caller.
    pub fn blank(year: i32, month: u32, week: u8, day_of_week: u8, date: String) -> Self {
        Self {
            id: None,
            week,
            day_of_week,
            day: weekday_label(day_of_week).unwrap_or_default().to_string(),
            date,
            morning_snack: String::new(),
            main_meal: String::new(),
            afternoon_snack1: String::new(),
            afternoon_snack2: String::new(),
            is_holiday: false,
            holiday_name: None,
            month,
            year,
        }
    }

    /// A row counts as filled in when its main meal or morning snack is set.
    pub fn has_content(&self) -> bool {
        !self.main_meal.is_empty() || !self.morning_snack.is_empty()
    }

    pub fn slot(&self, slot: MealSlot) -> &str {
        match slot {
            MealSlot::MorningSnack => &self.morning_snack,
            MealSlot::MainMeal => &self.main_meal,
            MealSlot::AfternoonSnack1 => &self.afternoon_snack1,
            MealSlot::AfternoonSnack2 => &self.afternoon_snack2,
        }
    }

    pub fn set_slot(&mut self, slot: MealSlot, value: String) {
        match slot {
            MealSlot::MorningSnack => self.morning_snack = value,
            MealSlot::MainMeal => self.main_meal = value,
            MealSlot::AfternoonSnack1 => self.afternoon_snack1 = value,
            MealSlot::AfternoonSnack2 => self.afternoon_snack2 = value,
        }
    }

    pub fn key(&self) -> (u8, u8) {
        (self.week, self.day_of_week)
    }

    /// Decodes and range-checks a stored menu document.
    pub fn from_document(doc: Document) -> Result<Self, String> {
        let mut record: DailyMenuRecord =
            serde_json::from_value(doc.data).map_err(|e| e.to_string())?;
        if !is_valid_week(record.week) {
            return Err(format!("week {} out of range", record.week));
        }
        if !is_teaching_day(record.day_of_week) {
            return Err(format!("dayOfWeek {} out of range", record.day_of_week));
        }
        if !(1..=12).contains(&record.month) {
            return Err(format!("month {} out of range", record.month));
        }
        record.id = Some(doc.id);
        Ok(record)
    }

    /// Body written to the store; the id is the document key, not a field.
    pub fn to_document_data(&self) -> Value {
        let mut value = serde_json::to_value(self).unwrap_or(Value::Null);
        if let Value::Object(map) = &mut value {
            map.remove("id");
        }
        value
    }
}

/// Scanned or PDF menu sheet linked to a month.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MonthlyMenuAttachment {
    pub monthly_menu_url: String,
    pub file_name: String,
    pub month: u32,
    pub year: i32,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub updated_at: Option<DateTime<Utc>>,
    /// Blob-store path when the file was uploaded here; `None` for external links.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub storage_path: Option<String>,
}

/// Reference to an already uploaded file.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AttachmentFile {
    pub url: String,
    pub file_name: String,
    #[serde(default)]
    pub storage_path: Option<String>,
}

/// Query params for the month-scoped endpoints.
#[derive(Debug, Clone, Copy, Deserialize)]
pub struct MonthQuery {
    pub year: i32,
    pub month: u32,
}

/// Editable content of one day in a week save.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DayMenuInput {
    pub day_of_week: u8,
    #[serde(default)]
    pub morning_snack: String,
    #[serde(default)]
    pub main_meal: String,
    #[serde(default)]
    pub afternoon_snack1: String,
    #[serde(default)]
    pub afternoon_snack2: String,
    #[serde(default)]
    pub is_holiday: bool,
    #[serde(default)]
    pub holiday_name: Option<String>,
}

/// Body for PUT /admin/menus/week.
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SaveWeekRequest {
    pub year: i32,
    pub month: u32,
    pub week: u8,
    pub days: Vec<DayMenuInput>,
}

impl SaveWeekRequest {
    pub fn into_records(self) -> Vec<DailyMenuRecord> {
        let (year, month, week) = (self.year, self.month, self.week);
        self.days
            .into_iter()
            .map(|input| DailyMenuRecord {
                morning_snack: input.morning_snack,
                main_meal: input.main_meal,
                afternoon_snack1: input.afternoon_snack1,
                afternoon_snack2: input.afternoon_snack2,
                is_holiday: input.is_holiday,
                holiday_name: input.holiday_name,
                ..DailyMenuRecord::blank(year, month, week, input.day_of_week, String::new())
            })
            .collect()
    }
}

/// Query params for GET /menus/current.
#[derive(Debug, Default, Deserialize)]
pub struct CurrentMenuQuery {
    pub week: Option<u8>,
}
