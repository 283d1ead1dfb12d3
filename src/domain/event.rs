//! Catalog events and their create/patch payloads.

use chrono::{DateTime, NaiveDate, NaiveDateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Deserializer, Serialize};
use utoipa::ToSchema;

use super::EventId;
use crate::error::StoreError;

/// A ticketed event in the catalog.
///
/// `capacity` is the total number of tickets; `tickets_sold` counts the
/// tickets consumed by completed purchases. Remote payloads have no sold
/// counter: there the remote service shrinks `capacity` instead and
/// `tickets_sold` stays at zero.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
pub struct Event {
    /// Event identifier.
    pub id: EventId,
    /// Display name.
    pub name: String,
    /// Start date and time.
    #[serde(deserialize_with = "deserialize_event_date")]
    pub date: DateTime<Utc>,
    /// Venue.
    pub location: String,
    /// Long description.
    #[serde(default)]
    pub description: String,
    /// Poster image URL.
    #[serde(default)]
    pub image_url: String,
    /// Total number of tickets.
    pub capacity: u32,
    /// Unit ticket price.
    #[schema(value_type = String)]
    pub ticket_price: Decimal,
    /// Tickets consumed by completed purchases.
    #[serde(default)]
    pub tickets_sold: u32,
}

impl Event {
    /// Tickets that completed purchases have not consumed yet.
    #[must_use]
    pub fn remaining_capacity(&self) -> u32 {
        self.capacity.saturating_sub(self.tickets_sold)
    }

    /// Price of `quantity` tickets.
    #[must_use]
    pub fn price_for(&self, quantity: u32) -> Decimal {
        self.ticket_price * Decimal::from(quantity)
    }

    /// Applies the present fields of `patch` to this event.
    pub fn apply(&mut self, patch: &EventPatch) {
        if let Some(name) = &patch.name {
            self.name.clone_from(name);
        }
        if let Some(date) = patch.date {
            self.date = date;
        }
        if let Some(location) = &patch.location {
            self.location.clone_from(location);
        }
        if let Some(description) = &patch.description {
            self.description.clone_from(description);
        }
        if let Some(image_url) = &patch.image_url {
            self.image_url.clone_from(image_url);
        }
        if let Some(capacity) = patch.capacity {
            self.capacity = capacity;
        }
        if let Some(price) = patch.ticket_price {
            self.ticket_price = price;
        }
    }
}

/// Admin payload for creating an event.
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct NewEvent {
    /// Display name.
    pub name: String,
    /// Start date and time.
    #[serde(deserialize_with = "deserialize_event_date")]
    pub date: DateTime<Utc>,
    /// Venue.
    pub location: String,
    /// Long description.
    #[serde(default)]
    pub description: String,
    /// Poster image URL.
    #[serde(default)]
    pub image_url: String,
    /// Total number of tickets.
    pub capacity: u32,
    /// Unit ticket price.
    #[schema(value_type = String)]
    pub ticket_price: Decimal,
}

impl NewEvent {
    /// Checks the admin form constraints.
    ///
    /// # Errors
    ///
    /// Returns [`StoreError::Validation`] for a blank name or location, a zero
    /// capacity or a negative price.
    pub fn validate(&self) -> Result<(), StoreError> {
        require_text("name", &self.name)?;
        require_text("location", &self.location)?;
        require_capacity(self.capacity)?;
        require_price(self.ticket_price)
    }

    /// Builds the stored event with no tickets sold.
    #[must_use]
    pub fn into_event(self, id: EventId) -> Event {
        Event {
            id,
            name: self.name,
            date: self.date,
            location: self.location,
            description: self.description,
            image_url: self.image_url,
            capacity: self.capacity,
            ticket_price: self.ticket_price,
            tickets_sold: 0,
        }
    }
}

/// Partial update of an event. Absent fields are left untouched.
#[derive(Debug, Clone, Default, Serialize, Deserialize, ToSchema)]
pub struct EventPatch {
    /// New display name.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    /// New date.
    #[serde(
        default,
        skip_serializing_if = "Option::is_none",
        deserialize_with = "deserialize_optional_event_date"
    )]
    pub date: Option<DateTime<Utc>>,
    /// New venue.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub location: Option<String>,
    /// New description.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    /// New poster URL.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub image_url: Option<String>,
    /// New total capacity.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub capacity: Option<u32>,
    /// New unit price.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    #[schema(value_type = Option<String>)]
    pub ticket_price: Option<Decimal>,
}

impl EventPatch {
    /// Returns `true` when no field is set.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.name.is_none()
            && self.date.is_none()
            && self.location.is_none()
            && self.description.is_none()
            && self.image_url.is_none()
            && self.capacity.is_none()
            && self.ticket_price.is_none()
    }

    /// Checks the fields that are present.
    ///
    /// # Errors
    ///
    /// Returns [`StoreError::Validation`] for an empty patch or an invalid
    /// field value.
    pub fn validate(&self) -> Result<(), StoreError> {
        if self.is_empty() {
            return Err(StoreError::Validation("update has no fields".to_string()));
        }
        if let Some(name) = &self.name {
            require_text("name", name)?;
        }
        if let Some(location) = &self.location {
            require_text("location", location)?;
        }
        if let Some(capacity) = self.capacity {
            require_capacity(capacity)?;
        }
        if let Some(price) = self.ticket_price {
            require_price(price)?;
        }
        Ok(())
    }
}

fn require_text(field: &str, value: &str) -> Result<(), StoreError> {
    if value.trim().is_empty() {
        return Err(StoreError::Validation(format!("{field} must not be empty")));
    }
    Ok(())
}

fn require_capacity(capacity: u32) -> Result<(), StoreError> {
    if capacity == 0 {
        return Err(StoreError::Validation(
            "capacity must be at least 1".to_string(),
        ));
    }
    Ok(())
}

fn require_price(price: Decimal) -> Result<(), StoreError> {
    if price.is_sign_negative() {
        return Err(StoreError::Validation(
            "ticket price must not be negative".to_string(),
        ));
    }
    Ok(())
}

/// Parses an event date.
///
/// Accepts RFC 3339 timestamps as well as the offset-less forms produced by
/// HTML date inputs (`2025-07-15T18:00:00`, `2025-07-15T18:00`,
/// `2025-07-15`). Offset-less values are read as UTC.
#[must_use]
pub fn parse_event_date(raw: &str) -> Option<DateTime<Utc>> {
    let raw = raw.trim();
    if let Ok(parsed) = DateTime::parse_from_rfc3339(raw) {
        return Some(parsed.with_timezone(&Utc));
    }
    for format in ["%Y-%m-%dT%H:%M:%S%.f", "%Y-%m-%dT%H:%M", "%Y-%m-%d %H:%M:%S"] {
        if let Ok(naive) = NaiveDateTime::parse_from_str(raw, format) {
            return Some(naive.and_utc());
        }
    }
    NaiveDate::parse_from_str(raw, "%Y-%m-%d")
        .ok()
        .and_then(|date| date.and_hms_opt(0, 0, 0))
        .map(|naive| naive.and_utc())
}

/// Serde adapter around [`parse_event_date`].
///
/// # Errors
///
/// Fails when the value is not a string or is not a recognised date.
pub fn deserialize_event_date<'de, D>(deserializer: D) -> Result<DateTime<Utc>, D::Error>
where
    D: Deserializer<'de>,
{
    let raw = String::deserialize(deserializer)?;
    parse_event_date(&raw)
        .ok_or_else(|| serde::de::Error::custom(format!("invalid event date: {raw}")))
}

fn deserialize_optional_event_date<'de, D>(
    deserializer: D,
) -> Result<Option<DateTime<Utc>>, D::Error>
where
    D: Deserializer<'de>,
{
    match Option::<String>::deserialize(deserializer)? {
        None => Ok(None),
        Some(raw) => parse_event_date(&raw)
            .map(Some)
            .ok_or_else(|| serde::de::Error::custom(format!("invalid event date: {raw}"))),
    }
}

#[cfg(test)]
#[allow(clippy::panic)]
mod tests {
    use super::*;
    use chrono::{Datelike, Timelike};

    fn sample() -> Event {
        Event {
            id: EventId::new("1"),
            name: "Summer Music Festival".to_string(),
            date: Utc::now(),
            location: "Central Park, New York".to_string(),
            description: String::new(),
            image_url: String::new(),
            capacity: 10,
            ticket_price: Decimal::new(7500, 2),
            tickets_sold: 4,
        }
    }

    #[test]
    fn remaining_capacity_subtracts_sold() {
        let mut event = sample();
        assert_eq!(event.remaining_capacity(), 6);
        event.tickets_sold = 12;
        assert_eq!(event.remaining_capacity(), 0);
    }

    #[test]
    fn price_for_multiplies_exactly() {
        let event = sample();
        assert_eq!(event.price_for(3), Decimal::new(22500, 2));
    }

    #[test]
    fn parses_offsetless_and_rfc3339_dates() {
        let Some(naive) = parse_event_date("2023-07-15T18:00:00") else {
            panic!("naive date should parse");
        };
        assert_eq!((naive.month(), naive.day(), naive.hour()), (7, 15, 18));

        let Some(minutes) = parse_event_date("2023-07-15T18:30") else {
            panic!("minute precision should parse");
        };
        assert_eq!(minutes.minute(), 30);

        let Some(zoned) = parse_event_date("2023-07-15T18:00:00-04:00") else {
            panic!("rfc3339 should parse");
        };
        assert_eq!(zoned.hour(), 22);

        assert!(parse_event_date("next friday").is_none());
    }

    #[test]
    fn price_accepts_number_or_string() {
        let json = r#"{"id":1,"name":"a","date":"2030-01-01","location":"b","capacity":5,"ticket_price":"49.90"}"#;
        let Ok(from_str) = serde_json::from_str::<Event>(json) else {
            panic!("string price should parse");
        };
        let json = r#"{"id":1,"name":"a","date":"2030-01-01","location":"b","capacity":5,"ticket_price":49.9}"#;
        let Ok(from_num) = serde_json::from_str::<Event>(json) else {
            panic!("numeric price should parse");
        };
        assert_eq!(from_str.ticket_price, from_num.ticket_price);
        assert_eq!(from_num.tickets_sold, 0);
    }

    #[test]
    fn apply_patch_only_touches_present_fields() {
        let mut event = sample();
        let patch = EventPatch {
            capacity: Some(20),
            ..EventPatch::default()
        };
        event.apply(&patch);
        assert_eq!(event.capacity, 20);
        assert_eq!(event.name, "Summer Music Festival");
        assert_eq!(event.tickets_sold, 4);
    }

    #[test]
    fn validation_rejects_bad_input() {
        assert!(EventPatch::default().validate().is_err());
        let patch = EventPatch {
            ticket_price: Some(Decimal::new(-1, 0)),
            ..EventPatch::default()
        };
        assert!(patch.validate().is_err());

        let new_event = NewEvent {
            name: " ".to_string(),
            date: Utc::now(),
            location: "x".to_string(),
            description: String::new(),
            image_url: String::new(),
            capacity: 1,
            ticket_price: Decimal::ZERO,
        };
        assert!(new_event.validate().is_err());
    }
}
