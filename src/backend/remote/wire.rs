//! JSON shapes of the remote services.
//!
//! The remote services use Spanish field names; these types translate
//! between them and the domain model.

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use crate::backend::SignUpProfile;
use crate::domain::event::{deserialize_event_date, parse_event_date};
use crate::domain::{Event, EventId, EventPatch, NewEvent, PurchaseId, UserId};
use crate::error::StoreError;

/// Envelope returned by the identity service.
#[derive(Debug, Deserialize)]
pub struct Envelope<T> {
    /// `"success"` on success.
    pub status: String,
    /// Human-readable message, mostly on failure.
    #[serde(default)]
    pub message: Option<String>,
    /// Payload.
    pub data: Option<T>,
}

impl<T> Envelope<T> {
    /// Returns the payload of a successful envelope.
    ///
    /// # Errors
    ///
    /// Returns [`StoreError::Http`] with the envelope message when the
    /// status is not `success` or the payload is missing.
    pub fn into_data(self, http_status: u16) -> Result<T, StoreError> {
        match (self.status.as_str(), self.data) {
            ("success", Some(data)) => Ok(data),
            _ => Err(StoreError::Http {
                status: http_status,
                message: self
                    .message
                    .unwrap_or_else(|| format!("identity service answered `{}`", self.status)),
            }),
        }
    }
}

/// Payload carrying a credential token.
#[derive(Debug, Deserialize)]
pub struct TokenData {
    /// The credential token.
    pub token: String,
}

/// `POST /auth/SignIn` body.
#[derive(Debug, Serialize)]
pub struct SignInBody<'a> {
    /// Email.
    pub email: &'a str,
    /// Password.
    pub contrasenia: &'a str,
}

/// `POST /users` body.
#[derive(Debug, Serialize)]
pub struct SignUpBody<'a> {
    /// Given names.
    pub nombres: &'a str,
    /// Family names.
    pub apellidos: &'a str,
    /// National id.
    pub ci: &'a str,
    /// Address.
    pub direccion: &'a str,
    /// Phone.
    pub telefono: &'a str,
    /// Email.
    pub email: &'a str,
    /// Password.
    pub contrasenia: &'a str,
    /// Always `user`.
    pub rol: &'static str,
}

impl<'a> From<&'a SignUpProfile> for SignUpBody<'a> {
    fn from(profile: &'a SignUpProfile) -> Self {
        Self {
            nombres: &profile.given_names,
            apellidos: &profile.family_names,
            ci: &profile.national_id,
            direccion: &profile.address,
            telefono: &profile.phone,
            email: &profile.email,
            contrasenia: &profile.password,
            rol: "user",
        }
    }
}

/// An event as served by the events service.
#[derive(Debug, Deserialize)]
pub struct RemoteEvent {
    /// Integer id.
    pub id: EventId,
    /// Name.
    pub nombre: String,
    /// Date, with or without offset.
    #[serde(deserialize_with = "deserialize_event_date")]
    pub fecha: DateTime<Utc>,
    /// Venue.
    pub lugar: String,
    /// Remaining ticket capacity.
    pub capacidad: u32,
    /// Unit price, numeric or numeric string.
    pub precio: Decimal,
    /// Description, when the service has one.
    #[serde(default)]
    pub descripcion: Option<String>,
    /// Image URL, when the service has one.
    #[serde(default)]
    pub imagen: Option<String>,
}

impl From<RemoteEvent> for Event {
    fn from(remote: RemoteEvent) -> Self {
        Self {
            id: remote.id,
            name: remote.nombre,
            date: remote.fecha,
            location: remote.lugar,
            description: remote.descripcion.unwrap_or_default(),
            image_url: remote.imagen.unwrap_or_default(),
            capacity: remote.capacidad,
            ticket_price: remote.precio,
            tickets_sold: 0,
        }
    }
}

/// `POST /` body of the events service.
#[derive(Debug, Serialize)]
pub struct EventBody {
    /// Name.
    pub nombre: String,
    /// Date without offset.
    pub fecha: String,
    /// Venue.
    pub lugar: String,
    /// Capacity.
    pub capacidad: u32,
    /// Unit price.
    #[serde(with = "rust_decimal::serde::float")]
    pub precio: Decimal,
}

impl From<&NewEvent> for EventBody {
    fn from(new_event: &NewEvent) -> Self {
        Self {
            nombre: new_event.name.clone(),
            fecha: format_remote_date(new_event.date),
            lugar: new_event.location.clone(),
            capacidad: new_event.capacity,
            precio: new_event.ticket_price,
        }
    }
}

/// `PATCH /{id}/` body of the events service.
#[derive(Debug, Default, Serialize)]
pub struct EventPatchBody {
    /// New name.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub nombre: Option<String>,
    /// New date.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub fecha: Option<String>,
    /// New venue.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub lugar: Option<String>,
    /// New capacity.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub capacidad: Option<u32>,
    /// New unit price.
    #[serde(
        skip_serializing_if = "Option::is_none",
        with = "rust_decimal::serde::float_option"
    )]
    pub precio: Option<Decimal>,
}

impl From<&EventPatch> for EventPatchBody {
    fn from(patch: &EventPatch) -> Self {
        Self {
            nombre: patch.name.clone(),
            fecha: patch.date.map(format_remote_date),
            lugar: patch.location.clone(),
            capacidad: patch.capacity,
            precio: patch.ticket_price,
        }
    }
}

impl EventPatchBody {
    /// Body that only sets the capacity.
    #[must_use]
    pub fn capacity(capacidad: u32) -> Self {
        Self {
            capacidad: Some(capacidad),
            ..Self::default()
        }
    }
}

fn format_remote_date(date: DateTime<Utc>) -> String {
    date.format("%Y-%m-%dT%H:%M:%S").to_string()
}

/// `POST` body of the purchases service.
#[derive(Debug, Serialize)]
pub struct PurchaseBody {
    /// Event id; numeric when the id parses as an integer.
    pub evento_id: serde_json::Value,
    /// Ticket count.
    pub cantidad: u32,
}

impl PurchaseBody {
    /// Builds the body for `event_id`.
    #[must_use]
    pub fn new(event_id: &EventId, cantidad: u32) -> Self {
        let evento_id = event_id
            .as_str()
            .parse::<i64>()
            .map_or_else(|_| serde_json::Value::from(event_id.as_str()), serde_json::Value::from);
        Self {
            evento_id,
            cantidad,
        }
    }
}

/// MongoDB-style object id wrapper.
#[derive(Debug, Deserialize)]
pub struct ObjectId {
    /// Hex id.
    #[serde(rename = "$oid")]
    pub oid: String,
}

/// A purchase document returned by the purchases service.
#[derive(Debug, Deserialize)]
pub struct RemotePurchase {
    /// Document id.
    #[serde(rename = "_id")]
    pub id: ObjectId,
    /// Owner id.
    pub usuario_id: UserId,
    /// Event id.
    pub evento_id: EventId,
    /// Ticket count.
    pub cantidad: u32,
    /// Whether the purchase has been paid.
    pub pagado: bool,
    /// Creation time.
    #[serde(default)]
    pub fecha_compra: Option<String>,
}

impl RemotePurchase {
    /// Purchase id as a domain identifier.
    #[must_use]
    pub fn purchase_id(&self) -> PurchaseId {
        PurchaseId::new(self.id.oid.clone())
    }

    /// Parsed creation time.
    #[must_use]
    pub fn purchase_date(&self) -> Option<DateTime<Utc>> {
        self.fecha_compra.as_deref().and_then(parse_event_date)
    }
}
