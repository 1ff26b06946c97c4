//! Shipment domain types.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use patient_dashboard_core::{Carrier, MedicationId, ShipmentId, ShipmentStatus, UserId};

use super::{Entity, Owned, dates};

/// A refill delivery of one medication.
///
/// `medication_id` is checked against the owner when written but is not a
/// foreign key; it dangles once the medication is deleted.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Shipment {
    pub id: ShipmentId,
    #[serde(rename = "user")]
    pub user_id: UserId,
    pub medication_id: MedicationId,
    pub shipment_date: DateTime<Utc>,
    pub expected_delivery_date: DateTime<Utc>,
    pub actual_delivery_date: Option<DateTime<Utc>>,
    pub tracking_number: Option<String>,
    pub status: ShipmentStatus,
    pub quantity: i32,
    pub notes: Option<String>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl Shipment {
    /// Merge a partial update; absent fields keep their value.
    pub fn apply(&mut self, input: ShipmentInput) {
        if let Some(medication_id) = input.medication {
            self.medication_id = medication_id;
        }
        if let Some(shipment_date) = input.shipment_date {
            self.shipment_date = shipment_date;
        }
        if let Some(expected) = input.expected_delivery_date {
            self.expected_delivery_date = expected;
        }
        if input.actual_delivery_date.is_some() {
            self.actual_delivery_date = input.actual_delivery_date;
        }
        if input.tracking_number.is_some() {
            self.tracking_number = input.tracking_number;
        }
        if let Some(status) = input.status {
            self.status = status;
        }
        if let Some(quantity) = input.quantity {
            self.quantity = quantity;
        }
        if input.notes.is_some() {
            self.notes = input.notes;
        }
    }
}

/// The populated medication fields shown alongside a shipment.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct MedicationSummary {
    pub id: MedicationId,
    pub name: String,
    pub dosage: String,
    pub frequency: String,
}

/// A shipment as served: populated medication (null when dangling) and
/// the guessed carrier.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ShipmentView {
    #[serde(flatten)]
    pub shipment: Shipment,
    pub medication: Option<MedicationSummary>,
    pub carrier: Option<Carrier>,
}

impl ShipmentView {
    #[must_use]
    pub fn new(shipment: Shipment, medication: Option<MedicationSummary>) -> Self {
        let carrier = Carrier::guess(shipment.tracking_number.as_deref());
        Self {
            shipment,
            medication,
            carrier,
        }
    }
}

impl Owned for ShipmentView {
    const ENTITY: Entity = Entity::Shipment;

    fn owner(&self) -> UserId {
        self.shipment.user_id
    }
}

/// A validated shipment ready to insert.
#[derive(Debug, Clone)]
pub struct NewShipment {
    pub user_id: UserId,
    pub medication_id: MedicationId,
    pub shipment_date: DateTime<Utc>,
    pub expected_delivery_date: DateTime<Utc>,
    pub actual_delivery_date: Option<DateTime<Utc>>,
    pub tracking_number: Option<String>,
    pub status: ShipmentStatus,
    pub quantity: i32,
    pub notes: Option<String>,
}

/// Request body for creating or updating a shipment.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ShipmentInput {
    /// Id of the medication being shipped.
    pub medication: Option<MedicationId>,
    #[serde(default, deserialize_with = "dates::optional_datetime")]
    pub shipment_date: Option<DateTime<Utc>>,
    #[serde(default, deserialize_with = "dates::optional_datetime")]
    pub expected_delivery_date: Option<DateTime<Utc>>,
    #[serde(default, deserialize_with = "dates::optional_datetime")]
    pub actual_delivery_date: Option<DateTime<Utc>>,
    pub tracking_number: Option<String>,
    pub status: Option<ShipmentStatus>,
    pub quantity: Option<i32>,
    pub notes: Option<String>,
}

/// Query parameters for `GET /api/shipments`.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct ShipmentFilter {
    pub status: Option<ShipmentStatus>,
    /// Case-insensitive substring of the tracking number or medication name.
    pub q: Option<String>,
}

impl ShipmentFilter {
    /// The search term, lowercased, if it is non-blank.
    #[must_use]
    pub fn needle(&self) -> Option<String> {
        self.q
            .as_deref()
            .map(str::trim)
            .filter(|q| !q.is_empty())
            .map(str::to_lowercase)
    }

    /// Whether `view` passes the filter.
    #[must_use]
    pub fn matches(&self, view: &ShipmentView) -> bool {
        if self.status.is_some_and(|status| status != view.shipment.status) {
            return false;
        }
        let Some(needle) = self.needle() else {
            return true;
        };
        let tracking = view
            .shipment
            .tracking_number
            .as_deref()
            .is_some_and(|number| number.to_lowercase().contains(&needle));
        let medication = view
            .medication
            .as_ref()
            .is_some_and(|m| m.name.to_lowercase().contains(&needle));
        tracking || medication
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    fn view(tracking: Option<&str>, medication: Option<&str>) -> ShipmentView {
        let now = Utc::now();
        let shipment = Shipment {
            id: ShipmentId::new(1),
            user_id: UserId::new(1),
            medication_id: MedicationId::new(7),
            shipment_date: now,
            expected_delivery_date: now,
            actual_delivery_date: None,
            tracking_number: tracking.map(String::from),
            status: ShipmentStatus::InTransit,
            quantity: 30,
            notes: None,
            created_at: now,
            updated_at: now,
        };
        let summary = medication.map(|name| MedicationSummary {
            id: MedicationId::new(7),
            name: name.to_string(),
            dosage: "5mg".to_string(),
            frequency: "daily".to_string(),
        });
        ShipmentView::new(shipment, summary)
    }

    #[test]
    fn test_filter_by_status() {
        let in_transit = ShipmentFilter {
            status: Some(ShipmentStatus::InTransit),
            q: None,
        };
        let delivered = ShipmentFilter {
            status: Some(ShipmentStatus::Delivered),
            q: None,
        };
        assert!(in_transit.matches(&view(None, None)));
        assert!(!delivered.matches(&view(None, None)));
    }

    #[test]
    fn test_query_matches_tracking_or_medication_name() {
        let filter = ShipmentFilter {
            status: None,
            q: Some("1z99".to_string()),
        };
        assert!(filter.matches(&view(Some("1Z999AA1"), Some("Insulin"))));

        let filter = ShipmentFilter {
            status: None,
            q: Some("insu".to_string()),
        };
        assert!(filter.matches(&view(Some("1Z999AA1"), Some("Insulin"))));
        assert!(!filter.matches(&view(Some("1Z999AA1"), None)));
    }

    #[test]
    fn test_filter_query_string_rejects_unknown_status() {
        let err = serde_json::from_str::<ShipmentFilter>(r#"{"status":"lost"}"#);
        assert!(err.is_err());
    }

    #[test]
    fn test_view_serializes_flat_with_carrier() {
        let json = serde_json::to_value(view(Some("1Z999AA10123456784"), None)).unwrap();

        assert_eq!(json["medicationId"], 7);
        assert!(json["medication"].is_null());
        assert_eq!(json["status"], "in-transit");
        assert_eq!(json["carrier"]["name"], "UPS");
        assert_eq!(json["user"], 1);
    }

    #[test]
    fn test_apply_changes_medication_reference() {
        let mut shipment = view(None, None).shipment;
        shipment.apply(ShipmentInput {
            medication: Some(MedicationId::new(9)),
            status: Some(ShipmentStatus::Delivered),
            ..ShipmentInput::default()
        });
        assert_eq!(shipment.medication_id, MedicationId::new(9));
        assert_eq!(shipment.status, ShipmentStatus::Delivered);
        assert_eq!(shipment.quantity, 30);
    }
}
