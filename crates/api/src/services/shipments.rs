//! Shipment service.
//!
//! A shipment's medication reference is checked against the caller on every
//! write that supplies it. Nothing keeps it valid afterwards.

use tracing::{debug, instrument};

use patient_dashboard_core::{MedicationId, ShipmentId, UserId};

use super::{Action, RecordError, ensure_owner, required};
use crate::db::{MedicationRepository, ShipmentRepository, Store};
use crate::models::{Entity, NewShipment, ShipmentFilter, ShipmentInput, ShipmentView};

/// Ownership-checked shipment operations.
pub struct ShipmentService<'a> {
    shipments: ShipmentRepository<'a>,
    medications: MedicationRepository<'a>,
}

impl<'a> ShipmentService<'a> {
    #[must_use]
    pub const fn new(store: &'a Store) -> Self {
        Self {
            shipments: ShipmentRepository::new(store),
            medications: MedicationRepository::new(store),
        }
    }

    /// The caller's shipments, newest shipment date first.
    ///
    /// # Errors
    ///
    /// Returns `RecordError::Repository` if the store fails.
    #[instrument(skip(self))]
    pub async fn list(
        &self,
        owner: UserId,
        filter: &ShipmentFilter,
    ) -> Result<Vec<ShipmentView>, RecordError> {
        Ok(self.shipments.list(owner, filter).await?)
    }

    /// One of the caller's shipments.
    ///
    /// # Errors
    ///
    /// Returns `RecordError::NotFound` or `RecordError::Forbidden`.
    #[instrument(skip(self))]
    pub async fn get(&self, id: ShipmentId, owner: UserId) -> Result<ShipmentView, RecordError> {
        ensure_owner(self.shipments.get(id).await?, owner, Action::Access)
    }

    /// Create a shipment of one of the caller's medications.
    ///
    /// # Errors
    ///
    /// Returns `RecordError::Validation` if a required field is missing.
    /// Returns `RecordError::NotFound` / `RecordError::Forbidden` for the
    /// medication reference; nothing is written in that case.
    #[instrument(skip(self, input))]
    pub async fn create(
        &self,
        owner: UserId,
        input: ShipmentInput,
    ) -> Result<ShipmentView, RecordError> {
        let medication_id = required(input.medication, "Please add a medication")?;
        let shipment_date = required(input.shipment_date, "Please add a shipment date")?;
        let expected_delivery_date = required(
            input.expected_delivery_date,
            "Please add an expected delivery date",
        )?;
        let quantity = required(input.quantity, "Please add a quantity")?;

        self.check_medication(medication_id, owner, Action::CreateShipmentFor)
            .await?;

        let view = self
            .shipments
            .create(NewShipment {
                user_id: owner,
                medication_id,
                shipment_date,
                expected_delivery_date,
                actual_delivery_date: input.actual_delivery_date,
                tracking_number: input.tracking_number,
                status: input.status.unwrap_or_default(),
                quantity,
                notes: input.notes,
            })
            .await?;

        debug!(shipment_id = %view.shipment.id, "Shipment created");
        Ok(view)
    }

    /// Merge a partial update into one of the caller's shipments.
    ///
    /// # Errors
    ///
    /// Returns `RecordError::NotFound` or `RecordError::Forbidden` for the
    /// shipment, or for a newly supplied medication reference.
    #[instrument(skip(self, input))]
    pub async fn update(
        &self,
        id: ShipmentId,
        owner: UserId,
        input: ShipmentInput,
    ) -> Result<ShipmentView, RecordError> {
        let ShipmentView { mut shipment, .. } =
            ensure_owner(self.shipments.get(id).await?, owner, Action::Update)?;

        if let Some(medication_id) = input.medication {
            self.check_medication(medication_id, owner, Action::UpdateShipmentWith)
                .await?;
        }
        shipment.apply(input);

        self.shipments
            .update(&shipment)
            .await?
            .ok_or(RecordError::NotFound(Entity::Shipment))
    }

    /// Delete one of the caller's shipments.
    ///
    /// # Errors
    ///
    /// Returns `RecordError::NotFound` or `RecordError::Forbidden`.
    #[instrument(skip(self))]
    pub async fn delete(&self, id: ShipmentId, owner: UserId) -> Result<(), RecordError> {
        ensure_owner(self.shipments.get(id).await?, owner, Action::Delete)?;
        if !self.shipments.delete(id).await? {
            return Err(RecordError::NotFound(Entity::Shipment));
        }
        debug!(shipment_id = %id, "Shipment deleted");
        Ok(())
    }

    async fn check_medication(
        &self,
        id: MedicationId,
        owner: UserId,
        action: Action,
    ) -> Result<(), RecordError> {
        ensure_owner(self.medications.get(id).await?, owner, action)?;
        Ok(())
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use chrono::{Duration, Utc};

    use patient_dashboard_core::ShipmentStatus;

    use super::*;
    use crate::models::{MedicationInput, ShipmentFilter};
    use crate::services::MedicationService;

    async fn medication(store: &Store, owner: UserId, name: &str) -> MedicationId {
        MedicationService::new(store)
            .create(
                owner,
                MedicationInput {
                    name: Some(name.to_string()),
                    dosage: Some("1mg".to_string()),
                    frequency: Some("weekly".to_string()),
                    ..MedicationInput::default()
                },
            )
            .await
            .unwrap()
            .id
    }

    fn input(medication: MedicationId) -> ShipmentInput {
        let now = Utc::now();
        ShipmentInput {
            medication: Some(medication),
            shipment_date: Some(now),
            expected_delivery_date: Some(now + Duration::days(4)),
            tracking_number: Some("1Z999AA10123456784".to_string()),
            quantity: Some(4),
            ..ShipmentInput::default()
        }
    }

    #[tokio::test]
    async fn test_create_populates_medication_and_carrier() {
        let store = Store::memory();
        let owner = UserId::new(1);
        let med = medication(&store, owner, "Tirzepatide").await;
        let service = ShipmentService::new(&store);

        let view = service.create(owner, input(med)).await.unwrap();

        assert_eq!(view.shipment.status, ShipmentStatus::Processing);
        assert_eq!(view.medication.as_ref().unwrap().name, "Tirzepatide");
        assert_eq!(view.carrier.as_ref().unwrap().name, "UPS");
    }

    #[tokio::test]
    async fn test_create_with_foreign_medication_writes_nothing() {
        let store = Store::memory();
        let alice = UserId::new(1);
        let bob = UserId::new(2);
        let alice_med = medication(&store, alice, "Insulin").await;
        let service = ShipmentService::new(&store);

        let err = service.create(bob, input(alice_med)).await.unwrap_err();
        assert_eq!(
            err.to_string(),
            "Not authorized to create shipment for this medication"
        );

        let err = service
            .create(bob, input(MedicationId::new(9999)))
            .await
            .unwrap_err();
        assert!(matches!(err, RecordError::NotFound(Entity::Medication)));

        let listed = service.list(bob, &ShipmentFilter::default()).await.unwrap();
        assert!(listed.is_empty());
    }

    #[tokio::test]
    async fn test_create_requires_fields() {
        let store = Store::memory();
        let service = ShipmentService::new(&store);

        let err = service
            .create(UserId::new(1), ShipmentInput::default())
            .await
            .unwrap_err();
        assert_eq!(err.to_string(), "Please add a medication");
    }

    #[tokio::test]
    async fn test_update_rechecks_supplied_medication() {
        let store = Store::memory();
        let alice = UserId::new(1);
        let bob = UserId::new(2);
        let alice_med = medication(&store, alice, "Insulin").await;
        let bob_med = medication(&store, bob, "Other").await;
        let service = ShipmentService::new(&store);

        let view = service.create(alice, input(alice_med)).await.unwrap();

        let err = service
            .update(
                view.shipment.id,
                alice,
                ShipmentInput {
                    medication: Some(bob_med),
                    ..ShipmentInput::default()
                },
            )
            .await
            .unwrap_err();
        assert!(matches!(err, RecordError::Forbidden { .. }));

        let updated = service
            .update(
                view.shipment.id,
                alice,
                ShipmentInput {
                    status: Some(ShipmentStatus::Delivered),
                    ..ShipmentInput::default()
                },
            )
            .await
            .unwrap();
        assert_eq!(updated.shipment.status, ShipmentStatus::Delivered);
        assert_eq!(updated.shipment.medication_id, alice_med);
    }

    #[tokio::test]
    async fn test_other_users_are_forbidden() {
        let store = Store::memory();
        let alice = UserId::new(1);
        let bob = UserId::new(2);
        let med = medication(&store, alice, "Insulin").await;
        let service = ShipmentService::new(&store);
        let view = service.create(alice, input(med)).await.unwrap();
        let id = view.shipment.id;

        let err = service.get(id, bob).await.unwrap_err();
        assert!(matches!(
            err,
            RecordError::Forbidden {
                entity: Entity::Shipment,
                action: Action::Access
            }
        ));

        let err = service
            .update(
                id,
                bob,
                ShipmentInput {
                    status: Some(ShipmentStatus::Cancelled),
                    quantity: Some(99),
                    ..ShipmentInput::default()
                },
            )
            .await
            .unwrap_err();
        assert!(matches!(
            err,
            RecordError::Forbidden {
                entity: Entity::Shipment,
                action: Action::Update
            }
        ));

        let err = service.delete(id, bob).await.unwrap_err();
        assert!(matches!(
            err,
            RecordError::Forbidden {
                entity: Entity::Shipment,
                action: Action::Delete
            }
        ));

        let unchanged = service.get(id, alice).await.unwrap();
        assert_eq!(unchanged.shipment, view.shipment);
    }

    #[tokio::test]
    async fn test_deleting_medication_leaves_dangling_shipment() {
        let store = Store::memory();
        let owner = UserId::new(1);
        let med = medication(&store, owner, "Insulin").await;
        let service = ShipmentService::new(&store);
        let view = service.create(owner, input(med)).await.unwrap();

        MedicationService::new(&store).delete(med, owner).await.unwrap();

        let fetched = service.get(view.shipment.id, owner).await.unwrap();
        assert_eq!(fetched.shipment.medication_id, med);
        assert!(fetched.medication.is_none());
    }
}
