//! Equipment service

use std::sync::Arc;

use validator::Validate;

use crate::{
    error::AppResult,
    models::equipment::{CreateEquipment, Equipment, UpdateEquipment},
    repository::LendingStore,
};

#[derive(Clone)]
pub struct EquipmentService {
    store: Arc<dyn LendingStore>,
}

impl EquipmentService {
    pub fn new(store: Arc<dyn LendingStore>) -> Self {
        Self { store }
    }

    pub async fn list(&self) -> AppResult<Vec<Equipment>> {
        self.store.equipment_list().await
    }

    pub async fn get_by_id(&self, id: i32) -> AppResult<Equipment> {
        self.store.equipment_get_by_id(id).await
    }

    pub async fn create(&self, data: &CreateEquipment) -> AppResult<Equipment> {
        data.validate()?;
        let available_stock = data.initial_available_stock()?;
        let equipment = self.store.equipment_create(data, available_stock).await?;
        tracing::info!(
            equipment_id = equipment.id,
            total_stock = equipment.total_stock,
            available_stock = equipment.available_stock,
            "Equipment created"
        );
        Ok(equipment)
    }

    /// Update descriptive fields or the physical count; available stock follows the count
    pub async fn update(&self, id: i32, data: &UpdateEquipment) -> AppResult<Equipment> {
        data.validate()?;
        let equipment = self.store.equipment_update(id, data).await?;
        if data.total_stock.is_some() {
            tracing::info!(
                equipment_id = id,
                total_stock = equipment.total_stock,
                available_stock = equipment.available_stock,
                "Equipment stock resized"
            );
        }
        Ok(equipment)
    }

    pub async fn delete(&self, id: i32) -> AppResult<()> {
        self.store.equipment_delete(id).await
    }
}
