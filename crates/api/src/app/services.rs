use sqlx::PgPool;

use tallerhub_infra::appointments::AppointmentStore;
use tallerhub_infra::inventory::InventoryStore;
use tallerhub_infra::repair_parts::RepairPartsStore;
use tallerhub_infra::repairs::RepairStore;
use tallerhub_infra::users::UserStore;
use tallerhub_infra::vehicles::VehicleStore;

/// Store bundle shared by all handlers via an `Extension`.
///
/// Each store clones the pool handle; connections are shared underneath.
pub struct Stores {
    pub users: UserStore,
    pub vehicles: VehicleStore,
    pub appointments: AppointmentStore,
    pub repairs: RepairStore,
    pub inventory: InventoryStore,
    pub repair_parts: RepairPartsStore,
}

impl Stores {
    pub fn new(pool: PgPool) -> Self {
        Self {
            users: UserStore::new(pool.clone()),
            vehicles: VehicleStore::new(pool.clone()),
            appointments: AppointmentStore::new(pool.clone()),
            repairs: RepairStore::new(pool.clone()),
            inventory: InventoryStore::new(pool.clone()),
            repair_parts: RepairPartsStore::new(pool),
        }
    }
}
