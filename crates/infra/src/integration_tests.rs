//! Integration tests for the persistence layer.
//!
//! These run against a real database (`DATABASE_URL`) with migrations
//! applied, so they are ignored by default:
//!
//! ```text
//! DATABASE_URL=postgres://... cargo test -p tallerhub-infra -- --ignored
//! ```

#[cfg(test)]
mod tests {
    use std::time::{SystemTime, UNIX_EPOCH};

    use rust_decimal::Decimal;

    use tallerhub_core::DomainError;
    use tallerhub_inventory::NewItem;
    use tallerhub_repairs::{AttachPart, NewRepair, PartUsagePatch};
    use tallerhub_workshop::{NewUser, NewVehicle};

    use crate::error::StoreError;
    use crate::inventory::InventoryStore;
    use crate::repair_parts::RepairPartsStore;
    use crate::repairs::RepairStore;
    use crate::users::UserStore;
    use crate::vehicles::VehicleStore;

    struct Env {
        users: UserStore,
        vehicles: VehicleStore,
        repairs: RepairStore,
        inventory: InventoryStore,
        repair_parts: RepairPartsStore,
        suffix: u128,
    }

    async fn connect() -> Env {
        let url = std::env::var("DATABASE_URL").expect("DATABASE_URL must be set");
        let pool = crate::db::connect(&url).await.expect("connect");
        crate::db::run_migrations(&pool).await.expect("migrate");

        let suffix = SystemTime::now()
            .duration_since(UNIX_EPOCH)
            .unwrap()
            .as_nanos();

        Env {
            users: UserStore::new(pool.clone()),
            vehicles: VehicleStore::new(pool.clone()),
            repairs: RepairStore::new(pool.clone()),
            inventory: InventoryStore::new(pool.clone()),
            repair_parts: RepairPartsStore::new(pool),
            suffix,
        }
    }

    /// Seed one user, vehicle, repair and item; returns (repair_id, item_id).
    async fn seed(env: &Env, stock: i64) -> (i64, i64) {
        let user = env
            .users
            .create(
                &NewUser {
                    name: "Taller Tester".to_string(),
                    email: format!("tester+{}@taller.test", env.suffix),
                    password: "s3creta".to_string(),
                    role: None,
                    phone: "555-0100".to_string(),
                },
                "$argon2id$fake-hash",
            )
            .await
            .expect("seed user");

        let vehicle = env
            .vehicles
            .create(
                &NewVehicle {
                    make: "Toyota".to_string(),
                    model: "Corolla".to_string(),
                    year: 2020,
                    plate: format!("T-{}", env.suffix % 1_000_000_000),
                    owner_id: user.id,
                },
                2100,
            )
            .await
            .expect("seed vehicle");

        let repair = env
            .repairs
            .create(&NewRepair {
                started_at: chrono::Utc::now(),
                finished_at: None,
                description: "Cambio de frenos".to_string(),
                labor_cost: Decimal::new(5000, 2),
                user_id: user.id,
                vehicle_id: vehicle.id,
            })
            .await
            .expect("seed repair");

        let item = env
            .inventory
            .create(&NewItem {
                name: format!("Pastillas de freno {}", env.suffix),
                description: "Juego delantero".to_string(),
                category: "frenos".to_string(),
                price: Decimal::new(1000, 2),
                stock,
            })
            .await
            .expect("seed item");

        (repair.repair.id, item.id)
    }

    fn insufficient(err: StoreError) -> (i64, i64) {
        match err {
            StoreError::Domain(DomainError::InsufficientStock {
                available,
                requested,
            }) => (available, requested),
            other => panic!("expected InsufficientStock, got {other:?}"),
        }
    }

    #[tokio::test]
    #[ignore = "requires a running Postgres (DATABASE_URL)"]
    async fn attach_update_detach_conserves_stock() {
        let env = connect().await;
        let (repair_id, item_id) = seed(&env, 10).await;

        // attach 4 -> stock 6
        let link = env
            .repair_parts
            .attach(
                repair_id,
                &AttachPart {
                    item_id,
                    quantity: 4,
                    unit_price: Decimal::new(1000, 2),
                },
            )
            .await
            .expect("attach");
        assert_eq!(env.inventory.get(item_id).await.unwrap().stock, 6);

        // update to 6 -> delta +2 -> stock 4
        env.repair_parts
            .update(
                repair_id,
                link.usage.id,
                &PartUsagePatch {
                    quantity: Some(6),
                    unit_price: None,
                },
            )
            .await
            .expect("update");
        assert_eq!(env.inventory.get(item_id).await.unwrap().stock, 4);

        // detach restores the last quantity -> stock 10
        env.repair_parts
            .detach(repair_id, link.usage.id)
            .await
            .expect("detach");
        assert_eq!(env.inventory.get(item_id).await.unwrap().stock, 10);

        // and the history no longer shows the repair
        let history = env.repair_parts.usage_history(item_id).await.unwrap();
        assert!(history.entries.is_empty());
    }

    #[tokio::test]
    #[ignore = "requires a running Postgres (DATABASE_URL)"]
    async fn attach_beyond_stock_fails_and_mutates_nothing() {
        let env = connect().await;
        let (repair_id, item_id) = seed(&env, 2).await;

        let err = env
            .repair_parts
            .attach(
                repair_id,
                &AttachPart {
                    item_id,
                    quantity: 3,
                    unit_price: Decimal::ONE,
                },
            )
            .await
            .unwrap_err();
        assert_eq!(insufficient(err), (2, 3));

        assert_eq!(env.inventory.get(item_id).await.unwrap().stock, 2);
        let list = env.repair_parts.list(repair_id).await.unwrap();
        assert_eq!(list.count, 0);
    }

    #[tokio::test]
    #[ignore = "requires a running Postgres (DATABASE_URL)"]
    async fn duplicate_attach_conflicts() {
        let env = connect().await;
        let (repair_id, item_id) = seed(&env, 10).await;

        let attach = AttachPart {
            item_id,
            quantity: 1,
            unit_price: Decimal::ONE,
        };
        env.repair_parts.attach(repair_id, &attach).await.unwrap();

        let err = env.repair_parts.attach(repair_id, &attach).await.unwrap_err();
        assert!(matches!(
            err,
            StoreError::Domain(DomainError::Conflict(_))
        ));
        // the failed attach must not have consumed stock
        assert_eq!(env.inventory.get(item_id).await.unwrap().stock, 9);
    }

    #[tokio::test]
    #[ignore = "requires a running Postgres (DATABASE_URL)"]
    async fn price_snapshot_survives_catalog_price_change() {
        let env = connect().await;
        let (repair_id, item_id) = seed(&env, 10).await;

        env.repair_parts
            .attach(
                repair_id,
                &AttachPart {
                    item_id,
                    quantity: 2,
                    unit_price: Decimal::new(1000, 2),
                },
            )
            .await
            .unwrap();

        env.inventory
            .update(
                item_id,
                &tallerhub_inventory::ItemPatch {
                    price: Some(Decimal::new(9999, 2)),
                    ..Default::default()
                },
            )
            .await
            .unwrap();

        let list = env.repair_parts.list(repair_id).await.unwrap();
        assert_eq!(list.items[0].usage.unit_price, Decimal::new(1000, 2));
        assert_eq!(list.total, Decimal::new(2000, 2));
    }

    #[tokio::test]
    #[ignore = "requires a running Postgres (DATABASE_URL)"]
    async fn cost_summary_adds_labor_and_parts() {
        let env = connect().await;
        let (repair_id, item_id) = seed(&env, 10).await;

        // labor 50.00 + (2 x 10.00) + (1 x 20.00) = 90.00
        env.repair_parts
            .attach(
                repair_id,
                &AttachPart {
                    item_id,
                    quantity: 2,
                    unit_price: Decimal::new(1000, 2),
                },
            )
            .await
            .unwrap();

        let second = env
            .inventory
            .create(&NewItem {
                name: format!("Liquido de frenos {}", env.suffix),
                description: String::new(),
                category: "frenos".to_string(),
                price: Decimal::new(2000, 2),
                stock: 5,
            })
            .await
            .unwrap();
        env.repair_parts
            .attach(
                repair_id,
                &AttachPart {
                    item_id: second.id,
                    quantity: 1,
                    unit_price: Decimal::new(2000, 2),
                },
            )
            .await
            .unwrap();

        let summary = env.repair_parts.cost_summary(repair_id).await.unwrap();
        assert_eq!(summary.labor, Decimal::new(5000, 2));
        assert_eq!(summary.parts, Decimal::new(4000, 2));
        assert_eq!(summary.total, Decimal::new(9000, 2));
        assert_eq!(summary.item_count, 2);
    }

    #[tokio::test]
    #[ignore = "requires a running Postgres (DATABASE_URL)"]
    async fn update_against_unknown_link_is_not_found() {
        let env = connect().await;
        let (repair_id, _item_id) = seed(&env, 10).await;

        let err = env
            .repair_parts
            .update(
                repair_id,
                i64::MAX,
                &PartUsagePatch {
                    quantity: Some(2),
                    unit_price: None,
                },
            )
            .await
            .unwrap_err();
        assert!(matches!(err, StoreError::Domain(DomainError::NotFound(_))));
    }
}
