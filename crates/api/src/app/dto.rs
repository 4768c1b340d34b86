use chrono::{DateTime, NaiveDate, NaiveTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Deserializer};

use tallerhub_inventory::{InventoryItem, ItemSummary, StockOperation};
use tallerhub_infra::repair_parts::{PartUsageRecord, UsageHistoryEntry};
use tallerhub_infra::repairs::RepairRecord;
use tallerhub_repairs::CostSummary;
use tallerhub_workshop::{Appointment, User, Vehicle};

// -------------------------
// Request DTOs
// -------------------------

#[derive(Debug, Deserialize)]
pub struct CreateUserRequest {
    pub nombre: Option<String>,
    pub email: Option<String>,
    pub password: Option<String>,
    pub rol: Option<String>,
    pub telefono: Option<String>,
}

#[derive(Debug, Deserialize)]
pub struct UpdateUserRequest {
    pub nombre: Option<String>,
    pub email: Option<String>,
    pub password: Option<String>,
    pub rol: Option<String>,
    pub telefono: Option<String>,
}

#[derive(Debug, Deserialize)]
pub struct CreateVehicleRequest {
    pub marca: Option<String>,
    pub modelo: Option<String>,
    #[serde(rename = "año", alias = "anio")]
    pub anio: Option<i32>,
    pub placa: Option<String>,
    pub usuario_id: Option<i64>,
}

#[derive(Debug, Deserialize)]
pub struct UpdateVehicleRequest {
    pub marca: Option<String>,
    pub modelo: Option<String>,
    #[serde(rename = "año", alias = "anio")]
    pub anio: Option<i32>,
    pub placa: Option<String>,
    pub usuario_id: Option<i64>,
}

#[derive(Debug, Deserialize)]
pub struct CreateAppointmentRequest {
    pub fecha: Option<NaiveDate>,
    pub hora: Option<NaiveTime>,
    pub descripcion: Option<String>,
    pub estado: Option<String>,
    pub usuario_id: Option<i64>,
    pub vehiculo_id: Option<i64>,
}

#[derive(Debug, Deserialize)]
pub struct UpdateAppointmentRequest {
    pub fecha: Option<NaiveDate>,
    pub hora: Option<NaiveTime>,
    pub descripcion: Option<String>,
    pub estado: Option<String>,
    pub usuario_id: Option<i64>,
    pub vehiculo_id: Option<i64>,
}

#[derive(Debug, Deserialize)]
pub struct CreateRepairRequest {
    pub fecha_inicio: Option<DateTime<Utc>>,
    pub fecha_fin: Option<DateTime<Utc>>,
    pub descripcion: Option<String>,
    pub costo: Option<Decimal>,
    pub usuario_id: Option<i64>,
    pub vehiculo_id: Option<i64>,
}

#[derive(Debug, Deserialize)]
pub struct UpdateRepairRequest {
    pub fecha_inicio: Option<DateTime<Utc>>,
    /// Absent = untouched; `null` = clear the end date.
    #[serde(default, deserialize_with = "double_option")]
    pub fecha_fin: Option<Option<DateTime<Utc>>>,
    pub descripcion: Option<String>,
    pub costo: Option<Decimal>,
    pub estado: Option<String>,
    pub usuario_id: Option<i64>,
    pub vehiculo_id: Option<i64>,
}

#[derive(Debug, Deserialize)]
pub struct CompleteRepairRequest {
    pub costo: Option<Decimal>,
}

#[derive(Debug, Deserialize)]
pub struct CreateItemRequest {
    pub nombre: Option<String>,
    pub descripcion: Option<String>,
    pub categoria: Option<String>,
    pub precio: Option<Decimal>,
    pub stock: Option<i64>,
}

#[derive(Debug, Deserialize)]
pub struct UpdateItemRequest {
    pub nombre: Option<String>,
    pub descripcion: Option<String>,
    pub categoria: Option<String>,
    pub precio: Option<Decimal>,
    pub stock: Option<i64>,
}

#[derive(Debug, Deserialize)]
pub struct AdjustStockRequest {
    pub stock: Option<i64>,
    /// Defaults to `establecer`, matching the catalog endpoint's contract.
    pub operacion: Option<StockOperation>,
}

#[derive(Debug, Deserialize)]
pub struct AttachPartRequest {
    pub inventario_id: Option<i64>,
    pub cantidad: Option<i64>,
    pub precio_unitario: Option<Decimal>,
}

#[derive(Debug, Deserialize)]
pub struct UpdatePartRequest {
    pub cantidad: Option<i64>,
    pub precio_unitario: Option<Decimal>,
}

// -------------------------
// Query DTOs (one per listing, validated before any SQL)
// -------------------------

#[derive(Debug, Deserialize)]
pub struct ListUsersQuery {
    pub pagina: Option<i64>,
    pub limite: Option<i64>,
    pub rol: Option<String>,
    pub buscar: Option<String>,
}

#[derive(Debug, Deserialize)]
pub struct ListVehiclesQuery {
    pub pagina: Option<i64>,
    pub limite: Option<i64>,
    pub usuario_id: Option<i64>,
    pub marca: Option<String>,
    pub buscar: Option<String>,
}

#[derive(Debug, Deserialize)]
pub struct ListAppointmentsQuery {
    pub pagina: Option<i64>,
    pub limite: Option<i64>,
    pub estado: Option<String>,
    pub fecha: Option<NaiveDate>,
}

#[derive(Debug, Deserialize)]
pub struct ListRepairsQuery {
    pub pagina: Option<i64>,
    pub limite: Option<i64>,
    pub usuario_id: Option<i64>,
    pub vehiculo_id: Option<i64>,
    pub estado: Option<String>,
    /// Inclusive start-date range bounds (on `fecha_inicio`).
    pub fecha_inicio: Option<NaiveDate>,
    pub fecha_fin: Option<NaiveDate>,
}

#[derive(Debug, Deserialize)]
pub struct ListInventoryQuery {
    pub pagina: Option<i64>,
    pub limite: Option<i64>,
    pub categoria: Option<String>,
    #[serde(rename = "stockMinimo")]
    pub stock_minimo: Option<String>,
    pub buscar: Option<String>,
}

#[derive(Debug, Deserialize)]
pub struct StatusQuery {
    pub estado: Option<String>,
    pub limite: Option<i64>,
}

#[derive(Debug, Deserialize)]
pub struct LimitQuery {
    pub limite: Option<i64>,
}

/// Distinguishes an absent field from an explicit `null`.
fn double_option<'de, T, D>(de: D) -> Result<Option<Option<T>>, D::Error>
where
    T: Deserialize<'de>,
    D: Deserializer<'de>,
{
    Deserialize::deserialize(de).map(Some)
}

// -------------------------
// JSON mapping helpers (wire stays Spanish)
// -------------------------

pub fn user_to_json(user: &User) -> serde_json::Value {
    serde_json::json!({
        "id": user.id,
        "nombre": user.name,
        "email": user.email,
        "rol": user.role.as_str(),
        "telefono": user.phone,
    })
}

pub fn vehicle_to_json(vehicle: &Vehicle) -> serde_json::Value {
    serde_json::json!({
        "id": vehicle.id,
        "marca": vehicle.make,
        "modelo": vehicle.model,
        "año": vehicle.year,
        "placa": vehicle.plate,
        "usuario_id": vehicle.owner_id,
    })
}

pub fn appointment_to_json(appointment: &Appointment) -> serde_json::Value {
    serde_json::json!({
        "id": appointment.id,
        "fecha": appointment.date,
        "hora": appointment.time,
        "descripcion": appointment.description,
        "estado": appointment.status.as_str(),
        "usuario_id": appointment.user_id,
        "vehiculo_id": appointment.vehicle_id,
    })
}

pub fn repair_to_json(record: &RepairRecord) -> serde_json::Value {
    serde_json::json!({
        "id": record.repair.id,
        "fecha_inicio": record.repair.started_at,
        "fecha_fin": record.repair.finished_at,
        "descripcion": record.repair.description,
        "costo": record.repair.labor_cost,
        "estado": record.repair.status.as_str(),
        "usuario_id": record.repair.user_id,
        "vehiculo_id": record.repair.vehicle_id,
        "usuario": {
            "id": record.user.id,
            "nombre": record.user.name,
            "email": record.user.email,
        },
        "vehiculo": {
            "id": record.vehicle.id,
            "marca": record.vehicle.make,
            "modelo": record.vehicle.model,
            "placa": record.vehicle.plate,
        },
    })
}

pub fn item_to_json(item: &InventoryItem) -> serde_json::Value {
    serde_json::json!({
        "id": item.id,
        "nombre": item.name,
        "descripcion": item.description,
        "categoria": item.category,
        "precio": item.price,
        "stock": item.stock,
    })
}

pub fn item_summary_to_json(item: &ItemSummary) -> serde_json::Value {
    serde_json::json!({
        "id": item.id,
        "nombre": item.name,
        "descripcion": item.description,
        "categoria": item.category,
    })
}

pub fn part_usage_to_json(record: &PartUsageRecord) -> serde_json::Value {
    serde_json::json!({
        "id": record.usage.id,
        "reparacion_id": record.usage.repair_id,
        "inventario_id": record.usage.item_id,
        "cantidad": record.usage.quantity,
        "precio_unitario": record.usage.unit_price,
        "created_at": record.usage.created_at,
        "inventario": item_summary_to_json(&record.item),
    })
}

pub fn usage_entry_to_json(entry: &UsageHistoryEntry) -> serde_json::Value {
    serde_json::json!({
        "id": entry.usage.id,
        "reparacion_id": entry.usage.repair_id,
        "inventario_id": entry.usage.item_id,
        "cantidad": entry.usage.quantity,
        "precio_unitario": entry.usage.unit_price,
        "created_at": entry.usage.created_at,
        "reparacion": {
            "id": entry.usage.repair_id,
            "descripcion": entry.description,
            "estado": entry.status.as_str(),
            "fecha_inicio": entry.started_at,
            "fecha_fin": entry.finished_at,
            "vehiculo": {
                "id": entry.vehicle.id,
                "marca": entry.vehicle.make,
                "modelo": entry.vehicle.model,
                "placa": entry.vehicle.plate,
            },
        },
    })
}

pub fn cost_summary_to_json(repair_id: i64, summary: &CostSummary) -> serde_json::Value {
    serde_json::json!({
        "reparacion_id": repair_id,
        "costo_mano_obra": summary.labor,
        "costo_repuestos": summary.parts,
        "costo_total": summary.total,
        "total_items": summary.item_count,
    })
}
