//! Warehouse data held in memory.
//!
//! [`InMemoryWarehouse`] implements every repository port over a data set
//! loaded from YAML. The CLI uses it to drive sessions from files and
//! tests use it as a fake backend.

use std::path::Path;
use std::sync::{Mutex, MutexGuard, PoisonError};

use serde::{Deserialize, Serialize};
use tracing::info;

use crate::model::{BinX, FactAction, Pallet, Product, Task, TaskType};
use crate::ports::{
    BinRepository, PalletRepository, PortError, PortFuture, ProductRepository, TaskRepository,
};

/// Contents of a warehouse data file.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct WarehouseData {
    /// Known task types.
    #[serde(default)]
    pub task_types: Vec<TaskType>,
    /// Tasks with their plans.
    #[serde(default)]
    pub tasks: Vec<Task>,
    /// Product catalogue.
    #[serde(default)]
    pub products: Vec<Product>,
    /// Storage bins.
    #[serde(default)]
    pub bins: Vec<BinX>,
    /// Known pallets.
    #[serde(default)]
    pub pallets: Vec<Pallet>,
}

/// In-memory implementation of the product, bin, pallet and task repositories.
#[derive(Debug, Default)]
pub struct InMemoryWarehouse {
    data: Mutex<WarehouseData>,
}

impl InMemoryWarehouse {
    /// Wraps a data set.
    #[must_use]
    pub fn new(data: WarehouseData) -> Self {
        Self { data: Mutex::new(data) }
    }

    /// Parses a data set from YAML.
    ///
    /// # Errors
    ///
    /// Returns an error if the YAML does not describe a warehouse.
    pub fn from_yaml(yaml: &str) -> Result<Self, String> {
        serde_yaml::from_str(yaml)
            .map(Self::new)
            .map_err(|e| format!("Failed to parse warehouse data: {e}"))
    }

    /// Loads a data set from a YAML file.
    ///
    /// # Errors
    ///
    /// Returns an error if the file cannot be read or parsed.
    pub fn load(path: &Path) -> Result<Self, String> {
        let content = std::fs::read_to_string(path)
            .map_err(|e| format!("Failed to read warehouse data {}: {e}", path.display()))?;
        Self::from_yaml(&content)
    }

    /// Writes the current data set to `path` as YAML, creating parent
    /// directories as needed.
    ///
    /// # Errors
    ///
    /// Returns an error if the data cannot be serialized or written.
    pub fn save(&self, path: &Path) -> Result<(), String> {
        let yaml = serde_yaml::to_string(&self.snapshot())
            .map_err(|e| format!("Failed to serialize warehouse data: {e}"))?;
        if let Some(parent) = path.parent().filter(|parent| !parent.as_os_str().is_empty()) {
            std::fs::create_dir_all(parent)
                .map_err(|e| format!("Failed to create {}: {e}", parent.display()))?;
        }
        std::fs::write(path, yaml)
            .map_err(|e| format!("Failed to write warehouse data {}: {e}", path.display()))?;
        info!(path = %path.display(), "warehouse data saved");
        Ok(())
    }

    /// Snapshot of the stored data.
    #[must_use]
    pub fn snapshot(&self) -> WarehouseData {
        self.lock().clone()
    }

    fn lock(&self) -> MutexGuard<'_, WarehouseData> {
        self.data.lock().unwrap_or_else(PoisonError::into_inner)
    }

    fn store_fact(&self, task_id: &str, fact: &FactAction) -> Result<(), PortError> {
        let mut data = self.lock();
        let task = data
            .tasks
            .iter_mut()
            .find(|task| task.id == task_id)
            .ok_or_else(|| format!("Unknown task {task_id}"))?;
        if let Some(action) = task.find_action_mut(&fact.planned_action_id) {
            action.is_completed = true;
            action.is_skipped = false;
        }
        task.fact_actions.push(fact.clone());
        Ok(())
    }

    fn close(&self, code: &str) -> Result<Pallet, PortError> {
        let mut data = self.lock();
        let pallet = data
            .pallets
            .iter_mut()
            .find(|pallet| pallet.code == code)
            .ok_or_else(|| format!("Unknown pallet {code}"))?;
        pallet.is_closed = true;
        Ok(pallet.clone())
    }
}

fn contains_ignore_case(haystack: &str, needle: &str) -> bool {
    haystack.to_lowercase().contains(&needle.to_lowercase())
}

fn ready<'a, T: Send + 'a>(result: Result<T, PortError>) -> PortFuture<'a, T> {
    Box::pin(async move { result })
}

impl ProductRepository for InMemoryWarehouse {
    fn get_products(&self, query: &str) -> PortFuture<'_, Vec<Product>> {
        let products = self
            .lock()
            .products
            .iter()
            .filter(|p| {
                contains_ignore_case(&p.id, query)
                    || contains_ignore_case(&p.name, query)
                    || p.article.as_deref().is_some_and(|a| contains_ignore_case(a, query))
            })
            .cloned()
            .collect();
        ready(Ok(products))
    }

    fn get_products_by_ids(&self, ids: &[String]) -> PortFuture<'_, Vec<Product>> {
        let products =
            self.lock().products.iter().filter(|p| ids.contains(&p.id)).cloned().collect();
        ready(Ok(products))
    }

    fn find_product_by_barcode(&self, barcode: &str) -> PortFuture<'_, Option<Product>> {
        let product = self
            .lock()
            .products
            .iter()
            .find(|p| p.barcodes.iter().any(|b| b == barcode))
            .cloned();
        ready(Ok(product))
    }
}

impl BinRepository for InMemoryWarehouse {
    fn get_bins(&self, query: &str, zone: Option<&str>) -> PortFuture<'_, Vec<BinX>> {
        let bins = self
            .lock()
            .bins
            .iter()
            .filter(|b| contains_ignore_case(&b.code, query))
            .filter(|b| zone.is_none_or(|zone| b.zone.as_deref() == Some(zone)))
            .cloned()
            .collect();
        ready(Ok(bins))
    }

    fn get_bin_by_code(&self, code: &str) -> PortFuture<'_, Option<BinX>> {
        let bin = self.lock().bins.iter().find(|b| b.code == code).cloned();
        ready(Ok(bin))
    }
}

impl PalletRepository for InMemoryWarehouse {
    fn get_pallets(&self, query: &str) -> PortFuture<'_, Vec<Pallet>> {
        let pallets = self
            .lock()
            .pallets
            .iter()
            .filter(|p| contains_ignore_case(&p.code, query))
            .cloned()
            .collect();
        ready(Ok(pallets))
    }

    fn get_pallet_by_code(&self, code: &str) -> PortFuture<'_, Option<Pallet>> {
        let pallet = self.lock().pallets.iter().find(|p| p.code == code).cloned();
        ready(Ok(pallet))
    }

    fn create_pallet(&self) -> PortFuture<'_, Pallet> {
        let pallet = {
            let mut data = self.lock();
            let mut n = data.pallets.len() + 1;
            while data.pallets.iter().any(|p| p.code == format!("PAL-{n:04}")) {
                n += 1;
            }
            let pallet = Pallet::new(format!("PAL-{n:04}"));
            data.pallets.push(pallet.clone());
            pallet
        };
        info!(code = %pallet.code, "pallet created");
        ready(Ok(pallet))
    }

    fn close_pallet(&self, code: &str) -> PortFuture<'_, Pallet> {
        ready(self.close(code))
    }

    fn print_pallet_label(&self, code: &str) -> PortFuture<'_, ()> {
        let known = self.lock().pallets.iter().any(|p| p.code == code);
        let result = if known {
            info!(code, "pallet label sent to printer");
            Ok(())
        } else {
            Err(format!("Unknown pallet {code}").into())
        };
        ready(result)
    }
}

impl TaskRepository for InMemoryWarehouse {
    fn get_task_type(&self, id: &str) -> PortFuture<'_, Option<TaskType>> {
        let task_type = self.lock().task_types.iter().find(|t| t.id == id).cloned();
        ready(Ok(task_type))
    }

    fn get_task_by_id(&self, id: &str) -> PortFuture<'_, Option<Task>> {
        let task = self.lock().tasks.iter().find(|t| t.id == id).cloned();
        ready(Ok(task))
    }

    fn add_fact_action(&self, task_id: &str, fact: &FactAction) -> PortFuture<'_, ()> {
        ready(self.store_fact(task_id, fact))
    }
}
