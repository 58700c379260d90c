//! Service context bundling all port trait objects.

use std::path::Path;
use std::sync::{Arc, Mutex};

use tracing::{info, warn};

use crate::adapters::live::{HttpValidationApi, LiveClock, LiveIdGenerator};
use crate::adapters::memory::InMemoryWarehouse;
use crate::adapters::recording::{
    RecordingClock, RecordingIdGenerator, RecordingValidationApi, SharedRecorder,
};
use crate::adapters::replaying::{ReplayingClock, ReplayingIdGenerator, ReplayingValidationApi};
use crate::cassette::config::CassetteConfig;
use crate::cassette::recorder::CassetteRecorder;
use crate::config::WizardConfig;
use crate::ports::{
    BinRepository, Clock, IdGenerator, PalletRepository, ProductRepository, TaskRepository,
    ValidationApi,
};
use crate::validation::ValidationService;

/// Bundles every port the wizard needs.
///
/// Constructors pick the adapters: live, recording (live adapters whose
/// calls are written to a cassette when the context is dropped) or
/// replaying. Repositories always come from the warehouse passed in.
pub struct ServiceContext {
    /// Current time.
    pub clock: Arc<dyn Clock>,
    /// Fact ids.
    pub id_gen: Arc<dyn IdGenerator>,
    /// Remote validation, if configured.
    pub validation_api: Option<Arc<dyn ValidationApi>>,
    /// Product catalogue.
    pub products: Arc<dyn ProductRepository>,
    /// Storage bins.
    pub bins: Arc<dyn BinRepository>,
    /// Pallets.
    pub pallets: Arc<dyn PalletRepository>,
    /// Tasks and facts.
    pub tasks: Arc<dyn TaskRepository>,
    recorder: Option<SharedRecorder>,
}

impl ServiceContext {
    /// Assembles a context from explicit adapters.
    #[must_use]
    pub fn new(
        warehouse: &Arc<InMemoryWarehouse>,
        clock: Arc<dyn Clock>,
        id_gen: Arc<dyn IdGenerator>,
        validation_api: Option<Arc<dyn ValidationApi>>,
    ) -> Self {
        Self {
            clock,
            id_gen,
            validation_api,
            products: Arc::clone(warehouse) as Arc<dyn ProductRepository>,
            bins: Arc::clone(warehouse) as Arc<dyn BinRepository>,
            pallets: Arc::clone(warehouse) as Arc<dyn PalletRepository>,
            tasks: Arc::clone(warehouse) as Arc<dyn TaskRepository>,
            recorder: None,
        }
    }

    /// Live context: system clock, UUIDs and HTTP validation when a URL is given.
    #[must_use]
    pub fn live(warehouse: &Arc<InMemoryWarehouse>, validation_url: Option<&str>) -> Self {
        Self::new(
            warehouse,
            Arc::new(LiveClock),
            Arc::new(LiveIdGenerator),
            live_validation(validation_url),
        )
    }

    /// Live context whose clock, id and validation calls are recorded to `path`.
    ///
    /// The cassette is written when the context is dropped.
    #[must_use]
    pub fn recording(
        warehouse: &Arc<InMemoryWarehouse>,
        validation_url: Option<&str>,
        path: &Path,
    ) -> Self {
        let recorder: SharedRecorder =
            Arc::new(Mutex::new(CassetteRecorder::new(path, "task-wizard-session")));
        let validation_api = live_validation(validation_url).map(|api| {
            let recording = RecordingValidationApi::new(api, Arc::clone(&recorder));
            Arc::new(recording) as Arc<dyn ValidationApi>
        });
        let mut context = Self::new(
            warehouse,
            Arc::new(RecordingClock::new(Arc::new(LiveClock), Arc::clone(&recorder))),
            Arc::new(RecordingIdGenerator::new(Arc::new(LiveIdGenerator), Arc::clone(&recorder))),
            validation_api,
        );
        context.recorder = Some(recorder);
        context
    }

    /// Context serving clock, id and validation calls from one cassette.
    ///
    /// # Errors
    ///
    /// Returns an error if the cassette cannot be read or parsed.
    pub fn replaying(warehouse: &Arc<InMemoryWarehouse>, path: &Path) -> Result<Self, String> {
        Self::replaying_from(warehouse, None, &CassetteConfig::single(path))
    }

    /// Context replaying the ports configured in `config`; the others are live.
    ///
    /// # Errors
    ///
    /// Returns an error if a configured cassette cannot be read or parsed.
    pub fn replaying_from(
        warehouse: &Arc<InMemoryWarehouse>,
        validation_url: Option<&str>,
        config: &CassetteConfig,
    ) -> Result<Self, String> {
        let replayers = config.load_all()?;
        let clock: Arc<dyn Clock> = match replayers.clock {
            Some(replayer) => Arc::new(ReplayingClock::new(replayer)),
            None => Arc::new(LiveClock),
        };
        let id_gen: Arc<dyn IdGenerator> = match replayers.id_gen {
            Some(replayer) => Arc::new(ReplayingIdGenerator::new(replayer)),
            None => Arc::new(LiveIdGenerator),
        };
        let validation_api = match replayers.validation_api {
            Some(replayer) => {
                Some(Arc::new(ReplayingValidationApi::new(replayer)) as Arc<dyn ValidationApi>)
            }
            None => live_validation(validation_url),
        };
        Ok(Self::new(warehouse, clock, id_gen, validation_api))
    }

    /// Picks replaying, recording or live adapters from `config`, in that order.
    ///
    /// # Errors
    ///
    /// Returns an error if a replay cassette cannot be loaded.
    pub fn from_config(
        warehouse: &Arc<InMemoryWarehouse>,
        config: &WizardConfig,
    ) -> Result<Self, String> {
        let url = config.validation_url.as_deref();
        match (&config.replay, &config.record) {
            (Some(path), _) => Self::replaying(warehouse, path),
            (None, Some(path)) => Ok(Self::recording(warehouse, url, path)),
            (None, None) => Ok(Self::live(warehouse, url)),
        }
    }

    /// A validation service backed by this context's validation API.
    #[must_use]
    pub fn validation_service(&self) -> ValidationService {
        ValidationService::new(self.validation_api.clone())
    }
}

fn live_validation(url: Option<&str>) -> Option<Arc<dyn ValidationApi>> {
    url.map(|url| Arc::new(HttpValidationApi::new(url)) as Arc<dyn ValidationApi>)
}

impl Drop for ServiceContext {
    fn drop(&mut self) {
        let Some(recorder) = self.recorder.take() else { return };
        let saved = crate::adapters::recording::lock(&recorder).save();
        match saved {
            Ok(path) => info!(path = %path.display(), "cassette written"),
            Err(e) => warn!(error = %e, "failed to write cassette"),
        }
    }
}
