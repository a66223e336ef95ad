// Shared test helpers: scripted in-process providers and pipeline setup.
//
// Scripted providers let the pipeline and batch tests control exactly what
// each provider answers without any network traffic.

use std::collections::BTreeMap;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use std::time::Duration;

use address_geocoder::{
    AddressComponents, GeocoderConfig, GeocodingProvider, GeocodingRequest, GeocodingResult,
    GeocodingStatus, MatchType, Pipeline, ProviderId, ProviderSettings, ReverseGeocodingResult,
};
use async_trait::async_trait;

/// What a scripted provider answers for one request.
#[derive(Debug, Clone, Copy)]
#[allow(dead_code)] // Not every test file uses every reply
pub enum Reply {
    /// Success with coordinates at the given confidence
    Hit(f64),
    /// Partial match with coordinates at the given confidence
    Partial(f64),
    /// No coordinates, with the given status
    Fail(GeocodingStatus),
    /// Panics inside the adapter
    Panic,
}

type Script = Box<dyn Fn(&GeocodingRequest) -> Reply + Send + Sync>;

pub struct ScriptedProvider {
    id: ProviderId,
    script: Script,
    delay: Option<Duration>,
    calls: AtomicUsize,
    in_flight: AtomicUsize,
    max_in_flight: AtomicUsize,
}

#[allow(dead_code)] // Used by other test files
impl ScriptedProvider {
    pub fn new(
        id: ProviderId,
        script: impl Fn(&GeocodingRequest) -> Reply + Send + Sync + 'static,
    ) -> Self {
        Self {
            id,
            script: Box::new(script),
            delay: None,
            calls: AtomicUsize::new(0),
            in_flight: AtomicUsize::new(0),
            max_in_flight: AtomicUsize::new(0),
        }
    }

    /// Answers every request the same way.
    pub fn always(id: ProviderId, reply: Reply) -> Arc<Self> {
        Arc::new(Self::new(id, move |_| reply))
    }

    /// Sleeps before answering (use with paused Tokio time).
    pub fn with_delay(mut self, delay: Duration) -> Self {
        self.delay = Some(delay);
        self
    }

    pub fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }

    pub fn max_in_flight(&self) -> usize {
        self.max_in_flight.load(Ordering::SeqCst)
    }

    async fn enter(&self) {
        self.calls.fetch_add(1, Ordering::SeqCst);
        let now = self.in_flight.fetch_add(1, Ordering::SeqCst) + 1;
        self.max_in_flight.fetch_max(now, Ordering::SeqCst);
        if let Some(delay) = self.delay {
            tokio::time::sleep(delay).await;
        }
        self.in_flight.fetch_sub(1, Ordering::SeqCst);
    }
}

#[async_trait]
impl GeocodingProvider for ScriptedProvider {
    fn id(&self) -> ProviderId {
        self.id
    }

    async fn geocode(&self, request: &GeocodingRequest) -> GeocodingResult {
        self.enter().await;
        let address = request.address.clone();
        match (self.script)(request) {
            Reply::Hit(confidence) => GeocodingResult::success(
                address,
                self.id,
                40.7128,
                -74.006,
                confidence,
                MatchType::Exact,
            ),
            Reply::Partial(confidence) => GeocodingResult::success(
                address,
                self.id,
                40.7128,
                -74.006,
                confidence,
                MatchType::Approximate,
            )
            .into_partial(),
            Reply::Fail(status) => {
                GeocodingResult::failure(address, Some(self.id), status, format!("{status}"))
            }
            Reply::Panic => panic!("scripted provider {} panicked", self.id),
        }
    }

    async fn reverse_geocode(&self, latitude: f64, longitude: f64) -> ReverseGeocodingResult {
        self.enter().await;
        let probe = GeocodingRequest::new(format!("{latitude},{longitude}"));
        match (self.script)(&probe) {
            Reply::Hit(confidence) | Reply::Partial(confidence) => {
                ReverseGeocodingResult::success(
                    latitude,
                    longitude,
                    self.id,
                    AddressComponents {
                        formatted_address: Some(format!("Somewhere via {}", self.id)),
                        ..Default::default()
                    },
                    confidence,
                    MatchType::Approximate,
                )
            }
            Reply::Fail(status) => ReverseGeocodingResult::failure(
                latitude,
                longitude,
                Some(self.id),
                status,
                format!("{status}"),
            ),
            Reply::Panic => panic!("scripted provider {} panicked", self.id),
        }
    }
}

/// Config that tries `order` in sequence with throttling disabled.
#[allow(dead_code)] // Used by other test files
pub fn config_for(order: &[ProviderId]) -> GeocoderConfig {
    let providers: BTreeMap<ProviderId, ProviderSettings> = order
        .iter()
        .map(|&id| {
            (
                id,
                ProviderSettings {
                    requests_per_second: Some(0.0),
                    ..Default::default()
                },
            )
        })
        .collect();
    GeocoderConfig {
        preferred_provider: order[0],
        fallback_providers: order[1..].to_vec(),
        providers,
        ..Default::default()
    }
}

/// Pipeline over scripted providers, tried in the order given.
#[allow(dead_code)] // Used by other test files
pub fn pipeline_with(providers: &[&Arc<ScriptedProvider>]) -> Pipeline {
    let order: Vec<ProviderId> = providers.iter().map(|p| p.id()).collect();
    pipeline_with_config(config_for(&order), providers)
}

#[allow(dead_code)] // Used by other test files
pub fn pipeline_with_config(
    config: GeocoderConfig,
    providers: &[&Arc<ScriptedProvider>],
) -> Pipeline {
    let adapters: Vec<Arc<dyn GeocodingProvider>> = providers
        .iter()
        .map(|p| Arc::clone(*p) as Arc<dyn GeocodingProvider>)
        .collect();
    Pipeline::with_providers(config, adapters).expect("test config should be valid")
}
