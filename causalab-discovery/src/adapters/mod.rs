//! [`AlgorithmAdapter`] implementations over a [`DiscoveryBackend`].

pub mod direct_lingam;
pub mod ica_lingam;
pub mod pc;

pub use direct_lingam::{DirectLingamAdapter, DirectLingamParams};
pub use ica_lingam::{IcaLingamAdapter, IcaLingamParams};
pub use pc::{PcAdapter, PcParams};

use crate::backend::{Algorithm, BackendRequest, DiscoveryBackend};
use causalab_core::{AdapterError, AlgorithmAdapter, FeatureMatrix, ForbiddenEdges};
use serde::Serialize;
use serde::de::DeserializeOwned;
use tracing::debug;

/// Send one request to `backend` and return its raw JSON output.
pub(crate) fn invoke<B, P>(
    backend: &B,
    algorithm: Algorithm,
    data: &FeatureMatrix,
    params: &P,
    forbidden: Vec<(usize, usize)>,
) -> Result<serde_json::Value, AdapterError>
where
    B: DiscoveryBackend + ?Sized,
    P: Serialize,
{
    let name = algorithm.as_str();
    let params = serde_json::to_value(params)
        .map_err(|e| AdapterError::invalid_params(name, e.to_string()))?;
    debug!(
        algorithm = name,
        rows = data.n_rows(),
        cols = data.n_cols(),
        forbidden = forbidden.len(),
        "Invoking discovery backend"
    );
    let request = BackendRequest {
        algorithm,
        data,
        params,
        forbidden,
    };
    backend
        .invoke(&request)
        .map_err(|e| e.into_adapter_error(name))
}

/// Pull `field` out of a backend response.
pub(crate) fn output_field<T: DeserializeOwned>(
    backend: &str,
    output: &serde_json::Value,
    field: &str,
) -> Result<T, AdapterError> {
    let value = output.get(field).ok_or_else(|| {
        AdapterError::backend(backend, format!("response has no '{field}' field"))
    })?;
    serde_json::from_value(value.clone())
        .map_err(|e| AdapterError::backend(backend, format!("malformed '{field}': {e}")))
}

/// Build the adapter for `algorithm`.
///
/// `forbidden` only applies to PC; the LiNGAM variants ignore it.
pub fn adapter_for<'a, B>(
    algorithm: Algorithm,
    backend: &'a B,
    forbidden: Option<ForbiddenEdges>,
) -> Box<dyn AlgorithmAdapter + 'a>
where
    B: DiscoveryBackend + ?Sized,
{
    match algorithm {
        Algorithm::Pc => Box::new(match forbidden {
            Some(forbidden) => PcAdapter::with_background(backend, forbidden),
            None => PcAdapter::new(backend),
        }),
        Algorithm::IcaLingam => Box::new(IcaLingamAdapter::new(backend)),
        Algorithm::DirectLingam => Box::new(DirectLingamAdapter::new(backend)),
    }
}

#[cfg(test)]
pub(crate) mod testing {
    use crate::backend::{BackendRequest, DiscoveryBackend};
    use crate::error::DiscoveryError;
    use std::cell::RefCell;

    /// Backend returning a canned response and recording every request.
    pub struct CannedBackend {
        response: Result<serde_json::Value, fn() -> DiscoveryError>,
        pub requests: RefCell<Vec<serde_json::Value>>,
    }

    impl CannedBackend {
        pub fn ok(response: serde_json::Value) -> Self {
            Self {
                response: Ok(response),
                requests: RefCell::new(Vec::new()),
            }
        }

        pub fn failing(error: fn() -> DiscoveryError) -> Self {
            Self {
                response: Err(error),
                requests: RefCell::new(Vec::new()),
            }
        }

        pub fn last_request(&self) -> serde_json::Value {
            self.requests.borrow().last().cloned().unwrap_or_default()
        }
    }

    impl DiscoveryBackend for CannedBackend {
        fn invoke(
            &self,
            request: &BackendRequest<'_>,
        ) -> Result<serde_json::Value, DiscoveryError> {
            self.requests
                .borrow_mut()
                .push(serde_json::to_value(request)?);
            match &self.response {
                Ok(value) => Ok(value.clone()),
                Err(make) => Err(make()),
            }
        }
    }
}
