use crate::{PersistenceProvider, PinataConfig, PinataProvider, ProviderResult};
use pinner_core::PinnerConfig;
use std::sync::Arc;

/// Create the priority-ordered provider list from configuration.
///
/// A single HTTP pinning service is configured today; further backends slot in
/// after it in fallback order.
pub fn create_providers(
    config: &PinnerConfig,
) -> ProviderResult<Vec<Arc<dyn PersistenceProvider>>> {
    let pinata = PinataProvider::new(PinataConfig::from_config(config))?;

    tracing::info!(
        api_url = %config.pinata_api_url,
        "Configured pinning service provider"
    );

    Ok(vec![Arc::new(pinata)])
}
