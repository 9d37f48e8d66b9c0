use alloy::providers::{
    ProviderBuilder, RootProvider,
    fillers::{BlobGasFiller, ChainIdFiller, GasFiller, JoinFill, NonceFiller},
};

/// The HTTP provider type used throughout the application.
///
/// This is the filled provider returned by `ProviderBuilder::new()`.
pub type HttpProvider = alloy::providers::fillers::FillProvider<
    JoinFill<
        alloy::providers::Identity,
        JoinFill<GasFiller, JoinFill<BlobGasFiller, JoinFill<NonceFiller, ChainIdFiller>>>,
    >,
    RootProvider,
>;

/// Create a read-only HTTP provider from an RPC URL string.
pub fn create_provider(rpc_url: &str) -> eyre::Result<HttpProvider> {
    let url = rpc_url.parse()?;
    let provider = ProviderBuilder::new().connect_http(url);
    Ok(provider)
}
