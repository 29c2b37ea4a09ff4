use crate::utils::error::Result;
use async_trait::async_trait;

pub trait Storage: Send + Sync {
    fn read_file(&self, path: &str) -> impl std::future::Future<Output = Result<Vec<u8>>> + Send;
    fn write_file(
        &self,
        path: &str,
        data: &[u8],
    ) -> impl std::future::Future<Output = Result<()>> + Send;
}

pub trait ConfigProvider: Send + Sync {
    fn base_url(&self) -> &str;
    fn output_path(&self) -> &str;
    /// Truncate the chart series to the most recent N points when set.
    fn chart_window(&self) -> Option<usize>;
}

/// Extract / transform / load, one report or chart per run. Extraction is the
/// only async boundary; transform works purely on in-memory data.
#[async_trait]
pub trait Pipeline: Send + Sync {
    type Input: Send;
    type Output: Send;

    async fn extract(&self) -> Result<Self::Input>;
    async fn transform(&self, input: Self::Input) -> Result<Self::Output>;
    async fn load(&self, output: Self::Output) -> Result<String>;
}
