use crate::domain::ports::Pipeline;
use crate::utils::error::Result;

pub struct Engine<P: Pipeline> {
    pipeline: P,
}

impl<P: Pipeline> Engine<P> {
    pub fn new(pipeline: P) -> Self {
        Self { pipeline }
    }

    pub async fn run(&self) -> Result<String> {
        tracing::info!("📥 Extracting data...");
        let input = self.pipeline.extract().await?;

        tracing::info!("🔄 Transforming data...");
        let output = self.pipeline.transform(input).await?;

        tracing::info!("💾 Loading output...");
        let output_path = self.pipeline.load(output).await?;
        tracing::info!("💾 Output: {}", output_path);

        Ok(output_path)
    }
}
