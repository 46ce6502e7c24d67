use async_trait::async_trait;

/// A step in the processing chain.
///
/// Processors run in order against the same record and may merge into its
/// annotations. The first error stops the chain.
#[async_trait]
pub trait Processor<T>: Send + Sync {
    /// Short name used in logs.
    fn name(&self) -> &str;

    async fn process(&self, record: &mut T) -> anyhow::Result<()>;
}
