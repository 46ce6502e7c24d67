use async_trait::async_trait;
use pmap_core::{Processor, ResourceMapping};

use crate::validator::MappingValidator;

/// Runs the [`MappingValidator`] as a step of the processor chain.
///
/// The step fails with the full [`ValidationReport`](crate::ValidationReport)
/// and never mutates the record.
#[derive(Debug, Clone, Default)]
pub struct ValidationProcessor {
    validator: MappingValidator,
}

impl ValidationProcessor {
    pub fn new(validator: MappingValidator) -> Self {
        Self { validator }
    }
}

#[async_trait]
impl Processor<ResourceMapping> for ValidationProcessor {
    fn name(&self) -> &str {
        "validation"
    }

    async fn process(&self, record: &mut ResourceMapping) -> anyhow::Result<()> {
        self.validator.validate(record)?;
        Ok(())
    }
}
