//! Out command - publish a chart to Harbor

use std::io::Read;

use harbor_core::{OutRequest, Response};
use harbor_publish::{Pipeline, PublishConfig};

use crate::error::Result;

/// Read the `out` request from `input` and run the publish pipeline
pub async fn run(input: impl Read, config: PublishConfig) -> Result<Response> {
    let request = OutRequest::from_reader(input)?;
    tracing::debug!("Request: {:?}", request);

    let response = Pipeline::new(config).run(&request).await?;
    Ok(response)
}
