use tracing::info;

use crate::app_state::AppState;
use crate::error::AppError;
use crate::videogen::materializer::{materialize, Delivery};
use crate::videogen::poller::wait_for_completion;
use crate::videogen::references::assemble_references;
use crate::videogen::types::{GenerationConfig, GenerationRequest, UploadedImage};

/// Run one upload through submission, polling and delivery
pub async fn generate_video(
    state: &AppState,
    uploaded: UploadedImage,
) -> Result<Delivery, AppError> {
    let veo = &state.config.veo;

    let references = assemble_references(&veo.reference_asset, &uploaded).await?;
    drop(uploaded);

    let request = GenerationRequest {
        model: veo.model.clone(),
        prompt: veo.prompt.clone(),
        references,
        config: GenerationConfig {
            aspect_ratio: veo.aspect_ratio,
            negative_prompt: veo.negative_prompt.clone(),
        },
    };

    info!("Generating video with model {}", request.model);
    let job = state.generator.submit(&request).await?;
    let job = wait_for_completion(state.generator.as_ref(), job, &state.poll_policy).await?;
    let video = job.first_video()?;

    materialize(
        state.generator.as_ref(),
        state.store.as_deref(),
        video,
        &state.config.delivery,
        &state.config.storage.prefix,
    )
    .await
}
