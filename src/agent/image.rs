use base64::engine::general_purpose::STANDARD;
use base64::Engine;
use rig::image_generation::ImageGenerationModel;
use rig::prelude::ImageGenerationClient;
use rig::providers::openai;
use tracing::{error, info};

use super::{build_client, ImageService};
use crate::config::AppConfig;
use crate::errors::AppError;

/// Generates images through a rig [`openai::Client`]; one request per call, no retry.
#[derive(Clone)]
pub struct OpenAiImageService {
    client: openai::Client,
    model: String,
    size: u32,
}

impl OpenAiImageService {
    pub fn new(config: &AppConfig) -> Result<Self, AppError> {
        Ok(Self {
            client: build_client(config)?,
            model: config.image_model.clone(),
            size: config.image_size,
        })
    }

    pub fn model(&self) -> &str {
        &self.model
    }
}

impl ImageService for OpenAiImageService {
    async fn generate_image(&self, prompt: &str) -> Result<String, AppError> {
        let model = self.client.image_generation_model(self.model.as_str());

        let response = model
            .image_generation_request()
            .prompt(prompt)
            .width(self.size)
            .height(self.size)
            .send()
            .await
            .map_err(|e| {
                error!(model = %self.model, error = %e, "image generation failed");
                AppError::service(e.to_string())
            })?;

        if response.image.is_empty() {
            return Err(AppError::service("The provider returned no image data."));
        }

        info!(model = %self.model, bytes = response.image.len(), "image generated");
        Ok(to_data_url(&response.image))
    }
}

/// Encodes raw image bytes as a `data:` URL, picking the mime type from the magic bytes.
pub fn to_data_url(bytes: &[u8]) -> String {
    format!("data:{};base64,{}", sniff_mime(bytes), STANDARD.encode(bytes))
}

fn sniff_mime(bytes: &[u8]) -> &'static str {
    match bytes {
        [0x89, b'P', b'N', b'G', ..] => "image/png",
        [0xFF, 0xD8, 0xFF, ..] => "image/jpeg",
        [b'R', b'I', b'F', b'F', _, _, _, _, b'W', b'E', b'B', b'P', ..] => "image/webp",
        _ => "image/png",
    }
}
