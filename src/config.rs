use crate::errors::AppError;

pub const DEFAULT_TEXT_MODEL: &str = "gpt-4o-mini";
pub const DEFAULT_IMAGE_MODEL: &str = "dall-e-3";
const DEFAULT_IMAGE_SIZE: u32 = 1024;
const DEFAULT_PORT: u16 = 8080;

/// Runtime settings, read from the environment (and `.env` in development).
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AppConfig {
    pub api_key: String,
    pub api_base_url: Option<String>,
    pub text_model: String,
    pub image_model: String,
    pub image_size: u32,
    pub preamble: Option<String>,
    pub port: u16,
}

impl AppConfig {
    pub fn from_env() -> Result<Self, AppError> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Builds the config from an arbitrary key lookup; blank values count as unset.
    pub fn from_lookup<F>(lookup: F) -> Result<Self, AppError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let get = |key: &str| lookup(key).map(|v| v.trim().to_string()).filter(|v| !v.is_empty());

        let api_key = get("OPENAI_API_KEY")
            .ok_or_else(|| AppError::config("OPENAI_API_KEY", "must be set (copy .env.example to .env)"))?;

        let image_size = match get("IMAGE_SIZE") {
            Some(raw) => raw
                .parse::<u32>()
                .ok()
                .filter(|size| *size > 0)
                .ok_or_else(|| AppError::config("IMAGE_SIZE", format!("'{raw}' is not a positive integer")))?,
            None => DEFAULT_IMAGE_SIZE,
        };

        let port = match get("PORT") {
            Some(raw) => raw
                .parse::<u16>()
                .map_err(|e| AppError::config("PORT", format!("'{raw}': {e}")))?,
            None => DEFAULT_PORT,
        };

        Ok(Self {
            api_key,
            api_base_url: get("OPENAI_API_BASE_URL"),
            text_model: get("TEXT_MODEL").unwrap_or_else(|| DEFAULT_TEXT_MODEL.to_string()),
            image_model: get("IMAGE_MODEL").unwrap_or_else(|| DEFAULT_IMAGE_MODEL.to_string()),
            image_size,
            preamble: get("SYSTEM_PREAMBLE"),
            port,
        })
    }
}

#[cfg(test)]
mod tests {
    use std::collections::HashMap;

    use super::*;

    fn lookup(pairs: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
        let map: HashMap<String, String> = pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        move |key| map.get(key).cloned()
    }

    #[test]
    fn defaults_apply_when_only_key_is_set() {
        let config = AppConfig::from_lookup(lookup(&[("OPENAI_API_KEY", "sk-test")])).unwrap();
        assert_eq!(config.api_key, "sk-test");
        assert_eq!(config.api_base_url, None);
        assert_eq!(config.text_model, DEFAULT_TEXT_MODEL);
        assert_eq!(config.image_model, DEFAULT_IMAGE_MODEL);
        assert_eq!(config.image_size, 1024);
        assert_eq!(config.port, 8080);
        assert_eq!(config.preamble, None);
    }

    #[test]
    fn missing_api_key_is_a_config_error() {
        let err = AppConfig::from_lookup(lookup(&[("OPENAI_API_KEY", "   ")])).unwrap_err();
        assert!(matches!(err, AppError::Config { ref key, .. } if key == "OPENAI_API_KEY"));
    }

    #[test]
    fn invalid_port_is_rejected() {
        let err = AppConfig::from_lookup(lookup(&[("OPENAI_API_KEY", "k"), ("PORT", "eighty")]))
            .unwrap_err();
        assert!(matches!(err, AppError::Config { ref key, .. } if key == "PORT"));
    }

    #[test]
    fn zero_image_size_is_rejected() {
        let err = AppConfig::from_lookup(lookup(&[("OPENAI_API_KEY", "k"), ("IMAGE_SIZE", "0")]))
            .unwrap_err();
        assert!(matches!(err, AppError::Config { ref key, .. } if key == "IMAGE_SIZE"));
    }

    #[test]
    fn overrides_are_read() {
        let config = AppConfig::from_lookup(lookup(&[
            ("OPENAI_API_KEY", "k"),
            ("OPENAI_API_BASE_URL", "http://localhost:4000/v1"),
            ("TEXT_MODEL", "gpt-4o"),
            ("IMAGE_MODEL", "gpt-image-1"),
            ("IMAGE_SIZE", "512"),
            ("SYSTEM_PREAMBLE", "Be brief."),
            ("PORT", "3000"),
        ]))
        .unwrap();
        assert_eq!(config.api_base_url.as_deref(), Some("http://localhost:4000/v1"));
        assert_eq!(config.text_model, "gpt-4o");
        assert_eq!(config.image_model, "gpt-image-1");
        assert_eq!(config.image_size, 512);
        assert_eq!(config.preamble.as_deref(), Some("Be brief."));
        assert_eq!(config.port, 3000);
    }
}
