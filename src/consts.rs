pub const DEFAULT_BIND_ADDRESS: &str = "0.0.0.0:5000";

pub const DEFAULT_BODY_LIMIT_BYTES: usize = 50 * 1024 * 1024; // 50MB

pub const VEO_API_BASE: &str = "https://generativelanguage.googleapis.com/v1beta";

pub const VEO_MODEL_ID: &str = "veo-3.1-generate-preview";

pub const DEFAULT_PROMPT: &str = "Make the person(s) in the video take a step back and pull out the enigma logo from behind their backs";

pub const DEFAULT_REFERENCE_ASSET: &str = "enigma_logo.png";

pub const DEFAULT_LOCAL_OUTPUT: &str = "generated_video.mp4";

// existing objects already live under this spelling
pub const DEFAULT_OBJECT_PREFIX: &str = "testingEnviroment";

pub const VIDEO_CONTENT_TYPE: &str = "video/mp4";

pub const REFERENCE_TYPE_ASSET: &str = "asset";

pub const SUCCESS_MESSAGE: &str = "Video generated successfully";

pub fn s3_public_url(bucket: &str, region: &str, key: &str) -> String {
    format!("https://{bucket}.s3.{region}.amazonaws.com/{key}")
}
