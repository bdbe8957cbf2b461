//! Backend implementations for record storage

mod local;
mod s3;

pub use local::LocalBackend;
pub use s3::S3Backend;

use nimbus_core::config::BackendSettings;

use crate::backend::{BackendResult, StateBackend};

/// Create a backend from the stack configuration's backend settings
pub async fn create_backend(
    settings: &BackendSettings,
    region: &str,
) -> BackendResult<Box<dyn StateBackend>> {
    match settings {
        BackendSettings::Local { path } => {
            Ok(Box::new(LocalBackend::with_path(path.into())))
        }
        BackendSettings::S3 {
            bucket,
            key,
            encrypt,
        } => {
            let backend = S3Backend::new(bucket, key, *encrypt, region).await;
            Ok(Box::new(backend))
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn local_backend_from_settings() {
        let settings = BackendSettings::Local {
            path: "custom.state.json".to_string(),
        };
        // Creating the backend must not touch the filesystem
        let backend = create_backend(&settings, "us-east-1").await.unwrap();
        assert!(backend.read_state().await.unwrap().is_none());
    }
}
