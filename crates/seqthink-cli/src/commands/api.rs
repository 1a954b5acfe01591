//! JSON request/response mode.
//!
//! Reads one thought submission from stdin, applies it to the active session
//! and prints the response envelope. Malformed input still produces an
//! envelope so callers only ever parse one shape.

use anyhow::{Context, Result};
use seqthink_application::SessionUseCase;
use seqthink_core::controller::ThoughtResponse;
use seqthink_core::SeqThinkError;
use serde_json::Value;
use std::io::Read;
use std::process::ExitCode;

pub async fn run(usecase: &SessionUseCase) -> Result<ExitCode> {
    let mut input = String::new();
    std::io::stdin()
        .read_to_string(&mut input)
        .context("Failed to read request from stdin")?;

    let response = respond(usecase, &input).await?;
    println!("{}", serde_json::to_string_pretty(&response.to_json())?);

    Ok(if response.success {
        ExitCode::SUCCESS
    } else {
        ExitCode::FAILURE
    })
}

async fn respond(usecase: &SessionUseCase, input: &str) -> Result<ThoughtResponse> {
    match serde_json::from_str::<Value>(input) {
        Ok(submission) => usecase.submit_json(&submission).await,
        Err(e) => {
            tracing::debug!("[api] Rejected non-JSON input: {}", e);
            Ok(ThoughtResponse::failed(&SeqThinkError::from(e)))
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use seqthink_infrastructure::JsonSessionRepository;
    use std::sync::Arc;
    use tempfile::TempDir;

    fn usecase(temp_dir: &TempDir) -> SessionUseCase {
        let repository = JsonSessionRepository::new(temp_dir.path()).unwrap();
        SessionUseCase::new(Arc::new(repository), 5)
    }

    #[tokio::test]
    async fn test_respond_success() {
        let temp_dir = TempDir::new().unwrap();
        let usecase = usecase(&temp_dir);

        let response = respond(
            &usecase,
            r#"{"thought":"How should we shard?","thoughtNumber":1,"totalThoughts":3,"nextThoughtNeeded":true}"#,
        )
        .await
        .unwrap();

        assert!(response.success);
        let json = response.to_json();
        assert_eq!(json["thoughtData"]["number"], 1);
        assert_eq!(json["analysis"]["type"], "question");
    }

    #[tokio::test]
    async fn test_respond_invalid_json() {
        let temp_dir = TempDir::new().unwrap();
        let usecase = usecase(&temp_dir);

        let response = respond(&usecase, "not json").await.unwrap();
        assert!(!response.success);
        assert!(response.error.is_some());
        assert_eq!(usecase.summary().await.unwrap().total_thoughts, 0);
    }

    #[tokio::test]
    async fn test_respond_validation_failure() {
        let temp_dir = TempDir::new().unwrap();
        let usecase = usecase(&temp_dir);

        let response = respond(&usecase, r#"{"thought":"","thoughtNumber":1}"#)
            .await
            .unwrap();
        let json = response.to_json();
        assert_eq!(json["success"], false);
        assert!(json.get("thoughtData").is_none());
    }
}
