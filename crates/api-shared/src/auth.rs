/// Metadata key carrying the API key on gRPC requests.
pub const API_KEY_HEADER: &str = "x-api-key";

/// Validates the provided API key against the configured one.
///
/// Returns `Ok(())` if the key matches, or `unauthenticated` otherwise.
#[allow(clippy::result_large_err)]
pub fn validate_api_key(provided_key: &str, expected_key: &str) -> Result<(), tonic::Status> {
    if !expected_key.is_empty() && provided_key == expected_key {
        Ok(())
    } else {
        Err(tonic::Status::unauthenticated("Invalid API key"))
    }
}

/// Reads the API key from request metadata.
#[allow(clippy::result_large_err)]
pub fn api_key_from_metadata(
    metadata: &tonic::metadata::MetadataMap,
) -> Result<&str, tonic::Status> {
    metadata
        .get(API_KEY_HEADER)
        .and_then(|v| v.to_str().ok())
        .ok_or_else(|| tonic::Status::unauthenticated("Missing x-api-key header"))
}
