use axum::Json;
use serde::Serialize;

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct VersionInfo {
    pub semver: &'static str,
    pub git_commit: &'static str,
    pub build_time: u64,
}

/// GET /version
pub async fn get_version() -> Json<VersionInfo> {
    tracing::debug!("GET /version");
    Json(VersionInfo {
        semver: env!("CARGO_PKG_VERSION"),
        git_commit: option_env!("GIT_COMMIT").unwrap_or("unknown"),
        build_time: option_env!("BUILD_TIME")
            .and_then(|s| s.parse().ok())
            .unwrap_or(0),
    })
}
