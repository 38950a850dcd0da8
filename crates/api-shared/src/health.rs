use crate::pb::HealthRes;

/// Health service shared by the gRPC and REST APIs.
#[derive(Clone, Default)]
pub struct HealthService;

impl HealthService {
    pub fn new() -> Self {
        Self
    }

    /// Reports the service as healthy.
    pub fn check_health() -> HealthRes {
        HealthRes {
            ok: true,
            message: "Ward is alive".into(),
        }
    }
}
