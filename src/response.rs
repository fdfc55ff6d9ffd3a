use crate::aggregate::Aggregate;
use crate::models::InsightsResponse;

/// Package an aggregation for the caller. The access credential is echoed
/// back only when it differs from `supplied_access`, so the caller knows to
/// persist the rotation.
pub fn assemble(agg: Aggregate, supplied_access: &str) -> InsightsResponse {
    let access_token = if agg.access_token != supplied_access {
        Some(agg.access_token)
    } else {
        None
    };
    InsightsResponse {
        features: agg.features,
        genres: agg.genres,
        access_token,
    }
}
