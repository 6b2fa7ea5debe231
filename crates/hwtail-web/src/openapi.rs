//! OpenAPI documentation definition.

use hwtail_core::model::{ComputeGroup, InfoGroup, MetricSnapshot, RamGroup, RawGroup, Status};
use utoipa::OpenApi;

use crate::handlers::Health;

#[derive(OpenApi)]
#[openapi(
    paths(crate::handlers::handle_health, crate::handlers::handle_stats),
    components(schemas(
        MetricSnapshot,
        ComputeGroup,
        RamGroup,
        InfoGroup,
        RawGroup,
        Status,
        Health,
    )),
    info(
        title = "hwtail API",
        version = "1.0",
        description = "Live hardware metrics tailed from a sensor CSV log"
    )
)]
pub(crate) struct ApiDoc;
